//! Transports that carry rendered frames to a Minishift array.
//!
//! A Minishift chain is a long shift register: every byte clocked in pushes the existing columns
//! one place along. A frame is therefore just a run of column bytes, sent in one go.

/// A transport to a chain of Minishifts.
pub trait DisplayInterface {
    type Error;

    /// Send one frame, a byte per column, left to right.
    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

pub mod spi {
    //! Frames clocked out over an embedded-hal SPI bus. The Minishift has no command/data line
    //! and latches on chip select, so a plain blocking write is all it takes.

    use super::DisplayInterface;

    pub struct SpiInterface<SPI> {
        /// The SPI master connected to the first Minishift in the chain.
        spi: SPI,
    }

    impl<SPI> SpiInterface<SPI>
    where
        SPI: hal::blocking::spi::Write<u8>,
    {
        pub fn new(spi: SPI) -> Self {
            Self { spi }
        }

        /// Give back the SPI bus.
        pub fn release(self) -> SPI {
            self.spi
        }
    }

    impl<SPI> DisplayInterface for SpiInterface<SPI>
    where
        SPI: hal::blocking::spi::Write<u8>,
    {
        type Error = SPI::Error;

        fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
            self.spi.write(data)
        }
    }

}

pub mod io {
    //! Frames written to anything implementing `std::io::Write`, typically a character device
    //! such as `/dev/spidev0.0` whose driver turns each write into one SPI transfer.

    use std::io::{self, Write};

    use super::DisplayInterface;

    pub struct WriteInterface<W> {
        out: W,
    }

    impl<W: Write> WriteInterface<W> {
        pub fn new(out: W) -> Self {
            Self { out }
        }

        pub fn release(self) -> W {
            self.out
        }
    }

    impl<W: Write> DisplayInterface for WriteInterface<W> {
        type Error = io::Error;

        fn send(&mut self, data: &[u8]) -> io::Result<()> {
            self.out.write_all(data)?;
            self.out.flush()
        }
    }

}

pub mod dry_run {
    //! A transport that only logs, for running without hardware attached.

    use std::convert::Infallible;

    use itertools::Itertools;
    use log::info;

    use super::DisplayInterface;

    #[derive(Default)]
    pub struct LogInterface {
        sent: u64,
    }

    impl LogInterface {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of frames sent so far.
        pub fn sent(&self) -> u64 {
            self.sent
        }
    }

    impl DisplayInterface for LogInterface {
        type Error = Infallible;

        fn send(&mut self, data: &[u8]) -> Result<(), Infallible> {
            self.sent += 1;
            info!(
                "frame {} ({} columns): {}",
                self.sent,
                data.len(),
                data.iter().map(|b| format!("{:02x}", b)).join(" ")
            );
            Ok(())
        }
    }

}
