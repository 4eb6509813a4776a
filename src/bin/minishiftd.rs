//! Daemon that drives an array of Minishifts, taking text to show over HTTP.
//!
//! ```text
//! minishiftd 40 --port 127.0.0.1:8000
//! curl 'http://127.0.0.1:8000/set?text=Hello&interval=0.05&times=3'
//! ```

use std::fmt::Debug;
use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;
use structopt::StructOpt;

use minishift::config::{self, Config};
use minishift::control::Server;
use minishift::interface::dry_run::LogInterface;
use minishift::interface::io::WriteInterface;
use minishift::{Display, DisplayInterface, Driver};

#[derive(Debug, StructOpt)]
#[structopt(name = "minishiftd", about = "Daemon that drives an array of Minishifts.")]
struct Opt {
    /// Width in pixels of the Minishift array
    width: usize,

    /// Port and optional host to listen on (eg, 1234, or 0.0.0.0:1234)
    #[structopt(short, long, default_value = "8000")]
    port: String,

    /// Device node the array is attached to
    #[structopt(long, parse(from_os_str), default_value = "/dev/spidev0.0")]
    device: PathBuf,

    /// Log frames instead of writing them to the device
    #[structopt(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    if opt.width == 0 {
        bail!("the array must be at least one column wide");
    }
    let config = Config::new(opt.width).listen(config::parse_listen(&opt.port)?);

    if opt.dry_run {
        run(&config, LogInterface::new())
    } else {
        let device = OpenOptions::new()
            .write(true)
            .open(&opt.device)
            .with_context(|| format!("failed to open {}", opt.device.display()))?;
        run(&config, WriteInterface::new(device))
    }
}

fn run<DI>(config: &Config, iface: DI) -> Result<()>
where
    DI: DisplayInterface + Send + 'static,
    DI::Error: Debug,
{
    let driver = Driver::new(Display::new(iface, config.width()));
    let (handle, _worker) = driver.spawn().context("failed to start display driver")?;
    let server = Server::bind(config.listen_addr(), handle)
        .with_context(|| format!("failed to listen on {}", config.listen_addr()))?;
    info!("driving {} columns", config.width());
    server.serve().context("control plane stopped")
}
