//! Configuration for a Minishift daemon: how wide the array is and where to listen for commands.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};

/// The port the control plane listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0:?} is not a port number or HOST:PORT")]
    BadListen(String),
}

/// Daemon configuration. The array width is mandatory because nothing can be drawn correctly
/// without it; everything else has a default that can be overridden with the builder methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    width: usize,
    listen: SocketAddr,
}

impl Config {
    /// Create a configuration for an array `width` columns wide, listening on every interface on
    /// `DEFAULT_PORT`.
    pub fn new(width: usize) -> Self {
        Config {
            width,
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
        }
    }

    /// Extend this `Config` to listen for commands on `addr`.
    pub fn listen(self, addr: SocketAddr) -> Self {
        Self {
            listen: addr,
            ..self
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen
    }
}

/// Parse a listen address given either as a bare port, which listens on every interface, or as
/// `HOST:PORT`.
pub fn parse_listen(addr: &str) -> Result<SocketAddr, ConfigError> {
    let bad = || ConfigError::BadListen(addr.to_owned());
    if !addr.contains(':') {
        let port = addr.trim().parse().map_err(|_| bad())?;
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
    }
    if let Ok(addr) = addr.parse() {
        return Ok(addr);
    }
    addr.to_socket_addrs()
        .map_err(|_| bad())?
        .next()
        .ok_or_else(bad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::new(40);
        assert_eq!(cfg.width(), 40);
        assert_eq!(cfg.listen_addr(), "0.0.0.0:8000".parse().unwrap());
    }

    #[test]
    fn builder() {
        let addr = "127.0.0.1:1234".parse().unwrap();
        let cfg = Config::new(16).listen(addr);
        assert_eq!(cfg.listen_addr(), addr);
        assert_eq!(cfg.width(), 16);
    }

    #[test]
    fn bare_port() {
        assert_eq!(parse_listen("1234"), Ok("0.0.0.0:1234".parse().unwrap()));
    }

    #[test]
    fn host_and_port() {
        assert_eq!(
            parse_listen("127.0.0.1:1234"),
            Ok("127.0.0.1:1234".parse().unwrap())
        );
        assert_eq!(parse_listen("[::1]:80"), Ok("[::1]:80".parse().unwrap()));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_listen("http"),
            Err(ConfigError::BadListen("http".into()))
        );
        assert_eq!(
            parse_listen("70000"),
            Err(ConfigError::BadListen("70000".into()))
        );
        assert_eq!(
            parse_listen("127.0.0.1:port"),
            Err(ConfigError::BadListen("127.0.0.1:port".into()))
        );
    }
}
