//! Run configuration, as plain values.
//!
//! Command-line parsing lives in the binary; the library only sees a
//! [`Config`].

use std::path::PathBuf;

use crate::{Error, Result};

/// Reservoir capacity when none is given.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of lines to keep.
    pub capacity: usize,
    /// `host:port` or `:port` to serve the live sample on. `None` disables HTTP.
    pub listen: Option<String>,
    /// Also append every input line to this file.
    pub append: Option<PathBuf>,
    /// Also write every input line, gzip-compressed, to this file.
    pub teez: Option<PathBuf>,
    /// Also echo every input line to stdout.
    pub echo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            listen: None,
            append: None,
            teez: None,
            echo: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(
                "capacity must be a positive number of lines".into(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// The listen address in a form `TcpListener::bind` accepts.
    pub fn listen_addr(&self) -> Result<Option<String>> {
        self.listen.as_deref().map(normalize_listen_addr).transpose()
    }
}

/// Accept `host:port`, `[v6]:port` or `:port` (all interfaces).
pub fn normalize_listen_addr(addr: &str) -> Result<String> {
    let addr = addr.trim();
    let Some((host, port)) = addr.rsplit_once(':') else {
        return Err(Error::InvalidConfig(format!(
            "listen address {addr:?} is missing a port"
        )));
    };
    if port.parse::<u16>().is_err() {
        return Err(Error::InvalidConfig(format!(
            "listen address {addr:?} has an invalid port"
        )));
    }
    if host.is_empty() {
        return Ok(format!("0.0.0.0:{port}"));
    }
    Ok(addr.to_owned())
}
