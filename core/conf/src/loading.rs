//! Load configuration from files.
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;

use crate::Conf;

/// Errors handling provisioner configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unable to decode configuration from file at the given path.
    #[error("unable to decode configuration from file at '{0}'")]
    // (path,)
    Decode(String),

    /// Unable to read configuration file at the given path.
    #[error("unable to read configuration file at '{0}'")]
    // (path,)
    Open(String),

    /// Configuration file not found at the given path.
    #[error("configuration file not found at '{0}'")]
    // (path,)
    PathNotFound(String),
}

/// Load process configuration from the specified path.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Conf> {
    let path = path.as_ref();
    let display = path.display().to_string();
    if !path.exists() {
        anyhow::bail!(Error::PathNotFound(display));
    }

    let file = File::open(path).with_context(|| Error::Open(display.clone()))?;
    let conf = serde_yaml::from_reader(file).with_context(|| Error::Decode(display))?;
    Ok(conf)
}
