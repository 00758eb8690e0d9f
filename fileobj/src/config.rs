use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[derive(Clone, Debug)]
pub struct Config {
    /// Directory every path on the command line is resolved against.
    pub root: PathBuf,
    /// Default chunk size for binary copies.
    pub chunk_size: usize,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Config {
    /// Validates the command-line and environment settings, reporting every
    /// problem at once.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut validation_errors = Vec::new();

        match std::fs::metadata(&cli.root) {
            Ok(meta) if !meta.is_dir() => validation_errors.push(format!(
                "FILEOBJ_ROOT `{}` exists but is not a directory",
                cli.root.display()
            )),
            Ok(_) => {}
            Err(_) => validation_errors.push(format!(
                "FILEOBJ_ROOT `{}` does not exist",
                cli.root.display()
            )),
        }

        if let Err(e) = EnvFilter::try_new(&cli.log_level) {
            validation_errors.push(format!(
                "FILEOBJ_LOG `{}` is not a valid filter: {e}",
                cli.log_level
            ));
        }

        if cli.chunk_size == 0 {
            validation_errors.push("FILEOBJ_CHUNK_SIZE must be at least 1".to_string());
        }

        if !validation_errors.is_empty() {
            bail!(validation_errors.join("\n"));
        }

        Ok(Config {
            root: cli.root.clone(),
            chunk_size: cli.chunk_size,
            log_level: cli.log_level.clone(),
        })
    }

    /// Filter for the log subscriber: `RUST_LOG` when set, `log_level` otherwise.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}
