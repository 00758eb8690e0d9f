use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::client::{DEFAULT_CHUNK_SIZE, LocalClient};
use crate::config::Config;
use crate::error::FileError;

#[derive(Parser, Debug)]
#[command(name = "fileobj", version, about = "Read, write and copy files through mode-checked handles")]
pub struct Cli {
    /// Directory every path is resolved against
    #[arg(long, env = "FILEOBJ_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Default chunk size for binary copies
    #[arg(long, env = "FILEOBJ_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "FILEOBJ_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a text file
    Cat {
        path: PathBuf,
        /// Prefix every line with its number
        #[arg(short, long)]
        lines: bool,
    },
    /// Print COUNT bytes starting at OFFSET
    Read {
        path: PathBuf,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(short = 'n', long)]
        count: usize,
    },
    /// Write DATA into a file
    Write {
        path: PathBuf,
        #[arg(short, long)]
        data: String,
        /// Seek here before writing
        #[arg(long)]
        offset: Option<u64>,
        /// Access mode token (w, a, r+, w+, a+, wb, ...)
        #[arg(short, long, default_value = "w")]
        mode: String,
    },
    /// Copy SRC to DST
    Copy {
        src: PathBuf,
        dst: PathBuf,
        /// Chunk size for this copy, overriding FILEOBJ_CHUNK_SIZE
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Copy line by line as text instead of binary chunks
        #[arg(long)]
        text: bool,
    },
    /// Empty a file, creating it if needed
    Truncate { path: PathBuf },
    /// Show name, mode, size and closed flag of a handle
    Info {
        path: PathBuf,
        #[arg(short, long, default_value = "r")]
        mode: String,
    },
}

/// Runs one command against the directory in `config`, writing results to `out`.
pub fn execute<W: Write>(command: &Commands, config: &Config, out: &mut W) -> Result<()> {
    let client = LocalClient::new_local(&config.root);
    match command {
        Commands::Cat { path, lines } => {
            client.with_open(path, "r", |f| -> Result<()> {
                for (idx, line) in f.lines().enumerate() {
                    let line = line.with_context(|| format!("failed to read {}", path.display()))?;
                    if *lines {
                        write!(out, "{:>6}  {line}", idx + 1)?;
                    } else {
                        write!(out, "{line}")?;
                    }
                }
                Ok(())
            })?;
        }
        Commands::Read {
            path,
            offset,
            count,
        } => {
            let data = client
                .read_range(path, *offset, *count)
                .with_context(|| format!("failed to read {}", path.display()))?;
            out.write_all(&data)?;
        }
        Commands::Write {
            path,
            data,
            offset,
            mode,
        } => {
            let written = client.with_open(path, mode, |f| -> Result<usize, FileError> {
                if let Some(offset) = offset {
                    f.seek(*offset)?;
                }
                if f.open_mode().binary {
                    f.write(data.as_bytes())
                } else {
                    f.write_str(data)
                }
            });
            let written = written.with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "wrote {written} to {}", path.display())?;
        }
        Commands::Copy {
            src,
            dst,
            chunk_size,
            text,
        } => {
            let context = || format!("failed to copy {} to {}", src.display(), dst.display());
            if *text {
                let lines = client.copy_lines(src, dst).with_context(context)?;
                writeln!(out, "copied {lines} lines")?;
            } else {
                let chunk_size = chunk_size.unwrap_or(config.chunk_size);
                let bytes = client
                    .copy_chunked(src, dst, chunk_size)
                    .with_context(context)?;
                writeln!(out, "copied {bytes} bytes")?;
            }
        }
        Commands::Truncate { path } => {
            client
                .truncate(path)
                .with_context(|| format!("failed to truncate {}", path.display()))?;
        }
        Commands::Info { path, mode } => {
            let mut f = client
                .open(path, mode)
                .with_context(|| format!("failed to open {}", path.display()))?;
            writeln!(out, "name: {}", f.name().display())?;
            writeln!(out, "mode: {}", f.mode())?;
            writeln!(out, "size: {}", f.size()?)?;
            writeln!(out, "closed: {}", f.closed())?;
            f.close()?;
            writeln!(out, "closed: {}", f.closed())?;
        }
    }
    Ok(())
}
