//! The `vstorage` command: one storage operation per invocation against a
//! storage tree described by a JSON configuration file.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use vstorage::{Backend, MountableStorage, StorageConfig};

/// vstorage - One filesystem-like interface over mounted storages
#[derive(Parser, Debug)]
#[command(name = "vstorage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Storage tree configuration (JSON). Without it the host filesystem is used.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Check whether a file exists
    Exists { path: String },
    /// Write a file's contents to stdout
    Get { path: String },
    /// Store stdin (or --file) at a path
    Put {
        path: String,
        /// Read contents from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Move a file, across mounts if needed
    Rename {
        from: String,
        to: String,
        /// Replace the destination if it exists
        #[arg(long)]
        overwrite: bool,
    },
    /// Copy a file, across mounts if needed
    Copy { from: String, to: String },
    /// Delete a file or directory
    Delete { path: String },
    /// List mount points in routing order
    Mounts,
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Storage(#[from] vstorage::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Build the storage tree named by `cli` and run its command.
///
/// Returns whether the operation succeeded.
pub fn run(cli: &Cli, input: &mut dyn Read, output: &mut dyn Write) -> Result<bool, CliError> {
    let config = match &cli.config {
        Some(path) => StorageConfig::load(path)?,
        None => StorageConfig::default(),
    };
    let storage = config.build()?;
    execute(&storage, &cli.command, input, output)
}

pub fn execute(
    storage: &MountableStorage,
    command: &Command,
    input: &mut dyn Read,
    output: &mut dyn Write,
) -> Result<bool, CliError> {
    tracing::debug!(?command, "executing");
    let done = match command {
        Command::Exists { path } => {
            let exists = storage.exists(path)?;
            writeln!(output, "{}", exists)?;
            exists
        }
        Command::Get { path } => match storage.get_stream(path)? {
            Some(mut stream) => {
                io::copy(&mut stream, output)?;
                true
            }
            None => false,
        },
        Command::Put { path, file: Some(file) } => {
            let mut source = File::open(file)?;
            storage.put_stream(path, &mut source)?
        }
        Command::Put { path, file: None } => storage.put_stream(path, input)?,
        Command::Rename {
            from,
            to,
            overwrite,
        } => storage.rename(from, to, *overwrite)?,
        Command::Copy { from, to } => storage.copy(from, to)?,
        Command::Delete { path } => storage.delete(path)?,
        Command::Mounts => {
            for mount_point in storage.mount_points() {
                writeln!(
                    output,
                    "{}\t{}",
                    mount_point.virtual_path(),
                    mount_point.storage().name()
                )?;
            }
            true
        }
    };
    output.flush()?;
    Ok(done)
}
