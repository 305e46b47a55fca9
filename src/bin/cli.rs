//! shardstore CLI Client
//!
//! Command-line interface for interacting with a coordinator.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shardstore::{Client, Result, StoreError};

/// shardstore CLI
#[derive(Parser, Debug)]
#[command(name = "shardstore-cli")]
#[command(about = "CLI for the shardstore coordinator")]
struct Args {
    /// Coordinator address
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored files
    List,

    /// Upload a local file
    Upload {
        /// Path of the file to send
        path: PathBuf,

        /// Name to store it under (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Download a file into a directory
    Download {
        /// Stored file name
        name: String,

        /// Directory to save into (created if missing)
        dest_dir: PathBuf,
    },

    /// Delete a stored file
    Delete {
        /// Stored file name
        name: String,
    },

    /// Show how every file is spread across nodes
    Verify,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let client = Client::new(&args.server);

    match run(&client, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(client: &Client, command: Commands) -> Result<()> {
    match command {
        Commands::List => {
            let files = client.list_files()?;
            println!("Available files:");
            for file in files {
                println!(" - {}", file);
            }
        }
        Commands::Upload { path, name } => {
            let name = match name {
                Some(name) => name,
                None => file_name(&path)?,
            };
            let data = fs::read(&path)?;
            let size = data.len();
            client.upload(&name, data)?;
            println!("Uploaded {} ({} bytes)", name, size);
        }
        Commands::Download { name, dest_dir } => {
            let data = client.download(&name)?;
            fs::create_dir_all(&dest_dir)?;
            let target = dest_dir.join(&name);
            fs::write(&target, &data)?;
            println!("Downloaded {} to {}", name, target.display());
        }
        Commands::Delete { name } => {
            client.delete(&name)?;
            println!("Deleted {}", name);
        }
        Commands::Verify => {
            let distribution = client.verify()?;
            println!("Shard distribution:");
            for (file, shards) in distribution {
                println!("File: {}", file);
                for shard in shards {
                    println!("  - {}", shard);
                }
            }
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| StoreError::InvalidName(format!("{} has no file name", path.display())))
}
