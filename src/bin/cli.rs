//! remcon CLI Client
//!
//! One-shot command-line client for the remote-control protocol: each
//! invocation opens a connection, performs its command, and ends the
//! session.

use std::fs::{self, File};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use remcon::{Client, Result};

/// remcon CLI
#[derive(Parser, Debug)]
#[command(name = "remcon-cli")]
#[command(about = "CLI client for the remcon remote-control server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:14222")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture a screenshot on the server
    Screenshot {
        /// Server-side path to save the image at
        dest: String,
    },

    /// Download a file from the server
    Fetch {
        /// File path on the server
        remote: String,

        /// Local path to save the file at
        local: String,
    },

    /// List a directory on the server
    Ls {
        /// Directory path on the server
        path: String,
    },

    /// Delete a file on the server
    Rm {
        /// File path on the server
        path: String,
    },

    /// Copy a file on the server
    Cp {
        /// Source path on the server (no spaces)
        src: String,

        /// Destination path on the server
        dst: String,
    },

    /// Execute a program or shell command on the server
    Exec {
        /// Command line to run
        command: String,
    },
}

fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;

    match &args.command {
        Commands::Screenshot { dest } => {
            let message = client.screenshot(dest)?;
            println!("{}", message);
        }

        Commands::Fetch { remote, local } => {
            let mut file = File::create(local)?;
            match client.fetch_file(remote, &mut file) {
                Ok(bytes) => println!("saved {} ({} bytes) to {}", remote, bytes, local),
                Err(e) => {
                    // A short transfer is a failed transfer; drop the
                    // partial file instead of leaving it half-written.
                    drop(file);
                    let _ = fs::remove_file(local);
                    return Err(e);
                }
            }
        }

        Commands::Ls { path } => {
            let names = client.list_dir(path)?;
            if names.is_empty() {
                println!("(empty directory)");
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }

        Commands::Rm { path } => {
            let message = client.delete_file(path)?;
            println!("{}", message);
        }

        Commands::Cp { src, dst } => {
            let message = client.copy_file(src, dst)?;
            println!("{}", message);
        }

        Commands::Exec { command } => {
            let message = client.execute(command)?;
            println!("{}", message);
        }
    }

    client.exit()?;
    Ok(())
}
