use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use treefs_core::FileSystem;
use treefs_remote::Server;
use treefs_script::Interpreter;

/// TreeFS - networked in-memory file store
#[derive(Parser, Debug)]
#[command(name = "treefs")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Serve an authoritative tree over TCP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0:5500")]
        addr: String,

        /// Snapshot file backing the tree
        #[arg(long, default_value = "fs.json")]
        data: PathBuf,

        /// Durable per-request error log
        #[arg(long, default_value = "server_errors.log")]
        log: PathBuf,
    },

    /// Run scripts concurrently against a local tree
    Run {
        /// Script files, one thread each
        scripts: Vec<PathBuf>,

        /// Snapshot file backing the tree (omit for an ephemeral tree)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Cap on simultaneously open handles
        #[arg(long)]
        max_open: Option<usize>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let result = match args.command {
        CliCommand::Serve { addr, data, log } => serve(&addr, data, log),
        CliCommand::Run {
            scripts,
            data,
            max_open,
        } => run(&scripts, data, max_open),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn serve(addr: &str, data: PathBuf, log: PathBuf) -> Result<ExitCode, treefs_core::Error> {
    let fs = Arc::new(FileSystem::load(data)?);
    let server = Server::bind(addr, fs)?.with_error_log(log);
    println!("treefs server listening on {}", server.local_addr()?);
    server.run()
}

fn run(
    scripts: &[PathBuf],
    data: Option<PathBuf>,
    max_open: Option<usize>,
) -> Result<ExitCode, treefs_core::Error> {
    let mut fs = match data {
        Some(path) => FileSystem::load(path)?,
        None => FileSystem::new(),
    };
    if let Some(cap) = max_open {
        fs = fs.with_max_open(cap);
    }

    let mut sources = Vec::with_capacity(scripts.len());
    for path in scripts {
        let source = std::fs::read_to_string(path).map_err(|e| treefs_core::Error::Snapshot {
            message: format!("{}: {}", path.display(), e),
        })?;
        sources.push(source);
    }

    let interp = Interpreter::new(Arc::new(fs));
    let mut failed = false;
    for (path, outcome) in scripts.iter().zip(interp.run_concurrent(&sources)) {
        match outcome {
            Ok(transcript) => {
                for line in transcript {
                    println!("{}", line);
                }
            }
            Err(e) => {
                failed = true;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
