//! PortScope CLI - Inspect and kill processes on listening ports
//!
//! A command-line tool and terminal dashboard for finding which process
//! holds a port, what kind of service it is, and getting rid of it.

mod commands;
mod format;
mod logging;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portscope_core::ConfigStore;

#[derive(Parser)]
#[command(name = "portscope")]
#[command(author, version, about = "Inspect and kill processes on listening ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Disable interactive TUI mode
    #[arg(long, global = true)]
    no_tui: bool,

    /// Use an alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all listening ports, grouped by category
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Filter by process name
        #[arg(short = 'n', long)]
        name: Option<String>,
    },

    /// Kill process on a port
    Kill {
        /// Port number to kill
        port: u16,

        /// Force kill (SIGKILL) without graceful shutdown
        #[arg(short, long)]
        force: bool,
    },

    /// Show details about the process on a port
    Inspect {
        /// Port number to inspect
        port: u16,
    },

    /// Show current configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// With --init, replace an existing config file
        #[arg(short, long, requires = "init")]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => ConfigStore::with_path(path.clone()),
        None => ConfigStore::new()?,
    };

    let interactive =
        cli.command.is_none() && !cli.no_tui && atty::is(atty::Stream::Stdout);
    if interactive {
        logging::init_file(&store.config_dir().join("portscope.log"))?;
    } else {
        logging::init_stderr()?;
    }

    // a broken config file must not block rewriting it
    if let Some(Commands::Config { init: true, force }) = cli.command {
        return commands::config::init(&store, force).await;
    }

    let config = store.load().await?;

    match cli.command {
        Some(Commands::List { port, name }) => {
            commands::list::run(&config, port, name, cli.json).await?;
        }
        Some(Commands::Kill { port, force }) => {
            commands::kill::run(&config, port, force).await?;
        }
        Some(Commands::Inspect { port }) => {
            commands::inspect::run(&config, port, cli.json).await?;
        }
        Some(Commands::Config { .. }) => {
            commands::config::show(&store, &config, cli.json)?;
        }
        None => {
            // Default: Launch TUI or list ports
            if interactive {
                tui::run(&config).await?;
            } else {
                commands::list::run(&config, None, None, cli.json).await?;
            }
        }
    }

    Ok(())
}
