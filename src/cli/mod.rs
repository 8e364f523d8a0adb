//! CLI command definitions for task-tracker
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Task tracker web server and management commands
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Path to media directory (overrides config)
    #[arg(short, long, global = true)]
    pub media_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server (default if no subcommand given)
    Serve(ServeArgs),

    /// Apply database migrations and exit
    Migrate,

    /// Create a user account
    CreateUser(CreateUserArgs),
}

/// Options for `serve`.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Options for `create-user`.
#[derive(Args, Debug)]
pub struct CreateUserArgs {
    /// Username of the new account
    pub username: String,

    /// Password; read from TASK_TRACKER_PASSWORD when omitted
    #[arg(long, env = "TASK_TRACKER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["task-tracker", "-d", "x.db"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.database, Some(PathBuf::from("x.db")));
    }

    #[test]
    fn serve_accepts_port_override() {
        let cli = Cli::try_parse_from(["task-tracker", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(9000)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn create_user_takes_password_flag() {
        let cli = Cli::try_parse_from([
            "task-tracker",
            "create-user",
            "alice",
            "--password",
            "hunter22hunter",
        ])
        .unwrap();
        match cli.command {
            Some(Command::CreateUser(args)) => {
                assert_eq!(args.username, "alice");
                assert_eq!(args.password, "hunter22hunter");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
