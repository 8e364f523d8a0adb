//! Task Tracker
//!
//! Server-rendered task tracker: tasks with status and priority, comments
//! with media attachments, and likes.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use task_tracker::cli::{Cli, Command, CreateUserArgs, ServeArgs};
use task_tracker::config::Config;
use task_tracker::db::Database;
use task_tracker::logging::{self, LogTarget};
use task_tracker::media::MediaStore;
use task_tracker::types::validate_username;
use task_tracker::web::{TrackerServer, start_server};
use tracing::{info, warn};

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_dirs()?;
    Database::open(&config.server.db_path)
        .with_context(|| format!("opening database {}", config.server.db_path.display()))
}

async fn serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    info!("Database: {:?}", config.server.db_path);
    info!("Media dir: {:?}", config.server.media_dir);

    let db = open_database(&config)?;
    match db.purge_expired_sessions() {
        Ok(0) => {}
        Ok(n) => info!("Purged {} expired sessions", n),
        Err(e) => warn!("Failed to purge expired sessions: {:#}", e),
    }

    let state = TrackerServer::new(
        Arc::new(db),
        MediaStore::new(&config.server.media_dir),
        config.server.session_ttl(),
        config.server.max_upload_bytes,
    );

    let handle = start_server(state, config.server.addr()).await?;
    info!("Serving on http://{}", handle.addr());

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");
    handle.shutdown().await;
    Ok(())
}

fn create_user(config: &Config, args: CreateUserArgs) -> Result<()> {
    let username = args.username.trim();
    validate_username(username).map_err(|msg| anyhow::anyhow!("invalid username: {}", msg))?;
    if args.password.chars().count() < task_tracker::types::PASSWORD_MIN_LEN {
        anyhow::bail!(
            "password must contain at least {} characters",
            task_tracker::types::PASSWORD_MIN_LEN
        );
    }

    let db = open_database(config)?;
    let user = db.create_user(username, &args.password)?;
    println!("Created user '{}' (id {})", user.username, user.id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.server.db_path = database;
    }
    if let Some(media_dir) = cli.media_dir {
        config.server.media_dir = media_dir;
    }

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(config, args).await,
        Command::Migrate => {
            // Opening the database applies any pending migrations.
            open_database(&config)?;
            println!("Database {} is up to date", config.server.db_path.display());
            Ok(())
        }
        Command::CreateUser(args) => create_user(&config, args),
    }
}
