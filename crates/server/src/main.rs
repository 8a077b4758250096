use std::{net::SocketAddr, path::PathBuf};

use clap::{ArgAction, Parser};
use home::home_dir;
use postboard_core::constant::{CONFIG_DIR, DB_FILE};
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing_subscriber::EnvFilter;

use postboard_server::{db, router, AppState};

#[derive(Parser)]
#[command(author, version, about, long_about=None)]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0:5000")]
    /// The socket address to serve on. For ex, 127.0.0.1:5000
    socket: SocketAddr,

    #[arg(long, value_name = "PATH")]
    /// Path to the sqlite Db, or a directory to keep it in;
    /// defaults to ~/.postboard/postboard.db
    db: Option<PathBuf>,

    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "db")]
    /// Use a throwaway Db in the temp directory, removed on Ctrl-C
    temp_db: bool,
}

fn default_db_path() -> PathBuf {
    let home_dir = home_dir().unwrap_or_else(std::env::temp_dir);
    home_dir.join(CONFIG_DIR).join(DB_FILE)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let db_path = if args.temp_db {
        db::generate_temp_db()
    } else {
        args.db.unwrap_or_else(default_db_path)
    };
    let (conn, db_path) = db::setup_db(Some(db_path))?;
    let state = AppState::new(conn)?;

    let listener = TcpListener::bind(args.socket).await?;
    tracing::info!("Listening on {}...", listener.local_addr()?);
    println!("Press Ctrl-C to stop the server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = ctrl_c().await {
                tracing::error!(error = %e, "unable to listen for Ctrl-C");
            }
            println!("\nCtrl-C");
        })
        .await?;

    if args.temp_db {
        std::fs::remove_file(&db_path)?;
        tracing::info!(path = %db_path.display(), "removed temp db");
    }

    Ok(())
}
