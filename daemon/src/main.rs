//! Flowva Daemon - Main entry point

mod commands;
mod keeper;
mod session;
mod state;

use state::AppState;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flowva_daemon=debug,flowva_engine=debug,flowva_networking=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Flowva daemon");

    // Get data directory
    let data_dir = dirs_next::data_local_dir()
        .map(|p| p.join("Flowva"))
        .unwrap_or_else(|| PathBuf::from("."));

    // Session cipher keyed to the machine fingerprint (Argon2id + machine-uid)
    let cipher = match flowva_persistence::SessionCipher::machine_bound() {
        Ok(cipher) => cipher,
        Err(e) => {
            eprintln!("FATAL: Failed to derive machine encryption key: {}", e);
            eprintln!("This may happen if the machine-uid cannot be determined.");
            std::process::exit(1);
        }
    };

    // Create daemon state and open the local database
    let app_state = AppState::new(data_dir, cipher);
    if let Err(e) = app_state.init_db().await {
        eprintln!("FATAL: Failed to initialize database: {}", e);
        std::process::exit(1);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("login") => commands::login(&app_state, args.get(1).map(String::as_str)).await,
        Some("logout") => commands::logout(&app_state).await,
        Some("status") => {
            let as_json = args.iter().any(|a| a == "--json");
            commands::status(&app_state, as_json).await
        }
        Some("check-in") => commands::check_in(&app_state).await,
        Some("complete") => commands::complete(&app_state, args.get(1).map(String::as_str)).await,
        Some("redeem") => commands::redeem(&app_state, args.get(1).map(String::as_str)).await,
        Some("keeper") | None => run_keeper(app_state).await,
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run the streak keeper until Ctrl-C
async fn run_keeper(state: AppState) -> Result<(), String> {
    let handle = keeper::spawn_keeper(state);
    tracing::info!("Streak keeper running — Ctrl-C to stop");

    tokio::signal::ctrl_c().await.map_err(|e| e.to_string())?;
    handle.stop();

    Ok(())
}

fn print_usage() {
    eprintln!("Usage: flowva-daemon [COMMAND]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  keeper             Run the streak keeper loop (default)");
    eprintln!("  login <token>      Verify an access token and save the session");
    eprintln!("  logout             Drop the saved session");
    eprintln!("  status [--json]    Show stats, the weekly tracker, and catalogs");
    eprintln!("  check-in           Perform the daily check-in");
    eprintln!("  complete <quest>   Complete a quest and claim its reward");
    eprintln!("  redeem <reward>    Spend points on a reward");
}
