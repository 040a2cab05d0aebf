use clap::Parser;
use izumie::cli::Cli;
use izumie::config::Config;
use izumie::transport::BridgeTransport;
use izumie::{ConnectionManager, RunOutcome};
use mimalloc::MiMalloc;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Input errors are fatal before anything touches the network or the database.
    let invocation = match Cli::parse().into_invocation() {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("❌ {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let cfg = Config::load(invocation.config.as_deref())?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        auth_backend = ?cfg.auth.backend,
        id_timing = ?cfg.session.id_timing,
        bridge = %cfg.bridge.program,
        mode = %invocation.mode,
    );

    let db = izumie::db::spawn(&cfg.basic.database_url).await?;
    let auth = izumie::auth::open(&cfg.auth, &db).await?;
    let transport = BridgeTransport::new(cfg.bridge.clone());

    let mut manager = ConnectionManager::new(transport, auth, db, invocation.mode, &cfg)
        .with_session_id(invocation.session_id);

    let outcome = tokio::select! {
        outcome = manager.run() => outcome,
        () = shutdown_signal() => {
            warn!("interrupted before the session was linked");
            return Ok(ExitCode::FAILURE);
        }
    };

    match outcome {
        RunOutcome::Connected { session_id } => {
            info!(session_id = %session_id, "session linked and stored");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Halted(reason) => {
            error!(reason = %reason, "session was not linked");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
