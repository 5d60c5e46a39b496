use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tollgate::cli::{KeyArgs, RbacArgs, ServeArgs, run_init_container, run_pki, run_rbac};
use tollgate::id::IdGenerator;
use tollgate::pki::ROTATION_INTERVAL;
use tollgate::server::{AppState, create_router};
use tollgate::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "A token authorization server for container registries", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level for tollgate targets, on top of RUST_LOG
    #[arg(long, global = true, env = "TOLLGATE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve(ServeArgs),

    /// Generate a signing key and self-signed certificate and print them as PEM
    Pki(KeyArgs),

    /// Fetch the certificate bundle from a running server into a file
    InitContainer {
        /// Base URL of the tollgate server
        #[arg(long, env = "TOLLGATE_SERVER", default_value = "http://127.0.0.1:4315")]
        server: String,

        /// Where to write the PEM bundle
        path: PathBuf,
    },

    /// Manage users, groups and permissions on a running server
    Rbac(RbacArgs),
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
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

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.into_config();

    let store = SqliteStore::new(&config.database)?;
    store.initialize()?;
    let store: Arc<dyn Store> = Arc::new(store);

    let ids = Arc::new(IdGenerator::new(config.resolved_node_id())?);
    info!("Using node id {}", ids.node());

    let state = Arc::new(AppState::new(store, ids, &config));

    if config.root_credentials().is_none()
        && (config.root_user.is_some() || config.root_password.is_some())
    {
        warn!("root user needs both a name and a password; skipping");
    }
    state.rbac.bootstrap_principals(config.root_credentials())?;

    let credential = state.keys.bootstrap(Utc::now())?;
    info!(
        id = credential.id,
        algorithm = %credential.algorithm,
        expires_at = %credential.expires_at,
        "Signing with credential {}",
        credential.id
    );

    let rotation = config
        .pki
        .generate
        .then(|| Arc::clone(&state.keys).spawn_rotation(ROTATION_INTERVAL));

    let app = create_router(Arc::clone(&state));
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutting down");
            let _ = stop_tx.send(true);
        })
        .into_future();

    let grace = config.shutdown_grace;
    tokio::select! {
        result = server => result?,
        () = async {
            let _ = stop_rx.wait_for(|stopping| *stopping).await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("Shutdown grace period of {}s elapsed; dropping in-flight requests", grace.as_secs());
        }
    }

    if let Some(rotation) = rotation {
        rotation.abort();
        let _ = rotation.await;
    }
    // Last handle on the store; the connection closes with it.
    drop(state);
    info!("Shutdown complete");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("tollgate={}", cli.log_level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await?,
        Commands::Pki(args) => run_pki(&args)?,
        Commands::InitContainer { server, path } => {
            tokio::task::spawn_blocking(move || run_init_container(&server, &path)).await??;
        }
        Commands::Rbac(args) => {
            tokio::task::spawn_blocking(move || run_rbac(args)).await??;
        }
    }

    Ok(())
}
