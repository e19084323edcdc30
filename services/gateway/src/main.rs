use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use parlor_engine::MemoryLedger;
use parlor_gateway::{config::GatewayConfig, router, AppState};
use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};
use tokio::time;
use tracing::{info, Level};

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    let matches = Command::new("parlor-gateway")
        .about("WebSocket gateway for the parlor tables.")
        .arg(Arg::new("config").long("config").required(false))
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate the config and exit without starting the gateway")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    config.validate()?;

    if matches.get_flag("dry-run") {
        println!("{:#?}", config.redacted_debug());
        println!("config ok");
        return Ok(());
    }

    serve(config)
}

#[tokio::main]
async fn serve(config: GatewayConfig) -> Result<()> {
    let log_level = Level::from_str(&config.log_level).context("invalid log level")?;
    tracing_subscriber::fmt().with_max_level(log_level).init();
    info!(config = ?config.redacted_debug(), "loaded config");

    let addr: SocketAddr = config.listen_addr.parse().context("invalid listen addr")?;
    let ledger = Arc::new(MemoryLedger::new());
    let state = AppState::new(&config, ledger);

    // Tick loop: one logical second per tick drives every room.
    let tick_state = state.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            let events = {
                let mut rooms = tick_state.rooms.lock().unwrap();
                rooms.tick_all()
            };
            tick_state.publish(events);
        }
    });

    let app = router(state);
    info!(%addr, "gateway listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
