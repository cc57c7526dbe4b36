use spectre_relay::config::RelayConfig;
use spectre_relay::Orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::load()?;

    let filter = tracing_subscriber::EnvFilter::try_new(&config.global.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(domains = config.domains.len(), "starting spectre-relay");

    let orchestrator = Orchestrator::new(config.clone())?;
    let health_state = orchestrator.health_state();
    let cancel = orchestrator.cancellation_token();

    let health_cancel = cancel.clone();
    let health_port = config.global.health_port;
    let health_task = tokio::spawn(async move {
        if let Err(e) = spectre_relay::health::serve(health_port, health_state, health_cancel).await {
            tracing::error!(error = %e, "health endpoint exited");
        }
    });

    let signal_cancel = cancel.clone();
    let signal_task = tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received");
        signal_cancel.cancel();
    });

    orchestrator.run().await?;
    signal_task.abort();
    health_task.abort();

    tracing::info!("spectre-relay exited cleanly");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");
    let mut sigquit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
        _ = sighup.recv() => {}
        _ = sigquit.recv() => {}
    }
}
