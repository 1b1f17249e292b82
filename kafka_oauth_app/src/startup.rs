use crate::app_config::AppConfig;
use anyhow::Context;
use kafka_oauth::auth::TokenRefreshBridge;
use kafka_oauth::configurator::{self, EnvironmentValues};
use kafka_oauth::connection_settings::{ClientRole, ConnectionSettings};
use kafka_oauth::consumer::{log_message, ConsumeLoop, ConsumeSummary, ConsumerWrapper};
use kafka_oauth::contexts::{BrokerManagedRefresh, MainClientContext, RefreshHandler};
use kafka_oauth::producer::{ProduceLoop, ProduceSummary, ProducerWrapper, DEFAULT_MESSAGE_COUNT};
use kafka_oauth::run_state::RunState;
use tokio::runtime::Handle;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or("info".to_owned());

    println!("Log level: {}", log_level);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(log_level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .init();
}

/// Clears `run_state` on Ctrl-C or SIGTERM.
pub fn spawn_shutdown_listener(run_state: RunState) {
    tokio::spawn(async move {
        wait_for_termination().await;
        info!("Termination signal received, stopping");
        run_state.stop();
    });
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!("Unable to listen for SIGTERM: {e}");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

pub async fn run_consumer(config: AppConfig) -> Result<(), anyhow::Error> {
    let env = EnvironmentValues::from(&config);
    let (settings, registration) = configurator::build(&env, ClientRole::Consumer)
        .context("While building consumer settings")?;

    let run_state = RunState::new();
    spawn_shutdown_listener(run_state.clone());

    let summary = match registration {
        Some(registration) => {
            let bridge = TokenRefreshBridge::with_http_fetcher(registration, Handle::current())?;
            consume(settings, bridge, run_state).await?
        }
        None => consume(settings, BrokerManagedRefresh, run_state).await?,
    };

    info!(
        "Consumer finished: {} message(s), {} end-of-partition marker(s)",
        summary.messages, summary.partition_eofs
    );

    Ok(())
}

async fn consume<R: RefreshHandler>(
    settings: ConnectionSettings,
    refresh_handler: R,
    run_state: RunState,
) -> Result<ConsumeSummary, anyhow::Error> {
    tokio::task::spawn_blocking(move || -> Result<ConsumeSummary, anyhow::Error> {
        let consumer = ConsumerWrapper::create(&settings, MainClientContext::new(refresh_handler))
            .context("While creating consumer")?;

        ConsumeLoop::new(&consumer, run_state)
            .run(log_message)
            .with_context(|| format!("While consuming topic {}", settings.topic))
    })
    .await
    .context("Consumer loop panicked")?
}

pub async fn run_producer(config: AppConfig) -> Result<(), anyhow::Error> {
    let env = EnvironmentValues::from(&config);
    let (settings, registration) = configurator::build(&env, ClientRole::Producer)
        .context("While building producer settings")?;
    let message_count = config.message_count.unwrap_or(DEFAULT_MESSAGE_COUNT);

    let run_state = RunState::new();
    spawn_shutdown_listener(run_state.clone());

    let summary = match registration {
        Some(registration) => {
            let bridge = TokenRefreshBridge::with_http_fetcher(registration, Handle::current())?;
            produce(settings, bridge, run_state, message_count).await?
        }
        None => produce(settings, BrokerManagedRefresh, run_state, message_count).await?,
    };

    info!(
        "Producer finished: {} message(s) enqueued, {} delivered",
        summary.enqueued, summary.delivered
    );

    Ok(())
}

async fn produce<R: RefreshHandler>(
    settings: ConnectionSettings,
    refresh_handler: R,
    run_state: RunState,
    message_count: usize,
) -> Result<ProduceSummary, anyhow::Error> {
    tokio::task::spawn_blocking(move || -> Result<ProduceSummary, anyhow::Error> {
        let producer = ProducerWrapper::create(&settings, MainClientContext::new(refresh_handler))
            .context("While creating producer")?;

        ProduceLoop::new(&producer, run_state, &settings.topic)
            .with_message_count(message_count)
            .run()
            .with_context(|| format!("While producing to topic {}", settings.topic))
    })
    .await
    .context("Producer loop panicked")?
}
