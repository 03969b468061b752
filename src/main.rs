//! Settlements Processor service
//!
//! ```text
//! notifications ─▶ FileListener ─▶ IngestionPipeline ─▶ MakePayment ─▶ outbound channel ─▶ ProviderDispatcher
//!                                        │                   │                                  │
//!                                   BalanceGate       InstructionStore ◀──────────────────────────┘
//!                                                            ▲
//! provider events ─▶ ProviderEventConsumer ──────────────────┘
//! ```
//!
//! The HTTP gateway, the listener, the event consumer, the dispatcher
//! workers and the health sweeper share one shutdown signal (Ctrl-C).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

use settlements_processor::config::AppConfig;
use settlements_processor::db::Database;
use settlements_processor::events::ProviderEventConsumer;
use settlements_processor::feature_flags::StaticFeatureFlags;
use settlements_processor::funding::{BalanceGate, HttpFundingApi};
use settlements_processor::gateway::{self, AppState};
use settlements_processor::health::{HealthSweeper, ObjectStoreHealth, QueueHealth, StoreHealth};
use settlements_processor::listener::{FileListener, IngestionPipeline};
use settlements_processor::payment::PaymentProvider;
use settlements_processor::provider::{HttpProviderClient, ProviderDispatcher, outbound_channel};
use settlements_processor::queue::{MessageQueue, PgMessageQueue};
use settlements_processor::replay::ReplayService;
use settlements_processor::shutdown::ShutdownSignal;
use settlements_processor::storage::{LocalObjectStore, ObjectStore};
use settlements_processor::store::{InstructionStore, PgInstructionStore};
use settlements_processor::usecase::MakePayment;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() {
    let env = get_env();
    let mut app_config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }

    let _log_guard = settlements_processor::logging::init_logging(&app_config);
    info!(
        env = %env,
        version = env!("CARGO_PKG_VERSION"),
        "Starting settlements processor"
    );

    if let Err(e) = run(app_config).await {
        error!(error = %format!("{:#}", e), "Settlements processor failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let shutdown = ShutdownSignal::new();

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let pg_store = PgInstructionStore::new(&db);
    pg_store.init_schema().await?;
    PgMessageQueue::init_schema(&db).await?;
    let store: Arc<dyn InstructionStore> = Arc::new(pg_store);

    let notifications: Arc<dyn MessageQueue> =
        Arc::new(PgMessageQueue::new(&db, &config.queues.notifications));
    let dead_letters: Arc<dyn MessageQueue> =
        Arc::new(PgMessageQueue::new(&db, &config.queues.dead_letter));
    let provider_events: Arc<dyn MessageQueue> =
        Arc::new(PgMessageQueue::new(&db, &config.queues.provider_events));
    let objects: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(&config.object_store.root_dir));

    let funding = HttpFundingApi::new(
        &config.funding.endpoint,
        Duration::from_millis(config.funding.timeout_ms),
    )?;
    let provider_timeout = Duration::from_millis(config.providers.timeout_ms);
    let domestic = HttpProviderClient::new(&config.providers.domestic_endpoint, provider_timeout)?;
    let cross_border =
        HttpProviderClient::new(&config.providers.cross_border_endpoint, provider_timeout)?;

    // Make-payment ─▶ dispatcher
    let (outbound, inbound) = outbound_channel(config.providers.outbound_buffer);
    let make_payment = Arc::new(MakePayment::new(store.clone(), outbound));
    let dispatcher = Arc::new(
        ProviderDispatcher::new(inbound, store.clone(), shutdown.clone())
            .with_client(PaymentProvider::Domestic, Arc::new(domestic))
            .with_client(PaymentProvider::CrossBorder, Arc::new(cross_border)),
    );
    let mut tasks = dispatcher.spawn(config.providers.dispatch_workers);

    let pipeline = Arc::new(IngestionPipeline::new(
        BalanceGate::new(Arc::new(funding)),
        make_payment.clone(),
    ));
    let replay = Arc::new(ReplayService::new(objects.clone(), pipeline.clone()));

    let listener = FileListener::new(
        notifications.clone(),
        dead_letters.clone(),
        objects.clone(),
        pipeline,
        Arc::new(StaticFeatureFlags::new(config.features.ingestion_enabled)),
        config.listener_config(),
        shutdown.clone(),
    );
    tasks.push(tokio::spawn(async move { listener.run().await }));

    let consumer = ProviderEventConsumer::new(
        provider_events.clone(),
        store.clone(),
        config.event_consumer_config(),
        shutdown.clone(),
    );
    tasks.push(tokio::spawn(async move { consumer.run().await }));

    let sweeper = HealthSweeper::new(
        Duration::from_millis(config.health.interval_ms),
        Duration::from_millis(config.health.ping_timeout_ms),
    )
    .register(Arc::new(StoreHealth(store.clone())))
    .register(Arc::new(QueueHealth(notifications)))
    .register(Arc::new(QueueHealth(dead_letters.clone())))
    .register(Arc::new(QueueHealth(provider_events)))
    .register(Arc::new(ObjectStoreHealth(objects)));
    let health = sweeper.handle();
    {
        let shutdown = shutdown.clone();
        tasks.push(tokio::spawn(async move { sweeper.run(shutdown).await }));
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            info!("Shutdown requested");
            shutdown.trigger();
        });
    }

    let state = Arc::new(
        AppState::new(store, make_payment, replay, health).with_dead_letter_queue(dead_letters),
    );
    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid gateway address {}:{}",
                config.gateway.host, config.gateway.port
            )
        })?;
    let served = gateway::run_server(addr, state, shutdown.clone()).await;
    // the server may also stop on a bind failure
    shutdown.trigger();

    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "Background task panicked");
        }
    }
    served.context("Gateway failed")?;
    info!("Settlements processor stopped");
    Ok(())
}
