use std::sync::Arc;

use kunai_app::app::api::routes;
use kunai_app::config::ConfigHandler;
use kunai_core::config::load_config;
use kunai_service::clock::SystemClock;
use kunai_service::command::SchedulingContext;
use kunai_service::depot::SchedulingContextHandler;
use kunai_service::reminder::{ReminderScheduler, sink_from_config};
use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Kunai scheduling server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let context = Arc::new(SchedulingContext::from_settings(&config, Arc::new(SystemClock))?);

    let reminders = Arc::new(ReminderScheduler::new(
        context.registry(),
        sink_from_config(&config.scheduler),
        context.clock(),
        (&config.scheduler).into(),
    ));
    let _reminder_task = reminders.run();

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .hoop(SchedulingContextHandler { context })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
