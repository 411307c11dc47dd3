//! The daemon: feed ingestion, threshold alerts and the schedule loop until
//! a termination signal arrives.

use std::sync::Arc;

use hearth_adapter_mqtt::RoutingTable;
use hearth_adapter_storage_sqlite_sqlx::{
    SqliteDeviceRepository, SqliteEventLog, SqliteNotificationStore, SqlitePasscodeStore,
    SqlitePlanRegistry,
};
use hearth_adapter_virtual::{Feedback, VirtualGateway};
use hearth_app::dispatcher::ActuationDispatcher;
use hearth_app::schedule_engine::{ScheduleEngine, ScheduleRunner};
use hearth_app::services::ingestion_service::IngestionService;
use hearth_app::threshold::ThresholdEvaluator;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::config::Config;
use crate::gateway::HubGateway;
use crate::stores::{Inventory, Stores};

type Dispatcher = ActuationDispatcher<HubGateway, SqlitePasscodeStore>;
type Ingestion = IngestionService<
    SqlitePlanRegistry,
    SqliteEventLog,
    SqliteDeviceRepository,
    SqliteNotificationStore,
    Dispatcher,
>;

/// Run until SIGINT or SIGTERM, then stop every loop and wait for in-flight
/// actuations.
pub async fn run(config: &Config, stores: Stores, inventory: Inventory) -> anyhow::Result<()> {
    let (gateway, bridge, feedback) = if config.mqtt.enabled {
        let table = RoutingTable::new(&config.mqtt.client, inventory.devices, inventory.sensors);
        let (bridge, gateway) = hearth_adapter_mqtt::connect(config.mqtt.client.clone(), table);
        (HubGateway::Mqtt(gateway), Some(bridge), None)
    } else {
        tracing::info!("mqtt disabled, actuating simulated devices");
        let (gateway, feedback) = VirtualGateway::with_feedback();
        (HubGateway::Virtual(gateway), None, Some(feedback))
    };

    let dispatcher = ActuationDispatcher::new(
        gateway,
        stores.passcodes.clone(),
        config.dispatch_options(),
    );
    let evaluator = ThresholdEvaluator::new(
        stores.plans.clone(),
        stores.log.clone(),
        stores.devices.clone(),
        stores.notifications.clone(),
        dispatcher.clone(),
    );
    let ingestion: Arc<Ingestion> = Arc::new(IngestionService::new(
        stores.log.clone(),
        stores.devices.clone(),
        evaluator,
    ));
    let runner = ScheduleRunner::new(ScheduleEngine::new(
        stores.schedules.clone(),
        stores.devices.clone(),
        stores.log.clone(),
        dispatcher.clone(),
    ));

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    let period = config.tick_period();
    let stop = stop_rx.clone();
    tasks.spawn(async move { runner.run(period, stopped(stop)).await });

    if let Some(bridge) = bridge {
        let ingestion = Arc::clone(&ingestion);
        let stop = stop_rx.clone();
        tasks.spawn(async move { bridge.run(ingestion.as_ref(), stopped(stop)).await });
    }
    if let Some(feedback) = feedback {
        tasks.spawn(echo_feedback(feedback, Arc::clone(&ingestion), stop_rx));
    }

    tracing::info!("hearthd running");
    termination().await;
    tracing::info!("shutting down");

    stop_tx.send_replace(true);
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "background task failed");
        }
    }
    dispatcher.drain().await;
    tracing::info!("hearthd stopped");
    Ok(())
}

/// Record the values simulated devices report back, like a broker echo.
async fn echo_feedback(
    mut feedback: mpsc::UnboundedReceiver<Feedback>,
    ingestion: Arc<Ingestion>,
    stop: watch::Receiver<bool>,
) {
    let stop = stopped(stop);
    tokio::pin!(stop);
    loop {
        tokio::select! {
            () = &mut stop => break,
            report = feedback.recv() => {
                let Some(report) = report else { break };
                if let Err(err) = ingestion
                    .record_device_value(&report.device, &report.value)
                    .await
                {
                    tracing::warn!(error = %err, device = %report.device.id, "failed to record feedback");
                }
            }
        }
    }
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    if stop.wait_for(|stopped| *stopped).await.is_err() {
        tracing::debug!("stop signal sender dropped");
    }
}

async fn termination() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
