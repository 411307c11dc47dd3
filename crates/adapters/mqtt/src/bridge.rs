//! Event loop driving the broker connection and feeding messages to the
//! ingestion service.

use std::future::Future;

use hearth_app::dispatcher::ActuationSink;
use hearth_app::ports::{DeviceRepository, EventLog, NotificationDispatcher, PlanRegistry};
use hearth_app::services::ingestion_service::IngestionService;
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS, SubscribeFilter};

use crate::config::MqttConfig;
use crate::gateway::MqttGateway;
use crate::routing::{Route, RoutingTable, decode_payload};

const REQUEST_CAPACITY: usize = 64;

/// Owns the connection to the broker.
pub struct MqttBridge {
    config: MqttConfig,
    client: AsyncClient,
    event_loop: EventLoop,
    table: RoutingTable,
}

/// Create the bridge and a gateway publishing through the same client.
///
/// Nothing touches the network until [`MqttBridge::run`] polls the
/// connection.
#[must_use]
pub fn connect(config: MqttConfig, table: RoutingTable) -> (MqttBridge, MqttGateway) {
    let (client, event_loop) = AsyncClient::new(config.options(), REQUEST_CAPACITY);
    let gateway = MqttGateway::new(client.clone(), config.clone());
    let bridge = MqttBridge {
        config,
        client,
        event_loop,
        table,
    };
    (bridge, gateway)
}

impl MqttBridge {
    /// Poll the connection until `shutdown` resolves.
    ///
    /// Every (re)connection subscribes to all routed feeds. Connection errors
    /// are logged and retried after the configured delay. Messages are
    /// handled one at a time, in arrival order.
    pub async fn run<P, L, D, N, A>(
        mut self,
        ingestion: &IngestionService<P, L, D, N, A>,
        shutdown: impl Future<Output = ()>,
    ) where
        P: PlanRegistry,
        L: EventLog,
        D: DeviceRepository,
        N: NotificationDispatcher,
        A: ActuationSink,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            feeds = self.table.len(),
            "mqtt bridge started"
        );
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                polled = self.event_loop.poll() => match polled {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => self.subscribe_all().await,
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        deliver(&self.table, ingestion, &publish.topic, &publish.payload).await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "mqtt connection error");
                        tokio::time::sleep(self.config.reconnect_delay()).await;
                    }
                },
            }
        }
        if let Err(err) = self.client.try_disconnect() {
            tracing::debug!(error = %err, "mqtt disconnect not sent");
        }
        tracing::info!("mqtt bridge stopped");
    }

    async fn subscribe_all(&mut self) {
        let filters: Vec<SubscribeFilter> = self
            .table
            .topics()
            .into_iter()
            .map(|topic| SubscribeFilter::new(topic, QoS::AtLeastOnce))
            .collect();
        if filters.is_empty() {
            tracing::warn!("connected but no feeds to subscribe to");
            return;
        }
        let count = filters.len();
        match self.client.subscribe_many(filters).await {
            Ok(()) => tracing::info!(count, "subscribed to feeds"),
            Err(err) => tracing::warn!(error = %err, "feed subscription failed"),
        }
    }
}

/// Route one feed message to the ingestion service.
///
/// Unknown topics and undecodable payloads are dropped. Ingestion errors are
/// logged and never stop the loop.
pub async fn deliver<P, L, D, N, A>(
    table: &RoutingTable,
    ingestion: &IngestionService<P, L, D, N, A>,
    topic: &str,
    payload: &[u8],
) where
    P: PlanRegistry,
    L: EventLog,
    D: DeviceRepository,
    N: NotificationDispatcher,
    A: ActuationSink,
{
    let Some(route) = table.resolve(topic) else {
        tracing::debug!(%topic, "message on unrouted topic");
        return;
    };
    let Some(value) = decode_payload(payload) else {
        tracing::warn!(%topic, "dropping undecodable payload");
        return;
    };
    let result = match route {
        Route::Device(device) => ingestion
            .record_device_value(&device, value)
            .await
            .map(|_| ()),
        Route::Sensor(sensor) => ingestion
            .record_sensor_reading(&sensor, value)
            .await
            .map(|verdicts| {
                if !verdicts.is_empty() {
                    tracing::info!(sensor = %sensor.name, breaches = verdicts.len(), "threshold breached");
                }
            }),
    };
    if let Err(err) = result {
        tracing::warn!(error = %err, %topic, "failed to ingest feed message");
    }
}
