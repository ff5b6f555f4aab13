use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{BrokerAddress, MqttConfig};
use super::error::{ConnectionError, PublishError};
use super::message::{Ack, DeliveryOptions};

/// How long `shutdown` waits for the DISCONNECT packet to leave the socket
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Closed,
}

/// Anything the relay endpoint can hand a command to.
///
/// `MqttHandle` is the production implementation; tests swap in an in-memory
/// recorder.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        options: DeliveryOptions,
    ) -> Result<Ack, PublishError>;
}

/// Owner of the single process-wide broker session.
///
/// The rumqttc event loop runs in its own task; the handle keeps the cloneable
/// client half for publishing and a watch receiver mirroring the session state.
pub struct MqttHandle {
    client: AsyncClient,
    broker: String,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttHandle {
    /// Starts connecting to the configured broker and returns immediately.
    ///
    /// Only a malformed broker URL or publish topic fails here. An unreachable
    /// broker shows up later as error lines in the log and `NotConnected` on
    /// publish.
    pub fn connect(config: &MqttConfig) -> Result<Self, ConnectionError> {
        let address = BrokerAddress::parse(&config.broker_url)?;
        if config.topic.is_empty() || !rumqttc::valid_topic(&config.topic) {
            return Err(ConnectionError::InvalidTopic(config.topic.clone()));
        }
        let client_id = config.client_id();

        let mut mqtt_options =
            MqttOptions::new(client_id.clone(), address.host.clone(), address.port);
        mqtt_options
            .set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)))
            .set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(mqtt_options, config.request_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancel = CancellationToken::new();

        let broker = format!("{}:{}", address.host, address.port);
        info!("Connecting to MQTT broker {} as '{}'", broker, client_id);

        let task = tokio::spawn(run_event_loop(
            eventloop,
            state_tx,
            cancel.clone(),
            broker.clone(),
            Duration::from_millis(config.reconnect_delay_ms),
        ));

        Ok(Self {
            client,
            broker,
            state_rx,
            cancel,
            event_loop: Mutex::new(Some(task)),
        })
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Sends DISCONNECT when a session is up, then stops the event loop task.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub async fn shutdown(&self) {
        let Some(mut task) = self.event_loop.lock().await.take() else {
            debug!("MQTT handle for {} already shut down", self.broker);
            return;
        };

        info!("Shutting down MQTT connection to {}", self.broker);

        if self.connection_state() == ConnectionState::Connected {
            if let Err(e) = self.client.try_disconnect() {
                warn!("Could not queue DISCONNECT for {}: {}", self.broker, e);
                self.cancel.cancel();
            }
        } else {
            self.cancel.cancel();
        }

        match tokio::time::timeout(DISCONNECT_GRACE, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("MQTT event loop task panicked: {}", e),
            Err(_) => {
                warn!("MQTT event loop did not stop within {:?}, cancelling", DISCONNECT_GRACE);
                self.cancel.cancel();
                if let Err(e) = task.await {
                    error!("MQTT event loop task panicked: {}", e);
                }
            }
        }
    }
}

#[async_trait]
impl CommandPublisher for MqttHandle {
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        options: DeliveryOptions,
    ) -> Result<Ack, PublishError> {
        if self.connection_state() != ConnectionState::Connected {
            return Err(PublishError::NotConnected);
        }

        // try_publish never waits on a saturated request channel
        self.client
            .try_publish(topic, options.qos, options.retain, payload.to_string())?;

        Ok(Ack::new(topic, payload))
    }
}

impl Drop for MqttHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drives the rumqttc event loop and mirrors lifecycle transitions into the
/// watch channel and the log.
///
/// Polling again after an error makes rumqttc re-dial the broker; the fixed
/// delay keeps a dead broker from turning this into a busy loop.
async fn run_event_loop(
    mut eventloop: EventLoop,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    broker: String,
    reconnect_delay: Duration,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("MQTT event loop for {} cancelled", broker);
                break;
            }

            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker {}", broker);
                    state_tx.send_replace(ConnectionState::Connected);
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("MQTT broker {} closed the session", broker);
                    state_tx.send_replace(ConnectionState::Disconnected);
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    info!("Disconnected from MQTT broker {}", broker);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    let previous = state_tx.send_replace(ConnectionState::Disconnected);
                    let err = ConnectionError::from(e);
                    if previous == ConnectionState::Connected {
                        error!("Lost connection to MQTT broker {}: {}", broker, err);
                    } else {
                        error!("MQTT connection error for {}: {}", broker, err);
                    }

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(reconnect_delay) => {}
                    }
                }
            }
        }
    }

    state_tx.send_replace(ConnectionState::Closed);
    info!("MQTT connection to {} closed", broker);
}
