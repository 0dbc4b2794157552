//! Async coordination service.
//!
//! A single tokio task owns the [`ExportInterface`]. The UDP receive loop and
//! the retry timers run in their own tasks and only ever send a
//! [`ServiceMessage`] to it, so function state is never touched from two
//! tasks. Host code talks to the service through a cloneable
//! [`InterfaceHandle`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use flightdeck_functions::{BindingAddress, BindingValue, FunctionRegistry};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::InterfaceConfig;
use crate::error::{InterfaceError, InterfaceResult};
use crate::interface::{ActionReport, ExportInterface, InterfaceEvent, InterfaceStatus, ValueSnapshot};
use crate::protocol::{RequestKind, RetryScheduler};
use crate::transport::UdpTransport;

const MAX_DATAGRAM_SIZE: usize = 65_507;
const MESSAGE_QUEUE_DEPTH: usize = 256;
const EVENT_QUEUE_DEPTH: usize = 1024;
const MIN_HEARTBEAT_CHECK: Duration = Duration::from_millis(50);

/// Work for the coordination task.
#[derive(Debug)]
pub enum ServiceMessage {
    Datagram {
        bytes: Vec<u8>,
        from: SocketAddr,
    },
    RetryTick(RequestKind),
    Execute {
        address: BindingAddress,
        parameter: BindingValue,
        reply: oneshot::Sender<InterfaceResult<ActionReport>>,
    },
    RequestDriver {
        name: String,
    },
    RequestModule,
    ReplaceRegistry {
        registry: FunctionRegistry,
        reply: oneshot::Sender<()>,
    },
    Values {
        reply: oneshot::Sender<Vec<ValueSnapshot>>,
    },
    Status {
        reply: oneshot::Sender<InterfaceStatus>,
    },
    Shutdown,
}

/// Retry timers as tokio tasks feeding [`ServiceMessage::RetryTick`].
#[derive(Debug)]
pub struct TokioRetryScheduler {
    period: Duration,
    messages: mpsc::Sender<ServiceMessage>,
    timers: HashMap<RequestKind, JoinHandle<()>>,
}

impl TokioRetryScheduler {
    pub fn new(period: Duration, messages: mpsc::Sender<ServiceMessage>) -> Self {
        Self {
            period,
            messages,
            timers: HashMap::new(),
        }
    }
}

impl RetryScheduler for TokioRetryScheduler {
    fn arm(&mut self, kind: RequestKind) {
        self.disarm(kind);
        let period = self.period;
        let messages = self.messages.clone();
        let timer = tokio::spawn(async move {
            // First tick one full period from now; arming never sends.
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if messages.send(ServiceMessage::RetryTick(kind)).await.is_err() {
                    break;
                }
            }
        });
        self.timers.insert(kind, timer);
    }

    fn disarm(&mut self, kind: RequestKind) {
        if let Some(timer) = self.timers.remove(&kind) {
            timer.abort();
        }
    }
}

impl Drop for TokioRetryScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

/// Cloneable front end of a running service.
#[derive(Debug, Clone)]
pub struct InterfaceHandle {
    messages: mpsc::Sender<ServiceMessage>,
    events: broadcast::Sender<InterfaceEvent>,
    local_addr: SocketAddr,
}

impl InterfaceHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InterfaceEvent> {
        self.events.subscribe()
    }

    /// Invokes an action by address.
    ///
    /// # Errors
    ///
    /// Unknown function or action, or the service has stopped.
    pub async fn execute(
        &self,
        address: BindingAddress,
        parameter: BindingValue,
    ) -> InterfaceResult<ActionReport> {
        let (reply, response) = oneshot::channel();
        self.post(ServiceMessage::Execute {
            address,
            parameter,
            reply,
        })
        .await?;
        response.await.map_err(|_closed| InterfaceError::ServiceStopped)?
    }

    /// # Errors
    ///
    /// [`InterfaceError::ServiceStopped`] once the service is gone.
    pub async fn request_driver(&self, name: impl Into<String>) -> InterfaceResult<()> {
        self.post(ServiceMessage::RequestDriver { name: name.into() }).await
    }

    /// # Errors
    ///
    /// [`InterfaceError::ServiceStopped`] once the service is gone.
    pub async fn request_module(&self) -> InterfaceResult<()> {
        self.post(ServiceMessage::RequestModule).await
    }

    /// Swaps the function registry; resolves once the swap happened.
    ///
    /// # Errors
    ///
    /// [`InterfaceError::ServiceStopped`] once the service is gone.
    pub async fn replace_registry(&self, registry: FunctionRegistry) -> InterfaceResult<()> {
        let (reply, response) = oneshot::channel();
        self.post(ServiceMessage::ReplaceRegistry { registry, reply })
            .await?;
        response.await.map_err(|_closed| InterfaceError::ServiceStopped)
    }

    /// # Errors
    ///
    /// [`InterfaceError::ServiceStopped`] once the service is gone.
    pub async fn values(&self) -> InterfaceResult<Vec<ValueSnapshot>> {
        let (reply, response) = oneshot::channel();
        self.post(ServiceMessage::Values { reply }).await?;
        response.await.map_err(|_closed| InterfaceError::ServiceStopped)
    }

    /// # Errors
    ///
    /// [`InterfaceError::ServiceStopped`] once the service is gone.
    pub async fn status(&self) -> InterfaceResult<InterfaceStatus> {
        let (reply, response) = oneshot::channel();
        self.post(ServiceMessage::Status { reply }).await?;
        response.await.map_err(|_closed| InterfaceError::ServiceStopped)
    }

    /// Asks the service to stop. Stopping an already stopped service is fine.
    pub async fn shutdown(&self) {
        if self.messages.send(ServiceMessage::Shutdown).await.is_err() {
            debug!("Interface service already stopped");
        }
    }

    async fn post(&self, message: ServiceMessage) -> InterfaceResult<()> {
        self.messages
            .send(message)
            .await
            .map_err(|_closed| InterfaceError::ServiceStopped)
    }
}

pub struct InterfaceService;

impl InterfaceService {
    /// Binds the listen socket and starts the service tasks.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or when the socket cannot be bound.
    pub async fn spawn(
        config: InterfaceConfig,
        registry: FunctionRegistry,
    ) -> InterfaceResult<(InterfaceHandle, JoinHandle<()>)> {
        config.validate()?;
        let socket = Arc::new(UdpSocket::bind(config.listen_addr).await?);
        let local_addr = socket.local_addr()?;
        info!(listen = %local_addr, remote = ?config.remote_addr, "Export interface bound");

        let (messages, inbox) = mpsc::channel(MESSAGE_QUEUE_DEPTH);
        let (events, _) = broadcast::channel(EVENT_QUEUE_DEPTH);

        let transport = UdpTransport::new(Arc::clone(&socket), config.remote_addr);
        let scheduler = TokioRetryScheduler::new(config.retry_interval(), messages.clone());
        let heartbeat_check = (config.heartbeat_timeout() / 4).max(MIN_HEARTBEAT_CHECK);
        let interface = ExportInterface::new(config, registry, transport, Box::new(scheduler))?;

        let receiver = tokio::spawn(receive_loop(socket, messages.clone()));
        let coordinator = tokio::spawn(coordinate(
            interface,
            inbox,
            events.clone(),
            heartbeat_check,
            receiver,
        ));

        Ok((
            InterfaceHandle {
                messages,
                events,
                local_addr,
            },
            coordinator,
        ))
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, messages: mpsc::Sender<ServiceMessage>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(error) => {
                // Windows reports ICMP port-unreachable from earlier sends here.
                debug!(error = %error, "UDP receive error");
                continue;
            }
        };
        let bytes = buf.get(..len).map(<[u8]>::to_vec).unwrap_or_default();
        if messages
            .send(ServiceMessage::Datagram { bytes, from })
            .await
            .is_err()
        {
            break;
        }
    }
    debug!("UDP receive loop stopped");
}

async fn coordinate(
    mut interface: ExportInterface<UdpTransport>,
    mut inbox: mpsc::Receiver<ServiceMessage>,
    events: broadcast::Sender<InterfaceEvent>,
    heartbeat_check: Duration,
    receiver: JoinHandle<()>,
) {
    interface.start();

    let mut heartbeat = tokio::time::interval(heartbeat_check);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let message = tokio::select! {
            message = inbox.recv() => message,
            _ = heartbeat.tick() => {
                let now = Instant::now().into_std();
                publish(&events, interface.check_connection(now));
                continue;
            }
        };
        let Some(message) = message else {
            break;
        };

        match message {
            ServiceMessage::Datagram { bytes, from } => {
                let now = Instant::now().into_std();
                publish(&events, interface.receive_datagram(&bytes, Some(from), now));
            }
            ServiceMessage::RetryTick(kind) => {
                let outcome = interface.retry_tick(kind);
                debug!(request = ?kind, outcome = ?outcome, "Retry tick");
            }
            ServiceMessage::Execute {
                address,
                parameter,
                reply,
            } => {
                let result = interface.execute_action(&address, &parameter);
                if let Ok(report) = &result {
                    publish(&events, report.events.clone());
                }
                if reply.send(result).is_err() {
                    debug!(action = %address, "Action caller went away");
                }
            }
            ServiceMessage::RequestDriver { name } => {
                publish(&events, interface.request_driver(&name));
            }
            ServiceMessage::RequestModule => interface.request_module(),
            ServiceMessage::ReplaceRegistry { registry, reply } => {
                drop(interface.replace_registry(registry));
                if reply.send(()).is_err() {
                    debug!("Registry replacement caller went away");
                }
            }
            ServiceMessage::Values { reply } => {
                if reply.send(interface.values()).is_err() {
                    debug!("Values caller went away");
                }
            }
            ServiceMessage::Status { reply } => {
                if reply.send(interface.status()).is_err() {
                    debug!("Status caller went away");
                }
            }
            ServiceMessage::Shutdown => {
                info!("Interface service shutting down");
                break;
            }
        }
    }

    interface.shutdown();
    receiver.abort();
    info!("Interface service stopped");
}

fn publish(events: &broadcast::Sender<InterfaceEvent>, batch: Vec<InterfaceEvent>) {
    for event in batch {
        // No subscribers is normal for a headless bridge.
        if events.send(event).is_err() {
            break;
        }
    }
}
