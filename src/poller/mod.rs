//! Fetch-and-reschedule loop for a single vehicle.
//!
//! The poller runs as one task that owns its configuration, snapshot and run
//! state. Callers talk to it through [`PollerHandle`]; results leave through the
//! notification channel handed to [`Poller::spawn`].

mod cycle;
mod resolve;
mod schedule;
mod state;

use std::future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::protocol::{FetchFailure, Notification};
use crate::types::MonitorError;
use crate::vehicle_client::{VehicleConnector, VehicleSnapshot};

pub use cycle::{run_fetch_cycle, CycleOutcome, CycleRequest};
pub use resolve::resolve_vehicle;
pub use schedule::{select_delay, DelayRule, RefreshSchedule};
pub use state::{PollerPhase, PollerRunState, PollerStatus};

const COMMAND_BUFFER: usize = 16;

type CycleTask = JoinHandle<Result<CycleOutcome, MonitorError>>;

#[derive(Debug)]
enum PollerCommand {
    Configure(Box<MonitorConfig>),
    Refresh,
    Shutdown,
}

/// Cloneable handle used to drive a running [`Poller`].
#[derive(Clone)]
pub struct PollerHandle {
    commands: mpsc::Sender<PollerCommand>,
    status: watch::Receiver<PollerStatus>,
    accepted: watch::Receiver<Option<Arc<MonitorConfig>>>,
}

impl PollerHandle {
    /// First call starts polling; later calls re-emit the cached snapshot.
    pub async fn configure(&self, config: MonitorConfig) {
        self.send(PollerCommand::Configure(Box::new(config))).await;
    }

    /// Fetch now unless a cycle is already in flight.
    pub async fn refresh_now(&self) {
        self.send(PollerCommand::Refresh).await;
    }

    /// Stop the poller, aborting any fetch in flight.
    pub async fn shutdown(&self) {
        self.send(PollerCommand::Shutdown).await;
    }

    pub fn status(&self) -> PollerStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status transition.
    pub fn subscribe(&self) -> watch::Receiver<PollerStatus> {
        self.status.clone()
    }

    /// Receiver holding the configuration the poller accepted, once it has one.
    pub fn subscribe_config(&self) -> watch::Receiver<Option<Arc<MonitorConfig>>> {
        self.accepted.clone()
    }

    async fn send(&self, command: PollerCommand) {
        if self.commands.send(command).await.is_err() {
            warn!("Poller task has stopped, dropping command");
        }
    }
}

pub struct Poller {
    connector: Arc<dyn VehicleConnector>,
    config: Option<Arc<MonitorConfig>>,
    state: PollerRunState,
    snapshot: Option<Arc<VehicleSnapshot>>,
    schedule: RefreshSchedule,
    in_flight: Option<CycleTask>,
    commands: mpsc::Receiver<PollerCommand>,
    notifications: mpsc::Sender<Notification>,
    status: watch::Sender<PollerStatus>,
    accepted: watch::Sender<Option<Arc<MonitorConfig>>>,
}

impl Poller {
    /// Spawn the poller task on the current runtime.
    pub fn spawn(
        connector: Arc<dyn VehicleConnector>,
        notifications: mpsc::Sender<Notification>,
    ) -> (PollerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(PollerStatus::default());
        let (accepted_tx, accepted_rx) = watch::channel(None);

        let poller = Self {
            connector,
            config: None,
            state: PollerRunState::default(),
            snapshot: None,
            schedule: RefreshSchedule::new(),
            in_flight: None,
            commands: command_rx,
            notifications,
            status: status_tx,
            accepted: accepted_tx,
        };
        let task = tokio::spawn(poller.run());

        (
            PollerHandle {
                commands: command_tx,
                status: status_rx,
                accepted: accepted_rx,
            },
            task,
        )
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PollerCommand::Configure(config)) => self.configure(*config).await,
                    Some(PollerCommand::Refresh) => self.refresh_now(),
                    Some(PollerCommand::Shutdown) => break,
                    None => {
                        self.drain().await;
                        break;
                    }
                },
                _ = self.schedule.fired() => {
                    debug!("Scheduled refresh is due");
                    self.start_cycle();
                }
                joined = join_cycle(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.finish_cycle(joined).await;
                }
            }
        }

        if let Some(task) = self.in_flight.take() {
            info!("Aborting fetch cycle in flight");
            task.abort();
        }
        self.schedule.cancel();
        debug!("Poller stopped");
    }

    /// Every handle is gone: let the running cycle report before stopping.
    async fn drain(&mut self) {
        if let Some(task) = self.in_flight.take() {
            info!("All poller handles dropped, finishing the fetch cycle in flight");
            let joined = task.await;
            self.finish_cycle(joined).await;
        }
    }

    async fn configure(&mut self, config: MonitorConfig) {
        if self.state.started {
            info!(
                has_data = self.snapshot.is_some(),
                "Configuration received again, re-sending cached vehicle data"
            );
            self.notify(Notification::CarData(self.snapshot.clone()))
                .await;
            return;
        }

        let config = Arc::new(config);
        self.accepted.send_replace(Some(Arc::clone(&config)));
        self.config = Some(config);
        self.state.started = true;
        self.notify(Notification::Started(true)).await;
        self.start_cycle();
    }

    fn refresh_now(&mut self) {
        if !self.state.started {
            warn!("Refresh requested before configuration, ignoring");
            return;
        }
        if self.state.in_flight {
            debug!("Refresh requested while a fetch is in flight, ignoring");
            return;
        }
        info!("Refreshing vehicle data on request");
        self.start_cycle();
    }

    fn start_cycle(&mut self) {
        let Some(config) = self.config.clone() else {
            return;
        };
        if self.in_flight.is_some() {
            return;
        }

        self.schedule.cancel();

        let first_cycle = self.state.cycles == 0;
        let wake = config.wake_on_refresh || (first_cycle && config.wake_on_module_load);
        let vin = self
            .state
            .resolved_vin
            .clone()
            .or_else(|| config.configured_vin().map(str::to_string));

        self.state.cycles += 1;
        self.state.in_flight = true;
        debug!(cycle = self.state.cycles, wake, vin = ?vin, "Starting fetch cycle");

        let request = CycleRequest { config, vin, wake };
        let connector = Arc::clone(&self.connector);
        self.in_flight = Some(tokio::spawn(cycle::run_bounded(connector, request)));
        self.publish_status();
    }

    async fn finish_cycle(&mut self, joined: Result<Result<CycleOutcome, MonitorError>, JoinError>) {
        self.state.in_flight = false;
        let Some(config) = self.config.clone() else {
            return;
        };

        let result = joined.unwrap_or_else(|err| Err(MonitorError::Task(err.to_string())));
        match result {
            Ok(CycleOutcome { vin, snapshot }) => {
                if self.state.resolved_vin.as_deref() != Some(vin.as_str()) {
                    info!(vin = %vin, "Resolved vehicle identifier");
                    self.state.resolved_vin = Some(vin);
                }
                self.state.last_error = None;

                let (delay, rule) = select_delay(&config, &snapshot);
                info!(
                    battery = ?snapshot.battery_percent,
                    charging = snapshot.charging,
                    delay = ?delay,
                    "Vehicle data refreshed, {}",
                    rule.describe()
                );

                let snapshot = Arc::new(snapshot);
                self.snapshot = Some(Arc::clone(&snapshot));
                self.schedule.arm(delay);
                self.publish_status();
                self.notify(Notification::CarData(Some(snapshot))).await;
            }
            Err(err) => {
                error!(
                    error = %err,
                    classification = err.classification(),
                    "Fetch cycle failed"
                );
                self.state.last_error = Some(err.kind());

                match config.failure_retry_interval() {
                    Some(delay) => {
                        warn!(delay = ?delay, "Retrying after failed fetch cycle");
                        self.schedule.arm(delay);
                    }
                    None => {
                        debug!("Automatic retry disabled, waiting for an external refresh");
                    }
                }
                self.publish_status();
                self.notify(Notification::FetchError(FetchFailure::from(&err)))
                    .await;
            }
        }
    }

    fn publish_status(&self) {
        self.status
            .send_replace(self.state.status(self.schedule.pending_delay()));
    }

    async fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).await.is_err() {
            debug!("Notification receiver dropped");
        }
    }
}

async fn join_cycle(
    task: &mut Option<CycleTask>,
) -> Result<Result<CycleOutcome, MonitorError>, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => future::pending().await,
    }
}
