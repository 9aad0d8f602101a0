use std::future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval};
use tracing::debug;

use crate::config::MonitorConfig;
use crate::protocol::Notification;
use crate::vehicle_client::VehicleSnapshot;

use super::{project, DisplayState};

/// How often the "Updated N minutes ago" line is refreshed.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default)]
pub struct PresenterOptions {
    pub show_last_updated: bool,
    /// Replaces the vehicle name as the view title.
    pub title: Option<String>,
}

impl PresenterOptions {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            show_last_updated: config.show_last_updated,
            title: config
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}

/// Keeps the display state in step with poller notifications and the update ticker.
pub struct Presenter {
    options: PresenterOptions,
    snapshot: Option<Arc<VehicleSnapshot>>,
    view: watch::Sender<DisplayState>,
}

impl Presenter {
    pub fn new(options: PresenterOptions) -> (Self, watch::Receiver<DisplayState>) {
        let (view, view_rx) = watch::channel(DisplayState::Loading);
        (
            Self {
                options,
                snapshot: None,
                view,
            },
            view_rx,
        )
    }

    /// Current display state as of the wall clock.
    pub fn render(&self) -> DisplayState {
        let mut state = project(self.snapshot.as_deref(), Utc::now());
        if let DisplayState::Ready(view) = &mut state {
            if let Some(title) = &self.options.title {
                view.title = title.clone();
            }
            if !self.options.show_last_updated {
                view.update_ago = None;
            }
        }
        state
    }

    pub fn apply(&mut self, notification: &Notification) {
        match notification {
            Notification::CarData(Some(snapshot)) => {
                self.snapshot = Some(Arc::clone(snapshot));
            }
            Notification::CarData(None) => {
                debug!("Received empty vehicle data");
            }
            Notification::Started(_) | Notification::FetchError(_) => {}
        }
    }

    /// Drive the view until the notification stream closes.
    ///
    /// `configs` carries the configuration the poller accepted; its display
    /// options replace the startup ones.
    pub async fn run(
        mut self,
        mut notifications: mpsc::Receiver<Notification>,
        mut configs: watch::Receiver<Option<Arc<MonitorConfig>>>,
    ) {
        let mut ticker: Option<Interval> = None;
        let mut configs_open = true;

        loop {
            tokio::select! {
                notification = notifications.recv() => {
                    let Some(notification) = notification else {
                        break;
                    };
                    self.apply(&notification);
                    // a fresh notification always supersedes the running ticker
                    ticker = self.start_ticker();
                    self.publish();
                }
                changed = configs.changed(), if configs_open => {
                    if changed.is_err() {
                        configs_open = false;
                        continue;
                    }
                    let accepted = configs.borrow_and_update().clone();
                    if let Some(config) = accepted {
                        self.options = PresenterOptions::from_config(&config);
                        debug!(
                            show_last_updated = self.options.show_last_updated,
                            title = ?self.options.title,
                            "Display options updated"
                        );
                        ticker = self.start_ticker();
                        self.publish();
                    }
                }
                _ = next_tick(&mut ticker) => {
                    self.publish();
                }
            }
        }
        debug!("Presenter stopped");
    }

    fn start_ticker(&self) -> Option<Interval> {
        self.options
            .show_last_updated
            .then(|| interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL))
    }

    fn publish(&self) {
        self.view.send_replace(self.render());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}
