//! JSON-lines bridge between the UI process and the backend tasks.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::poller::{Poller, PollerHandle};
use crate::presentation::{DisplayState, Presenter, PresenterOptions};
use crate::protocol::{Notification, UiRequest};
use crate::types::MonitorError;
use crate::vehicle_client::VehicleConnector;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Serialize)]
#[serde(tag = "notification", content = "payload")]
enum ViewLine<'a> {
    #[serde(rename = "VIEW")]
    View(&'a DisplayState),
}

/// Run the backend between a UI reader and writer.
///
/// The poller is configured from `startup` when given, otherwise by the first
/// `CONFIG` request. Returns once the reader closes or `shutdown` resolves,
/// after every pending line has been written.
pub async fn serve<R, W, S>(
    connector: Arc<dyn VehicleConnector>,
    startup: Option<MonitorConfig>,
    options: PresenterOptions,
    reader: R,
    writer: W,
    shutdown: S,
) -> Result<(), MonitorError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let (notification_tx, notification_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (presenter_tx, presenter_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (line_tx, line_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let (poller, poller_task) = Poller::spawn(connector, notification_tx);
    let (presenter, views) = Presenter::new(options);

    let presenter_task = tokio::spawn(presenter.run(presenter_rx, poller.subscribe_config()));
    let forward_task = tokio::spawn(forward_notifications(
        notification_rx,
        presenter_tx,
        line_tx.clone(),
    ));
    let views_task = tokio::spawn(forward_views(views, line_tx));
    let writer_task = tokio::spawn(write_lines(line_rx, writer));

    if let Some(config) = startup {
        info!("Starting from the installed config file");
        poller.configure(config).await;
    }

    let result = tokio::select! {
        result = read_requests(reader, poller.clone()) => {
            info!("UI disconnected, shutting down");
            result
        }
        _ = shutdown => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    poller.shutdown().await;
    if let Err(err) = poller_task.await {
        warn!(error = %err, "Poller task ended abnormally");
    }
    drop(poller);

    // the poller's sender is gone, so each stage closes the next one down
    for task in [forward_task, presenter_task, views_task] {
        if let Err(err) = task.await {
            warn!(error = %err, "Bridge task ended abnormally");
        }
    }
    match writer_task.await {
        Ok(written) => written?,
        Err(err) => warn!(error = %err, "Output writer ended abnormally"),
    }

    result
}

/// Read UI requests line by line until the reader closes.
pub async fn read_requests<R>(reader: R, poller: PollerHandle) -> Result<(), MonitorError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: UiRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "Ignoring malformed UI request");
                continue;
            }
        };

        match request {
            UiRequest::Config(payload) => match MonitorConfig::from_value(payload) {
                Ok(config) => poller.configure(config).await,
                Err(err) => warn!(error = %err, "Ignoring invalid configuration"),
            },
            UiRequest::Refresh => poller.refresh_now().await,
        }
    }

    debug!("UI request stream closed");
    Ok(())
}

/// Write every poller notification out and hand it on to the presenter.
pub async fn forward_notifications(
    mut notifications: mpsc::Receiver<Notification>,
    presenter: mpsc::Sender<Notification>,
    lines: mpsc::Sender<String>,
) {
    while let Some(notification) = notifications.recv().await {
        match encode_line(&notification) {
            Ok(line) => {
                if lines.send(line).await.is_err() {
                    debug!("Output writer stopped");
                }
            }
            Err(err) => warn!(error = %err, "Failed to encode notification"),
        }
        if presenter.send(notification).await.is_err() {
            debug!("Presenter stopped");
        }
    }
}

/// Emit a `VIEW` line whenever the display state changes.
pub async fn forward_views(mut views: watch::Receiver<DisplayState>, lines: mpsc::Sender<String>) {
    while views.changed().await.is_ok() {
        let encoded = encode_line(&ViewLine::View(&views.borrow_and_update()));
        match encoded {
            Ok(line) => {
                if lines.send(line).await.is_err() {
                    break;
                }
            }
            Err(err) => warn!(error = %err, "Failed to encode view"),
        }
    }
}

/// Sole owner of the output stream; one JSON document per line.
pub async fn write_lines<W>(mut lines: mpsc::Receiver<String>, mut writer: W) -> Result<(), MonitorError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

pub fn encode_line<T: Serialize>(value: &T) -> Result<String, MonitorError> {
    serde_json::to_string(value).map_err(|err| MonitorError::Decode(err.to_string()))
}
