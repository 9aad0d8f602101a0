use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout, Instant};

use ev_dashboard::presentation::{
    BatteryBand, DisplayState, Presenter, PresenterOptions, TICK_INTERVAL,
};
use ev_dashboard::config::MonitorConfig;
use ev_dashboard::protocol::{FetchFailure, Notification};
use ev_dashboard::types::ErrorKind;
use ev_dashboard::vehicle_client::{DistanceUnit, VehicleSnapshot};

fn snapshot(battery: u8) -> Arc<VehicleSnapshot> {
    Arc::new(VehicleSnapshot {
        name: "EV9 (1)".to_string(),
        vin: "KNDEV9".to_string(),
        charging: false,
        battery_percent: Some(battery),
        range: Some(180.0),
        range_unit: DistanceUnit::Miles,
        locked: true,
        charge_remaining_minutes: None,
        location: None,
        sleep_mode: Some(false),
        fetched_at: Utc::now(),
    })
}

fn assert_close(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_secs(1),
        "expected about {expected:?}, waited {elapsed:?}"
    );
}

fn spawn_presenter(
    options: PresenterOptions,
) -> (mpsc::Sender<Notification>, watch::Receiver<DisplayState>) {
    let (presenter, views) = Presenter::new(options);
    let (tx, rx) = mpsc::channel(8);
    let (_accepted_tx, accepted_rx) = watch::channel(None);
    tokio::spawn(presenter.run(rx, accepted_rx));
    (tx, views)
}

#[tokio::test(start_paused = true)]
async fn car_data_publishes_ready_view() {
    let (tx, mut views) = spawn_presenter(PresenterOptions {
        show_last_updated: true,
        title: Some("Road trip".to_string()),
    });
    assert_eq!(*views.borrow(), DisplayState::Loading);

    tx.send(Notification::CarData(Some(snapshot(60)))).await.unwrap();
    views.changed().await.unwrap();

    let DisplayState::Ready(view) = views.borrow_and_update().clone() else {
        panic!("expected a ready view");
    };
    assert_eq!(view.title, "Road trip");
    assert_eq!(view.battery_band, BatteryBand::Yellow);
    assert_eq!(view.summary(), "Disconnected - 180 mi");
    assert_eq!(
        view.update_ago.as_deref(),
        Some("Updated less than a minute ago")
    );
}

#[tokio::test(start_paused = true)]
async fn ticker_republishes_every_interval() {
    let (tx, mut views) = spawn_presenter(PresenterOptions {
        show_last_updated: true,
        title: None,
    });
    tx.send(Notification::CarData(Some(snapshot(60)))).await.unwrap();
    views.changed().await.unwrap();

    let published_at = Instant::now();
    views.changed().await.unwrap();
    assert_close(published_at.elapsed(), TICK_INTERVAL);

    views.changed().await.unwrap();
    assert_close(published_at.elapsed(), TICK_INTERVAL * 2);
}

#[tokio::test(start_paused = true)]
async fn new_notification_restarts_ticker() {
    let (tx, mut views) = spawn_presenter(PresenterOptions {
        show_last_updated: true,
        title: None,
    });
    tx.send(Notification::CarData(Some(snapshot(60)))).await.unwrap();
    views.changed().await.unwrap();

    sleep(Duration::from_secs(30)).await;
    tx.send(Notification::CarData(None)).await.unwrap();
    views.changed().await.unwrap();

    // the first ticker would have fired 30s from now
    let restarted_at = Instant::now();
    views.changed().await.unwrap();
    assert_close(restarted_at.elapsed(), TICK_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn hidden_update_line_never_ticks() {
    let (tx, mut views) = spawn_presenter(PresenterOptions {
        show_last_updated: false,
        title: None,
    });
    tx.send(Notification::CarData(Some(snapshot(10)))).await.unwrap();
    views.changed().await.unwrap();

    let DisplayState::Ready(view) = views.borrow_and_update().clone() else {
        panic!("expected a ready view");
    };
    assert_eq!(view.battery_band, BatteryBand::Red);
    assert_eq!(view.update_ago, None);

    assert!(timeout(TICK_INTERVAL * 5, views.changed()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn fetch_error_before_data_stays_loading() {
    let (tx, mut views) = spawn_presenter(PresenterOptions {
        show_last_updated: true,
        title: None,
    });
    tx.send(Notification::FetchError(FetchFailure {
        kind: ErrorKind::Timeout,
        message: "fetch cycle timed out after 120s".to_string(),
    }))
    .await
    .unwrap();
    views.changed().await.unwrap();

    assert_eq!(*views.borrow_and_update(), DisplayState::Loading);
}

#[tokio::test(start_paused = true)]
async fn snapshot_without_battery_is_no_data() {
    let (tx, mut views) = spawn_presenter(PresenterOptions::default());
    let mut empty = (*snapshot(0)).clone();
    empty.battery_percent = None;

    tx.send(Notification::CarData(Some(Arc::new(empty)))).await.unwrap();
    views.changed().await.unwrap();

    let state = views.borrow_and_update().clone();
    assert_eq!(state, DisplayState::NoData);
    assert_eq!(state.message(), Some("No correct data found"));
}

#[tokio::test(start_paused = true)]
async fn presenter_stops_when_notifications_close() {
    let (presenter, mut views) = Presenter::new(PresenterOptions::default());
    let (tx, rx) = mpsc::channel(1);
    let (_accepted_tx, accepted_rx) = watch::channel(None);
    let task = tokio::spawn(presenter.run(rx, accepted_rx));

    drop(tx);
    task.await.unwrap();
    assert!(views.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn accepted_config_replaces_display_options() {
    let (presenter, mut views) = Presenter::new(PresenterOptions::default());
    let (tx, rx) = mpsc::channel(8);
    let (accepted_tx, accepted_rx) = watch::channel(None);
    tokio::spawn(presenter.run(rx, accepted_rx));

    accepted_tx.send_replace(Some(Arc::new(MonitorConfig {
        name: Some("Weekend car".to_string()),
        show_last_updated: true,
        ..MonitorConfig::default()
    })));
    views.changed().await.unwrap();
    assert_eq!(*views.borrow_and_update(), DisplayState::Loading);

    tx.send(Notification::CarData(Some(snapshot(90)))).await.unwrap();
    views.changed().await.unwrap();

    let DisplayState::Ready(view) = views.borrow_and_update().clone() else {
        panic!("expected a ready view");
    };
    assert_eq!(view.title, "Weekend car");
    assert!(view.update_ago.is_some());

    // the update line now ticks
    let published_at = Instant::now();
    views.changed().await.unwrap();
    assert_close(published_at.elapsed(), TICK_INTERVAL);
}
