#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::sleep;

use ev_dashboard::config::MonitorConfig;
use ev_dashboard::poller::{Poller, PollerHandle};
use ev_dashboard::protocol::Notification;
use ev_dashboard::types::MonitorError;
use ev_dashboard::vehicle_client::{
    ConnectOptions, StatusRequest, VehicleCloud, VehicleConnector, VehicleHandle, VehicleInfo,
    VehicleSnapshot,
};

pub fn vehicle(vin: &str) -> VehicleInfo {
    VehicleInfo {
        vin: vin.to_string(),
        name: "Kona".to_string(),
        generation: "2".to_string(),
    }
}

pub fn status_json(battery: u8, charging: bool) -> Value {
    json!({
        "doorLock": true,
        "sleepModeCheck": false,
        "evStatus": {
            "batteryCharge": charging,
            "batteryStatus": battery,
            "remainTime2": { "atc": { "value": 95, "unit": 1 } },
            "drvDistance": [{
                "rangeByFuel": { "evModeRange": { "value": 250, "unit": 1 } }
            }]
        }
    })
}

/// Scriptable vehicle-cloud account shared by the fake connector, cloud and vehicles.
pub struct FakeAccount {
    pub vehicles: Mutex<Vec<VehicleInfo>>,
    pub status: Mutex<Value>,
    pub location: Value,
    pub status_delay: Mutex<Duration>,
    /// When set, `connect` fails with this transport status.
    pub connect_failure: Mutex<Option<u16>>,
    pub connects: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub location_calls: AtomicUsize,
    pub requested_vins: Mutex<Vec<String>>,
    pub status_requests: Mutex<Vec<StatusRequest>>,
}

impl FakeAccount {
    pub fn new(vehicles: Vec<VehicleInfo>, status: Value) -> Arc<Self> {
        Arc::new(Self {
            vehicles: Mutex::new(vehicles),
            status: Mutex::new(status),
            location: json!({ "latitude": 47.37, "longitude": 8.54 }),
            status_delay: Mutex::new(Duration::ZERO),
            connect_failure: Mutex::new(None),
            connects: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            location_calls: AtomicUsize::new(0),
            requested_vins: Mutex::new(Vec::new()),
            status_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_status_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.status_delay.lock().unwrap() = delay;
        self
    }

    pub fn set_status(&self, status: Value) {
        *self.status.lock().unwrap() = status;
    }

    pub fn fail_connect(&self, status_code: Option<u16>) {
        *self.connect_failure.lock().unwrap() = status_code;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn requested_vins(&self) -> Vec<String> {
        self.requested_vins.lock().unwrap().clone()
    }

    pub fn status_requests(&self) -> Vec<StatusRequest> {
        self.status_requests.lock().unwrap().clone()
    }
}

pub struct FakeConnector {
    account: Arc<FakeAccount>,
}

impl FakeConnector {
    pub fn new(account: Arc<FakeAccount>) -> Arc<Self> {
        Arc::new(Self { account })
    }
}

#[async_trait]
impl VehicleConnector for FakeConnector {
    async fn connect(&self, _options: &ConnectOptions) -> Result<Arc<dyn VehicleCloud>, MonitorError> {
        self.account.connects.fetch_add(1, Ordering::SeqCst);
        let failure = *self.account.connect_failure.lock().unwrap();
        if let Some(status_code) = failure {
            return Err(MonitorError::Transport {
                status_code,
                message: "Invalid username or password".to_string(),
            });
        }
        Ok(Arc::new(FakeCloud {
            account: Arc::clone(&self.account),
        }))
    }
}

struct FakeCloud {
    account: Arc<FakeAccount>,
}

#[async_trait]
impl VehicleCloud for FakeCloud {
    async fn list_vehicles(&self) -> Result<Vec<VehicleInfo>, MonitorError> {
        self.account.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.account.vehicles.lock().unwrap().clone())
    }

    async fn get_vehicle(&self, vin: &str) -> Result<Arc<dyn VehicleHandle>, MonitorError> {
        self.account
            .requested_vins
            .lock()
            .unwrap()
            .push(vin.to_string());
        let vehicles = self.account.vehicles.lock().unwrap().clone();
        match vehicles.iter().find(|v| v.vin == vin) {
            Some(info) => Ok(Arc::new(FakeVehicle {
                account: Arc::clone(&self.account),
                info: info.clone(),
            })),
            None => Err(MonitorError::InvalidVehicleId {
                vin: vin.to_string(),
                available: vehicles.len(),
            }),
        }
    }
}

struct FakeVehicle {
    account: Arc<FakeAccount>,
    info: VehicleInfo,
}

#[async_trait]
impl VehicleHandle for FakeVehicle {
    fn info(&self) -> &VehicleInfo {
        &self.info
    }

    async fn status(&self, request: StatusRequest) -> Result<Value, MonitorError> {
        self.account.status_calls.fetch_add(1, Ordering::SeqCst);
        self.account.status_requests.lock().unwrap().push(request);
        let delay = *self.account.status_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        Ok(self.account.status.lock().unwrap().clone())
    }

    async fn location(&self) -> Result<Value, MonitorError> {
        self.account.location_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.account.location.clone())
    }
}

/// Config with short, distinct intervals and retry disabled.
pub fn test_config(vin: Option<&str>) -> MonitorConfig {
    MonitorConfig {
        vin: vin.map(str::to_string),
        refresh_interval_while_charging: 10 * 60 * 1000,
        refresh_interval_while_disconnected: 60 * 60 * 1000,
        refresh_interval_after_failure: 0,
        ..MonitorConfig::default()
    }
}

pub fn spawn_poller(account: &Arc<FakeAccount>) -> (PollerHandle, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(16);
    let (handle, _task) = Poller::spawn(FakeConnector::new(Arc::clone(account)), tx);
    (handle, rx)
}

pub async fn expect_started(rx: &mut mpsc::Receiver<Notification>) {
    match rx.recv().await {
        Some(Notification::Started(true)) => {}
        other => panic!("expected STARTED, got {other:?}"),
    }
}

pub async fn expect_car_data(rx: &mut mpsc::Receiver<Notification>) -> Option<Arc<VehicleSnapshot>> {
    match rx.recv().await {
        Some(Notification::CarData(data)) => data,
        other => panic!("expected CAR_DATA, got {other:?}"),
    }
}
