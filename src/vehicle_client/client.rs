use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::types::MonitorError;

use super::api::{LoginRequest, LoginResponse, StatusQuery};
use super::cloud::{
    ConnectOptions, StatusRequest, VehicleCloud, VehicleConnector, VehicleHandle, VehicleInfo,
};
use super::helpers::error_message;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Connects to a vehicle-cloud bridge speaking JSON over HTTP.
#[derive(Clone)]
pub struct RestConnector {
    http: Client,
    base_url: String,
}

impl RestConnector {
    pub fn new(base_url: &str) -> Result<Self, MonitorError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VehicleConnector for RestConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn VehicleCloud>, MonitorError> {
        let request = LoginRequest {
            username: &options.credentials.username,
            password: &options.credentials.password,
            pin: &options.credentials.pin,
            region: options.region,
            brand: options.brand,
        };
        let url = format!("{}/login", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(MonitorError::Http)?;
        let login: LoginResponse = decode(response).await?;
        debug!(region = %options.region, brand = %options.brand, "Vehicle cloud session opened");

        Ok(Arc::new(RestSession {
            inner: Arc::new(SessionInner {
                http: self.http.clone(),
                base_url: self.base_url.clone(),
                token: login.token,
                vehicles: OnceCell::new(),
            }),
        }))
    }
}

struct SessionInner {
    http: Client,
    base_url: String,
    token: String,
    /// Vehicle list, fetched at most once per session.
    vehicles: OnceCell<Vec<VehicleInfo>>,
}

#[derive(Clone)]
struct RestSession {
    inner: Arc<SessionInner>,
}

impl RestSession {
    async fn get_json<T>(&self, path: &str) -> Result<T, MonitorError>
    where
        T: DeserializeOwned,
    {
        self.get_json_with_query(path, &()).await
    }

    async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, MonitorError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = format!(
            "{}/{}",
            self.inner.base_url,
            path.trim_start_matches('/')
        );
        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(&self.inner.token)
            .query(query)
            .send()
            .await
            .map_err(MonitorError::Http)?;

        decode(response).await
    }
}

#[async_trait]
impl VehicleCloud for RestSession {
    async fn list_vehicles(&self) -> Result<Vec<VehicleInfo>, MonitorError> {
        let vehicles = self
            .inner
            .vehicles
            .get_or_try_init(|| self.get_json("/vehicles"))
            .await?;
        Ok(vehicles.clone())
    }

    async fn get_vehicle(&self, vin: &str) -> Result<Arc<dyn VehicleHandle>, MonitorError> {
        let info: VehicleInfo = match self.get_json(&format!("/vehicles/{vin}")).await {
            Ok(info) => info,
            Err(MonitorError::Transport { status_code, .. })
                if status_code == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Err(MonitorError::InvalidVehicleId {
                    vin: vin.to_string(),
                    available: self.list_vehicles().await?.len(),
                });
            }
            Err(err) => return Err(err),
        };

        Ok(Arc::new(RestVehicle {
            session: self.clone(),
            info,
        }))
    }
}

struct RestVehicle {
    session: RestSession,
    info: VehicleInfo,
}

#[async_trait]
impl VehicleHandle for RestVehicle {
    fn info(&self) -> &VehicleInfo {
        &self.info
    }

    async fn status(&self, request: StatusRequest) -> Result<Value, MonitorError> {
        let query = StatusQuery {
            parsed: request.parsed,
            refresh: request.refresh,
        };
        self.session
            .get_json_with_query(&format!("/vehicles/{}/status", self.info.vin), &query)
            .await
    }

    async fn location(&self) -> Result<Value, MonitorError> {
        self.session
            .get_json(&format!("/vehicles/{}/location", self.info.vin))
            .await
    }
}

async fn decode<T>(response: Response) -> Result<T, MonitorError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MonitorError::Transport {
            status_code: status.as_u16(),
            message: error_message(&body),
        });
    }

    let body = response.bytes().await.map_err(MonitorError::Http)?;
    serde_json::from_slice(&body).map_err(|err| MonitorError::Decode(err.to_string()))
}
