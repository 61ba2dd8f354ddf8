mod error;
mod models;
mod response;
mod variables;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use serde_with::{json::JsonString, serde_as};

pub use self::{
    error::ApiError,
    models::{BatterySettings, DeviceDetail, ReportSeries},
    variables::{DEFAULT_VARIABLES, EXTENDED_PV_STRINGS, PV_STRING_SUFFIXES, REPORT_VARIABLES},
};
use self::{models::DeviceRealTimeData, response::Response, variables::request_variables};
use crate::{
    core::{RealTimeVariables, VariableValue},
    prelude::*,
};

/// Operations of the remote data source, one per data group.
#[async_trait]
pub trait RemoteData: Send + Sync {
    async fn fetch_device_detail(&self, serial_number: &str) -> Result<DeviceDetail, ApiError>;

    async fn fetch_battery_settings(
        &self,
        serial_number: &str,
    ) -> Result<BatterySettings, ApiError>;

    async fn fetch_realtime_variables(
        &self,
        serial_number: &str,
        variable_names: &[&str],
        extended_pv: bool,
    ) -> Result<RealTimeVariables, ApiError>;

    /// Fetch the daily series of the month.
    async fn fetch_report(
        &self,
        serial_number: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<ReportSeries>, ApiError>;
}

pub struct Api {
    client: Client,
    api_key: String,
    base_url: String,
}

impl Api {
    const BASE_URL: &'static str = "https://www.foxesscloud.com";

    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, timeout, Self::BASE_URL)
    }

    pub fn with_base_url(
        api_key: String,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.append("lang", HeaderValue::from_static("en"));
        headers.append("token", HeaderValue::from_str(&api_key)?);
        headers.append(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent(concat!("foxess-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, api_key, base_url: base_url.into() })
    }

    async fn get<Q, R>(&self, path: &str, query: &Q) -> Result<R, ApiError>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(path, self.client.get(format!("{}{path}", self.base_url)).query(query)).await
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(path, self.client.post(format!("{}{path}", self.base_url)).json(body)).await
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(path = path))]
    async fn send<R: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<R, ApiError> {
        let (timestamp, signature) = self.build_signature(path);
        let response = request
            .header("timestamp", timestamp)
            .header("signature", signature)
            .send()
            .await
            .map_err(|error| ApiError::from_transport(path, &error))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ApiError::Auth(format!("`{path}` responded with {status}")));
        }
        if !status.is_success() {
            return Err(ApiError::Generic(format!("`{path}` responded with {status}")));
        }

        let body =
            response.text().await.map_err(|error| ApiError::from_transport(path, &error))?;
        let result = Result::<serde_json::Value, ApiError>::from(
            serde_json::from_str::<Response>(&body).map_err(|error| {
                ApiError::InvalidResponse(format!("failed to deserialize `{path}` JSON: {error}"))
            })?,
        )?;
        debug!(?result, "call succeeded");
        serde_json::from_value(result).map_err(|error| {
            ApiError::InvalidResponse(format!("unexpected `{path}` result structure: {error}"))
        })
    }

    /// WHOA-MEGA-SUPER-SECURE AUTHENTICATION!
    fn build_signature(&self, path: &str) -> (String, String) {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let signature = sign(path, &self.api_key, &timestamp);
        (timestamp, signature)
    }
}

fn sign(path: &str, token: &str, timestamp: &str) -> String {
    // Dear FoxESS API developers… what were you smoking while making `\r\n` RAW LITERALS?!
    let digest = md5::compute(format!(r"{path}\r\n{token}\r\n{timestamp}").as_bytes());
    format!("{digest:x}")
}

#[derive(Serialize)]
struct SerialNumberQuery<'a> {
    #[serde(rename = "sn")]
    serial_number: &'a str,
}

#[async_trait]
impl RemoteData for Api {
    #[instrument(skip_all, fields(serial_number = serial_number))]
    async fn fetch_device_detail(&self, serial_number: &str) -> Result<DeviceDetail, ApiError> {
        info!("fetching…");
        self.get("/op/v0/device/detail", &SerialNumberQuery { serial_number }).await
    }

    #[instrument(skip_all, fields(serial_number = serial_number))]
    async fn fetch_battery_settings(
        &self,
        serial_number: &str,
    ) -> Result<BatterySettings, ApiError> {
        info!("fetching…");
        self.get("/op/v0/device/battery/soc/get", &SerialNumberQuery { serial_number }).await
    }

    #[instrument(skip_all, fields(serial_number = serial_number, extended_pv = extended_pv))]
    async fn fetch_realtime_variables(
        &self,
        serial_number: &str,
        variable_names: &[&str],
        extended_pv: bool,
    ) -> Result<RealTimeVariables, ApiError> {
        #[serde_as]
        #[derive(Serialize)]
        struct GetRealTimeDataRequest<'a> {
            #[serde(rename = "sn")]
            serial_number: &'a str,

            /// The cloud expects the list encoded as a JSON string.
            #[serde_as(as = "JsonString")]
            variables: &'a [String],
        }

        let variables = request_variables(variable_names, extended_pv);
        info!(n_variables = variables.len(), "fetching…");
        let devices: Vec<DeviceRealTimeData> = self
            .post(
                "/op/v0/device/real/query",
                &GetRealTimeDataRequest { serial_number, variables: &variables },
            )
            .await?;
        let Some(device) = devices.into_iter().next() else {
            warn!("no real-time data in the response");
            return Ok(RealTimeVariables::default());
        };
        debug!(?device.serial_number, n_variables = device.variables.len(), "received");
        Ok(device
            .variables
            .into_iter()
            .filter_map(|variable| Some((variable.name, VariableValue::from_json(variable.value)?)))
            .collect())
    }

    #[instrument(skip_all, fields(serial_number = serial_number, year = year, month = month))]
    async fn fetch_report(
        &self,
        serial_number: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<ReportSeries>, ApiError> {
        #[derive(Serialize)]
        struct GetReportRequest<'a> {
            #[serde(rename = "sn")]
            serial_number: &'a str,

            year: i32,
            month: u32,
            dimension: &'a str,

            #[serde(rename = "variableNames")]
            variables: &'a [&'a str],
        }

        info!("fetching…");
        self.post(
            "/op/v0/device/report/query",
            &GetReportRequest {
                serial_number,
                year,
                month,
                dimension: "day",
                variables: &REPORT_VARIABLES,
            },
        )
        .await
    }
}
