use chrono::TimeDelta;
use clap::Parser;

use crate::{
    api::foxess::Api,
    core::{Coordinator, Intervals},
    prelude::*,
};

#[derive(Parser)]
pub struct FoxCloudApiArgs {
    #[clap(long = "api-key", env = "FOX_ESS_API_KEY")]
    pub api_key: String,

    #[clap(long, alias = "serial", env = "FOX_ESS_SERIAL_NUMBER")]
    pub serial_number: String,

    /// Also request PV strings 5 to 18.
    #[clap(long, env = "FOX_ESS_EXTENDED_PV")]
    pub extended_pv: bool,

    /// Total timeout of a single cloud request.
    #[clap(long, env = "FOX_ESS_REQUEST_TIMEOUT", default_value = "15s")]
    pub request_timeout: humantime::Duration,
}

#[derive(Parser)]
pub struct IntervalArgs {
    #[clap(long, env = "DEVICE_DETAIL_INTERVAL", default_value = "15min")]
    device_detail_interval: humantime::Duration,

    #[clap(long, env = "BATTERY_SETTINGS_INTERVAL", default_value = "60min")]
    battery_settings_interval: humantime::Duration,

    #[clap(long, env = "REPORT_INTERVAL", default_value = "60min")]
    report_interval: humantime::Duration,
}

impl IntervalArgs {
    pub fn intervals(&self) -> Result<Intervals> {
        Ok(Intervals {
            device_detail: TimeDelta::from_std(self.device_detail_interval.into())?,
            battery_settings: TimeDelta::from_std(self.battery_settings_interval.into())?,
            daily_report: TimeDelta::from_std(self.report_interval.into())?,
        })
    }
}

#[derive(Parser)]
pub struct CoordinatorArgs {
    #[clap(flatten)]
    pub fox_ess_api: FoxCloudApiArgs,

    #[clap(flatten)]
    pub intervals: IntervalArgs,
}

impl CoordinatorArgs {
    /// Build the coordinator and run its first cycle.
    pub async fn bootstrap(&self) -> Result<Coordinator<Api>> {
        let client = Api::new(
            self.fox_ess_api.api_key.clone(),
            self.fox_ess_api.request_timeout.into(),
        )?;
        let coordinator = Coordinator::builder()
            .client(client)
            .serial_number(&self.fox_ess_api.serial_number)
            .extended_pv(self.fox_ess_api.extended_pv)
            .policies(self.intervals.intervals()?)
            .build()
            .bootstrap()
            .await
            .context("failed to start")?;

        let snapshot = coordinator.latest();
        let device_detail = &snapshot.device_detail.value;
        info!(
            name = %device_detail.name(&self.fox_ess_api.serial_number),
            model = %device_detail.model(),
            firmware = %device_detail.firmware(),
            has_battery = device_detail.has_battery,
            "connected",
        );
        Ok(coordinator)
    }
}
