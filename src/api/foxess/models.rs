use serde::Deserialize;
use serde_with::{DefaultOnNull, DisplayFromStr, PickFirst, serde_as};

use crate::core::VariableValue;

#[derive(Deserialize)]
pub struct RealTimeRawVariable {
    #[serde(rename = "variable")]
    pub name: String,

    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Deserialize)]
pub struct DeviceRealTimeData {
    #[serde(rename = "deviceSN")]
    pub serial_number: Option<String>,

    #[serde(rename = "datas", default)]
    pub variables: Vec<RealTimeRawVariable>,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceDetail {
    #[serde(rename = "deviceSN")]
    pub serial_number: Option<String>,

    #[serde(rename = "plantName")]
    pub plant_name: Option<String>,

    #[serde(rename = "stationName")]
    pub station_name: Option<String>,

    #[serde(rename = "deviceType")]
    pub device_type: Option<String>,

    #[serde(rename = "masterVersion")]
    pub master_version: Option<String>,

    #[serde(rename = "slaveVersion")]
    pub slave_version: Option<String>,

    #[serde(rename = "managerVersion")]
    pub manager_version: Option<String>,

    #[serde(rename = "hasBattery", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub has_battery: bool,

    #[serde(rename = "hasPV", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub has_pv: bool,

    pub status: Option<i64>,

    #[serde(rename = "lastCloudSync")]
    pub last_cloud_sync: Option<String>,
}

impl DeviceDetail {
    /// Look the field up by its API name.
    pub fn get(&self, key: &str) -> Option<VariableValue> {
        let text = |value: &Option<String>| value.clone().map(VariableValue::Text);
        match key {
            "deviceSN" => text(&self.serial_number),
            "plantName" => text(&self.plant_name),
            "stationName" => text(&self.station_name),
            "deviceType" => text(&self.device_type),
            "masterVersion" => text(&self.master_version),
            "slaveVersion" => text(&self.slave_version),
            "managerVersion" => text(&self.manager_version),
            "lastCloudSync" => text(&self.last_cloud_sync),
            "hasBattery" => Some(VariableValue::from(self.has_battery)),
            "hasPV" => Some(VariableValue::from(self.has_pv)),
            #[expect(clippy::cast_precision_loss)]
            "status" => self.status.map(|status| VariableValue::Number(status as f64)),
            _ => None,
        }
    }

    /// Display name of the device: the plant name, if known.
    pub fn name(&self, serial_number: &str) -> String {
        self.plant_name.clone().unwrap_or_else(|| format!("FoxESS {serial_number}"))
    }

    pub fn model(&self) -> &str {
        self.device_type.as_deref().unwrap_or("Unknown")
    }

    pub fn firmware(&self) -> String {
        let version = |version: &Option<String>| version.as_deref().unwrap_or("N/A").to_owned();
        format!(
            "Master: {}, Slave: {}, Manager: {}",
            version(&self.master_version),
            version(&self.slave_version),
            version(&self.manager_version),
        )
    }
}

/// Battery state-of-charge limits.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BatterySettings {
    /// Off-grid minimal state-of-charge, percent.
    #[serde(rename = "minSoc", default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub min_soc: Option<f64>,

    /// On-grid minimal state-of-charge, percent.
    #[serde(rename = "minSocOnGrid", alias = "minGridSoc", default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub min_soc_on_grid: Option<f64>,
}

impl BatterySettings {
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "minSoc" => self.min_soc,
            "minSocOnGrid" | "minGridSoc" => self.min_soc_on_grid,
            _ => None,
        }
    }
}

/// Monthly series of one report variable, one entry per day.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReportSeries {
    pub variable: String,

    #[serde(default)]
    pub values: Vec<Option<f64>>,
}
