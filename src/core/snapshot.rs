use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use chrono::{DateTime, Local};
use derive_more::Deref;

use crate::{
    api::foxess::{BatterySettings, DeviceDetail},
    core::Group,
};

/// Single real-time variable value as reported by the cloud.
#[derive(Clone, Debug, PartialEq)]
pub enum VariableValue {
    Number(f64),
    Text(String),
}

impl VariableValue {
    /// Convert a raw JSON value, dropping anything that is neither a number nor a string.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(number) => number.as_f64().map(Self::Number),
            serde_json::Value::String(text) => Some(Self::Text(text)),
            _ => None,
        }
    }

    /// Numeric value, parsing numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        Self::Text(value.to_string())
    }
}

impl Display for VariableValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Flat real-time variable name to value mapping.
#[derive(Clone, Debug, Default, PartialEq, Deref)]
pub struct RealTimeVariables(BTreeMap<String, VariableValue>);

impl FromIterator<(String, VariableValue)> for RealTimeVariables {
    fn from_iter<T: IntoIterator<Item = (String, VariableValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Today's energy totals, in kilowatt-hours.
#[derive(Clone, Debug, Default, PartialEq, Deref)]
pub struct DailyReport(BTreeMap<String, f64>);

impl FromIterator<(String, f64)> for DailyReport {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Group value together with the moment it was last successfully fetched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub last_success_at: Option<DateTime<Local>>,
}

impl<T> Cached<T> {
    pub const fn fresh(value: T, now: DateTime<Local>) -> Self {
        Self { value, last_success_at: Some(now) }
    }
}

/// Merged view of the latest known values of all groups.
///
/// Published snapshots are never mutated: every cycle produces a new one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Whether the real-time variables were fetched in the cycle that produced this snapshot.
    pub online: bool,

    pub variables: Cached<RealTimeVariables>,
    pub device_detail: Cached<DeviceDetail>,
    pub battery_settings: Cached<BatterySettings>,
    pub daily_report: Cached<DailyReport>,
}

impl Snapshot {
    /// Read a single field of the group.
    pub fn get(&self, group: Group, key: &str) -> Option<VariableValue> {
        match group {
            Group::Variables => self.variables.value.get(key).cloned(),
            Group::DeviceDetail => self.device_detail.value.get(key),
            Group::BatterySettings => {
                self.battery_settings.value.get(key).map(VariableValue::Number)
            }
            Group::DailyReport => {
                self.daily_report.value.get(key).copied().map(VariableValue::Number)
            }
        }
    }

    pub const fn last_success_at(&self, group: Group) -> Option<DateTime<Local>> {
        match group {
            Group::Variables => self.variables.last_success_at,
            Group::DeviceDetail => self.device_detail.last_success_at,
            Group::BatterySettings => self.battery_settings.last_success_at,
            Group::DailyReport => self.daily_report.last_success_at,
        }
    }
}
