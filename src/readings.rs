use std::borrow::Cow;

use derive_more::Display;
use itertools::Itertools;

use crate::{
    api::foxess::{EXTENDED_PV_STRINGS, PV_STRING_SUFFIXES},
    core::{Group, Published, Snapshot, VariableValue},
    prelude::*,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum Unit {
    #[display("kW")]
    Kilowatts,

    #[display("kWh")]
    KilowattHours,

    #[display("kvar")]
    KiloVoltAmperesReactive,

    #[display("V")]
    Volts,

    #[display("A")]
    Amperes,

    #[display("Hz")]
    Hertz,

    #[display("°C")]
    Celsius,

    #[display("%")]
    Percent,
}

/// How a field value is presented.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// Numeric measurement, numeric strings are parsed.
    Measurement(Unit),

    /// Value as reported.
    Raw,

    /// Running status code mapped onto its title.
    InverterStatus,
}

/// Single addressable field of the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reading {
    pub group: Group,
    pub key: Cow<'static, str>,
    pub name: Cow<'static, str>,
    pub format: Format,
}

impl Reading {
    const fn new(group: Group, key: &'static str, name: &'static str, format: Format) -> Self {
        Self { group, key: Cow::Borrowed(key), name: Cow::Borrowed(name), format }
    }

    pub const fn unit(&self) -> Option<Unit> {
        match self.format {
            Format::Measurement(unit) => Some(unit),
            Format::Raw | Format::InverterStatus => None,
        }
    }

    pub fn value(&self, snapshot: &Snapshot) -> Option<VariableValue> {
        let value = snapshot.get(self.group, &self.key)?;
        match self.format {
            Format::Raw => Some(value),
            Format::Measurement(_) => {
                let number = value.as_f64();
                if number.is_none() {
                    warn!(key = %self.key, %value, "could not convert the value to a number");
                }
                number.map(VariableValue::Number)
            }
            Format::InverterStatus => Some(VariableValue::Text(inverter_status(&value))),
        }
    }

    /// Extra raw values shown next to the reading.
    pub fn attributes(&self, snapshot: &Snapshot) -> Vec<(&'static str, VariableValue)> {
        match self.format {
            Format::InverterStatus => STATUS_ATTRIBUTES
                .into_iter()
                .filter_map(|(group, key)| Some((key, snapshot.get(group, key)?)))
                .collect(),
            Format::Measurement(_) | Format::Raw => Vec::new(),
        }
    }

    /// The reading is available when the latest cycle succeeded and the field is known.
    pub fn is_available(&self, published: &Published) -> bool {
        published.last_update_succeeded
            && published.snapshot.online
            && published.snapshot.get(self.group, &self.key).is_some()
    }
}

fn inverter_status(code: &VariableValue) -> String {
    let code = code.to_string();
    match code.as_str() {
        "0" => "Waiting".to_owned(),
        "1" => "Normal".to_owned(),
        "2" => "Fault".to_owned(),
        "3" => "Permanent fault".to_owned(),
        "4" => "Updating".to_owned(),
        "164" => "Off-grid".to_owned(),
        _ => format!("Unknown ({code})"),
    }
}

/// Raw fields that accompany the inverter status.
const STATUS_ATTRIBUTES: [(Group, &str); 5] = [
    (Group::Variables, "runningStatus"),
    (Group::Variables, "invStatus"),
    (Group::Variables, "dspStatus"),
    (Group::Variables, "sysStatus"),
    (Group::DeviceDetail, "lastCloudSync"),
];

const VARIABLES: [(&str, &str, Option<Unit>); 46] = [
    ("pv1Power", "PV1 Power", Some(Unit::Kilowatts)),
    ("pv2Power", "PV2 Power", Some(Unit::Kilowatts)),
    ("pv3Power", "PV3 Power", Some(Unit::Kilowatts)),
    ("pv4Power", "PV4 Power", Some(Unit::Kilowatts)),
    ("pvPower", "PV Power Total", Some(Unit::Kilowatts)),
    ("pv1Volt", "PV1 Voltage", Some(Unit::Volts)),
    ("pv2Volt", "PV2 Voltage", Some(Unit::Volts)),
    ("pv3Volt", "PV3 Voltage", Some(Unit::Volts)),
    ("pv4Volt", "PV4 Voltage", Some(Unit::Volts)),
    ("pv1Current", "PV1 Current", Some(Unit::Amperes)),
    ("pv2Current", "PV2 Current", Some(Unit::Amperes)),
    ("pv3Current", "PV3 Current", Some(Unit::Amperes)),
    ("pv4Current", "PV4 Current", Some(Unit::Amperes)),
    ("RVolt", "Grid Voltage R", Some(Unit::Volts)),
    ("SVolt", "Grid Voltage S", Some(Unit::Volts)),
    ("TVolt", "Grid Voltage T", Some(Unit::Volts)),
    ("RCurrent", "Grid Current R", Some(Unit::Amperes)),
    ("SCurrent", "Grid Current S", Some(Unit::Amperes)),
    ("TCurrent", "Grid Current T", Some(Unit::Amperes)),
    ("RPower", "Grid Power R", Some(Unit::Kilowatts)),
    ("SPower", "Grid Power S", Some(Unit::Kilowatts)),
    ("TPower", "Grid Power T", Some(Unit::Kilowatts)),
    ("RFreq", "Grid Frequency R", Some(Unit::Hertz)),
    ("SFreq", "Grid Frequency S", Some(Unit::Hertz)),
    ("TFreq", "Grid Frequency T", Some(Unit::Hertz)),
    ("generationPower", "Generation Power", Some(Unit::Kilowatts)),
    ("gridConsumptionPower", "Grid Consumption Power", Some(Unit::Kilowatts)),
    ("feedinPower", "Feed-in Power", Some(Unit::Kilowatts)),
    ("batDischargePower", "Battery Discharge Power", Some(Unit::Kilowatts)),
    ("batChargePower", "Battery Charge Power", Some(Unit::Kilowatts)),
    ("loadsPower", "Load Power", Some(Unit::Kilowatts)),
    ("meterPower2", "Meter Power 2", Some(Unit::Kilowatts)),
    ("reactivePower", "Reactive Power", Some(Unit::KiloVoltAmperesReactive)),
    ("SoC", "Battery SoC", Some(Unit::Percent)),
    ("SoC_1", "Battery SoC 1", Some(Unit::Percent)),
    ("SoC_2", "Battery SoC 2", Some(Unit::Percent)),
    ("SOH", "Battery SoH", Some(Unit::Percent)),
    ("batTemperature", "Battery Temperature", Some(Unit::Celsius)),
    ("batTemperature_2", "Battery Temperature 2", Some(Unit::Celsius)),
    ("invBatPower", "Inverter Battery Power", Some(Unit::Kilowatts)),
    ("invBatPower_2", "Inverter Battery Power 2", Some(Unit::Kilowatts)),
    ("ambientTemperation", "Ambient Temperature", Some(Unit::Celsius)),
    ("boostTemperation", "Boost Temperature", Some(Unit::Celsius)),
    ("invTemperation", "Inverter Temperature", Some(Unit::Celsius)),
    ("powerFactor", "Power Factor", None),
    ("currentFault", "Current Fault Code", None),
];

const BATTERY_SETTINGS: [(&str, &str); 2] =
    [("minSocOnGrid", "Min SoC (On Grid)"), ("minSoc", "Min SoC (Off Grid)")];

const DAILY_REPORT: [(&str, &str); 6] = [
    ("generation", "Energy Generated Today"),
    ("feedin", "Energy Fed In Today"),
    ("gridConsumption", "Energy Grid Consumption Today"),
    ("chargeEnergyToTal", "Energy Battery Charge Today"),
    ("dischargeEnergyToTal", "Energy Battery Discharge Today"),
    ("loads", "Energy Load Today"),
];

/// All known readings.
pub fn catalogue(extended_pv: bool) -> Vec<Reading> {
    let variables = VARIABLES.into_iter().map(|(key, name, unit)| {
        Reading::new(Group::Variables, key, name, unit.map_or(Format::Raw, Format::Measurement))
    });
    let extended = EXTENDED_PV_STRINGS.filter(|_| extended_pv).flat_map(|index| {
        PV_STRING_SUFFIXES.map(|suffix| {
            let (title, unit) = match suffix {
                "Power" => ("Power", Unit::Kilowatts),
                "Volt" => ("Voltage", Unit::Volts),
                _ => ("Current", Unit::Amperes),
            };
            Reading {
                group: Group::Variables,
                key: Cow::Owned(format!("pv{index}{suffix}")),
                name: Cow::Owned(format!("PV{index} {title}")),
                format: Format::Measurement(unit),
            }
        })
    });
    let status = Reading::new(
        Group::Variables,
        "runningStatus",
        "Inverter Status",
        Format::InverterStatus,
    );
    let battery_settings = BATTERY_SETTINGS.into_iter().map(|(key, name)| {
        Reading::new(Group::BatterySettings, key, name, Format::Measurement(Unit::Percent))
    });
    let daily_report = DAILY_REPORT.into_iter().map(|(key, name)| {
        Reading::new(Group::DailyReport, key, name, Format::Measurement(Unit::KilowattHours))
    });
    variables
        .chain(extended)
        .chain([status])
        .chain(battery_settings)
        .chain(daily_report)
        .collect_vec()
}

/// Readings worth showing for the device, judging by the first snapshot.
///
/// The inverter status is always kept, battery settings only for devices with a battery.
pub fn discover(snapshot: &Snapshot, extended_pv: bool) -> Vec<Reading> {
    let has_battery = snapshot.device_detail.value.has_battery;
    catalogue(extended_pv)
        .into_iter()
        .filter(|reading| match (reading.group, reading.format) {
            (_, Format::InverterStatus) => true,
            (Group::BatterySettings, _) => {
                has_battery && snapshot.get(reading.group, &reading.key).is_some()
            }
            _ => snapshot.get(reading.group, &reading.key).is_some(),
        })
        .inspect(|reading| trace!(key = %reading.key, "discovered"))
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        api::foxess::{BatterySettings, DeviceDetail},
        core::Cached,
    };

    fn snapshot(has_battery: bool) -> Snapshot {
        Snapshot {
            online: true,
            variables: Cached {
                value: [
                    ("SoC".to_owned(), VariableValue::Text("55".to_owned())),
                    ("powerFactor".to_owned(), VariableValue::Text("n/a".to_owned())),
                    ("currentFault".to_owned(), VariableValue::Text("E101".to_owned())),
                    ("runningStatus".to_owned(), VariableValue::Text("164".to_owned())),
                    ("pv7Power".to_owned(), VariableValue::Number(0.4)),
                ]
                .into_iter()
                .collect(),
                last_success_at: None,
            },
            device_detail: Cached {
                value: DeviceDetail { has_battery, ..DeviceDetail::default() },
                last_success_at: None,
            },
            battery_settings: Cached {
                value: BatterySettings { min_soc: Some(10.0), min_soc_on_grid: None },
                last_success_at: None,
            },
            daily_report: Cached {
                value: [("generation".to_owned(), 3.5)].into_iter().collect(),
                last_success_at: None,
            },
        }
    }

    fn reading(catalogue: &[Reading], key: &str) -> Reading {
        catalogue.iter().find(|reading| reading.key == key).unwrap().clone()
    }

    #[test]
    fn catalogue_ok() {
        assert_eq!(catalogue(false).len(), 46 + 1 + 2 + 6);
        let extended = catalogue(true);
        assert_eq!(extended.len(), 46 + 14 * 3 + 1 + 2 + 6);
        let pv18_voltage = reading(&extended, "pv18Volt");
        assert_eq!(pv18_voltage.name, "PV18 Voltage");
        assert_eq!(pv18_voltage.unit(), Some(Unit::Volts));
    }

    #[test]
    fn discover_keeps_present_readings() {
        let keys = discover(&snapshot(true), true)
            .into_iter()
            .map(|reading| reading.key.into_owned())
            .collect_vec();
        assert_eq!(
            keys,
            ["SoC", "powerFactor", "currentFault", "pv7Power", "runningStatus", "minSoc", "generation"],
        );
    }

    #[test]
    fn discover_skips_battery_settings_without_battery() {
        let readings = discover(&snapshot(false), false);
        assert!(readings.iter().all(|reading| reading.group != Group::BatterySettings));
        assert!(readings.iter().all(|reading| reading.key != "pv7Power"));
    }

    #[test]
    fn measurement_parses_numeric_text() {
        let catalogue = catalogue(false);
        let mut snapshot = snapshot(true);
        assert_eq!(reading(&catalogue, "SoC").value(&snapshot), Some(VariableValue::Number(55.0)));

        snapshot.variables.value = [("SoC".to_owned(), VariableValue::Text("n/a".to_owned()))]
            .into_iter()
            .collect();
        assert_eq!(reading(&catalogue, "SoC").value(&snapshot), None);
    }

    #[test]
    fn unitless_reading_is_raw() {
        let catalogue = catalogue(false);
        let snapshot = snapshot(true);
        let power_factor = reading(&catalogue, "powerFactor");
        assert_eq!(power_factor.format, Format::Raw);
        assert_eq!(power_factor.unit(), None);
        assert_eq!(power_factor.value(&snapshot), Some(VariableValue::Text("n/a".to_owned())));
        assert_eq!(
            reading(&catalogue, "currentFault").value(&snapshot),
            Some(VariableValue::Text("E101".to_owned())),
        );
        assert_eq!(
            reading(&catalogue, "generation").value(&snapshot),
            Some(VariableValue::Number(3.5)),
        );
    }

    #[test]
    fn inverter_status_ok() {
        let catalogue = catalogue(false);
        let status = reading(&catalogue, "runningStatus");
        assert_eq!(status.value(&snapshot(true)), Some(VariableValue::Text("Off-grid".to_owned())));
        assert_eq!(inverter_status(&VariableValue::Number(1.0)), "Normal");
        assert_eq!(
            status.attributes(&snapshot(true)),
            [("runningStatus", VariableValue::Text("164".to_owned()))],
        );

        let mut with_attributes = snapshot(true);
        with_attributes.variables.value = [
            ("runningStatus".to_owned(), VariableValue::Text("1".to_owned())),
            ("sysStatus".to_owned(), VariableValue::Number(3.0)),
        ]
        .into_iter()
        .collect();
        with_attributes.device_detail.value.last_cloud_sync =
            Some("2025-06-03 12:00:00".to_owned());
        assert_eq!(
            status.attributes(&with_attributes),
            [
                ("runningStatus", VariableValue::Text("1".to_owned())),
                ("sysStatus", VariableValue::Number(3.0)),
                ("lastCloudSync", VariableValue::Text("2025-06-03 12:00:00".to_owned())),
            ],
        );
        assert_eq!(inverter_status(&VariableValue::Text("103".to_owned())), "Unknown (103)");
    }

    #[test]
    fn availability() {
        let catalogue = catalogue(false);
        let state_of_charge = reading(&catalogue, "SoC");
        let min_soc_on_grid = reading(&catalogue, "minSocOnGrid");
        let published =
            Published { snapshot: Arc::new(snapshot(true)), last_update_succeeded: true };
        assert!(state_of_charge.is_available(&published));
        assert!(!min_soc_on_grid.is_available(&published));

        let failed = Published { last_update_succeeded: false, ..published.clone() };
        assert!(!state_of_charge.is_available(&failed));

        let offline = Published {
            snapshot: Arc::new(Snapshot { online: false, ..snapshot(true) }),
            last_update_succeeded: true,
        };
        assert!(!state_of_charge.is_available(&offline));
    }
}
