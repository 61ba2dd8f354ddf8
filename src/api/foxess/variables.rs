use itertools::Itertools;

/// Real-time variables requested on every cycle.
pub const DEFAULT_VARIABLES: [&str; 80] = [
    "ambientTemperation", "batChargePower", "batCurrent", "batDischargePower", "batTemperature", "batVolt",
    "boostTemperation", "chargeTemperature", "dcdcStatus", "dspStatus", "ECharge", "EChargeTotal",
    "EDischarge", "EDischargeTotal", "EGeneration", "EGenerationTotal", "EGridCharge", "EGridChargeTotal",
    "EGridDischarge", "EGridDischargeTotal", "EInputTotal", "ELoad", "ELoadTotal", "EOutputTotal",
    "epsCurrentR", "epsCurrentS", "epsCurrentT", "epsPower", "epsPowerR", "epsPowerS",
    "epsPowerT", "epsVoltR", "epsVoltS", "epsVoltT", "feedinPower", "generationPower",
    "gridConsumptionPower", "invBatCurrent", "invBatPower", "invBatVolt", "invOutputCurrent", "invOutputPower",
    "invOutputVolt", "invStatus", "invTemperation", "loadsPower", "meterPower", "meterPower2",
    "meterStatus", "powerFactor", "pv1Current", "pv1Power", "pv1Volt", "pv2Current",
    "pv2Power", "pv2Volt", "pv3Current", "pv3Power", "pv3Volt", "pv4Current",
    "pv4Power", "pv4Volt", "pvPower", "RCurrent", "reactivePower", "RFreq",
    "RPower", "RVolt", "runningStatus", "SCurrent", "SFreq", "SoC",
    "SPower", "SVolt", "sysStatus", "TCurrent", "TFreq", "TPower",
    "TVolt", "currentFault",
];

/// Energy report variables, one monthly series each.
pub const REPORT_VARIABLES: [&str; 6] =
    ["generation", "feedin", "gridConsumption", "chargeEnergyToTal", "dischargeEnergyToTal", "loads"];

/// PV strings beyond the four every inverter reports.
pub const EXTENDED_PV_STRINGS: std::ops::RangeInclusive<usize> = 5..=18;

/// Per-string variable suffixes.
pub const PV_STRING_SUFFIXES: [&str; 3] = ["Current", "Power", "Volt"];

/// Build the variable list for a real-time query.
///
/// With `extended_pv`, the PV 5–18 variables are appended, skipping those already requested.
pub fn request_variables(base: &[&str], extended_pv: bool) -> Vec<String> {
    let extended = EXTENDED_PV_STRINGS
        .filter(|_| extended_pv)
        .flat_map(|index| PV_STRING_SUFFIXES.map(|suffix| format!("pv{index}{suffix}")));
    base.iter().map(ToString::to_string).chain(extended).unique().collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_list_is_unchanged_without_extended_pv() {
        let variables = request_variables(&DEFAULT_VARIABLES, false);
        assert_eq!(variables, DEFAULT_VARIABLES.map(String::from).to_vec());
    }

    #[test]
    fn extended_pv_appends_all_strings() {
        let variables = request_variables(&DEFAULT_VARIABLES, true);
        assert_eq!(variables.len(), DEFAULT_VARIABLES.len() + 14 * 3);
        assert_eq!(variables.iter().filter(|name| *name == "pv10Power").count(), 1);
        assert_eq!(variables.last().map(String::as_str), Some("pv18Volt"));
    }

    #[test]
    fn extended_pv_skips_already_requested() {
        let base = ["SoC", "pv5Power", "pv18Current"];
        let variables = request_variables(&base, true);
        assert_eq!(variables.len(), base.len() + 14 * 3 - 2);
        assert_eq!(variables.iter().filter(|name| *name == "pv5Power").count(), 1);
        assert_eq!(&variables[..3], &["SoC", "pv5Power", "pv18Current"]);
    }
}
