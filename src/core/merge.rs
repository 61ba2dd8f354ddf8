use chrono::{DateTime, Datelike, Local};

use crate::{
    api::foxess::{ApiError, BatterySettings, DeviceDetail, ReportSeries},
    core::{
        Group,
        snapshot::{Cached, DailyReport, RealTimeVariables, Snapshot},
    },
};

/// Results obtained in a single cycle, [`None`] for the groups that were not due.
#[derive(Default)]
pub struct Fetched {
    pub variables: Option<Result<RealTimeVariables, ApiError>>,
    pub device_detail: Option<Result<DeviceDetail, ApiError>>,
    pub battery_settings: Option<Result<BatterySettings, ApiError>>,
    pub report: Option<Result<Vec<ReportSeries>, ApiError>>,
}

impl Fetched {
    /// Groups that were fetched successfully.
    pub fn succeeded(&self) -> enumset::EnumSet<Group> {
        [
            (Group::Variables, matches!(self.variables, Some(Ok(_)))),
            (Group::DeviceDetail, matches!(self.device_detail, Some(Ok(_)))),
            (Group::BatterySettings, matches!(self.battery_settings, Some(Ok(_)))),
            (Group::DailyReport, matches!(self.report, Some(Ok(_)))),
        ]
        .into_iter()
        .filter_map(|(group, is_ok)| is_ok.then_some(group))
        .collect()
    }
}

pub struct Merged {
    pub snapshot: Snapshot,

    /// Failed groups, their previous values are kept in the snapshot.
    pub failures: Vec<(Group, ApiError)>,
}

/// Fold the cycle results into the previous snapshot.
///
/// A group is only ever replaced as a whole, and only by a successful result.
pub fn merge(previous: &Snapshot, fetched: Fetched, now: DateTime<Local>) -> Merged {
    let mut failures = Vec::new();
    let online = matches!(fetched.variables, Some(Ok(_)));
    let daily_report = fetched
        .report
        .map(|result| result.map(|series| select_day(&series, now.day())));
    let snapshot = Snapshot {
        online,
        variables: fold(Group::Variables, &previous.variables, fetched.variables, now, &mut failures),
        device_detail: fold(
            Group::DeviceDetail,
            &previous.device_detail,
            fetched.device_detail,
            now,
            &mut failures,
        ),
        battery_settings: fold(
            Group::BatterySettings,
            &previous.battery_settings,
            fetched.battery_settings,
            now,
            &mut failures,
        ),
        daily_report: fold(
            Group::DailyReport,
            &previous.daily_report,
            daily_report,
            now,
            &mut failures,
        ),
    };
    Merged { snapshot, failures }
}

fn fold<T: Clone>(
    group: Group,
    previous: &Cached<T>,
    result: Option<Result<T, ApiError>>,
    now: DateTime<Local>,
    failures: &mut Vec<(Group, ApiError)>,
) -> Cached<T> {
    match result {
        None => previous.clone(),
        Some(Ok(value)) => Cached::fresh(value, now),
        Some(Err(error)) => {
            failures.push((group, error));
            previous.clone()
        }
    }
}

/// Reduce the monthly series to the given day of month.
///
/// Missing entries count as zero.
pub fn select_day(series: &[ReportSeries], day_of_month: u32) -> DailyReport {
    let index = day_of_month.checked_sub(1).and_then(|index| usize::try_from(index).ok());
    series
        .iter()
        .map(|series| {
            let value = index
                .and_then(|index| series.values.get(index).copied().flatten())
                .unwrap_or_default();
            (series.variable.clone(), round_to_watt_hours(value))
        })
        .collect()
}

fn round_to_watt_hours(kilowatt_hours: f64) -> f64 {
    (kilowatt_hours * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::core::VariableValue;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 3, 12, 0, 0).unwrap()
    }

    fn variables(state_of_charge: f64) -> RealTimeVariables {
        [("SoC".to_owned(), VariableValue::Number(state_of_charge))].into_iter().collect()
    }

    fn series(values: Vec<Option<f64>>) -> Vec<ReportSeries> {
        vec![ReportSeries { variable: "generation".to_owned(), values }]
    }

    fn previous() -> Snapshot {
        let earlier = now() - TimeDelta::minutes(30);
        Snapshot {
            online: true,
            variables: Cached::fresh(variables(40.0), earlier),
            device_detail: Cached::fresh(
                DeviceDetail { has_battery: true, ..DeviceDetail::default() },
                earlier,
            ),
            battery_settings: Cached::fresh(
                BatterySettings { min_soc: Some(10.0), min_soc_on_grid: Some(15.0) },
                earlier,
            ),
            daily_report: Cached::fresh(select_day(&series(vec![Some(1.0)]), 1), earlier),
        }
    }

    #[test]
    fn failure_keeps_previous_value() {
        let previous = previous();
        let fetched = Fetched {
            variables: Some(Ok(variables(41.0))),
            device_detail: Some(Err(ApiError::Timeout("detail".to_owned()))),
            battery_settings: Some(Err(ApiError::Auth("battery".to_owned()))),
            report: Some(Err(ApiError::InvalidResponse("report".to_owned()))),
        };
        let Merged { snapshot, failures } = merge(&previous, fetched, now());
        assert_eq!(snapshot.device_detail, previous.device_detail);
        assert_eq!(snapshot.battery_settings, previous.battery_settings);
        assert_eq!(snapshot.daily_report, previous.daily_report);
        assert_eq!(
            failures.iter().map(|(group, _)| *group).collect::<Vec<_>>(),
            [Group::DeviceDetail, Group::BatterySettings, Group::DailyReport],
        );
    }

    #[test]
    fn success_replaces_whole_group() {
        let pv_power = [("pvPower".to_owned(), VariableValue::Number(1.2))].into_iter().collect();
        let fetched = Fetched { variables: Some(Ok(pv_power)), ..Fetched::default() };
        let Merged { snapshot, failures } = merge(&previous(), fetched, now());
        assert!(failures.is_empty());
        assert_eq!(snapshot.variables.last_success_at, Some(now()));
        assert!(snapshot.variables.value.get("SoC").is_none());
        assert_eq!(snapshot.get(Group::Variables, "pvPower"), Some(VariableValue::Number(1.2)));
    }

    #[test]
    fn online_reflects_only_this_cycle() {
        let failed = Fetched {
            variables: Some(Err(ApiError::Generic("boom".to_owned()))),
            ..Fetched::default()
        };
        let Merged { snapshot, failures } = merge(&previous(), failed, now());
        assert!(!snapshot.online);
        assert_eq!(snapshot.variables, previous().variables);
        assert_eq!(failures.len(), 1);

        let offline = Snapshot { online: false, ..previous() };
        let recovered = Fetched { variables: Some(Ok(variables(42.0))), ..Fetched::default() };
        assert!(merge(&offline, recovered, now()).snapshot.online);
    }

    #[test]
    fn empty_merge_is_idempotent() {
        let previous = Snapshot { online: false, ..previous() };
        let Merged { snapshot, failures } = merge(&previous, Fetched::default(), now());
        assert_eq!(snapshot, previous);
        assert!(failures.is_empty());
    }

    #[test]
    fn empty_merge_clears_online() {
        let Merged { snapshot, .. } = merge(&previous(), Fetched::default(), now());
        assert!(!snapshot.online);
        assert_eq!(snapshot, Snapshot { online: false, ..previous() });
    }

    #[test]
    fn fresh_report_is_reduced_to_today() {
        let fetched = Fetched {
            report: Some(Ok(series(vec![Some(1.0), Some(2.0), Some(3.25)]))),
            ..Fetched::default()
        };
        let Merged { snapshot, .. } = merge(&previous(), fetched, now());
        assert_eq!(snapshot.daily_report.value.get("generation").copied(), Some(3.25));
    }

    #[test]
    fn select_day_ok() {
        let series = series(vec![Some(1.0), Some(2.0), None, Some(4.0)]);
        assert_abs_diff_eq!(select_day(&series, 3)["generation"], 0.0);
        assert_abs_diff_eq!(select_day(&series, 1)["generation"], 1.0);
        assert_abs_diff_eq!(select_day(&series, 4)["generation"], 4.0);
        assert_abs_diff_eq!(select_day(&series, 31)["generation"], 0.0);
    }

    #[test]
    fn select_day_rounds_to_watt_hours() {
        let report = select_day(&series(vec![Some(12.345_678)]), 1);
        assert_abs_diff_eq!(report["generation"], 12.346);
    }
}
