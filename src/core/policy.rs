use chrono::{DateTime, Local, TimeDelta};
use enumset::EnumSet;

use crate::core::Group;

/// Minimal intervals between successful fetches of the slow groups.
///
/// Real-time variables are fetched on every cycle.
#[derive(Copy, Clone, Debug)]
pub struct Intervals {
    pub device_detail: TimeDelta,
    pub battery_settings: TimeDelta,
    pub daily_report: TimeDelta,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            device_detail: TimeDelta::minutes(15),
            battery_settings: TimeDelta::minutes(60),
            daily_report: TimeDelta::minutes(60),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct RefreshPolicy {
    pub min_interval: TimeDelta,
    pub last_fetched_at: Option<DateTime<Local>>,
}

impl RefreshPolicy {
    pub const fn new(min_interval: TimeDelta) -> Self {
        Self { min_interval, last_fetched_at: None }
    }

    /// A group is due when it has never been fetched, or its interval has elapsed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.last_fetched_at.is_none_or(|last_fetched_at| now - last_fetched_at >= self.min_interval)
    }

    pub const fn mark_fetched(&mut self, now: DateTime<Local>) {
        self.last_fetched_at = Some(now);
    }
}

#[derive(Copy, Clone, Debug)]
pub struct RefreshPolicies {
    variables: RefreshPolicy,
    device_detail: RefreshPolicy,
    battery_settings: RefreshPolicy,
    daily_report: RefreshPolicy,
}

impl Default for RefreshPolicies {
    fn default() -> Self {
        Intervals::default().into()
    }
}

impl From<Intervals> for RefreshPolicies {
    fn from(intervals: Intervals) -> Self {
        Self {
            variables: RefreshPolicy::new(TimeDelta::zero()),
            device_detail: RefreshPolicy::new(intervals.device_detail),
            battery_settings: RefreshPolicy::new(intervals.battery_settings),
            daily_report: RefreshPolicy::new(intervals.daily_report),
        }
    }
}

impl RefreshPolicies {
    pub const fn get(&self, group: Group) -> &RefreshPolicy {
        match group {
            Group::Variables => &self.variables,
            Group::DeviceDetail => &self.device_detail,
            Group::BatterySettings => &self.battery_settings,
            Group::DailyReport => &self.daily_report,
        }
    }

    pub const fn get_mut(&mut self, group: Group) -> &mut RefreshPolicy {
        match group {
            Group::Variables => &mut self.variables,
            Group::DeviceDetail => &mut self.device_detail,
            Group::BatterySettings => &mut self.battery_settings,
            Group::DailyReport => &mut self.daily_report,
        }
    }

    /// Groups whose staleness interval has elapsed.
    pub fn due(&self, now: DateTime<Local>) -> EnumSet<Group> {
        EnumSet::all().iter().filter(|group| self.get(*group).is_due(now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn never_fetched_is_due() {
        let now = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert!(RefreshPolicy::new(TimeDelta::minutes(15)).is_due(now));
    }

    #[test]
    fn staleness_gating() {
        let fetched_at = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut policy = RefreshPolicy::new(TimeDelta::minutes(15));
        policy.mark_fetched(fetched_at);
        assert!(!policy.is_due(fetched_at + TimeDelta::minutes(14)));
        assert!(policy.is_due(fetched_at + TimeDelta::minutes(15)));
        assert!(policy.is_due(fetched_at + TimeDelta::minutes(16)));
    }

    #[test]
    fn variables_are_always_due() {
        let now = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut policies = RefreshPolicies::default();
        for group in EnumSet::<Group>::all() {
            policies.get_mut(group).mark_fetched(now);
        }
        assert_eq!(policies.due(now), EnumSet::only(Group::Variables));
        assert_eq!(
            policies.due(now + TimeDelta::minutes(15)),
            Group::Variables | Group::DeviceDetail,
        );
        assert_eq!(policies.due(now + TimeDelta::hours(1)), EnumSet::all());
    }
}
