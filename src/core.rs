mod coordinator;
mod group;
mod merge;
mod policy;
mod snapshot;

pub use self::{
    coordinator::{Coordinator, Published, UpdateFailed},
    group::Group,
    policy::{Intervals, RefreshPolicies},
    snapshot::{Cached, DailyReport, RealTimeVariables, Snapshot, VariableValue},
};
