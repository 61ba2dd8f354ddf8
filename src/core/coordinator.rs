use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, Datelike, Local};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    api::foxess::{ApiError, DEFAULT_VARIABLES, RemoteData},
    core::{
        Group,
        merge::{Fetched, Merged, merge},
        policy::RefreshPolicies,
        snapshot::Snapshot,
    },
    prelude::*,
};

/// What subscribers receive on every publication.
#[derive(Clone, Debug, Default)]
pub struct Published {
    pub snapshot: Arc<Snapshot>,

    /// Whether the real-time variables were fetched in the latest cycle.
    pub last_update_succeeded: bool,
}

/// Failure of the mandatory real-time variables fetch.
#[derive(Debug, thiserror::Error)]
pub enum UpdateFailed {
    /// The token got rejected, re-authentication is needed.
    #[error("authentication error: {0}")]
    Authentication(#[source] ApiError),

    /// Worth retrying on the next cycle.
    #[error("update failed: {0}")]
    Transient(#[source] ApiError),
}

impl From<ApiError> for UpdateFailed {
    fn from(error: ApiError) -> Self {
        if error.is_auth() { Self::Authentication(error) } else { Self::Transient(error) }
    }
}

impl UpdateFailed {
    pub const fn requires_reauthentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Owns the fetch schedule and the latest snapshot of a single device.
///
/// One cycle runs at a time, enforced by `&mut self`.
#[derive(Builder)]
pub struct Coordinator<C> {
    client: C,

    #[builder(into)]
    serial_number: String,

    #[builder(default)]
    extended_pv: bool,

    #[builder(default = DEFAULT_VARIABLES.to_vec())]
    variable_names: Vec<&'static str>,

    #[builder(default, into)]
    policies: RefreshPolicies,

    #[builder(skip = watch::channel(Published::default()).0)]
    sender: watch::Sender<Published>,
}

struct Cycle {
    snapshot: Snapshot,

    /// Set when the real-time variables could not be fetched.
    failure: Option<ApiError>,
}

impl<C: RemoteData> Coordinator<C> {
    /// Run the first cycle.
    ///
    /// Unlike the regular cycles, failing to fetch the real-time variables here is fatal,
    /// and nothing gets published.
    pub async fn bootstrap(self) -> Result<Self, UpdateFailed> {
        self.bootstrap_at(Local::now()).await
    }

    #[instrument(skip_all, fields(serial_number = %self.serial_number))]
    async fn bootstrap_at(mut self, now: DateTime<Local>) -> Result<Self, UpdateFailed> {
        let cycle = self.run_cycle(now).await;
        if let Some(error) = cycle.failure {
            error!("initial fetch failed: {error:#}");
            return Err(error.into());
        }
        self.publish(cycle.snapshot, true);
        info!("ready");
        Ok(self)
    }

    /// Run a regular cycle and publish its snapshot.
    ///
    /// The snapshot gets published even when the real-time variables fail,
    /// so that subscribers see it went offline.
    pub async fn refresh(&mut self) -> Result<(), UpdateFailed> {
        self.refresh_at(Local::now()).await
    }

    #[instrument(skip_all, fields(serial_number = %self.serial_number))]
    async fn refresh_at(&mut self, now: DateTime<Local>) -> Result<(), UpdateFailed> {
        let cycle = self.run_cycle(now).await;
        self.publish(cycle.snapshot, cycle.failure.is_none());
        match cycle.failure {
            None => Ok(()),
            Some(error) => {
                let error = UpdateFailed::from(error);
                if error.requires_reauthentication() {
                    error!("{error:#}");
                } else {
                    warn!("{error:#}");
                }
                Err(error)
            }
        }
    }

    async fn run_cycle(&mut self, now: DateTime<Local>) -> Cycle {
        let previous = self.latest();
        let due = self.policies.due(now);
        debug!(?due, "starting the cycle…");

        let mut fetched = Fetched::default();
        if due.contains(Group::Variables) {
            fetched.variables = Some(
                self.client
                    .fetch_realtime_variables(
                        &self.serial_number,
                        &self.variable_names,
                        self.extended_pv,
                    )
                    .await,
            );
        }
        if due.contains(Group::DeviceDetail) {
            fetched.device_detail = Some(self.client.fetch_device_detail(&self.serial_number).await);
        }
        let has_battery = match &fetched.device_detail {
            Some(Ok(device_detail)) => device_detail.has_battery,
            _ => previous.device_detail.value.has_battery,
        };
        if has_battery && due.contains(Group::BatterySettings) {
            fetched.battery_settings =
                Some(self.client.fetch_battery_settings(&self.serial_number).await);
        }
        if due.contains(Group::DailyReport) {
            fetched.report =
                Some(self.client.fetch_report(&self.serial_number, now.year(), now.month()).await);
        }

        let succeeded = fetched.succeeded();
        for group in succeeded {
            self.policies.get_mut(group).mark_fetched(now);
        }

        let Merged { snapshot, failures } = merge(&previous, fetched, now);
        let mut failure = None;
        for (group, error) in failures {
            if group == Group::Variables {
                failure = Some(error);
            } else {
                warn!(%group, "keeping the previous value: {error:#}");
            }
        }
        info!(?succeeded, online = snapshot.online, "cycle finished");
        Cycle { snapshot, failure }
    }

    fn publish(&self, snapshot: Snapshot, last_update_succeeded: bool) {
        self.sender.send_replace(Published { snapshot: Arc::new(snapshot), last_update_succeeded });
    }
}

impl<C> Coordinator<C> {
    pub fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.sender.borrow().snapshot)
    }

    pub fn published(&self) -> Published {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Published> {
        self.sender.subscribe()
    }

    /// Call back on every publication, until the coordinator is dropped.
    pub fn on_published<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(&Published) + Send + 'static,
    {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let published = receiver.borrow_and_update().clone();
                callback(&published);
            }
        })
    }
}
