use std::time::Duration;

use clap::Parser;
use tokio::{
    pin,
    select,
    signal::{
        ctrl_c,
        unix::{SignalKind, signal},
    },
    time::{MissedTickBehavior, interval},
};

use crate::{cli::CoordinatorArgs, prelude::*, readings::discover, tables::build_readings_table};

#[derive(Parser)]
pub struct WatchArgs {
    /// Interval between the cycles, real-time variables are fetched on every one.
    #[clap(long, env = "POLLING_INTERVAL", default_value = "1min")]
    polling_interval: humantime::Duration,

    #[clap(flatten)]
    coordinator: CoordinatorArgs,
}

impl WatchArgs {
    pub async fn run(self) -> Result {
        let mut coordinator = self.coordinator.bootstrap().await?;
        let readings = discover(&coordinator.latest(), self.coordinator.fox_ess_api.extended_pv);
        info!(n_readings = readings.len(), "discovered the readings");

        println!("{}", build_readings_table(&readings, &coordinator.published()));
        let renderer = coordinator.on_published(move |published| {
            println!("{}", build_readings_table(&readings, published));
        });

        let polling_interval: Duration = self.polling_interval.into();
        let mut interval = interval(polling_interval);
        interval.reset_after(polling_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = shutdown_signal();
        pin!(shutdown);

        loop {
            select! {
                result = &mut shutdown => {
                    result?;
                    info!("shutting down…");
                    break;
                }
                result = async {
                    interval.tick().await;
                    coordinator.refresh().await
                } => {
                    if let Err(error) = result
                        && error.requires_reauthentication()
                    {
                        warn!("check the API key, the cloud keeps rejecting it");
                    }
                }
            }
        }

        drop(coordinator);
        renderer.await?;
        Ok(())
    }
}

async fn shutdown_signal() -> Result {
    let mut terminate = signal(SignalKind::terminate())?;
    select! {
        result = ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}
