use crate::{cli::CoordinatorArgs, prelude::*, readings::discover, tables::build_readings_table};

impl CoordinatorArgs {
    pub async fn run(self) -> Result {
        let coordinator = self.bootstrap().await?;
        let published = coordinator.published();
        let readings = discover(&published.snapshot, self.fox_ess_api.extended_pv);
        println!("{}", build_readings_table(&readings, &published));
        Ok(())
    }
}
