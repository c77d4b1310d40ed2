use std::path::PathBuf;

use clap::Parser;

use crate::{
    cli::reference::ReferenceArgs,
    export::export_csv,
    fmt::FormattedShare,
    input::ScenarioFile,
    pipeline::{
        disaggregation::DegenerateSharePolicy,
        model::LinearModel,
        orchestrator::{Orchestrator, Progress},
        weather::WeatherAtlas,
    },
    prelude::*,
    tables::{build_annual_table, build_end_use_table, build_failures_table, build_monthly_table},
};

#[derive(Parser)]
pub struct SimulateArgs {
    /// TOML file with one to five `[[scenario]]` entries.
    #[clap(long = "scenarios-path", env = "SCENARIOS_PATH", default_value = "scenarios.toml")]
    scenarios_path: PathBuf,

    #[clap(flatten)]
    reference: ReferenceArgs,

    /// Daily regional weather: `region,date,day_of_week,temperature,relative_humidity`.
    #[clap(long = "weather-path", env = "WEATHER_PATH", default_value = "weather.csv")]
    weather_path: PathBuf,

    #[clap(
        long = "total-model-path",
        env = "TOTAL_MODEL_PATH",
        default_value = "models/total.json"
    )]
    total_model_path: PathBuf,

    #[clap(
        long = "end-use-model-path",
        env = "END_USE_MODEL_PATH",
        default_value = "models/end_use.json"
    )]
    end_use_model_path: PathBuf,

    /// Forecast each scenario on its own thread.
    #[clap(long, env = "PARALLEL")]
    parallel: bool,

    /// How to split a day on which the model assigns nothing to any permitted end use.
    #[clap(long, env = "DEGENERATE_SHARES", default_value = "error")]
    degenerate_shares: DegenerateSharePolicy,

    /// Also write the daily forecasts to this CSV file.
    #[clap(long = "export-path", env = "EXPORT_PATH")]
    export_path: Option<PathBuf>,
}

impl SimulateArgs {
    #[instrument(skip_all)]
    pub fn run(self) -> Result {
        let mapping = self.reference.load()?;
        let scenarios = ScenarioFile::read_from(&self.scenarios_path)?.resolve(&mapping)?;
        let atlas =
            WeatherAtlas::read_from(&self.weather_path).context("failed to load the weather")?;
        let total_model = LinearModel::read_from(&self.total_model_path)
            .context("failed to load the total consumption model")?;
        let end_use_model = LinearModel::read_from(&self.end_use_model_path)
            .context("failed to load the end-use model")?;

        let orchestrator = Orchestrator::builder()
            .atlas(&atlas)
            .total_model(&total_model)
            .end_use_model(&end_use_model)
            .degenerate_policy(self.degenerate_shares)
            .build();
        let on_progress = |progress: Progress| {
            info!(%progress, fraction = ?FormattedShare(progress.fraction()), "scenario completed");
        };
        let results = if self.parallel {
            orchestrator.run_parallel(&scenarios, on_progress)?
        } else {
            orchestrator.run(&scenarios, on_progress)?
        };

        println!("{}", build_annual_table(&results));
        println!("{}", build_end_use_table(&results));
        println!("{}", build_monthly_table(&results));
        if results.failures().next().is_some() {
            println!("{}", build_failures_table(&results));
        }
        if let Some(export_path) = &self.export_path {
            export_csv(&results, export_path)?;
        }

        ensure!(results.n_succeeded() != 0, "all {} scenarios failed", results.n_scenarios());
        Ok(())
    }
}
