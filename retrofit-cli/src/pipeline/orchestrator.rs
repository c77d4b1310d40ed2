//! Runs the per-scenario pipeline over a batch and collects independent outcomes.

use std::{
    collections::BTreeMap,
    fmt::Display,
    panic::{self, AssertUnwindSafe},
    sync::mpsc,
    thread,
    time::Instant,
};

use average::Mean;
use bon::Builder;
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use retrofit_quantities::energy::KilowattHours;

use crate::{
    pipeline::{
        PipelineError,
        disaggregation::{DegenerateSharePolicy, Disaggregator, EndUseSeries},
        end_use::EndUseMap,
        estimator::{TotalEstimator, TotalSeries},
        features::FeatureTable,
        model::Regressor,
        scenario::{MAX_SCENARIOS, Scenario, ScenarioIndex},
        weather::WeatherAtlas,
    },
    prelude::*,
};

/// Successful result of a single scenario.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Forecast {
    pub dates: Vec<NaiveDate>,
    pub total: TotalSeries,
    pub end_uses: EndUseSeries,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl Forecast {
    pub fn annual_total(&self) -> KilowattHours {
        self.total.sum()
    }

    pub fn mean_daily_total(&self) -> KilowattHours {
        let estimate: Mean = self.total.as_slice().iter().map(|total| total.0).collect();
        if estimate.is_empty() { KilowattHours::ZERO } else { KilowattHours(estimate.mean()) }
    }

    pub fn annual_end_uses(&self) -> EndUseMap<KilowattHours> {
        self.end_uses.sum()
    }

    /// Daily totals aggregated by calendar month, in chronological order.
    #[must_use]
    pub fn monthly_totals(&self) -> Vec<(YearMonth, KilowattHours)> {
        let mut months = BTreeMap::new();
        for (date, total) in self.dates.iter().zip(self.total.as_slice()) {
            let key = YearMonth { year: date.year(), month: date.month() };
            *months.entry(key).or_insert(KilowattHours::ZERO) += *total;
        }
        months.into_iter().collect()
    }

    pub fn days(
        &self,
    ) -> impl Iterator<Item = (NaiveDate, KilowattHours, EndUseMap<KilowattHours>)> {
        self.dates
            .iter()
            .zip(self.total.as_slice())
            .zip(self.end_uses.as_slice())
            .map(|((date, total), end_uses)| (*date, *total, *end_uses))
    }
}

pub type Outcome = Result<Forecast, PipelineError>;

/// Scenario index to its outcome, failed scenarios included.
#[must_use]
#[derive(Debug, Default)]
pub struct ResultSet(BTreeMap<ScenarioIndex, Outcome>);

impl ResultSet {
    #[must_use]
    pub fn n_scenarios(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScenarioIndex, &Outcome)> {
        self.0.iter().map(|(index, outcome)| (*index, outcome))
    }

    pub fn forecasts(&self) -> impl Iterator<Item = (ScenarioIndex, &Forecast)> {
        self.iter()
            .filter_map(|(index, outcome)| outcome.as_ref().ok().map(|forecast| (index, forecast)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (ScenarioIndex, &PipelineError)> {
        self.iter()
            .filter_map(|(index, outcome)| outcome.as_ref().err().map(|error| (index, error)))
    }

    #[must_use]
    pub fn n_succeeded(&self) -> usize {
        self.forecasts().count()
    }
}

impl FromIterator<(ScenarioIndex, Outcome)> for ResultSet {
    fn from_iter<T: IntoIterator<Item = (ScenarioIndex, Outcome)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn fraction(self) -> f64 {
        self.completed as f64 / self.total as f64
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

#[derive(Builder)]
pub struct Orchestrator<'a> {
    atlas: &'a WeatherAtlas,
    total_model: &'a dyn Regressor,
    end_use_model: &'a dyn Regressor,

    #[builder(default)]
    degenerate_policy: DegenerateSharePolicy,
}

impl Orchestrator<'_> {
    /// Features, then the total, then the end uses. Stops at the first failing step.
    #[instrument(skip_all, fields(region = %scenario.region))]
    pub fn forecast(&self, scenario: &Scenario) -> Outcome {
        let table = FeatureTable::build(scenario, self.atlas)?;
        let total = TotalEstimator::new(self.total_model).estimate(&table)?;
        let dates = table.dates().to_vec();
        let augmented = table.with_total(&total)?;
        let end_uses = Disaggregator::builder()
            .model(self.end_use_model)
            .degenerate_policy(self.degenerate_policy)
            .build()
            .disaggregate(&augmented, scenario)?;
        Ok(Forecast { dates, total, end_uses })
    }

    /// Forecast the scenarios one by one, reporting progress after each.
    #[instrument(skip_all, fields(n_scenarios = scenarios.len()))]
    pub fn run(
        &self,
        scenarios: &[Scenario],
        mut on_progress: impl FnMut(Progress),
    ) -> Result<ResultSet, PipelineError> {
        validate_count(scenarios)?;
        let start_time = Instant::now();
        let mut results = BTreeMap::new();
        for (index, scenario) in ScenarioIndex::enumerate(scenarios) {
            let outcome = self.forecast(scenario);
            log_outcome(index, &outcome);
            results.insert(index, outcome);
            on_progress(Progress { completed: index.0, total: scenarios.len() });
        }
        info!(elapsed = ?start_time.elapsed(), "completed");
        Ok(ResultSet(results))
    }

    /// Forecast each scenario on its own scoped thread.
    ///
    /// Progress is reported as the scenarios complete, in completion order.
    #[instrument(skip_all, fields(n_scenarios = scenarios.len()))]
    pub fn run_parallel(
        &self,
        scenarios: &[Scenario],
        mut on_progress: impl FnMut(Progress),
    ) -> Result<ResultSet, PipelineError> {
        validate_count(scenarios)?;
        let start_time = Instant::now();
        let mut results = BTreeMap::new();
        thread::scope(|scope| {
            let (sender, receiver) = mpsc::channel();
            for (index, scenario) in ScenarioIndex::enumerate(scenarios) {
                let sender = sender.clone();
                scope.spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.forecast(scenario)))
                        .unwrap_or_else(|_| {
                            Err(PipelineError::model_inference("the scenario thread panicked"))
                        });
                    // The receiver is drained until every sender is dropped.
                    let _ = sender.send((index, outcome));
                });
            }
            drop(sender);
            for (index, outcome) in receiver {
                log_outcome(index, &outcome);
                results.insert(index, outcome);
                on_progress(Progress { completed: results.len(), total: scenarios.len() });
            }
        });
        info!(elapsed = ?start_time.elapsed(), "completed");
        Ok(ResultSet(results))
    }
}

fn validate_count(scenarios: &[Scenario]) -> Result<(), PipelineError> {
    if scenarios.is_empty() || scenarios.len() > MAX_SCENARIOS {
        Err(PipelineError::ScenarioCount { actual: scenarios.len(), max: MAX_SCENARIOS })
    } else {
        Ok(())
    }
}

fn log_outcome(index: ScenarioIndex, outcome: &Outcome) {
    match outcome {
        Ok(forecast) => {
            info!(%index, annual_total = ?forecast.annual_total(), "forecasted");
        }
        Err(error) => {
            warn!(%index, %error, "failed");
        }
    }
}
