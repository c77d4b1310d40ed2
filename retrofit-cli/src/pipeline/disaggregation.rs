//! Splits the daily total into end uses.

use bon::Builder;
use enumset::EnumSet;
use retrofit_quantities::energy::KilowattHours;

use crate::{
    pipeline::{
        PipelineError,
        end_use::{EndUse, EndUseMap},
        features::AugmentedFeatureTable,
        model::{Regressor, ensure_features},
        scenario::Scenario,
    },
    prelude::*,
};

/// What to do on a day when every permitted share is zero after clipping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DegenerateSharePolicy {
    /// Fail the scenario.
    #[default]
    Error,

    /// Split the total evenly among the permitted end uses.
    Uniform,
}

/// Daily end-use consumption, aligned with the feature table rows.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EndUseSeries(Vec<EndUseMap<KilowattHours>>);

impl EndUseSeries {
    #[must_use]
    pub fn as_slice(&self) -> &[EndUseMap<KilowattHours>] {
        &self.0
    }

    pub fn sum(&self) -> EndUseMap<KilowattHours> {
        let mut sum = EndUseMap::default();
        for day in &self.0 {
            sum += *day;
        }
        sum
    }
}

impl FromIterator<EndUseMap<KilowattHours>> for EndUseSeries {
    fn from_iter<T: IntoIterator<Item = EndUseMap<KilowattHours>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Builder)]
pub struct Disaggregator<'a> {
    model: &'a dyn Regressor,

    #[builder(default)]
    degenerate_policy: DegenerateSharePolicy,
}

impl Disaggregator<'_> {
    /// Convert the model's raw shares into kWh per end use, day by day.
    ///
    /// Negative and non-finite shares are clipped to zero, and absent pool or spa is forced
    /// to zero.
    /// The remaining shares are renormalized and scaled by the day's total.
    #[instrument(skip_all)]
    pub fn disaggregate(
        &self,
        table: &AugmentedFeatureTable,
        scenario: &Scenario,
    ) -> Result<EndUseSeries, PipelineError> {
        ensure_features(self.model, &AugmentedFeatureTable::header())?;
        let raw_shares = self.model.predict(table.values())?;
        if raw_shares.dim() != (table.n_days(), EndUse::N) {
            return Err(PipelineError::model_inference(format!(
                "expected ({}, {}) end-use shares, got {:?}",
                table.n_days(),
                EndUse::N,
                raw_shares.dim(),
            )));
        }

        let permitted = scenario.permitted_end_uses();
        let mut n_degenerate = 0_usize;
        let mut series = Vec::with_capacity(table.n_days());

        let days = table.dates().iter().zip(raw_shares.rows()).zip(table.totals());
        for ((date, raw), total) in days {
            let mut shares = EndUseMap::from_fn(|end_use| {
                let share = raw[end_use.index()];
                if permitted.contains(end_use) && share.is_finite() && share > 0.0 {
                    share
                } else {
                    0.0
                }
            });
            let sum: f64 = shares.0.iter().sum();
            if sum > 0.0 {
                for share in &mut shares.0 {
                    *share /= sum;
                }
            } else {
                match self.degenerate_policy {
                    DegenerateSharePolicy::Error => {
                        return Err(PipelineError::DegenerateShare { date: *date });
                    }
                    DegenerateSharePolicy::Uniform => {
                        n_degenerate += 1;
                        shares = uniform_shares(permitted);
                    }
                }
            }
            series.push(EndUseMap::from_fn(|end_use| {
                if permitted.contains(end_use) {
                    KilowattHours(shares[end_use] * total)
                } else {
                    KilowattHours::ZERO
                }
            }));
        }

        if n_degenerate != 0 {
            warn!(n_degenerate, "split degenerate days evenly");
        }
        Ok(EndUseSeries(series))
    }
}

#[expect(clippy::cast_precision_loss)]
fn uniform_shares(permitted: EnumSet<EndUse>) -> EndUseMap<f64> {
    let share = 1.0 / permitted.len() as f64;
    EndUseMap::from_fn(|end_use| if permitted.contains(end_use) { share } else { 0.0 })
}
