use retrofit_quantities::energy::KilowattHours;

use crate::{
    pipeline::{
        PipelineError,
        features::FeatureTable,
        model::{Regressor, ensure_features},
    },
    prelude::*,
};

/// Daily total consumption, aligned with the feature table rows.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TotalSeries(Vec<KilowattHours>);

impl TotalSeries {
    #[must_use]
    pub fn as_slice(&self) -> &[KilowattHours] {
        &self.0
    }

    pub fn sum(&self) -> KilowattHours {
        self.0.iter().copied().sum()
    }

    #[must_use]
    pub fn to_vec_f64(&self) -> Vec<f64> {
        self.0.iter().map(|total| total.0).collect()
    }
}

impl FromIterator<KilowattHours> for TotalSeries {
    fn from_iter<T: IntoIterator<Item = KilowattHours>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Predicts the daily total from the feature table.
#[derive(Copy, Clone)]
pub struct TotalEstimator<'a> {
    model: &'a dyn Regressor,
}

impl<'a> TotalEstimator<'a> {
    pub const fn new(model: &'a dyn Regressor) -> Self {
        Self { model }
    }

    /// Raw predictions are kept as-is, negative days included.
    #[instrument(skip_all)]
    pub fn estimate(&self, table: &FeatureTable) -> Result<TotalSeries, PipelineError> {
        ensure_features(self.model, &FeatureTable::header())?;
        let outputs = self.model.predict(table.values())?;
        if outputs.dim() != (table.n_days(), 1) {
            return Err(PipelineError::model_inference(format!(
                "expected a ({}, 1) total prediction, got {:?}",
                table.n_days(),
                outputs.dim(),
            )));
        }
        let series: TotalSeries = outputs.column(0).iter().copied().map(KilowattHours).collect();
        let n_negative = series.0.iter().filter(|total| total.is_negative()).count();
        if n_negative != 0 {
            warn!(n_negative, "the model predicted negative daily totals");
        }
        debug!(annual_total = ?series.sum(), "estimated");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::pipeline::{
        testing::{FnModel, atlas, failing_model, scenario},
        weather::DAYS_PER_YEAR,
    };

    #[test]
    fn test_estimate_ok() -> Result {
        let table = FeatureTable::build(&scenario(), &atlas())?;
        let model = FnModel::new(1, |row| Some(vec![row[0] - 2.0]));
        let series = TotalEstimator::new(&model).estimate(&table)?;
        assert_eq!(series.as_slice().len(), DAYS_PER_YEAR);

        // Friday, then Monday:
        assert_abs_diff_eq!(series.as_slice()[0].0, 2.0);
        assert_abs_diff_eq!(series.as_slice()[3].0, -2.0);
        Ok(())
    }

    #[test]
    fn test_estimate_wrong_width() -> Result {
        let table = FeatureTable::build(&scenario(), &atlas())?;
        let model = FnModel::new(2, |_| Some(vec![1.0, 2.0]));
        assert!(matches!(
            TotalEstimator::new(&model).estimate(&table),
            Err(PipelineError::ModelInference(_))
        ));
        Ok(())
    }

    #[test]
    fn test_estimate_failure() -> Result {
        let table = FeatureTable::build(&scenario(), &atlas())?;
        assert!(matches!(
            TotalEstimator::new(&failing_model()).estimate(&table),
            Err(PipelineError::ModelInference(_))
        ));
        Ok(())
    }
}
