//! Pre-trained regression models behind a single prediction capability.

use std::{fs::File, io::BufReader, path::Path};

use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView2};
use serde::Deserialize;

use crate::{pipeline::PipelineError, prelude::*};

/// Batch regression over feature rows.
pub trait Regressor: Send + Sync {
    /// Predict one output row per input row.
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>, PipelineError>;

    /// Feature names the model was trained with, when the artifact declares them.
    fn features(&self) -> Option<&[String]> {
        None
    }
}

/// Check the table header against the model's declared features, order included.
pub fn ensure_features(model: &dyn Regressor, header: &[&str]) -> Result<(), PipelineError> {
    let Some(features) = model.features() else {
        return Ok(());
    };
    if features.iter().map(String::as_str).eq(header.iter().copied()) {
        Ok(())
    } else {
        Err(PipelineError::model_inference(format!(
            "the model expects features [{}], the table provides [{}]",
            features.iter().join(", "),
            header.iter().join(", "),
        )))
    }
}

/// Multi-output linear model: `outputs = rows · coefficientsᵀ + intercepts`.
#[must_use]
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "RawLinearModel")]
pub struct LinearModel {
    features: Vec<String>,

    /// `(n_outputs,)`.
    intercepts: Array1<f64>,

    /// `(n_outputs, n_features)`.
    coefficients: Array2<f64>,
}

impl LinearModel {
    pub fn new(
        features: Vec<String>,
        intercepts: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    ) -> Result<Self> {
        ensure!(!features.is_empty(), "the model declares no features");
        ensure!(!intercepts.is_empty(), "the model declares no outputs");
        ensure!(
            coefficients.len() == intercepts.len(),
            "{} coefficient rows for {} intercepts",
            coefficients.len(),
            intercepts.len(),
        );
        for (index, row) in coefficients.iter().enumerate() {
            ensure!(
                row.len() == features.len(),
                "coefficient row #{index} has {} values for {} features",
                row.len(),
                features.len(),
            );
        }
        ensure!(
            intercepts.iter().chain(coefficients.iter().flatten()).all(|value| value.is_finite()),
            "the model contains non-finite parameters",
        );

        let shape = (coefficients.len(), features.len());
        let coefficients =
            Array2::from_shape_vec(shape, coefficients.into_iter().flatten().collect())?;
        Ok(Self { features, intercepts: Array1::from(intercepts), coefficients })
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
        let this: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        info!(n_features = this.features.len(), n_outputs = this.n_outputs(), "loaded the model");
        Ok(this)
    }

    #[must_use]
    pub fn n_outputs(&self) -> usize {
        self.intercepts.len()
    }
}

impl Regressor for LinearModel {
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>, PipelineError> {
        if rows.ncols() != self.features.len() {
            return Err(PipelineError::model_inference(format!(
                "expected {} feature columns, got {}",
                self.features.len(),
                rows.ncols(),
            )));
        }
        let outputs = rows.dot(&self.coefficients.t()) + &self.intercepts;
        if outputs.iter().all(|value| value.is_finite()) {
            Ok(outputs)
        } else {
            Err(PipelineError::model_inference("the model produced non-finite outputs"))
        }
    }

    fn features(&self) -> Option<&[String]> {
        Some(&self.features)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLinearModel {
    features: Vec<String>,
    intercepts: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
}

impl TryFrom<RawLinearModel> for LinearModel {
    type Error = Error;

    fn try_from(raw: RawLinearModel) -> Result<Self> {
        Self::new(raw.features, raw.intercepts, raw.coefficients)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use tempfile::tempdir;

    use super::*;

    fn model() -> Result<LinearModel> {
        LinearModel::new(
            vec!["a".to_owned(), "b".to_owned()],
            vec![1.0, -1.0],
            vec![vec![2.0, 0.0], vec![0.5, 0.5]],
        )
    }

    #[test]
    fn test_predict_ok() -> Result {
        let outputs = model()?.predict(array![[1.0, 2.0], [3.0, 4.0]].view())?;
        assert_eq!(outputs.dim(), (2, 2));
        assert_abs_diff_eq!(outputs[[0, 0]], 3.0);
        assert_abs_diff_eq!(outputs[[0, 1]], 0.5);
        assert_abs_diff_eq!(outputs[[1, 0]], 7.0);
        assert_abs_diff_eq!(outputs[[1, 1]], 2.5);
        Ok(())
    }

    #[test]
    fn test_predict_wrong_width() -> Result {
        let result = model()?.predict(array![[1.0, 2.0, 3.0]].view());
        assert!(matches!(result, Err(PipelineError::ModelInference(_))));
        Ok(())
    }

    #[test]
    fn test_new_inconsistent() {
        assert!(LinearModel::new(vec!["a".to_owned()], vec![0.0], vec![vec![1.0, 2.0]]).is_err());
        assert!(LinearModel::new(vec!["a".to_owned()], vec![0.0, 1.0], vec![vec![1.0]]).is_err());
        assert!(LinearModel::new(vec!["a".to_owned()], vec![f64::NAN], vec![vec![1.0]]).is_err());
    }

    #[test]
    fn test_ensure_features() -> Result {
        let model = model()?;
        ensure_features(&model, &["a", "b"])?;
        assert!(ensure_features(&model, &["b", "a"]).is_err());
        assert!(ensure_features(&model, &["a"]).is_err());
        Ok(())
    }

    #[test]
    fn test_read_from() -> Result {
        let dir = tempdir()?;
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"features": ["a", "b"], "intercepts": [0.5], "coefficients": [[1.0, 1.0]]}"#,
        )?;
        let model = LinearModel::read_from(&path)?;
        assert_eq!(model.n_outputs(), 1);
        assert_abs_diff_eq!(model.predict(array![[1.0, 2.0]].view())?[[0, 0]], 3.5);
        Ok(())
    }

    #[test]
    fn test_read_from_invalid() -> Result {
        let dir = tempdir()?;
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"features": ["a"], "intercepts": [0.5], "coefficients": [[1.0, 1.0]]}"#,
        )?;
        assert!(LinearModel::read_from(&path).is_err());
        Ok(())
    }
}
