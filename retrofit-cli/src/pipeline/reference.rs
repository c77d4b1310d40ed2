//! Reference mapping from human-readable labels to the numeric codes the models were trained on.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fmt::{Display, Formatter},
    fs,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{pipeline::PipelineError, prelude::*};

/// Numeric model code.
#[must_use]
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Into,
)]
#[serde(try_from = "RawCode", into = "f64")]
pub struct Code(pub f64);

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Codes are stored either as numbers or as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Number(f64),
    Text(String),
}

impl TryFrom<RawCode> for Code {
    type Error = String;

    fn try_from(raw: RawCode) -> Result<Self, Self::Error> {
        let value = match raw {
            RawCode::Number(value) => value,
            RawCode::Text(text) => {
                text.trim().parse().map_err(|_| format!("`{text}` is not a numeric code"))?
            }
        };
        if value.is_finite() { Ok(Self(value)) } else { Err(format!("invalid code: {value}")) }
    }
}

/// Scenario attributes that are entered as labels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attribute {
    Region,
    BuildingType,
    AverageLeakageArea,
    WindowToWallRatio,
    HeatPump,
    AuxiliaryHeatingType,
    AirConditioning,
    DhwEnergySource,
    Pool,
    Spa,
}

impl Attribute {
    /// Reference category that holds the attribute's labels.
    pub const fn category(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::BuildingType => "buildingtype",
            Self::AverageLeakageArea => "averageleakagearea",
            Self::WindowToWallRatio => "windowtowallratio",
            Self::HeatPump => "heatpump",
            Self::AuxiliaryHeatingType => "auxiliaryheatingtype",
            Self::AirConditioning => "airconditioning",
            Self::DhwEnergySource => "DHWenergysource",
            Self::Pool => "pool",
            Self::Spa => "spa",
        }
    }
}

/// Labels of a single category.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, Code>);

impl Labels {
    pub fn get(&self, label: &str) -> Option<Code> {
        self.0.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Code)> {
        self.0.iter().map(|(label, code)| (label.as_str(), *code))
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for Labels {
    fn from_iter<T: IntoIterator<Item = (L, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(label, code)| (label.into(), Code(code))).collect())
    }
}

/// Immutable `category → label → code` lookup, loaded once per process.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceMapping(BTreeMap<String, Labels>);

impl ReferenceMapping {
    /// Read either a directory of `<category>.json` files or a single TOML file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let this = if path.is_dir() { Self::from_dir(path)? } else { Self::from_toml_file(path)? };
        info!(n_categories = this.0.len(), "loaded the reference mapping");
        Ok(this)
    }

    pub fn from_dir(path: &Path) -> Result<Self> {
        let mut categories = BTreeMap::new();
        let entries =
            fs::read_dir(path).with_context(|| format!("failed to list `{}`", path.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|extension| extension != "json") {
                continue;
            }
            let category = path
                .file_stem()
                .and_then(OsStr::to_str)
                .with_context(|| format!("invalid file name: `{}`", path.display()))?
                .to_owned();
            let labels: Labels = serde_json::from_slice(&fs::read(&path)?)
                .with_context(|| format!("failed to parse `{}`", path.display()))?;
            debug!(category, n_labels = labels.iter().count(), "loaded");
            categories.insert(category, labels);
        }
        ensure!(!categories.is_empty(), "no reference files found in `{}`", path.display());
        Ok(Self(categories))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
    }

    pub fn labels(&self, category: &str) -> Result<&Labels, PipelineError> {
        self.0.get(category).ok_or_else(|| PipelineError::UnknownCategory(category.to_owned()))
    }

    pub fn resolve(&self, category: &str, label: &str) -> Result<Code, PipelineError> {
        self.labels(category)?.get(label).ok_or_else(|| PipelineError::UnknownLabel {
            category: category.to_owned(),
            label: label.to_owned(),
        })
    }

    pub fn resolve_attribute(
        &self,
        attribute: Attribute,
        label: &str,
    ) -> Result<Code, PipelineError> {
        self.resolve(attribute.category(), label)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &Labels)> {
        self.0.iter().map(|(category, labels)| (category.as_str(), labels))
    }
}

impl<C: Into<String>> FromIterator<(C, Labels)> for ReferenceMapping {
    fn from_iter<T: IntoIterator<Item = (C, Labels)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(category, labels)| (category.into(), labels)).collect())
    }
}
