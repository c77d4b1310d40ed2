//! Per-day model input table built from a scenario and its region's weather.

use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis, aview1};

use crate::{
    pipeline::{
        PipelineError,
        estimator::TotalSeries,
        scenario::Scenario,
        weather::{WeatherAtlas, WeatherRecord},
    },
    prelude::*,
};

/// Name of the column appended for the disaggregation model.
pub const TOTAL_CONSUMPTION: &str = "total_consumption";

/// Feature table column, in the order the models were trained with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Feature {
    DayOfWeek,
    Temperature,
    RelativeHumidity,
    BuildingType,
    WindowToWallRatio,
    Occupants,
    WallResistance,
    RoofResistance,
    FoundationResistance,
    AverageLeakageArea,
    AirConditioning,
    HeatPump,
    AuxiliaryHeatingType,
    DhwEnergySource,
    Pool,
    Spa,
    HeatedArea,
    WindowGlazings,
}

impl Feature {
    pub const N: usize = 18;

    pub const ALL: [Self; Self::N] = [
        Self::DayOfWeek,
        Self::Temperature,
        Self::RelativeHumidity,
        Self::BuildingType,
        Self::WindowToWallRatio,
        Self::Occupants,
        Self::WallResistance,
        Self::RoofResistance,
        Self::FoundationResistance,
        Self::AverageLeakageArea,
        Self::AirConditioning,
        Self::HeatPump,
        Self::AuxiliaryHeatingType,
        Self::DhwEnergySource,
        Self::Pool,
        Self::Spa,
        Self::HeatedArea,
        Self::WindowGlazings,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DayOfWeek => "day_of_week",
            Self::Temperature => "temperature",
            Self::RelativeHumidity => "relative_humidity",
            Self::BuildingType => "building_type",
            Self::WindowToWallRatio => "window_to_wall_ratio",
            Self::Occupants => "occupants",
            Self::WallResistance => "wall_resistance",
            Self::RoofResistance => "roof_resistance",
            Self::FoundationResistance => "foundation_resistance",
            Self::AverageLeakageArea => "average_leakage_area",
            Self::AirConditioning => "air_conditioning",
            Self::HeatPump => "heat_pump",
            Self::AuxiliaryHeatingType => "auxiliary_heating_type",
            Self::DhwEnergySource => "dhw_energy_source",
            Self::Pool => "pool",
            Self::Spa => "spa",
            Self::HeatedArea => "heated_area",
            Self::WindowGlazings => "window_glazings",
        }
    }

    fn value(self, scenario: &Scenario, record: &WeatherRecord) -> f64 {
        match self {
            Self::DayOfWeek => f64::from(record.day_of_week),
            Self::Temperature => record.temperature.0,
            Self::RelativeHumidity => record.relative_humidity.0,
            Self::BuildingType => scenario.building_type.0,
            Self::WindowToWallRatio => scenario.window_to_wall_ratio.0,
            Self::Occupants => f64::from(scenario.occupants),
            Self::WallResistance => scenario.wall_resistance.0,
            Self::RoofResistance => scenario.roof_resistance.0,
            Self::FoundationResistance => scenario.foundation_resistance.0,
            Self::AverageLeakageArea => scenario.average_leakage_area.0,
            Self::AirConditioning => scenario.air_conditioning.0,
            Self::HeatPump => scenario.heat_pump.0,
            Self::AuxiliaryHeatingType => scenario.auxiliary_heating_type.0,
            Self::DhwEnergySource => scenario.dhw_energy_source.0,
            Self::Pool => scenario.pool.0.0,
            Self::Spa => scenario.spa.0.0,
            Self::HeatedArea => scenario.heated_area.0,
            Self::WindowGlazings => f64::from(scenario.window_glazings),
        }
    }
}

#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,

    /// `(n_days, Feature::N)`.
    values: Array2<f64>,
}

impl FeatureTable {
    /// Broadcast the scenario over its region's weather series, one row per day.
    #[instrument(skip_all, fields(region = %scenario.region))]
    pub fn build(scenario: &Scenario, atlas: &WeatherAtlas) -> Result<Self, PipelineError> {
        let series = atlas.get(scenario.region)?;
        let dates = series.iter().map(|record| record.date).collect();
        let values = Array2::from_shape_fn((series.len(), Feature::N), |(row, column)| {
            Feature::ALL[column].value(scenario, &series[row])
        });
        debug!(n_days = series.len(), "built the feature table");
        Ok(Self { dates, values })
    }

    #[must_use]
    pub fn header() -> Vec<&'static str> {
        Feature::ALL.map(Feature::name).to_vec()
    }

    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[must_use]
    pub fn n_days(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    #[cfg(test)]
    pub fn column(&self, feature: Feature) -> ArrayView1<'_, f64> {
        self.values.column(feature as usize)
    }

    /// Append the total consumption as the trailing column.
    pub fn with_total(self, totals: &TotalSeries) -> Result<AugmentedFeatureTable, PipelineError> {
        let totals = totals.to_vec_f64();
        if totals.len() != self.n_days() {
            return Err(PipelineError::model_inference(format!(
                "{} total values for {} days",
                totals.len(),
                self.n_days(),
            )));
        }
        let mut values = self.values;
        values
            .push_column(aview1(&totals))
            .map_err(|error| PipelineError::model_inference(error.to_string()))?;
        Ok(AugmentedFeatureTable { dates: self.dates, values })
    }
}

/// Feature table with the trailing total consumption column.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct AugmentedFeatureTable {
    dates: Vec<NaiveDate>,

    /// `(n_days, Feature::N + 1)`.
    values: Array2<f64>,
}

impl AugmentedFeatureTable {
    #[must_use]
    pub fn header() -> Vec<&'static str> {
        let mut header = FeatureTable::header();
        header.push(TOTAL_CONSUMPTION);
        header
    }

    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[must_use]
    pub fn n_days(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    #[must_use]
    pub fn totals(&self) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(1), Feature::N)
    }
}
