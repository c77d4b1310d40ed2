//! Shared fixtures for the pipeline tests.

use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, aview1};
use retrofit_quantities::{
    area::SquareMetres,
    ratios::Percent,
    resistance::ThermalResistance,
    temperature::Celsius,
};

use crate::pipeline::{
    PipelineError,
    model::Regressor,
    reference::Code,
    scenario::{Presence, Scenario},
    weather::{RegionCode, WeatherAtlas, WeatherSeries},
};

pub fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
}

/// Region 1 at 10 °C and 50 % every day of 2021.
pub fn atlas() -> WeatherAtlas {
    WeatherAtlas::from_iter([(
        RegionCode(1),
        WeatherSeries::constant(start(), Celsius(10.0), Percent(50.0)),
    )])
}

/// Pool absent, spa present.
pub fn scenario() -> Scenario {
    Scenario::builder()
        .region(RegionCode(1))
        .building_type(Code(2.0))
        .occupants(3)
        .heated_area(SquareMetres(150.0))
        .wall_resistance(ThermalResistance(3.0))
        .roof_resistance(ThermalResistance(5.0))
        .foundation_resistance(ThermalResistance(2.0))
        .average_leakage_area(Code(2.0))
        .window_to_wall_ratio(Code(1.0))
        .window_glazings(2)
        .air_conditioning(Code(0.0))
        .heat_pump(Code(0.0))
        .auxiliary_heating_type(Code(1.0))
        .dhw_energy_source(Code(1.0))
        .pool(Presence::ABSENT)
        .spa(Presence(Code(2.0)))
        .build()
}

/// Row-by-row stub model, `None` fails the whole batch.
pub struct FnModel<F> {
    n_outputs: usize,
    f: F,
}

impl<F> FnModel<F> {
    pub fn new(n_outputs: usize, f: F) -> Self
    where
        F: Fn(ArrayView1<'_, f64>) -> Option<Vec<f64>> + Send + Sync,
    {
        Self { n_outputs, f }
    }
}

impl<F> Regressor for FnModel<F>
where
    F: Fn(ArrayView1<'_, f64>) -> Option<Vec<f64>> + Send + Sync,
{
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>, PipelineError> {
        let mut outputs = Array2::zeros((rows.nrows(), self.n_outputs));
        for (row, mut output) in rows.rows().into_iter().zip(outputs.rows_mut()) {
            let values = (self.f)(row).ok_or_else(|| PipelineError::model_inference("injected"))?;
            output.assign(&aview1(&values));
        }
        Ok(outputs)
    }
}

pub fn failing_model() -> impl Regressor {
    FnModel::new(1, |_| None)
}
