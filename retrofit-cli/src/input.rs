//! Scenario definitions as entered by the user, before label resolution.

use std::{fs, path::Path};

use retrofit_quantities::{area::SquareMetres, resistance::ThermalResistance};
use serde::{Deserialize, Serialize};

use crate::{
    pipeline::{
        PipelineError,
        reference::{Attribute, ReferenceMapping},
        scenario::{
            FOUNDATION_RESISTANCES,
            MAX_HEATED_AREA,
            MAX_SCENARIOS,
            MIN_HEATED_AREA,
            OCCUPANTS,
            Presence,
            ROOF_RESISTANCES,
            Scenario,
            WALL_RESISTANCES,
            WINDOW_GLAZINGS,
        },
        weather::RegionCode,
    },
    prelude::*,
};

#[must_use]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    #[serde(rename = "scenario")]
    pub scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioFile {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let this: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        info!(n_scenarios = this.scenarios.len(), "loaded the scenarios");
        Ok(this)
    }

    /// Resolve every definition, failing on the first invalid one.
    pub fn resolve(&self, mapping: &ReferenceMapping) -> Result<Vec<Scenario>> {
        ensure!(
            (1..=MAX_SCENARIOS).contains(&self.scenarios.len()),
            PipelineError::ScenarioCount { actual: self.scenarios.len(), max: MAX_SCENARIOS },
        );
        self.scenarios
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                definition
                    .resolve(mapping)
                    .with_context(|| format!("invalid scenario #{}", index + 1))
            })
            .collect()
    }
}

/// Single scenario with categorical attributes given as labels.
#[must_use]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDefinition {
    pub region: String,
    pub building_type: String,

    /// Clamped to the supported range.
    pub heated_area: SquareMetres,

    pub occupants: u8,
    pub wall_resistance: ThermalResistance,
    pub roof_resistance: ThermalResistance,
    pub foundation_resistance: ThermalResistance,
    pub average_leakage_area: String,
    pub window_to_wall_ratio: String,
    pub window_glazings: u8,
    pub air_conditioning: String,
    pub heat_pump: String,
    pub auxiliary_heating_type: String,
    pub dhw_energy_source: String,
    pub pool: String,
    pub spa: String,
}

impl ScenarioDefinition {
    pub fn resolve(&self, mapping: &ReferenceMapping) -> Result<Scenario, PipelineError> {
        let resolve = |attribute, label: &str| mapping.resolve_attribute(attribute, label);

        if !OCCUPANTS.contains(&self.occupants) {
            return Err(PipelineError::invalid_scenario(format!(
                "occupant count {} is outside {OCCUPANTS:?}",
                self.occupants,
            )));
        }
        if !WINDOW_GLAZINGS.contains(&self.window_glazings) {
            return Err(PipelineError::invalid_scenario(format!(
                "glazing count {} is outside {WINDOW_GLAZINGS:?}",
                self.window_glazings,
            )));
        }
        if !self.heated_area.is_finite() {
            return Err(PipelineError::invalid_scenario("the heated area must be finite"));
        }
        ensure_one_of("wall", self.wall_resistance, &WALL_RESISTANCES)?;
        ensure_one_of("roof", self.roof_resistance, &ROOF_RESISTANCES)?;
        ensure_one_of("foundation", self.foundation_resistance, &FOUNDATION_RESISTANCES)?;

        let heated_area = self.heated_area.clamp(MIN_HEATED_AREA, MAX_HEATED_AREA);
        if heated_area != self.heated_area {
            warn!(requested = ?self.heated_area, clamped = ?heated_area, "heated area clamped");
        }

        Ok(Scenario::builder()
            .region(RegionCode::try_from(resolve(Attribute::Region, &self.region)?)?)
            .building_type(resolve(Attribute::BuildingType, &self.building_type)?)
            .occupants(self.occupants)
            .heated_area(heated_area)
            .wall_resistance(self.wall_resistance)
            .roof_resistance(self.roof_resistance)
            .foundation_resistance(self.foundation_resistance)
            .average_leakage_area(resolve(
                Attribute::AverageLeakageArea,
                &self.average_leakage_area,
            )?)
            .window_to_wall_ratio(resolve(
                Attribute::WindowToWallRatio,
                &self.window_to_wall_ratio,
            )?)
            .window_glazings(self.window_glazings)
            .air_conditioning(resolve(Attribute::AirConditioning, &self.air_conditioning)?)
            .heat_pump(resolve(Attribute::HeatPump, &self.heat_pump)?)
            .auxiliary_heating_type(resolve(
                Attribute::AuxiliaryHeatingType,
                &self.auxiliary_heating_type,
            )?)
            .dhw_energy_source(resolve(Attribute::DhwEnergySource, &self.dhw_energy_source)?)
            .pool(Presence(resolve(Attribute::Pool, &self.pool)?))
            .spa(Presence(resolve(Attribute::Spa, &self.spa)?))
            .build())
    }
}

fn ensure_one_of(
    surface: &str,
    resistance: ThermalResistance,
    allowed: &[ThermalResistance],
) -> Result<(), PipelineError> {
    if allowed.contains(&resistance) {
        Ok(())
    } else {
        Err(PipelineError::invalid_scenario(format!(
            "{surface} resistance {resistance} is not one of {allowed:?}",
        )))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::pipeline::testing;

    const MAPPING: &str = r#"
        [region]
        "Montréal" = 1
        "Québec" = 2

        [buildingtype]
        "Maison unifamiliale" = 2

        [averageleakagearea]
        "Moyenne" = 2

        [windowtowallratio]
        "Faible" = 1

        [heatpump]
        "Aucune" = 0

        [auxiliaryheatingtype]
        "Électrique" = 1

        [airconditioning]
        "Aucune" = 0

        [DHWenergysource]
        "Électricité" = 1

        [pool]
        "Non" = 1
        "Oui" = 2

        [spa]
        "Non" = 1
        "Oui" = 2
    "#;

    const SCENARIOS: &str = r#"
        [[scenario]]
        region = "Montréal"
        building_type = "Maison unifamiliale"
        heated_area = 150
        occupants = 3
        wall_resistance = 3
        roof_resistance = 5
        foundation_resistance = 2
        average_leakage_area = "Moyenne"
        window_to_wall_ratio = "Faible"
        window_glazings = 2
        air_conditioning = "Aucune"
        heat_pump = "Aucune"
        auxiliary_heating_type = "Électrique"
        dhw_energy_source = "Électricité"
        pool = "Non"
        spa = "Oui"

        [[scenario]]
        region = "Québec"
        building_type = "Maison unifamiliale"
        heated_area = 500.0
        occupants = 5
        wall_resistance = 5.0
        roof_resistance = 8.0
        foundation_resistance = 4.0
        average_leakage_area = "Moyenne"
        window_to_wall_ratio = "Faible"
        window_glazings = 3
        air_conditioning = "Aucune"
        heat_pump = "Aucune"
        auxiliary_heating_type = "Électrique"
        dhw_energy_source = "Électricité"
        pool = "Oui"
        spa = "Non"
    "#;

    fn mapping() -> ReferenceMapping {
        toml::from_str(MAPPING).unwrap()
    }

    fn definition() -> ScenarioDefinition {
        toml::from_str::<ScenarioFile>(SCENARIOS).unwrap().scenarios.remove(0)
    }

    #[test]
    fn test_resolve_file_ok() -> Result {
        let scenarios = toml::from_str::<ScenarioFile>(SCENARIOS)?.resolve(&mapping())?;
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0], testing::scenario());

        assert_eq!(scenarios[1].region, RegionCode(2));
        assert_abs_diff_eq!(scenarios[1].heated_area.0, 280.0);
        assert!(!scenarios[1].pool.is_absent());
        assert!(scenarios[1].spa.is_absent());
        Ok(())
    }

    #[test]
    fn test_heated_area_clamped_from_below() -> Result {
        let mut definition = definition();
        definition.heated_area = SquareMetres(20.0);
        assert_eq!(definition.resolve(&mapping())?.heated_area, MIN_HEATED_AREA);
        Ok(())
    }

    #[test]
    fn test_unknown_label() {
        let mut definition = definition();
        definition.region = "Nonexistent City".to_owned();
        assert!(matches!(
            definition.resolve(&mapping()),
            Err(PipelineError::UnknownLabel { category, .. }) if category == "region"
        ));
    }

    #[test]
    fn test_invalid_resistance() {
        let mut definition = definition();
        definition.wall_resistance = ThermalResistance(4.0);
        assert!(matches!(definition.resolve(&mapping()), Err(PipelineError::InvalidScenario(_))));
    }

    #[test]
    fn test_invalid_counts() {
        let mut definition = definition();
        definition.occupants = 0;
        assert!(matches!(definition.resolve(&mapping()), Err(PipelineError::InvalidScenario(_))));

        let mut definition = self::definition();
        definition.window_glazings = 4;
        assert!(matches!(definition.resolve(&mapping()), Err(PipelineError::InvalidScenario(_))));
    }

    #[test]
    fn test_unknown_key() {
        let toml = SCENARIOS.replacen("spa = \"Oui\"", "spa = \"Oui\"\nsauna = \"Oui\"", 1);
        assert!(toml::from_str::<ScenarioFile>(&toml).is_err());
    }

    #[test]
    fn test_too_many_scenarios() {
        let file = ScenarioFile { scenarios: vec![definition(); MAX_SCENARIOS + 1] };
        assert!(file.resolve(&mapping()).is_err());
    }
}
