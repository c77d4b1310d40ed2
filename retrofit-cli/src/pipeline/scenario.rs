use std::ops::RangeInclusive;

use bon::Builder;
use enumset::EnumSet;
use retrofit_quantities::{area::SquareMetres, resistance::ThermalResistance};

use crate::pipeline::{end_use::EndUse, reference::Code, weather::RegionCode};

/// Maximum number of scenarios compared in a single run.
pub const MAX_SCENARIOS: usize = 5;

pub const MIN_HEATED_AREA: SquareMetres = SquareMetres(50.0);
pub const MAX_HEATED_AREA: SquareMetres = SquareMetres(280.0);

pub const OCCUPANTS: RangeInclusive<u8> = 1..=5;
pub const WINDOW_GLAZINGS: RangeInclusive<u8> = 1..=3;

pub const WALL_RESISTANCES: [ThermalResistance; 4] = [
    ThermalResistance(1.0),
    ThermalResistance(2.0),
    ThermalResistance(3.0),
    ThermalResistance(5.0),
];

pub const ROOF_RESISTANCES: [ThermalResistance; 6] = [
    ThermalResistance(1.0),
    ThermalResistance(2.0),
    ThermalResistance(3.0),
    ThermalResistance(4.0),
    ThermalResistance(5.0),
    ThermalResistance(8.0),
];

pub const FOUNDATION_RESISTANCES: [ThermalResistance; 4] = [
    ThermalResistance(1.0),
    ThermalResistance(2.0),
    ThermalResistance(3.0),
    ThermalResistance(4.0),
];

/// One-based position of a scenario within the current run.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
pub struct ScenarioIndex(pub usize);

impl ScenarioIndex {
    pub fn enumerate<T>(items: &[T]) -> impl Iterator<Item = (Self, &T)> {
        items.iter().enumerate().map(|(index, item)| (Self(index + 1), item))
    }
}

/// Presence flag code: `1` stands for absent, `2` for present.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, derive_more::From, derive_more::Into)]
pub struct Presence(pub Code);

impl Presence {
    pub const ABSENT: Self = Self(Code(1.0));

    #[must_use]
    pub fn is_absent(self) -> bool {
        self.0.0 <= Self::ABSENT.0.0
    }
}

/// Fully resolved building, occupant, and equipment configuration.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Builder)]
pub struct Scenario {
    pub region: RegionCode,
    pub building_type: Code,
    pub occupants: u8,
    pub heated_area: SquareMetres,
    pub wall_resistance: ThermalResistance,
    pub roof_resistance: ThermalResistance,
    pub foundation_resistance: ThermalResistance,
    pub average_leakage_area: Code,
    pub window_to_wall_ratio: Code,
    pub window_glazings: u8,
    pub air_conditioning: Code,
    pub heat_pump: Code,
    pub auxiliary_heating_type: Code,
    pub dhw_energy_source: Code,
    pub pool: Presence,
    pub spa: Presence,
}

impl Scenario {
    /// End uses that may receive a share of the total.
    pub fn permitted_end_uses(&self) -> EnumSet<EndUse> {
        let mut end_uses = EnumSet::all();
        if self.pool.is_absent() {
            end_uses.remove(EndUse::Pool);
        }
        if self.spa.is_absent() {
            end_uses.remove(EndUse::Spa);
        }
        end_uses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::scenario;

    #[test]
    fn test_presence() {
        assert!(Presence::ABSENT.is_absent());
        assert!(!Presence(Code(2.0)).is_absent());
        assert!(Presence(Code(0.0)).is_absent());
    }

    #[test]
    fn test_permitted_end_uses() {
        let mut scenario = scenario();
        assert_eq!(scenario.permitted_end_uses().len(), 5);
        assert!(!scenario.permitted_end_uses().contains(EndUse::Pool));
        assert!(scenario.permitted_end_uses().contains(EndUse::Spa));

        scenario.spa = Presence::ABSENT;
        assert_eq!(
            scenario.permitted_end_uses(),
            EndUse::Hvac | EndUse::DomesticHotWater | EndUse::Appliances | EndUse::Lighting,
        );
    }

    #[test]
    fn test_enumerate() {
        let indices: Vec<_> = ScenarioIndex::enumerate(&['a', 'b']).collect();
        assert_eq!(indices, [(ScenarioIndex(1), &'a'), (ScenarioIndex(2), &'b')]);
    }
}
