use std::{
    fmt::{Display, Formatter},
    ops::{AddAssign, Index, IndexMut},
};

use comfy_table::Color;
use retrofit_quantities::energy::KilowattHours;

/// Consumption category, in the channel order of the disaggregation model output.
#[derive(Debug, enumset::EnumSetType)]
pub enum EndUse {
    Hvac,
    DomesticHotWater,
    Appliances,
    Lighting,
    Spa,
    Pool,
}

impl EndUse {
    pub const N: usize = 6;

    pub const ALL: [Self; Self::N] = [
        Self::Hvac,
        Self::DomesticHotWater,
        Self::Appliances,
        Self::Lighting,
        Self::Spa,
        Self::Pool,
    ];

    /// Model output channel.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Hvac => "hvac_kwh",
            Self::DomesticHotWater => "dhw_kwh",
            Self::Appliances => "appliances_kwh",
            Self::Lighting => "lighting_kwh",
            Self::Spa => "spa_kwh",
            Self::Pool => "pool_kwh",
        }
    }

    pub const fn color(self) -> Color {
        match self {
            Self::Hvac => Color::Red,
            Self::DomesticHotWater => Color::Blue,
            Self::Appliances => Color::DarkYellow,
            Self::Lighting => Color::Yellow,
            Self::Spa => Color::Cyan,
            Self::Pool => Color::DarkCyan,
        }
    }
}

impl Display for EndUse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hvac => write!(f, "HVAC"),
            Self::DomesticHotWater => write!(f, "DHW"),
            Self::Appliances => write!(f, "Appliances"),
            Self::Lighting => write!(f, "Lighting"),
            Self::Spa => write!(f, "Spa"),
            Self::Pool => write!(f, "Pool"),
        }
    }
}

/// One value per end use.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EndUseMap<T>(pub [T; EndUse::N]);

impl<T> EndUseMap<T> {
    pub fn from_fn(f: impl FnMut(EndUse) -> T) -> Self {
        Self(EndUse::ALL.map(f))
    }
}

impl<T: Copy> EndUseMap<T> {
    pub fn iter(&self) -> impl Iterator<Item = (EndUse, T)> + '_ {
        EndUse::ALL.into_iter().zip(self.0.iter().copied())
    }
}

impl<T> Index<EndUse> for EndUseMap<T> {
    type Output = T;

    fn index(&self, end_use: EndUse) -> &Self::Output {
        &self.0[end_use.index()]
    }
}

impl<T> IndexMut<EndUse> for EndUseMap<T> {
    fn index_mut(&mut self, end_use: EndUse) -> &mut Self::Output {
        &mut self.0[end_use.index()]
    }
}

impl Default for EndUseMap<KilowattHours> {
    fn default() -> Self {
        Self([KilowattHours::ZERO; EndUse::N])
    }
}

impl EndUseMap<KilowattHours> {
    pub fn total(&self) -> KilowattHours {
        self.0.iter().copied().sum()
    }
}

impl AddAssign for EndUseMap<KilowattHours> {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0) {
            *lhs += rhs;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_channel_order() {
        assert_eq!(EndUse::ALL.map(EndUse::index), [0, 1, 2, 3, 4, 5]);
        assert_eq!(EndUse::Spa.index(), 4);
        assert_eq!(EndUse::Pool.index(), 5);
    }

    #[test]
    fn test_total() {
        let mut map = EndUseMap::from_fn(|end_use| KilowattHours(end_use.index() as f64));
        map += EndUseMap::default();
        map[EndUse::Pool] = KilowattHours(0.5);
        assert_abs_diff_eq!(map.total().0, 10.5);
    }
}
