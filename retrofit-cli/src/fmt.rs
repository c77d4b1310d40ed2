use std::fmt::{Debug, Display, Formatter};

use retrofit_quantities::energy::KilowattHours;

/// Fraction of a whole, displayed as a percentage.
pub struct FormattedShare(pub f64);

impl FormattedShare {
    pub fn of(part: KilowattHours, whole: KilowattHours) -> Self {
        Self(part / whole)
    }
}

impl Debug for FormattedShare {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for FormattedShare {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_finite() { write!(f, "{:.1}%", self.0 * 100.0) } else { write!(f, "n/a") }
    }
}
