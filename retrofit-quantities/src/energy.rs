quantity!(
    /// Electrical energy, usually per simulated day.
    KilowattHours, suffix: "kWh", precision: 1
);

impl KilowattHours {
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0.0
    }
}
