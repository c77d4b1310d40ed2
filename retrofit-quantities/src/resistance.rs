quantity!(
    /// Thermal resistance of an envelope component (RSI).
    ThermalResistance, suffix: "m²·K/W", precision: 0
);
