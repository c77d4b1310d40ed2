#[macro_use]
mod macros;

pub mod area;
pub mod energy;
pub mod ratios;
pub mod resistance;
pub mod temperature;
