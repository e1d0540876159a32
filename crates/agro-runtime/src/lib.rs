#![deny(warnings)]

//! Simulation runtime: base table generation, chart series and the two
//! headless dashboard sessions built on the derivation engine.

pub mod charts;
pub mod dashboard;
pub mod generator;

pub use charts::{Chart, ChartKind};
pub use dashboard::{
    DashboardView, SimulatorDashboard, WeatherDashboard, GENERATION_FAILED_MESSAGE,
    NOT_FOUND_MESSAGE,
};
pub use generator::{random_table, table_from_series, GenerationError};

use agro_econ::Coefficients;
use serde::{Deserialize, Serialize};

/// Year whose month-end dates label the simulator's charts.
pub const DEFAULT_YEAR: i32 = 2024;

/// Per-session settings shared by both dashboards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seed for deterministic RNG; entropy when absent.
    pub seed: Option<u64>,
    pub year: i32,
    /// Draw a fresh environment on every slider change.
    pub regenerate_on_apply: bool,
    pub coefficients: Coefficients,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seed: None,
            year: DEFAULT_YEAR,
            regenerate_on_apply: false,
            coefficients: Coefficients::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_is_unseeded_2024() {
        let s = SessionSettings::default();
        assert_eq!(s.seed, None);
        assert_eq!(s.year, DEFAULT_YEAR);
        assert!(!s.regenerate_on_apply);
    }
}
