#![deny(warnings)]

//! Core domain models and invariants for the farm simulator.
//!
//! This crate defines the serializable monthly tables shared by the
//! generator, the derivation engine and the dashboards, together with
//! validation helpers that guarantee the twelve-month shape.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of rows in every monthly table.
pub const MONTHS: usize = 12;

/// Irrigation applied to every month before any slider moves (l/ha).
pub const BASE_IRRIGATION: f64 = 1000.0;

/// Calendar month, 1 = January.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    /// Build a month from its 1-based index.
    pub fn new(index: u8) -> Result<Self, ValidationError> {
        if (1..=MONTHS as u8).contains(&index) {
            Ok(Self(index))
        } else {
            Err(ValidationError::InvalidMonth(index))
        }
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = Month> {
        (1..=MONTHS as u8).map(Month)
    }

    /// 1-based index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// 0-based position inside a table.
    pub fn position(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn short_name(self) -> &'static str {
        const NAMES: [&str; MONTHS] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        NAMES[self.position()]
    }

    /// Last calendar day of this month in `year`.
    pub fn month_end(self, year: i32) -> Option<NaiveDate> {
        let (y, m) = if self.0 == 12 {
            (year + 1, 1)
        } else {
            (year, u32::from(self.0) + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.pred_opt())
    }

    /// Number of days in this month of `year`.
    pub fn days_in(self, year: i32) -> u32 {
        self.month_end(year).map(|d| d.day()).unwrap_or(30)
    }

    /// Chart label: the month-end date, or the short name if the year is out of range.
    pub fn label(self, year: i32) -> String {
        match self.month_end(year) {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => self.short_name().to_string(),
        }
    }
}

impl TryFrom<u8> for Month {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Month::new(value)
    }
}

impl From<Month> for u8 {
    fn from(m: Month) -> u8 {
        m.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Sampled or fetched inputs for a single month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseRecord {
    /// Calendar month of this row.
    pub month: Month,
    /// Mean air temperature in °C.
    pub temperature_c: f64,
    /// Mean relative humidity in %.
    pub humidity_pct: f64,
    /// Precipitation in mm.
    pub precipitation_mm: f64,
    /// Irrigation in l/ha.
    pub irrigation_l_ha: f64,
    /// Fertilizer in kg/ha.
    pub fertilizer_kg_ha: f64,
    /// Labor cost in EUR.
    pub labor_cost: f64,
    /// Selling price in EUR per tonne.
    pub selling_price: f64,
    /// Crop growth factor, dimensionless around 1.0.
    pub growth_rate: f64,
}

impl BaseRecord {
    /// Named numeric fields, used for finiteness checks and tabular output.
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("temperature", self.temperature_c),
            ("humidity", self.humidity_pct),
            ("precipitation", self.precipitation_mm),
            ("irrigation", self.irrigation_l_ha),
            ("fertilizer", self.fertilizer_kg_ha),
            ("labor_cost", self.labor_cost),
            ("selling_price", self.selling_price),
            ("growth_rate", self.growth_rate),
        ]
    }
}

/// A fully recomputed month: adjusted inputs plus derived outputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub month: Month,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub precipitation_mm: f64,
    pub irrigation_l_ha: f64,
    pub fertilizer_kg_ha: f64,
    pub labor_cost: f64,
    pub selling_price: f64,
    pub growth_rate: f64,
    /// Production in tonnes.
    pub production_t: f64,
    /// Potential production per unit of water and fertilizer input.
    pub yield_efficiency: f64,
    pub water_usage: f64,
    pub energy_cost: f64,
    pub revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
    /// Soil quality index, 100 = neutral.
    pub soil_quality: f64,
}

/// Validation errors for table invariants and control names.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Month index outside [1, 12].
    #[error("month index {0} is out of range [1, 12]")]
    InvalidMonth(u8),
    /// Tables always hold one row per month.
    #[error("expected {expected} monthly rows, found {found}")]
    WrongLength { expected: usize, found: usize },
    /// Rows must be ordered January to December.
    #[error("row {position} holds month {month}, rows must be ordered by month")]
    OutOfOrder { position: usize, month: u8 },
    /// Numeric field must be finite.
    #[error("non-finite {field} in month {month}")]
    NonFinite { field: &'static str, month: u8 },
    /// Unrecognised slider name.
    #[error("unknown control: {0}")]
    UnknownControl(String),
}

fn check_months<T>(rows: &[T], month_of: impl Fn(&T) -> Month) -> Result<(), ValidationError> {
    if rows.len() != MONTHS {
        return Err(ValidationError::WrongLength {
            expected: MONTHS,
            found: rows.len(),
        });
    }
    for (position, row) in rows.iter().enumerate() {
        let month = month_of(row);
        if month.position() != position {
            return Err(ValidationError::OutOfOrder {
                position,
                month: month.index(),
            });
        }
    }
    Ok(())
}

/// Twelve base rows for one simulated year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BaseTable {
    year: i32,
    rows: Vec<BaseRecord>,
}

impl BaseTable {
    /// Validate and wrap twelve ordered, finite rows.
    pub fn new(year: i32, rows: Vec<BaseRecord>) -> Result<Self, ValidationError> {
        check_months(&rows, |r| r.month)?;
        for r in &rows {
            for (field, value) in r.fields() {
                if !value.is_finite() {
                    return Err(ValidationError::NonFinite {
                        field,
                        month: r.month.index(),
                    });
                }
            }
        }
        Ok(Self { year, rows })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn rows(&self) -> &[BaseRecord] {
        &self.rows
    }

    /// Growth factors in month order.
    pub fn growth_rates(&self) -> [f64; MONTHS] {
        let mut out = [0.0; MONTHS];
        for (slot, r) in out.iter_mut().zip(&self.rows) {
            *slot = r.growth_rate;
        }
        out
    }

    /// Map every row into a derived row. The month of each output row is
    /// forced to the input month, so the result keeps the table invariants.
    pub fn derive_with(&self, mut f: impl FnMut(&BaseRecord) -> MonthlyRecord) -> DerivedTable {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut out = f(r);
                out.month = r.month;
                out
            })
            .collect();
        DerivedTable {
            year: self.year,
            rows,
        }
    }

    /// Replace every month's growth factor, keeping the other inputs.
    pub fn with_growth_rates(mut self, rates: &[f64; MONTHS]) -> Self {
        for (r, &g) in self.rows.iter_mut().zip(rates) {
            r.growth_rate = g;
        }
        self
    }
}

/// Twelve recomputed rows for one simulated year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DerivedTable {
    year: i32,
    rows: Vec<MonthlyRecord>,
}

impl DerivedTable {
    pub fn new(year: i32, rows: Vec<MonthlyRecord>) -> Result<Self, ValidationError> {
        check_months(&rows, |r| r.month)?;
        Ok(Self { year, rows })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn rows(&self) -> &[MonthlyRecord] {
        &self.rows
    }

    /// Month-end labels for chart x axes.
    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.month.label(self.year)).collect()
    }

    /// Project one column in month order.
    pub fn column(&self, f: impl Fn(&MonthlyRecord) -> f64) -> Vec<f64> {
        self.rows.iter().map(f).collect()
    }
}

/// User-adjustable dashboard controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Temperature,
    Humidity,
    Precipitation,
    Irrigation,
    Fertilizer,
}

/// UI-level range of a slider and its neutral position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Position at which the slider applies no delta.
    pub default: f64,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Temperature,
        Control::Humidity,
        Control::Precipitation,
        Control::Irrigation,
        Control::Fertilizer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Control::Temperature => "temperature",
            Control::Humidity => "humidity",
            Control::Precipitation => "precipitation",
            Control::Irrigation => "irrigation",
            Control::Fertilizer => "fertilizer",
        }
    }

    pub fn bounds(self) -> SliderBounds {
        match self {
            Control::Temperature => SliderBounds {
                min: 10.0,
                max: 40.0,
                step: 0.5,
                default: 25.0,
            },
            Control::Humidity => SliderBounds {
                min: 40.0,
                max: 90.0,
                step: 1.0,
                default: 60.0,
            },
            Control::Precipitation => SliderBounds {
                min: 10.0,
                max: 200.0,
                step: 1.0,
                default: 100.0,
            },
            Control::Irrigation => SliderBounds {
                min: 100.0,
                max: 5000.0,
                step: 50.0,
                default: BASE_IRRIGATION,
            },
            Control::Fertilizer => SliderBounds {
                min: -20.0,
                max: 40.0,
                step: 1.0,
                default: 0.0,
            },
        }
    }
}

impl FromStr for Control {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Control::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownControl(s.to_string()))
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current slider positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sliders {
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub irrigation: f64,
    pub fertilizer: f64,
}

impl Default for Sliders {
    fn default() -> Self {
        Self {
            temperature: Control::Temperature.bounds().default,
            humidity: Control::Humidity.bounds().default,
            precipitation: Control::Precipitation.bounds().default,
            irrigation: Control::Irrigation.bounds().default,
            fertilizer: Control::Fertilizer.bounds().default,
        }
    }
}

impl Sliders {
    pub fn get(&self, control: Control) -> f64 {
        match control {
            Control::Temperature => self.temperature,
            Control::Humidity => self.humidity,
            Control::Precipitation => self.precipitation,
            Control::Irrigation => self.irrigation,
            Control::Fertilizer => self.fertilizer,
        }
    }

    pub fn set(&mut self, control: Control, value: f64) {
        let slot = match control {
            Control::Temperature => &mut self.temperature,
            Control::Humidity => &mut self.humidity,
            Control::Precipitation => &mut self.precipitation,
            Control::Irrigation => &mut self.irrigation,
            Control::Fertilizer => &mut self.fertilizer,
        };
        *slot = value;
    }

    /// Builder-style variant of [`Sliders::set`].
    pub fn with(mut self, control: Control, value: f64) -> Self {
        self.set(control, value);
        self
    }

    /// Offsets from each slider's neutral position.
    pub fn deltas(&self) -> SliderDeltas {
        let d = |c: Control| self.get(c) - c.bounds().default;
        SliderDeltas {
            temperature: d(Control::Temperature),
            humidity: d(Control::Humidity),
            precipitation: d(Control::Precipitation),
            irrigation: d(Control::Irrigation),
            fertilizer: d(Control::Fertilizer),
        }
    }

    /// Snap every slider into its UI range. The engine itself never clamps.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for c in Control::ALL {
            let b = c.bounds();
            let v = self.get(c);
            let v = if v.is_finite() { v } else { b.default };
            out.set(c, v.clamp(b.min, b.max));
        }
        out
    }
}

/// Additive offsets applied to base fields before recomputation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SliderDeltas {
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub irrigation: f64,
    pub fertilizer: f64,
}
