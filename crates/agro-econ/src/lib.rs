#![deny(warnings)]

//! Derivation engine: production, cost and soil formulas for the farm simulator.
//!
//! This module provides:
//! - Recomputation of every dependent column from base inputs plus slider deltas
//! - Annual KPI summaries with money totals rounded to cents
//! - A one-control sensitivity sweep across its slider range

use agro_core::{
    BaseRecord, BaseTable, Control, DerivedTable, Month, MonthlyRecord, SliderDeltas, Sliders,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced by summaries and sweeps.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// A money total could not be represented as a decimal.
    #[error("non-finite {0} total")]
    NonFinite(&'static str),
    /// A sweep needs at least both end points.
    #[error("sweep needs at least 2 steps, got {0}")]
    TooFewSteps(usize),
}

/// Constants of the closed-form model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coefficients {
    /// Production in tonnes at growth factor 1.0.
    pub base_yield: f64,
    /// Share of fertilizer counted as water usage.
    pub water_fertilizer_weight: f64,
    /// Fixed energy cost per month.
    pub energy_base: f64,
    /// Energy cost per l/ha of irrigation.
    pub energy_per_irrigation: f64,
    /// Energy cost per °C above the reference temperature.
    pub energy_per_degree: f64,
    pub reference_temperature: f64,
    /// Cost per kg/ha of fertilizer.
    pub fertilizer_unit_cost: f64,
    pub soil_fertilizer_penalty: f64,
    pub soil_precipitation_bonus: f64,
    /// Relative production change per °C of temperature slider delta.
    pub temp_response: f64,
    /// Relative production change per % of humidity slider delta.
    pub humidity_response: f64,
    /// Relative production change per mm of precipitation slider delta.
    pub precipitation_response: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            base_yield: 100.0,
            water_fertilizer_weight: 0.5,
            energy_base: 200.0,
            energy_per_irrigation: 2.0,
            energy_per_degree: 5.0,
            reference_temperature: 25.0,
            fertilizer_unit_cost: 10.0,
            soil_fertilizer_penalty: 0.2,
            soil_precipitation_bonus: 0.1,
            temp_response: 0.01,
            humidity_response: 0.005,
            precipitation_response: 0.002,
        }
    }
}

/// Multiplicative production response to the weather sliders.
///
/// Example:
/// let c = Coefficients::default();
/// assert_eq!(climate_factor(&SliderDeltas::default(), &c), 1.0);
pub fn climate_factor(d: &SliderDeltas, c: &Coefficients) -> f64 {
    (1.0 + d.temperature * c.temp_response)
        * (1.0 + d.humidity * c.humidity_response)
        * (1.0 + d.precipitation * c.precipitation_response)
}

/// Recompute one month. Deltas are added to the base fields first; every
/// derived field then depends only on this row.
pub fn derive_record(base: &BaseRecord, d: &SliderDeltas, c: &Coefficients) -> MonthlyRecord {
    let temperature_c = base.temperature_c + d.temperature;
    let humidity_pct = base.humidity_pct + d.humidity;
    let precipitation_mm = base.precipitation_mm + d.precipitation;
    let irrigation_l_ha = base.irrigation_l_ha + d.irrigation;
    let fertilizer_kg_ha = base.fertilizer_kg_ha + d.fertilizer;

    // Efficiency is measured on potential production, before the climate response.
    let potential = c.base_yield * base.growth_rate;
    let yield_efficiency = potential / (precipitation_mm + fertilizer_kg_ha + irrigation_l_ha);
    let production_t = potential * climate_factor(d, c);

    let water_usage = precipitation_mm + c.water_fertilizer_weight * fertilizer_kg_ha;
    let energy_cost = c.energy_base
        + c.energy_per_irrigation * irrigation_l_ha
        + c.energy_per_degree * (temperature_c - c.reference_temperature);
    let revenue = production_t * base.selling_price;
    let total_cost = base.labor_cost + energy_cost + c.fertilizer_unit_cost * fertilizer_kg_ha;
    let profit = revenue - total_cost;
    let soil_quality = 100.0 - c.soil_fertilizer_penalty * fertilizer_kg_ha
        + c.soil_precipitation_bonus * precipitation_mm;

    MonthlyRecord {
        month: base.month,
        temperature_c,
        humidity_pct,
        precipitation_mm,
        irrigation_l_ha,
        fertilizer_kg_ha,
        labor_cost: base.labor_cost,
        selling_price: base.selling_price,
        growth_rate: base.growth_rate,
        production_t,
        yield_efficiency,
        water_usage,
        energy_cost,
        revenue,
        total_cost,
        profit,
        soil_quality,
    }
}

/// Recompute all twelve months.
pub fn derive_table(base: &BaseTable, d: &SliderDeltas, c: &Coefficients) -> DerivedTable {
    let table = base.derive_with(|r| derive_record(r, d, c));
    debug!(
        year = table.year(),
        temperature = d.temperature,
        humidity = d.humidity,
        precipitation = d.precipitation,
        irrigation = d.irrigation,
        fertilizer = d.fertilizer,
        "recomputed derived table"
    );
    table
}

/// Annual KPIs of a derived table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub total_production_t: f64,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub mean_yield_efficiency: f64,
    pub mean_soil_quality: f64,
    pub best_month: Month,
    pub worst_month: Month,
}

fn money(value: f64, what: &'static str) -> Result<Decimal, EconError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or(EconError::NonFinite(what))
}

fn total(rows: &[MonthlyRecord], f: impl Fn(&MonthlyRecord) -> f64) -> f64 {
    rows.iter().map(f).sum()
}

/// Summarize a derived table. Fails only when a total is not finite.
pub fn summarize(table: &DerivedTable) -> Result<Summary, EconError> {
    let rows = table.rows();
    let n = rows.len() as f64;

    let mut best = &rows[0];
    let mut worst = &rows[0];
    for r in rows {
        if r.profit > best.profit {
            best = r;
        }
        if r.profit < worst.profit {
            worst = r;
        }
    }

    Ok(Summary {
        total_production_t: total(rows, |r| r.production_t),
        total_revenue: money(total(rows, |r| r.revenue), "revenue")?,
        total_cost: money(total(rows, |r| r.total_cost), "cost")?,
        total_profit: money(total(rows, |r| r.profit), "profit")?,
        mean_yield_efficiency: total(rows, |r| r.yield_efficiency) / n,
        mean_soil_quality: total(rows, |r| r.soil_quality) / n,
        best_month: best.month,
        worst_month: worst.month,
    })
}

/// One point of a sensitivity sweep.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Slider position.
    pub value: f64,
    /// Annual profit at this position.
    pub profit: f64,
    pub mean_soil_quality: f64,
    pub mean_yield_efficiency: f64,
}

/// Vary `control` linearly across its slider range, holding the other
/// sliders at their current positions.
pub fn sweep(
    base: &BaseTable,
    sliders: &Sliders,
    control: Control,
    steps: usize,
    c: &Coefficients,
) -> Result<Vec<SweepPoint>, EconError> {
    if steps < 2 {
        return Err(EconError::TooFewSteps(steps));
    }
    let bounds = control.bounds();
    let span = bounds.max - bounds.min;
    let points = (0..steps)
        .map(|i| {
            let value = bounds.min + span * (i as f64) / ((steps - 1) as f64);
            let table = derive_table(base, &sliders.with(control, value).deltas(), c);
            let rows = table.rows();
            let n = rows.len() as f64;
            SweepPoint {
                value,
                profit: total(rows, |r| r.profit),
                mean_soil_quality: total(rows, |r| r.soil_quality) / n,
                mean_yield_efficiency: total(rows, |r| r.yield_efficiency) / n,
            }
        })
        .collect();
    debug!(%control, steps, "sensitivity sweep complete");
    Ok(points)
}
