//! Base table generation from random draws or supplied weather series.

use agro_core::{BaseRecord, BaseTable, Month, ValidationError, BASE_IRRIGATION, MONTHS};
use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    /// One of the weather series was not supplied.
    #[error("missing {0} series")]
    MissingSeries(&'static str),
    #[error("{name} series has {found} values, expected 12")]
    WrongLength { name: &'static str, found: usize },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("bad normal distribution: {0}")]
    Distribution(#[from] NormalError),
}

fn draw<R: Rng + ?Sized>(rng: &mut R, f: impl Fn(&mut R) -> f64) -> [f64; MONTHS] {
    let mut out = [0.0; MONTHS];
    for slot in &mut out {
        *slot = f(&mut *rng);
    }
    out
}

fn draw_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> Result<[f64; MONTHS], GenerationError> {
    let dist = Normal::new(mean, sd)?;
    Ok(draw(rng, |r| dist.sample(r)))
}

/// Growth factors, Uniform(0.8, 1.2) per month.
pub fn sample_growth_rates<R: Rng + ?Sized>(rng: &mut R) -> [f64; MONTHS] {
    draw(rng, |r| r.gen_range(0.8..1.2))
}

struct Economics {
    growth: [f64; MONTHS],
    fertilizer: [f64; MONTHS],
    selling_price: [f64; MONTHS],
    labor_cost: [f64; MONTHS],
}

fn sample_economics<R: Rng + ?Sized>(rng: &mut R) -> Economics {
    Economics {
        growth: sample_growth_rates(rng),
        fertilizer: draw(rng, |r| r.gen_range(10.0..50.0)),
        selling_price: draw(rng, |r| r.gen_range(150.0..300.0)),
        labor_cost: draw(rng, |r| r.gen_range(1000.0..5000.0)),
    }
}

fn assemble(
    year: i32,
    temperature: &[f64],
    humidity: &[f64],
    precipitation: &[f64],
    econ: &Economics,
) -> Result<BaseTable, GenerationError> {
    let rows = Month::all()
        .map(|month| {
            let i = month.position();
            BaseRecord {
                month,
                temperature_c: temperature[i],
                humidity_pct: humidity[i],
                precipitation_mm: precipitation[i],
                irrigation_l_ha: BASE_IRRIGATION,
                fertilizer_kg_ha: econ.fertilizer[i],
                labor_cost: econ.labor_cost[i],
                selling_price: econ.selling_price[i],
                growth_rate: econ.growth[i],
            }
        })
        .collect();
    Ok(BaseTable::new(year, rows)?)
}

/// Twelve random months: temperature ~ N(25, 5), humidity ~ N(60, 10),
/// precipitation ~ N(100, 30), plus the uniform economic fields.
pub fn random_table<R: Rng + ?Sized>(year: i32, rng: &mut R) -> Result<BaseTable, GenerationError> {
    let temperature = draw_normal(rng, 25.0, 5.0)?;
    let humidity = draw_normal(rng, 60.0, 10.0)?;
    let precipitation = draw_normal(rng, 100.0, 30.0)?;
    let econ = sample_economics(rng);
    debug!(year, "generated random base table");
    assemble(year, &temperature, &humidity, &precipitation, &econ)
}

/// Base table from supplied monthly weather. Economic fields are still sampled.
pub fn table_from_series<R: Rng + ?Sized>(
    year: i32,
    temperature: Option<&[f64]>,
    precipitation: Option<&[f64]>,
    humidity: Option<&[f64]>,
    rng: &mut R,
) -> Result<BaseTable, GenerationError> {
    let require = |name: &'static str, s: Option<&[f64]>| -> Result<Vec<f64>, GenerationError> {
        let s = s.ok_or(GenerationError::MissingSeries(name))?;
        if s.len() != MONTHS {
            return Err(GenerationError::WrongLength {
                name,
                found: s.len(),
            });
        }
        Ok(s.to_vec())
    };
    let temperature = require("temperature", temperature)?;
    let precipitation = require("precipitation", precipitation)?;
    let humidity = require("humidity", humidity)?;
    let econ = sample_economics(rng);
    debug!(year, "generated base table from weather series");
    assemble(year, &temperature, &humidity, &precipitation, &econ)
}
