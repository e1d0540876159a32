//! Monthly reduction of daily observations and seasonal curve synthesis.

use crate::{DailyHistory, WeatherError};
use agro_core::{Month, MONTHS};
use chrono::{Datelike, Days};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

/// Observed monthly climate for one year.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyMeans {
    /// Mean of the daily (max + min) / 2, per month, in °C.
    pub temperature: [f64; MONTHS],
    /// Monthly precipitation total in mm.
    pub precipitation: [f64; MONTHS],
    /// Mean of all monthly temperatures.
    pub annual_temperature: f64,
}

/// Seasonal series, twelve values each.
#[derive(Clone, Debug, PartialEq)]
pub struct SeasonalSeries {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub precipitation: Vec<f64>,
}

#[derive(Clone, Copy, Default)]
struct Acc {
    sum: f64,
    n: u32,
}

impl Acc {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / f64::from(self.n))
    }
}

/// Reduce a daily history to monthly means for `year`.
///
/// Days outside `year` and null observations are skipped. A month without a
/// valid day takes the annual mean of the days that were valid.
pub fn monthly_means(history: &DailyHistory, year: i32) -> Result<MonthlyMeans, WeatherError> {
    let start = history.start.ok_or(WeatherError::NoData)?;
    let mut temp = [Acc::default(); MONTHS];
    let mut rain = [Acc::default(); MONTHS];
    let mut temp_all = Acc::default();
    let mut rain_all = Acc::default();

    let days = history
        .temperature_max
        .len()
        .max(history.temperature_min.len())
        .max(history.precipitation.len());
    for i in 0..days {
        let Some(date) = start.checked_add_days(Days::new(i as u64)) else {
            break;
        };
        if date.year() != year {
            continue;
        }
        let m = date.month0() as usize;
        let hi = history.temperature_max.get(i).copied().flatten();
        let lo = history.temperature_min.get(i).copied().flatten();
        if let (Some(hi), Some(lo)) = (hi, lo) {
            let mean = (hi + lo) / 2.0;
            temp[m].push(mean);
            temp_all.push(mean);
        }
        if let Some(p) = history.precipitation.get(i).copied().flatten() {
            rain[m].push(p);
            rain_all.push(p);
        }
    }

    let annual_temp = temp_all.mean().ok_or(WeatherError::NoData)?;
    let annual_daily_rain = rain_all.mean().unwrap_or(0.0);

    let mut temperature = [0.0; MONTHS];
    let mut precipitation = [0.0; MONTHS];
    for month in Month::all() {
        let m = month.position();
        temperature[m] = temp[m].mean().unwrap_or(annual_temp);
        let daily = rain[m].mean().unwrap_or(annual_daily_rain);
        precipitation[m] = daily * f64::from(month.days_in(year));
    }
    let annual_temperature = temperature.iter().sum::<f64>() / MONTHS as f64;

    Ok(MonthlyMeans {
        temperature,
        precipitation,
        annual_temperature,
    })
}

/// Shape a seasonal year around the observed annual mean.
///
/// Temperature follows a sine peaking in July (January south of the equator)
/// with amplitude 30% of the annual mean, floored at 3 °C, blended half and
/// half with the observed monthly mean. Humidity mirrors it around 60%.
/// Precipitation keeps the observed totals with 5% noise.
pub fn synthesize<R: Rng + ?Sized>(means: &MonthlyMeans, latitude: f64, rng: &mut R) -> SeasonalSeries {
    let hemisphere = if latitude < 0.0 { -1.0 } else { 1.0 };
    let amplitude = (0.3 * means.annual_temperature.abs()).max(3.0);
    let mut noise = || -> f64 { StandardNormal.sample(&mut *rng) };

    let mut temperature = Vec::with_capacity(MONTHS);
    let mut humidity = Vec::with_capacity(MONTHS);
    let mut precipitation = Vec::with_capacity(MONTHS);
    for m in 0..MONTHS {
        let phase = 2.0 * PI * (m as f64 + 1.0 - 4.0) / MONTHS as f64;
        let season = hemisphere * phase.sin();

        let curve = means.annual_temperature + amplitude * season;
        temperature.push(0.5 * curve + 0.5 * means.temperature[m] + noise());
        humidity.push((60.0 - 10.0 * season + 3.0 * noise()).clamp(0.0, 100.0));
        precipitation.push((means.precipitation[m] * (1.0 + 0.05 * noise())).max(0.0));
    }

    SeasonalSeries {
        temperature,
        humidity,
        precipitation,
    }
}
