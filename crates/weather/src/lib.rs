#![deny(warnings)]

//! Historical weather lookup for a city, reduced to a synthetic seasonal year.
//!
//! A lookup geocodes the city, pulls one calendar year of daily observations
//! from an archive endpoint, reduces them to monthly means and then shapes a
//! seasonal temperature and humidity curve around the annual mean.

mod client;
mod season;

pub use client::{parse_archive, parse_geocoding, HttpWeatherSource, WeatherConfig};
pub use season::{monthly_means, synthesize, MonthlyMeans, SeasonalSeries};

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Geographic position returned by the geocoder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Daily observations starting at `start`, one entry per day.
/// Missing observations are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DailyHistory {
    pub start: Option<NaiveDate>,
    pub temperature_max: Vec<Option<f64>>,
    pub temperature_min: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
}

/// Which request a failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Geocoding,
    Archive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Geocoding => "geocoding",
            Stage::Archive => "archive",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum WeatherError {
    #[error("city not found: {0}")]
    CityNotFound(String),
    #[error("{stage} request returned HTTP {code}")]
    Status { stage: Stage, code: u16 },
    #[error("{stage} request failed: {message}")]
    Transport { stage: Stage, message: String },
    #[error("malformed {stage} response: {message}")]
    Malformed { stage: Stage, message: String },
    #[error("no usable daily observations")]
    NoData,
    #[error("http client setup failed: {0}")]
    Client(String),
}

/// Anything that can resolve a city and serve its daily history.
pub trait WeatherSource {
    /// Resolve a city name to coordinates. `Ok(None)` when nothing matches.
    fn geocode(&self, city: &str) -> Result<Option<Coordinates>, WeatherError>;

    /// Daily max/min temperature and precipitation between two dates, inclusive.
    fn daily_history(
        &self,
        at: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyHistory, WeatherError>;
}

/// Monthly series ready for the generator, plus where they came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherSeries {
    pub city: String,
    pub coordinates: Coordinates,
    /// Calendar year the observations cover.
    pub year: i32,
    pub temperature: Vec<f64>,
    pub precipitation: Vec<f64>,
    pub humidity: Vec<f64>,
}

/// The last complete calendar year before `today`.
pub fn previous_year_window(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let year = today.year() - 1;
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Single-attempt lookup: geocode, fetch one year, reduce and synthesize.
pub fn fetch_weather<S, R>(
    source: &S,
    city: &str,
    today: NaiveDate,
    rng: &mut R,
) -> Result<WeatherSeries, WeatherError>
where
    S: WeatherSource + ?Sized,
    R: Rng + ?Sized,
{
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherError::CityNotFound(String::new()));
    }
    let coordinates = source
        .geocode(city)?
        .ok_or_else(|| WeatherError::CityNotFound(city.to_string()))?;
    let (start, end) = previous_year_window(today).ok_or(WeatherError::NoData)?;
    info!(
        city,
        latitude = coordinates.latitude,
        longitude = coordinates.longitude,
        %start,
        %end,
        "fetching daily history"
    );

    let history = source.daily_history(coordinates, start, end)?;
    let means = monthly_means(&history, start.year()).map_err(|e| {
        warn!(city, error = %e, "daily history unusable");
        e
    })?;
    let series = synthesize(&means, coordinates.latitude, rng);

    Ok(WeatherSeries {
        city: city.to_string(),
        coordinates,
        year: start.year(),
        temperature: series.temperature,
        precipitation: series.precipitation,
        humidity: series.humidity,
    })
}
