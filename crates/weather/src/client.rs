//! Blocking HTTP client for the geocoding and archive endpoints.

use crate::{Coordinates, DailyHistory, Stage, WeatherError, WeatherSource};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";

/// Endpoints and timeout of the weather service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub geocoding_url: String,
    pub archive_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct ArchiveResponse {
    daily: Option<ArchiveDaily>,
}

#[derive(Deserialize)]
struct ArchiveDaily {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

/// Parse a geocoding payload; only the first result is used.
pub fn parse_geocoding(body: &str) -> Result<Option<Coordinates>, WeatherError> {
    let resp: GeocodingResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Malformed {
            stage: Stage::Geocoding,
            message: e.to_string(),
        })?;
    Ok(resp.results.first().map(|r| Coordinates {
        latitude: r.latitude,
        longitude: r.longitude,
    }))
}

/// Parse an archive payload whose first daily entry is `start`.
pub fn parse_archive(body: &str, start: NaiveDate) -> Result<DailyHistory, WeatherError> {
    let malformed = |message: String| WeatherError::Malformed {
        stage: Stage::Archive,
        message,
    };
    let resp: ArchiveResponse = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let daily = resp
        .daily
        .ok_or_else(|| malformed("missing `daily` object".to_string()))?;
    Ok(DailyHistory {
        start: Some(start),
        temperature_max: daily.temperature_2m_max,
        temperature_min: daily.temperature_2m_min,
        precipitation: daily.precipitation_sum,
    })
}

/// [`WeatherSource`] backed by HTTP GET requests. One attempt per call, no retry.
pub struct HttpWeatherSource {
    client: Client,
    config: WeatherConfig,
}

impl HttpWeatherSource {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn get(&self, stage: Stage, url: &str, query: &[(&str, String)]) -> Result<String, WeatherError> {
        let transport = |e: reqwest::Error| WeatherError::Transport {
            stage,
            message: e.to_string(),
        };
        debug!(%stage, url, "GET");
        let resp = self.client.get(url).query(query).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%stage, code = status.as_u16(), "weather request rejected");
            return Err(WeatherError::Status {
                stage,
                code: status.as_u16(),
            });
        }
        resp.text().map_err(transport)
    }
}

impl WeatherSource for HttpWeatherSource {
    fn geocode(&self, city: &str) -> Result<Option<Coordinates>, WeatherError> {
        let body = self.get(
            Stage::Geocoding,
            &self.config.geocoding_url,
            &[
                ("name", city.to_string()),
                ("count", "1".to_string()),
                ("format", "json".to_string()),
            ],
        )?;
        parse_geocoding(&body)
    }

    fn daily_history(
        &self,
        at: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyHistory, WeatherError> {
        let body = self.get(
            Stage::Archive,
            &self.config.archive_url,
            &[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ],
        )?;
        parse_archive(&body, start)
    }
}
