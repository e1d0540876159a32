//! Headless dashboard sessions: slider state in, chart series and status out.

use crate::charts::{placeholders, render_all, Chart, ChartSpec, SIMULATOR_CHARTS, WEATHER_CHARTS};
use crate::generator::{random_table, sample_growth_rates, table_from_series, GenerationError};
use crate::SessionSettings;
use agro_core::{BaseTable, Control, DerivedTable, Sliders, MONTHS};
use agro_econ::{derive_table, summarize, Coefficients, Summary};
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};
use weather::{fetch_weather, WeatherSeries, WeatherSource};

pub const NOT_FOUND_MESSAGE: &str = "City not found or weather data unavailable.";
pub const GENERATION_FAILED_MESSAGE: &str = "Data generation failed.";
pub const NO_CITY_MESSAGE: &str = "Enter a city and load its weather.";
pub const SIMULATION_UPDATED: &str = "Simulation updated.";

/// What a dashboard hands to the renderer after every action.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: String,
    pub charts: Vec<Chart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<DerivedTable>,
}

impl DashboardView {
    fn failure(status: &str, specs: &[ChartSpec]) -> Self {
        Self {
            status: status.to_string(),
            charts: placeholders(specs),
            summary: None,
            table: None,
        }
    }

    fn rendered(status: String, specs: &[ChartSpec], table: DerivedTable) -> Self {
        match summarize(&table) {
            Ok(summary) => Self {
                status,
                charts: render_all(specs, &table),
                summary: Some(summary),
                table: Some(table),
            },
            Err(e) => {
                warn!(error = %e, "summary failed");
                Self::failure(GENERATION_FAILED_MESSAGE, specs)
            }
        }
    }

    /// True when the charts hold no data.
    pub fn is_placeholder(&self) -> bool {
        self.charts.iter().all(Chart::is_empty)
    }
}

fn session_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn ui_sliders(sliders: &Sliders) -> Sliders {
    let clamped = sliders.clamped();
    if clamped != *sliders {
        warn!(?sliders, "slider values outside their range were clamped");
    }
    clamped
}

/// Random-input simulator with temperature, humidity, precipitation and
/// irrigation sliders.
pub struct SimulatorDashboard {
    rng: ChaCha8Rng,
    year: i32,
    coefficients: Coefficients,
    regenerate_on_apply: bool,
    growth_rates: [f64; MONTHS],
    base: BaseTable,
}

impl SimulatorDashboard {
    /// Draw the stored growth rates and a first environment.
    pub fn new(settings: &SessionSettings) -> Result<Self, GenerationError> {
        let mut rng = session_rng(settings.seed);
        let growth_rates = sample_growth_rates(&mut rng);
        let base = random_table(settings.year, &mut rng)?.with_growth_rates(&growth_rates);
        info!(seed = ?settings.seed, year = settings.year, "simulator session started");
        Ok(Self {
            rng,
            year: settings.year,
            coefficients: settings.coefficients.clone(),
            regenerate_on_apply: settings.regenerate_on_apply,
            growth_rates,
            base,
        })
    }

    pub fn base(&self) -> &BaseTable {
        &self.base
    }

    pub fn growth_rates(&self) -> &[f64; MONTHS] {
        &self.growth_rates
    }

    /// Draw a fresh environment, keeping the stored growth rates.
    pub fn reroll(&mut self) -> Result<(), GenerationError> {
        self.base = random_table(self.year, &mut self.rng)?.with_growth_rates(&self.growth_rates);
        info!("environment regenerated");
        Ok(())
    }

    /// Recompute every chart for the given slider positions. Fertilizer is
    /// not a simulator control and stays at its default.
    pub fn apply(&mut self, sliders: &Sliders) -> DashboardView {
        if self.regenerate_on_apply {
            if let Err(e) = self.reroll() {
                warn!(error = %e, "regeneration failed");
                return DashboardView::failure(GENERATION_FAILED_MESSAGE, &SIMULATOR_CHARTS);
            }
        }
        let sliders = ui_sliders(sliders);
        let effective = sliders.with(Control::Fertilizer, Sliders::default().fertilizer);
        let table = derive_table(&self.base, &effective.deltas(), &self.coefficients);
        DashboardView::rendered(SIMULATION_UPDATED.to_string(), &SIMULATOR_CHARTS, table)
    }
}

struct Loaded {
    series: WeatherSeries,
    base: BaseTable,
}

enum WeatherState {
    Empty,
    Loaded(Box<Loaded>),
    Failed(&'static str),
}

/// Weather-driven dashboard: a city field, a load button, and irrigation
/// and fertilizer sliders.
pub struct WeatherDashboard<S> {
    source: S,
    rng: ChaCha8Rng,
    today: NaiveDate,
    coefficients: Coefficients,
    state: WeatherState,
}

impl<S: WeatherSource> WeatherDashboard<S> {
    pub fn new(source: S, settings: &SessionSettings, today: NaiveDate) -> Self {
        Self {
            source,
            rng: session_rng(settings.seed),
            today,
            coefficients: settings.coefficients.clone(),
            state: WeatherState::Empty,
        }
    }

    /// Weather behind the current charts, if a city is loaded.
    pub fn series(&self) -> Option<&WeatherSeries> {
        match &self.state {
            WeatherState::Loaded(l) => Some(&l.series),
            _ => None,
        }
    }

    /// Fetch `city` once and recompute with the given sliders.
    pub fn load(&mut self, city: &str, sliders: &Sliders) -> DashboardView {
        self.state = match fetch_weather(&self.source, city, self.today, &mut self.rng) {
            Err(e) => {
                warn!(city, error = %e, "weather lookup failed");
                WeatherState::Failed(NOT_FOUND_MESSAGE)
            }
            Ok(series) => match table_from_series(
                series.year,
                Some(series.temperature.as_slice()),
                Some(series.precipitation.as_slice()),
                Some(series.humidity.as_slice()),
                &mut self.rng,
            ) {
                Ok(base) => WeatherState::Loaded(Box::new(Loaded { series, base })),
                Err(e) => {
                    warn!(city, error = %e, "base table from weather failed");
                    WeatherState::Failed(GENERATION_FAILED_MESSAGE)
                }
            },
        };
        self.apply(sliders)
    }

    /// Recompute from the stored weather. Only irrigation and fertilizer apply.
    pub fn apply(&self, sliders: &Sliders) -> DashboardView {
        let loaded = match &self.state {
            WeatherState::Loaded(l) => l,
            WeatherState::Failed(msg) => return DashboardView::failure(msg, &WEATHER_CHARTS),
            WeatherState::Empty => return DashboardView::failure(NO_CITY_MESSAGE, &WEATHER_CHARTS),
        };
        let sliders = ui_sliders(sliders);
        let effective = Sliders::default()
            .with(Control::Irrigation, sliders.irrigation)
            .with(Control::Fertilizer, sliders.fertilizer);
        let table = derive_table(&loaded.base, &effective.deltas(), &self.coefficients);
        let c = loaded.series.coordinates;
        let status = format!(
            "Weather for {} ({:.2}, {:.2}), {}",
            loaded.series.city, c.latitude, c.longitude, loaded.series.year
        );
        DashboardView::rendered(status, &WEATHER_CHARTS, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather::{Coordinates, DailyHistory, Stage, WeatherError};

    fn settings() -> SessionSettings {
        SessionSettings {
            seed: Some(42),
            ..SessionSettings::default()
        }
    }

    #[test]
    fn simulator_renders_six_full_charts() {
        let mut d = SimulatorDashboard::new(&settings()).unwrap();
        let view = d.apply(&Sliders::default());
        assert_eq!(view.status, SIMULATION_UPDATED);
        assert_eq!(view.charts.len(), 6);
        assert!(view.charts.iter().all(|c| c.y.len() == 12 && c.x.len() == 12));
        assert_eq!(view.charts[0].x[0], "2024-01-31");
    }

    #[test]
    fn simulator_apply_is_idempotent() {
        let mut d = SimulatorDashboard::new(&settings()).unwrap();
        let s = Sliders::default()
            .with(Control::Humidity, 75.0)
            .with(Control::Irrigation, 2500.0);
        assert_eq!(d.apply(&s), d.apply(&s));
    }

    #[test]
    fn temperature_slider_offsets_every_month() {
        let mut d = SimulatorDashboard::new(&settings()).unwrap();
        let base: Vec<f64> = d.base().rows().iter().map(|r| r.temperature_c).collect();
        let view = d.apply(&Sliders::default().with(Control::Temperature, 30.0));
        let table = view.table.unwrap();
        for (r, b) in table.rows().iter().zip(base) {
            assert!((r.temperature_c - (b + 5.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn reroll_keeps_growth_rates() {
        let mut d = SimulatorDashboard::new(&settings()).unwrap();
        let before = d.base().clone();
        let growth = *d.growth_rates();
        d.reroll().unwrap();
        assert_ne!(d.base(), &before);
        assert_eq!(d.base().growth_rates(), growth);
    }

    #[test]
    fn regenerate_on_apply_changes_environment_only() {
        let mut d = SimulatorDashboard::new(&SessionSettings {
            regenerate_on_apply: true,
            ..settings()
        })
        .unwrap();
        let a = d.apply(&Sliders::default()).table.unwrap();
        let b = d.apply(&Sliders::default()).table.unwrap();
        assert_ne!(a, b);
        for (x, y) in a.rows().iter().zip(b.rows()) {
            assert_eq!(x.growth_rate, y.growth_rate);
        }
    }

    #[test]
    fn simulator_ignores_fertilizer_slider() {
        let mut d = SimulatorDashboard::new(&settings()).unwrap();
        let plain = d.apply(&Sliders::default());
        let fertilized = d.apply(&Sliders::default().with(Control::Fertilizer, 30.0));
        assert_eq!(plain, fertilized);
    }

    #[test]
    fn out_of_range_sliders_are_clamped() {
        let mut d = SimulatorDashboard::new(&settings()).unwrap();
        let wild = d.apply(&Sliders::default().with(Control::Temperature, 90.0));
        let edge = d.apply(&Sliders::default().with(Control::Temperature, 40.0));
        assert_eq!(wild, edge);
    }

    struct Fake {
        geocode: Result<Option<Coordinates>, WeatherError>,
        archive_status: Option<u16>,
    }

    impl WeatherSource for Fake {
        fn geocode(&self, _city: &str) -> Result<Option<Coordinates>, WeatherError> {
            self.geocode.clone()
        }

        fn daily_history(
            &self,
            _at: Coordinates,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<DailyHistory, WeatherError> {
            if let Some(code) = self.archive_status {
                return Err(WeatherError::Status {
                    stage: Stage::Archive,
                    code,
                });
            }
            Ok(DailyHistory {
                start: Some(start),
                temperature_max: vec![Some(24.0); 366],
                temperature_min: vec![Some(12.0); 366],
                precipitation: vec![Some(3.0); 366],
            })
        }
    }

    /// Archive whose every reading is NaN, so the base table cannot be built.
    struct NanArchive;

    impl WeatherSource for NanArchive {
        fn geocode(&self, _city: &str) -> Result<Option<Coordinates>, WeatherError> {
            milan()
        }

        fn daily_history(
            &self,
            _at: Coordinates,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<DailyHistory, WeatherError> {
            Ok(DailyHistory {
                start: Some(start),
                temperature_max: vec![Some(f64::NAN); 366],
                temperature_min: vec![Some(f64::NAN); 366],
                precipitation: vec![Some(f64::NAN); 366],
            })
        }
    }

    fn milan() -> Result<Option<Coordinates>, WeatherError> {
        Ok(Some(Coordinates {
            latitude: 45.46,
            longitude: 9.19,
        }))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn weather_load_renders_five_charts() {
        let src = Fake {
            geocode: milan(),
            archive_status: None,
        };
        let mut d = WeatherDashboard::new(src, &settings(), today());
        let view = d.load("Milan", &Sliders::default());
        assert_eq!(view.status, "Weather for Milan (45.46, 9.19), 2024");
        assert_eq!(view.charts.len(), 5);
        assert!(!view.is_placeholder());
        assert_eq!(d.series().map(|s| s.year), Some(2024));
    }

    #[test]
    fn weather_sliders_recompute_without_refetch() {
        let src = Fake {
            geocode: milan(),
            archive_status: None,
        };
        let mut d = WeatherDashboard::new(src, &settings(), today());
        let first = d.load("Milan", &Sliders::default());
        let more_fert = d.apply(&Sliders::default().with(Control::Fertilizer, 20.0));
        let again = d.apply(&Sliders::default());
        assert_eq!(first, again);
        let soil = |v: &DashboardView| v.summary.as_ref().unwrap().mean_soil_quality;
        assert!(soil(&more_fert) < soil(&first));
    }

    #[test]
    fn weather_ignores_climate_sliders() {
        let src = Fake {
            geocode: milan(),
            archive_status: None,
        };
        let mut d = WeatherDashboard::new(src, &settings(), today());
        let first = d.load("Milan", &Sliders::default());
        let hot = d.apply(&Sliders::default().with(Control::Temperature, 38.0));
        assert_eq!(first, hot);
    }

    #[test]
    fn archive_error_status_yields_not_found_placeholders() {
        let src = Fake {
            geocode: milan(),
            archive_status: Some(500),
        };
        let mut d = WeatherDashboard::new(src, &settings(), today());
        let view = d.load("Milan", &Sliders::default());
        assert_eq!(view.status, NOT_FOUND_MESSAGE);
        assert_eq!(view.charts.len(), 5);
        assert!(view.is_placeholder());
        assert!(view.summary.is_none());
        assert!(d.series().is_none());
    }

    #[test]
    fn geocoding_error_status_yields_not_found() {
        let src = Fake {
            geocode: Err(WeatherError::Status {
                stage: Stage::Geocoding,
                code: 404,
            }),
            archive_status: None,
        };
        let mut d = WeatherDashboard::new(src, &settings(), today());
        let view = d.load("Nowhere", &Sliders::default());
        assert_eq!(view.status, NOT_FOUND_MESSAGE);
        assert!(view.is_placeholder());
        // The failure sticks until the next load.
        assert_eq!(d.apply(&Sliders::default()).status, NOT_FOUND_MESSAGE);
    }

    #[test]
    fn unusable_weather_yields_generation_failed_placeholders() {
        let mut d = WeatherDashboard::new(NanArchive, &settings(), today());
        let view = d.load("Milan", &Sliders::default());
        assert_eq!(view.status, GENERATION_FAILED_MESSAGE);
        assert_eq!(view.charts.len(), 5);
        assert!(view.is_placeholder());
        assert!(view.summary.is_none());
        assert!(d.series().is_none());
        let later = d.apply(&Sliders::default().with(Control::Irrigation, 2000.0));
        assert_eq!(later.status, GENERATION_FAILED_MESSAGE);
        assert!(later.is_placeholder());
    }

    #[test]
    fn empty_weather_dashboard_asks_for_city() {
        let src = Fake {
            geocode: Ok(None),
            archive_status: None,
        };
        let d = WeatherDashboard::new(src, &settings(), today());
        let view = d.apply(&Sliders::default());
        assert_eq!(view.status, NO_CITY_MESSAGE);
        assert!(view.is_placeholder());
    }

    #[test]
    fn view_serializes_for_renderer() {
        let mut d = SimulatorDashboard::new(&settings()).unwrap();
        let json = serde_json::to_value(d.apply(&Sliders::default())).unwrap();
        assert_eq!(json["charts"][3]["kind"], "bar");
        assert_eq!(json["charts"][0]["y"].as_array().unwrap().len(), 12);
        assert!(json["summary"]["total_profit"].is_string());
    }
}
