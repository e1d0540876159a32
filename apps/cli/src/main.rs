#![deny(warnings)]

//! Headless CLI for the farm simulator dashboards.

mod config;

use agro_core::{Control, Sliders};
use agro_econ::{sweep, SweepPoint};
use agro_runtime::{DashboardView, SimulatorDashboard, WeatherDashboard};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::FarmConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weather::HttpWeatherSource;

/// Agricultural production simulator with random or weather-driven inputs.
#[derive(Parser, Debug)]
#[command(name = "farmsim", version)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "FARMSIM_CONFIG")]
    config: Option<PathBuf>,

    /// RNG seed, overrides the config file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Random environment with climate and irrigation sliders
    Simulate {
        #[command(flatten)]
        sliders: ClimateSliders,
        /// Regenerate the environment before computing
        #[arg(long)]
        reroll: bool,
        /// Print the dashboard view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Last year's weather for a city with irrigation and fertilizer sliders
    Weather {
        #[arg(long)]
        city: String,
        #[arg(long)]
        irrigation: Option<f64>,
        #[arg(long)]
        fertilizer: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Annual profit across the range of one slider
    Sweep {
        /// temperature, humidity, precipitation, irrigation or fertilizer
        #[arg(long)]
        control: Control,
        #[arg(long, default_value_t = 11)]
        steps: usize,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct ClimateSliders {
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long)]
    humidity: Option<f64>,
    #[arg(long)]
    precipitation: Option<f64>,
    #[arg(long)]
    irrigation: Option<f64>,
}

impl ClimateSliders {
    fn over(&self, base: Sliders) -> Sliders {
        let mut s = base;
        for (control, value) in [
            (Control::Temperature, self.temperature),
            (Control::Humidity, self.humidity),
            (Control::Precipitation, self.precipitation),
            (Control::Irrigation, self.irrigation),
        ] {
            if let Some(v) = value {
                s.set(control, v);
            }
        }
        s
    }
}

fn load_config(cli: &Cli) -> Result<FarmConfig> {
    let mut cfg = match &cli.config {
        Some(path) => FarmConfig::load(path)?,
        None => FarmConfig::default(),
    };
    if cli.seed.is_some() {
        cfg.session.seed = cli.seed;
    }
    Ok(cfg)
}

fn print_view(view: &DashboardView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }
    println!("{}", view.status);
    let Some(table) = &view.table else {
        for chart in &view.charts {
            println!("  {} | no data", chart.title);
        }
        return Ok(());
    };
    println!(
        "{:<10} {:>7} {:>6} {:>8} {:>9} {:>9} {:>8} {:>9} {:>11} {:>7}",
        "month", "temp", "hum", "precip", "prod(t)", "eff", "water", "energy", "profit", "soil"
    );
    for (label, r) in table.labels().iter().zip(table.rows()) {
        println!(
            "{:<10} {:>7.1} {:>6.1} {:>8.1} {:>9.2} {:>9.5} {:>8.1} {:>9.1} {:>11.2} {:>7.2}",
            label,
            r.temperature_c,
            r.humidity_pct,
            r.precipitation_mm,
            r.production_t,
            r.yield_efficiency,
            r.water_usage,
            r.energy_cost,
            r.profit,
            r.soil_quality
        );
    }
    if let Some(s) = &view.summary {
        println!(
            "KPI | production: {:.1} t | revenue: €{} | cost: €{} | profit: €{} | soil: {:.1} | best: {} | worst: {}",
            s.total_production_t,
            s.total_revenue,
            s.total_cost,
            s.total_profit,
            s.mean_soil_quality,
            s.best_month,
            s.worst_month
        );
    }
    Ok(())
}

fn print_sweep(control: Control, points: &[SweepPoint], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(points)?);
        return Ok(());
    }
    println!("{:>12} {:>14} {:>9} {:>10}", control.name(), "profit", "soil", "eff");
    for p in points {
        println!(
            "{:>12.1} {:>14.2} {:>9.2} {:>10.5}",
            p.value, p.profit, p.mean_soil_quality, p.mean_yield_efficiency
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    info!(command = ?cli.command, seed = ?cfg.session.seed, "starting farmsim");

    match &cli.command {
        Command::Simulate {
            sliders,
            reroll,
            json,
        } => {
            let mut dashboard = SimulatorDashboard::new(&cfg.session)
                .context("generating the initial environment")?;
            if *reroll {
                dashboard.reroll().context("regenerating the environment")?;
            }
            let view = dashboard.apply(&sliders.over(cfg.sliders));
            print_view(&view, *json)
        }
        Command::Weather {
            city,
            irrigation,
            fertilizer,
            json,
        } => {
            let source = HttpWeatherSource::new(cfg.weather.clone())?;
            let today = chrono::Local::now().date_naive();
            let mut dashboard = WeatherDashboard::new(source, &cfg.session, today);
            let mut sliders = cfg.sliders;
            if let Some(v) = irrigation {
                sliders.set(Control::Irrigation, *v);
            }
            if let Some(v) = fertilizer {
                sliders.set(Control::Fertilizer, *v);
            }
            let view = dashboard.load(city, &sliders);
            print_view(&view, *json)
        }
        Command::Sweep {
            control,
            steps,
            json,
        } => {
            let dashboard = SimulatorDashboard::new(&cfg.session)
                .context("generating the initial environment")?;
            let points = sweep(
                dashboard.base(),
                &cfg.sliders,
                *control,
                *steps,
                &cfg.session.coefficients,
            )?;
            print_sweep(*control, &points, *json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_flags_override_config_sliders() {
        let cli = Cli::parse_from(["farmsim", "simulate", "--temperature", "30", "--json"]);
        let Command::Simulate { sliders, json, .. } = cli.command else {
            panic!("expected simulate");
        };
        assert!(json);
        let base = Sliders::default().with(Control::Irrigation, 1500.0);
        let s = sliders.over(base);
        assert_eq!(s.temperature, 30.0);
        assert_eq!(s.irrigation, 1500.0);
    }

    #[test]
    fn sweep_parses_control_name() {
        let cli = Cli::parse_from(["farmsim", "--seed", "3", "sweep", "--control", "fertilizer"]);
        assert_eq!(cli.seed, Some(3));
        match cli.command {
            Command::Sweep { control, steps, .. } => {
                assert_eq!(control, Control::Fertilizer);
                assert_eq!(steps, 11);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["farmsim", "sweep", "--control", "wind"]).is_err());
    }

    #[test]
    fn seed_flag_overrides_config() {
        let cli = Cli::parse_from(["farmsim", "--seed", "9", "simulate"]);
        let cfg = load_config(&cli).unwrap();
        assert_eq!(cfg.session.seed, Some(9));
    }
}
