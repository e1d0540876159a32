//! Chart series handed to an external renderer.

use agro_core::{DerivedTable, MonthlyRecord};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Area,
    Bar,
    Heatmap,
}

/// One figure: a titled monthly series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

impl Chart {
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Static description of a figure and the column it plots.
#[derive(Clone, Copy)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    column: fn(&MonthlyRecord) -> f64,
}

impl ChartSpec {
    pub fn render(&self, table: &DerivedTable) -> Chart {
        Chart {
            id: self.id,
            title: self.title,
            kind: self.kind,
            x: table.labels(),
            y: table.column(self.column),
        }
    }

    /// Same figure with no points, shown when data could not be produced.
    pub fn placeholder(&self) -> Chart {
        Chart {
            id: self.id,
            title: self.title,
            kind: self.kind,
            x: Vec::new(),
            y: Vec::new(),
        }
    }
}

const PRODUCTION: ChartSpec = ChartSpec {
    id: "production",
    title: "Production trend (t)",
    kind: ChartKind::Line,
    column: |r| r.production_t,
};
const EFFICIENCY: ChartSpec = ChartSpec {
    id: "efficiency",
    title: "Harvest efficiency",
    kind: ChartKind::Line,
    column: |r| r.yield_efficiency,
};
const WATER: ChartSpec = ChartSpec {
    id: "water",
    title: "Water usage",
    kind: ChartKind::Area,
    column: |r| r.water_usage,
};
const ENERGY: ChartSpec = ChartSpec {
    id: "energy",
    title: "Energy cost (€)",
    kind: ChartKind::Bar,
    column: |r| r.energy_cost,
};
const PROFIT: ChartSpec = ChartSpec {
    id: "profit",
    title: "Net profit",
    kind: ChartKind::Line,
    column: |r| r.profit,
};
const SOIL: ChartSpec = ChartSpec {
    id: "soil",
    title: "Soil quality",
    kind: ChartKind::Heatmap,
    column: |r| r.soil_quality,
};

/// Figures of the random-input simulator.
pub const SIMULATOR_CHARTS: [ChartSpec; 6] = [PRODUCTION, EFFICIENCY, WATER, ENERGY, PROFIT, SOIL];

/// Figures of the weather-driven dashboard.
pub const WEATHER_CHARTS: [ChartSpec; 5] = [PRODUCTION, EFFICIENCY, WATER, PROFIT, SOIL];

pub fn render_all(specs: &[ChartSpec], table: &DerivedTable) -> Vec<Chart> {
    specs.iter().map(|s| s.render(table)).collect()
}

pub fn placeholders(specs: &[ChartSpec]) -> Vec<Chart> {
    specs.iter().map(ChartSpec::placeholder).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_sets_have_unique_ids() {
        for set in [&SIMULATOR_CHARTS[..], &WEATHER_CHARTS[..]] {
            let mut ids: Vec<_> = set.iter().map(|s| s.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), set.len());
        }
    }

    #[test]
    fn placeholders_keep_titles_without_points() {
        let charts = placeholders(&WEATHER_CHARTS);
        assert_eq!(charts.len(), 5);
        assert!(charts.iter().all(Chart::is_empty));
        assert_eq!(charts[0].title, "Production trend (t)");
        assert_eq!(charts[4].kind, ChartKind::Heatmap);
    }
}
