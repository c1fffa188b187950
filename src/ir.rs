use crate::config::{ChartType, DisplayOptions};
use crate::data::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Phase 1: Assembly output
// =============================================================================

/// One named series of values aligned to the chart categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// Display name (override or raw field).
    pub name: String,
    /// Raw field name, used for format lookup.
    pub original_name: String,
    pub data: Vec<f64>,
}

/// Renderer-ready description of a bar, line or pie chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub x_label: String,
    pub y_label: String,
    /// Display name -> format string.
    pub series_formats: BTreeMap<String, String>,
    pub display_options: DisplayOptions,
}

impl ChartSpec {
    pub fn format_for(&self, series: &Series) -> Option<&str> {
        self.series_formats.get(&series.name).map(String::as_str)
    }
}

/// Table mode: the selected columns over the untouched rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartOutput {
    Chart(ChartSpec),
    Table(TableSpec),
}

impl ChartOutput {
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartOutput::Chart(spec) => spec.chart_type,
            ChartOutput::Table(table) => table.chart_type,
        }
    }
}

// =============================================================================
// Phase 2: Scene compilation
// =============================================================================

/// Backend-neutral drawing instructions. Plot coordinates are unit space:
/// x grows right, y grows up, both 0..1 inside the plot area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneGraph {
    pub chart_type: ChartType,
    pub width: u32,
    pub height: u32,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub category_ticks: Vec<CategoryTick>,
    pub rotate_category_labels: bool,
    pub legend: Vec<LegendEntry>,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTick {
    pub x: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPlacement {
    Inside,
    Above,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLabel {
    pub text: String,
    pub placement: LabelPlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawCommand {
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        color: String,
        /// Height as a fraction of the plot area.
        fraction: f64,
        label: Option<BarLabel>,
        series: usize,
        category: usize,
    },
    DrawLine {
        points: Vec<(f64, f64)>,
        color: String,
        series: usize,
    },
    DrawSlice {
        /// Radians, clockwise from 12 o'clock.
        start_angle: f64,
        end_angle: f64,
        fraction: f64,
        color: String,
        label: String,
        percent: String,
    },
    DrawTable {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}
