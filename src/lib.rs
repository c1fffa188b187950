// Library exports for chartspec

pub mod config;
pub mod data;
pub mod format;
pub mod graph;
pub mod palette;
pub mod resolve;

// Pipeline
pub mod assemble;
pub mod classify;
pub mod compiler;
pub mod ir;
pub mod scale;
pub mod series;

pub use assemble::{assemble_chart, assemble_from_rows};
pub use compiler::compile_scene;
pub use config::{AxisLabels, ChartConfig, ChartType, DisplayOptions, FieldSelection, PipelineOptions};
pub use data::{coerce_numeric, QueryResult, Row};
pub use format::{format_category_label, format_value};
pub use graph::render_scene;
pub use ir::{ChartOutput, ChartSpec, SceneGraph, Series, TableSpec};
pub use resolve::{resolve_field_value, FieldResolver};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

/// Run the whole pipeline and draw the result. `Ok(None)` means nothing was selected.
pub fn render_chart(
    result: &QueryResult,
    config: &ChartConfig,
    pipeline: &PipelineOptions,
    options: &RenderOptions,
) -> anyhow::Result<Option<Vec<u8>>> {
    match assemble_chart(result, config, pipeline) {
        Some(output) => {
            let scene = compile_scene(&output, options);
            render_scene(&scene, options).map(Some)
        }
        None => Ok(None),
    }
}
