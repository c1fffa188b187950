use crate::config::ChartType;
use crate::data::stringify_value;
use crate::format::{format_value, ValueFormat};
use crate::ir::{
    BarLabel, CategoryTick, ChartOutput, ChartSpec, DrawCommand, LabelPlacement, LegendEntry,
    SceneGraph, TableSpec,
};
use crate::palette::ColorPalette;
use crate::scale::ScaleDecision;
use crate::RenderOptions;
use std::f64::consts::PI;

/// Bars shorter than this (in pixels) get their value label floated above.
pub const MIN_INSIDE_LABEL_PX: f64 = 18.0;

/// Share of each category slot covered by bars.
const GROUP_WIDTH: f64 = 0.8;

/// Fraction of the canvas height available to the plot area.
pub(crate) const PLOT_HEIGHT_SHARE: f64 = 0.75;

/// Compile a chart output into drawing commands for a backend.
pub fn compile_scene(output: &ChartOutput, options: &RenderOptions) -> SceneGraph {
    let palette = ColorPalette::default();
    match output {
        ChartOutput::Table(table) => compile_table(table, options),
        ChartOutput::Chart(spec) => {
            let scales = ScaleDecision::with_mode(&spec.series, spec.display_options.use_separate_scale);
            match spec.chart_type {
                ChartType::Line => compile_lines(spec, &scales, &palette, options),
                ChartType::Pie => compile_pie(spec, &palette, options),
                // A chart spec never carries `table`; draw it as bars.
                ChartType::Bar | ChartType::Table => compile_bars(spec, &scales, &palette, options),
            }
        }
    }
}

fn empty_scene(chart_type: ChartType, options: &RenderOptions) -> SceneGraph {
    SceneGraph {
        chart_type,
        width: options.width,
        height: options.height,
        x_label: None,
        y_label: None,
        category_ticks: Vec::new(),
        rotate_category_labels: false,
        legend: Vec::new(),
        commands: Vec::new(),
    }
}

fn compile_table(table: &TableSpec, options: &RenderOptions) -> SceneGraph {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|col| stringify_value(row.get(col)))
                .collect()
        })
        .collect();

    let mut scene = empty_scene(ChartType::Table, options);
    scene.commands.push(DrawCommand::DrawTable {
        columns: table.columns.clone(),
        rows,
    });
    scene
}

/// Axis decoration shared by bar and line charts.
fn axis_scene(spec: &ChartSpec, palette: &ColorPalette, options: &RenderOptions) -> SceneGraph {
    let n = spec.categories.len().max(1) as f64;
    let mut scene = empty_scene(spec.chart_type, options);
    scene.x_label = Some(spec.x_label.clone()).filter(|l| !l.is_empty());
    scene.y_label = Some(spec.y_label.clone()).filter(|l| !l.is_empty());
    scene.rotate_category_labels = spec.display_options.rotate_category_labels;
    scene.category_ticks = spec
        .categories
        .iter()
        .enumerate()
        .map(|(i, label)| CategoryTick {
            x: (i as f64 + 0.5) / n,
            label: label.clone(),
        })
        .collect();
    scene.legend = spec
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| LegendEntry {
            label: s.name.clone(),
            color: palette.color_for(i).to_string(),
        })
        .collect();
    scene
}

fn compile_bars(
    spec: &ChartSpec,
    scales: &ScaleDecision,
    palette: &ColorPalette,
    options: &RenderOptions,
) -> SceneGraph {
    let mut scene = axis_scene(spec, palette, options);
    let num_categories = spec.categories.len();
    let num_series = spec.series.len();
    if num_categories == 0 || num_series == 0 {
        return scene;
    }

    let slot = 1.0 / num_categories as f64;
    let bar_width = slot * GROUP_WIDTH / num_series as f64;
    let plot_px = options.height as f64 * PLOT_HEIGHT_SHARE;

    for (series_idx, series) in spec.series.iter().enumerate() {
        let denominator = scales.denominator(series_idx);
        let format = spec.format_for(series);
        let color = palette.color_for(series_idx).to_string();

        for (cat_idx, &value) in series.data.iter().enumerate() {
            let fraction = (value / denominator).clamp(0.0, 1.0);

            // Dodge: center the series within the category slot
            let offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * bar_width;
            let x_center = (cat_idx as f64 + 0.5) * slot + offset;
            let half = bar_width / 2.0;

            let label = spec.display_options.show_values_on_bars.then(|| BarLabel {
                text: format_value(value, format),
                placement: if fraction * plot_px >= MIN_INSIDE_LABEL_PX {
                    LabelPlacement::Inside
                } else {
                    LabelPlacement::Above
                },
            });

            scene.commands.push(DrawCommand::DrawRect {
                tl: (x_center - half, fraction),
                br: (x_center + half, 0.0),
                color: color.clone(),
                fraction,
                label,
                series: series_idx,
                category: cat_idx,
            });
        }
    }
    scene
}

/// Sparkline semantics: every line is normalized by its own maximum.
fn compile_lines(
    spec: &ChartSpec,
    scales: &ScaleDecision,
    palette: &ColorPalette,
    options: &RenderOptions,
) -> SceneGraph {
    let mut scene = axis_scene(spec, palette, options);
    let n = spec.categories.len().max(1) as f64;

    for (series_idx, series) in spec.series.iter().enumerate() {
        let own_max = scales.own_max(series_idx);
        let points = series
            .data
            .iter()
            .enumerate()
            .map(|(i, &value)| ((i as f64 + 0.5) / n, (value / own_max).clamp(0.0, 1.0)))
            .collect();
        scene.commands.push(DrawCommand::DrawLine {
            points,
            color: palette.color_for(series_idx).to_string(),
            series: series_idx,
        });
    }
    scene
}

/// Pie charts use the first series only. Only positive values take up space;
/// negative values and a zero total render at 0%.
fn compile_pie(spec: &ChartSpec, palette: &ColorPalette, options: &RenderOptions) -> SceneGraph {
    let mut scene = empty_scene(ChartType::Pie, options);
    let Some(series) = spec.series.first() else {
        return scene;
    };

    let total: f64 = series.data.iter().copied().filter(|v| v.is_finite() && *v > 0.0).sum();
    let percent_format = ValueFormat::parse("percentage:1");
    let mut angle = 0.0;

    for (i, &value) in series.data.iter().enumerate() {
        let fraction = if total > 0.0 && value.is_finite() && value > 0.0 {
            (value / total).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let sweep = fraction * 2.0 * PI;
        let label = spec.categories.get(i).cloned().unwrap_or_default();
        let color = palette.color_for(i).to_string();

        scene.legend.push(LegendEntry {
            label: label.clone(),
            color: color.clone(),
        });
        scene.commands.push(DrawCommand::DrawSlice {
            start_angle: angle,
            end_angle: angle + sweep,
            fraction,
            color,
            label,
            percent: percent_format.apply(fraction * 100.0),
        });
        angle += sweep;
    }
    scene
}
