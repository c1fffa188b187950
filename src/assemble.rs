use crate::classify::classify_fields;
use crate::config::{ChartConfig, ChartType, DisplayOptions, PipelineOptions};
use crate::data::{QueryResult, Row};
use crate::format::format_category_label;
use crate::ir::{ChartOutput, ChartSpec, TableSpec};
use crate::resolve::FieldResolver;
use crate::scale::reconcile_scales;
use crate::series::build_series;
use std::collections::BTreeMap;

/// Build the renderer-ready chart for a query result under a chart configuration.
///
/// Returns `None` when no field is selected; callers show an empty state.
pub fn assemble_chart(
    result: &QueryResult,
    config: &ChartConfig,
    options: &PipelineOptions,
) -> Option<ChartOutput> {
    let selected = config.selected_fields.selected();
    assemble_from_rows(&selected, &result.columns, &result.rows, config, options)
}

/// Same as [`assemble_chart`] with the selected fields given explicitly.
pub fn assemble_from_rows(
    selected: &[String],
    columns: &[String],
    rows: &[Row],
    config: &ChartConfig,
    options: &PipelineOptions,
) -> Option<ChartOutput> {
    if selected.is_empty() {
        tracing::debug!("no fields selected; nothing to chart");
        return None;
    }

    if config.chart_type == ChartType::Table {
        return Some(ChartOutput::Table(TableSpec {
            chart_type: ChartType::Table,
            columns: selected.to_vec(),
            rows: rows.to_vec(),
        }));
    }

    let resolver = FieldResolver::from_rows(columns, rows);
    for field in selected {
        if resolver.resolve_key(field).is_none() {
            tracing::warn!(field = field.as_str(), "selected field not present in query result");
        }
    }

    let roles = classify_fields(selected, rows, &resolver, options.sample_depth)?;
    tracing::debug!(
        category = roles.category_field.as_str(),
        values = ?roles.value_fields,
        "classified selected fields"
    );

    let set = build_series(rows, &roles, &config.series_display_names, &resolver);
    let scales = reconcile_scales(&set.series, options.separate_scale_ratio);

    let series_formats: BTreeMap<String, String> = set
        .series
        .iter()
        .filter_map(|s| {
            config
                .series_formats
                .get(&s.original_name)
                .map(|format| (s.name.clone(), format.clone()))
        })
        .collect();

    let x_label = if config.axis_labels.x.is_empty() {
        roles.category_field.clone()
    } else {
        config.axis_labels.x.clone()
    };
    let y_label = match (config.axis_labels.y.is_empty(), set.series.as_slice()) {
        (false, _) => config.axis_labels.y.clone(),
        (true, [only]) => only.name.clone(),
        (true, _) => String::new(),
    };

    Some(ChartOutput::Chart(ChartSpec {
        chart_type: config.chart_type,
        categories: set.categories.iter().map(|c| format_category_label(c)).collect(),
        series: set.series,
        x_label,
        y_label,
        series_formats,
        display_options: DisplayOptions {
            use_separate_scale: scales.use_separate_scale,
            ..config.display_options.clone()
        },
    }))
}
