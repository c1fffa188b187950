// Persisted chart configuration and pipeline tuning

use anyhow::{Context, Result};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Table,
}

/// Column -> selected flag. Entry order is the display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSelection {
    entries: Vec<(String, bool)>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field's flag, keeping its original position if already present.
    pub fn set(&mut self, field: impl Into<String>, selected: bool) {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = selected,
            None => self.entries.push((field, selected)),
        }
    }

    /// Selected field names in display order.
    pub fn selected(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, on)| !on)
    }
}

impl<S: AsRef<str>> FromIterator<S> for FieldSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = FieldSelection::new();
        for field in iter {
            selection.set(field.as_ref(), true);
        }
        selection
    }
}

impl Serialize for FieldSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, on) in &self.entries {
            map.serialize_entry(name, on)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Object form keeps key order through serde_json's preserve_order map.
        let value = Value::deserialize(deserializer)?;
        let mut selection = FieldSelection::new();
        match value {
            Value::Object(map) => {
                for (name, flag) in map {
                    selection.set(name, matches!(flag, Value::Bool(true)));
                }
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(name) => selection.set(name, true),
                        other => {
                            return Err(serde::de::Error::custom(format!(
                                "selected field names must be strings, got {}",
                                other
                            )))
                        }
                    }
                }
            }
            Value::Null => {}
            other => {
                return Err(serde::de::Error::custom(format!(
                    "selectedFields must be an object or an array, got {}",
                    other
                )))
            }
        }
        Ok(selection)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayOptions {
    pub show_values_on_bars: bool,
    pub rotate_category_labels: bool,
    /// Derived by the scale reconciler; whatever is stored here is overwritten.
    pub use_separate_scale: bool,
}

/// Per-report chart settings. Written back as a full replace on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    pub selected_fields: FieldSelection,
    pub chart_type: ChartType,
    pub axis_labels: AxisLabels,
    pub display_options: DisplayOptions,
    pub series_formats: BTreeMap<String, String>,
    pub series_display_names: BTreeMap<String, String>,
}

impl ChartConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to parse chart configuration")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize chart configuration")
    }
}

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Max-to-min series ratio above which series get independent scales.
    #[serde(default = "default_separate_scale_ratio")]
    pub separate_scale_ratio: f64,
    /// Non-null values inspected per field when deciding numeric vs categorical.
    #[serde(default = "default_sample_depth")]
    pub sample_depth: usize,
}

fn default_separate_scale_ratio() -> f64 { 20.0 }
fn default_sample_depth() -> usize { 3 }

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            separate_scale_ratio: default_separate_scale_ratio(),
            sample_depth: default_sample_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "selectedFields": {"sales": true, "region": true, "notes": false},
            "chartType": "line",
            "axisLabels": {"x": "Region", "y": "Revenue"},
            "displayOptions": {"showValuesOnBars": true, "rotateCategoryLabels": false, "useSeparateScale": true},
            "seriesFormats": {"sales": "currency:2"},
            "seriesDisplayNames": {"sales": "Sales ($)"}
        }"#;
        let config = ChartConfig::from_json_str(json).unwrap();
        assert_eq!(config.selected_fields.selected(), vec!["sales", "region"]);
        assert_eq!(config.chart_type, ChartType::Line);
        assert_eq!(config.axis_labels.y, "Revenue");
        assert!(config.display_options.show_values_on_bars);
        assert_eq!(config.series_formats["sales"], "currency:2");
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = ChartConfig::from_json_str("{}").unwrap();
        assert!(config.selected_fields.is_empty());
        assert_eq!(config.chart_type, ChartType::Bar);
    }

    #[test]
    fn test_selection_array_form() {
        let config = ChartConfig::from_json_str(r#"{"selectedFields": ["b", "a"]}"#).unwrap();
        assert_eq!(config.selected_fields.selected(), vec!["b", "a"]);
    }

    #[test]
    fn test_selection_rejects_numbers() {
        assert!(ChartConfig::from_json_str(r#"{"selectedFields": 3}"#).is_err());
    }

    #[test]
    fn test_full_replace_roundtrip_keeps_order() {
        let mut config = ChartConfig::default();
        config.selected_fields.set("zeta", true);
        config.selected_fields.set("alpha", false);
        config.selected_fields.set("mid", true);
        let json = config.to_json_string().unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());
        let back = ChartConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_pipeline_defaults() {
        let options: PipelineOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PipelineOptions::default());
        assert_eq!(options.separate_scale_ratio, 20.0);
        assert_eq!(options.sample_depth, 3);
    }
}
