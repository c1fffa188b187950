use crate::data::{coerce_numeric, Row};
use crate::resolve::FieldResolver;
use serde_json::Value;

/// Split of the selected fields into the x-axis anchor and the plotted series.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRoles {
    pub category_field: String,
    pub value_fields: Vec<String>,
}

/// Assign roles to the selected fields.
///
/// The first field whose sampled values are not numeric anchors the categories;
/// every other field becomes a value field in selection order. When all fields
/// look numeric (or there are no rows) the first selected field is used as the
/// category. Returns `None` only when nothing is selected.
pub fn classify_fields(
    selected: &[String],
    rows: &[Row],
    resolver: &FieldResolver,
    sample_depth: usize,
) -> Option<FieldRoles> {
    let first = selected.first()?;

    let category_field = if rows.is_empty() {
        first.clone()
    } else {
        selected
            .iter()
            .find(|field| !is_numeric_field(field, rows, resolver, sample_depth))
            .unwrap_or(first)
            .clone()
    };

    let value_fields = selected
        .iter()
        .filter(|field| **field != category_field)
        .cloned()
        .collect();

    Some(FieldRoles {
        category_field,
        value_fields,
    })
}

/// A field is numeric when any of its first non-null samples reads as a number.
fn is_numeric_field(field: &str, rows: &[Row], resolver: &FieldResolver, sample_depth: usize) -> bool {
    rows.iter()
        .filter_map(|row| resolver.value(row, field))
        .filter(|value| !value.is_null())
        .take(sample_depth)
        .any(|value: &Value| coerce_numeric(value).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn classify(selected: &[&str], data: &[Row]) -> Option<FieldRoles> {
        let resolver = FieldResolver::from_rows(&[], data);
        classify_fields(&fields(selected), data, &resolver, 3)
    }

    #[test]
    fn test_text_column_becomes_category() {
        let data = rows(json!([{"region": "East", "sales": 100}, {"region": "West", "sales": 9000}]));
        let roles = classify(&["sales", "region"], &data).unwrap();
        assert_eq!(roles.category_field, "region");
        assert_eq!(roles.value_fields, vec!["sales"]);
    }

    #[test]
    fn test_numeric_strings_count_as_numeric() {
        let data = rows(json!([{"qty": "12", "name": "a"}]));
        let roles = classify(&["qty", "name"], &data).unwrap();
        assert_eq!(roles.category_field, "name");
    }

    #[test]
    fn test_all_numeric_falls_back_to_first() {
        let data = rows(json!([{"year": 2023, "sales": 1}, {"year": 2024, "sales": 2}]));
        let roles = classify(&["year", "sales"], &data).unwrap();
        assert_eq!(roles.category_field, "year");
        assert_eq!(roles.value_fields, vec!["sales"]);
    }

    #[test]
    fn test_zero_rows_takes_fallback() {
        let roles = classify(&["region", "sales"], &[]).unwrap();
        assert_eq!(roles.category_field, "region");
        assert_eq!(roles.value_fields, vec!["sales"]);
    }

    #[test]
    fn test_later_text_fields_stay_value_fields() {
        let data = rows(json!([{"a": "x", "b": 1, "c": "y"}]));
        let roles = classify(&["a", "b", "c"], &data).unwrap();
        assert_eq!(roles.category_field, "a");
        assert_eq!(roles.value_fields, vec!["b", "c"]);
    }

    #[test]
    fn test_nulls_are_skipped_when_sampling() {
        let data = rows(json!([
            {"label": null, "v": 1},
            {"label": null, "v": 2},
            {"label": null, "v": 3},
            {"label": "late", "v": 4}
        ]));
        let roles = classify(&["label", "v"], &data).unwrap();
        assert_eq!(roles.category_field, "label");
    }

    #[test]
    fn test_sampling_depth_limits_inspection() {
        let data = rows(json!([
            {"code": "A"}, {"code": "B"}, {"code": "C"}, {"code": "7"}
        ]));
        let resolver = FieldResolver::from_rows(&[], &data);
        let roles = classify_fields(&fields(&["code", "n"]), &data, &resolver, 3).unwrap();
        assert_eq!(roles.category_field, "code");
        let roles = classify_fields(&fields(&["code", "n"]), &data, &resolver, 4).unwrap();
        // "7" is within reach, so "code" reads as numeric and "n" (no samples) anchors.
        assert_eq!(roles.category_field, "n");
    }

    #[test]
    fn test_single_field_has_no_values() {
        let data = rows(json!([{"region": "East"}]));
        let roles = classify(&["region"], &data).unwrap();
        assert!(roles.value_fields.is_empty());
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(classify(&[], &[]), None);
    }

    #[test]
    fn test_fuzzy_field_names() {
        let data = rows(json!([{"REGION_NAME": "East", "total": 5}]));
        let roles = classify(&["region name", "total"], &data).unwrap();
        assert_eq!(roles.category_field, "region name");
    }
}
