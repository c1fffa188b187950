use crate::classify::FieldRoles;
use crate::data::{coerce_numeric, stringify_value, Row};
use crate::ir::Series;
use crate::resolve::FieldResolver;
use std::collections::BTreeMap;

/// Category labels with one aligned series per value field.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

pub fn build_series(
    rows: &[Row],
    roles: &FieldRoles,
    display_names: &BTreeMap<String, String>,
    resolver: &FieldResolver,
) -> SeriesSet {
    let categories = rows
        .iter()
        .map(|row| stringify_value(resolver.value(row, &roles.category_field)))
        .collect();

    let series = roles
        .value_fields
        .iter()
        .map(|field| {
            let data = rows
                .iter()
                .map(|row| {
                    // Missing or unparseable cells plot as zero.
                    resolver
                        .value(row, field)
                        .and_then(coerce_numeric)
                        .unwrap_or(0.0)
                })
                .collect();
            Series {
                name: display_names.get(field).cloned().unwrap_or_else(|| field.clone()),
                original_name: field.clone(),
                data,
            }
        })
        .collect();

    SeriesSet { categories, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn roles(category: &str, values: &[&str]) -> FieldRoles {
        FieldRoles {
            category_field: category.to_string(),
            value_fields: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_aligned_series() {
        let data = rows(json!([
            {"region": "East", "sales": 100, "profit": "2"},
            {"region": "West", "sales": 9000, "profit": "3"}
        ]));
        let resolver = FieldResolver::from_rows(&[], &data);
        let set = build_series(&data, &roles("region", &["sales", "profit"]), &BTreeMap::new(), &resolver);
        assert_eq!(set.categories, vec!["East", "West"]);
        assert_eq!(set.series.len(), 2);
        assert_eq!(set.series[0].data, vec![100.0, 9000.0]);
        assert_eq!(set.series[1].data, vec![2.0, 3.0]);
        for s in &set.series {
            assert_eq!(s.data.len(), set.categories.len());
        }
    }

    #[test]
    fn test_unparseable_and_missing_cells_are_zero() {
        let data = rows(json!([
            {"k": "a", "v": "n/a"},
            {"k": "b"},
            {"k": "c", "v": null},
            {"k": "d", "v": true}
        ]));
        let resolver = FieldResolver::from_rows(&[], &data);
        let set = build_series(&data, &roles("k", &["v"]), &BTreeMap::new(), &resolver);
        assert_eq!(set.series[0].data, vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_numeric_strings_must_be_whole_numbers() {
        let data = rows(json!([
            {"k": "a", "v": "100 units"},
            {"k": "b", "v": " 42.5 "},
            {"k": "c", "v": "1e3"},
            {"k": "d", "v": "$5"}
        ]));
        let resolver = FieldResolver::from_rows(&[], &data);
        let set = build_series(&data, &roles("k", &["v"]), &BTreeMap::new(), &resolver);
        assert_eq!(set.series[0].data, vec![0.0, 42.5, 1000.0, 0.0]);
    }

    #[test]
    fn test_missing_category_is_empty_label() {
        let data = rows(json!([{"v": 1}, {"k": 2020, "v": 2}]));
        let resolver = FieldResolver::from_rows(&[], &data);
        let set = build_series(&data, &roles("k", &["v"]), &BTreeMap::new(), &resolver);
        assert_eq!(set.categories, vec!["", "2020"]);
    }

    #[test]
    fn test_display_name_override() {
        let data = rows(json!([{"k": "a", "amt": 1}]));
        let resolver = FieldResolver::from_rows(&[], &data);
        let mut names = BTreeMap::new();
        names.insert("amt".to_string(), "Amount".to_string());
        let set = build_series(&data, &roles("k", &["amt"]), &names, &resolver);
        assert_eq!(set.series[0].name, "Amount");
        assert_eq!(set.series[0].original_name, "amt");
    }
}
