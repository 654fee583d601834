//! # Filter Labels
//!
//! Human-readable filter labels. Field names are looked up through the
//! [`Dataset`]; values are rendered as-is, with the empty string shown as
//! `<empty>`.

use serde_json::Value;

use super::{Filter, FilterKind};
use crate::config::CompoundType;
use crate::dataset::Dataset;
use crate::source::FieldKey;

// Abbreviated lists show this many values before summarising the rest.
const ABBREVIATED_VALUES: usize = 3;

impl Filter {
    /// Label for the field(s) the filter uses.
    ///
    /// Abbreviated labels use the field label only; full labels are
    /// `database / table / field`.
    pub fn label_for_field(&self, abbreviated: bool, dataset: &impl Dataset) -> String {
        match &self.kind {
            FilterKind::List(list) => field_label(&list.field, abbreviated, dataset),
            FilterKind::Domain(domain) => field_label(&domain.field, abbreviated, dataset),
            FilterKind::Bounds(bounds) => format!(
                "{} and {}",
                field_label(&bounds.field1, abbreviated, dataset),
                field_label(&bounds.field2, abbreviated, dataset)
            ),
            FilterKind::Pair(pair) if pair.field1 == pair.field2 => {
                field_label(&pair.field1, abbreviated, dataset)
            }
            FilterKind::Pair(pair) => format!(
                "{} {} {}",
                field_label(&pair.field1, abbreviated, dataset),
                pair.kind,
                field_label(&pair.field2, abbreviated, dataset)
            ),
            FilterKind::Compound(compound) => {
                let mut labels: Vec<String> = Vec::new();
                for nested in &compound.filters {
                    let label = nested.label_for_field(abbreviated, dataset);
                    if !labels.contains(&label) {
                        labels.push(label);
                    }
                }
                join(&labels, compound.kind, abbreviated)
            }
        }
    }

    /// Label for the filter's value(s).
    ///
    /// Abbreviated list labels show the first three values followed by
    /// `… N more`.
    #[must_use]
    pub fn label_for_value(&self, abbreviated: bool) -> String {
        match &self.kind {
            FilterKind::List(list) => {
                let labels: Vec<String> = list.values.iter().map(value_label).collect();
                join(&labels, list.kind, abbreviated)
            }
            FilterKind::Domain(domain) => {
                format!("{} to {}", value_label(&domain.begin), value_label(&domain.end))
            }
            FilterKind::Bounds(bounds) => format!(
                "({}, {}) to ({}, {})",
                value_label(&bounds.begin1),
                value_label(&bounds.begin2),
                value_label(&bounds.end1),
                value_label(&bounds.end2)
            ),
            FilterKind::Pair(pair) => format!(
                "{} {} {}",
                value_label(&pair.value1),
                pair.kind,
                value_label(&pair.value2)
            ),
            FilterKind::Compound(compound) => {
                let labels: Vec<String> =
                    compound.filters.iter().map(|f| f.label_for_value(abbreviated)).collect();
                join(&labels, compound.kind, abbreviated)
            }
        }
    }

    /// Full label: fields, operators, and values.
    pub fn label(&self, abbreviated: bool, dataset: &impl Dataset) -> String {
        match &self.kind {
            FilterKind::List(list) => format!(
                "{} {} {}",
                field_label(&list.field, abbreviated, dataset),
                list.operator,
                self.label_for_value(abbreviated)
            ),
            FilterKind::Domain(domain) => format!(
                "{} from {} to {}",
                field_label(&domain.field, abbreviated, dataset),
                value_label(&domain.begin),
                value_label(&domain.end)
            ),
            FilterKind::Bounds(bounds) => format!(
                "{} from {} to {} and {} from {} to {}",
                field_label(&bounds.field1, abbreviated, dataset),
                value_label(&bounds.begin1),
                value_label(&bounds.end1),
                field_label(&bounds.field2, abbreviated, dataset),
                value_label(&bounds.begin2),
                value_label(&bounds.end2)
            ),
            FilterKind::Pair(pair) => format!(
                "{} {} {} {} {} {} {}",
                field_label(&pair.field1, abbreviated, dataset),
                pair.operator1,
                value_label(&pair.value1),
                pair.kind,
                field_label(&pair.field2, abbreviated, dataset),
                pair.operator2,
                value_label(&pair.value2)
            ),
            FilterKind::Compound(compound) => {
                let labels: Vec<String> =
                    compound.filters.iter().map(|f| f.label(abbreviated, dataset)).collect();
                join(&labels, compound.kind, abbreviated)
            }
        }
    }
}

fn field_label(key: &FieldKey, abbreviated: bool, dataset: &impl Dataset) -> String {
    let field = dataset.field_label(key).unwrap_or_else(|| key.field.clone());
    if abbreviated {
        return field;
    }
    let table = dataset
        .table_label(&key.datastore, &key.database, &key.table)
        .unwrap_or_else(|| key.table.clone());
    format!("{} / {table} / {field}", key.database)
}

fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "<empty>".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join(labels: &[String], kind: CompoundType, abbreviated: bool) -> String {
    let separator = format!(" {kind} ");
    if abbreviated && labels.len() > ABBREVIATED_VALUES {
        let shown = labels[..ABBREVIATED_VALUES].join(&separator);
        return format!("{shown} … {} more", labels.len() - ABBREVIATED_VALUES);
    }
    labels.join(&separator)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Operator;
    use crate::dataset::StaticDataset;
    use crate::filter::{DomainFilter, ListFilter, PairFilter};

    fn key(field: &str) -> FieldKey {
        FieldKey::new("es", "db", "table", field)
    }

    fn dataset() -> StaticDataset {
        StaticDataset::new().label(&key("name"), "Name").table("es", "db", "table", "People")
    }

    #[test]
    fn list_label() {
        let values = vec![json!("a"), json!("")];
        let list = ListFilter::new(CompoundType::Or, key("name"), Operator::Eq, values);
        let filter = Filter::with_id("id1", list);
        assert_eq!(filter.label(true, &dataset()), "Name = a or <empty>");
        assert_eq!(filter.label_for_field(false, &dataset()), "db / People / Name");
        assert_eq!(filter.label_for_field(true, &StaticDataset::new()), "name");
    }

    #[test]
    fn abbreviated_values() {
        let values = vec![json!(1), json!(2), json!(3), json!(4), json!(5)];
        let list = ListFilter::new(CompoundType::And, key("n"), Operator::Ne, values);
        let filter = Filter::with_id("id1", list);

        assert_eq!(filter.label_for_value(true), "1 and 2 and 3 … 2 more");
        assert_eq!(filter.label_for_value(false), "1 and 2 and 3 and 4 and 5");
    }

    #[test]
    fn range_labels() {
        let domain = Filter::with_id("id1", DomainFilter::new(key("n"), json!(1), json!(9)));
        assert_eq!(domain.label(true, &dataset()), "n from 1 to 9");

        let pair = Filter::with_id(
            "id2",
            PairFilter::new(
                CompoundType::And,
                key("n"),
                key("n"),
                Operator::Gt,
                Operator::Lt,
                json!(-100),
                json!(100),
            ),
        );
        assert_eq!(pair.label(true, &dataset()), "n > -100 and n < 100");
        assert_eq!(pair.label_for_field(true, &dataset()), "n");
    }
}
