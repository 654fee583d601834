//! # List Filter
//!
//! One field and one operator applied to any number of values, joined by
//! AND or OR.

use std::cmp::Ordering;

use serde_json::Value;

use super::{
    Filter, Substitution, identified, parse_field, parse_header, parse_operator, parse_relations,
    parse_type,
};
use crate::config::{CompoundFilterConfig, CompoundType, FilterConfig, Operator, SimpleFilterConfig};
use crate::ids::IdGenerator;
use crate::source::FieldKey;
use crate::values::{FilterValues, ListOfValues};

/// One field, one operator, many values.
#[derive(Clone, Debug, PartialEq)]
pub struct ListFilter {
    /// How values are combined.
    pub kind: CompoundType,

    /// Filtered field.
    pub field: FieldKey,

    /// Operator applied to each value.
    pub operator: Operator,

    /// Filter values. Falsey values (`0`, `""`, `false`, `null`) are values
    /// like any other.
    pub values: Vec<Value>,
}

impl ListFilter {
    /// Create a list filter.
    #[must_use]
    pub const fn new(
        kind: CompoundType, field: FieldKey, operator: Operator, values: Vec<Value>,
    ) -> Self {
        Self {
            kind,
            field,
            operator,
            values,
        }
    }

    pub(super) fn from_simple(simple: &SimpleFilterConfig) -> Self {
        Self {
            kind: CompoundType::Or,
            field: simple.field_key(),
            operator: simple.operator,
            values: simple.value.iter().cloned().collect(),
        }
    }

    // Clauses sharing one field and operator form a list.
    pub(super) fn from_clauses(
        kind: CompoundType, clauses: &[&SimpleFilterConfig],
    ) -> Option<Self> {
        let first = clauses.first()?;
        let shared = |clause: &&SimpleFilterConfig| {
            first.operator == clause.operator && is_same_field(first, clause)
        };
        if !clauses.iter().all(shared) {
            return None;
        }

        Some(Self {
            kind,
            field: first.field_key(),
            operator: first.operator,
            values: clauses.iter().filter_map(|clause| clause.value.clone()).collect(),
        })
    }

    fn matches_clause(&self, clause: &SimpleFilterConfig) -> bool {
        clause.operator == self.operator
            && clause.datastore == self.field.datastore
            && clause.database == self.field.database
            && clause.table == self.field.table
            && clause.field == self.field.field
    }

    pub(super) fn is_compatible_with_config(&self, config: &FilterConfig) -> bool {
        match config {
            FilterConfig::Simple(simple) => {
                self.matches_clause(simple)
                    && simple
                        .value
                        .as_ref()
                        .is_none_or(|value| self.values.len() == 1 && &self.values[0] == value)
            }
            FilterConfig::Compound(compound) => {
                if compound.kind != self.kind || compound.filters.is_empty() {
                    return false;
                }
                let clauses: Option<Vec<&SimpleFilterConfig>> =
                    compound.filters.iter().map(FilterConfig::as_simple).collect();
                let Some(clauses) = clauses else {
                    return false;
                };
                if !clauses.iter().all(|clause| self.matches_clause(clause)) {
                    return false;
                }

                // unset values match any values
                let defined: Vec<&Value> =
                    clauses.iter().filter_map(|clause| clause.value.as_ref()).collect();
                if defined.is_empty() {
                    return true;
                }
                defined.len() == self.values.len()
                    && defined.iter().all(|value| self.values.contains(value))
                    && self.values.iter().all(|value| defined.contains(&value))
            }
        }
    }

    pub(super) fn is_equivalent(&self, other: &Self) -> bool {
        if self.field != other.field || self.operator != other.operator {
            return false;
        }
        // the join type is meaningless for fewer than two values
        if self.kind != other.kind && (self.values.len() > 1 || other.values.len() > 1) {
            return false;
        }
        self.values.len() == other.values.len() && sorted(&self.values) == sorted(&other.values)
    }

    pub(super) fn substitute(&self, substitution: &Substitution) -> Option<Self> {
        let [field] = substitution.apply([&self.field])?;
        Some(Self {
            field,
            ..self.clone()
        })
    }

    pub(super) fn retrieve_values(&self) -> FilterValues {
        FilterValues::List(ListOfValues {
            kind: self.kind,
            field: self.field.clone(),
            operator: self.operator,
            values: self.values.clone(),
        })
    }

    pub(super) fn to_config(&self) -> FilterConfig {
        let clause = SimpleFilterConfig::new(&self.field, self.operator);
        match self.values.as_slice() {
            [] => clause.into(),
            [value] => clause.value(value.clone()).into(),
            values => CompoundFilterConfig::new(
                self.kind,
                values.iter().map(|value| clause.clone().value(value.clone()).into()).collect(),
            )
            .into(),
        }
    }

    pub(super) fn extend_data_list(&self, list: &mut Vec<Value>) {
        list.push(Value::String(self.kind.to_string()));
        list.push(Value::String(self.field.to_string()));
        list.push(Value::String(self.operator.to_string()));
        list.push(Value::Array(self.values.clone()));
    }

    // `["list", id, relations, type, fieldKey, operator, [values]]` or the
    // legacy `[id, relations, fieldKey, operator, value]`.
    pub(super) fn parse(list: &[Value], ids: &mut dyn IdGenerator) -> Option<Filter> {
        if let Some((id, relations)) = parse_header(list, "list", 7) {
            let filter = Self {
                kind: parse_type(&list[3])?,
                field: parse_field(&list[4])?,
                operator: parse_operator(&list[5])?,
                values: list[6].as_array()?.clone(),
            };
            return Some(identified(id, relations, filter, ids));
        }

        if list.len() != 5 || !list[0].is_string() {
            return None;
        }
        let filter = Self {
            kind: CompoundType::Or,
            field: parse_field(&list[2])?,
            operator: parse_operator(&list[3])?,
            values: vec![list[4].clone()],
        };
        Some(identified(list[0].as_str(), parse_relations(&list[1])?, filter, ids))
    }
}

fn is_same_field(a: &SimpleFilterConfig, b: &SimpleFilterConfig) -> bool {
    a.datastore == b.datastore
        && a.database == b.database
        && a.table == b.table
        && a.field == b.field
}

fn sorted(values: &[Value]) -> Vec<&Value> {
    let mut sorted: Vec<&Value> = values.iter().collect();
    sorted.sort_by(|a, b| compare_values(a, b));
    sorted
}

// Total order over JSON values: null < bool < number < string < array < object.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    const fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal)
            .then_with(|| x.to_string().cmp(&y.to_string())),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ if rank(a) == rank(b) => a.to_string().cmp(&b.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ids::CounterIds;

    fn key() -> FieldKey {
        FieldKey::new("es", "db", "table", "name")
    }

    fn list(values: Vec<Value>) -> ListFilter {
        ListFilter::new(CompoundType::Or, key(), Operator::Eq, values)
    }

    fn eq(value: Option<Value>) -> FilterConfig {
        let mut config = SimpleFilterConfig::new(&key(), Operator::Eq);
        config.value = value;
        config.into()
    }

    #[test]
    fn equivalent_ignores_order() {
        let a = list(vec![json!("a"), json!("b"), json!(1)]);
        let b = list(vec![json!(1), json!("b"), json!("a")]);
        assert!(a.is_equivalent(&b));

        let c = list(vec![json!(1), json!("b"), json!("c")]);
        assert!(!a.is_equivalent(&c));

        let mut d = b;
        d.kind = CompoundType::And;
        assert!(!a.is_equivalent(&d));
    }

    #[test]
    fn falsey_values_kept() {
        let mut ids = CounterIds::new();
        for value in [json!(0), json!(""), json!(false), Value::Null] {
            let filter = Filter::from_config(&eq(Some(value.clone())), &mut ids);
            let values = filter.retrieve_values();
            assert_eq!(values.as_list().expect("should be list").values, vec![value]);
        }
    }

    #[test]
    fn falsey_values_distinct() {
        let zero = list(vec![json!(0)]);
        assert!(zero.is_compatible_with_config(&eq(Some(json!(0)))));
        assert!(!zero.is_compatible_with_config(&eq(Some(json!(false)))));
        assert!(!zero.is_compatible_with_config(&eq(Some(json!("")))));
        assert!(!zero.is_compatible_with_config(&eq(Some(Value::Null))));

        let empty = list(vec![json!("")]);
        assert!(!empty.is_compatible_with_config(&eq(Some(Value::Null))));
        assert!(!list(vec![json!(false)]).is_equivalent(&zero));
    }

    #[test]
    fn blank_matches() {
        assert!(list(vec![]).is_compatible_with_config(&eq(None)));
        assert!(list(vec![json!("a"), json!("b")]).is_compatible_with_config(&eq(None)));
        assert!(!list(vec![]).is_compatible_with_config(&eq(Some(json!("a")))));
    }

    #[test]
    fn compound_config_compatible() {
        let filter = list(vec![json!("a"), json!("b")]);

        let values = vec![eq(Some(json!("b"))), eq(Some(json!("a")))];
        let reversed: FilterConfig = CompoundFilterConfig::new(CompoundType::Or, values).into();
        assert!(filter.is_compatible_with_config(&reversed));

        let blank: FilterConfig =
            CompoundFilterConfig::new(CompoundType::Or, vec![eq(None)]).into();
        assert!(filter.is_compatible_with_config(&blank));

        let values = vec![eq(Some(json!("a"))), eq(Some(json!("c")))];
        let other: FilterConfig = CompoundFilterConfig::new(CompoundType::Or, values).into();
        assert!(!filter.is_compatible_with_config(&other));

        let values = vec![eq(Some(json!("a"))), eq(Some(json!("b")))];
        let and: FilterConfig = CompoundFilterConfig::new(CompoundType::And, values).into();
        assert!(!filter.is_compatible_with_config(&and));
    }

    #[test]
    fn substitute_field() {
        let substitute = FieldKey::new("es", "db", "other", "name");
        let equivalent = [key()];
        let substitutes = [substitute.clone()];
        let substitution =
            Substitution::new(&equivalent, &substitutes).expect("should create substitution");

        let filter = list(vec![json!("a")]).substitute(&substitution).expect("should substitute");
        assert_eq!(filter.field, substitute);
        assert_eq!(filter.values, vec![json!("a")]);

        let wrong = [FieldKey::new("es", "db", "table", "other"), key()];
        let substitutes = [substitute.clone(), substitute];
        let substitution =
            Substitution::new(&wrong, &substitutes).expect("should create substitution");
        assert!(list(vec![json!("a")]).substitute(&substitution).is_none());
    }

    #[test]
    fn value_order() {
        let values = [json!("b"), json!(2), Value::Null, json!(true), json!(1.5), json!("a")];
        let sorted: Vec<Value> = sorted(&values).into_iter().cloned().collect();
        let expected = [Value::Null, json!(true), json!(1.5), json!(2), json!("a"), json!("b")];
        assert_eq!(sorted, expected);
    }
}
