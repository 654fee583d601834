//! # Pair Filter
//!
//! Two independent field/operator/value clauses joined by AND or OR.

use serde_json::Value;

use super::{
    Clause, Filter, Substitution, clauses_config, cross_match, identified, parse_field,
    parse_header, parse_operator, parse_type,
};
use crate::config::{CompoundType, FilterConfig, Operator, SimpleFilterConfig};
use crate::ids::IdGenerator;
use crate::source::FieldKey;
use crate::values::{FilterValues, PairOfValues};

/// Two independent clauses.
#[derive(Clone, Debug, PartialEq)]
pub struct PairFilter {
    /// How the two clauses are combined.
    pub kind: CompoundType,

    /// First field.
    pub field1: FieldKey,

    /// Second field.
    pub field2: FieldKey,

    /// First operator.
    pub operator1: Operator,

    /// Second operator.
    pub operator2: Operator,

    /// First value.
    pub value1: Value,

    /// Second value.
    pub value2: Value,
}

impl PairFilter {
    /// Create a pair filter.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        kind: CompoundType, field1: FieldKey, field2: FieldKey, operator1: Operator,
        operator2: Operator, value1: Value, value2: Value,
    ) -> Self {
        Self {
            kind,
            field1,
            field2,
            operator1,
            operator2,
            value1,
            value2,
        }
    }

    pub(super) fn from_clauses(
        kind: CompoundType, clauses: &[&SimpleFilterConfig],
    ) -> Option<Self> {
        let [first, second] = clauses else {
            return None;
        };

        Some(Self {
            kind,
            field1: first.field_key(),
            field2: second.field_key(),
            operator1: first.operator,
            operator2: second.operator,
            value1: first.value.clone()?,
            value2: second.value.clone()?,
        })
    }

    fn clauses(&self) -> [Clause<'_>; 2] {
        [
            Clause::new(&self.field1, self.operator1, &self.value1),
            Clause::new(&self.field2, self.operator2, &self.value2),
        ]
    }

    pub(super) fn is_compatible_with_config(&self, config: &FilterConfig) -> bool {
        let Some(compound) = config.as_compound() else {
            return false;
        };
        compound.kind == self.kind && cross_match(&self.clauses(), &compound.filters)
    }

    pub(super) fn is_equivalent(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        let aligned = self.field1 == other.field1
            && self.operator1 == other.operator1
            && self.value1 == other.value1
            && self.field2 == other.field2
            && self.operator2 == other.operator2
            && self.value2 == other.value2;
        let crossed = self.field1 == other.field2
            && self.operator1 == other.operator2
            && self.value1 == other.value2
            && self.field2 == other.field1
            && self.operator2 == other.operator1
            && self.value2 == other.value1;
        aligned || crossed
    }

    pub(super) fn substitute(&self, substitution: &Substitution) -> Option<Self> {
        let [field1, field2] = substitution.apply([&self.field1, &self.field2])?;
        Some(Self {
            field1,
            field2,
            ..self.clone()
        })
    }

    pub(super) fn retrieve_values(&self) -> FilterValues {
        FilterValues::Pair(PairOfValues {
            kind: self.kind,
            field1: self.field1.clone(),
            field2: self.field2.clone(),
            operator1: self.operator1,
            operator2: self.operator2,
            value1: self.value1.clone(),
            value2: self.value2.clone(),
        })
    }

    pub(super) fn to_config(&self) -> FilterConfig {
        clauses_config(self.kind, &self.clauses())
    }

    pub(super) fn extend_data_list(&self, list: &mut Vec<Value>) {
        list.push(Value::String(self.kind.to_string()));
        list.push(Value::String(self.field1.to_string()));
        list.push(Value::String(self.field2.to_string()));
        list.push(Value::String(self.operator1.to_string()));
        list.push(Value::String(self.operator2.to_string()));
        list.push(self.value1.clone());
        list.push(self.value2.clone());
    }

    // `["pair", id, relations, type, fieldKey1, fieldKey2, operator1, operator2, value1, value2]`
    pub(super) fn parse(list: &[Value], ids: &mut dyn IdGenerator) -> Option<Filter> {
        let (id, relations) = parse_header(list, "pair", 10)?;
        let filter = Self {
            kind: parse_type(&list[3])?,
            field1: parse_field(&list[4])?,
            field2: parse_field(&list[5])?,
            operator1: parse_operator(&list[6])?,
            operator2: parse_operator(&list[7])?,
            value1: list[8].clone(),
            value2: list[9].clone(),
        };
        Some(identified(id, relations, filter, ids))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::CompoundFilterConfig;

    fn key() -> FieldKey {
        FieldKey::new("es", "db", "table", "x")
    }

    fn range() -> PairFilter {
        PairFilter::new(
            CompoundType::And,
            key(),
            key(),
            Operator::Gt,
            Operator::Lt,
            json!(-100),
            json!(100),
        )
    }

    fn config(first: (Operator, i64), second: (Operator, i64)) -> FilterConfig {
        CompoundFilterConfig::new(
            CompoundType::And,
            vec![
                SimpleFilterConfig::new(&key(), first.0).value(first.1).into(),
                SimpleFilterConfig::new(&key(), second.0).value(second.1).into(),
            ],
        )
        .into()
    }

    #[test]
    fn compatible_reversed() {
        let filter = range();
        let aligned = config((Operator::Gt, -100), (Operator::Lt, 100));
        assert!(filter.is_compatible_with_config(&aligned));
        let reversed = config((Operator::Lt, 100), (Operator::Gt, -100));
        assert!(filter.is_compatible_with_config(&reversed));
        let inclusive = config((Operator::Ge, -100), (Operator::Lt, 100));
        assert!(!filter.is_compatible_with_config(&inclusive));
    }

    #[test]
    fn equivalent_crossed() {
        let mut crossed = range();
        std::mem::swap(&mut crossed.operator1, &mut crossed.operator2);
        std::mem::swap(&mut crossed.value1, &mut crossed.value2);
        assert!(range().is_equivalent(&crossed));

        let mut or = range();
        or.kind = CompoundType::Or;
        assert!(!range().is_equivalent(&or));
    }

    #[test]
    fn single_field_substitution() {
        let other = FieldKey::new("es", "db", "other", "x");
        let equivalent = [key()];
        let substitute = [other.clone()];
        let substitution =
            Substitution::new(&equivalent, &substitute).expect("should create substitution");

        let filter = range().substitute(&substitution).expect("should substitute");
        assert_eq!(filter.field1, other);
        assert_eq!(filter.field2, other);
    }
}
