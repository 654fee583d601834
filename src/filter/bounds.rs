//! # Bounds Filter
//!
//! A 2-D box: `field1` between `begin1` and `end1` AND `field2` between
//! `begin2` and `end2`, bounds inclusive.

use serde_json::Value;

use super::{
    Clause, Filter, Substitution, clauses_config, cross_match, identified, parse_field,
    parse_header,
};
use crate::config::{CompoundType, FilterConfig, Operator, SimpleFilterConfig};
use crate::ids::IdGenerator;
use crate::source::FieldKey;
use crate::values::{BoundsValues, FilterValues};

/// 2-D box over two fields.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundsFilter {
    /// First field.
    pub field1: FieldKey,

    /// Second field.
    pub field2: FieldKey,

    /// Lower bound of the first field.
    pub begin1: Value,

    /// Lower bound of the second field.
    pub begin2: Value,

    /// Upper bound of the first field.
    pub end1: Value,

    /// Upper bound of the second field.
    pub end2: Value,
}

impl BoundsFilter {
    /// Create a bounds filter.
    #[must_use]
    pub const fn new(
        field1: FieldKey, field2: FieldKey, begin1: Value, begin2: Value, end1: Value,
        end2: Value,
    ) -> Self {
        Self {
            field1,
            field2,
            begin1,
            begin2,
            end1,
            end2,
        }
    }

    // Four clauses: `>=` and `<=` on each of two distinct fields.
    pub(super) fn from_clauses(clauses: &[&SimpleFilterConfig]) -> Option<Self> {
        if clauses.len() != 4 {
            return None;
        }
        let field1 = clauses[0].field_key();
        let field2 = clauses.iter().map(|c| c.field_key()).find(|field| *field != field1)?;
        if !clauses.iter().all(|c| c.field_key() == field1 || c.field_key() == field2) {
            return None;
        }

        Some(Self {
            begin1: bound(clauses, &field1, Operator::Ge)?,
            end1: bound(clauses, &field1, Operator::Le)?,
            begin2: bound(clauses, &field2, Operator::Ge)?,
            end2: bound(clauses, &field2, Operator::Le)?,
            field1,
            field2,
        })
    }

    fn clauses(&self) -> [Clause<'_>; 4] {
        [
            Clause::new(&self.field1, Operator::Ge, &self.begin1),
            Clause::new(&self.field1, Operator::Le, &self.end1),
            Clause::new(&self.field2, Operator::Ge, &self.begin2),
            Clause::new(&self.field2, Operator::Le, &self.end2),
        ]
    }

    pub(super) fn is_compatible_with_config(&self, config: &FilterConfig) -> bool {
        let Some(compound) = config.as_compound() else {
            return false;
        };
        compound.kind == CompoundType::And && cross_match(&self.clauses(), &compound.filters)
    }

    pub(super) fn is_equivalent(&self, other: &Self) -> bool {
        self == other
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
        FilterValues::Bounds(BoundsValues {
            begin1: self.begin1.clone(),
            begin2: self.begin2.clone(),
            end1: self.end1.clone(),
            end2: self.end2.clone(),
            field1: self.field1.clone(),
            field2: self.field2.clone(),
        })
    }

    pub(super) fn to_config(&self) -> FilterConfig {
        clauses_config(CompoundType::And, &self.clauses())
    }

    pub(super) fn extend_data_list(&self, list: &mut Vec<Value>) {
        list.push(Value::String(self.field1.to_string()));
        list.push(Value::String(self.field2.to_string()));
        list.push(self.begin1.clone());
        list.push(self.begin2.clone());
        list.push(self.end1.clone());
        list.push(self.end2.clone());
    }

    // `["bounds", id, relations, fieldKey1, fieldKey2, begin1, begin2, end1, end2]`
    pub(super) fn parse(list: &[Value], ids: &mut dyn IdGenerator) -> Option<Filter> {
        let (id, relations) = parse_header(list, "bounds", 9)?;
        let filter = Self {
            field1: parse_field(&list[3])?,
            field2: parse_field(&list[4])?,
            begin1: list[5].clone(),
            begin2: list[6].clone(),
            end1: list[7].clone(),
            end2: list[8].clone(),
        };
        Some(identified(id, relations, filter, ids))
    }
}

// The single value bounding `field` with `operator`.
pub(super) fn bound(
    clauses: &[&SimpleFilterConfig], field: &FieldKey, operator: Operator,
) -> Option<Value> {
    let mut matches = clauses.iter().filter(|c| c.operator == operator && c.field_key() == *field);
    let value = matches.next()?.value.clone()?;
    if matches.next().is_some() {
        return None;
    }
    Some(value)
}
