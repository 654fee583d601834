//! # Domain Filter
//!
//! A 1-D range: `field` between `begin` and `end`, bounds inclusive.

use serde_json::Value;

use super::bounds::bound;
use super::{
    Clause, Filter, Substitution, clauses_config, cross_match, identified, parse_field,
    parse_header,
};
use crate::config::{CompoundType, FilterConfig, Operator, SimpleFilterConfig};
use crate::ids::IdGenerator;
use crate::source::FieldKey;
use crate::values::{DomainValues, FilterValues};

/// 1-D range over one field.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainFilter {
    /// Filtered field.
    pub field: FieldKey,

    /// Lower bound.
    pub begin: Value,

    /// Upper bound.
    pub end: Value,
}

impl DomainFilter {
    /// Create a domain filter.
    #[must_use]
    pub const fn new(field: FieldKey, begin: Value, end: Value) -> Self {
        Self { field, begin, end }
    }

    // Two clauses, `>=` and `<=`, on one field.
    pub(super) fn from_clauses(clauses: &[&SimpleFilterConfig]) -> Option<Self> {
        if clauses.len() != 2 {
            return None;
        }
        let field = clauses[0].field_key();
        if clauses[1].field_key() != field {
            return None;
        }

        Some(Self {
            begin: bound(clauses, &field, Operator::Ge)?,
            end: bound(clauses, &field, Operator::Le)?,
            field,
        })
    }

    fn clauses(&self) -> [Clause<'_>; 2] {
        [
            Clause::new(&self.field, Operator::Ge, &self.begin),
            Clause::new(&self.field, Operator::Le, &self.end),
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
        let [field] = substitution.apply([&self.field])?;
        Some(Self {
            field,
            ..self.clone()
        })
    }

    pub(super) fn retrieve_values(&self) -> FilterValues {
        FilterValues::Domain(DomainValues {
            begin: self.begin.clone(),
            end: self.end.clone(),
            field: self.field.clone(),
        })
    }

    pub(super) fn to_config(&self) -> FilterConfig {
        clauses_config(CompoundType::And, &self.clauses())
    }

    pub(super) fn extend_data_list(&self, list: &mut Vec<Value>) {
        list.push(Value::String(self.field.to_string()));
        list.push(self.begin.clone());
        list.push(self.end.clone());
    }

    // `["domain", id, relations, fieldKey, begin, end]`
    pub(super) fn parse(list: &[Value], ids: &mut dyn IdGenerator) -> Option<Filter> {
        let (id, relations) = parse_header(list, "domain", 6)?;
        let filter = Self {
            field: parse_field(&list[3])?,
            begin: list[4].clone(),
            end: list[5].clone(),
        };
        Some(identified(id, relations, filter, ids))
    }
}
