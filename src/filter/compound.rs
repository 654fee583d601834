//! # Compound Filter
//!
//! AND/OR of arbitrarily nested filters.

use serde_json::Value;

use super::{Filter, identified, parse_header, parse_type};
use crate::config::{CompoundFilterConfig, CompoundType, FilterConfig};
use crate::ids::IdGenerator;
use crate::source::{FieldKey, data_sources_from_config};
use crate::values::{CompoundValues, FilterValues};

/// Nested filters.
#[derive(Clone, Debug, PartialEq)]
pub struct CompoundFilter {
    /// How nested filters are combined.
    pub kind: CompoundType,

    /// Nested filters.
    pub filters: Vec<Filter>,
}

impl CompoundFilter {
    /// Create a compound filter.
    #[must_use]
    pub const fn new(kind: CompoundType, filters: Vec<Filter>) -> Self {
        Self { kind, filters }
    }

    // A config spanning several data sources must pair off one-to-one with
    // the nested filters (in any order). A config on a single data source is
    // a variable-length group: each nested config need only match some
    // nested filter.
    pub(super) fn is_compatible_with_config(&self, config: &FilterConfig) -> bool {
        let Some(compound) = config.as_compound() else {
            return false;
        };
        if compound.kind != self.kind {
            return false;
        }

        let forward = compound
            .filters
            .iter()
            .all(|nested| self.filters.iter().any(|f| f.is_compatible_with_config(nested)));

        if data_sources_from_config(config, false).len() > 1 {
            compound.filters.len() == self.filters.len()
                && forward
                && self.filters.iter().all(|f| {
                    compound.filters.iter().any(|nested| f.is_compatible_with_config(nested))
                })
        } else {
            forward
        }
    }

    pub(super) fn is_equivalent(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.filters.len() == other.filters.len()
            && covers(&self.filters, &other.filters)
            && covers(&other.filters, &self.filters)
    }

    pub(super) fn substitute(
        &self, equivalent: &[FieldKey], substitute: &[FieldKey], ids: &mut dyn IdGenerator,
    ) -> Option<Self> {
        let mut substituted = false;
        let mut filters = Vec::with_capacity(self.filters.len());

        for nested in &self.filters {
            if let Some(relation) = nested.create_relation_filter(equivalent, substitute, ids) {
                substituted = true;
                filters.push(relation);
            } else {
                filters.push(nested.clone());
            }
        }

        substituted.then_some(Self {
            kind: self.kind,
            filters,
        })
    }

    pub(super) fn retrieve_values(&self) -> FilterValues {
        FilterValues::Compound(CompoundValues {
            kind: self.kind,
            nested: self.filters.iter().map(Filter::retrieve_values).collect(),
        })
    }

    pub(super) fn to_config(&self) -> FilterConfig {
        CompoundFilterConfig::new(self.kind, self.filters.iter().map(Filter::to_config).collect())
            .into()
    }

    pub(super) fn extend_data_list(&self, list: &mut Vec<Value>) {
        list.push(self.filters.iter().map(|f| Value::Array(f.to_data_list())).collect());
    }

    // `["and" | "or", id, relations, [nested data lists]]`
    pub(super) fn parse(list: &[Value], ids: &mut dyn IdGenerator) -> Option<Filter> {
        let kind = parse_type(list.first()?)?;
        let (id, relations) = parse_header(list, &kind.to_string(), 4)?;

        let mut filters = Vec::new();
        for nested in list[3].as_array()? {
            filters.push(Filter::from_data_list(nested.as_array()?, ids)?);
        }
        Some(identified(id, relations, Self { kind, filters }, ids))
    }
}

// Every filter in `a` has an equivalent in `b`.
fn covers(a: &[Filter], b: &[Filter]) -> bool {
    a.iter().all(|x| b.iter().any(|y| x.is_equivalent_to_filter(y)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::{Operator, SimpleFilterConfig};
    use crate::filter::{FilterKind, ListFilter};
    use crate::ids::CounterIds;

    fn key(field: &str) -> FieldKey {
        FieldKey::new("es", "db", "table", field)
    }

    fn clause(field: &str, operator: Operator, value: i64) -> FilterConfig {
        SimpleFilterConfig::new(&key(field), operator).value(value).into()
    }

    fn nested(ids: &mut CounterIds, field: &str, operator: Operator, value: i64) -> Filter {
        let list = ListFilter::new(CompoundType::Or, key(field), operator, vec![json!(value)]);
        Filter::new(list, ids)
    }

    #[test]
    fn multi_source_cross_match() {
        let mut ids = CounterIds::new();
        let filter = CompoundFilter::new(
            CompoundType::And,
            vec![
                nested(&mut ids, "x", Operator::Gt, -100),
                nested(&mut ids, "x", Operator::Lt, 100),
            ],
        );

        let reversed: FilterConfig = CompoundFilterConfig::new(
            CompoundType::And,
            vec![clause("x", Operator::Lt, 100), clause("x", Operator::Gt, -100)],
        )
        .into();
        assert!(filter.is_compatible_with_config(&reversed));

        let different: FilterConfig = CompoundFilterConfig::new(
            CompoundType::And,
            vec![clause("x", Operator::Lt, 100), clause("x", Operator::Ge, -100)],
        )
        .into();
        assert!(!filter.is_compatible_with_config(&different));

        let partial: FilterConfig = CompoundFilterConfig::new(
            CompoundType::And,
            vec![clause("x", Operator::Lt, 100), clause("y", Operator::Gt, 1)],
        )
        .into();
        assert!(!filter.is_compatible_with_config(&partial));
    }

    #[test]
    fn single_source_forward_match() {
        let mut ids = CounterIds::new();
        let filter = CompoundFilter::new(
            CompoundType::Or,
            vec![
                nested(&mut ids, "x", Operator::Eq, 1),
                nested(&mut ids, "x", Operator::Eq, 2),
                nested(&mut ids, "x", Operator::Eq, 3),
            ],
        );

        let shorter: FilterConfig = CompoundFilterConfig::new(
            CompoundType::Or,
            vec![clause("x", Operator::Eq, 3), clause("x", Operator::Eq, 1)],
        )
        .into();
        assert!(filter.is_compatible_with_config(&shorter));

        let missing: FilterConfig = CompoundFilterConfig::new(
            CompoundType::Or,
            vec![clause("x", Operator::Eq, 4)],
        )
        .into();
        assert!(!filter.is_compatible_with_config(&missing));
    }

    #[test]
    fn partial_substitution() {
        let mut ids = CounterIds::new();
        let filter = Filter::new(
            CompoundFilter::new(
                CompoundType::Or,
                vec![
                    nested(&mut ids, "x", Operator::Eq, 1),
                    nested(&mut ids, "y", Operator::Eq, 2),
                ],
            ),
            &mut ids,
        );

        let relation = filter
            .create_relation_filter(&[key("x")], &[key("z")], &mut ids)
            .expect("should substitute one branch");
        let FilterKind::Compound(compound) = relation.kind() else {
            panic!("should be compound");
        };
        assert_eq!(compound.filters[0].fields(), vec![&key("z")]);
        assert_eq!(compound.filters[1], filter_nested(&filter, 1));

        assert!(filter.create_relation_filter(&[key("w")], &[key("z")], &mut ids).is_none());
    }

    fn filter_nested(filter: &Filter, index: usize) -> Filter {
        let FilterKind::Compound(compound) = filter.kind() else {
            panic!("should be compound");
        };
        compound.filters[index].clone()
    }
}
