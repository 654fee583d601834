//! # Filters
//!
//! Live, identity-bearing filters. A [`Filter`] pairs an id and the ids of
//! its relation siblings with one of five filter kinds:
//!
//! - [`ListFilter`]: one field and operator with any number of values.
//! - [`BoundsFilter`]: a 2-D box over two fields.
//! - [`DomainFilter`]: a 1-D range over one field.
//! - [`PairFilter`]: two independent clauses joined by AND/OR.
//! - [`CompoundFilter`]: AND/OR of nested filters.
//!
//! Filters are created from configs ([`Filter::from_config`]) or from their
//! compact data-list encoding ([`Filter::from_data_list`]), and convert back
//! to either form.

mod bounds;
mod compound;
mod domain;
mod label;
mod list;
mod pair;

use serde::Deserialize;
use serde_json::Value;

pub use self::bounds::BoundsFilter;
pub use self::compound::CompoundFilter;
pub use self::domain::DomainFilter;
pub use self::list::ListFilter;
pub use self::pair::PairFilter;
use crate::config::{
    CompoundFilterConfig, CompoundType, FilterConfig, Operator, SimpleFilterConfig,
};
use crate::ids::IdGenerator;
use crate::source::FieldKey;
use crate::values::FilterValues;
use crate::{Error, Result};

/// A live filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    id: String,
    relations: Vec<String>,
    kind: FilterKind,
}

/// The filter kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterKind {
    /// One field, one operator, many values.
    List(ListFilter),

    /// 2-D box.
    Bounds(BoundsFilter),

    /// 1-D range.
    Domain(DomainFilter),

    /// Two independent clauses.
    Pair(PairFilter),

    /// Nested filters.
    Compound(CompoundFilter),
}

impl From<ListFilter> for FilterKind {
    fn from(filter: ListFilter) -> Self {
        Self::List(filter)
    }
}

impl From<BoundsFilter> for FilterKind {
    fn from(filter: BoundsFilter) -> Self {
        Self::Bounds(filter)
    }
}

impl From<DomainFilter> for FilterKind {
    fn from(filter: DomainFilter) -> Self {
        Self::Domain(filter)
    }
}

impl From<PairFilter> for FilterKind {
    fn from(filter: PairFilter) -> Self {
        Self::Pair(filter)
    }
}

impl From<CompoundFilter> for FilterKind {
    fn from(filter: CompoundFilter) -> Self {
        Self::Compound(filter)
    }
}

impl Filter {
    /// Create a filter with a newly issued id.
    pub fn new(kind: impl Into<FilterKind>, ids: &mut dyn IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            relations: Vec::new(),
            kind: kind.into(),
        }
    }

    /// Create a filter with the given id. The id is not checked for
    /// uniqueness.
    pub fn with_id(id: impl Into<String>, kind: impl Into<FilterKind>) -> Self {
        Self {
            id: id.into(),
            relations: Vec::new(),
            kind: kind.into(),
        }
    }

    /// The filter's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ids of filters created together with this one through relations.
    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    /// The filter kind.
    #[must_use]
    pub const fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub(crate) fn set_relations(&mut self, relations: Vec<String>) {
        self.relations = relations;
    }

    /// Create a filter from a config.
    ///
    /// A simple config becomes a list filter. A compound config whose nested
    /// configs are all simple is recognised, in order, as a list filter (one
    /// field and operator), a domain filter (AND of `>=` and `<=` on one
    /// field), a bounds filter (AND of `>=` and `<=` on each of two fields) or
    /// a pair filter (any other two clauses). Everything else becomes a
    /// compound filter.
    ///
    /// The config's id is used when present, otherwise one is issued.
    pub fn from_config(config: &FilterConfig, ids: &mut dyn IdGenerator) -> Self {
        let id = assign_id(config.id(), ids);
        let kind = match config {
            FilterConfig::Simple(simple) => ListFilter::from_simple(simple).into(),
            FilterConfig::Compound(compound) => kind_from_compound(compound, ids),
        };

        Self {
            id,
            relations: config.relations().to_vec(),
            kind,
        }
    }

    /// Create a filter from its data-list encoding, trying list, bounds,
    /// domain, pair, and compound layouts in that order.
    ///
    /// Returns `None` (and logs a warning) when no layout matches.
    pub fn from_data_list(list: &[Value], ids: &mut dyn IdGenerator) -> Option<Self> {
        let filter = ListFilter::parse(list, ids)
            .or_else(|| BoundsFilter::parse(list, ids))
            .or_else(|| DomainFilter::parse(list, ids))
            .or_else(|| PairFilter::parse(list, ids))
            .or_else(|| CompoundFilter::parse(list, ids));

        if filter.is_none() {
            tracing::warn!(tag = ?list.first(), len = list.len(), "unrecognised filter data list");
        }
        filter
    }

    /// Create a filter from a JSON-encoded data list.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is not a JSON array. An array that is
    /// not a filter yields `Ok(None)`.
    pub fn from_data_list_json(json: &str, ids: &mut dyn IdGenerator) -> Result<Option<Self>> {
        let Value::Array(list) = serde_json::from_str(json)? else {
            return Err(Error::InvalidInput("filter data list must be an array".into()));
        };
        Ok(Self::from_data_list(&list, ids))
    }

    /// Every field the filter uses, including nested filters' fields.
    #[must_use]
    pub fn fields(&self) -> Vec<&FieldKey> {
        match &self.kind {
            FilterKind::List(list) => vec![&list.field],
            FilterKind::Bounds(bounds) => vec![&bounds.field1, &bounds.field2],
            FilterKind::Domain(domain) => vec![&domain.field],
            FilterKind::Pair(pair) => vec![&pair.field1, &pair.field2],
            FilterKind::Compound(compound) => {
                compound.filters.iter().flat_map(Self::fields).collect()
            }
        }
    }

    /// Whether the filter applies to searches on the given table.
    #[must_use]
    pub fn does_affect_search(&self, datastore: &str, database: &str, table: &str) -> bool {
        self.fields().iter().any(|key| key.is_in_table(datastore, database, table))
    }

    /// Whether the filter is described by the config. Config values that are
    /// unset match any filter value.
    #[must_use]
    pub fn is_compatible_with_config(&self, config: &FilterConfig) -> bool {
        match &self.kind {
            FilterKind::List(list) => list.is_compatible_with_config(config),
            FilterKind::Bounds(bounds) => bounds.is_compatible_with_config(config),
            FilterKind::Domain(domain) => domain.is_compatible_with_config(config),
            FilterKind::Pair(pair) => pair.is_compatible_with_config(config),
            FilterKind::Compound(compound) => compound.is_compatible_with_config(config),
        }
    }

    /// Whether both filters are of the same kind and filter on the same
    /// fields, operators, and values. Ids and relations are ignored.
    #[must_use]
    pub fn is_equivalent_to_filter(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (FilterKind::List(a), FilterKind::List(b)) => a.is_equivalent(b),
            (FilterKind::Bounds(a), FilterKind::Bounds(b)) => a.is_equivalent(b),
            (FilterKind::Domain(a), FilterKind::Domain(b)) => a.is_equivalent(b),
            (FilterKind::Pair(a), FilterKind::Pair(b)) => a.is_equivalent(b),
            (FilterKind::Compound(a), FilterKind::Compound(b)) => a.is_equivalent(b),
            _ => false,
        }
    }

    /// Create a copy of the filter with each of the `equivalent` fields
    /// replaced by the `substitute` field at the same position.
    ///
    /// Returns `None` when the key lists differ in length, do not cover
    /// exactly the filter's distinct fields, or a substitute key is missing
    /// its database, table, or field. A compound filter succeeds when at least
    /// one nested filter does, keeping the original of every nested filter
    /// that could not be substituted.
    pub fn create_relation_filter(
        &self, equivalent: &[FieldKey], substitute: &[FieldKey], ids: &mut dyn IdGenerator,
    ) -> Option<Self> {
        let substitution = Substitution::new(equivalent, substitute)?;
        let kind: FilterKind = match &self.kind {
            FilterKind::List(list) => list.substitute(&substitution)?.into(),
            FilterKind::Bounds(bounds) => bounds.substitute(&substitution)?.into(),
            FilterKind::Domain(domain) => domain.substitute(&substitution)?.into(),
            FilterKind::Pair(pair) => pair.substitute(&substitution)?.into(),
            FilterKind::Compound(compound) => {
                compound.substitute(equivalent, substitute, ids)?.into()
            }
        };
        Some(Self::new(kind, ids))
    }

    /// The filter's values.
    #[must_use]
    pub fn retrieve_values(&self) -> FilterValues {
        match &self.kind {
            FilterKind::List(list) => list.retrieve_values(),
            FilterKind::Bounds(bounds) => bounds.retrieve_values(),
            FilterKind::Domain(domain) => domain.retrieve_values(),
            FilterKind::Pair(pair) => pair.retrieve_values(),
            FilterKind::Compound(compound) => compound.retrieve_values(),
        }
    }

    /// The config describing the filter, carrying its id and relations.
    #[must_use]
    pub fn to_config(&self) -> FilterConfig {
        let mut config = match &self.kind {
            FilterKind::List(list) => list.to_config(),
            FilterKind::Bounds(bounds) => bounds.to_config(),
            FilterKind::Domain(domain) => domain.to_config(),
            FilterKind::Pair(pair) => pair.to_config(),
            FilterKind::Compound(compound) => compound.to_config(),
        };

        match &mut config {
            FilterConfig::Simple(simple) => {
                simple.id = Some(self.id.clone());
                simple.relations.clone_from(&self.relations);
            }
            FilterConfig::Compound(compound) => {
                compound.id = Some(self.id.clone());
                compound.relations.clone_from(&self.relations);
            }
        }
        config
    }

    /// The compact data-list encoding: `[tag, id, relations, ...fields]`.
    #[must_use]
    pub fn to_data_list(&self) -> Vec<Value> {
        let mut list = vec![
            Value::String(self.tag()),
            Value::String(self.id.clone()),
            self.relations.iter().cloned().map(Value::String).collect(),
        ];
        match &self.kind {
            FilterKind::List(list_filter) => list_filter.extend_data_list(&mut list),
            FilterKind::Bounds(bounds) => bounds.extend_data_list(&mut list),
            FilterKind::Domain(domain) => domain.extend_data_list(&mut list),
            FilterKind::Pair(pair) => pair.extend_data_list(&mut list),
            FilterKind::Compound(compound) => compound.extend_data_list(&mut list),
        }
        list
    }

    fn tag(&self) -> String {
        match &self.kind {
            FilterKind::List(_) => "list".into(),
            FilterKind::Bounds(_) => "bounds".into(),
            FilterKind::Domain(_) => "domain".into(),
            FilterKind::Pair(_) => "pair".into(),
            FilterKind::Compound(compound) => compound.kind.to_string(),
        }
    }
}

fn assign_id(id: Option<&str>, ids: &mut dyn IdGenerator) -> String {
    match id {
        Some(id) if !id.is_empty() => {
            ids.reserve(id);
            id.to_string()
        }
        _ => ids.next_id(),
    }
}

fn kind_from_compound(compound: &CompoundFilterConfig, ids: &mut dyn IdGenerator) -> FilterKind {
    let clauses: Option<Vec<&SimpleFilterConfig>> =
        compound.filters.iter().map(FilterConfig::as_simple).collect();

    if let Some(clauses) = clauses.filter(|c| !c.is_empty()) {
        if let Some(list) = ListFilter::from_clauses(compound.kind, &clauses) {
            return list.into();
        }
        if compound.kind == CompoundType::And {
            if let Some(domain) = DomainFilter::from_clauses(&clauses) {
                return domain.into();
            }
            if let Some(bounds) = BoundsFilter::from_clauses(&clauses) {
                return bounds.into();
            }
        }
        if let Some(pair) = PairFilter::from_clauses(compound.kind, &clauses) {
            return pair.into();
        }
    }

    CompoundFilter {
        kind: compound.kind,
        filters: compound.filters.iter().map(|nested| Filter::from_config(nested, ids)).collect(),
    }
    .into()
}

// Field substitution used to derive relation filters.
pub(crate) struct Substitution<'a> {
    equivalent: &'a [FieldKey],
    substitute: &'a [FieldKey],
}

impl<'a> Substitution<'a> {
    fn new(equivalent: &'a [FieldKey], substitute: &'a [FieldKey]) -> Option<Self> {
        if equivalent.len() != substitute.len() || !substitute.iter().all(FieldKey::is_complete) {
            return None;
        }
        Some(Self {
            equivalent,
            substitute,
        })
    }

    // Map each field to its substitute. The equivalent keys must cover exactly
    // the distinct fields given.
    fn apply<const N: usize>(&self, fields: [&FieldKey; N]) -> Option<[FieldKey; N]> {
        let mut distinct: Vec<&FieldKey> = Vec::with_capacity(N);
        for field in fields {
            if !distinct.contains(&field) {
                distinct.push(field);
            }
        }
        if distinct.len() != self.equivalent.len() {
            return None;
        }

        let mut mapped = Vec::with_capacity(N);
        for field in fields {
            let index = self.equivalent.iter().position(|key| key == field)?;
            mapped.push(self.substitute[index].clone());
        }
        mapped.try_into().ok()
    }
}

// A single field/operator/value clause of a multi-clause filter.
pub(crate) struct Clause<'a> {
    field: &'a FieldKey,
    operator: Operator,
    value: &'a Value,
}

impl<'a> Clause<'a> {
    pub(crate) const fn new(field: &'a FieldKey, operator: Operator, value: &'a Value) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }

    fn matches(&self, config: &FilterConfig) -> bool {
        let Some(simple) = config.as_simple() else {
            return false;
        };
        simple.datastore == self.field.datastore
            && simple.database == self.field.database
            && simple.table == self.field.table
            && simple.field == self.field.field
            && simple.operator == self.operator
            && simple.value.as_ref().is_none_or(|value| value == self.value)
    }

    fn to_config(&self) -> FilterConfig {
        SimpleFilterConfig::new(self.field, self.operator).value(self.value.clone()).into()
    }
}

// Each clause is matched by some config and each config by some clause.
pub(crate) fn cross_match(clauses: &[Clause], configs: &[FilterConfig]) -> bool {
    clauses.len() == configs.len()
        && configs.iter().all(|config| clauses.iter().any(|clause| clause.matches(config)))
        && clauses.iter().all(|clause| configs.iter().any(|config| clause.matches(config)))
}

pub(crate) fn clauses_config(kind: CompoundType, clauses: &[Clause]) -> FilterConfig {
    CompoundFilterConfig::new(kind, clauses.iter().map(Clause::to_config).collect()).into()
}

// Data-list helpers.

// Parses the `[tag, id, relations, ...]` header of a tagged data list.
pub(crate) fn parse_header<'a>(
    list: &'a [Value], tag: &str, len: usize,
) -> Option<(Option<&'a str>, Vec<String>)> {
    if list.len() != len || list[0].as_str() != Some(tag) {
        return None;
    }
    Some((list[1].as_str(), parse_relations(&list[2])?))
}

pub(crate) fn parse_relations(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().map(|id| id.as_str().map(String::from)).collect(),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

pub(crate) fn parse_field(value: &Value) -> Option<FieldKey> {
    value.as_str()?.parse().ok()
}

pub(crate) fn parse_operator(value: &Value) -> Option<Operator> {
    Operator::deserialize(value).ok()
}

pub(crate) fn parse_type(value: &Value) -> Option<CompoundType> {
    CompoundType::from_tag(value.as_str()?)
}

pub(crate) fn identified(
    id: Option<&str>, relations: Vec<String>, kind: impl Into<FilterKind>,
    ids: &mut dyn IdGenerator,
) -> Filter {
    Filter {
        id: assign_id(id, ids),
        relations,
        kind: kind.into(),
    }
}
