//! # Filter Values
//!
//! Typed views of the values held by a filter. Widgets read current filter
//! state through these rather than by inspecting filter internals.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{CompoundType, Operator};
use crate::source::FieldKey;

/// Values held by a filter (or declared by a config).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterValues {
    /// A single clause.
    One(OneValue),

    /// One field and operator with many values.
    List(ListOfValues),

    /// A 2-D box.
    Bounds(BoundsValues),

    /// A 1-D range.
    Domain(DomainValues),

    /// Two independent clauses.
    Pair(PairOfValues),

    /// Nested values.
    Compound(CompoundValues),
}

impl FilterValues {
    /// Return the list values, if set.
    #[must_use]
    pub const fn as_list(&self) -> Option<&ListOfValues> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// Return the bounds values, if set.
    #[must_use]
    pub const fn as_bounds(&self) -> Option<&BoundsValues> {
        match self {
            Self::Bounds(bounds) => Some(bounds),
            _ => None,
        }
    }

    /// Return the domain values, if set.
    #[must_use]
    pub const fn as_domain(&self) -> Option<&DomainValues> {
        match self {
            Self::Domain(domain) => Some(domain),
            _ => None,
        }
    }

    /// Return the pair values, if set.
    #[must_use]
    pub const fn as_pair(&self) -> Option<&PairOfValues> {
        match self {
            Self::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Return the compound values, if set.
    #[must_use]
    pub const fn as_compound(&self) -> Option<&CompoundValues> {
        match self {
            Self::Compound(compound) => Some(compound),
            _ => None,
        }
    }
}

/// A single clause. `value` is unset when the clause matches any value.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct OneValue {
    /// Filtered field.
    pub field: FieldKey,

    /// Clause operator.
    pub operator: Operator,

    /// Clause value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Values of a list filter.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ListOfValues {
    /// How values are combined.
    #[serde(rename = "type")]
    pub kind: CompoundType,

    /// Filtered field.
    pub field: FieldKey,

    /// Operator applied to each value.
    pub operator: Operator,

    /// Filter values.
    pub values: Vec<Value>,
}

/// Values of a bounds filter.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BoundsValues {
    /// Lower bound of the first field.
    pub begin1: Value,

    /// Lower bound of the second field.
    pub begin2: Value,

    /// Upper bound of the first field.
    pub end1: Value,

    /// Upper bound of the second field.
    pub end2: Value,

    /// First field.
    pub field1: FieldKey,

    /// Second field.
    pub field2: FieldKey,
}

/// Values of a domain filter.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DomainValues {
    /// Lower bound.
    pub begin: Value,

    /// Upper bound.
    pub end: Value,

    /// Filtered field.
    pub field: FieldKey,
}

/// Values of a pair filter.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PairOfValues {
    /// How the two clauses are combined.
    #[serde(rename = "type")]
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

/// Values of a compound filter.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CompoundValues {
    /// How nested values are combined.
    #[serde(rename = "type")]
    pub kind: CompoundType,

    /// Nested values.
    pub nested: Vec<FilterValues>,
}
