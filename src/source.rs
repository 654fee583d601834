//! # Filter Data Sources
//!
//! A [`FilterDataSource`] is the address a filter targets: the field
//! (datastore, database, table, field) plus an optional operator. Lists of
//! data sources are the keys filters are stored under, and are compared as
//! multisets rather than sequences.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{FilterConfig, Operator};
use crate::{Error, Result};

/// A fully qualified dataset field.
///
/// The string form is `datastore.database.table.field`. Only the first three
/// dots are separators so nested field names (`user.address.city`) survive a
/// round trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldKey {
    /// Datastore name.
    pub datastore: String,

    /// Database name.
    pub database: String,

    /// Table name.
    pub table: String,

    /// Field name.
    pub field: String,
}

impl FieldKey {
    /// Create a new field key.
    #[must_use]
    pub fn new(
        datastore: impl Into<String>, database: impl Into<String>, table: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            datastore: datastore.into(),
            database: database.into(),
            table: table.into(),
            field: field.into(),
        }
    }

    /// Whether the key names a database, table, and field. A key missing any
    /// of these cannot be substituted into a relation filter.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.database.is_empty() && !self.table.is_empty() && !self.field.is_empty()
    }

    /// Whether the field belongs to the given table.
    #[must_use]
    pub fn is_in_table(&self, datastore: &str, database: &str, table: &str) -> bool {
        self.datastore == datastore && self.database == database && self.table == table
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.datastore, self.database, self.table, self.field)
    }
}

impl FromStr for FieldKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(4, '.');
        let (Some(datastore), Some(database), Some(table), Some(field)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidFieldKey(format!(
                "field key {s} must have the form datastore.database.table.field"
            )));
        };
        Ok(Self::new(datastore, database, table, field))
    }
}

impl TryFrom<String> for FieldKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.to_string()
    }
}

/// The addressable key of a filter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct FilterDataSource {
    /// Datastore name.
    pub datastore: String,

    /// Database name.
    pub database: String,

    /// Table name.
    pub table: String,

    /// Field name.
    pub field: String,

    /// Filter operator, if significant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
}

impl FilterDataSource {
    /// Create a data source for the field and (optional) operator.
    #[must_use]
    pub fn new(key: &FieldKey, operator: Option<Operator>) -> Self {
        Self {
            datastore: key.datastore.clone(),
            database: key.database.clone(),
            table: key.table.clone(),
            field: key.field.clone(),
            operator,
        }
    }

    /// The field the data source addresses.
    #[must_use]
    pub fn field_key(&self) -> FieldKey {
        FieldKey::new(&self.datastore, &self.database, &self.table, &self.field)
    }

    /// Whether the data source addresses the given field.
    #[must_use]
    pub fn is_field(&self, key: &FieldKey) -> bool {
        self.datastore == key.datastore
            && self.database == key.database
            && self.table == key.table
            && self.field == key.field
    }

    /// Whether both data sources address the same field (and, unless
    /// `ignore_operator` is set, use the same operator).
    #[must_use]
    pub fn is_equivalent(&self, other: &Self, ignore_operator: bool) -> bool {
        self.datastore == other.datastore
            && self.database == other.database
            && self.table == other.table
            && self.field == other.field
            && (ignore_operator || self.operator == other.operator)
    }
}

/// Whether two data sources are equivalent.
#[must_use]
pub fn are_data_sources_equivalent(
    a: &FilterDataSource, b: &FilterDataSource, ignore_operator: bool,
) -> bool {
    a.is_equivalent(b, ignore_operator)
}

/// Whether two data source lists are equivalent: every entry of each list
/// has an equivalent entry in the other, irrespective of order.
#[must_use]
pub fn are_data_source_lists_equivalent(
    list1: &[FilterDataSource], list2: &[FilterDataSource],
) -> bool {
    list1.iter().all(|a| list2.iter().any(|b| a.is_equivalent(b, false)))
        && list2.iter().all(|b| list1.iter().any(|a| b.is_equivalent(a, false)))
}

/// Returns the deduplicated data sources addressed by the leaves of a
/// (possibly nested) filter config.
#[must_use]
pub fn data_sources_from_config(
    config: &FilterConfig, ignore_operator: bool,
) -> Vec<FilterDataSource> {
    let mut sources = Vec::new();
    collect_sources(config, ignore_operator, &mut sources);
    sources
}

fn collect_sources(
    config: &FilterConfig, ignore_operator: bool, sources: &mut Vec<FilterDataSource>,
) {
    match config {
        FilterConfig::Simple(simple) => {
            let operator = if ignore_operator { None } else { Some(simple.operator) };
            let source = FilterDataSource::new(&simple.field_key(), operator);
            if !sources.iter().any(|s| s.is_equivalent(&source, ignore_operator)) {
                sources.push(source);
            }
        }
        FilterConfig::Compound(compound) => {
            for nested in &compound.filters {
                collect_sources(nested, ignore_operator, sources);
            }
        }
    }
}
