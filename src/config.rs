//! # Filter Configs
//!
//! Filter configs are the declarative, serializable description of a filter
//! that widgets exchange with the registry. A config has no identity of its
//! own: two configs describing the same clauses are interchangeable.
//!
//! A simple config leaves `value` unset to mean "any value". Unset is not the
//! same as `null`: `{"value": null}` filters on the `null` value.

use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::source::FieldKey;
use crate::values::{CompoundValues, FilterValues, OneValue};
use crate::{Error, Result};

/// Filter clause operators.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Operator {
    /// Equal to.
    #[serde(rename = "=")]
    #[display("=")]
    Eq,

    /// Not equal to.
    #[serde(rename = "!=")]
    #[display("!=")]
    Ne,

    /// Greater than.
    #[serde(rename = ">")]
    #[display(">")]
    Gt,

    /// Greater than or equal to.
    #[serde(rename = ">=")]
    #[display(">=")]
    Ge,

    /// Less than.
    #[serde(rename = "<")]
    #[display("<")]
    Lt,

    /// Less than or equal to.
    #[serde(rename = "<=")]
    #[display("<=")]
    Le,

    /// Contains the value.
    #[serde(rename = "contains")]
    #[display("contains")]
    Contains,

    /// Does not contain the value.
    #[serde(rename = "not contains")]
    #[display("not contains")]
    NotContains,
}

/// How the clauses of a compound filter are joined.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundType {
    /// All clauses must match.
    #[display("and")]
    And,

    /// Any clause may match.
    #[default]
    #[display("or")]
    Or,
}

impl CompoundType {
    /// Parse the lowercase tag used in data lists.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// Declarative description of a desired filter.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterConfig {
    /// AND/OR of nested configs.
    Compound(CompoundFilterConfig),

    /// A single field/operator/value clause.
    Simple(SimpleFilterConfig),
}

impl FilterConfig {
    /// Parse a config from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is not a simple or compound config.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Serialize the config to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Whether this is a single clause config.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        matches!(self, Self::Simple(_))
    }

    /// Whether this is a compound config.
    #[must_use]
    pub const fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }

    /// The id of the filter the config was generated from, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Simple(simple) => simple.id.as_deref(),
            Self::Compound(compound) => compound.id.as_deref(),
        }
    }

    /// Relation ids carried by the config.
    #[must_use]
    pub fn relations(&self) -> &[String] {
        match self {
            Self::Simple(simple) => &simple.relations,
            Self::Compound(compound) => &compound.relations,
        }
    }

    /// Return the config as a simple config, if it is one.
    #[must_use]
    pub const fn as_simple(&self) -> Option<&SimpleFilterConfig> {
        match self {
            Self::Simple(simple) => Some(simple),
            Self::Compound(_) => None,
        }
    }

    /// Return the config as a compound config, if it is one.
    #[must_use]
    pub const fn as_compound(&self) -> Option<&CompoundFilterConfig> {
        match self {
            Self::Compound(compound) => Some(compound),
            Self::Simple(_) => None,
        }
    }

    /// Read the values the config declares.
    #[must_use]
    pub fn retrieve_values(&self) -> FilterValues {
        match self {
            Self::Simple(simple) => FilterValues::One(OneValue {
                field: simple.field_key(),
                operator: simple.operator,
                value: simple.value.clone(),
            }),
            Self::Compound(compound) => FilterValues::Compound(CompoundValues {
                kind: compound.kind,
                nested: compound.filters.iter().map(Self::retrieve_values).collect(),
            }),
        }
    }
}

impl TryFrom<Value> for FilterConfig {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Into::into)
    }
}

impl From<SimpleFilterConfig> for FilterConfig {
    fn from(config: SimpleFilterConfig) -> Self {
        Self::Simple(config)
    }
}

impl From<CompoundFilterConfig> for FilterConfig {
    fn from(config: CompoundFilterConfig) -> Self {
        Self::Compound(config)
    }
}

/// A single field/operator/value clause.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SimpleFilterConfig {
    /// Id of the filter the config describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Ids of the filter's relation siblings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<String>,

    /// Datastore name.
    pub datastore: String,

    /// Database name.
    pub database: String,

    /// Table name.
    pub table: String,

    /// Field name.
    pub field: String,

    /// Clause operator.
    pub operator: Operator,

    /// Clause value. Unset matches any value.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl SimpleFilterConfig {
    /// Create a clause for the field and operator, matching any value.
    #[must_use]
    pub fn new(key: &FieldKey, operator: Operator) -> Self {
        Self {
            id: None,
            relations: Vec::new(),
            datastore: key.datastore.clone(),
            database: key.database.clone(),
            table: key.table.clone(),
            field: key.field.clone(),
            operator,
            value: None,
        }
    }

    /// Specify the clause value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Specify the id of the filter the config describes.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The field the clause addresses.
    #[must_use]
    pub fn field_key(&self) -> FieldKey {
        FieldKey::new(&self.datastore, &self.database, &self.table, &self.field)
    }
}

/// AND/OR of nested configs.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CompoundFilterConfig {
    /// Id of the filter the config describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Ids of the filter's relation siblings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<String>,

    /// How nested configs are joined.
    #[serde(rename = "type")]
    pub kind: CompoundType,

    /// Nested configs.
    pub filters: Vec<FilterConfig>,
}

impl CompoundFilterConfig {
    /// Create a compound config.
    #[must_use]
    pub const fn new(kind: CompoundType, filters: Vec<FilterConfig>) -> Self {
        Self {
            id: None,
            relations: Vec::new(),
            kind,
            filters,
        }
    }

    /// Specify the id of the filter the config describes.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

// Distinguish an explicit `null` value from an absent one.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn simple_from_json() {
        let config = FilterConfig::from_json(
            r#"{"datastore": "es", "database": "db", "table": "t", "field": "f",
                "operator": "!="}"#,
        )
        .expect("should parse");

        let simple = config.as_simple().expect("should be simple");
        assert_eq!(simple.operator, Operator::Ne);
        assert_eq!(simple.value, None);
    }

    #[test]
    fn null_value_is_present() {
        let config: FilterConfig = json!({
            "datastore": "es", "database": "db", "table": "t", "field": "f",
            "operator": "=", "value": null
        })
        .try_into()
        .expect("should parse");

        assert_eq!(config.as_simple().expect("should be simple").value, Some(Value::Null));

        let json = serde_json::to_value(&config).expect("should serialize");
        assert_eq!(json["value"], Value::Null);
        assert!(json.as_object().expect("should be object").contains_key("value"));
    }

    #[test]
    fn compound_from_json() {
        let config: FilterConfig = json!({
            "type": "and",
            "filters": [
                {"datastore": "es", "database": "db", "table": "t", "field": "x",
                    "operator": ">", "value": -100},
                {"datastore": "es", "database": "db", "table": "t", "field": "x",
                    "operator": "<", "value": 100}
            ]
        })
        .try_into()
        .expect("should parse");

        assert!(config.is_compound());
        let compound = config.as_compound().expect("should be compound");
        assert_eq!(compound.kind, CompoundType::And);
        assert_eq!(compound.filters.len(), 2);
    }

    #[test]
    fn operator_display() {
        assert_eq!(Operator::NotContains.to_string(), "not contains");
        assert_eq!(Operator::Ge.to_string(), ">=");
        assert_eq!(CompoundType::Or.to_string(), "or");
    }

    #[test]
    fn not_a_config() {
        assert!(FilterConfig::from_json(r#"{"type": "and"}"#).is_err());
    }
}
