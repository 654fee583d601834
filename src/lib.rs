//! # Credibil Filter
//!
//! Filter composition and a filter registry for search-backed
//! visualizations.
//!
//! Widgets describe the filters they want as declarative [`FilterConfig`]s.
//! The [`FilterService`] turns configs into live, identity-bearing
//! [`Filter`]s, recognises configs describing filters that already exist,
//! copies filters across fields the [`Dataset`] declares related, and tells
//! registered listeners whenever the set of live filters changes.
//!
//! ```rust
//! use credibil_filter::{FieldKey, FilterService, Operator, SimpleFilterConfig, StaticDataset};
//!
//! let mut service = FilterService::new();
//! let key = FieldKey::new("es", "shop", "orders", "status");
//! let config = SimpleFilterConfig::new(&key, Operator::Eq).value("shipped").into();
//!
//! service.create_filters("widget", &[config], &StaticDataset::new());
//! assert_eq!(service.get_filters().len(), 1);
//! ```

pub mod collection;
pub mod config;
pub mod dataset;
mod error;
pub mod filter;
pub mod ids;
pub mod service;
pub mod source;
pub mod values;

pub use crate::collection::{DataSources, FilterCollection};
pub use crate::config::{
    CompoundFilterConfig, CompoundType, FilterConfig, Operator, SimpleFilterConfig,
};
pub use crate::dataset::{Dataset, Relation, StaticDataset};
pub use crate::error::Error;
pub use crate::filter::{
    BoundsFilter, CompoundFilter, DomainFilter, Filter, FilterKind, ListFilter, PairFilter,
};
pub use crate::ids::{CounterIds, IdGenerator, UuidIds};
pub use crate::service::{ChangeMap, ExchangeOptions, FilterService, FilterServiceBuilder};
pub use crate::source::{FieldKey, FilterDataSource};
pub use crate::values::FilterValues;

/// Result type for fallible filter operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
