//! # Filter Collection
//!
//! A map from data-source lists to filter lists, keyed by list equivalence
//! rather than identity. Two structurally equal data-source lists, however
//! constructed, resolve to the same stored key and the same filters.
//!
//! Keys are [`DataSources`] handles: once a key is stored, every lookup that
//! resolves to it returns a handle to the same allocation, so callers can
//! compare keys by reference with [`DataSources::ptr_eq`].

use std::ops::Deref;
use std::sync::Arc;

use crate::config::FilterConfig;
use crate::filter::Filter;
use crate::source::{FilterDataSource, are_data_source_lists_equivalent, data_sources_from_config};

/// A shared, immutable data-source list used as a collection key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSources(Arc<[FilterDataSource]>);

impl DataSources {
    /// Whether both handles refer to the same stored key.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether the key is list-equivalent to `sources`.
    #[must_use]
    pub fn is_equivalent(&self, sources: &[FilterDataSource]) -> bool {
        are_data_source_lists_equivalent(&self.0, sources)
    }
}

impl Deref for DataSources {
    type Target = [FilterDataSource];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<FilterDataSource>> for DataSources {
    fn from(sources: Vec<FilterDataSource>) -> Self {
        Self(sources.into())
    }
}

impl From<&[FilterDataSource]> for DataSources {
    fn from(sources: &[FilterDataSource]) -> Self {
        Self(sources.into())
    }
}

/// Filters stored by data-source list, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct FilterCollection {
    entries: Vec<(DataSources, Vec<Filter>)>,
}

impl FilterCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored data-source lists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no data-source list is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Index of the entry keyed by a list equivalent to `sources`. More than
    // one match means the collection is corrupt: log it and use the first.
    fn position(&self, sources: &[FilterDataSource]) -> Option<usize> {
        let mut matches = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (key, _))| key.is_equivalent(sources))
            .map(|(index, _)| index);

        let first = matches.next()?;
        let others = matches.count();
        if others > 0 {
            tracing::error!(
                sources = ?sources,
                matches = others + 1,
                "more than one equivalent data source list in filter collection"
            );
        }
        Some(first)
    }

    // Index of the entry for `sources`, inserting an empty one if missing.
    fn position_or_insert(&mut self, sources: &[FilterDataSource]) -> usize {
        self.position(sources).unwrap_or_else(|| {
            self.entries.push((sources.into(), Vec::new()));
            self.entries.len() - 1
        })
    }

    /// The stored key for the config's data sources, registering a new key
    /// (with no filters) if none is equivalent.
    pub fn find_data_sources(&mut self, config: &FilterConfig) -> DataSources {
        let sources = data_sources_from_config(config, false);
        let index = self.position_or_insert(&sources);
        self.entries[index].0.clone()
    }

    /// The filters stored under a list equivalent to `sources`, registering
    /// the key (with no filters) if none is equivalent.
    pub fn get_filters(&mut self, sources: &[FilterDataSource]) -> &[Filter] {
        let index = self.position_or_insert(sources);
        &self.entries[index].1
    }

    /// The filters stored under a list equivalent to `sources`, without
    /// registering anything.
    #[must_use]
    pub fn lookup(&self, sources: &[FilterDataSource]) -> Option<&[Filter]> {
        self.position(sources).map(|index| self.entries[index].1.as_slice())
    }

    /// Every stored filter, in key then insertion order.
    #[must_use]
    pub fn filters(&self) -> Vec<&Filter> {
        self.entries.iter().flat_map(|(_, filters)| filters).collect()
    }

    /// Filters stored under the config's data sources that are compatible
    /// with the config.
    pub fn get_compatible_filters(&mut self, config: &FilterConfig) -> Vec<Filter> {
        let sources = data_sources_from_config(config, false);
        self.get_filters(&sources)
            .iter()
            .filter(|filter| filter.is_compatible_with_config(config))
            .cloned()
            .collect()
    }

    /// Store `filters` under `sources`, replacing the filters of an
    /// equivalent key if one exists. Returns the stored key.
    pub fn set_filters(&mut self, sources: &DataSources, filters: Vec<Filter>) -> DataSources {
        if let Some(index) = self.position(sources) {
            self.entries[index].1 = filters;
            return self.entries[index].0.clone();
        }
        self.entries.push((sources.clone(), filters));
        sources.clone()
    }

    /// Every stored key, in insertion order.
    #[must_use]
    pub fn data_sources(&self) -> Vec<DataSources> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Keys and their filters, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&DataSources, &[Filter])> {
        self.entries.iter().map(|(key, filters)| (key, filters.as_slice()))
    }
}
