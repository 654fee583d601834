//! # Previous Filters
//!
//! Per-caller memory of the filters a data source held before the caller
//! last replaced them, so that clearing the source later can restore them.
//!
//! Entries are only drained by a restore or [`PreviousFilters::clear`].

use std::collections::HashMap;

use crate::collection::DataSources;
use crate::filter::Filter;
use crate::source::FilterDataSource;

/// Cached filters, per caller id and data source.
#[derive(Clone, Debug, Default)]
pub struct PreviousFilters {
    callers: HashMap<String, Vec<(DataSources, Vec<Filter>)>>,
}

impl PreviousFilters {
    /// Remember `filters` as the previous filters of `sources` for the
    /// caller, replacing anything cached for an equivalent source.
    pub fn save(&mut self, caller_id: &str, sources: &DataSources, filters: Vec<Filter>) {
        let cached = self.callers.entry(caller_id.to_string()).or_default();
        if let Some(entry) = cached.iter_mut().find(|(key, _)| key.is_equivalent(sources)) {
            entry.1 = filters;
        } else {
            cached.push((sources.clone(), filters));
        }
    }

    /// Take the caller's cached filters for the first source equivalent to
    /// `sources`. The entry is removed from the cache.
    pub fn restore(
        &mut self, caller_id: &str, sources: &[FilterDataSource],
    ) -> Option<Vec<Filter>> {
        let cached = self.callers.get_mut(caller_id)?;
        let index = cached.iter().position(|(key, _)| key.is_equivalent(sources))?;
        let (_, filters) = cached.remove(index);
        if cached.is_empty() {
            self.callers.remove(caller_id);
        }
        Some(filters)
    }

    /// Drop everything cached for the caller.
    pub fn clear(&mut self, caller_id: &str) {
        self.callers.remove(caller_id);
    }

    /// Whether anything is cached for the caller.
    #[must_use]
    pub fn contains(&self, caller_id: &str) -> bool {
        self.callers.contains_key(caller_id)
    }

    /// Apply the save/restore policy to a data source changing from
    /// `previous` to `modified`:
    ///
    /// - an unchanged source is left alone;
    /// - a source left empty gets its cached filters back, if any;
    /// - otherwise a non-empty `previous` is cached.
    pub fn cache_or_restore(
        &mut self, caller_id: &str, sources: &DataSources, previous: &[Filter],
        modified: Vec<Filter>,
    ) -> Vec<Filter> {
        let unchanged = previous.len() == modified.len()
            && previous.iter().zip(&modified).all(|(a, b)| a.id() == b.id());
        if unchanged {
            return modified;
        }

        if modified.is_empty() {
            return self.restore(caller_id, sources).unwrap_or_default();
        }
        if !previous.is_empty() {
            self.save(caller_id, sources, previous.to_vec());
        }
        modified
    }
}
