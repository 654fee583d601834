//! # Filter Service
//!
//! The registry of live filters. Callers (widgets, identified by an opaque
//! caller id) create, delete, exchange, and toggle filters by config; the
//! service turns configs into filters, propagates them across dataset
//! relations, stores them by data source, and notifies registered listeners
//! of every change.
//!
//! All operations run to completion, listener notification included, before
//! returning. Listeners are owned by the service and cannot call back into it.

mod cache;
mod notify;
mod relation;

use std::collections::HashSet;
use std::slice;

use serde_json::Value;

pub use self::cache::PreviousFilters;
pub use self::notify::{ChangeMap, FilterChangeListener, InlineNotifier, Listeners, Notifier};
pub use self::relation::with_relation_filters;
use crate::collection::{DataSources, FilterCollection};
use crate::config::{CompoundType, FilterConfig};
use crate::dataset::Dataset;
use crate::filter::{CompoundFilter, Filter};
use crate::ids::{CounterIds, IdGenerator};
use crate::source::{FilterDataSource, data_sources_from_config};

/// Options for [`FilterService::exchange_filters`].
#[derive(Clone, Debug, Default)]
pub struct ExchangeOptions {
    /// Configs of further filters to delete.
    pub configs_to_delete: Vec<FilterConfig>,

    /// Keep new filters even when they are equivalent to the filters they
    /// replace. By default, exchanging a data source's filters for an
    /// equivalent list clears the data source.
    pub keep_same_filters: bool,

    /// Cache replaced filters for the caller and restore them when a data
    /// source is cleared.
    pub apply_previous: bool,
}

impl ExchangeOptions {
    /// Delete filters matching these configs as well.
    #[must_use]
    pub fn configs_to_delete(mut self, configs: Vec<FilterConfig>) -> Self {
        self.configs_to_delete = configs;
        self
    }

    /// Keep new filters equivalent to the filters they replace.
    #[must_use]
    pub const fn keep_same_filters(mut self, keep: bool) -> Self {
        self.keep_same_filters = keep;
        self
    }

    /// Cache and restore previous filters.
    #[must_use]
    pub const fn apply_previous(mut self, apply: bool) -> Self {
        self.apply_previous = apply;
        self
    }
}

/// Builds a [`FilterService`].
#[derive(Default)]
pub struct FilterServiceBuilder {
    ids: Option<Box<dyn IdGenerator>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl FilterServiceBuilder {
    /// Issue filter ids with `ids`. Defaults to [`CounterIds`].
    #[must_use]
    pub fn ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// Deliver changes with `notifier`. Defaults to [`InlineNotifier`].
    #[must_use]
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Build the service.
    #[must_use]
    pub fn build(self) -> FilterService {
        FilterService {
            collection: FilterCollection::new(),
            listeners: Listeners::default(),
            cache: PreviousFilters::default(),
            ids: self.ids.unwrap_or_else(|| Box::new(CounterIds::new())),
            notifier: self.notifier.unwrap_or_else(|| Box::new(InlineNotifier)),
        }
    }
}

/// The filter registry.
pub struct FilterService {
    collection: FilterCollection,
    listeners: Listeners,
    cache: PreviousFilters,
    ids: Box<dyn IdGenerator>,
    notifier: Box<dyn Notifier>,
}

impl Default for FilterService {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for FilterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterService")
            .field("collection", &self.collection)
            .field("listeners", &self.listeners)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl FilterService {
    /// Create a service with default id generation and notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a service.
    #[must_use]
    pub fn builder() -> FilterServiceBuilder {
        FilterServiceBuilder::default()
    }

    /// The global filter collection.
    #[must_use]
    pub const fn filter_collection(&self) -> &FilterCollection {
        &self.collection
    }

    /// Every live filter.
    #[must_use]
    pub fn get_filters(&self) -> Vec<&Filter> {
        self.collection.filters()
    }

    /// Live filters compatible with `config`.
    #[must_use]
    pub fn get_filters_for(&self, config: &FilterConfig) -> Vec<&Filter> {
        let sources = data_sources_from_config(config, false);
        self.collection
            .lookup(&sources)
            .unwrap_or_default()
            .iter()
            .filter(|filter| filter.is_compatible_with_config(config))
            .collect()
    }

    /// Register `listener` under `id`, replacing any listener with that id.
    pub fn register_filter_change_listener(
        &mut self, id: impl Into<String>,
        listener: impl FnMut(&str, &ChangeMap) + Send + 'static,
    ) {
        self.listeners.register(id, Box::new(listener));
    }

    /// Remove the listener registered under `id`.
    pub fn unregister_filter_change_listener(&mut self, id: &str) {
        self.listeners.unregister(id);
    }

    /// Drop the caller's previous-filter cache.
    pub fn clear_cached_filters(&mut self, caller_id: &str) {
        self.cache.clear(caller_id);
    }

    /// Add filters (and their relation filters) built from `configs`.
    ///
    /// Returns the filters of every known data source. Listeners are
    /// notified when at least one config is given.
    pub fn create_filters(
        &mut self, caller_id: &str, configs: &[FilterConfig], dataset: &impl Dataset,
    ) -> ChangeMap {
        tracing::debug!(caller_id, configs = configs.len(), "create filters");

        let intermediary = self.intermediary(configs, dataset);
        let mut changes = ChangeMap::default();

        for sources in self.collection.data_sources() {
            let mut modified = self.stored(&sources);
            modified.extend_from_slice(intermediary.lookup(&sources).unwrap_or_default());
            self.store(&mut changes, &sources, modified);
        }

        if !configs.is_empty() {
            self.notify(caller_id, &changes);
        }
        changes
    }

    /// Delete the filters matching `config`: the filter with the config's id
    /// if it has one, otherwise every filter on the config's data sources.
    /// Relation filters are deleted with the filters they relate to.
    pub fn delete_filter(
        &mut self, caller_id: &str, config: &FilterConfig, save_previous: bool,
    ) -> ChangeMap {
        self.delete_filters(caller_id, slice::from_ref(config), save_previous)
    }

    /// Delete the filters matching each of `configs`, or every filter when
    /// `configs` is empty.
    ///
    /// With `save_previous`, deleted filters are cached for the caller and a
    /// data source left empty gets the caller's cached filters back.
    /// Listeners are notified when any filter is targeted.
    pub fn delete_filters(
        &mut self, caller_id: &str, configs: &[FilterConfig], save_previous: bool,
    ) -> ChangeMap {
        tracing::debug!(caller_id, configs = configs.len(), save_previous, "delete filters");

        let mut delete_ids = HashSet::new();
        if configs.is_empty() {
            for (_, filters) in self.collection.iter() {
                delete_ids.extend(filter_ids_and_relation_ids(filters));
            }
        } else {
            for config in configs {
                delete_ids.extend(self.ids_to_delete(config));
            }
        }

        let mut changes = ChangeMap::default();
        for sources in self.collection.data_sources() {
            let previous = self.stored(&sources);
            let mut modified: Vec<Filter> =
                previous.iter().filter(|f| !delete_ids.contains(f.id())).cloned().collect();
            if save_previous {
                modified = self.cache.cache_or_restore(caller_id, &sources, &previous, modified);
            }
            self.store(&mut changes, &sources, modified);
        }

        if !delete_ids.is_empty() {
            self.notify(caller_id, &changes);
        }
        changes
    }

    /// Replace the filters of each data source `configs` touch with filters
    /// built from `configs`, and delete the filters they replace along with
    /// those filters' relation filters.
    ///
    /// A data source whose new filters are equivalent, position by position,
    /// to its current filters is cleared instead, unless
    /// [`ExchangeOptions::keep_same_filters`] is set. Listeners are notified
    /// when `configs` or [`ExchangeOptions::configs_to_delete`] is non-empty.
    pub fn exchange_filters(
        &mut self, caller_id: &str, configs: &[FilterConfig], dataset: &impl Dataset,
        options: &ExchangeOptions,
    ) -> ChangeMap {
        tracing::debug!(
            caller_id,
            configs = configs.len(),
            delete = options.configs_to_delete.len(),
            keep_same_filters = options.keep_same_filters,
            apply_previous = options.apply_previous,
            "exchange filters"
        );

        let intermediary = self.intermediary(configs, dataset);

        let mut delete_ids = HashSet::new();
        for (sources, _) in intermediary.iter() {
            let replaced = self.collection.lookup(sources).unwrap_or_default();
            delete_ids.extend(filter_ids_and_relation_ids(replaced));
        }
        for config in &options.configs_to_delete {
            delete_ids.extend(self.ids_to_delete(config));
        }

        let mut changes = ChangeMap::default();
        for sources in self.collection.data_sources() {
            let previous = self.stored(&sources);
            let new = intermediary.lookup(&sources).unwrap_or_default();

            let modified = if new.is_empty() {
                previous.iter().filter(|f| !delete_ids.contains(f.id())).cloned().collect()
            } else {
                let unchanged = !options.keep_same_filters
                    && new.len() == previous.len()
                    && new.iter().zip(&previous).all(|(a, b)| a.is_equivalent_to_filter(b));
                let modified = if unchanged { Vec::new() } else { new.to_vec() };
                if options.apply_previous {
                    self.cache.cache_or_restore(caller_id, &sources, &previous, modified)
                } else {
                    modified
                }
            };
            self.store(&mut changes, &sources, modified);
        }

        if !configs.is_empty() || !options.configs_to_delete.is_empty() {
            self.notify(caller_id, &changes);
        }
        changes
    }

    /// Toggle filters built from `configs`: a filter equivalent to an
    /// existing filter removes that filter (and its relation filters);
    /// any other filter is added (with its relation filters).
    ///
    /// Listeners are notified when `configs` is non-empty.
    pub fn toggle_filters(
        &mut self, caller_id: &str, configs: &[FilterConfig], dataset: &impl Dataset,
    ) -> ChangeMap {
        tracing::debug!(caller_id, configs = configs.len(), "toggle filters");

        let intermediary = self.intermediary(configs, dataset);

        let mut delete_ids = HashSet::new();
        for (sources, candidates) in intermediary.iter() {
            let existing = self.collection.lookup(sources).unwrap_or_default();
            for candidate in candidates {
                let found = existing.iter().find(|f| f.is_equivalent_to_filter(candidate));
                if let Some(filter) = found {
                    delete_ids.extend(filter_ids_and_relation_ids(slice::from_ref(filter)));
                }
            }
        }

        let mut changes = ChangeMap::default();
        for sources in self.collection.data_sources() {
            let previous = self.stored(&sources);
            let candidates = intermediary.lookup(&sources).unwrap_or_default();

            let mut modified: Vec<Filter> =
                previous.iter().filter(|f| !delete_ids.contains(f.id())).cloned().collect();
            modified.extend(
                candidates
                    .iter()
                    .filter(|c| !previous.iter().any(|f| f.is_equivalent_to_filter(c)))
                    .cloned(),
            );
            self.store(&mut changes, &sources, modified);
        }

        if !configs.is_empty() {
            self.notify(caller_id, &changes);
        }
        changes
    }

    /// Filters that apply to searches on the given table, excluding data
    /// sources matching any of `configs_to_ignore`.
    ///
    /// The filters of each data source are wrapped in a single OR compound
    /// filter with the placeholder id `_`.
    #[must_use]
    pub fn get_filters_to_search(
        &self, datastore: &str, database: &str, table: &str, configs_to_ignore: &[FilterConfig],
    ) -> Vec<Filter> {
        let ignored: Vec<Vec<FilterDataSource>> =
            configs_to_ignore.iter().map(|c| data_sources_from_config(c, false)).collect();

        self.collection
            .iter()
            .filter(|(sources, _)| !ignored.iter().any(|ignore| sources.is_equivalent(ignore)))
            .filter_map(|(_, filters)| {
                let affecting: Vec<Filter> = filters
                    .iter()
                    .filter(|f| f.does_affect_search(datastore, database, table))
                    .cloned()
                    .collect();
                (!affecting.is_empty())
                    .then(|| Filter::with_id("_", CompoundFilter::new(CompoundType::Or, affecting)))
            })
            .collect()
    }

    /// A new collection holding, for the data sources of each config, the
    /// live filters on those data sources. A filter shared by several
    /// configs is listed once.
    #[must_use]
    pub fn retrieve_compatible_filter_collection(
        &self, configs: &[FilterConfig],
    ) -> FilterCollection {
        let mut collection = FilterCollection::new();
        for config in configs {
            let sources = collection.find_data_sources(config);
            let mut filters = collection.lookup(&sources).unwrap_or_default().to_vec();
            for filter in self.collection.lookup(&sources).unwrap_or_default() {
                if !filters.iter().any(|f| f.id() == filter.id()) {
                    filters.push(filter.clone());
                }
            }
            collection.set_filters(&sources, filters);
        }
        collection
    }

    /// Replace every live filter with filters (and relation filters) built
    /// from `configs`. Listeners are always notified.
    pub fn set_filters_from_configs(
        &mut self, caller_id: &str, configs: &[FilterConfig], dataset: &impl Dataset,
    ) -> ChangeMap {
        tracing::debug!(caller_id, configs = configs.len(), "set filters from configs");
        let intermediary = self.intermediary(configs, dataset);
        self.replace_all(caller_id, &intermediary)
    }

    /// Every live filter in data-list form.
    #[must_use]
    pub fn to_data_lists(&self) -> Vec<Vec<Value>> {
        self.collection.filters().into_iter().map(Filter::to_data_list).collect()
    }

    /// Replace every live filter with filters decoded from data lists,
    /// keeping their ids and relations. Lists that do not decode are skipped.
    /// Listeners are always notified.
    pub fn set_filters_from_data_lists(
        &mut self, caller_id: &str, lists: &[Vec<Value>],
    ) -> ChangeMap {
        tracing::debug!(caller_id, lists = lists.len(), "set filters from data lists");

        let mut intermediary = FilterCollection::new();
        for list in lists {
            let Some(filter) = Filter::from_data_list(list, self.ids.as_mut()) else {
                continue;
            };
            self.add_to(&mut intermediary, filter);
        }
        self.replace_all(caller_id, &intermediary)
    }

    // Build filters and relation filters for `configs`, keyed by the global
    // collection's data sources (registering new ones).
    fn intermediary(
        &mut self, configs: &[FilterConfig], dataset: &impl Dataset,
    ) -> FilterCollection {
        let mut intermediary = FilterCollection::new();
        for config in configs {
            let filter = Filter::from_config(config, self.ids.as_mut());
            for filter in with_relation_filters(filter, dataset, self.ids.as_mut()) {
                self.add_to(&mut intermediary, filter);
            }
        }
        intermediary
    }

    fn add_to(&mut self, intermediary: &mut FilterCollection, filter: Filter) {
        let sources = self.collection.find_data_sources(&filter.to_config());
        let mut filters = intermediary.lookup(&sources).unwrap_or_default().to_vec();
        filters.push(filter);
        intermediary.set_filters(&sources, filters);
    }

    fn replace_all(&mut self, caller_id: &str, intermediary: &FilterCollection) -> ChangeMap {
        let mut changes = ChangeMap::default();
        for sources in self.collection.data_sources() {
            let modified = intermediary.lookup(&sources).unwrap_or_default().to_vec();
            self.store(&mut changes, &sources, modified);
        }
        self.notify(caller_id, &changes);
        changes
    }

    // Ids targeted by a delete config, with their relation ids.
    fn ids_to_delete(&mut self, config: &FilterConfig) -> Vec<String> {
        let sources = self.collection.find_data_sources(config);
        let filters = self.collection.lookup(&sources).unwrap_or_default();
        match config.id() {
            Some(id) => filters
                .iter()
                .find(|f| f.id() == id)
                .map(|f| filter_ids_and_relation_ids(slice::from_ref(f)))
                .unwrap_or_default(),
            None => filter_ids_and_relation_ids(filters),
        }
    }

    fn stored(&self, sources: &DataSources) -> Vec<Filter> {
        self.collection.lookup(sources).unwrap_or_default().to_vec()
    }

    // Write back under the collection's own key.
    fn store(&mut self, changes: &mut ChangeMap, sources: &DataSources, filters: Vec<Filter>) {
        let configs = filters.iter().map(Filter::to_config).collect();
        let key = self.collection.set_filters(sources, filters);
        changes.insert(key, configs);
    }

    fn notify(&mut self, caller_id: &str, changes: &ChangeMap) {
        tracing::debug!(caller_id, changed = changes.len(), "notify filter change listeners");
        self.notifier.notify(caller_id, changes, &mut self.listeners);
    }
}

// Ids of the filters and of their relation filters.
fn filter_ids_and_relation_ids(filters: &[Filter]) -> Vec<String> {
    let mut ids = Vec::new();
    for filter in filters {
        ids.push(filter.id().to_string());
        ids.extend(filter.relations().iter().cloned());
    }
    ids
}
