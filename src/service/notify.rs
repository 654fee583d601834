//! # Change Notification
//!
//! Listeners are told, synchronously and in the calling operation's stack,
//! which data sources changed and the configs of their filters.

use crate::collection::DataSources;
use crate::config::FilterConfig;
use crate::source::FilterDataSource;

/// The filters of each changed data source, as configs, in collection
/// order.
#[derive(Clone, Debug, Default)]
pub struct ChangeMap {
    entries: Vec<(DataSources, Vec<FilterConfig>)>,
}

impl ChangeMap {
    pub(crate) fn insert(&mut self, sources: DataSources, configs: Vec<FilterConfig>) {
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| key.ptr_eq(&sources)) {
            entry.1 = configs;
        } else {
            self.entries.push((sources, configs));
        }
    }

    /// The configs recorded for a data-source list equivalent to `sources`.
    #[must_use]
    pub fn get(&self, sources: &[FilterDataSource]) -> Option<&[FilterConfig]> {
        self.entries
            .iter()
            .find(|(key, _)| key.is_equivalent(sources))
            .map(|(_, configs)| configs.as_slice())
    }

    /// Changed data sources and their configs.
    pub fn iter(&self) -> impl Iterator<Item = (&DataSources, &[FilterConfig])> {
        self.entries.iter().map(|(key, configs)| (key, configs.as_slice()))
    }

    /// Number of changed data sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no data source changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Called with the id of the caller whose operation changed the filters and
/// the resulting change map.
pub type FilterChangeListener = Box<dyn FnMut(&str, &ChangeMap) + Send>;

/// Registered listeners, in registration order.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(String, FilterChangeListener)>,
}

impl Listeners {
    /// Register a listener, replacing any listener registered under the same
    /// id.
    pub fn register(&mut self, id: impl Into<String>, listener: FilterChangeListener) {
        let id = id.into();
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            entry.1 = listener;
        } else {
            self.entries.push((id, listener));
        }
    }

    /// Remove the listener registered under `id`.
    pub fn unregister(&mut self, id: &str) {
        self.entries.retain(|(existing, _)| existing != id);
    }

    /// Ids of registered listeners.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Invoke every listener, in registration order.
    pub fn call_all(&mut self, caller_id: &str, changes: &ChangeMap) {
        for (_, listener) in &mut self.entries {
            listener(caller_id, changes);
        }
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

/// Delivers change maps to listeners.
pub trait Notifier: Send {
    /// Deliver a change made by `caller_id`.
    fn notify(&mut self, caller_id: &str, changes: &ChangeMap, listeners: &mut Listeners);
}

/// Calls every listener inline, before the operation returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineNotifier;

impl Notifier for InlineNotifier {
    fn notify(&mut self, caller_id: &str, changes: &ChangeMap, listeners: &mut Listeners) {
        listeners.call_all(caller_id, changes);
    }
}
