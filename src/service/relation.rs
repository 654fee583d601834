//! # Relation Propagation
//!
//! A filter on a field that the dataset relates to fields in other tables is
//! copied onto each of those fields. The original and its copies reference
//! each other through their `relations` ids.

use crate::dataset::Dataset;
use crate::filter::Filter;
use crate::ids::IdGenerator;
use crate::source::{FieldKey, FilterDataSource, data_sources_from_config};

/// The filter followed by its relation filters, each listing the ids of all
/// the others as relations.
pub fn with_relation_filters(
    mut filter: Filter, dataset: &impl Dataset, ids: &mut dyn IdGenerator,
) -> Vec<Filter> {
    let sources = data_sources_from_config(&filter.to_config(), true);

    // (relation entries, index of the entry matching the filter)
    let mut matches = Vec::new();
    for relation in dataset.relations() {
        for (index, entry) in relation.iter().enumerate() {
            if entry.len() == sources.len() && is_entry_for(entry, &sources) {
                matches.push((relation, index));
            }
        }
    }
    if matches.len() > 1 {
        tracing::warn!(
            filter = filter.id(),
            matches = matches.len(),
            "filter matches more than one relation entry; using the first"
        );
    }

    let mut filters = Vec::new();
    if let Some((relation, matched)) = matches.first() {
        let equivalent = &relation[*matched];
        for (index, substitute) in relation.iter().enumerate() {
            if index == *matched {
                continue;
            }
            match filter.create_relation_filter(equivalent, substitute, ids) {
                Some(related) => {
                    tracing::trace!(
                        filter = filter.id(),
                        relation = related.id(),
                        "relation filter"
                    );
                    filters.push(related);
                }
                None => tracing::trace!(filter = filter.id(), ?substitute, "no relation filter"),
            }
        }
    }

    let all: Vec<String> = std::iter::once(filter.id().to_string())
        .chain(filters.iter().map(|f| f.id().to_string()))
        .collect();
    filter.set_relations(others(&all, filter.id()));
    for related in &mut filters {
        let relations = others(&all, related.id());
        related.set_relations(relations);
    }

    filters.insert(0, filter);
    filters
}

// Every entry field matches a filter field and vice versa, operators aside.
fn is_entry_for(entry: &[FieldKey], sources: &[FilterDataSource]) -> bool {
    entry.iter().all(|key| sources.iter().any(|source| source.is_field(key)))
        && sources.iter().all(|source| entry.iter().any(|key| source.is_field(key)))
}

fn others(ids: &[String], id: &str) -> Vec<String> {
    ids.iter().filter(|other| *other != id).cloned().collect()
}
