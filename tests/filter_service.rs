//! Filter Service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use credibil_filter::service::{Listeners, Notifier};
use credibil_filter::source::data_sources_from_config;
use credibil_filter::{
    ChangeMap, ExchangeOptions, Filter, FilterConfig, FilterKind, FilterService, Operator,
    UuidIds,
};
use serde_json::{Value, json};
use test_utils::{and, blank, dataset, eq, init_tracing, key, simple};

fn list_values(filter: &Filter) -> Vec<Value> {
    filter.retrieve_values().as_list().expect("should be a list filter").values.clone()
}

fn owned(service: &FilterService) -> Vec<Filter> {
    service.get_filters().into_iter().cloned().collect()
}

// Should create a filter with a relation filter on each related table.
#[test]
fn create_with_relations() {
    init_tracing();
    let mut service = FilterService::new();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::clone(&calls);
    service.register_filter_change_listener("search", move |caller, changes| {
        observed.lock().expect("should lock").push((caller.to_string(), changes.len()));
    });

    // --------------------------------------------------
    // One config, three tables.
    // --------------------------------------------------
    let config = eq("orders", "customer_id", 7);
    let changes = service.create_filters("widget", &[config.clone()], &dataset());
    assert_eq!(changes.len(), 3);

    let filters = owned(&service);
    assert_eq!(filters.len(), 3);
    for (filter, table) in filters.iter().zip(["orders", "customers", "accounts"]) {
        assert!(filter.does_affect_search("es", "shop", table));
        assert_eq!(list_values(filter), vec![json!(7)]);
    }

    let sources = data_sources_from_config(&config, false);
    let recorded = changes.get(&sources).expect("should record orders change");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].id(), Some(filters[0].id()));

    // --------------------------------------------------
    // Creating nothing does not notify.
    // --------------------------------------------------
    service.create_filters("widget", &[], &dataset());
    assert_eq!(*calls.lock().expect("should lock"), vec![("widget".to_string(), 3)]);
}

// Should clear a data source when exchanging its filters for equivalent ones,
// and replace them otherwise.
#[test]
fn exchange_collapse() {
    let mut service = FilterService::new();
    let options = ExchangeOptions::default();
    let a = eq("orders", "status", "a");
    let sources = data_sources_from_config(&a, false);

    // --------------------------------------------------
    // Exchanging for the same filter clears it.
    // --------------------------------------------------
    service.create_filters("widget", &[a.clone()], &dataset());
    let changes = service.exchange_filters("widget", &[a.clone()], &dataset(), &options);
    assert_eq!(changes.get(&sources).map(<[FilterConfig]>::len), Some(0));
    assert!(service.get_filters().is_empty());

    // --------------------------------------------------
    // Exchanging for a different filter replaces it.
    // --------------------------------------------------
    service.create_filters("widget", &[a.clone()], &dataset());
    service.exchange_filters("widget", &[eq("orders", "status", "b")], &dataset(), &options);

    let filters = owned(&service);
    assert_eq!(filters.len(), 1);
    assert_eq!(list_values(&filters[0]), vec![json!("b")]);

    // --------------------------------------------------
    // Unless asked to keep same filters.
    // --------------------------------------------------
    let keep = ExchangeOptions::default().keep_same_filters(true);
    let b = eq("orders", "status", "b");
    service.exchange_filters("widget", &[b], &dataset(), &keep);

    let kept = owned(&service);
    assert_eq!(kept.len(), 1);
    assert_ne!(kept[0].id(), filters[0].id());
    assert!(kept[0].is_equivalent_to_filter(&filters[0]));
}

// Should exchange relation filters along with the filters they relate to.
#[test]
fn exchange_relations() {
    let mut service = FilterService::new();
    let options = ExchangeOptions::default();

    service.create_filters("widget", &[eq("orders", "customer_id", 7)], &dataset());
    service.exchange_filters("widget", &[eq("orders", "customer_id", 8)], &dataset(), &options);

    let filters = owned(&service);
    assert_eq!(filters.len(), 3);
    assert!(filters.iter().all(|f| list_values(f) == vec![json!(8)]));

    service.exchange_filters("widget", &[eq("orders", "customer_id", 8)], &dataset(), &options);
    assert!(service.get_filters().is_empty());
}

// Should also delete filters matching the configs to delete.
#[test]
fn exchange_and_delete() {
    let mut service = FilterService::new();
    service.create_filters("widget", &[eq("orders", "status", "a")], &dataset());

    let options =
        ExchangeOptions::default().configs_to_delete(vec![blank("orders", "status", Operator::Eq)]);
    service.exchange_filters("widget", &[eq("orders", "region", "north")], &dataset(), &options);

    let filters = owned(&service);
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].fields()[0].field, "region");
}

// Should toggle a filter and its relation filters as a clique, and delete the
// whole clique through any member.
#[test]
fn toggle_clique() {
    let mut service = FilterService::new();
    let config = eq("orders", "customer_id", 7);

    // --------------------------------------------------
    // Toggle on.
    // --------------------------------------------------
    service.toggle_filters("widget", &[config.clone()], &dataset());
    let filters = owned(&service);
    assert_eq!(filters.len(), 3);

    for filter in &filters {
        assert_eq!(filter.relations().len(), 2);
        assert!(!filter.relations().iter().any(|id| id == filter.id()));
        for other in filters.iter().filter(|f| f.id() != filter.id()) {
            assert!(filter.relations().iter().any(|id| id == other.id()));
        }
    }

    // --------------------------------------------------
    // Deleting one member by id deletes the clique.
    // --------------------------------------------------
    let accounts = filters
        .iter()
        .find(|f| f.does_affect_search("es", "shop", "accounts"))
        .expect("should have accounts filter");
    service.delete_filter("widget", &accounts.to_config(), false);
    assert!(service.get_filters().is_empty());

    // --------------------------------------------------
    // Toggle on, add another, toggle the first off.
    // --------------------------------------------------
    service.toggle_filters("widget", &[config.clone()], &dataset());
    service.toggle_filters("widget", &[eq("orders", "customer_id", 8)], &dataset());
    assert_eq!(service.get_filters().len(), 6);

    service.toggle_filters("widget", &[config], &dataset());
    let filters = owned(&service);
    assert_eq!(filters.len(), 3);
    assert!(filters.iter().all(|f| list_values(f) == vec![json!(8)]));
}

// Should delete only the filter with the config's id.
#[test]
fn delete_by_id() {
    let mut service = FilterService::new();
    service.create_filters(
        "widget",
        &[eq("orders", "status", "a"), eq("orders", "status", "b")],
        &dataset(),
    );
    let filters = owned(&service);
    assert_eq!(filters.len(), 2);

    service.delete_filter("widget", &filters[1].to_config(), false);
    assert_eq!(owned(&service), vec![filters[0].clone()]);

    service.delete_filters("widget", &[], false);
    assert!(service.get_filters().is_empty());
}

// Should restore a caller's previous filters when a data source is cleared.
#[test]
fn restore_previous() {
    let mut service = FilterService::new();
    let options = ExchangeOptions::default().apply_previous(true);

    service.create_filters("widget", &[eq("orders", "status", "a")], &dataset());
    service.exchange_filters("widget", &[eq("orders", "status", "b")], &dataset(), &options);
    assert_eq!(list_values(&owned(&service)[0]), vec![json!("b")]);

    // --------------------------------------------------
    // Another caller has nothing cached.
    // --------------------------------------------------
    let mut other = FilterService::new();
    other.create_filters("widget", &[eq("orders", "status", "b")], &dataset());
    other.delete_filters("other", &[blank("orders", "status", Operator::Eq)], true);
    assert!(other.get_filters().is_empty());

    // --------------------------------------------------
    // Clearing restores the cached filter, once.
    // --------------------------------------------------
    let clear = blank("orders", "status", Operator::Eq);
    service.delete_filters("widget", &[clear.clone()], true);
    let restored = owned(&service);
    assert_eq!(restored.len(), 1);
    assert_eq!(list_values(&restored[0]), vec![json!("a")]);

    service.delete_filters("widget", &[clear], true);
    assert!(service.get_filters().is_empty());
}

// Should drop a caller's cache on request.
#[test]
fn clear_cache() {
    let mut service = FilterService::new();
    let options = ExchangeOptions::default().apply_previous(true);

    service.create_filters("widget", &[eq("orders", "status", "a")], &dataset());
    service.exchange_filters("widget", &[eq("orders", "status", "b")], &dataset(), &options);
    service.clear_cached_filters("widget");

    service.delete_filters("widget", &[blank("orders", "status", Operator::Eq)], true);
    assert!(service.get_filters().is_empty());
}

// Should notify registered listeners until unregistered.
#[test]
fn listeners() {
    let mut service = FilterService::new();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&calls);
    service.register_filter_change_listener("a", move |caller, _| {
        first.lock().expect("should lock").push(format!("a:{caller}"));
    });
    let second = Arc::clone(&calls);
    service.register_filter_change_listener("b", move |caller, _| {
        second.lock().expect("should lock").push(format!("b:{caller}"));
    });

    service.create_filters("widget", &[eq("orders", "status", "a")], &dataset());
    service.unregister_filter_change_listener("a");
    service.delete_filters("other", &[], false);

    // nothing left to delete
    service.delete_filters("other", &[], false);

    assert_eq!(*calls.lock().expect("should lock"), vec!["a:widget", "b:widget", "b:other"]);
}

struct Counting(Arc<AtomicUsize>);

impl Notifier for Counting {
    fn notify(&mut self, _: &str, _: &ChangeMap, _: &mut Listeners) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// Should deliver changes through the configured notifier and id generator.
#[test]
fn builder() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut service = FilterService::builder()
        .ids(UuidIds::new())
        .notifier(Counting(Arc::clone(&count)))
        .build();

    let called = Arc::new(AtomicUsize::new(0));
    let listener = Arc::clone(&called);
    service.register_filter_change_listener("search", move |_, _| {
        listener.fetch_add(1, Ordering::SeqCst);
    });

    service.create_filters("widget", &[eq("orders", "status", "a")], &dataset());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(called.load(Ordering::SeqCst), 0);

    let filters = owned(&service);
    assert_eq!(filters[0].id().len(), 36);
}

// Should return the filters affecting a table, wrapped per data source.
#[test]
fn filters_to_search() {
    let mut service = FilterService::new();
    service.create_filters(
        "widget",
        &[eq("orders", "status", "a"), eq("orders", "customer_id", 7)],
        &dataset(),
    );

    let search = service.get_filters_to_search("es", "shop", "orders", &[]);
    assert_eq!(search.len(), 2);
    for wrapper in &search {
        assert_eq!(wrapper.id(), "_");
        let FilterKind::Compound(compound) = wrapper.kind() else {
            panic!("should be compound");
        };
        assert_eq!(compound.filters.len(), 1);
    }

    let ignore = [blank("orders", "status", Operator::Eq)];
    let search = service.get_filters_to_search("es", "shop", "orders", &ignore);
    assert_eq!(search.len(), 1);

    assert_eq!(service.get_filters_to_search("es", "shop", "customers", &ignore).len(), 1);
    assert!(service.get_filters_to_search("es", "shop", "stores", &[]).is_empty());
}

// Should collect the live filters for each config's data sources once.
#[test]
fn compatible_collection() {
    let mut service = FilterService::new();
    service.create_filters(
        "widget",
        &[eq("orders", "status", "a"), eq("orders", "region", "north")],
        &dataset(),
    );

    let configs = [blank("orders", "status", Operator::Eq), eq("orders", "status", "zzz")];
    let collection = service.retrieve_compatible_filter_collection(&configs);
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.filters().len(), 1);

    assert_eq!(service.get_filters_for(&configs[0]).len(), 1);
    assert!(service.get_filters_for(&configs[1]).is_empty());
}

// Should propagate a two-field filter across a two-field relation.
#[test]
fn bounds_relation() {
    let mut service = FilterService::new();
    let config = and(vec![
        simple("orders", "lat", Operator::Ge, 1),
        simple("orders", "lat", Operator::Le, 2),
        simple("orders", "lon", Operator::Ge, 3),
        simple("orders", "lon", Operator::Le, 4),
    ]);
    service.create_filters("widget", &[config], &dataset());

    let filters = owned(&service);
    assert_eq!(filters.len(), 2);
    let FilterKind::Bounds(bounds) = filters[1].kind() else {
        panic!("should be bounds");
    };
    assert_eq!(bounds.field1, key("stores", "latitude"));
    assert_eq!(bounds.field2, key("stores", "longitude"));
    assert_eq!((&bounds.begin1, &bounds.end2), (&json!(1), &json!(4)));
}

// Should reload the same filters from a data-list snapshot.
#[test]
fn data_list_snapshot() {
    let mut service = FilterService::new();
    service.create_filters(
        "widget",
        &[eq("orders", "status", "a"), eq("orders", "customer_id", 7)],
        &dataset(),
    );

    let lists = service.to_data_lists();
    assert_eq!(lists.len(), 4);

    let mut restored = FilterService::new();
    restored.set_filters_from_data_lists("loader", &lists);
    assert_eq!(restored.get_filters(), service.get_filters());
}

// Should replace every filter when loading configs.
#[test]
fn load_configs() {
    let mut service = FilterService::new();
    service.create_filters("widget", &[eq("orders", "status", "a")], &dataset());

    let changes = service.set_filters_from_configs(
        "loader",
        &[eq("orders", "status", "b"), eq("orders", "customer_id", 7)],
        &dataset(),
    );
    assert_eq!(changes.len(), 4);

    let filters = owned(&service);
    assert_eq!(filters.len(), 4);
    assert_eq!(list_values(&filters[0]), vec![json!("b")]);
}
