//! # Test Fixtures
//!
//! A small shop dataset with relations between orders, customers, and
//! accounts, plus config builders used across the integration tests.

use credibil_filter::{
    CompoundFilterConfig, CompoundType, FieldKey, FilterConfig, Operator, SimpleFilterConfig,
    StaticDataset,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub const DATASTORE: &str = "es";
pub const DATABASE: &str = "shop";

// Relations: one customer id shared by three tables, and a location shared
// by orders and stores.
const DATASET: &str = r#"{
    "relations": [
        [
            ["es.shop.orders.customer_id"],
            ["es.shop.customers.id"],
            ["es.shop.accounts.customer"]
        ],
        [
            ["es.shop.orders.lat", "es.shop.orders.lon"],
            ["es.shop.stores.latitude", "es.shop.stores.longitude"]
        ]
    ],
    "labels": {
        "es.shop.orders": "Orders",
        "es.shop.orders.status": "Status",
        "es.shop.orders.customer_id": "Customer"
    }
}"#;

/// The shop dataset.
///
/// # Panics
///
/// Panics if the fixture JSON is invalid.
#[must_use]
pub fn dataset() -> StaticDataset {
    StaticDataset::from_json(DATASET).expect("should parse dataset")
}

/// A field in the shop database.
#[must_use]
pub fn key(table: &str, field: &str) -> FieldKey {
    FieldKey::new(DATASTORE, DATABASE, table, field)
}

/// A simple config on `table.field`.
#[must_use]
pub fn simple(
    table: &str, field: &str, operator: Operator, value: impl Into<Value>,
) -> FilterConfig {
    SimpleFilterConfig::new(&key(table, field), operator).value(value).into()
}

/// A simple config on `table.field` with no value.
#[must_use]
pub fn blank(table: &str, field: &str, operator: Operator) -> FilterConfig {
    SimpleFilterConfig::new(&key(table, field), operator).into()
}

/// An `=` config on `table.field`.
#[must_use]
pub fn eq(table: &str, field: &str, value: impl Into<Value>) -> FilterConfig {
    simple(table, field, Operator::Eq, value)
}

/// An AND of `configs`.
#[must_use]
pub fn and(configs: Vec<FilterConfig>) -> FilterConfig {
    CompoundFilterConfig::new(CompoundType::And, configs).into()
}

/// An OR of `configs`.
#[must_use]
pub fn or(configs: Vec<FilterConfig>) -> FilterConfig {
    CompoundFilterConfig::new(CompoundType::Or, configs).into()
}

/// Install a test subscriber honouring `RUST_LOG`. Safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
