//! # Filter Ids
//!
//! Filters are identified by a string id that is unique for the lifetime of
//! the generator that issued it. Ids arriving from outside (configs, data
//! lists) are reserved so generated ids never collide with them.

use std::collections::HashSet;

use uuid::Uuid;

/// Issues unique filter ids.
pub trait IdGenerator: Send {
    /// Issue an id not previously issued or reserved.
    fn next_id(&mut self) -> String;

    /// Mark an externally supplied id as taken.
    fn reserve(&mut self, id: &str);
}

/// Issues `id0`, `id1`, ... skipping any id already seen.
///
/// The seen set is never pruned.
#[derive(Clone, Debug, Default)]
pub struct CounterIds {
    counter: u64,
    seen: HashSet<String>,
}

impl CounterIds {
    /// Create a generator starting at `id0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for CounterIds {
    fn next_id(&mut self) -> String {
        loop {
            let id = format!("id{}", self.counter);
            self.counter += 1;
            if self.seen.insert(id.clone()) {
                return id;
            }
        }
    }

    fn reserve(&mut self, id: &str) {
        self.seen.insert(id.to_string());
    }
}

/// Issues random UUID v4 ids.
#[derive(Clone, Debug, Default)]
pub struct UuidIds {
    seen: HashSet<String>,
}

impl UuidIds {
    /// Create a generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.seen.insert(id.clone()) {
                return id;
            }
        }
    }

    fn reserve(&mut self, id: &str) {
        self.seen.insert(id.to_string());
    }
}
