use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::category::CategoryTable;

/// Per-instance tally of responses, total and per category.
///
/// Owned by whoever serves requests and shared by reference; two counters
/// never observe each other's increments.
#[derive(Debug)]
pub struct InteractionCounter {
    total: AtomicU64,
    names: Vec<String>,
    per_category: Vec<AtomicU64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub total: u64,
    pub by_category: Vec<CategoryCount>,
}

impl InteractionCounter {
    pub fn new(table: &CategoryTable) -> Self {
        Self {
            total: AtomicU64::new(0),
            names: table
                .categories()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            per_category: table
                .categories()
                .iter()
                .map(|_| AtomicU64::new(0))
                .collect(),
        }
    }

    /// Count one response for the category at `index` in the table.
    /// Out-of-range indices still count toward the total.
    pub fn record(&self, index: usize) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if let Some(slot) = self.per_category.get(index) {
            slot.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.total(),
            by_category: self
                .names
                .iter()
                .zip(&self.per_category)
                .map(|(name, count)| CategoryCount {
                    category: name.clone(),
                    count: count.load(Ordering::Relaxed),
                })
                .collect(),
        }
    }
}
