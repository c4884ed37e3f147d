//! Daily unique-visitor tracking.

use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug)]
struct Window {
    date: NaiveDate,
    seen: HashSet<String>,
}

/// Remembers which visitors were seen today. The set is cleared when the
/// local date changes.
#[derive(Debug)]
pub struct VisitorTracker {
    window: Mutex<Window>,
}

impl VisitorTracker {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(Window {
                date: Local::now().date_naive(),
                seen: HashSet::new(),
            }),
        }
    }

    /// `true` the first time `visitor` is seen on `today`.
    pub fn observe(&self, visitor: &str, today: NaiveDate) -> bool {
        let mut window = match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if window.date != today {
            window.date = today;
            window.seen.clear();
        }
        window.seen.insert(visitor.to_string())
    }

    pub fn observe_now(&self, visitor: &str) -> bool {
        self.observe(visitor, Local::now().date_naive())
    }
}

impl Default for VisitorTracker {
    fn default() -> Self {
        Self::new()
    }
}
