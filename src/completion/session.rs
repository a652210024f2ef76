//! Per-provider completion session state

use parking_lot::Mutex;
use tracing::trace;

use crate::model::TypeName;

/// Holds the type of the most recently accepted field or method.
///
/// A single most-recent-wins slot: accepting `list.get(0)` stores
/// `java.lang.Object` so that the following `.` completes on it. Accept events
/// and queries may come from different threads, hence the mutex.
#[derive(Debug, Default)]
pub struct CompletionSession {
    last_inferred_type: Mutex<Option<TypeName>>,
}

impl CompletionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&self, type_name: TypeName) {
        trace!("Remembering last inferred type {}", type_name);
        *self.last_inferred_type.lock() = Some(type_name);
    }

    pub fn last_inferred_type(&self) -> Option<TypeName> {
        self.last_inferred_type.lock().clone()
    }

    pub fn clear(&self) {
        *self.last_inferred_type.lock() = None;
    }
}
