//! # Tracked Records
//!
//! A local record and whether storage has confirmed it.
//!
//! ```text
//!             create / update / import
//!   (absent) ─────────────────────────► Pending ──── save ok ────► Confirmed
//!      ▲                                   │      (id remapped)       │
//!      └──────── save failed (new) ────────┘                          │
//!                                          ▲        local edit        │
//!                                          └──────────────────────────┘
//! ```

use serde::Serialize;

use briik_core::{Order, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordState {
    /// Only in memory, or changed since storage last confirmed it.
    Pending,

    /// Matches what storage holds.
    Confirmed,
}

/// A record plus its [`RecordState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracked<T> {
    pub record: T,
    pub state: RecordState,
}

impl<T> Tracked<T> {
    pub fn pending(record: T) -> Self {
        Tracked {
            record,
            state: RecordState::Pending,
        }
    }

    pub fn confirmed(record: T) -> Self {
        Tracked {
            record,
            state: RecordState::Confirmed,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == RecordState::Pending
    }

    /// Replaces the record with the stored version.
    pub fn confirm(&mut self, stored: T) {
        self.record = stored;
        self.state = RecordState::Confirmed;
    }
}

/// Which store and order the user is looking at.
///
/// Holds ids only; the workspace rewrites them when an id is remapped and
/// clears them when the record goes away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub store_id: Option<String>,
    pub order_id: Option<String>,
}

impl Selection {
    pub(crate) fn remap_store(&mut self, old: &str, new: &str) {
        if self.store_id.as_deref() == Some(old) {
            self.store_id = Some(new.to_string());
        }
    }

    pub(crate) fn remap_order(&mut self, old: &str, new: &str) {
        if self.order_id.as_deref() == Some(old) {
            self.order_id = Some(new.to_string());
        }
    }

    /// Clears whatever points at the store `store_id` or one of `order_ids`.
    pub(crate) fn forget(&mut self, store_id: Option<&str>, order_ids: &[String]) {
        if store_id.is_some() && self.store_id.as_deref() == store_id {
            self.store_id = None;
        }
        if let Some(selected) = &self.order_id {
            if order_ids.contains(selected) {
                self.order_id = None;
            }
        }
    }
}

/// Id lookup for tracked records.
pub(crate) trait HasId {
    fn id(&self) -> &str;
}

impl HasId for Store {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for Order {
    fn id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn find<'a, T: HasId>(records: &'a [Tracked<T>], id: &str) -> Option<&'a Tracked<T>> {
    records.iter().find(|t| t.record.id() == id)
}

pub(crate) fn position<T: HasId>(records: &[Tracked<T>], id: &str) -> Option<usize> {
    records.iter().position(|t| t.record.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_replaces_record() {
        let mut tracked = Tracked::pending(Store::new("Luna", "Vigo"));
        assert!(tracked.is_pending());

        let mut stored = tracked.record.clone();
        stored.id = "confirmed".into();
        tracked.confirm(stored);

        assert_eq!(tracked.state, RecordState::Confirmed);
        assert_eq!(tracked.record.id, "confirmed");
    }

    #[test]
    fn test_selection_remap_and_forget() {
        let mut selection = Selection {
            store_id: Some("tmp-store".into()),
            order_id: Some("tmp-order".into()),
        };

        selection.remap_store("other", "x");
        assert_eq!(selection.store_id.as_deref(), Some("tmp-store"));

        selection.remap_store("tmp-store", "s1");
        selection.remap_order("tmp-order", "o1");
        assert_eq!(selection.store_id.as_deref(), Some("s1"));
        assert_eq!(selection.order_id.as_deref(), Some("o1"));

        selection.forget(None, &["o1".to_string()]);
        assert_eq!(selection.store_id.as_deref(), Some("s1"));
        assert_eq!(selection.order_id, None);

        selection.forget(Some("s1"), &[]);
        assert_eq!(selection, Selection::default());
    }
}
