use super::types::{ClassificationResult, HistoryId};
use crate::error::ClassificationError;
use crate::features::FeatureVector;
use crate::region::RegionBounds;
use chrono::{DateTime, Utc};
use tracing::debug;

/// One captured (and possibly resolved) snapshot in the navigable log
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub captured_feature: FeatureVector,
    pub result: Option<ClassificationResult>,
    pub timestamp: DateTime<Utc>,
    pub bounds: RegionBounds,
}

/// Ordered, cursor-addressable capture log.
///
/// The cursor is `None` exactly when the log is empty, otherwise it indexes a
/// live entry. Ids keep increasing across deletes and clears.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    last_id: u64,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry and point the cursor at it
    pub fn append(&mut self, feature: FeatureVector, bounds: RegionBounds) -> HistoryId {
        self.last_id += 1;
        let id = HistoryId(self.last_id);

        self.entries.push(HistoryEntry {
            id,
            captured_feature: feature,
            result: None,
            timestamp: Utc::now(),
            bounds,
        });
        self.cursor = Some(self.entries.len() - 1);

        debug!("History entry {} appended ({} total)", id, self.entries.len());
        id
    }

    /// Move the cursor one entry back; no-op at the first entry
    pub fn prev(&mut self) -> Option<&HistoryEntry> {
        if let Some(index) = self.cursor {
            self.cursor = Some(index.saturating_sub(1));
        }
        self.current()
    }

    /// Move the cursor one entry forward; no-op at the last entry
    pub fn next(&mut self) -> Option<&HistoryEntry> {
        if let Some(index) = self.cursor {
            if index + 1 < self.entries.len() {
                self.cursor = Some(index + 1);
            }
        }
        self.current()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    pub fn get(&self, id: HistoryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Attach a classification or learn result to an entry
    pub fn attach_result(
        &mut self,
        id: HistoryId,
        result: ClassificationResult,
    ) -> Result<(), ClassificationError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(ClassificationError::NotFound {
                kind: "history entry",
                id: id.0,
            })?;

        entry.result = Some(result);
        Ok(())
    }

    /// Remove an entry. When the cursor pointed at it, the cursor moves to
    /// the entry now in the same position, or to the new last entry.
    pub fn delete(&mut self, id: HistoryId) -> Result<HistoryEntry, ClassificationError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(ClassificationError::NotFound {
                kind: "history entry",
                id: id.0,
            })?;

        let removed = self.entries.remove(index);

        self.cursor = match self.cursor {
            _ if self.entries.is_empty() => None,
            Some(cursor) if cursor > index => Some(cursor - 1),
            Some(cursor) => Some(cursor.min(self.entries.len() - 1)),
            None => None,
        };

        debug!("History entry {} deleted ({} left)", id, self.entries.len());
        Ok(removed)
    }

    /// Drop every entry; ids are not reset. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.cursor = None;
        removed
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor_index(&self) -> Option<usize> {
        self.cursor
    }

    /// 1-based "n of m" position for display
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|index| (index + 1, self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(n: usize) -> (HistoryNavigator, Vec<HistoryId>) {
        let mut history = HistoryNavigator::new();
        let ids = (0..n)
            .map(|i| history.append(FeatureVector::new(vec![i as f32]), RegionBounds::default()))
            .collect();
        (history, ids)
    }

    #[test]
    fn test_empty_history_has_no_cursor() {
        let mut history = HistoryNavigator::new();
        assert!(history.current().is_none());
        assert!(history.prev().is_none());
        assert!(history.next().is_none());
        assert_eq!(history.position(), None);
    }

    #[test]
    fn test_append_moves_cursor_to_last() {
        let (history, ids) = history_with(3);
        assert_eq!(history.current().unwrap().id, ids[2]);
        assert_eq!(history.position(), Some((3, 3)));
    }

    #[test]
    fn test_navigation_stops_at_edges() {
        let (mut history, ids) = history_with(3);

        history.prev();
        history.prev();
        assert_eq!(history.cursor_index(), Some(0));
        assert_eq!(history.prev().unwrap().id, ids[0]);
        assert_eq!(history.cursor_index(), Some(0));

        history.next();
        history.next();
        assert_eq!(history.next().unwrap().id, ids[2]);
        assert_eq!(history.cursor_index(), Some(2));
    }

    #[test]
    fn test_delete_cursor_target_prefers_same_position() {
        let (mut history, ids) = history_with(3);
        history.prev();
        history.prev();

        history.delete(ids[0]).unwrap();
        assert_eq!(history.current().unwrap().id, ids[1]);
    }

    #[test]
    fn test_delete_last_moves_to_new_last() {
        let (mut history, ids) = history_with(3);

        history.delete(ids[2]).unwrap();
        assert_eq!(history.current().unwrap().id, ids[1]);
        assert_eq!(history.cursor_index(), Some(1));
    }

    #[test]
    fn test_delete_before_cursor_keeps_target() {
        let (mut history, ids) = history_with(3);

        history.delete(ids[0]).unwrap();
        assert_eq!(history.current().unwrap().id, ids[2]);
    }

    #[test]
    fn test_delete_only_entry_unsets_cursor() {
        let (mut history, ids) = history_with(1);

        history.delete(ids[0]).unwrap();
        assert!(history.current().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_delete_unknown_id() {
        let (mut history, ids) = history_with(1);
        history.delete(ids[0]).unwrap();

        assert_eq!(
            history.delete(ids[0]).unwrap_err(),
            ClassificationError::NotFound {
                kind: "history entry",
                id: ids[0].0
            }
        );
    }

    #[test]
    fn test_ids_survive_clear() {
        let (mut history, ids) = history_with(2);
        assert_eq!(history.clear(), 2);
        assert!(history.current().is_none());

        let fresh = history.append(FeatureVector::new(vec![0.0]), RegionBounds::default());
        assert!(fresh > ids[1]);
    }

    #[test]
    fn test_attach_result() {
        let (mut history, ids) = history_with(2);
        history
            .attach_result(ids[0], ClassificationResult::new("cat", 1.0))
            .unwrap();

        assert_eq!(history.get(ids[0]).unwrap().result.as_ref().unwrap().label, "cat");
        assert!(history.get(ids[1]).unwrap().result.is_none());
    }
}
