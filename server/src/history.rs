//! Linear, shared undo/redo history for a room's canvas.
//!
//! The history keeps two views of the same strokes:
//! - an append-only action log with a cursor separating applied actions from
//!   undone (redo-able) ones
//! - the active projection, the strokes currently on the canvas keyed by id in
//!   the order they were (re)applied
//!
//! While a stroke is being drawn only its projection entry grows; the log copy
//! is refreshed once when the stroke is finished. The two never share a
//! `Stroke` value, so in-progress points cannot leak into an undone entry.
//!
//! There is exactly one cursor per room. Undo and redo act on whatever is at
//! the cursor regardless of who authored it.

use indexmap::IndexMap;
use log::debug;
use shared::Stroke;

/// A recorded, undoable change to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    Add(Stroke),
}

impl HistoryAction {
    pub fn stroke(&self) -> &Stroke {
        match self {
            HistoryAction::Add(stroke) => stroke,
        }
    }
}

#[derive(Debug, Default)]
pub struct DrawingHistory {
    log: Vec<HistoryAction>,
    /// Index of the last applied action; `None` when nothing is applied.
    cursor: Option<usize>,
    active: IndexMap<String, Stroke>,
}

impl DrawingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly started stroke and puts it on the canvas.
    ///
    /// Any undone actions past the cursor are discarded first: a new write
    /// forecloses the previously undone branch. Returns false without touching
    /// the history if a stroke with the same id is already on the canvas.
    pub fn add_stroke(&mut self, stroke: &Stroke) -> bool {
        if self.active.contains_key(&stroke.id) {
            return false;
        }

        let applied = self.applied_len();
        if applied < self.log.len() {
            debug!(
                "Pruning {} undone action(s) before adding {}",
                self.log.len() - applied,
                stroke.id
            );
            self.log.truncate(applied);
        }

        self.log.push(HistoryAction::Add(stroke.clone()));
        self.cursor = Some(self.log.len() - 1);
        self.active.insert(stroke.id.clone(), stroke.clone());
        true
    }

    /// Extends a live stroke. The log entry is left as is until
    /// [`finish_stroke`](Self::finish_stroke).
    pub fn add_point(&mut self, stroke_id: &str, x: f64, y: f64) -> bool {
        match self.active.get_mut(stroke_id) {
            Some(stroke) => {
                stroke.push_point(x, y);
                true
            }
            None => false,
        }
    }

    /// Copies the live stroke's full point sequence back into its log entry.
    ///
    /// Does nothing if the stroke is no longer on the canvas (undone or
    /// cleared while it was being drawn).
    pub fn finish_stroke(&mut self, stroke_id: &str) -> bool {
        let Some(live) = self.active.get(stroke_id) else {
            return false;
        };

        let applied = self.applied_len();
        match self.log[..applied]
            .iter_mut()
            .rev()
            .find(|action| action.stroke().id == stroke_id)
        {
            Some(HistoryAction::Add(entry)) => {
                *entry = live.clone();
                true
            }
            None => false,
        }
    }

    /// Takes the action at the cursor off the canvas.
    ///
    /// Returns the removed stroke, or `None` when nothing is applied.
    pub fn undo(&mut self, actor_id: &str) -> Option<Stroke> {
        let cursor = self.cursor?;
        let stroke = self.log[cursor].stroke().clone();

        self.cursor = cursor.checked_sub(1);
        self.active.shift_remove(&stroke.id);

        debug!(
            "Undo by {}: removed stroke {} (authored by {})",
            actor_id, stroke.id, stroke.user_id
        );
        Some(stroke)
    }

    /// Re-applies the next undone action.
    ///
    /// Returns the restored stroke, or `None` when the cursor is already at
    /// the end of the log.
    pub fn redo(&mut self, actor_id: &str) -> Option<Stroke> {
        let next = self.applied_len();
        let stroke = self.log.get(next)?.stroke().clone();

        self.cursor = Some(next);
        self.active.insert(stroke.id.clone(), stroke.clone());

        debug!("Redo by {}: restored stroke {}", actor_id, stroke.id);
        Some(stroke)
    }

    /// Wipes the canvas and the whole log. This is not itself undoable.
    pub fn clear(&mut self) {
        self.log.clear();
        self.active.clear();
        self.cursor = None;
    }

    /// Strokes currently on the canvas, in draw order.
    pub fn strokes(&self) -> Vec<Stroke> {
        self.active.values().cloned().collect()
    }

    pub fn stroke(&self, stroke_id: &str) -> Option<&Stroke> {
        self.active.get(stroke_id)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn log(&self) -> &[HistoryAction] {
        &self.log
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.applied_len() < self.log.len()
    }

    /// Number of strokes on the canvas.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn applied_len(&self) -> usize {
        self.cursor.map_or(0, |cursor| cursor + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Point;

    fn stroke(id: &str, user: &str) -> Stroke {
        Stroke::begin(id, user, "#3b82f6", 0.0, 0.0, "#000000", 4.0, 1)
    }

    fn ids(history: &DrawingHistory) -> Vec<String> {
        history.strokes().into_iter().map(|s| s.id).collect()
    }

    /// The projection must always equal the applied prefix of the log.
    fn assert_projection_matches_log(history: &DrawingHistory) {
        let applied = history.cursor().map_or(0, |c| c + 1);
        let mut from_log: Vec<String> = history.log()[..applied]
            .iter()
            .map(|action| action.stroke().id.clone())
            .collect();
        let mut active = ids(history);
        from_log.sort();
        active.sort();
        assert_eq!(from_log, active);
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = DrawingHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_add_stroke_advances_cursor() {
        let mut history = DrawingHistory::new();

        assert!(history.add_stroke(&stroke("a", "alice")));
        assert!(history.add_stroke(&stroke("b", "alice")));

        assert_eq!(history.cursor(), Some(1));
        assert_eq!(ids(&history), vec!["a", "b"]);
        assert_projection_matches_log(&history);
    }

    #[test]
    fn test_add_stroke_rejects_live_duplicate_id() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));

        assert!(!history.add_stroke(&stroke("a", "bob")));
        assert_eq!(history.log().len(), 1);
        assert_eq!(history.stroke("a").map(|s| s.user_id.as_str()), Some("alice"));
    }

    #[test]
    fn test_add_point_only_touches_projection() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));

        assert!(history.add_point("a", 1.0, 1.0));
        assert!(history.add_point("a", 2.0, 2.0));

        assert_eq!(history.stroke("a").map(|s| s.points.len()), Some(3));
        assert_eq!(history.log()[0].stroke().points.len(), 1);
    }

    #[test]
    fn test_add_point_unknown_stroke_is_noop() {
        let mut history = DrawingHistory::new();
        assert!(!history.add_point("missing", 1.0, 1.0));
        assert!(history.is_empty());
    }

    #[test]
    fn test_finish_stroke_syncs_log_entry() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.add_point("a", 1.0, 1.0);
        history.add_point("a", 2.0, 2.0);

        assert!(history.finish_stroke("a"));

        let logged = history.log()[0].stroke();
        assert_eq!(logged.points, vec![Point(0.0, 0.0), Point(1.0, 1.0), Point(2.0, 2.0)]);
    }

    #[test]
    fn test_finish_stroke_after_undo_is_noop() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.add_point("a", 1.0, 1.0);
        history.undo("alice");

        assert!(!history.finish_stroke("a"));
        assert_eq!(history.log()[0].stroke().points.len(), 1);
    }

    #[test]
    fn test_log_and_projection_do_not_alias() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.add_point("a", 5.0, 5.0);
        history.finish_stroke("a");

        // Points arriving after completion must not reach the log copy.
        history.add_point("a", 9.0, 9.0);
        assert_eq!(history.log()[0].stroke().points.len(), 2);
        assert_eq!(history.stroke("a").map(|s| s.points.len()), Some(3));
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.add_point("a", 1.0, 2.0);
        history.add_point("a", 3.0, 4.0);
        history.finish_stroke("a");

        let before_strokes = history.strokes();
        let before_cursor = history.cursor();

        let undone = history.undo("alice");
        assert_eq!(undone.map(|s| s.id), Some("a".to_string()));
        assert!(history.is_empty());

        let redone = history.redo("alice");
        assert_eq!(redone.as_ref().map(|s| s.points.len()), Some(3));
        assert_eq!(history.strokes(), before_strokes);
        assert_eq!(history.cursor(), before_cursor);
    }

    #[test]
    fn test_redo_branch_pruning() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("A", "alice"));
        history.add_stroke(&stroke("B", "alice"));
        history.undo("alice");
        history.add_stroke(&stroke("C", "alice"));

        assert_eq!(history.redo("alice"), None);
        assert_eq!(ids(&history), vec!["A", "C"]);
        assert_eq!(history.log().len(), 2);
        assert_projection_matches_log(&history);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut history = DrawingHistory::new();
        assert_eq!(history.undo("alice"), None);
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn test_undo_to_beginning_then_redo_all() {
        let mut history = DrawingHistory::new();
        for id in ["a", "b", "c"] {
            history.add_stroke(&stroke(id, "alice"));
        }

        assert!(history.undo("alice").is_some());
        assert!(history.undo("alice").is_some());
        assert!(history.undo("alice").is_some());
        assert_eq!(history.undo("alice"), None);
        assert_eq!(history.cursor(), None);
        assert!(history.can_redo());

        for expected in ["a", "b", "c"] {
            assert_eq!(history.redo("bob").map(|s| s.id), Some(expected.to_string()));
            assert_projection_matches_log(&history);
        }
        assert_eq!(history.redo("bob"), None);
        assert_eq!(ids(&history), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_redone_stroke_moves_to_top() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.add_stroke(&stroke("b", "alice"));
        history.undo("alice");
        history.redo("alice");

        assert_eq!(ids(&history), vec!["a", "b"]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.add_stroke(&stroke("b", "bob"));
        history.undo("alice");

        history.clear();

        assert!(history.is_empty());
        assert!(history.log().is_empty());
        assert_eq!(history.undo("alice"), None);
        assert_eq!(history.redo("alice"), None);
    }

    #[test]
    fn test_undo_is_not_author_scoped() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("s1", "x"));
        history.add_point("s1", 1.0, 1.0);
        history.add_point("s1", 2.0, 2.0);
        history.finish_stroke("s1");

        let undone = history.undo("y");

        assert_eq!(undone.map(|s| s.user_id), Some("x".to_string()));
        assert!(history.stroke("s1").is_none());
    }

    #[test]
    fn test_undo_in_progress_stroke_drops_later_points() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.add_point("a", 1.0, 1.0);
        history.undo("bob");

        assert!(!history.add_point("a", 2.0, 2.0));
        assert!(!history.finish_stroke("a"));

        let restored = history.redo("bob");
        assert_eq!(restored.map(|s| s.points.len()), Some(1));
    }

    #[test]
    fn test_stroke_id_reusable_after_undo_and_new_write() {
        let mut history = DrawingHistory::new();
        history.add_stroke(&stroke("a", "alice"));
        history.undo("alice");

        assert!(history.add_stroke(&stroke("a", "bob")));
        assert_eq!(history.log().len(), 1);
        assert_eq!(history.stroke("a").map(|s| s.user_id.as_str()), Some("bob"));
    }
}
