use std::collections::BTreeSet;

use crate::model::ids::QuestionId;

/// A tentatively applied bookmark flip awaiting backend confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkToggle {
    question_id: QuestionId,
    bookmarked: bool,
}

impl BookmarkToggle {
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    /// Membership after the flip; `true` means the backend must add the bookmark.
    #[must_use]
    pub fn bookmarked(&self) -> bool {
        self.bookmarked
    }
}

/// Bookmarked question ids plus the ids whose toggle is still in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
    members: BTreeSet<QuestionId>,
    pending: BTreeSet<QuestionId>,
}

impl BookmarkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.members.contains(&id)
    }

    #[must_use]
    pub fn is_pending(&self, id: QuestionId) -> bool {
        self.pending.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.members.iter().copied()
    }

    /// Replace membership with the backend's view; pending toggles keep their local state.
    pub fn hydrate(&mut self, ids: impl IntoIterator<Item = QuestionId>) {
        let mut fresh: BTreeSet<QuestionId> = ids.into_iter().collect();
        for id in &self.pending {
            if self.members.contains(id) {
                fresh.insert(*id);
            } else {
                fresh.remove(id);
            }
        }
        self.members = fresh;
    }

    /// Flip membership locally and mark the id pending.
    ///
    /// Returns `None` when a toggle for this id is already in flight.
    pub(crate) fn begin_toggle(&mut self, id: QuestionId) -> Option<BookmarkToggle> {
        if !self.pending.insert(id) {
            return None;
        }
        let bookmarked = !self.members.contains(&id);
        self.apply(id, bookmarked);
        Some(BookmarkToggle {
            question_id: id,
            bookmarked,
        })
    }

    pub(crate) fn confirm(&mut self, toggle: &BookmarkToggle) {
        self.pending.remove(&toggle.question_id);
    }

    pub(crate) fn rollback(&mut self, toggle: &BookmarkToggle) {
        if self.pending.remove(&toggle.question_id) {
            self.apply(toggle.question_id, !toggle.bookmarked);
        }
    }

    fn apply(&mut self, id: QuestionId, bookmarked: bool) {
        if bookmarked {
            self.members.insert(id);
        } else {
            self.members.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_then_rollback_restores_membership() {
        let mut set = BookmarkSet::new();
        let id = QuestionId::new(4);

        let toggle = set.begin_toggle(id).unwrap();
        assert!(toggle.bookmarked());
        assert!(set.contains(id));
        assert!(set.is_pending(id));

        set.rollback(&toggle);
        assert!(!set.contains(id));
        assert!(!set.is_pending(id));
    }

    #[test]
    fn second_toggle_while_pending_is_refused() {
        let mut set = BookmarkSet::new();
        let id = QuestionId::new(1);
        let first = set.begin_toggle(id).unwrap();
        assert!(set.begin_toggle(id).is_none());

        set.confirm(&first);
        let second = set.begin_toggle(id).unwrap();
        assert!(!second.bookmarked());
        assert!(!set.contains(id));
    }

    #[test]
    fn hydrate_keeps_pending_local_state() {
        let mut set = BookmarkSet::new();
        let pending = QuestionId::new(9);
        let _toggle = set.begin_toggle(pending).unwrap();

        set.hydrate([QuestionId::new(1), QuestionId::new(2)]);

        assert!(set.contains(QuestionId::new(1)));
        assert!(set.contains(QuestionId::new(2)));
        assert!(set.contains(pending));
        assert_eq!(set.len(), 3);
    }
}
