use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::ids::QuestionSetId;
use crate::model::question::QuestionType;

/// Default number of questions in one session.
pub const DEFAULT_SESSION_LIMIT: u32 = 20;

/// Largest session the backend accepts.
pub const MAX_SESSION_LIMIT: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CriteriaError {
    #[error("session limit must be between 1 and {max}, got {got}")]
    InvalidLimit { got: u32, max: u32 },
}

/// Question-type filter; `Any` leaves the type unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeFilter {
    #[default]
    Any,
    Only(QuestionType),
}

impl TypeFilter {
    #[must_use]
    pub fn matches(self, kind: QuestionType) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => wanted == kind,
        }
    }

    /// `None` for `Any`, which is how the backend expects "no filter".
    #[must_use]
    pub fn as_type(self) -> Option<QuestionType> {
        match self {
            Self::Any => None,
            Self::Only(kind) => Some(kind),
        }
    }
}

impl From<Option<QuestionType>> for TypeFilter {
    fn from(value: Option<QuestionType>) -> Self {
        value.map_or(Self::Any, Self::Only)
    }
}

/// Immutable snapshot of the user's filter and shuffle choices.
///
/// Every `with_*` method consumes the value and returns a new one, so a
/// criteria value observed by the count estimator never changes under it.
/// Equality is structural over all fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionCriteria {
    set_ids: BTreeSet<QuestionSetId>,
    type_filter: TypeFilter,
    shuffle_questions: bool,
    shuffle_choices: bool,
    bookmarked_only: bool,
    frequently_wrong_only: bool,
    limit: u32,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            set_ids: BTreeSet::new(),
            type_filter: TypeFilter::Any,
            shuffle_questions: true,
            shuffle_choices: true,
            bookmarked_only: false,
            frequently_wrong_only: false,
            limit: DEFAULT_SESSION_LIMIT,
        }
    }
}

impl SelectionCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_set(mut self, id: QuestionSetId) -> Self {
        self.set_ids.insert(id);
        self
    }

    #[must_use]
    pub fn without_set(mut self, id: QuestionSetId) -> Self {
        self.set_ids.remove(&id);
        self
    }

    #[must_use]
    pub fn with_sets(mut self, ids: impl IntoIterator<Item = QuestionSetId>) -> Self {
        self.set_ids = ids.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_type_filter(mut self, filter: TypeFilter) -> Self {
        self.type_filter = filter;
        self
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn with_shuffle_choices(mut self, shuffle: bool) -> Self {
        self.shuffle_choices = shuffle;
        self
    }

    #[must_use]
    pub fn with_bookmarked_only(mut self, only: bool) -> Self {
        self.bookmarked_only = only;
        self
    }

    #[must_use]
    pub fn with_frequently_wrong_only(mut self, only: bool) -> Self {
        self.frequently_wrong_only = only;
        self
    }

    /// Cap the number of questions in the built session.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::InvalidLimit` outside `1..=MAX_SESSION_LIMIT`.
    pub fn with_limit(mut self, limit: u32) -> Result<Self, CriteriaError> {
        if limit == 0 || limit > MAX_SESSION_LIMIT {
            return Err(CriteriaError::InvalidLimit {
                got: limit,
                max: MAX_SESSION_LIMIT,
            });
        }
        self.limit = limit;
        Ok(self)
    }

    #[must_use]
    pub fn set_ids(&self) -> &BTreeSet<QuestionSetId> {
        &self.set_ids
    }

    #[must_use]
    pub fn type_filter(&self) -> TypeFilter {
        self.type_filter
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn shuffle_choices(&self) -> bool {
        self.shuffle_choices
    }

    #[must_use]
    pub fn bookmarked_only(&self) -> bool {
        self.bookmarked_only
    }

    #[must_use]
    pub fn frequently_wrong_only(&self) -> bool {
        self.frequently_wrong_only
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// An empty set selection never means "all sets": it selects nothing.
    #[must_use]
    pub fn has_pool(&self) -> bool {
        !self.set_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selects_no_pool() {
        let criteria = SelectionCriteria::new()
            .with_bookmarked_only(true)
            .with_type_filter(TypeFilter::Only(QuestionType::ShortAnswer));
        assert!(!criteria.has_pool());
    }

    #[test]
    fn builders_produce_new_values_and_compare_structurally() {
        let base = SelectionCriteria::new().with_set(QuestionSetId::new(7));
        let same = SelectionCriteria::new().with_sets([QuestionSetId::new(7)]);
        assert_eq!(base, same);

        let changed = base.clone().with_shuffle_choices(false);
        assert_ne!(base, changed);
        assert!(base.shuffle_choices());
    }

    #[test]
    fn removing_last_set_clears_pool() {
        let criteria = SelectionCriteria::new()
            .with_set(QuestionSetId::new(1))
            .without_set(QuestionSetId::new(1));
        assert!(!criteria.has_pool());
    }

    #[test]
    fn limit_is_range_checked() {
        assert!(SelectionCriteria::new().with_limit(0).is_err());
        assert!(SelectionCriteria::new().with_limit(101).is_err());
        assert_eq!(SelectionCriteria::new().with_limit(5).unwrap().limit(), 5);
    }

    #[test]
    fn type_filter_matching() {
        assert!(TypeFilter::Any.matches(QuestionType::Essay));
        let only_mc = TypeFilter::Only(QuestionType::MultipleChoice);
        assert!(only_mc.matches(QuestionType::MultipleChoice));
        assert!(!only_mc.matches(QuestionType::ShortAnswer));
        assert_eq!(TypeFilter::from(None), TypeFilter::Any);
    }
}
