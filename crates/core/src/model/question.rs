use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{QuestionId, QuestionSetId};

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
    Essay,
}

impl QuestionType {
    /// Wire name used by the backend (`multiple_choice`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::ShortAnswer => "short_answer",
            Self::Essay => "essay",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multiple_choice" => Ok(Self::MultipleChoice),
            "short_answer" => Ok(Self::ShortAnswer),
            "essay" => Ok(Self::Essay),
            other => Err(QuestionError::UnknownType(other.to_owned())),
        }
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("unknown question type: {0}")]
    UnknownType(String),

    #[error("question stem cannot be empty")]
    EmptyStem,

    #[error("choice label cannot be empty")]
    EmptyChoiceLabel,

    #[error("duplicate choice label: {0}")]
    DuplicateChoiceLabel(String),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One option of a multiple-choice question, e.g. `A. Paris`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub text: String,
}

impl Choice {
    #[must_use]
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Quiz-mode view of a question.
///
/// Answer and explanation are withheld: they only reach the client inside a
/// `SubmissionResult` after the backend grades a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionType,
    stem: String,
    choices: Vec<Choice>,
}

impl Question {
    /// Build a question as served by the backend.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyStem` for a blank stem and
    /// `QuestionError::EmptyChoiceLabel` / `DuplicateChoiceLabel` for malformed choices.
    pub fn new(
        id: QuestionId,
        kind: QuestionType,
        stem: impl Into<String>,
        choices: Vec<Choice>,
    ) -> Result<Self, QuestionError> {
        let stem = stem.into();
        if stem.trim().is_empty() {
            return Err(QuestionError::EmptyStem);
        }
        validate_choices(&choices)?;
        Ok(Self {
            id,
            kind,
            stem,
            choices,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        self.kind
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Questions without choices take free-text answers.
    #[must_use]
    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    #[must_use]
    pub fn choice(&self, label: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.label == label)
    }
}

fn validate_choices(choices: &[Choice]) -> Result<(), QuestionError> {
    let mut seen = HashSet::with_capacity(choices.len());
    for choice in choices {
        if choice.label.trim().is_empty() {
            return Err(QuestionError::EmptyChoiceLabel);
        }
        if !seen.insert(choice.label.as_str()) {
            return Err(QuestionError::DuplicateChoiceLabel(choice.label.clone()));
        }
    }
    Ok(())
}

//
// ─── CATALOG TYPES ─────────────────────────────────────────────────────────────
//

/// Full catalog entry, including the answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question: Question,
    pub set_id: Option<QuestionSetId>,
    pub answer: String,
    pub explanation: Option<String>,
}

impl QuestionRecord {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.question.id()
    }
}

/// A named group of questions produced by one upload or generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    pub id: QuestionSetId,
    pub name: String,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
