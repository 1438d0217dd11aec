use backend::{BackendError, InMemoryBackend, NewQuestion, NewQuestionSet};
use quiz_core::model::Choice;

/// Local backend preloaded with a couple of small question sets.
pub fn seeded_backend() -> Result<InMemoryBackend, BackendError> {
    let backend = InMemoryBackend::new();

    backend.import_set(NewQuestionSet {
        name: "World Geography".into(),
        description: Some("Capitals and landmarks".into()),
        file_name: None,
        questions: vec![
            NewQuestion::multiple_choice(
                "What is the capital of Australia?",
                vec![
                    Choice::new("A", "Sydney"),
                    Choice::new("B", "Canberra"),
                    Choice::new("C", "Melbourne"),
                    Choice::new("D", "Perth"),
                ],
                "B",
            )
            .with_explanation("Canberra was purpose-built as a compromise between Sydney and Melbourne."),
            NewQuestion::multiple_choice(
                "Which river flows through Cairo?",
                vec![
                    Choice::new("A", "Tigris"),
                    Choice::new("B", "Euphrates"),
                    Choice::new("C", "Nile"),
                ],
                "C",
            ),
            NewQuestion::short_answer("What is the capital of Japan?", "Tokyo"),
        ],
    })?;

    backend.import_set(NewQuestionSet {
        name: "Basic Chemistry".into(),
        description: None,
        file_name: Some("chemistry.pdf".into()),
        questions: vec![
            NewQuestion::multiple_choice(
                "What is the chemical symbol for sodium?",
                vec![
                    Choice::new("A", "S"),
                    Choice::new("B", "Na"),
                    Choice::new("C", "So"),
                ],
                "B",
            )
            .with_explanation("From the Latin name natrium."),
            NewQuestion::short_answer("Which gas do plants absorb for photosynthesis?", "CO2"),
        ],
    })?;

    Ok(backend)
}
