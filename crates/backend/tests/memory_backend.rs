use std::time::Duration;

use backend::{
    BackendError, CatalogBackend, InMemoryBackend, NewQuestion, NewQuestionSet, QuestionQuery,
    QuizBackend,
};
use quiz_core::model::{
    AnswerSubmission, Choice, QuestionId, QuestionSetId, QuestionType, SelectionCriteria,
    TypeFilter,
};
use quiz_core::time::fixed_now;
use quiz_core::Clock;

fn mixed_set(name: &str, multiple_choice: usize, short_answer: usize) -> NewQuestionSet {
    let mut questions = Vec::new();
    for i in 0..multiple_choice {
        questions.push(NewQuestion::multiple_choice(
            format!("{name} choice question {i}"),
            vec![
                Choice::new("A", "first"),
                Choice::new("B", "second"),
                Choice::new("C", "third"),
            ],
            "A",
        ));
    }
    for i in 0..short_answer {
        questions.push(NewQuestion::short_answer(
            format!("{name} short question {i}"),
            "answer",
        ));
    }
    NewQuestionSet::new(name, questions)
}

async fn answer(backend: &InMemoryBackend, id: QuestionId, text: &str) {
    backend
        .submit(&AnswerSubmission {
            question_id: id,
            user_answer: text.into(),
            time_spent: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_set_selection_matches_nothing() {
    let backend = InMemoryBackend::new();
    backend.import_set(mixed_set("Bio", 3, 2)).unwrap();

    let count = backend.count(&SelectionCriteria::new()).await.unwrap();
    assert_eq!(count, 0);
    assert!(matches!(
        backend.start(&SelectionCriteria::new()).await,
        Err(BackendError::NotFound(_))
    ));
}

#[tokio::test]
async fn count_filters_by_set_and_type() {
    let backend = InMemoryBackend::new();
    let bio = backend.import_set(mixed_set("Bio", 5, 2)).unwrap();
    let chem = backend.import_set(mixed_set("Chem", 4, 1)).unwrap();

    let both = SelectionCriteria::new().with_sets([bio, chem]);
    assert_eq!(backend.count(&both).await.unwrap(), 12);

    let bio_mc = SelectionCriteria::new()
        .with_set(bio)
        .with_type_filter(TypeFilter::Only(QuestionType::MultipleChoice));
    assert_eq!(backend.count(&bio_mc).await.unwrap(), 5);

    let unknown = SelectionCriteria::new().with_set(QuestionSetId::new(99));
    assert_eq!(backend.count(&unknown).await.unwrap(), 0);
}

#[tokio::test]
async fn start_truncates_to_limit_and_keeps_order_without_shuffle() {
    let backend = InMemoryBackend::new();
    let bio = backend.import_set(mixed_set("Bio", 6, 0)).unwrap();

    let criteria = SelectionCriteria::new()
        .with_set(bio)
        .with_shuffle_questions(false)
        .with_shuffle_choices(false)
        .with_limit(4)
        .unwrap();
    let questions = backend.start(&criteria).await.unwrap();

    let ids: Vec<u64> = questions.iter().map(|q| q.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    let labels: Vec<&str> = questions[0].choices().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B", "C"]);
    // The count reflects the whole pool, not the session limit.
    assert_eq!(backend.count(&criteria).await.unwrap(), 6);
}

#[tokio::test]
async fn shuffled_start_returns_the_same_pool() {
    let backend = InMemoryBackend::new();
    let bio = backend.import_set(mixed_set("Bio", 8, 0)).unwrap();

    let questions = backend
        .start(&SelectionCriteria::new().with_set(bio))
        .await
        .unwrap();
    let mut ids: Vec<u64> = questions.iter().map(|q| q.id().value()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    for question in &questions {
        assert_eq!(question.choices().len(), 3);
        assert!(question.choice("A").is_some());
    }
}

#[tokio::test]
async fn bookmarked_only_pool_follows_bookmarks() {
    let backend = InMemoryBackend::new();
    let bio = backend.import_set(mixed_set("Bio", 3, 0)).unwrap();
    backend.add_bookmark(QuestionId::new(2)).await.unwrap();

    let criteria = SelectionCriteria::new()
        .with_set(bio)
        .with_bookmarked_only(true);
    assert_eq!(backend.count(&criteria).await.unwrap(), 1);
    assert_eq!(
        backend.list_bookmarks().await.unwrap(),
        vec![QuestionId::new(2)]
    );

    backend.remove_bookmark(QuestionId::new(2)).await.unwrap();
    assert_eq!(backend.count(&criteria).await.unwrap(), 0);
}

#[tokio::test]
async fn frequently_wrong_pool_and_catalog_use_different_attempt_floors() {
    let backend = InMemoryBackend::new();
    let bio = backend.import_set(mixed_set("Bio", 3, 0)).unwrap();

    // Question 1: one wrong attempt. Question 2: two wrong, one right.
    answer(&backend, QuestionId::new(1), "B").await;
    answer(&backend, QuestionId::new(2), "B").await;
    answer(&backend, QuestionId::new(2), "C").await;
    answer(&backend, QuestionId::new(2), "a").await;
    answer(&backend, QuestionId::new(3), "A").await;

    let criteria = SelectionCriteria::new()
        .with_set(bio)
        .with_frequently_wrong_only(true);
    assert_eq!(backend.count(&criteria).await.unwrap(), 2);

    let listed = backend.frequently_wrong(0.5).await.unwrap();
    let ids: Vec<u64> = listed.iter().map(|r| r.id().value()).collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn catalog_listing_pages_and_validates_limit() {
    let backend = InMemoryBackend::new();
    let bio = backend.import_set(mixed_set("Bio", 3, 2)).unwrap();
    backend.import_set(mixed_set("Chem", 1, 0)).unwrap();

    let page = backend
        .list_questions(&QuestionQuery {
            set_id: Some(bio),
            question_type: Some(QuestionType::ShortAnswer),
            limit: 1,
            offset: 1,
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].answer, "answer");
    assert_eq!(page[0].set_id, Some(bio));

    let err = backend
        .list_questions(&QuestionQuery {
            limit: 101,
            ..QuestionQuery::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Invalid(_)));
}

#[tokio::test]
async fn deleting_a_set_cascades() {
    let backend = InMemoryBackend::new();
    let bio = backend.import_set(mixed_set("Bio", 2, 0)).unwrap();
    let chem = backend.import_set(mixed_set("Chem", 1, 0)).unwrap();
    backend.add_bookmark(QuestionId::new(1)).await.unwrap();

    backend.delete_set(bio).await.unwrap();

    let sets = backend.list_sets().await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].id, chem);
    assert!(backend.list_bookmarks().await.unwrap().is_empty());
    assert!(matches!(
        backend.get_question(QuestionId::new(1)).await,
        Err(BackendError::NotFound(_))
    ));
    assert!(matches!(
        backend.delete_set(bio).await,
        Err(BackendError::NotFound(_))
    ));
}

#[tokio::test]
async fn submitting_unknown_question_is_not_found() {
    let backend = InMemoryBackend::new();
    let err = backend
        .submit(&AnswerSubmission {
            question_id: QuestionId::new(42),
            user_answer: "A".into(),
            time_spent: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn submissions_are_kept_in_attempt_history() {
    let backend = InMemoryBackend::new().with_clock(Clock::fixed(fixed_now()));
    backend.import_set(mixed_set("Geo", 0, 1)).unwrap();
    let id = QuestionId::new(1);

    backend
        .submit(&AnswerSubmission {
            question_id: id,
            user_answer: " Answer ".into(),
            time_spent: Some(Duration::from_secs(12)),
        })
        .await
        .unwrap();
    answer(&backend, id, "wrong").await;

    let history = backend.attempts_for(id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].is_correct);
    assert_eq!(history[0].user_answer, " Answer ");
    assert_eq!(history[0].time_spent, Some(Duration::from_secs(12)));
    assert_eq!(history[0].attempted_at, fixed_now());
    assert!(!history[1].is_correct);
    assert_eq!(history[1].time_spent, None);
    assert!(backend.attempts_for(QuestionId::new(2)).unwrap().is_empty());
}
