//! Line-oriented quiz driver on stdin/stdout.

use std::error::Error;
use std::io::Write;

use quiz_core::model::{QuestionType, SelectionCriteria};
use quiz_core::session::{AnswerState, SessionState};
use services::{AppServices, CountEstimator, SessionView};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "Type a choice label or your answer. Commands: :n next, :p previous, :b bookmark, :q quit";

/// Resolve the count for `criteria`, printing the animated value as it settles.
pub async fn show_count(
    estimator: &CountEstimator,
    criteria: &SelectionCriteria,
) -> Result<Option<u32>, Box<dyn Error>> {
    let mut rx = estimator.subscribe();
    let count = estimator.observe(criteria).await;

    let mut stdout = std::io::stdout();
    loop {
        let current = *rx.borrow_and_update();
        write!(stdout, "\rmatching questions: {:>4}", current.display)?;
        stdout.flush()?;
        if current.display == current.target && !current.loading {
            break;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    writeln!(stdout)?;
    Ok(count)
}

pub async fn run_quiz(
    services: &AppServices,
    criteria: &SelectionCriteria,
) -> Result<(), Box<dyn Error>> {
    let estimator = services.count_estimator();
    show_count(&estimator, criteria).await?;

    let quiz = services.quiz_loop();
    let handle = match quiz
        .start_session(criteria, estimator.last_known_count())
        .await
    {
        Ok(handle) => handle,
        Err(err) => {
            println!("{}", err.user_message());
            return Ok(());
        }
    };

    println!("{HELP}");
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();
    render(&handle.view());

    while let Some(line) = input.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            ":q" => break,
            ":n" => match quiz.next(&handle) {
                Ok(true) => render(&handle.view()),
                Ok(false) => {
                    println!("That was the last question.");
                    break;
                }
                Err(err) => println!("{err}"),
            },
            ":p" => match quiz.previous(&handle) {
                Ok(true) => render(&handle.view()),
                Ok(false) => println!("Already at the first question."),
                Err(err) => println!("{err}"),
            },
            ":b" => {
                let Some(question) = handle.view().question else {
                    continue;
                };
                match quiz.toggle_bookmark(&handle, question.id()).await {
                    Ok(true) => println!("Bookmarked."),
                    Ok(false) => println!("Bookmark removed."),
                    Err(err) => println!("{}", err.user_message()),
                }
            }
            answer => {
                if let Err(err) = quiz.select_answer(&handle, answer) {
                    println!("{err}");
                    continue;
                }
                match quiz.submit(&handle).await {
                    Ok(result) if result.is_correct => println!("Correct!"),
                    Ok(result) => {
                        println!("Incorrect. Correct answer: {}", result.correct_answer);
                        if let Some(explanation) = &result.explanation {
                            println!("  {explanation}");
                        }
                    }
                    Err(err) => println!("{}", err.user_message()),
                }
                println!("(:n for the next question)");
            }
        }
    }

    if let Some(summary) = quiz.end(&handle) {
        let accuracy = summary
            .accuracy()
            .map_or_else(|| "-".to_string(), |a| format!("{:.0}%", a * 100.0));
        println!(
            "Finished: {}/{} correct out of {} answered ({accuracy}).",
            summary.correct, summary.total_questions, summary.answered
        );
    }
    Ok(())
}

fn render(view: &SessionView) {
    let (Some(question), Some(progress)) = (&view.question, view.progress) else {
        return;
    };

    let marker = if view.is_bookmarked { " [bookmarked]" } else { "" };
    println!();
    println!(
        "Question {}/{} ({}){marker}",
        progress.position,
        progress.total,
        kind_label(question.kind())
    );
    println!("{}", question.stem());
    for choice in question.choices() {
        println!("  {}) {}", choice.label, choice.text);
    }

    if view.state == SessionState::Active(AnswerState::Answered) {
        if let Some(result) = &view.result {
            let verdict = if result.is_correct { "correct" } else { "incorrect" };
            println!(
                "You answered {} ({verdict}); correct answer: {}",
                result.user_answer, result.correct_answer
            );
        }
    }
    println!(
        "Score: {}/{}",
        view.score.correct(),
        view.score.total()
    );
}

fn kind_label(kind: QuestionType) -> &'static str {
    match kind {
        QuestionType::MultipleChoice => "multiple choice",
        QuestionType::ShortAnswer => "short answer",
        QuestionType::Essay => "essay",
    }
}
