//! Practice runs driven through the application facade.

mod common;

use std::sync::Arc;

use message_chess::adapters::cache::InMemoryReviewCache;
use message_chess::adapters::oracles::{MockPersonaOracle, MockResponse};
use message_chess::application::{Components, ReviewApp};
use message_chess::domain::errors::{DomainError, ErrorKind};
use message_chess::domain::models::{RunId, RunState, Speaker, SynthesisStrategy, TURN_LIMIT};
use message_chess::services::{FixtureSynthesizer, PERSONA_FALLBACK_REPLY};

use common::fixture_config;

fn app_with_persona(persona: Arc<MockPersonaOracle>) -> ReviewApp {
    let components = Components {
        strategy: SynthesisStrategy::Fixture,
        synthesizer: Arc::new(FixtureSynthesizer::new()),
        persona_oracle: persona,
        cache: Arc::new(InMemoryReviewCache::default()),
    };
    ReviewApp::with_components(&fixture_config(), components)
}

async fn play_turns(app: &ReviewApp, run_id: &RunId, turns: u32) {
    for turn in 1..=turns {
        app.submit_user_message(run_id, &format!("message {turn}"))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_full_run_produces_review() {
    let app = ReviewApp::from_config(&fixture_config()).await.unwrap();
    let started = app.start_run(Some("dry")).await.unwrap();
    assert_eq!(started.state, RunState::NotStarted);
    assert_eq!(started.persona_id, "dry");

    play_turns(&app, &started.run_id, TURN_LIMIT - 1).await;
    let before = app.current_state(&started.run_id).await.unwrap();
    assert_eq!(before.state, RunState::InProgress { turns_played: TURN_LIMIT - 1 });
    assert!(before.review.is_none());

    let last = app
        .submit_user_message(&started.run_id, "see you then")
        .await
        .unwrap();
    assert_eq!(last.snapshot.state, RunState::Completed);
    assert!(last.review_error.is_none());

    let done = app.current_state(&started.run_id).await.unwrap();
    assert_eq!(done.transcript.len(), 2 * TURN_LIMIT as usize);
    assert!(done.review.is_some());

    let speakers: Vec<Speaker> = done.transcript.iter().map(|m| m.speaker).collect();
    for pair in speakers.chunks(2) {
        assert_eq!(pair, [Speaker::You, Speaker::Them]);
    }
}

#[tokio::test]
async fn test_completed_run_rejects_more_messages() {
    let app = ReviewApp::from_config(&fixture_config()).await.unwrap();
    let run_id = app.start_run(None).await.unwrap().run_id;
    play_turns(&app, &run_id, TURN_LIMIT).await;

    let err = app.submit_user_message(&run_id, "one more").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(
        app.current_state(&run_id).await.unwrap().transcript.len(),
        2 * TURN_LIMIT as usize
    );
}

#[tokio::test]
async fn test_end_early_discards_run() {
    let app = ReviewApp::from_config(&fixture_config()).await.unwrap();
    let run_id = app.start_run(Some("flirty")).await.unwrap().run_id;
    play_turns(&app, &run_id, 2).await;

    app.end_early(&run_id).await.unwrap();

    let err = app.current_state(&run_id).await.unwrap_err();
    assert!(matches!(err, DomainError::RunNotFound(_)));
}

#[tokio::test]
async fn test_persona_hiccup_uses_fallback_reply() {
    let persona = Arc::new(MockPersonaOracle::new());
    persona.push_response(MockResponse::transient("blip")).await;
    let app = app_with_persona(persona);

    let run_id = app.start_run(Some("dry")).await.unwrap().run_id;
    let outcome = app.submit_user_message(&run_id, "hi").await.unwrap();

    assert!(outcome.fallback);
    assert_eq!(outcome.reply.text, PERSONA_FALLBACK_REPLY);
    assert_eq!(outcome.snapshot.turns_played, 1);
}

#[tokio::test]
async fn test_repeated_persona_failure_leaves_transcript_untouched() {
    let persona = Arc::new(MockPersonaOracle::new());
    persona.push_response(MockResponse::failure("down")).await;
    persona.push_response(MockResponse::failure("still down")).await;
    let app = app_with_persona(persona);

    let run_id = app.start_run(Some("dry")).await.unwrap().run_id;
    app.submit_user_message(&run_id, "hi").await.unwrap();
    let err = app.submit_user_message(&run_id, "hello?").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OracleError);
    let state = app.current_state(&run_id).await.unwrap();
    assert_eq!(state.turns_played, 1);
    assert_eq!(state.transcript.len(), 2);
}

#[tokio::test]
async fn test_replacing_run_discards_prior() {
    let app = ReviewApp::from_config(&fixture_config()).await.unwrap();
    let first = app.start_run(Some("dry")).await.unwrap().run_id;
    play_turns(&app, &first, 1).await;

    let second = app.start_replacing(&first, Some("flirty")).await.unwrap();

    assert_ne!(second.run_id, first);
    assert_eq!(second.turns_played, 0);
    assert!(app.current_state(&first).await.is_err());
}

#[tokio::test]
async fn test_unknown_persona_is_input_error() {
    let app = ReviewApp::from_config(&fixture_config()).await.unwrap();
    let err = app.start_run(Some("nobody")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputError);
}

#[tokio::test]
async fn test_parallel_runs_do_not_interfere() {
    let app = Arc::new(ReviewApp::from_config(&fixture_config()).await.unwrap());
    let a = app.start_run(Some("dry")).await.unwrap().run_id;
    let b = app.start_run(Some("flirty")).await.unwrap().run_id;

    tokio::join!(
        {
            let app = app.clone();
            let a = a.clone();
            async move { play_turns(&app, &a, TURN_LIMIT).await }
        },
        {
            let app = app.clone();
            let b = b.clone();
            async move { play_turns(&app, &b, 2).await }
        }
    );

    assert_eq!(app.current_state(&a).await.unwrap().state, RunState::Completed);
    assert_eq!(
        app.current_state(&b).await.unwrap().state,
        RunState::InProgress { turns_played: 2 }
    );
}
