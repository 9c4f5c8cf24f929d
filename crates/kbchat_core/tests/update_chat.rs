use std::sync::Once;

use kbchat_core::{
    update, AppState, Effect, Msg, Role, SessionStatus, SourceCitation, CHAT_ERROR_PREFIX,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(kbchat_logging::initialize_for_tests);
}

fn ask(state: AppState, question: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::QuestionEdited(question.to_string()));
    update(state, Msg::QuestionSubmitted)
}

fn answer(state: AppState, result: Result<(String, Vec<SourceCitation>), String>) -> AppState {
    let epoch = state.epoch();
    let (state, effects) = update(state, Msg::ChatAnswered { epoch, result });
    assert!(effects.is_empty());
    state
}

#[test]
fn question_is_appended_optimistically_and_request_issued() {
    init_logging();
    let (mut state, effects) = ask(AppState::new(), "  What is the capital of France? ");

    assert_eq!(
        effects,
        vec![Effect::Converse {
            epoch: 0,
            query: "What is the capital of France?".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].role, Role::User);
    assert_eq!(view.entries[0].text, "What is the capital of France?");
    assert_eq!(view.draft, "");
    assert!(view.thinking);
    assert!(!view.chat_enabled);
    assert_eq!(view.status, SessionStatus::ChatPending);
    assert!(state.consume_dirty());
    assert!(state.consume_follow());
}

#[test]
fn blank_questions_are_ignored() {
    init_logging();
    for blank in ["", "   ", "\n\t"] {
        let state = AppState::new();
        let (mut next, effects) = ask(state, blank);
        // The draft edit itself marks the view dirty; drain it first.
        assert!(next.consume_dirty());
        let (mut next, effects_after) = update(next, Msg::QuestionSubmitted);

        assert!(effects.is_empty());
        assert!(effects_after.is_empty());
        assert!(next.conversation().is_empty());
        assert_eq!(next.status(), SessionStatus::Idle);
        assert!(!next.consume_dirty());
        assert!(!next.consume_follow());
    }
}

#[test]
fn successful_answer_appends_bot_entry_without_citations() {
    init_logging();
    let (state, _) = ask(AppState::new(), "Capital of France?");
    let state = answer(state, Ok(("Paris is the capital.".to_string(), Vec::new())));

    let view = state.view();
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.entries[1].role, Role::Bot);
    assert_eq!(view.entries[1].text, "Paris is the capital.");
    assert!(view.entries[1].citations.is_empty());
    assert_eq!(view.status, SessionStatus::Idle);
    assert!(view.chat_enabled);
}

#[test]
fn answer_citations_are_previewed_but_kept_whole() {
    init_logging();
    let long_excerpt = "x".repeat(400);
    let (state, _) = ask(AppState::new(), "Tell me more");
    let state = answer(
        state,
        Ok((
            "Here you go.".to_string(),
            vec![
                SourceCitation::new("https://a.test", long_excerpt.clone()),
                SourceCitation::new("notes.pdf", "short"),
            ],
        )),
    );

    let bot = &state.conversation()[1];
    assert_eq!(bot.sources()[0].excerpt, long_excerpt);

    let view = state.view();
    let citations = &view.entries[1].citations;
    assert_eq!(citations.len(), 2);
    assert_eq!(citations[0].label, "https://a.test");
    assert_eq!(citations[0].preview, format!("{}...", "x".repeat(150)));
    assert_eq!(citations[1].preview, "short");
}

#[test]
fn failed_answer_becomes_marked_bot_entry() {
    init_logging();
    let (state, _) = ask(AppState::new(), "Anything?");
    let state = answer(state, Err("connection refused".to_string()));

    let view = state.view();
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.entries[0].role, Role::User);
    assert_eq!(view.entries[1].role, Role::Bot);
    assert!(view.entries[1].text.starts_with(CHAT_ERROR_PREFIX));
    assert!(view.entries[1].text.contains("connection refused"));
    assert_eq!(view.status, SessionStatus::Idle);
    assert!(view.chat_enabled);
}

#[test]
fn each_question_adds_exactly_two_entries() {
    init_logging();
    let mut state = AppState::new();
    let outcomes = [
        Ok(("one".to_string(), Vec::new())),
        Err("boom".to_string()),
        Ok(("three".to_string(), vec![SourceCitation::new("s", "t")])),
    ];
    for (round, outcome) in outcomes.into_iter().enumerate() {
        let before = state.conversation().len();
        let (next, _) = ask(state, &format!("question {round}"));
        assert_eq!(next.conversation().len(), before + 1);
        state = answer(next, outcome);
        assert_eq!(state.conversation().len(), before + 2);
    }
}

#[test]
fn second_question_while_pending_is_rejected() {
    init_logging();
    let (state, _) = ask(AppState::new(), "first");
    let (state, effects) = ask(state, "second");

    assert!(effects.is_empty());
    assert_eq!(state.conversation().len(), 1);
    assert_eq!(state.view().draft, "second");
}

#[test]
fn duplicate_completion_is_ignored() {
    init_logging();
    let (state, _) = ask(AppState::new(), "q");
    let state = answer(state, Ok(("a".to_string(), Vec::new())));
    let state = answer(state, Ok(("again".to_string(), Vec::new())));

    assert_eq!(state.conversation().len(), 2);
}

#[test]
fn questions_can_be_asked_while_ingesting() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::UrlEdited("https://a.test".to_string()));
    let (state, _) = update(state, Msg::UrlSubmitted);
    assert_eq!(state.status(), SessionStatus::IngestPending);

    let (state, effects) = ask(state, "while we wait?");
    assert_eq!(effects.len(), 1);
    let view = state.view();
    assert_eq!(view.status, SessionStatus::ChatPending);
    assert!(!view.chat_enabled);
    assert!(!view.ingest_enabled);
}
