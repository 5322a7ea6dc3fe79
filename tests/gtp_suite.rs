//! End-to-end games driven through GTP and through the suggestion chain.
//!
//! GTP scripts are fed to [`GtpEngine::serve`] the way a GUI would send them;
//! responses are checked line by line.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use weiqi_rules::board::{BoardSize, Color, Point, parse_vertex};
use weiqi_rules::game::{GameConfig, GameSession, Move, Phase};
use weiqi_rules::gtp::GtpEngine;
use weiqi_rules::playout::RandomSuggester;
use weiqi_rules::suggest::{
    FallbackChain, MoveSource, MoveSuggester, RawSuggestion, SuggestFut, SuggestionRequest,
};

// =============================================================================
// Helper functions
// =============================================================================

/// Run a GTP script and return the response bodies in order.
fn run_script(engine: &mut GtpEngine, script: &str) -> Vec<String> {
    let mut output = Vec::new();
    engine
        .serve(script.as_bytes(), &mut output)
        .expect("script runs");
    String::from_utf8(output)
        .expect("utf-8 output")
        .split("\n\n")
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn seeded_engine(seed: u64) -> GtpEngine {
    let chain = FallbackChain::new()
        .unwrap()
        .with_tier(Arc::new(RandomSuggester::with_seed(seed)), Duration::from_secs(5));
    GtpEngine::with_chain(GameConfig::default(), chain)
}

/// A collaborator answering with canned JSON, as a remote service would.
struct JsonSuggester {
    name: &'static str,
    reply: &'static str,
    calls: AtomicUsize,
}

impl JsonSuggester {
    fn new(name: &'static str, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply,
            calls: AtomicUsize::new(0),
        })
    }
}

impl MoveSuggester for JsonSuggester {
    fn name(&self) -> &str {
        self.name
    }

    fn suggest<'a>(&'a self, _: &'a SuggestionRequest) -> SuggestFut<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(RawSuggestion::from_json(self.reply)?) })
    }
}

/// A collaborator that never answers; counts requests still in flight.
#[derive(Default)]
struct Hanging {
    in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight count when a request is dropped.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MoveSuggester for Hanging {
    fn name(&self) -> &str {
        "hanging"
    }

    fn suggest<'a>(&'a self, _: &'a SuggestionRequest) -> SuggestFut<'a> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.in_flight));
        Box::pin(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
            anyhow::bail!("gave up")
        })
    }
}

// =============================================================================
// GTP scripts
// =============================================================================

#[test]
fn test_gtp_capture_and_suicide() {
    let mut engine = seeded_engine(1);
    // B1 and A2 surround A1; white may not play there, then black fills it.
    let responses = run_script(
        &mut engine,
        "1 play b B1\n2 play b A2\n3 play w A1\n4 play b A1\n5 play w A1\n",
    );
    assert_eq!(responses[0], "=1 ");
    assert_eq!(responses[1], "=2 ");
    assert_eq!(responses[2], "?3 illegal move: Suicide move is not allowed.");
    assert_eq!(responses[3], "=4 ");
    assert_eq!(responses[4], "?5 illegal move: Point is already occupied");
}

#[test]
fn test_gtp_capture_counts() {
    let mut engine = seeded_engine(1);
    run_script(&mut engine, "play w A1\nplay b B1\nplay w E5\nplay b A2\n");
    let session = engine.session();
    assert_eq!(session.captures().black, 1);
    assert!(session.board().is_empty_at(Point::new(0, 8)));
}

#[test]
fn test_gtp_two_passes_then_score() {
    let mut engine = seeded_engine(1);
    let responses = run_script(
        &mut engine,
        "komi 0.5\nplay b E5\nplay w pass\nplay b pass\nfinal_score\nplay w D4\n",
    );
    assert_eq!(responses[4], "= B+79.5");
    // GTP keeps playing after the two passes
    assert_eq!(responses[5], "= ");
    assert_eq!(engine.session().phase(), Phase::Playing);
}

#[test]
fn test_gtp_pass_for_named_color() {
    let mut engine = seeded_engine(1);
    let responses = run_script(&mut engine, "play b E5\nplay b pass\n");
    assert_eq!(responses, ["= ", "= "]);
    assert_eq!(engine.session().to_move(), Color::White);
    assert_eq!(engine.session().last_move(), Some(Move::Pass));
}

#[test]
fn test_gtp_game_continues_after_two_passes() {
    let mut engine = seeded_engine(1);
    let responses = run_script(
        &mut engine,
        "play b E5\nplay w pass\nplay b pass\nundo\nplay w D4\nplay b pass\nplay w pass\nplay b C3\n",
    );
    assert_eq!(responses.len(), 8);
    for r in &responses {
        assert_eq!(r, "= ");
    }
    let session = engine.session();
    assert_eq!(session.phase(), Phase::Playing);
    assert_eq!(session.board().count(Color::Black), 2);
    assert_eq!(session.board().count(Color::White), 1);
}

#[test]
fn test_gtp_boardsize_and_showboard() {
    let mut engine = seeded_engine(1);
    let responses = run_script(&mut engine, "boardsize 13\nplay b N13\nshowboard\nboardsize 7\n");
    assert_eq!(responses[0], "= ");
    assert_eq!(responses[1], "= ");
    // showboard: a leading newline and 13 rows
    let rows: Vec<&str> = responses[2].lines().skip(1).collect();
    assert_eq!(rows.len(), 13);
    assert!(rows[0].ends_with("X "));
    assert_eq!(responses[3], "? unacceptable size");
    assert_eq!(engine.session().board().edge(), 13);
}

#[test]
fn test_gtp_genmove_self_play() {
    let mut engine = seeded_engine(9);
    let mut script = String::new();
    for _ in 0..20 {
        script.push_str("genmove b\ngenmove w\n");
    }
    let responses = run_script(&mut engine, &script);
    assert_eq!(responses.len(), 40);
    for r in &responses {
        assert!(r.starts_with("= "), "unexpected response {r:?}");
        let vertex = &r[2..];
        assert!(
            vertex == "pass" || parse_vertex(vertex, BoardSize::Nine).is_some(),
            "bad vertex {vertex}"
        );
    }
    assert_eq!(engine.session().move_number(), 40);
}

// =============================================================================
// Suggestion fallback chain
// =============================================================================

#[test]
fn test_primary_answer_used() {
    let primary = JsonSuggester::new("primary", r#"{"x": 2, "y": 6, "rationale": "3-3 point"}"#);
    let chain = FallbackChain::new()
        .unwrap()
        .with_tier(primary.clone(), Duration::from_secs(5));
    let resolved = chain.resolve(&GameSession::default());
    assert_eq!(resolved.mv, Move::Place(Point::new(2, 6)));
    assert_eq!(resolved.source, MoveSource::Tier("primary".to_string()));
    assert_eq!(resolved.rationale.as_deref(), Some("3-3 point"));
    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_timeout_then_secondary() {
    let hanging = Arc::new(Hanging::default());
    let secondary = JsonSuggester::new("secondary", r#"{"pass": true}"#);
    let chain = FallbackChain::new()
        .unwrap()
        .with_tier(hanging.clone(), Duration::from_millis(30))
        .with_tier(secondary.clone(), Duration::from_secs(5));
    let resolved = chain.resolve(&GameSession::default());
    assert_eq!(resolved.mv, Move::Pass);
    assert_eq!(resolved.source, MoveSource::Tier("secondary".to_string()));
    // the timed-out request does not outlive the call
    assert_eq!(hanging.in_flight.load(Ordering::SeqCst), 0);
}

#[test]
fn test_malformed_answers_fall_through() {
    let chain = FallbackChain::new()
        .unwrap()
        .with_tier(JsonSuggester::new("garbled", "I suggest D4"), Duration::from_secs(5))
        .with_tier(JsonSuggester::new("off-board", r#"{"x": 12, "y": 3}"#), Duration::from_secs(5))
        .with_tier(
            JsonSuggester::new("confused", r#"{"x": 1, "y": 1, "resign": true}"#),
            Duration::from_secs(5),
        );
    let resolved = chain.resolve(&GameSession::default());
    assert_eq!(resolved.mv, Move::Place(Point::new(0, 0)));
    assert_eq!(resolved.source, MoveSource::FirstLegalPoint);
}

#[test]
fn test_illegal_suggestion_rejected_like_any_move() {
    let mut session = GameSession::default();
    // Black stones at (1,0) and (0,1): (0,0) is suicide for white.
    session.play(Point::new(1, 0)).unwrap();
    session.play(Point::new(8, 8)).unwrap();
    session.play(Point::new(0, 1)).unwrap();
    let chain = FallbackChain::new()
        .unwrap()
        .with_tier(JsonSuggester::new("suicidal", r#"{"x": 0, "y": 0}"#), Duration::from_secs(5));
    let resolved = chain.resolve(&session);
    assert_eq!(resolved.source, MoveSource::FirstLegalPoint);
    assert_eq!(resolved.mv, Move::Place(Point::new(2, 0)));
    session.apply(resolved.mv).unwrap();
    assert_eq!(session.board().get(Point::new(2, 0)), Some(Color::White));
}

#[test]
fn test_resign_suggestion_ends_game() {
    let mut session = GameSession::default();
    let chain = FallbackChain::new()
        .unwrap()
        .with_tier(JsonSuggester::new("gloomy", r#"{"resign": true}"#), Duration::from_secs(5));
    let resolved = chain.resolve(&session);
    assert_eq!(resolved.mv, Move::Resign);
    session.apply(resolved.mv).unwrap();
    assert_eq!(session.phase(), Phase::Finished);
    assert_eq!(session.outcome().unwrap().to_string(), "W+R");
}

#[test]
fn test_full_board_falls_back_to_pass() {
    // Every empty point is a black eye, so white has no legal move.
    let diagram = [
        ".X.X.X.X.",
        "XXXXXXXXX",
        ".X.X.X.X.",
        "XXXXXXXXX",
        ".X.X.X.X.",
        "XXXXXXXXX",
        ".X.X.X.X.",
        "XXXXXXXXX",
        ".X.X.X.X.",
    ];
    let mut session = GameSession::default();
    for (y, row) in diagram.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            if ch == 'X' {
                session.play_as(Color::Black, Point::new(x, y)).unwrap();
            }
        }
    }
    assert_eq!(session.to_move(), Color::White);
    let resolved = FallbackChain::new()
        .unwrap()
        .with_tier(Arc::new(Hanging::default()), Duration::from_millis(10))
        .resolve(&session);
    assert_eq!(resolved.mv, Move::Pass);
    assert_eq!(resolved.source, MoveSource::Pass);
}
