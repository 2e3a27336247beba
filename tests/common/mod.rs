#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use move_advisor::shakmaty::uci::UciMove;
use move_advisor::{
    AdvisorError, AdvisoryResult, AdvisoryService, AppliedSettings, Arrow, EngineSettings,
    EvalEntry, Evaluation, HostBoard, Notice, OverlaySurface, Side,
};
use tokio::sync::Notify;

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

/// Build a result from (move, pawn score) pairs.
pub fn lines(pairs: &[(&str, f64)]) -> AdvisoryResult {
    let moves: Vec<UciMove> = pairs.iter().map(|(m, _)| m.parse().unwrap()).collect();
    let evals = pairs.iter().map(|&(_, e)| Evaluation::Pawns(e)).collect();
    AdvisoryResult::new(moves, evals)
}

// ---------------------------------------------------------------------------
// Host board
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct BoardState {
    pub mounted: bool,
    pub fen: Option<String>,
    pub turn: Option<Side>,
    pub playing_as: Option<Side>,
    pub markings: Vec<Arrow>,
    pub marking_writes: usize,
    pub subscribers: usize,
}

/// In-memory host board. Clones share state, so a test can keep a handle
/// while the advisor owns another.
#[derive(Clone, Default)]
pub struct FakeBoard {
    state: Rc<RefCell<BoardState>>,
}

pub struct FakeSubscription {
    state: Rc<RefCell<BoardState>>,
}

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        self.state.borrow_mut().subscribers -= 1;
    }
}

impl FakeBoard {
    pub fn mounted() -> Self {
        let board = Self::default();
        board.state.borrow_mut().mounted = true;
        board
    }

    pub fn set_position(&self, fen: &str, turn: Side) {
        let mut state = self.state.borrow_mut();
        state.fen = Some(fen.to_string());
        state.turn = Some(turn);
    }

    pub fn play_as(&self, side: Side) {
        self.state.borrow_mut().playing_as = Some(side);
    }

    pub fn unmount(&self) {
        self.state.borrow_mut().mounted = false;
    }

    pub fn markings(&self) -> Vec<Arrow> {
        self.state.borrow().markings.clone()
    }

    pub fn marking_writes(&self) -> usize {
        self.state.borrow().marking_writes
    }

    pub fn subscribers(&self) -> usize {
        self.state.borrow().subscribers
    }
}

impl HostBoard for FakeBoard {
    type Subscription = FakeSubscription;

    fn observe(&self) -> Option<FakeSubscription> {
        let mut state = self.state.borrow_mut();
        if !state.mounted {
            return None;
        }
        state.subscribers += 1;
        Some(FakeSubscription {
            state: Rc::clone(&self.state),
        })
    }

    fn fen(&self) -> Option<String> {
        let state = self.state.borrow();
        state.fen.clone().filter(|_| state.mounted)
    }

    fn turn(&self) -> Option<Side> {
        let state = self.state.borrow();
        state.turn.filter(|_| state.mounted)
    }

    fn playing_as(&self) -> Option<Side> {
        let state = self.state.borrow();
        state.playing_as.filter(|_| state.mounted)
    }

    fn pgn(&self) -> Option<String> {
        None
    }

    fn replace_markings(&self, arrows: &[Arrow]) {
        let mut state = self.state.borrow_mut();
        state.markings = arrows.to_vec();
        state.marking_writes += 1;
    }
}

// ---------------------------------------------------------------------------
// Advisory service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum Reply {
    Lines(AdvisoryResult),
    Down,
    Malformed,
}

#[derive(Default)]
struct ServiceState {
    replies: RefCell<HashMap<String, Reply>>,
    gates: RefCell<HashMap<String, Rc<Notify>>>,
    calls: RefCell<Vec<String>>,
    configured: RefCell<Vec<EngineSettings>>,
    configure_down: RefCell<bool>,
}

/// Service answering from a per-position script. Unscripted positions get
/// an empty result.
#[derive(Clone, Default)]
pub struct ScriptedService {
    state: Rc<ServiceState>,
}

impl ScriptedService {
    pub fn reply(&self, position: &str, reply: Reply) {
        self.state
            .replies
            .borrow_mut()
            .insert(position.to_string(), reply);
    }

    /// Hold queries for `position` until the returned gate is notified.
    pub fn gate(&self, position: &str) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.state
            .gates
            .borrow_mut()
            .insert(position.to_string(), Rc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.borrow().clone()
    }

    pub fn configured(&self) -> Vec<EngineSettings> {
        self.state.configured.borrow().clone()
    }

    pub fn fail_configuration(&self) {
        *self.state.configure_down.borrow_mut() = true;
    }
}

impl AdvisoryService for ScriptedService {
    async fn query(&self, position: &str) -> Result<AdvisoryResult, AdvisorError> {
        self.state.calls.borrow_mut().push(position.to_string());

        let gate = self.state.gates.borrow().get(position).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = self.state.replies.borrow().get(position).cloned();
        match reply {
            Some(Reply::Lines(result)) => Ok(result),
            Some(Reply::Down) => Err(AdvisorError::ServiceUnavailable(
                "Request error: connection refused".to_string(),
            )),
            Some(Reply::Malformed) => Err(AdvisorError::MalformedResponse(
                "missing field `bestMoves`".to_string(),
            )),
            None => Ok(AdvisoryResult::default()),
        }
    }

    async fn configure(&self, settings: EngineSettings) -> Result<AppliedSettings, AdvisorError> {
        self.state.configured.borrow_mut().push(settings);
        if *self.state.configure_down.borrow() {
            return Err(AdvisorError::ServiceUnavailable("HTTP 500 Internal Server Error".to_string()));
        }
        Ok(AppliedSettings {
            message: "Configuration updated successfully".to_string(),
            depth: settings.depth.or(Some(8)),
            lines: settings.lines.or(Some(3)),
        })
    }
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct OverlayState {
    pub strip: Vec<EvalEntry>,
    pub strip_writes: usize,
    pub indicator: Vec<bool>,
    pub notices: Vec<Notice>,
}

#[derive(Clone, Default)]
pub struct RecordingOverlay {
    state: Rc<RefCell<OverlayState>>,
}

impl RecordingOverlay {
    pub fn strip_texts(&self) -> Vec<String> {
        self.state
            .borrow()
            .strip
            .iter()
            .map(|entry| entry.text.clone())
            .collect()
    }

    pub fn strip(&self) -> Vec<EvalEntry> {
        self.state.borrow().strip.clone()
    }

    pub fn strip_writes(&self) -> usize {
        self.state.borrow().strip_writes
    }

    /// Every indicator change, in order.
    pub fn indicator(&self) -> Vec<bool> {
        self.state.borrow().indicator.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.state.borrow().notices.clone()
    }
}

impl OverlaySurface for RecordingOverlay {
    fn replace_evaluations(&self, entries: &[EvalEntry]) {
        let mut state = self.state.borrow_mut();
        state.strip = entries.to_vec();
        state.strip_writes += 1;
    }

    fn set_active_indicator(&self, active: bool) {
        self.state.borrow_mut().indicator.push(active);
    }

    fn notify(&self, notice: Notice) {
        self.state.borrow_mut().notices.push(notice);
    }
}
