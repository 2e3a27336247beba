use std::cell::{Cell, RefCell};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    board::{BoardAdapter, HostBoard},
    client::AdvisoryService,
    error::AdvisorError,
    orientation::normalize,
    render::{Notice, OverlaySurface, render},
    types::{AdvisoryResult, AppliedSettings, BoardSnapshot, EngineSettings},
};

/// Everything that can happen to the advisor: board mutations from the
/// observer and the user's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Mutation,
    Toggle,
    Trigger,
    Configure(EngineSettings),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    BoardUnavailable,
    NotLocalTurn,
    Duplicate,
}

/// What a mutation or a manual trigger ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Arrows and evaluations were drawn.
    Rendered { moves: usize },
    /// No query was issued.
    Skipped(SkipReason),
    /// A newer query was issued, or the loop was switched off, while this
    /// one was in flight. Nothing was drawn.
    Stale,
    /// The engine had no moves (manual trigger). Nothing was drawn.
    Empty,
    /// The engine had no moves and the loop switched itself off.
    Deactivated,
    /// The service call failed; logged, not shown.
    Failed,
}

/// Owns the host subscription while the loop is active.
struct ObserverHandle<S> {
    _subscription: S,
    epoch: u64,
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    seq: u64,
    // activation the query belongs to; `None` for manual triggers
    epoch: Option<u64>,
}

/// The change-detection loop.
///
/// Starts inactive. While active, every board mutation may turn into an
/// advisory query; results are normalized for the local player's side and
/// drawn. Every query takes a ticket so that only the freshest response
/// is ever drawn.
///
/// All state lives in cells: the advisor runs on a single thread and never
/// holds a borrow across the service call.
pub struct Advisor<B: HostBoard, S, O> {
    board: BoardAdapter<B>,
    service: S,
    overlay: O,
    observer: RefCell<Option<ObserverHandle<B::Subscription>>>,
    last_queried: RefCell<Option<String>>,
    activations: Cell<u64>,
    issued: Cell<u64>,
}

impl<B, S, O> Advisor<B, S, O>
where
    B: HostBoard,
    S: AdvisoryService,
    O: OverlaySurface,
{
    pub fn new(host: B, service: S, overlay: O) -> Self {
        Self {
            board: BoardAdapter::new(host),
            service,
            overlay,
            observer: RefCell::new(None),
            last_queried: RefCell::new(None),
            activations: Cell::new(0),
            issued: Cell::new(0),
        }
    }

    pub fn board(&self) -> &BoardAdapter<B> {
        &self.board
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn is_active(&self) -> bool {
        self.observer.borrow().is_some()
    }

    /// Position of the last loop query, if any since activation.
    pub fn last_queried(&self) -> Option<String> {
        self.last_queried.borrow().clone()
    }

    /// Start observing the board. Returns whether the loop is active
    /// afterwards; it stays inactive when the board is not mounted.
    pub fn activate(&self) -> bool {
        if self.is_active() {
            return true;
        }
        let Some(subscription) = self.board.observe() else {
            debug!("Board not mounted, staying inactive");
            return false;
        };

        let epoch = self.activations.get() + 1;
        self.activations.set(epoch);
        *self.observer.borrow_mut() = Some(ObserverHandle {
            _subscription: subscription,
            epoch,
        });
        *self.last_queried.borrow_mut() = None;

        self.overlay.set_active_indicator(true);
        info!(epoch, "Advisory loop activated");
        true
    }

    /// Stop observing the board. Responses still in flight for this
    /// activation will be discarded.
    pub fn deactivate(&self) {
        let handle = self.observer.borrow_mut().take();
        if let Some(handle) = handle {
            info!(epoch = handle.epoch, "Advisory loop deactivated");
            drop(handle);
            self.overlay.set_active_indicator(false);
        }
    }

    pub fn toggle(&self) -> bool {
        if self.is_active() {
            self.deactivate();
            false
        } else {
            self.activate()
        }
    }

    fn active_epoch(&self) -> Option<u64> {
        self.observer.borrow().as_ref().map(|handle| handle.epoch)
    }

    fn issue(&self, epoch: Option<u64>) -> Ticket {
        let seq = self.issued.get() + 1;
        self.issued.set(seq);
        Ticket { seq, epoch }
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        if ticket.seq != self.issued.get() {
            return false;
        }
        match ticket.epoch {
            Some(epoch) => self.active_epoch() == Some(epoch),
            None => true,
        }
    }

    /// React to one observed board mutation.
    pub async fn on_mutation(&self) -> Outcome {
        let Some(epoch) = self.active_epoch() else {
            return Outcome::Skipped(SkipReason::Inactive);
        };
        let Some(snapshot) = self.board.read_snapshot() else {
            return Outcome::Skipped(SkipReason::BoardUnavailable);
        };
        if !snapshot.is_local_turn() {
            return Outcome::Skipped(SkipReason::NotLocalTurn);
        }
        if self.last_queried.borrow().as_deref() == Some(snapshot.position.as_str()) {
            return Outcome::Skipped(SkipReason::Duplicate);
        }

        *self.last_queried.borrow_mut() = Some(snapshot.position.clone());
        let ticket = self.issue(Some(epoch));

        let result = match self.query(&snapshot, ticket).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, position = %snapshot.position, "Advisory query failed");
                // let the next mutation at this position try again
                let mut last = self.last_queried.borrow_mut();
                if last.as_deref() == Some(snapshot.position.as_str()) {
                    *last = None;
                }
                return Outcome::Failed;
            }
        };

        // "no moves" ends the activation even if a newer query superseded
        // this one; only drawing needs the freshest ticket
        if result.is_empty() && self.active_epoch() == ticket.epoch {
            info!(position = %snapshot.position, "No moves to suggest");
            self.deactivate();
            return Outcome::Deactivated;
        }
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, "Discarding stale advisory");
            return Outcome::Stale;
        }

        self.draw(result, &snapshot)
    }

    /// One-shot advisory for the current position, whatever the loop is
    /// doing. Leaves the loop state alone.
    pub async fn trigger(&self) -> Result<Outcome, AdvisorError> {
        let Some(snapshot) = self.board.read_snapshot() else {
            debug!("Manual trigger with no board");
            return Ok(Outcome::Skipped(SkipReason::BoardUnavailable));
        };
        let ticket = self.issue(None);

        let result = match self.query(&snapshot, ticket).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Manual advisory failed");
                self.overlay.notify(Notice::error(format!("Advisory failed: {e}")));
                return Err(e);
            }
        };

        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, "Discarding stale advisory");
            return Ok(Outcome::Stale);
        }
        if result.is_empty() {
            self.overlay.notify(Notice::info("No moves for this position"));
            return Ok(Outcome::Empty);
        }

        Ok(self.draw(result, &snapshot))
    }

    /// Query the service. A malformed response counts as "no moves".
    async fn query(
        &self,
        snapshot: &BoardSnapshot,
        ticket: Ticket,
    ) -> Result<AdvisoryResult, AdvisorError> {
        debug!(seq = ticket.seq, position = %snapshot.position, "Querying advisory service");
        match self.service.query(&snapshot.position).await {
            Err(AdvisorError::MalformedResponse(e)) => {
                warn!(error = %e, "Malformed advisory response, treating as empty");
                Ok(AdvisoryResult::default())
            }
            other => other,
        }
    }

    fn draw(&self, result: AdvisoryResult, snapshot: &BoardSnapshot) -> Outcome {
        let result = normalize(result, snapshot.local_side);
        render(&self.board, &self.overlay, &result);
        Outcome::Rendered {
            moves: result.len(),
        }
    }

    /// Push engine settings and tell the user how it went.
    pub async fn configure(
        &self,
        settings: EngineSettings,
    ) -> Result<AppliedSettings, AdvisorError> {
        match self.service.configure(settings).await {
            Ok(applied) => {
                info!(depth = ?applied.depth, lines = ?applied.lines, "Engine settings applied");
                self.overlay.notify(Notice::info(format!(
                    "Depth: {}, lines: {}",
                    describe(applied.depth),
                    describe(applied.lines)
                )));
                Ok(applied)
            }
            Err(e) => {
                warn!(error = %e, "Engine configuration failed");
                self.overlay
                    .notify(Notice::error(format!("Configuration failed: {e}")));
                Err(e)
            }
        }
    }

    /// Same as [`configure`](Self::configure), from raw input text.
    pub async fn configure_from_input(
        &self,
        depth: &str,
        lines: &str,
    ) -> Result<AppliedSettings, AdvisorError> {
        match EngineSettings::parse(depth, lines) {
            Ok(settings) => self.configure(settings).await,
            Err(e) => {
                self.overlay.notify(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn handle(&self, command: Command) {
        match command {
            Command::Mutation => {
                let outcome = self.on_mutation().await;
                debug!(?outcome, "Mutation handled");
            }
            Command::Toggle => {
                self.toggle();
            }
            Command::Trigger => {
                if let Err(e) = self.trigger().await {
                    debug!(error = %e, "Manual trigger failed");
                }
            }
            Command::Configure(settings) => {
                if let Err(e) = self.configure(settings).await {
                    debug!(error = %e, "Configure failed");
                }
            }
        }
    }

    /// Process commands until the channel closes. Commands are handled
    /// concurrently, so a slow query never holds up the next event.
    pub async fn run(&self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut in_flight = FuturesUnordered::new();

        loop {
            tokio::select! {
                // finish ready work before taking new commands
                biased;
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
                command = commands.recv() => match command {
                    Some(command) => in_flight.push(self.handle(command)),
                    None => break,
                },
            }
        }

        while in_flight.next().await.is_some() {}
    }
}

fn describe(value: Option<u32>) -> String {
    value.map_or_else(|| "default".to_string(), |v| v.to_string())
}
