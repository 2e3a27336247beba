//! A terminal stand-in for the host page.
//!
//! Every line on stdin is one of:
//! - a FEN: the board changed to that position,
//! - a single bound key (`q` toggles continuous advice, `w` asks once),
//! - `config <depth> <lines>`: push engine settings (`-` keeps a value).
//!
//! Start an advisory service, then e.g.
//! `ADVISOR_LOCAL_SIDE=black cargo run --example console`.

use std::cell::{Cell, RefCell};
use std::env;
use std::rc::Rc;

use move_advisor::shakmaty::fen::Fen;
use move_advisor::{
    Advisor, AdvisorConfig, AdvisoryClient, Arrow, Command, EngineSettings, EvalColor, EvalEntry,
    HostBoard, Notice, NoticeLevel, OverlaySurface, Side,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

struct BoardState {
    fen: RefCell<Option<String>>,
    local_side: Side,
    observed: Cell<bool>,
}

#[derive(Clone)]
struct ConsoleBoard(Rc<BoardState>);

/// Observation flag; cleared when the advisor lets go of it.
struct Observation(Rc<BoardState>);

impl Drop for Observation {
    fn drop(&mut self) {
        self.0.observed.set(false);
    }
}

impl ConsoleBoard {
    fn new(local_side: Side) -> Self {
        Self(Rc::new(BoardState {
            fen: RefCell::new(None),
            local_side,
            observed: Cell::new(false),
        }))
    }

    fn set_fen(&self, fen: &str) {
        *self.0.fen.borrow_mut() = Some(fen.to_string());
    }

    fn is_observed(&self) -> bool {
        self.0.observed.get()
    }
}

impl HostBoard for ConsoleBoard {
    type Subscription = Observation;

    fn observe(&self) -> Option<Observation> {
        self.0.observed.set(true);
        Some(Observation(Rc::clone(&self.0)))
    }

    fn fen(&self) -> Option<String> {
        self.0.fen.borrow().clone()
    }

    fn turn(&self) -> Option<Side> {
        let fen: Fen = self.fen()?.parse().ok()?;
        Some(fen.as_setup().turn)
    }

    fn playing_as(&self) -> Option<Side> {
        Some(self.0.local_side)
    }

    fn pgn(&self) -> Option<String> {
        None
    }

    fn replace_markings(&self, arrows: &[Arrow]) {
        let drawn: Vec<String> = arrows
            .iter()
            .map(|a| format!("{}->{} ({:.2})", a.from, a.to, a.opacity))
            .collect();
        println!("arrows: {}", drawn.join("  "));
    }
}

struct ConsoleOverlay;

impl OverlaySurface for ConsoleOverlay {
    fn replace_evaluations(&self, entries: &[EvalEntry]) {
        let cells: Vec<String> = entries
            .iter()
            .map(|entry| {
                let code = match entry.color {
                    EvalColor::White => "37",
                    EvalColor::Magenta => "35",
                };
                let weight = if entry.bold { "1;" } else { "" };
                format!("\x1b[{weight}{code}m{}\x1b[0m", entry.text)
            })
            .collect();
        println!("evals:  {}", cells.join("  "));
    }

    fn set_active_indicator(&self, active: bool) {
        println!("observer: {}", if active { "on" } else { "off" });
    }

    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => println!("[info] {}", notice.message),
            NoticeLevel::Error => println!("[error] {}", notice.message),
        }
    }
}

fn settings_from(args: &str) -> Option<EngineSettings> {
    let mut parts = args.split_whitespace().map(|p| if p == "-" { "" } else { p });
    let depth = parts.next().unwrap_or("");
    let lines = parts.next().unwrap_or("");
    match EngineSettings::parse(depth, lines) {
        Ok(settings) => Some(settings),
        Err(e) => {
            println!("[error] {e}");
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = AdvisorConfig::from_env();
    let local_side = match env::var("ADVISOR_LOCAL_SIDE").as_deref() {
        Ok("black") | Ok("b") => Side::Black,
        _ => Side::White,
    };

    let client = AdvisoryClient::new(&config)?;
    match client.ping().await {
        Ok(()) => info!(url = %config.service_url, "Advisory service reachable"),
        Err(e) => warn!(url = %config.service_url, error = %e, "Advisory service not reachable yet"),
    }

    let board = ConsoleBoard::new(local_side);
    let advisor = Advisor::new(board.clone(), client, ConsoleOverlay);
    let keys = config.keys;
    let (tx, rx) = mpsc::unbounded_channel();

    let input = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            let command = if let Some(args) = line.strip_prefix("config") {
                settings_from(args).map(Command::Configure)
            } else if line.chars().count() == 1 {
                line.chars().next().and_then(|key| keys.command_for(key))
            } else if !line.is_empty() {
                board.set_fen(line);
                board.is_observed().then_some(Command::Mutation)
            } else {
                None
            };

            if let Some(command) = command {
                if tx.send(command).is_err() {
                    break;
                }
            }
        }
    };

    tokio::join!(advisor.run(rx), input);
    Ok(())
}
