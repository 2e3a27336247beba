//! Turns advisory results into arrows and an evaluation strip.
//!
//! Rendering is stateless: every call computes the complete arrow set and
//! the complete strip and replaces whatever was shown before, so drawing
//! the same result twice leaves the page unchanged.

#[cfg(feature = "serde")]
use serde::Serialize;
use serde_json::{Value, json};
use shakmaty::{Square, uci::UciMove};

use crate::board::{BoardAdapter, HostBoard};
use crate::types::{AdvisoryResult, Evaluation};

/// An arrow from origin to destination square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub from: Square,
    pub to: Square,
    pub opacity: f64,
}

impl Arrow {
    /// The marking object understood by the host board's marking layer.
    pub fn marking(&self) -> Value {
        json!({
            "type": "arrow",
            "node": true,
            "persistent": false,
            "data": {
                "from": self.from.to_string(),
                "to": self.to.to_string(),
                "opacity": self.opacity,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum EvalColor {
    White,
    Magenta,
}

impl EvalColor {
    pub fn css(&self) -> &'static str {
        match self {
            EvalColor::White => "white",
            EvalColor::Magenta => "magenta",
        }
    }
}

/// One cell of the evaluation strip.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EvalEntry {
    pub text: String,
    pub color: EvalColor,
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the user (a toast, a status line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The overlay the advisor owns on top of the host page.
pub trait OverlaySurface {
    /// Clear the evaluation strip and show `entries` in order.
    fn replace_evaluations(&self, entries: &[EvalEntry]);

    /// Reflect whether continuous advisory is on (the toggle button).
    fn set_active_indicator(&self, active: bool);

    fn notify(&self, notice: Notice);
}

/// Opacity of the `index`-th of `count` arrows. Fades from 0.9 for the
/// best move towards -0.2 for an infinitely long list.
pub fn arrow_opacity(index: usize, count: usize) -> f64 {
    0.9 - (1.1 / (count as f64 + 1.0)) * index as f64
}

/// One arrow per move, best first.
pub fn arrows(moves: &[UciMove]) -> Vec<Arrow> {
    let count = moves.len();
    moves
        .iter()
        .enumerate()
        .filter_map(|(i, uci)| match *uci {
            UciMove::Normal { from, to, .. } => Some(Arrow {
                from,
                to,
                opacity: arrow_opacity(i, count),
            }),
            // drops and null moves have no origin square to draw from
            _ => None,
        })
        .collect()
}

pub fn evaluation_strip(evaluations: &[Evaluation]) -> Vec<EvalEntry> {
    evaluations
        .iter()
        .map(|evaluation| EvalEntry {
            text: evaluation.to_string(),
            color: if evaluation.is_negative() {
                EvalColor::Magenta
            } else {
                EvalColor::White
            },
            bold: true,
        })
        .collect()
}

/// Draw `result` on the board and the overlay, replacing what was there.
pub fn render<B, O>(board: &BoardAdapter<B>, overlay: &O, result: &AdvisoryResult)
where
    B: HostBoard,
    O: OverlaySurface,
{
    board.replace_markings(&arrows(result.moves()));
    overlay.replace_evaluations(&evaluation_strip(result.evaluations()));
}
