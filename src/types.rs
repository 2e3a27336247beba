use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;

use crate::error::AdvisorError;

/// A player color. White or Black.
pub type Side = shakmaty::Color;

/// What the board looked like at one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Canonical FEN of the current position.
    pub position: String,
    /// Side to move.
    pub turn: Side,
    /// Side the local player is playing (and viewing) as.
    pub local_side: Side,
}

impl BoardSnapshot {
    pub fn is_local_turn(&self) -> bool {
        self.turn == self.local_side
    }
}

/// Engine score for one candidate line, always from White's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawEvaluation")]
pub enum Evaluation {
    /// Centipawn score divided by 100.
    Pawns(f64),
    /// Forced mate in `n` moves; negative when Black mates.
    Mate(i32),
}

impl Evaluation {
    pub fn is_negative(&self) -> bool {
        match *self {
            Evaluation::Pawns(score) => score < 0.0,
            Evaluation::Mate(n) => n < 0,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            // -0.0 would otherwise print as "-0" and be flagged as negative
            Evaluation::Pawns(score) if score == 0.0 => f.write_str("0"),
            Evaluation::Pawns(score) => write!(f, "{score}"),
            Evaluation::Mate(n) => write!(f, "M{n}"),
        }
    }
}

// The service sends plain numbers for scores and "M<n>" strings for mates.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEvaluation {
    Number(f64),
    Text(String),
}

impl TryFrom<RawEvaluation> for Evaluation {
    type Error = String;

    fn try_from(raw: RawEvaluation) -> Result<Self, Self::Error> {
        match raw {
            RawEvaluation::Number(score) => Ok(Evaluation::Pawns(score)),
            RawEvaluation::Text(text) => {
                let text = text.trim();
                if let Some(n) = text.strip_prefix('M').or_else(|| text.strip_prefix('#')) {
                    n.parse()
                        .map(Evaluation::Mate)
                        .map_err(|_| format!("bad mate score {text:?}"))
                } else {
                    text.parse()
                        .map(Evaluation::Pawns)
                        .map_err(|_| format!("bad evaluation {text:?}"))
                }
            }
        }
    }
}

/// One candidate move paired with its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMove {
    pub uci: UciMove,
    pub evaluation: Evaluation,
}

/// Ranked candidate moves, best first, with index-aligned evaluations.
///
/// Both sequences always have the same length: construction truncates to
/// the shorter of the two.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdvisoryResult {
    moves: Vec<UciMove>,
    evaluations: Vec<Evaluation>,
}

impl AdvisoryResult {
    pub fn new(mut moves: Vec<UciMove>, mut evaluations: Vec<Evaluation>) -> Self {
        let len = moves.len().min(evaluations.len());
        moves.truncate(len);
        evaluations.truncate(len);
        Self { moves, evaluations }
    }

    pub fn moves(&self) -> &[UciMove] {
        &self.moves
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// No candidate moves: the engine has nothing to say about the position.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn ranked(&self) -> impl Iterator<Item = RankedMove> + '_ {
        self.moves
            .iter()
            .zip(&self.evaluations)
            .map(|(uci, &evaluation)| RankedMove {
                uci: uci.clone(),
                evaluation,
            })
    }

    /// Same lines in the opposite rank order.
    pub fn reversed(mut self) -> Self {
        self.moves.reverse();
        self.evaluations.reverse();
        self
    }
}

impl FromIterator<RankedMove> for AdvisoryResult {
    fn from_iter<I: IntoIterator<Item = RankedMove>>(iter: I) -> Self {
        let (moves, evaluations) = iter
            .into_iter()
            .map(|ranked| (ranked.uci, ranked.evaluation))
            .unzip();
        Self { moves, evaluations }
    }
}

/// Engine settings pushed through the configuration channel.
/// `None` leaves the service's current value untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(rename = "multipv", skip_serializing_if = "Option::is_none")]
    pub lines: Option<u32>,
}

impl EngineSettings {
    /// Parse raw text from the depth and line-count inputs. Blank inputs
    /// mean "unchanged"; anything else must be a positive integer.
    pub fn parse(depth: &str, lines: &str) -> Result<Self, AdvisorError> {
        Ok(Self {
            depth: parse_positive("depth", depth)?,
            lines: parse_positive("lines", lines)?,
        })
    }
}

fn parse_positive(field: &str, input: &str) -> Result<Option<u32>, AdvisorError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<u32>() {
        Ok(0) | Err(_) => Err(AdvisorError::InvalidSettings(format!(
            "{field} must be a positive integer, got {input:?}"
        ))),
        Ok(value) => Ok(Some(value)),
    }
}

/// Settings the service reports as applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppliedSettings {
    #[serde(default)]
    pub message: String,
    pub depth: Option<u32>,
    #[serde(rename = "multipv")]
    pub lines: Option<u32>,
}
