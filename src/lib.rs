//! Live move advisory for a chess board embedded in a host page.
//!
//!
//! This crate watches a host board for changes, asks a remote
//! move-evaluation service for the best continuations, and draws them
//! back onto the board as fading arrows together with an evaluation
//! strip. It does not evaluate positions itself.
//!
//! The principal type is [`Advisor`], the change-detection loop. It is
//! generic over three seams: the host page's board ([`HostBoard`]), the
//! remote service ([`AdvisoryService`], implemented over HTTP by
//! [`AdvisoryClient`]), and the overlay the results are shown on
//! ([`OverlaySurface`]).
//!
//! The library re‑exports `shakmaty` for the move and square types that
//! appear in results.

mod advisor;
mod board;
mod client;
mod config;
mod error;
mod orientation;
mod render;
mod types;

/// The change-detection loop and its commands.
pub use advisor::{Advisor, Command, Outcome, SkipReason};

/// Host board seam.
pub use board::{BoardAdapter, HostBoard};

/// Remote service seam and its HTTP implementation.
pub use client::{AdvisoryClient, AdvisoryService};

/// Environment-driven configuration.
pub use config::{AdvisorConfig, DEFAULT_SERVICE_URL, KeyBindings};

/// Error type produced by library operations.
pub use error::AdvisorError;

/// Orientation normalizer.
pub use orientation::normalize;

/// Rendering of results and the overlay seam.
pub use render::{
    Arrow, EvalColor, EvalEntry, Notice, NoticeLevel, OverlaySurface, arrow_opacity, arrows,
    evaluation_strip, render,
};

/// Data model shared by all components.
pub use types::{
    AdvisoryResult, AppliedSettings, BoardSnapshot, EngineSettings, Evaluation, RankedMove, Side,
};

/// Re-export of `shakmaty` for convenience when handling moves and squares.
pub use shakmaty;
