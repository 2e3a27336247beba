//! The seam between the advisor and the host page's board.
//!
//! The host owns the board element, its game object and the marking
//! layer arrows are drawn on. [`HostBoard`] is everything the advisor
//! needs from it; [`BoardAdapter`] turns the raw reads into a
//! normalized [`BoardSnapshot`].

use shakmaty::fen::Fen;
use tracing::debug;

use crate::render::Arrow;
use crate::types::{BoardSnapshot, Side};

/// Host board collaborator surface.
///
/// Reads return `None` whenever the board element or its game object is
/// missing, which happens routinely while the page loads or after the
/// player navigates away.
pub trait HostBoard {
    /// Live subscription to board mutations. Dropping it detaches.
    type Subscription;

    /// Start observing mutations of the board element, if it is mounted.
    fn observe(&self) -> Option<Self::Subscription>;

    /// Current position as FEN.
    fn fen(&self) -> Option<String>;

    /// Side to move.
    fn turn(&self) -> Option<Side>;

    /// Side the local player is playing as.
    fn playing_as(&self) -> Option<Side>;

    /// Move history as PGN.
    fn pgn(&self) -> Option<String>;

    /// Replace every arrow marking on the board with `arrows`, atomically.
    fn replace_markings(&self, arrows: &[Arrow]);
}

/// Reads normalized snapshots from a [`HostBoard`].
pub struct BoardAdapter<B> {
    host: B,
}

impl<B: HostBoard> BoardAdapter<B> {
    pub fn new(host: B) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &B {
        &self.host
    }

    /// Sample the board. `None` means the board is unavailable right now.
    pub fn read_snapshot(&self) -> Option<BoardSnapshot> {
        let fen = self.host.fen()?;
        let turn = self.host.turn()?;
        let local_side = self.host.playing_as()?;

        // Round-trip through shakmaty so equal positions compare equal
        // regardless of how the host formats whitespace.
        let position = match fen.trim().parse::<Fen>() {
            Ok(parsed) => parsed.to_string(),
            Err(e) => {
                debug!(fen = %fen, error = %e, "Host reported unparseable FEN");
                return None;
            }
        };

        Some(BoardSnapshot {
            position,
            turn,
            local_side,
        })
    }

    /// Game record of the current game, if the host exposes one.
    pub fn read_history(&self) -> Option<String> {
        self.host.pgn().filter(|pgn| !pgn.trim().is_empty())
    }

    pub fn observe(&self) -> Option<B::Subscription> {
        self.host.observe()
    }

    pub fn replace_markings(&self, arrows: &[Arrow]) {
        self.host.replace_markings(arrows);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[derive(Default)]
    struct StubBoard {
        fen: Option<String>,
        turn: Option<Side>,
        playing_as: Option<Side>,
        pgn: Option<String>,
        markings: RefCell<Vec<Arrow>>,
    }

    impl HostBoard for StubBoard {
        type Subscription = ();

        fn observe(&self) -> Option<()> {
            self.fen.as_ref().map(|_| ())
        }

        fn fen(&self) -> Option<String> {
            self.fen.clone()
        }

        fn turn(&self) -> Option<Side> {
            self.turn
        }

        fn playing_as(&self) -> Option<Side> {
            self.playing_as
        }

        fn pgn(&self) -> Option<String> {
            self.pgn.clone()
        }

        fn replace_markings(&self, arrows: &[Arrow]) {
            *self.markings.borrow_mut() = arrows.to_vec();
        }
    }

    fn loaded() -> StubBoard {
        StubBoard {
            fen: Some(START.to_string()),
            turn: Some(Side::White),
            playing_as: Some(Side::Black),
            ..Default::default()
        }
    }

    #[test]
    fn test_snapshot_from_loaded_board() {
        let adapter = BoardAdapter::new(loaded());
        let snapshot = adapter.read_snapshot().unwrap();
        assert_eq!(snapshot.position, START);
        assert_eq!(snapshot.turn, Side::White);
        assert_eq!(snapshot.local_side, Side::Black);
        assert!(!snapshot.is_local_turn());
    }

    #[test]
    fn test_snapshot_normalizes_whitespace() {
        let board = StubBoard {
            fen: Some(format!("  {START}\n")),
            ..loaded()
        };
        let snapshot = BoardAdapter::new(board).read_snapshot().unwrap();
        assert_eq!(snapshot.position, START);
    }

    #[test]
    fn test_missing_game_is_unavailable() {
        assert!(BoardAdapter::new(StubBoard::default()).read_snapshot().is_none());

        let no_side = StubBoard {
            playing_as: None,
            ..loaded()
        };
        assert!(BoardAdapter::new(no_side).read_snapshot().is_none());
    }

    #[test]
    fn test_garbage_fen_is_unavailable() {
        let board = StubBoard {
            fen: Some("not a position".to_string()),
            ..loaded()
        };
        assert!(BoardAdapter::new(board).read_snapshot().is_none());
    }

    #[test]
    fn test_history_skips_blank_pgn() {
        let board = StubBoard {
            pgn: Some("   ".to_string()),
            ..loaded()
        };
        assert!(BoardAdapter::new(board).read_history().is_none());

        let board = StubBoard {
            pgn: Some("1. e4 e5".to_string()),
            ..loaded()
        };
        assert_eq!(BoardAdapter::new(board).read_history().as_deref(), Some("1. e4 e5"));
    }
}
