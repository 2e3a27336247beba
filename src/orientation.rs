use crate::types::{AdvisoryResult, Side};

/// Reorder a result for the side the local player views the board from.
///
/// The service ranks lines for White; a Black viewer gets the rank order
/// reversed. Only the order changes, never the moves themselves.
pub fn normalize(result: AdvisoryResult, local_side: Side) -> AdvisoryResult {
    match local_side {
        Side::White => result,
        Side::Black => result.reversed(),
    }
}
