use crate::model::{Move, PlayerId};

/// Judges one round of throws. A move wins when the move it beats was thrown
/// and the move that beats it was not; identical throws all around produce
/// no winner.
pub fn judge_moves(moves: &[(PlayerId, Move)]) -> Vec<PlayerId> {
    let mut counts = [0usize; 3];
    for (_, choice) in moves {
        counts[choice.index()] += 1;
    }
    let distinct = counts.iter().filter(|c| **c > 0).count();
    if distinct <= 1 {
        return Vec::new();
    }
    let winning = |choice: Move| {
        counts[choice.beats().index()] > 0 && counts[choice.beaten_by().index()] == 0
    };
    moves
        .iter()
        .filter(|(_, choice)| winning(*choice))
        .map(|(id, _)| id.clone())
        .collect()
}
