use crate::autoplay::{play_match, RandomPlayer};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::engine::BattleEngine;
use crate::model::{Mode, PlayerId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

/// Rounds after which a simulated duel counts as a tie.
pub const DEFAULT_MAX_ROUNDS: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuelOutcome {
    AWins,
    BWins,
    Tie,
}

/// Plays one seeded 1v1 between two characters with random players.
pub fn simulate_duel(
    catalog: &Arc<Catalog>,
    config: &EngineConfig,
    character_a: &str,
    character_b: &str,
    seed: u64,
    max_rounds: u32,
) -> DuelOutcome {
    let seat_a = PlayerId::new("a");
    let seat_b = PlayerId::new("b");
    let mut engine = BattleEngine::with_catalog(
        [seat_a.clone(), seat_b.clone()],
        Mode::Standard,
        Arc::clone(catalog),
        config.clone(),
        seed,
    );
    let mut policies = [
        RandomPlayer::new(seed.wrapping_mul(31).wrapping_add(1)).with_character(character_a),
        RandomPlayer::new(seed.wrapping_mul(31).wrapping_add(2)).with_character(character_b),
    ];
    let outcome = play_match(&mut engine, &mut policies, max_rounds);
    match outcome.winner {
        Some(winner) if winner == seat_a => DuelOutcome::AWins,
        Some(winner) if winner == seat_b => DuelOutcome::BWins,
        _ => DuelOutcome::Tie,
    }
}

/// Win rate of the row character against the column character, ties
/// counting half. Cells are simulated in parallel, each from its own seed.
pub fn compute_matrix(
    catalog: &Arc<Catalog>,
    config: &EngineConfig,
    characters: &[String],
    sims_per_cell: usize,
    seed: u64,
) -> Vec<Vec<f64>> {
    let tasks: Vec<(usize, usize)> = (0..characters.len())
        .flat_map(|a| (0..characters.len()).map(move |b| (a, b)))
        .collect();
    let cell_results: Vec<CellResult> = tasks
        .par_iter()
        .map(|(a_idx, b_idx)| {
            let mut cell_rng =
                SmallRng::seed_from_u64(seed ^ ((*a_idx as u64) << 32) ^ (*b_idx as u64));
            let mut a_wins = 0u64;
            let mut ties = 0u64;
            for _ in 0..sims_per_cell {
                let duel_seed = cell_rng.gen();
                match simulate_duel(
                    catalog,
                    config,
                    &characters[*a_idx],
                    &characters[*b_idx],
                    duel_seed,
                    DEFAULT_MAX_ROUNDS,
                ) {
                    DuelOutcome::AWins => a_wins += 1,
                    DuelOutcome::BWins => {}
                    DuelOutcome::Tie => ties += 1,
                }
            }
            let total = sims_per_cell.max(1) as f64;
            CellResult {
                a_idx: *a_idx,
                b_idx: *b_idx,
                win_rate: (a_wins as f64 + 0.5 * ties as f64) / total,
            }
        })
        .collect();

    let mut matrix = vec![vec![0.0; characters.len()]; characters.len()];
    for cell in cell_results {
        matrix[cell.a_idx][cell.b_idx] = cell.win_rate;
    }
    matrix
}

struct CellResult {
    a_idx: usize,
    b_idx: usize,
    win_rate: f64,
}

/// Header row of character ids, then one labelled row per character.
pub fn render_csv(characters: &[String], matrix: &[Vec<f64>]) -> String {
    let mut out = String::from("character");
    for id in characters {
        out.push(',');
        out.push_str(id);
    }
    for (id, row) in characters.iter().zip(matrix) {
        out.push('\n');
        out.push_str(id);
        for value in row {
            out.push_str(&format!(",{value:.4}"));
        }
    }
    out
}

pub fn write_csv(
    characters: &[String],
    matrix: &[Vec<f64>],
    path: &std::path::Path,
) -> anyhow::Result<()> {
    std::fs::write(path, render_csv(characters, matrix))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duel_is_deterministic_for_a_seed() {
        let catalog = Catalog::builtin();
        let config = EngineConfig::default();
        let first = simulate_duel(&catalog, &config, "warrior", "medic", 42, 100);
        let second = simulate_duel(&catalog, &config, "warrior", "medic", 42, 100);
        assert_eq!(first, second);
    }

    #[test]
    fn matrix_cells_are_rates() {
        let catalog = Catalog::builtin();
        let characters = vec!["warrior".to_string(), "commoner".to_string()];
        let matrix = compute_matrix(&catalog, &EngineConfig::default(), &characters, 4, 9);
        assert_eq!(matrix.len(), 2);
        for row in &matrix {
            assert_eq!(row.len(), 2);
            for value in row {
                assert!((0.0..=1.0).contains(value));
            }
        }
    }

    #[test]
    fn csv_has_labels() {
        let characters = vec!["lucky".to_string(), "ghost".to_string()];
        let matrix = vec![vec![0.5, 0.25], vec![0.75, 0.5]];
        let csv = render_csv(&characters, &matrix);
        assert_eq!(
            csv,
            "character,lucky,ghost\nlucky,0.5000,0.2500\nghost,0.7500,0.5000"
        );
    }
}
