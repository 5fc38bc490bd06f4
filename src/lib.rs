pub mod autoplay;
pub mod battlefield;
pub mod catalog;
pub mod config;
pub mod death;
pub mod decay;
pub mod effects;
pub mod engine;
pub mod error;
pub mod judge;
pub mod log;
pub mod matrix;
pub mod model;
pub mod passive;
pub mod session;
pub mod targeting;

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::matrix::compute_matrix;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub mod prelude {
    pub use crate::catalog::{Catalog, CharacterDefinition, EffectKind, SkillDefinition, TargetRule};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{BattleEngine, PublicState, RandomEvent, RoundPhase, RoundResult};
    pub use crate::error::{BattleError, BattleResult, ErrorKind};
    pub use crate::model::{CoinFace, Mode, Move, PlayStyle, PlayerId, SkillParams};
    pub use crate::session::{SessionRegistry, SharedSession};
}

#[derive(Debug, Clone)]
pub struct CliOptions {
    /// Alternative catalog; the built-in one when absent.
    pub catalog_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    /// Restricts the matrix to these character ids.
    pub characters: Vec<String>,
    pub sims_per_cell: usize,
    pub seed: u64,
    pub output_path: PathBuf,
}

pub fn load_catalog(path: Option<&std::path::Path>) -> anyhow::Result<Arc<Catalog>> {
    match path {
        Some(path) => Ok(Arc::new(Catalog::from_path(path)?)),
        None => Ok(Catalog::builtin()),
    }
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    if opts.sims_per_cell == 0 {
        anyhow::bail!("--sims-per-cell must be > 0");
    }
    let catalog = load_catalog(opts.catalog_path.as_deref())?;
    let config = match &opts.config_path {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let characters: Vec<String> = if opts.characters.is_empty() {
        catalog.characters().iter().map(|c| c.id.clone()).collect()
    } else {
        for id in &opts.characters {
            catalog
                .character(id)
                .with_context(|| format!("Unknown character {id}"))?;
        }
        opts.characters.clone()
    };
    info!(
        characters = characters.len(),
        sims_per_cell = opts.sims_per_cell,
        seed = opts.seed,
        "computing win-rate matrix"
    );
    let matrix = compute_matrix(&catalog, &config, &characters, opts.sims_per_cell, opts.seed);
    matrix::write_csv(&characters, &matrix, &opts.output_path)?;
    println!(
        "Wrote {}x{} matrix to {}",
        matrix.len(),
        matrix.first().map(|r| r.len()).unwrap_or(0),
        opts.output_path.display()
    );
    Ok(())
}
