//! Mutable per-session state shared by effect resolution, death handling and
//! the round tick.

use crate::catalog::{Catalog, SkillDefinition};
use crate::config::EngineConfig;
use crate::log::BattleLog;
use crate::model::{Mode, PlayerId, PlayerState, SpecialState};
use rand::rngs::SmallRng;
use std::sync::Arc;

pub struct Battlefield {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) config: EngineConfig,
    pub(crate) mode: Mode,
    pub(crate) round: u32,
    /// Arena of player records, in seat order.
    pub(crate) players: Vec<PlayerState>,
    pub(crate) boss: Option<PlayerId>,
    pub(crate) special_state: Option<SpecialState>,
    pub(crate) rng: SmallRng,
    pub(crate) log: BattleLog,
}

impl Battlefield {
    pub fn index_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    pub fn is_boss(&self, id: &PlayerId) -> bool {
        self.boss.as_ref() == Some(id)
    }

    pub fn duel(&self) -> Option<&crate::model::DuelState> {
        match &self.special_state {
            Some(SpecialState::Duel(duel)) => Some(duel),
            None => None,
        }
    }

    /// Finds the definition behind a skill id the player holds: shared
    /// skills, then the player's own character, then borrowed skills, then
    /// boss skills.
    pub fn skill_definition(&self, player: &PlayerState, skill: &str) -> Option<SkillDefinition> {
        if let Some(def) = self.catalog.resolve_skill(skill, player.character.as_deref()) {
            return Some(def.clone());
        }
        player
            .borrowed
            .iter()
            .find(|b| b.skill == skill)
            .and_then(|b| self.catalog.character_skill(&b.from_character, &b.skill))
            .cloned()
    }

    pub(crate) fn clamp_wins(&mut self, idx: usize) {
        let threshold = self.config.win_threshold;
        let player = &mut self.players[idx];
        player.wins = player.wins.min(threshold);
    }

    pub(crate) fn add_wins(&mut self, idx: usize, amount: u32) {
        self.players[idx].wins = self.players[idx].wins.saturating_add(amount);
        self.clamp_wins(idx);
    }
}
