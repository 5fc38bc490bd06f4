use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Balance constants an engine runs with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wins that end the game.
    pub win_threshold: u32,
    /// Wins a player must hold before any skill may be queued.
    pub skill_unlock_wins: u32,
    pub infinite_max_hp: i32,
    pub infinite_skill_count: usize,
    pub revive_delay: u32,
    pub max_revives: u32,
    pub boss_base_hp: i32,
    pub boss_hp_per_player: i32,
    pub puppet_hp: i32,
    /// Every n-th round triggers a random event; 0 disables events.
    pub event_interval: u32,
    pub event_heal: i32,
    pub advanced_proficiency: u32,
    pub min_players: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            win_threshold: 3,
            skill_unlock_wins: 1,
            infinite_max_hp: 12,
            infinite_skill_count: 5,
            revive_delay: 2,
            max_revives: 3,
            boss_base_hp: 50,
            boss_hp_per_player: 10,
            puppet_hp: 15,
            event_interval: 3,
            event_heal: 2,
            advanced_proficiency: 10,
            min_players: 2,
        }
    }
}

impl EngineConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config in {}", path.display()))
    }

    pub fn boss_hp(&self, player_count: usize) -> i32 {
        let count = i32::try_from(player_count).unwrap_or(i32::MAX);
        self.boss_base_hp
            .saturating_add(self.boss_hp_per_player.saturating_mul(count))
    }
}
