//! What happens when a seat drops to zero HP, and the matching revivals.

use crate::battlefield::Battlefield;
use crate::catalog::EffectKind;
use crate::model::{Buff, EffectData, Mode, PlayerId, StatusFlags};
use tracing::info;

/// Which branch a death resolved through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathOutcome {
    Puppet,
    Unyielding,
    GhostMode,
    PendingRevive,
    Dead,
}

struct UnyieldingTrigger {
    skill: String,
    name: String,
    shield: i32,
    duration: i32,
}

impl Battlefield {
    fn unyielding_trigger(&self, idx: usize) -> Option<UnyieldingTrigger> {
        let player = &self.players[idx];
        player.available_skills.iter().find_map(|skill| {
            let def = self.skill_definition(player, skill)?;
            match def.effect {
                EffectKind::Unyielding {
                    shield,
                    shield_duration,
                } => Some(UnyieldingTrigger {
                    skill: skill.clone(),
                    name: def.name,
                    shield,
                    duration: shield_duration,
                }),
                _ => None,
            }
        })
    }

    /// Resolves a death in priority order: boss puppet, unyielding, ghost
    /// mode, infinite-mode revival, permanent death.
    pub(crate) fn handle_death(&mut self, idx: usize, source: Option<&PlayerId>) -> DeathOutcome {
        let boss = self.boss.clone();
        let id = self.players[idx].id.clone();

        let killed_by_boss = self.mode == Mode::Boss
            && boss.is_some()
            && source == boss.as_ref()
            && boss.as_ref() != Some(&id);
        if killed_by_boss {
            let puppet_hp = self.config.puppet_hp;
            let player = &mut self.players[idx];
            player.hp = puppet_hp.min(player.max_hp).max(1);
            player.puppet_master = boss;
            self.log.log_status(&id, "puppet");
            info!(player = %id, "player turned into a boss puppet");
            return DeathOutcome::Puppet;
        }

        if let Some(trigger) = self.unyielding_trigger(idx) {
            let player = &mut self.players[idx];
            player.available_skills.retain(|s| *s != trigger.skill);
            player.hp = player.max_hp.min(1);
            let shield = Buff::new(
                trigger.name.clone(),
                trigger.duration,
                EffectData {
                    damage_reduction: trigger.shield,
                    ..EffectData::default()
                },
            );
            player.buffs.push(shield);
            self.log.log_status(&id, "unyielding");
            self.log.log_buff(&id, &trigger.name, trigger.duration);
            return DeathOutcome::Unyielding;
        }

        let player = &mut self.players[idx];
        if let Some(profile) = player.flags.ghost.clone() {
            if !player.flags.ghost_mode {
                player.hp = 0;
                player.flags.ghost_mode = true;
                player.flags.ghost_hits = profile.hits.max(1);
                player.flags.ghost_timer = profile.revive_time.max(1);
                self.log.log_status(&id, "ghost");
                return DeathOutcome::GhostMode;
            }
        }

        player.hp = 0;
        player.alive = false;
        self.log.log_faint(&id);
        if self.mode == Mode::Infinite && player.revive_count < self.config.max_revives {
            player.revive_count += 1;
            player.flags.revive_timer = self.config.revive_delay.max(1);
            self.log.log_status(&id, "revive_pending");
            return DeathOutcome::PendingRevive;
        }
        DeathOutcome::Dead
    }

    /// Ghost-mode timer ran out before the hit counter did.
    pub(crate) fn revive_ghost(&mut self, idx: usize) {
        let player = &mut self.players[idx];
        player.flags.ghost_mode = false;
        player.flags.ghost_hits = 0;
        player.flags.ghost_timer = 0;
        let profile = player.flags.ghost.clone();
        let hp = profile.as_ref().map_or(1, |p| p.revive_hp);
        player.hp = hp.clamp(1, player.max_hp.max(1));
        if let Some(skill) = profile.and_then(|p| p.revive_skill) {
            player.grant_skill(&skill);
        }
        let id = player.id.clone();
        let hp = player.hp;
        self.log.log_revive(&id, hp);
    }

    /// Infinite-mode revival: full HP, and the player must pick again.
    pub(crate) fn revive_infinite(&mut self, idx: usize) {
        let player = &mut self.players[idx];
        player.alive = true;
        player.hp = player.max_hp;
        player.character = None;
        player.style = None;
        player.locked_in = false;
        player.available_skills.clear();
        player.cooldowns.clear();
        player.buffs.clear();
        player.debuffs.clear();
        player.evasion = 0;
        player.charges.clear();
        player.borrowed.clear();
        player.flags = StatusFlags::default();
        let id = player.id.clone();
        let hp = player.hp;
        self.log.log_revive(&id, hp);
        info!(player = %id, revives = self.players[idx].revive_count, "player revived");
    }
}
