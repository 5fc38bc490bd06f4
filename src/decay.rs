//! Start-of-round tick: cooldowns, timed statuses, timers, charges.

use crate::battlefield::Battlefield;
use crate::effects::Hit;
use crate::model::{Buff, PlayerId, SpecialState};

/// Decrements timed entries and returns the ones that ran out.
/// Permanent entries are untouched.
pub fn tick_buffs(list: &mut Vec<Buff>) -> Vec<Buff> {
    let mut expired = Vec::new();
    list.retain_mut(|buff| {
        if buff.is_permanent() {
            return true;
        }
        buff.duration = (buff.duration - 1).max(0);
        if buff.duration == 0 {
            expired.push(buff.clone());
            false
        } else {
            true
        }
    });
    expired
}

impl Battlefield {
    pub(crate) fn decay(&mut self) {
        for idx in 0..self.players.len() {
            self.decay_player(idx);
        }
        self.decay_special_state();
        self.release_charges();
    }

    fn decay_player(&mut self, idx: usize) {
        let player = &mut self.players[idx];
        player.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });

        let regen: i32 = player
            .buffs
            .iter()
            .map(|b| b.effects.regen)
            .filter(|r| *r > 0)
            .sum();
        if regen > 0 {
            self.apply_heal(idx, regen);
        }

        let player = &mut self.players[idx];
        let mut expired = tick_buffs(&mut player.buffs);
        expired.extend(tick_buffs(&mut player.debuffs));
        let id = player.id.clone();
        for buff in expired {
            self.log.log_expire(&id, &buff.name);
            if buff.effects.delayed_damage > 0 {
                self.apply_damage(
                    idx,
                    buff.effects.delayed_damage,
                    buff.source.as_ref(),
                    Hit::TRUE,
                );
            }
        }

        let player = &mut self.players[idx];
        player.flags.invincible = player.flags.invincible.saturating_sub(1);
        player.flags.stealth = player.flags.stealth.saturating_sub(1);
        player.borrowed.retain_mut(|borrowed| {
            borrowed.remaining = borrowed.remaining.saturating_sub(1);
            borrowed.remaining > 0
        });

        if player.flags.ghost_mode {
            player.flags.ghost_timer = player.flags.ghost_timer.saturating_sub(1);
            if player.flags.ghost_timer == 0 {
                self.revive_ghost(idx);
            }
        } else if !player.alive && player.flags.revive_timer > 0 {
            player.flags.revive_timer -= 1;
            if player.flags.revive_timer == 0 {
                self.revive_infinite(idx);
            }
        }
    }

    fn decay_special_state(&mut self) {
        let Some(SpecialState::Duel(duel)) = &mut self.special_state else {
            return;
        };
        duel.rounds_remaining = duel.rounds_remaining.saturating_sub(1);
        let challenger = duel.challenger.clone();
        let opponent = duel.opponent.clone();
        let expired = duel.rounds_remaining == 0;
        let standing = |id: &PlayerId| self.player(id).is_some_and(|p| p.alive);
        if expired || !standing(&challenger) || !standing(&opponent) {
            self.special_state = None;
            self.log.log_message(&format!(
                "duel between {challenger} and {opponent} is over"
            ));
        }
    }
}
