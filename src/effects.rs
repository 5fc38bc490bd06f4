//! Skill effect interpreter.
//!
//! Resolution mutates the [`Battlefield`] directly and narrates every change
//! into its [`crate::log::BattleLog`]. Damage and heal helpers here are also
//! used by the round tick and by random events.

use crate::battlefield::Battlefield;
use crate::catalog::{EffectKind, SkillDefinition, TargetRule};
use crate::model::{
    BorrowedSkill, Buff, CoinFace, DuelState, EffectData, PendingCharge, PendingSkill, PlayerId,
    SpecialState,
};
use rand::Rng;
use tracing::{debug, error};

/// How a single hit interacts with the target's defenses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hit {
    /// Skips evasion and damage reduction.
    pub ignore_defense: bool,
    /// Self-inflicted or on-expire damage; never evaded or reduced.
    pub true_damage: bool,
}

impl Hit {
    pub const NORMAL: Hit = Hit {
        ignore_defense: false,
        true_damage: false,
    };
    pub const TRUE: Hit = Hit {
        ignore_defense: true,
        true_damage: true,
    };

    pub fn piercing(ignore_defense: bool) -> Hit {
        Hit {
            ignore_defense,
            true_damage: false,
        }
    }

    fn bypasses_defense(self) -> bool {
        self.ignore_defense || self.true_damage
    }
}

/// Damage after reduction: a present reduction never lowers a hit below 1,
/// and without one the raw amount goes through.
pub fn reduce_damage(amount: i32, reduction: i32) -> i32 {
    if amount <= 0 {
        0
    } else if reduction > 0 {
        (amount - reduction).max(1)
    } else {
        amount
    }
}

/// Rounds `duration * pct / 100` up. Permanent durations stay permanent.
pub fn scale_duration(duration: i32, pct: u64) -> i32 {
    if duration < 0 || pct == 100 {
        return duration;
    }
    let scaled = (i64::from(duration) * pct as i64 + 99) / 100;
    i32::try_from(scaled).unwrap_or(i32::MAX)
}

impl Battlefield {
    /// Deals damage to a seat and runs death handling when HP reaches zero.
    /// Returns the damage that landed.
    pub(crate) fn apply_damage(
        &mut self,
        target: usize,
        amount: i32,
        source: Option<&PlayerId>,
        hit: Hit,
    ) -> i32 {
        let source = source.cloned();
        let player = &mut self.players[target];
        if !player.alive || amount <= 0 {
            return 0;
        }
        if player.flags.invincible > 0 {
            self.log.log_status(&player.id, "immune");
            return 0;
        }
        if player.flags.ghost_mode {
            player.flags.ghost_hits = player.flags.ghost_hits.saturating_sub(1);
            self.log.log_status(&player.id, "ghost_hit");
            if player.flags.ghost_hits == 0 {
                player.hp = 0;
                // Still flagged as a ghost here, so death handling skips that branch.
                self.handle_death(target, source.as_ref());
                let flags = &mut self.players[target].flags;
                flags.ghost_mode = false;
                flags.ghost_timer = 0;
            }
            return 0;
        }
        if !hit.bypasses_defense() && player.evasion > 0 {
            player.evasion -= 1;
            self.log.log_status(&player.id, "evade");
            return 0;
        }

        let reduction = if hit.bypasses_defense() {
            0
        } else {
            player.effect_total(|e| e.damage_reduction)
        };
        let dealt = reduce_damage(amount, reduction);
        player.hp = (player.hp - dealt).max(0);
        self.log
            .log_damage(&player.id, dealt, player.hp, player.max_hp);

        if player.hp == 0 {
            self.handle_death(target, source.as_ref());
        }
        dealt
    }

    /// Heals a living seat up to its max HP. Returns the HP restored.
    pub(crate) fn apply_heal(&mut self, target: usize, amount: i32) -> i32 {
        let player = &mut self.players[target];
        if !player.alive || player.flags.ghost_mode || amount <= 0 {
            return 0;
        }
        let before = player.hp;
        player.hp = player.hp.saturating_add(amount).min(player.max_hp);
        let healed = player.hp - before;
        self.log
            .log_heal(&player.id, healed, player.hp, player.max_hp);
        healed
    }

    fn attack_damage(&self, caster: usize, base: i32) -> i32 {
        let player = &self.players[caster];
        let raw = base + player.effect_total(|e| e.damage_bonus);
        let pct = player.multiplier_pct(|e| e.damage_multiplier_pct);
        let scaled = i64::from(raw) * pct as i64 / 100;
        i32::try_from(scaled).unwrap_or(i32::MAX)
    }

    fn heal_amount(&self, caster: usize, base: i32, skill: &str) -> i32 {
        let player = &self.players[caster];
        let mut raw = base + player.effect_total(|e| e.heal_bonus);
        if player.flags.taotao_skill.as_deref() == Some(skill) {
            raw += player.flags.taotao_bonus;
        }
        let pct = player.multiplier_pct(|e| e.heal_multiplier_pct);
        let scaled = i64::from(raw) * pct as i64 / 100;
        i32::try_from(scaled).unwrap_or(i32::MAX)
    }

    fn push_buff(&mut self, target: usize, buff: Buff) {
        let player = &mut self.players[target];
        self.log.log_buff(&player.id, &buff.name, buff.duration);
        player.buffs.push(buff);
    }

    fn push_debuff(&mut self, target: usize, debuff: Buff) {
        let player = &mut self.players[target];
        self.log
            .log_debuff(&player.id, &debuff.name, debuff.duration);
        player.debuffs.push(debuff);
    }

    /// Resolves one queued invocation and starts its cooldown.
    pub(crate) fn resolve_pending(&mut self, pending: &PendingSkill) {
        let Some(caster) = self.index_of(&pending.caster) else {
            return;
        };
        if !self.players[caster].alive {
            self.log
                .log_message(&format!("{} fizzles: caster is down", pending.skill));
            return;
        }
        let Some(def) = self.skill_definition(&self.players[caster], &pending.skill) else {
            error!(skill = %pending.skill, caster = %pending.caster, "queued skill lost its definition");
            self.log
                .log_message(&format!("{} fizzles: unknown skill", pending.skill));
            return;
        };

        self.log
            .log_skill(&pending.caster, &def.name, &pending.targets);
        let targets: Vec<usize> = pending
            .targets
            .iter()
            .filter_map(|id| self.index_of(id))
            .collect();
        self.apply_effect(caster, &def, &targets, pending);

        if def.cooldown > 0 {
            self.players[caster]
                .cooldowns
                .insert(pending.skill.clone(), def.cooldown);
        }
        debug!(caster = %pending.caster, skill = %pending.skill, "resolved skill");
    }

    fn apply_effect(
        &mut self,
        caster: usize,
        def: &SkillDefinition,
        targets: &[usize],
        pending: &PendingSkill,
    ) {
        let caster_id = self.players[caster].id.clone();
        let source = Some(&caster_id);
        let ignore_defense =
            def.ignore_defense || self.players[caster].has_flag(|e| e.ignore_defense);
        let own_targets: Vec<usize> = if targets.is_empty() {
            vec![caster]
        } else {
            targets.to_vec()
        };

        match &def.effect {
            EffectKind::DirectDamage { damage } => {
                let amount = self.attack_damage(caster, *damage);
                for &target in targets {
                    self.apply_damage(target, amount, source, Hit::piercing(ignore_defense));
                }
            }
            EffectKind::Heal { heal } => {
                let amount = self.heal_amount(caster, *heal, &def.id);
                for &target in &own_targets {
                    self.apply_heal(target, amount);
                }
            }
            EffectKind::Control {
                control_turns,
                self_damage,
                delayed_damage,
            } => {
                if *self_damage > 0 {
                    self.apply_damage(caster, *self_damage, source, Hit::TRUE);
                }
                let turns =
                    (control_turns + self.players[caster].effect_total(|e| e.control_bonus)).max(1);
                for &target in targets {
                    if !self.players[target].alive {
                        continue;
                    }
                    let debuff = Buff::new(
                        def.name.clone(),
                        turns,
                        EffectData {
                            controlled: true,
                            delayed_damage: *delayed_damage,
                            ..EffectData::default()
                        },
                    )
                    .with_source(caster_id.clone());
                    self.push_debuff(target, debuff);
                }
            }
            EffectKind::Buff {
                duration,
                damage_buff,
                damage_multiplier_pct,
                self_damage,
                ignore_defense,
                stealth,
            } => {
                let pct = self.players[caster].multiplier_pct(|e| e.buff_multiplier_pct);
                let buff = Buff::new(
                    def.name.clone(),
                    scale_duration(*duration, pct),
                    EffectData {
                        damage_bonus: *damage_buff,
                        damage_multiplier_pct: *damage_multiplier_pct,
                        ignore_defense: *ignore_defense,
                        ..EffectData::default()
                    },
                );
                self.push_buff(caster, buff);
                if *stealth > 0 {
                    let flags = &mut self.players[caster].flags;
                    flags.stealth = flags.stealth.max(*stealth);
                    self.log.log_status(&caster_id, "stealth");
                }
                if *self_damage > 0 {
                    self.apply_damage(caster, *self_damage, source, Hit::TRUE);
                }
            }
            EffectKind::Defense {
                evasion,
                damage_reduction,
                duration,
                max_hp_cost,
                invincible,
            } => {
                if *evasion > 0 {
                    self.players[caster].evasion += evasion;
                    self.log.log_status(&caster_id, "evasion");
                }
                if *damage_reduction > 0 {
                    let buff = Buff::new(
                        def.name.clone(),
                        *duration,
                        EffectData {
                            damage_reduction: *damage_reduction,
                            ..EffectData::default()
                        },
                    );
                    self.push_buff(caster, buff);
                }
                if *invincible > 0 {
                    let flags = &mut self.players[caster].flags;
                    flags.invincible = flags.invincible.max(*invincible);
                    self.log.log_status(&caster_id, "invincible");
                }
                if *max_hp_cost > 0 {
                    self.pay_max_hp(caster, *max_hp_cost);
                }
            }
            EffectKind::CoinDamage {
                heads_self_damage,
                heads_enemy_damage,
                tails_self_damage,
                tails_enemy_damage,
            } => {
                let face = pending.coin.unwrap_or_else(|| {
                    if self.rng.gen_bool(0.5) {
                        CoinFace::Heads
                    } else {
                        CoinFace::Tails
                    }
                });
                let (own, enemy) = match face {
                    CoinFace::Heads => (*heads_self_damage, *heads_enemy_damage),
                    CoinFace::Tails => (*tails_self_damage, *tails_enemy_damage),
                };
                let label = match face {
                    CoinFace::Heads => "coin:heads",
                    CoinFace::Tails => "coin:tails",
                };
                self.log.log_status(&caster_id, label);
                if own > 0 {
                    self.apply_damage(caster, own, source, Hit::TRUE);
                }
                if let Some(&target) = targets.first() {
                    self.apply_damage(target, enemy, source, Hit::piercing(ignore_defense));
                }
            }
            EffectKind::Duel { duel_rounds } => {
                let Some(&target) = targets.first() else {
                    return;
                };
                if self.special_state.is_some() {
                    self.log
                        .log_message("a duel is already under way; challenge ignored");
                    return;
                }
                let opponent = self.players[target].id.clone();
                self.log
                    .log_status(&opponent, &format!("duel:{caster_id}"));
                self.special_state = Some(SpecialState::Duel(DuelState {
                    challenger: caster_id.clone(),
                    opponent,
                    skill: def.id.clone(),
                    rounds_remaining: (*duel_rounds).max(1),
                }));
            }
            EffectKind::ChargeDamage {
                charge_time,
                damage,
            } => {
                let stored_targets = if def.target == TargetRule::AllOthers {
                    Vec::new()
                } else {
                    pending.targets.clone()
                };
                let charge = PendingCharge {
                    skill: def.id.clone(),
                    remaining: (*charge_time).max(1),
                    damage: self.attack_damage(caster, *damage),
                    targets: stored_targets,
                };
                self.players[caster].charges.push(charge);
                self.log.log_status(&caster_id, "charging");
            }
            EffectKind::Regen { heal, duration } => {
                let turns = duration + self.players[caster].effect_total(|e| e.duration_bonus);
                for &target in &own_targets {
                    if !self.players[target].alive {
                        continue;
                    }
                    let buff = Buff::new(
                        def.name.clone(),
                        turns,
                        EffectData {
                            regen: *heal,
                            ..EffectData::default()
                        },
                    );
                    self.push_buff(target, buff);
                }
            }
            EffectKind::DamageWithDelayedRegen {
                damage,
                regen,
                duration,
            } => {
                let amount = self.attack_damage(caster, *damage);
                for &target in targets {
                    self.apply_damage(target, amount, source, Hit::piercing(ignore_defense));
                    let victim = &self.players[target];
                    if victim.alive && !victim.flags.ghost_mode {
                        let buff = Buff::new(
                            def.name.clone(),
                            *duration,
                            EffectData {
                                regen: *regen,
                                ..EffectData::default()
                            },
                        );
                        self.push_buff(target, buff);
                    }
                }
            }
            EffectKind::Unyielding { .. } => {
                self.log
                    .log_message(&format!("{} only triggers on death", def.name));
            }
            EffectKind::Fortify {
                max_hp_cost,
                no_attack_rounds,
            } => {
                self.pay_max_hp(caster, *max_hp_cost);
                self.apply_heal(caster, *max_hp_cost);
                let debuff = Buff::new(
                    def.name.clone(),
                    (*no_attack_rounds).max(1),
                    EffectData {
                        no_attack: true,
                        ..EffectData::default()
                    },
                )
                .with_source(caster_id.clone());
                self.push_debuff(caster, debuff);
            }
            EffectKind::Replicate {
                duration,
                max_skills,
            } => {
                if let Some(&target) = targets.first() {
                    self.replicate(caster, target, *duration, *max_skills);
                }
            }
            EffectKind::Fortune { wins } => {
                self.add_wins(caster, *wins);
                let total = self.players[caster].wins;
                self.log.log_round_win(&caster_id, total);
            }
        }
    }

    fn pay_max_hp(&mut self, target: usize, cost: i32) {
        let player = &mut self.players[target];
        player.max_hp = (player.max_hp - cost).max(1);
        player.hp = player.hp.min(player.max_hp);
        self.log
            .log_status(&player.id, &format!("max_hp:{}", player.max_hp));
    }

    fn replicate(&mut self, caster: usize, target: usize, duration: u32, max_skills: usize) {
        let Some(from) = self.players[target].character.clone() else {
            self.log.log_message("nothing to replicate");
            return;
        };
        let Some(character) = self.catalog.character(&from) else {
            return;
        };
        let victim = &self.players[target];
        let thief = &self.players[caster];
        let copied: Vec<String> = character
            .skills
            .iter()
            .filter(|s| !matches!(s.effect, EffectKind::Unyielding { .. }))
            .filter(|s| victim.has_skill(&s.id) && !thief.has_skill(&s.id))
            .take(max_skills)
            .map(|s| s.id.clone())
            .collect();

        let caster_id = self.players[caster].id.clone();
        for skill in copied {
            self.log
                .log_status(&caster_id, &format!("replicate:{skill}"));
            self.players[caster].borrowed.push(BorrowedSkill {
                skill,
                from_character: from.clone(),
                remaining: duration.max(1),
            });
        }
    }

    /// Counts charges down and fires the ones that reach zero.
    pub(crate) fn release_charges(&mut self) {
        let mut fired = Vec::new();
        for (idx, player) in self.players.iter_mut().enumerate() {
            player.charges.retain_mut(|charge| {
                charge.remaining = charge.remaining.saturating_sub(1);
                if charge.remaining == 0 {
                    fired.push((idx, charge.clone()));
                    false
                } else {
                    true
                }
            });
        }

        for (caster, charge) in fired {
            if !self.players[caster].alive {
                continue;
            }
            let caster_id = self.players[caster].id.clone();
            self.log.log_status(&caster_id, &format!("release:{}", charge.skill));
            let targets: Vec<usize> = if charge.targets.is_empty() {
                (0..self.players.len())
                    .filter(|&idx| idx != caster && self.players[idx].alive)
                    .collect()
            } else {
                charge
                    .targets
                    .iter()
                    .filter_map(|id| self.index_of(id))
                    .collect()
            };
            for target in targets {
                self.apply_damage(target, charge.damage, Some(&caster_id), Hit::NORMAL);
            }
        }
    }
}
