//! Random decision-making for unattended matches.

use crate::catalog::{EffectKind, TargetRule};
use crate::engine::BattleEngine;
use crate::model::{CoinFace, Move, PlayStyle, PlayerId, SkillParams, SpecialState};
use crate::targeting::{eligible_any, eligible_enemies};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A character pick, ready for [`BattleEngine::select_character`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub character: String,
    pub style: PlayStyle,
    pub skills: Vec<String>,
}

/// A skill invocation, ready for [`BattleEngine::use_skill`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillIntent {
    pub skill: String,
    pub targets: Vec<PlayerId>,
    pub params: SkillParams,
}

pub trait BattlePolicy {
    fn choose_character(&mut self, engine: &BattleEngine, player: &PlayerId) -> Selection;
    fn choose_move(&mut self, engine: &BattleEngine, player: &PlayerId) -> Move;
    fn choose_skill(&mut self, engine: &BattleEngine, player: &PlayerId) -> Option<SkillIntent>;
}

pub struct RandomPlayer {
    rng: SmallRng,
    /// Chance in percent of trying a skill on a given round.
    skill_rate: u32,
    /// Forces this character instead of picking one.
    character: Option<String>,
}

impl RandomPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            skill_rate: 70,
            character: None,
        }
    }

    pub fn with_character(mut self, character: impl Into<String>) -> Self {
        self.character = Some(character.into());
        self
    }

    pub fn with_skill_rate(mut self, percent: u32) -> Self {
        self.skill_rate = percent.min(100);
        self
    }
}

/// Picks a legal target list for a rule, or `None` when no legal one exists.
pub fn pick_targets<R: Rng>(
    rule: TargetRule,
    caster: &PlayerId,
    engine: &BattleEngine,
    rng: &mut R,
) -> Option<Vec<PlayerId>> {
    let duel = match engine.special_state() {
        Some(SpecialState::Duel(duel)) => Some(duel),
        None => None,
    };
    let enemies = eligible_enemies(caster, engine.players(), duel);
    let any = eligible_any(caster, engine.players(), duel);
    let pick = |pool: &[PlayerId], count: usize, rng: &mut R| {
        if pool.is_empty() {
            None
        } else {
            Some(pool.choose_multiple(rng, count).cloned().collect::<Vec<_>>())
        }
    };
    match rule {
        TargetRule::SelfOnly => Some(vec![caster.clone()]),
        TargetRule::SingleEnemy | TargetRule::AnySkill => pick(&enemies, 1, rng),
        TargetRule::SingleAny => pick(&any, 1, rng),
        TargetRule::TwoEnemies => pick(&enemies, 2, rng),
        TargetRule::TwoAny => pick(&any, 2, rng),
        TargetRule::AllOthers => (!enemies.is_empty()).then_some(enemies),
    }
}

impl BattlePolicy for RandomPlayer {
    fn choose_character(&mut self, engine: &BattleEngine, _player: &PlayerId) -> Selection {
        let catalog = engine.catalog();
        let character = self.character.clone().unwrap_or_else(|| {
            catalog
                .characters()
                .choose(&mut self.rng)
                .map(|c| c.id.clone())
                .unwrap_or_default()
        });
        let style = *PlayStyle::ALL
            .choose(&mut self.rng)
            .unwrap_or(&PlayStyle::Damage);
        let pool = catalog.common_pool();
        let skills = pool
            .choose_multiple(&mut self.rng, engine.config().infinite_skill_count)
            .cloned()
            .collect();
        Selection {
            character,
            style,
            skills,
        }
    }

    fn choose_move(&mut self, _engine: &BattleEngine, _player: &PlayerId) -> Move {
        *Move::ALL.choose(&mut self.rng).unwrap_or(&Move::Rock)
    }

    fn choose_skill(&mut self, engine: &BattleEngine, player: &PlayerId) -> Option<SkillIntent> {
        if self.rng.gen_range(0..100) >= self.skill_rate {
            return None;
        }
        let state = engine.player(player)?;
        if state.wins < engine.config().skill_unlock_wins || state.is_controlled() {
            return None;
        }
        let ready: Vec<&String> = state
            .available_skills
            .iter()
            .chain(state.borrowed.iter().map(|b| &b.skill))
            .filter(|skill| state.cooldown(skill) == 0)
            .collect();
        let skill = (*ready.choose(&mut self.rng)?).clone();
        let def = engine
            .catalog()
            .resolve_skill(&skill, state.character.as_deref())
            .or_else(|| {
                state
                    .borrowed
                    .iter()
                    .find(|b| b.skill == skill)
                    .and_then(|b| engine.catalog().character_skill(&b.from_character, &b.skill))
            })?;
        let targets = pick_targets(def.target, player, engine, &mut self.rng)?;
        let spare_win = state.wins > engine.config().skill_unlock_wins;
        let params = if matches!(def.effect, EffectKind::CoinDamage { .. })
            && spare_win
            && self.rng.gen_bool(0.5)
        {
            let face = if self.rng.gen_bool(0.5) {
                CoinFace::Heads
            } else {
                CoinFace::Tails
            };
            call_coin(face)
        } else {
            SkillParams::default()
        };
        Some(SkillIntent {
            skill,
            targets,
            params,
        })
    }
}

/// Result of an unattended match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchOutcome {
    pub rounds: u32,
    pub winner: Option<PlayerId>,
    /// Hit the round cap before the game ended.
    pub timed_out: bool,
}

/// Drives a fresh engine to completion with one policy per seat, in seat
/// order. Rejected intents are skipped; the engine logs them.
pub fn play_match<P: BattlePolicy>(
    engine: &mut BattleEngine,
    policies: &mut [P],
    max_rounds: u32,
) -> MatchOutcome {
    loop {
        if engine.is_game_over() || engine.round() >= max_rounds {
            break;
        }
        let seats: Vec<PlayerId> = engine.players().iter().map(|p| p.id.clone()).collect();
        for (seat, id) in seats.iter().enumerate() {
            let Some(policy) = policies.get_mut(seat) else {
                continue;
            };
            let needs_pick = engine
                .player(id)
                .is_some_and(|p| p.alive && !p.locked_in);
            if needs_pick {
                let pick = policy.choose_character(engine, id);
                let style = pick.style.to_string();
                let _ = engine.select_character(id, &pick.character, &style, None, &pick.skills);
            }
        }
        if !engine.is_started() {
            break;
        }
        for (seat, id) in seats.iter().enumerate() {
            let Some(policy) = policies.get_mut(seat) else {
                continue;
            };
            if engine.eligible_movers().contains(id) {
                let choice = policy.choose_move(engine, id);
                let _ = engine.throw_move(id, choice);
            }
            if let Some(intent) = policy.choose_skill(engine, id) {
                let _ = engine.use_skill(id, &intent.skill, &intent.targets, &intent.params);
            }
        }
        if engine.process_round().is_err() {
            break;
        }
    }
    MatchOutcome {
        rounds: engine.round(),
        winner: engine.winner().cloned(),
        timed_out: !engine.is_game_over(),
    }
}

/// Turns a requested coin face into skill params that spend a win.
pub fn call_coin(face: CoinFace) -> SkillParams {
    let token = match face {
        CoinFace::Heads => "heads",
        CoinFace::Tails => "tails",
    };
    SkillParams::consume_win(token)
}
