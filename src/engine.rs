//! Round state machine and the per-session operations clients drive.
//!
//! A [`BattleEngine`] owns one session. Intents (`select_character`,
//! `submit_move`, `use_skill`) are validated immediately and either rejected
//! or recorded; nothing touches HP until [`BattleEngine::process_round`]
//! drains them in a fixed order. All randomness flows from the seed passed
//! at construction, so a session replays exactly.

use crate::battlefield::Battlefield;
use crate::catalog::{Catalog, EffectKind, BOSS_SKILL_IDS};
use crate::config::EngineConfig;
use crate::error::{BattleError, BattleResult, ErrorKind};
use crate::judge::judge_moves;
use crate::log::BattleLog;
use crate::model::{
    CoinFace, Mode, Move, PendingSkill, PlayStyle, PlayerId, PlayerState, SkillParams,
    SpecialState,
};
use crate::targeting::validate_targets;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Waiting for moves and skills.
    AwaitingInput,
    /// Every eligible player has thrown; the round can be processed.
    Resolving,
    /// A round result was just emitted.
    Settled,
    Terminated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RandomEvent {
    HealAll { amount: i32 },
    DisableControl,
}

impl RandomEvent {
    pub fn label(&self) -> &'static str {
        match self {
            RandomEvent::HealAll { .. } => "heal_all",
            RandomEvent::DisableControl => "disable_control",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundMove {
    pub player: PlayerId,
    pub choice: Move,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    pub round: u32,
    pub moves: Vec<RoundMove>,
    pub winners: Vec<PlayerId>,
    pub log: Vec<String>,
    pub random_event: Option<RandomEvent>,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
}

/// What every client may see about a player. Cooldowns stay private.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub username: String,
    pub hp: i32,
    pub max_hp: i32,
    pub wins: u32,
    pub character: Option<String>,
    pub style: Option<PlayStyle>,
    pub available_skills: Vec<String>,
    pub alive: bool,
    pub locked_in: bool,
    pub buffs: Vec<String>,
    pub puppet_master: Option<PlayerId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicState {
    pub round: u32,
    pub mode: Mode,
    pub phase: RoundPhase,
    pub boss_id: Option<PlayerId>,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
    pub special_state: Option<SpecialState>,
    pub players: Vec<PublicPlayer>,
}

pub struct BattleEngine {
    field: Battlefield,
    phase: RoundPhase,
    started: bool,
    moves: Vec<(PlayerId, Move)>,
    queue: Vec<PendingSkill>,
    game_over: bool,
    winner: Option<PlayerId>,
}

fn report<T>(op: &'static str, player: &PlayerId, result: BattleResult<T>) -> BattleResult<T> {
    if let Err(err) = &result {
        match err.kind() {
            ErrorKind::DataIntegrity => {
                error!(op, player = %player, code = err.code(), "{err}")
            }
            ErrorKind::Validation | ErrorKind::State => {
                warn!(op, player = %player, code = err.code(), "{err}")
            }
        }
    }
    result
}

impl BattleEngine {
    /// Creates a session over the built-in catalog with default balance.
    pub fn new(player_ids: impl IntoIterator<Item = PlayerId>, mode: Mode, seed: u64) -> Self {
        Self::with_catalog(
            player_ids,
            mode,
            Catalog::builtin(),
            EngineConfig::default(),
            seed,
        )
    }

    pub fn with_catalog(
        player_ids: impl IntoIterator<Item = PlayerId>,
        mode: Mode,
        catalog: Arc<Catalog>,
        config: EngineConfig,
        seed: u64,
    ) -> Self {
        let mut players: Vec<PlayerState> = Vec::new();
        for id in player_ids {
            if !players.iter().any(|p| p.id == id) {
                players.push(PlayerState::new(id));
            }
        }
        let field = Battlefield {
            catalog,
            config,
            mode,
            round: 0,
            players,
            boss: None,
            special_state: None,
            rng: SmallRng::seed_from_u64(seed),
            log: BattleLog::new(mode),
        };
        Self {
            field,
            phase: RoundPhase::AwaitingInput,
            started: false,
            moves: Vec::new(),
            queue: Vec::new(),
            game_over: false,
            winner: None,
        }
    }

    pub fn round(&self) -> u32 {
        self.field.round
    }

    pub fn mode(&self) -> Mode {
        self.field.mode
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// True once every seat has locked in a character at least once.
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn boss_id(&self) -> Option<&PlayerId> {
        self.field.boss.as_ref()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.field.player(id)
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.field.players
    }

    pub fn catalog(&self) -> &Catalog {
        &self.field.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.field.config
    }

    pub fn pending_skills(&self) -> &[PendingSkill] {
        &self.queue
    }

    pub fn special_state(&self) -> Option<&SpecialState> {
        self.field.special_state.as_ref()
    }

    pub fn log(&self) -> &BattleLog {
        &self.field.log
    }

    /// Players who owe a move this round: alive, locked in and not the boss.
    pub fn eligible_movers(&self) -> Vec<PlayerId> {
        self.field
            .players
            .iter()
            .filter(|p| p.alive && p.locked_in && !self.field.is_boss(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn all_moves_submitted(&self) -> bool {
        self.eligible_movers()
            .iter()
            .all(|id| self.moves.iter().any(|(mover, _)| mover == id))
    }

    /// Seeds the persisted proficiency counter for a (player, character) pair.
    pub fn set_proficiency(
        &mut self,
        player: &PlayerId,
        character: &str,
        value: u32,
    ) -> BattleResult<()> {
        if self.field.catalog.character(character).is_none() {
            return Err(BattleError::UnknownCharacter(character.to_string()));
        }
        let state = self
            .field
            .player_mut(player)
            .ok_or_else(|| BattleError::UnknownPlayer(player.clone()))?;
        state.proficiency.insert(character.to_string(), value);
        Ok(())
    }

    /// Locks in a character and playstyle. In infinite mode `chosen_skills`
    /// must name exactly the configured number of common skills; elsewhere it
    /// is ignored.
    pub fn select_character(
        &mut self,
        player: &PlayerId,
        character: &str,
        style: &str,
        display_name: Option<&str>,
        chosen_skills: &[String],
    ) -> BattleResult<()> {
        let result = self.try_select(player, character, style, display_name, chosen_skills);
        report("select_character", player, result)
    }

    fn try_select(
        &mut self,
        player_id: &PlayerId,
        character_id: &str,
        style: &str,
        display_name: Option<&str>,
        chosen_skills: &[String],
    ) -> BattleResult<()> {
        if self.game_over {
            return Err(BattleError::GameOver);
        }
        let idx = self
            .field
            .index_of(player_id)
            .ok_or_else(|| BattleError::UnknownPlayer(player_id.clone()))?;
        let state = &self.field.players[idx];
        if state.locked_in {
            return Err(BattleError::AlreadyLockedIn(player_id.clone()));
        }
        if !state.alive {
            return Err(BattleError::PlayerDead(player_id.clone()));
        }
        let catalog = Arc::clone(&self.field.catalog);
        let character = catalog
            .character(character_id)
            .ok_or_else(|| BattleError::UnknownCharacter(character_id.to_string()))?;
        let style: PlayStyle = style
            .parse()
            .map_err(|_| BattleError::InvalidStyle(style.to_string()))?;

        let config = &self.field.config;
        let infinite = self.field.mode == Mode::Infinite;
        if infinite {
            let distinct: BTreeSet<&String> = chosen_skills.iter().collect();
            if chosen_skills.len() != config.infinite_skill_count
                || distinct.len() != chosen_skills.len()
            {
                return Err(BattleError::WrongSkillCount {
                    expected: config.infinite_skill_count,
                    actual: distinct.len(),
                });
            }
        }

        let mut skills: Vec<String> = Vec::new();
        let mut grant = |skill: &str| {
            if !skills.iter().any(|s| s == skill) {
                skills.push(skill.to_string());
            }
        };
        if infinite {
            let pool = catalog.common_pool();
            for skill in chosen_skills {
                if !pool.contains(skill) {
                    return Err(BattleError::UnknownSkill(skill.clone()));
                }
                grant(skill);
            }
        } else {
            for skill in catalog.common_pool() {
                grant(&skill);
            }
        }
        for skill in character.granted_skill_ids() {
            grant(skill);
        }
        if infinite {
            for skill in catalog.infinite_bonus_skills() {
                grant(&skill);
            }
        }

        let max_hp = if infinite {
            config.infinite_max_hp
        } else {
            character.starting_hp()
        };
        let advanced_at = config.advanced_proficiency;
        let player = &mut self.field.players[idx];
        if let Some(name) = display_name {
            player.username = name.to_string();
        }
        player.character = Some(character.id.clone());
        player.style = Some(style);
        player.max_hp = max_hp;
        player.hp = max_hp;
        player.buffs.push(style.style_buff());
        player.available_skills = skills;
        let proficiency = player
            .proficiency
            .entry(character.id.clone())
            .or_insert(0);
        *proficiency += 1;
        let advanced = *proficiency >= advanced_at;
        if let Some(passive) = &character.passive {
            passive.apply(player, advanced);
        }
        player.locked_in = true;
        self.field
            .log
            .log_select(player_id, &character.id, style.buff_name());
        self.field.clamp_wins(idx);
        debug!(player = %player_id, character = %character.id, %style, advanced, "locked in");

        self.maybe_start();
        Ok(())
    }

    fn maybe_start(&mut self) {
        if self.started || self.game_over {
            return;
        }
        if self.field.players.is_empty() || !self.field.players.iter().all(|p| p.locked_in) {
            return;
        }
        self.started = true;
        info!(players = self.field.players.len(), mode = ?self.field.mode, "battle started");
        if self.field.mode == Mode::Boss && self.field.boss.is_none() {
            self.promote_boss();
        }
    }

    fn promote_boss(&mut self) {
        let count = self.field.players.len();
        let idx = self.field.rng.gen_range(0..count);
        let hp = self.field.config.boss_hp(count);
        let boss = &mut self.field.players[idx];
        boss.max_hp = hp;
        boss.hp = hp;
        for skill in BOSS_SKILL_IDS {
            boss.grant_skill(skill);
        }
        let id = boss.id.clone();
        self.field.log.log_status(&id, "boss");
        info!(boss = %id, hp, "boss promoted");
        self.field.boss = Some(id);
    }

    fn ensure_running(&self) -> BattleResult<()> {
        if self.game_over {
            return Err(BattleError::GameOver);
        }
        if !self.started {
            return Err(BattleError::NotStarted);
        }
        Ok(())
    }

    fn touch_phase(&mut self) {
        if self.phase == RoundPhase::Settled {
            self.phase = RoundPhase::AwaitingInput;
        }
        if self.all_moves_submitted() {
            self.phase = RoundPhase::Resolving;
        }
    }

    /// Records a move token (`rock`/`scissors`/`paper` or the Chinese names).
    /// A second submission in the same round replaces the first.
    pub fn submit_move(&mut self, player: &PlayerId, token: &str) -> BattleResult<()> {
        let result = token
            .parse::<Move>()
            .map_err(|_| BattleError::InvalidMove(token.to_string()))
            .and_then(|choice| self.try_throw(player, choice));
        report("submit_move", player, result)
    }

    pub fn throw_move(&mut self, player: &PlayerId, choice: Move) -> BattleResult<()> {
        let result = self.try_throw(player, choice);
        report("submit_move", player, result)
    }

    fn try_throw(&mut self, player: &PlayerId, choice: Move) -> BattleResult<()> {
        self.ensure_running()?;
        let state = self
            .field
            .player(player)
            .ok_or_else(|| BattleError::UnknownPlayer(player.clone()))?;
        if self.field.is_boss(player) {
            return Err(BattleError::BossCannotThrow);
        }
        if !state.alive {
            return Err(BattleError::PlayerDead(player.clone()));
        }
        if !state.locked_in {
            return Err(BattleError::NotLockedIn(player.clone()));
        }
        match self.moves.iter_mut().find(|(mover, _)| mover == player) {
            Some(slot) => slot.1 = choice,
            None => self.moves.push((player.clone(), choice)),
        }
        self.touch_phase();
        Ok(())
    }

    /// Validates and queues a skill invocation for the next round.
    pub fn use_skill(
        &mut self,
        player: &PlayerId,
        skill: &str,
        targets: &[PlayerId],
        params: &SkillParams,
    ) -> BattleResult<()> {
        let result = self.try_use_skill(player, skill, targets, params);
        report("use_skill", player, result)
    }

    fn try_use_skill(
        &mut self,
        player: &PlayerId,
        skill: &str,
        targets: &[PlayerId],
        params: &SkillParams,
    ) -> BattleResult<()> {
        self.ensure_running()?;
        let idx = self
            .field
            .index_of(player)
            .ok_or_else(|| BattleError::UnknownPlayer(player.clone()))?;
        let caster = &self.field.players[idx];
        if !caster.alive {
            return Err(BattleError::PlayerDead(player.clone()));
        }
        if !caster.locked_in {
            return Err(BattleError::NotLockedIn(player.clone()));
        }
        if !caster.has_skill(skill) {
            return Err(if self.field.catalog.knows_skill(skill) {
                BattleError::SkillUnavailable(skill.to_string())
            } else {
                BattleError::UnknownSkill(skill.to_string())
            });
        }
        if caster.is_controlled() {
            return Err(BattleError::Controlled(player.clone()));
        }
        let unlock = self.field.config.skill_unlock_wins;
        if caster.wins < unlock {
            return Err(BattleError::InsufficientWins {
                required: unlock,
                available: caster.wins,
            });
        }
        if params.use_win && caster.wins < 1 {
            return Err(BattleError::InsufficientWins {
                required: 1,
                available: caster.wins,
            });
        }
        let def = self
            .field
            .skill_definition(caster, skill)
            .ok_or_else(|| BattleError::MissingDefinition(skill.to_string()))?;
        if matches!(def.effect, EffectKind::Unyielding { .. }) {
            return Err(BattleError::TriggeredOnly(skill.to_string()));
        }
        if def.effect.deals_damage() && caster.has_flag(|e| e.no_attack) {
            return Err(BattleError::Disarmed(player.clone()));
        }
        let remaining = caster.cooldown(skill);
        if remaining > 0 {
            return Err(BattleError::OnCooldown {
                skill: skill.to_string(),
                remaining,
            });
        }
        let queued = self
            .queue
            .iter()
            .filter(|p| p.caster == *player && p.skill == skill)
            .count();
        if let Some(limit) = def.usage_limit {
            if queued >= limit as usize {
                return Err(BattleError::UsageLimitReached {
                    skill: skill.to_string(),
                    limit,
                });
            }
        }
        // A queued cooldown skill counts as cast for the rest of the window.
        if def.cooldown > 0 && queued > 0 {
            return Err(BattleError::OnCooldown {
                skill: skill.to_string(),
                remaining: def.cooldown,
            });
        }
        if !validate_targets(
            def.target,
            player,
            targets,
            &self.field.players,
            self.field.duel(),
        ) {
            return Err(BattleError::InvalidTargets {
                skill: skill.to_string(),
            });
        }
        let coin = match (&def.effect, &params.coin_choice) {
            (EffectKind::CoinDamage { .. }, Some(choice)) => Some(
                choice
                    .parse::<CoinFace>()
                    .map_err(|_| BattleError::InvalidCoinFace(choice.clone()))?,
            ),
            (EffectKind::CoinDamage { .. }, None) if params.use_win => {
                return Err(BattleError::InvalidCoinFace(String::new()));
            }
            _ => None,
        };

        let caster = &mut self.field.players[idx];
        if params.use_win {
            caster.wins -= 1;
        }
        self.queue.push(PendingSkill {
            caster: player.clone(),
            skill: skill.to_string(),
            targets: targets.to_vec(),
            coin: coin.filter(|_| params.use_win),
            consumed_win: params.use_win,
        });
        debug!(player = %player, skill, targets = targets.len(), "queued skill");
        self.touch_phase();
        Ok(())
    }

    /// Runs one round: decay, passives, judging, boss sync, skills, random
    /// event, game-over check. Missing moves are filled at random.
    pub fn process_round(&mut self) -> BattleResult<RoundResult> {
        self.ensure_running()?;
        let log_start = self.field.log.len();
        self.field.round += 1;
        let round = self.field.round;
        self.field.log.log_round(round);
        debug!(round, queued = self.queue.len(), "processing round");

        self.field.decay();
        self.apply_round_passives(round);

        let moves = self.fill_moves();
        for (player, choice) in &moves {
            self.field.log.log_move(player, *choice);
        }
        let winners = judge_moves(&moves);
        for winner in &winners {
            if let Some(idx) = self.field.index_of(winner) {
                if self.field.players[idx].alive {
                    self.field.add_wins(idx, 1);
                    let wins = self.field.players[idx].wins;
                    self.field.log.log_round_win(winner, wins);
                }
            }
        }

        self.sync_boss_wins();

        let queue = std::mem::take(&mut self.queue);
        for pending in &queue {
            self.field.resolve_pending(pending);
        }

        let random_event = self.maybe_random_event(round);
        self.check_game_over();
        self.moves.clear();
        if !self.game_over {
            self.phase = RoundPhase::Settled;
        }

        Ok(RoundResult {
            round,
            moves: moves
                .into_iter()
                .map(|(player, choice)| RoundMove { player, choice })
                .collect(),
            winners,
            log: self.field.log.since(log_start).to_vec(),
            random_event,
            game_over: self.game_over,
            winner: self.winner.clone(),
        })
    }

    fn apply_round_passives(&mut self, round: u32) {
        for idx in 0..self.field.players.len() {
            let player = &self.field.players[idx];
            if !player.alive || !player.locked_in {
                continue;
            }
            let id = player.id.clone();
            let interval = player.flags.win_interval;
            let bonus = player.flags.win_probability_bonus;
            let auto_cast = player.flags.auto_cast.clone();

            if let Some(interval) = interval {
                let lucky = if round % interval == 0 {
                    true
                } else {
                    bonus > 0 && self.field.rng.gen_range(0..100) < bonus
                };
                if lucky {
                    self.field.add_wins(idx, 1);
                    self.field.log.log_status(&id, "lucky_win");
                }
            }
            if let Some(auto_cast) = auto_cast {
                if round % auto_cast.every == 0 {
                    self.queue.push(PendingSkill {
                        caster: id.clone(),
                        skill: auto_cast.skill,
                        targets: vec![id],
                        coin: None,
                        consumed_win: false,
                    });
                }
            }
        }
    }

    /// Submitted moves of still-eligible players plus random fills, in seat order.
    fn fill_moves(&mut self) -> Vec<(PlayerId, Move)> {
        let eligible = self.eligible_movers();
        let mut moves = Vec::with_capacity(eligible.len());
        for id in eligible {
            let submitted = self
                .moves
                .iter()
                .find(|(mover, _)| *mover == id)
                .map(|(_, choice)| *choice);
            let choice = match submitted {
                Some(choice) => choice,
                None => Move::ALL[self.field.rng.gen_range(0..Move::ALL.len())],
            };
            moves.push((id, choice));
        }
        moves
    }

    fn sync_boss_wins(&mut self) {
        if self.field.mode != Mode::Boss {
            return;
        }
        let Some(boss) = self.field.boss.clone() else {
            return;
        };
        let best = self
            .field
            .players
            .iter()
            .filter(|p| p.id != boss)
            .map(|p| p.wins)
            .max()
            .unwrap_or(0);
        if let Some(idx) = self.field.index_of(&boss) {
            self.field.players[idx].wins = best;
            self.field.clamp_wins(idx);
        }
    }

    fn maybe_random_event(&mut self, round: u32) -> Option<RandomEvent> {
        let interval = self.field.config.event_interval;
        if interval == 0 || round % interval != 0 {
            return None;
        }
        let event = if self.field.rng.gen_bool(0.5) {
            RandomEvent::HealAll {
                amount: self.field.config.event_heal,
            }
        } else {
            RandomEvent::DisableControl
        };
        self.field.log.log_event(event.label());
        match &event {
            RandomEvent::HealAll { amount } => {
                for idx in 0..self.field.players.len() {
                    self.field.apply_heal(idx, *amount);
                }
            }
            RandomEvent::DisableControl => {
                for idx in 0..self.field.players.len() {
                    let player = &self.field.players[idx];
                    if player.flags.ignore_disable {
                        continue;
                    }
                    let control: Vec<String> = player
                        .available_skills
                        .iter()
                        .filter(|skill| {
                            self.field
                                .skill_definition(player, skill)
                                .is_some_and(|def| def.effect.is_control())
                        })
                        .cloned()
                        .collect();
                    let player = &mut self.field.players[idx];
                    for skill in control {
                        let cooldown = player.cooldowns.entry(skill).or_insert(0);
                        *cooldown = (*cooldown).max(1);
                    }
                }
            }
        }
        debug!(round, event = event.label(), "random event");
        Some(event)
    }

    /// Highest win count at or over the threshold; non-boss seats win ties,
    /// then seat order.
    fn threshold_winner(&self) -> Option<PlayerId> {
        let threshold = self.field.config.win_threshold;
        let boss = self.field.boss.as_ref();
        self.field
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.wins >= threshold && p.alive && p.puppet_master.is_none())
            .min_by_key(|(seat, p)| (Reverse(p.wins), boss == Some(&p.id), *seat))
            .map(|(_, p)| p.id.clone())
    }

    fn check_game_over(&mut self) {
        if self.game_over {
            return;
        }
        if let Some(winner) = self.threshold_winner() {
            self.finish(Some(winner));
            return;
        }

        let contenders: Vec<PlayerId> = self
            .field
            .players
            .iter()
            .filter(|p| p.is_contender())
            .map(|p| p.id.clone())
            .collect();
        if contenders.len() <= 1 {
            self.finish(contenders.into_iter().next());
        }
    }

    fn finish(&mut self, winner: Option<PlayerId>) {
        self.game_over = true;
        self.phase = RoundPhase::Terminated;
        self.queue.clear();
        self.moves.clear();
        self.field.log.log_game_over(winner.as_ref());
        info!(round = self.field.round, winner = ?winner, "battle over");
        self.winner = winner;
    }

    /// Drops a seat (disconnect). Too few remaining seats terminates the
    /// game without a winner and discards every queued intent.
    pub fn remove_player(&mut self, player: &PlayerId) -> BattleResult<()> {
        let idx = self
            .field
            .index_of(player)
            .ok_or_else(|| BattleError::UnknownPlayer(player.clone()))?;
        self.field.players.remove(idx);
        self.moves.retain(|(mover, _)| mover != player);
        self.queue.retain(|pending| pending.caster != *player);
        if self.field.is_boss(player) {
            self.field.boss = None;
            for state in &mut self.field.players {
                if state.puppet_master.as_ref() == Some(player) {
                    state.puppet_master = None;
                }
            }
        }
        if let Some(SpecialState::Duel(duel)) = &self.field.special_state {
            if duel.challenger == *player || duel.opponent == *player {
                self.field.special_state = None;
            }
        }
        self.field.log.log_message(&format!("{player} left the battle"));
        info!(player = %player, remaining = self.field.players.len(), "player removed");

        if self.game_over {
            return Ok(());
        }
        if self.field.players.len() < self.field.config.min_players {
            self.finish(None);
            return Ok(());
        }
        self.maybe_start();
        if self.started && self.all_moves_submitted() {
            self.phase = RoundPhase::Resolving;
        }
        Ok(())
    }

    pub fn public_state(&self) -> PublicState {
        PublicState {
            round: self.field.round,
            mode: self.field.mode,
            phase: self.phase,
            boss_id: self.field.boss.clone(),
            game_over: self.game_over,
            winner: self.winner.clone(),
            special_state: self.field.special_state.clone(),
            players: self
                .field
                .players
                .iter()
                .map(|p| PublicPlayer {
                    id: p.id.clone(),
                    username: p.username.clone(),
                    hp: p.hp,
                    max_hp: p.max_hp,
                    wins: p.wins,
                    character: p.character.clone(),
                    style: p.style,
                    available_skills: p.available_skills.clone(),
                    alive: p.alive,
                    locked_in: p.locked_in,
                    buffs: p.buff_names(),
                    puppet_master: p.puppet_master.clone(),
                })
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn field_mut(&mut self) -> &mut Battlefield {
        &mut self.field
    }
}
