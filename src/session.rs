//! Thread-safe session handles.
//!
//! A [`SharedSession`] serializes every intent for one battle behind a mutex;
//! a [`SessionRegistry`] keeps any number of independent sessions that may be
//! driven from different threads.

use crate::engine::{BattleEngine, PublicState, RoundPhase, RoundResult};
use crate::error::{BattleError, BattleResult};
use crate::model::{PlayerId, SkillParams};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::debug;

#[derive(Clone)]
pub struct SharedSession {
    engine: Arc<Mutex<BattleEngine>>,
}

impl SharedSession {
    pub fn new(engine: BattleEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> BattleResult<MutexGuard<'_, BattleEngine>> {
        self.engine.lock().map_err(|_| BattleError::LockPoisoned)
    }

    pub fn select_character(
        &self,
        player: &PlayerId,
        character: &str,
        style: &str,
        display_name: Option<&str>,
        chosen_skills: &[String],
    ) -> BattleResult<()> {
        self.lock()?
            .select_character(player, character, style, display_name, chosen_skills)
    }

    /// Records a move. Once every eligible player has moved the round is
    /// processed under the same lock and its result returned.
    pub fn submit_move(&self, player: &PlayerId, token: &str) -> BattleResult<Option<RoundResult>> {
        let mut engine = self.lock()?;
        engine.submit_move(player, token)?;
        if engine.phase() == RoundPhase::Resolving {
            debug!(player = %player, round = engine.round() + 1, "all moves in");
            return engine.process_round().map(Some);
        }
        Ok(None)
    }

    pub fn use_skill(
        &self,
        player: &PlayerId,
        skill: &str,
        targets: &[PlayerId],
        params: &SkillParams,
    ) -> BattleResult<()> {
        self.lock()?.use_skill(player, skill, targets, params)
    }

    /// Forces the round through, auto-filling missing moves.
    pub fn process_round(&self) -> BattleResult<RoundResult> {
        self.lock()?.process_round()
    }

    pub fn remove_player(&self, player: &PlayerId) -> BattleResult<()> {
        self.lock()?.remove_player(player)
    }

    pub fn public_state(&self) -> BattleResult<PublicState> {
        Ok(self.lock()?.public_state())
    }

    pub fn is_game_over(&self) -> BattleResult<bool> {
        Ok(self.lock()?.is_game_over())
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut BattleEngine) -> T) -> BattleResult<T> {
        Ok(f(&mut *self.lock()?))
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session, replacing any previous one under the same key.
    pub fn create(&self, key: impl Into<String>, engine: BattleEngine) -> BattleResult<SharedSession> {
        let session = SharedSession::new(engine);
        let mut sessions = self.sessions.write().map_err(|_| BattleError::LockPoisoned)?;
        sessions.insert(key.into(), session.clone());
        Ok(session)
    }

    pub fn get(&self, key: &str) -> Option<SharedSession> {
        self.sessions
            .read()
            .ok()
            .and_then(|sessions| sessions.get(key).cloned())
    }

    pub fn remove(&self, key: &str) -> Option<SharedSession> {
        self.sessions
            .write()
            .ok()
            .and_then(|mut sessions| sessions.remove(key))
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forces a round on every running session in parallel. Sessions that
    /// have not started or are already over are skipped.
    pub fn tick_all(&self) -> Vec<(String, BattleResult<RoundResult>)> {
        let snapshot: Vec<(String, SharedSession)> = match self.sessions.read() {
            Ok(sessions) => sessions
                .iter()
                .map(|(key, session)| (key.clone(), session.clone()))
                .collect(),
            Err(_) => return Vec::new(),
        };
        let mut results: Vec<(String, BattleResult<RoundResult>)> = snapshot
            .par_iter()
            .filter_map(|(key, session)| {
                let mut engine = match session.lock() {
                    Ok(engine) => engine,
                    Err(err) => return Some((key.clone(), Err(err))),
                };
                if !engine.is_started() || engine.is_game_over() {
                    return None;
                }
                Some((key.clone(), engine.process_round()))
            })
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Drops every finished session and returns their keys.
    pub fn reap_finished(&self) -> Vec<String> {
        let Ok(mut sessions) = self.sessions.write() else {
            return Vec::new();
        };
        let finished: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.is_game_over().unwrap_or(true))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &finished {
            sessions.remove(key);
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;

    fn duel_engine(seed: u64) -> BattleEngine {
        let mut engine = BattleEngine::new(
            ["p1", "p2"].into_iter().map(PlayerId::from),
            Mode::Standard,
            seed,
        );
        for id in ["p1", "p2"] {
            engine
                .select_character(&PlayerId::new(id), "commoner", "damage", None, &[])
                .unwrap();
        }
        engine
    }

    #[test]
    fn last_move_triggers_the_round() {
        let session = SharedSession::new(duel_engine(1));
        let first = session.submit_move(&PlayerId::new("p1"), "rock").unwrap();
        assert!(first.is_none());
        let result = session
            .submit_move(&PlayerId::new("p2"), "scissors")
            .unwrap()
            .expect("round should resolve");
        assert_eq!(result.round, 1);
        assert_eq!(result.winners, vec![PlayerId::new("p1")]);
        let state = session.public_state().unwrap();
        assert_eq!(state.round, 1);
    }

    #[test]
    fn rejected_move_leaves_session_untouched() {
        let session = SharedSession::new(duel_engine(2));
        let err = session.submit_move(&PlayerId::new("p1"), "lizard").unwrap_err();
        assert_eq!(err, BattleError::InvalidMove("lizard".into()));
        assert_eq!(session.public_state().unwrap().round, 0);
    }

    #[test]
    fn registry_ticks_sessions_independently() {
        let registry = SessionRegistry::new();
        registry.create("a", duel_engine(3)).unwrap();
        registry.create("b", duel_engine(4)).unwrap();
        registry
            .create(
                "lobby",
                BattleEngine::new(["x", "y"].into_iter().map(PlayerId::from), Mode::Standard, 5),
            )
            .unwrap();
        assert_eq!(registry.len(), 3);

        let results = registry.tick_all();
        let keys: Vec<&str> = results.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(results.iter().all(|(_, r)| r.is_ok()));

        let a = registry.get("a").unwrap();
        a.remove_player(&PlayerId::new("p2")).unwrap();
        assert_eq!(registry.reap_finished(), vec!["a".to_string()]);
        assert!(registry.get("a").is_none());
        assert_eq!(registry.len(), 2);
    }
}
