//! Rejections surfaced by the battle engine.
//!
//! Every public engine operation returns [`BattleError`] on failure. Errors are
//! always recoverable from the session's point of view: the offending intent is
//! dropped and the session keeps running. [`BattleError::kind`] groups the
//! variants so callers can pick a handling strategy without matching on each one.

use crate::model::PlayerId;

/// Coarse classification of a [`BattleError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: unknown ids, bad tokens, bad target sets.
    Validation,
    /// Well-formed input that the current state does not allow.
    State,
    /// A referenced id is missing from the catalog. Indicates a configuration bug.
    DataIntegrity,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::State => "state",
            Self::DataIntegrity => "data_integrity",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown character '{0}'")]
    UnknownCharacter(String),

    #[error("unknown skill '{0}'")]
    UnknownSkill(String),

    #[error("invalid playstyle '{0}'")]
    InvalidStyle(String),

    #[error("expected {expected} skills, got {actual}")]
    WrongSkillCount { expected: usize, actual: usize },

    #[error("invalid move '{0}'")]
    InvalidMove(String),

    #[error("invalid targets for skill '{skill}'")]
    InvalidTargets { skill: String },

    #[error("invalid coin face '{0}'")]
    InvalidCoinFace(String),

    #[error("player {0} is dead")]
    PlayerDead(PlayerId),

    #[error("the boss does not throw moves")]
    BossCannotThrow,

    #[error("player {0} has already locked in a character")]
    AlreadyLockedIn(PlayerId),

    #[error("player {0} has not chosen a character")]
    NotLockedIn(PlayerId),

    #[error("the battle has not started")]
    NotStarted,

    #[error("the battle is over")]
    GameOver,

    #[error("skill '{0}' is not available to this player")]
    SkillUnavailable(String),

    #[error("skill '{skill}' is on cooldown for {remaining} more rounds")]
    OnCooldown { skill: String, remaining: u32 },

    #[error("skill '{skill}' may be used at most {limit} times per round")]
    UsageLimitReached { skill: String, limit: u32 },

    #[error("not enough wins: need {required}, have {available}")]
    InsufficientWins { required: u32, available: u32 },

    #[error("player {0} is controlled and cannot use skills")]
    Controlled(PlayerId),

    #[error("player {0} cannot attack this round")]
    Disarmed(PlayerId),

    #[error("skill '{0}' triggers automatically and cannot be used")]
    TriggeredOnly(String),

    #[error("no definition found for skill '{0}'")]
    MissingDefinition(String),

    #[error("session lock poisoned")]
    LockPoisoned,
}

impl BattleError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownPlayer(_)
            | Self::UnknownCharacter(_)
            | Self::UnknownSkill(_)
            | Self::InvalidStyle(_)
            | Self::WrongSkillCount { .. }
            | Self::InvalidMove(_)
            | Self::InvalidTargets { .. }
            | Self::InvalidCoinFace(_) => ErrorKind::Validation,
            Self::PlayerDead(_)
            | Self::BossCannotThrow
            | Self::AlreadyLockedIn(_)
            | Self::NotLockedIn(_)
            | Self::NotStarted
            | Self::GameOver
            | Self::SkillUnavailable(_)
            | Self::OnCooldown { .. }
            | Self::UsageLimitReached { .. }
            | Self::InsufficientWins { .. }
            | Self::Controlled(_)
            | Self::Disarmed(_)
            | Self::TriggeredOnly(_) => ErrorKind::State,
            Self::MissingDefinition(_) | Self::LockPoisoned => ErrorKind::DataIntegrity,
        }
    }

    /// Stable snake_case identifier, suitable for client-side message lookup.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownPlayer(_) => "unknown_player",
            Self::UnknownCharacter(_) => "unknown_character",
            Self::UnknownSkill(_) => "unknown_skill",
            Self::InvalidStyle(_) => "invalid_style",
            Self::WrongSkillCount { .. } => "wrong_skill_count",
            Self::InvalidMove(_) => "invalid_move",
            Self::InvalidTargets { .. } => "invalid_targets",
            Self::InvalidCoinFace(_) => "invalid_coin_face",
            Self::PlayerDead(_) => "player_dead",
            Self::BossCannotThrow => "boss_cannot_throw",
            Self::AlreadyLockedIn(_) => "already_locked_in",
            Self::NotLockedIn(_) => "not_locked_in",
            Self::NotStarted => "not_started",
            Self::GameOver => "game_over",
            Self::SkillUnavailable(_) => "skill_unavailable",
            Self::OnCooldown { .. } => "on_cooldown",
            Self::UsageLimitReached { .. } => "usage_limit_reached",
            Self::InsufficientWins { .. } => "insufficient_wins",
            Self::Controlled(_) => "controlled",
            Self::Disarmed(_) => "disarmed",
            Self::TriggeredOnly(_) => "triggered_only",
            Self::MissingDefinition(_) => "missing_definition",
            Self::LockPoisoned => "lock_poisoned",
        }
    }
}

pub type BattleResult<T> = Result<T, BattleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_variants() {
        assert_eq!(
            BattleError::InvalidMove("lizard".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BattleError::OnCooldown {
                skill: "slash".into(),
                remaining: 2
            }
            .kind(),
            ErrorKind::State
        );
        assert_eq!(
            BattleError::MissingDefinition("ghost_blade".into()).kind(),
            ErrorKind::DataIntegrity
        );
    }

    #[test]
    fn display_includes_context() {
        let err = BattleError::WrongSkillCount {
            expected: 5,
            actual: 3,
        };
        assert_eq!(err.to_string(), "expected 5 skills, got 3");
        assert_eq!(err.code(), "wrong_skill_count");
    }
}
