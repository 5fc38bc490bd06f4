//! Character passives, applied once when a player locks in.

use crate::model::{AutoCast, Buff, EffectData, GhostProfile, PlayerState};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Values that replace the base tier once proficiency is high enough.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedTier {
    pub damage_bonus: i32,
    pub heal_bonus: i32,
    pub win_probability_bonus: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Passive {
    Lucky {
        start_wins: u32,
        win_interval: u32,
        #[serde(default)]
        advanced: Option<AdvancedTier>,
    },
    Warrior {
        damage_bonus: i32,
        #[serde(default)]
        advanced: Option<AdvancedTier>,
    },
    Medic {
        regen: i32,
        #[serde(default)]
        duration_bonus: i32,
        #[serde(default)]
        taotao_bonus: i32,
        #[serde(default)]
        taotao_skill: Option<String>,
        #[serde(default)]
        ignore_disable: bool,
        #[serde(default)]
        advanced: Option<AdvancedTier>,
    },
    Paladin {
        buff_name: String,
        effects: EffectData,
    },
    Ghost {
        ghost_hits: u32,
        revive_time: u32,
        revive_hp: i32,
        #[serde(default)]
        revive_skill: Option<String>,
    },
    Recorder {
        every: u32,
        skill: String,
    },
}

pub const WARRIOR_BUFF: &str = "战士被动";
pub const MEDIC_BUFF: &str = "青囊秘要";
pub const MEDIC_ADVANCED_BUFF: &str = "医师进阶";

impl Passive {
    pub fn label(&self) -> &'static str {
        match self {
            Passive::Lucky { .. } => "lucky",
            Passive::Warrior { .. } => "warrior",
            Passive::Medic { .. } => "medic",
            Passive::Paladin { .. } => "paladin",
            Passive::Ghost { .. } => "ghost",
            Passive::Recorder { .. } => "recorder",
        }
    }

    /// Skill ids the passive refers to, for catalog validation.
    pub fn referenced_skills(&self) -> Vec<&str> {
        match self {
            Passive::Medic {
                taotao_skill: Some(skill),
                ..
            } => vec![skill.as_str()],
            Passive::Ghost {
                revive_skill: Some(skill),
                ..
            } => vec![skill.as_str()],
            Passive::Recorder { skill, .. } => vec![skill.as_str()],
            _ => Vec::new(),
        }
    }

    /// Applies the passive to a freshly locked-in player. `advanced` selects
    /// the upgraded tier where one exists.
    pub fn apply(&self, player: &mut PlayerState, advanced: bool) {
        let tier = |t: &Option<AdvancedTier>| if advanced { t.clone() } else { None };
        match self {
            Passive::Lucky {
                start_wins,
                win_interval,
                advanced: adv,
            } => {
                player.wins += start_wins;
                player.flags.win_interval = (*win_interval > 0).then_some(*win_interval);
                if let Some(tier) = tier(adv) {
                    player.flags.win_probability_bonus = tier.win_probability_bonus;
                }
            }
            Passive::Warrior {
                damage_bonus,
                advanced: adv,
            } => {
                let bonus = tier(adv).map_or(*damage_bonus, |t| t.damage_bonus);
                player.buffs.push(Buff::permanent(
                    WARRIOR_BUFF,
                    EffectData {
                        damage_bonus: bonus,
                        ..EffectData::default()
                    },
                ));
            }
            Passive::Medic {
                regen,
                duration_bonus,
                taotao_bonus,
                taotao_skill,
                ignore_disable,
                advanced: adv,
            } => {
                player.buffs.push(Buff::permanent(
                    MEDIC_BUFF,
                    EffectData {
                        regen: *regen,
                        duration_bonus: *duration_bonus,
                        ..EffectData::default()
                    },
                ));
                player.flags.taotao_bonus = *taotao_bonus;
                player.flags.taotao_skill = taotao_skill.clone();
                player.flags.ignore_disable = *ignore_disable;
                if let Some(tier) = tier(adv) {
                    player.buffs.push(Buff::permanent(
                        MEDIC_ADVANCED_BUFF,
                        EffectData {
                            heal_bonus: tier.heal_bonus,
                            ..EffectData::default()
                        },
                    ));
                }
            }
            Passive::Paladin { buff_name, effects } => {
                player
                    .buffs
                    .push(Buff::permanent(buff_name.clone(), effects.clone()));
            }
            Passive::Ghost {
                ghost_hits,
                revive_time,
                revive_hp,
                revive_skill,
            } => {
                player.flags.ghost = Some(GhostProfile {
                    hits: *ghost_hits,
                    revive_time: *revive_time,
                    revive_hp: *revive_hp,
                    revive_skill: revive_skill.clone(),
                });
            }
            Passive::Recorder { every, skill } => {
                player.flags.auto_cast = (*every > 0).then(|| AutoCast {
                    every: *every,
                    skill: skill.clone(),
                });
            }
        }
        debug!(
            player = %player.id,
            passive = self.label(),
            advanced,
            "applied passive"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerId;

    fn make_player() -> PlayerState {
        PlayerState::new(PlayerId::new("p1"))
    }

    #[test]
    fn warrior_upgrades_at_advanced_tier() {
        let passive = Passive::Warrior {
            damage_bonus: 1,
            advanced: Some(AdvancedTier {
                damage_bonus: 2,
                ..AdvancedTier::default()
            }),
        };
        let mut base = make_player();
        passive.apply(&mut base, false);
        assert_eq!(base.effect_total(|e| e.damage_bonus), 1);

        let mut veteran = make_player();
        passive.apply(&mut veteran, true);
        assert_eq!(veteran.effect_total(|e| e.damage_bonus), 2);
    }

    #[test]
    fn lucky_grants_start_wins_and_interval() {
        let passive = Passive::Lucky {
            start_wins: 1,
            win_interval: 5,
            advanced: Some(AdvancedTier {
                win_probability_bonus: 10,
                ..AdvancedTier::default()
            }),
        };
        let mut player = make_player();
        passive.apply(&mut player, false);
        assert_eq!(player.wins, 1);
        assert_eq!(player.flags.win_interval, Some(5));
        assert_eq!(player.flags.win_probability_bonus, 0);
    }

    #[test]
    fn medic_sets_flags_and_advanced_buff() {
        let raw = r#"{"kind": "medic", "regen": 1, "taotao_bonus": 1,
            "taotao_skill": "eat_peach", "ignore_disable": true,
            "advanced": {"heal_bonus": 1}}"#;
        let passive: Passive = serde_json::from_str(raw).unwrap();
        let mut player = make_player();
        passive.apply(&mut player, true);
        assert!(player.flags.ignore_disable);
        assert_eq!(player.flags.taotao_skill.as_deref(), Some("eat_peach"));
        assert_eq!(player.effect_total(|e| e.heal_bonus), 1);
        assert_eq!(player.effect_total(|e| e.regen), 1);
        assert_eq!(passive.referenced_skills(), vec!["eat_peach"]);
    }

    #[test]
    fn ghost_records_profile_without_entering_ghost_mode() {
        let passive = Passive::Ghost {
            ghost_hits: 2,
            revive_time: 2,
            revive_hp: 5,
            revive_skill: Some("vengeance".into()),
        };
        let mut player = make_player();
        passive.apply(&mut player, false);
        assert!(!player.flags.ghost_mode);
        assert_eq!(player.flags.ghost.as_ref().map(|g| g.hits), Some(2));
    }
}
