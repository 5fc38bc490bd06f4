//! Immutable character and skill definitions.
//!
//! The built-in catalog is embedded from `data/catalog.json` and parsed once on
//! first use. Custom catalogs can be loaded from JSON with [`Catalog::from_path`].
//! Nothing in a [`Catalog`] changes after construction; engines share it through
//! an [`Arc`].

mod boss;

pub use boss::{is_boss_skill, BossSkill, BOSS_SKILLS, BOSS_SKILL_IDS};

use crate::passive::Passive;
use anyhow::{bail, Context};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Named skill slots a character may carry.
pub const MAX_CHARACTER_SKILLS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRule {
    #[serde(rename = "self")]
    SelfOnly,
    SingleEnemy,
    SingleAny,
    TwoEnemies,
    TwoAny,
    AllOthers,
    AnySkill,
}

fn permanent() -> i32 {
    crate::model::Buff::PERMANENT
}

/// What a skill does when it resolves. Every variant carries only the
/// numbers it needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    DirectDamage {
        damage: i32,
    },
    Heal {
        heal: i32,
    },
    Control {
        control_turns: i32,
        #[serde(default)]
        self_damage: i32,
        #[serde(default)]
        delayed_damage: i32,
    },
    Buff {
        duration: i32,
        #[serde(default)]
        damage_buff: i32,
        #[serde(default)]
        damage_multiplier_pct: u32,
        #[serde(default)]
        self_damage: i32,
        #[serde(default)]
        ignore_defense: bool,
        #[serde(default)]
        stealth: u32,
    },
    Defense {
        #[serde(default)]
        evasion: u32,
        #[serde(default)]
        damage_reduction: i32,
        #[serde(default = "permanent")]
        duration: i32,
        #[serde(default)]
        max_hp_cost: i32,
        #[serde(default)]
        invincible: u32,
    },
    CoinDamage {
        heads_self_damage: i32,
        heads_enemy_damage: i32,
        tails_self_damage: i32,
        tails_enemy_damage: i32,
    },
    Duel {
        duel_rounds: u32,
    },
    ChargeDamage {
        charge_time: u32,
        damage: i32,
    },
    Regen {
        heal: i32,
        duration: i32,
    },
    DamageWithDelayedRegen {
        damage: i32,
        regen: i32,
        duration: i32,
    },
    /// Fires from death handling instead of being cast.
    Unyielding {
        shield: i32,
        shield_duration: i32,
    },
    Fortify {
        max_hp_cost: i32,
        no_attack_rounds: i32,
    },
    Replicate {
        duration: u32,
        max_skills: usize,
    },
    Fortune {
        wins: u32,
    },
}

impl EffectKind {
    pub fn is_control(&self) -> bool {
        matches!(self, EffectKind::Control { .. })
    }

    /// Skills that hurt someone other than the caster.
    pub fn deals_damage(&self) -> bool {
        matches!(
            self,
            EffectKind::DirectDamage { .. }
                | EffectKind::CoinDamage { .. }
                | EffectKind::ChargeDamage { .. }
                | EffectKind::DamageWithDelayedRegen { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            EffectKind::DirectDamage { .. } => "direct_damage",
            EffectKind::Heal { .. } => "heal",
            EffectKind::Control { .. } => "control",
            EffectKind::Buff { .. } => "buff",
            EffectKind::Defense { .. } => "defense",
            EffectKind::CoinDamage { .. } => "coin_damage",
            EffectKind::Duel { .. } => "duel",
            EffectKind::ChargeDamage { .. } => "charge_damage",
            EffectKind::Regen { .. } => "regen",
            EffectKind::DamageWithDelayedRegen { .. } => "damage_with_delayed_regen",
            EffectKind::Unyielding { .. } => "unyielding",
            EffectKind::Fortify { .. } => "fortify",
            EffectKind::Replicate { .. } => "replicate",
            EffectKind::Fortune { .. } => "fortune",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cooldown: u32,
    pub target: TargetRule,
    pub effect: EffectKind,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub ignore_defense: bool,
    /// Granted by the engine itself (infinite-mode bonus) rather than picked.
    #[serde(default)]
    pub infinite_only: bool,
    /// Character skill that a passive unlocks later instead of at lock-in.
    #[serde(default)]
    pub locked: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub id: String,
    pub name: String,
    #[serde(default = "default_max_hp")]
    pub max_hp: i32,
    #[serde(default)]
    pub breakthrough_hp: Option<i32>,
    #[serde(default)]
    pub skills: Vec<SkillDefinition>,
    #[serde(default)]
    pub passive: Option<Passive>,
}

fn default_max_hp() -> i32 {
    15
}

impl CharacterDefinition {
    /// HP the character locks in with, before mode overrides.
    pub fn starting_hp(&self) -> i32 {
        self.breakthrough_hp.unwrap_or(self.max_hp)
    }

    pub fn skill(&self, id: &str) -> Option<&SkillDefinition> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    /// Skill ids granted at lock-in.
    pub fn granted_skill_ids(&self) -> impl Iterator<Item = &str> {
        self.skills
            .iter()
            .filter(|skill| !skill.locked)
            .map(|skill| skill.id.as_str())
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    characters: Vec<CharacterDefinition>,
    skills: Vec<SkillDefinition>,
}

#[derive(Debug)]
pub struct Catalog {
    characters: Vec<CharacterDefinition>,
    character_index: HashMap<String, usize>,
    skills: Vec<SkillDefinition>,
    skill_index: HashMap<String, usize>,
    boss_skills: HashMap<String, SkillDefinition>,
}

static BUILTIN: Lazy<Arc<Catalog>> = Lazy::new(|| {
    let json = include_str!("../../data/catalog.json");
    Arc::new(Catalog::from_json_str(json).expect("Failed to parse data/catalog.json"))
});

impl Catalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Arc<Catalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Catalog> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog at {}", path.display()))?;
        Catalog::from_json_str(&raw)
            .with_context(|| format!("Invalid catalog in {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Catalog> {
        let file: CatalogFile = serde_json::from_str(raw).context("Failed to parse catalog JSON")?;
        Catalog::new(file.characters, file.skills)
    }

    pub fn new(
        characters: Vec<CharacterDefinition>,
        skills: Vec<SkillDefinition>,
    ) -> anyhow::Result<Catalog> {
        let mut skill_index = HashMap::new();
        for (idx, skill) in skills.iter().enumerate() {
            if is_boss_skill(&skill.id) {
                bail!("skill id '{}' is reserved for the boss", skill.id);
            }
            if skill_index.insert(skill.id.clone(), idx).is_some() {
                bail!("duplicate skill id '{}'", skill.id);
            }
        }

        let mut character_index = HashMap::new();
        for (idx, character) in characters.iter().enumerate() {
            if character_index.insert(character.id.clone(), idx).is_some() {
                bail!("duplicate character id '{}'", character.id);
            }
            if character.skills.len() > MAX_CHARACTER_SKILLS {
                bail!(
                    "character '{}' has {} skills (max {})",
                    character.id,
                    character.skills.len(),
                    MAX_CHARACTER_SKILLS
                );
            }
            if character.max_hp <= 0 || character.breakthrough_hp.is_some_and(|hp| hp <= 0) {
                bail!("character '{}' must have positive HP", character.id);
            }
            for skill in &character.skills {
                if skill_index.contains_key(&skill.id) || is_boss_skill(&skill.id) {
                    bail!(
                        "character '{}' skill '{}' shadows a shared skill",
                        character.id,
                        skill.id
                    );
                }
            }
            if let Some(passive) = &character.passive {
                for referenced in passive.referenced_skills() {
                    if character.skill(referenced).is_none() && !skill_index.contains_key(referenced)
                    {
                        bail!(
                            "character '{}' passive references unknown skill '{}'",
                            character.id,
                            referenced
                        );
                    }
                }
            }
        }

        let boss_skills = BOSS_SKILLS
            .entries()
            .map(|(id, skill)| (id.to_string(), skill.definition(id)))
            .collect();

        Ok(Catalog {
            characters,
            character_index,
            skills,
            skill_index,
            boss_skills,
        })
    }

    pub fn character(&self, id: &str) -> Option<&CharacterDefinition> {
        self.character_index.get(id).map(|&idx| &self.characters[idx])
    }

    pub fn characters(&self) -> &[CharacterDefinition] {
        &self.characters
    }

    /// Shared (non-character) skill lookup.
    pub fn skill(&self, id: &str) -> Option<&SkillDefinition> {
        self.skill_index.get(id).map(|&idx| &self.skills[idx])
    }

    pub fn boss_skill(&self, id: &str) -> Option<&SkillDefinition> {
        self.boss_skills.get(id)
    }

    /// Every shared skill id, in catalog order.
    pub fn all_skill_ids(&self) -> Vec<&str> {
        self.skills.iter().map(|skill| skill.id.as_str()).collect()
    }

    /// The pool every standard-mode player starts with.
    pub fn common_pool(&self) -> Vec<String> {
        self.skills
            .iter()
            .filter(|skill| !skill.infinite_only)
            .map(|skill| skill.id.clone())
            .collect()
    }

    pub fn infinite_bonus_skills(&self) -> Vec<String> {
        self.skills
            .iter()
            .filter(|skill| skill.infinite_only)
            .map(|skill| skill.id.clone())
            .collect()
    }

    /// Resolves a skill the way the engine does: shared skills first, then
    /// the given character's own skills, then boss skills.
    pub fn resolve_skill(&self, id: &str, character: Option<&str>) -> Option<&SkillDefinition> {
        self.skill(id)
            .or_else(|| {
                character
                    .and_then(|c| self.character(c))
                    .and_then(|c| c.skill(id))
            })
            .or_else(|| self.boss_skill(id))
    }

    /// Whether the id names any skill at all: shared, boss, or character-owned.
    pub fn knows_skill(&self, id: &str) -> bool {
        self.skill(id).is_some()
            || is_boss_skill(id)
            || self.characters.iter().any(|c| c.skill(id).is_some())
    }

    /// Looks a skill up in any character's own list.
    pub fn character_skill(&self, character: &str, id: &str) -> Option<&SkillDefinition> {
        self.character(character).and_then(|c| c.skill(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin();
        assert!(catalog.character("warrior").is_some());
        assert!(catalog.character("ghost").is_some());
        assert!(catalog.skill("strike").is_some());
        assert!(catalog.character("nobody").is_none());
        assert!(catalog.skill("nothing").is_none());
    }

    #[test]
    fn boss_skills_resolve_but_stay_out_of_the_pool() {
        let catalog = Catalog::builtin();
        for id in BOSS_SKILL_IDS {
            assert!(catalog.boss_skill(id).is_some(), "{id} missing");
            assert!(!catalog.common_pool().iter().any(|s| s == id));
        }
    }

    #[test]
    fn infinite_bonus_is_not_in_common_pool() {
        let catalog = Catalog::builtin();
        let bonus = catalog.infinite_bonus_skills();
        assert!(!bonus.is_empty());
        for id in &bonus {
            assert!(!catalog.common_pool().contains(id));
        }
    }

    #[test]
    fn character_skills_resolve_through_their_owner() {
        let catalog = Catalog::builtin();
        assert!(catalog.resolve_skill("unyielding", Some("ghost")).is_some());
        assert!(catalog.resolve_skill("unyielding", Some("warrior")).is_none());
        assert!(catalog.resolve_skill("sweep", None).is_some());
    }

    #[test]
    fn rejects_duplicate_skill_ids() {
        let raw = r#"{
            "characters": [],
            "skills": [
                {"id": "a", "name": "A", "target": "self", "effect": {"type": "heal", "heal": 1}},
                {"id": "a", "name": "A2", "target": "self", "effect": {"type": "heal", "heal": 2}}
            ]
        }"#;
        let err = Catalog::from_json_str(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate skill id"));
    }

    #[test]
    fn rejects_boss_skill_shadowing() {
        let raw = r#"{
            "characters": [],
            "skills": [
                {"id": "sweep", "name": "Sweep", "target": "self", "effect": {"type": "heal", "heal": 1}}
            ]
        }"#;
        assert!(Catalog::from_json_str(raw).is_err());
    }

    #[test]
    fn defense_duration_defaults_to_permanent() {
        let raw = r#"{"id": "wall", "name": "Wall", "target": "self",
            "effect": {"type": "defense", "damage_reduction": 1}}"#;
        let skill: SkillDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(
            skill.effect,
            EffectKind::Defense {
                evasion: 0,
                damage_reduction: 1,
                duration: -1,
                max_hp_cost: 0,
                invincible: 0,
            }
        );
    }
}
