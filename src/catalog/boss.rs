//! Fixed boss-only skill table.

use super::{EffectKind, SkillDefinition, TargetRule};
use phf::phf_map;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BossSkill {
    pub name: &'static str,
    pub cooldown: u32,
    pub target: TargetRule,
    pub effect: EffectKind,
}

impl BossSkill {
    pub fn definition(&self, id: &str) -> SkillDefinition {
        SkillDefinition {
            id: id.to_string(),
            name: self.name.to_string(),
            cooldown: self.cooldown,
            target: self.target,
            effect: self.effect.clone(),
            usage_limit: None,
            ignore_defense: false,
            infinite_only: false,
            locked: false,
        }
    }
}

/// Grant order for a promoted boss.
pub const BOSS_SKILL_IDS: [&str; 5] = [
    "sweep",
    "vital_lock",
    "earthshaker",
    "bend_and_stretch",
    "replicate",
];

pub static BOSS_SKILLS: phf::Map<&'static str, BossSkill> = phf_map! {
    "sweep" => BossSkill {
        name: "横扫",
        cooldown: 1,
        target: TargetRule::TwoEnemies,
        effect: EffectKind::DirectDamage { damage: 3 },
    },
    "vital_lock" => BossSkill {
        name: "要害锁定",
        cooldown: 3,
        target: TargetRule::SelfOnly,
        effect: EffectKind::Buff {
            duration: 3,
            damage_buff: 0,
            damage_multiplier_pct: 0,
            self_damage: 0,
            ignore_defense: true,
            stealth: 0,
        },
    },
    "earthshaker" => BossSkill {
        name: "震天撼地",
        cooldown: 1,
        target: TargetRule::AllOthers,
        effect: EffectKind::Control {
            control_turns: 1,
            self_damage: 0,
            delayed_damage: 0,
        },
    },
    "bend_and_stretch" => BossSkill {
        name: "能屈能伸",
        cooldown: 4,
        target: TargetRule::SelfOnly,
        effect: EffectKind::Fortify {
            max_hp_cost: 10,
            no_attack_rounds: 1,
        },
    },
    "replicate" => BossSkill {
        name: "复刻",
        cooldown: 3,
        target: TargetRule::AnySkill,
        effect: EffectKind::Replicate {
            duration: 3,
            max_skills: 2,
        },
    },
};

pub fn is_boss_skill(id: &str) -> bool {
    BOSS_SKILLS.contains_key(id)
}
