use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Session-scoped player identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Scissors,
    Paper,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Scissors, Move::Paper];

    /// The move this one defeats.
    pub const fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Scissors => Move::Paper,
            Move::Paper => Move::Rock,
        }
    }

    /// The move that defeats this one.
    pub const fn beaten_by(self) -> Move {
        match self {
            Move::Rock => Move::Paper,
            Move::Scissors => Move::Rock,
            Move::Paper => Move::Scissors,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Move::Rock => 0,
            Move::Scissors => 1,
            Move::Paper => 2,
        }
    }
}

impl FromStr for Move {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rock" | "石头" => Ok(Move::Rock),
            "scissors" | "剪刀" => Ok(Move::Scissors),
            "paper" | "布" => Ok(Move::Paper),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Move::Rock => "rock",
            Move::Scissors => "scissors",
            Move::Paper => "paper",
        };
        f.write_str(token)
    }
}

/// Permanent modifier chosen at lock-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStyle {
    Damage,
    Control,
    Heal,
    Buff,
    Defense,
}

impl PlayStyle {
    pub const ALL: [PlayStyle; 5] = [
        PlayStyle::Damage,
        PlayStyle::Control,
        PlayStyle::Heal,
        PlayStyle::Buff,
        PlayStyle::Defense,
    ];

    /// Name of the permanent buff the style grants.
    pub const fn buff_name(self) -> &'static str {
        match self {
            PlayStyle::Damage => "伤害流",
            PlayStyle::Control => "控制流",
            PlayStyle::Heal => "回复流",
            PlayStyle::Buff => "增益流",
            PlayStyle::Defense => "防御流",
        }
    }

    pub fn style_buff(self) -> Buff {
        let mut effects = EffectData::default();
        match self {
            PlayStyle::Damage => effects.damage_bonus = 1,
            PlayStyle::Control => effects.control_bonus = 1,
            PlayStyle::Heal => effects.heal_bonus = 1,
            PlayStyle::Buff => effects.buff_multiplier_pct = 110,
            PlayStyle::Defense => effects.damage_reduction = 1,
        }
        Buff::permanent(self.buff_name(), effects)
    }
}

impl FromStr for PlayStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        PlayStyle::ALL
            .into_iter()
            .find(|style| {
                s == style.buff_name() || s.eq_ignore_ascii_case(&style.to_string())
            })
            .ok_or(())
    }
}

impl fmt::Display for PlayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            PlayStyle::Damage => "damage",
            PlayStyle::Control => "control",
            PlayStyle::Heal => "heal",
            PlayStyle::Buff => "buff",
            PlayStyle::Defense => "defense",
        };
        f.write_str(token)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Boss,
    Infinite,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Mode::Standard),
            "boss" => Ok(Mode::Boss),
            "infinite" => Ok(Mode::Infinite),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinFace {
    Heads,
    Tails,
}

impl FromStr for CoinFace {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heads" | "正面" => Ok(CoinFace::Heads),
            "tails" | "反面" => Ok(CoinFace::Tails),
            _ => Err(()),
        }
    }
}

/// Numeric fields a buff or debuff contributes. Multipliers are percentages,
/// with 0 meaning "no multiplier".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectData {
    pub damage_bonus: i32,
    pub damage_reduction: i32,
    pub control_bonus: i32,
    pub heal_bonus: i32,
    pub heal_multiplier_pct: u32,
    pub buff_multiplier_pct: u32,
    pub damage_multiplier_pct: u32,
    pub regen: i32,
    pub duration_bonus: i32,
    pub delayed_damage: i32,
    pub ignore_defense: bool,
    pub controlled: bool,
    pub no_attack: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    pub name: String,
    /// Remaining rounds; [`Buff::PERMANENT`] never decays.
    pub duration: i32,
    pub effects: EffectData,
    #[serde(default)]
    pub source: Option<PlayerId>,
}

impl Buff {
    pub const PERMANENT: i32 = -1;

    pub fn new(name: impl Into<String>, duration: i32, effects: EffectData) -> Self {
        Self {
            name: name.into(),
            duration,
            effects,
            source: None,
        }
    }

    pub fn permanent(name: impl Into<String>, effects: EffectData) -> Self {
        Self::new(name, Self::PERMANENT, effects)
    }

    pub fn with_source(mut self, source: PlayerId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.duration < 0
    }
}

/// Data a ghost character carries into ghost-mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostProfile {
    pub hits: u32,
    pub revive_time: u32,
    pub revive_hp: i32,
    pub revive_skill: Option<String>,
}

/// A skill a passive queues on its own every `every` rounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCast {
    pub every: u32,
    pub skill: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub ghost_mode: bool,
    pub ghost_hits: u32,
    pub ghost_timer: u32,
    /// Rounds until an infinite-mode revival.
    pub revive_timer: u32,
    pub invincible: u32,
    pub stealth: u32,
    pub win_interval: Option<u32>,
    pub win_probability_bonus: u32,
    pub taotao_bonus: i32,
    pub taotao_skill: Option<String>,
    pub ignore_disable: bool,
    pub ghost: Option<GhostProfile>,
    pub auto_cast: Option<AutoCast>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCharge {
    pub skill: String,
    pub remaining: u32,
    pub damage: i32,
    /// Explicit targets; empty means every other live player at release time.
    pub targets: Vec<PlayerId>,
}

/// A skill copied from another character for a limited time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedSkill {
    pub skill: String,
    pub from_character: String,
    pub remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub username: String,
    pub hp: i32,
    pub max_hp: i32,
    pub wins: u32,
    pub character: Option<String>,
    pub style: Option<PlayStyle>,
    pub locked_in: bool,
    pub available_skills: Vec<String>,
    pub cooldowns: BTreeMap<String, u32>,
    pub buffs: Vec<Buff>,
    pub debuffs: Vec<Buff>,
    pub flags: StatusFlags,
    pub proficiency: BTreeMap<String, u32>,
    pub alive: bool,
    pub revive_count: u32,
    pub puppet_master: Option<PlayerId>,
    pub evasion: u32,
    pub charges: Vec<PendingCharge>,
    pub borrowed: Vec<BorrowedSkill>,
}

impl PlayerState {
    pub fn new(id: PlayerId) -> Self {
        let username = format!("Player {id}");
        Self {
            id,
            username,
            hp: 0,
            max_hp: 0,
            wins: 0,
            character: None,
            style: None,
            locked_in: false,
            available_skills: Vec::new(),
            cooldowns: BTreeMap::new(),
            buffs: Vec::new(),
            debuffs: Vec::new(),
            flags: StatusFlags::default(),
            proficiency: BTreeMap::new(),
            alive: true,
            revive_count: 0,
            puppet_master: None,
            evasion: 0,
            charges: Vec::new(),
            borrowed: Vec::new(),
        }
    }

    /// Sum of a numeric effect over buffs, minus the same over debuffs.
    pub fn effect_total(&self, field: impl Fn(&EffectData) -> i32) -> i32 {
        let gained: i32 = self.buffs.iter().map(|b| field(&b.effects)).sum();
        let lost: i32 = self.debuffs.iter().map(|b| field(&b.effects)).sum();
        gained - lost
    }

    /// Product of percentage multipliers over buffs, in percent (100 = neutral).
    pub fn multiplier_pct(&self, field: impl Fn(&EffectData) -> u32) -> u64 {
        self.buffs
            .iter()
            .map(|b| field(&b.effects))
            .filter(|pct| *pct > 0)
            .fold(100u64, |acc, pct| acc * u64::from(pct) / 100)
    }

    pub fn has_flag(&self, field: impl Fn(&EffectData) -> bool) -> bool {
        self.buffs
            .iter()
            .chain(self.debuffs.iter())
            .any(|b| field(&b.effects))
    }

    pub fn is_controlled(&self) -> bool {
        self.debuffs.iter().any(|b| b.effects.controlled)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.available_skills.iter().any(|s| s == skill)
            || self.borrowed.iter().any(|b| b.skill == skill)
    }

    pub fn cooldown(&self, skill: &str) -> u32 {
        self.cooldowns.get(skill).copied().unwrap_or(0)
    }

    /// Still in the game for termination purposes.
    pub fn is_contender(&self) -> bool {
        (self.alive || self.flags.revive_timer > 0) && self.puppet_master.is_none()
    }

    pub fn buff_names(&self) -> Vec<String> {
        self.buffs
            .iter()
            .chain(self.debuffs.iter())
            .map(|b| b.name.clone())
            .collect()
    }

    pub(crate) fn grant_skill(&mut self, skill: &str) {
        if !self.available_skills.iter().any(|s| s == skill) {
            self.available_skills.push(skill.to_string());
        }
    }
}

/// Raw parameters a client attaches to a skill invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillParams {
    pub use_win: bool,
    pub coin_choice: Option<String>,
}

impl SkillParams {
    pub fn consume_win(coin_choice: impl Into<String>) -> Self {
        Self {
            use_win: true,
            coin_choice: Some(coin_choice.into()),
        }
    }
}

/// A validated skill invocation waiting for the next `process_round`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingSkill {
    pub caster: PlayerId,
    pub skill: String,
    pub targets: Vec<PlayerId>,
    pub coin: Option<CoinFace>,
    pub consumed_win: bool,
}

/// Two-player exclusive sub-state opened by a duel skill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuelState {
    pub challenger: PlayerId,
    pub opponent: PlayerId,
    pub skill: String,
    pub rounds_remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecialState {
    Duel(DuelState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_parse_from_either_token() {
        assert_eq!("rock".parse::<Move>(), Ok(Move::Rock));
        assert_eq!("剪刀".parse::<Move>(), Ok(Move::Scissors));
        assert!("lizard".parse::<Move>().is_err());
        assert_eq!(Move::Paper.beats(), Move::Rock);
        assert_eq!(Move::Paper.beaten_by(), Move::Scissors);
    }

    #[test]
    fn styles_parse_and_grant_buffs() {
        assert_eq!("增益流".parse::<PlayStyle>(), Ok(PlayStyle::Buff));
        assert_eq!("Defense".parse::<PlayStyle>(), Ok(PlayStyle::Defense));
        assert!("berserk".parse::<PlayStyle>().is_err());
        let buff = PlayStyle::Damage.style_buff();
        assert!(buff.is_permanent());
        assert_eq!(buff.effects.damage_bonus, 1);
    }

    #[test]
    fn coin_face_rejects_anything_else() {
        assert_eq!("heads".parse::<CoinFace>(), Ok(CoinFace::Heads));
        assert_eq!("反面".parse::<CoinFace>(), Ok(CoinFace::Tails));
        assert!("Heads ".parse::<CoinFace>().is_err());
        assert!("edge".parse::<CoinFace>().is_err());
    }

    #[test]
    fn effect_totals_subtract_debuffs() {
        let mut player = PlayerState::new(PlayerId::new("p1"));
        player.buffs.push(PlayStyle::Damage.style_buff());
        player.buffs.push(Buff::new(
            "rage",
            2,
            EffectData {
                damage_bonus: 2,
                ..EffectData::default()
            },
        ));
        player.debuffs.push(Buff::new(
            "weak",
            1,
            EffectData {
                damage_bonus: 1,
                ..EffectData::default()
            },
        ));
        assert_eq!(player.effect_total(|e| e.damage_bonus), 2);
        assert_eq!(player.multiplier_pct(|e| e.heal_multiplier_pct), 100);
    }
}
