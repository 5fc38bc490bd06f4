use crate::model::{Mode, Move, PlayerId};
use serde_json::json;

/// Pipe-delimited, player-facing record of a battle.
#[derive(Clone, Debug, Default)]
pub struct BattleLog {
    mode: Mode,
    lines: Vec<String>,
}

impl BattleLog {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            lines: Vec::new(),
        }
    }

    pub fn log_round(&mut self, round: u32) {
        self.lines.push(format!("|round|{round}"));
    }

    pub fn log_select(&mut self, player: &PlayerId, character: &str, style: &str) {
        self.lines
            .push(format!("|select|{player}|{character}|{style}"));
    }

    pub fn log_move(&mut self, player: &PlayerId, choice: Move) {
        self.lines.push(format!("|move|{player}|{choice}"));
    }

    pub fn log_round_win(&mut self, player: &PlayerId, wins: u32) {
        self.lines.push(format!("|win|{player}|{wins}"));
    }

    pub fn log_skill(&mut self, caster: &PlayerId, skill: &str, targets: &[PlayerId]) {
        let targets = targets
            .iter()
            .map(PlayerId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.lines.push(format!("|skill|{caster}|{skill}|{targets}"));
    }

    pub fn log_damage(&mut self, target: &PlayerId, amount: i32, hp: i32, max_hp: i32) {
        self.lines
            .push(format!("|-damage|{target}|{amount}|{hp}/{max_hp}"));
    }

    pub fn log_heal(&mut self, target: &PlayerId, amount: i32, hp: i32, max_hp: i32) {
        self.lines
            .push(format!("|-heal|{target}|{amount}|{hp}/{max_hp}"));
    }

    pub fn log_buff(&mut self, target: &PlayerId, name: &str, duration: i32) {
        self.lines.push(format!("|-buff|{target}|{name}|{duration}"));
    }

    pub fn log_debuff(&mut self, target: &PlayerId, name: &str, duration: i32) {
        self.lines
            .push(format!("|-debuff|{target}|{name}|{duration}"));
    }

    pub fn log_expire(&mut self, target: &PlayerId, name: &str) {
        self.lines.push(format!("|-end|{target}|{name}"));
    }

    /// Generic status change: evade, immune, ghost, shield and so on.
    pub fn log_status(&mut self, target: &PlayerId, status: &str) {
        self.lines.push(format!("|-status|{target}|{status}"));
    }

    pub fn log_faint(&mut self, target: &PlayerId) {
        self.lines.push(format!("|faint|{target}"));
    }

    pub fn log_revive(&mut self, target: &PlayerId, hp: i32) {
        self.lines.push(format!("|revive|{target}|{hp}"));
    }

    pub fn log_event(&mut self, event: &str) {
        self.lines.push(format!("|event|{event}"));
    }

    pub fn log_message(&mut self, message: &str) {
        self.lines.push(format!("|-message|{message}"));
    }

    pub fn log_game_over(&mut self, winner: Option<&PlayerId>) {
        match winner {
            Some(winner) => self.lines.push(format!("|gameover|{winner}")),
            None => self.lines.push("|tie|".to_string()),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines appended at or after `start`.
    pub fn since(&self, start: usize) -> &[String] {
        self.lines.get(start..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "mode": self.mode,
            "log": self.lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_lines_in_order() {
        let mut log = BattleLog::new(Mode::Boss);
        let p1 = PlayerId::new("p1");
        log.log_round(1);
        log.log_move(&p1, Move::Rock);
        log.log_damage(&p1, 3, 12, 15);
        assert_eq!(
            log.lines(),
            ["|round|1", "|move|p1|rock", "|-damage|p1|3|12/15"]
        );
        assert_eq!(log.since(2), ["|-damage|p1|3|12/15"]);
        assert!(log.since(9).is_empty());
    }

    #[test]
    fn json_export_carries_mode() {
        let mut log = BattleLog::new(Mode::Infinite);
        log.log_game_over(None);
        let value = log.to_json();
        assert_eq!(value["mode"], "infinite");
        assert_eq!(value["log"][0], "|tie|");
    }
}
