//! Target-set validation for skill invocations.
//!
//! Enemy rules never select the caster, dead players, or stealthed players.
//! While a duel is active the two duelists may only target each other and
//! everyone else may not target them.

use crate::catalog::TargetRule;
use crate::model::{DuelState, PlayerId, PlayerState};
use std::collections::BTreeSet;

fn duel_allows(caster: &PlayerId, target: &PlayerId, duel: Option<&DuelState>) -> bool {
    let Some(duel) = duel else {
        return true;
    };
    let in_duel = |id: &PlayerId| *id == duel.challenger || *id == duel.opponent;
    if in_duel(caster) {
        in_duel(target) && target != caster
    } else {
        !in_duel(target)
    }
}

fn is_enemy_target(caster: &PlayerId, target: &PlayerState, duel: Option<&DuelState>) -> bool {
    target.alive
        && target.id != *caster
        && target.flags.stealth == 0
        && duel_allows(caster, &target.id, duel)
}

fn is_any_target(caster: &PlayerId, target: &PlayerState, duel: Option<&DuelState>) -> bool {
    if target.id == *caster {
        target.alive
    } else {
        is_enemy_target(caster, target, duel)
    }
}

/// Players the caster may currently hit with an enemy rule, in seat order.
pub fn eligible_enemies(
    caster: &PlayerId,
    players: &[PlayerState],
    duel: Option<&DuelState>,
) -> Vec<PlayerId> {
    players
        .iter()
        .filter(|p| is_enemy_target(caster, p, duel))
        .map(|p| p.id.clone())
        .collect()
}

/// Players the caster may pick with an "any" rule, self included.
pub fn eligible_any(
    caster: &PlayerId,
    players: &[PlayerState],
    duel: Option<&DuelState>,
) -> Vec<PlayerId> {
    players
        .iter()
        .filter(|p| is_any_target(caster, p, duel))
        .map(|p| p.id.clone())
        .collect()
}

fn distinct(targets: &[PlayerId]) -> bool {
    targets.iter().collect::<BTreeSet<_>>().len() == targets.len()
}

/// Checks a proposed target list against a rule. Two-target rules accept a
/// single target when only one candidate exists.
pub fn validate_targets(
    rule: TargetRule,
    caster: &PlayerId,
    targets: &[PlayerId],
    players: &[PlayerState],
    duel: Option<&DuelState>,
) -> bool {
    let lookup = |id: &PlayerId| players.iter().find(|p| p.id == *id);
    let all = |check: &dyn Fn(&PlayerState) -> bool| {
        targets
            .iter()
            .all(|id| lookup(id).is_some_and(|p| check(p)))
    };

    match rule {
        TargetRule::SelfOnly => {
            targets.len() == 1 && targets[0] == *caster && lookup(caster).is_some_and(|p| p.alive)
        }
        TargetRule::SingleEnemy | TargetRule::AnySkill => {
            targets.len() == 1 && all(&|p| is_enemy_target(caster, p, duel))
        }
        TargetRule::SingleAny => targets.len() == 1 && all(&|p| is_any_target(caster, p, duel)),
        TargetRule::TwoEnemies => {
            let wanted = eligible_enemies(caster, players, duel).len().min(2);
            wanted > 0
                && targets.len() == wanted
                && distinct(targets)
                && all(&|p| is_enemy_target(caster, p, duel))
        }
        TargetRule::TwoAny => {
            let wanted = eligible_any(caster, players, duel).len().min(2);
            wanted > 0
                && targets.len() == wanted
                && distinct(targets)
                && all(&|p| is_any_target(caster, p, duel))
        }
        TargetRule::AllOthers => {
            let expected: BTreeSet<_> = eligible_enemies(caster, players, duel).into_iter().collect();
            let given: BTreeSet<_> = targets.iter().cloned().collect();
            !expected.is_empty() && distinct(targets) && given == expected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_players(ids: &[&str]) -> Vec<PlayerState> {
        ids.iter()
            .map(|id| PlayerState::new(PlayerId::new(*id)))
            .collect()
    }

    fn ids(raw: &[&str]) -> Vec<PlayerId> {
        raw.iter().map(|id| PlayerId::new(*id)).collect()
    }

    #[test]
    fn self_rule_requires_exactly_the_caster() {
        let players = make_players(&["a", "b"]);
        let caster = PlayerId::new("a");
        assert!(validate_targets(TargetRule::SelfOnly, &caster, &ids(&["a"]), &players, None));
        assert!(!validate_targets(TargetRule::SelfOnly, &caster, &ids(&["b"]), &players, None));
        assert!(!validate_targets(TargetRule::SelfOnly, &caster, &[], &players, None));
    }

    #[test]
    fn enemy_rules_skip_dead_and_stealthed() {
        let mut players = make_players(&["a", "b", "c"]);
        players[1].alive = false;
        players[2].flags.stealth = 1;
        let caster = PlayerId::new("a");
        assert!(!validate_targets(TargetRule::SingleEnemy, &caster, &ids(&["b"]), &players, None));
        assert!(!validate_targets(TargetRule::SingleEnemy, &caster, &ids(&["c"]), &players, None));
        assert!(!validate_targets(TargetRule::SingleEnemy, &caster, &ids(&["a"]), &players, None));
        assert!(validate_targets(TargetRule::SingleAny, &caster, &ids(&["a"]), &players, None));
    }

    #[test]
    fn all_others_must_match_the_live_set() {
        let mut players = make_players(&["a", "b", "c", "d"]);
        players[3].alive = false;
        let caster = PlayerId::new("a");
        assert!(validate_targets(TargetRule::AllOthers, &caster, &ids(&["c", "b"]), &players, None));
        assert!(!validate_targets(TargetRule::AllOthers, &caster, &ids(&["b"]), &players, None));
        assert!(!validate_targets(
            TargetRule::AllOthers,
            &caster,
            &ids(&["b", "c", "d"]),
            &players,
            None
        ));
    }

    #[test]
    fn two_enemies_shrinks_to_available_candidates() {
        let players = make_players(&["a", "b"]);
        let caster = PlayerId::new("a");
        assert!(validate_targets(TargetRule::TwoEnemies, &caster, &ids(&["b"]), &players, None));
        assert!(!validate_targets(TargetRule::TwoEnemies, &caster, &ids(&["b", "b"]), &players, None));

        let players = make_players(&["a", "b", "c"]);
        assert!(!validate_targets(TargetRule::TwoEnemies, &caster, &ids(&["b"]), &players, None));
        assert!(validate_targets(TargetRule::TwoEnemies, &caster, &ids(&["b", "c"]), &players, None));
    }

    #[test]
    fn duel_isolates_the_duelists() {
        let players = make_players(&["a", "b", "c"]);
        let duel = DuelState {
            challenger: PlayerId::new("a"),
            opponent: PlayerId::new("b"),
            skill: "duel".into(),
            rounds_remaining: 2,
        };
        let a = PlayerId::new("a");
        let c = PlayerId::new("c");
        assert!(validate_targets(TargetRule::SingleEnemy, &a, &ids(&["b"]), &players, Some(&duel)));
        assert!(!validate_targets(TargetRule::SingleEnemy, &a, &ids(&["c"]), &players, Some(&duel)));
        assert!(!validate_targets(TargetRule::SingleEnemy, &c, &ids(&["a"]), &players, Some(&duel)));
        assert!(eligible_enemies(&c, &players, Some(&duel)).is_empty());
    }
}
