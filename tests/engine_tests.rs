use std::sync::Arc;
use ten_steps_battle::catalog::Catalog;
use ten_steps_battle::config::EngineConfig;
use ten_steps_battle::engine::{BattleEngine, RoundPhase};
use ten_steps_battle::error::{BattleError, ErrorKind};
use ten_steps_battle::model::{Mode, PlayerId, SkillParams};

fn pid(id: &str) -> PlayerId {
    PlayerId::new(id)
}

fn ids(n: usize) -> Vec<PlayerId> {
    (1..=n).map(|i| pid(&format!("p{i}"))).collect()
}

fn commoners_with_styles(styles: &[&str], config: EngineConfig) -> BattleEngine {
    let n = styles.len();
    let mut engine = BattleEngine::with_catalog(ids(n), Mode::Standard, Catalog::builtin(), config, 7);
    for (id, style) in ids(n).iter().zip(styles) {
        engine
            .select_character(id, "commoner", style, None, &[])
            .expect("lock-in");
    }
    engine
}

/// Commoners on the heal style: 15 HP, no passive, no damage or defense bonus.
fn commoners(n: usize, config: EngineConfig) -> BattleEngine {
    commoners_with_styles(&vec!["heal"; n], config)
}

fn no_events() -> EngineConfig {
    EngineConfig {
        event_interval: 0,
        ..EngineConfig::default()
    }
}

fn tie_round(engine: &mut BattleEngine) {
    for id in engine.eligible_movers() {
        engine.submit_move(&id, "rock").expect("move");
    }
    engine.process_round().expect("round");
}

fn hp(engine: &BattleEngine, id: &str) -> i32 {
    engine.player(&pid(id)).expect("player").hp
}

fn wins(engine: &BattleEngine, id: &str) -> u32 {
    engine.player(&pid(id)).expect("player").wins
}

const NUKE_CATALOG: &str = r#"{
  "characters": [
    { "id": "dummy", "name": "Dummy", "max_hp": 15 }
  ],
  "skills": [
    {
      "id": "nuke",
      "name": "Nuke",
      "cooldown": 0,
      "target": "single_enemy",
      "effect": { "type": "direct_damage", "damage": 40 }
    }
  ]
}"#;

fn nuke_arena(n: usize) -> BattleEngine {
    let catalog = Arc::new(Catalog::from_json_str(NUKE_CATALOG).expect("catalog"));
    let config = EngineConfig {
        skill_unlock_wins: 0,
        event_interval: 0,
        ..EngineConfig::default()
    };
    let mut engine = BattleEngine::with_catalog(ids(n), Mode::Standard, catalog, config, 3);
    for id in ids(n) {
        engine
            .select_character(&id, "dummy", "heal", None, &[])
            .expect("lock-in");
    }
    engine
}

#[test]
fn round_win_then_skill_damage_end_to_end() {
    let mut engine = commoners(2, EngineConfig::default());
    assert!(engine.is_started());
    assert_eq!(hp(&engine, "p1"), 15);
    assert_eq!(hp(&engine, "p2"), 15);

    engine.submit_move(&pid("p1"), "rock").unwrap();
    engine.submit_move(&pid("p2"), "scissors").unwrap();
    assert_eq!(engine.phase(), RoundPhase::Resolving);
    let result = engine.process_round().unwrap();
    assert_eq!(result.winners, vec![pid("p1")]);
    assert_eq!(wins(&engine, "p1"), 1);
    assert_eq!(hp(&engine, "p1"), 15);
    assert_eq!(hp(&engine, "p2"), 15);

    engine
        .use_skill(&pid("p1"), "strike", &[pid("p2")], &SkillParams::default())
        .unwrap();
    tie_round(&mut engine);
    assert_eq!(hp(&engine, "p2"), 12);
    assert_eq!(wins(&engine, "p1"), 1);
}

#[test]
fn skills_need_a_win_first() {
    let mut engine = commoners(2, no_events());
    let err = engine
        .use_skill(&pid("p1"), "strike", &[pid("p2")], &SkillParams::default())
        .unwrap_err();
    assert_eq!(
        err,
        BattleError::InsufficientWins {
            required: 1,
            available: 0
        }
    );
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn cooldown_blocks_requeue_until_elapsed() {
    let config = EngineConfig {
        skill_unlock_wins: 0,
        ..no_events()
    };
    let mut engine = commoners(2, config);
    let arrow = |engine: &mut BattleEngine| {
        engine.use_skill(&pid("p1"), "piercing_arrow", &[pid("p2")], &SkillParams::default())
    };

    arrow(&mut engine).unwrap();
    assert!(matches!(
        arrow(&mut engine),
        Err(BattleError::OnCooldown { .. })
    ));
    tie_round(&mut engine);

    for expected in [3, 2, 1] {
        assert_eq!(
            arrow(&mut engine),
            Err(BattleError::OnCooldown {
                skill: "piercing_arrow".into(),
                remaining: expected
            })
        );
        tie_round(&mut engine);
    }
    assert!(arrow(&mut engine).is_ok());
}

#[test]
fn three_wins_end_the_game() {
    let mut engine = commoners(3, no_events());
    for _ in 0..3 {
        engine.submit_move(&pid("p1"), "rock").unwrap();
        engine.submit_move(&pid("p2"), "scissors").unwrap();
        engine.submit_move(&pid("p3"), "scissors").unwrap();
        engine.process_round().unwrap();
    }
    assert!(engine.is_game_over());
    assert_eq!(engine.winner(), Some(&pid("p1")));
    assert!(engine.players().iter().all(|p| p.alive));
    assert_eq!(engine.phase(), RoundPhase::Terminated);
    assert_eq!(
        engine.submit_move(&pid("p2"), "rock"),
        Err(BattleError::GameOver)
    );
    assert_eq!(engine.log().lines().last().map(String::as_str), Some("|gameover|p1"));
}

#[test]
fn last_survivor_wins_without_threshold() {
    let mut engine = nuke_arena(3);
    engine
        .use_skill(&pid("p1"), "nuke", &[pid("p2")], &SkillParams::default())
        .unwrap();
    tie_round(&mut engine);
    assert!(!engine.player(&pid("p2")).unwrap().alive);
    assert!(!engine.is_game_over());
    assert_eq!(
        engine.submit_move(&pid("p2"), "rock"),
        Err(BattleError::PlayerDead(pid("p2")))
    );

    engine
        .use_skill(&pid("p3"), "nuke", &[pid("p1")], &SkillParams::default())
        .unwrap();
    tie_round(&mut engine);
    assert!(engine.is_game_over());
    assert_eq!(engine.winner(), Some(&pid("p3")));
    assert_eq!(wins(&engine, "p3"), 0);
}

#[test]
fn dead_players_cannot_be_targeted() {
    let mut engine = nuke_arena(3);
    engine
        .use_skill(&pid("p1"), "nuke", &[pid("p2")], &SkillParams::default())
        .unwrap();
    tie_round(&mut engine);
    assert_eq!(
        engine.use_skill(&pid("p3"), "nuke", &[pid("p2")], &SkillParams::default()),
        Err(BattleError::InvalidTargets {
            skill: "nuke".into()
        })
    );
}

#[test]
fn reduction_never_negates_a_hit() {
    let config = EngineConfig {
        skill_unlock_wins: 0,
        ..no_events()
    };
    let mut engine = commoners_with_styles(&["heal", "defense"], config);
    let none = SkillParams::default();
    engine.use_skill(&pid("p2"), "iron_wall", &[pid("p2")], &none).unwrap();
    engine.use_skill(&pid("p2"), "blood_pact", &[pid("p2")], &none).unwrap();
    assert_eq!(
        engine.use_skill(&pid("p2"), "blood_pact", &[pid("p2")], &none),
        Err(BattleError::UsageLimitReached {
            skill: "blood_pact".into(),
            limit: 1
        })
    );
    engine.use_skill(&pid("p1"), "strike", &[pid("p2")], &none).unwrap();
    tie_round(&mut engine);

    let p2 = engine.player(&pid("p2")).unwrap();
    assert_eq!(p2.max_hp, 12);
    assert_eq!(p2.hp, 11);
}

#[test]
fn timed_buff_lasts_exactly_its_duration() {
    let config = EngineConfig {
        skill_unlock_wins: 0,
        ..no_events()
    };
    let mut engine = commoners(2, config);
    let name = engine.catalog().skill("battle_cry").unwrap().name.clone();
    engine
        .use_skill(&pid("p1"), "battle_cry", &[pid("p1")], &SkillParams::default())
        .unwrap();
    tie_round(&mut engine);
    let has_cry = |engine: &BattleEngine| {
        engine
            .player(&pid("p1"))
            .unwrap()
            .buffs
            .iter()
            .any(|b| b.name == name)
    };
    assert!(has_cry(&engine));
    tie_round(&mut engine);
    assert!(has_cry(&engine));
    tie_round(&mut engine);
    assert!(!has_cry(&engine));

    for _ in 0..10 {
        tie_round(&mut engine);
    }
    let style = &engine.player(&pid("p1")).unwrap().buffs;
    assert_eq!(style.len(), 1);
    assert!(style[0].is_permanent());
}

#[test]
fn called_coin_spends_a_win_and_lands() {
    let mut engine = commoners(2, no_events());
    engine.submit_move(&pid("p1"), "paper").unwrap();
    engine.submit_move(&pid("p2"), "rock").unwrap();
    engine.process_round().unwrap();
    assert_eq!(wins(&engine, "p1"), 1);

    engine
        .use_skill(
            &pid("p1"),
            "fervor",
            &[pid("p2")],
            &SkillParams::consume_win("heads"),
        )
        .unwrap();
    assert_eq!(wins(&engine, "p1"), 0);
    tie_round(&mut engine);
    assert_eq!(hp(&engine, "p1"), 14);
    assert_eq!(hp(&engine, "p2"), 11);
}

#[test]
fn bad_coin_face_is_rejected_not_coerced() {
    let mut engine = commoners(2, no_events());
    engine.submit_move(&pid("p1"), "paper").unwrap();
    engine.submit_move(&pid("p2"), "rock").unwrap();
    engine.process_round().unwrap();

    let err = engine
        .use_skill(
            &pid("p1"),
            "fervor",
            &[pid("p2")],
            &SkillParams::consume_win("Heads "),
        )
        .unwrap_err();
    assert_eq!(err, BattleError::InvalidCoinFace("Heads ".into()));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(wins(&engine, "p1"), 1);
    assert!(engine.pending_skills().is_empty());
}

#[test]
fn bad_tokens_and_ids_are_validation_errors() {
    let mut engine = commoners(2, no_events());
    assert_eq!(
        engine.submit_move(&pid("p1"), "lizard"),
        Err(BattleError::InvalidMove("lizard".into()))
    );
    assert_eq!(
        engine.submit_move(&pid("p9"), "rock"),
        Err(BattleError::UnknownPlayer(pid("p9")))
    );
    assert_eq!(
        engine
            .use_skill(&pid("p1"), "meteor", &[pid("p2")], &SkillParams::default())
            .map_err(|e| e.kind()),
        Err(ErrorKind::Validation)
    );
    assert_eq!(
        engine.select_character(&pid("p1"), "warrior", "heal", None, &[]),
        Err(BattleError::AlreadyLockedIn(pid("p1")))
    );
}

#[test]
fn rounds_wait_for_every_lock_in() {
    let mut engine = BattleEngine::new(ids(2), Mode::Standard, 1);
    engine
        .select_character(&pid("p1"), "warrior", "damage", Some("Alice"), &[])
        .unwrap();
    assert!(!engine.is_started());
    assert_eq!(engine.submit_move(&pid("p1"), "rock"), Err(BattleError::NotStarted));
    assert_eq!(engine.process_round().unwrap_err(), BattleError::NotStarted);
    assert_eq!(
        engine.select_character(&pid("p2"), "warrior", "berserk", None, &[]),
        Err(BattleError::InvalidStyle("berserk".into()))
    );
    engine
        .select_character(&pid("p2"), "medic", "heal", None, &[])
        .unwrap();
    assert!(engine.is_started());

    let state = engine.public_state();
    assert_eq!(state.players[0].username, "Alice");
    assert_eq!(state.players[0].max_hp, 18);
    assert!(state.players[1]
        .available_skills
        .contains(&"eat_peach".to_string()));
}

#[test]
fn missing_moves_are_filled() {
    let mut engine = commoners(3, no_events());
    engine.submit_move(&pid("p1"), "rock").unwrap();
    let result = engine.process_round().unwrap();
    assert_eq!(result.moves.len(), 3);
    assert_eq!(result.moves[0].player, pid("p1"));
    assert_eq!(result.round, 1);
}

#[test]
fn boss_mode_promotes_one_seat() {
    let mut engine = BattleEngine::new(ids(3), Mode::Boss, 21);
    for id in ids(3) {
        engine
            .select_character(&id, "commoner", "damage", None, &[])
            .unwrap();
    }
    let boss = engine.boss_id().cloned().expect("boss promoted");
    let state = engine.player(&boss).unwrap();
    assert_eq!(state.max_hp, 80);
    assert_eq!(state.hp, 80);
    assert!(state.available_skills.contains(&"sweep".to_string()));
    assert_eq!(
        engine.submit_move(&boss, "rock"),
        Err(BattleError::BossCannotThrow)
    );
    assert_eq!(engine.eligible_movers().len(), 2);
    assert!(!engine.eligible_movers().contains(&boss));
}

#[test]
fn infinite_mode_requires_exact_skill_picks() {
    let mut engine = BattleEngine::new(ids(2), Mode::Infinite, 5);
    let picks: Vec<String> = ["strike", "first_aid", "bind", "evade", "duel"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(
        engine.select_character(&pid("p1"), "warrior", "damage", None, &picks[..3]),
        Err(BattleError::WrongSkillCount {
            expected: 5,
            actual: 3
        })
    );
    engine
        .select_character(&pid("p1"), "warrior", "damage", None, &picks)
        .unwrap();
    let p1 = engine.player(&pid("p1")).unwrap();
    assert_eq!(p1.max_hp, 12);
    assert!(p1.available_skills.contains(&"fortune_smiles".to_string()));
    assert!(p1.available_skills.contains(&"cleave".to_string()));
    assert!(!p1.available_skills.contains(&"iron_wall".to_string()));
}

#[test]
fn removal_below_minimum_ends_without_winner() {
    let mut engine = commoners(2, no_events());
    engine.submit_move(&pid("p1"), "rock").unwrap();
    engine.remove_player(&pid("p2")).unwrap();
    assert!(engine.is_game_over());
    assert_eq!(engine.winner(), None);
    assert_eq!(engine.log().lines().last().map(String::as_str), Some("|tie|"));
}

#[test]
fn same_seed_same_battle() {
    let run = || {
        let mut engine = commoners(3, EngineConfig::default());
        for _ in 0..6 {
            if engine.is_game_over() {
                break;
            }
            engine.process_round().unwrap();
        }
        engine.log().lines().to_vec()
    };
    assert_eq!(run(), run());
}

fn open_skills() -> EngineConfig {
    EngineConfig {
        skill_unlock_wins: 0,
        ..no_events()
    }
}

fn cast(engine: &mut BattleEngine, caster: &str, skill: &str, targets: &[&str]) {
    let targets: Vec<PlayerId> = targets.iter().map(|t| pid(t)).collect();
    engine
        .use_skill(&pid(caster), skill, &targets, &SkillParams::default())
        .expect("skill");
}

#[test]
fn evasion_negates_one_hit_then_lets_the_next_land() {
    let mut engine = commoners(3, open_skills());
    cast(&mut engine, "p2", "evade", &[]);
    cast(&mut engine, "p1", "strike", &["p2"]);
    tie_round(&mut engine);
    assert_eq!(hp(&engine, "p2"), 15);
    assert_eq!(engine.player(&pid("p2")).unwrap().evasion, 0);

    cast(&mut engine, "p3", "strike", &["p2"]);
    tie_round(&mut engine);
    assert_eq!(hp(&engine, "p2"), 12);
}

#[test]
fn piercing_hits_skip_evasion_and_reduction() {
    let mut engine = commoners_with_styles(&["heal", "defense", "heal"], open_skills());
    cast(&mut engine, "p2", "evade", &[]);
    cast(&mut engine, "p1", "piercing_arrow", &["p2"]);
    tie_round(&mut engine);
    assert_eq!(hp(&engine, "p2"), 12);
    assert_eq!(engine.player(&pid("p2")).unwrap().evasion, 1);

    cast(&mut engine, "p3", "strike", &["p2"]);
    tie_round(&mut engine);
    assert_eq!(hp(&engine, "p2"), 12);
    assert_eq!(engine.player(&pid("p2")).unwrap().evasion, 0);
}

#[test]
fn thorn_bloom_hurts_then_heals_the_target() {
    let mut engine = commoners(2, open_skills());
    cast(&mut engine, "p1", "thorn_bloom", &["p2"]);
    tie_round(&mut engine);
    let mut seen = vec![hp(&engine, "p2")];
    for _ in 0..3 {
        tie_round(&mut engine);
        seen.push(hp(&engine, "p2"));
    }
    assert_eq!(seen, vec![12, 13, 14, 14]);
}

#[test]
fn spring_breeze_heals_each_round_for_its_duration() {
    let mut engine = commoners(2, open_skills());
    cast(&mut engine, "p1", "strike", &["p2"]);
    cast(&mut engine, "p2", "spring_breeze", &[]);
    tie_round(&mut engine);
    let mut seen = vec![hp(&engine, "p2")];
    for _ in 0..4 {
        tie_round(&mut engine);
        seen.push(hp(&engine, "p2"));
    }
    assert_eq!(seen, vec![12, 13, 14, 15, 15]);
}

#[test]
fn breakthrough_hp_sets_the_starting_pool() {
    let catalog = Catalog::builtin();
    let mut engine =
        BattleEngine::with_catalog(ids(2), Mode::Standard, catalog.clone(), no_events(), 5);
    engine
        .select_character(&pid("p1"), "breaker", "heal", None, &[])
        .unwrap();
    let p1 = engine.player(&pid("p1")).unwrap();
    assert_eq!((p1.hp, p1.max_hp), (20, 20));

    let skills: Vec<String> = catalog.common_pool().into_iter().take(5).collect();
    let mut engine = BattleEngine::with_catalog(ids(2), Mode::Infinite, catalog, no_events(), 5);
    engine
        .select_character(&pid("p1"), "breaker", "heal", None, &skills)
        .unwrap();
    let p1 = engine.player(&pid("p1")).unwrap();
    assert_eq!((p1.hp, p1.max_hp), (12, 12));
}

#[test]
fn paladin_carries_its_named_buff() {
    let mut engine =
        BattleEngine::with_catalog(ids(2), Mode::Standard, Catalog::builtin(), open_skills(), 6);
    engine
        .select_character(&pid("p1"), "commoner", "heal", None, &[])
        .unwrap();
    engine
        .select_character(&pid("p2"), "paladin", "heal", None, &[])
        .unwrap();
    let paladin = engine.player(&pid("p2")).unwrap();
    let buff = paladin
        .buffs
        .iter()
        .find(|b| b.name == "九锡黄龙")
        .expect("paladin buff");
    assert!(buff.is_permanent());
    assert_eq!(buff.effects.damage_reduction, 1);

    cast(&mut engine, "p1", "strike", &["p2"]);
    tie_round(&mut engine);
    assert_eq!(hp(&engine, "p2"), 15);
}
