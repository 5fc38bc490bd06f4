use anyhow::{anyhow, Context};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use ten_steps_battle::autoplay::{play_match, RandomPlayer};
use ten_steps_battle::catalog::{is_boss_skill, SkillDefinition};
use ten_steps_battle::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A scripted battle: fixed lock-ins, then per-round moves and skills.
#[derive(Debug, Deserialize)]
struct BattleScript {
    #[serde(default)]
    mode: Mode,
    #[serde(default)]
    seed: u64,
    players: Vec<ScriptedPlayer>,
    #[serde(default)]
    rounds: Vec<ScriptedRound>,
}

#[derive(Debug, Deserialize)]
struct ScriptedPlayer {
    id: String,
    character: String,
    style: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScriptedRound {
    #[serde(default)]
    moves: BTreeMap<String, String>,
    #[serde(default)]
    skills: Vec<ScriptedSkill>,
}

#[derive(Debug, Deserialize)]
struct ScriptedSkill {
    player: String,
    skill: String,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    params: SkillParams,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("list-characters") => list_characters(),
        Some("check-character") => {
            let id = args
                .next()
                .ok_or_else(|| anyhow!("Usage: battle-cli check-character <id>"))?;
            check_character(&id)
        }
        Some("check-skill") => {
            let id = args
                .next()
                .ok_or_else(|| anyhow!("Usage: battle-cli check-skill <id>"))?;
            check_skill(&id)
        }
        Some("run-match") => {
            let mut mode = Mode::Standard;
            let mut seed = 0u64;
            let mut players = 3usize;
            let mut out_path: Option<String> = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--mode" => {
                        let val = args
                            .next()
                            .ok_or_else(|| anyhow!("--mode requires standard, boss or infinite"))?;
                        mode = val
                            .parse()
                            .map_err(|_| anyhow!("Unknown mode '{}'", val))?;
                    }
                    "--seed" => {
                        let val = args.next().ok_or_else(|| anyhow!("--seed requires a number"))?;
                        seed = val.parse()?;
                    }
                    "--players" => {
                        let val = args
                            .next()
                            .ok_or_else(|| anyhow!("--players requires a number"))?;
                        players = val.parse()?;
                    }
                    "--log-json" => out_path = args.next(),
                    other => return Err(anyhow!("Unknown arg '{}' for run-match", other)),
                }
            }
            run_match(mode, seed, players, out_path.as_deref())
        }
        Some("run-script") => {
            let mut script_path: Option<String> = None;
            let mut out_path: Option<String> = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--script" => script_path = args.next(),
                    "--log-json" => out_path = args.next(),
                    other => return Err(anyhow!("Unknown arg '{}' for run-script", other)),
                }
            }
            let script_path = script_path.ok_or_else(|| {
                anyhow!("Usage: battle-cli run-script --script <script.json> [--log-json <out.json>]")
            })?;
            run_script(&script_path, out_path.as_deref())
        }
        Some(cmd) => Err(anyhow!("Unknown command '{}'", cmd)),
        None => run_match(Mode::Standard, 0xBADC0DE, 3, None),
    }
}

fn list_characters() -> anyhow::Result<()> {
    let catalog = Catalog::builtin();
    for character in catalog.characters() {
        let passive = character
            .passive
            .as_ref()
            .map(|p| p.label())
            .unwrap_or("-");
        println!(
            "{} ({}) hp {} passive {}",
            character.name,
            character.id,
            character.starting_hp(),
            passive
        );
    }
    Ok(())
}

fn describe_skill(skill: &SkillDefinition) -> String {
    let mut line = format!(
        "{} ({}) effect: {}, target: {:?}, cooldown: {}",
        skill.name,
        skill.id,
        skill.effect.label(),
        skill.target,
        skill.cooldown
    );
    if let Some(limit) = skill.usage_limit {
        line.push_str(&format!(", limit: {limit}/round"));
    }
    if skill.ignore_defense {
        line.push_str(", ignores defense");
    }
    line
}

fn check_character(id: &str) -> anyhow::Result<()> {
    let catalog = Catalog::builtin();
    let character = catalog
        .character(id)
        .ok_or_else(|| anyhow!("Character '{}' not found", id))?;
    println!(
        "Found character: {} ({}) HP: {}{}",
        character.name,
        character.id,
        character.max_hp,
        character
            .breakthrough_hp
            .map(|hp| format!(" (breakthrough {hp})"))
            .unwrap_or_default()
    );
    match &character.passive {
        Some(passive) => println!("Passive: {}", serde_json::to_string(passive)?),
        None => println!("Passive: none"),
    }
    for skill in &character.skills {
        let note = if skill.locked { " [unlocked later]" } else { "" };
        println!("  {}{}", describe_skill(skill), note);
    }
    Ok(())
}

fn check_skill(id: &str) -> anyhow::Result<()> {
    let catalog = Catalog::builtin();
    let owner = catalog
        .characters()
        .iter()
        .find(|c| c.skill(id).is_some())
        .map(|c| c.id.clone());
    let skill = catalog
        .resolve_skill(id, owner.as_deref())
        .ok_or_else(|| anyhow!("Skill '{}' not found", id))?;
    let scope = if is_boss_skill(id) {
        "boss".to_string()
    } else if let Some(owner) = owner {
        format!("character {owner}")
    } else if skill.infinite_only {
        "infinite mode".to_string()
    } else {
        "shared".to_string()
    };
    println!("Found skill: {} [{}]", describe_skill(skill), scope);
    println!("Effect: {}", serde_json::to_string(&skill.effect)?);
    Ok(())
}

fn write_log(engine: &BattleEngine, header: serde_json::Value, out_path: &str) -> anyhow::Result<()> {
    let mut log_json = engine.log().to_json();
    if let (Some(log), Some(extra)) = (log_json.as_object_mut(), header.as_object()) {
        for (key, value) in extra {
            log.insert(key.clone(), value.clone());
        }
    }
    fs::write(out_path, serde_json::to_string_pretty(&log_json)? + "\n")
        .with_context(|| format!("failed to write {}", out_path))?;
    Ok(())
}

fn run_match(mode: Mode, seed: u64, players: usize, out_path: Option<&str>) -> anyhow::Result<()> {
    if players < 2 {
        return Err(anyhow!("--players must be at least 2"));
    }
    let ids: Vec<PlayerId> = (1..=players).map(|n| PlayerId::new(format!("p{n}"))).collect();
    let mut engine = BattleEngine::new(ids.clone(), mode, seed);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut policies: Vec<RandomPlayer> = ids.iter().map(|_| RandomPlayer::new(rng.gen())).collect();
    let outcome = play_match(&mut engine, &mut policies, 500);
    info!(rounds = outcome.rounds, timed_out = outcome.timed_out, "match finished");

    for line in engine.log().lines() {
        println!("{line}");
    }
    match (&outcome.winner, outcome.timed_out) {
        (Some(winner), _) => println!("\nWinner: {winner} after {} rounds", outcome.rounds),
        (None, true) => println!("\nNo winner after {} rounds", outcome.rounds),
        (None, false) => println!("\nTie after {} rounds", outcome.rounds),
    }
    if let Some(out_path) = out_path {
        write_log(&engine, json!({ "seed": seed, "players": players }), out_path)?;
    }
    Ok(())
}

fn run_script(script_path: &str, out_path: Option<&str>) -> anyhow::Result<()> {
    let content =
        fs::read_to_string(script_path).with_context(|| format!("failed to read {}", script_path))?;
    let script: BattleScript = serde_json::from_str(&content)
        .map_err(|e| anyhow!("failed to parse script json {}: {}", script_path, e))?;

    let ids: Vec<PlayerId> = script.players.iter().map(|p| PlayerId::new(&p.id)).collect();
    let mut engine = BattleEngine::new(ids, script.mode, script.seed);
    for player in &script.players {
        engine
            .select_character(
                &PlayerId::new(&player.id),
                &player.character,
                &player.style,
                player.name.as_deref(),
                &player.skills,
            )
            .with_context(|| format!("lock-in failed for {}", player.id))?;
    }

    for (n, round) in script.rounds.iter().enumerate() {
        if engine.is_game_over() {
            break;
        }
        for (player, token) in &round.moves {
            if let Err(err) = engine.submit_move(&PlayerId::new(player), token) {
                println!("round {}: move by {} rejected: {}", n + 1, player, err);
            }
        }
        for intent in &round.skills {
            let targets: Vec<PlayerId> = intent.targets.iter().map(PlayerId::new).collect();
            if let Err(err) = engine.use_skill(
                &PlayerId::new(&intent.player),
                &intent.skill,
                &targets,
                &intent.params,
            ) {
                println!(
                    "round {}: {} by {} rejected: {}",
                    n + 1,
                    intent.skill,
                    intent.player,
                    err
                );
            }
        }
        let result = engine.process_round()?;
        for line in &result.log {
            println!("{line}");
        }
    }

    let state = engine.public_state();
    println!("\n{}", serde_json::to_string_pretty(&state)?);
    if let Some(out_path) = out_path {
        write_log(&engine, json!({ "seed": script.seed }), out_path)?;
    }
    Ok(())
}
