use clap::{ArgAction, Args, Parser, Subcommand};
use encoding_rs::Encoding;
use serde::Serialize;
use std::{fs, io::BufRead, path::Path, path::PathBuf};
use talent_engine::api::parse_party;
use talent_engine::check::parse_modifier_list;
use talent_engine::command::run_line;
use talent_engine::config::parse_rules;
use talent_engine::content::{load_builtin_party, load_builtin_rules};
use talent_engine::{
    ActorId, CheckKind, CheckOptions, Dice, EnemyCheckOptions, MemoryHost, PartySetup, Rules,
    TalentRow, TalentSystem, ValueRef, ViewMode,
};
use tracing::Level;

#[derive(Args)]
struct Source {
    /// Rules file (.yaml/.yml/.json); defaults to the builtin d20 skills
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Party file (.yaml/.yml/.json); defaults to the builtin sample party
    #[arg(long)]
    party: Option<PathBuf>,
    /// Snapshot JSON to restore after the party is built
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// RNG seed for determinism
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Serialize)]
struct SheetReport {
    actor: ActorId,
    points: i32,
    total_points: i32,
    max_ranks: i32,
    max_score: i32,
    max_gauge: i32,
    talents: Vec<TalentRow>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run script commands (GETSCORE, CHECK, ...) from arguments, a file or stdin
    Run {
        #[command(flatten)]
        source: Source,
        /// File with one command per line
        #[arg(long)]
        script: Option<PathBuf>,
        /// Write the resulting snapshot here
        #[arg(long)]
        save: Option<PathBuf>,
        /// Commands to run, each quoted as one argument
        lines: Vec<String>,
    },
    /// Resolve a single talent check
    Check {
        #[command(flatten)]
        source: Source,
        /// Talent abbreviation
        #[arg(long)]
        abbr: String,
        /// Acting actor; 0 picks the best party member
        #[arg(long, default_value_t = 0)]
        actor: u32,
        /// Target number or named check
        #[arg(long)]
        target: Option<String>,
        /// Comma-separated modifiers (numbers or named modifiers)
        #[arg(long)]
        modifier: Option<String>,
        /// max, rnd or roll
        #[arg(long)]
        kind: Option<CheckKind>,
        /// Die size, `20` or `d20`
        #[arg(long)]
        die: Option<String>,
        /// Number of dice
        #[arg(long)]
        count: Option<i32>,
        /// Remember the roll under this key
        #[arg(long)]
        remember: Option<String>,
        /// Decline instead of attempting
        #[arg(long)]
        decline: bool,
    },
    /// Target number to beat an enemy's talent
    EnemyTn {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        enemy: u32,
        #[arg(long)]
        abbr: String,
        #[arg(long)]
        kind: Option<CheckKind>,
    },
    /// Print an actor's talent sheet
    Sheet {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        actor: u32,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Serialize the initialized party snapshot to JSON (stdout)
    Dump {
        #[command(flatten)]
        source: Source,
        /// Pretty-print JSON
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        pretty: bool,
    },
}

#[derive(Parser)]
#[command(name = "talents")]
#[command(about = "Talent rules engine CLI harness")]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<Rules> {
    match path {
        Some(path) => parse_rules(path, &read_text_auto(path)?),
        None => load_builtin_rules("d20_skills"),
    }
}

fn load_party(path: Option<&Path>) -> anyhow::Result<PartySetup> {
    match path {
        Some(path) => parse_party(path, &read_text_auto(path)?),
        None => load_builtin_party("sample_party"),
    }
}

fn build(source: &Source) -> anyhow::Result<(TalentSystem, MemoryHost)> {
    let rules = load_rules(source.rules.as_deref())?;
    let setup = load_party(source.party.as_deref())?;
    let (mut system, host) = TalentSystem::from_setup(rules, &setup, Dice::from_seed(source.seed));
    if let Some(path) = &source.snapshot {
        system.load_snapshot(path)?;
    }
    Ok((system, host))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match cli.cmd {
        Cmd::Run {
            source,
            script,
            save,
            lines,
        } => {
            let (mut system, mut host) = build(&source)?;
            let mut all = lines;
            if let Some(path) = script {
                all.extend(read_text_auto(&path)?.lines().map(str::to_string));
            } else if all.is_empty() {
                for line in std::io::stdin().lock().lines() {
                    all.push(line?);
                }
            }
            for line in all.iter().map(|l| l.trim()) {
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match run_line(&mut system, &mut host, line) {
                    Ok(value) => println!("{} => {}", line, value),
                    Err(err) => println!("{} => error: {}", line, err),
                }
            }
            if let Some(path) = save {
                system.save_snapshot(&path)?;
            }
        }
        Cmd::Check {
            source,
            abbr,
            actor,
            target,
            modifier,
            kind,
            die,
            count,
            remember,
            decline,
        } => {
            let (mut system, mut host) = build(&source)?;
            let opts = CheckOptions {
                kind,
                actor_id: actor,
                abbreviation: abbr,
                target: target.as_deref().map(ValueRef::parse),
                modifiers: modifier
                    .as_deref()
                    .map(parse_modifier_list)
                    .unwrap_or_default(),
                die: die
                    .as_deref()
                    .and_then(talent_engine::check::parse_die),
                dice_count: count,
                remember,
                view: Some(ViewMode::Show),
                var: None,
            };
            if decline {
                println!("declined => {}", system.decline_check(&mut host, &opts));
                return Ok(());
            }
            match system.check(&mut host, &opts) {
                Ok(o) => {
                    println!(
                        "actor={} {} {:?}: score={} raw={} vs target={} => {} ({:+})",
                        o.actor_id,
                        o.abbreviation,
                        o.kind,
                        o.score,
                        o.raw,
                        o.target,
                        if o.passed() { "SUCCESS" } else { "FAIL" },
                        o.result
                    );
                    if let Some(env) = o.envelope {
                        println!("envelope min={} max={}", env.min, env.max);
                    }
                }
                Err(err) => println!("unresolved ({}) => {}", err, talent_engine::UNRESOLVED_CHECK),
            }
        }
        Cmd::EnemyTn {
            source,
            enemy,
            abbr,
            kind,
        } => {
            let (system, mut host) = build(&source)?;
            let opts = EnemyCheckOptions {
                kind,
                enemy_id: enemy,
                abbreviation: abbr,
                ..EnemyCheckOptions::default()
            };
            println!("{}", system.enemy_target_number(&mut host, &opts));
        }
        Cmd::Sheet {
            source,
            actor,
            json,
        } => {
            let (system, host) = build(&source)?;
            if system.party().actor(actor).is_none() {
                anyhow::bail!("actor {} not found", actor);
            }
            if json {
                let report = SheetReport {
                    actor,
                    points: system.get_points(actor),
                    total_points: system.total_points(actor),
                    max_ranks: system.max_ranks(actor),
                    max_score: system.max_score(&host, actor),
                    max_gauge: system.max_gauge(&host, actor),
                    talents: system.talent_sheet(&host, actor),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!(
                "actor {} points={} total={} max_ranks={}",
                actor,
                system.get_points(actor),
                system.total_points(actor),
                system.max_ranks(actor)
            );
            for row in system.talent_sheet(&host, actor) {
                let flags = format!(
                    "{}{}{}",
                    if row.proficient { "P" } else { "-" },
                    if row.signature { "S" } else { "-" },
                    if row.visible { "" } else { " hidden" }
                );
                println!(
                    "{:<5} {:<16} ranks={} bonus={:+} score={} {}",
                    row.abbreviation, row.name, row.ranks, row.bonus, row.score, flags
                );
            }
        }
        Cmd::Dump { source, pretty } => {
            let (system, _) = build(&source)?;
            let snapshot = system.snapshot();
            if pretty {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}", serde_json::to_string(&snapshot)?);
            }
        }
    }
    Ok(())
}
