//! Script command surface.
//!
//! ```text
//! [TALENT] GETPOINTS actorId [var]
//! [TALENT] SETRANKS actorId abbr value
//! [TALENT] GETBEST abbr [var]
//! [TALENT] CHECK type:roll aid:1 abbr:lock target:13 mod:dark,2 var:5
//! [TALENT] ENEMYTN eid:1 abbr:perc type:max var:6
//! ```
//!
//! Any argument (positional or named value) written `v[n]` is replaced by
//! the current value of variable `n` before it is parsed.

use crate::check::{CheckOptions, EnemyCheckOptions, ValueRef, parse_die, parse_modifier_list};
use crate::error::CommandError;
use crate::host::{Host, VariableStore};
use crate::{ActorId, EnemyId, SlotId, TalentSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetPoints { actor: ActorId, var: Option<SlotId> },
    SetPoints { actor: ActorId, value: i32 },
    AddPoints { actor: ActorId, value: i32 },
    RemovePoints { actor: ActorId, value: i32 },
    GetRanks { actor: ActorId, abbr: String, var: Option<SlotId> },
    SetRanks { actor: ActorId, abbr: String, value: i32 },
    AddRanks { actor: ActorId, abbr: String, value: i32 },
    RemoveRanks { actor: ActorId, abbr: String, value: i32 },
    GetScore { actor: ActorId, abbr: String, var: Option<SlotId> },
    GetBest { abbr: String, var: Option<SlotId> },
    EnemyScore { enemy: EnemyId, abbr: String, var: Option<SlotId> },
    Check(CheckOptions),
    EnemyTn(EnemyCheckOptions),
}

/// Replace a `v[n]` reference with the variable's value.
pub fn resolve_arg<V: VariableStore + ?Sized>(arg: &str, vars: &V) -> String {
    let arg = arg.trim();
    if let Some(id) = arg
        .strip_prefix("v[")
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|id| id.trim().parse::<SlotId>().ok())
    {
        return vars.value(id).to_string();
    }
    arg.to_string()
}

struct Args {
    verb: String,
    tokens: Vec<String>,
    named: Vec<(String, String)>,
}

impl Args {
    fn positional(&self, idx: usize, name: &'static str) -> Result<&str, CommandError> {
        self.tokens
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| CommandError::MissingArgument {
                verb: self.verb.clone(),
                name,
            })
    }

    fn number<T: std::str::FromStr>(&self, name: &'static str, value: &str) -> Result<T, CommandError> {
        value.parse::<T>().map_err(|_| CommandError::InvalidArgument {
            verb: self.verb.clone(),
            name,
            value: value.to_string(),
        })
    }

    fn positional_number<T: std::str::FromStr>(&self, idx: usize, name: &'static str) -> Result<T, CommandError> {
        let value = self.positional(idx, name)?;
        self.number(name, value)
    }

    fn optional_slot(&self, idx: usize) -> Result<Option<SlotId>, CommandError> {
        match self.tokens.get(idx) {
            Some(value) => self.number("var", value).map(Some),
            None => Ok(None),
        }
    }

    fn named(&self, key: &str) -> Option<&str> {
        self.named
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn named_number<T: std::str::FromStr>(&self, key: &'static str) -> Result<Option<T>, CommandError> {
        self.named(key).map(|v| self.number(key, v)).transpose()
    }

    fn named_parsed<T: std::str::FromStr>(&self, key: &'static str) -> Result<Option<T>, CommandError> {
        self.named(key)
            .map(|v| {
                v.parse::<T>().map_err(|_| CommandError::InvalidArgument {
                    verb: self.verb.clone(),
                    name: key,
                    value: v.to_string(),
                })
            })
            .transpose()
    }
}

impl Command {
    /// Parse one command line, resolving `v[n]` references against `vars`.
    pub fn parse<V: VariableStore + ?Sized>(line: &str, vars: &V) -> Result<Command, CommandError> {
        let mut raw = line.split_whitespace().peekable();
        if raw
            .peek()
            .is_some_and(|w| w.eq_ignore_ascii_case("talent") || w.eq_ignore_ascii_case("talents"))
        {
            raw.next();
        }
        let verb = raw
            .next()
            .map(|w| resolve_arg(w, vars).to_uppercase())
            .ok_or(CommandError::Empty)?;

        let mut tokens = Vec::new();
        let mut named = Vec::new();
        for word in raw {
            match word.split_once(':') {
                Some((key, value)) if !key.is_empty() => named.push((
                    resolve_arg(key, vars).to_lowercase(),
                    resolve_arg(value, vars),
                )),
                _ => tokens.push(resolve_arg(word, vars)),
            }
        }
        let args = Args {
            verb,
            tokens,
            named,
        };

        let cmd = match args.verb.as_str() {
            "GETPOINTS" => Command::GetPoints {
                actor: args.positional_number(0, "actorId")?,
                var: args.optional_slot(1)?,
            },
            "SETPOINTS" => Command::SetPoints {
                actor: args.positional_number(0, "actorId")?,
                value: args.positional_number(1, "value")?,
            },
            "ADDPOINTS" => Command::AddPoints {
                actor: args.positional_number(0, "actorId")?,
                value: args.positional_number(1, "value")?,
            },
            "REMOVEPOINTS" | "REMPOINTS" => Command::RemovePoints {
                actor: args.positional_number(0, "actorId")?,
                value: args.positional_number(1, "value")?,
            },
            "GETRANKS" => Command::GetRanks {
                actor: args.positional_number(0, "actorId")?,
                abbr: args.positional(1, "abbr")?.to_string(),
                var: args.optional_slot(2)?,
            },
            "SETRANKS" => Command::SetRanks {
                actor: args.positional_number(0, "actorId")?,
                abbr: args.positional(1, "abbr")?.to_string(),
                value: args.positional_number(2, "value")?,
            },
            "ADDRANKS" => Command::AddRanks {
                actor: args.positional_number(0, "actorId")?,
                abbr: args.positional(1, "abbr")?.to_string(),
                value: args.positional_number(2, "value")?,
            },
            "REMOVERANKS" | "REMRANKS" => Command::RemoveRanks {
                actor: args.positional_number(0, "actorId")?,
                abbr: args.positional(1, "abbr")?.to_string(),
                value: args.positional_number(2, "value")?,
            },
            "GETSCORE" => Command::GetScore {
                actor: args.positional_number(0, "actorId")?,
                abbr: args.positional(1, "abbr")?.to_string(),
                var: args.optional_slot(2)?,
            },
            "GETBEST" => Command::GetBest {
                abbr: args.positional(0, "abbr")?.to_string(),
                var: args.optional_slot(1)?,
            },
            "ENEMYSCORE" => Command::EnemyScore {
                enemy: args.positional_number(0, "enemyId")?,
                abbr: args.positional(1, "abbr")?.to_string(),
                var: args.optional_slot(2)?,
            },
            "CHECK" => Command::Check(check_options(&args)?),
            "ENEMYTN" => Command::EnemyTn(enemy_options(&args)?),
            _ => return Err(CommandError::UnknownVerb(args.verb.clone())),
        };
        Ok(cmd)
    }
}

fn die_option(args: &Args) -> Result<Option<i32>, CommandError> {
    args.named("die")
        .map(|v| {
            parse_die(v).ok_or_else(|| CommandError::InvalidArgument {
                verb: args.verb.clone(),
                name: "die",
                value: v.to_string(),
            })
        })
        .transpose()
}

fn check_options(args: &Args) -> Result<CheckOptions, CommandError> {
    Ok(CheckOptions {
        kind: args.named_parsed("type")?,
        actor_id: args.named_number("aid")?.unwrap_or(0),
        abbreviation: args.named("abbr").unwrap_or_default().to_string(),
        target: args.named("target").map(ValueRef::parse),
        modifiers: args.named("mod").map(parse_modifier_list).unwrap_or_default(),
        die: die_option(args)?,
        dice_count: args.named_number("dcount")?,
        remember: args.named("rem").map(str::to_string),
        view: args.named_parsed("view")?,
        var: args.named_number("var")?,
    })
}

fn enemy_options(args: &Args) -> Result<EnemyCheckOptions, CommandError> {
    Ok(EnemyCheckOptions {
        kind: args.named_parsed("type")?,
        enemy_id: args.named_number("eid")?.unwrap_or(0),
        abbreviation: args.named("abbr").unwrap_or_default().to_string(),
        die: die_option(args)?,
        dice_count: args.named_number("dcount")?,
        var: args.named_number("var")?,
    })
}

fn store<H: Host + ?Sized>(host: &mut H, var: Option<SlotId>, value: i32) -> i32 {
    if let Some(slot) = var {
        host.set_value(slot, value);
    }
    value
}

/// Runs a parsed command. Queries return their value (also written to
/// `var` when given); mutations return 1 on success and 0 when rejected.
pub fn execute<H: Host + ?Sized>(system: &mut TalentSystem, host: &mut H, cmd: &Command) -> i32 {
    match cmd {
        Command::GetPoints { actor, var } => {
            let value = system.get_points(*actor);
            store(host, *var, value)
        }
        Command::SetPoints { actor, value } => system.set_points(*actor, *value) as i32,
        Command::AddPoints { actor, value } => system.add_points(*actor, *value) as i32,
        Command::RemovePoints { actor, value } => system.remove_points(*actor, *value) as i32,
        Command::GetRanks { actor, abbr, var } => {
            let value = system.get_ranks(*actor, abbr);
            store(host, *var, value)
        }
        Command::SetRanks { actor, abbr, value } => system.set_ranks(*actor, abbr, *value) as i32,
        Command::AddRanks { actor, abbr, value } => system.add_ranks(*actor, abbr, *value) as i32,
        Command::RemoveRanks { actor, abbr, value } => {
            system.remove_ranks(*actor, abbr, *value) as i32
        }
        Command::GetScore { actor, abbr, var } => {
            let value = system.get_score(&*host, *actor, abbr);
            store(host, *var, value)
        }
        Command::GetBest { abbr, var } => {
            let value = system.most_talented(&*host, abbr) as i32;
            store(host, *var, value)
        }
        Command::EnemyScore { enemy, abbr, var } => {
            let value = system.enemy_score(*enemy, abbr);
            store(host, *var, value)
        }
        Command::Check(opts) => system.resolve_check(host, opts),
        Command::EnemyTn(opts) => system.enemy_target_number(host, opts),
    }
}

/// Parse and run one line.
pub fn run_line<H: Host + ?Sized>(
    system: &mut TalentSystem,
    host: &mut H,
    line: &str,
) -> Result<i32, CommandError> {
    let cmd = Command::parse(line, &*host)?;
    Ok(execute(system, host, &cmd))
}
