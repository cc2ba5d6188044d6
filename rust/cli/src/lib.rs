use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bgo_engine::economics::{PercentBasis, PrizeModel, RoomEconomicsResult};
use bgo_engine::logger::PreviewLogger;
use bgo_engine::pattern::PatternTag;
use bgo_engine::room::{RoomDraft, TicketPricing, UnbalancedPolicy, DEFAULT_TICKETS_BASE};
use bgo_engine::rounds::RoundConfig;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};

pub mod config;
pub mod ui;

use config::Config;

const EXIT_INVALID: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// Runs the CLI with provided args, writing to the given writers.
/// Returns the intended process exit code.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    run_with_env(args, |key| std::env::var(key).ok(), out, err)
}

/// Like [`run`], reading `BGO_*` settings through `lookup` instead of the
/// process environment.
pub fn run_with_env<I, S, F>(args: I, lookup: F, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
    let cli = match BgoCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = write!(out, "{}", e.render());
                    0
                }
                _ => {
                    let _ = write!(err, "{}", e.render());
                    EXIT_USAGE
                }
            };
        }
    };

    let cfg = match config::load_from(lookup) {
        Ok(cfg) => cfg,
        Err(e) => {
            let _ = ui::write_error(err, &format!("invalid configuration: {}", e));
            return EXIT_USAGE;
        }
    };

    let outcome = match cli.cmd {
        Commands::Preview(args) => preview(args, &cfg, out, err),
        Commands::Payload(args) => payload(args, &cfg, out, err),
        Commands::Patterns => {
            for p in PatternTag::ALL {
                let _ = writeln!(out, "{:<12} {}", p.as_str(), p.label());
            }
            Ok(())
        }
        Commands::Cfg => print_json(out, &cfg),
    };

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            let _ = ui::write_error(err, e.message());
            e.exit_code()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bgo", version, about = "Bingo room economics preview")]
struct BgoCli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show how a room's pot splits into house cut and round prizes
    Preview(PreviewArgs),
    /// Validate a room file and print the room-creation payload
    Payload(PayloadArgs),
    /// List the round patterns
    Patterns,
    /// Print the effective configuration
    Cfg,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Room draft file (TOML, or JSON when the extension is .json)
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, allow_negative_numbers = true)]
    price: Option<f64>,
    /// Fixed prize total; without --price the price is derived from it
    #[arg(long = "prize-total", allow_negative_numbers = true)]
    prize_total: Option<f64>,
    /// Tickets the derived price is spread over (default 100)
    #[arg(long = "tickets-base", requires = "prize_total")]
    tickets_base: Option<u32>,
    #[arg(long = "min-players")]
    min_players: Option<u32>,
    #[arg(long, allow_negative_numbers = true)]
    commission: Option<f64>,
    /// Round as pattern:percent, repeatable, in calling order
    #[arg(long = "round")]
    rounds: Vec<String>,
    /// prize_pool or raw_pot
    #[arg(long)]
    basis: Option<String>,
    #[arg(long)]
    json: bool,
    /// Append the preview to a JSONL log
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PayloadArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    basis: Option<String>,
    /// Submit even when round percentages miss their target
    #[arg(long = "allow-unbalanced")]
    allow_unbalanced: bool,
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Invalid(String),
}

impl CliError {
    fn message(&self) -> &str {
        match self {
            CliError::Usage(m) | CliError::Invalid(m) => m,
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            CliError::Invalid(_) => EXIT_INVALID,
        }
    }
}

fn invalid<E: std::fmt::Display>(e: E) -> CliError {
    CliError::Invalid(e.to_string())
}

fn preview(args: PreviewArgs, cfg: &Config, out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let mut draft = match &args.input {
        Some(path) => read_draft(path, cfg)?,
        None => base_draft(cfg),
    };
    match (args.price, args.prize_total) {
        (Some(ticket_price), Some(prize_total)) => {
            draft.pricing = TicketPricing::FixedPrize { prize_total, ticket_price };
        }
        (Some(ticket_price), None) => draft.pricing = TicketPricing::Manual { ticket_price },
        (None, Some(prize_total)) => {
            draft.pricing = TicketPricing::FromPrize {
                prize_total,
                tickets_base: args.tickets_base.unwrap_or(DEFAULT_TICKETS_BASE),
            };
        }
        (None, None) => {}
    }
    if let Some(n) = args.min_players {
        draft.min_players = n;
    }
    if let Some(c) = args.commission {
        draft.commission_percent = c;
    }
    if !args.rounds.is_empty() {
        draft.rounds = args
            .rounds
            .iter()
            .map(|s| s.parse::<RoundConfig>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
    }

    let basis = resolve_basis(args.basis.as_deref(), cfg)?;
    let input = draft.economics_input().map_err(invalid)?;
    let result = draft.preview(basis).map_err(invalid)?;

    if let Some(path) = &args.log {
        PreviewLogger::open(path)
            .and_then(|mut logger| logger.record(&input, &result))
            .map_err(|e| CliError::Usage(format!("cannot write log {}: {}", path.display(), e)))?;
    }

    if args.json {
        print_json(out, &result.for_display())?;
    } else {
        print_summary(out, &draft, &result);
    }
    for w in &result.warnings {
        let _ = ui::write_warning(err, &w.to_string());
    }
    Ok(())
}

fn payload(args: PayloadArgs, cfg: &Config, out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let draft = read_draft(&args.input, cfg)?;
    let mut policy = cfg.policy();
    policy.basis = resolve_basis(args.basis.as_deref(), cfg)?;
    if args.allow_unbalanced {
        policy.unbalanced = UnbalancedPolicy::Warn;
    }

    let submission = draft.prepare_submission(policy).map_err(invalid)?;
    print_json(out, &submission.payload)?;
    for w in &submission.warnings {
        let _ = ui::write_warning(err, &w.to_string());
    }
    Ok(())
}

fn resolve_basis(flag: Option<&str>, cfg: &Config) -> Result<PercentBasis, CliError> {
    match flag {
        Some(s) => s.parse().map_err(CliError::Usage),
        None => Ok(cfg.basis),
    }
}

/// Draft carrying the configured currency and commission.
fn base_draft(cfg: &Config) -> RoomDraft {
    RoomDraft {
        currency: cfg.currency,
        commission_percent: cfg.commission_percent,
        ..RoomDraft::default()
    }
}

/// Reads a room file over [`base_draft`]: top-level keys present in the file
/// replace the configured values, absent ones keep them.
fn read_draft(path: &Path, cfg: &Config) -> Result<RoomDraft, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Usage(format!("cannot read {}: {}", path.display(), e)))?;
    let bad_file = |e: String| CliError::Invalid(format!("Invalid room file {}: {}", path.display(), e));
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let file: serde_json::Value = if is_json {
        serde_json::from_str(&text).map_err(|e| bad_file(e.to_string()))?
    } else {
        toml::from_str(&text).map_err(|e| bad_file(e.to_string()))?
    };
    let serde_json::Value::Object(fields) = file else {
        return Err(bad_file("expected a table of room fields".into()));
    };

    let mut merged = serde_json::to_value(base_draft(cfg)).map_err(invalid)?;
    if let serde_json::Value::Object(base) = &mut merged {
        base.extend(fields);
    }
    serde_json::from_value(merged).map_err(|e| bad_file(e.to_string()))
}

fn print_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(invalid)?;
    let _ = writeln!(out, "{}", text);
    Ok(())
}

fn print_summary(out: &mut dyn Write, draft: &RoomDraft, result: &RoomEconomicsResult) {
    let cur = draft.currency;
    let name = draft.name.trim();
    if !name.is_empty() {
        let _ = writeln!(out, "Room: {}", name);
    }
    if let Some(price) = draft.effective_ticket_price() {
        let _ = writeln!(out, "Ticket price: {} x {} players", cur.format(price), draft.min_players);
    }
    let _ = writeln!(out, "Base pot:   {}", cur.format(result.base_pot));
    match result.prize_model {
        PrizeModel::Percent => {
            let _ = writeln!(
                out,
                "House cut:  {} ({}%)",
                cur.format(result.house_cut),
                draft.commission_percent
            );
            let _ = writeln!(out, "Prize pool: {}", cur.format(result.prize_pool));
            let _ = writeln!(out, "Rounds ({}):", result.basis.as_str());
        }
        PrizeModel::Fixed => {
            let _ = writeln!(out, "House cut:  {}", cur.format(result.house_cut));
            let _ = writeln!(out, "Prize pool: {} (fixed)", cur.format(result.prize_pool));
            let _ = writeln!(out, "Rounds (fixed prize):");
        }
    }
    for r in &result.per_round_prize {
        let _ = writeln!(
            out,
            "  {}. {:<12} {:>6}%  {}",
            r.round,
            r.pattern.as_str(),
            r.percent,
            cur.format(r.amount)
        );
    }
}
