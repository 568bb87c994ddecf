mod assets;
mod cache;
mod logic;
mod play;
mod scenarios;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use croppler_game::GameEngine;
use std::fs::File;
use std::io::{BufWriter, Write, stdin, stdout};
use std::path::PathBuf;
use std::time::Instant;

use assets::{ConfigOverrides, DatasetLoader, DatasetSource, load_config};
use logic::{LogicTester, ScenarioResult, resolve_seed_inputs};
use scenarios::{expand_scenarios, get_scenario, list_scenarios};
use util::split_csv;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// Run logic scenarios against the game core (fast, scripted)
    Logic,
    /// Play interactively in the terminal
    Play,
}

#[derive(Debug, Parser)]
#[command(name = "croppler-tester", version)]
#[command(about = "Scenario runner and terminal front-end for the Croppler guessing game")]
struct Args {
    /// Run mode: logic scenarios or interactive play
    #[arg(long, value_enum, default_value_t = RunMode::Logic)]
    mode: RunMode,

    /// Scenarios to run (comma-separated, `all` for the full catalog)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; `time` uses the clock). Play mode uses
    /// the first seed and defaults to `time`.
    #[arg(long)]
    seeds: Option<String>,

    /// Number of iterations per scenario and seed (logic mode only)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Trade dataset (CSV, or JSON when the extension is .json); defaults to the bundled sample
    #[arg(long)]
    data: Option<PathBuf>,

    /// Game configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Always use this state as the secret
    #[arg(long)]
    secret: Option<String>,

    /// Year to draw the puzzle data from
    #[arg(long)]
    year: Option<i32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let engine = build_engine(&args)?;

    match args.mode {
        RunMode::Logic => run_logic(&args, &engine),
        RunMode::Play => run_interactive(&args, &engine),
    }
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

/// A JSON report written to stdout must be the only thing on stdout.
fn json_on_stdout(args: &Args) -> bool {
    args.report == "json" && args.output.is_none()
}

fn status_line(args: &Args, line: impl std::fmt::Display) {
    if json_on_stdout(args) {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn announce_banner(args: &Args, loader: &DatasetLoader) {
    status_line(args, "🎮 Croppler Automated Tester".bright_cyan().bold());
    status_line(args, "================================".cyan());
    match loader.source() {
        DatasetSource::Bundled => status_line(args, "Dataset: bundled sample"),
        DatasetSource::File(path) => status_line(args, format!("Dataset: {}", path.display())),
    }
}

fn build_engine(args: &Args) -> Result<GameEngine> {
    let overrides = ConfigOverrides {
        secret: args.secret.clone(),
        year: args.year,
    };
    let config = load_config(args.config.as_deref(), &overrides)?;
    let loader = DatasetLoader::new(args.data.clone());
    if matches!(args.mode, RunMode::Logic) {
        announce_banner(args, &loader);
    }
    GameEngine::load(&loader, config).context("failed to set up the game")
}

fn run_logic(args: &Args, engine: &GameEngine) -> Result<()> {
    let start_time = Instant::now();
    let seed_tokens = split_csv(args.seeds.as_deref().unwrap_or_default());
    let seeds = resolve_seed_inputs(&seed_tokens)?;

    status_line(args, "🧠 Running Logic Tests".bright_yellow().bold());
    status_line(args, "-".repeat(30).yellow());

    let mut tester = LogicTester::new(engine, args.verbose);
    let mut results: Vec<ScenarioResult> = Vec::new();
    for scenario_name in expand_scenarios(&args.scenarios) {
        if let Some(scenario) = get_scenario(&scenario_name) {
            results.extend(tester.run_scenario(scenario, &seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    write_reports(args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn run_interactive(args: &Args, engine: &GameEngine) -> Result<()> {
    let seed_tokens = split_csv(args.seeds.as_deref().unwrap_or("time"));
    let seed = resolve_seed_inputs(&seed_tokens)?
        .first()
        .copied()
        .unwrap_or(logic::seeds::DEFAULT_SEED);
    log::debug!("interactive session seed {seed}");

    let mut out = stdout().lock();
    let summary = play::run_play(engine, seed, stdin().lock(), &mut out)?;
    log::info!("played {} rounds, won {}", summary.rounds, summary.wins);
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Croppler Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            mode: RunMode::Logic,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: None,
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            data: None,
            config: None,
            secret: None,
            year: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "croppler-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn secret_override_reaches_engine() {
        let mut args = base_args();
        args.secret = Some("iowa".to_string());
        let engine = build_engine(&args).unwrap();
        let mut rng = <rand_chacha::ChaCha20Rng as rand::SeedableRng>::seed_from_u64(3);
        assert_eq!(engine.select_secret(&mut rng).unwrap(), "Iowa");
    }

    #[test]
    fn json_without_output_keeps_stdout_for_the_report() {
        let mut args = base_args();
        assert!(json_on_stdout(&args));
        args.output = Some(temp_path("json"));
        assert!(!json_on_stdout(&args));
        args.output = None;
        args.report = "console".to_string();
        assert!(!json_on_stdout(&args));
    }

    #[test]
    fn reports_write_to_output_file() {
        let mut args = base_args();
        let path = temp_path("markdown");
        args.output = Some(path.clone());
        args.report = "markdown".to_string();
        write_reports(&args, &[], Instant::now()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("_No scenarios executed._"));
    }
}
