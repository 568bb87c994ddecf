use anyhow::{Context, Result, ensure};
use croppler_game::{
    GameEngine, GamePhase, GameSession, GuessError, MAX_ATTEMPTS, Puzzle, build_state_ranking,
    filter_valid, select_random_state,
};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use std::collections::{HashMap, HashSet};

use crate::cache::MemoCache;
use crate::util::split_csv;

/// Guess used when the dataset offers no wrong answer to pick.
const FALLBACK_WRONG_GUESS: &str = "Atlantis";
const UNIFORM_DRAWS_PER_STATE: usize = 1000;

pub struct ScenarioCtx<'a> {
    pub engine: &'a GameEngine,
    pub seed: u64,
    pub rng: ChaCha20Rng,
    pub puzzles: &'a mut MemoCache<String, Puzzle>,
}

impl ScenarioCtx<'_> {
    fn new_session(&mut self) -> Result<GameSession> {
        self.engine
            .new_session(&mut self.rng)
            .context("could not start a session")
    }

    fn puzzle(&mut self, secret: &str) -> &Puzzle {
        let engine = self.engine;
        self.puzzles
            .get_or_insert_with(secret.to_string(), || engine.build_puzzle(secret))
    }

    fn wrong_guess(&mut self, secret: &str) -> String {
        let wrong: Vec<&String> = self
            .engine
            .guess_options()
            .iter()
            .filter(|state| !state.eq_ignore_ascii_case(secret))
            .collect();
        wrong
            .choose(&mut self.rng)
            .map_or_else(|| FALLBACK_WRONG_GUESS.to_string(), |state| (*state).clone())
    }
}

pub type ScenarioFn = fn(&mut ScenarioCtx<'_>) -> Result<()>;

pub struct LogicScenario {
    pub key: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

const CATALOG: &[LogicScenario] = &[
    LogicScenario {
        key: "smoke",
        description: "Start a session, build its puzzle and guess right first time",
        run: smoke,
    },
    LogicScenario {
        key: "win-second-guess",
        description: "One wrong guess then the secret wins in two attempts",
        run: win_second_guess,
    },
    LogicScenario {
        key: "lose-all-attempts",
        description: "Five wrong guesses lose and further guesses are refused",
        run: lose_all_attempts,
    },
    LogicScenario {
        key: "reset-fresh",
        description: "Restarting a finished game behaves like a new session",
        run: reset_fresh,
    },
    LogicScenario {
        key: "ranking-permutation",
        description: "State ranks form 1..N over states with valid data",
        run: ranking_permutation,
    },
    LogicScenario {
        key: "breakdown-sum",
        description: "Puzzle breakdown totals match the filtered records",
        run: breakdown_sum,
    },
    LogicScenario {
        key: "random-uniform",
        description: "Secret selection is reproducible and close to uniform",
        run: random_uniform,
    },
    LogicScenario {
        key: "share-link",
        description: "Finished games produce share text and an sms: link",
        run: share_link,
    },
];

pub fn get_scenario(name: &str) -> Option<&'static LogicScenario> {
    let name = name.to_lowercase();
    CATALOG.iter().find(|scenario| scenario.key == name)
}

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
}

pub fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        scenarios.extend(CATALOG.iter().map(|scenario| scenario.key.to_string()));
    }
    scenarios
}

fn smoke(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let mut session = ctx.new_session()?;
    let secret = session.secret().to_string();
    let year = ctx.engine.config().year;
    let puzzle = ctx.puzzle(&secret);
    ensure!(
        !puzzle.is_empty(),
        "no valid data available for {secret} in {year}"
    );
    ensure!(puzzle.rank.is_some(), "{secret} has no rank clue");

    let outcome = session.submit_guess(&secret)?;
    ensure!(outcome.phase == GamePhase::Won, "exact guess did not win");
    Ok(())
}

fn win_second_guess(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let mut session = ctx.new_session()?;
    let secret = session.secret().to_string();
    let wrong = ctx.wrong_guess(&secret);

    session.submit_guess(&wrong)?;
    session.submit_guess(&secret.to_uppercase())?;
    ensure!(
        session.trail() == "🟡🟢",
        "unexpected trail {}",
        session.trail()
    );
    ensure!(session.phase() == GamePhase::Won, "expected a win");
    ensure!(session.attempts() == 2, "expected two attempts");
    Ok(())
}

fn lose_all_attempts(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let mut session = ctx.new_session()?;
    let secret = session.secret().to_string();
    for _ in 0..MAX_ATTEMPTS {
        let wrong = ctx.wrong_guess(&secret);
        session.submit_guess(&wrong)?;
    }
    ensure!(session.phase() == GamePhase::Lost, "expected a loss");
    ensure!(
        session.trail() == "🟡".repeat(MAX_ATTEMPTS),
        "unexpected trail {}",
        session.trail()
    );
    ensure!(
        session.submit_guess(&secret) == Err(GuessError::AlreadyCompleted),
        "guess accepted after the game ended"
    );
    Ok(())
}

fn reset_fresh(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let mut session = ctx.new_session()?;
    let secret = session.secret().to_string();
    session.submit_guess(&secret)?;

    ctx.engine.restart(&mut session, &mut ctx.rng)?;
    let fresh = GameSession::new(session.secret());
    ensure!(session == fresh, "restarted session kept residual state");

    let wrong = ctx.wrong_guess(session.secret());
    let outcome = session.submit_guess(&wrong)?;
    ensure!(
        outcome.attempts == 1 && outcome.phase == GamePhase::InProgress,
        "first guess after restart was {outcome:?}"
    );
    Ok(())
}

fn ranking_permutation(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let engine = ctx.engine;
    let config = engine.config();
    let records = engine.table().records();
    let ranking = build_state_ranking(records, config.year, &config.excluded_commodities);
    let expected: HashSet<&str> = filter_valid(records, config.year, None, &config.excluded_commodities)
        .into_iter()
        .map(|record| record.state.as_str())
        .collect();

    ensure!(
        ranking.len() == expected.len(),
        "ranked {} states, expected {}",
        ranking.len(),
        expected.len()
    );
    for (position, entry) in ranking.entries().iter().enumerate() {
        ensure!(
            entry.rank == position + 1,
            "{} has rank {} at position {}",
            entry.state,
            entry.rank,
            position + 1
        );
    }
    Ok(())
}

fn breakdown_sum(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let engine = ctx.engine;
    let session = ctx.new_session()?;
    let secret = session.secret().to_string();
    let total = ctx.puzzle(&secret).total_value();

    let config = engine.config();
    let expected: f64 = filter_valid(
        engine.table().records(),
        config.year,
        Some(&secret),
        &config.excluded_commodities,
    )
    .iter()
    .filter_map(|record| record.value)
    .sum();
    ensure!(
        (total - expected).abs() <= expected.abs() * 1e-9,
        "breakdown total {total} != filtered total {expected}"
    );
    Ok(())
}

fn random_uniform(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let engine = ctx.engine;
    let states = engine.guess_options();
    let draws = states.len() * UNIFORM_DRAWS_PER_STATE;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for _ in 0..draws {
        let picked = select_random_state(states, &mut ctx.rng)?;
        *counts.entry(picked).or_default() += 1;
    }
    for state in states {
        let count = counts.get(state.as_str()).copied().unwrap_or_default();
        ensure!(
            (700..=1300).contains(&count),
            "{state} drawn {count} times, expected about {UNIFORM_DRAWS_PER_STATE} (seed {})",
            ctx.seed
        );
    }
    Ok(())
}

fn share_link(ctx: &mut ScenarioCtx<'_>) -> Result<()> {
    let mut session = ctx.new_session()?;
    let secret = session.secret().to_string();
    while !session.is_completed() {
        let wrong = ctx.wrong_guess(&secret);
        session.submit_guess(&wrong)?;
    }
    let share = ctx.engine.share_message(&session);
    ensure!(
        share.text.starts_with("Game Over. ❌"),
        "unexpected status in {}",
        share.text
    );
    ensure!(
        share.text.contains(&format!("The hidden state was {secret}.")),
        "secret missing from {}",
        share.text
    );
    ensure!(
        share.sms_uri.starts_with(&format!("sms:{}?body=", ctx.engine.config().share.recipient)),
        "malformed link {}",
        share.sms_uri
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(get_scenario("SMOKE").is_some());
        assert!(get_scenario("missing").is_none());
    }

    #[test]
    fn all_expands_to_catalog() {
        let scenarios = expand_scenarios("all,smoke");
        assert_eq!(scenarios.len(), CATALOG.len() + 1);
        assert_eq!(scenarios[0], "smoke");
    }
}
