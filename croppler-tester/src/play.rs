//! Terminal front-end: shows the puzzle, reads guesses line by line and
//! prints the trail and share link when a round ends.

use anyhow::{Context, Result};
use colored::Colorize;
use croppler_game::{GameEngine, GameSession, GuessError, MAX_ATTEMPTS, Puzzle};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::io::{BufRead, Write};

use crate::cache::MemoCache;

const QUIT_COMMANDS: [&str; 2] = ["quit", "exit"];

/// Totals for one interactive run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaySummary {
    pub rounds: usize,
    pub wins: usize,
}

pub fn run_play<R, W>(engine: &GameEngine, seed: u64, input: R, out: &mut W) -> Result<PlaySummary>
where
    R: BufRead,
    W: Write,
{
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut puzzles: MemoCache<String, Puzzle> = MemoCache::new();
    let mut session = engine
        .new_session(&mut rng)
        .context("could not pick a hidden state")?;
    let mut lines = input.lines();
    let mut summary = PlaySummary::default();

    'rounds: loop {
        let puzzle = puzzles.get_or_insert_with(session.secret().to_string(), || {
            engine.build_puzzle(session.secret())
        });
        show_puzzle(out, puzzle, engine.guess_options())?;

        while !session.is_completed() {
            write!(out, "Your guess: ")?;
            out.flush()?;
            let Some(line) = lines.next().transpose()? else {
                break 'rounds;
            };
            if QUIT_COMMANDS.contains(&line.trim().to_lowercase().as_str()) {
                break 'rounds;
            }
            submit(out, &mut session, &line)?;
        }

        summary.rounds += 1;
        if session.is_won() {
            summary.wins += 1;
        }
        show_result(out, engine, &session)?;

        write!(out, "Play again? [y/N] ")?;
        out.flush()?;
        let again = lines
            .next()
            .transpose()?
            .is_some_and(|line| line.trim().eq_ignore_ascii_case("y"));
        if !again {
            break;
        }
        engine.restart(&mut session, &mut rng)?;
        writeln!(out)?;
    }

    writeln!(out, "Thanks for playing! Rounds: {}, wins: {}", summary.rounds, summary.wins)?;
    Ok(summary)
}

fn show_puzzle(out: &mut impl Write, puzzle: &Puzzle, options: &[String]) -> Result<()> {
    writeln!(out, "{}", "🌾🍎 Croppler 🐮🌱".bright_green().bold())?;
    writeln!(out, "The game about US agriculture.")?;
    writeln!(out)?;
    writeln!(
        out,
        "Instructions: Guess which state exported these agriculture products!"
    )?;
    if let Some(clue) = puzzle.clue() {
        writeln!(out, "Clue 🌟: {clue}")?;
    }
    writeln!(out)?;

    if puzzle.is_empty() {
        writeln!(
            out,
            "{}",
            format!("No valid data available for the hidden state in {}.", puzzle.year).yellow()
        )?;
    } else {
        let width = puzzle
            .rows
            .iter()
            .map(|row| row.commodity.chars().count())
            .max()
            .unwrap_or_default();
        for row in &puzzle.rows {
            writeln!(out, "  {:<width$}  {}", row.commodity, row.formatted)?;
        }
    }
    writeln!(out)?;
    writeln!(out, "You have five attempts to guess the hidden state name.")?;
    writeln!(out, "States: {}", options.join(", "))?;
    Ok(())
}

fn submit(out: &mut impl Write, session: &mut GameSession, guess: &str) -> Result<()> {
    match session.submit_guess(guess) {
        Ok(outcome) => {
            log::debug!("guess recorded: {outcome:?}");
        }
        Err(GuessError::EmptyGuess) => {
            writeln!(out, "Please enter a state name.")?;
            return Ok(());
        }
        Err(GuessError::AlreadyCompleted) => {
            writeln!(out, "{}", "You already completed the game! 🎉".yellow())?;
        }
    }
    writeln!(out, "Your guesses so far: {}", session.trail_display())?;
    writeln!(out, "{}", session.attempts_label())?;
    Ok(())
}

fn show_result(out: &mut impl Write, engine: &GameEngine, session: &GameSession) -> Result<()> {
    writeln!(out)?;
    if session.is_won() {
        writeln!(out, "🎉 Success! The hidden state was {}.", session.secret())?;
    } else {
        writeln!(out, "❌ Game over! The hidden state was {}.", session.secret())?;
    }
    writeln!(out, "Your performance: {}", session.trail_display())?;
    writeln!(out, "Attempts used: {}/{MAX_ATTEMPTS}", session.attempts())?;

    let share = engine.share_message(session);
    writeln!(out, "Share your results via SMS: {}", share.sms_uri)?;
    Ok(())
}
