//! The guessing game state machine.
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::constants::{EMPTY_TRAIL_LABEL, MARK_CORRECT, MARK_INCORRECT, MAX_ATTEMPTS};

/// Outcome mark recorded for one guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuessMark {
    Correct,
    Incorrect,
}

impl GuessMark {
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Correct => MARK_CORRECT,
            Self::Incorrect => MARK_INCORRECT,
        }
    }
}

impl std::fmt::Display for GuessMark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.emoji())
    }
}

/// Lifecycle phase of a [`GameSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    InProgress,
    Won,
    Lost,
}

impl GamePhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Reasons a guess was not recorded. Both leave the session untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GuessError {
    #[error("You already completed the game!")]
    AlreadyCompleted,
    #[error("a guess must name a state")]
    EmptyGuess,
}

/// What a recorded guess did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuessOutcome {
    pub mark: GuessMark,
    pub phase: GamePhase,
    pub attempts: usize,
}

/// One player's game: the secret, the marks so far and the current phase.
///
/// The attempt count is the history length, so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSession {
    secret: String,
    history: Vec<GuessMark>,
    phase: GamePhase,
}

impl GameSession {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            history: Vec::with_capacity(MAX_ATTEMPTS),
            phase: GamePhase::InProgress,
        }
    }

    /// Record a guess against the secret.
    ///
    /// Guesses are trimmed and compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`GuessError::AlreadyCompleted`] once the game is won or lost,
    /// and [`GuessError::EmptyGuess`] for a blank guess. Neither changes state.
    pub fn submit_guess(&mut self, guess: &str) -> Result<GuessOutcome, GuessError> {
        if self.phase.is_terminal() {
            return Err(GuessError::AlreadyCompleted);
        }
        let guess = guess.trim();
        if guess.is_empty() {
            return Err(GuessError::EmptyGuess);
        }

        let mark = if guess.to_lowercase() == self.secret.to_lowercase() {
            GuessMark::Correct
        } else {
            GuessMark::Incorrect
        };
        self.history.push(mark);
        self.phase = match mark {
            GuessMark::Correct => GamePhase::Won,
            GuessMark::Incorrect if self.history.len() >= MAX_ATTEMPTS => GamePhase::Lost,
            GuessMark::Incorrect => GamePhase::InProgress,
        };
        debug!(
            "guess {}/{MAX_ATTEMPTS} recorded as {mark:?}, phase {:?}",
            self.history.len(),
            self.phase
        );

        Ok(GuessOutcome {
            mark,
            phase: self.phase,
            attempts: self.history.len(),
        })
    }

    /// Start over, optionally with a new secret.
    pub fn reset(&mut self, secret: Option<String>) {
        if let Some(secret) = secret {
            self.secret = secret;
        }
        self.history.clear();
        self.phase = GamePhase::InProgress;
        debug!("session reset");
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn remaining_attempts(&self) -> usize {
        MAX_ATTEMPTS.saturating_sub(self.history.len())
    }

    #[must_use]
    pub fn history(&self) -> &[GuessMark] {
        &self.history
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.phase.is_terminal()
    }

    #[must_use]
    pub fn is_won(&self) -> bool {
        self.phase == GamePhase::Won
    }

    /// Marks joined with no separator, as used in share text.
    #[must_use]
    pub fn trail(&self) -> String {
        self.history.iter().map(|mark| mark.emoji()).collect()
    }

    /// Marks joined by spaces for on-screen display.
    #[must_use]
    pub fn trail_display(&self) -> String {
        if self.history.is_empty() {
            return EMPTY_TRAIL_LABEL.to_string();
        }
        self.history
            .iter()
            .map(|mark| mark.emoji())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn attempts_label(&self) -> String {
        format!("Attempts: {}/{MAX_ATTEMPTS}", self.history.len())
    }
}
