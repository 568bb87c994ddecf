//! Centralized rules and defaults for the Croppler game logic.
//!
//! The attempt limit and exclusion list are part of the game rules; changing
//! them changes what a shared trail means, so they live in code rather than in
//! external assets.

// Game rules ---------------------------------------------------------------
/// Number of guesses a player gets before the game is lost.
pub const MAX_ATTEMPTS: usize = 5;
/// Year the puzzle data is drawn from when no configuration overrides it.
pub const DEFAULT_YEAR: i32 = 2022;
/// Aggregate rows in the export feed that would double count commodities.
pub const DEFAULT_EXCLUDED_COMMODITIES: [&str; 3] = [
    "Total agricultural exports",
    "Total plant products",
    "Total animal products",
];

// Trail marks --------------------------------------------------------------
pub const MARK_CORRECT: &str = "🟢";
pub const MARK_INCORRECT: &str = "🟡";
pub const EMPTY_TRAIL_LABEL: &str = "No guesses yet!";

// Share text ---------------------------------------------------------------
pub const STATUS_SUCCESS: &str = "Success! 🎉";
pub const STATUS_GAME_OVER: &str = "Game Over. ❌";
pub const DEFAULT_SHARE_URL: &str = "https://croppler.streamlit.app/";

// Magnitude formatting -----------------------------------------------------
pub(crate) const BILLION: f64 = 1e9;
