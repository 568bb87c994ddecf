//! Croppler Game Engine
//!
//! Platform-agnostic core logic for Croppler, the game where players guess a
//! US state from its agricultural export breakdown.
//! This crate provides the aggregation and game rules without UI or
//! platform-specific dependencies.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod data;
pub mod numbers;
pub mod puzzle;
pub mod session;
pub mod share;

use log::{debug, info};
use rand::Rng;
use thiserror::Error;

// Re-export commonly used types
pub use aggregate::{
    CommodityBreakdown, InputError, RankedState, StateRanking, build_commodity_breakdown,
    build_state_ranking, commodity_breakdown_for, distinct_states, filter_valid, is_valid_record,
    select_random_state,
};
pub use config::{GameConfig, SecretSource, ShareConfig};
pub use constants::MAX_ATTEMPTS;
pub use data::{DataError, TradeRecord, TradeTable};
pub use numbers::format_magnitude;
pub use puzzle::{BreakdownRow, Puzzle};
pub use session::{GamePhase, GameSession, GuessError, GuessMark, GuessOutcome};
pub use share::{ShareMessage, format_share_message, percent_encode, sms_uri};

/// Trait for abstracting dataset loading
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the trade table from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be read or parsed.
    fn load_table(&self) -> Result<TradeTable, Self::Error>;
}

/// Loader over a table that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    table: TradeTable,
}

impl StaticLoader {
    #[must_use]
    pub const fn new(table: TradeTable) -> Self {
        Self { table }
    }
}

impl DataLoader for StaticLoader {
    type Error = std::convert::Infallible;

    fn load_table(&self) -> Result<TradeTable, Self::Error> {
        Ok(self.table.clone())
    }
}

/// Errors raised while setting up a [`GameEngine`].
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to load trade data: {0}")]
    Load(#[source] E),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Game engine binding a loaded dataset to configuration.
///
/// The engine holds no per-player state; every player gets their own
/// [`GameSession`] from [`GameEngine::new_session`].
#[derive(Debug, Clone)]
pub struct GameEngine {
    table: TradeTable,
    config: GameConfig,
    states: Vec<String>,
}

impl GameEngine {
    #[must_use]
    pub fn new(table: TradeTable, config: GameConfig) -> Self {
        let states = distinct_states(table.records());
        Self {
            table,
            config,
            states,
        }
    }

    /// Load the dataset through `loader` and build an engine around it.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader fails, if a fixed secret is blank, or if
    /// the configuration asks for random secrets and the dataset has no states
    /// to choose from.
    pub fn load<L: DataLoader>(loader: &L, config: GameConfig) -> Result<Self, EngineError<L::Error>> {
        let table = loader.load_table().map_err(EngineError::Load)?;
        let engine = Self::new(table, config);
        match &engine.config.secret {
            SecretSource::Fixed { state } if state.trim().is_empty() => {
                return Err(InputError::BlankSecret.into());
            }
            SecretSource::Random if engine.states.is_empty() => {
                return Err(InputError::NoCandidateStates.into());
            }
            _ => {}
        }
        info!(
            "engine ready: {} records, {} states, year {}",
            engine.table.len(),
            engine.states.len(),
            engine.config.year
        );
        Ok(engine)
    }

    #[must_use]
    pub const fn table(&self) -> &TradeTable {
        &self.table
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// State names a player may pick from, in dataset order.
    #[must_use]
    pub fn guess_options(&self) -> &[String] {
        &self.states
    }

    /// Choose a secret according to the configured [`SecretSource`].
    ///
    /// A fixed secret is matched case-insensitively against the dataset so the
    /// breakdown uses the dataset's spelling; an unknown fixed name is kept as is.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NoCandidateStates`] if a random secret is requested
    /// and the dataset has no states, and [`InputError::BlankSecret`] if the
    /// fixed secret is blank.
    pub fn select_secret<R>(&self, rng: &mut R) -> Result<String, InputError>
    where
        R: Rng + ?Sized,
    {
        let secret = match &self.config.secret {
            SecretSource::Fixed { state } if state.trim().is_empty() => {
                return Err(InputError::BlankSecret);
            }
            SecretSource::Fixed { state } => {
                let wanted = state.trim().to_lowercase();
                self.states
                    .iter()
                    .find(|candidate| candidate.to_lowercase() == wanted)
                    .cloned()
                    .unwrap_or_else(|| state.trim().to_string())
            }
            SecretSource::Random => select_random_state(&self.states, rng)?.to_string(),
        };
        debug!("secret selected from {} candidate states", self.states.len());
        Ok(secret)
    }

    #[must_use]
    pub fn build_puzzle(&self, secret: &str) -> Puzzle {
        Puzzle::build(&self.table, secret, &self.config)
    }

    /// Create a fresh session with its own secret.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret can be selected.
    pub fn new_session<R>(&self, rng: &mut R) -> Result<GameSession, InputError>
    where
        R: Rng + ?Sized,
    {
        self.select_secret(rng).map(GameSession::new)
    }

    /// Reset `session` for another round with a newly selected secret.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret can be selected; the session is left as is.
    pub fn restart<R>(&self, session: &mut GameSession, rng: &mut R) -> Result<(), InputError>
    where
        R: Rng + ?Sized,
    {
        let secret = self.select_secret(rng)?;
        session.reset(Some(secret));
        Ok(())
    }

    #[must_use]
    pub fn share_message(&self, session: &GameSession) -> ShareMessage {
        format_share_message(session, session.secret(), &self.config.share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[derive(Debug, Error)]
    #[error("feed offline")]
    struct OfflineError;

    struct OfflineLoader;

    impl DataLoader for OfflineLoader {
        type Error = OfflineError;

        fn load_table(&self) -> Result<TradeTable, Self::Error> {
            Err(OfflineError)
        }
    }

    fn fixture() -> TradeTable {
        TradeTable::from_records(vec![
            TradeRecord::new("Iowa", 2022, "Corn", Some(10.0)),
            TradeRecord::new("Texas", 2022, "Beef", Some(20.0)),
            TradeRecord::new("Maine", 2022, "Blueberries", Some(5.0)),
        ])
    }

    #[test]
    fn engine_creates_independent_sessions() {
        let engine = GameEngine::load(&StaticLoader::new(fixture()), GameConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0xC0FFEE);
        let mut first = engine.new_session(&mut rng).unwrap();
        let second = engine.new_session(&mut rng).unwrap();

        first.submit_guess("Nowhere").unwrap();
        assert_eq!(first.attempts(), 1);
        assert_eq!(second.attempts(), 0);
        assert!(engine.guess_options().contains(&first.secret().to_string()));
    }

    #[test]
    fn fixed_secret_uses_dataset_spelling() {
        let config = GameConfig::default().with_secret(SecretSource::Fixed {
            state: " texas".to_string(),
        });
        let engine = GameEngine::new(fixture(), config);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let session = engine.new_session(&mut rng).unwrap();
        assert_eq!(session.secret(), "Texas");
        assert_eq!(engine.build_puzzle(session.secret()).rank, Some(1));
    }

    #[test]
    fn restart_replaces_secret_and_history() {
        let engine = GameEngine::new(fixture(), GameConfig::default());
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let mut session = engine.new_session(&mut rng).unwrap();
        let secret = session.secret().to_string();
        session.submit_guess(&secret).unwrap();
        assert!(session.is_completed());

        engine.restart(&mut session, &mut rng).unwrap();
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.phase(), GamePhase::InProgress);
    }

    #[test]
    fn empty_dataset_fails_setup() {
        let err = GameEngine::load(&StaticLoader::default(), GameConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Input(InputError::NoCandidateStates)));

        let err = GameEngine::load(&OfflineLoader, GameConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "failed to load trade data: feed offline");
    }

    #[test]
    fn blank_fixed_secret_is_rejected() {
        for blank in ["", "   "] {
            let config = GameConfig::default().with_secret(SecretSource::Fixed {
                state: blank.to_string(),
            });
            let err = GameEngine::load(&StaticLoader::new(fixture()), config.clone()).unwrap_err();
            assert!(matches!(err, EngineError::Input(InputError::BlankSecret)));

            let engine = GameEngine::new(fixture(), config);
            let mut rng = ChaCha20Rng::seed_from_u64(2);
            assert_eq!(engine.new_session(&mut rng), Err(InputError::BlankSecret));
        }
    }

    #[test]
    fn share_message_uses_configured_link() {
        let mut config = GameConfig::default();
        config.share.url = "https://example.test/".to_string();
        let engine = GameEngine::new(fixture(), config);
        let mut session = GameSession::new("Iowa");
        session.submit_guess("Iowa").unwrap();
        let share = engine.share_message(&session);
        assert!(share.text.ends_with("https://example.test/"));
        assert!(share.text.contains("The hidden state was Iowa."));
    }
}
