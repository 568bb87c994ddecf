use croppler_game::{
    GameConfig, GameEngine, GamePhase, GameSession, GuessError, GuessMark, MAX_ATTEMPTS,
    SecretSource, StaticLoader, TradeRecord, TradeTable, format_magnitude, select_random_state,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn second_guess_wins() {
    let mut session = GameSession::new("California");
    session.submit_guess("Texas").unwrap();
    session.submit_guess("California").unwrap();

    assert_eq!(session.history(), &[GuessMark::Incorrect, GuessMark::Correct]);
    let marks: Vec<&str> = session.history().iter().map(|m| m.emoji()).collect();
    assert_eq!(marks, vec!["🟡", "🟢"]);
    assert_eq!(session.phase(), GamePhase::Won);
    assert_eq!(session.attempts(), 2);
}

#[test]
fn five_wrong_guesses_lose() {
    let mut session = GameSession::new("Iowa");
    for guess in ["Ohio", "Texas", "Maine", "Utah", "Idaho"] {
        session.submit_guess(guess).unwrap();
    }
    assert_eq!(session.phase(), GamePhase::Lost);
    assert_eq!(session.attempts(), MAX_ATTEMPTS);
    assert_eq!(session.trail(), "🟡🟡🟡🟡🟡");
    assert_eq!(session.submit_guess("Iowa"), Err(GuessError::AlreadyCompleted));
}

#[test]
fn magnitudes_follow_published_labels() {
    let table = TradeTable::from_records(vec![
        TradeRecord::new("Ohio", 2022, "Corn", Some(5e9)),
        TradeRecord::new("Ohio", 2022, "Eggs", Some(2.5e6)),
    ]);
    let engine = GameEngine::new(table, GameConfig::default());
    let puzzle = engine.build_puzzle("Ohio");
    let corn = puzzle.rows.iter().find(|row| row.commodity == "Corn").unwrap();
    let eggs = puzzle.rows.iter().find(|row| row.commodity == "Eggs").unwrap();
    assert_eq!(corn.formatted, "$5.00B");
    assert_eq!(eggs.formatted, "$2500000.00M");
    assert_eq!(format_magnitude(5e9), corn.formatted);
}

#[test]
fn random_selection_is_reproducible_and_near_uniform() {
    let states: Vec<String> = ["A", "B", "C"].iter().map(ToString::to_string).collect();
    let draw = |seed: u64| {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        (0..1000)
            .map(|_| select_random_state(&states, &mut rng).unwrap().to_string())
            .collect::<Vec<_>>()
    };

    let first = draw(2022);
    assert_eq!(first, draw(2022));

    for state in &states {
        let count = first.iter().filter(|picked| *picked == state).count();
        assert!(
            (250..=420).contains(&count),
            "state {state} drawn {count} times out of 1000"
        );
    }
}

#[test]
fn reset_after_terminal_matches_fresh_session() {
    let mut played = GameSession::new("Iowa");
    played.submit_guess("Iowa").unwrap();
    played.reset(None);

    let mut fresh = GameSession::new("Iowa");
    assert_eq!(played, fresh);
    assert_eq!(played.submit_guess("Ohio"), fresh.submit_guess("Ohio"));
    assert_eq!(played, fresh);
}

#[test]
fn engine_from_csv_plays_full_round() {
    let csv = "State,Year,Commodity,Value\n\
               Iowa,2022,Corn,8000000000\n\
               Iowa,2022,Total agricultural exports,9000000000\n\
               Texas,2022,Beef,3000000000\n\
               Texas,2022,Cotton,\n\
               Maine,2022,Blueberries,120\n";
    let table = TradeTable::from_csv(csv).unwrap();
    let config = GameConfig::default().with_secret(SecretSource::Fixed {
        state: "Texas".to_string(),
    });
    let engine = GameEngine::load(&StaticLoader::new(table), config).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(5);
    let mut session = engine.new_session(&mut rng).unwrap();

    let puzzle = engine.build_puzzle(session.secret());
    assert_eq!(puzzle.rank, Some(2));
    assert_eq!(puzzle.rows.len(), 1);
    assert_eq!(engine.guess_options(), &["Iowa", "Texas", "Maine"]);

    session.submit_guess("Iowa").unwrap();
    let outcome = session.submit_guess("TEXAS").unwrap();
    assert_eq!(outcome.phase, GamePhase::Won);

    let share = engine.share_message(&session);
    assert!(share.text.starts_with("Success! 🎉 The hidden state was Texas."));
    assert!(share.sms_uri.starts_with("sms:?body="));
}
