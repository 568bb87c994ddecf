use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seed used when no usable seed is supplied.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed arguments into a deduplicated list, keeping first-seen order.
///
/// Accepts literal integers (negative values use their magnitude) and the
/// keyword `time`, which draws a seed from the system clock.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("time") {
            clock_seed()
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert(seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

/// Seed derived from the current time, for interactive play.
pub fn clock_seed() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    u64::try_from(nanos & u128::from(u64::MAX)).unwrap_or(DEFAULT_SEED)
}
