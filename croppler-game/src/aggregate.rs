//! Filtering, grouping and ranking over trade records.
//!
//! Every function here is pure over borrowed input, so the same table can be
//! shared freely between players.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::TradeRecord;

/// Errors raised when game setup receives unusable input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("no candidate states available to choose a secret from")]
    NoCandidateStates,
    #[error("a fixed secret must name a state")]
    BlankSecret,
}

/// Summed export value of one commodity for a single state and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityBreakdown {
    pub commodity: String,
    pub total_value: f64,
}

/// One state's position in a [`StateRanking`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedState {
    pub state: String,
    pub total_value: f64,
    pub rank: usize,
}

/// States ordered by total export value, rank 1 being the largest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateRanking {
    entries: Vec<RankedState>,
}

impl StateRanking {
    #[must_use]
    pub fn entries(&self) -> &[RankedState] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank of `state`, matched case-insensitively.
    #[must_use]
    pub fn rank_of(&self, state: &str) -> Option<usize> {
        let wanted = state.trim().to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.state.to_lowercase() == wanted)
            .map(|entry| entry.rank)
    }
}

/// Whether `record` counts toward totals for `year`.
#[must_use]
pub fn is_valid_record(record: &TradeRecord, year: i32, excluded: &[String]) -> bool {
    record.year == year
        && record.value.is_some_and(|value| value > 0.0)
        && !excluded.iter().any(|commodity| *commodity == record.commodity)
}

/// Keep the records for `year` (and `state`, when given) with a positive value
/// and a commodity outside the exclusion set.
#[must_use]
pub fn filter_valid<'a>(
    records: &'a [TradeRecord],
    year: i32,
    state: Option<&str>,
    excluded: &[String],
) -> Vec<&'a TradeRecord> {
    records
        .iter()
        .filter(|record| is_valid_record(record, year, excluded))
        .filter(|record| state.is_none_or(|state| record.state == state))
        .collect()
}

/// Sum values per commodity. Output is sorted by commodity name.
#[must_use]
pub fn build_commodity_breakdown<'a, I>(records: I) -> Vec<CommodityBreakdown>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        if let Some(value) = record.value.filter(|value| *value > 0.0) {
            *totals.entry(record.commodity.as_str()).or_default() += value;
        }
    }
    totals
        .into_iter()
        .map(|(commodity, total_value)| CommodityBreakdown {
            commodity: commodity.to_string(),
            total_value,
        })
        .collect()
}

/// Breakdown for one state and year, excluding aggregate rows.
#[must_use]
pub fn commodity_breakdown_for(
    records: &[TradeRecord],
    year: i32,
    state: &str,
    excluded: &[String],
) -> Vec<CommodityBreakdown> {
    let valid = filter_valid(records, year, Some(state), excluded);
    debug!("{} valid records for {state} in {year}", valid.len());
    build_commodity_breakdown(valid)
}

/// Rank states by their summed valid export value for `year`.
///
/// Ties keep the order in which the states first appear in `records`.
#[must_use]
pub fn build_state_ranking(records: &[TradeRecord], year: i32, excluded: &[String]) -> StateRanking {
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in filter_valid(records, year, None, excluded) {
        let value = record.value.unwrap_or_default();
        if let Some(&slot) = index.get(record.state.as_str()) {
            totals[slot].1 += value;
        } else {
            index.insert(record.state.as_str(), totals.len());
            totals.push((record.state.clone(), value));
        }
    }

    // `sort_by` is stable, which is what keeps ties in first-seen order.
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));

    let entries = totals
        .into_iter()
        .enumerate()
        .map(|(position, (state, total_value))| RankedState {
            state,
            total_value,
            rank: position + 1,
        })
        .collect::<Vec<_>>();
    debug!("ranked {} states for {year}", entries.len());
    StateRanking { entries }
}

/// State names in first-seen order, without duplicates.
#[must_use]
pub fn distinct_states(records: &[TradeRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.state.as_str()))
        .map(|record| record.state.clone())
        .collect()
}

/// Pick one state uniformly at random.
///
/// # Errors
///
/// Returns [`InputError::NoCandidateStates`] if `states` is empty.
pub fn select_random_state<'a, R>(states: &'a [String], rng: &mut R) -> Result<&'a str, InputError>
where
    R: Rng + ?Sized,
{
    states
        .choose(rng)
        .map(String::as_str)
        .ok_or(InputError::NoCandidateStates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_EXCLUDED_COMMODITIES;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn excluded() -> Vec<String> {
        DEFAULT_EXCLUDED_COMMODITIES
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn sample() -> Vec<TradeRecord> {
        vec![
            TradeRecord::new("Iowa", 2022, "Corn", Some(300.0)),
            TradeRecord::new("Iowa", 2022, "Pork", Some(200.0)),
            TradeRecord::new("Iowa", 2022, "Total agricultural exports", Some(9_000.0)),
            TradeRecord::new("Texas", 2022, "Beef", Some(500.0)),
            TradeRecord::new("Texas", 2021, "Beef", Some(7_000.0)),
            TradeRecord::new("Ohio", 2022, "Corn", Some(-4.0)),
            TradeRecord::new("Ohio", 2022, "Soybeans", None),
            TradeRecord::new("Maine", 2022, "Blueberries", Some(500.0)),
            TradeRecord::new("Iowa", 2022, "Corn", Some(50.0)),
        ]
    }

    #[test]
    fn filter_drops_invalid_and_excluded_rows() {
        let records = sample();
        let valid = filter_valid(&records, 2022, None, &excluded());
        assert_eq!(valid.len(), 5);
        assert!(valid.iter().all(|r| r.value.is_some_and(|v| v > 0.0)));
        assert!(valid.iter().all(|r| !r.commodity.starts_with("Total")));

        let iowa = filter_valid(&records, 2022, Some("Iowa"), &excluded());
        assert_eq!(iowa.len(), 3);
        assert!(filter_valid(&records, 1999, None, &[]).is_empty());
    }

    #[test]
    fn breakdown_groups_and_sorts_by_commodity() {
        let records = sample();
        let breakdown = commodity_breakdown_for(&records, 2022, "Iowa", &excluded());
        assert_eq!(
            breakdown,
            vec![
                CommodityBreakdown {
                    commodity: "Corn".to_string(),
                    total_value: 350.0,
                },
                CommodityBreakdown {
                    commodity: "Pork".to_string(),
                    total_value: 200.0,
                },
            ]
        );
    }

    #[test]
    fn ranking_orders_descending_with_stable_ties() {
        let records = sample();
        let ranking = build_state_ranking(&records, 2022, &excluded());
        let order: Vec<(&str, usize)> = ranking
            .entries()
            .iter()
            .map(|e| (e.state.as_str(), e.rank))
            .collect();
        // Iowa 550, then Texas and Maine tie at 500 in first-seen order.
        assert_eq!(order, vec![("Iowa", 1), ("Texas", 2), ("Maine", 3)]);
        assert_eq!(ranking.rank_of("maine"), Some(3));
        assert_eq!(ranking.rank_of("Ohio"), None);
    }

    #[test]
    fn distinct_states_keeps_first_seen_order() {
        assert_eq!(distinct_states(&sample()), vec!["Iowa", "Texas", "Ohio", "Maine"]);
    }

    #[test]
    fn random_state_requires_candidates() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert_eq!(
            select_random_state(&[], &mut rng),
            Err(InputError::NoCandidateStates)
        );
        let states = vec!["Only".to_string()];
        assert_eq!(select_random_state(&states, &mut rng), Ok("Only"));
    }
}
