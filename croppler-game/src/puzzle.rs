//! Display data for one secret: the rank clue and the commodity breakdown.
use serde::Serialize;

use crate::aggregate::{build_state_ranking, commodity_breakdown_for};
use crate::config::GameConfig;
use crate::data::TradeTable;
use crate::numbers::format_magnitude;

/// One commodity tile of the breakdown chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub commodity: String,
    pub total_value: f64,
    pub formatted: String,
}

/// Everything the presentation layer shows about a hidden state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Puzzle {
    pub secret: String,
    pub year: i32,
    /// Rank among all states for the year, if the secret has any valid data
    pub rank: Option<usize>,
    pub ranked_states: usize,
    pub rows: Vec<BreakdownRow>,
}

impl Puzzle {
    #[must_use]
    pub fn build(table: &TradeTable, secret: &str, config: &GameConfig) -> Self {
        let excluded = &config.excluded_commodities;
        let ranking = build_state_ranking(table.records(), config.year, excluded);
        let rows = commodity_breakdown_for(table.records(), config.year, secret, excluded)
            .into_iter()
            .map(|entry| BreakdownRow {
                formatted: format_magnitude(entry.total_value),
                commodity: entry.commodity,
                total_value: entry.total_value,
            })
            .collect();

        Self {
            secret: secret.to_string(),
            year: config.year,
            rank: ranking.rank_of(secret),
            ranked_states: ranking.len(),
            rows,
        }
    }

    /// True when the secret has no valid records for the year.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.rows.iter().map(|row| row.total_value).sum()
    }

    #[must_use]
    pub fn clue(&self) -> Option<String> {
        self.rank.map(|rank| {
            format!(
                "This state ranks {rank} in total agricultural production in {}.",
                self.year
            )
        })
    }
}
