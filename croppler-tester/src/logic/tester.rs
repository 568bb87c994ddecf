use colored::Colorize;
use croppler_game::{GameEngine, Puzzle};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::cache::MemoCache;
use crate::scenarios::{LogicScenario, ScenarioCtx};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct LogicTester<'a> {
    engine: &'a GameEngine,
    verbose: bool,
    puzzles: MemoCache<String, Puzzle>,
}

impl<'a> LogicTester<'a> {
    pub fn new(engine: &'a GameEngine, verbose: bool) -> Self {
        Self {
            engine,
            verbose,
            puzzles: MemoCache::new(),
        }
    }

    pub fn run_scenario(
        &mut self,
        scenario: &LogicScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {})",
                    scenario.key.bright_white(),
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        log::debug!(
            "puzzle cache: {} entries, {} hits, {} misses",
            self.puzzles.len(),
            self.puzzles.hits(),
            self.puzzles.misses()
        );
        results
    }

    fn run_single_scenario(
        &mut self,
        scenario: &LogicScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let mut ctx = ScenarioCtx {
                engine: self.engine,
                seed: iteration_seed,
                rng: ChaCha20Rng::seed_from_u64(iteration_seed),
                puzzles: &mut self.puzzles,
            };

            match (scenario.run)(&mut ctx) {
                Ok(()) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?})",
                            i + 1,
                            iterations
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            message.red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::DatasetLoader;
    use crate::scenarios::get_scenario;
    use croppler_game::GameConfig;

    fn engine() -> GameEngine {
        GameEngine::load(&DatasetLoader::new(None), GameConfig::default()).unwrap()
    }

    #[test]
    fn every_scenario_passes_on_bundled_data() {
        let engine = engine();
        let mut tester = LogicTester::new(&engine, false);
        for (key, _) in crate::scenarios::list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            let results = tester.run_scenario(scenario, &[1337, 7], 3);
            for result in results {
                assert!(result.passed, "{key}: {:?}", result.failures);
                assert_eq!(result.successful_iterations, 3);
            }
        }
        assert!(tester.puzzles.hits() > 0);
    }

    #[test]
    fn result_serializes_duration_as_micros() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(2),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["average_duration"], 2000);
        let back: ScenarioResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(2));
    }
}
