use anyhow::{Context, Result};
use croppler_game::{DataError, DataLoader, GameConfig, SecretSource, TradeTable};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bundled sample of the state export feed, used when no `--data` is given.
pub const SAMPLE_DATASET: &str = include_str!("../assets/state_trade_sample.csv");

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {label}: {source}")]
    Parse {
        label: String,
        #[source]
        source: DataError,
    },
}

/// Where the trade table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Bundled,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DatasetLoader {
    source: DatasetSource,
}

impl DatasetLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        let source = path.map_or(DatasetSource::Bundled, DatasetSource::File);
        Self { source }
    }

    pub const fn source(&self) -> &DatasetSource {
        &self.source
    }

    fn parse(label: &str, text: &str, is_json: bool) -> Result<TradeTable, DatasetError> {
        let parsed = if is_json {
            TradeTable::from_json(text)
        } else {
            TradeTable::from_csv(text)
        };
        parsed.map_err(|source| DatasetError::Parse {
            label: label.to_string(),
            source,
        })
    }
}

impl DataLoader for DatasetLoader {
    type Error = DatasetError;

    fn load_table(&self) -> Result<TradeTable, Self::Error> {
        match &self.source {
            DatasetSource::Bundled => Self::parse("bundled sample dataset", SAMPLE_DATASET, false),
            DatasetSource::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
                    path: path.clone(),
                    source,
                })?;
                let is_json = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                log::info!("loading dataset from {}", path.display());
                Self::parse(&path.display().to_string(), &text, is_json)
            }
        }
    }
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub secret: Option<String>,
    pub year: Option<i32>,
}

/// Load the game configuration from `path` (defaults when absent) and apply overrides.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            GameConfig::from_json(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(state) = &overrides.secret {
        config.secret = SecretSource::Fixed {
            state: state.clone(),
        };
    }
    if let Some(year) = overrides.year {
        config.year = year;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(label: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "croppler-assets-{label}-{}.{ext}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn bundled_dataset_parses() {
        let table = DatasetLoader::new(None).load_table().unwrap();
        assert!(!table.is_empty());
        assert!(table.iter().any(|r| r.state == "Iowa" && r.year == 2022));
    }

    #[test]
    fn json_files_are_detected_by_extension() {
        let path = temp_path("json", "JSON");
        std::fs::write(
            &path,
            r#"[{"State": "Utah", "Year": 2022, "Commodity": "Hay", "Value": 3}]"#,
        )
        .unwrap();
        let table = DatasetLoader::new(Some(path)).load_table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].state, "Utah");
    }

    #[test]
    fn missing_file_reports_path() {
        let path = temp_path("missing", "csv");
        let err = DatasetLoader::new(Some(path.clone())).load_table().unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn overrides_replace_secret_and_year() {
        let overrides = ConfigOverrides {
            secret: Some("Kansas".to_string()),
            year: Some(2021),
        };
        let config = load_config(None, &overrides).unwrap();
        assert_eq!(config.year, 2021);
        assert_eq!(
            config.secret,
            SecretSource::Fixed {
                state: "Kansas".to_string()
            }
        );
    }
}
