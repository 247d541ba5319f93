use serde::Deserialize;
use std::{fs, path::PathBuf};

use energy_client::analytics::DEFAULT_PEAK_FROM_YEAR;

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub consumption_path: PathBuf,
    pub capacity_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_peak_from_year")]
    pub peak_from_year: i32,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            peak_from_year: default_peak_from_year(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_peak_from_year() -> i32 {
    DEFAULT_PEAK_FROM_YEAR
}

fn default_preview_rows() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_section_is_optional() {
        let cfg = AppConfig::from_toml(
            r#"
            [data]
            consumption_path = "data/consommation-quotidienne-brute.csv"
            capacity_path = "data/parc-national-annuel-prod-eolien-solaire.csv"

            [server]
            bind_addr = "127.0.0.1:8501"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.analysis.peak_from_year, 2012);
        assert_eq!(cfg.analysis.preview_rows, 10);
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn reads_metrics_and_overrides() {
        let cfg = AppConfig::from_toml(
            r#"
            [data]
            consumption_path = "a.csv"
            capacity_path = "b.csv"

            [server]
            bind_addr = "0.0.0.0:8080"

            [analysis]
            peak_from_year = 2015

            [metrics]
            bind_addr = "0.0.0.0:9100"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.analysis.peak_from_year, 2015);
        assert_eq!(cfg.analysis.preview_rows, 10);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "0.0.0.0:9100");
    }

    #[test]
    fn missing_data_section_is_an_error() {
        assert!(AppConfig::from_toml("[server]\nbind_addr = \"x\"\n").is_err());
    }
}
