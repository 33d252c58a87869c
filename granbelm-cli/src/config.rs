use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use granbelm_db::store::Backend;
use granbelm_predict::config::{ForestConfig, SimilarityConfig};
use granbelm_predict::models::ScorerKind;

pub const DEFAULT_CONFIG_FILE: &str = "granbelm.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: Backend,
    /// Vide = chemin par défaut du backend.
    pub data_path: Option<PathBuf>,
    pub scorer: ScorerKind,
    pub history_tail: usize,
    pub similarity: SimilarityConfig,
    pub forest: ForestConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Csv,
            data_path: None,
            scorer: ScorerKind::Similarity,
            history_tail: 30,
            similarity: SimilarityConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn resolved_data_path(&self) -> PathBuf {
        self.data_path
            .clone()
            .unwrap_or_else(|| self.backend.default_path())
    }
}

/// Fichier absent = configuration par défaut.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
    let config = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide {:?}", path))?;
    Ok(config)
}
