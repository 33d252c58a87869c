use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Taille de la fenêtre récente (derniers enregistrements).
    pub recent_window: usize,
    /// Nombre maximal de navs de référence retenues dans la fenêtre.
    pub reference_limit: usize,
    /// Nombre de lignes les plus similaires conservées avant regroupement.
    pub top_k: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            recent_window: 10,
            reference_limit: 10,
            top_k: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            seed: 42,
        }
    }
}
