pub mod random_forest;
pub mod similarity;

use granbelm_db::models::{Code, HistoryRecord, Outcome};
use serde::{Deserialize, Serialize};

use crate::config::{ForestConfig, SimilarityConfig};

/// 2nde nav recommandée et taux de 魔力目 associé (en %, arrondi à 0.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suggestion {
    pub second: Option<u8>,
    pub confidence: f64,
}

impl Suggestion {
    pub fn none() -> Self {
        Self { second: None, confidence: 0.0 }
    }

    pub fn new(second: u8, probability: f64) -> Self {
        Self { second: Some(second), confidence: round_percent(probability) }
    }
}

/// Probabilité [0, 1] → pourcentage arrondi à une décimale (demi au pair).
pub fn round_percent(probability: f64) -> f64 {
    (probability * 1000.0).round_ties_even() / 10.0
}

pub trait SecondNavScorer {
    fn name(&self) -> &str;
    /// `history` dans l'ordre d'insertion (le plus récent en dernier).
    fn suggest(&self, history: &[HistoryRecord], chosen_first: u8) -> Suggestion;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    #[default]
    Similarity,
    Forest,
}

pub fn build_scorer(
    kind: ScorerKind,
    similarity: SimilarityConfig,
    forest: ForestConfig,
) -> Box<dyn SecondNavScorer> {
    match kind {
        ScorerKind::Similarity => Box::new(similarity::SimilarityScorer::new(similarity)),
        ScorerKind::Forest => Box::new(random_forest::ForestScorer::new(forest)),
    }
}

/// Historique synthétique : navs en rotation, 魔力目 quand la 2nde vaut 2.
pub fn make_history(n: usize) -> Vec<HistoryRecord> {
    (0..n)
        .map(|i| {
            let code = Code::ALL[(i * 5 + i / 6) % 6];
            let outcome = if code.second() == 2 {
                Outcome::Bonus
            } else if i % 2 == 0 {
                Outcome::Bell
            } else {
                Outcome::Replay
            };
            HistoryRecord::new(code, outcome)
        })
        .collect()
}
