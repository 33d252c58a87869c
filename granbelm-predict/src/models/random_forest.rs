use granbelm_db::models::HistoryRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::prelude::*;
use tracing::debug;

use super::{SecondNavScorer, Suggestion};
use crate::config::ForestConfig;
use crate::features::{self, FeatureRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("historique insuffisant pour entraîner le modèle")]
pub struct InsufficientHistory;

/// Forêt aléatoire estimant P(魔力目 | first, second, third, prev_first).
#[derive(Debug)]
pub struct BonusForest {
    trees: Vec<TreeNode>,
}

impl BonusForest {
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        sum / self.trees.len() as f64
    }
}

pub fn train(history: &[HistoryRecord], config: &ForestConfig) -> Result<BonusForest, InsufficientHistory> {
    let rows = features::extract_training_rows(history);
    if rows.is_empty() {
        return Err(InsufficientHistory);
    }

    let builder = TreeBuilder {
        rows: &rows,
        max_depth: config.max_depth,
        features_per_split: (features::FEATURE_NAMES.len() as f64).sqrt().ceil() as usize,
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = rows.len();
    let trees: Vec<TreeNode> = (0..config.n_trees.max(1))
        .map(|_| {
            // Bootstrap : indices tirés avec remise
            let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            builder.grow(&sample, 0, &mut rng)
        })
        .collect();

    debug!(rows = n, trees = trees.len(), "forêt entraînée");
    Ok(BonusForest { trees })
}

/// Évalue les deux triplets possibles pour `chosen_first` et garde la 2nde la plus probable.
pub fn best_second(chosen_first: u8, history: &[HistoryRecord], model: &BonusForest) -> Suggestion {
    let candidates: Vec<FeatureRow> = features::candidate_rows(chosen_first, history);

    let mut best: Option<(u8, f64)> = None;
    for row in &candidates {
        let p = model.predict_proba(&row.features);
        debug!(code = %row.code, p, "probabilité candidate");
        if best.is_none_or(|(_, best_p)| p > best_p) {
            best = Some((row.code.second(), p));
        }
    }

    match best {
        Some((second, p)) => Suggestion::new(second, p),
        None => Suggestion::none(),
    }
}

/// Entraîne à chaque appel, sans cache.
pub struct ForestScorer {
    config: ForestConfig,
}

impl ForestScorer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }
}

impl SecondNavScorer for ForestScorer {
    fn name(&self) -> &str {
        "RandomForest"
    }

    fn suggest(&self, history: &[HistoryRecord], chosen_first: u8) -> Suggestion {
        match train(history, &self.config) {
            Ok(model) => best_second(chosen_first, history, &model),
            Err(e) => {
                debug!("{e}");
                Suggestion::none()
            }
        }
    }
}

#[derive(Debug)]
enum TreeNode {
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, features: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    node = if features[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitChoice {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Gini d'un nœud binaire de `n` lignes dont `positives` 魔力目.
fn gini(n: usize, positives: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Les arbres travaillent sur des indices dans `rows` : un échantillon
/// bootstrap n'est jamais recopié.
struct TreeBuilder<'a> {
    rows: &'a [FeatureRow],
    max_depth: usize,
    features_per_split: usize,
}

impl TreeBuilder<'_> {
    fn is_positive(&self, i: usize) -> bool {
        self.rows[i].label > 0.5
    }

    fn grow(&self, sample: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let n = sample.len();
        let positives = sample.iter().filter(|&&i| self.is_positive(i)).count();
        let leaf = TreeNode::Leaf { value: positives as f64 / n.max(1) as f64 };

        if depth >= self.max_depth || n < 2 || positives == 0 || positives == n {
            return leaf;
        }

        let mut candidates: Vec<usize> = (0..features::FEATURE_NAMES.len()).collect();
        candidates.shuffle(rng);
        candidates.truncate(self.features_per_split);

        let parent = gini(n, positives);
        let best = candidates
            .iter()
            .filter_map(|&feature| self.best_threshold(sample, feature, positives))
            .min_by(|a, b| a.impurity.total_cmp(&b.impurity));
        let Some(split) = best.filter(|s| s.impurity < parent) else {
            return leaf;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .iter()
            .partition(|&&i| self.rows[i].features[split.feature] <= split.threshold);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.grow(&left, depth + 1, rng)),
            right: Box::new(self.grow(&right, depth + 1, rng)),
        }
    }

    /// Un seul passage cumulatif sur les effectifs par valeur distincte :
    /// chaque seuil est le milieu de deux valeurs voisines.
    fn best_threshold(&self, sample: &[usize], feature: usize, positives: usize) -> Option<SplitChoice> {
        // (valeur, effectif, 魔力目)
        let mut bins: Vec<(f64, usize, usize)> = Vec::new();
        for &i in sample {
            let value = self.rows[i].features[feature];
            let hit = usize::from(self.is_positive(i));
            match bins.iter_mut().find(|(v, _, _)| *v == value) {
                Some(bin) => {
                    bin.1 += 1;
                    bin.2 += hit;
                }
                None => bins.push((value, 1, hit)),
            }
        }
        bins.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sample.len();
        let (mut left_n, mut left_pos) = (0, 0);
        let mut best: Option<SplitChoice> = None;
        for pair in bins.windows(2) {
            left_n += pair[0].1;
            left_pos += pair[0].2;
            let right_n = n - left_n;
            let impurity = (left_n as f64 * gini(left_n, left_pos)
                + right_n as f64 * gini(right_n, positives - left_pos))
                / n as f64;
            if best.is_none_or(|b| impurity < b.impurity) {
                best = Some(SplitChoice { feature, threshold: (pair[0].0 + pair[1].0) / 2.0, impurity });
            }
        }
        best
    }
}
