use granbelm_db::models::{Code, HistoryRecord};

pub const FEATURE_NAMES: &[&str] = &["first", "second", "third", "prev_first"];

/// `prev_first` utilisé quand aucun enregistrement ne précède.
pub const DEFAULT_PREV_FIRST: u8 = 1;

#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub code: Code,
    pub features: Vec<f64>,
    pub label: f64,
}

fn feature_vector(code: Code, prev_first: u8) -> Vec<f64> {
    let [first, second, third] = code.digits();
    vec![
        first as f64,      // 0
        second as f64,     // 1
        third as f64,      // 2
        prev_first as f64, // 3
    ]
}

/// Une ligne par enregistrement valide, dans l'ordre de l'historique.
/// Les navs invalides sont écartées avant le calcul de `prev_first`.
pub fn extract_training_rows(history: &[HistoryRecord]) -> Vec<FeatureRow> {
    let mut prev_first = DEFAULT_PREV_FIRST;
    history
        .iter()
        .filter_map(|record| record.code().map(|code| (code, record.is_bonus())))
        .map(|(code, is_bonus)| {
            let row = FeatureRow {
                code,
                features: feature_vector(code, prev_first),
                label: if is_bonus { 1.0 } else { 0.0 },
            };
            prev_first = code.first();
            row
        })
        .collect()
}

/// 1ère position du dernier enregistrement valide.
pub fn last_first(history: &[HistoryRecord]) -> u8 {
    history
        .iter()
        .rev()
        .find_map(HistoryRecord::code)
        .map(|code| code.first())
        .unwrap_or(DEFAULT_PREV_FIRST)
}

/// Les triplets complets possibles pour une 1ère position donnée :
/// chaque 2nde restante, avec l'unique 3ème qui complète la permutation.
pub fn candidate_codes(chosen_first: u8) -> Vec<Code> {
    let mut candidates = Vec::with_capacity(2);
    for second in (1..=3u8).filter(|&d| d != chosen_first) {
        for third in (1..=3u8).filter(|&d| d != chosen_first && d != second) {
            if let Some(code) = Code::from_digits([chosen_first, second, third]) {
                candidates.push(code);
            }
        }
    }
    candidates
}

/// Lignes de requête pour l'inférence (label inconnu, fixé à 0).
pub fn candidate_rows(chosen_first: u8, history: &[HistoryRecord]) -> Vec<FeatureRow> {
    let prev_first = last_first(history);
    candidate_codes(chosen_first)
        .into_iter()
        .map(|code| FeatureRow {
            code,
            features: feature_vector(code, prev_first),
            label: 0.0,
        })
        .collect()
}
