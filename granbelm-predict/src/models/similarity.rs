use std::collections::BTreeMap;

use granbelm_db::models::{Code, HistoryRecord, hamming_distance, positional_match_count, recent_window};
use tracing::debug;

use super::{SecondNavScorer, Suggestion};
use crate::config::SimilarityConfig;

pub struct SimilarityScorer {
    config: SimilarityConfig,
}

impl SimilarityScorer {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }
}

impl SecondNavScorer for SimilarityScorer {
    fn name(&self) -> &str {
        "Similarity"
    }

    fn suggest(&self, history: &[HistoryRecord], chosen_first: u8) -> Suggestion {
        let window = recent_window(history, self.config.recent_window);
        suggest_second_with(history, window, chosen_first, &self.config)
    }
}

/// Navs valides les plus fréquentes de la fenêtre (fréquence décroissante,
/// à égalité ordre de première apparition).
pub fn reference_set(window: &[HistoryRecord], limit: usize) -> Vec<Code> {
    let mut counts: Vec<(Code, usize)> = Vec::new();
    for code in window.iter().filter_map(HistoryRecord::code) {
        match counts.iter_mut().find(|(c, _)| *c == code) {
            Some((_, n)) => *n += 1,
            None => counts.push((code, 1)),
        }
    }
    // Tri stable : l'ordre d'apparition départage les égalités
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(code, _)| code).collect()
}

/// max(0, 3 - hamming) + correspondances positionnelles.
pub fn pair_score(nav: &str, reference: &str) -> usize {
    let h_score = hamming_distance(nav, reference)
        .map(|d| 3usize.saturating_sub(d))
        .unwrap_or(0);
    h_score + positional_match_count(nav, reference)
}

/// Meilleur score de la nav contre l'ensemble des références.
pub fn similarity_score(code: Code, references: &[Code]) -> usize {
    let nav = code.to_string();
    references
        .iter()
        .map(|r| pair_score(&nav, &r.to_string()))
        .fold(0, usize::max)
}

pub fn suggest_second(history: &[HistoryRecord], window: &[HistoryRecord], chosen_first: u8) -> Suggestion {
    suggest_second_with(history, window, chosen_first, &SimilarityConfig::default())
}

pub fn suggest_second_with(
    history: &[HistoryRecord],
    window: &[HistoryRecord],
    chosen_first: u8,
    config: &SimilarityConfig,
) -> Suggestion {
    let references = reference_set(window, config.reference_limit);
    if references.is_empty() {
        debug!("aucune nav valide dans la fenêtre récente");
        return Suggestion::none();
    }

    let mut scored: Vec<(Code, bool, usize)> = history
        .iter()
        .filter_map(|record| record.code().map(|code| (code, record.is_bonus())))
        .filter(|(code, _)| code.first() == chosen_first)
        .map(|(code, is_bonus)| (code, is_bonus, similarity_score(code, &references)))
        .collect();

    if scored.is_empty() {
        debug!(chosen_first, "aucun historique pour cette 1ère nav");
        return Suggestion::none();
    }

    scored.sort_by(|a, b| b.2.cmp(&a.2));
    scored.truncate(config.top_k);

    // (魔力目, total) par 2nde nav, parcouru par 2nde croissante
    let mut groups: BTreeMap<u8, (usize, usize)> = BTreeMap::new();
    for (code, is_bonus, _) in &scored {
        let entry = groups.entry(code.second()).or_insert((0, 0));
        if *is_bonus {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    let mut best: Option<(u8, f64)> = None;
    for (&second, &(bonus, total)) in &groups {
        let rate = bonus as f64 / total as f64;
        debug!(second, bonus, total, rate, "taux de 魔力目");
        if best.is_none_or(|(_, best_rate)| rate > best_rate) {
            best = Some((second, rate));
        }
    }

    match best {
        Some((second, rate)) => Suggestion::new(second, rate),
        None => Suggestion::none(),
    }
}
