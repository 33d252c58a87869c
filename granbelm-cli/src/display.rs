use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use granbelm_db::models::{HistoryRecord, recent_window};
use granbelm_predict::models::Suggestion;

pub fn display_history(history: &[HistoryRecord], tail: usize) {
    if history.is_empty() {
        println!("Historique vide.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "nav", "role"]);

    let offset = history.len().saturating_sub(tail);
    for (i, record) in recent_window(history, tail).iter().enumerate() {
        let color = if record.is_bonus() {
            Color::Green
        } else if record.code().is_none() || record.outcome().is_none() {
            Color::Red
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(offset + i + 1),
            Cell::new(&record.nav),
            Cell::new(&record.role).fg(color),
        ]);
    }

    println!("{table}");
    println!("{} ligne(s) au total", history.len());
}

pub fn display_suggestion(suggestion: &Suggestion, scorer_name: &str, chosen_first: u8) {
    match suggestion.second {
        Some(second) => println!(
            "✅ 1ère nav {chosen_first} → 2nde recommandée : {second} (taux de 魔力目 : {:.1}%, modèle {scorer_name})",
            suggestion.confidence
        ),
        None => println!("⚠ Pas assez d'historique similaire pour la 1ère nav {chosen_first}."),
    }
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Ajoutées          : {}", result.inserted);
    if result.errors > 0 {
        println!("  Ignorées          : {}", result.errors);
    }
}
