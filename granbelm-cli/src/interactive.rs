use std::io::{self, Write};

use anyhow::{Context, Result};
use granbelm_db::models::{Code, Outcome};
use granbelm_db::store::HistoryStore;

use crate::config::AppConfig;

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Press(Code),
    Role(Option<Outcome>),
    First(Option<u8>),
    Predict,
    History,
    Reset,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    let input = input.trim();
    if let Ok(code) = input.parse::<Code>() {
        return Some(InteractiveCommand::Press(code));
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let name = parts.next()?.to_lowercase();
    let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match name.as_str() {
        "role" | "r" => Some(InteractiveCommand::Role(arg.and_then(|a| a.parse().ok()))),
        "first" | "f" | "1st" => Some(InteractiveCommand::First(
            arg.and_then(|a| a.parse().ok()).filter(|d| (1..=3).contains(d)),
        )),
        "predire" | "prédire" | "predict" | "p" => Some(InteractiveCommand::Predict),
        "historique" | "history" | "hist" | "h" => Some(InteractiveCommand::History),
        "reset" => Some(InteractiveCommand::Reset),
        "quitter" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu(role: Outcome, first: u8) {
    println!();
    println!("── Mode interactif ──  rôle : {role}  |  1ère nav : {first}");
    let buttons: Vec<String> = Code::ALL.iter().map(|c| c.to_string()).collect();
    println!("  {}   Ajouter la nav avec le rôle courant", buttons.join(" "));
    println!("  role <r>      Choisir le rôle (魔力目, ベル, リプレイ)");
    println!("  first <1-3>   Choisir la 1ère nav");
    println!("  predire       Prédire la 2nde nav");
    println!("  historique    Dernières lignes");
    println!("  reset         Effacer l'historique");
    println!("  quitter       Quitter");
    println!();
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let n = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if n == 0 {
        anyhow::bail!("fin de l'entrée");
    }
    Ok(input.trim().to_string())
}

pub fn run_interactive(store: &mut dyn HistoryStore, config: &AppConfig) -> Result<()> {
    println!("Bienvenue dans le mode interactif de granbelm ! ({})", store.describe());

    let mut role = Outcome::Bonus;
    let mut first: u8 = 1;

    loop {
        display_menu(role, first);
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(InteractiveCommand::Press(code)) => {
                if let Err(e) = super::cmd_add(store, code, role) {
                    println!("Erreur: {e:#}");
                }
            }
            Some(InteractiveCommand::Role(Some(r))) => role = r,
            Some(InteractiveCommand::Role(None)) => {
                println!("Rôle inconnu. Choix : 魔力目, ベル, リプレイ (ou bonus, bell, replay).");
            }
            Some(InteractiveCommand::First(Some(f))) => first = f,
            Some(InteractiveCommand::First(None)) => println!("1ère nav attendue : 1, 2 ou 3."),
            Some(InteractiveCommand::Predict) => {
                if let Err(e) = super::cmd_predict(store, config, first, config.scorer) {
                    println!("Erreur: {e:#}");
                }
            }
            Some(InteractiveCommand::History) => super::cmd_history(store, config.history_tail),
            Some(InteractiveCommand::Reset) => {
                if let Err(e) = super::cmd_reset(store) {
                    println!("Erreur: {e:#}");
                }
            }
            None => {
                println!("Commande inconnue : '{}'. Tapez une nav (ex: 123) ou un nom de commande.", input);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_press() {
        assert_eq!(parse_command("123"), Some(InteractiveCommand::Press("123".parse().unwrap())));
        assert_eq!(parse_command(" 321 "), Some(InteractiveCommand::Press("321".parse().unwrap())));
        assert_eq!(parse_command("122"), None);
    }

    #[test]
    fn test_parse_command_role() {
        assert_eq!(parse_command("role ベル"), Some(InteractiveCommand::Role(Some(Outcome::Bell))));
        assert_eq!(parse_command("r bonus"), Some(InteractiveCommand::Role(Some(Outcome::Bonus))));
        assert_eq!(parse_command("role"), Some(InteractiveCommand::Role(None)));
        assert_eq!(parse_command("role cerise"), Some(InteractiveCommand::Role(None)));
    }

    #[test]
    fn test_parse_command_first() {
        assert_eq!(parse_command("first 2"), Some(InteractiveCommand::First(Some(2))));
        assert_eq!(parse_command("f 3"), Some(InteractiveCommand::First(Some(3))));
        assert_eq!(parse_command("first 4"), Some(InteractiveCommand::First(None)));
        assert_eq!(parse_command("first x"), Some(InteractiveCommand::First(None)));
    }

    #[test]
    fn test_parse_command_by_name() {
        assert_eq!(parse_command("predire"), Some(InteractiveCommand::Predict));
        assert_eq!(parse_command("historique"), Some(InteractiveCommand::History));
        assert_eq!(parse_command("reset"), Some(InteractiveCommand::Reset));
        assert_eq!(parse_command("quitter"), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_case_insensitive() {
        assert_eq!(parse_command("QUIT"), Some(InteractiveCommand::Quit));
        assert_eq!(parse_command("Predict"), Some(InteractiveCommand::Predict));
        assert_eq!(parse_command("ROLE Bell"), Some(InteractiveCommand::Role(Some(Outcome::Bell))));
    }

    #[test]
    fn test_parse_command_unknown() {
        assert_eq!(parse_command("foo"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("7"), None);
    }
}
