mod config;
mod display;
mod import;
mod interactive;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE, load_config};
use crate::display::{display_history, display_import_summary, display_suggestion};
use granbelm_db::models::{Code, HistoryRecord, Outcome};
use granbelm_db::store::{Backend, HistoryStore, MemoryStore, open_store};
use granbelm_predict::models::{ScorerKind, Suggestion, build_scorer};

#[derive(Parser)]
#[command(name = "granbelm", about = "Prédiction de la 2nde nav (グランベルム)")]
struct Cli {
    /// Fichier de configuration JSON
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Stockage de l'historique (remplace la configuration)
    #[arg(long, global = true)]
    backend: Option<Backend>,

    /// Chemin du fichier d'historique (remplace la configuration)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Logs détaillés sur stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ajouter une nav à l'historique
    Add {
        /// Nav appuyée (ex: 123)
        nav: String,

        /// Rôle obtenu (魔力目, ベル, リプレイ ou bonus, bell, replay)
        #[arg(short, long, default_value = "魔力目")]
        role: String,
    },

    /// Effacer tout l'historique
    Reset,

    /// Prédire la 2nde nav à partir de la 1ère
    Predict {
        /// 1ère nav (1-3)
        #[arg(short, long)]
        first: u8,

        /// Modèle de prédiction (remplace la configuration)
        #[arg(short, long)]
        scorer: Option<ScorerKind>,
    },

    /// Afficher les dernières lignes de l'historique
    History {
        /// Nombre de lignes (défaut : configuration)
        #[arg(short, long)]
        last: Option<usize>,
    },

    /// Importer un fichier CSV (colonnes nav, role)
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Afficher le stockage utilisé
    Where,

    /// Mode interactif (REPL)
    Interactive,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(&cli.config)?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(data) = cli.data {
        config.data_path = Some(data);
    }

    let path = config.resolved_data_path();
    let mut store = open_store_or_memory(config.backend, &path);
    let store = store.as_mut();

    match cli.command {
        Command::Add { nav, role } => {
            let code: Code = nav.parse()?;
            let outcome: Outcome = role.parse()?;
            cmd_add(store, code, outcome)
        }
        Command::Reset => cmd_reset(store),
        Command::Predict { first, scorer } => {
            cmd_predict(store, &config, first, scorer.unwrap_or(config.scorer)).map(|_| ())
        }
        Command::History { last } => {
            cmd_history(store, last.unwrap_or(config.history_tail));
            Ok(())
        }
        Command::Import { file } => cmd_import(store, &file),
        Command::Where => {
            println!("{}", store.describe());
            Ok(())
        }
        Command::Interactive => interactive::run_interactive(store, &config),
    }
}

/// Stockage impossible à ouvrir : on continue en mémoire pour la session.
pub(crate) fn open_store_or_memory(backend: Backend, path: &Path) -> Box<dyn HistoryStore> {
    match open_store(backend, path) {
        Ok(store) => store,
        Err(e) => {
            warn!("{e}");
            println!("⚠ Stockage indisponible ({e}), historique conservé en mémoire pour cette session.");
            Box::new(MemoryStore::default())
        }
    }
}

/// Charge l'historique ; un stockage indisponible donne une table vide.
pub(crate) fn load_history(store: &dyn HistoryStore) -> Vec<HistoryRecord> {
    match store.load() {
        Ok(history) => history,
        Err(e) => {
            warn!("{e}");
            println!("⚠ Historique indisponible ({e}), on repart d'une table vide.");
            Vec::new()
        }
    }
}

pub(crate) fn cmd_add(store: &mut dyn HistoryStore, code: Code, outcome: Outcome) -> Result<()> {
    let record = HistoryRecord::new(code, outcome);
    store
        .append(&record)
        .with_context(|| format!("Échec de l'ajout de {code}"))?;
    println!("{code} ({outcome}) ajouté.");
    Ok(())
}

pub(crate) fn cmd_reset(store: &mut dyn HistoryStore) -> Result<()> {
    store.save(&[]).context("Échec de la réinitialisation")?;
    println!("Historique réinitialisé.");
    Ok(())
}

pub(crate) fn cmd_predict(
    store: &dyn HistoryStore,
    config: &AppConfig,
    first: u8,
    kind: ScorerKind,
) -> Result<Suggestion> {
    if !(1..=3).contains(&first) {
        bail!("1ère nav invalide : {first} (attendu 1, 2 ou 3)");
    }

    let history = load_history(store);
    if history.is_empty() {
        println!("⚠ Historique insuffisant.");
        return Ok(Suggestion::none());
    }

    let scorer = build_scorer(kind, config.similarity, config.forest);
    let suggestion = scorer.suggest(&history, first);
    display_suggestion(&suggestion, scorer.name(), first);
    Ok(suggestion)
}

pub(crate) fn cmd_history(store: &dyn HistoryStore, last: usize) {
    let history = load_history(store);
    display_history(&history, last);
}

pub(crate) fn cmd_import(store: &mut dyn HistoryStore, file: &PathBuf) -> Result<()> {
    let result = import::import_csv(store, file)
        .with_context(|| format!("Import de {:?} refusé", file))?;
    display_import_summary(&result);
    Ok(())
}
