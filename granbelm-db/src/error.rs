use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("stockage indisponible ({path:?}) : {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fichier d'historique illisible ({path:?}) : {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("erreur SQLite : {0}")]
    Sqlite(#[from] rusqlite::Error),
}
