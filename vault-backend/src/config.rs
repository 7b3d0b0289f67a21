use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// Root of the markdown vault the storage backend writes under.
    pub vault_path: PathBuf,
    /// Directory holding the registry files.
    pub data_path: PathBuf,
    pub storage_type: String,
    pub ingestor_type: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            vault_path: PathBuf::from(
                env::var("VAULT_PATH").unwrap_or_else(|_| "./data/vault".to_string()),
            ),
            data_path: PathBuf::from(
                env::var("DATA_PATH").unwrap_or_else(|_| "./data".to_string()),
            ),
            storage_type: env::var("STORAGE_TYPE").unwrap_or_else(|_| "local".to_string()),
            ingestor_type: env::var("INGESTOR_TYPE").unwrap_or_else(|_| "none".to_string()),
        }
    }

    pub fn categories_file(&self) -> PathBuf {
        self.data_path.join("categories.json")
    }

    pub fn groups_file(&self) -> PathBuf {
        self.data_path.join("monitored-groups.json")
    }
}
