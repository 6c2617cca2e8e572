use std::path::PathBuf;

const DB_PATH: &str = "VIGIL_DB_PATH";

const DEFAULT_DB_PATH: &str = "history.db";

pub fn get_default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

/// SQLite file used when the configuration does not name one
pub fn get_db_path() -> PathBuf {
    std::env::var(DB_PATH).map_or_else(|_| get_default_db_path(), PathBuf::from)
}

const HOST_TAG: &str = "VIGIL_HOST_TAG";

const DEFAULT_HOST_TAG: &str = "localhost";

/// Value of the `host` tag attached by the simulated collector
pub fn get_host_tag() -> String {
    std::env::var(HOST_TAG).unwrap_or_else(|_| DEFAULT_HOST_TAG.to_string())
}
