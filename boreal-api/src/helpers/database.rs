use std::path::PathBuf;

use crate::config::ApiConfig;
use crate::database::{Database, DEFAULT_POOL_SIZE};

/// Returns the default path of the CRM database
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/boreal/crm.sqlite3`
/// - **Linux**: `~/.local/share/boreal/crm.sqlite3`
/// - **Windows**: `%LOCALAPPDATA%\boreal\crm.sqlite3`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("boreal").join("crm.sqlite3"))
}

/// Resolve the database location (CLI override, then config, then the
/// platform default) and open it.
pub fn initialize_database(
    config: &ApiConfig,
    path_override: Option<PathBuf>,
) -> anyhow::Result<(std::sync::Arc<Database>, PathBuf)> {
    let db_config = config.database.clone().unwrap_or_default();

    let db_path = match path_override.or(db_config.path) {
        Some(path) => path,
        None => get_db_path()?,
    };
    let pool_size = db_config.pool_size.unwrap_or(DEFAULT_POOL_SIZE);

    let db = Database::new(&db_path, pool_size)?;
    Ok((std::sync::Arc::new(db), db_path))
}
