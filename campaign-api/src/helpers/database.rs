use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ApiConfig;

/// Returns the path to the campaign database
///
/// Uses `[database] path` from the config when set, otherwise the platform
/// data directory:
///
/// - **macOS**: `~/Library/Application Support/campaign-dashboard/db.sqlite`
/// - **Linux**: `~/.local/share/campaign-dashboard/db.sqlite`
/// - **Windows**: `%LOCALAPPDATA%\campaign-dashboard\db.sqlite`
pub fn get_db_path(config: &ApiConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = config
        .database
        .as_ref()
        .and_then(|db| db.path.as_ref())
    {
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("campaign-dashboard").join("db.sqlite"))
}

/// Initialize the database connection
pub fn initialize_database(config: &ApiConfig) -> anyhow::Result<Arc<crate::database::Database>> {
    let db_path = get_db_path(config)?;
    let db = crate::database::Database::new(&db_path)?;
    Ok(Arc::new(db))
}
