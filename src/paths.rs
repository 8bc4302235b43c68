use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub(crate) const STATE_DB_ENV: &str = "PODCAST_STATE_DB";

pub fn state_db_path() -> Result<PathBuf> {
    state_db_path_from_env(env::var_os(STATE_DB_ENV))
}

pub(crate) fn state_db_path_from_env(env_value: Option<OsString>) -> Result<PathBuf> {
    match env_value {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => {
            let base = dirs::data_dir().context("unable to resolve data directory")?;
            Ok(base.join("podcast-app").join("state.db"))
        }
    }
}
