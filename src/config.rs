use std::env;
use std::path::PathBuf;

const CACHE_DIR: &str = "fpl_improver";
const DEFAULT_SNAPSHOT_FILE: &str = "players.sqlite";
const DEFAULT_MODEL_PATH: &str = "assets/fpl_models_v1.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub snapshot_path: PathBuf,
    pub model_path: PathBuf,
}

impl EngineConfig {
    /// `FPL_SNAPSHOT_PATH` and `FPL_MODEL_PATH`, falling back to the cache
    /// directory snapshot and the bundled model artifact.
    pub fn from_env() -> Self {
        let snapshot_path = path_var("FPL_SNAPSHOT_PATH")
            .or_else(default_snapshot_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE));
        let model_path =
            path_var("FPL_MODEL_PATH").unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        Self {
            snapshot_path,
            model_path,
        }
    }
}

pub fn default_snapshot_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DEFAULT_SNAPSHOT_FILE))
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
