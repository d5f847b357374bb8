use serde::Deserialize;

use crate::error::Result;
use crate::storage::StorageType;

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    pub storage_type: StorageType,

    /// Directory holding the engine files, ignored by the memory backend.
    pub path: String,

    /// Engine page cache size in bytes, engine default when unset.
    #[serde(default)]
    pub cache_size: Option<usize>,
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("storage_type", "disk")?
            .set_default("path", "data")?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("EMBEDKV"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}
