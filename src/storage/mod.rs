use std::fmt::Debug;

use serde::Deserialize;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;

pub mod disk;
pub mod memory;

/// A key/value store, where both keys and values are arbitrary byte
/// strings. Every call is a single atomic unit of work, and writes are
/// durable once `set` or `delete` returns, for backends that persist at all.
///
/// The Storage trait is designed as `trait object` compatible, i.e., follow
/// the [object safety rules](https://doc.rust-lang.org/reference/items/traits.html#object-safety),
/// so that callers hold a `Box<dyn Storage>` and never depend on a concrete
/// backend. Data operations take `&self` and may be issued from several
/// threads at once; `close` takes `&mut self`, so it cannot overlap them.
pub trait Storage: Debug + Send + Sync {
    /// Sets a value for a key, overwrite the existing value if any.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Gets the value with a given key, `None` if the key is absent.
    /// A present key with an empty value yields `Some(vec![])`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Removes a key from the storage. Removing an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Releases the resources held by the storage. Any later data operation
    /// fails with `Error::Closed`, a second close is a no-op.
    fn close(&mut self) -> Result<()>;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Memory,
    Disk,
}

pub fn new_storage(cfg: &Config) -> Result<Box<dyn Storage>> {
    match cfg.storage_type {
        StorageType::Memory => Ok(Box::new(memory::Memory::new())),
        StorageType::Disk => {
            let disk = match cfg.cache_size {
                Some(size) => disk::Disk::open_with_cache_size(&cfg.path, size)?,
                None => disk::Disk::open(&cfg.path)?,
            };
            Ok(Box::new(disk))
        }
    }
}
