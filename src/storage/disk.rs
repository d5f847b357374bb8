use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use redb::{Database, ReadableTable, TableDefinition};

use super::Storage;
use crate::error::Error;
use crate::error::Result;

/// Name of the engine's database file inside the storage directory.
pub const DATA_FILE: &str = "data.redb";

const DATA_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("data");

/// A persistent store backed by a redb database in a directory.
///
/// Each call runs in its own transaction: `get` in a read transaction,
/// `set` and `delete` in a write transaction that is committed before the
/// call returns. redb commits with immediate durability, so a successful
/// write survives a crash. The engine takes an exclusive lock on the data
/// file, a second handle on the same directory fails to open until the
/// first one is closed or dropped.
pub struct Disk {
    dir: PathBuf,
    // None once closed
    db: Option<Database>,
}

impl Disk {
    /// Opens the store in `dir`, creating the directory and the database
    /// file if they do not exist.
    pub fn open(dir: impl AsRef<Path>) -> Result<Disk> {
        Self::open_inner(dir.as_ref(), None)
    }

    /// Same as [`Disk::open`] with an explicit engine cache size in bytes.
    pub fn open_with_cache_size(dir: impl AsRef<Path>, cache_size: usize) -> Result<Disk> {
        Self::open_inner(dir.as_ref(), Some(cache_size))
    }

    fn open_inner(dir: &Path, cache_size: Option<usize>) -> Result<Disk> {
        fs::create_dir_all(dir).map_err(|e| Error::Open(format!("{}: {}", dir.display(), e)))?;

        let mut builder = Database::builder();
        if let Some(size) = cache_size {
            builder.set_cache_size(size);
        }
        let file = dir.join(DATA_FILE);
        let db = builder
            .create(&file)
            .map_err(|e| Error::Open(format!("{}: {}", file.display(), e)))?;

        // Create the table up front so reads on a fresh store see an
        // empty table rather than a missing one.
        let init = || -> std::result::Result<(), redb::Error> {
            let txn = db.begin_write()?;
            txn.open_table(DATA_TABLE)?;
            txn.commit()?;
            Ok(())
        };
        init().map_err(|e| Error::Open(format!("{}: {}", file.display(), e)))?;

        debug!("opened disk storage at {}", dir.display());
        Ok(Disk { dir: dir.to_path_buf(), db: Some(db) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn db(&self) -> Result<&Database> {
        self.db.as_ref().ok_or(Error::Closed)
    }
}

impl Debug for Disk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disk").field("dir", &self.dir).field("open", &self.db.is_some()).finish()
    }
}

impl Storage for Disk {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let db = self.db()?;
        trace!("disk set: key {} bytes, value {} bytes", key.len(), value.len());
        let update = || -> std::result::Result<(), redb::Error> {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(DATA_TABLE)?;
                table.insert(key, value)?;
            }
            txn.commit()?;
            Ok(())
        };
        update().map_err(|e| Error::Write(e.to_string()))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let db = self.db()?;
        let view = || -> std::result::Result<Option<Vec<u8>>, redb::Error> {
            let txn = db.begin_read()?;
            let table = txn.open_table(DATA_TABLE)?;
            // the guard borrows from the transaction, copy the bytes out
            let value = table.get(key)?.map(|guard| guard.value().to_vec());
            Ok(value)
        };
        view().map_err(|e| Error::Read(e.to_string()))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let db = self.db()?;
        trace!("disk delete: key {} bytes", key.len());
        let update = || -> std::result::Result<(), redb::Error> {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(DATA_TABLE)?;
                table.remove(key)?;
            }
            txn.commit()?;
            Ok(())
        };
        update().map_err(|e| Error::Write(e.to_string()))
    }

    fn close(&mut self) -> Result<()> {
        let Some(db) = self.db.take() else {
            return Ok(());
        };
        // dropping the database flushes it and releases the file lock
        drop(db);
        sync_dir(&self.dir).map_err(|e| Error::Close(format!("{}: {}", self.dir.display(), e)))?;
        debug!("closed disk storage at {}", self.dir.display());
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ops() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Disk::open(dir.path())?;

        // get missing key
        assert_eq!(None, d.get(b"a")?);

        // set & get key
        d.set(b"a", &[1])?;
        assert_eq!(Some(vec![1]), d.get(b"a")?);

        // overwrite
        d.set(b"a", &[2])?;
        assert_eq!(Some(vec![2]), d.get(b"a")?);

        // delete
        d.delete(b"a")?;
        assert_eq!(None, d.get(b"a")?);

        // delete again
        d.delete(b"a")?;

        d.close()
    }

    #[test]
    fn test_creates_missing_dirs() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut d = Disk::open(&nested)?;
        assert_eq!(nested.as_path(), d.dir());
        assert!(nested.join(DATA_FILE).is_file());
        d.close()
    }

    #[test]
    fn test_reopen() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();

        let mut d = Disk::open(dir.path())?;
        d.set(b"kept", b"value")?;
        d.set(b"gone", b"value")?;
        d.delete(b"gone")?;
        d.close()?;

        let mut d = Disk::open(dir.path())?;
        assert_eq!(Some(b"value".to_vec()), d.get(b"kept")?);
        assert_eq!(None, d.get(b"gone")?);
        d.close()
    }

    #[test]
    fn test_reopen_after_drop() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        {
            let d = Disk::open(dir.path())?;
            d.set(b"a", b"1")?;
        }
        let mut d = Disk::open_with_cache_size(dir.path(), 1 << 20)?;
        assert_eq!(Some(b"1".to_vec()), d.get(b"a")?);
        d.close()
    }

    #[test]
    fn test_locked() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Disk::open(dir.path())?;

        let got = Disk::open(dir.path());
        assert!(matches!(got, Err(Error::Open(_))), "got {:?}", got);

        // lock is released on close
        d.close()?;
        let mut d = Disk::open(dir.path())?;
        d.close()
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DATA_FILE), vec![0xab; 8192]).unwrap();
        let got = Disk::open(dir.path());
        assert!(matches!(got, Err(Error::Open(_))), "got {:?}", got);
    }

    #[test]
    fn test_closed() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Disk::open(dir.path())?;
        d.close()?;

        assert_eq!(Err(Error::Closed), d.get(b"a"));
        assert_eq!(Err(Error::Closed), d.set(b"a", b"1"));
        assert_eq!(Err(Error::Closed), d.delete(b"a"));
        assert!(format!("{:?}", d).contains("open: false"));

        // close is idempotent
        d.close()
    }
}
