use std::collections::BTreeMap;
use std::sync::Mutex;

use log::trace;

use super::Storage;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug)]
pub struct Memory {
    bm: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: bool,
}

impl Memory {
    pub fn new() -> Memory {
        Memory { bm: Mutex::new(BTreeMap::new()), closed: false }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for Memory {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_open()?;
        trace!("memory set: key {} bytes, value {} bytes", key.len(), value.len());
        let mut bm = self.bm.lock()?;
        bm.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let bm = self.bm.lock()?;
        Ok(bm.get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.check_open()?;
        trace!("memory delete: key {} bytes", key.len());
        let mut bm = self.bm.lock()?;
        bm.remove(key);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.bm.get_mut()?.clear();
        Ok(())
    }
}
