use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_base::{err, ErrorKind, Result};
use strata_store::ioutil::FileWriter;
use strata_store::Column;

pub const MANIFEST_FILE: &str = "manifest.msgpack";
const MANIFEST_TEMP: &str = "manifest.msgpack.tmp";

/// The flat file holding level `depth` of a pyramid in `dir`.
pub fn level_file(dir: &Path, depth: u32) -> PathBuf {
    dir.join(format!("{}.csv", depth))
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LevelInfo {
    pub depth: u32,
    /// Data rows, header excluded.
    pub rows: u64,
    /// Bytes per record, terminator included.
    pub record_len: u64,
}

/// Written last by a successful build; its presence marks the pyramid
/// directory complete.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub key: Column,
    pub columns: Vec<Column>,
    pub fingerprint: String,
    pub levels: Vec<LevelInfo>,
}

impl Manifest {
    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST_FILE).is_file()
    }

    pub fn load(dir: &Path) -> Result<Manifest> {
        let path = dir.join(MANIFEST_FILE);
        let buf = match std::fs::read(&path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(err(
                    ErrorKind::Incomplete,
                    format!("{} has no {}", dir.display(), MANIFEST_FILE),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(rmp_serde::from_slice(&buf)?)
    }

    /// Writes the manifest under a temporary name, then renames it into
    /// place so readers never see a partial file.
    pub fn store(&self, dir: &Path) -> Result<()> {
        let buf = rmp_serde::to_vec(self)?;
        let temp = dir.join(MANIFEST_TEMP);
        let _ = std::fs::remove_file(&temp);
        let mut w = FileWriter::try_create_non_existing(&temp)?;
        w.write_all(&buf)?;
        let temp = w.finish()?;
        std::fs::rename(temp, dir.join(MANIFEST_FILE))?;
        Ok(())
    }

    /// Paths of every level file, finest first.
    pub fn level_files(&self, dir: &Path) -> Vec<PathBuf> {
        self.levels.iter().map(|l| level_file(dir, l.depth)).collect()
    }
}
