use std::path::{Path, PathBuf};

use tracing::debug;

use strata_base::{err, ErrorKind, Result};
use strata_build::{level_file, max_name, min_name, Manifest};
use strata_store::ioutil::FileReader;
use strata_store::{Column, SortedColumnIndex};

/// The levels of a completed pyramid directory, opened for a key column and
/// a set of value columns.
///
/// Level 0 exposes each value column once; its raw value is both low and
/// high. Level `d > 0` exposes `<col>_min` and `<col>_max` per value column,
/// in that order.
pub struct Pyramid {
    dir: PathBuf,
    key: Column,
    columns: Vec<Column>,
    levels: Vec<SortedColumnIndex<FileReader>>,
}

impl Pyramid {
    pub fn open(dir: &Path, key: Column, columns: &[Column]) -> Result<Self> {
        let manifest = Manifest::load(dir)?;
        if manifest.key.name != key.name {
            return Err(err(
                ErrorKind::ColumnNotFound,
                format!(
                    "{} is keyed on {:?}, not {:?}",
                    dir.display(),
                    manifest.key.name,
                    key.name
                ),
            ));
        }
        let bands = columns
            .iter()
            .flat_map(|c| [c.renamed(min_name(&c.name)), c.renamed(max_name(&c.name))])
            .collect::<Vec<_>>();
        let levels = manifest
            .levels
            .iter()
            .map(|info| {
                let path = level_file(dir, info.depth);
                let cols = if info.depth == 0 { columns } else { &bands[..] };
                SortedColumnIndex::open_paths(&[path], key.clone(), cols)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(target: "strata", dir = %dir.display(), levels = levels.len(), "opened pyramid");
        Ok(Pyramid {
            dir: dir.to_path_buf(),
            key,
            columns: columns.to_vec(),
            levels,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key(&self) -> &Column {
        &self.key
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of levels, raw level included.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&mut self, depth: usize) -> Result<&mut SortedColumnIndex<FileReader>> {
        let n = self.levels.len();
        self.levels.get_mut(depth).ok_or_else(|| {
            err(
                ErrorKind::IndexOutOfRange,
                format!("level {} of {}", depth, n),
            )
        })
    }

    pub(crate) fn levels_mut(&mut self) -> &mut [SortedColumnIndex<FileReader>] {
        &mut self.levels
    }
}
