use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pyramid::Pyramid;
use strata_base::Result;
use strata_store::Value;

/// Picks the level to answer a request for `resolution` rows, given each
/// level's row count over the requested range, finest level first.
///
/// The level with the fewest rows that still reaches `resolution` wins; when
/// none reaches it, the level with the most rows. Ties go to the finer level.
pub fn choose_level(counts: &[u64], resolution: u64) -> usize {
    let sufficient = counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c >= resolution)
        .min_by_key(|&(i, &c)| (c, i));
    match sufficient {
        Some((i, _)) => i,
        None => counts
            .iter()
            .enumerate()
            .max_by_key(|&(i, &c)| (c, std::cmp::Reverse(i)))
            .map_or(0, |(i, _)| i),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnBand {
    pub name: String,
    pub mins: Vec<Value>,
    pub maxs: Vec<Value>,
}

/// Keys of the selected rows and, per requested column, the low and high
/// band around them. Every vector has one entry per key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub level: usize,
    pub keys: Vec<Value>,
    pub columns: Vec<ColumnBand>,
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn band(&self, name: &str) -> Option<&ColumnBand> {
        self.columns.iter().find(|b| b.name == name)
    }
}

impl Pyramid {
    /// Rows in `[start; stop]` on every level, finest first.
    pub fn counts(&mut self, start: Option<&Value>, stop: Option<&Value>) -> Result<Vec<u64>> {
        self.levels_mut()
            .iter_mut()
            .map(|level| level.count_between(start, stop))
            .collect()
    }

    /// About `resolution` rows covering `[start; stop]`, from the level that
    /// matches it best.
    pub fn select(&mut self, start: Option<&Value>, stop: Option<&Value>, resolution: u64) -> Result<SelectionResult> {
        let counts = self.counts(start, stop)?;
        let level = choose_level(&counts, resolution);
        debug!(target: "strata", ?counts, resolution, level, "level chosen");

        let mut columns = self
            .columns()
            .iter()
            .map(|c| ColumnBand {
                name: c.name.clone(),
                mins: Vec::new(),
                maxs: Vec::new(),
            })
            .collect::<Vec<_>>();
        let mut keys = Vec::new();
        let index = self.level(level)?;
        for row in index.range(start, stop)? {
            let (key, values) = row?;
            keys.push(key);
            for (i, band) in columns.iter_mut().enumerate() {
                let (lo, hi) = if level == 0 {
                    (values[i], values[i])
                } else {
                    (values[2 * i], values[2 * i + 1])
                };
                band.mins.push(lo);
                band.maxs.push(hi);
            }
        }
        Ok(SelectionResult {
            level,
            keys,
            columns,
        })
    }
}
