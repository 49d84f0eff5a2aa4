// Builds a level-of-detail pyramid for one sorted CSV source:
//
//   <root>/<fingerprint>/0.csv      the source, padded
//   <root>/<fingerprint>/1.csv      pairs of level 0 rows, min/max per column
//   <root>/<fingerprint>/d.csv      pairs of level d-1 rows
//   <root>/<fingerprint>/manifest.msgpack
//
// Each stage runs its chunks on the pool and waits for all of them before
// the next stage starts. Only level 0 is cut at source byte offsets; every
// later level halves the level below over row ranges that start on even
// rows. Chunk outputs go to <dir>/<level>/<chunk>.csv, all padded to one
// width, and are concatenated into the flat level files once every level
// exists.
//
// Claiming the directory with a single mkdir is the only coordination
// between concurrent builders: whoever loses gets the existing files back.
// The manifest is written last, so a directory without one is either still
// being built or was abandoned by a failed build.

use std::fs::File;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chunks::{compute_chunks, records_in_range, row_chunks};
use crate::fingerprint::{ContentFingerprint, Fingerprint, MetadataFingerprint};
use crate::manifest::{level_file, LevelInfo, Manifest};
use crate::pad::{pad_range_to, widest_in_range, PadStats};
use crate::sample::Sampler;
use strata_base::{err, ErrorKind, Result};
use strata_store::ioutil::{FileReader, FileWriter, Reader, Writer};
use strata_store::{header_fields, Column, ConcatenatedIndex, FixedWidthIndex, Records};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Pool size and chunk count; the number of logical CPUs when absent.
    pub workers: Option<usize>,
    /// Fingerprint sources by content instead of size and mtime.
    pub strict_fingerprint: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BuildStatus {
    /// This call produced the levels.
    Built,
    /// Another build had already claimed the directory.
    Existing,
}

#[derive(Clone, Debug)]
pub struct BuiltPyramid {
    pub dir: PathBuf,
    /// Level files, finest first.
    pub levels: Vec<PathBuf>,
    pub status: BuildStatus,
}

impl BuiltPyramid {
    /// False while the build that claimed the directory is still running,
    /// or if it failed.
    pub fn is_complete(&self) -> bool {
        Manifest::exists(&self.dir)
    }

    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.dir)
    }
}

pub struct PyramidBuilder {
    workers: usize,
    pool: ThreadPool,
    fingerprint: Box<dyn Fingerprint>,
}

impl PyramidBuilder {
    pub fn new() -> Result<Self> {
        Self::from_options(&BuildOptions::default())
    }

    pub fn from_options(opts: &BuildOptions) -> Result<Self> {
        let workers = match opts.workers {
            Some(0) => return Err(err(ErrorKind::Contract, "a build needs at least one worker")),
            Some(n) => n,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-build-{}", i))
            .build()?;
        let fingerprint: Box<dyn Fingerprint> = if opts.strict_fingerprint {
            Box::new(ContentFingerprint)
        } else {
            Box::new(MetadataFingerprint)
        };
        Ok(PyramidBuilder {
            workers,
            pool,
            fingerprint,
        })
    }

    pub fn with_fingerprint(self, fingerprint: impl Fingerprint + 'static) -> Self {
        PyramidBuilder {
            fingerprint: Box::new(fingerprint),
            ..self
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The directory `build` would use for `source` keyed on `key`.
    pub fn target_dir(&self, source: &Path, root: &Path, key: &Column) -> Result<PathBuf> {
        Ok(root.join(self.fingerprint.fingerprint(source, &key.name)?))
    }

    pub fn build(&self, source: &Path, root: &Path, key: &Column, tracked: &[Column]) -> Result<BuiltPyramid> {
        let mut rd = FileReader::try_open_existing(source)?;
        let size = rd.byte_len()?;
        let header = match records_in_range(&mut rd, 0..size)?.next() {
            Some(rec) => header_fields(&rec?),
            None => {
                return Err(err(
                    ErrorKind::Parse,
                    format!("{} has no header", source.display()),
                ))
            }
        };
        let sampler = Sampler::for_source(&header, key, tracked)?;

        let dir = self.target_dir(source, root, key)?;
        std::fs::create_dir_all(root)?;
        match std::fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                info!(target: "strata", dir = %dir.display(), "pyramid already claimed");
                return existing(dir);
            }
            Err(e) => return Err(e.into()),
        }

        info!(target: "strata", source = %source.display(), dir = %dir.display(),
              workers = self.workers, "building pyramid");
        let job = Job {
            source,
            size,
            dir: &dir,
            key,
            tracked,
            workers: self.workers,
        };
        let levels = match self.pool.install(|| job.run(&mut rd, &sampler)) {
            Ok(levels) => levels,
            Err(e) => {
                warn!(target: "strata", dir = %dir.display(), error = %e,
                      "pyramid build failed, directory left without manifest");
                return Err(e);
            }
        };
        let manifest = Manifest {
            key: key.clone(),
            columns: tracked.to_vec(),
            fingerprint: dir_name(&dir),
            levels,
        };
        manifest.store(&dir)?;
        info!(target: "strata", dir = %dir.display(), levels = manifest.levels.len(), "pyramid built");
        Ok(BuiltPyramid {
            levels: manifest.level_files(&dir),
            dir,
            status: BuildStatus::Built,
        })
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// Level files of a directory claimed by someone else. Falls back to a
// directory listing when that build has not written its manifest yet.
fn existing(dir: PathBuf) -> Result<BuiltPyramid> {
    let levels = match Manifest::load(&dir) {
        Ok(manifest) => manifest.level_files(&dir),
        Err(e) if e.is(ErrorKind::Incomplete) => listed_levels(&dir)?,
        Err(e) => return Err(e),
    };
    Ok(BuiltPyramid {
        dir,
        levels,
        status: BuildStatus::Existing,
    })
}

fn listed_levels(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut depths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |x| x == "csv") {
            if let Some(depth) = path.file_stem().and_then(|s| s.to_str()?.parse::<u32>().ok()) {
                depths.push(depth);
            }
        }
    }
    depths.sort_unstable();
    Ok(depths.into_iter().map(|d| level_file(dir, d)).collect())
}

// Transient per-chunk files of one level.
struct Stage {
    depth: u32,
    files: Vec<PathBuf>,
    rows: u64,
}

struct Job<'a> {
    source: &'a Path,
    size: u64,
    dir: &'a Path,
    key: &'a Column,
    tracked: &'a [Column],
    workers: usize,
}

impl<'a> Job<'a> {
    fn run(&self, rd: &mut FileReader, sampler: &Sampler) -> Result<Vec<LevelInfo>> {
        let chunks = compute_chunks(rd, self.size, self.workers)?;
        debug!(target: "strata", chunks = chunks.len(), "source split");

        let mut stages = vec![self.pad_source(&chunks)?];
        // Level 1 reads the padded level 0, so its pairs line up with
        // global row numbers whatever the chunking of the source was.
        if stages[0].rows > 1 {
            let level1 = self.sample_level(&stages[0], sampler)?;
            stages.push(level1);
        }
        loop {
            let prev = &stages[stages.len() - 1];
            if prev.rows <= 1 {
                break;
            }
            let header = FixedWidthIndex::open_path(&prev.files[0], 0)?.at(0)?;
            let sampler = Sampler::for_level(&header_fields(&header), self.key, self.tracked)?;
            let next = self.sample_level(prev, &sampler)?;
            stages.push(next);
        }

        stages
            .par_iter()
            .map(|stage| self.merge(stage))
            .collect::<Result<Vec<_>>>()
    }

    fn chunk_dir(&self, depth: u32) -> Result<PathBuf> {
        let path = self.dir.join(depth.to_string());
        std::fs::create_dir(&path)?;
        Ok(path)
    }

    fn pad_source(&self, chunks: &[Range<u64>]) -> Result<Stage> {
        let chunk_dir = self.chunk_dir(0)?;
        let inputs = chunks
            .iter()
            .map(|range| (self.source.to_path_buf(), range.clone()))
            .collect::<Vec<_>>();
        let padded = pad_parts(&inputs, &chunk_dir)?;
        let records: u64 = padded.iter().map(|(_, s)| s.records).sum();
        let stage = Stage {
            depth: 0,
            files: padded.into_iter().map(|(p, _)| p).collect(),
            rows: records.saturating_sub(1),
        };
        debug!(target: "strata", depth = 0, rows = stage.rows, "level padded");
        Ok(stage)
    }

    // Halves `prev` into the next level. Row ranges start on even rows, so
    // every pair is the same whatever the worker count.
    fn sample_level(&self, prev: &Stage, sampler: &Sampler) -> Result<Stage> {
        let depth = prev.depth + 1;
        let chunk_dir = self.chunk_dir(depth)?;
        let ranges = row_chunks(prev.rows, self.workers);
        let sampled = ranges
            .par_iter()
            .enumerate()
            .map(|(i, rows)| {
                let mut seq = open_sequence(&prev.files)?;
                let records = seq.scan(rows.start, rows.end)?;
                let temp = chunk_dir.join(format!("{}.sampled", i));
                let mut w = FileWriter::try_create_non_existing(&temp)?;
                let written = sampler.sample(records, i == 0, &mut w)?;
                w.finish()?;
                let size = std::fs::metadata(&temp)?.len();
                Ok(((temp, 0..size), written))
            })
            .collect::<Result<Vec<_>>>()?;
        let rows: u64 = sampled.iter().map(|(_, rows)| rows).sum();
        let inputs = sampled.into_iter().map(|(input, _)| input).collect::<Vec<_>>();
        let padded = pad_parts(&inputs, &chunk_dir)?;
        for (temp, _) in &inputs {
            std::fs::remove_file(temp)?;
        }
        debug!(target: "strata", depth, rows, "level sampled");
        Ok(Stage {
            depth,
            files: padded.into_iter().map(|(p, _)| p).collect(),
            rows,
        })
    }

    // Concatenates the chunk files of a stage into its flat level file.
    fn merge(&self, stage: &Stage) -> Result<LevelInfo> {
        let target = level_file(self.dir, stage.depth);
        let mut nonempty = Vec::new();
        for path in &stage.files {
            let part = FixedWidthIndex::open_path(path, 0)?;
            if !part.is_empty() {
                nonempty.push((path, part.record_len()));
            }
        }
        let record_len = nonempty.first().map_or(0, |&(_, len)| len);
        if let Some((path, len)) = nonempty.iter().find(|&&(_, len)| len != record_len) {
            return Err(err(
                ErrorKind::NotPadded,
                format!("{} has {}-byte records, expected {}", path.display(), len, record_len),
            ));
        }
        match nonempty.as_slice() {
            [] => std::fs::rename(&stage.files[0], &target)?,
            [(only, _)] => std::fs::rename(only, &target)?,
            parts => {
                let mut dst = FileWriter::try_create_non_existing(&target)?;
                for (path, _) in parts {
                    io::copy(&mut File::open(path)?, &mut dst)?;
                }
                dst.finish()?;
            }
        }
        if let Some(chunk_dir) = stage.files[0].parent() {
            std::fs::remove_dir_all(chunk_dir)?;
        }
        debug!(target: "strata", depth = stage.depth, rows = stage.rows, "level merged");
        Ok(LevelInfo {
            depth: stage.depth,
            rows: stage.rows,
            record_len,
        })
    }
}

/// Pads each `(file, byte range)` input into `<chunk_dir>/<i>.csv`. Every
/// output shares the width of the longest record across all inputs, so the
/// chunk files of one level concatenate into a padded file.
pub(crate) fn pad_parts(inputs: &[(PathBuf, Range<u64>)], chunk_dir: &Path) -> Result<Vec<(PathBuf, PadStats)>> {
    let width = inputs
        .par_iter()
        .map(|(path, range)| widest_in_range(&mut FileReader::try_open_existing(path)?, range.clone()))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .max()
        .unwrap_or(0);
    inputs
        .par_iter()
        .enumerate()
        .map(|(i, (path, range))| {
            let out = chunk_dir.join(format!("{}.csv", i));
            let mut src = FileReader::try_open_existing(path)?;
            let mut dst = FileWriter::try_create_non_existing(&out)?;
            let stats = pad_range_to(&mut src, range.clone(), width, &mut dst)?;
            dst.finish()?;
            Ok((out, stats))
        })
        .collect()
}

fn open_sequence(files: &[PathBuf]) -> Result<ConcatenatedIndex<FixedWidthIndex<FileReader>>> {
    let parts = files
        .iter()
        .map(|p| FixedWidthIndex::open_path(p, 0))
        .collect::<Result<Vec<_>>>()?;
    ConcatenatedIndex::new(parts, 1)
}
