// Level-of-detail pyramids over huge sorted CSV files.
//
// A source CSV sorted on a key column is built once into a pyramid of
// padded files (see strata_build): level 0 is the source itself, each
// further level halves the row count and keeps min/max bands for the
// tracked columns. A viewer then asks for "about N rows between these two
// keys" and gets them from the level that fits (see strata_view), either
// directly or through a background worker.

pub use strata_base::{err, Error, ErrorKind, Result};
pub use strata_build::{
    BuildOptions, BuildStatus, BuiltPyramid, ContentFingerprint, Fingerprint, LevelInfo, Manifest,
    MetadataFingerprint, PyramidBuilder,
};
pub use strata_store::{
    ioutil, Column, ColumnType, ConcatenatedIndex, FixedWidthIndex, Records, Row, SortedColumnIndex, Value,
};
pub use strata_view::{
    choose_level, ColumnBand, Pyramid, Request, Response, SelectionResult, ViewOptions, ViewportWorker,
    WorkerClient, WorkerState,
};

#[cfg(test)]
mod test;
