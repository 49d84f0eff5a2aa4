mod builder;
mod chunks;
mod fingerprint;
mod manifest;
mod pad;
mod sample;

pub use builder::{BuildOptions, BuildStatus, BuiltPyramid, PyramidBuilder};
pub use chunks::{compute_chunks, records_in_range, row_chunks};
pub use fingerprint::{ContentFingerprint, Fingerprint, MetadataFingerprint};
pub use manifest::{level_file, LevelInfo, Manifest, MANIFEST_FILE};
pub use pad::{pad_all, pad_range, pad_range_to, widest_in_range, write_padded, PadStats};
pub use sample::{max_name, min_name, sampled_header, Accumulator, Sampler, PERIOD};
