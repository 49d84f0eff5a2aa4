use std::fs::File;
use std::hash::Hasher;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;

use rapidhash::RapidHasher;
use strata_base::Result;

/// Names the cache directory of a (source file, key column) pair.
pub trait Fingerprint: Send + Sync {
    fn fingerprint(&self, source: &Path, key: &str) -> Result<String>;
}

/// Hashes size, modification time and key name. Never reads the file, so
/// an edit that keeps both size and mtime goes unnoticed.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetadataFingerprint;

impl Fingerprint for MetadataFingerprint {
    fn fingerprint(&self, source: &Path, key: &str) -> Result<String> {
        let meta = std::fs::metadata(source)?;
        let mtime = meta.modified()?.duration_since(UNIX_EPOCH)?.as_nanos();
        let ident = format!("{}-{}-{}", meta.len(), mtime, key);
        Ok(format!("{:016x}", rapidhash::rapidhash(ident.as_bytes())))
    }
}

/// Hashes every byte of the source plus the key name.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentFingerprint;

impl Fingerprint for ContentFingerprint {
    fn fingerprint(&self, source: &Path, key: &str) -> Result<String> {
        let mut file = File::open(source)?;
        let mut hasher = RapidHasher::default();
        let mut buf = vec![0_u8; 1 << 16];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.write(&buf[..n]);
        }
        hasher.write(b"-");
        hasher.write(key.as_bytes());
        Ok(format!("{:016x}", hasher.finish()))
    }
}
