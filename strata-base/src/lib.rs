mod error;

pub use error::{err, Error, ErrorKind, Result};
