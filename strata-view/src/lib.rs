// Read side of a pyramid: open its levels, pick the level whose row count
// over a key range best matches a requested resolution, and serve such
// requests from a background thread.

mod pyramid;
mod selector;
mod worker;

pub use pyramid::Pyramid;
pub use selector::{choose_level, ColumnBand, SelectionResult};
pub use worker::{Request, Response, ViewOptions, ViewportWorker, WorkerClient, WorkerState};
