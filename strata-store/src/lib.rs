// Storage for sorted, fixed-width CSV data:
//
// - A padded file has every line right-padded with spaces to one width, so
//   line i starts at byte i * width and any row is a single seek away.
// - A concatenated index glues several padded files (one per build chunk)
//   into one sequence, mapping a global row to (part, local row) through
//   prefix sums.
// - A sorted column index decodes one column of a concatenated sequence
//   as a key and bisects on it, answering "rows with keys in [a;b]" and
//   "how many rows in [a;b]" in O(log n) reads.
//
// Everything is generic over `ioutil::Reader` so tests run over memory.

mod column;
mod concat;
pub mod ioutil;
mod padded;
mod records;
mod sorted;

pub use column::{field, header_fields, locate_unique, Column, ColumnType, Projection, Value, DELIMITER};
pub use concat::ConcatenatedIndex;
pub use padded::FixedWidthIndex;
pub use records::{RecordIter, Records};
pub use sorted::{Row, RowIter, SortedColumnIndex};
