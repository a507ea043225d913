mod reading;
mod sample;

pub use reading::{RawReading, SourceRef};
pub use sample::{format_ts, parse_ts, Sample};
