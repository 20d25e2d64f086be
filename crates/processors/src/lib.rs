//! Output processors.
//!
//! Both processors work over the same [`RawOutput`](simsweep_types::RawOutput)
//! shape and can be swapped without touching the runner or the session:
//!
//! - [`OutputPortProcessor`] - copies selected traces as `(time, value)` series
//! - [`SummaryProcessor`] - reduces selected traces to min/max/mean/final

mod ports;
mod selector;
mod summary;

pub use ports::{trace_samples, OutputPortProcessor};
pub use selector::{ChannelSelector, ChannelSource, ParseSelectorError};
pub use summary::SummaryProcessor;
