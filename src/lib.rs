//! FTRL-proximal weight updates over caller-owned buffers.
//!
//! The dense operator updates every weight, the sparse operator only the rows of a
//! `[rows, block_size]` weight matrix named by an index list. Both mutate the
//! weights and their interleaved `(n, z)` accumulators in place.

mod error;
pub mod ops;
pub mod optimization;
mod params;

pub use error::{FtrlErr, Result};
pub use ops::{FtrlOp, Inplace, OpSchema, SparseFtrlOp};
pub use optimization::{Ftrl, Optimizer, SparseIndex};
pub use params::{FtrlParams, FtrlSpec};
