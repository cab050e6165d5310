mod ftrl;
mod kernel;
mod optimizer;
mod sparse;

pub use ftrl::Ftrl;
pub use kernel::{
    PAR_CHUNK_SIZE, ftrl_compute, ftrl_step, ftrl_update, ftrl_update_into, ftrl_update_par,
};
pub use optimizer::Optimizer;
pub use sparse::{SparseIndex, check_indices, sparse_ftrl_update, sparse_ftrl_update_par};
