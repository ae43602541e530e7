//! Matrix logarithm, exponential and geodesics on the rotation group SO(n).
//!
//! The crate is a pure numerical kernel: every operation takes matrices by
//! reference and returns fresh values, so it can be called from any number of
//! threads without synchronization.
//!
//! - [`linalg`]: dense n×n matrices and the real Schur decomposition
//! - [`manifold`]: the two logarithm strategies, the exponential and SO(n) helpers
//! - [`geodesic`]: distance, interpolation and directional derivative
//! - [`flat`]: the same operations on flat row-major buffers

pub mod error;
pub mod flat;
pub mod geodesic;
pub mod linalg;
pub mod logger;
pub mod manifold;

pub use error::{KernelError, KernelResult};
pub use geodesic::Geodesic;
pub use logger::{init_logger, init_logger_with_level};
pub use manifold::{LogMethod, MatrixFunctionConfig};
