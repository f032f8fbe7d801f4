//! crypto: CTR transformer, counter bookkeeping and nonce helpers.

pub mod types;
pub mod counter;
pub mod transformer;
pub mod nonce;

pub use types::*;
pub use counter::*;
pub use transformer::*;
pub use nonce::*;
