pub mod dispatch;
pub mod error;
pub mod kmeans;
pub mod math;
pub mod oracle;
pub mod partition;
pub mod representatives;
pub mod router;
pub mod stats;

pub use error::{Result, ScatterError};

mod dispatch_tests;
mod kmeans_tests;
mod partition_tests;
mod router_tests;
