//! In-memory transport for exercising communication primitives without a broker

mod transport;

pub use transport::*;
