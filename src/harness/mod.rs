//! Runtime harness to execute modules and their jobs

mod heart;
mod module;
mod redis;
mod service;

pub use self::redis::*;
pub use heart::*;
pub use module::*;
pub use service::*;
