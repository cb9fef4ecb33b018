//! Domain specific structures, implementations, and logic

pub mod event;
pub mod identity;
