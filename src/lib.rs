//! This library crate contains everything required to relay synchronous-looking requests over an asynchronous publish/subscribe channel.
//!
//! Submodules have been introduced to split responsibilities. Each module has a specific focus
//! and they together form a chain of dependencies from the low-level [`library`], over the
//! [`domain`] specific messages and identity handling, through the executable [`harness`], up to the high-level [`modules`](module).

#![deny(missing_docs)]
#![allow(clippy::nonstandard_macro_braces)]

pub mod constants;
pub mod domain;
pub mod harness;
pub mod library;
pub mod module;
