//! Messages exchanged with the conferencing backend

mod signed_identity;

pub use signed_identity::*;
