//! Protocol model and normalization pipeline for protogen
//!
//! This crate loads a parsed protocol description (categories of RPC
//! methods, typed fields, server / notification / response-code
//! declarations), resolves it, and produces the target-agnostic
//! [`NormalizedModel`] that code generators render from.

pub mod attribute;
pub mod error;
pub mod fingerprint;
pub mod normalize;
pub mod parse;
pub mod search;
pub mod type_ref;
pub mod types;
pub mod utils;

pub use attribute::*;
pub use error::*;
pub use normalize::*;
pub use parse::*;
pub use search::*;
pub use type_ref::*;
pub use types::*;
