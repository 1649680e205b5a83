//! Authorization model types and DSL parser.
//!
//! This module contains:
//! - Schema model structures (types, relations, rewrites, type restrictions)
//! - DSL parser for the OpenFGA model format

mod parser;
mod types;
#[cfg(test)]
mod types_proptest;

pub use parser::{parse, ParserError, ParserResult};
pub use types::*;
