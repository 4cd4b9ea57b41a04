//! Swaggerfold Core Library
//!
//! This library resolves the internal references of a Swagger 2.0 document,
//! expands self-referential definitions into finite trees, and normalizes every
//! parameter, response and schema into one uniform node shape.

pub mod compare;
pub mod config;
pub mod definitions;
pub mod diagnostics;
pub mod error;
pub mod normalize;
pub mod output;
pub mod pointer;
pub mod resolver;
pub mod source;
pub mod value;
pub mod walker;

pub use crate::{
    compare::{differences, structurally_equal, Difference, DifferenceKind},
    config::Config,
    diagnostics::{Diagnostic, DiagnosticKind, Diagnostics},
    error::{Error, Result},
    normalize::{Node, NodeKind},
    output::OutputFormat,
    pointer::{NestedRef, Pointer},
    resolver::{Input, Resolver},
    walker::HttpMethod,
};
