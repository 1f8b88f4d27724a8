#![deny(missing_docs)]

//! # ZRO Core
//!
//! Assembles OpenAPI 3.0 documents from a framework's route table and
//! per-unit documentation declarations.

/// Shared error types.
pub mod error;

/// Non-fatal warnings collected during a run.
pub mod diagnostics;

/// Tag and operation id derivation, path template rewriting.
pub mod naming;

/// Route table parsing and lookup.
pub mod routes;

/// Deep merge and blank pruning of JSON trees.
pub mod merge;

/// Component bags, schema objects and inline hoisting.
pub mod components;

/// Dry fragments and their selectors.
pub mod fragments;

/// Documented actions and their lifecycle.
pub mod action;

/// Per-unit accumulation.
pub mod unit;

/// Per-run unit registry.
pub mod registry;

/// Generator configuration.
pub mod config;

/// Document assembly.
pub mod assembler;

/// Writing documents to disk.
pub mod output;

/// Response stub generation.
pub mod stubs;

pub use action::{ActionSpec, ActionState};
pub use assembler::{Assembler, Document};
pub use components::{
    ComponentKind, ComponentsBag, ComponentsBuilder, ParamLocation, SchemaObj, COMPONENT_MARKER,
};
pub use config::{Config, DocSettings};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{AppError, AppResult};
pub use fragments::{Fragment, FragmentStore, Selector};
pub use output::{write_docs, WriteReport};
pub use registry::Registry;
pub use routes::{
    parse_route_line, JsonRoutes, Route, RouteIndex, RouteLine, RouteSource, RouteTableText,
    StaticRoutes,
};
pub use stubs::{NoStubs, StubHook, StubWriter};
pub use unit::{ApiOptions, TagDef, UnitDoc, UnitScope};
