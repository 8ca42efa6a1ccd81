//! Terminal console for the OpenArchive compliance email archive.
//!
//! The [`api`] module wraps the REST API behind the [`api::ArchiveApi`] trait, [`workflows`] composes
//! calls into user-level operations, and [`cli`] and [`ui`] are the two front ends over them.

pub mod api;
pub mod audit;
pub mod cli;
pub mod export;
pub mod models;
pub mod search;
pub mod selection;
pub mod session;
pub mod ui;
pub mod workflows;
