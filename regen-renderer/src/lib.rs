//! # regen-renderer
//!
//! The template renderer collaborator: a narrow [`Renderer`] trait plus two
//! engines, an external tool ([`CommandRenderer`]) and in-process Tera
//! ([`TeraRenderer`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use regen_renderer::{build, RenderRequest};
//!
//! fn render_one(layout: &regen_core::Layout) {
//!     let renderer = build(&layout.renderer);
//!     if renderer.preflight().is_ok() {
//!         let _ = renderer.render(&RenderRequest {
//!             template: Path::new("Sources/Tokens.swift.gyb"),
//!             output: Path::new("/tmp/Tokens.swift"),
//!             flags: &[],
//!             annotate: false,
//!         });
//!     }
//! }
//! ```

pub mod command;
pub mod context;
pub mod engine;
pub mod error;

pub use command::CommandRenderer;
pub use context::RenderContext;
pub use engine::{build, RenderOutput, RenderRequest, Renderer, TeraRenderer};
pub use error::RenderError;
