//! # bin2c-core
//!
//! A library for embedding binary files into C programs as `unsigned char`
//! array definitions.
//!
//! This crate provides the core functionality for:
//! - Deriving array names and output paths from an input file path
//! - Streaming binary data into C array element literals
//! - Emitting a static header, or a global source/header pair with a size macro
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`path`]: Bounded path scanning and output path derivation
//! - [`macro_name`]: Upper-cased include guard and size macro names
//! - [`encoder`]: Chunked byte-to-literal streaming
//! - [`emitter`]: Declaration shapes and output file orchestration
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use bin2c_core::{symbol_name, ArrayName, DeclarationEmitter, DeclarationShape, OutputStem};
//! use std::fs::File;
//!
//! let input = "assets/logo.png";
//! let mut source = File::open(input)?;
//!
//! // Writes assets/logo.c and assets/logo.h
//! let name = ArrayName::new(symbol_name(input)).prefix(Some("g_"));
//! let shape = DeclarationShape::Global { length_suffix: "_len".into() };
//! let stem = OutputStem::from_input(input)?;
//!
//! let report = DeclarationEmitter::new().emit_to_files(&mut source, &name, &shape, &stem)?;
//! println!("{} bytes embedded", report.count);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`OutputFactory`]: Decide where generated files are written

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod emitter;
pub mod encoder;
pub mod error;
pub mod macro_name;
pub mod path;

// Re-export primary types for convenience
pub use emitter::{
    write_global_header, ArrayName, DeclarationEmitter, DeclarationShape, EmitReport, FsOutputs,
    HeaderMacros, MemoryOutputs, OutputFactory,
};
pub use encoder::{ElementCount, EncoderConfig, LiteralWidth, StreamEncoder};
pub use error::{Error, Result};
pub use macro_name::build_macro_name;
pub use path::{
    derive_output_path, find_filename, strip_extension_in_place, symbol_name, symbol_name_lossy,
    OutputKind, OutputStem,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
