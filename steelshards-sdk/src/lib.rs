#![warn(missing_docs)]
#![doc(html_no_source)]

//! SDK for building [Steelshards] projects.
//!
//! # Background
//!
//! A Steelshards project is a directory of Solidity sources (see
//! [`Config::inputs_dir`](steelshards_config::Config::inputs_dir)) plus an optional set of
//! package-style dependencies (e.g., `@openzeppelin/...`) installed under a module
//! directory.  Building a project goes through three stages:
//!
//! 1. The [source resolver](resolve::SourceResolver) walks the input tree, follows every
//!    `import "...";` statement and assembles a single [`VirtualSourceSet`] keyed by
//!    project-relative virtual paths.  Import statements are rewritten to point at those
//!    virtual paths, so sources can live anywhere on disk.
//! 2. The [compiler gateway](compiler::SolcGateway) hands the whole source set to `solc`
//!    in standard-JSON mode and parses the [result](compiler::CompileResult).
//! 3. For every compiled contract, the [generators](gen) turn the contract ABI into
//!    TypeScript: either a plain interface declaration or a typed client class wrapping
//!    an `ethers.Contract`.
//!
//! The [`Builder`](build::Builder) drives the whole pipeline, and the
//! [`Session`](session::Session) keeps the last build around together with the selected
//! network.
//!
//! # Example
//!
//! ```no_run
//! use steelshards_config::Config;
//! use steelshards_sdk::build::Builder;
//! use steelshards_sdk::compiler::SolcGateway;
//!
//! async {
//!   let cfg = Config::nearest().expect("steelshards.json not found");
//!   let solc = SolcGateway::from_config(&cfg);
//!   let report = Builder::new(&cfg, &solc).build(false).await.unwrap();
//!   for path in &report.emitted {
//!     println!("generated {}", path.display());
//!   }
//! };
//! ```
//!
//! [Steelshards]: https://github.com/steelshards/steelshards

use crate::compiler::CompileDiagnosticError;
use crate::gen::common::GenError;
use std::io;
use std::path::PathBuf;
use steelshards_config::ConfigError;
use thiserror::Error;

/// Typed model of the JSON ABI.
pub mod abi;
/// The build pipeline (resolve, compile, emit).
pub mod build;
/// The compiler protocol and the `solc` gateway.
pub mod compiler;
/// TypeScript generators.
pub mod gen;
/// Import resolution and the virtual source tree.
pub mod resolve;
/// Explicit build/network session state.
pub mod session;

pub use crate::resolve::{Source, VirtualSourceSet};

/// Errors raised by this crate.
#[derive(Debug, Error)]
pub enum SteelshardsError {
    /// A relative import points at a file that does not exist.
    #[error("Error while resolving imports: File not found: {}", .path.display())]
    MissingImport {
        /// The unresolved (real) path
        path: PathBuf,
        /// The file containing the import
        source_file: Option<PathBuf>,
    },
    /// A generic error when reading a file
    #[error("Error reading file {0}")]
    ReadFileError(PathBuf, #[source] io::Error),
    /// A generic error when writing a file
    #[error("Error writing file {0}")]
    WriteFileError(PathBuf, #[source] io::Error),
    /// Error raised when the input directory cannot be traversed
    #[error("Error walking source directory {0}")]
    WalkError(PathBuf, #[source] walkdir::Error),
    /// Error raised when the compiler process cannot be started
    #[error("Failed to start compiler '{0}'")]
    CompilerSpawn(PathBuf, #[source] io::Error),
    /// Error raised when talking to a running compiler process fails
    #[error("Error communicating with the compiler")]
    CompilerIo(#[source] io::Error),
    /// The compiler answered with something that is not a compile result
    #[error("Malformed compiler output: {reason}")]
    CompilerProtocol {
        /// What went wrong
        reason: String,
        /// The underlying JSON error (if any)
        #[source]
        source: Option<serde_json::Error>,
    },
    /// The compiler reported one or more errors
    #[error(transparent)]
    Diagnostics(#[from] CompileDiagnosticError),
    /// Error raised when serializing an artifact
    #[error("Error serializing {0} to JSON")]
    JsonError(String, #[source] serde_json::Error),
    /// Error raised by the TypeScript generators
    #[error(transparent)]
    GenError(#[from] GenError),
    /// Error raised when build results are requested before any successful build
    #[error("No build available. Please build the project first")]
    NoBuild,
    /// Error raised when a contract is not part of the last build
    #[error("Contract not found: {0}")]
    UnknownContract(String),
    /// Error forwarded from the project configuration
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
}

/// Result with error type defaulting to [`SteelshardsError`].
pub type Result<T, E = SteelshardsError> = ::core::result::Result<T, E>;
