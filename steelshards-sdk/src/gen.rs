/// Typed client classes for ethers.js
pub mod client;
pub mod common;
/// Plain interface declarations
pub mod declaration;
/// ABI type to TypeScript type mapping
pub mod types;

/// First line of every generated client.
pub const GENERATED_HEADER: &str = "// Steelshards Generated Code";
