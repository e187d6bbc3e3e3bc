use crate::Result;
use async_trait::async_trait;

mod input;
mod output;
mod solc;

pub use input::*;
pub use output::*;
pub use solc::*;

/// Something that turns a standard-JSON [`CompileRequest`] into a [`CompileResult`].
///
/// [`SolcGateway`] is the production implementation; tests substitute canned results.
#[async_trait]
pub trait CompilerBackend: Send + Sync {
    /// Compile all sources of a request in a single invocation.
    async fn compile(&self, request: &CompileRequest) -> Result<CompileResult>;
}

#[async_trait]
impl<T: CompilerBackend + ?Sized> CompilerBackend for &T {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileResult> {
        (**self).compile(request).await
    }
}
