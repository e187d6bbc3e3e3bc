use super::{CompileRequest, CompileResult, CompilerBackend};
use crate::{Result, SteelshardsError};
use async_trait::async_trait;
use itertools::Itertools;
use std::path::PathBuf;
use std::process::Stdio;
use steelshards_config::Config;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

/// Runs `solc --standard-json` as a subprocess.
///
/// The request is written to the compiler's stdin and the result read from its stdout.
/// The child process is killed if the future is dropped.
#[derive(Clone, Debug)]
pub struct SolcGateway {
    solc: PathBuf,
    allow_paths: Vec<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl SolcGateway {
    /// Gateway running the given solc binary (a name looked up in `PATH` or a path).
    pub fn new(solc: impl Into<PathBuf>) -> Self {
        SolcGateway {
            solc: solc.into(),
            allow_paths: vec![],
            working_dir: None,
        }
    }

    /// Gateway for a project: its configured binary, run from the project root with
    /// the module directory on the allowed path list.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.compiler.solc)
            .allow_path(cfg.module_dir())
            .working_dir(cfg.project_dir())
    }

    /// Add a directory the compiler may read from.
    pub fn allow_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.allow_paths.push(path.into());
        self
    }

    /// Run the compiler from this directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.solc);
        cmd.arg("--standard-json");
        if !self.allow_paths.is_empty() {
            cmd.arg("--allow-paths")
                .arg(self.allow_paths.iter().map(|p| p.display()).join(","));
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CompilerBackend for SolcGateway {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileResult> {
        let input = serde_json::to_vec(request)
            .map_err(|e| SteelshardsError::JsonError("compile request".into(), e))?;
        let mut cmd = self.command();
        debug!("Running {cmd:?}");
        let mut child = cmd
            .spawn()
            .map_err(|e| SteelshardsError::CompilerSpawn(self.solc.clone(), e))?;
        let mut stdin = child.stdin.take().ok_or_else(|| SteelshardsError::CompilerProtocol {
            reason: "compiler stdin is not available".into(),
            source: None,
        })?;
        let write = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(SteelshardsError::CompilerIo)?;
        trace!(
            "solc exited with {} ({} bytes of output)",
            output.status,
            output.stdout.len()
        );
        // A compiler that exits early closes its stdin; its output says why.
        if let Err(e) = written {
            debug!("Failed to write compile request: {e}");
        }
        parse_output(&output.stdout, &output.stderr)
    }
}

/// Parse the compiler's stdout as a [`CompileResult`].
pub fn parse_output(stdout: &[u8], stderr: &[u8]) -> Result<CompileResult> {
    serde_json::from_slice(stdout).map_err(|e| {
        let stderr = String::from_utf8_lossy(stderr);
        let reason = if stdout.iter().all(u8::is_ascii_whitespace) {
            "compiler produced no output".to_string()
        } else {
            "compiler output is not a standard-JSON result".to_string()
        };
        let reason = match stderr.trim() {
            "" => reason,
            msg => format!("{reason} ({msg})"),
        };
        SteelshardsError::CompilerProtocol {
            reason,
            source: Some(e),
        }
    })
}
