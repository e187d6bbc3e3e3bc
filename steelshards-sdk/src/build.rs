use crate::compiler::{
    CompileRequest, CompilerBackend, ContractArtifact, ContractMap, DiagnosticReport, Severity,
    Settings,
};
use crate::gen::client::ClientGenerator;
use crate::gen::declaration::{generate_declaration, InterfaceOptions};
use crate::resolve::SourceResolver;
use crate::{Result, SteelshardsError, VirtualSourceSet};
use std::fs;
use std::path::{Path, PathBuf};
use steelshards_config::{CodegenTarget, Config};
use tracing::{debug, error, info, warn};

/// What a successful build produced.
#[derive(Clone, Debug)]
pub struct BuildReport {
    /// The resolved sources that were compiled
    pub sources: VirtualSourceSet,
    /// `file -> contract name -> artifact`
    pub contracts: ContractMap,
    /// Warnings and informational diagnostics
    pub diagnostics: Vec<DiagnosticReport>,
    /// Files written, in order
    pub emitted: Vec<PathBuf>,
}

impl BuildReport {
    /// Find a contract by name (the first match in file order).
    pub fn find_contract(&self, name: &str) -> Option<&ContractArtifact> {
        self.contracts.values().find_map(|by_name| by_name.get(name))
    }

    /// All contract names, in file order.
    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.contracts
            .values()
            .flat_map(|by_name| by_name.keys().map(String::as_str))
    }
}

/// Drives a project build: resolve, compile, emit.
pub struct Builder<'a, C: CompilerBackend> {
    config: &'a Config,
    compiler: &'a C,
    client_gen: ClientGenerator,
}

impl<'a, C: CompilerBackend> Builder<'a, C> {
    /// Builder for a project, compiling with `compiler`.
    pub fn new(config: &'a Config, compiler: &'a C) -> Self {
        Builder {
            config,
            compiler,
            client_gen: ClientGenerator::new(),
        }
    }

    /// Build the project.
    ///
    /// Nothing is written unless compilation succeeds. With `no_emit`, nothing is written
    /// at all.
    ///
    /// # Errors
    ///
    /// - [`SteelshardsError::MissingImport`] and I/O errors from resolution,
    /// - compiler process and protocol errors,
    /// - [`SteelshardsError::Diagnostics`] if the compiler reported any error,
    /// - write and generation errors while emitting.
    pub async fn build(&self, no_emit: bool) -> Result<BuildReport> {
        let inputs = self.config.inputs_dir();
        fs::create_dir_all(&inputs)
            .map_err(|e| SteelshardsError::WriteFileError(inputs.clone(), e))?;

        let sources = SourceResolver::from_config(self.config).resolve(&inputs)?;
        info!("Compiling {} source files", sources.len());
        let request =
            CompileRequest::new(sources).with_settings(Settings::from(&self.config.compiler));
        let result = self.compiler.compile(&request).await?;
        let sources = request.sources;

        for report in result.reports(&sources) {
            match report.severity() {
                Severity::Error => error!("Compile error: {report}"),
                Severity::Warning => warn!("Compile warning: {report}"),
                Severity::Info => info!("{report}"),
            }
        }
        let (contracts, diagnostics) = result.into_contracts(&sources)?;

        let emitted = if no_emit {
            debug!("Skipping artifact emission");
            vec![]
        } else {
            self.emit(&contracts)?
        };
        Ok(BuildReport {
            sources,
            contracts,
            diagnostics,
            emitted,
        })
    }

    fn emit(&self, contracts: &ContractMap) -> Result<Vec<PathBuf>> {
        let json_dir = self.config.json_output_dir();
        let ts_dir = self.config.ts_output_dir();
        for dir in json_dir.iter().chain(&ts_dir) {
            fs::create_dir_all(dir).map_err(|e| SteelshardsError::WriteFileError(dir.clone(), e))?;
        }

        let mut emitted = vec![];
        for (name, artifact) in contracts.values().flatten() {
            if let Some(dir) = &json_dir {
                let json = serde_json::to_string_pretty(artifact)
                    .map_err(|e| SteelshardsError::JsonError(name.clone(), e))?;
                emitted.push(write_file(dir, &format!("{name}.json"), &json)?);
            }
            if let Some(dir) = &ts_dir {
                let ts = match self.config.code_generation_target {
                    CodegenTarget::None => generate_declaration(
                        &artifact.abi,
                        &InterfaceOptions::new(name).extract_types(true),
                    ),
                    CodegenTarget::EthersJs => self.client_gen.generate_for(name, artifact)?,
                };
                emitted.push(write_file(dir, &format!("{name}.ts"), &ts)?);
            }
        }
        Ok(emitted)
    }
}

fn write_file(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    debug!("Writing {}", path.display());
    fs::write(&path, contents).map_err(|e| SteelshardsError::WriteFileError(path.clone(), e))?;
    Ok(path)
}
