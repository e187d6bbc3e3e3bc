use crate::abi::Abi;
use crate::VirtualSourceSet;
use parse_display::Display;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Diagnostic messages longer than this are cut off in summaries.
pub const MAX_MESSAGE_LEN: usize = 250;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[display(style = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Warning; does not fail the build
    Warning,
    /// Error; fails the build
    Error,
}

/// Byte range in a source file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceLocation {
    /// Virtual path of the file
    pub file: String,
    /// Start offset (negative if unknown)
    pub start: i64,
    /// End offset (negative if unknown)
    pub end: i64,
}

/// A compiler diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Short message
    pub message: String,
    /// Message formatted by the compiler (with source excerpt)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
    /// Diagnostic type (e.g., `ParserError`)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Compiler component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Numeric error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Where the problem is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
}

impl Diagnostic {
    /// The message, cut to [`MAX_MESSAGE_LEN`] characters (marked with `...`).
    pub fn summary(&self) -> String {
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            let cut: String = self.message.chars().take(MAX_MESSAGE_LEN).collect();
            format!("{cut}...")
        } else {
            self.message.clone()
        }
    }

    /// The file this diagnostic refers to, or `contract` when there is none.
    pub fn file(&self) -> &str {
        self.source_location
            .as_ref()
            .map_or("contract", |loc| loc.file.as_str())
    }

    /// Numbered (1-based), trimmed source lines covered by this diagnostic.
    ///
    /// Empty when there is no location or the file is not in `sources`.
    pub fn excerpt(&self, sources: &VirtualSourceSet) -> Vec<(usize, String)> {
        self.source_location
            .as_ref()
            .and_then(|loc| {
                let content = sources.content(&loc.file)?;
                Some(source_lines(content, loc.start, loc.end))
            })
            .unwrap_or_default()
    }
}

/// Zero-based line holding byte `offset`.
///
/// Offsets past the end map to the last line.
pub fn line_of_offset(content: &str, offset: usize) -> usize {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut remaining = offset;
    let mut idx = 0;
    while idx + 1 < lines.len() && remaining > lines[idx].len() {
        remaining -= lines[idx].len() + 1;
        idx += 1;
    }
    idx
}

/// Numbered (1-based), trimmed lines covering the byte range `start..end`.
pub fn source_lines(content: &str, start: i64, end: i64) -> Vec<(usize, String)> {
    if start < 0 || end < start {
        return vec![];
    }
    let first = line_of_offset(content, start as usize);
    let last = line_of_offset(content, end as usize);
    content
        .split('\n')
        .enumerate()
        .skip(first)
        .take(last - first + 1)
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .collect()
}

/// A diagnostic together with the source lines it points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticReport {
    /// The diagnostic
    pub diagnostic: Diagnostic,
    /// Numbered source lines (may be empty)
    pub lines: Vec<(usize, String)>,
}

impl DiagnosticReport {
    /// Attach source lines to a diagnostic.
    pub fn new(diagnostic: Diagnostic, sources: &VirtualSourceSet) -> Self {
        let lines = diagnostic.excerpt(sources);
        DiagnosticReport { diagnostic, lines }
    }

    /// Severity of the diagnostic.
    pub fn severity(&self) -> Severity {
        self.diagnostic.severity
    }

    /// First and last line number, if known.
    pub fn line_range(&self) -> Option<(usize, usize)> {
        Some((self.lines.first()?.0, self.lines.last()?.0))
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.diagnostic.file(), self.diagnostic.summary())?;
        match self.line_range() {
            Some((a, b)) if a == b => write!(f, " (line {a})"),
            Some((a, b)) => write!(f, " (lines {a}-{b})"),
            None => Ok(()),
        }
    }
}

/// Error raised when the compiler reports at least one error diagnostic.
///
/// Carries every diagnostic of the run (in compiler order), not just the errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileDiagnosticError {
    /// All diagnostics
    pub reports: Vec<DiagnosticReport>,
}

impl CompileDiagnosticError {
    /// Only the error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticReport> {
        self.reports
            .iter()
            .filter(|r| r.severity() == Severity::Error)
    }
}

impl fmt::Display for CompileDiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Compilation failed with {} error(s)", self.errors().count())?;
        for report in self.errors() {
            write!(f, "\n  {report}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileDiagnosticError {}

/// Bytecode section of a contract artifact.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Bytecode {
    /// Hex-encoded bytecode (no `0x` prefix)
    #[serde(default)]
    pub object: String,
    /// Everything else (source maps, link references, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// EVM section of a contract artifact.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Evm {
    /// Deployment bytecode
    #[serde(default)]
    pub bytecode: Bytecode,
    /// Everything else (deployed bytecode, gas estimates, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Everything the compiler produced for one contract.
///
/// Only the ABI and deployment bytecode are interpreted; the rest of the record is kept
/// verbatim so it can be written out as-is.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ContractArtifact {
    /// The contract ABI
    #[serde(default)]
    pub abi: Abi,
    /// EVM outputs
    #[serde(default)]
    pub evm: Evm,
    /// Metadata, devdoc, userdoc, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContractArtifact {
    /// Hex-encoded deployment bytecode.
    pub fn bytecode(&self) -> &str {
        &self.evm.bytecode.object
    }
}

/// `file -> contract name -> artifact`.
pub type ContractMap = BTreeMap<String, BTreeMap<String, ContractArtifact>>;

/// A standard-JSON compile result.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CompileResult {
    /// Diagnostics, in compiler order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Diagnostic>,
    /// Per-file outputs (ids, ASTs)
    #[serde(default)]
    pub sources: BTreeMap<String, Value>,
    #[serde(default)]
    contracts: ContractMap,
}

impl CompileResult {
    /// A result with the given diagnostics and contracts.
    pub fn new(errors: Vec<Diagnostic>, contracts: ContractMap) -> Self {
        CompileResult {
            errors,
            sources: BTreeMap::new(),
            contracts,
        }
    }

    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|d| d.severity == Severity::Error)
    }

    /// The compiled contracts, unless the compiler reported an error.
    pub fn contracts(&self) -> Option<&ContractMap> {
        (!self.has_errors()).then_some(&self.contracts)
    }

    /// Diagnostics with their source lines.
    pub fn reports(&self, sources: &VirtualSourceSet) -> Vec<DiagnosticReport> {
        self.errors
            .iter()
            .map(|d| DiagnosticReport::new(d.clone(), sources))
            .collect()
    }

    /// Take the contracts (and the non-error diagnostics) out of a successful result.
    ///
    /// # Errors
    ///
    /// [`CompileDiagnosticError`] with every diagnostic if any of them is an error.
    pub fn into_contracts(
        self,
        sources: &VirtualSourceSet,
    ) -> Result<(ContractMap, Vec<DiagnosticReport>), CompileDiagnosticError> {
        let reports = self.reports(sources);
        if self.has_errors() {
            return Err(CompileDiagnosticError { reports });
        }
        Ok((self.contracts, reports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn diagnostic(severity: Severity, message: &str, loc: Option<(&str, i64, i64)>) -> Diagnostic {
        Diagnostic {
            severity,
            message: message.into(),
            formatted_message: None,
            kind: None,
            component: None,
            error_code: None,
            source_location: loc.map(|(file, start, end)| SourceLocation {
                file: file.into(),
                start,
                end,
            }),
        }
    }

    #[test]
    fn offsets_to_lines() {
        let content = "pragma solidity ^0.8.0;\n\ncontract A {\n  uint x\n}\n";
        assert_eq!(line_of_offset(content, 0), 0);
        assert_eq!(line_of_offset(content, 23), 0);
        assert_eq!(line_of_offset(content, 24), 1);
        assert_eq!(line_of_offset(content, 25), 2);
        assert_eq!(line_of_offset(content, 10_000), 5);
        assert_eq!(
            source_lines(content, 25, 44),
            vec![(3, "contract A {".to_string()), (4, "uint x".to_string())]
        );
        assert!(source_lines(content, -1, -1).is_empty());
    }

    #[test]
    fn summary_is_truncated() {
        let long = "x".repeat(300);
        let d = diagnostic(Severity::Warning, &long, None);
        assert_eq!(d.summary(), format!("{}...", "x".repeat(250)));
        assert_eq!(d.file(), "contract");
        let short = diagnostic(Severity::Warning, &"y".repeat(250), None);
        assert_eq!(short.summary(), "y".repeat(250));
    }

    #[test]
    fn excerpt_needs_source() {
        let sources: VirtualSourceSet = [("A.sol", "contract A {\n  uint x\n}\n")].into_iter().collect();
        let d = diagnostic(Severity::Error, "Expected ';'", Some(("A.sol", 15, 21)));
        let report = DiagnosticReport::new(d.clone(), &sources);
        assert_eq!(report.lines, vec![(2, "uint x".to_string())]);
        assert_eq!(report.to_string(), "A.sol: Expected ';' (line 2)");
        let elsewhere = diagnostic(Severity::Error, "oops", Some(("B.sol", 0, 1)));
        assert!(elsewhere.excerpt(&sources).is_empty());
    }

    #[test]
    fn errors_block_contracts() {
        let result: CompileResult = serde_json::from_value(json!({
            "errors": [
                { "severity": "warning", "message": "unused variable", "type": "Warning" },
                { "severity": "error", "message": "Expected ';'", "type": "ParserError",
                  "errorCode": "2314",
                  "sourceLocation": { "file": "A.sol", "start": 0, "end": 3 } }
            ],
            "contracts": { "A.sol": { "A": { "abi": [] } } }
        }))
        .unwrap();
        assert!(result.has_errors());
        assert!(result.contracts().is_none());
        let err = result.into_contracts(&VirtualSourceSet::new()).unwrap_err();
        assert_eq!(err.reports.len(), 2);
        assert_eq!(err.errors().count(), 1);
        assert_eq!(
            err.to_string(),
            "Compilation failed with 1 error(s)\n  A.sol: Expected ';'"
        );
    }

    #[test]
    fn warnings_do_not_block() {
        let result: CompileResult = serde_json::from_value(json!({
            "errors": [ { "severity": "warning", "message": "unused variable" } ],
            "contracts": { "A.sol": { "A": {
                "abi": [],
                "evm": { "bytecode": { "object": "6080", "sourceMap": "" }, "gasEstimates": null },
                "metadata": "{}"
            } } }
        }))
        .unwrap();
        let (contracts, reports) = result.into_contracts(&VirtualSourceSet::new()).unwrap();
        assert_eq!(reports.len(), 1);
        let artifact = &contracts["A.sol"]["A"];
        assert_eq!(artifact.bytecode(), "6080");
        // unknown parts of the record survive a round trip
        let json = serde_json::to_value(artifact).unwrap();
        assert_eq!(json["metadata"], "{}");
        assert_eq!(json["evm"]["bytecode"]["sourceMap"], "");
        assert!(json["evm"].as_object().unwrap().contains_key("gasEstimates"));
    }
}
