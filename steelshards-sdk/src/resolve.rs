//! Import resolution.
//!
//! [`SourceResolver::resolve`] walks a source tree and produces a [`VirtualSourceSet`]:
//! every file under the root plus everything reachable through its imports, keyed by a
//! virtual path. Each `import "...";` statement is rewritten to the virtual path of its
//! target, so the compiler only ever sees paths that exist in the set.
//!
//! Specifiers starting with `.` are relative to the importing file; everything else (for
//! example `@openzeppelin/contracts/token/ERC20/ERC20.sol`) is a module import looked
//! up in the module directory and keyed under the module prefix (`node_modules/` by
//! default).

use crate::{Result, SteelshardsError};
use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use steelshards_config::Config;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Content stored for a path whose resolution is still in progress.
pub const PLACEHOLDER: &str = "// No Source";

/// Default virtual prefix for module imports.
pub const DEFAULT_MODULE_PREFIX: &str = "node_modules";

/// A single source entry, in the shape the compiler expects.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Full source text
    pub content: String,
}

/// Mapping from virtual path to source content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct VirtualSourceSet(BTreeMap<String, Source>);

impl VirtualSourceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the content at a virtual path.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> Option<Source> {
        self.0.insert(
            path.into(),
            Source {
                content: content.into(),
            },
        )
    }

    /// Remove the entry at a virtual path.
    pub fn remove(&mut self, path: &str) -> Option<Source> {
        self.0.remove(path)
    }

    /// Look up an entry.
    pub fn get(&self, path: &str) -> Option<&Source> {
        self.0.get(path)
    }

    /// Look up the content at a virtual path.
    pub fn content(&self, path: &str) -> Option<&str> {
        self.get(path).map(|s| s.content.as_str())
    }

    /// Whether a virtual path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Source)> {
        self.0.iter()
    }

    /// Iterate over virtual paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for VirtualSourceSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut set = VirtualSourceSet::new();
        for (path, content) in iter {
            set.insert(path, content);
        }
        set
    }
}

/// Whether an import is resolved against the importing file or the module directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportKind {
    /// Specifier starts with `.`
    Relative,
    /// Package-style specifier (e.g., `@scope/pkg/File.sol`)
    Module,
}

/// An import statement found in a source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportReference {
    /// The full statement text, as it appears on its (trimmed) line
    pub statement: String,
    /// The quoted specifier
    pub specifier: String,
}

impl ImportReference {
    /// How the specifier is resolved.
    pub fn kind(&self) -> ImportKind {
        if self.specifier.starts_with('.') {
            ImportKind::Relative
        } else {
            ImportKind::Module
        }
    }
}

/// Find the simple import statements of a source file.
///
/// Only whole-line statements of the form `import "spec";` (or with single quotes) are
/// recognized. Lines are trimmed before matching. Named imports (`import {A} from ...`)
/// are left alone.
pub fn scan_imports(code: &str) -> Vec<ImportReference> {
    code.lines()
        .map(str::trim)
        .filter_map(|line| {
            let rest = line.strip_prefix("import ")?;
            let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
            let specifier = rest[1..].strip_suffix(';')?.strip_suffix(quote)?;
            if specifier.is_empty() || specifier.contains(quote) {
                return None;
            }
            Some(ImportReference {
                statement: line.to_string(),
                specifier: specifier.to_string(),
            })
        })
        .collect()
}

/// Join a specifier onto a virtual directory and normalize the result.
fn join_virtual(dir: &str, spec: &str) -> String {
    let joined = if dir.is_empty() {
        spec.to_string()
    } else {
        format!("{dir}/{spec}")
    };
    path_clean::clean(&joined.replace('\\', "/"))
}

/// The virtual directory of a virtual path.
fn virtual_parent(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// Project-relative virtual path of a file found while walking the root.
fn virtual_path_of(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds a [`VirtualSourceSet`] from a source tree.
#[derive(Clone, Debug)]
pub struct SourceResolver {
    module_dir: PathBuf,
    module_prefix: String,
}

impl SourceResolver {
    /// Resolver looking up module imports under `module_dir`.
    pub fn new(module_dir: impl Into<PathBuf>) -> Self {
        SourceResolver {
            module_dir: module_dir.into(),
            module_prefix: DEFAULT_MODULE_PREFIX.to_string(),
        }
    }

    /// Resolver for a project, using its configured module directory.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.module_dir())
    }

    /// Use a different virtual prefix for module imports.
    pub fn with_module_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.module_prefix = prefix.into();
        self
    }

    /// Resolve every file under `root` and everything reachable through imports.
    ///
    /// Files under the root are keyed by their root-relative path. Files reached through
    /// imports are keyed relative to the virtual path of the importing file (relative
    /// imports) or under the module prefix (module imports).
    ///
    /// # Errors
    ///
    /// [`SteelshardsError::MissingImport`] if a relative import points at a file that
    /// does not exist. A missing module import is dropped from the set instead, which
    /// leaves the compiler to report it.
    pub fn resolve(&self, root: impl AsRef<Path>) -> Result<VirtualSourceSet> {
        let root = root.as_ref();
        debug!("Resolving sources under {}", root.display());
        let mut sources = VirtualSourceSet::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| SteelshardsError::WalkError(root.into(), e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file = entry.path();
            let virtual_path = virtual_path_of(file.strip_prefix(root).unwrap_or(file));
            let code = read_source(file)?;
            let dir = file.parent().unwrap_or(root);
            let code = self.rewrite_imports(
                code,
                file,
                dir,
                virtual_parent(&virtual_path),
                &mut sources,
            )?;
            sources.insert(virtual_path, code);
        }
        debug_assert!(sources.iter().all(|(_, s)| s.content != PLACEHOLDER));
        debug!("Resolved {} source files", sources.len());
        Ok(sources)
    }

    /// Where an import lives on disk and in the virtual set.
    fn locate(&self, import: &ImportReference, dir: &Path, virtual_dir: &str) -> (PathBuf, String) {
        match import.kind() {
            ImportKind::Module => (
                self.module_dir.join(&import.specifier),
                format!("{}/{}", self.module_prefix, import.specifier),
            ),
            ImportKind::Relative => (
                dir.join(&import.specifier).clean(),
                join_virtual(virtual_dir, &import.specifier),
            ),
        }
    }

    /// Rewrite the imports of `code`, resolving each imported file (depth-first) into
    /// `sources`.
    ///
    /// A placeholder is stored under an import's virtual path before descending into it,
    /// so cyclic imports stop at the first revisit.
    fn rewrite_imports(
        &self,
        mut code: String,
        file: &Path,
        dir: &Path,
        virtual_dir: &str,
        sources: &mut VirtualSourceSet,
    ) -> Result<String> {
        for import in scan_imports(&code) {
            let (real_path, virtual_path) = self.locate(&import, dir, virtual_dir);
            trace!("{}: {} -> {}", file.display(), import.specifier, virtual_path);
            code = code.replace(&import.statement, &format!("import \"{virtual_path}\";"));

            if sources.contains(&virtual_path) {
                continue;
            }
            sources.insert(virtual_path.as_str(), PLACEHOLDER);

            if !real_path.is_file() {
                if import.kind() == ImportKind::Module {
                    debug!("Module import {} not found", real_path.display());
                    sources.remove(&virtual_path);
                    continue;
                }
                return Err(SteelshardsError::MissingImport {
                    path: real_path,
                    source_file: Some(file.to_path_buf()),
                });
            }

            let imported = read_source(&real_path)?;
            let imported_dir = real_path.parent().unwrap_or(dir);
            let imported = self.rewrite_imports(
                imported,
                &real_path,
                imported_dir,
                virtual_parent(&virtual_path),
                sources,
            )?;
            sources.insert(virtual_path, imported);
        }
        Ok(code)
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SteelshardsError::ReadFileError(path.into(), e))
}
