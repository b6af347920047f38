//! Compilation snapshot loaded from YAML
//!
//! Stands in for the host compiler's semantic model: it owns the resolved
//! type declarations, answers [`Resolver`] queries and carries the candidate
//! references found by the syntax scanner.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::GeneratorConfig;
use crate::error::ObsgenError;
use crate::identity::TypeKey;
use crate::symbols::{
    CandidateReference, EventDecl, Location, Resolver, Symbol, TypeDecl, TypeDescriptor, TypeRef,
};

/// Snapshot files picked up when a directory is given
pub const SNAPSHOT_SUFFIX: &str = ".obsgen.yaml";

/// Name of the method instance-style candidates invoke
pub const EVENTS_METHOD: &str = "Events";

static QUALIFIED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

static SIMPLE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// `typeof(X)` argument of a static-style attribute
static TYPEOF_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*typeof\s*\((.+)\)\s*$").unwrap());

// ============================================================================
// YAML SCHEMA
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    EVENTS_METHOD.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotFile {
    /// Whether the post-initialization preamble is part of the compilation
    #[serde(default = "default_true")]
    preamble: bool,
    #[serde(default)]
    types: Vec<TypeSpec>,
    #[serde(default)]
    candidates: CandidateSpecs,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeSpec {
    name: String,
    #[serde(default)]
    type_params: Vec<String>,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    events: Vec<EventDecl>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CandidateSpecs {
    #[serde(default)]
    instance: Vec<InstanceSpec>,
    #[serde(default, rename = "static")]
    statics: Vec<StaticSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstanceSpec {
    /// Defaults to the configured extension type
    #[serde(default)]
    container: Option<String>,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    type_args: Vec<String>,
    #[serde(default)]
    location: Location,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StaticSpec {
    /// Defaults to the configured static attribute
    #[serde(default)]
    attribute: Option<String>,
    #[serde(default)]
    argument: Option<String>,
    #[serde(default)]
    location: Location,
}

// ============================================================================
// COMPILATION
// ============================================================================

/// Resolved declarations plus the scanned candidates
#[derive(Debug, Default)]
pub struct Compilation {
    types: HashMap<TypeKey, Arc<TypeDecl>>,
    /// Declaration order, for deterministic listing
    order: Vec<TypeKey>,
    candidates: Vec<CandidateReference>,
}

impl Compilation {
    /// Load a single snapshot document
    pub fn from_yaml(yaml: &str, config: &GeneratorConfig) -> Result<Self, ObsgenError> {
        let file: SnapshotFile = serde_yaml::from_str(yaml)?;
        Self::build(vec![file], config)
    }

    /// Load a snapshot file, or every `*.obsgen.yaml` below a directory
    pub fn from_path(path: &Path, config: &GeneratorConfig) -> Result<Self, ObsgenError> {
        let paths = if path.is_dir() {
            snapshot_files(path)
        } else {
            vec![path.to_path_buf()]
        };

        let mut files = Vec::with_capacity(paths.len());
        for p in &paths {
            debug!(path = %p.display(), "reading snapshot");
            let yaml = std::fs::read_to_string(p)?;
            files.push(serde_yaml::from_str::<SnapshotFile>(&yaml)?);
        }
        Self::build(files, config)
    }

    fn build(files: Vec<SnapshotFile>, config: &GeneratorConfig) -> Result<Self, ObsgenError> {
        let mut compilation = Compilation::default();
        let mut specs = Vec::new();

        if files.iter().all(|f| f.preamble) {
            specs.extend(preamble_types(config));
        }

        for file in files {
            specs.extend(file.types);
            for c in file.candidates.instance {
                compilation.candidates.push(CandidateReference::Instance {
                    container: c
                        .container
                        .unwrap_or_else(|| config.extension_type.clone()),
                    method: c.method,
                    type_args: c.type_args,
                    location: c.location,
                });
            }
            for c in file.candidates.statics {
                compilation.candidates.push(CandidateReference::Static {
                    attribute: c
                        .attribute
                        .unwrap_or_else(|| config.static_attribute.clone()),
                    argument: c.argument,
                    location: c.location,
                });
            }
        }

        // Declarations first, bases second: bases may point forward
        let mut pending = Vec::with_capacity(specs.len());
        for spec in specs {
            let decl = declare(&spec)?;
            let key = TypeKey::new(Arc::clone(&decl.name), decl.arity());
            if compilation.types.contains_key(&key) {
                return Err(ObsgenError::DuplicateType {
                    name: spec.name,
                    arity: key.arity(),
                });
            }
            compilation.order.push(key.clone());
            compilation.types.insert(key, Arc::new(decl));
            pending.push(spec);
        }

        for spec in &pending {
            compilation.check_base(spec)?;
        }
        compilation.check_acyclic()?;

        debug!(
            types = compilation.types.len(),
            candidates = compilation.candidates.len(),
            "compilation loaded"
        );
        Ok(compilation)
    }

    fn check_base(&self, spec: &TypeSpec) -> Result<(), ObsgenError> {
        let Some(base) = spec.base.as_deref() else {
            return Ok(());
        };
        let base_ref = TypeRef::parse(base)?;
        let from_ns = spec.name.rsplit_once('.').map(|(ns, _)| ns);

        if self.lookup(&base_ref.name, base_ref.arity(), from_ns).is_some() {
            return Ok(());
        }
        if let Some(other) = self.lookup_any_arity(&base_ref.name, from_ns) {
            return Err(ObsgenError::BaseArityMismatch {
                type_name: spec.name.clone(),
                base: base.to_string(),
                expected: other.arity(),
                found: base_ref.arity(),
            });
        }
        Err(ObsgenError::UnknownBaseType {
            type_name: spec.name.clone(),
            base: base.to_string(),
        })
    }

    fn check_acyclic(&self) -> Result<(), ObsgenError> {
        let mut cleared: HashSet<TypeKey> = HashSet::new();

        for start in &self.order {
            let mut path: Vec<TypeKey> = Vec::new();
            let mut current = self.types.get(start).cloned();

            while let Some(decl) = current {
                let key = TypeKey::new(Arc::clone(&decl.name), decl.arity());
                if cleared.contains(&key) {
                    break;
                }
                if let Some(pos) = path.iter().position(|k| *k == key) {
                    let mut cycle: Vec<String> = path[pos..].iter().map(|k| k.to_string()).collect();
                    cycle.push(key.to_string());
                    return Err(ObsgenError::InheritanceCycle {
                        cycle: cycle.join(" -> "),
                    });
                }
                path.push(key);
                current = decl.base.as_ref().and_then(|b| self.base_decl(&decl, b));
            }

            cleared.extend(path);
        }

        Ok(())
    }

    /// Candidate references in scan order
    pub fn candidates(&self) -> &[CandidateReference] {
        &self.candidates
    }

    /// Declarations in declaration order
    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeDecl>> {
        self.order.iter().filter_map(|k| self.types.get(k))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ------------------------------------------------------------------------
    // Name lookup
    // ------------------------------------------------------------------------

    /// Exact qualified name, then the referencing namespace, then a unique
    /// simple-name match.
    fn lookup(&self, name: &str, arity: usize, from_ns: Option<&str>) -> Option<Arc<TypeDecl>> {
        if let Some(decl) = self.types.get(&TypeKey::new(name, arity)) {
            return Some(Arc::clone(decl));
        }
        if let Some(ns) = from_ns {
            let scoped = format!("{}.{}", ns, name);
            if let Some(decl) = self.types.get(&TypeKey::new(scoped, arity)) {
                return Some(Arc::clone(decl));
            }
        }
        if name.contains('.') {
            return None;
        }
        let mut matches = self
            .types()
            .filter(|d| d.arity() == arity && d.simple_name() == name);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(Arc::clone(first))
    }

    fn lookup_any_arity(&self, name: &str, from_ns: Option<&str>) -> Option<Arc<TypeDecl>> {
        let scoped = from_ns.map(|ns| format!("{}.{}", ns, name));
        self.types()
            .find(|d| &*d.name == name || scoped.as_deref() == Some(&*d.name))
            .cloned()
    }

    fn base_decl(&self, decl: &TypeDecl, base: &TypeRef) -> Option<Arc<TypeDecl>> {
        self.lookup(&base.name, base.arity(), decl.namespace())
    }

    /// Resolve a written type reference to a descriptor
    fn descriptor(&self, text: &str) -> Option<TypeDescriptor> {
        let type_ref = TypeRef::parse(text).ok()?;
        let decl = self.lookup(&type_ref.name, type_ref.arity(), None)?;
        let args = type_ref
            .args
            .iter()
            .map(|a| Arc::from(a.to_string().as_str()))
            .collect();
        Some(TypeDescriptor::new(decl, args))
    }

    fn attribute_descriptor(&self, text: &str) -> Option<TypeDescriptor> {
        self.descriptor(text).or_else(|| {
            if text.ends_with("Attribute") {
                None
            } else {
                self.descriptor(&format!("{}Attribute", text))
            }
        })
    }
}

impl Resolver for Compilation {
    fn resolve(&self, reference: &CandidateReference) -> Option<Symbol> {
        match reference {
            CandidateReference::Instance {
                container,
                method,
                type_args,
                ..
            } => {
                let container = self.descriptor(container)?;
                Some(Symbol::Method {
                    container,
                    name: method.clone(),
                    type_args: type_args.iter().map(|t| self.descriptor(t)).collect(),
                })
            }
            CandidateReference::Static {
                attribute,
                argument,
                ..
            } => {
                let attribute = self.attribute_descriptor(attribute)?;
                let argument = argument.as_deref().and_then(|arg| {
                    let inner = TYPEOF_ARG
                        .captures(arg)
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str())
                        .unwrap_or(arg);
                    self.descriptor(inner)
                });
                Some(Symbol::Attribute {
                    attribute,
                    argument,
                })
            }
        }
    }

    fn ancestors(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        let mut chain = Vec::new();
        let mut seen: HashSet<TypeKey> = HashSet::new();
        seen.insert(ty.key());

        let mut current = ty.clone();
        while let Some(base) = current.decl().base.clone() {
            let Some(decl) = self.base_decl(current.decl(), &base) else {
                break;
            };
            let args = base
                .args
                .iter()
                .map(|a| Arc::from(a.substitute(&current.decl().type_params, current.type_args())))
                .collect();
            let next = TypeDescriptor::new(decl, args);
            if !seen.insert(next.key()) {
                break;
            }
            chain.push(next.clone());
            current = next;
        }

        chain
    }

    fn find_type(&self, metadata_name: &str) -> Option<TypeDescriptor> {
        let (name, arity) = match metadata_name.rsplit_once('`') {
            Some((name, arity)) => (name, arity.parse().ok()?),
            None => (metadata_name, 0),
        };
        self.types
            .get(&TypeKey::new(name, arity))
            .map(|decl| TypeDescriptor::declared(Arc::clone(decl)))
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn declare(spec: &TypeSpec) -> Result<TypeDecl, ObsgenError> {
    if !QUALIFIED_NAME.is_match(&spec.name) {
        return Err(ObsgenError::InvalidIdentifier {
            ident: spec.name.clone(),
            context: "type name".to_string(),
        });
    }
    for param in &spec.type_params {
        if !SIMPLE_NAME.is_match(param) {
            return Err(ObsgenError::InvalidIdentifier {
                ident: param.clone(),
                context: format!("type parameters of '{}'", spec.name),
            });
        }
    }
    for event in &spec.events {
        if !SIMPLE_NAME.is_match(&event.name) {
            return Err(ObsgenError::InvalidIdentifier {
                ident: event.name.clone(),
                context: format!("events of '{}'", spec.name),
            });
        }
    }

    Ok(TypeDecl {
        name: Arc::from(spec.name.as_str()),
        type_params: spec.type_params.iter().map(|p| Arc::from(p.as_str())).collect(),
        is_static: spec.is_static,
        base: spec.base.as_deref().map(TypeRef::parse).transpose()?,
        events: spec.events.clone(),
    })
}

/// Declarations contributed by the generator's own preamble
fn preamble_types(config: &GeneratorConfig) -> Vec<TypeSpec> {
    let plain = |name: &str, is_static: bool| TypeSpec {
        name: name.to_string(),
        type_params: Vec::new(),
        is_static,
        base: None,
        events: Vec::new(),
    };
    vec![
        plain(&config.extension_type, true),
        plain(&config.static_attribute, false),
    ]
}

fn snapshot_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(SNAPSHOT_SUFFIX))
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    paths
}
