use super::types::{map_type, normalize, BaseTypeName, TypeNameMapping};
use crate::abi::{functions, AbiEntry, AbiField, FieldKind};
use itertools::Itertools;
use parse_display::Display;
use std::collections::BTreeSet;

/// Keyword in front of the generated `interface`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum InterfacePrefix {
    /// `export interface ...`
    #[default]
    Export,
    /// `declare interface ...`
    Declare,
}

/// Options for [`generate_declaration`].
#[derive(Clone, Debug)]
pub struct InterfaceOptions {
    /// Interface name (usually the contract name)
    pub name: String,
    /// Keyword in front of `interface`
    pub prefix: InterfacePrefix,
    /// Emit one `type` alias per used base type and refer to the aliases
    pub extract_types: bool,
    /// Base type mapping
    pub mapping: TypeNameMapping,
}

impl InterfaceOptions {
    /// Exported interface with the default mapping and inline types.
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceOptions {
            name: name.into(),
            prefix: InterfacePrefix::Export,
            extract_types: false,
            mapping: TypeNameMapping::defaults(),
        }
    }

    /// Toggle type alias extraction.
    pub fn extract_types(mut self, extract: bool) -> Self {
        self.extract_types = extract;
        self
    }
}

fn collect_base_types(field: &AbiField, mapping: &TypeNameMapping, used: &mut BTreeSet<BaseTypeName>) {
    match &field.kind {
        FieldKind::Tuple { components, .. } => {
            for c in components {
                collect_base_types(c, mapping, used);
            }
        }
        FieldKind::Regular { type_name, .. } => {
            if let Ok(base) = normalize(type_name).parse::<BaseTypeName>() {
                // `type string = ...` is not a legal alias
                if base != BaseTypeName::String && mapping.get(base).is_some() {
                    used.insert(base);
                }
            }
        }
    }
}

/// Generate a TypeScript interface declaring one async method per ABI function.
///
/// ```
/// # use steelshards_sdk::gen::declaration::{generate_declaration, InterfaceOptions};
/// let abi: steelshards_sdk::abi::Abi = serde_json::from_str(r#"[{
///   "type": "function", "name": "get", "stateMutability": "view",
///   "inputs": [], "outputs": [{ "name": "", "type": "uint256" }]
/// }]"#).unwrap();
/// assert_eq!(
///     generate_declaration(&abi, &InterfaceOptions::new("Store")),
///     "export interface Store {\n    get(): Promise<[string | bigint | number]>;\n}\n"
/// );
/// ```
pub fn generate_declaration(abi: &[AbiEntry], opts: &InterfaceOptions) -> String {
    let mut out = String::new();
    let mut mapping = opts.mapping.clone();

    if opts.extract_types {
        let mut used = BTreeSet::new();
        for f in functions(abi) {
            for field in f.inputs.iter().chain(&f.outputs) {
                collect_base_types(field, &opts.mapping, &mut used);
            }
        }
        for base in &used {
            if let Some(expr) = opts.mapping.get(*base) {
                out.push_str(&format!("type {base} = {expr};\n"));
            }
            mapping = mapping.with(*base, base.to_string());
        }
        if !used.is_empty() {
            out.push('\n');
        }
    }

    out.push_str(&format!("{} interface {} {{\n", opts.prefix, opts.name));
    for f in functions(abi) {
        let params = f
            .inputs
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let name = if p.name.is_empty() {
                    format!("arg{i}")
                } else {
                    p.name.clone()
                };
                format!("{name}: {}", map_type(p, &mapping))
            })
            .join(", ");
        let output = if f.outputs.is_empty() {
            "void".to_string()
        } else {
            map_type(&AbiField::tuple_of(f.outputs.clone()), &mapping)
        };
        out.push_str(&format!("    {}({params}): Promise<{output}>;\n", f.name));
    }
    out.push_str("}\n");
    out
}
