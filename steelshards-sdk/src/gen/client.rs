use super::common::{GenError, Result};
use super::types::{map_type, normalize, BaseTypeName, TypeNameMapping};
use super::GENERATED_HEADER;
use crate::abi::{constructor, functions, Abi, AbiField, FieldKind, Function};
use crate::compiler::ContractArtifact;
use itertools::Itertools;
use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tera::{Context, Tera};

const CLIENT_TEMPLATE: &str = "client.ts";

lazy_static! {
    static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_template(CLIENT_TEMPLATE, include_str!("../../templates/client.ts.tpl"))
            .expect("client template must parse");
        tera
    };
}

/// Bytecode is embedded as string literals of at most this many characters.
pub const BYTECODE_SEGMENT_LEN: usize = 256;

/// Class members that generated methods must not shadow.
const CLASS_MEMBERS: &[&str] = &["address", "connect", "constructor", "underlying"];

/// Members of an ethers.js (v5) `Contract`. ABI functions with these names are only
/// reachable through their signature key.
const CONTRACT_MEMBERS: &[&str] = &[
    "address", "attach", "callStatic", "connect", "constructor", "deployTransaction",
    "deployed", "emit", "estimateGas", "fallback", "filters", "functions", "interface",
    "listenerCount", "listeners", "off", "on", "once", "populateTransaction", "provider",
    "queryFilter", "removeAllListeners", "removeListener", "resolvedAddress", "signer",
];

/// Parameter names that cannot be used as-is in the generated code.
const RESERVED_PARAMS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "overrides", "signer",
];

/// The deployment bytecode as a concatenation of string literals.
pub fn bytecode_literal(hex: &str) -> String {
    if hex.is_empty() {
        return "\"\"".to_string();
    }
    hex.as_bytes()
        .chunks(BYTECODE_SEGMENT_LEN)
        .map(|chunk| format!("\"{}\"", String::from_utf8_lossy(chunk)))
        .join("+\n    ")
}

/// `base`, or `base0`, `base1`, ... whichever is first unused. Marks the result used.
pub fn unique_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut counter = 0;
    while used.contains(&name) {
        name = format!("{base}{counter}");
        counter += 1;
    }
    used.insert(name.clone());
    name
}

fn param_name(field: &AbiField, index: usize) -> String {
    if field.name.is_empty() {
        format!("arg{index}")
    } else if RESERVED_PARAMS.contains(&field.name.as_str()) {
        format!("{}_", field.name)
    } else {
        field.name.clone()
    }
}

fn is_integer(type_name: &str) -> bool {
    matches!(
        normalize(type_name).parse::<BaseTypeName>(),
        Ok(BaseTypeName::Uint(_) | BaseTypeName::Int(_))
    )
}

/// TypeScript type of a decoded return value.
pub fn return_type(field: &AbiField) -> String {
    if let Some(element) = field.element() {
        return format!("{}[]", return_type(&element));
    }
    match &field.kind {
        FieldKind::Tuple { components, .. } => {
            format!("[{}]", components.iter().map(return_type).join(", "))
        }
        FieldKind::Regular { type_name, .. } => {
            let name = normalize(type_name);
            match name {
                _ if is_integer(name) => "bigint".to_string(),
                "address" | "string" => "string".to_string(),
                "bool" => "boolean".to_string(),
                _ if name.starts_with("bytes") => "string".to_string(),
                _ => name.to_string(),
            }
        }
    }
}

/// Return type of a read-only method, `None` if the function returns nothing.
fn outputs_type(outputs: &[AbiField]) -> Option<String> {
    match outputs {
        [] => None,
        [single] => Some(return_type(single)),
        many => Some(format!("[{}]", many.iter().map(return_type).join(", "))),
    }
}

/// Expression converting the argument `expr` into what the contract call expects.
///
/// Arrays are not converted and are passed as an empty array.
pub fn wire_arg(field: &AbiField, expr: &str) -> String {
    if field.is_array() {
        return "[]".to_string();
    }
    match &field.kind {
        FieldKind::Tuple { components, .. } => format!(
            "[{}]",
            components
                .iter()
                .enumerate()
                .map(|(i, c)| wire_arg(c, &format!("{expr}[{i}]")))
                .join(", ")
        ),
        FieldKind::Regular { type_name, .. } => match normalize(type_name) {
            name if is_integer(name) => format!("ethers.BigNumber.from({expr})"),
            "string" | "address" => expr.to_string(),
            _ => format!("{expr} /* {} */", field.type_string()),
        },
    }
}

#[derive(Serialize)]
struct DeployContext {
    params: Vec<String>,
    args: Vec<String>,
}

#[derive(Serialize)]
struct MethodContext {
    name: String,
    params: Vec<String>,
    args: Vec<String>,
    return_type: String,
    /// `.name` or `["signature"]`
    target: String,
    /// Statement prefix for the underlying call
    call: &'static str,
    decode: bool,
}

#[derive(Serialize)]
struct ClientContext<'a> {
    header: &'static str,
    name: &'a str,
    abi: String,
    bytecode: String,
    deploy: DeployContext,
    methods: Vec<MethodContext>,
}

/// Generates an ethers.js (v5) client class for a contract.
#[derive(Clone, Debug)]
pub struct ClientGenerator {
    mapping: TypeNameMapping,
}

impl Default for ClientGenerator {
    fn default() -> Self {
        ClientGenerator {
            mapping: TypeNameMapping::ethers(),
        }
    }
}

impl ClientGenerator {
    /// Generator using the ethers.js parameter type mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator using a custom parameter type mapping.
    pub fn with_mapping(mapping: TypeNameMapping) -> Self {
        ClientGenerator { mapping }
    }

    fn params(&self, inputs: &[AbiField]) -> (Vec<String>, Vec<String>) {
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let name = param_name(input, i);
                let param = format!("{name}: {}", map_type(input, &self.mapping));
                (param, wire_arg(input, &name))
            })
            .unzip()
    }

    fn method(&self, f: &Function, name: String, overloaded: bool) -> MethodContext {
        let (params, args) = self.params(&f.inputs);
        let target = if overloaded || CONTRACT_MEMBERS.contains(&f.name.as_str()) {
            format!("[\"{}\"]", f.signature())
        } else {
            format!(".{}", f.name)
        };
        let (return_type, call, decode) = if f.mutability().is_read_only() {
            match outputs_type(&f.outputs) {
                Some(ty) => (ty, "const result = await", true),
                None => ("void".to_string(), "await", false),
            }
        } else {
            (
                "ethers.providers.TransactionResponse".to_string(),
                "return await",
                false,
            )
        };
        MethodContext {
            name,
            params,
            args,
            return_type,
            target,
            call,
            decode,
        }
    }

    /// Generate the client for a contract from its ABI and hex-encoded bytecode.
    ///
    /// The output only depends on the arguments.
    pub fn generate(&self, name: &str, abi: &Abi, bytecode: &str) -> Result<String> {
        let abi_json = serde_json::to_string(abi)
            .map_err(|e| GenError::AbiSerialization(name.to_string(), e))?;

        let (params, args) = constructor(abi)
            .map(|c| self.params(&c.inputs))
            .unwrap_or_default();

        let mut arity: HashMap<&str, usize> = HashMap::new();
        for f in functions(abi) {
            *arity.entry(f.name.as_str()).or_default() += 1;
        }
        let mut used: HashSet<String> = CLASS_MEMBERS.iter().map(|m| m.to_string()).collect();
        let methods = functions(abi)
            .map(|f| {
                let method_name = unique_name(&f.name, &mut used);
                self.method(f, method_name, arity[f.name.as_str()] > 1)
            })
            .collect();

        let ctx = ClientContext {
            header: GENERATED_HEADER,
            name,
            abi: abi_json,
            bytecode: bytecode_literal(bytecode),
            deploy: DeployContext { params, args },
            methods,
        };
        let ctx = Context::from_serialize(ctx)
            .map_err(|e| GenError::TemplateError(name.to_string(), e))?;
        TEMPLATES
            .render(CLIENT_TEMPLATE, &ctx)
            .map_err(|e| GenError::TemplateError(name.to_string(), e))
    }

    /// Generate the client for a compiled contract.
    pub fn generate_for(&self, name: &str, artifact: &ContractArtifact) -> Result<String> {
        self.generate(name, &artifact.abi, artifact.bytecode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(name: &str, ty: &str) -> AbiField {
        AbiField::new(name, ty, None).unwrap()
    }

    #[test]
    fn bytecode_chunks() {
        assert_eq!(bytecode_literal(""), "\"\"");
        assert_eq!(bytecode_literal("6080"), "\"6080\"");
        let hex = "a".repeat(300);
        assert_eq!(
            bytecode_literal(&hex),
            format!("\"{}\"+\n    \"{}\"", "a".repeat(256), "a".repeat(44))
        );
    }

    #[test]
    fn names() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("transfer", &mut used), "transfer");
        assert_eq!(unique_name("transfer", &mut used), "transfer0");
        assert_eq!(unique_name("transfer", &mut used), "transfer1");
        used.insert("mint0".into());
        assert_eq!(unique_name("mint", &mut used), "mint");
        assert_eq!(unique_name("mint", &mut used), "mint1");
    }

    #[test]
    fn return_types() {
        assert_eq!(return_type(&field("", "uint8")), "bigint");
        assert_eq!(return_type(&field("", "account")), "string");
        assert_eq!(return_type(&field("", "bool[2]")), "boolean[]");
        assert_eq!(return_type(&field("", "bytes32")), "string");
        let pair = AbiField::new("", "tuple[]", Some(vec![field("a", "address"), field("n", "int64")])).unwrap();
        assert_eq!(return_type(&pair), "[string, bigint][]");
        assert_eq!(outputs_type(&[]), None);
        assert_eq!(
            outputs_type(&[field("", "bool"), field("", "string")]),
            Some("[boolean, string]".to_string())
        );
    }

    #[test]
    fn wire_args() {
        assert_eq!(wire_arg(&field("x", "uint256"), "x"), "ethers.BigNumber.from(x)");
        assert_eq!(wire_arg(&field("x", "address"), "x"), "x");
        assert_eq!(wire_arg(&field("x", "uint256[]"), "x"), "[]");
        assert_eq!(wire_arg(&field("x", "bool"), "x"), "x /* bool */");
        let item = AbiField::new("item", "tuple", Some(vec![field("id", "uint8"), field("tags", "string[]")])).unwrap();
        assert_eq!(wire_arg(&item, "item"), "[ethers.BigNumber.from(item[0]), []]");
    }

    #[test]
    fn reserved_param_names() {
        assert_eq!(param_name(&field("", "uint256"), 2), "arg2");
        assert_eq!(param_name(&field("new", "uint256"), 0), "new_");
        assert_eq!(param_name(&field("overrides", "uint256"), 0), "overrides_");
        assert_eq!(param_name(&field("to", "address"), 0), "to");
    }

    #[test]
    fn read_and_write_methods() {
        let abi: Abi = serde_json::from_value(json!([
            { "type": "function", "name": "get", "stateMutability": "view",
              "inputs": [], "outputs": [{ "name": "", "type": "uint256" }] },
            { "type": "function", "name": "ping", "stateMutability": "pure",
              "inputs": [], "outputs": [] },
            { "type": "function", "name": "set", "stateMutability": "nonpayable",
              "inputs": [{ "name": "v", "type": "uint8" }], "outputs": [] }
        ]))
        .unwrap();
        let ts = ClientGenerator::new().generate("Store", &abi, "").unwrap();
        assert!(ts.contains("const BYTECODE = \"\";"));
        assert!(ts.contains("    async get(\n        overrides?: ethers.Overrides\n    ): Promise<bigint> {\n        const result = await this.underlying.get(\n"));
        assert!(ts.contains("        return mapOutput(result);\n"));
        assert!(ts.contains("    async ping(\n        overrides?: ethers.Overrides\n    ): Promise<void> {\n        await this.underlying.ping(\n"));
        assert!(ts.contains("    async set(\n        v: number,\n        overrides?: ethers.Overrides\n    ): Promise<ethers.providers.TransactionResponse> {\n        return await this.underlying.set(\n            ethers.BigNumber.from(v),\n            ...(overrides ? [overrides] : [])\n        );\n    }\n"));
        // no explicit constructor: deploy takes only the signer
        assert!(ts.contains("    static async deploy(\n        signer?: ethers.Signer\n    ): Promise<Store> {"));
    }

    #[test]
    fn contract_member_names() {
        let abi: Abi = serde_json::from_value(json!([
            { "type": "function", "name": "connect", "stateMutability": "nonpayable",
              "inputs": [{ "name": "peer", "type": "address" }], "outputs": [] },
            { "type": "function", "name": "provider", "stateMutability": "view",
              "inputs": [], "outputs": [{ "name": "", "type": "address" }] },
            { "type": "function", "name": "owner", "stateMutability": "view",
              "inputs": [], "outputs": [{ "name": "", "type": "address" }] }
        ]))
        .unwrap();
        let ts = ClientGenerator::new().generate("Hub", &abi, "").unwrap();
        assert!(ts.contains("    async connect0(\n        peer: string,\n"));
        assert!(ts.contains("        return await this.underlying[\"connect(address)\"](\n"));
        assert!(ts.contains("    async provider(\n"));
        assert!(ts.contains("        const result = await this.underlying[\"provider()\"](\n"));
        assert!(ts.contains("        const result = await this.underlying.owner(\n"));
    }

    #[test]
    fn bool_and_bytes_params() {
        let abi: Abi = serde_json::from_value(json!([
            { "type": "function", "name": "store", "stateMutability": "nonpayable",
              "inputs": [
                { "name": "flag", "type": "bool" },
                { "name": "data", "type": "bytes" },
                { "name": "key", "type": "bytes32" }
              ],
              "outputs": [] }
        ]))
        .unwrap();
        let ts = ClientGenerator::new().generate("Blob", &abi, "").unwrap();
        assert!(ts.contains("        flag: boolean,\n        data: string,\n        key: string,\n"));
        assert!(ts.contains("            flag /* bool */,\n            data /* bytes */,\n            key /* bytes32 */,\n"));
    }
}
