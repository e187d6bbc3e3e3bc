use super::common::{GenError, Result};
use crate::abi::{AbiField, FieldKind};
use itertools::Itertools;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Short or ecosystem-specific names and the base names they stand for.
pub const TYPE_ALIASES: &[(&str, &str)] = &[
    ("byte", "uint8"),
    ("account", "address"),
    ("uint", "uint256"),
    ("int", "int256"),
];

/// Canonical name for a (possibly aliased) base type name.
pub fn normalize(name: &str) -> &str {
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |&(_, canonical)| canonical)
}

/// The base types a [`TypeNameMapping`] can map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaseTypeName {
    /// `address`
    Address,
    /// `uint8` .. `uint256`
    Uint(u16),
    /// `int8` .. `int256`
    Int(u16),
    /// `string`
    String,
    /// `bool`
    Bool,
    /// `bytes`
    Bytes,
    /// `bytes1` .. `bytes32`
    FixedBytes(u8),
}

impl BaseTypeName {
    /// Every base type: `address`, all `uintN`, all `intN`, `string`, `bool`, `bytes`
    /// and all `bytesN`.
    pub fn all() -> impl Iterator<Item = BaseTypeName> {
        let widths = || (8..=256).step_by(8);
        std::iter::once(BaseTypeName::Address)
            .chain(widths().map(BaseTypeName::Uint))
            .chain(widths().map(BaseTypeName::Int))
            .chain([BaseTypeName::String, BaseTypeName::Bool, BaseTypeName::Bytes])
            .chain((1..=32).map(BaseTypeName::FixedBytes))
    }

    /// Bit width of integer types.
    pub fn bits(self) -> Option<u16> {
        match self {
            BaseTypeName::Uint(bits) | BaseTypeName::Int(bits) => Some(bits),
            _ => None,
        }
    }
}

fn parse_bits(bits: &str) -> Option<u16> {
    let bits: u16 = bits.parse().ok()?;
    ((8..=256).contains(&bits) && bits % 8 == 0).then_some(bits)
}

impl FromStr for BaseTypeName {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || GenError::UnknownBaseType(s.to_string());
        match s {
            "address" => Ok(BaseTypeName::Address),
            "string" => Ok(BaseTypeName::String),
            "bool" => Ok(BaseTypeName::Bool),
            "bytes" => Ok(BaseTypeName::Bytes),
            _ => {
                if let Some(len) = s.strip_prefix("bytes") {
                    len.parse()
                        .ok()
                        .filter(|len| (1..=32).contains(len))
                        .map(BaseTypeName::FixedBytes)
                        .ok_or_else(unknown)
                } else if let Some(bits) = s.strip_prefix("uint") {
                    parse_bits(bits).map(BaseTypeName::Uint).ok_or_else(unknown)
                } else if let Some(bits) = s.strip_prefix("int") {
                    parse_bits(bits).map(BaseTypeName::Int).ok_or_else(unknown)
                } else {
                    Err(unknown())
                }
            }
        }
    }
}

impl fmt::Display for BaseTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseTypeName::Address => write!(f, "address"),
            BaseTypeName::Uint(bits) => write!(f, "uint{bits}"),
            BaseTypeName::Int(bits) => write!(f, "int{bits}"),
            BaseTypeName::String => write!(f, "string"),
            BaseTypeName::Bool => write!(f, "bool"),
            BaseTypeName::Bytes => write!(f, "bytes"),
            BaseTypeName::FixedBytes(len) => write!(f, "bytes{len}"),
        }
    }
}

/// Base type to TypeScript type expression table.
///
/// The table may be partial; base types without an entry map to their own name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeNameMapping(BTreeMap<BaseTypeName, String>);

impl TypeNameMapping {
    /// A mapping with no entries.
    pub fn empty() -> Self {
        TypeNameMapping(BTreeMap::new())
    }

    /// The default table: anything a caller may pass in.
    ///
    /// `bool` and `bytes` types have no entry and keep their names.
    pub fn defaults() -> Self {
        TypeNameMapping(
            BaseTypeName::all()
                .filter_map(|base| {
                    let expr = match base {
                        BaseTypeName::Address => "string | bigint",
                        BaseTypeName::Uint(_) | BaseTypeName::Int(_) => "string | bigint | number",
                        BaseTypeName::String => "string",
                        _ => return None,
                    };
                    Some((base, expr.to_string()))
                })
                .collect(),
        )
    }

    /// The table used for ethers.js client parameters.
    pub fn ethers() -> Self {
        TypeNameMapping(
            BaseTypeName::all()
                .map(|base| {
                    let expr = match base {
                        BaseTypeName::Address | BaseTypeName::String => "string",
                        BaseTypeName::Uint(bits) | BaseTypeName::Int(bits) if bits <= 8 => "number",
                        BaseTypeName::Uint(_) | BaseTypeName::Int(_) => "bigint",
                        BaseTypeName::Bool => "boolean",
                        BaseTypeName::Bytes | BaseTypeName::FixedBytes(_) => "string",
                    };
                    (base, expr.to_string())
                })
                .collect(),
        )
    }

    /// Set the expression for a base type.
    pub fn with(mut self, base: BaseTypeName, expr: impl Into<String>) -> Self {
        self.0.insert(base, expr.into());
        self
    }

    /// Set the expression for a base type given by name (aliases allowed).
    ///
    /// # Errors
    ///
    /// [`GenError::UnknownBaseType`] if the name is not a mappable base type.
    pub fn with_name(self, name: &str, expr: impl Into<String>) -> Result<Self> {
        let base = normalize(name).parse()?;
        Ok(self.with(base, expr))
    }

    /// The expression for a base type.
    pub fn get(&self, base: BaseTypeName) -> Option<&str> {
        self.0.get(&base).map(String::as_str)
    }

    /// The expression for a base type name (after alias normalization).
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.get(normalize(name).parse().ok()?)
    }

    /// Entries in base type order.
    pub fn iter(&self) -> impl Iterator<Item = (BaseTypeName, &str)> {
        self.0.iter().map(|(base, expr)| (*base, expr.as_str()))
    }
}

impl Default for TypeNameMapping {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Parenthesize an expression that contains whitespace.
pub fn enclose(expr: &str) -> Cow<'_, str> {
    if expr.contains(char::is_whitespace) {
        Cow::Owned(format!("({expr})"))
    } else {
        Cow::Borrowed(expr)
    }
}

/// Map an ABI parameter type to a TypeScript type expression.
///
/// Arrays become `T[]` (with `T` parenthesized if needed), tuples become positional
/// tuple types, and regular types are looked up in `mapping`, falling back to the
/// (alias-normalized) type name.
pub fn map_type(field: &AbiField, mapping: &TypeNameMapping) -> String {
    if let Some(element) = field.element() {
        return format!("{}[]", enclose(&map_type(&element, mapping)));
    }
    match &field.kind {
        FieldKind::Tuple { components, .. } => format!(
            "[{}]",
            components.iter().map(|c| map_type(c, mapping)).join(", ")
        ),
        FieldKind::Regular { type_name, .. } => {
            let name = normalize(type_name);
            mapping.lookup(name).unwrap_or(name).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn field(ty: &str) -> AbiField {
        AbiField::new("", ty, None).unwrap()
    }

    #[rstest]
    #[case("address", "string | bigint")]
    #[case("account", "string | bigint")]
    #[case("uint256", "string | bigint | number")]
    #[case("uint", "string | bigint | number")]
    #[case("byte", "string | bigint | number")]
    #[case("int8", "string | bigint | number")]
    #[case("string", "string")]
    #[case("bool", "bool")]
    #[case("bytes32", "bytes32")]
    #[case("uint256[]", "(string | bigint | number)[]")]
    #[case("uint8[3]", "(string | bigint | number)[]")]
    #[case("uint8[][]", "((string | bigint | number)[])[]")]
    #[case("bool[]", "bool[]")]
    fn default_mapping(#[case] ty: &str, #[case] expected: &str) {
        assert_eq!(map_type(&field(ty), &TypeNameMapping::defaults()), expected);
    }

    #[rstest]
    #[case("address", "string")]
    #[case("uint8", "number")]
    #[case("int8", "number")]
    #[case("uint16", "bigint")]
    #[case("uint256[]", "bigint[]")]
    #[case("bool", "boolean")]
    #[case("bytes", "string")]
    #[case("bytes32[2]", "string[]")]
    fn ethers_mapping(#[case] ty: &str, #[case] expected: &str) {
        assert_eq!(map_type(&field(ty), &TypeNameMapping::ethers()), expected);
    }

    #[test]
    fn tuple_mapping() {
        let tuple = AbiField::new("", "tuple", Some(vec![field("uint8"), field("uint8[]")])).unwrap();
        assert_eq!(
            map_type(&tuple, &TypeNameMapping::defaults()),
            "[string | bigint | number, (string | bigint | number)[]]"
        );
        let tuples = AbiField::new("", "tuple[]", Some(vec![field("address"), field("bool")])).unwrap();
        assert_eq!(
            map_type(&tuples, &TypeNameMapping::ethers()),
            "([string, boolean])[]"
        );
    }

    #[test]
    fn mapping_is_validated() {
        let mapping = TypeNameMapping::empty()
            .with_name("account", "Address")
            .unwrap()
            .with_name("uint", "BigNumberish")
            .unwrap();
        assert_eq!(mapping.get(BaseTypeName::Address), Some("Address"));
        assert_eq!(mapping.lookup("uint256"), Some("BigNumberish"));
        assert_eq!(mapping.lookup("uint8"), None);
        assert_eq!(map_type(&field("uint8"), &mapping), "uint8");
        assert!(TypeNameMapping::empty().with_name("uint7", "x").is_err());
        assert!(TypeNameMapping::empty().with_name("bool", "x").is_ok());
        assert!(TypeNameMapping::empty().with_name("bytes33", "x").is_err());
        assert!(TypeNameMapping::empty().with_name("bytes0", "x").is_err());
        assert!(TypeNameMapping::empty().with_name("uint512", "x").is_err());
        assert!(TypeNameMapping::empty().with_name("bytes32[]", "x").is_err());
    }

    #[test]
    fn base_type_names() {
        assert_eq!(BaseTypeName::all().count(), 100);
        for base in BaseTypeName::all() {
            assert_eq!(base.to_string().parse::<BaseTypeName>().unwrap(), base);
        }
        assert_eq!(BaseTypeName::Uint(64).bits(), Some(64));
        assert_eq!(BaseTypeName::Address.bits(), None);
        assert_eq!(BaseTypeName::FixedBytes(4).bits(), None);
    }
}
