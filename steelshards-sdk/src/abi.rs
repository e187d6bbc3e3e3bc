//! The contract ABI as emitted by `solc` (the `abi` entry of a compiled contract).
//!
//! Parameter types are parsed once, on deserialization, into [`FieldKind`]: either a
//! regular (non-tuple) base type or a tuple of named components, each with a list of
//! array dimensions. Everything downstream (type mapping, client generation) works on
//! that structure instead of re-parsing type strings.

use itertools::Itertools;
use parse_display::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A contract ABI: an ordered list of entries.
pub type Abi = Vec<AbiEntry>;

/// Error raised when a parameter type string is not a valid ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid ABI type '{ty}': {reason}")]
pub struct InvalidAbiType {
    /// The offending type string
    pub ty: String,
    /// Why it was rejected
    pub reason: &'static str,
}

/// One array dimension of a parameter type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrayDim {
    /// `T[]`
    Dynamic,
    /// `T[N]`
    Fixed(usize),
}

impl fmt::Display for ArrayDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayDim::Dynamic => write!(f, "[]"),
            ArrayDim::Fixed(n) => write!(f, "[{n}]"),
        }
    }
}

/// The shape of a parameter type.
///
/// Dimensions are listed left to right as written, so `uint8[2][]` (a dynamic array of
/// `uint8[2]`) has dims `[Fixed(2), Dynamic]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// A non-tuple base type such as `address` or `uint256`.
    Regular {
        /// The base type name (without dimensions)
        type_name: String,
        /// Array dimensions
        dims: Vec<ArrayDim>,
    },
    /// A tuple (struct) type.
    Tuple {
        /// Tuple components, in order
        components: Vec<AbiField>,
        /// Array dimensions
        dims: Vec<ArrayDim>,
    },
}

/// A function, constructor, event or error parameter.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct AbiField {
    /// Parameter name (may be empty)
    pub name: String,
    /// Parsed parameter type
    pub kind: FieldKind,
    /// Solidity-level type (e.g., `struct Store.Item`)
    pub internal_type: Option<String>,
    /// Whether an event parameter is indexed
    pub indexed: Option<bool>,
}

/// Wire representation of [`AbiField`].
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<Vec<RawField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    internal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    indexed: Option<bool>,
}

/// Split `base[..][..]` into the base name and its dimensions.
fn split_dims(ty: &str) -> Result<(&str, Vec<ArrayDim>), InvalidAbiType> {
    let invalid = |reason| InvalidAbiType {
        ty: ty.to_string(),
        reason,
    };
    let mut base = ty.trim();
    let mut dims = vec![];
    while let Some(rest) = base.strip_suffix(']') {
        let open = rest.rfind('[').ok_or_else(|| invalid("unbalanced brackets"))?;
        let size = &rest[open + 1..];
        dims.push(if size.is_empty() {
            ArrayDim::Dynamic
        } else {
            ArrayDim::Fixed(size.parse().map_err(|_| invalid("bad array size"))?)
        });
        base = &rest[..open];
    }
    if base.is_empty() {
        return Err(invalid("missing base type"));
    }
    dims.reverse();
    Ok((base, dims))
}

impl TryFrom<RawField> for AbiField {
    type Error = InvalidAbiType;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let components = raw
            .components
            .map(|cs| cs.into_iter().map(AbiField::try_from).collect())
            .transpose()?;
        AbiField::new(raw.name, &raw.ty, components).map(|field| AbiField {
            internal_type: raw.internal_type,
            indexed: raw.indexed,
            ..field
        })
    }
}

impl From<AbiField> for RawField {
    fn from(field: AbiField) -> Self {
        let ty = field.type_string();
        let components = match field.kind {
            FieldKind::Tuple { components, .. } => {
                Some(components.into_iter().map(RawField::from).collect())
            }
            FieldKind::Regular { .. } => None,
        };
        RawField {
            name: field.name,
            ty,
            components,
            internal_type: field.internal_type,
            indexed: field.indexed,
        }
    }
}

impl AbiField {
    /// Create a parameter from a type string (e.g., `uint256[]` or `tuple[2]`).
    ///
    /// Tuple types must come with their components; other types must not.
    pub fn new(
        name: impl Into<String>,
        ty: &str,
        components: Option<Vec<AbiField>>,
    ) -> Result<Self, InvalidAbiType> {
        let (base, dims) = split_dims(ty)?;
        let kind = match (base, components) {
            ("tuple", Some(components)) => FieldKind::Tuple { components, dims },
            ("tuple", None) => {
                return Err(InvalidAbiType {
                    ty: ty.to_string(),
                    reason: "tuple without components",
                })
            }
            (_, Some(_)) => {
                return Err(InvalidAbiType {
                    ty: ty.to_string(),
                    reason: "components on a non-tuple type",
                })
            }
            (type_name, None) => FieldKind::Regular {
                type_name: type_name.to_string(),
                dims,
            },
        };
        Ok(AbiField {
            name: name.into(),
            kind,
            internal_type: None,
            indexed: None,
        })
    }

    /// An unnamed, non-array tuple of the given components.
    pub fn tuple_of(components: Vec<AbiField>) -> Self {
        AbiField {
            name: String::new(),
            kind: FieldKind::Tuple {
                components,
                dims: vec![],
            },
            internal_type: None,
            indexed: None,
        }
    }

    /// Array dimensions (empty for non-array types).
    pub fn dims(&self) -> &[ArrayDim] {
        match &self.kind {
            FieldKind::Regular { dims, .. } | FieldKind::Tuple { dims, .. } => dims,
        }
    }

    /// Whether this is an array type.
    pub fn is_array(&self) -> bool {
        !self.dims().is_empty()
    }

    /// Whether this is a (non-array) tuple type.
    pub fn is_tuple(&self) -> bool {
        matches!(self.kind, FieldKind::Tuple { .. })
    }

    /// The element type of an array (its outermost dimension removed).
    pub fn element(&self) -> Option<AbiField> {
        let mut element = self.clone();
        let dims = match &mut element.kind {
            FieldKind::Regular { dims, .. } | FieldKind::Tuple { dims, .. } => dims,
        };
        dims.pop()?;
        Some(element)
    }

    /// The base type name (`tuple` for tuples).
    pub fn base_type(&self) -> &str {
        match &self.kind {
            FieldKind::Regular { type_name, .. } => type_name,
            FieldKind::Tuple { .. } => "tuple",
        }
    }

    /// The type string as it appears in the ABI JSON (e.g., `tuple[]`).
    pub fn type_string(&self) -> String {
        format!("{}{}", self.base_type(), self.dims().iter().join(""))
    }

    /// The canonical type used in function signatures (e.g., `(uint256,address)[]`).
    pub fn canonical_type(&self) -> String {
        let base = match &self.kind {
            FieldKind::Regular { type_name, .. } => type_name.clone(),
            FieldKind::Tuple { components, .. } => {
                format!("({})", components.iter().map(AbiField::canonical_type).join(","))
            }
        };
        format!("{base}{}", self.dims().iter().join(""))
    }
}

/// Function state mutability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[display(style = "lowercase")]
pub enum StateMutability {
    /// Neither reads nor modifies state
    Pure,
    /// Reads but does not modify state
    View,
    /// Modifies state, rejects ether
    Nonpayable,
    /// Modifies state, accepts ether
    Payable,
}

impl StateMutability {
    /// Whether calls can be answered without sending a transaction.
    pub fn is_read_only(self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

/// Resolve mutability for entries that only carry the legacy `constant`/`payable` flags.
fn mutability_of(
    explicit: Option<StateMutability>,
    constant: Option<bool>,
    payable: Option<bool>,
) -> StateMutability {
    match (explicit, constant, payable) {
        (Some(m), _, _) => m,
        (None, Some(true), _) => StateMutability::View,
        (None, _, Some(true)) => StateMutability::Payable,
        _ => StateMutability::Nonpayable,
    }
}

/// A function entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    /// Function name
    pub name: String,
    /// Parameters
    #[serde(default)]
    pub inputs: Vec<AbiField>,
    /// Return values
    #[serde(default)]
    pub outputs: Vec<AbiField>,
    /// Declared mutability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
    /// Legacy read-only flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    /// Legacy payable flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
}

impl Function {
    /// Effective mutability.
    pub fn mutability(&self) -> StateMutability {
        mutability_of(self.state_mutability, self.constant, self.payable)
    }

    /// The canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        format!(
            "{}({})",
            self.name,
            self.inputs.iter().map(AbiField::canonical_type).join(",")
        )
    }
}

/// The constructor entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    /// Parameters
    #[serde(default)]
    pub inputs: Vec<AbiField>,
    /// Declared mutability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
    /// Legacy payable flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
}

/// An event entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Event {
    /// Event name
    pub name: String,
    /// Parameters
    #[serde(default)]
    pub inputs: Vec<AbiField>,
    /// Anonymous events have no topic for their signature
    #[serde(default)]
    pub anonymous: bool,
}

/// A custom error entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorEntry {
    /// Error name
    pub name: String,
    /// Parameters
    #[serde(default)]
    pub inputs: Vec<AbiField>,
}

/// The fallback or receive entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpecialFunction {
    /// Declared mutability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
}

/// One ABI entry, tagged by its `type`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiEntry {
    /// `constructor`
    Constructor(Constructor),
    /// `function`
    Function(Function),
    /// `event`
    Event(Event),
    /// `error`
    Error(ErrorEntry),
    /// `fallback`
    Fallback(SpecialFunction),
    /// `receive`
    Receive(SpecialFunction),
}

/// All function entries, in ABI order.
pub fn functions(abi: &[AbiEntry]) -> impl Iterator<Item = &Function> {
    abi.iter().filter_map(|entry| match entry {
        AbiEntry::Function(f) => Some(f),
        _ => None,
    })
}

/// The constructor entry, if the contract declares one.
pub fn constructor(abi: &[AbiEntry]) -> Option<&Constructor> {
    abi.iter().find_map(|entry| match entry {
        AbiEntry::Constructor(c) => Some(c),
        _ => None,
    })
}
