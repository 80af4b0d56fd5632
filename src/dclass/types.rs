//! Type descriptors for distributed schemas
//!
//! A descriptor tree says how a value of some distributed type is laid out in
//! bytes. Trees are built bottom-up and never mutated afterwards; composite
//! nodes sit behind [`Arc`] so every message reuses the same schema without
//! copying it, and a node can never end up containing itself.

use std::fmt;
use std::sync::Arc;

/// Kind tag of a [`DistributedType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,
    /// IEEE-754 single precision float
    Float32,
    /// IEEE-754 double precision float
    Float64,
    /// Single byte character
    Char,
    /// Fixed-length string
    String,
    /// Size-tagged string
    VarString,
    /// Fixed-length blob
    Blob,
    /// Size-tagged blob
    VarBlob,
    /// Fixed-length array
    Array,
    /// Size-tagged array
    VarArray,
    /// Struct of named fields
    Struct,
    /// Parameter list
    Method,
    /// Unresolved type
    Invalid,
}

impl Type {
    /// Schema keyword for this kind
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Char => "char",
            Self::String => "string",
            Self::VarString => "varstring",
            Self::Blob => "blob",
            Self::VarBlob => "varblob",
            Self::Array => "array",
            Self::VarArray => "vararray",
            Self::Struct => "struct",
            Self::Method => "method",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Schema node describing the packed layout of one value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistributedType {
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,
    /// IEEE-754 single precision float
    Float32,
    /// IEEE-754 double precision float
    Float64,
    /// Single byte character
    Char,
    /// String of exactly `size` bytes, no size tag
    String {
        /// Byte length fixed by the schema
        size: usize,
    },
    /// Size-tagged string
    VarString,
    /// Blob of exactly `size` bytes, no size tag
    Blob {
        /// Byte length fixed by the schema
        size: usize,
    },
    /// Size-tagged blob
    VarBlob,
    /// Fixed or variable length array
    Array(Arc<ArrayType>),
    /// Ordered named fields
    Struct(Arc<Struct>),
    /// Ordered parameter list
    Method(Arc<Method>),
    /// Sentinel for a schema that failed to resolve
    Invalid,
}

impl DistributedType {
    /// Fixed array of `size` elements
    #[must_use]
    pub fn array(element: DistributedType, size: usize) -> Self {
        Self::Array(Arc::new(ArrayType::new(element, Some(size))))
    }

    /// Size-tagged array; the tag counts bytes, not elements
    #[must_use]
    pub fn var_array(element: DistributedType) -> Self {
        Self::Array(Arc::new(ArrayType::new(element, None)))
    }

    /// Kind tag
    #[must_use]
    pub fn kind(&self) -> Type {
        match self {
            Self::Int8 => Type::Int8,
            Self::Int16 => Type::Int16,
            Self::Int32 => Type::Int32,
            Self::Int64 => Type::Int64,
            Self::UInt8 => Type::UInt8,
            Self::UInt16 => Type::UInt16,
            Self::UInt32 => Type::UInt32,
            Self::UInt64 => Type::UInt64,
            Self::Float32 => Type::Float32,
            Self::Float64 => Type::Float64,
            Self::Char => Type::Char,
            Self::String { .. } => Type::String,
            Self::VarString => Type::VarString,
            Self::Blob { .. } => Type::Blob,
            Self::VarBlob => Type::VarBlob,
            Self::Array(array) if array.is_variable() => Type::VarArray,
            Self::Array(_) => Type::Array,
            Self::Struct(_) => Type::Struct,
            Self::Method(_) => Type::Method,
            Self::Invalid => Type::Invalid,
        }
    }

    /// Encoded width in bytes, or `None` when the width is read from the
    /// stream.
    #[must_use]
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 | Self::Char => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            Self::String { size } | Self::Blob { size } => Some(*size),
            Self::VarString | Self::VarBlob | Self::Invalid => None,
            Self::Array(array) => array.fixed_size(),
            Self::Struct(strct) => sum_fixed(strct.fields().iter().map(Field::distributed_type)),
            Self::Method(method) => {
                sum_fixed(method.parameters().iter().map(Parameter::distributed_type))
            }
        }
    }

    /// Check whether the encoded width is known from the schema alone
    #[must_use]
    pub fn has_fixed_size(&self) -> bool {
        self.fixed_size().is_some()
    }

    /// Levels of composite nesting below and including this node
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Array(array) => 1 + array.element_type().depth(),
            Self::Struct(strct) => {
                1 + strct
                    .fields()
                    .iter()
                    .map(|f| f.distributed_type().depth())
                    .max()
                    .unwrap_or(0)
            }
            Self::Method(method) => {
                1 + method
                    .parameters()
                    .iter()
                    .map(|p| p.distributed_type().depth())
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Array node, if this is an array
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Struct node, if this is a struct
    #[must_use]
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Self::Struct(strct) => Some(strct),
            _ => None,
        }
    }

    /// Method node, if this is a method
    #[must_use]
    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Self::Method(method) => Some(method),
            _ => None,
        }
    }
}

fn sum_fixed<'a>(mut types: impl Iterator<Item = &'a DistributedType>) -> Option<usize> {
    types.try_fold(0usize, |total, t| total.checked_add(t.fixed_size()?))
}

impl From<Struct> for DistributedType {
    fn from(strct: Struct) -> Self {
        Self::Struct(Arc::new(strct))
    }
}

impl From<Method> for DistributedType {
    fn from(method: Method) -> Self {
        Self::Method(Arc::new(method))
    }
}

impl From<ArrayType> for DistributedType {
    fn from(array: ArrayType) -> Self {
        Self::Array(Arc::new(array))
    }
}

/// Array element descriptor plus an optional element count
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayType {
    element_type: DistributedType,
    array_size: Option<usize>,
}

impl ArrayType {
    /// `array_size` of `None` makes a variable length array
    #[must_use]
    pub fn new(element_type: DistributedType, array_size: Option<usize>) -> Self {
        Self {
            element_type,
            array_size,
        }
    }

    /// Descriptor of every element
    #[must_use]
    pub fn element_type(&self) -> &DistributedType {
        &self.element_type
    }

    /// Element count of a fixed array
    #[must_use]
    pub fn array_size(&self) -> Option<usize> {
        self.array_size
    }

    /// Check whether the array length is read from a size tag
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.array_size.is_none()
    }

    fn fixed_size(&self) -> Option<usize> {
        let count = self.array_size?;
        self.element_type.fixed_size()?.checked_mul(count)
    }
}

/// Named field of a [`Struct`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    name: String,
    distributed_type: DistributedType,
}

impl Field {
    /// Field called `name` holding a `distributed_type`
    #[must_use]
    pub fn new(name: impl Into<String>, distributed_type: DistributedType) -> Self {
        Self {
            name: name.into(),
            distributed_type,
        }
    }

    /// Field name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptor
    #[must_use]
    pub fn distributed_type(&self) -> &DistributedType {
        &self.distributed_type
    }
}

/// Struct descriptor: fields packed back to back in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Struct {
    name: String,
    fields: Vec<Field>,
}

impl Struct {
    /// Empty struct called `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field
    #[must_use]
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        distributed_type: DistributedType,
    ) -> Self {
        self.fields.push(Field::new(name, distributed_type));
        self
    }

    /// Struct name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look a field up by name
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Parameter of a [`Method`]; parameters may be anonymous
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    name: Option<String>,
    distributed_type: DistributedType,
}

impl Parameter {
    /// Parameter, anonymous when `name` is `None`
    #[must_use]
    pub fn new(name: Option<String>, distributed_type: DistributedType) -> Self {
        Self {
            name,
            distributed_type,
        }
    }

    /// Parameter name, if any
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Parameter descriptor
    #[must_use]
    pub fn distributed_type(&self) -> &DistributedType {
        &self.distributed_type
    }
}

/// Method descriptor: an ordered parameter list
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Method {
    parameters: Vec<Parameter>,
}

impl Method {
    /// Method with no parameters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named parameter
    #[must_use]
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        distributed_type: DistributedType,
    ) -> Self {
        self.parameters
            .push(Parameter::new(Some(name.into()), distributed_type));
        self
    }

    /// Append an anonymous parameter
    #[must_use]
    pub fn with_anonymous(mut self, distributed_type: DistributedType) -> Self {
        self.parameters.push(Parameter::new(None, distributed_type));
        self
    }

    /// Parameters in declaration order
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}
