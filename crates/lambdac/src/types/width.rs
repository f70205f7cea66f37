//! Machine widths and sorts

use std::fmt;

/// Width of a floating-point number, boxed or unboxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatWidth {
    F64,
    F32,
}

/// Width of a fixed-size integer, boxed or unboxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntWidth {
    Int8,
    Int16,
    Int32,
    Int64,
    /// Machine word
    Nativeint,
}

/// Width of a SIMD vector, boxed or unboxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VectorWidth {
    Vec128,
    Vec256,
    Vec512,
}

impl FloatWidth {
    pub fn name(self) -> &'static str {
        match self {
            FloatWidth::F64 => "float",
            FloatWidth::F32 => "float32",
        }
    }

    pub fn sort(self) -> BaseSort {
        match self {
            FloatWidth::F64 => BaseSort::Float64,
            FloatWidth::F32 => BaseSort::Float32,
        }
    }
}

impl IntWidth {
    pub fn name(self) -> &'static str {
        match self {
            IntWidth::Int8 => "int8",
            IntWidth::Int16 => "int16",
            IntWidth::Int32 => "int32",
            IntWidth::Int64 => "int64",
            IntWidth::Nativeint => "nativeint",
        }
    }

    pub fn sort(self) -> BaseSort {
        match self {
            IntWidth::Int8 => BaseSort::Bits8,
            IntWidth::Int16 => BaseSort::Bits16,
            IntWidth::Int32 => BaseSort::Bits32,
            IntWidth::Int64 => BaseSort::Bits64,
            IntWidth::Nativeint => BaseSort::Word,
        }
    }
}

impl VectorWidth {
    pub fn name(self) -> &'static str {
        match self {
            VectorWidth::Vec128 => "vec128",
            VectorWidth::Vec256 => "vec256",
            VectorWidth::Vec512 => "vec512",
        }
    }

    pub fn sort(self) -> BaseSort {
        match self {
            VectorWidth::Vec128 => BaseSort::Vec128,
            VectorWidth::Vec256 => BaseSort::Vec256,
            VectorWidth::Vec512 => BaseSort::Vec512,
        }
    }
}

/// Base sorts, as supplied by the layout system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseSort {
    Void,
    Value,
    Float64,
    Float32,
    Word,
    Bits8,
    Bits16,
    Bits32,
    Bits64,
    Vec128,
    Vec256,
    Vec512,
}

impl BaseSort {
    pub fn name(self) -> &'static str {
        match self {
            BaseSort::Void => "void",
            BaseSort::Value => "value",
            BaseSort::Float64 => "float64",
            BaseSort::Float32 => "float32",
            BaseSort::Word => "word",
            BaseSort::Bits8 => "bits8",
            BaseSort::Bits16 => "bits16",
            BaseSort::Bits32 => "bits32",
            BaseSort::Bits64 => "bits64",
            BaseSort::Vec128 => "vec128",
            BaseSort::Vec256 => "vec256",
            BaseSort::Vec512 => "vec512",
        }
    }

    pub fn float_width(self) -> Option<FloatWidth> {
        match self {
            BaseSort::Float64 => Some(FloatWidth::F64),
            BaseSort::Float32 => Some(FloatWidth::F32),
            _ => None,
        }
    }

    pub fn int_width(self) -> Option<IntWidth> {
        match self {
            BaseSort::Bits8 => Some(IntWidth::Int8),
            BaseSort::Bits16 => Some(IntWidth::Int16),
            BaseSort::Bits32 => Some(IntWidth::Int32),
            BaseSort::Bits64 => Some(IntWidth::Int64),
            BaseSort::Word => Some(IntWidth::Nativeint),
            _ => None,
        }
    }

    pub fn vector_width(self) -> Option<VectorWidth> {
        match self {
            BaseSort::Vec128 => Some(VectorWidth::Vec128),
            BaseSort::Vec256 => Some(VectorWidth::Vec256),
            BaseSort::Vec512 => Some(VectorWidth::Vec512),
            _ => None,
        }
    }
}

/// A fully determined sort: either a base sort or an unboxed product of sorts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    Base(BaseSort),
    Product(Vec<Sort>),
}

impl Sort {
    pub const VALUE: Sort = Sort::Base(BaseSort::Value);
    pub const FLOAT64: Sort = Sort::Base(BaseSort::Float64);
    pub const FLOAT32: Sort = Sort::Base(BaseSort::Float32);
    pub const WORD: Sort = Sort::Base(BaseSort::Word);
    pub const BITS32: Sort = Sort::Base(BaseSort::Bits32);
    pub const BITS64: Sort = Sort::Base(BaseSort::Bits64);
    pub const VEC128: Sort = Sort::Base(BaseSort::Vec128);

    pub fn is_value(&self) -> bool {
        matches!(self, Sort::Base(BaseSort::Value))
    }

    pub fn is_product(&self) -> bool {
        matches!(self, Sort::Product(_))
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Base(base) => write!(f, "{}", base.name()),
            Sort::Product(sorts) => {
                write!(f, "(")?;
                for (i, sort) in sorts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{}", sort)?;
                }
                write!(f, ")")
            }
        }
    }
}
