//! Layouts: the shape of a value as tracked by the middle end

use std::fmt;
use super::width::{BaseSort, FloatWidth, IntWidth, Sort, VectorWidth};

/// Layout of a lambda value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Unconstrained; nothing is known about the value
    Top,
    /// A boxed or immediate value, refined by its value kind
    Value(ValueKind),
    UnboxedFloat(FloatWidth),
    UnboxedInt(IntWidth),
    UnboxedVector(VectorWidth),
    /// Unboxed product; constituents may themselves be products
    UnboxedProduct(Vec<Layout>),
    /// Never returns
    Bottom,
}

/// Refinement of the boxed-value layout
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Generic,
    /// Tagged immediate integer
    Int,
    BoxedFloat(FloatWidth),
    BoxedInt(IntWidth),
    /// Variant with constant constructors `consts` and block constructors
    /// `non_consts` (tag, field shape). Both lists are kept sorted by tag.
    Variant {
        consts: Vec<u32>,
        non_consts: Vec<(u32, ConstructorShape)>,
    },
    Array(ArrayKind),
    BoxedVector(VectorWidth),
}

/// Field shape of a block constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstructorShape {
    Uniform(Vec<ValueKind>),
    Mixed(MixedBlockShape),
}

/// A block with a prefix of scanned values followed by flat (unscanned) fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MixedBlockShape {
    pub value_prefix_len: usize,
    pub flat_suffix: Vec<FlatElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlatElement {
    Imm,
    Float(FloatWidth),
    Bits(IntWidth),
    Vector(VectorWidth),
}

impl FlatElement {
    /// Layout of the field once read out of the block
    pub fn layout(self) -> Layout {
        match self {
            FlatElement::Imm => Layout::int(),
            FlatElement::Float(width) => Layout::UnboxedFloat(width),
            FlatElement::Bits(width) => Layout::UnboxedInt(width),
            FlatElement::Vector(width) => Layout::UnboxedVector(width),
        }
    }
}

/// Array element representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    Generic,
    Addr,
    Int,
    Float,
    UnboxedFloat(FloatWidth),
    UnboxedInt(IntWidth),
    UnboxedVector(VectorWidth),
}

impl Layout {
    // ==================== Standard layouts ====================

    pub fn top() -> Self {
        Layout::Top
    }

    pub fn bottom() -> Self {
        Layout::Bottom
    }

    pub fn any_value() -> Self {
        Layout::Value(ValueKind::Generic)
    }

    pub fn unit() -> Self {
        Layout::Value(ValueKind::Int)
    }

    pub fn int() -> Self {
        Layout::Value(ValueKind::Int)
    }

    pub fn array(kind: ArrayKind) -> Self {
        Layout::Value(ValueKind::Array(kind))
    }

    pub fn block() -> Self {
        Self::any_value()
    }

    pub fn list() -> Self {
        Layout::Value(ValueKind::Variant {
            consts: vec![0],
            non_consts: vec![(
                0,
                ConstructorShape::Uniform(vec![ValueKind::Generic, ValueKind::Generic]),
            )],
        })
    }

    pub fn exception() -> Self {
        Self::any_value()
    }

    pub fn function() -> Self {
        Self::any_value()
    }

    pub fn object() -> Self {
        Self::any_value()
    }

    pub fn class() -> Self {
        Self::any_value()
    }

    pub fn module() -> Self {
        Self::any_value()
    }

    pub fn functor() -> Self {
        Self::any_value()
    }

    pub fn module_field() -> Self {
        Self::any_value()
    }

    pub fn string() -> Self {
        Self::any_value()
    }

    pub fn field() -> Self {
        Self::any_value()
    }

    pub fn lazy_value() -> Self {
        Self::any_value()
    }

    pub fn letrec() -> Self {
        Self::any_value()
    }

    pub fn probe_arg() -> Self {
        Self::any_value()
    }

    /// Boxed float64
    pub fn float() -> Self {
        Self::boxed_float(FloatWidth::F64)
    }

    pub fn boxed_float(width: FloatWidth) -> Self {
        Layout::Value(ValueKind::BoxedFloat(width))
    }

    pub fn unboxed_float(width: FloatWidth) -> Self {
        Layout::UnboxedFloat(width)
    }

    pub fn boxed_int(width: IntWidth) -> Self {
        Layout::Value(ValueKind::BoxedInt(width))
    }

    pub fn unboxed_int(width: IntWidth) -> Self {
        Layout::UnboxedInt(width)
    }

    pub fn unboxed_nativeint() -> Self {
        Layout::UnboxedInt(IntWidth::Nativeint)
    }

    pub fn boxed_vector(width: VectorWidth) -> Self {
        Layout::Value(ValueKind::BoxedVector(width))
    }

    pub fn unboxed_vector(width: VectorWidth) -> Self {
        Layout::UnboxedVector(width)
    }

    pub fn unboxed_product(layouts: Vec<Layout>) -> Self {
        Layout::UnboxedProduct(layouts)
    }

    /// Layout of a value of the given sort
    pub fn of_sort(sort: &Sort) -> Self {
        match sort {
            Sort::Base(BaseSort::Value) => Self::any_value(),
            // void values carry no data
            Sort::Base(BaseSort::Void) => Layout::UnboxedProduct(Vec::new()),
            Sort::Base(base) => {
                if let Some(width) = base.float_width() {
                    Layout::UnboxedFloat(width)
                } else if let Some(width) = base.int_width() {
                    Layout::UnboxedInt(width)
                } else if let Some(width) = base.vector_width() {
                    Layout::UnboxedVector(width)
                } else {
                    Self::any_value()
                }
            }
            Sort::Product(sorts) => Layout::UnboxedProduct(sorts.iter().map(Self::of_sort).collect()),
        }
    }

    // ==================== Queries ====================

    pub fn is_bottom(&self) -> bool {
        matches!(self, Layout::Bottom)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Layout::Value(_))
    }

    /// Whether two layouts can describe the same join point.
    ///
    /// Bottom is compatible with everything. Two value layouts are
    /// compatible when their kinds match or one of them is generic.
    pub fn is_compatible(&self, other: &Layout) -> bool {
        match (self, other) {
            (Layout::Bottom, _) | (_, Layout::Bottom) => true,
            (Layout::Top, Layout::Top) => true,
            (Layout::Value(k1), Layout::Value(k2)) => {
                k1 == k2 || *k1 == ValueKind::Generic || *k2 == ValueKind::Generic
            }
            (Layout::UnboxedFloat(w1), Layout::UnboxedFloat(w2)) => w1 == w2,
            (Layout::UnboxedInt(w1), Layout::UnboxedInt(w2)) => w1 == w2,
            (Layout::UnboxedVector(w1), Layout::UnboxedVector(w2)) => w1 == w2,
            (Layout::UnboxedProduct(l1), Layout::UnboxedProduct(l2)) => {
                l1.len() == l2.len() && l1.iter().zip(l2).all(|(a, b)| a.is_compatible(b))
            }
            _ => false,
        }
    }

    /// Least layout describing both `self` and `other`
    pub fn union(&self, other: &Layout) -> Layout {
        match (self, other) {
            (Layout::Bottom, layout) | (layout, Layout::Bottom) => layout.clone(),
            (Layout::Value(k1), Layout::Value(k2)) => Layout::Value(k1.union(k2)),
            (Layout::UnboxedProduct(l1), Layout::UnboxedProduct(l2)) if l1.len() == l2.len() => {
                Layout::UnboxedProduct(l1.iter().zip(l2).map(|(a, b)| a.union(b)).collect())
            }
            (l1, l2) if l1 == l2 => l1.clone(),
            _ => Layout::Top,
        }
    }
}

impl ValueKind {
    /// Least value kind describing both `self` and `other`
    pub fn union(&self, other: &ValueKind) -> ValueKind {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (
                ValueKind::Variant { consts: c1, non_consts: n1 },
                ValueKind::Variant { consts: c2, non_consts: n2 },
            ) => {
                let mut consts: Vec<u32> = c1.iter().chain(c2).copied().collect();
                consts.sort_unstable();
                consts.dedup();
                match union_non_consts(n1, n2) {
                    Some(non_consts) => ValueKind::Variant { consts, non_consts },
                    None => ValueKind::Generic,
                }
            }
            _ => ValueKind::Generic,
        }
    }
}

fn union_non_consts(
    n1: &[(u32, ConstructorShape)],
    n2: &[(u32, ConstructorShape)],
) -> Option<Vec<(u32, ConstructorShape)>> {
    let mut merged: Vec<(u32, ConstructorShape)> = n1.to_vec();
    for (tag, shape) in n2 {
        match merged.iter_mut().find(|(t, _)| t == tag) {
            Some((_, existing)) => *existing = union_shape(existing, shape)?,
            None => merged.push((*tag, shape.clone())),
        }
    }
    merged.sort_by_key(|(tag, _)| *tag);
    Some(merged)
}

fn union_shape(s1: &ConstructorShape, s2: &ConstructorShape) -> Option<ConstructorShape> {
    match (s1, s2) {
        (ConstructorShape::Uniform(f1), ConstructorShape::Uniform(f2)) if f1.len() == f2.len() => {
            Some(ConstructorShape::Uniform(
                f1.iter().zip(f2).map(|(a, b)| a.union(b)).collect(),
            ))
        }
        (ConstructorShape::Mixed(m1), ConstructorShape::Mixed(m2)) if m1 == m2 => {
            Some(ConstructorShape::Mixed(m1.clone()))
        }
        _ => None,
    }
}

impl fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKind::Generic => write!(f, "gen"),
            ArrayKind::Addr => write!(f, "addr"),
            ArrayKind::Int => write!(f, "int"),
            ArrayKind::Float => write!(f, "float"),
            ArrayKind::UnboxedFloat(width) => write!(f, "unboxed_{}", width.name()),
            ArrayKind::UnboxedInt(width) => write!(f, "unboxed_{}", width.name()),
            ArrayKind::UnboxedVector(width) => write!(f, "unboxed_{}", width.name()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Generic => write!(f, "*"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::BoxedFloat(width) => write!(f, "{}", width.name()),
            ValueKind::BoxedInt(width) => write!(f, "{}", width.name()),
            ValueKind::BoxedVector(width) => write!(f, "{}", width.name()),
            ValueKind::Array(kind) => write!(f, "{}array", kind),
            ValueKind::Variant { consts, non_consts } => {
                write!(f, "[")?;
                for (i, tag) in consts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", tag)?;
                }
                for (tag, shape) in non_consts {
                    write!(f, "|{}:", tag)?;
                    match shape {
                        ConstructorShape::Uniform(fields) => {
                            write!(f, "(")?;
                            for (i, field) in fields.iter().enumerate() {
                                if i > 0 {
                                    write!(f, ",")?;
                                }
                                write!(f, "{}", field)?;
                            }
                            write!(f, ")")?;
                        }
                        ConstructorShape::Mixed(shape) => {
                            write!(f, "mixed({}+{})", shape.value_prefix_len, shape.flat_suffix.len())?;
                        }
                    }
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Top => write!(f, "top"),
            Layout::Bottom => write!(f, "bottom"),
            Layout::Value(kind) => write!(f, "{}", kind),
            Layout::UnboxedFloat(width) => write!(f, "{}#", width.name()),
            Layout::UnboxedInt(width) => write!(f, "{}#", width.name()),
            Layout::UnboxedVector(width) => write!(f, "{}#", width.name()),
            Layout::UnboxedProduct(layouts) => {
                write!(f, "#(")?;
                for (i, layout) in layouts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", layout)?;
                }
                write!(f, ")")
            }
        }
    }
}
