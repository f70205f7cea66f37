//! Lambda-level primitive operations

use std::fmt;
use std::rc::Rc;
use crate::primitive::Description;
use crate::types::{ArrayKind, FloatWidth, IntWidth, MixedBlockShape, ValueKind, VectorWidth};

/// Where an allocating primitive puts its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllocMode {
    #[default]
    Heap,
    /// In the innermost open region
    Local,
}

impl AllocMode {
    pub fn is_local(self) -> bool {
        self == AllocMode::Local
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    Immutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmediateOrPointer {
    Immediate,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitOrAssign {
    /// Heap initialization of a fresh block
    HeapInit,
    /// Initialization of a local block
    LocalInit,
    Assignment(AllocMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsSafe {
    Safe,
    Unsafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerComparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatComparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    NotLt,
    NotGt,
    NotLe,
    NotGe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaiseKind {
    Regular,
    Reraise,
    Notrace,
}

/// How an array read produces its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayRefKind {
    Gen(AllocMode),
    Addr,
    Int,
    Float(AllocMode),
    UnboxedFloat(FloatWidth),
    UnboxedInt(IntWidth),
    UnboxedVector(VectorWidth),
}

/// Width of an array index argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayIndexKind {
    TaggedInt,
    UntaggedInt(IntWidth),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BigarrayKind {
    Unknown,
    Float32,
    Float64,
    Sint8,
    Uint8,
    Sint16,
    Uint16,
    Int32,
    Int64,
    CamlInt,
    NativeInt,
    Complex32,
    Complex64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BigarrayLayout {
    Unknown,
    CLayout,
    FortranLayout,
}

/// Access width of string, bytes and bigstring loads and stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryAccessSize {
    Sixteen,
    ThirtyTwo,
    SixtyFour,
    /// 128-bit vector access, aligned or not
    OneTwentyEight { aligned: bool },
}

/// Byte container accessed by a load or store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteContainer {
    String,
    Bytes,
    Bigstring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileTimeConstant {
    BigEndian,
    WordSize,
    IntSize,
    MaxWosize,
    OstypeUnix,
    OstypeWin32,
    OstypeCygwin,
    BackendType,
    Runtime5,
}

/// Primitive operations of the lambda language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    BytesToString,
    BytesOfString,
    Ignore,
    GetGlobal(String),
    SetGlobal(String),
    GetPredef(String),

    // === Blocks ===
    MakeBlock {
        tag: u32,
        mutability: Mutability,
        shape: Option<Vec<ValueKind>>,
        mode: AllocMode,
    },
    MakeFloatBlock {
        mutability: Mutability,
        mode: AllocMode,
    },
    MakeMixedBlock {
        tag: u32,
        mutability: Mutability,
        shape: MixedBlockShape,
        mode: AllocMode,
    },
    Field {
        index: usize,
        mutability: Mutability,
    },
    FieldComputed,
    SetField {
        index: usize,
        ptr: ImmediateOrPointer,
        init: InitOrAssign,
    },
    SetFieldComputed {
        ptr: ImmediateOrPointer,
        init: InitOrAssign,
    },
    FloatField {
        index: usize,
        mode: AllocMode,
    },
    SetFloatField {
        index: usize,
        init: InitOrAssign,
    },
    DupRecord,

    /// Call to an external primitive
    Ccall(Rc<Description>),
    Raise(RaiseKind),

    // === Booleans and integers ===
    Sequand,
    Sequor,
    Not,
    NegInt,
    AddInt,
    SubInt,
    MulInt,
    DivInt(IsSafe),
    ModInt(IsSafe),
    AndInt,
    OrInt,
    XorInt,
    LslInt,
    LsrInt,
    AsrInt,
    IntComp(IntegerComparison),
    OffsetInt(i64),
    OffsetRef(i64),

    // === Floats ===
    IntOfFloat(FloatWidth),
    FloatOfInt(FloatWidth, AllocMode),
    FloatOfFloat32(AllocMode),
    Float32OfFloat(AllocMode),
    NegFloat(FloatWidth, AllocMode),
    AbsFloat(FloatWidth, AllocMode),
    AddFloat(FloatWidth, AllocMode),
    SubFloat(FloatWidth, AllocMode),
    MulFloat(FloatWidth, AllocMode),
    DivFloat(FloatWidth, AllocMode),
    FloatComp(FloatWidth, FloatComparison),
    UnboxFloat(FloatWidth),
    BoxFloat(FloatWidth, AllocMode),

    // === Strings and bytes ===
    StringLength,
    StringRef(IsSafe),
    BytesLength,
    BytesRef(IsSafe),
    BytesSet(IsSafe),

    // === Arrays ===
    MakeArray {
        kind: ArrayKind,
        mutability: Mutability,
        mode: AllocMode,
    },
    DupArray(ArrayKind, Mutability),
    ArrayLength(ArrayKind),
    ArrayRef {
        kind: ArrayRefKind,
        index: ArrayIndexKind,
        safe: IsSafe,
    },
    ArraySet {
        kind: ArrayKind,
        index: ArrayIndexKind,
        safe: IsSafe,
    },

    IsInt,
    IsOut,

    // === Boxed integers ===
    BintOfInt(IntWidth, AllocMode),
    IntOfBint(IntWidth),
    CvtBint {
        from: IntWidth,
        to: IntWidth,
        mode: AllocMode,
    },
    NegBint(IntWidth, AllocMode),
    AddBint(IntWidth, AllocMode),
    SubBint(IntWidth, AllocMode),
    MulBint(IntWidth, AllocMode),
    DivBint {
        width: IntWidth,
        safe: IsSafe,
        mode: AllocMode,
    },
    ModBint {
        width: IntWidth,
        safe: IsSafe,
        mode: AllocMode,
    },
    AndBint(IntWidth, AllocMode),
    OrBint(IntWidth, AllocMode),
    XorBint(IntWidth, AllocMode),
    LslBint(IntWidth, AllocMode),
    LsrBint(IntWidth, AllocMode),
    AsrBint(IntWidth, AllocMode),
    BintComp(IntWidth, IntegerComparison),
    UnboxInt(IntWidth),
    BoxInt(IntWidth, AllocMode),

    // === Bigarrays ===
    BigarrayRef {
        safe: IsSafe,
        dims: u8,
        kind: BigarrayKind,
        layout: BigarrayLayout,
    },
    BigarraySet {
        safe: IsSafe,
        dims: u8,
        kind: BigarrayKind,
        layout: BigarrayLayout,
    },
    BigarrayDim(u8),

    // === Raw memory access ===
    Load {
        container: ByteContainer,
        size: MemoryAccessSize,
        safe: IsSafe,
        /// Result left unboxed
        unboxed: bool,
        index: ArrayIndexKind,
        mode: AllocMode,
    },
    Store {
        container: ByteContainer,
        size: MemoryAccessSize,
        safe: IsSafe,
        unboxed: bool,
        index: ArrayIndexKind,
    },

    CtConst(CompileTimeConstant),
    Bswap16,
    Bbswap(IntWidth, AllocMode),
    IntAsPointer(AllocMode),
    Opaque(crate::types::Layout),
    ObjMagic(crate::types::Layout),
    ObjDup,
    GetHeader(AllocMode),
    ProbeIsEnabled(String),

    // === Atomics and runtime ===
    AtomicLoad(ImmediateOrPointer),
    AtomicExchange,
    AtomicCompareAndSet,
    AtomicFetchAdd,
    CpuRelax,
    DlsGet,
    Poll,

    // === Reinterpretation and vectors ===
    ReinterpretTaggedInt63AsUnboxedInt64,
    ReinterpretUnboxedInt64AsTaggedInt63,
    UnboxVector(VectorWidth),
    BoxVector(VectorWidth, AllocMode),
}

fn mode_suffix(mode: AllocMode) -> &'static str {
    match mode {
        AllocMode::Heap => "",
        AllocMode::Local => "[L]",
    }
}

fn safe_suffix(safe: IsSafe) -> &'static str {
    match safe {
        IsSafe::Safe => "s",
        IsSafe::Unsafe => "u",
    }
}

impl fmt::Display for IntegerComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            IntegerComparison::Eq => "==",
            IntegerComparison::Ne => "!=",
            IntegerComparison::Lt => "<",
            IntegerComparison::Gt => ">",
            IntegerComparison::Le => "<=",
            IntegerComparison::Ge => ">=",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for FloatComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            FloatComparison::Eq => "==.",
            FloatComparison::Ne => "!=.",
            FloatComparison::Lt => "<.",
            FloatComparison::Gt => ">.",
            FloatComparison::Le => "<=.",
            FloatComparison::Ge => ">=.",
            FloatComparison::NotLt => "!<.",
            FloatComparison::NotGt => "!>.",
            FloatComparison::NotLe => "!<=.",
            FloatComparison::NotGe => "!>=.",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::BytesToString => write!(f, "bytes_to_string"),
            Primitive::BytesOfString => write!(f, "bytes_of_string"),
            Primitive::Ignore => write!(f, "ignore"),
            Primitive::GetGlobal(name) => write!(f, "global {}", name),
            Primitive::SetGlobal(name) => write!(f, "setglobal {}", name),
            Primitive::GetPredef(name) => write!(f, "getpredef {}", name),
            Primitive::MakeBlock { tag, mutability, mode, .. } => {
                let m = if *mutability == Mutability::Mutable { "mutable" } else { "block" };
                write!(f, "make{}{} {}", m, mode_suffix(*mode), tag)
            }
            Primitive::MakeFloatBlock { mode, .. } => write!(f, "makefloatblock{}", mode_suffix(*mode)),
            Primitive::MakeMixedBlock { tag, shape, mode, .. } => write!(
                f,
                "makemixedblock{} {} prefix={} flat={}",
                mode_suffix(*mode),
                tag,
                shape.value_prefix_len,
                shape.flat_suffix.len()
            ),
            Primitive::Field { index, mutability } => match mutability {
                Mutability::Mutable => write!(f, "field_mut {}", index),
                Mutability::Immutable => write!(f, "field_imm {}", index),
            },
            Primitive::FieldComputed => write!(f, "field_computed"),
            Primitive::SetField { index, .. } => write!(f, "setfield {}", index),
            Primitive::SetFieldComputed { .. } => write!(f, "setfield_computed"),
            Primitive::FloatField { index, mode } => write!(f, "floatfield{} {}", mode_suffix(*mode), index),
            Primitive::SetFloatField { index, .. } => write!(f, "setfloatfield {}", index),
            Primitive::DupRecord => write!(f, "duprecord"),
            Primitive::Ccall(desc) => write!(f, "{}", desc.name),
            Primitive::Raise(kind) => match kind {
                RaiseKind::Regular => write!(f, "raise"),
                RaiseKind::Reraise => write!(f, "reraise"),
                RaiseKind::Notrace => write!(f, "raise_notrace"),
            },
            Primitive::Sequand => write!(f, "&&"),
            Primitive::Sequor => write!(f, "||"),
            Primitive::Not => write!(f, "not"),
            Primitive::NegInt => write!(f, "~"),
            Primitive::AddInt => write!(f, "+"),
            Primitive::SubInt => write!(f, "-"),
            Primitive::MulInt => write!(f, "*"),
            Primitive::DivInt(IsSafe::Safe) => write!(f, "/"),
            Primitive::DivInt(IsSafe::Unsafe) => write!(f, "/u"),
            Primitive::ModInt(IsSafe::Safe) => write!(f, "mod"),
            Primitive::ModInt(IsSafe::Unsafe) => write!(f, "mod_unsafe"),
            Primitive::AndInt => write!(f, "and"),
            Primitive::OrInt => write!(f, "or"),
            Primitive::XorInt => write!(f, "xor"),
            Primitive::LslInt => write!(f, "lsl"),
            Primitive::LsrInt => write!(f, "lsr"),
            Primitive::AsrInt => write!(f, "asr"),
            Primitive::IntComp(cmp) => write!(f, "{}", cmp),
            Primitive::OffsetInt(n) => write!(f, "{}+", n),
            Primitive::OffsetRef(n) => write!(f, "+:={}", n),
            Primitive::IntOfFloat(w) => write!(f, "int_of_{}", w.name()),
            Primitive::FloatOfInt(w, m) => write!(f, "{}_of_int{}", w.name(), mode_suffix(*m)),
            Primitive::FloatOfFloat32(m) => write!(f, "float_of_float32{}", mode_suffix(*m)),
            Primitive::Float32OfFloat(m) => write!(f, "float32_of_float{}", mode_suffix(*m)),
            Primitive::NegFloat(w, m) => write!(f, "~.{}{}", w.name(), mode_suffix(*m)),
            Primitive::AbsFloat(w, m) => write!(f, "abs.{}{}", w.name(), mode_suffix(*m)),
            Primitive::AddFloat(w, m) => write!(f, "+.{}{}", w.name(), mode_suffix(*m)),
            Primitive::SubFloat(w, m) => write!(f, "-.{}{}", w.name(), mode_suffix(*m)),
            Primitive::MulFloat(w, m) => write!(f, "*.{}{}", w.name(), mode_suffix(*m)),
            Primitive::DivFloat(w, m) => write!(f, "/.{}{}", w.name(), mode_suffix(*m)),
            Primitive::FloatComp(w, cmp) => write!(f, "{}{}", cmp, w.name()),
            Primitive::UnboxFloat(w) => write!(f, "unbox_{}", w.name()),
            Primitive::BoxFloat(w, m) => write!(f, "box_{}{}", w.name(), mode_suffix(*m)),
            Primitive::StringLength => write!(f, "string.length"),
            Primitive::StringRef(s) => write!(f, "string.{}get", safe_suffix(*s)),
            Primitive::BytesLength => write!(f, "bytes.length"),
            Primitive::BytesRef(s) => write!(f, "bytes.{}get", safe_suffix(*s)),
            Primitive::BytesSet(s) => write!(f, "bytes.{}set", safe_suffix(*s)),
            Primitive::MakeArray { kind, mode, .. } => write!(f, "makearray{}[{:?}]", mode_suffix(*mode), kind),
            Primitive::DupArray(kind, _) => write!(f, "duparray[{:?}]", kind),
            Primitive::ArrayLength(kind) => write!(f, "array.length[{:?}]", kind),
            Primitive::ArrayRef { kind, safe, .. } => write!(f, "array.{}get[{:?}]", safe_suffix(*safe), kind),
            Primitive::ArraySet { kind, safe, .. } => write!(f, "array.{}set[{:?}]", safe_suffix(*safe), kind),
            Primitive::IsInt => write!(f, "isint"),
            Primitive::IsOut => write!(f, "isout"),
            Primitive::BintOfInt(w, m) => write!(f, "{}_of_int{}", w.name(), mode_suffix(*m)),
            Primitive::IntOfBint(w) => write!(f, "int_of_{}", w.name()),
            Primitive::CvtBint { from, to, mode } => {
                write!(f, "{}_of_{}{}", to.name(), from.name(), mode_suffix(*mode))
            }
            Primitive::NegBint(w, m) => write!(f, "{}.neg{}", w.name(), mode_suffix(*m)),
            Primitive::AddBint(w, m) => write!(f, "{}.add{}", w.name(), mode_suffix(*m)),
            Primitive::SubBint(w, m) => write!(f, "{}.sub{}", w.name(), mode_suffix(*m)),
            Primitive::MulBint(w, m) => write!(f, "{}.mul{}", w.name(), mode_suffix(*m)),
            Primitive::DivBint { width, mode, .. } => write!(f, "{}.div{}", width.name(), mode_suffix(*mode)),
            Primitive::ModBint { width, mode, .. } => write!(f, "{}.mod{}", width.name(), mode_suffix(*mode)),
            Primitive::AndBint(w, m) => write!(f, "{}.and{}", w.name(), mode_suffix(*m)),
            Primitive::OrBint(w, m) => write!(f, "{}.or{}", w.name(), mode_suffix(*m)),
            Primitive::XorBint(w, m) => write!(f, "{}.xor{}", w.name(), mode_suffix(*m)),
            Primitive::LslBint(w, m) => write!(f, "{}.lsl{}", w.name(), mode_suffix(*m)),
            Primitive::LsrBint(w, m) => write!(f, "{}.lsr{}", w.name(), mode_suffix(*m)),
            Primitive::AsrBint(w, m) => write!(f, "{}.asr{}", w.name(), mode_suffix(*m)),
            Primitive::BintComp(w, cmp) => write!(f, "{}.{}", w.name(), cmp),
            Primitive::UnboxInt(w) => write!(f, "unbox_{}", w.name()),
            Primitive::BoxInt(w, m) => write!(f, "box_{}{}", w.name(), mode_suffix(*m)),
            Primitive::BigarrayRef { safe, dims, .. } => write!(f, "Bigarray.{}get{}", safe_suffix(*safe), dims),
            Primitive::BigarraySet { safe, dims, .. } => write!(f, "Bigarray.{}set{}", safe_suffix(*safe), dims),
            Primitive::BigarrayDim(n) => write!(f, "Bigarray.dim_{}", n),
            Primitive::Load { container, size, safe, .. } => {
                write!(f, "{:?}.{}load_{:?}", container, safe_suffix(*safe), size)
            }
            Primitive::Store { container, size, safe, .. } => {
                write!(f, "{:?}.{}set_{:?}", container, safe_suffix(*safe), size)
            }
            Primitive::CtConst(c) => write!(f, "sys.constant_{:?}", c),
            Primitive::Bswap16 => write!(f, "bswap16"),
            Primitive::Bbswap(w, m) => write!(f, "bswap_{}{}", w.name(), mode_suffix(*m)),
            Primitive::IntAsPointer(m) => write!(f, "int_as_pointer{}", mode_suffix(*m)),
            Primitive::Opaque(_) => write!(f, "opaque"),
            Primitive::ObjMagic(_) => write!(f, "obj_magic"),
            Primitive::ObjDup => write!(f, "obj_dup"),
            Primitive::GetHeader(m) => write!(f, "get_header{}", mode_suffix(*m)),
            Primitive::ProbeIsEnabled(name) => write!(f, "probe_is_enabled[{}]", name),
            Primitive::AtomicLoad(_) => write!(f, "atomic_load"),
            Primitive::AtomicExchange => write!(f, "atomic_exchange"),
            Primitive::AtomicCompareAndSet => write!(f, "atomic_cas"),
            Primitive::AtomicFetchAdd => write!(f, "atomic_fetch_add"),
            Primitive::CpuRelax => write!(f, "cpu_relax"),
            Primitive::DlsGet => write!(f, "dls_get"),
            Primitive::Poll => write!(f, "poll"),
            Primitive::ReinterpretTaggedInt63AsUnboxedInt64 => write!(f, "reinterpret_tagged_int63_as_unboxed_int64"),
            Primitive::ReinterpretUnboxedInt64AsTaggedInt63 => write!(f, "reinterpret_unboxed_int64_as_tagged_int63"),
            Primitive::UnboxVector(w) => write!(f, "unbox_{}", w.name()),
            Primitive::BoxVector(w, m) => write!(f, "box_{}{}", w.name(), mode_suffix(*m)),
        }
    }
}
