//! Lambda terms
//!
//! Terms are immutable trees. Transformations build new trees and may share
//! untouched subterms by cloning.

use std::collections::BTreeMap;
use super::ident::{Ident, StaticLabel};
use super::primitive::{AllocMode, Primitive};
use crate::common::Span;
use crate::types::Layout;

// ==================== Constants ====================

/// Literal constants; float literals keep their source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i64),
    Char(char),
    String(String),
    Float(String),
    Float32(String),
    UnboxedFloat(String),
    UnboxedFloat32(String),
    Int32(i32),
    Int64(i64),
    Nativeint(i64),
    UnboxedInt32(i32),
    UnboxedInt64(i64),
    UnboxedNativeint(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StructuredConstant {
    Base(Constant),
    Block { tag: u32, fields: Vec<StructuredConstant> },
    FloatArray(Vec<String>),
    FloatBlock(Vec<String>),
    /// Immutable string literal
    ImmString(String),
}

impl StructuredConstant {
    pub fn int(n: i64) -> Self {
        StructuredConstant::Base(Constant::Int(n))
    }
}

// ==================== Attributes ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LetKind {
    Strict,
    /// Pure definition that may be substituted at its uses
    Alias,
    /// Definition that may be dropped when unused
    StrictOpt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TailcallAttribute {
    Expect(bool),
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InlineAttribute {
    Always,
    Available,
    Never,
    Unroll(u32),
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpecialiseAttribute {
    Always,
    Never,
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocalAttribute {
    Always,
    Never,
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PollAttribute {
    Error,
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FunctionAttribute {
    pub inline: InlineAttribute,
    pub specialise: SpecialiseAttribute,
    pub local: LocalAttribute,
    pub poll: PollAttribute,
    pub is_a_functor: bool,
    pub stub: bool,
    pub may_fuse_arity: bool,
}

impl FunctionAttribute {
    pub fn stub() -> Self {
        Self {
            stub: true,
            may_fuse_arity: true,
            ..Self::default()
        }
    }
}

/// Region bookkeeping at an application site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegionClose {
    #[default]
    Normal,
    /// The call is not in tail position with respect to the region
    Nontail,
    /// The caller's region closes when the call is made
    CloseAtApply,
}

/// Relationship between a static handler's regions and its raise sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PopRegion {
    /// The handler runs in the parent of the raise site's innermost region
    Popped,
    #[default]
    Same,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `nlocal` trailing parameters may be applied to a local closure
    Curried { nlocal: usize },
    Tupled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethKind {
    SelfMethod,
    Public,
    Cached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Upto,
    Downto,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Probe {
    pub name: String,
    pub enabled_at_init: bool,
}

// ==================== Debug events ====================

/// Typing information recorded for a variable visible at an event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueDesc {
    pub ty: String,
}

/// Variables visible at a debug event
pub type EventEnv = BTreeMap<Ident, ValueDesc>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Before,
    After(Layout),
    Function,
    Pseudo,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventKind,
    pub span: Span,
    pub env: EventEnv,
}

// ==================== Terms ====================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Ident,
    pub layout: Layout,
    /// Unbox the argument at the calling convention level
    pub unbox: bool,
    pub mode: AllocMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Apply {
    pub func: Box<Lambda>,
    pub args: Vec<Lambda>,
    pub result_layout: Layout,
    pub region_close: RegionClose,
    pub mode: AllocMode,
    pub tailcall: TailcallAttribute,
    pub inlined: InlineAttribute,
    pub specialised: SpecialiseAttribute,
    pub probe: Option<Probe>,
    pub span: Span,
}

/// Function literal; build with [`super::lfunction`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Function {
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub return_layout: Layout,
    pub body: Box<Lambda>,
    pub attr: FunctionAttribute,
    pub span: Span,
    /// Allocation mode of the closure
    pub mode: AllocMode,
    /// Allocation mode of the result
    pub ret_mode: AllocMode,
    /// The body opens its own region
    pub region: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecBinding {
    pub id: Ident,
    pub def: Function,
}

/// Integer switch on immediates and block tags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Switch {
    pub num_consts: u32,
    pub consts: Vec<(u32, Lambda)>,
    pub num_blocks: u32,
    pub blocks: Vec<(u32, Lambda)>,
    pub failaction: Option<Box<Lambda>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lambda {
    Var(Ident),
    MutVar(Ident),
    Const(StructuredConstant),
    Apply(Apply),
    Function(Function),
    Let {
        kind: LetKind,
        layout: Layout,
        id: Ident,
        def: Box<Lambda>,
        body: Box<Lambda>,
    },
    MutLet {
        layout: Layout,
        id: Ident,
        def: Box<Lambda>,
        body: Box<Lambda>,
    },
    LetRec {
        bindings: Vec<RecBinding>,
        body: Box<Lambda>,
    },
    Prim {
        prim: Primitive,
        args: Vec<Lambda>,
        span: Span,
    },
    Switch {
        scrutinee: Box<Lambda>,
        switch: Switch,
        span: Span,
        layout: Layout,
    },
    StringSwitch {
        scrutinee: Box<Lambda>,
        cases: Vec<(String, Lambda)>,
        default: Option<Box<Lambda>>,
        span: Span,
        layout: Layout,
    },
    StaticRaise {
        label: StaticLabel,
        args: Vec<Lambda>,
    },
    StaticCatch {
        body: Box<Lambda>,
        label: StaticLabel,
        params: Vec<(Ident, Layout)>,
        handler: Box<Lambda>,
        pop_region: PopRegion,
        layout: Layout,
    },
    TryWith {
        body: Box<Lambda>,
        exn: Ident,
        handler: Box<Lambda>,
        layout: Layout,
    },
    IfThenElse {
        cond: Box<Lambda>,
        then_branch: Box<Lambda>,
        else_branch: Box<Lambda>,
        layout: Layout,
    },
    Sequence(Box<Lambda>, Box<Lambda>),
    While {
        cond: Box<Lambda>,
        body: Box<Lambda>,
    },
    For {
        var: Ident,
        from: Box<Lambda>,
        to: Box<Lambda>,
        direction: Direction,
        body: Box<Lambda>,
    },
    Assign {
        id: Ident,
        value: Box<Lambda>,
    },
    Send {
        kind: MethKind,
        method: Box<Lambda>,
        obj: Box<Lambda>,
        args: Vec<Lambda>,
        region_close: RegionClose,
        mode: AllocMode,
        span: Span,
        layout: Layout,
    },
    Event {
        body: Box<Lambda>,
        event: Event,
    },
    /// `body` evaluated only for its value when `id` is used
    IfUsed {
        id: Ident,
        body: Box<Lambda>,
    },
    /// Opens an allocation region around `body`
    Region {
        body: Box<Lambda>,
        layout: Layout,
    },
    /// Leaves the innermost region early; `body` runs in the parent region
    Exclave(Box<Lambda>),
}

impl Lambda {
    pub fn prim(prim: Primitive, args: Vec<Lambda>, span: Span) -> Self {
        Lambda::Prim { prim, args, span }
    }

    pub fn if_then_else(cond: Lambda, then_branch: Lambda, else_branch: Lambda, layout: Layout) -> Self {
        Lambda::IfThenElse {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            layout,
        }
    }

    pub fn seq(first: Lambda, second: Lambda) -> Self {
        Lambda::Sequence(Box::new(first), Box::new(second))
    }

    pub fn static_raise(label: StaticLabel, args: Vec<Lambda>) -> Self {
        Lambda::StaticRaise { label, args }
    }

    pub fn static_catch(
        body: Lambda,
        label: StaticLabel,
        params: Vec<(Ident, Layout)>,
        handler: Lambda,
        layout: Layout,
    ) -> Self {
        Lambda::StaticCatch {
            body: Box::new(body),
            label,
            params,
            handler: Box::new(handler),
            pop_region: PopRegion::Same,
            layout,
        }
    }

    pub fn region(body: Lambda, layout: Layout) -> Self {
        Lambda::Region {
            body: Box::new(body),
            layout,
        }
    }
}
