//! Identifiers and static labels
//!
//! Identifiers are a name plus a stamp. Names live in a `string-interner`
//! table owned by [`Idents`], so an [`Ident`] is a small `Copy` key; two
//! identifiers are the same binder iff their stamps agree.

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// A bound variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident {
    stamp: u32,
    name: DefaultSymbol,
}

impl Ident {
    pub fn stamp(self) -> u32 {
        self.stamp
    }

    pub(crate) fn with_stamp(self, stamp: u32) -> Ident {
        Ident { stamp, ..self }
    }

    /// The `index`th binder of a sharing key. Key stamps are never issued by [`Idents`].
    pub(crate) fn key_binder(self, index: u32) -> Ident {
        self.with_stamp(KEY_STAMPS | index)
    }
}

/// Stamps with this bit set are reserved for sharing keys
const KEY_STAMPS: u32 = 1 << 31;

/// Identifier table: name interning and stamp allocation
#[derive(Debug, Default)]
pub struct Idents {
    names: DefaultStringInterner,
    next_stamp: u32,
}

impl Idents {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh identifier called `name`
    pub fn create_local(&mut self, name: &str) -> Ident {
        let name = self.names.get_or_intern(name);
        Ident {
            stamp: self.fresh_stamp(),
            name,
        }
    }

    /// A fresh identifier with the same name as `id`
    pub fn rename(&mut self, id: Ident) -> Ident {
        let stamp = self.fresh_stamp();
        id.with_stamp(stamp)
    }

    fn fresh_stamp(&mut self) -> u32 {
        self.next_stamp += 1;
        assert!(self.next_stamp < KEY_STAMPS, "identifier stamps exhausted");
        self.next_stamp
    }

    pub fn name(&self, id: Ident) -> &str {
        self.names.resolve(id.name).unwrap_or("?")
    }

    /// `name/stamp`, as printed in dumps
    pub fn unique_name(&self, id: Ident) -> String {
        format!("{}/{}", self.name(id), id.stamp)
    }
}

/// Label of a static handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StaticLabel(pub u32);

impl StaticLabel {
    /// Label raised by a guarded arm before it is patched
    pub const GUARD: StaticLabel = StaticLabel(0);
}

impl std::fmt::Display for StaticLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator of static labels
#[derive(Debug, Default)]
pub struct StaticLabels {
    last: u32,
}

impl StaticLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// A label never handed out since the last reset
    pub fn next_raise_count(&mut self) -> StaticLabel {
        self.last += 1;
        StaticLabel(self.last)
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}

/// Per-driver mutable state for building lambda terms
#[derive(Debug, Default)]
pub struct Session {
    pub idents: Idents,
    pub labels: StaticLabels,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart label numbering for a new compilation unit
    pub fn reset_for_unit(&mut self) {
        self.labels.reset();
    }
}
