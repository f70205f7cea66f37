//! Guarded arms and sharing keys

use std::collections::HashMap;
use super::ident::{Ident, StaticLabel};
use super::lambda::{Constant, Lambda, LetKind, StructuredConstant, Switch};
use crate::common::Span;

/// Placeholder failure raised by a guarded arm
pub fn staticfail() -> Lambda {
    Lambda::static_raise(StaticLabel::GUARD, Vec::new())
}

fn is_staticfail(lam: &Lambda) -> bool {
    matches!(lam, Lambda::StaticRaise { label, args } if *label == StaticLabel::GUARD && args.is_empty())
}

/// Whether `lam` ends in a conditional whose else branch is still the placeholder failure
pub fn is_guarded(lam: &Lambda) -> bool {
    match lam {
        Lambda::IfThenElse { else_branch, .. } if is_staticfail(else_branch) => true,
        Lambda::Let { body, .. } => is_guarded(body),
        Lambda::Event { body, .. } => is_guarded(body),
        _ => false,
    }
}

/// Replace the placeholder failure of a guarded arm by `patch`.
///
/// Returns the term unchanged as `Err` when it is not guarded.
pub fn patch_guarded(patch: Lambda, lam: Lambda) -> Result<Lambda, Lambda> {
    match lam {
        Lambda::IfThenElse { cond, then_branch, else_branch, layout } if is_staticfail(&else_branch) => {
            Ok(Lambda::IfThenElse {
                cond,
                then_branch,
                else_branch: Box::new(patch),
                layout,
            })
        }
        Lambda::Let { kind, layout, id, def, body } => match patch_guarded(patch, *body) {
            Ok(body) => Ok(Lambda::Let { kind, layout, id, def, body: Box::new(body) }),
            Err(body) => Err(Lambda::Let { kind, layout, id, def, body: Box::new(body) }),
        },
        Lambda::Event { body, event } => match patch_guarded(patch, *body) {
            Ok(body) => Ok(Lambda::Event { body: Box::new(body), event }),
            Err(body) => Err(Lambda::Event { body: Box::new(body), event }),
        },
        other => Err(other),
    }
}

/// Terms larger than this are never shared
const MAX_KEY_SIZE: usize = 32;

struct KeyBuilder {
    size: usize,
    next_binder: u32,
}

impl KeyBuilder {
    fn key_ident(&mut self, id: Ident) -> Ident {
        self.next_binder += 1;
        id.key_binder(self.next_binder)
    }

    fn list(&mut self, env: &HashMap<Ident, Lambda>, terms: &[Lambda]) -> Option<Vec<Lambda>> {
        terms.iter().map(|t| self.term(env, t)).collect()
    }

    fn boxed(&mut self, env: &HashMap<Ident, Lambda>, term: &Lambda) -> Option<Box<Lambda>> {
        self.term(env, term).map(Box::new)
    }

    fn term(&mut self, env: &HashMap<Ident, Lambda>, lam: &Lambda) -> Option<Lambda> {
        self.size += 1;
        if self.size > MAX_KEY_SIZE {
            return None;
        }
        let key = match lam {
            Lambda::Var(id) | Lambda::MutVar(id) => env.get(id).cloned().unwrap_or_else(|| lam.clone()),
            // Mutable constants are not shared
            Lambda::Const(StructuredConstant::Base(Constant::String(_))) => return None,
            Lambda::Const(_) => lam.clone(),
            Lambda::Apply(apply) => {
                let mut apply = apply.clone();
                apply.func = self.boxed(env, &apply.func)?;
                apply.args = self.list(env, &apply.args)?;
                apply.span = Span::unknown();
                Lambda::Apply(apply)
            }
            Lambda::Let { kind: LetKind::Alias, id, def, body, .. } => {
                let def = self.term(env, def)?;
                let mut env = env.clone();
                env.insert(*id, def);
                return self.term(&env, body);
            }
            Lambda::Let { id, def, body, .. } if matches!(**body, Lambda::Var(v) if v == *id) => {
                return self.term(env, def);
            }
            Lambda::Let { kind, layout, id, def, body } => {
                let def = self.boxed(env, def)?;
                let key_id = self.key_ident(*id);
                let mut env = env.clone();
                env.insert(*id, Lambda::Var(key_id));
                Lambda::Let {
                    kind: *kind,
                    layout: layout.clone(),
                    id: key_id,
                    def,
                    body: self.boxed(&env, body)?,
                }
            }
            Lambda::Prim { prim, args, .. } => Lambda::Prim {
                prim: prim.clone(),
                args: self.list(env, args)?,
                span: Span::unknown(),
            },
            Lambda::Switch { scrutinee, switch, layout, .. } => {
                let scrutinee = self.boxed(env, scrutinee)?;
                let mut consts = Vec::with_capacity(switch.consts.len());
                for (k, case) in &switch.consts {
                    consts.push((*k, self.term(env, case)?));
                }
                let mut blocks = Vec::with_capacity(switch.blocks.len());
                for (k, case) in &switch.blocks {
                    blocks.push((*k, self.term(env, case)?));
                }
                let failaction = match &switch.failaction {
                    Some(fail) => Some(self.boxed(env, fail)?),
                    None => None,
                };
                Lambda::Switch {
                    scrutinee,
                    switch: Switch {
                        num_consts: switch.num_consts,
                        consts,
                        num_blocks: switch.num_blocks,
                        blocks,
                        failaction,
                    },
                    span: Span::unknown(),
                    layout: layout.clone(),
                }
            }
            Lambda::StringSwitch { scrutinee, cases, default, layout, .. } => {
                let scrutinee = self.boxed(env, scrutinee)?;
                let mut keyed = Vec::with_capacity(cases.len());
                for (s, case) in cases {
                    keyed.push((s.clone(), self.term(env, case)?));
                }
                let default = match default {
                    Some(d) => Some(self.boxed(env, d)?),
                    None => None,
                };
                Lambda::StringSwitch {
                    scrutinee,
                    cases: keyed,
                    default,
                    span: Span::unknown(),
                    layout: layout.clone(),
                }
            }
            Lambda::StaticRaise { label, args } => Lambda::StaticRaise {
                label: *label,
                args: self.list(env, args)?,
            },
            Lambda::StaticCatch { body, label, params, handler, pop_region, layout } => Lambda::StaticCatch {
                body: self.boxed(env, body)?,
                label: *label,
                params: params.clone(),
                handler: self.boxed(env, handler)?,
                pop_region: *pop_region,
                layout: layout.clone(),
            },
            Lambda::TryWith { body, exn, handler, layout } => Lambda::TryWith {
                body: self.boxed(env, body)?,
                exn: *exn,
                handler: self.boxed(env, handler)?,
                layout: layout.clone(),
            },
            Lambda::IfThenElse { cond, then_branch, else_branch, layout } => Lambda::IfThenElse {
                cond: self.boxed(env, cond)?,
                then_branch: self.boxed(env, then_branch)?,
                else_branch: self.boxed(env, else_branch)?,
                layout: layout.clone(),
            },
            Lambda::Sequence(first, second) => Lambda::Sequence(self.boxed(env, first)?, self.boxed(env, second)?),
            Lambda::Assign { id, value } => Lambda::Assign {
                id: *id,
                value: self.boxed(env, value)?,
            },
            Lambda::Send { kind, method, obj, args, region_close, mode, layout, .. } => Lambda::Send {
                kind: *kind,
                method: self.boxed(env, method)?,
                obj: self.boxed(env, obj)?,
                args: self.list(env, args)?,
                region_close: *region_close,
                mode: *mode,
                span: Span::unknown(),
                layout: layout.clone(),
            },
            Lambda::IfUsed { id, body } => Lambda::IfUsed {
                id: *id,
                body: self.boxed(env, body)?,
            },
            Lambda::Region { body, layout } => Lambda::Region {
                body: self.boxed(env, body)?,
                layout: layout.clone(),
            },
            Lambda::Exclave(body) => Lambda::Exclave(self.boxed(env, body)?),
            Lambda::LetRec { .. }
            | Lambda::Function(_)
            | Lambda::For { .. }
            | Lambda::While { .. }
            | Lambda::Event { .. }
            | Lambda::MutLet { .. } => return None,
        };
        Some(key)
    }
}

/// Normalised form of `lam` for detecting shareable duplicates.
///
/// Two terms with equal keys compute the same value. Returns `None` for
/// large terms and for terms containing functions, loops, mutable lets,
/// debug events or mutable string constants.
pub fn make_key(lam: &Lambda) -> Option<Lambda> {
    let mut builder = KeyBuilder { size: 0, next_binder: 0 };
    builder.term(&HashMap::new(), lam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::ir::builder::const_int;
    use crate::ir::ident::Idents;
    use crate::ir::lambda::{Event, EventKind};
    use crate::ir::primitive::Primitive;
    use crate::types::Layout;

    fn guarded(cond: Lambda, body: Lambda) -> Lambda {
        Lambda::if_then_else(cond, body, staticfail(), Layout::int())
    }

    #[test]
    fn test_is_guarded() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        assert!(is_guarded(&guarded(const_int(1), const_int(2))));
        let under_let = Lambda::Let {
            kind: LetKind::Strict,
            layout: Layout::int(),
            id: x,
            def: Box::new(const_int(0)),
            body: Box::new(guarded(Lambda::Var(x), const_int(2))),
        };
        assert!(is_guarded(&under_let));
        assert!(!is_guarded(&Lambda::if_then_else(const_int(1), const_int(2), const_int(3), Layout::int())));
    }

    #[test]
    fn test_patch_guarded_replaces_failure() {
        let event = Event {
            kind: EventKind::Before,
            span: Span::new(1, 2),
            env: Default::default(),
        };
        let term = Lambda::Event {
            body: Box::new(guarded(const_int(1), const_int(2))),
            event: event.clone(),
        };
        let patched = patch_guarded(const_int(9), term).unwrap();
        assert_eq!(
            patched,
            Lambda::Event {
                body: Box::new(Lambda::if_then_else(const_int(1), const_int(2), const_int(9), Layout::int())),
                event,
            }
        );
        assert!(!is_guarded(&patched));
    }

    #[test]
    fn test_patch_unguarded_is_error() {
        let term = Lambda::seq(const_int(1), staticfail());
        assert_eq!(patch_guarded(const_int(0), term.clone()), Err(term));
    }

    #[test]
    fn test_make_key_normalises_names_and_spans() {
        let mut idents = Idents::new();
        let a = idents.create_local("t");
        let b = idents.create_local("t");
        let term = |id: Ident, span: Span| Lambda::Let {
            kind: LetKind::Strict,
            layout: Layout::int(),
            id,
            def: Box::new(Lambda::prim(Primitive::AddInt, vec![const_int(1), const_int(2)], span)),
            body: Box::new(Lambda::prim(Primitive::MulInt, vec![Lambda::Var(id), Lambda::Var(id)], span)),
        };
        assert_eq!(make_key(&term(a, Span::new(1, 5))), make_key(&term(b, Span::new(9, 12))));
        assert!(make_key(&term(a, Span::unknown())).is_some());
    }

    #[test]
    fn test_make_key_binders_differ_from_free_variables() {
        let mut idents = Idents::new();
        let free = idents.create_local("t");
        let bound = idents.create_local("t");
        let term = |used: Ident| Lambda::Let {
            kind: LetKind::Strict,
            layout: Layout::int(),
            id: bound,
            def: Box::new(Lambda::prim(Primitive::AddInt, vec![const_int(1), const_int(2)], Span::unknown())),
            body: Box::new(Lambda::prim(Primitive::AddInt, vec![Lambda::Var(used), const_int(0)], Span::unknown())),
        };
        assert_ne!(make_key(&term(bound)), make_key(&term(free)));
    }

    #[test]
    fn test_make_key_substitutes_aliases() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let alias = Lambda::Let {
            kind: LetKind::Alias,
            layout: Layout::int(),
            id: x,
            def: Box::new(const_int(4)),
            body: Box::new(Lambda::Var(x)),
        };
        assert_eq!(make_key(&alias), Some(const_int(4)));
    }

    #[test]
    fn test_make_key_rejects_unshareable_terms() {
        let string = Lambda::Const(StructuredConstant::Base(Constant::String("s".into())));
        assert_eq!(make_key(&string), None);
        let looped = Lambda::While {
            cond: Box::new(const_int(0)),
            body: Box::new(const_int(0)),
        };
        assert_eq!(make_key(&looped), None);
        let big = (0..40).fold(const_int(0), |acc, n| Lambda::seq(const_int(n), acc));
        assert_eq!(make_key(&big), None);
    }
}
