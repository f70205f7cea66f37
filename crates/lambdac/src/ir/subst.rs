//! Substitution and renaming

use std::collections::HashMap;
use super::ident::{Ident, Idents};
use super::lambda::{EventEnv, Function, Lambda, Param, RecBinding, Switch, ValueDesc};

/// Callback refreshing a debug event's environment for a substituted variable
pub type UpdateEnv<'a> = dyn FnMut(Ident, &ValueDesc, &mut EventEnv) + 'a;

struct Subst<'s, F: ?Sized> {
    s: &'s HashMap<Ident, Lambda>,
    update_env: &'s mut F,
    /// Present when bound variables are freshened
    idents: Option<&'s mut Idents>,
}

/// Bound identifiers in scope and what they were renamed to
type Bound = HashMap<Ident, Ident>;

impl<F> Subst<'_, F>
where
    F: FnMut(Ident, &ValueDesc, &mut EventEnv) + ?Sized,
{
    fn bind(&mut self, id: Ident, l: &Bound) -> (Ident, Bound) {
        let fresh = match self.idents.as_deref_mut() {
            Some(idents) => idents.rename(id),
            None => id,
        };
        let mut l = l.clone();
        l.insert(id, fresh);
        (fresh, l)
    }

    fn bind_many(&mut self, ids: impl IntoIterator<Item = Ident>, l: &Bound) -> (Vec<Ident>, Bound) {
        let mut l = l.clone();
        let mut fresh = Vec::new();
        for id in ids {
            let (id, next) = self.bind(id, &l);
            l = next;
            fresh.push(id);
        }
        (fresh, l)
    }

    fn list(&mut self, l: &Bound, terms: &[Lambda]) -> Vec<Lambda> {
        terms.iter().map(|t| self.term(l, t)).collect()
    }

    fn boxed(&mut self, l: &Bound, term: &Lambda) -> Box<Lambda> {
        Box::new(self.term(l, term))
    }

    fn function(&mut self, l: &Bound, func: &Function) -> Function {
        let (names, l) = self.bind_many(func.params.iter().map(|p| p.name), l);
        let params = func
            .params
            .iter()
            .zip(names)
            .map(|(p, name)| Param { name, ..p.clone() })
            .collect();
        Function {
            params,
            body: self.boxed(&l, &func.body),
            ..func.clone()
        }
    }

    fn event_env(&mut self, l: &Bound, old_env: &EventEnv) -> EventEnv {
        let mut new_env = old_env.clone();
        for (id, id2) in l {
            if id != id2 {
                if let Some(vd) = old_env.get(id) {
                    new_env.insert(*id2, vd.clone());
                }
            }
        }
        for id in self.s.keys() {
            if l.contains_key(id) {
                continue;
            }
            if let Some(vd) = old_env.get(id) {
                (self.update_env)(*id, vd, &mut new_env);
            }
        }
        new_env
    }

    fn term(&mut self, l: &Bound, lam: &Lambda) -> Lambda {
        match lam {
            Lambda::Var(id) => match l.get(id) {
                Some(bound) => Lambda::Var(*bound),
                None => self.s.get(id).cloned().unwrap_or_else(|| lam.clone()),
            },
            Lambda::MutVar(id) => Lambda::MutVar(l.get(id).copied().unwrap_or(*id)),
            Lambda::Const(_) => lam.clone(),
            Lambda::Apply(apply) => {
                let mut apply = apply.clone();
                apply.func = self.boxed(l, &apply.func);
                apply.args = self.list(l, &apply.args);
                Lambda::Apply(apply)
            }
            Lambda::Function(func) => Lambda::Function(self.function(l, func)),
            Lambda::Let { kind, layout, id, def, body } => {
                let (id, l2) = self.bind(*id, l);
                Lambda::Let {
                    kind: *kind,
                    layout: layout.clone(),
                    id,
                    def: self.boxed(l, def),
                    body: self.boxed(&l2, body),
                }
            }
            Lambda::MutLet { layout, id, def, body } => {
                let (id, l2) = self.bind(*id, l);
                Lambda::MutLet {
                    layout: layout.clone(),
                    id,
                    def: self.boxed(l, def),
                    body: self.boxed(&l2, body),
                }
            }
            Lambda::LetRec { bindings, body } => {
                let (ids, l2) = self.bind_many(bindings.iter().map(|b| b.id), l);
                let bindings = bindings
                    .iter()
                    .zip(ids)
                    .map(|(b, id)| RecBinding { id, def: self.function(&l2, &b.def) })
                    .collect();
                Lambda::LetRec { bindings, body: self.boxed(&l2, body) }
            }
            Lambda::Prim { prim, args, span } => Lambda::Prim {
                prim: prim.clone(),
                args: self.list(l, args),
                span: *span,
            },
            Lambda::Switch { scrutinee, switch, span, layout } => Lambda::Switch {
                scrutinee: self.boxed(l, scrutinee),
                switch: Switch {
                    num_consts: switch.num_consts,
                    consts: switch.consts.iter().map(|(k, c)| (*k, self.term(l, c))).collect(),
                    num_blocks: switch.num_blocks,
                    blocks: switch.blocks.iter().map(|(k, c)| (*k, self.term(l, c))).collect(),
                    failaction: switch.failaction.as_ref().map(|fail| self.boxed(l, fail)),
                },
                span: *span,
                layout: layout.clone(),
            },
            Lambda::StringSwitch { scrutinee, cases, default, span, layout } => Lambda::StringSwitch {
                scrutinee: self.boxed(l, scrutinee),
                cases: cases.iter().map(|(s, c)| (s.clone(), self.term(l, c))).collect(),
                default: default.as_ref().map(|d| self.boxed(l, d)),
                span: *span,
                layout: layout.clone(),
            },
            Lambda::StaticRaise { label, args } => Lambda::StaticRaise {
                label: *label,
                args: self.list(l, args),
            },
            Lambda::StaticCatch { body, label, params, handler, pop_region, layout } => {
                let (ids, l2) = self.bind_many(params.iter().map(|(id, _)| *id), l);
                let params = ids
                    .into_iter()
                    .zip(params.iter().map(|(_, layout)| layout.clone()))
                    .collect();
                Lambda::StaticCatch {
                    body: self.boxed(l, body),
                    label: *label,
                    params,
                    handler: self.boxed(&l2, handler),
                    pop_region: *pop_region,
                    layout: layout.clone(),
                }
            }
            Lambda::TryWith { body, exn, handler, layout } => {
                let (exn, l2) = self.bind(*exn, l);
                Lambda::TryWith {
                    body: self.boxed(l, body),
                    exn,
                    handler: self.boxed(&l2, handler),
                    layout: layout.clone(),
                }
            }
            Lambda::IfThenElse { cond, then_branch, else_branch, layout } => Lambda::IfThenElse {
                cond: self.boxed(l, cond),
                then_branch: self.boxed(l, then_branch),
                else_branch: self.boxed(l, else_branch),
                layout: layout.clone(),
            },
            Lambda::Sequence(first, second) => Lambda::Sequence(self.boxed(l, first), self.boxed(l, second)),
            Lambda::While { cond, body } => Lambda::While {
                cond: self.boxed(l, cond),
                body: self.boxed(l, body),
            },
            Lambda::For { var, from, to, direction, body } => {
                let (var, l2) = self.bind(*var, l);
                Lambda::For {
                    var,
                    from: self.boxed(l, from),
                    to: self.boxed(l, to),
                    direction: *direction,
                    body: self.boxed(&l2, body),
                }
            }
            Lambda::Assign { id, value } => {
                assert!(!self.s.contains_key(id), "subst: assigned variable is substituted");
                Lambda::Assign {
                    id: l.get(id).copied().unwrap_or(*id),
                    value: self.boxed(l, value),
                }
            }
            Lambda::Send { kind, method, obj, args, region_close, mode, span, layout } => Lambda::Send {
                kind: *kind,
                method: self.boxed(l, method),
                obj: self.boxed(l, obj),
                args: self.list(l, args),
                region_close: *region_close,
                mode: *mode,
                span: *span,
                layout: layout.clone(),
            },
            Lambda::Event { body, event } => {
                let mut event = event.clone();
                event.env = self.event_env(l, &event.env);
                Lambda::Event { body: self.boxed(l, body), event }
            }
            Lambda::IfUsed { id, body } => Lambda::IfUsed {
                id: l.get(id).copied().unwrap_or(*id),
                body: self.boxed(l, body),
            },
            Lambda::Region { body, layout } => Lambda::Region {
                body: self.boxed(l, body),
                layout: layout.clone(),
            },
            Lambda::Exclave(body) => Lambda::Exclave(self.boxed(l, body)),
        }
    }
}

/// Replace the free occurrences of the keys of `s` in `lam`.
///
/// No variable bound in `lam` may occur free in a replacement, unless
/// `freshen` is given: every binder is then renamed to a fresh identifier.
/// `update_env` is called for each substituted variable visible at a debug
/// event, with the event's refreshed environment.
pub fn subst(
    update_env: &mut UpdateEnv<'_>,
    freshen: Option<&mut Idents>,
    s: &HashMap<Ident, Lambda>,
    lam: &Lambda,
) -> Lambda {
    let mut st = Subst { s, update_env, idents: freshen };
    st.term(&Bound::new(), lam)
}

/// Rename free variables according to `idmap`
pub fn rename(idmap: &HashMap<Ident, Ident>, lam: &Lambda) -> Lambda {
    let s: HashMap<Ident, Lambda> = idmap.iter().map(|(old, new)| (*old, Lambda::Var(*new))).collect();
    let mut update_env = |old: Ident, vd: &ValueDesc, env: &mut EventEnv| {
        if let Some(new) = idmap.get(&old) {
            env.insert(*new, vd.clone());
        }
    };
    subst(&mut update_env, None, &s, lam)
}

/// Copy of `lam` with every bound variable freshened
pub fn duplicate(idents: &mut Idents, lam: &Lambda) -> Lambda {
    subst(&mut |_, _, _| {}, Some(idents), &HashMap::new(), lam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::common::Span;
    use crate::ir::builder::const_int;
    use crate::ir::lambda::{Event, EventKind, LetKind};
    use crate::ir::traverse::free_variables;
    use crate::types::Layout;

    fn let_(id: Ident, def: Lambda, body: Lambda) -> Lambda {
        Lambda::Let {
            kind: LetKind::Strict,
            layout: Layout::int(),
            id,
            def: Box::new(def),
            body: Box::new(body),
        }
    }

    fn no_env() -> impl FnMut(Ident, &ValueDesc, &mut EventEnv) {
        |_, _, _| {}
    }

    #[test]
    fn test_replaces_free_occurrences() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let y = idents.create_local("y");
        let term = Lambda::seq(Lambda::Var(x), Lambda::Var(y));
        let s = HashMap::from([(x, const_int(7))]);
        assert_eq!(
            subst(&mut no_env(), None, &s, &term),
            Lambda::seq(const_int(7), Lambda::Var(y))
        );
    }

    #[test]
    fn test_shadowing_binder_blocks_substitution() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let term = let_(x, Lambda::Var(x), Lambda::Var(x));
        let s = HashMap::from([(x, const_int(1))]);
        assert_eq!(subst(&mut no_env(), None, &s, &term), let_(x, const_int(1), Lambda::Var(x)));
    }

    #[test]
    fn test_freshen_renames_binders() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let term = let_(x, const_int(1), Lambda::Var(x));
        let copy = duplicate(&mut idents, &term);
        match &copy {
            Lambda::Let { id, body, .. } => {
                assert_ne!(*id, x);
                assert_eq!(**body, Lambda::Var(*id));
                assert_eq!(idents.name(*id), "x");
            }
            other => panic!("expected let, got {:?}", other),
        }
        assert!(free_variables(&copy).is_empty());
    }

    #[test]
    fn test_rename_updates_event_env() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let x2 = idents.create_local("x");
        let env = EventEnv::from([(x, ValueDesc { ty: "int".to_string() })]);
        let term = Lambda::Event {
            body: Box::new(Lambda::Var(x)),
            event: Event {
                kind: EventKind::Before,
                span: Span::new(3, 4),
                env,
            },
        };
        let renamed = rename(&HashMap::from([(x, x2)]), &term);
        match renamed {
            Lambda::Event { body, event } => {
                assert_eq!(*body, Lambda::Var(x2));
                assert!(event.env.contains_key(&x2));
                assert!(event.env.contains_key(&x));
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_mutable_variables_follow_binders() {
        let mut idents = Idents::new();
        let r = idents.create_local("r");
        let term = Lambda::MutLet {
            layout: Layout::int(),
            id: r,
            def: Box::new(const_int(0)),
            body: Box::new(Lambda::seq(
                Lambda::Assign { id: r, value: Box::new(const_int(1)) },
                Lambda::MutVar(r),
            )),
        };
        let copy = duplicate(&mut idents, &term);
        let Lambda::MutLet { id, body, .. } = copy else {
            panic!("expected mutlet");
        };
        assert_eq!(
            *body,
            Lambda::seq(Lambda::Assign { id, value: Box::new(const_int(1)) }, Lambda::MutVar(id))
        );
    }
}
