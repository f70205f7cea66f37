//! Structural traversals of lambda terms
//!
//! The shallow traversals visit the immediate subterms of a node and say
//! whether each one is in tail position. A tail subterm shares the parent's
//! region obligations; function bodies and region bodies do not.

use std::collections::BTreeSet;
use super::ident::Ident;
use super::lambda::{Function, Lambda, RecBinding, Switch};
use super::primitive::Primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Tail,
    NonTail,
}

/// Visit the immediate subterms of `lam`
pub fn shallow_iter_positions(lam: &Lambda, f: &mut impl FnMut(Position, &Lambda)) {
    use Position::{NonTail, Tail};
    match lam {
        Lambda::Var(_) | Lambda::MutVar(_) | Lambda::Const(_) => {}
        Lambda::Apply(apply) => {
            f(NonTail, &apply.func);
            apply.args.iter().for_each(|arg| f(NonTail, arg));
        }
        Lambda::Function(func) => f(NonTail, &func.body),
        Lambda::Let { def, body, .. } | Lambda::MutLet { def, body, .. } => {
            f(NonTail, def);
            f(Tail, body);
        }
        Lambda::LetRec { bindings, body } => {
            f(Tail, body);
            bindings.iter().for_each(|b| f(NonTail, &b.def.body));
        }
        Lambda::Prim { prim: Primitive::Sequand | Primitive::Sequor, args, .. } if args.len() == 2 => {
            f(NonTail, &args[0]);
            f(Tail, &args[1]);
        }
        Lambda::Prim { args, .. } => args.iter().for_each(|arg| f(NonTail, arg)),
        Lambda::Switch { scrutinee, switch, .. } => {
            f(NonTail, scrutinee);
            switch.consts.iter().for_each(|(_, case)| f(Tail, case));
            switch.blocks.iter().for_each(|(_, case)| f(Tail, case));
            if let Some(fail) = &switch.failaction {
                f(Tail, fail);
            }
        }
        Lambda::StringSwitch { scrutinee, cases, default, .. } => {
            f(NonTail, scrutinee);
            cases.iter().for_each(|(_, case)| f(Tail, case));
            if let Some(default) = default {
                f(Tail, default);
            }
        }
        Lambda::StaticRaise { args, .. } => args.iter().for_each(|arg| f(NonTail, arg)),
        Lambda::StaticCatch { body, handler, .. } => {
            f(Tail, body);
            f(Tail, handler);
        }
        Lambda::TryWith { body, handler, .. } => {
            f(NonTail, body);
            f(Tail, handler);
        }
        Lambda::IfThenElse { cond, then_branch, else_branch, .. } => {
            f(NonTail, cond);
            f(Tail, then_branch);
            f(Tail, else_branch);
        }
        Lambda::Sequence(first, second) => {
            f(NonTail, first);
            f(Tail, second);
        }
        Lambda::While { cond, body } => {
            f(NonTail, cond);
            f(NonTail, body);
        }
        Lambda::For { from, to, body, .. } => {
            f(NonTail, from);
            f(NonTail, to);
            f(NonTail, body);
        }
        Lambda::Assign { value, .. } => f(NonTail, value),
        Lambda::Send { method, obj, args, .. } => {
            f(NonTail, method);
            f(NonTail, obj);
            args.iter().for_each(|arg| f(NonTail, arg));
        }
        Lambda::Event { body, .. } | Lambda::IfUsed { body, .. } | Lambda::Exclave(body) => f(Tail, body),
        Lambda::Region { body, .. } => f(NonTail, body),
    }
}

/// Visit the immediate subterms of `lam` with one visitor per position
pub fn shallow_iter(lam: &Lambda, mut tail: impl FnMut(&Lambda), mut non_tail: impl FnMut(&Lambda)) {
    shallow_iter_positions(lam, &mut |pos, sub| match pos {
        Position::Tail => tail(sub),
        Position::NonTail => non_tail(sub),
    })
}

fn map_box(sub: Box<Lambda>, pos: Position, f: &mut impl FnMut(Position, Lambda) -> Lambda) -> Box<Lambda> {
    Box::new(f(pos, *sub))
}

fn map_vec(subs: Vec<Lambda>, f: &mut impl FnMut(Position, Lambda) -> Lambda) -> Vec<Lambda> {
    subs.into_iter().map(|sub| f(Position::NonTail, sub)).collect()
}

fn map_function(func: Function, f: &mut impl FnMut(Position, Lambda) -> Lambda) -> Function {
    Function {
        body: map_box(func.body, Position::NonTail, f),
        ..func
    }
}

/// Rebuild `lam` with every immediate subterm replaced by `f`'s result
pub fn shallow_map_positions(lam: Lambda, f: &mut impl FnMut(Position, Lambda) -> Lambda) -> Lambda {
    use Position::{NonTail, Tail};
    match lam {
        Lambda::Var(_) | Lambda::MutVar(_) | Lambda::Const(_) => lam,
        Lambda::Apply(mut apply) => {
            apply.func = map_box(apply.func, NonTail, f);
            apply.args = map_vec(apply.args, f);
            Lambda::Apply(apply)
        }
        Lambda::Function(func) => Lambda::Function(map_function(func, f)),
        Lambda::Let { kind, layout, id, def, body } => {
            let def = map_box(def, NonTail, f);
            Lambda::Let { kind, layout, id, def, body: map_box(body, Tail, f) }
        }
        Lambda::MutLet { layout, id, def, body } => {
            let def = map_box(def, NonTail, f);
            Lambda::MutLet { layout, id, def, body: map_box(body, Tail, f) }
        }
        Lambda::LetRec { bindings, body } => {
            let bindings = bindings
                .into_iter()
                .map(|b| RecBinding { id: b.id, def: map_function(b.def, f) })
                .collect();
            Lambda::LetRec { bindings, body: map_box(body, Tail, f) }
        }
        Lambda::Prim { prim: prim @ (Primitive::Sequand | Primitive::Sequor), args, span } if args.len() == 2 => {
            let mut args = args.into_iter();
            let mut mapped = Vec::with_capacity(2);
            if let (Some(first), Some(second)) = (args.next(), args.next()) {
                mapped.push(f(NonTail, first));
                mapped.push(f(Tail, second));
            }
            Lambda::Prim { prim, args: mapped, span }
        }
        Lambda::Prim { prim, args, span } => Lambda::Prim { prim, args: map_vec(args, f), span },
        Lambda::Switch { scrutinee, switch, span, layout } => {
            let scrutinee = map_box(scrutinee, NonTail, f);
            let switch = Switch {
                num_consts: switch.num_consts,
                consts: switch.consts.into_iter().map(|(k, case)| (k, f(Tail, case))).collect(),
                num_blocks: switch.num_blocks,
                blocks: switch.blocks.into_iter().map(|(k, case)| (k, f(Tail, case))).collect(),
                failaction: switch.failaction.map(|fail| map_box(fail, Tail, f)),
            };
            Lambda::Switch { scrutinee, switch, span, layout }
        }
        Lambda::StringSwitch { scrutinee, cases, default, span, layout } => {
            let scrutinee = map_box(scrutinee, NonTail, f);
            let cases = cases.into_iter().map(|(s, case)| (s, f(Tail, case))).collect();
            let default = default.map(|d| map_box(d, Tail, f));
            Lambda::StringSwitch { scrutinee, cases, default, span, layout }
        }
        Lambda::StaticRaise { label, args } => Lambda::StaticRaise { label, args: map_vec(args, f) },
        Lambda::StaticCatch { body, label, params, handler, pop_region, layout } => {
            let body = map_box(body, Tail, f);
            let handler = map_box(handler, Tail, f);
            Lambda::StaticCatch { body, label, params, handler, pop_region, layout }
        }
        Lambda::TryWith { body, exn, handler, layout } => {
            let body = map_box(body, NonTail, f);
            Lambda::TryWith { body, exn, handler: map_box(handler, Tail, f), layout }
        }
        Lambda::IfThenElse { cond, then_branch, else_branch, layout } => {
            let cond = map_box(cond, NonTail, f);
            let then_branch = map_box(then_branch, Tail, f);
            let else_branch = map_box(else_branch, Tail, f);
            Lambda::IfThenElse { cond, then_branch, else_branch, layout }
        }
        Lambda::Sequence(first, second) => {
            let first = map_box(first, NonTail, f);
            Lambda::Sequence(first, map_box(second, Tail, f))
        }
        Lambda::While { cond, body } => {
            let cond = map_box(cond, NonTail, f);
            Lambda::While { cond, body: map_box(body, NonTail, f) }
        }
        Lambda::For { var, from, to, direction, body } => {
            let from = map_box(from, NonTail, f);
            let to = map_box(to, NonTail, f);
            Lambda::For { var, from, to, direction, body: map_box(body, NonTail, f) }
        }
        Lambda::Assign { id, value } => Lambda::Assign { id, value: map_box(value, NonTail, f) },
        Lambda::Send { kind, method, obj, args, region_close, mode, span, layout } => {
            let method = map_box(method, NonTail, f);
            let obj = map_box(obj, NonTail, f);
            let args = map_vec(args, f);
            Lambda::Send { kind, method, obj, args, region_close, mode, span, layout }
        }
        Lambda::Event { body, event } => Lambda::Event { body: map_box(body, Tail, f), event },
        Lambda::IfUsed { id, body } => Lambda::IfUsed { id, body: map_box(body, Tail, f) },
        Lambda::Region { body, layout } => Lambda::Region { body: map_box(body, NonTail, f), layout },
        Lambda::Exclave(body) => Lambda::Exclave(map_box(body, Tail, f)),
    }
}

/// Rebuild `lam` with one rewriting function per position
pub fn shallow_map(
    lam: Lambda,
    mut tail: impl FnMut(Lambda) -> Lambda,
    mut non_tail: impl FnMut(Lambda) -> Lambda,
) -> Lambda {
    shallow_map_positions(lam, &mut |pos, sub| match pos {
        Position::Tail => tail(sub),
        Position::NonTail => non_tail(sub),
    })
}

/// Bottom-up rewrite: children first, then `f` on the rebuilt node
pub fn map<F: FnMut(Lambda) -> Lambda>(lam: Lambda, f: &mut F) -> Lambda {
    let rebuilt = shallow_map_positions(lam, &mut |_, sub| map(sub, &mut *f));
    f(rebuilt)
}

/// Variables occurring free in `lam`
pub fn free_variables(lam: &Lambda) -> BTreeSet<Ident> {
    let mut free = BTreeSet::new();
    collect_free(lam, &mut free);
    free
}

fn free_of(lam: &Lambda) -> BTreeSet<Ident> {
    free_variables(lam)
}

fn collect_free(lam: &Lambda, acc: &mut BTreeSet<Ident>) {
    match lam {
        Lambda::Var(id) | Lambda::MutVar(id) => {
            acc.insert(*id);
        }
        Lambda::Function(func) => {
            let mut body = free_of(&func.body);
            for param in &func.params {
                body.remove(&param.name);
            }
            acc.extend(body);
        }
        Lambda::Let { id, def, body, .. } | Lambda::MutLet { id, def, body, .. } => {
            collect_free(def, acc);
            let mut body = free_of(body);
            body.remove(id);
            acc.extend(body);
        }
        Lambda::LetRec { bindings, body } => {
            let mut set = free_of(body);
            for binding in bindings {
                collect_free(&Lambda::Function(binding.def.clone()), &mut set);
            }
            for binding in bindings {
                set.remove(&binding.id);
            }
            acc.extend(set);
        }
        Lambda::StaticCatch { body, params, handler, .. } => {
            collect_free(body, acc);
            let mut handler = free_of(handler);
            for (id, _) in params {
                handler.remove(id);
            }
            acc.extend(handler);
        }
        Lambda::TryWith { body, exn, handler, .. } => {
            collect_free(body, acc);
            let mut handler = free_of(handler);
            handler.remove(exn);
            acc.extend(handler);
        }
        Lambda::For { var, from, to, body, .. } => {
            collect_free(from, acc);
            collect_free(to, acc);
            let mut body = free_of(body);
            body.remove(var);
            acc.extend(body);
        }
        Lambda::Assign { id, value } => {
            acc.insert(*id);
            collect_free(value, acc);
        }
        other => shallow_iter_positions(other, &mut |_, sub| collect_free(sub, acc)),
    }
}
