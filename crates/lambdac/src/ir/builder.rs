//! Construction helpers for lambda terms

use super::ident::{Ident, Idents};
use super::lambda::{
    Function, FunctionAttribute, FunctionKind, Lambda, LetKind, Param, StructuredConstant,
};
use super::primitive::AllocMode;
use crate::common::Span;
use crate::types::Layout;

/// The unit value
pub fn lambda_unit() -> Lambda {
    const_int(0)
}

pub fn const_int(n: i64) -> Lambda {
    Lambda::Const(StructuredConstant::int(n))
}

/// Everything needed to build a function literal
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub return_layout: Layout,
    pub body: Lambda,
    pub attr: FunctionAttribute,
    pub span: Span,
    pub mode: AllocMode,
    pub ret_mode: AllocMode,
    pub region: bool,
}

/// Build a function literal.
///
/// # Panics
///
/// When the closure mode and arity disagree: a curried function may not
/// have more local-closure parameters than parameters, a function without
/// its own region needs at least one, a local closure makes every
/// parameter local, and tupled functions are heap-allocated with a region.
pub fn lfunction_def(spec: FunctionSpec) -> Function {
    match spec.kind {
        FunctionKind::Curried { nlocal } => {
            assert!(nlocal <= spec.params.len(), "lfunction: nlocal exceeds arity");
            if !spec.region {
                assert!(nlocal >= 1, "lfunction: regionless function with nlocal = 0");
            }
            if spec.mode.is_local() {
                assert_eq!(nlocal, spec.params.len(), "lfunction: local closure with global params");
            }
        }
        FunctionKind::Tupled => {
            assert!(spec.region, "lfunction: tupled function without region");
            assert_eq!(spec.mode, AllocMode::Heap, "lfunction: local tupled function");
        }
    }
    Function {
        kind: spec.kind,
        params: spec.params,
        return_layout: spec.return_layout,
        body: Box::new(spec.body),
        attr: spec.attr,
        span: spec.span,
        mode: spec.mode,
        ret_mode: spec.ret_mode,
        region: spec.region,
    }
}

/// [`lfunction_def`] as a term
pub fn lfunction(spec: FunctionSpec) -> Lambda {
    Lambda::Function(lfunction_def(spec))
}

/// `let var = exp in body`, skipped when `exp` is `var` itself
pub fn bind_with_layout(kind: LetKind, var: Ident, layout: Layout, exp: Lambda, body: Lambda) -> Lambda {
    match exp {
        Lambda::Var(v) if v == var => body,
        exp => Lambda::Let {
            kind,
            layout,
            id: var,
            def: Box::new(exp),
            body: Box::new(body),
        },
    }
}

/// Give `arg` a name unless it already is a variable
pub fn name_lambda(
    idents: &mut Idents,
    kind: LetKind,
    arg: Lambda,
    layout: Layout,
    body: impl FnOnce(&mut Idents, Ident) -> Lambda,
) -> Lambda {
    match arg {
        Lambda::Var(id) => body(idents, id),
        arg => {
            let id = idents.create_local("let");
            Lambda::Let {
                kind,
                layout,
                id,
                def: Box::new(arg),
                body: Box::new(body(idents, id)),
            }
        }
    }
}

/// Name every non-variable argument with a strict let, left to right
pub fn name_lambda_list(
    idents: &mut Idents,
    args: Vec<(Lambda, Layout)>,
    body: impl FnOnce(&mut Idents, Vec<Lambda>) -> Lambda,
) -> Lambda {
    let mut names = Vec::with_capacity(args.len());
    let mut bindings = Vec::new();
    for (arg, layout) in args {
        match arg {
            var @ Lambda::Var(_) => names.push(var),
            arg => {
                let id = idents.create_local("let");
                names.push(Lambda::Var(id));
                bindings.push((id, layout, arg));
            }
        }
    }
    let inner = body(idents, names);
    bindings.into_iter().rev().fold(inner, |body, (id, layout, def)| Lambda::Let {
        kind: LetKind::Strict,
        layout,
        id,
        def: Box::new(def),
        body: Box::new(body),
    })
}

/// Sequence `f` over `items`; unit when empty
pub fn make_sequence<T>(items: impl IntoIterator<Item = T>, mut f: impl FnMut(T) -> Lambda) -> Lambda {
    let mut terms: Vec<Lambda> = items.into_iter().map(&mut f).collect();
    match terms.pop() {
        None => lambda_unit(),
        Some(last) => terms
            .into_iter()
            .rev()
            .fold(last, |rest, term| Lambda::seq(term, rest)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn param(id: Ident) -> Param {
        Param {
            name: id,
            layout: Layout::any_value(),
            unbox: false,
            mode: AllocMode::Heap,
        }
    }

    fn spec(params: Vec<Param>, kind: FunctionKind, mode: AllocMode, region: bool) -> FunctionSpec {
        FunctionSpec {
            kind,
            params,
            return_layout: Layout::any_value(),
            body: lambda_unit(),
            attr: FunctionAttribute::default(),
            span: Span::unknown(),
            mode,
            ret_mode: AllocMode::Heap,
            region,
        }
    }

    #[test]
    fn test_bind_with_layout_skips_self_alias() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let body = const_int(1);
        assert_eq!(
            bind_with_layout(LetKind::Strict, x, Layout::int(), Lambda::Var(x), body.clone()),
            body
        );
        assert!(matches!(
            bind_with_layout(LetKind::Strict, x, Layout::int(), const_int(2), body),
            Lambda::Let { .. }
        ));
    }

    #[test]
    fn test_name_lambda() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let named = name_lambda(&mut idents, LetKind::Strict, Lambda::Var(x), Layout::int(), |_, id| {
            Lambda::Var(id)
        });
        assert_eq!(named, Lambda::Var(x));

        let named = name_lambda(&mut idents, LetKind::Strict, const_int(3), Layout::int(), |_, id| {
            Lambda::Var(id)
        });
        match named {
            Lambda::Let { id, def, body, .. } => {
                assert_eq!(*def, const_int(3));
                assert_eq!(*body, Lambda::Var(id));
                assert_eq!(idents.name(id), "let");
            }
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn test_name_lambda_list_preserves_order() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let term = name_lambda_list(
            &mut idents,
            vec![(const_int(1), Layout::int()), (Lambda::Var(x), Layout::int()), (const_int(2), Layout::int())],
            |_, names| {
                assert_eq!(names.len(), 3);
                assert_eq!(names[1], Lambda::Var(x));
                Lambda::Var(x)
            },
        );
        let Lambda::Let { def: first, body, .. } = term else {
            panic!("expected outer let");
        };
        assert_eq!(*first, const_int(1));
        let Lambda::Let { def: second, .. } = *body else {
            panic!("expected inner let");
        };
        assert_eq!(*second, const_int(2));
    }

    #[test]
    fn test_make_sequence() {
        assert_eq!(make_sequence(Vec::<i64>::new(), const_int), lambda_unit());
        assert_eq!(make_sequence(vec![7], const_int), const_int(7));
        assert_eq!(
            make_sequence(vec![1, 2, 3], const_int),
            Lambda::seq(const_int(1), Lambda::seq(const_int(2), const_int(3)))
        );
    }

    #[test]
    fn test_lfunction_accepts_valid_shapes() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let f = lfunction_def(spec(vec![param(x)], FunctionKind::Curried { nlocal: 0 }, AllocMode::Heap, true));
        assert_eq!(f.params.len(), 1);
        let g = lfunction_def(spec(vec![param(x)], FunctionKind::Curried { nlocal: 1 }, AllocMode::Local, false));
        assert!(!g.region);
    }

    #[test]
    #[should_panic(expected = "nlocal exceeds arity")]
    fn test_lfunction_rejects_nlocal_above_arity() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        lfunction(spec(vec![param(x)], FunctionKind::Curried { nlocal: 2 }, AllocMode::Heap, true));
    }

    #[test]
    #[should_panic(expected = "local tupled function")]
    fn test_lfunction_rejects_local_tupled() {
        lfunction(spec(Vec::new(), FunctionKind::Tupled, AllocMode::Local, true));
    }
}
