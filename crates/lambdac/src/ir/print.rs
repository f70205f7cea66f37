//! S-expression rendering of lambda terms

use std::fmt::Write;
use super::ident::{Ident, Idents};
use super::lambda::{
    Constant, Direction, EventKind, Function, FunctionKind, Lambda, LetKind, MethKind, PopRegion,
    StructuredConstant,
};
use super::primitive::AllocMode;

/// Renders terms, resolving identifier names through an [`Idents`] table
pub struct Printer<'a> {
    idents: &'a Idents,
    out: String,
}

impl<'a> Printer<'a> {
    pub fn new(idents: &'a Idents) -> Self {
        Self {
            idents,
            out: String::new(),
        }
    }

    /// Render `lam` on a single line
    pub fn lambda(mut self, lam: &Lambda) -> String {
        self.term(lam);
        self.out
    }

    fn ident(&mut self, id: Ident) {
        let name = self.idents.unique_name(id);
        self.out.push_str(&name);
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn list(&mut self, terms: &[Lambda]) {
        for term in terms {
            self.push(" ");
            self.term(term);
        }
    }

    fn constant(&mut self, cst: &StructuredConstant) {
        match cst {
            StructuredConstant::Base(base) => {
                let _ = match base {
                    Constant::Int(n) => write!(self.out, "{}", n),
                    Constant::Char(c) => write!(self.out, "'{}'", c.escape_default()),
                    Constant::String(s) => write!(self.out, "{:?}", s),
                    Constant::Float(s) => write!(self.out, "{}", s),
                    Constant::Float32(s) => write!(self.out, "{}s", s),
                    Constant::UnboxedFloat(s) => write!(self.out, "#{}", s),
                    Constant::UnboxedFloat32(s) => write!(self.out, "#{}s", s),
                    Constant::Int32(n) => write!(self.out, "{}l", n),
                    Constant::Int64(n) => write!(self.out, "{}L", n),
                    Constant::Nativeint(n) => write!(self.out, "{}n", n),
                    Constant::UnboxedInt32(n) => write!(self.out, "#{}l", n),
                    Constant::UnboxedInt64(n) => write!(self.out, "#{}L", n),
                    Constant::UnboxedNativeint(n) => write!(self.out, "#{}n", n),
                };
            }
            StructuredConstant::Block { tag, fields } => {
                let _ = write!(self.out, "[{}:", tag);
                for field in fields {
                    self.push(" ");
                    self.constant(field);
                }
                self.push("]");
            }
            StructuredConstant::FloatArray(floats) => {
                let _ = write!(self.out, "[|{}|]", floats.join(" "));
            }
            StructuredConstant::FloatBlock(floats) => {
                let _ = write!(self.out, "[{}]", floats.join(" "));
            }
            StructuredConstant::ImmString(s) => {
                let _ = write!(self.out, "#{:?}", s);
            }
        }
    }

    fn function(&mut self, func: &Function) {
        self.push("(function");
        if func.mode == AllocMode::Local {
            self.push("[L]");
        }
        if func.kind == FunctionKind::Tupled {
            self.push(" tupled");
        }
        for param in &func.params {
            self.push(" ");
            self.ident(param.name);
            let _ = write!(self.out, "[{}]", param.layout);
        }
        let _ = write!(self.out, " : {} ", func.return_layout);
        self.term(&func.body);
        self.push(")");
    }

    fn term(&mut self, lam: &Lambda) {
        match lam {
            Lambda::Var(id) => self.ident(*id),
            Lambda::MutVar(id) => {
                self.push("*");
                self.ident(*id);
            }
            Lambda::Const(cst) => self.constant(cst),
            Lambda::Apply(apply) => {
                self.push("(apply ");
                self.term(&apply.func);
                self.list(&apply.args);
                self.push(")");
            }
            Lambda::Function(func) => self.function(func),
            Lambda::Let { kind, layout, id, def, body } => {
                let tag = match kind {
                    LetKind::Strict => "",
                    LetKind::Alias => "a",
                    LetKind::StrictOpt => "o",
                };
                self.push("(let (");
                self.ident(*id);
                let _ = write!(self.out, "{}[{}] ", tag, layout);
                self.term(def);
                self.push(") ");
                self.term(body);
                self.push(")");
            }
            Lambda::MutLet { layout, id, def, body } => {
                self.push("(let (");
                self.ident(*id);
                let _ = write!(self.out, "[{}] =mut ", layout);
                self.term(def);
                self.push(") ");
                self.term(body);
                self.push(")");
            }
            Lambda::LetRec { bindings, body } => {
                self.push("(letrec (");
                for (i, binding) in bindings.iter().enumerate() {
                    if i > 0 {
                        self.push(" ");
                    }
                    self.ident(binding.id);
                    self.push(" ");
                    self.function(&binding.def);
                }
                self.push(") ");
                self.term(body);
                self.push(")");
            }
            Lambda::Prim { prim, args, .. } => {
                let _ = write!(self.out, "({}", prim);
                self.list(args);
                self.push(")");
            }
            Lambda::Switch { scrutinee, switch, .. } => {
                self.push("(switch ");
                self.term(scrutinee);
                for (k, case) in &switch.consts {
                    let _ = write!(self.out, " case int {}: ", k);
                    self.term(case);
                }
                for (k, case) in &switch.blocks {
                    let _ = write!(self.out, " case tag {}: ", k);
                    self.term(case);
                }
                if let Some(fail) = &switch.failaction {
                    self.push(" default: ");
                    self.term(fail);
                }
                self.push(")");
            }
            Lambda::StringSwitch { scrutinee, cases, default, .. } => {
                self.push("(stringswitch ");
                self.term(scrutinee);
                for (s, case) in cases {
                    let _ = write!(self.out, " case {:?}: ", s);
                    self.term(case);
                }
                if let Some(default) = default {
                    self.push(" default: ");
                    self.term(default);
                }
                self.push(")");
            }
            Lambda::StaticRaise { label, args } => {
                let _ = write!(self.out, "(exit {}", label);
                self.list(args);
                self.push(")");
            }
            Lambda::StaticCatch { body, label, params, handler, pop_region, .. } => {
                self.push("(catch ");
                self.term(body);
                let _ = write!(self.out, " with ({}", label);
                for (id, _) in params {
                    self.push(" ");
                    self.ident(*id);
                }
                self.push(")");
                if *pop_region == PopRegion::Popped {
                    self.push(" pop");
                }
                self.push(" ");
                self.term(handler);
                self.push(")");
            }
            Lambda::TryWith { body, exn, handler, .. } => {
                self.push("(try ");
                self.term(body);
                self.push(" with ");
                self.ident(*exn);
                self.push(" ");
                self.term(handler);
                self.push(")");
            }
            Lambda::IfThenElse { cond, then_branch, else_branch, .. } => {
                self.push("(if ");
                self.term(cond);
                self.push(" ");
                self.term(then_branch);
                self.push(" ");
                self.term(else_branch);
                self.push(")");
            }
            Lambda::Sequence(first, second) => {
                self.push("(seq ");
                self.term(first);
                self.push(" ");
                self.term(second);
                self.push(")");
            }
            Lambda::While { cond, body } => {
                self.push("(while ");
                self.term(cond);
                self.push(" ");
                self.term(body);
                self.push(")");
            }
            Lambda::For { var, from, to, direction, body } => {
                self.push("(for ");
                self.ident(*var);
                self.push(" ");
                self.term(from);
                self.push(match direction {
                    Direction::Upto => " to ",
                    Direction::Downto => " downto ",
                });
                self.term(to);
                self.push(" ");
                self.term(body);
                self.push(")");
            }
            Lambda::Assign { id, value } => {
                self.push("(assign ");
                self.ident(*id);
                self.push(" ");
                self.term(value);
                self.push(")");
            }
            Lambda::Send { kind, method, obj, args, .. } => {
                let kind = match kind {
                    MethKind::SelfMethod => "self",
                    MethKind::Public => "public",
                    MethKind::Cached => "cache",
                };
                let _ = write!(self.out, "(send{} ", kind);
                self.term(obj);
                self.push(" ");
                self.term(method);
                self.list(args);
                self.push(")");
            }
            Lambda::Event { body, event } => {
                let kind = match &event.kind {
                    EventKind::Before => "before",
                    EventKind::After(_) => "after",
                    EventKind::Function => "funct-body",
                    EventKind::Pseudo => "pseudo",
                };
                let _ = write!(self.out, "({} {} ", kind, event.span);
                self.term(body);
                self.push(")");
            }
            Lambda::IfUsed { id, body } => {
                self.push("(ifused ");
                self.ident(*id);
                self.push(" ");
                self.term(body);
                self.push(")");
            }
            Lambda::Region { body, .. } => {
                self.push("(region ");
                self.term(body);
                self.push(")");
            }
            Lambda::Exclave(body) => {
                self.push("(exclave ");
                self.term(body);
                self.push(")");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::common::Span;
    use crate::ir::builder::const_int;
    use crate::ir::ident::StaticLabel;
    use crate::ir::primitive::Primitive;
    use crate::types::Layout;

    #[test]
    fn test_print_let_and_prim() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let term = Lambda::Let {
            kind: LetKind::Strict,
            layout: Layout::int(),
            id: x,
            def: Box::new(const_int(1)),
            body: Box::new(Lambda::prim(Primitive::AddInt, vec![Lambda::Var(x), const_int(2)], Span::unknown())),
        };
        let stamp = x.stamp();
        assert_eq!(
            Printer::new(&idents).lambda(&term),
            format!("(let (x/{stamp}[{}] 1) (+ x/{stamp} 2))", Layout::int())
        );
    }

    #[test]
    fn test_print_catch() {
        let idents = Idents::new();
        let term = Lambda::static_catch(
            Lambda::static_raise(StaticLabel(3), vec![const_int(1)]),
            StaticLabel(3),
            Vec::new(),
            const_int(0),
            Layout::int(),
        );
        assert_eq!(Printer::new(&idents).lambda(&term), "(catch (exit 3 1) with (3) 0)");
    }
}
