//! Well-formedness checks for lambda terms
//!
//! These are preconditions of the transformations rather than user errors;
//! the checker exists for tests and for `--check` in the driver binary.

use std::collections::HashMap;
use thiserror::Error;
use super::ident::{Ident, StaticLabel};
use super::lambda::{Function, Lambda, PopRegion};
use super::layout::compute_layout;
use super::traverse::shallow_iter_positions;
use crate::types::Layout;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("static raise to unbound label {label}")]
    UnboundLabel { label: StaticLabel },

    #[error("static raise to label {label} with {found} arguments, handler expects {expected}")]
    RaiseArity {
        label: StaticLabel,
        expected: usize,
        found: usize,
    },

    #[error("handler {label} runs in regions not open at the raise site")]
    HandlerRegions { label: StaticLabel },

    #[error("branch of layout {found} in a term declared as {expected}")]
    IncompatibleBranch { expected: Layout, found: Layout },
}

#[derive(Debug, Clone)]
struct Handler {
    arity: usize,
    /// Regions open where the handler runs
    regions: Vec<u32>,
}

#[derive(Default)]
struct Checker {
    labels: HashMap<StaticLabel, Handler>,
    regions: Vec<u32>,
    next_region: u32,
    layouts: HashMap<Ident, Layout>,
    violations: Vec<Violation>,
}

impl Checker {
    fn branch(&mut self, declared: &Layout, lam: &Lambda) {
        let found = compute_layout(&self.layouts, lam);
        if !found.is_compatible(declared) {
            self.violations.push(Violation::IncompatibleBranch {
                expected: declared.clone(),
                found,
            });
        }
    }

    /// Check `lam` with `bindings` in scope, restoring the scope afterwards
    fn scoped(&mut self, bindings: &[(Ident, Layout)], lam: &Lambda, declared: Option<&Layout>) {
        let saved: Vec<_> = bindings
            .iter()
            .map(|(id, layout)| (*id, self.layouts.insert(*id, layout.clone())))
            .collect();
        self.check(lam);
        if let Some(declared) = declared {
            self.branch(declared, lam);
        }
        for (id, previous) in saved.into_iter().rev() {
            match previous {
                Some(layout) => self.layouts.insert(id, layout),
                None => self.layouts.remove(&id),
            };
        }
    }

    fn function(&mut self, func: &Function) {
        let labels = std::mem::take(&mut self.labels);
        let regions = std::mem::take(&mut self.regions);
        if func.region {
            self.next_region += 1;
            self.regions.push(self.next_region);
        }
        let params: Vec<_> = func.params.iter().map(|p| (p.name, p.layout.clone())).collect();
        self.scoped(&params, &func.body, Some(&func.return_layout));
        self.labels = labels;
        self.regions = regions;
    }

    fn check(&mut self, lam: &Lambda) {
        match lam {
            Lambda::StaticRaise { label, args } => {
                args.iter().for_each(|arg| self.check(arg));
                match self.labels.get(label) {
                    None => self.violations.push(Violation::UnboundLabel { label: *label }),
                    Some(handler) => {
                        if handler.arity != args.len() {
                            self.violations.push(Violation::RaiseArity {
                                label: *label,
                                expected: handler.arity,
                                found: args.len(),
                            });
                        }
                        if !self.regions.starts_with(&handler.regions) {
                            self.violations.push(Violation::HandlerRegions { label: *label });
                        }
                    }
                }
            }
            Lambda::StaticCatch { body, label, params, handler, pop_region, layout } => {
                // A popped handler runs outside the innermost region
                let mut handler_regions = self.regions.clone();
                if *pop_region == PopRegion::Popped {
                    handler_regions.pop();
                }
                let previous = self.labels.insert(
                    *label,
                    Handler {
                        arity: params.len(),
                        regions: handler_regions.clone(),
                    },
                );
                self.check(body);
                match previous {
                    Some(h) => self.labels.insert(*label, h),
                    None => self.labels.remove(label),
                };
                let regions = std::mem::replace(&mut self.regions, handler_regions);
                self.scoped(params, handler, Some(layout));
                self.regions = regions;
                self.branch(layout, body);
            }
            Lambda::Function(func) => self.function(func),
            Lambda::LetRec { bindings, body } => {
                let ids: Vec<_> = bindings.iter().map(|b| (b.id, Layout::letrec())).collect();
                for binding in bindings {
                    let saved: Vec<_> = ids.iter().map(|(id, l)| (*id, self.layouts.insert(*id, l.clone()))).collect();
                    self.function(&binding.def);
                    for (id, previous) in saved {
                        match previous {
                            Some(layout) => self.layouts.insert(id, layout),
                            None => self.layouts.remove(&id),
                        };
                    }
                }
                self.scoped(&ids, body, None);
            }
            Lambda::Let { layout, id, def, body, .. } | Lambda::MutLet { layout, id, def, body } => {
                self.check(def);
                self.scoped(&[(*id, layout.clone())], body, None);
            }
            Lambda::TryWith { body, exn, handler, layout } => {
                self.check(body);
                self.scoped(&[(*exn, Layout::exception())], handler, Some(layout));
                self.branch(layout, body);
            }
            Lambda::For { var, from, to, body, .. } => {
                self.check(from);
                self.check(to);
                self.scoped(&[(*var, Layout::int())], body, None);
            }
            Lambda::IfThenElse { cond, then_branch, else_branch, layout } => {
                self.check(cond);
                self.check(then_branch);
                self.check(else_branch);
                self.branch(layout, then_branch);
                self.branch(layout, else_branch);
            }
            Lambda::Switch { scrutinee, switch, layout, .. } => {
                self.check(scrutinee);
                let cases = switch
                    .consts
                    .iter()
                    .chain(switch.blocks.iter())
                    .map(|(_, case)| case)
                    .chain(switch.failaction.as_deref());
                for case in cases {
                    self.check(case);
                    self.branch(layout, case);
                }
            }
            Lambda::StringSwitch { scrutinee, cases, default, layout, .. } => {
                self.check(scrutinee);
                for case in cases.iter().map(|(_, case)| case).chain(default.as_deref()) {
                    self.check(case);
                    self.branch(layout, case);
                }
            }
            Lambda::Region { body, layout } => {
                self.next_region += 1;
                self.regions.push(self.next_region);
                self.check(body);
                self.regions.pop();
                self.branch(layout, body);
            }
            Lambda::Exclave(body) => {
                let closed = self.regions.pop();
                self.check(body);
                if let Some(region) = closed {
                    self.regions.push(region);
                }
            }
            other => shallow_iter_positions(other, &mut |_, sub| self.check(sub)),
        }
    }
}

/// Every well-formedness violation in `lam`, in traversal order
pub fn check_well_formed(lam: &Lambda) -> Vec<Violation> {
    let mut checker = Checker::default();
    checker.check(lam);
    checker.violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::ir::builder::const_int;
    use crate::ir::ident::Idents;
    use crate::types::FloatWidth;

    #[test]
    fn test_bound_label_is_well_formed() {
        let mut idents = Idents::new();
        let x = idents.create_local("x");
        let term = Lambda::static_catch(
            Lambda::static_raise(StaticLabel(1), vec![const_int(3)]),
            StaticLabel(1),
            vec![(x, Layout::int())],
            Lambda::Var(x),
            Layout::int(),
        );
        assert_eq!(check_well_formed(&term), Vec::new());
    }

    #[test]
    fn test_unbound_label() {
        let term = Lambda::seq(const_int(0), Lambda::static_raise(StaticLabel(7), Vec::new()));
        assert_eq!(
            check_well_formed(&term),
            vec![Violation::UnboundLabel { label: StaticLabel(7) }]
        );
    }

    #[test]
    fn test_label_not_visible_in_own_handler() {
        let term = Lambda::static_catch(
            const_int(0),
            StaticLabel(2),
            Vec::new(),
            Lambda::static_raise(StaticLabel(2), Vec::new()),
            Layout::int(),
        );
        assert_eq!(
            check_well_formed(&term),
            vec![Violation::UnboundLabel { label: StaticLabel(2) }]
        );
    }

    #[test]
    fn test_raise_arity_mismatch() {
        let term = Lambda::static_catch(
            Lambda::static_raise(StaticLabel(1), vec![const_int(1), const_int(2)]),
            StaticLabel(1),
            Vec::new(),
            const_int(0),
            Layout::int(),
        );
        assert_eq!(
            check_well_formed(&term),
            vec![Violation::RaiseArity {
                label: StaticLabel(1),
                expected: 0,
                found: 2,
            }]
        );
    }

    #[test]
    fn test_handler_inside_region_raised_from_exclave() {
        let term = Lambda::region(
            Lambda::static_catch(
                Lambda::Exclave(Box::new(Lambda::static_raise(StaticLabel(1), Vec::new()))),
                StaticLabel(1),
                Vec::new(),
                const_int(0),
                Layout::int(),
            ),
            Layout::int(),
        );
        assert_eq!(
            check_well_formed(&term),
            vec![Violation::HandlerRegions { label: StaticLabel(1) }]
        );
    }

    #[test]
    fn test_popped_handler_raised_from_exclave() {
        let catch = |pop_region| Lambda::StaticCatch {
            body: Box::new(Lambda::Exclave(Box::new(Lambda::static_raise(StaticLabel(1), Vec::new())))),
            label: StaticLabel(1),
            params: Vec::new(),
            handler: Box::new(const_int(0)),
            pop_region,
            layout: Layout::int(),
        };
        let popped = Lambda::region(catch(PopRegion::Popped), Layout::int());
        assert_eq!(check_well_formed(&popped), Vec::new());

        let same = Lambda::region(catch(PopRegion::Same), Layout::int());
        assert_eq!(
            check_well_formed(&same),
            vec![Violation::HandlerRegions { label: StaticLabel(1) }]
        );
    }

    #[test]
    fn test_raise_to_popped_handler_leaves_region() {
        let term = Lambda::region(
            Lambda::StaticCatch {
                body: Box::new(Lambda::static_raise(StaticLabel(1), Vec::new())),
                label: StaticLabel(1),
                params: Vec::new(),
                handler: Box::new(const_int(0)),
                pop_region: PopRegion::Popped,
                layout: Layout::int(),
            },
            Layout::int(),
        );
        assert_eq!(check_well_formed(&term), Vec::new());
    }

    #[test]
    fn test_raise_from_inner_region_is_fine() {
        let term = Lambda::static_catch(
            Lambda::region(Lambda::static_raise(StaticLabel(1), Vec::new()), Layout::int()),
            StaticLabel(1),
            Vec::new(),
            const_int(0),
            Layout::int(),
        );
        assert_eq!(check_well_formed(&term), Vec::new());
    }

    #[test]
    fn test_incompatible_branch() {
        let term = Lambda::if_then_else(
            const_int(1),
            const_int(2),
            Lambda::Const(crate::ir::lambda::StructuredConstant::Base(
                crate::ir::lambda::Constant::UnboxedFloat("1.".into()),
            )),
            Layout::int(),
        );
        assert_eq!(
            check_well_formed(&term),
            vec![Violation::IncompatibleBranch {
                expected: Layout::int(),
                found: Layout::unboxed_float(FloatWidth::F64),
            }]
        );
    }
}
