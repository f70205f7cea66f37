//! Declaration checking pipeline
//!
//! Source text is parsed into `external` declarations, each is resolved and
//! turned into a primitive descriptor, builtins are validated against their
//! representation rules, and non-builtins can be wrapped into lambda
//! functions calling them.

use std::rc::Rc;
use tracing::{debug, info};
use crate::common::{CompileError, CompileResult, Span};
use crate::decl::{parse_primitive_declarations, ExternalDecl};
use crate::ir::{
    layout_of_native_repr, lfunction, AllocMode, FunctionAttribute, FunctionKind, FunctionSpec, Idents,
    Lambda, Param, Primitive, Session,
};
use crate::primitive::{
    parse_declaration, prim_has_valid_reprs, Deprecation, Description, Mode, ValidationConfig,
};

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Check builtins against their representation rules
    pub validate_builtins: bool,
    /// Build an eta-expanded wrapper for every external
    pub emit_wrappers: bool,
    pub verbose: bool,
    pub validation: ValidationConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            validate_builtins: true,
            emit_wrappers: false,
            verbose: false,
            validation: ValidationConfig::default(),
        }
    }
}

/// A declaration that passed every check
#[derive(Debug, Clone)]
pub struct CheckedPrimitive {
    pub value_name: String,
    pub description: Rc<Description>,
    pub deprecation: Option<Deprecation>,
    /// `fun prim1 .. primN -> external(prim1 .. primN)`
    pub wrapper: Option<Lambda>,
    pub span: Span,
}

/// Outcome of checking one source file.
///
/// Syntax errors abort the whole file; every other error is attached to
/// its declaration and checking continues with the next one.
#[derive(Debug, Default)]
pub struct DriverOutput {
    pub primitives: Vec<CheckedPrimitive>,
    pub errors: Vec<CompileError>,
}

impl DriverOutput {
    pub fn deprecations(&self) -> impl Iterator<Item = &Deprecation> {
        self.primitives.iter().filter_map(|p| p.deprecation.as_ref())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Declaration checking pipeline
pub struct Pipeline {
    session: Session,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Identifier table for printing wrappers
    pub fn idents(&self) -> &Idents {
        &self.session.idents
    }

    /// Check every declaration in `source`
    pub fn compile_source(&mut self, source: &str, config: &DriverConfig) -> CompileResult<DriverOutput> {
        self.session.reset_for_unit();
        let decls = parse_primitive_declarations(source)?;
        debug!(count = decls.len(), "parsed declarations");

        let mut output = DriverOutput::default();
        for (decl, resolved) in decls {
            match self.check_one(&decl, &resolved, config) {
                Ok(checked) => output.primitives.push(checked),
                Err(err) => output.errors.push(err),
            }
        }
        Ok(output)
    }

    fn check_one(
        &mut self,
        decl: &ExternalDecl,
        resolved: &crate::primitive::PrimitiveDeclaration,
        config: &DriverConfig,
    ) -> CompileResult<CheckedPrimitive> {
        let parsed = parse_declaration(resolved)?;
        let description = parsed.description;
        if config.validate_builtins {
            prim_has_valid_reprs(&description, decl.span, &config.validation)?;
        }
        if config.verbose {
            info!(value = %decl.value_name, prim = %description.name, arity = description.arity, "checked");
        }

        let description = Rc::new(description);
        let wrapper = if config.emit_wrappers && !description.is_builtin() && description.arity > 0 {
            Some(eta_expand(&mut self.session.idents, &description, decl.span))
        } else {
            None
        };

        Ok(CheckedPrimitive {
            value_name: decl.value_name.clone(),
            description,
            deprecation: parsed.deprecation,
            wrapper,
            span: decl.span,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn param_mode(mode: Mode) -> AllocMode {
    match mode {
        Mode::Global => AllocMode::Heap,
        Mode::Local | Mode::Poly => AllocMode::Local,
    }
}

/// `fun prim1 .. primN -> desc(prim1 .. primN)` for a non-builtin external
pub fn eta_expand(idents: &mut Idents, desc: &Rc<Description>, span: Span) -> Lambda {
    let params: Vec<Param> = desc
        .native_repr_args
        .iter()
        .map(|arg| Param {
            name: idents.create_local("prim"),
            layout: layout_of_native_repr(&arg.repr),
            unbox: false,
            mode: param_mode(arg.mode),
        })
        .collect();
    let args = params.iter().map(|p| Lambda::Var(p.name)).collect();
    let ret_mode = match desc.native_repr_res.mode {
        Mode::Local => AllocMode::Local,
        Mode::Global | Mode::Poly => AllocMode::Heap,
    };
    lfunction(FunctionSpec {
        kind: FunctionKind::Curried { nlocal: 0 },
        params,
        return_layout: desc.result_layout(),
        body: Lambda::prim(Primitive::Ccall(Rc::clone(desc)), args, span),
        attr: FunctionAttribute::stub(),
        span,
        mode: AllocMode::Heap,
        ret_mode,
        region: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::ir::check_well_formed;
    use crate::primitive::PrimitiveError;
    use crate::types::{FloatWidth, Layout};

    #[test]
    fn test_checks_every_declaration() {
        let source = r#"
            external sqrt : float -> float = "caml_sqrt_float" "sqrt" [@@unboxed] [@@noalloc]
            external bad : int -> int = "bad" [@@no_effects] [@@only_generative_effects]
            external box : float# -> float = "%box_float"
        "#;
        let mut pipeline = Pipeline::new();
        let output = pipeline.compile_source(source, &DriverConfig::default()).unwrap();
        assert_eq!(output.primitives.len(), 2);
        assert_eq!(output.errors.len(), 1);
        assert!(matches!(
            output.errors[0],
            CompileError::Primitive(PrimitiveError::InconsistentEffectAttributes { .. })
        ));
    }

    #[test]
    fn test_invalid_builtin_repr_is_reported() {
        let source = r#"external box : float -> float = "%box_float""#;
        let mut pipeline = Pipeline::new();
        let output = pipeline.compile_source(source, &DriverConfig::default()).unwrap();
        assert!(matches!(
            &output.errors[0],
            CompileError::Primitive(PrimitiveError::InvalidNativeReprForPrimitive { name, .. }) if name == "%box_float"
        ));

        let lenient = DriverConfig {
            validate_builtins: false,
            ..DriverConfig::default()
        };
        let output = pipeline.compile_source(source, &lenient).unwrap();
        assert!(!output.has_errors());
    }

    #[test]
    fn test_deprecations_are_collected() {
        let source = r#"external fabs : float -> float = "caml_fabs" "fabs" "float""#;
        let mut pipeline = Pipeline::new();
        let output = pipeline.compile_source(source, &DriverConfig::default()).unwrap();
        assert!(matches!(
            output.deprecations().collect::<Vec<_>>()[..],
            [Deprecation::LegacyFloat { .. }]
        ));
    }

    #[test]
    fn test_wrapper_calls_the_external() {
        let source = r#"external sqrt : float -> float = "caml_sqrt_float" "sqrt" [@@unboxed] [@@noalloc]"#;
        let config = DriverConfig {
            emit_wrappers: true,
            ..DriverConfig::default()
        };
        let mut pipeline = Pipeline::new();
        let output = pipeline.compile_source(source, &config).unwrap();
        let wrapper = output.primitives[0].wrapper.clone().unwrap();
        match &wrapper {
            Lambda::Function(func) => {
                assert_eq!(func.params.len(), 1);
                assert_eq!(func.params[0].layout, Layout::boxed_float(FloatWidth::F64));
                assert_eq!(func.return_layout, Layout::boxed_float(FloatWidth::F64));
                assert!(func.attr.stub);
                assert!(matches!(&*func.body, Lambda::Prim { prim: Primitive::Ccall(_), args, .. } if args.len() == 1));
            }
            other => panic!("expected function, got {:?}", other),
        }
        assert_eq!(check_well_formed(&wrapper), Vec::new());
    }

    #[test]
    fn test_syntax_errors_abort() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.compile_source("external", &DriverConfig::default()).is_err());
    }
}
