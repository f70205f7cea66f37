//! lambdac - primitive declaration checker
//!
//! Usage: lambdac [OPTIONS] <input>

use anyhow::{bail, Context};
use clap::Parser as ClapParser;
use lambda_ir::common::DiagnosticReporter;
use lambda_ir::driver::{DriverConfig, Pipeline};
use lambda_ir::ir::{check_well_formed, Printer};
use lambda_ir::primitive::{print_declaration, ValidationConfig};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "lambdac")]
#[command(author = "Lambda IR Team")]
#[command(version = "0.1.0")]
#[command(about = "Checks primitive declarations and dumps their lambda wrappers", long_about = None)]
struct Args {
    /// Input declaration file
    #[arg(required = true)]
    input: PathBuf,

    /// Print every checked declaration in canonical form
    #[arg(short, long)]
    print: bool,

    /// Dump the eta-expanded wrapper of every external
    #[arg(long)]
    dump_lambda: bool,

    /// Run the well-formedness checker on the wrappers
    #[arg(long)]
    check: bool,

    /// Accept unboxed product sorts at primitive boundaries
    #[arg(long)]
    allow_product_sorts: bool,

    /// Skip builtin representation rules
    #[arg(long)]
    no_validate: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("lambda_ir=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    let config = DriverConfig {
        validate_builtins: !args.no_validate,
        emit_wrappers: args.dump_lambda || args.check,
        verbose: args.verbose,
        validation: ValidationConfig {
            allow_product_sorts: args.allow_product_sorts,
        },
    };

    let mut pipeline = Pipeline::new();
    let output = match pipeline.compile_source(&source, &config) {
        Ok(output) => output,
        Err(e) => {
            reporter.report_error(file_id, &e);
            bail!("{} could not be parsed", filename);
        }
    };

    for warning in output.deprecations() {
        reporter.report_warning(file_id, warning);
    }
    for error in &output.errors {
        reporter.report_error(file_id, error);
    }

    let mut malformed = 0;
    for checked in &output.primitives {
        if args.print {
            println!("{}", print_declaration(&checked.description, &checked.value_name));
        }
        if let Some(wrapper) = &checked.wrapper {
            if args.dump_lambda {
                println!("{} = {}", checked.value_name, Printer::new(pipeline.idents()).lambda(wrapper));
            }
            if args.check {
                for violation in check_well_formed(wrapper) {
                    eprintln!("{}: {}", checked.value_name, violation);
                    malformed += 1;
                }
            }
        }
    }

    if args.verbose {
        eprintln!(
            "{}: {} declarations checked, {} rejected",
            filename,
            output.primitives.len(),
            output.errors.len()
        );
    }

    if output.has_errors() {
        bail!("{} declaration(s) rejected", output.errors.len());
    }
    if malformed > 0 {
        bail!("{} well-formedness violation(s)", malformed);
    }
    Ok(())
}
