// src/main.rs
use clap::Parser;
use opalc::cli::{Args, Emit};
use opalc::error::compile_error::CompileError;
use opalc::error::error_reporter::ErrorReporter;
use opalc::ir::generator::IrGenerator;
use opalc::ir::optimizer::{self, PipelineConfig};
use opalc::ir::ssa::SsaBuilder;
use opalc::ir::{Module, verifier};
use opalc::lexer::{Lexer, lexer_tokenize_with_errors};
use opalc::parser::opal_parser::OpalParser;
use opalc::printers::graphviz;
use opalc::semantic::analyzer::SemanticAnalyzer;
use opalc::time::PhaseTimings;
use std::io::Read;
use std::process::ExitCode;
use std::{fs, io};

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> ExitCode {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

fn run(args: &Args) -> Result<(), ()> {
    let (file_path, source) = match read_source(args) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(());
        }
    };

    if args.verbose {
        eprintln!("opalc {} at {}", clap::crate_version!(), chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    }

    let mut timings = PhaseTimings::new();

    // Lexing
    let mut lexer = Lexer::new(&file_path, &source);
    let (tokens, lex_errors) = timings.time("lex", || lexer_tokenize_with_errors(&mut lexer));
    let reporter = ErrorReporter::new(lexer.line_tracker().clone());
    if !lex_errors.is_empty() {
        reporter.report_errors(&lex_errors);
        return Err(());
    }

    // Parsing
    let (program, parse_errors) = timings.time("parse", || OpalParser::new(tokens).parse());
    if !parse_errors.is_empty() {
        reporter.report_errors(&parse_errors);
        return Err(());
    }

    // Semantic analysis
    let semantic_errors = timings.time("semantic", || SemanticAnalyzer::new().analyze(&program));
    if !semantic_errors.is_empty() {
        reporter.report_errors(&semantic_errors);
        return Err(());
    }

    // Lowering: AST → CFG → SSA
    let module = timings.time("lower", || -> Result<Module, CompileError> {
        let mut module = IrGenerator::new().generate(&program)?;
        for func in &mut module.functions {
            SsaBuilder::new()
                .build(func)
                .map_err(|source| CompileError::IrError { function: func.name.clone(), source })?;
            if args.verify {
                verifier::verify_ssa(func)
                    .map_err(|source| CompileError::IrError { function: func.name.clone(), source })?;
            }
        }
        Ok(module)
    });
    let mut module = match module {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(());
        }
    };

    // Optimization
    if !args.no_opt {
        let config =
            PipelineConfig { verify: args.verify, verbose: args.verbose, ..PipelineConfig::default() };
        let errors = timings.time("optimize", || optimizer::optimize_module(&mut module, &config));
        if !errors.is_empty() {
            for error in &errors {
                eprintln!("Error: {error}");
            }
            return Err(());
        }
    }

    match args.emit {
        Emit::Ir => println!("{}", module.to_ir()),
        Emit::Dot => {
            for func in &module.functions {
                print!("{}", graphviz::cfg_to_dot(func, None));
            }
        }
    }

    if args.verbose {
        eprintln!("phase timings:\n{timings}");
    }
    Ok(())
}

fn read_source(args: &Args) -> io::Result<(String, String)> {
    match &args.input {
        Some(path) => Ok((path.display().to_string(), fs::read_to_string(path)?)),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}
