//! svmc-drv — the command-line driver.
//!
//! Wires the phases together: read the source file, tokenize, parse,
//! optimize, generate assembly, and either print an intermediate stage or
//! write the final assembly to disk. Every phase already returns a
//! `svmc_util::CompileResult`; this crate's job is orchestration, `tracing`
//! instrumentation, and turning an error into a process exit code.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use svmc_util::Interner;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "svmc", about = "Compiles a source file to stack-machine assembly")]
pub struct Cli {
    /// Source file to compile.
    pub input: PathBuf,

    /// Stop the pipeline early and print this intermediate stage instead of
    /// writing assembly.
    #[arg(long, value_enum, default_value_t = Emit::Asm)]
    pub emit: Emit,

    /// Output path for the generated assembly (defaults to the input path
    /// with its extension replaced by `.asm`). Ignored for `--emit tokens`
    /// and `--emit ast`, which always print to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Raise the tracing log level to `debug`.
    #[arg(short, long)]
    pub verbose: bool,

    /// Assemble and run the output. Not available in this build: there is
    /// no bundled assembler or VM, only the code generator.
    #[arg(long)]
    pub run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emit {
    Tokens,
    Ast,
    Asm,
}

/// Initializes `tracing-subscriber`: `debug` by default under `-v`, `warn`
/// otherwise, deferring to `RUST_LOG` when it's set.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runs the pipeline for `cli`, returning the text that should be emitted
/// (a token dump, an AST dump, or the generated assembly).
pub fn run(cli: &Cli) -> Result<String> {
    if cli.run {
        bail!("--run is not available in this build: no assembler or VM is bundled");
    }

    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("cannot read {}", cli.input.display()))?;

    let mut interner = Interner::new();

    debug!(path = %cli.input.display(), "tokenizing");
    let tokens = svmc_lex::Lexer::new(&source).tokenize(&mut interner)?;
    if cli.emit == Emit::Tokens {
        return Ok(format!("{tokens:#?}\n"));
    }

    debug!(count = tokens.len(), "parsing");
    let program = svmc_ast::Parser::new(tokens).parse_program()?;
    if cli.emit == Emit::Ast {
        return Ok(format!("{program:#?}\n"));
    }

    debug!("optimizing");
    let program = svmc_opt::optimize(program);

    debug!("generating assembly");
    let asm = svmc_gen::generate(&program, &mut interner)?;
    Ok(asm)
}

/// Writes `text` to `cli.output` (or its default derived from the input
/// path, for `--emit asm`), or prints it to stdout for the other emit
/// modes when no explicit output path was given.
pub fn emit_result(cli: &Cli, text: &str) -> Result<()> {
    match (&cli.output, cli.emit) {
        (Some(path), _) => std::fs::write(path, text)
            .with_context(|| format!("cannot write {}", path.display())),
        (None, Emit::Asm) => {
            let path = default_output_path(&cli.input);
            std::fs::write(&path, text)
                .with_context(|| format!("cannot write {}", path.display()))
        }
        (None, _) => {
            print!("{text}");
            Ok(())
        }
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("asm")
}
