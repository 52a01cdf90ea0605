use std::{
    io::{self, IsTerminal, Read},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use flowc::{
    ast,
    backend::{self, BackendOptions, Target},
    codegen::{CodegenOptions, LogicalOperators, lower_program},
    graphviz::render_graphviz,
    ir::{
        eval::{DEFAULT_STEP_LIMIT, evaluate},
        pretty_print::pretty_print_module,
    },
    logger::{self, LogLevel},
};
use tracing::info;

const AFTER_HELP: &str = indoc::indoc! {"
    The program is read as a JSON syntax tree whose root is a block.

    It becomes a single function taking no arguments and returning a float:
    the final value of the return variable, or 0.0 if the program never
    assigns it.
"};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// LLVM IR of the lowered program
    Ir,
    /// GraphViz digraph of the syntax tree
    AstGraphviz,
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None, after_help = AFTER_HELP)]
struct Args {
    /// Object file to assemble the IR into
    output: Option<PathBuf>,

    /// JSON syntax tree to compile, standard input if omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// What to print on standard output. The program is still lowered with
    /// `ast-graphviz` when `--run` or an output file is given.
    #[arg(long, value_enum, default_value_t = Emit::Ir)]
    emit: Emit,

    /// Execute the lowered function and print its return value
    #[arg(long)]
    run: bool,

    /// Tool used to produce the object file
    #[arg(long, value_enum, default_value_t = Target::default())]
    assembler: Target,

    /// Name of the generated function
    #[arg(long, default_value = "main")]
    function_name: String,

    /// Variable whose final value the function returns
    #[arg(long, default_value = "return_value")]
    return_variable: String,

    /// Lower `&&` and `||` by evaluating both operands (the default)
    #[arg(long, conflicts_with = "reject_logical")]
    eager_logical: bool,

    /// Report `&&` and `||` as unsupported operators
    #[arg(long)]
    reject_logical: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log more, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn codegen_options(&self) -> CodegenOptions {
        let logical_operators = if self.reject_logical && !self.eager_logical {
            LogicalOperators::Unsupported
        } else {
            LogicalOperators::Eager
        };

        CodegenOptions {
            module_name: self
                .input
                .as_ref()
                .and_then(|path| path.file_stem())
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| CodegenOptions::default().module_name),
            function_name: self.function_name.clone(),
            return_variable: self.return_variable.clone(),
            logical_operators,
        }
    }

    /// Only the tree was asked for, so nothing has to be lowered
    fn tree_only(&self) -> bool {
        self.emit == Emit::AstGraphviz && !self.run && self.output.is_none()
    }

    fn backend_options(&self) -> Option<BackendOptions> {
        self.output.clone().map(|output| BackendOptions {
            target: self.assembler,
            output,
        })
    }
}

fn read_program(input: Option<&PathBuf>) -> anyhow::Result<ast::Block> {
    let (source, origin) = match input {
        Some(path) => (
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read `{}`", path.display()))?,
            path.display().to_string(),
        ),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read standard input")?;
            (source, "<stdin>".to_string())
        }
    };

    serde_json::from_str(&source).with_context(|| format!("`{origin}` is not a valid syntax tree"))
}

fn run(args: &Args) -> anyhow::Result<()> {
    let program = read_program(args.input.as_ref())?;
    info!(statements = program.statements.len(), "read program");

    if args.emit == Emit::AstGraphviz {
        print!("{}", render_graphviz(&program));

        if args.tree_only() {
            return Ok(());
        }
    }

    let module = lower_program(&program, &args.codegen_options()).context("lowering failed")?;

    if args.emit == Emit::Ir {
        pretty_print_module(&module);
    }

    if args.run {
        for function in &module.functions {
            let execution = evaluate(function, DEFAULT_STEP_LIMIT)
                .with_context(|| format!("failed to run `{}`", function.name))?;
            eprintln!(
                "{} {} returned {}",
                "run".green(),
                function.name,
                execution.return_value
            );
        }
    }

    if let Some(options) = args.backend_options() {
        backend::assemble(&module, &options)
            .with_context(|| format!("failed to assemble `{}`", options.output.display()))?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    logger::init_with_level(LogLevel::from_verbosity(args.verbose));

    if args.no_color || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[cfg(feature = "error-backtrace")]
            eprintln!("{}: {error:?}", "error".red());
            #[cfg(not(feature = "error-backtrace"))]
            eprintln!("{}: {error:#}", "error".red());

            ExitCode::FAILURE
        }
    }
}
