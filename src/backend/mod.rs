//! Hands the lowered module to an external LLVM tool. The IR is written as
//! plain text to a temporary file, and the selected assembler turns it into
//! an object file.

use std::{
    io,
    path::{Path, PathBuf},
    process::ExitStatus,
};

use thiserror::Error;
use tracing::{debug, info};

use crate::ir::{self, pretty_print::to_llvm_text};

pub mod targets;

pub use targets::{Assembler, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    pub target: Target,
    /// Where the object file is written
    pub output: PathBuf,
}

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("could not write the temporary IR file")]
    TemporaryFile(#[source] io::Error),

    #[error("could not run `{program}`")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` failed with {status}{}", format_stderr(.stderr))]
    Failed {
        program: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

pub fn assemble(module: &ir::Module, options: &BackendOptions) -> Result<(), AssembleError> {
    let input = mktemp::Temp::new_file().map_err(AssembleError::TemporaryFile)?;
    let input_file = input.to_path_buf();

    std::fs::write(&input_file, to_llvm_text(module)).map_err(AssembleError::TemporaryFile)?;
    debug!(path = %input_file.display(), "wrote IR");

    run_assembler(
        options.target.get_assembler().as_ref(),
        &input_file,
        &options.output,
    )
}

fn run_assembler(
    assembler: &dyn Assembler,
    input_file: &Path,
    output_file: &Path,
) -> Result<(), AssembleError> {
    let program = assembler.program();
    let mut cmd = assembler.create_assembler_command(input_file, output_file);
    info!(?cmd, "assembling");

    let output = cmd
        .output()
        .map_err(|source| AssembleError::Spawn { program, source })?;

    if !output.status.success() {
        return Err(AssembleError::Failed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    info!(output = %output_file.display(), "wrote object file");
    Ok(())
}
