use std::{path::Path, process::Command};

mod clang;
mod llc;

/// An external tool that turns a textual LLVM IR file into an object file
pub trait Assembler {
    fn program(&self) -> &'static str;
    fn create_assembler_command(&self, input_file: &Path, output_file: &Path) -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Target {
    /// The LLVM static compiler
    #[default]
    Llc,
    /// The clang driver, reading its input as IR
    Clang,
}

impl Target {
    pub fn get_assembler(self) -> Box<dyn Assembler> {
        match self {
            Target::Llc => Box::new(llc::Llc),
            Target::Clang => Box::new(clang::Clang),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arguments(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn llc_command() {
        let command = Target::Llc
            .get_assembler()
            .create_assembler_command(Path::new("in.ll"), Path::new("out.o"));

        assert_eq!(command.get_program(), "llc");
        assert_eq!(
            arguments(&command),
            ["-filetype=obj", "-o", "out.o", "in.ll"]
        );
    }

    #[test]
    fn clang_command() {
        let command = Target::Clang
            .get_assembler()
            .create_assembler_command(Path::new("in.ll"), Path::new("out.o"));

        assert_eq!(command.get_program(), "clang");
        assert_eq!(
            arguments(&command),
            ["-c", "-x", "ir", "-o", "out.o", "in.ll"]
        );
    }
}
