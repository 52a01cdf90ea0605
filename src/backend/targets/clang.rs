use std::{path::Path, process::Command};

use super::Assembler;

pub struct Clang;

impl Assembler for Clang {
    fn program(&self) -> &'static str {
        "clang"
    }

    fn create_assembler_command(&self, input_file: &Path, output_file: &Path) -> Command {
        let mut cmd = Command::new(self.program());

        // The temporary input has no `.ll` extension to go by
        cmd.args(["-c", "-x", "ir", "-o"])
            .arg(output_file)
            .arg(input_file);

        cmd
    }
}
