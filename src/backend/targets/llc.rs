use std::{path::Path, process::Command};

use super::Assembler;

pub struct Llc;

impl Assembler for Llc {
    fn program(&self) -> &'static str {
        "llc"
    }

    fn create_assembler_command(&self, input_file: &Path, output_file: &Path) -> Command {
        let mut cmd = Command::new(self.program());

        cmd.arg("-filetype=obj")
            .arg("-o")
            .arg(output_file)
            .arg(input_file);

        cmd
    }
}
