//! Renders IR as LLVM assembly. The `Display` impls colorize the listing for
//! terminals; [`to_llvm_text`] gives the plain text handed to the assembler.

use std::fmt::{self, Write};

use colored::Colorize;
use itertools::Itertools;

use super::{Block, Function, Instruction, Module, Operand, SlotId, Type};

/// Plain LLVM IR for `module`, free of any terminal escape codes
pub fn to_llvm_text(module: &Module) -> String {
    strip_ansi_escapes::strip_str(module.to_string())
}

pub fn pretty_print_module(module: &Module) {
    print!("{module}");
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", format!("; ModuleID = '{}'", self.name).bright_black())?;
        writeln!(
            f,
            "{} {} {}",
            "source_filename".cyan(),
            "=".white(),
            quoted_string(&self.name).green()
        )?;

        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{function}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {}{}",
            "define".magenta(),
            self.return_type.to_string().yellow(),
            symbol_name('@', &self.name).blue(),
            "() {".white()
        )?;

        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }

            write_block_header(f, self, block)?;

            for instruction in &block.instructions {
                write!(f, "  ")?;
                write_instruction(f, self, instruction)?;
                writeln!(f)?;
            }
        }

        writeln!(f, "{}", "}".white())
    }
}

fn write_block_header(f: &mut fmt::Formatter<'_>, function: &Function, block: &Block) -> fmt::Result {
    write!(f, "{}", format!("{}:", block.name()).bright_red())?;

    if !block.predecessors.is_empty() {
        let predecessors = block
            .predecessors
            .iter()
            .map(|id| format!("%{}", function.blocks[*id].name()))
            .join(", ");

        write!(f, "{}", format!("  ; preds = {predecessors}").bright_black())?;
    }

    writeln!(f)
}

fn write_instruction(
    f: &mut fmt::Formatter<'_>,
    function: &Function,
    instruction: &Instruction,
) -> fmt::Result {
    let float = Type::Float.to_string().yellow();
    let i1 = Type::Bool.to_string().yellow();

    match instruction {
        Instruction::Alloca { slot } => write!(
            f,
            "{} {} {} {float}",
            slot_name(function, *slot),
            "=".white(),
            "alloca".cyan()
        ),
        Instruction::Load { destination, slot } => write!(
            f,
            "{destination} {} {} {float}, {} {}",
            "=".white(),
            "load".cyan(),
            "ptr".yellow(),
            slot_name(function, *slot)
        ),
        Instruction::Store { slot, value } => write!(
            f,
            "{} {float} {}, {} {}",
            "store".cyan(),
            operand(*value),
            "ptr".yellow(),
            slot_name(function, *slot)
        ),
        Instruction::Binary {
            operator,
            destination,
            lhs,
            rhs,
        } => write!(
            f,
            "{destination} {} {} {float} {}, {}",
            "=".white(),
            operator.to_string().cyan(),
            operand(*lhs),
            operand(*rhs)
        ),
        Instruction::Compare {
            predicate,
            destination,
            lhs,
            rhs,
        } => write!(
            f,
            "{destination} {} {} {} {float} {}, {}",
            "=".white(),
            "fcmp".cyan(),
            predicate.to_string().cyan(),
            operand(*lhs),
            operand(*rhs)
        ),
        Instruction::Logical {
            operator,
            destination,
            lhs,
            rhs,
        } => write!(
            f,
            "{destination} {} {} {i1} {lhs}, {rhs}",
            "=".white(),
            operator.to_string().cyan()
        ),
        Instruction::Widen {
            destination,
            operand,
        } => write!(
            f,
            "{destination} {} {} {i1} {operand} {} {float}",
            "=".white(),
            "uitofp".cyan(),
            "to".cyan()
        ),
        Instruction::Branch {
            condition,
            positive,
            negative,
        } => write!(
            f,
            "{} {i1} {condition}, {} {}, {} {}",
            "br".cyan(),
            "label".yellow(),
            format!("%{}", function.blocks[*positive].name()).blue(),
            "label".yellow(),
            format!("%{}", function.blocks[*negative].name()).blue()
        ),
        Instruction::Jump { destination } => write!(
            f,
            "{} {} {}",
            "br".cyan(),
            "label".yellow(),
            format!("%{}", function.blocks[*destination].name()).blue()
        ),
        Instruction::Return { value } => {
            write!(f, "{} {float} {}", "ret".cyan(), operand(*value))
        }
    }
}

fn operand(operand: Operand) -> String {
    match operand {
        Operand::Constant(value) => format_float(value).purple().to_string(),
        Operand::Value(id) => id.to_string(),
    }
}

fn slot_name(function: &Function, slot: SlotId) -> String {
    symbol_name('%', &format!("{}.addr", function.slots[slot].name))
}

/// Formats an identifier behind `sigil`, quoting it when it contains
/// characters LLVM does not accept in a bare name
fn symbol_name(sigil: char, name: &str) -> String {
    let is_bare = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '$' | '.' | '_'));

    if is_bare {
        format!("{sigil}{name}")
    } else {
        format!("{sigil}{}", quoted_string(name))
    }
}

/// LLVM string literal. Quotes, backslashes and non-printable bytes become
/// `\XX` escapes.
fn quoted_string(text: &str) -> String {
    let mut quoted = String::from("\"");
    for byte in text.bytes() {
        if byte == b'"' || byte == b'\\' || !(0x20..0x7f).contains(&byte) {
            let _ = write!(quoted, "\\{byte:02X}");
        } else {
            quoted.push(byte as char);
        }
    }
    quoted.push('"');
    quoted
}

/// Formats a `float` constant. Integral values whose short decimal exponent
/// form reads back to the same bits use it, everything else the 64 bit
/// hexadecimal form, which LLVM reads back exactly.
pub fn format_float(value: f32) -> String {
    let value = f64::from(value);

    if value.is_finite() && value.fract() == 0.0 {
        let decimal = format!("{value:.6e}");
        if decimal.parse::<f64>().map(f64::to_bits) == Ok(value.to_bits()) {
            return decimal;
        }
    }

    format!("0x{:016X}", value.to_bits())
}
