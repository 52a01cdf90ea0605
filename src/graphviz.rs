//! GraphViz rendering of the tree, for looking at what a producer built.
//!
//! Every node is named after the path leading to it from the root (`n0`),
//! e.g. `n0_1_cond_lhs` is the left operand of the condition of the second
//! statement. Leaves are drawn as boxes.

use std::fmt::Write;

use crate::ast::{Block, Expression, Statement};

pub fn render_graphviz(root: &Block) -> String {
    let mut renderer = Renderer::default();
    renderer.block(root, "n0");
    format!("digraph AST {{\n{}}}\n", renderer.output)
}

/// Escapes text for a quoted DOT label
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Default)]
struct Renderer {
    output: String,
}

impl Renderer {
    fn leaf(&mut self, name: &str, label: &str, sublabel: &str) {
        let sublabel = escape(sublabel);
        let _ = writeln!(self.output, "\t{name} [shape=box,label=\"{label}\\n{sublabel}\"];");
    }

    fn internal(&mut self, name: &str, label: &str, sublabel: Option<&str>) {
        let _ = match sublabel.map(escape) {
            Some(sublabel) => writeln!(self.output, "\t{name} [label=\"{label}\\n{sublabel}\"];"),
            None => writeln!(self.output, "\t{name} [label=\"{label}\"];"),
        };
    }

    fn edge(&mut self, tail: &str, head: &str, label: Option<&str>) {
        let _ = match label {
            Some(label) => writeln!(self.output, "\t{tail} -> {head} [taillabel=\"{label}\"];"),
            None => writeln!(self.output, "\t{tail} -> {head};"),
        };
    }

    /// Draws the edge from `parent` to `child` and then the subtree under it
    fn child(&mut self, parent: &str, suffix: &str, label: Option<&str>) -> String {
        let child = format!("{parent}_{suffix}");
        self.edge(parent, &child, label);
        child
    }

    fn block(&mut self, block: &Block, name: &str) {
        self.internal(name, "BLOCK", None);

        for (index, statement) in block.statements.iter().enumerate() {
            let child = self.child(name, &index.to_string(), None);
            self.statement(statement, &child);
        }
    }

    fn statement(&mut self, statement: &Statement, name: &str) {
        match statement {
            Statement::Assign { name: variable, value } => {
                self.internal(name, "ASSIGNMENT", Some(variable));
                let rhs = self.child(name, "rhs", None);
                self.expression(value, &rhs);
            }
            Statement::If {
                condition,
                positive,
                negative,
            } => {
                self.internal(name, "IF", None);

                let cond = self.child(name, "cond", Some("cond"));
                self.expression(condition, &cond);

                let then_block = self.child(name, "block", Some("if"));
                self.block(positive, &then_block);

                if let Some(negative) = negative {
                    let else_block = self.child(name, "else", Some("else"));
                    self.block(negative, &else_block);
                }
            }
            Statement::While { condition, body } => {
                self.internal(name, "WHILE", None);

                let cond = self.child(name, "cond", Some("cond"));
                self.expression(condition, &cond);

                let body_block = self.child(name, "block", None);
                self.block(body, &body_block);
            }
            Statement::Break => self.internal(name, "BREAK", None),
            Statement::Block(block) => self.block(block, name),
        }
    }

    fn expression(&mut self, expression: &Expression, name: &str) {
        match expression {
            Expression::Identifier { name: identifier } => {
                self.leaf(name, "IDENTIFIER", identifier)
            }
            Expression::Float { value } => self.leaf(name, "FLOAT", &format!("{value:.6}")),
            Expression::Integer { value } => self.leaf(name, "INTEGER", &value.to_string()),
            Expression::Boolean { value } => {
                self.leaf(name, "BOOLEAN", &u8::from(*value).to_string())
            }
            Expression::Binary { operator, lhs, rhs } => {
                self.internal(name, &operator.to_string(), None);

                let lhs_name = self.child(name, "lhs", None);
                self.expression(lhs, &lhs_name);

                let rhs_name = self.child(name, "rhs", None);
                self.expression(rhs, &rhs_name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::ast::{BinaryOperatorKind, build::*};

    #[test]
    fn renders_empty_program() {
        assert_eq!(
            render_graphviz(&block([])),
            "digraph AST {\n\tn0 [label=\"BLOCK\"];\n}\n"
        );
    }

    #[test]
    fn renders_assignment_and_if() {
        let root = block([
            assign_stmt(
                "x",
                binop_expr(BinaryOperatorKind::Add, float_expr(1.0), int_expr(2)),
            ),
            if_stmt(
                binop_expr(BinaryOperatorKind::GreaterThan, id_expr("x"), bool_expr(true)),
                block([break_stmt()]),
                Some(block([])),
            ),
        ]);

        assert_eq!(
            render_graphviz(&root),
            indoc! {r#"
                digraph AST {
                	n0 [label="BLOCK"];
                	n0 -> n0_0;
                	n0_0 [label="ASSIGNMENT\nx"];
                	n0_0 -> n0_0_rhs;
                	n0_0_rhs [label="PLUS"];
                	n0_0_rhs -> n0_0_rhs_lhs;
                	n0_0_rhs_lhs [shape=box,label="FLOAT\n1.000000"];
                	n0_0_rhs -> n0_0_rhs_rhs;
                	n0_0_rhs_rhs [shape=box,label="INTEGER\n2"];
                	n0 -> n0_1;
                	n0_1 [label="IF"];
                	n0_1 -> n0_1_cond [taillabel="cond"];
                	n0_1_cond [label="GT"];
                	n0_1_cond -> n0_1_cond_lhs;
                	n0_1_cond_lhs [shape=box,label="IDENTIFIER\nx"];
                	n0_1_cond -> n0_1_cond_rhs;
                	n0_1_cond_rhs [shape=box,label="BOOLEAN\n1"];
                	n0_1 -> n0_1_block [taillabel="if"];
                	n0_1_block [label="BLOCK"];
                	n0_1_block -> n0_1_block_0;
                	n0_1_block_0 [label="BREAK"];
                	n0_1 -> n0_1_else [taillabel="else"];
                	n0_1_else [label="BLOCK"];
                }
            "#}
        );
    }

    #[test]
    fn escapes_names_in_labels() {
        let root = block([assign_stmt(r#"a"b"#, id_expr(r"c\d"))]);

        let rendered = render_graphviz(&root);

        assert!(rendered.contains(r#"n0_0 [label="ASSIGNMENT\na\"b"];"#));
        assert!(rendered.contains(r#"n0_0_rhs [shape=box,label="IDENTIFIER\nc\\d"];"#));
    }

    #[test]
    fn renders_while() {
        let root = block([while_stmt(id_expr("go"), block([]))]);

        let rendered = render_graphviz(&root);

        assert!(rendered.contains("\tn0_0 [label=\"WHILE\"];\n"));
        assert!(rendered.contains("\tn0_0 -> n0_0_cond [taillabel=\"cond\"];\n"));
        assert!(rendered.contains("\tn0_0 -> n0_0_block;\n"));
    }
}
