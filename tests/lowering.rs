use flowc::{
    ast::{BinaryOperatorKind::*, Block, build::*},
    codegen::{CodegenOptions, lower_program},
    ir::{
        BlockLabel, Function, Instruction, Operand,
        eval::{DEFAULT_STEP_LIMIT, Execution, evaluate},
        pretty_print::to_llvm_text,
    },
};
use indoc::indoc;

fn lower(root: &Block) -> Function {
    let module = lower_program(root, &CodegenOptions::default()).unwrap();
    module.functions.into_iter().next().unwrap()
}

fn run(root: &Block) -> Execution {
    evaluate(&lower(root), DEFAULT_STEP_LIMIT).unwrap()
}

fn block_of(function: &Function, label: BlockLabel) -> &flowc::ir::Block {
    function.blocks.iter().find(|b| b.label == label).unwrap()
}

fn concrete_scenario() -> Block {
    // x = 1.0 + 2.0; if (x > 2.0) { y = 1.0 } else { y = 0.0 }
    block([
        assign_stmt("x", binop_expr(Add, float_expr(1.0), float_expr(2.0))),
        if_stmt(
            binop_expr(GreaterThan, id_expr("x"), float_expr(2.0)),
            block([assign_stmt("y", float_expr(1.0))]),
            Some(block([assign_stmt("y", float_expr(0.0))])),
        ),
    ])
}

#[test]
fn concrete_scenario_takes_the_then_branch() {
    let function = lower(&concrete_scenario());
    let execution = evaluate(&function, DEFAULT_STEP_LIMIT).unwrap();

    let then_block = block_of(&function, BlockLabel::Then).id;
    let else_block = block_of(&function, BlockLabel::Else);
    let merge = block_of(&function, BlockLabel::IfCont).id;

    assert_eq!(
        execution.stores,
        vec![("x".to_string(), 3.0), ("y".to_string(), 1.0)]
    );
    assert!(execution.visited.contains(&then_block));
    assert!(!execution.visited.contains(&else_block.id));
    assert_eq!(execution.visited.last(), Some(&merge));

    // The else branch is still emitted
    let y = function.slot_named("y").unwrap();
    assert_eq!(
        else_block.instructions[0],
        Instruction::Store {
            slot: y,
            value: Operand::ZERO
        }
    );
    assert_eq!(execution.return_value, 0.0);
}

#[test]
fn prints_llvm_ir() {
    let mut program = concrete_scenario();
    program
        .statements
        .push(assign_stmt("return_value", id_expr("y")));

    let module = lower_program(&program, &CodegenOptions::default()).unwrap();

    assert_eq!(
        to_llvm_text(&module),
        indoc! {r#"
            ; ModuleID = 'flow'
            source_filename = "flow"

            define float @main() {
            entry:
              %x.addr = alloca float
              %y.addr = alloca float
              %return_value.addr = alloca float
              store float 0.000000e0, ptr %return_value.addr
              %t0 = fadd float 1.000000e0, 2.000000e0
              store float %t0, ptr %x.addr
              %t1 = load float, ptr %x.addr
              %t2 = fcmp ogt float %t1, 2.000000e0
              %t3 = uitofp i1 %t2 to float
              %t4 = fcmp one float %t3, 0.000000e0
              br i1 %t4, label %then1, label %else2

            then1:  ; preds = %entry
              store float 1.000000e0, ptr %y.addr
              br label %ifcont3

            else2:  ; preds = %entry
              store float 0.000000e0, ptr %y.addr
              br label %ifcont3

            ifcont3:  ; preds = %then1, %else2
              %t5 = load float, ptr %y.addr
              store float %t5, ptr %return_value.addr
              %t6 = load float, ptr %return_value.addr
              ret float %t6
            }
        "#}
    );
}

#[test]
fn variable_round_trip() {
    let execution = run(&block([
        assign_stmt("x", float_expr(2.0)),
        assign_stmt("return_value", id_expr("x")),
    ]));

    assert_eq!(execution.return_value, 2.0);
}

#[test]
fn later_assignment_wins() {
    let execution = run(&block([
        assign_stmt("x", float_expr(1.0)),
        assign_stmt("x", float_expr(2.0)),
        assign_stmt("return_value", id_expr("x")),
    ]));

    assert_eq!(execution.variable("x"), Some(2.0));
    assert_eq!(execution.return_value, 2.0);
}

#[test]
fn int_and_float_literals_agree() {
    let execution = run(&block([assign_stmt(
        "return_value",
        binop_expr(Equals, int_expr(3), float_expr(3.0)),
    )]));

    assert_eq!(execution.return_value, 1.0);
}

#[test]
fn unassigned_return_variable_yields_zero() {
    let execution = run(&block([assign_stmt("x", int_expr(5))]));

    assert_eq!(execution.return_value, 0.0);
}

#[test]
fn return_variable_assigned_on_a_path_not_taken() {
    let execution = run(&block([if_stmt(
        bool_expr(false),
        block([assign_stmt("return_value", int_expr(9))]),
        None,
    )]));

    assert_eq!(execution.return_value, 0.0);
}

#[test]
fn counting_loop() {
    // i = 0; while (i < 10) { i = i + 1 }; return_value = i * 2
    let execution = run(&block([
        assign_stmt("i", int_expr(0)),
        while_stmt(
            binop_expr(LessThan, id_expr("i"), int_expr(10)),
            block([assign_stmt("i", binop_expr(Add, id_expr("i"), int_expr(1)))]),
        ),
        assign_stmt("return_value", binop_expr(Multiply, id_expr("i"), int_expr(2))),
    ]));

    assert_eq!(execution.return_value, 20.0);
}

#[test]
fn loop_that_never_runs() {
    let execution = run(&block([
        assign_stmt("x", int_expr(1)),
        while_stmt(bool_expr(false), block([assign_stmt("x", int_expr(2))])),
        assign_stmt("return_value", id_expr("x")),
    ]));

    assert_eq!(execution.return_value, 1.0);
}

#[test]
fn nested_break_leaves_only_the_inner_loop() {
    // i = 0; total = 0;
    // while (i < 3) {
    //     j = 0;
    //     while (true) { j = j + 1; if (j >= 2) { break }; total = total + 1 }
    //     i = i + 1
    // }
    // return_value = total
    let execution = run(&block([
        assign_stmt("i", int_expr(0)),
        assign_stmt("total", int_expr(0)),
        while_stmt(
            binop_expr(LessThan, id_expr("i"), int_expr(3)),
            block([
                assign_stmt("j", int_expr(0)),
                while_stmt(
                    bool_expr(true),
                    block([
                        assign_stmt("j", binop_expr(Add, id_expr("j"), int_expr(1))),
                        if_stmt(
                            binop_expr(GreaterThanOrEqualTo, id_expr("j"), int_expr(2)),
                            block([break_stmt()]),
                            None,
                        ),
                        assign_stmt("total", binop_expr(Add, id_expr("total"), int_expr(1))),
                    ]),
                ),
                assign_stmt("i", binop_expr(Add, id_expr("i"), int_expr(1))),
            ]),
        ),
        assign_stmt("return_value", id_expr("total")),
    ]));

    assert_eq!(execution.variable("i"), Some(3.0));
    assert_eq!(execution.variable("j"), Some(2.0));
    assert_eq!(execution.return_value, 3.0);
}

#[test]
fn statements_after_break_never_run() {
    let execution = run(&block([
        assign_stmt("x", int_expr(1)),
        while_stmt(
            bool_expr(true),
            block([break_stmt(), assign_stmt("x", int_expr(2))]),
        ),
        assign_stmt("return_value", id_expr("x")),
    ]));

    assert_eq!(execution.return_value, 1.0);
}

#[test]
fn logical_operators_are_eager() {
    let execution = run(&block([
        assign_stmt("a", binop_expr(LogicalOr, int_expr(0), float_expr(2.5))),
        assign_stmt("b", binop_expr(LogicalAnd, int_expr(1), int_expr(0))),
        assign_stmt("return_value", binop_expr(Add, id_expr("a"), id_expr("b"))),
    ]));

    assert_eq!(execution.variable("a"), Some(1.0));
    assert_eq!(execution.variable("b"), Some(0.0));
    assert_eq!(execution.return_value, 1.0);
}

#[test]
fn nested_blocks_share_one_scope() {
    let execution = run(&block([
        flowc::ast::Statement::Block(block([assign_stmt("x", int_expr(4))])),
        assign_stmt("return_value", id_expr("x")),
    ]));

    assert_eq!(execution.return_value, 4.0);
}

#[test]
fn division_follows_float_semantics() {
    let execution = run(&block([
        assign_stmt("return_value", binop_expr(Divide, int_expr(7), int_expr(2))),
        assign_stmt("inf", binop_expr(Divide, int_expr(1), int_expr(0))),
    ]));

    assert_eq!(execution.return_value, 3.5);
    assert_eq!(execution.variable("inf"), Some(f32::INFINITY));
}

#[test]
fn large_integer_literals_reach_the_ir_text_intact() {
    let root = block([assign_stmt("return_value", int_expr(12_345_678))]);
    let module = lower_program(&root, &CodegenOptions::default()).unwrap();

    let text = to_llvm_text(&module);

    assert!(text.contains("store float 0x41678C29C0000000, ptr %return_value.addr"));
    assert!(!text.contains("1.234568e7"));
    assert_eq!(run(&root).return_value, 12_345_678.0);
}
