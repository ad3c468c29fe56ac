//! The three tree-rewriting passes and their composition.
//!
//! Each pass walks the whole AST once. Unary-plus elision and double-
//! negation collapse run pre-order (a rewrite at the root must happen
//! before descending, or it would race with an ancestor's own rewrite);
//! the composite trivial-operations/constant-folding pass runs post-order
//! (it needs children already simplified before it can recognize an
//! identity or fold a constant).

use svmc_ast::{Block, Comparison, Expr, ExprKind, FunctionDefinition, Program, Stmt, StmtKind};
use svmc_lex::{BinOpKind, UnOpKind};
use svmc_util::Origin;

const TOLERANCE: f64 = 1e-9;

fn near(value: f64, target: f64) -> bool {
    (value - target).abs() < TOLERANCE
}

/// Runs the default pipeline: unary-plus elision, then double-negation
/// collapse, then the composite trivial-operations/constant-folding pass.
pub fn optimize(program: Program) -> Program {
    let functions = program
        .functions
        .into_iter()
        .map(optimize_function)
        .collect();
    Program { functions }
}

fn optimize_function(func: FunctionDefinition) -> FunctionDefinition {
    let mut body = func.body;
    body = elide_unary_plus_block(body);
    body = collapse_double_negation_block(body);
    body = fold_trivial_block(body);
    FunctionDefinition { body, ..func }
}

// -- pass 1: unary-plus elision (pre-order, repeat to fixpoint at each node) --

fn elide_unary_plus_expr(expr: Expr) -> Expr {
    let mut expr = expr;
    loop {
        match expr.kind {
            ExprKind::UnOp(UnOpKind::Plus, inner) => {
                expr = *inner;
            }
            _ => break,
        }
    }
    let origin = expr.origin;
    let kind = match expr.kind {
        ExprKind::BinOp(op, l, r) => ExprKind::BinOp(
            op,
            Box::new(elide_unary_plus_expr(*l)),
            Box::new(elide_unary_plus_expr(*r)),
        ),
        ExprKind::UnOp(op, inner) => ExprKind::UnOp(op, Box::new(elide_unary_plus_expr(*inner))),
        ExprKind::Call(name, args) => {
            ExprKind::Call(name, args.into_iter().map(elide_unary_plus_expr).collect())
        }
        other => other,
    };
    Expr { kind, origin }
}

fn elide_unary_plus_comparison(cmp: Comparison) -> Comparison {
    Comparison {
        left: elide_unary_plus_expr(cmp.left),
        right: elide_unary_plus_expr(cmp.right),
        ..cmp
    }
}

fn elide_unary_plus_stmt(stmt: Stmt) -> Stmt {
    let origin = stmt.origin;
    let kind = match stmt.kind {
        StmtKind::Expr(e) => StmtKind::Expr(elide_unary_plus_expr(e)),
        StmtKind::Assignment { target, value } => StmtKind::Assignment {
            target,
            value: elide_unary_plus_expr(value),
        },
        StmtKind::VariableDeclaration { target, initializer } => StmtKind::VariableDeclaration {
            target,
            initializer: initializer.map(elide_unary_plus_expr),
        },
        StmtKind::Block(b) => StmtKind::Block(elide_unary_plus_block(b)),
        StmtKind::If { cond, body } => StmtKind::If {
            cond: elide_unary_plus_comparison(cond),
            body: elide_unary_plus_block(body),
        },
        StmtKind::IfElse { cond, then_body, else_body } => StmtKind::IfElse {
            cond: elide_unary_plus_comparison(cond),
            then_body: elide_unary_plus_block(then_body),
            else_body: elide_unary_plus_block(else_body),
        },
        StmtKind::While { cond, body } => StmtKind::While {
            cond: elide_unary_plus_comparison(cond),
            body: elide_unary_plus_block(body),
        },
        StmtKind::Return(e) => StmtKind::Return(elide_unary_plus_expr(e)),
    };
    Stmt { kind, origin }
}

fn elide_unary_plus_block(block: Block) -> Block {
    Block {
        statements: block.statements.into_iter().map(elide_unary_plus_stmt).collect(),
        origin: block.origin,
    }
}

// -- pass 2: double-negation collapse (pre-order, repeat to fixpoint) --------

fn is_negation(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::UnOp(UnOpKind::Neg, _))
}

fn collapse_double_negation_expr(expr: Expr) -> Expr {
    let mut expr = expr;
    loop {
        match expr.kind {
            ExprKind::UnOp(UnOpKind::Neg, inner) if is_negation(&inner) => {
                let ExprKind::UnOp(UnOpKind::Neg, innermost) = inner.kind else {
                    unreachable!()
                };
                expr = *innermost;
            }
            _ => break,
        }
    }
    let origin = expr.origin;
    let kind = match expr.kind {
        ExprKind::BinOp(op, l, r) => ExprKind::BinOp(
            op,
            Box::new(collapse_double_negation_expr(*l)),
            Box::new(collapse_double_negation_expr(*r)),
        ),
        ExprKind::UnOp(op, inner) => {
            ExprKind::UnOp(op, Box::new(collapse_double_negation_expr(*inner)))
        }
        ExprKind::Call(name, args) => ExprKind::Call(
            name,
            args.into_iter().map(collapse_double_negation_expr).collect(),
        ),
        other => other,
    };
    Expr { kind, origin }
}

fn collapse_double_negation_comparison(cmp: Comparison) -> Comparison {
    Comparison {
        left: collapse_double_negation_expr(cmp.left),
        right: collapse_double_negation_expr(cmp.right),
        ..cmp
    }
}

fn collapse_double_negation_stmt(stmt: Stmt) -> Stmt {
    let origin = stmt.origin;
    let kind = match stmt.kind {
        StmtKind::Expr(e) => StmtKind::Expr(collapse_double_negation_expr(e)),
        StmtKind::Assignment { target, value } => StmtKind::Assignment {
            target,
            value: collapse_double_negation_expr(value),
        },
        StmtKind::VariableDeclaration { target, initializer } => StmtKind::VariableDeclaration {
            target,
            initializer: initializer.map(collapse_double_negation_expr),
        },
        StmtKind::Block(b) => StmtKind::Block(collapse_double_negation_block(b)),
        StmtKind::If { cond, body } => StmtKind::If {
            cond: collapse_double_negation_comparison(cond),
            body: collapse_double_negation_block(body),
        },
        StmtKind::IfElse { cond, then_body, else_body } => StmtKind::IfElse {
            cond: collapse_double_negation_comparison(cond),
            then_body: collapse_double_negation_block(then_body),
            else_body: collapse_double_negation_block(else_body),
        },
        StmtKind::While { cond, body } => StmtKind::While {
            cond: collapse_double_negation_comparison(cond),
            body: collapse_double_negation_block(body),
        },
        StmtKind::Return(e) => StmtKind::Return(collapse_double_negation_expr(e)),
    };
    Stmt { kind, origin }
}

fn collapse_double_negation_block(block: Block) -> Block {
    Block {
        statements: block
            .statements
            .into_iter()
            .map(collapse_double_negation_stmt)
            .collect(),
        origin: block.origin,
    }
}

// -- pass 3: trivial addition/multiplication + constant folding (post-order) -

fn fold_trivial_expr(expr: Expr) -> Expr {
    let origin = expr.origin;
    let kind = match expr.kind {
        ExprKind::BinOp(op, l, r) => {
            let l = fold_trivial_expr(*l);
            let r = fold_trivial_expr(*r);
            return fold_binary(op, l, r, origin);
        }
        ExprKind::UnOp(op, inner) => {
            let inner = fold_trivial_expr(*inner);
            return fold_unary(op, inner, origin);
        }
        ExprKind::Call(name, args) => {
            ExprKind::Call(name, args.into_iter().map(fold_trivial_expr).collect())
        }
        other => other,
    };
    Expr { kind, origin }
}

fn fold_binary(op: BinOpKind, left: Expr, right: Expr, origin: Origin) -> Expr {
    // Trivial addition: `0 + x` -> x, `x + 0` -> x.
    if op == BinOpKind::Add {
        if let ExprKind::Number(n) = left.kind {
            if near(n, 0.0) {
                return Expr { kind: right.kind, origin };
            }
        }
        if let ExprKind::Number(n) = right.kind {
            if near(n, 0.0) {
                return Expr { kind: left.kind, origin };
            }
        }
    }
    // Trivial multiplication: `0 * x` / `x * 0` -> 0, `1 * x` / `x * 1` -> x.
    if op == BinOpKind::Mul {
        if let ExprKind::Number(n) = left.kind {
            if near(n, 0.0) {
                return Expr { kind: ExprKind::Number(0.0), origin };
            }
            if near(n, 1.0) {
                return Expr { kind: right.kind, origin };
            }
        }
        if let ExprKind::Number(n) = right.kind {
            if near(n, 0.0) {
                return Expr { kind: ExprKind::Number(0.0), origin };
            }
            if near(n, 1.0) {
                return Expr { kind: left.kind, origin };
            }
        }
    }
    // Constant folding: both operands numeric literals.
    if let (ExprKind::Number(l), ExprKind::Number(r)) = (&left.kind, &right.kind) {
        let value = match op {
            BinOpKind::Add => l + r,
            BinOpKind::Sub => l - r,
            BinOpKind::Mul => l * r,
            BinOpKind::Div => l / r,
        };
        return Expr { kind: ExprKind::Number(value), origin };
    }
    Expr {
        kind: ExprKind::BinOp(op, Box::new(left), Box::new(right)),
        origin,
    }
}

fn fold_unary(op: UnOpKind, operand: Expr, origin: Origin) -> Expr {
    if let ExprKind::Number(n) = operand.kind {
        let value = match op {
            UnOpKind::Plus => n,
            UnOpKind::Neg => -n,
        };
        return Expr { kind: ExprKind::Number(value), origin };
    }
    Expr {
        kind: ExprKind::UnOp(op, Box::new(operand)),
        origin,
    }
}

fn fold_trivial_comparison(cmp: Comparison) -> Comparison {
    Comparison {
        left: fold_trivial_expr(cmp.left),
        right: fold_trivial_expr(cmp.right),
        ..cmp
    }
}

fn fold_trivial_stmt(stmt: Stmt) -> Stmt {
    let origin = stmt.origin;
    let kind = match stmt.kind {
        StmtKind::Expr(e) => StmtKind::Expr(fold_trivial_expr(e)),
        StmtKind::Assignment { target, value } => StmtKind::Assignment {
            target,
            value: fold_trivial_expr(value),
        },
        StmtKind::VariableDeclaration { target, initializer } => StmtKind::VariableDeclaration {
            target,
            initializer: initializer.map(fold_trivial_expr),
        },
        StmtKind::Block(b) => StmtKind::Block(fold_trivial_block(b)),
        StmtKind::If { cond, body } => StmtKind::If {
            cond: fold_trivial_comparison(cond),
            body: fold_trivial_block(body),
        },
        StmtKind::IfElse { cond, then_body, else_body } => StmtKind::IfElse {
            cond: fold_trivial_comparison(cond),
            then_body: fold_trivial_block(then_body),
            else_body: fold_trivial_block(else_body),
        },
        StmtKind::While { cond, body } => StmtKind::While {
            cond: fold_trivial_comparison(cond),
            body: fold_trivial_block(body),
        },
        StmtKind::Return(e) => StmtKind::Return(fold_trivial_expr(e)),
    };
    Stmt { kind, origin }
}

fn fold_trivial_block(block: Block) -> Block {
    // Folding never crosses a `Block`'s own statement boundary: each
    // statement is folded independently, not merged with its neighbors.
    Block {
        statements: block.statements.into_iter().map(fold_trivial_stmt).collect(),
        origin: block.origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svmc_ast::Parser;
    use svmc_util::Interner;

    fn optimize_src(src: &str) -> Program {
        let mut interner = Interner::new();
        let tokens = svmc_lex::Lexer::new(src).tokenize(&mut interner).unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        optimize(program)
    }

    fn first_return_value(program: &Program) -> &Expr {
        match &program.functions[0].body.statements[0].kind {
            StmtKind::Return(e) => e,
            StmtKind::Expr(e) => e,
            other => panic!("expected an expr/return statement, got {other:?}"),
        }
    }

    #[test]
    fn constant_addition_folds() {
        let program = optimize_src("func main() { return 1 + 2; }");
        assert!(matches!(first_return_value(&program).kind, ExprKind::Number(n) if near(n, 3.0)));
    }

    #[test]
    fn unary_plus_is_elided() {
        let program = optimize_src("func main() { return +5; }");
        assert!(matches!(first_return_value(&program).kind, ExprKind::Number(n) if near(n, 5.0)));
    }

    #[test]
    fn double_negation_collapses() {
        let program = optimize_src("func main(n) { return -(-n); }");
        assert!(matches!(first_return_value(&program).kind, ExprKind::Variable(_)));
    }

    #[test]
    fn single_negation_is_preserved() {
        let program = optimize_src("func main(n) { return -n; }");
        assert!(matches!(first_return_value(&program).kind, ExprKind::UnOp(UnOpKind::Neg, _)));
    }

    #[test]
    fn trivial_addition_and_multiplication_simplify_around_a_variable() {
        let program = optimize_src("func main(x) { return (x + 0) * 1; }");
        assert!(matches!(first_return_value(&program).kind, ExprKind::Variable(_)));
    }

    #[test]
    fn folding_does_not_cross_a_block_boundary() {
        let program = optimize_src("func main() { { return 1 + 2; } return 3 + 4; }");
        let StmtKind::Block(inner) = &program.functions[0].body.statements[0].kind else {
            panic!("expected block");
        };
        assert!(matches!(
            inner.statements[0].kind,
            StmtKind::Return(Expr { kind: ExprKind::Number(n), .. }) if near(n, 3.0)
        ));
        assert!(matches!(
            program.functions[0].body.statements[1].kind,
            StmtKind::Return(Expr { kind: ExprKind::Number(n), .. }) if near(n, 7.0)
        ));
    }

    #[test]
    fn optimizer_is_idempotent() {
        let program = optimize_src(
            "func fib(n) { if (n <= 2) return 1; return fib(n - 1) + fib(n - 2); } func main() { return fib(7); }",
        );
        let twice = optimize(program.clone());
        assert_eq!(format!("{:?}", program), format!("{:?}", twice));
    }
}
