//! The code generator: a visitor over the optimized AST that emits a
//! textual stack-machine assembly listing, one instruction per line.
//!
//! The generator never produces a control-flow graph or any other
//! intermediate form — it walks `svmc_ast::Program` directly and pushes
//! lines onto an output buffer as it goes.

use svmc_ast::{Block, Comparison, Expr, ExprKind, FunctionDefinition, Program, Stmt, StmtKind};
use svmc_lex::{BinOpKind, CompOpKind, UnOpKind};
use svmc_sem::{FunctionTable, FunctionTarget, ReturnKind, VariableScope, VARIABLE_SIZE};
use svmc_util::{CompileError, CompileResult, Interner, Origin, Symbol};

/// Lowers an optimized program to stack-machine assembly text.
///
/// Function registration happens in two passes: every function's name and
/// arity is recorded before any body is lowered, so a function may call one
/// declared later in the source (including itself, and mutual recursion).
pub fn generate(program: &Program, interner: &mut Interner) -> CompileResult<String> {
    let mut gen = Generator::new(interner);
    gen.emit_entry();
    gen.register_functions(program)?;
    for function in &program.functions {
        gen.lower_function(function)?;
    }
    gen.verify_main_exists()?;
    Ok(gen.finish())
}

struct Generator<'a> {
    interner: &'a mut Interner,
    functions: FunctionTable,
    scope: VariableScope,
    output: Vec<String>,
    label_counter: u32,
}

impl<'a> Generator<'a> {
    fn new(interner: &'a mut Interner) -> Self {
        let functions = FunctionTable::with_builtins(interner);
        Self {
            interner,
            functions,
            scope: VariableScope::new(),
            output: Vec::new(),
            label_counter: 0,
        }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    fn next_label(&mut self) -> String {
        let label = format!("L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn finish(self) -> String {
        let mut text = self.output.join("\n");
        text.push('\n');
        text
    }

    fn emit_entry(&mut self) {
        self.emit("PUSH 0");
        self.emit("POP AX");
        self.emit("CALL main");
        self.emit("HLT");
    }

    fn register_functions(&mut self, program: &Program) -> CompileResult<()> {
        for function in &program.functions {
            self.functions.declare(
                function.name,
                function.params.len(),
                function.origin,
                self.interner,
            )?;
        }
        Ok(())
    }

    fn verify_main_exists(&mut self) -> CompileResult<()> {
        let main = self.interner.intern("main");
        match self.functions.lookup(main) {
            Some(symbol) if symbol.arity == 0 => Ok(()),
            _ => Err(CompileError::syntax(
                Origin::DUMMY,
                "program must declare a zero-argument function named `main`",
            )),
        }
    }

    fn lower_function(&mut self, function: &FunctionDefinition) -> CompileResult<()> {
        let label = self.interner.resolve(function.name).to_string();
        self.emit(format!("{label}:"));
        self.scope.enter_function();
        self.emit("PUSH AX");
        self.lower_params(&function.params)?;
        for stmt in &function.body.statements {
            self.lower_stmt(stmt)?;
        }
        self.emit("POP AX");
        self.emit("PUSH 0");
        self.emit("RET");
        Ok(())
    }

    fn lower_params(&mut self, params: &[svmc_ast::Variable]) -> CompileResult<()> {
        if params.is_empty() {
            return Ok(());
        }
        self.emit("POP CX");
        for param in params {
            self.scope.declare(param.name, param.origin, self.interner)?;
            self.emit("POP [AX]");
            self.advance_ax();
        }
        self.emit("PUSH CX");
        Ok(())
    }

    fn advance_ax(&mut self) {
        self.emit("PUSH AX");
        self.emit(format!("PUSH {VARIABLE_SIZE}"));
        self.emit("ADD");
        self.emit("POP AX");
    }

    fn lower_block(&mut self, block: &Block) -> CompileResult<()> {
        self.scope.enter_block();
        for stmt in &block.statements {
            self.lower_stmt(stmt)?;
        }
        let inner_next = self.scope.next_local_address();
        self.scope.exit_block();
        let outer_next = self.scope.next_local_address();
        self.retreat_ax(inner_next - outer_next);
        Ok(())
    }

    /// Gives back the frame space the block just exited claimed, so `AX`
    /// tracks `next_local_address` again. A no-op (emits nothing) when the
    /// block declared no locals.
    fn retreat_ax(&mut self, delta: u32) {
        if delta == 0 {
            return;
        }
        self.emit("PUSH AX");
        self.emit(format!("PUSH {delta}"));
        self.emit("SUB");
        self.emit("POP AX");
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let yields = self.expr_yields_value(expr)?;
                self.lower_expr(expr)?;
                if yields {
                    self.emit("POP");
                }
            }
            StmtKind::Assignment { target, value } => {
                self.lower_expr(value)?;
                match self.scope.lookup(target.name).copied() {
                    Some(symbol) => self.emit_store(symbol.address),
                    None => {
                        self.scope.declare(target.name, target.origin, self.interner)?;
                        self.emit("POP [AX]");
                        self.advance_ax();
                    }
                }
            }
            StmtKind::VariableDeclaration { target, initializer } => match initializer {
                Some(expr) => {
                    self.lower_expr(expr)?;
                    self.scope.declare(target.name, target.origin, self.interner)?;
                    self.emit("POP [AX]");
                    self.advance_ax();
                }
                None => {
                    self.scope.declare(target.name, target.origin, self.interner)?;
                    self.advance_ax();
                }
            },
            StmtKind::Block(block) => self.lower_block(block)?,
            StmtKind::If { cond, body } => {
                let end_label = self.next_label();
                self.lower_negated_jump(cond, &end_label)?;
                self.lower_block(body)?;
                self.emit(format!("{end_label}:"));
            }
            StmtKind::IfElse { cond, then_body, else_body } => {
                let else_label = self.next_label();
                let end_label = self.next_label();
                self.lower_negated_jump(cond, &else_label)?;
                self.lower_block(then_body)?;
                self.emit(format!("JMP {end_label}"));
                self.emit(format!("{else_label}:"));
                self.lower_block(else_body)?;
                self.emit(format!("{end_label}:"));
            }
            StmtKind::While { cond, body } => {
                let start_label = self.next_label();
                let end_label = self.next_label();
                self.emit(format!("{start_label}:"));
                self.lower_negated_jump(cond, &end_label)?;
                self.lower_block(body)?;
                self.emit(format!("JMP {start_label}"));
                self.emit(format!("{end_label}:"));
            }
            StmtKind::Return(expr) => {
                let yields = self.expr_yields_value(expr)?;
                self.lower_expr(expr)?;
                if yields {
                    self.emit("POP BX");
                    self.emit("POP AX");
                    self.emit("PUSH BX");
                } else {
                    self.emit("POP AX");
                }
                self.emit("RET");
            }
        }
        Ok(())
    }

    fn lower_negated_jump(&mut self, cond: &Comparison, target_label: &str) -> CompileResult<()> {
        self.lower_expr(&cond.left)?;
        self.lower_expr(&cond.right)?;
        self.emit(format!("{} {target_label}", jump_mnemonic(cond.op.negate())));
        Ok(())
    }

    fn lower_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Number(value) => self.emit(format!("PUSH {value}")),
            ExprKind::Variable(name) => self.lower_variable_load(*name, expr.origin)?,
            ExprKind::BinOp(op, left, right) => {
                self.lower_expr(left)?;
                self.lower_expr(right)?;
                self.emit(match op {
                    BinOpKind::Add => "ADD",
                    BinOpKind::Sub => "SUB",
                    BinOpKind::Mul => "MUL",
                    BinOpKind::Div => "DIV",
                });
            }
            ExprKind::UnOp(UnOpKind::Plus, operand) => self.lower_expr(operand)?,
            ExprKind::UnOp(UnOpKind::Neg, operand) => {
                self.lower_expr(operand)?;
                self.emit("PUSH -1");
                self.emit("MUL");
            }
            ExprKind::Call(name, args) => self.lower_call(*name, args, expr.origin)?,
        }
        Ok(())
    }

    fn lower_variable_load(&mut self, name: Symbol, origin: Origin) -> CompileResult<()> {
        let address = self.scope.lookup(name).map(|symbol| symbol.address).ok_or_else(|| {
            CompileError::syntax(
                origin,
                format!("undeclared variable `{}`", self.interner.resolve(name)),
            )
        })?;
        self.emit_load(address);
        Ok(())
    }

    fn emit_load(&mut self, address: u32) {
        let offset = self.scope.next_local_address() - address;
        if offset == 0 {
            self.emit("PUSH [AX]");
        } else {
            self.emit("PUSH AX");
            self.emit(format!("PUSH {offset}"));
            self.emit("SUB");
            self.emit("POP BX");
            self.emit("PUSH [BX]");
        }
    }

    fn emit_store(&mut self, address: u32) {
        let offset = self.scope.next_local_address() - address;
        if offset == 0 {
            self.emit("POP [AX]");
        } else {
            self.emit("PUSH AX");
            self.emit(format!("PUSH {offset}"));
            self.emit("SUB");
            self.emit("POP BX");
            self.emit("POP [BX]");
        }
    }

    fn lower_call(&mut self, name: Symbol, args: &[Expr], origin: Origin) -> CompileResult<()> {
        let symbol = *self.functions.lookup(name).ok_or_else(|| {
            CompileError::syntax(
                origin,
                format!("call to undeclared function `{}`", self.interner.resolve(name)),
            )
        })?;
        if symbol.arity != args.len() {
            return Err(CompileError::syntax(
                origin,
                format!(
                    "`{}` expects {} argument(s), got {}",
                    self.interner.resolve(name),
                    symbol.arity,
                    args.len()
                ),
            ));
        }
        for arg in args.iter().rev() {
            self.lower_expr(arg)?;
        }
        match symbol.target {
            FunctionTarget::Internal(opcode) => self.emit(opcode),
            FunctionTarget::Label(label) => {
                let label = self.interner.resolve(label).to_string();
                self.emit(format!("CALL {label}"));
            }
        }
        Ok(())
    }

    /// Whether evaluating `expr` leaves a value on the operand stack — true
    /// for everything except a call to a `void`-returning built-in.
    fn expr_yields_value(&self, expr: &Expr) -> CompileResult<bool> {
        match &expr.kind {
            ExprKind::Call(name, _) => {
                let symbol = self.functions.lookup(*name).ok_or_else(|| {
                    CompileError::syntax(
                        expr.origin,
                        format!("call to undeclared function `{}`", self.interner.resolve(*name)),
                    )
                })?;
                Ok(symbol.return_kind == ReturnKind::Number)
            }
            _ => Ok(true),
        }
    }
}

fn jump_mnemonic(op: CompOpKind) -> &'static str {
    match op {
        CompOpKind::Lt => "JMPL",
        CompOpKind::Le => "JMPLE",
        CompOpKind::Gt => "JMPG",
        CompOpKind::Ge => "JMPGE",
        CompOpKind::Eq => "JMPE",
        CompOpKind::Ne => "JMPNE",
    }
}
