//! Statement Executor
//!
//! Tree-walking execution engine. Walks the AST of one script, threading a
//! [`ControlSignal`] through every statement:
//! - loops consume `Breaking`/`Continuing`
//! - function calls and the top level consume `Returning`
//! - everything else propagates the signal upward unchanged
//!
//! Browser commands are dispatched synchronously through the [`Session`]
//! boundary. A `test` block runs with a fresh variable environment; on
//! failure a screenshot artifact is requested (fire-and-forget) and the
//! fault is wrapped with the test name.

use std::collections::HashMap;

use crate::ast::types::{ExportTarget, Expr, ForClauses, ScriptNode, Stmt, StmtKind};
use crate::commands::factory::create_command;
use crate::commands::types::{CommandType, LocatorType, Session};
use crate::interpreter::errors::{EvalError, RuntimeError};
use crate::interpreter::interpolate::interpolate;
use crate::interpreter::types::{
    ControlSignal, Environment, ExecutionLimits, FunctionDecl, InterpreterState, Value,
};

/// The execution engine for one script run.
pub struct Executor<'a> {
    pub state: InterpreterState,
    pub limits: ExecutionLimits,
    session: &'a mut dyn Session,
}

impl<'a> Executor<'a> {
    pub fn new(session: &'a mut dyn Session) -> Self {
        Self {
            state: InterpreterState::new(),
            limits: ExecutionLimits::default(),
            session,
        }
    }

    pub fn with_limits(session: &'a mut dyn Session, limits: ExecutionLimits) -> Self {
        Self {
            state: InterpreterState::new(),
            limits,
            session,
        }
    }

    /// Run a whole script: top-level statements in order, `test` blocks
    /// included. A top-level `return` stops the run quietly.
    pub fn run_script(&mut self, script: &ScriptNode) -> Result<(), RuntimeError> {
        self.hoist_functions(script);
        for stmt in &script.statements {
            let signal = self.execute(stmt)?;
            if self.top_level_stops(signal, stmt.line)? {
                break;
            }
        }
        Ok(())
    }

    /// Run one named `test` block: top-level declarations execute as usual,
    /// other `test` blocks are skipped.
    pub fn run_test(&mut self, script: &ScriptNode, test_name: &str) -> Result<(), RuntimeError> {
        self.hoist_functions(script);
        for stmt in &script.statements {
            if let StmtKind::Test { name, .. } = &stmt.kind {
                if name != test_name {
                    continue;
                }
            }
            let signal = self.execute(stmt)?;
            if self.top_level_stops(signal, stmt.line)? {
                break;
            }
        }
        Ok(())
    }

    /// Register every top-level function before execution starts, so calls
    /// may precede declarations in source order.
    fn hoist_functions(&mut self, script: &ScriptNode) {
        for stmt in &script.statements {
            if let StmtKind::Function { name, params, body } = &stmt.kind {
                self.state.functions.insert(
                    name.clone(),
                    FunctionDecl {
                        name: name.clone(),
                        params: params.clone(),
                        body: body.clone(),
                        line: stmt.line,
                    },
                );
            }
        }
    }

    /// A top-level `return` ends the run; stray loop signals are errors.
    fn top_level_stops(&self, signal: ControlSignal, line: usize) -> Result<bool, RuntimeError> {
        match signal {
            ControlSignal::Normal => Ok(false),
            ControlSignal::Returning(_) => Ok(true),
            ControlSignal::Breaking => {
                Err(EvalError::type_mismatch("'break' outside of a loop", line).into())
            }
            ControlSignal::Continuing => {
                Err(EvalError::type_mismatch("'continue' outside of a loop", line).into())
            }
        }
    }

    // ===========================================================================
    // STATEMENTS
    // ===========================================================================

    pub fn execute(&mut self, stmt: &Stmt) -> Result<ControlSignal, RuntimeError> {
        match &stmt.kind {
            StmtKind::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                self.state.env.define(name.clone(), value);
                Ok(ControlSignal::Normal)
            }

            StmtKind::Function { name, params, body } => {
                // Nested declarations register at execution; top-level ones
                // were already hoisted.
                self.state.functions.insert(
                    name.clone(),
                    FunctionDecl {
                        name: name.clone(),
                        params: params.clone(),
                        body: body.clone(),
                        line: stmt.line,
                    },
                );
                Ok(ControlSignal::Normal)
            }

            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let cond = self.evaluate(condition)?;
                let taken = match cond {
                    Value::Bool(b) => b,
                    other => {
                        return Err(EvalError::type_mismatch(
                            format!("if condition must be a boolean, got {}", other.type_name()),
                            condition.line,
                        )
                        .into());
                    }
                };
                if taken {
                    self.execute_block(then_body)
                } else if let Some(else_body) = else_body {
                    self.execute_block(else_body)
                } else {
                    Ok(ControlSignal::Normal)
                }
            }

            StmtKind::While { condition, body } => {
                let mut iterations: usize = 0;
                loop {
                    if !self.evaluate(condition)?.is_truthy() {
                        break;
                    }
                    self.bump_loop_counter(&mut iterations, stmt.line)?;
                    match self.execute_block(body)? {
                        ControlSignal::Normal | ControlSignal::Continuing => {}
                        ControlSignal::Breaking => break,
                        signal @ ControlSignal::Returning(_) => return Ok(signal),
                    }
                }
                Ok(ControlSignal::Normal)
            }

            StmtKind::For { clauses, body } => match clauses {
                ForClauses::Range { variable, range } => {
                    self.execute_range_for(variable, range, body, stmt.line)
                }
                ForClauses::CStyle {
                    init,
                    condition,
                    increment,
                } => self.execute_cstyle_for(
                    init.as_deref(),
                    condition.as_ref(),
                    increment.as_ref(),
                    body,
                    stmt.line,
                ),
            },

            StmtKind::Import { path, alias } => {
                let alias = alias.clone().unwrap_or_else(|| module_alias_of(path));
                self.state.modules.insert(alias, path.clone());
                Ok(ControlSignal::Normal)
            }

            StmtKind::Export(target) => {
                self.execute_export(target, stmt.line)?;
                Ok(ControlSignal::Normal)
            }

            StmtKind::Command {
                command,
                locator_type,
                args,
                named_args,
            } => {
                self.dispatch_command(*command, *locator_type, args, named_args, stmt.line)?;
                Ok(ControlSignal::Normal)
            }

            StmtKind::Block(statements) => self.execute_block(statements),

            StmtKind::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(ControlSignal::Normal)
            }

            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Ok(ControlSignal::Returning(value))
            }

            StmtKind::Break => Ok(ControlSignal::Breaking),
            StmtKind::Continue => Ok(ControlSignal::Continuing),

            StmtKind::Test { name, body } => self.execute_test(name, body, stmt.line),
        }
    }

    /// Execute statements in order; a non-normal signal stops the block and
    /// propagates to the enclosing construct.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt]) -> Result<ControlSignal, RuntimeError> {
        for stmt in statements {
            let signal = self.execute(stmt)?;
            if signal != ControlSignal::Normal {
                return Ok(signal);
            }
        }
        Ok(ControlSignal::Normal)
    }

    fn execute_range_for(
        &mut self,
        variable: &str,
        range: &Expr,
        body: &[Stmt],
        line: usize,
    ) -> Result<ControlSignal, RuntimeError> {
        let (start, end) = self.evaluate_range_bounds(range)?;

        let mut iterations: usize = 0;
        let mut i = start;
        while i <= end {
            self.bump_loop_counter(&mut iterations, line)?;
            self.state.env.define(variable.to_string(), Value::Int(i));
            match self.execute_block(body)? {
                ControlSignal::Normal | ControlSignal::Continuing => {}
                ControlSignal::Breaking => break,
                signal @ ControlSignal::Returning(_) => return Ok(signal),
            }
            // The upper bound may be i64::MAX; stepping past it must end the
            // loop, not overflow.
            i = match i.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(ControlSignal::Normal)
    }

    fn execute_cstyle_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &[Stmt],
        line: usize,
    ) -> Result<ControlSignal, RuntimeError> {
        if let Some(init) = init {
            self.execute(init)?;
        }

        let mut iterations: usize = 0;
        loop {
            if let Some(condition) = condition {
                if !self.evaluate(condition)?.is_truthy() {
                    break;
                }
            }
            self.bump_loop_counter(&mut iterations, line)?;
            match self.execute_block(body)? {
                ControlSignal::Normal | ControlSignal::Continuing => {}
                ControlSignal::Breaking => break,
                signal @ ControlSignal::Returning(_) => return Ok(signal),
            }
            if let Some(increment) = increment {
                self.evaluate(increment)?;
            }
        }
        Ok(ControlSignal::Normal)
    }

    fn execute_export(&mut self, target: &ExportTarget, line: usize) -> Result<(), RuntimeError> {
        match target {
            ExportTarget::All => {
                for (name, value) in self.state.env.iter() {
                    self.state.exports.values.insert(name.clone(), value.clone());
                }
                let functions: Vec<FunctionDecl> =
                    self.state.functions.values().cloned().collect();
                for decl in functions {
                    self.state.exports.functions.insert(decl.name.clone(), decl);
                }
                Ok(())
            }
            ExportTarget::Name(name) => {
                if let Some(value) = self.state.env.get(name) {
                    let value = value.clone();
                    self.state.exports.values.insert(name.clone(), value);
                    return Ok(());
                }
                if let Some(decl) = self.state.functions.get(name) {
                    let decl = decl.clone();
                    self.state.exports.functions.insert(name.clone(), decl);
                    return Ok(());
                }
                Err(EvalError::UndefinedVariable {
                    name: name.clone(),
                    line,
                }
                .into())
            }
        }
    }

    fn execute_test(
        &mut self,
        name: &str,
        body: &[Stmt],
        line: usize,
    ) -> Result<ControlSignal, RuntimeError> {
        // Each test starts from a fresh variable environment.
        let saved_env = std::mem::take(&mut self.state.env);
        let result = self.execute_block(body);
        self.state.env = saved_env;

        // `return` ends the test early; loop signals must not escape a body.
        let result = result.and_then(|signal| match signal {
            ControlSignal::Breaking => {
                Err(EvalError::type_mismatch("'break' outside of a loop", line).into())
            }
            ControlSignal::Continuing => {
                Err(EvalError::type_mismatch("'continue' outside of a loop", line).into())
            }
            _ => Ok(()),
        });

        match result {
            Ok(()) => {
                self.session.emit_log(&format!("test '{}' passed", name));
                Ok(ControlSignal::Normal)
            }
            Err(err) => {
                self.session.capture_failure_artifact(name);
                let assertion = matches!(err, RuntimeError::Assertion { .. });
                Err(RuntimeError::TestFailed {
                    name: name.to_string(),
                    message: err.to_string(),
                    assertion,
                })
            }
        }
    }

    // ===========================================================================
    // COMMAND DISPATCH
    // ===========================================================================

    fn dispatch_command(
        &mut self,
        command: CommandType,
        locator_type: Option<LocatorType>,
        args: &[Expr],
        named_args: &[(String, Expr)],
        line: usize,
    ) -> Result<(), RuntimeError> {
        let mut arg_strings = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.evaluate(arg)?;
            arg_strings.push(self.interpolated(&value.to_string(), arg.line)?);
        }

        let mut named = HashMap::new();
        for (name, expr) in named_args {
            let value = self.evaluate(expr)?;
            named.insert(name.clone(), self.interpolated(&value.to_string(), expr.line)?);
        }

        let browser_command = create_command(command, locator_type, arg_strings, &named, line)
            .map_err(|source| RuntimeError::command(source, line))?;
        browser_command.run(self.session)
    }

    fn interpolated(&self, input: &str, line: usize) -> Result<String, RuntimeError> {
        interpolate(input, &self.state.env).map_err(|name| {
            RuntimeError::from(EvalError::UndefinedVariable { name, line })
        })
    }

    // ===========================================================================
    // LIMITS AND HELPERS
    // ===========================================================================

    fn bump_loop_counter(&self, iterations: &mut usize, line: usize) -> Result<(), RuntimeError> {
        *iterations += 1;
        if *iterations > self.limits.max_loop_iterations {
            return Err(RuntimeError::Limit {
                message: format!(
                    "loop exceeded {} iterations",
                    self.limits.max_loop_iterations
                ),
                line,
            });
        }
        Ok(())
    }

    fn evaluate_range_bounds(&mut self, range: &Expr) -> Result<(i64, i64), RuntimeError> {
        use crate::ast::types::ExprKind;
        let (start, end) = match &range.kind {
            ExprKind::Range { start, end } => (start, end),
            _ => {
                return Err(EvalError::type_mismatch(
                    "for-in loop needs a range (start..end)",
                    range.line,
                )
                .into());
            }
        };
        let start = self.range_bound(start)?;
        let end = self.range_bound(end)?;
        Ok((start, end))
    }

    fn range_bound(&mut self, expr: &Expr) -> Result<i64, RuntimeError> {
        match self.evaluate(expr)? {
            Value::Int(i) => Ok(i),
            Value::Float(f) if f.fract() == 0.0 => Ok(f as i64),
            other => Err(EvalError::type_mismatch(
                format!("range bound must be an integer, got {}", other.type_name()),
                expr.line,
            )
            .into()),
        }
    }

    /// Call a user-defined function. The callee receives a copy of the
    /// caller's environment; mutations inside are invisible to the caller.
    pub(crate) fn call_function(
        &mut self,
        callee: &str,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let decl = match self.state.functions.get(callee) {
            Some(decl) => decl.clone(),
            None => {
                return Err(EvalError::UndefinedFunction {
                    name: callee.to_string(),
                    line,
                }
                .into());
            }
        };

        if args.len() != decl.params.len() {
            return Err(EvalError::ArityMismatch {
                name: decl.name,
                expected: decl.params.len(),
                actual: args.len(),
                line,
            }
            .into());
        }

        if self.state.call_depth >= self.limits.max_call_depth {
            return Err(RuntimeError::Limit {
                message: format!("call depth exceeded {}", self.limits.max_call_depth),
                line,
            });
        }

        let mut callee_env = self.state.env.clone();
        for (param, arg) in decl.params.iter().zip(args) {
            callee_env.define(param.clone(), arg);
        }

        let saved_env = std::mem::replace(&mut self.state.env, callee_env);
        self.state.call_depth += 1;

        let mut outcome = Ok(Value::Null);
        for stmt in &decl.body {
            match self.execute(stmt) {
                Ok(ControlSignal::Normal) => {}
                Ok(ControlSignal::Returning(value)) => {
                    outcome = Ok(value);
                    break;
                }
                Ok(ControlSignal::Breaking) => {
                    outcome = Err(EvalError::type_mismatch("'break' outside of a loop", line).into());
                    break;
                }
                Ok(ControlSignal::Continuing) => {
                    outcome =
                        Err(EvalError::type_mismatch("'continue' outside of a loop", line).into());
                    break;
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        self.state.call_depth -= 1;
        self.state.env = saved_env;
        outcome
    }
}

fn module_alias_of(path: &str) -> String {
    let stem = path.rsplit('/').next().unwrap_or(path);
    match stem.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base.to_string(),
        _ => stem.to_string(),
    }
}

/// Parse and execute a source string against a session. Parse diagnostics
/// are folded into a single error.
pub fn run_source(source: &str, session: &mut dyn Session) -> Result<(), RuntimeError> {
    let result = crate::parser::parse(source);
    if let Some(first) = result.errors.first() {
        return Err(EvalError::type_mismatch(first.to_string(), first.line).into());
    }
    Executor::new(session).run_script(&result.script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::types::CommandError;
    use crate::commands::types::Locator;
    use std::time::Duration;

    /// Records every command it receives; element interactions always succeed.
    #[derive(Default)]
    struct RecordingSession {
        journal: Vec<String>,
        logs: Vec<String>,
        screenshots: Vec<String>,
        url: String,
        text: String,
    }

    impl Session for RecordingSession {
        fn navigate(&mut self, url: &str) -> Result<(), CommandError> {
            self.url = url.to_string();
            self.journal.push(format!("open {}", url));
            Ok(())
        }
        fn back(&mut self) -> Result<(), CommandError> {
            self.journal.push("back".into());
            Ok(())
        }
        fn forward(&mut self) -> Result<(), CommandError> {
            self.journal.push("forward".into());
            Ok(())
        }
        fn refresh(&mut self) -> Result<(), CommandError> {
            self.journal.push("refresh".into());
            Ok(())
        }
        fn click(&mut self, locator: &Locator) -> Result<(), CommandError> {
            self.journal.push(format!("click {}", locator));
            Ok(())
        }
        fn double_click(&mut self, locator: &Locator) -> Result<(), CommandError> {
            self.journal.push(format!("doubleClick {}", locator));
            Ok(())
        }
        fn right_click(&mut self, locator: &Locator) -> Result<(), CommandError> {
            self.journal.push(format!("rightClick {}", locator));
            Ok(())
        }
        fn hover(&mut self, locator: &Locator) -> Result<(), CommandError> {
            self.journal.push(format!("hover {}", locator));
            Ok(())
        }
        fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), CommandError> {
            self.journal.push(format!("type {} {}", locator, text));
            Ok(())
        }
        fn clear(&mut self, locator: &Locator) -> Result<(), CommandError> {
            self.journal.push(format!("clear {}", locator));
            Ok(())
        }
        fn select_option(&mut self, locator: &Locator, option: &str) -> Result<(), CommandError> {
            self.journal.push(format!("select {} {}", locator, option));
            Ok(())
        }
        fn text_of(&mut self, _locator: &Locator) -> Result<String, CommandError> {
            Ok(self.text.clone())
        }
        fn is_visible(&mut self, _locator: &Locator) -> Result<bool, CommandError> {
            Ok(true)
        }
        fn current_url(&mut self) -> Result<String, CommandError> {
            Ok(self.url.clone())
        }
        fn switch_to_window(&mut self, handle: &str) -> Result<(), CommandError> {
            self.journal.push(format!("switchToWindow {}", handle));
            Ok(())
        }
        fn open_tab(&mut self, url: &str) -> Result<(), CommandError> {
            self.journal.push(format!("openTab {}", url));
            Ok(())
        }
        fn close_tab(&mut self) -> Result<(), CommandError> {
            self.journal.push("closeTab".into());
            Ok(())
        }
        fn wait_for(&mut self, locator: &Locator, _timeout: Duration) -> Result<(), CommandError> {
            self.journal.push(format!("wait {}", locator));
            Ok(())
        }
        fn emit_log(&mut self, message: &str) {
            self.logs.push(message.to_string());
        }
        fn capture_failure_artifact(&mut self, test_name: &str) {
            self.screenshots.push(test_name.to_string());
        }
    }

    fn run(source: &str) -> (RecordingSession, Result<(), RuntimeError>) {
        let mut session = RecordingSession::default();
        let result = run_source(source, &mut session);
        (session, result)
    }

    // ===========================================================================
    // VARIABLES AND ARITHMETIC
    // ===========================================================================

    #[test]
    fn test_arithmetic_and_log() {
        let (session, result) = run("set n = 2 * 3 + 1; log \"n is \" + n;");
        result.unwrap();
        assert_eq!(session.logs, vec!["n is 7"]);
    }

    #[test]
    fn test_division_produces_float() {
        let (session, result) = run("log 1 / 2;");
        result.unwrap();
        assert_eq!(session.logs, vec!["0.5"]);
    }

    #[test]
    fn test_division_by_zero_stops_the_script() {
        let (_, result) = run("log 5 / 0;");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_undefined_variable() {
        let (_, result) = run("log ghost;");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("undefined variable 'ghost'"));
    }

    #[test]
    fn test_reassignment_requires_declaration() {
        let (_, result) = run("x = 1;");
        assert!(result.unwrap_err().to_string().contains("undefined variable 'x'"));

        let (session, result) = run("set x = 1; x = x + 4; log x;");
        result.unwrap();
        assert_eq!(session.logs, vec!["5"]);
    }

    #[test]
    fn test_compound_assignment_and_postfix() {
        let (session, result) = run("set x = 10; x += 5; x--; log x++; log x;");
        result.unwrap();
        assert_eq!(session.logs, vec!["14", "15"]);
    }

    // ===========================================================================
    // CONTROL FLOW
    // ===========================================================================

    #[test]
    fn test_sequential_declarations_build_the_environment() {
        let result = crate::parser::parse("set x = 5; set y = x + 3;");
        assert!(result.errors.is_empty());
        let mut session = RecordingSession::default();
        let mut executor = Executor::new(&mut session);
        executor.run_script(&result.script).unwrap();
        assert_eq!(executor.state.env.get("x"), Some(&Value::Int(5)));
        assert_eq!(executor.state.env.get("y"), Some(&Value::Int(8)));
    }

    #[test]
    fn test_if_requires_boolean_condition() {
        let (_, result) = run("if 1 { log \"yes\"; }");
        assert!(result.unwrap_err().to_string().contains("must be a boolean"));

        let (session, result) = run("set x = 5; if x > 3 { log \"big\"; } else { log \"small\"; }");
        result.unwrap();
        assert_eq!(session.logs, vec!["big"]);
    }

    #[test]
    fn test_while_with_truthy_condition() {
        let (session, result) = run("set n = 3; while n { log n; n--; }");
        result.unwrap();
        assert_eq!(session.logs, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_range_for_is_inclusive() {
        let (session, result) = run("for i in 1..3 { log \"${i}\"; }");
        result.unwrap();
        assert_eq!(session.logs, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_range_for_ending_at_integer_max() {
        let (session, result) =
            run("for i in 9223372036854775806..9223372036854775807 { log \"x\"; }");
        result.unwrap();
        assert_eq!(session.logs, vec!["x", "x"]);
    }

    #[test]
    fn test_cstyle_for() {
        let (session, result) = run("for (set i = 0; i < 3; i++) { log i; }");
        result.unwrap();
        assert_eq!(session.logs, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_break_terminates_only_the_enclosing_loop() {
        let source = "
            for i in 1..2 {
                for j in 1..10 {
                    if j == 2 { break; }
                    log i + \"-\" + j;
                }
            }
        ";
        let (session, result) = run(source);
        result.unwrap();
        assert_eq!(session.logs, vec!["1-1", "2-1"]);
    }

    #[test]
    fn test_continue_skips_the_iteration() {
        let (session, result) = run("for i in 1..4 { if i % 2 == 0 { continue; } log i; }");
        result.unwrap();
        assert_eq!(session.logs, vec!["1", "3"]);
    }

    #[test]
    fn test_break_outside_loop_is_an_error() {
        let (_, result) = run("break;");
        assert!(result.unwrap_err().to_string().contains("outside of a loop"));
    }

    #[test]
    fn test_top_level_return_stops_the_script() {
        let (session, result) = run("log \"before\"; return; log \"after\";");
        result.unwrap();
        assert_eq!(session.logs, vec!["before"]);
    }

    // ===========================================================================
    // FUNCTIONS
    // ===========================================================================

    #[test]
    fn test_function_call_and_return() {
        let source = "
            function double(n) { return n * 2; }
            log double(21);
        ";
        let (session, result) = run(source);
        result.unwrap();
        assert_eq!(session.logs, vec!["42"]);
    }

    #[test]
    fn test_call_before_declaration() {
        let source = "
            log greet(\"alice\");
            function greet(name) { return \"hi \" + name; }
        ";
        let (session, result) = run(source);
        result.unwrap();
        assert_eq!(session.logs, vec!["hi alice"]);
    }

    #[test]
    fn test_callee_mutations_are_invisible_to_the_caller() {
        let source = "
            set x = 5;
            function mutate() { x = 99; set y = 1; return x; }
            log mutate();
            log x;
        ";
        let (session, result) = run(source);
        result.unwrap();
        assert_eq!(session.logs, vec!["99", "5"]);
    }

    #[test]
    fn test_callee_sees_caller_environment_copy() {
        let source = "
            set base = 10;
            function add(n) { return base + n; }
            log add(4);
        ";
        let (session, result) = run(source);
        result.unwrap();
        assert_eq!(session.logs, vec!["14"]);
    }

    #[test]
    fn test_exact_arity() {
        let (_, result) = run("function f(a, b) { return a; } f(1);");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("expects 2 argument(s), got 1"));
    }

    #[test]
    fn test_fall_through_returns_null() {
        let (session, result) = run("function noop() { set a = 1; } log noop();");
        result.unwrap();
        assert_eq!(session.logs, vec!["null"]);
    }

    #[test]
    fn test_recursion_depth_limit() {
        let mut session = RecordingSession::default();
        let result = crate::parser::parse("function f() { return f(); } f();");
        assert!(result.errors.is_empty());
        let mut executor = Executor::with_limits(
            &mut session,
            crate::interpreter::types::ExecutionLimits {
                max_call_depth: 8,
                max_loop_iterations: 1000,
            },
        );
        let err = executor.run_script(&result.script).unwrap_err();
        assert!(matches!(err, RuntimeError::Limit { .. }));
    }

    #[test]
    fn test_loop_iteration_limit() {
        let mut session = RecordingSession::default();
        let result = crate::parser::parse("while true { }");
        assert!(result.errors.is_empty());
        let mut executor = Executor::with_limits(
            &mut session,
            crate::interpreter::types::ExecutionLimits {
                max_call_depth: 8,
                max_loop_iterations: 50,
            },
        );
        let err = executor.run_script(&result.script).unwrap_err();
        assert!(matches!(err, RuntimeError::Limit { .. }));
    }

    // ===========================================================================
    // COMMANDS AND INTERPOLATION
    // ===========================================================================

    #[test]
    fn test_command_dispatch_in_order() {
        let source = "
            open \"http://example.com\";
            click id \"go\";
            type css \"#user\" \"alice\";
        ";
        let (session, result) = run(source);
        result.unwrap();
        assert_eq!(
            session.journal,
            vec![
                "open http://example.com",
                "click id \"go\"",
                "type css \"#user\" alice",
            ]
        );
    }

    #[test]
    fn test_interpolation_uses_current_binding() {
        let source = "
            set user = \"alice\";
            log \"hello ${user}\";
            user = \"bob\";
            log \"hello ${user}\";
        ";
        let (session, result) = run(source);
        result.unwrap();
        assert_eq!(session.logs, vec!["hello alice", "hello bob"]);
    }

    #[test]
    fn test_unbound_interpolation_is_an_error() {
        let (_, result) = run("log \"hi ${nobody}\";");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("undefined variable 'nobody'"));
    }

    #[test]
    fn test_locator_value_can_be_interpolated() {
        let (session, result) = run("set target = \"go\"; click id \"${target}\";");
        result.unwrap();
        assert_eq!(session.journal, vec!["click id \"go\""]);
    }

    // ===========================================================================
    // TEST BLOCKS
    // ===========================================================================

    #[test]
    fn test_test_block_runs_with_fresh_environment() {
        let source = "
            set outer = 1;
            test \"isolated\" { log outer; }
        ";
        let (session, result) = run(source);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("test 'isolated' failed"));
        assert!(err.to_string().contains("undefined variable 'outer'"));
        assert_eq!(session.screenshots, vec!["isolated"]);
    }

    #[test]
    fn test_passing_test_emits_log() {
        let (session, result) = run("test \"ok\" { set a = 1; log a; }");
        result.unwrap();
        assert_eq!(session.logs, vec!["1", "test 'ok' passed"]);
    }

    #[test]
    fn test_break_escaping_a_test_body_fails_the_test() {
        let (session, result) = run("test \"T\" { break; }");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("test 'T' failed"));
        assert!(err.to_string().contains("'break' outside of a loop"));
        assert!(matches!(err, RuntimeError::TestFailed { assertion: false, .. }));
        assert!(session.logs.is_empty());
    }

    #[test]
    fn test_run_test_selects_one_block() {
        let result = crate::parser::parse(
            "set shared = 1;\ntest \"a\" { log \"in a\"; }\ntest \"b\" { log \"in b\"; }",
        );
        assert!(result.errors.is_empty());
        let mut session = RecordingSession::default();
        Executor::new(&mut session).run_test(&result.script, "b").unwrap();
        assert_eq!(session.logs, vec!["in b", "test 'b' passed"]);
    }

    // ===========================================================================
    // IMPORT / EXPORT
    // ===========================================================================

    #[test]
    fn test_import_registers_module_handle() {
        let result = crate::parser::parse("import \"lib/helpers.ws\" as helpers;\nimport \"common.ws\";");
        assert!(result.errors.is_empty());
        let mut session = RecordingSession::default();
        let mut executor = Executor::new(&mut session);
        executor.run_script(&result.script).unwrap();
        assert_eq!(
            executor.state.modules.get("helpers").map(String::as_str),
            Some("lib/helpers.ws")
        );
        assert_eq!(
            executor.state.modules.get("common").map(String::as_str),
            Some("common.ws")
        );
    }

    #[test]
    fn test_export_snapshots_value() {
        let result = crate::parser::parse("set x = 1; export x; x = 2;");
        assert!(result.errors.is_empty());
        let mut session = RecordingSession::default();
        let mut executor = Executor::new(&mut session);
        executor.run_script(&result.script).unwrap();
        // The export captured the value at the declaration, not the final one.
        assert_eq!(
            executor.state.exports.values.get("x"),
            Some(&crate::interpreter::types::Value::Int(1))
        );
    }

    #[test]
    fn test_export_all_and_unknown_name() {
        let result = crate::parser::parse("set a = 1; function f() { return 0; } export all;");
        assert!(result.errors.is_empty());
        let mut session = RecordingSession::default();
        let mut executor = Executor::new(&mut session);
        executor.run_script(&result.script).unwrap();
        assert!(executor.state.exports.values.contains_key("a"));
        assert!(executor.state.exports.functions.contains_key("f"));

        let (_, result) = run("export nothing;");
        assert!(result.unwrap_err().to_string().contains("undefined variable 'nothing'"));
    }
}
