use crate::ast::{self, Expression, Literal, LogicalOperator, Operator, Program, Statement};
use crate::builtins::BUILTINS;
use crate::environment::{Env, Environment};
use crate::object::{Class, EvalError, Function, Instance, Object, RuntimeError};
use crate::resolver::Locals;
use crate::token::Token;
use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;
use tracing::{debug, trace};


/// Nested calls allowed before evaluation fails with a stack overflow.
pub const MAX_CALL_DEPTH: usize = 1000;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoopId(usize);

/// How a statement finished.
enum Flow {
    Normal,
    Return(Object),
    Break(LoopId),
}

pub struct Evaluator {
    globals: Env,
    env: Env,
    locals: Locals,
    loops: Vec<LoopId>,
    next_loop: usize,
    depth: usize,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// An evaluator wired to the process's stdin and stdout.
    pub fn new() -> Self {
        Self::with_io(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        {
            let mut frame = globals.borrow_mut();
            for (name, native) in BUILTINS.iter() {
                frame.define(name, Object::Native(native.clone()));
            }
        }

        Self {
            env: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            loops: vec![],
            next_loop: 0,
            depth: 0,
            input,
            output,
        }
    }

    pub fn add_locals(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// Runs `program` against the persistent global frame. The first
    /// runtime error stops execution.
    pub fn interpret(&mut self, program: &Program) -> Result<()> {
        for stmt in program.statements.iter() {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }
        Ok(())
    }

    pub fn write_output(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    /// Reads one console line without its terminator, or `None` at end of
    /// input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Runs a function body in `env`, its parameter frame. Loops of the
    /// caller are hidden from the body.
    pub(crate) fn call_function(&mut self, body: &[Statement], env: Env) -> Result<Option<Object>> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(EvalError::StackOverflow.into());
        }

        self.depth += 1;
        let caller_loops = std::mem::take(&mut self.loops);
        let result = self.execute_block(body, env);
        self.loops = caller_loops;
        self.depth -= 1;

        match result? {
            Flow::Return(value) => Ok(Some(value)),
            Flow::Normal | Flow::Break(_) => Ok(None),
        }
    }

    fn execute(&mut self, stmt: &Statement) -> Result<Flow> {
        match stmt {
            Statement::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
            Statement::Let(stmt) => {
                let value = match &stmt.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Object::None,
                };
                self.env.borrow_mut().define(&stmt.name.lexeme, value);
                Ok(Flow::Normal)
            }
            Statement::Block(block) => {
                let env = Environment::enclosed(&self.env);
                self.execute_block(&block.statements, env)
            }
            Statement::If(stmt) => {
                if self.evaluate(&stmt.condition)?.truth_value() {
                    self.execute(&stmt.consequence)
                } else if let Some(alternative) = &stmt.alternative {
                    self.execute(alternative)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While(stmt) => {
                let id = self.enter_loop();
                let result = self.execute_while(stmt, id);
                self.loops.pop();
                result
            }
            Statement::Times(stmt) => {
                let count = match self.evaluate(&stmt.count)? {
                    Object::Number(n) => n,
                    other => {
                        return Err(EvalError::InvalidRepeatCount {
                            type_name: other.type_name(),
                        }
                        .at(stmt.keyword.line))
                    }
                };

                let id = self.enter_loop();
                let result = self.execute_times(count, &stmt.body, id);
                self.loops.pop();
                result
            }
            Statement::Break(keyword) => match self.loops.last() {
                Some(id) => Ok(Flow::Break(*id)),
                None => Err(EvalError::UnexpectedBreak.at(keyword.line)),
            },
            Statement::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.env), false);
                self.env
                    .borrow_mut()
                    .define(&decl.name.lexeme, Object::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }
            Statement::Return(stmt) => {
                let value = match &stmt.value {
                    Some(value) => self.evaluate(value)?,
                    None => Object::None,
                };
                Ok(Flow::Return(value))
            }
            Statement::Class(decl) => {
                self.declare_class(decl)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn execute_block(&mut self, statements: &[Statement], env: Env) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.env, env);
        let result = self.execute_statements(statements);
        self.env = previous;
        result
    }

    fn execute_statements(&mut self, statements: &[Statement]) -> Result<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn enter_loop(&mut self) -> LoopId {
        let id = LoopId(self.next_loop);
        self.next_loop += 1;
        self.loops.push(id);
        id
    }

    fn execute_while(&mut self, stmt: &ast::WhileStatement, id: LoopId) -> Result<Flow> {
        while self.evaluate(&stmt.condition)?.truth_value() {
            match self.execute(&stmt.body)? {
                Flow::Normal => {}
                Flow::Break(target) if target == id => break,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_times(&mut self, count: f64, body: &Statement, id: LoopId) -> Result<Flow> {
        let mut i = 0.0;
        while i < count {
            match self.execute(body)? {
                Flow::Normal => {}
                Flow::Break(target) if target == id => break,
                flow => return Ok(flow),
            }
            i += 1.0;
        }
        Ok(Flow::Normal)
    }

    fn declare_class(&mut self, decl: &ast::ClassDeclaration) -> Result<()> {
        let superclass = match &decl.superclass {
            Some(var) => match self.look_up_variable(var.id, &var.name)? {
                Object::Class(class) => Some(class),
                other => {
                    return Err(EvalError::InvalidSuperclass {
                        type_name: other.type_name(),
                    }
                    .at(var.name.line))
                }
            },
            None => None,
        };

        let name = &decl.name.lexeme;
        self.env.borrow_mut().define(name, Object::None);

        let closure = match &superclass {
            Some(superclass) => {
                let env = Environment::enclosed(&self.env);
                env.borrow_mut()
                    .define("super", Object::Class(Rc::clone(superclass)));
                env
            }
            None => Rc::clone(&self.env),
        };

        let methods = decl
            .methods
            .iter()
            .map(|method| {
                let function =
                    Function::new(Rc::clone(method), Rc::clone(&closure), method.is_constructor());
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        debug!(class = %name, methods = decl.methods.len(), "declared class");
        let class = Class::new(name.clone(), superclass, methods);
        self.env
            .borrow_mut()
            .assign(name, Object::Class(Rc::new(class)));
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<Object> {
        match expr {
            Expression::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Object::Number(*n),
                Literal::String(s) => Object::String(s.clone()),
                Literal::Boolean(b) => Object::Boolean(*b),
                Literal::None => Object::None,
            }),
            Expression::Grouping(inner) => self.evaluate(inner),
            Expression::Unary(expr) => {
                let right = self.evaluate(&expr.right)?;
                eval_unary_expression(expr.operator, right).map_err(|err| err.at(expr.line))
            }
            Expression::Binary(expr) => {
                let left = self.evaluate(&expr.left)?;
                let right = self.evaluate(&expr.right)?;
                eval_binary_expression(expr.operator, left, right)
                    .map_err(|err| err.at(expr.line))
            }
            Expression::Logical(expr) => {
                let left = self.evaluate(&expr.left)?;
                let decided = match expr.operator {
                    LogicalOperator::Or => left.truth_value(),
                    LogicalOperator::And => !left.truth_value(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate(&expr.right)
                }
            }
            Expression::Variable(var) => self.look_up_variable(var.id, &var.name),
            Expression::Assignment(expr) => {
                let value = self.evaluate(&expr.value)?;
                let name = &expr.name.lexeme;
                let assigned = match self.locals.get(&expr.id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.env, distance, name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone()),
                };

                if !assigned {
                    return Err(EvalError::UndefinedVariable { name: name.clone() }
                        .at(expr.name.line));
                }
                Ok(value)
            }
            Expression::SelfRef(expr) => self.look_up_variable(expr.id, &expr.keyword),
            Expression::Super(expr) => self.eval_super_expression(expr),
            Expression::Get(expr) => {
                let instance = self.evaluate_instance(&expr.object, &expr.name)?;
                Instance::get(&instance, &expr.name.lexeme).ok_or_else(|| {
                    EvalError::UndefinedProperty {
                        name: expr.name.lexeme.clone(),
                    }
                    .at(expr.name.line)
                })
            }
            Expression::Set(expr) => {
                let instance = self.evaluate_instance(&expr.object, &expr.name)?;
                let value = self.evaluate(&expr.value)?;
                instance.borrow_mut().set(&expr.name.lexeme, value.clone());
                Ok(value)
            }
            Expression::Index(expr) => {
                let object = self.evaluate(&expr.object)?;
                let index = self.evaluate(&expr.index)?;
                let (array, slot) =
                    array_slot(&object, &index).map_err(|err| err.at(expr.bracket.line))?;
                let element = array.borrow()[slot].clone();
                Ok(element)
            }
            Expression::IndexSet(expr) => {
                let object = self.evaluate(&expr.object)?;
                let index = self.evaluate(&expr.index)?;
                let value = self.evaluate(&expr.value)?;
                let (array, slot) =
                    array_slot(&object, &index).map_err(|err| err.at(expr.bracket.line))?;
                array.borrow_mut()[slot] = value.clone();
                Ok(value)
            }
            Expression::Call(expr) => self.eval_call_expression(expr),
            Expression::Array(array) => {
                let mut elements = Vec::with_capacity(array.elements.len());
                for element in array.elements.iter() {
                    elements.push(self.evaluate(element)?);
                }
                Ok(elements.into())
            }
        }
    }

    fn look_up_variable(&self, id: ast::ExprId, name: &Token) -> Result<Object> {
        let value = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.env, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            EvalError::UndefinedVariable {
                name: name.lexeme.clone(),
            }
            .at(name.line)
        })
    }

    fn evaluate_instance(
        &mut self,
        object: &Expression,
        name: &Token,
    ) -> Result<Rc<RefCell<Instance>>> {
        match self.evaluate(object)? {
            Object::Instance(instance) => Ok(instance),
            other => Err(EvalError::NotAnInstance {
                type_name: other.type_name(),
            }
            .at(name.line)),
        }
    }

    fn eval_call_expression(&mut self, expr: &ast::CallExpression) -> Result<Object> {
        let callee = self.evaluate(&expr.callee)?;

        let mut arguments = Vec::with_capacity(expr.arguments.len());
        for argument in expr.arguments.iter() {
            arguments.push(self.evaluate(argument)?);
        }

        let line = expr.paren.line;
        let invocable = callee.as_invocable().ok_or_else(|| {
            EvalError::NotCallable {
                type_name: callee.type_name(),
            }
            .at(line)
        })?;

        if arguments.len() != invocable.arity() {
            return Err(EvalError::IncorrectArity {
                expected: invocable.arity(),
                got: arguments.len(),
            }
            .at(line));
        }

        trace!(callee = %callee, line, depth = self.depth, "call");
        invocable
            .invoke(self, arguments)
            .map_err(|err| err.or_line(line))
    }

    /// `super.m` looks `m` up from the declaring class's superclass and binds
    /// it to the current `self`, which lives one frame inside `super`.
    fn eval_super_expression(&mut self, expr: &ast::SuperExpression) -> Result<Object> {
        let line = expr.keyword.line;
        let missing = |name: &str| {
            EvalError::UndefinedVariable {
                name: name.to_owned(),
            }
            .at(line)
        };

        let distance = *self.locals.get(&expr.id).ok_or_else(|| missing("super"))?;

        let superclass = match Environment::get_at(&self.env, distance, "super") {
            Some(Object::Class(class)) => class,
            _ => return Err(missing("super")),
        };

        let instance = distance
            .checked_sub(1)
            .and_then(|inner| Environment::get_at(&self.env, inner, "self"));
        let instance = match instance {
            Some(Object::Instance(instance)) => instance,
            _ => return Err(missing("self")),
        };

        let method = superclass.find_method(&expr.method.lexeme).ok_or_else(|| {
            EvalError::UndefinedProperty {
                name: expr.method.lexeme.clone(),
            }
            .at(expr.method.line)
        })?;

        Ok(Object::Function(Rc::new(method.bind(instance))))
    }
}

fn eval_unary_expression(operator: Operator, right: Object) -> std::result::Result<Object, EvalError> {
    match operator {
        Operator::Bang => Ok(Object::Boolean(!right.truth_value())),
        Operator::StrOf => Ok(Object::String(right.to_string())),
        Operator::NumOf => match right {
            Object::Number(n) => Ok(Object::Number(n)),
            Object::String(text) => {
                // only written-out numerals; no "inf" or "nan" spellings
                let trimmed = text.trim();
                let parsed = if trimmed.bytes().any(|b| b.is_ascii_digit()) {
                    trimmed.parse::<f64>().ok()
                } else {
                    None
                };
                parsed
                    .map(Object::Number)
                    .ok_or(EvalError::NumberParse { text })
            }
            other => Err(EvalError::InvalidNumOf {
                type_name: other.type_name(),
            }),
        },
        _ => match right {
            Object::Number(n) if operator == Operator::Minus => Ok(Object::Number(-n)),
            other => Err(EvalError::UnaryOperandType {
                operator,
                operand: other.type_name(),
            }),
        },
    }
}

fn eval_binary_expression(
    operator: Operator,
    left: Object,
    right: Object,
) -> std::result::Result<Object, EvalError> {
    match (operator, &left, &right) {
        (Operator::Eq, _, _) => Ok(Object::Boolean(left == right)),
        (Operator::NotEq, _, _) => Ok(Object::Boolean(left != right)),
        (_, Object::Number(x), Object::Number(y)) => eval_number_binary_expression(operator, *x, *y),
        (Operator::Plus, Object::String(x), Object::String(y)) => {
            Ok(Object::String(format!("{}{}", x, y)))
        }
        _ => Err(EvalError::BinaryOperandTypes {
            left: left.type_name(),
            operator,
            right: right.type_name(),
        }),
    }
}

fn eval_number_binary_expression(
    operator: Operator,
    x: f64,
    y: f64,
) -> std::result::Result<Object, EvalError> {
    Ok(match operator {
        Operator::Plus => Object::Number(x + y),
        Operator::Minus => Object::Number(x - y),
        Operator::Asterisk => Object::Number(x * y),
        Operator::Slash => {
            if y == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Object::Number(x / y)
        }
        Operator::LT => Object::Boolean(x < y),
        Operator::GT => Object::Boolean(x > y),
        Operator::LtEq => Object::Boolean(x <= y),
        Operator::GtEq => Object::Boolean(x >= y),
        _ => {
            return Err(EvalError::BinaryOperandTypes {
                left: "number",
                operator,
                right: "number",
            })
        }
    })
}

/// Checks that `object[index]` names an existing element.
fn array_slot(
    object: &Object,
    index: &Object,
) -> std::result::Result<(Rc<RefCell<Vec<Object>>>, usize), EvalError> {
    let array = match object {
        Object::Array(array) => array,
        other => {
            return Err(EvalError::NotIndexable {
                type_name: other.type_name(),
            })
        }
    };

    let position = match index {
        Object::Number(n) if n.fract() == 0.0 => *n,
        other => {
            return Err(EvalError::InvalidIndex {
                index: other.to_string(),
            })
        }
    };

    let len = array.borrow().len();
    if position < 0.0 || position >= len as f64 {
        return Err(EvalError::IndexOutOfRange {
            index: index.to_string(),
            len,
        });
    }

    Ok((Rc::clone(array), position as usize))
}
