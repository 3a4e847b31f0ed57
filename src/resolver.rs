use crate::ast::{ClassDeclaration, ExprId, Expression, FunctionDeclaration, Statement};
use crate::token::Token;
use custom_error::custom_error;
use std::collections::HashMap;
use tracing::{debug, trace};

custom_error! {
    #[derive(Clone, PartialEq)]
    pub ResolveError

    ReturnOutsideFunction{line: usize} = "line {line}: can't return from top-level code",
    ReturnValueFromConstructor{line: usize} = "line {line}: can't return a value from a constructor",
    SelfOutsideClass{line: usize} = "line {line}: can't use 'self' outside of a class",
    SuperOutsideClass{line: usize} = "line {line}: can't use 'super' outside of a class",
    SuperWithoutSuperclass{line: usize} = "line {line}: can't use 'super' in a class with no superclass",
    SelfReferenceInInitializer{line: usize, name: String} = "line {line}: can't read local variable '{name}' in its own initializer",
    InheritFromSelf{line: usize, name: String} = "line {line}: class '{name}' can't inherit from itself",
}

impl ResolveError {
    pub fn line(&self) -> usize {
        match self {
            Self::ReturnOutsideFunction { line }
            | Self::ReturnValueFromConstructor { line }
            | Self::SelfOutsideClass { line }
            | Self::SuperOutsideClass { line }
            | Self::SuperWithoutSuperclass { line }
            | Self::SelfReferenceInInitializer { line, .. }
            | Self::InheritFromSelf { line, .. } => *line,
        }
    }
}

/// Lexical depth of every locally-resolved reference. References missing
/// from the table are globals.
pub type Locals = HashMap<ExprId, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    locals: Locals,
    errors: Vec<ResolveError>,
    function: FunctionKind,
    class: ClassKind,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: vec![],
            locals: Locals::new(),
            errors: vec![],
            function: FunctionKind::None,
            class: ClassKind::None,
        }
    }

    pub fn resolve(mut self, statements: &[Statement]) -> Result<Locals, Vec<ResolveError>> {
        self.resolve_statements(statements);

        if self.errors.is_empty() {
            debug!(locals = self.locals.len(), "resolved program");
            Ok(self.locals)
        } else {
            Err(self.errors)
        }
    }

    fn resolve_statements(&mut self, statements: &[Statement]) {
        for stmt in statements {
            self.resolve_statement(stmt);
        }
    }

    fn resolve_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Expr(expr) => self.resolve_expression(expr),
            Statement::Let(stmt) => {
                self.declare(&stmt.name);
                if let Some(initializer) = &stmt.initializer {
                    self.resolve_expression(initializer);
                }
                self.define(&stmt.name);
            }
            Statement::Block(block) => {
                self.scopes.push(HashMap::new());
                self.resolve_statements(&block.statements);
                self.scopes.pop();
            }
            Statement::If(stmt) => {
                self.resolve_expression(&stmt.condition);
                self.resolve_statement(&stmt.consequence);
                if let Some(alternative) = &stmt.alternative {
                    self.resolve_statement(alternative);
                }
            }
            Statement::While(stmt) => {
                self.resolve_expression(&stmt.condition);
                self.resolve_statement(&stmt.body);
            }
            Statement::Times(stmt) => {
                self.resolve_expression(&stmt.count);
                self.resolve_statement(&stmt.body);
            }
            Statement::Break(_) => {}
            Statement::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Statement::Return(stmt) => {
                let line = stmt.keyword.line;
                if self.function == FunctionKind::None {
                    self.errors.push(ResolveError::ReturnOutsideFunction { line });
                }
                if let Some(value) = &stmt.value {
                    if self.function == FunctionKind::Constructor {
                        self.errors
                            .push(ResolveError::ReturnValueFromConstructor { line });
                    }
                    self.resolve_expression(value);
                }
            }
            Statement::Class(decl) => self.resolve_class(decl),
        }
    }

    fn resolve_class(&mut self, decl: &ClassDeclaration) {
        let enclosing = self.class;
        self.class = ClassKind::Class;

        self.declare(&decl.name);
        self.define(&decl.name);

        if let Some(superclass) = &decl.superclass {
            if superclass.name.lexeme == decl.name.lexeme {
                self.errors.push(ResolveError::InheritFromSelf {
                    line: superclass.name.line,
                    name: decl.name.lexeme.clone(),
                });
            } else {
                self.resolve_local(superclass.id, &superclass.name);
            }

            self.class = ClassKind::Subclass;
            self.scopes.push(HashMap::new());
            self.bind_keyword("super");
        }

        self.scopes.push(HashMap::new());
        self.bind_keyword("self");

        for method in decl.methods.iter() {
            let kind = if method.is_constructor() {
                FunctionKind::Constructor
            } else {
                FunctionKind::Method
            };
            self.resolve_function(method, kind);
        }

        self.scopes.pop();
        if decl.superclass.is_some() {
            self.scopes.pop();
        }

        trace!(class = %decl.name.lexeme, "resolved class body");
        self.class = enclosing;
    }

    fn resolve_function(&mut self, decl: &FunctionDeclaration, kind: FunctionKind) {
        let enclosing = self.function;
        self.function = kind;

        self.scopes.push(HashMap::new());
        for param in decl.parameters.iter() {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(&decl.body);
        self.scopes.pop();

        self.function = enclosing;
    }

    fn resolve_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(_) => {}
            Expression::Grouping(inner) => self.resolve_expression(inner),
            Expression::Unary(expr) => self.resolve_expression(&expr.right),
            Expression::Binary(expr) => {
                self.resolve_expression(&expr.left);
                self.resolve_expression(&expr.right);
            }
            Expression::Logical(expr) => {
                self.resolve_expression(&expr.left);
                self.resolve_expression(&expr.right);
            }
            Expression::Variable(var) => {
                let declared_not_ready = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&var.name.lexeme))
                    .map_or(false, |ready| !ready);
                if declared_not_ready {
                    self.errors.push(ResolveError::SelfReferenceInInitializer {
                        line: var.name.line,
                        name: var.name.lexeme.clone(),
                    });
                }
                self.resolve_local(var.id, &var.name);
            }
            Expression::Assignment(expr) => {
                self.resolve_expression(&expr.value);
                self.resolve_local(expr.id, &expr.name);
            }
            Expression::SelfRef(expr) => {
                if self.class == ClassKind::None {
                    self.errors.push(ResolveError::SelfOutsideClass {
                        line: expr.keyword.line,
                    });
                    return;
                }
                self.resolve_local(expr.id, &expr.keyword);
            }
            Expression::Super(expr) => {
                let line = expr.keyword.line;
                match self.class {
                    ClassKind::None => {
                        self.errors.push(ResolveError::SuperOutsideClass { line })
                    }
                    ClassKind::Class => self
                        .errors
                        .push(ResolveError::SuperWithoutSuperclass { line }),
                    ClassKind::Subclass => self.resolve_local(expr.id, &expr.keyword),
                }
            }
            Expression::Get(expr) => self.resolve_expression(&expr.object),
            Expression::Set(expr) => {
                self.resolve_expression(&expr.value);
                self.resolve_expression(&expr.object);
            }
            Expression::Index(expr) => {
                self.resolve_expression(&expr.object);
                self.resolve_expression(&expr.index);
            }
            Expression::IndexSet(expr) => {
                self.resolve_expression(&expr.object);
                self.resolve_expression(&expr.index);
                self.resolve_expression(&expr.value);
            }
            Expression::Call(expr) => {
                self.resolve_expression(&expr.callee);
                for argument in expr.arguments.iter() {
                    self.resolve_expression(argument);
                }
            }
            Expression::Array(array) => {
                for element in array.elements.iter() {
                    self.resolve_expression(element);
                }
            }
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        let found = self
            .scopes
            .iter()
            .rev()
            .position(|scope| scope.contains_key(&name.lexeme));

        if let Some(depth) = found {
            trace!(name = %name.lexeme, line = name.line, depth, "resolved local");
            self.locals.insert(id, depth);
        }
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn bind_keyword(&mut self, keyword: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(keyword.to_owned(), true);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::Program;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn program(input: &str) -> Program {
        let (tokens, errors) = Lexer::new(input).scan();
        assert!(errors.is_empty(), "lex errors: {:?}", errors);
        Parser::new(tokens)
            .parse_program()
            .expect("Parse errors found")
    }

    fn resolve(input: &str) -> Result<Locals, Vec<ResolveError>> {
        Resolver::new().resolve(&program(input).statements)
    }

    fn depths_of(input: &str) -> Vec<usize> {
        let mut entries: Vec<(ExprId, usize)> = resolve(input)
            .expect("Resolve errors found")
            .into_iter()
            .collect();
        entries.sort();
        entries.into_iter().map(|(_, depth)| depth).collect()
    }

    #[test]
    fn test_globals_are_left_out() {
        let locals = resolve("let x = 1\nprintln(x)\nx = 2").unwrap();
        assert!(locals.is_empty());
    }

    #[test]
    fn test_block_and_closure_depths() {
        let input = "{
  let a = 1
  {
    println(a)
  }
  def f(b) {
    return a + b
  }
}";
        // println is global; a at depth 1, then a at depth 1 and b at depth 0
        assert_eq!(depths_of(input), vec![1, 1, 0]);
    }

    #[test]
    fn test_class_keywords_resolve_through_their_scopes() {
        let input = "class A {}
class B inherits A {
  def speak() {
    return super.speak(self)
  }
}";
        // super sits two frames out of the method body, self one frame out
        assert_eq!(depths_of(input), vec![2, 1]);
    }

    #[test]
    fn test_own_initializer_is_an_error() {
        let errors = resolve("{\n  let a = a\n}").unwrap_err();
        assert_eq!(
            errors,
            vec![ResolveError::SelfReferenceInInitializer {
                line: 2,
                name: "a".to_owned(),
            }]
        );
    }

    #[test]
    fn test_context_errors_are_all_reported() {
        let input = "return 1
println(self)
println(super.x)
class A {
  def constructor() {
    return 1
  }
  def m() {
    return super.m()
  }
}
class B inherits B {}";
        let errors = resolve(input).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ResolveError::ReturnOutsideFunction { line: 1 },
                ResolveError::SelfOutsideClass { line: 2 },
                ResolveError::SuperOutsideClass { line: 3 },
                ResolveError::ReturnValueFromConstructor { line: 6 },
                ResolveError::SuperWithoutSuperclass { line: 9 },
                ResolveError::InheritFromSelf {
                    line: 12,
                    name: "B".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_bare_return_in_constructor_is_allowed() {
        assert!(resolve("class A {\n  def constructor() {\n    return\n  }\n}").is_ok());
    }

    #[test]
    fn test_recursion_resolves_own_name() {
        let input = "{
  def fib(n) {
    return fib(n - 1)
  }
}";
        // fib from inside its body is one frame out; n is in the body frame
        assert_eq!(depths_of(input), vec![1, 0]);
    }
}
