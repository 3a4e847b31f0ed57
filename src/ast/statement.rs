use super::{Expression, Variable};
use crate::token::Token;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expr(Expression),
    Let(LetStatement),
    Block(BlockStatement),
    If(IfStatement),
    While(WhileStatement),
    Times(TimesStatement),
    Break(Token),
    Function(Rc<FunctionDeclaration>),
    Return(ReturnStatement),
    Class(ClassDeclaration),
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Expr(expr) => write!(f, "{};", expr),
            Self::Let(stmt) => write!(f, "{}", stmt),
            Self::Block(stmt) => write!(f, "{}", stmt),
            Self::If(stmt) => write!(f, "{}", stmt),
            Self::While(stmt) => write!(f, "while {} do {}", stmt.condition, stmt.body),
            Self::Times(stmt) => write!(f, "do {} times {}", stmt.count, stmt.body),
            Self::Break(_) => write!(f, "break;"),
            Self::Function(decl) => write!(f, "{}", decl),
            Self::Return(stmt) => match &stmt.value {
                Some(value) => write!(f, "return {};", value),
                None => write!(f, "return;"),
            },
            Self::Class(decl) => write!(f, "{}", decl),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    pub name: Token,
    pub initializer: Option<Expression>,
}

impl Display for LetStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.initializer {
            Some(value) => write!(f, "let {} = {};", self.name.lexeme, value),
            None => write!(f, "let {};", self.name.lexeme),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{{ ")?;
        for stmt in self.statements.iter() {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}

impl From<Vec<Statement>> for BlockStatement {
    fn from(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub consequence: Box<Statement>,
    pub alternative: Option<Box<Statement>>,
}

impl Display for IfStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "if {} then {}", self.condition, self.consequence)?;
        if let Some(alt) = &self.alternative {
            write!(f, " else {}", alt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimesStatement {
    pub keyword: Token,
    pub count: Expression,
    pub body: Box<Statement>,
}

/// Method name that marks a class's constructor.
pub const CONSTRUCTOR: &str = "constructor";

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Token,
    pub parameters: Vec<Token>,
    pub body: Vec<Statement>,
}

impl FunctionDeclaration {
    pub fn is_constructor(&self) -> bool {
        self.name.lexeme == CONSTRUCTOR
    }
}

impl Display for FunctionDeclaration {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let parameter_names: Vec<&str> = self
            .parameters
            .iter()
            .map(|param| param.lexeme.as_str())
            .collect();

        write!(
            f,
            "def {}({}) {}",
            self.name.lexeme,
            parameter_names.join(", "),
            BlockStatement::from(self.body.clone())
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub keyword: Token,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub name: Token,
    pub superclass: Option<Variable>,
    pub methods: Vec<Rc<FunctionDeclaration>>,
}

impl Display for ClassDeclaration {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "class {}", self.name.lexeme)?;
        if let Some(superclass) = &self.superclass {
            write!(f, " inherits {}", superclass)?;
        }
        write!(f, " {{ ")?;
        for method in self.methods.iter() {
            write!(f, "{} ", method)?;
        }
        write!(f, "}}")
    }
}
