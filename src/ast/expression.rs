use super::ExprId;
use crate::token::{Token, TokenKind};
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use strum_macros;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Grouping(Box<Expression>),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Variable(Variable),
    Assignment(Assignment),
    SelfRef(SelfExpression),
    Super(SuperExpression),
    Get(GetExpression),
    Set(SetExpression),
    Index(IndexExpression),
    IndexSet(IndexSetExpression),
    Call(CallExpression),
    Array(ArrayLiteral),
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Literal(expr) => write!(f, "{}", expr),
            Self::Grouping(inner) => write!(f, "(group {})", inner),
            Self::Unary(expr) => write!(f, "{}", expr),
            Self::Binary(expr) => write!(f, "{}", expr),
            Self::Logical(expr) => write!(f, "{}", expr),
            Self::Variable(expr) => write!(f, "{}", expr),
            Self::Assignment(expr) => write!(f, "{}", expr),
            Self::SelfRef(_) => write!(f, "self"),
            Self::Super(expr) => write!(f, "super.{}", expr.method.lexeme),
            Self::Get(expr) => write!(f, "{}.{}", expr.object, expr.name.lexeme),
            Self::Set(expr) => write!(f, "({}.{} = {})", expr.object, expr.name.lexeme, expr.value),
            Self::Index(expr) => write!(f, "({}[{}])", expr.object, expr.index),
            Self::IndexSet(expr) => {
                write!(f, "({}[{}] = {})", expr.object, expr.index, expr.value)
            }
            Self::Call(expr) => write!(f, "{}", expr),
            Self::Array(expr) => write!(f, "{}", expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    None,
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Operator {
    #[strum(to_string = "!")]
    Bang,
    #[strum(to_string = "-")]
    Minus,
    #[strum(to_string = "+")]
    Plus,
    #[strum(to_string = "*")]
    Asterisk,
    #[strum(to_string = "/")]
    Slash,
    #[strum(to_string = "<")]
    LT,
    #[strum(to_string = ">")]
    GT,
    #[strum(to_string = "<=")]
    LtEq,
    #[strum(to_string = ">=")]
    GtEq,
    #[strum(to_string = "==")]
    Eq,
    #[strum(to_string = "!=")]
    NotEq,
    #[strum(to_string = "numof")]
    NumOf,
    #[strum(to_string = "strof")]
    StrOf,
}

impl TryFrom<&TokenKind> for Operator {
    type Error = ();

    fn try_from(kind: &TokenKind) -> Result<Self, Self::Error> {
        Ok(match kind {
            TokenKind::Bang => Self::Bang,
            TokenKind::Minus => Self::Minus,
            TokenKind::Plus => Self::Plus,
            TokenKind::Asterisk => Self::Asterisk,
            TokenKind::Slash => Self::Slash,
            TokenKind::LT => Self::LT,
            TokenKind::GT => Self::GT,
            TokenKind::LtEq => Self::LtEq,
            TokenKind::GtEq => Self::GtEq,
            TokenKind::Eq => Self::Eq,
            TokenKind::NotEq => Self::NotEq,
            TokenKind::NumOf => Self::NumOf,
            TokenKind::StrOf => Self::StrOf,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum LogicalOperator {
    #[strum(to_string = "and")]
    And,
    #[strum(to_string = "or")]
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: Operator,
    pub line: usize,
    pub right: Box<Expression>,
}

impl Display for UnaryExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.operator {
            Operator::NumOf | Operator::StrOf => write!(f, "({} {})", self.operator, self.right),
            _ => write!(f, "({}{})", self.operator, self.right),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: Operator,
    pub line: usize,
    pub right: Box<Expression>,
}

impl Display for BinaryExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({} {} {})", self.left, self.operator, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    pub left: Box<Expression>,
    pub operator: LogicalOperator,
    pub right: Box<Expression>,
}

impl Display for LogicalExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({} {} {})", self.left, self.operator, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: ExprId,
    pub name: Token,
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name.lexeme)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: ExprId,
    pub name: Token,
    pub value: Box<Expression>,
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({} = {})", self.name.lexeme, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelfExpression {
    pub id: ExprId,
    pub keyword: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperExpression {
    pub id: ExprId,
    pub keyword: Token,
    pub method: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetExpression {
    pub object: Box<Expression>,
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetExpression {
    pub object: Box<Expression>,
    pub name: Token,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub object: Box<Expression>,
    pub bracket: Token,
    pub index: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSetExpression {
    pub object: Box<Expression>,
    pub bracket: Token,
    pub index: Box<Expression>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub paren: Token,
    pub arguments: Vec<Expression>,
}

impl Display for CallExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let argument_names: Vec<String> =
            self.arguments.iter().map(Expression::to_string).collect();

        write!(f, "{}({})", self.callee, argument_names.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub elements: Vec<Expression>,
}

impl Display for ArrayLiteral {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let element_names: Vec<String> = self.elements.iter().map(Expression::to_string).collect();

        write!(f, "[{}]", element_names.join(", "))
    }
}

impl From<Vec<Expression>> for ArrayLiteral {
    fn from(elements: Vec<Expression>) -> Self {
        Self { elements }
    }
}
