mod expression;
mod statement;
pub use expression::*;
pub use statement::*;

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a name-bearing expression node. Handed out by the parser, one
/// per node, so two identical-looking references stay distinct. Ids never
/// repeat within a process, so depth tables from separate parses can be
/// merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

impl ExprId {
    pub fn fresh() -> Self {
        Self(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let rendered: Vec<String> = self.statements.iter().map(Statement::to_string).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl From<Vec<Statement>> for Program {
    fn from(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::{Token, TokenKind};

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Ident(name.to_owned()), name, 1)
    }

    #[test]
    fn test_display() {
        let program = Program::from(vec![
            Statement::Let(LetStatement {
                name: ident("myVar"),
                initializer: Some(Expression::Variable(Variable {
                    id: ExprId(0),
                    name: ident("anotherVar"),
                })),
            }),
            Statement::Expr(Expression::Binary(BinaryExpression {
                left: Box::new(Expression::Literal(Literal::Number(1.0))),
                operator: Operator::Plus,
                line: 1,
                right: Box::new(Expression::Literal(Literal::String("a".to_owned()))),
            })),
        ]);

        assert_eq!(format!("{}", program), "let myVar = anotherVar; (1 + \"a\");");
    }

    #[test]
    fn test_expression_ids_distinguish_identical_nodes() {
        let first = Variable {
            id: ExprId(0),
            name: ident("x"),
        };
        let second = Variable {
            id: ExprId(1),
            name: ident("x"),
        };

        assert_eq!(first.to_string(), second.to_string());
        assert_ne!(first, second);
    }

    #[test]
    fn test_fresh_ids_increase() {
        let a = ExprId::fresh();
        let b = ExprId::fresh();
        assert!(a < b);
    }
}
