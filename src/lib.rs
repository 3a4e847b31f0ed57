mod ast;
mod builtins;
pub mod diagnostic;
mod environment;
pub mod evaluator;
mod lexer;
pub mod object;
mod parser;
mod resolver;
pub mod runner;
mod token;

pub use ast::Program;
pub use diagnostic::{Diagnostic, Diagnostics};
pub use evaluator::Evaluator;
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use resolver::{Locals, ResolveError, Resolver};
pub use runner::RunError;
