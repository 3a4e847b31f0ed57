use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::resolver::ResolveError;
use std::fmt::{self, Display, Formatter};

/// Any error found before a program runs. Each one blocks execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Lex(LexError),
    Parse(ParseError),
    Resolve(ResolveError),
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Self::Lex(err) => err.line(),
            Self::Parse(err) => err.line(),
            Self::Resolve(err) => err.line(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // the wrapped messages already start with "line N: "
        match self {
            Self::Lex(err) => write!(f, "Error at {}", err),
            Self::Parse(err) => write!(f, "Error at {}", err),
            Self::Resolve(err) => write!(f, "Error at {}", err),
        }
    }
}

/// Every diagnostic from one run, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Display for Diagnostics {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(Diagnostic::to_string).collect();
        write!(f, "{}", rendered.join("\n"))
    }
}

impl<E: Into<Diagnostic>> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let mut diagnostics: Vec<Diagnostic> = errors.into_iter().map(Into::into).collect();
        diagnostics.sort_by_key(Diagnostic::line);
        Self(diagnostics)
    }
}

impl From<LexError> for Diagnostic {
    fn from(err: LexError) -> Self {
        Self::Lex(err)
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<ResolveError> for Diagnostic {
    fn from(err: ResolveError) -> Self {
        Self::Resolve(err)
    }
}
