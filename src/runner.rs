use crate::ast::Program;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::object::RuntimeError;
use crate::parser::Parser;
use crate::resolver::{Locals, Resolver};
use custom_error::custom_error;
use std::fs;
use std::io;
use tracing::debug;

custom_error! {
    pub RunError

    Io{path: String, source: io::Error} = "could not read {path}: {source}",
    Static{diagnostics: Diagnostics} = "{diagnostics}",
    Runtime{source: RuntimeError} = "{source}",
}

impl RunError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } => 66,
            Self::Static { .. } => 65,
            Self::Runtime { .. } => 70,
        }
    }
}

/// Lexes, parses and resolves `source`. Lexical and parse errors are
/// gathered together; resolution only runs once both are clean.
pub fn check(source: &str) -> Result<(Program, Locals), Diagnostics> {
    let (tokens, lex_errors) = Lexer::new(source).scan();

    let mut parser = Parser::new(tokens);
    let declarations = parser.parse();

    let mut diagnostics: Vec<Diagnostic> = lex_errors.into_iter().map(Diagnostic::from).collect();
    diagnostics.extend(parser.errors().iter().cloned().map(Diagnostic::from));
    if !diagnostics.is_empty() {
        debug!(count = diagnostics.len(), "static errors, skipping resolution");
        return Err(diagnostics.into());
    }

    let program: Program = declarations.into_iter().flatten().collect::<Vec<_>>().into();
    let locals = Resolver::new().resolve(&program.statements)?;

    Ok((program, locals))
}

/// Checks `source` and, if it is clean, interprets it on `evaluator`.
pub fn run(source: &str, evaluator: &mut Evaluator) -> Result<(), RunError> {
    let (program, locals) = check(source).map_err(|diagnostics| RunError::Static { diagnostics })?;

    evaluator.add_locals(locals);
    evaluator
        .interpret(&program)
        .map_err(|source| RunError::Runtime { source })
}

pub fn run_file(path: &str) -> Result<(), RunError> {
    let source = fs::read_to_string(path).map_err(|source| RunError::Io {
        path: path.to_owned(),
        source,
    })?;
    debug!(path, bytes = source.len(), "loaded script");

    run(&source, &mut Evaluator::new())
}
