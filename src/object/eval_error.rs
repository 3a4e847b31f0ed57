use crate::ast;
use custom_error::custom_error;
use std::fmt::{self, Display, Formatter};

custom_error! {
    #[derive(Clone, PartialEq)]
    pub EvalError

    UndefinedVariable{name: String} = "Undefined variable '{name}'",
    UndefinedProperty{name: String} = "Undefined property '{name}'",
    UnaryOperandType{operator: ast::Operator, operand: &'static str} = "operand of '{operator}' must be a number, got {operand}",
    BinaryOperandTypes{left: &'static str, operator: ast::Operator, right: &'static str} = "unsupported operand types for '{operator}': {left} and {right}",
    DivisionByZero = "Division by zero",
    InvalidNumOf{type_name: &'static str} = "numof expects a number or a string, got {type_name}",
    NumberParse{text: String} = "Cannot convert \"{text}\" to a number",
    NotCallable{type_name: &'static str} = "Calls are only valid for functions and classes, got {type_name}",
    IncorrectArity{expected: usize, got: usize} = "wrong number of arguments: expected {expected} but got {got}",
    NotAnInstance{type_name: &'static str} = "Only instances have properties, got {type_name}",
    InvalidSuperclass{type_name: &'static str} = "Can only inherit from a class, got {type_name}",
    NotIndexable{type_name: &'static str} = "index operator not supported: {type_name}",
    InvalidIndex{index: String} = "array index must be a whole number, got {index}",
    IndexOutOfRange{index: String, len: usize} = "array index {index} out of range for length {len}",
    InvalidRepeatCount{type_name: &'static str} = "repeat count must be a number, got {type_name}",
    UnexpectedBreak = "Unexpected 'break' statement",
    StackOverflow = "stack overflow",
    Io{message: String} = "console I/O failed: {message}",
    Clock = "system clock is set before the Unix epoch",
}

impl EvalError {
    pub fn at(self, line: usize) -> RuntimeError {
        RuntimeError {
            line: Some(line),
            error: self,
        }
    }
}

impl From<std::io::Error> for EvalError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// A runtime error together with the line it was raised on. Errors raised
/// inside native functions start without a line and pick up the call site's.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub line: Option<usize>,
    pub error: EvalError,
}

impl RuntimeError {
    pub fn or_line(self, line: usize) -> Self {
        Self {
            line: self.line.or(Some(line)),
            error: self.error,
        }
    }
}

impl From<EvalError> for RuntimeError {
    fn from(error: EvalError) -> Self {
        Self { line: None, error }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Error at line {}: {}", line, self.error),
            None => write!(f, "Error: {}", self.error),
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_runtime_error_rendering() {
        let located = EvalError::DivisionByZero.at(4);
        assert_eq!(located.to_string(), "Error at line 4: Division by zero");

        let unlocated = RuntimeError::from(EvalError::StackOverflow);
        assert_eq!(unlocated.to_string(), "Error: stack overflow");
    }

    #[test]
    fn test_call_site_line_fills_only_missing_lines() {
        let from_native = RuntimeError::from(EvalError::Clock).or_line(7);
        assert_eq!(from_native.line, Some(7));

        let already_located = EvalError::UnexpectedBreak.at(2).or_line(7);
        assert_eq!(already_located.line, Some(2));
    }

    #[test]
    fn test_arity_message_names_both_counts() {
        let err = EvalError::IncorrectArity {
            expected: 0,
            got: 1,
        };
        assert_eq!(
            err.to_string(),
            "wrong number of arguments: expected 0 but got 1"
        );
    }
}
