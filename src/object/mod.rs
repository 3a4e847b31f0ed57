use crate::builtins::NativeFunction;
use crate::evaluator::Evaluator;
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

mod class;
mod eval_error;
mod function;

pub use class::{Class, Instance};
pub use eval_error::{EvalError, RuntimeError};
pub use function::Function;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Clone)]
pub enum Object {
    None,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Rc<RefCell<Vec<Object>>>),
    Native(NativeFunction),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

/// Anything a call expression can target.
pub trait Invocable {
    fn arity(&self) -> usize;

    fn invoke(
        &self,
        evaluator: &mut Evaluator,
        arguments: Vec<Object>,
    ) -> std::result::Result<Object, RuntimeError>;
}

/// Identity of an array, used to cut cycles when an array holds itself.
type ArrayPtr = *const RefCell<Vec<Object>>;

impl Display for Object {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.render(f, &mut vec![])
    }
}

/// `none` only equals `none`. Values of different types are never equal;
/// arrays compare element-wise and the remaining reference types by
/// identity.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, &mut vec![])
    }
}

impl Object {
    fn render(&self, f: &mut Formatter, seen: &mut Vec<ArrayPtr>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::Array(elements) => {
                let ptr = Rc::as_ptr(elements);
                if seen.contains(&ptr) {
                    return write!(f, "[...]");
                }

                seen.push(ptr);
                write!(f, "[")?;
                for (i, element) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    element.render(f, seen)?;
                }
                seen.pop();
                write!(f, "]")
            }
            Self::Native(native) => write!(f, "<native func {}>", native.name),
            Self::Function(func) => write!(f, "<func {}>", func.name()),
            Self::Class(class) => write!(f, "<class {}>", class.name),
            Self::Instance(instance) => {
                write!(f, "<instance of {}>", instance.borrow().class_name())
            }
        }
    }

    // a pair of arrays met again further down is taken as equal
    fn equals(&self, other: &Self, seen: &mut Vec<(ArrayPtr, ArrayPtr)>) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
                if seen.contains(&pair) {
                    return true;
                }

                seen.push(pair);
                let (a, b) = (a.borrow(), b.borrow());
                let equal = a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y, seen));
                seen.pop();
                equal
            }
            (Self::Native(a), Self::Native(b)) => a.name == b.name,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::None
    }
}

impl From<f64> for Object {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        s.to_owned().into()
    }
}

impl From<Vec<Object>> for Object {
    fn from(a: Vec<Object>) -> Self {
        Self::Array(Rc::new(RefCell::new(a)))
    }
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Native(_) => "native function",
            Self::Function(_) => "function",
            Self::Class(_) => "class",
            Self::Instance(_) => "instance",
        }
    }

    pub fn truth_value(&self) -> bool {
        match self {
            Self::Boolean(false) => false,
            Self::None => false,
            _ => true,
        }
    }

    pub fn as_invocable(&self) -> Option<&dyn Invocable> {
        match self {
            Self::Native(native) => Some(native),
            Self::Function(func) => Some(func.as_ref()),
            Self::Class(class) => Some(class),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Object::None.truth_value());
        assert!(!Object::Boolean(false).truth_value());
        assert!(Object::Boolean(true).truth_value());
        assert!(Object::Number(0.0).truth_value());
        assert!(Object::from("").truth_value());
        assert!(Object::from(vec![]).truth_value());
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_eq!(Object::None, Object::None);
        assert_ne!(Object::None, Object::Number(0.0));
        assert_ne!(Object::from("5"), Object::Number(5.0));
        assert_ne!(Object::Boolean(false), Object::None);
        assert_eq!(Object::from("ab"), Object::from("ab"));
    }

    #[test]
    fn test_arrays_compare_element_wise() {
        let a = Object::from(vec![Object::Number(1.0), Object::from("x")]);
        let b = Object::from(vec![Object::Number(1.0), Object::from("x")]);
        let c = Object::from(vec![Object::Number(1.0)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_string_forms() {
        let cases = vec![
            (Object::Number(5.0), "5"),
            (Object::Number(2.5), "2.5"),
            (Object::Number(-0.125), "-0.125"),
            (Object::Number(1e21), "1000000000000000000000"),
            (Object::Boolean(true), "true"),
            (Object::None, "none"),
            (Object::from("text"), "text"),
            (
                Object::from(vec![
                    Object::Number(1.0),
                    Object::from(vec![Object::from("a")]),
                    Object::None,
                ]),
                "[1, [a], none]",
            ),
        ];

        for (object, expected) in cases {
            assert_eq!(object.to_string(), expected);
        }
    }

    #[test]
    fn test_only_callables_are_invocable() {
        assert!(Object::Number(1.0).as_invocable().is_none());
        assert!(Object::from("f").as_invocable().is_none());
    }
}
