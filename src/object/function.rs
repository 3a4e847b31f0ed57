use super::{Instance, Invocable, Object, RuntimeError};
use crate::ast::FunctionDeclaration;
use crate::environment::{Env, Environment};
use crate::evaluator::Evaluator;
use crate::object::EvalError;
use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// A user-defined function together with the frame it was declared in.
pub struct Function {
    declaration: Rc<FunctionDeclaration>,
    closure: Env,
    is_constructor: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDeclaration>, closure: Env, is_constructor: bool) -> Self {
        Self {
            declaration,
            closure,
            is_constructor,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Returns a copy of this method whose closure gains a frame holding
    /// `self`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Self {
        let env = Environment::enclosed(&self.closure);
        env.borrow_mut().define("self", Object::Instance(instance));

        Self {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_constructor: self.is_constructor,
        }
    }
}

impl Invocable for Function {
    fn arity(&self) -> usize {
        self.declaration.parameters.len()
    }

    fn invoke(&self, evaluator: &mut Evaluator, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let env = Environment::enclosed(&self.closure);
        {
            let mut frame = env.borrow_mut();
            for (param, arg) in self.declaration.parameters.iter().zip(arguments) {
                frame.define(&param.lexeme, arg);
            }
        }

        let returned = evaluator.call_function(&self.declaration.body, env)?;

        if self.is_constructor {
            return self.closure.borrow().get("self").ok_or_else(|| {
                EvalError::UndefinedVariable {
                    name: "self".to_owned(),
                }
                .into()
            });
        }

        Ok(returned.unwrap_or(Object::None))
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // The closure can hold this very function, so it is left out.
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_constructor", &self.is_constructor)
            .finish()
    }
}
