use crate::evaluator::Evaluator;
use crate::object::*;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

type NativeBody = fn(&mut Evaluator, Vec<Object>) -> Result<Object>;

/// A host function bound into the global frame at startup.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    arity: usize,
    body: NativeBody,
}

impl NativeFunction {
    fn new(name: &'static str, arity: usize, body: NativeBody) -> Self {
        Self { name, arity, body }
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "<native func {}>", self.name)
    }
}

impl Invocable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn invoke(
        &self,
        evaluator: &mut Evaluator,
        arguments: Vec<Object>,
    ) -> std::result::Result<Object, RuntimeError> {
        Ok((self.body)(evaluator, arguments)?)
    }
}

fn first(args: Vec<Object>) -> Object {
    args.into_iter().next().unwrap_or_default()
}

fn print(evaluator: &mut Evaluator, args: Vec<Object>) -> Result<Object> {
    evaluator.write_output(&first(args).to_string())?;
    Ok(Object::None)
}

fn println(evaluator: &mut Evaluator, args: Vec<Object>) -> Result<Object> {
    evaluator.write_output(&format!("{}\n", first(args)))?;
    Ok(Object::None)
}

fn input(evaluator: &mut Evaluator, args: Vec<Object>) -> Result<Object> {
    evaluator.write_output(&first(args).to_string())?;

    Ok(match evaluator.read_line()? {
        Some(line) => Object::String(line),
        None => Object::None,
    })
}

fn time(_: &mut Evaluator, _: Vec<Object>) -> Result<Object> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| EvalError::Clock)?;

    Ok(Object::Number(elapsed.as_secs_f64()))
}

lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, NativeFunction> = vec![
        NativeFunction::new("print", 1, print),
        NativeFunction::new("println", 1, println),
        NativeFunction::new("input", 1, input),
        NativeFunction::new("time", 0, time),
    ]
    .into_iter()
    .map(|native| (native.name, native))
    .collect();
}
