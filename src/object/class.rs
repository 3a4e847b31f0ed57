use super::{Function, Invocable, Object, RuntimeError};
use crate::ast::CONSTRUCTOR;
use crate::evaluator::Evaluator;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::trace;

#[derive(Debug)]
pub struct Class {
    pub name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Looks a method up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }
}

impl Invocable for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method(CONSTRUCTOR)
            .map_or(0, |constructor| constructor.arity())
    }

    fn invoke(&self, evaluator: &mut Evaluator, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));
        trace!(class = %self.name, "instantiating");

        if let Some(constructor) = self.find_method(CONSTRUCTOR) {
            constructor
                .bind(Rc::clone(&instance))
                .invoke(evaluator, arguments)?;
        }

        Ok(Object::Instance(instance))
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Object>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Fields shadow methods. A method comes back bound to `instance`.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &str) -> Option<Object> {
        let this = instance.borrow();
        if let Some(value) = this.fields.get(name) {
            return Some(value.clone());
        }

        this.class
            .find_method(name)
            .map(|method| Object::Function(Rc::new(method.bind(Rc::clone(instance)))))
    }

    pub fn set(&mut self, name: &str, val: Object) {
        self.fields.insert(name.to_owned(), val);
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // Fields may point back at this instance.
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}
