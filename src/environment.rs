use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame. Closures and the evaluator's cursor hold
/// these; links only ever point outward, so no cycles form.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new() -> Env {
        Rc::new(RefCell::new(Default::default()))
    }

    pub fn enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    pub fn define(&mut self, name: &str, val: Object) {
        self.store.insert(name.to_owned(), val);
    }

    /// Looks `name` up in this frame only.
    pub fn get(&self, name: &str) -> Option<Object> {
        self.store.get(name).cloned()
    }

    /// Overwrites `name` in this frame. Returns false when it was never
    /// declared here.
    pub fn assign(&mut self, name: &str, val: Object) -> bool {
        match self.store.get_mut(name) {
            Some(slot) => {
                *slot = val;
                true
            }
            None => false,
        }
    }

    pub fn ancestor(env: &Env, distance: usize) -> Option<Env> {
        let mut current = Rc::clone(env);
        for _ in 0..distance {
            let outer = current.borrow().outer.clone()?;
            current = outer;
        }
        Some(current)
    }

    pub fn get_at(env: &Env, distance: usize, name: &str) -> Option<Object> {
        Self::ancestor(env, distance)?.borrow().get(name)
    }

    pub fn assign_at(env: &Env, distance: usize, name: &str, val: Object) -> bool {
        match Self::ancestor(env, distance) {
            Some(frame) => frame.borrow_mut().assign(name, val),
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_inner_definitions_shadow_without_touching_outer() {
        let global = Environment::new();
        global.borrow_mut().define("x", Object::Number(1.0));

        let inner = Environment::enclosed(&global);
        inner.borrow_mut().define("x", Object::Number(2.0));

        assert_eq!(Environment::get_at(&inner, 0, "x"), Some(Object::Number(2.0)));
        assert_eq!(Environment::get_at(&inner, 1, "x"), Some(Object::Number(1.0)));
        assert_eq!(global.borrow().get("x"), Some(Object::Number(1.0)));
    }

    #[test]
    fn test_assign_requires_declaration() {
        let global = Environment::new();
        let inner = Environment::enclosed(&global);

        assert!(!Environment::assign_at(&inner, 1, "y", Object::None));

        global.borrow_mut().define("y", Object::None);
        assert!(Environment::assign_at(&inner, 1, "y", Object::Boolean(true)));
        assert_eq!(global.borrow().get("y"), Some(Object::Boolean(true)));
    }

    #[test]
    fn test_distance_past_the_root_finds_nothing() {
        let global = Environment::new();
        global.borrow_mut().define("z", Object::None);

        assert!(Environment::ancestor(&global, 1).is_none());
        assert_eq!(Environment::get_at(&global, 3, "z"), None);
    }
}
