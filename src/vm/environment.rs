//! A single global scope plus per-call local scopes (spec section 3),
//! modelled as a stack of shared, mutable frames — the same shape as the
//! teacher's `typechecker::scope::Scope` (`stacks: Vec<Rc<RefCell<Frame>>>`,
//! innermost at the end), simplified to a flat name→value map per frame
//! since Aura has no block scoping: only a function call pushes a frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Obj;

type Frame = Rc<RefCell<HashMap<String, Obj>>>;

/// Cheaply clonable (an `Rc` clone per frame): a closure can carry its
/// defining `Environment` around as `captured_env` without copying any
/// bindings, and still observes later mutations to those outer frames.
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment { frames: vec![Rc::new(RefCell::new(HashMap::new()))] }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// `RECALL`/`LOCAL_VARIABLE_GET`: search frames innermost-first.
    pub fn get(&self, name: &str) -> Option<Obj> {
        self.frames.iter().rev().find_map(|frame| frame.borrow().get(name).cloned())
    }

    /// `LET`: bind (or overwrite) `name` in the current, innermost frame.
    pub fn set(&self, name: impl Into<String>, value: Obj) {
        self.frames
            .last()
            .expect("an Environment always has at least one frame")
            .borrow_mut()
            .insert(name.into(), value);
    }

    /// Build the environment a function call body runs against: this
    /// environment's frames (the closure's captured scope) plus one new
    /// frame seeded with the evaluated argument bindings.
    pub fn call_frame(&self, bindings: impl IntoIterator<Item = (String, Obj)>) -> Environment {
        let mut frames = self.frames.clone();
        frames.push(Rc::new(RefCell::new(bindings.into_iter().collect())));
        Environment { frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_in_same_frame() {
        let env = Environment::new();
        env.set("x", Obj::Int(5));
        assert_eq!(env.get("x"), Some(Obj::Int(5)));
    }

    #[test]
    fn unknown_name_is_none() {
        let env = Environment::new();
        assert_eq!(env.get("ghost"), None);
    }

    #[test]
    fn call_frame_sees_captured_bindings() {
        let env = Environment::new();
        env.set("outer", Obj::Int(1));
        let call = env.call_frame([("inner".to_string(), Obj::Int(2))]);
        assert_eq!(call.get("outer"), Some(Obj::Int(1)));
        assert_eq!(call.get("inner"), Some(Obj::Int(2)));
    }

    #[test]
    fn call_frame_does_not_leak_locals_back_to_caller() {
        let env = Environment::new();
        let call = env.call_frame([("local".to_string(), Obj::Int(9))]);
        let _ = call;
        assert_eq!(env.get("local"), None);
    }

    #[test]
    fn mutating_shared_outer_frame_is_visible_through_clone() {
        let env = Environment::new();
        let captured = env.clone();
        env.set("shared", Obj::Int(1));
        assert_eq!(captured.get("shared"), Some(Obj::Int(1)));
    }
}
