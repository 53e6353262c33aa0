//! Lexical frame stack shared by the static passes.
//!
//! The resolver stores a [`VariableState`](crate::resolver) per name, the type
//! checker a [`Type`](crate::types::Type).  Both open and close frames at exactly
//! the same points of the tree, so a name found here at distance `d` is the same
//! binding the interpreter will find `d` environments up the chain.

use std::collections::HashMap;

use log::debug;

/// Where a name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// In a local frame, `0` being the innermost.
    Local(usize),
    Global,
}

/// Global frame plus a stack of local frames, each mapping name → `T`.
#[derive(Debug)]
pub struct Scopes<T> {
    globals: HashMap<String, T>,
    frames: Vec<HashMap<String, T>>,
}

impl<T> Default for Scopes<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scopes<T> {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            frames: Vec::new(),
        }
    }

    #[inline]
    pub fn begin(&mut self) {
        self.frames.push(HashMap::new());
    }

    #[inline]
    pub fn end(&mut self) {
        self.frames.pop();
    }

    /// Number of open local frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame new declarations go into: the innermost local, or the globals.
    fn current(&self) -> &HashMap<String, T> {
        self.frames.last().unwrap_or(&self.globals)
    }

    fn current_mut(&mut self) -> &mut HashMap<String, T> {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.globals,
        }
    }

    /// `true` if `name` already exists in the current frame.
    pub fn contains_in_current(&self, name: &str) -> bool {
        self.current().contains_key(name)
    }

    /// Insert or overwrite `name` in the current frame.
    pub fn declare(&mut self, name: &str, value: T) {
        debug!("Scope depth {}: declare '{}'", self.depth(), name);
        self.current_mut().insert(name.to_string(), value);
    }

    /// Insert directly into the global frame regardless of the current depth.
    pub fn declare_global(&mut self, name: &str, value: T) {
        self.globals.insert(name.to_string(), value);
    }

    /// Search innermost frame first, then the globals.
    pub fn find(&self, name: &str) -> Option<Lookup> {
        for (distance, frame) in self.frames.iter().rev().enumerate() {
            if frame.contains_key(name) {
                return Some(Lookup::Local(distance));
            }
        }

        if self.globals.contains_key(name) {
            return Some(Lookup::Global);
        }

        None
    }

    fn frame(&self, at: Lookup) -> Option<&HashMap<String, T>> {
        match at {
            Lookup::Global => Some(&self.globals),
            Lookup::Local(distance) => {
                let index = self.frames.len().checked_sub(distance + 1)?;
                self.frames.get(index)
            }
        }
    }

    /// The entry for `name` in the frame designated by `at`.
    pub fn get(&self, at: Lookup, name: &str) -> Option<&T> {
        self.frame(at)?.get(name)
    }

    pub fn get_mut(&mut self, at: Lookup, name: &str) -> Option<&mut T> {
        let frame = match at {
            Lookup::Global => &mut self.globals,
            Lookup::Local(distance) => {
                let index = self.frames.len().checked_sub(distance + 1)?;
                self.frames.get_mut(index)?
            }
        };

        frame.get_mut(name)
    }
}
