//! Single-slot modal host.
//!
//! Terminals and phones alike only show one overlay at a time here: showing a
//! view while another one is up replaces it, and dismissing an empty stack
//! does nothing.

use std::fmt;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalStack<V> {
    current: Option<V>,
}

impl<V> Default for ModalStack<V> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<V: fmt::Debug> ModalStack<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `view`. An already visible view is replaced and returned.
    pub fn show(&mut self, view: V) -> Option<V> {
        if let Some(previous) = &self.current {
            debug!(?previous, next = ?view, "modal shown over existing view, replacing");
        }
        self.current.replace(view)
    }

    /// Swap the visible view. Equivalent to `show` on an empty stack.
    pub fn replace(&mut self, view: V) -> Option<V> {
        self.current.replace(view)
    }

    /// Hide the visible view, if any.
    pub fn dismiss(&mut self) -> Option<V> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&V> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut V> {
        self.current.as_mut()
    }

    pub fn is_shown(&self) -> bool {
        self.current.is_some()
    }
}
