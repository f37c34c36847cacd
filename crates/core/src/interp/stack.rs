//! Graphics state stack for `q`/`Q`.

use crate::model::GraphicsState;

/// A stack of graphics states that is never empty.
///
/// The live state sits outside the saved list, so `current()` is always
/// available and popping past the base state leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct GraphicsStateStack {
    saved: Vec<GraphicsState>,
    current: GraphicsState,
}

impl GraphicsStateStack {
    pub const fn new(base: GraphicsState) -> Self {
        Self {
            saved: Vec::new(),
            current: base,
        }
    }

    /// Saves a copy of the current state.
    pub fn push(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Restores the most recently saved state. No-op at the base state.
    pub fn pop(&mut self) -> bool {
        match self.saved.pop() {
            Some(state) => {
                self.current = state;
                true
            }
            None => false,
        }
    }

    pub const fn current(&self) -> &GraphicsState {
        &self.current
    }

    pub const fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    /// Number of states held, counting the current one.
    pub fn depth(&self) -> usize {
        self.saved.len() + 1
    }

    /// Value copy of the current state for an emitted element.
    pub fn snapshot(&self) -> GraphicsState {
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_below_base_is_noop() {
        let mut stack = GraphicsStateStack::default();
        stack.current_mut().line_width = 3.0;
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current().line_width, 3.0);
    }

    #[test]
    fn test_push_pop_restores() {
        let mut stack = GraphicsStateStack::default();
        stack.push();
        stack.current_mut().fill_alpha = 0.25;
        assert_eq!(stack.depth(), 2);
        assert!(stack.pop());
        assert_eq!(stack.current().fill_alpha, 1.0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut stack = GraphicsStateStack::default();
        let snap = stack.snapshot();
        stack.current_mut().line_width = 9.0;
        assert_eq!(snap.line_width, 1.0);
    }
}
