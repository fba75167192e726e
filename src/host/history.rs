//! Back-navigation for hosts without a browser history stack.

/// In-process navigation history.
///
/// `back` is fire-and-forget: going back from the root entry is ignored.
#[derive(Debug, Clone)]
pub struct NavigationHistory<T> {
    entries: Vec<T>,
}

impl<T> NavigationHistory<T> {
    pub fn new(root: T) -> Self {
        Self {
            entries: vec![root],
        }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    pub fn back(&mut self) {
        if self.entries.len() > 1 {
            self.entries.pop();
        } else {
            log::debug!("Navigation back ignored at history root");
        }
    }

    pub fn current(&self) -> &T {
        // `new` seeds a root entry and `back` never removes it.
        &self.entries[self.entries.len() - 1]
    }

    pub fn can_go_back(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_returns_to_previous_entry() {
        let mut history = NavigationHistory::new("menu");
        history.push("settings");
        history.push("language");

        history.back();

        assert_eq!(*history.current(), "settings");
        assert!(history.can_go_back());
    }

    #[test]
    fn test_back_at_root_is_noop() {
        let mut history = NavigationHistory::new("menu");

        history.back();
        history.back();

        assert_eq!(*history.current(), "menu");
        assert_eq!(history.depth(), 1);
        assert!(!history.can_go_back());
    }
}
