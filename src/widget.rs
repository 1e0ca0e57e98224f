//! Widget shell state: panel visibility, minimize, and the options drawer

/// Visibility state of the chat panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetState {
    /// Panel is shown (the launcher button is hidden while open)
    pub open: bool,

    /// Panel is collapsed to its title bar
    pub minimized: bool,

    /// Options drawer is expanded
    pub drawer_open: bool,
}

impl WidgetState {
    /// Closed panel, launcher visible
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open: false,
            minimized: false,
            drawer_open: false,
        }
    }

    /// Launcher button clicked
    pub const fn toggle(&mut self) {
        self.open = !self.open;
        if !self.open {
            self.minimized = false;
        }
    }

    /// Close button clicked; also resets minimize and the drawer
    pub const fn close(&mut self) {
        self.open = false;
        self.minimized = false;
        self.drawer_open = false;
    }

    /// Minimize button clicked
    pub const fn minimize(&mut self) {
        self.minimized = !self.minimized;
    }

    /// Options button clicked
    pub const fn toggle_drawer(&mut self) {
        self.drawer_open = !self.drawer_open;
    }

    /// Click landed outside the drawer and its button
    pub const fn dismiss_drawer(&mut self) {
        self.drawer_open = false;
    }

    /// Whether the launcher button is shown
    #[must_use]
    pub const fn launcher_visible(&self) -> bool {
        !self.open
    }

    /// Label for the minimize button
    #[must_use]
    pub const fn minimize_label(&self) -> &'static str {
        if self.minimized { "+" } else { "-" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_opens_and_hides_launcher() {
        let mut state = WidgetState::new();
        assert!(state.launcher_visible());

        state.toggle();
        assert!(state.open);
        assert!(!state.launcher_visible());
    }

    #[test]
    fn toggling_closed_clears_minimized() {
        let mut state = WidgetState::new();
        state.toggle();
        state.minimize();
        assert_eq!(state.minimize_label(), "+");

        state.toggle();
        assert!(!state.open);
        assert!(!state.minimized);
        assert_eq!(state.minimize_label(), "-");
    }

    #[test]
    fn close_resets_everything() {
        let mut state = WidgetState::new();
        state.toggle();
        state.minimize();
        state.toggle_drawer();

        state.close();
        assert_eq!(state, WidgetState::default());
    }

    #[test]
    fn drawer_toggles_and_dismisses() {
        let mut state = WidgetState::new();
        state.toggle_drawer();
        assert!(state.drawer_open);
        state.toggle_drawer();
        assert!(!state.drawer_open);

        state.toggle_drawer();
        state.dismiss_drawer();
        assert!(!state.drawer_open);
    }
}
