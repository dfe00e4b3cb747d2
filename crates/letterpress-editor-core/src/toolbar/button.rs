use smol_str::SmolStr;

use crate::actions::EditorAction;

/// Identifies a button across both toolbars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Bold,
    Italic,
    Heading,
    Link,
    Image,
    HorizontalRule,
}

impl ButtonId {
    /// Stable name used for the button's class and test lookups.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Heading => "heading",
            Self::Link => "link",
            Self::Image => "image",
            Self::HorizontalRule => "horizontal-rule",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Enabled,
    Disabled,
    Active,
}

impl ButtonState {
    /// Class toggled on the rendered button.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Active => "active",
        }
    }
}

/// A labeled tri-state button with a single click action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    id: ButtonId,
    label: SmolStr,
    title: SmolStr,
    state: ButtonState,
    action: EditorAction,
}

impl ToolbarButton {
    pub fn new(
        id: ButtonId,
        label: impl Into<SmolStr>,
        title: impl Into<SmolStr>,
        action: EditorAction,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            title: title.into(),
            state: ButtonState::Enabled,
            action,
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_disabled(&self) -> bool {
        self.state == ButtonState::Disabled
    }

    pub fn enable(&mut self) {
        self.state = ButtonState::Enabled;
    }

    pub fn disable(&mut self) {
        self.state = ButtonState::Disabled;
    }

    pub fn activate(&mut self) {
        self.state = ButtonState::Active;
    }

    /// Swap the click action.
    pub fn set_action(&mut self, action: EditorAction) {
        self.action = action;
    }

    /// The action to run for a click, or `None` while disabled.
    pub fn click(&self) -> Option<EditorAction> {
        if self.is_disabled() {
            None
        } else {
            Some(self.action)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_button_suppresses_click() {
        let mut button = ToolbarButton::new(ButtonId::Bold, "B", "Bold", EditorAction::ToggleBold);
        assert_eq!(button.click(), Some(EditorAction::ToggleBold));
        button.disable();
        assert_eq!(button.click(), None);
        button.activate();
        assert_eq!(button.click(), Some(EditorAction::ToggleBold));
        assert_eq!(button.state().class_name(), "active");
    }

    #[test]
    fn test_set_action_replaces_handler() {
        let mut button = ToolbarButton::new(ButtonId::Link, "Link", "Link", EditorAction::ToggleLink);
        button.set_action(EditorAction::ToggleBold);
        assert_eq!(button.click(), Some(EditorAction::ToggleBold));
    }
}
