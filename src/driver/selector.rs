use std::fmt;

/// Element selector for the device automation bridge
///
/// The display form matches the textual selector syntax understood by
/// WebdriverIO/Appium tooling, so failure messages can be pasted straight into
/// Appium Inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Accessibility id (`~id`)
    AccessibilityId(String),
    /// UiAutomator2 `UiSelector` expression (`android=...`)
    UiAutomator(String),
}

impl Selector {
    /// W3C locator strategy and value
    pub fn strategy(&self) -> (&'static str, &str) {
        match self {
            Selector::AccessibilityId(v) => ("accessibility id", v),
            Selector::UiAutomator(v) => ("-android uiautomator", v),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::AccessibilityId(v) => write!(f, "~{}", v),
            Selector::UiAutomator(v) => write!(f, "android={}", v),
        }
    }
}

/// Escape a string literal for embedding in a `UiSelector` expression
fn escape_ui_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn a11y(id: &str) -> Selector {
    Selector::AccessibilityId(id.to_string())
}

pub fn text_exact(text: &str) -> Selector {
    Selector::UiAutomator(format!(
        "new UiSelector().text(\"{}\")",
        escape_ui_literal(text)
    ))
}

pub fn text_contains(text: &str) -> Selector {
    Selector::UiAutomator(format!(
        "new UiSelector().textContains(\"{}\")",
        escape_ui_literal(text)
    ))
}

pub fn desc_exact(desc: &str) -> Selector {
    Selector::UiAutomator(format!(
        "new UiSelector().description(\"{}\")",
        escape_ui_literal(desc)
    ))
}

pub fn desc_contains(desc: &str) -> Selector {
    Selector::UiAutomator(format!(
        "new UiSelector().descriptionContains(\"{}\")",
        escape_ui_literal(desc)
    ))
}

/// Nth `EditText` on screen (0-based)
pub fn edit_text_instance(n: usize) -> Selector {
    Selector::UiAutomator(format!(
        "new UiSelector().className(\"android.widget.EditText\").instance({})",
        n
    ))
}
