use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// ANSI styling that can be switched off as a whole.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// `None` means auto-detect.
    pub fn new(enabled: Option<bool>) -> Self {
        Self {
            enabled: enabled.unwrap_or_else(Self::auto_detect),
        }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn auto_detect() -> bool {
        if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            return false;
        }
        if std::env::var_os("FORCE_COLOR").is_some_and(|v| !v.is_empty()) {
            return true;
        }
        std::io::stdout().is_terminal()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().to_string())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed().to_string())
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(text, |t| t.red().to_string())
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow().to_string())
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint(text, |t| t.cyan().to_string())
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.enabled {
            style(text)
        } else {
            text.to_string()
        }
    }
}
