use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for CLI output
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    /// Rejected writes and other failures
    pub error: Style,
    pub warn: Style,
    pub label: Style,
    /// Constraint notes on schema fields (required, references)
    pub constraint: Style,
    pub muted: Style,
}

impl Theme {
    /// Colored when `console` says stdout takes colors (honors `NO_COLOR` and `CLICOLOR`)
    pub fn detect() -> Self {
        Self::new(console::colors_enabled())
    }

    pub fn new(colored: bool) -> Self {
        if !colored {
            let plain = Style::new();
            return Self {
                header: plain,
                success: plain,
                error: plain,
                warn: plain,
                label: plain,
                constraint: plain,
                muted: plain,
            };
        }
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            label: Style::new().blue(),
            constraint: Style::new().magenta(),
            muted: Style::new().dimmed(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
