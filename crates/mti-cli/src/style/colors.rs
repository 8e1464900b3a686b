//! Semantic color palette for terminal output.

use owo_colors::{OwoColorize, Style};

/// What a piece of text means, independent of how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// A check passed or a tag was confirmed present.
    Success,
    /// A failure or a wrong verdict.
    Error,
    Warning,
    Info,
    Muted,
    Header,
    /// Commands, paths and identifiers.
    Code,
}

impl Tone {
    pub fn style(self) -> Style {
        match self {
            Self::Success => Style::new().green().bold(),
            Self::Error => Style::new().red().bold(),
            Self::Warning => Style::new().yellow(),
            Self::Info => Style::new().cyan(),
            Self::Muted => Style::new().dimmed(),
            Self::Header => Style::new().bold(),
            Self::Code => Style::new().blue(),
        }
    }
}

/// Applies a [`Tone`] to anything displayable, honoring `--no-color`.
pub trait SemanticStyle: std::fmt::Display {
    fn paint(&self, tone: Tone) -> String {
        if super::no_color() {
            self.to_string()
        } else {
            self.style(tone.style()).to_string()
        }
    }

    fn success(&self) -> String {
        self.paint(Tone::Success)
    }

    fn error(&self) -> String {
        self.paint(Tone::Error)
    }

    fn warning(&self) -> String {
        self.paint(Tone::Warning)
    }

    fn info(&self) -> String {
        self.paint(Tone::Info)
    }

    fn muted(&self) -> String {
        self.paint(Tone::Muted)
    }

    fn header(&self) -> String {
        self.paint(Tone::Header)
    }

    fn code(&self) -> String {
        self.paint(Tone::Code)
    }
}

impl<T: std::fmt::Display + ?Sized> SemanticStyle for T {}
