use colored::Color;
use once_cell::sync::Lazy;

/// Colors by role. Status roles drive messages, the rest drive help text and
/// table cells.
pub struct Palette {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub heading: Color,
    pub accent: Color,
    pub command: Color,
    pub dim: Color,
    pub label: Color,
    pub text: Color,
    pub positive: Color,
    pub negative: Color,
    pub hashtag: Color,
}

impl Palette {
    fn tagpulse() -> Self {
        Self {
            success: Color::Green,
            error: Color::BrightRed,
            warning: Color::Yellow,
            info: Color::BrightBlue,
            heading: Color::TrueColor { r: 255, g: 138, b: 76 },
            accent: Color::TrueColor { r: 255, g: 184, b: 108 },
            command: Color::Cyan,
            dim: Color::BrightBlack,
            label: Color::BrightYellow,
            text: Color::White,
            positive: Color::Green,
            negative: Color::Red,
            hashtag: Color::Magenta,
        }
    }
}

pub static THEME: Lazy<Palette> = Lazy::new(Palette::tagpulse);

pub struct Glyphs {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
    pub heart: &'static str,
    pub bookmark: &'static str,
}

pub const ICONS: Glyphs = Glyphs {
    success: "✓",
    error: "✗",
    warning: "!",
    info: "·",
    arrow: "›",
    bullet: "-",
    heart: "♥",
    bookmark: "⚑",
};
