//! Text measurement for node sizing
//!
//! Node boxes are sized from their labels. Widths come from Unicode display
//! columns scaled to pixels, so wide glyphs get two columns.

use unicode_width::UnicodeWidthStr;

use super::{LayoutConfig, Size};

/// Display width of a string in columns
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Wrap text to fit within a maximum width, breaking on word boundaries.
///
/// Returns a vector of lines, each fitting within `max_width` display columns.
/// If `max_width` is 0, or the label fits on one line, returns a single-element vector.
///
/// # Example
/// ```
/// use quadrille::core::wrap_label;
///
/// let lines = wrap_label("This is a long label", 10);
/// assert_eq!(lines, vec!["This is a", "long label"]);
/// ```
pub fn wrap_label(label: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || display_width(label) <= max_width {
        return vec![label.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in label.split_whitespace() {
        let word_width = display_width(word);

        if current_width == 0 {
            current_line = word.to_string();
            current_width = word_width;
        } else if current_width + 1 + word_width <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(current_line);
            current_line = word.to_string();
            current_width = word_width;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Measures blocks of text in device pixels
#[derive(Debug, Clone, Copy)]
pub struct TextMeasurer {
    char_width: i32,
    line_height: i32,
    max_label_width: usize,
}

impl TextMeasurer {
    pub fn new(char_width: i32, line_height: i32, max_label_width: usize) -> Self {
        Self {
            char_width,
            line_height,
            max_label_width,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.char_width, config.line_height, config.max_label_width)
    }

    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    /// Wrap a label with the configured width limit
    pub fn wrap(&self, label: &str) -> Vec<String> {
        wrap_label(label, self.max_label_width)
    }

    /// Pixel size of a set of lines, without padding
    pub fn measure_lines<S: AsRef<str>>(&self, lines: &[S]) -> Size {
        let columns = lines
            .iter()
            .map(|l| display_width(l.as_ref()))
            .max()
            .unwrap_or(0);
        Size::new(
            columns as i32 * self.char_width,
            lines.len() as i32 * self.line_height,
        )
    }

    /// Pixel size of a single (possibly wrapped) label
    pub fn measure(&self, label: &str) -> Size {
        self.measure_lines(&self.wrap(label))
    }
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}
