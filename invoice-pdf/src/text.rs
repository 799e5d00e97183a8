use unicode_bidi::{BidiInfo, Level};

use crate::document::format_coord;
use crate::fonts::{self, BuiltinFont, FontRef};
use crate::graphics::Color;
use crate::truetype::TrueTypeFont;
use crate::writer::escape_pdf_bytes;

/// Result of fitting content into a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitResult {
    /// Everything has been placed.
    Stop,
    /// The box is full but content remains.
    BoxFull,
    /// The box is too small to hold anything at all.
    BoxEmpty,
}

/// A layout box. `(x, y)` is the upper-left corner in PDF page
/// coordinates, so the box spans `y - height ..= y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.y - self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Base direction of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Horizontal placement of a line inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// The side a paragraph starts on.
    pub fn leading(direction: TextDirection) -> Self {
        match direction {
            TextDirection::Ltr => TextAlign::Left,
            TextDirection::Rtl => TextAlign::Right,
        }
    }

    /// The side opposite to [`TextAlign::leading`].
    pub fn trailing(direction: TextDirection) -> Self {
        match direction {
            TextDirection::Ltr => TextAlign::Right,
            TextDirection::Rtl => TextAlign::Left,
        }
    }

    /// X position of a line of `line_width` inside `[x, x + width]`.
    pub fn line_x(&self, x: f64, width: f64, line_width: f64) -> f64 {
        match self {
            TextAlign::Left => x,
            TextAlign::Center => x + (width - line_width) / 2.0,
            TextAlign::Right => x + width - line_width,
        }
    }
}

/// Font and size for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontRef,
    pub font_size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font: FontRef::Builtin(BuiltinFont::Helvetica),
            font_size: 10.0,
        }
    }
}

/// A maximal substring with a single resolved direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionalRun<'a> {
    pub text: &'a str,
    pub direction: TextDirection,
}

/// Split one line into directional runs, returned in visual order
/// (leftmost first) as resolved by the Unicode Bidirectional Algorithm.
/// Runs keep logical character order; glyph order inside a
/// right-to-left run is the shaper's job.
pub fn visual_runs(text: &str, base: TextDirection) -> Vec<DirectionalRun<'_>> {
    if text.is_empty() {
        return Vec::new();
    }
    let level = match base {
        TextDirection::Ltr => Level::ltr(),
        TextDirection::Rtl => Level::rtl(),
    };
    let info = BidiInfo::new(text, Some(level));
    let mut runs = Vec::new();
    for para in &info.paragraphs {
        let (levels, ranges) = info.visual_runs(para, para.range.clone());
        for range in ranges {
            let direction = if levels[range.start].is_rtl() {
                TextDirection::Rtl
            } else {
                TextDirection::Ltr
            };
            runs.push(DirectionalRun {
                text: &text[range],
                direction,
            });
        }
    }
    runs
}

/// Line advance for a style.
pub(crate) fn line_height_for(style: &TextStyle, tt_fonts: &[TrueTypeFont]) -> f64 {
    match style.font {
        FontRef::Builtin(_) => fonts::line_height(style.font_size),
        FontRef::TrueType(id) => tt_fonts[id.0].line_height(style.font_size),
    }
}

/// Rendered width of `text` in points.
pub(crate) fn measure_text(
    text: &str,
    style: &TextStyle,
    direction: TextDirection,
    tt_fonts: &[TrueTypeFont],
) -> f64 {
    match style.font {
        FontRef::Builtin(b) => b.measure(text, style.font_size),
        FontRef::TrueType(id) => {
            let font = &tt_fonts[id.0];
            visual_runs(text, direction)
                .iter()
                .map(|run| {
                    TrueTypeFont::run_width(&font.shape(run.text, run.direction), style.font_size)
                })
                .sum()
        }
    }
}

/// Word-wrap `text` into lines no wider than `avail_width`. Explicit
/// newlines start a new line; words wider than the box are broken
/// between characters.
pub(crate) fn wrap_text(
    text: &str,
    avail_width: f64,
    style: &TextStyle,
    direction: TextDirection,
    tt_fonts: &[TrueTypeFont],
) -> Vec<String> {
    let measure = |s: &str| measure_text(s, style, direction, tt_fonts);
    let mut lines = Vec::new();

    for para in text.split('\n') {
        let mut current = String::new();
        for word in para.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if measure(&candidate) <= avail_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure(word) <= avail_width {
                current = word.to_string();
                continue;
            }
            // Oversized word: break it character by character.
            for ch in word.chars() {
                current.push(ch);
                if measure(&current) > avail_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Emit one line of text as a self-contained `BT ... ET` block with
/// its first glyph origin at `(x, baseline)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn emit_line(
    out: &mut Vec<u8>,
    line: &str,
    x: f64,
    baseline: f64,
    style: &TextStyle,
    color: Color,
    direction: TextDirection,
    tt_fonts: &mut [TrueTypeFont],
) {
    if line.is_empty() {
        return;
    }
    let font_name = match style.font {
        FontRef::Builtin(b) => b.pdf_name().to_string(),
        FontRef::TrueType(id) => tt_fonts[id.0].pdf_name.clone(),
    };
    out.extend_from_slice(
        format!(
            "BT\n{} {} {} rg\n/{} {} Tf\n{} {} Td\n",
            format_coord(color.r),
            format_coord(color.g),
            format_coord(color.b),
            font_name,
            format_coord(style.font_size),
            format_coord(x),
            format_coord(baseline),
        )
        .as_bytes(),
    );
    match style.font {
        // Standard Type1 faces carry no right-to-left glyphs, so the line
        // goes out in logical order, WinAnsi encoded.
        FontRef::Builtin(_) => {
            out.push(b'(');
            out.extend_from_slice(&escape_pdf_bytes(&fonts::encode_winansi(line)));
            out.extend_from_slice(b") Tj\n");
        }
        FontRef::TrueType(id) => {
            let font = &mut tt_fonts[id.0];
            for run in visual_runs(line, direction) {
                let glyphs = font.shape(run.text, run.direction);
                let operand = font.encode_tj(&glyphs);
                out.extend_from_slice(format!("{} TJ\n", operand).as_bytes());
            }
        }
    }
    out.extend_from_slice(b"ET\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helv(size: f64) -> TextStyle {
        TextStyle {
            font: FontRef::Builtin(BuiltinFont::Helvetica),
            font_size: size,
        }
    }

    #[test]
    fn align_positions() {
        assert_eq!(TextAlign::Left.line_x(10.0, 100.0, 40.0), 10.0);
        assert_eq!(TextAlign::Center.line_x(10.0, 100.0, 40.0), 40.0);
        assert_eq!(TextAlign::Right.line_x(10.0, 100.0, 40.0), 70.0);
    }

    #[test]
    fn leading_side_follows_direction() {
        assert_eq!(TextAlign::leading(TextDirection::Rtl), TextAlign::Right);
        assert_eq!(TextAlign::trailing(TextDirection::Rtl), TextAlign::Left);
        assert_eq!(TextAlign::leading(TextDirection::Ltr), TextAlign::Left);
    }

    #[test]
    fn wrap_respects_width() {
        let style = helv(10.0);
        let lines = wrap_text(
            "Payment due within thirty days of the issue date",
            100.0,
            &style,
            TextDirection::Ltr,
            &[],
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure_text(line, &style, TextDirection::Ltr, &[]) <= 100.0);
        }
        assert_eq!(
            lines.join(" "),
            "Payment due within thirty days of the issue date"
        );
    }

    #[test]
    fn wrap_keeps_blank_lines() {
        let lines = wrap_text("one\n\ntwo", 500.0, &helv(10.0), TextDirection::Ltr, &[]);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn wrap_breaks_oversized_word() {
        let lines = wrap_text("WWWWWWWWWWWW", 30.0, &helv(10.0), TextDirection::Ltr, &[]);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "WWWWWWWWWWWW");
    }

    #[test]
    fn emit_builtin_line_keeps_logical_order() {
        let mut out = Vec::new();
        emit_line(
            &mut out,
            "Total (SAR)",
            50.0,
            700.0,
            &helv(10.0),
            Color::BLACK,
            TextDirection::Rtl,
            &mut [],
        );
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("/F1 10 Tf\n50 700 Td\n(Total \\(SAR\\)) Tj\n"));
    }
}
