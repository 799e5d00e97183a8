use crate::document::format_coord;
use crate::fonts::{BuiltinFont, FontRef};
use crate::graphics::Color;
use crate::text::{
    emit_line, line_height_for, measure_text, wrap_text, FitResult, Rect, TextAlign,
    TextDirection, TextStyle,
};
use crate::truetype::TrueTypeFont;

/// Style options for a table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    /// Cell background; overrides the row background.
    pub background_color: Option<Color>,
    /// Text color, black when unset.
    pub text_color: Option<Color>,
    pub font: FontRef,
    pub font_size: f64,
    /// Padding on all four sides, in points.
    pub padding: f64,
    pub text_align: TextAlign,
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle {
            background_color: None,
            text_color: None,
            font: FontRef::Builtin(BuiltinFont::Helvetica),
            font_size: 9.0,
            padding: 4.0,
            text_align: TextAlign::Left,
        }
    }
}

impl CellStyle {
    fn text_style(&self) -> TextStyle {
        TextStyle {
            font: self.font,
            font_size: self.font_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Cell {
            text: text.into(),
            style: CellStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: CellStyle) -> Self {
        Cell {
            text: text.into(),
            style,
        }
    }
}

/// A row of cells, in logical column order.
#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Background for the whole row; per-cell colors win.
    pub background_color: Option<Color>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row {
            cells,
            background_color: None,
        }
    }
}

/// Table layout: column widths and border style. Rows are supplied one
/// at a time through `PdfDocument::fit_row`, so a caller can break
/// pages between rows.
#[derive(Debug, Clone)]
pub struct Table {
    /// Column widths in points, logical order.
    pub columns: Vec<f64>,
    pub border_color: Color,
    /// Set to `0.0` for a borderless table.
    pub border_width: f64,
    /// `Rtl` places the first logical column at the right edge and
    /// shapes cell text right-to-left.
    pub direction: TextDirection,
}

impl Table {
    pub fn new(columns: Vec<f64>) -> Self {
        Table {
            columns,
            border_color: Color::BLACK,
            border_width: 0.5,
            direction: TextDirection::Ltr,
        }
    }

    pub fn width(&self) -> f64 {
        self.columns.iter().sum()
    }

    /// Left edge of every logical column for a table starting at `left`.
    fn column_lefts(&self, left: f64) -> Vec<f64> {
        let mut lefts = Vec::with_capacity(self.columns.len());
        match self.direction {
            TextDirection::Ltr => {
                let mut x = left;
                for &w in &self.columns {
                    lefts.push(x);
                    x += w;
                }
            }
            TextDirection::Rtl => {
                let mut right = left + self.width();
                for &w in &self.columns {
                    right -= w;
                    lefts.push(right);
                }
            }
        }
        lefts
    }

    /// Height the row needs: tallest wrapped cell plus padding.
    pub(crate) fn row_height(&self, row: &Row, tt_fonts: &[TrueTypeFont]) -> f64 {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, &width)| match row.cells.get(i) {
                Some(cell) => {
                    let ts = cell.style.text_style();
                    let avail = (width - 2.0 * cell.style.padding).max(0.0);
                    let lines = wrap_text(&cell.text, avail, &ts, self.direction, tt_fonts).len();
                    lines as f64 * line_height_for(&ts, tt_fonts) + 2.0 * cell.style.padding
                }
                None => {
                    let style = CellStyle::default();
                    line_height_for(&style.text_style(), tt_fonts) + 2.0 * style.padding
                }
            })
            .fold(0.0_f64, f64::max)
    }

    /// Content bytes for one row, advancing `cursor` when it fits.
    pub(crate) fn generate_row_ops(
        &self,
        row: &Row,
        cursor: &mut TableCursor,
        tt_fonts: &mut [TrueTypeFont],
    ) -> (Vec<u8>, FitResult) {
        let height = self.row_height(row, tt_fonts);
        if cursor.current_y - height < cursor.rect.bottom() {
            // A fresh page that cannot hold the row at all is reported
            // differently from a page that has simply filled up.
            let result = if cursor.first_row {
                FitResult::BoxEmpty
            } else {
                FitResult::BoxFull
            };
            return (Vec::new(), result);
        }

        let top = cursor.current_y;
        let lefts = self.column_lefts(cursor.rect.x);
        let mut out = Vec::new();

        self.draw_backgrounds(row, &lefts, cursor.rect.x, top, height, &mut out);
        for ((cell, &left), &width) in row.cells.iter().zip(&lefts).zip(&self.columns) {
            self.render_cell(cell, left, top, width, tt_fonts, &mut out);
        }
        if self.border_width > 0.0 {
            self.draw_borders(&lefts, top, height, &mut out);
        }

        cursor.current_y -= height;
        cursor.first_row = false;
        (out, FitResult::Stop)
    }

    fn draw_backgrounds(
        &self,
        row: &Row,
        lefts: &[f64],
        table_left: f64,
        top: f64,
        height: f64,
        out: &mut Vec<u8>,
    ) {
        let bottom = top - height;
        if let Some(bg) = row.background_color {
            fill_rect(out, bg, table_left, bottom, self.width(), height);
        }
        for ((cell, &left), &width) in row.cells.iter().zip(lefts).zip(&self.columns) {
            if let Some(bg) = cell.style.background_color {
                fill_rect(out, bg, left, bottom, width, height);
            }
        }
    }

    /// Outer rectangle plus the vertical dividers between columns.
    fn draw_borders(&self, lefts: &[f64], top: f64, height: f64, out: &mut Vec<u8>) {
        let bottom = top - height;
        let table_left = lefts.iter().copied().fold(f64::INFINITY, f64::min);
        let c = self.border_color;
        out.extend_from_slice(
            format!(
                "q\n{} {} {} RG\n{} w\n{} {} {} {} re\nS\n",
                format_coord(c.r),
                format_coord(c.g),
                format_coord(c.b),
                format_coord(self.border_width),
                format_coord(table_left),
                format_coord(bottom),
                format_coord(self.width()),
                format_coord(height),
            )
            .as_bytes(),
        );
        for &x in lefts.iter().filter(|&&x| x > table_left) {
            out.extend_from_slice(
                format!(
                    "{} {} m\n{} {} l\nS\n",
                    format_coord(x),
                    format_coord(top),
                    format_coord(x),
                    format_coord(bottom),
                )
                .as_bytes(),
            );
        }
        out.extend_from_slice(b"Q\n");
    }

    fn render_cell(
        &self,
        cell: &Cell,
        left: f64,
        top: f64,
        width: f64,
        tt_fonts: &mut [TrueTypeFont],
        out: &mut Vec<u8>,
    ) {
        let style = &cell.style;
        let ts = style.text_style();
        let avail = (width - 2.0 * style.padding).max(0.0);
        let lh = line_height_for(&ts, tt_fonts);
        let color = style.text_color.unwrap_or(Color::BLACK);
        let lines = wrap_text(&cell.text, avail, &ts, self.direction, tt_fonts);

        // First baseline sits one font size below the padded top edge.
        let mut baseline = top - style.padding - style.font_size;
        for line in &lines {
            let line_width = measure_text(line, &ts, self.direction, tt_fonts);
            let x = style.text_align.line_x(left + style.padding, avail, line_width);
            emit_line(out, line, x, baseline, &ts, color, self.direction, tt_fonts);
            baseline -= lh;
        }
    }
}

fn fill_rect(out: &mut Vec<u8>, color: Color, x: f64, y: f64, width: f64, height: f64) {
    out.extend_from_slice(
        format!(
            "q\n{} {} {} rg\n{} {} {} {} re\nf\nQ\n",
            format_coord(color.r),
            format_coord(color.g),
            format_coord(color.b),
            format_coord(x),
            format_coord(y),
            format_coord(width),
            format_coord(height),
        )
        .as_bytes(),
    );
}

/// Where the next row goes on the current page.
///
/// Create one per table area and pass it to every `fit_row` call; call
/// `reset` after starting a new page. `is_first_row` tells the caller a
/// page is fresh, which is where a header row gets repeated.
#[derive(Debug, Clone)]
pub struct TableCursor {
    pub(crate) rect: Rect,
    pub(crate) current_y: f64,
    pub(crate) first_row: bool,
}

impl TableCursor {
    pub fn new(rect: &Rect) -> Self {
        TableCursor {
            rect: *rect,
            current_y: rect.y,
            first_row: true,
        }
    }

    pub fn reset(&mut self, rect: &Rect) {
        *self = TableCursor::new(rect);
    }

    pub fn is_first_row(&self) -> bool {
        self.first_row
    }

    /// Bottom edge of the last placed row (or the rect top if none).
    pub fn current_y(&self) -> f64 {
        self.current_y
    }

    /// Space left below the last placed row.
    pub fn remaining(&self) -> f64 {
        self.current_y - self.rect.bottom()
    }
}
