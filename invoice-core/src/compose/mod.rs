//! Invoice document layout.
//!
//! The composer turns a computed invoice into an A4 PDF. The first page
//! carries the business identity, title and party blocks; the items
//! table flows onto further pages with its header repeated, and the
//! footer line is drawn on every page.

mod document;
mod labels;

pub use document::Document;
pub use labels::Labels;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use invoice_pdf::{
    fit_placement, BuiltinFont, Cell, CellStyle, Color, FitResult, FontRef, ImageId, PdfDocument,
    Rect, Row, Table, TableCursor, TextAlign, TextDirection, TextStyle, A4_HEIGHT, A4_WIDTH,
};

use crate::calc::{ComputedLineItem, InvoiceSummary};
use crate::error::{LogoError, RenderError};
use crate::format;
use crate::model::{ClientDetails, DisplayFlags, Invoice, InvoiceHeader};

const MARGIN: f64 = 40.0;
const CONTENT_WIDTH: f64 = A4_WIDTH - 2.0 * MARGIN;
/// Nothing but the footer goes below this line.
const BODY_BOTTOM: f64 = 50.0;
const FOOTER_BASELINE: f64 = 20.0;
const LOGO_WIDTH: f64 = 120.0;
const LOGO_HEIGHT: f64 = 40.0;
const SUMMARY_WIDTH: f64 = 240.0;

fn teal() -> Color {
    Color::rgb8(22, 160, 133)
}

fn dark_teal() -> Color {
    Color::rgb8(16, 128, 103)
}

fn gray(level: u8) -> Color {
    Color::rgb8(level, level, level)
}

/// Presentation choices that are not part of the invoice itself.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub labels: Labels,
    /// Printed after every amount.
    pub currency: String,
    /// `Rtl` mirrors every block and orders table columns right to left.
    pub direction: TextDirection,
    /// TrueType data for body text. Without it the standard Helvetica
    /// faces are used, which cover Latin text only.
    pub regular_font: Option<Vec<u8>>,
    /// Falls back to `regular_font`.
    pub bold_font: Option<Vec<u8>>,
    pub compress: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            labels: Labels::english(),
            currency: "SAR".into(),
            direction: TextDirection::Ltr,
            regular_font: None,
            bold_font: None,
            compress: false,
        }
    }
}

impl RenderOptions {
    /// Arabic labels, riyal symbol and right-to-left layout. Pair with
    /// [`RenderOptions::with_fonts`] for legible output.
    pub fn arabic() -> Self {
        RenderOptions {
            labels: Labels::arabic(),
            currency: "ر.س".into(),
            direction: TextDirection::Rtl,
            ..RenderOptions::default()
        }
    }

    pub fn with_fonts(mut self, regular: Vec<u8>, bold: Option<Vec<u8>>) -> Self {
        self.regular_font = Some(regular);
        self.bold_font = bold;
        self
    }
}

/// Renders invoices with a fixed set of [`RenderOptions`].
#[derive(Debug, Clone, Default)]
pub struct Composer {
    options: RenderOptions,
}

impl Composer {
    pub fn new(options: RenderOptions) -> Self {
        Composer { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Lay out one invoice. The output depends only on the arguments.
    pub fn compose(
        &self,
        header: &InvoiceHeader<'_>,
        client: &ClientDetails,
        items: &[ComputedLineItem],
        summary: &InvoiceSummary,
        notes: &str,
        flags: &DisplayFlags,
    ) -> Result<Document, RenderError> {
        let mut doc = PdfDocument::new(Vec::new())?;
        doc.set_compression(self.options.compress);
        doc.set_info("Title", header.id);
        doc.set_info("Producer", "invoice-core");

        let (regular, bold) = self.load_fonts(&mut doc)?;
        let logo = match header.business.logo.as_deref().map(str::trim) {
            Some(data) if !data.is_empty() => Some(load_logo(&mut doc, data)?),
            _ => None,
        };

        let mut pen = Pen {
            doc,
            opts: &self.options,
            regular,
            bold,
            y: 0.0,
        };
        pen.start_page()?;
        pen.identity(header, flags, logo)?;
        pen.title()?;
        pen.parties(header, client, flags)?;
        pen.items_table(items, flags)?;
        pen.summary(summary, flags)?;
        pen.notes(notes)?;
        let bytes = pen.finish()?;

        let document = Document::from_bytes(bytes);
        tracing::debug!(
            id = header.id,
            pages = document.page_count(),
            bytes = document.len(),
            "invoice rendered"
        );
        Ok(document)
    }

    /// Compute and lay out a stored invoice under its own snapshot.
    pub fn compose_invoice(&self, invoice: &Invoice) -> Result<Document, RenderError> {
        let (items, summary) = invoice.compute();
        self.compose(
            &invoice.header(),
            invoice.client(),
            &items,
            &summary,
            invoice.notes(),
            invoice.flags(),
        )
    }

    fn load_fonts(&self, doc: &mut PdfDocument<Vec<u8>>) -> Result<(FontRef, FontRef), RenderError> {
        let Some(regular_data) = &self.options.regular_font else {
            return Ok((
                FontRef::Builtin(BuiltinFont::Helvetica),
                FontRef::Builtin(BuiltinFont::HelveticaBold),
            ));
        };
        let regular = doc
            .load_font_bytes(regular_data.clone())
            .map_err(RenderError::Font)?;
        let bold = match &self.options.bold_font {
            Some(data) => doc.load_font_bytes(data.clone()).map_err(RenderError::Font)?,
            None => regular,
        };
        Ok((regular, bold))
    }
}

/// Render with default options: English labels, Helvetica, left to right.
pub fn render(
    header: &InvoiceHeader<'_>,
    client: &ClientDetails,
    items: &[ComputedLineItem],
    summary: &InvoiceSummary,
    notes: &str,
    flags: &DisplayFlags,
) -> Result<Document, RenderError> {
    Composer::default().compose(header, client, items, summary, notes, flags)
}

/// Accepts a `data:image/...;base64,` URI or bare base64.
fn decode_logo(data: &str) -> Result<Vec<u8>, LogoError> {
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    Ok(STANDARD.decode(payload.trim())?)
}

fn load_logo(doc: &mut PdfDocument<Vec<u8>>, data: &str) -> Result<ImageId, RenderError> {
    let bytes = decode_logo(data).map_err(RenderError::Logo)?;
    doc.load_image_bytes(bytes)
        .map_err(|e| RenderError::Logo(LogoError::Image(e)))
}

/// Layout state: the document plus the current baseline.
struct Pen<'a> {
    doc: PdfDocument<Vec<u8>>,
    opts: &'a RenderOptions,
    regular: FontRef,
    bold: FontRef,
    y: f64,
}

impl Pen<'_> {
    fn dir(&self) -> TextDirection {
        self.opts.direction
    }

    fn leading(&self) -> TextAlign {
        TextAlign::leading(self.opts.direction)
    }

    fn trailing(&self) -> TextAlign {
        TextAlign::trailing(self.opts.direction)
    }

    fn style(&self, bold: bool, font_size: f64) -> TextStyle {
        TextStyle {
            font: if bold { self.bold } else { self.regular },
            font_size,
        }
    }

    fn text(
        &mut self,
        text: &str,
        x: f64,
        width: f64,
        align: TextAlign,
        style: TextStyle,
        color: Color,
    ) -> Result<(), RenderError> {
        let dir = self.dir();
        self.doc
            .place_text_aligned(text, x, width, self.y, align, &style, color, dir)?;
        Ok(())
    }

    fn start_page(&mut self) -> Result<(), RenderError> {
        self.doc.begin_page(A4_WIDTH, A4_HEIGHT)?;
        self.y = A4_HEIGHT - MARGIN;
        Ok(())
    }

    fn footer(&mut self) -> Result<(), RenderError> {
        let opts = self.opts;
        let saved = self.y;
        self.y = FOOTER_BASELINE;
        let style = self.style(false, 8.0);
        self.text(&opts.labels.footer, MARGIN, CONTENT_WIDTH, TextAlign::Center, style, gray(150))?;
        self.y = saved;
        Ok(())
    }

    fn break_page(&mut self) -> Result<(), RenderError> {
        self.footer()?;
        self.start_page()?;
        tracing::debug!(page = self.doc.page_count(), "page break");
        Ok(())
    }

    /// Start a new page unless `needed` points fit above the footer.
    fn ensure_space(&mut self, needed: f64) -> Result<(), RenderError> {
        if self.y - needed < BODY_BOTTOM {
            self.break_page()?;
        }
        Ok(())
    }

    fn body_rect(&self) -> Rect {
        Rect {
            x: MARGIN,
            y: self.y,
            width: CONTENT_WIDTH,
            height: self.y - BODY_BOTTOM,
        }
    }

    fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        self.footer()?;
        Ok(self.doc.end_document()?)
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Business name and details on the leading side, logo on the other.
    fn identity(
        &mut self,
        header: &InvoiceHeader<'_>,
        flags: &DisplayFlags,
        logo: Option<ImageId>,
    ) -> Result<(), RenderError> {
        let labels = &self.opts.labels;
        let business = header.business;
        let top = self.y;
        let rtl = self.dir() == TextDirection::Rtl;

        let (text_x, text_width) = match (logo, rtl) {
            (None, _) => (MARGIN, CONTENT_WIDTH),
            (Some(_), false) => (MARGIN, CONTENT_WIDTH - LOGO_WIDTH - 10.0),
            (Some(_), true) => (MARGIN + LOGO_WIDTH + 10.0, CONTENT_WIDTH - LOGO_WIDTH - 10.0),
        };

        let mut details = Vec::new();
        if !business.tax_number.is_empty() {
            details.push(format!("{}: {}", labels.tax_number, business.tax_number));
        }
        if flags.show_commercial_register && !business.commercial_register.is_empty() {
            details.push(format!("{}: {}", labels.commercial_register, business.commercial_register));
        }
        if flags.show_business_address && !business.address.is_empty() {
            details.push(format!("{}: {}", labels.address, business.address));
        }
        if !business.phone.is_empty() {
            details.push(format!("{}: {}", labels.phone, business.phone));
        }
        if flags.show_website && !business.website.is_empty() {
            details.push(format!("{}: {}", labels.website, business.website));
        }

        let lead = self.leading();
        self.y -= 18.0;
        let name_style = self.style(true, 18.0);
        self.text(&business.name, text_x, text_width, lead, name_style, gray(40))?;
        self.y -= 4.0;
        let detail_style = self.style(false, 10.0);
        let dir = self.dir();
        for detail in &details {
            for line in self.doc.wrap(detail, text_width, &detail_style, dir) {
                self.y -= 13.0;
                self.text(&line, text_x, text_width, lead, detail_style, gray(100))?;
            }
        }

        if let Some(id) = logo {
            let (w, h) = self.doc.image_size(id).unwrap_or((1, 1));
            let slot = Rect {
                x: if rtl { MARGIN } else { MARGIN + CONTENT_WIDTH - LOGO_WIDTH },
                y: top,
                width: LOGO_WIDTH,
                height: LOGO_HEIGHT,
            };
            let placement = fit_placement(w, h, &slot, !rtl);
            self.doc.place_image(id, &placement)?;
            self.y = self.y.min(top - LOGO_HEIGHT);
        }
        self.y -= 24.0;
        Ok(())
    }

    fn title(&mut self) -> Result<(), RenderError> {
        let opts = self.opts;
        let style = self.style(true, 16.0);
        self.text(&opts.labels.title, MARGIN, CONTENT_WIDTH, TextAlign::Center, style, gray(40))?;
        self.y -= 24.0;
        Ok(())
    }

    /// Invoice number and date on the leading side, the client on the
    /// trailing side.
    fn parties(
        &mut self,
        header: &InvoiceHeader<'_>,
        client: &ClientDetails,
        flags: &DisplayFlags,
    ) -> Result<(), RenderError> {
        let labels = &self.opts.labels;
        let half = CONTENT_WIDTH / 2.0;
        let (lead_x, trail_x) = match self.dir() {
            TextDirection::Ltr => (MARGIN, MARGIN + half),
            TextDirection::Rtl => (MARGIN + half, MARGIN),
        };

        let invoice_lines = [
            format!("{}: {}", labels.invoice_number, header.id),
            format!("{}: {}", labels.issue_date, header.issue_date.format("%Y-%m-%d")),
        ];
        let mut client_lines = vec![(labels.bill_to.clone(), false), (client.name.clone(), true)];
        if !client.phone.is_empty() {
            client_lines.push((format!("{}: {}", labels.client_phone, client.phone), false));
        }
        if flags.show_client_address && !client.address.is_empty() {
            client_lines.push((format!("{}: {}", labels.client_address, client.address), false));
        }

        let top = self.y;
        let dir = self.dir();
        let (lead, trail) = (self.leading(), self.trailing());
        let regular = self.style(false, 10.0);
        let mut lead_rows: u32 = 0;
        for line in &invoice_lines {
            for part in self.doc.wrap(line, half, &regular, dir) {
                lead_rows += 1;
                self.y = top - 14.0 * f64::from(lead_rows);
                self.text(&part, lead_x, half, lead, regular, gray(50))?;
            }
        }
        let mut trail_rows: u32 = 0;
        for (line, bold) in &client_lines {
            let style = self.style(*bold, 10.0);
            for part in self.doc.wrap(line, half, &style, dir) {
                trail_rows += 1;
                self.y = top - 14.0 * f64::from(trail_rows);
                self.text(&part, trail_x, half, trail, style, gray(50))?;
            }
        }

        let rows = lead_rows.max(trail_rows);
        self.y = top - 14.0 * f64::from(rows) - 18.0;
        Ok(())
    }

    /// Columns for the enabled fields: label, width, alignment.
    fn columns(&self, flags: &DisplayFlags) -> Vec<(String, f64, TextAlign)> {
        let labels = &self.opts.labels;
        let amount = self.trailing();
        let mut cols = vec![
            (labels.product.clone(), 0.0, self.leading()),
            (labels.quantity.clone(), 40.0, TextAlign::Center),
            (labels.unit_price.clone(), 70.0, amount),
        ];
        if flags.show_discount {
            cols.push((labels.discount_percent.clone(), 64.0, TextAlign::Center));
        }
        if flags.show_tax {
            cols.push((labels.tax_percent.clone(), 45.0, TextAlign::Center));
            cols.push((labels.tax_amount.clone(), 70.0, amount));
        }
        cols.push((labels.total.clone(), 80.0, amount));

        // The product column takes whatever width is left.
        let fixed: f64 = cols.iter().map(|c| c.1).sum();
        cols[0].1 = CONTENT_WIDTH - fixed;
        cols
    }

    fn cell(&self, text: String, align: TextAlign) -> Cell {
        Cell::styled(
            text,
            CellStyle {
                font: self.regular,
                text_color: Some(gray(50)),
                text_align: align,
                ..CellStyle::default()
            },
        )
    }

    fn item_row(&self, item: &ComputedLineItem, flags: &DisplayFlags, cols: &[(String, f64, TextAlign)]) -> Row {
        let currency = &self.opts.currency;
        let mut values = vec![
            item.item.name.clone(),
            format::quantity(item.item.quantity),
            format::money(item.item.unit_price, currency),
        ];
        if flags.show_discount {
            values.push(format::percent(item.item.discount_percent));
        }
        if flags.show_tax {
            values.push(format::percent(item.item.tax_percent));
            values.push(format::money(item.tax_amount, currency));
        }
        values.push(format::money(item.total, currency));

        Row::new(
            values
                .into_iter()
                .zip(cols)
                .map(|(value, col)| self.cell(value, col.2))
                .collect(),
        )
    }

    fn place_header(&mut self, table: &Table, header: &Row, cursor: &mut TableCursor) -> Result<(), RenderError> {
        match self.doc.fit_row(table, header, cursor)? {
            FitResult::Stop => Ok(()),
            _ => Err(RenderError::Layout("table header does not fit on a page".into())),
        }
    }

    /// One row per item; rows that do not fit continue on a new page
    /// under a repeated header row.
    fn items_table(&mut self, items: &[ComputedLineItem], flags: &DisplayFlags) -> Result<(), RenderError> {
        let cols = self.columns(flags);
        let mut table = Table::new(cols.iter().map(|c| c.1).collect());
        table.direction = self.dir();
        table.border_color = gray(200);

        let header_style = CellStyle {
            font: self.bold,
            text_color: Some(Color::WHITE),
            text_align: TextAlign::Center,
            ..CellStyle::default()
        };
        let mut header = Row::new(
            cols.iter()
                .map(|c| Cell::styled(c.0.clone(), header_style.clone()))
                .collect(),
        );
        header.background_color = Some(teal());

        self.ensure_space(60.0)?;
        let mut cursor = TableCursor::new(&self.body_rect());
        self.place_header(&table, &header, &mut cursor)?;

        let mut rows_on_page = 0usize;
        let mut page_is_fresh = false;
        for (index, item) in items.iter().enumerate() {
            let row = self.item_row(item, flags, &cols);
            loop {
                match self.doc.fit_row(&table, &row, &mut cursor)? {
                    FitResult::Stop => {
                        rows_on_page += 1;
                        break;
                    }
                    FitResult::BoxFull if rows_on_page > 0 || !page_is_fresh => {
                        self.break_page()?;
                        cursor.reset(&self.body_rect());
                        self.place_header(&table, &header, &mut cursor)?;
                        rows_on_page = 0;
                        page_is_fresh = true;
                    }
                    _ => {
                        return Err(RenderError::Layout(format!(
                            "line item {} does not fit on a page",
                            index + 1
                        )))
                    }
                }
            }
        }

        self.y = cursor.current_y() - 22.0;
        Ok(())
    }

    /// Subtotal, optional discount and tax, then the grand total. Kept
    /// together on one page.
    fn summary(&mut self, summary: &InvoiceSummary, flags: &DisplayFlags) -> Result<(), RenderError> {
        let opts = self.opts;
        let labels = &opts.labels;
        let currency = &opts.currency;

        let mut lines = vec![(&labels.subtotal, summary.subtotal)];
        if flags.show_discount {
            lines.push((&labels.total_discount, summary.total_discount));
        }
        if flags.show_tax {
            lines.push((&labels.total_tax, summary.total_tax));
        }
        self.ensure_space(lines.len() as f64 * 16.0 + 30.0)?;

        let x = match self.dir() {
            TextDirection::Ltr => MARGIN + CONTENT_WIDTH - SUMMARY_WIDTH,
            TextDirection::Rtl => MARGIN,
        };
        let (lead, trail) = (self.leading(), self.trailing());
        let regular = self.style(false, 10.0);
        for (label, amount) in lines {
            self.y -= 16.0;
            self.text(label, x, SUMMARY_WIDTH, lead, regular, gray(50))?;
            self.text(&format::money(amount, currency), x, SUMMARY_WIDTH, trail, regular, gray(50))?;
        }

        self.y -= 8.0;
        self.doc
            .save_state()?
            .set_stroke_color(gray(200))?
            .set_line_width(0.75)?
            .move_to(x, self.y)?
            .line_to(x + SUMMARY_WIDTH, self.y)?
            .stroke()?
            .restore_state()?;

        self.y -= 18.0;
        let total_style = self.style(true, 12.0);
        self.text(&labels.grand_total, x, SUMMARY_WIDTH, lead, total_style, dark_teal())?;
        let grand_total = format::money(summary.grand_total, currency);
        self.text(&grand_total, x, SUMMARY_WIDTH, trail, total_style, dark_teal())?;
        self.y -= 24.0;
        Ok(())
    }

    /// Word-wrapped notes, continued on new pages as needed.
    fn notes(&mut self, notes: &str) -> Result<(), RenderError> {
        if notes.trim().is_empty() {
            return Ok(());
        }
        let opts = self.opts;
        let style = self.style(false, 10.0);
        let line_height = self.doc.line_height(&style);
        let lines = self.doc.wrap(notes.trim(), CONTENT_WIDTH, &style, self.dir());
        let lead = self.leading();

        self.ensure_space(line_height * 2.0)?;
        self.y -= line_height;
        let label_style = self.style(true, 10.0);
        self.text(&opts.labels.notes, MARGIN, CONTENT_WIDTH, lead, label_style, gray(80))?;
        for line in &lines {
            self.ensure_space(line_height)?;
            self.y -= line_height;
            self.text(line, MARGIN, CONTENT_WIDTH, lead, style, gray(80))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_logo_accepts_data_uri_and_bare_base64() {
        assert_eq!(decode_logo("data:image/png;base64,iVBORw==").unwrap(), b"\x89PNG");
        assert_eq!(decode_logo("iVBORw==").unwrap(), b"\x89PNG");
        assert!(matches!(decode_logo("data:image/png;base64,@@@"), Err(LogoError::Base64(_))));
    }

    #[test]
    fn product_column_takes_remaining_width() {
        let opts = RenderOptions::default();
        let pen = Pen {
            doc: PdfDocument::new(Vec::new()).unwrap(),
            opts: &opts,
            regular: FontRef::Builtin(BuiltinFont::Helvetica),
            bold: FontRef::Builtin(BuiltinFont::HelveticaBold),
            y: 0.0,
        };
        let all = pen.columns(&DisplayFlags::default());
        assert_eq!(all.len(), 7);
        let total: f64 = all.iter().map(|c| c.1).sum();
        assert!((total - CONTENT_WIDTH).abs() < 1e-9);

        let bare = DisplayFlags {
            show_tax: false,
            show_discount: false,
            ..DisplayFlags::default()
        };
        let cols = pen.columns(&bare);
        let names: Vec<&str> = cols.iter().map(|c| c.0.as_str()).collect();
        assert_eq!(names, ["Product/Service", "Qty", "Unit price", "Total"]);
    }

    #[test]
    fn english_headers_fit_on_one_line() {
        let opts = RenderOptions::default();
        let pen = Pen {
            doc: PdfDocument::new(Vec::new()).unwrap(),
            opts: &opts,
            regular: FontRef::Builtin(BuiltinFont::Helvetica),
            bold: FontRef::Builtin(BuiltinFont::HelveticaBold),
            y: 0.0,
        };
        let padding = CellStyle::default().padding;
        for (label, width, _) in pen.columns(&DisplayFlags::default()) {
            let text_width = BuiltinFont::HelveticaBold.measure(&label, 9.0);
            assert!(
                text_width <= width - 2.0 * padding,
                "{:?} is {:.1}pt wide in a {:.1}pt column",
                label,
                text_width,
                width
            );
        }
    }
}
