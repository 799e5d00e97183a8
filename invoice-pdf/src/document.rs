use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{PdfError, Result};
use crate::fonts::{BuiltinFont, FontRef, TrueTypeFontId};
use crate::graphics::Color;
use crate::images::{self, ImageData, ImageId, ImagePlacement};
use crate::objects::{ObjId, PdfObject};
use crate::tables::{Row, Table, TableCursor};
use crate::text::{
    emit_line, line_height_for, measure_text, wrap_text, FitResult, TextAlign, TextDirection,
    TextStyle,
};
use crate::truetype::TrueTypeFont;
use crate::writer::PdfWriter;

const CATALOG_OBJ: ObjId = ObjId(1, 0);
const PAGES_OBJ: ObjId = ObjId(2, 0);
const FONT_HELV_OBJ: ObjId = ObjId(3, 0);
const FONT_HELV_BOLD_OBJ: ObjId = ObjId(4, 0);
const FIRST_FREE_OBJ_NUM: u32 = 5;

/// A4 portrait, in points.
pub const A4_WIDTH: f64 = 595.28;
pub const A4_HEIGHT: f64 = 841.89;

/// High-level API for building PDF documents.
///
/// Generic over `Write` so it works with files (`BufWriter<File>`),
/// in-memory buffers (`Vec<u8>`), or any other writer.
///
/// Pages are written as soon as they are closed. Images are written
/// when loaded. Embedded TrueType fonts are written by
/// `end_document`, once every glyph they need is known.
pub struct PdfDocument<W: Write> {
    writer: PdfWriter<W>,
    info: Vec<(String, String)>,
    page_obj_ids: Vec<ObjId>,
    current_page: Option<PageBuilder>,
    next_obj_num: u32,
    compress: bool,
    tt_fonts: Vec<TrueTypeFont>,
    tt_font_obj_ids: Vec<ObjId>,
    images: Vec<LoadedImage>,
}

struct PageBuilder {
    width: f64,
    height: f64,
    content_ops: Vec<u8>,
}

struct LoadedImage {
    obj_id: ObjId,
    width: u32,
    height: u32,
}

impl PdfDocument<BufWriter<File>> {
    /// Create a new PDF document that writes to a file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> PdfDocument<W> {
    /// Create a new PDF document that writes to the given writer.
    /// Writes the PDF header and the two shared Helvetica faces.
    pub fn new(writer: W) -> Result<Self> {
        let mut pdf_writer = PdfWriter::new(writer);
        pdf_writer.write_header()?;

        for (font, id) in BuiltinFont::ALL
            .iter()
            .zip([FONT_HELV_OBJ, FONT_HELV_BOLD_OBJ])
        {
            let dict = PdfObject::dict(vec![
                ("Type", PdfObject::name("Font")),
                ("Subtype", PdfObject::name("Type1")),
                ("BaseFont", PdfObject::name(font.base_name())),
                ("Encoding", PdfObject::name("WinAnsiEncoding")),
            ]);
            pdf_writer.write_object(id, &dict)?;
        }

        Ok(PdfDocument {
            writer: pdf_writer,
            info: Vec::new(),
            page_obj_ids: Vec::new(),
            current_page: None,
            next_obj_num: FIRST_FREE_OBJ_NUM,
            compress: false,
            tt_fonts: Vec::new(),
            tt_font_obj_ids: Vec::new(),
            images: Vec::new(),
        })
    }

    /// Set a document info entry (e.g. "Creator", "Title").
    pub fn set_info(&mut self, key: &str, value: &str) -> &mut Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    /// Flate-compress content streams, images and font files.
    pub fn set_compression(&mut self, enabled: bool) -> &mut Self {
        self.compress = enabled;
        self
    }

    fn alloc_obj_id(&mut self) -> ObjId {
        let id = ObjId(self.next_obj_num, 0);
        self.next_obj_num += 1;
        id
    }

    /// Register a TrueType font from raw `.ttf` bytes.
    pub fn load_font_bytes(&mut self, data: Vec<u8>) -> Result<FontRef> {
        let index = self.tt_fonts.len();
        // F1 and F2 belong to the builtin faces.
        let pdf_name = format!("F{}", index + 3);
        let font = TrueTypeFont::from_bytes(data, pdf_name)?;
        tracing::debug!(font = %font.pdf_name, "loaded TrueType font");
        let obj_id = self.alloc_obj_id();
        self.tt_fonts.push(font);
        self.tt_font_obj_ids.push(obj_id);
        Ok(FontRef::TrueType(TrueTypeFontId(index)))
    }

    /// Load a PNG or JPEG from bytes and write its XObject right away.
    pub fn load_image_bytes(&mut self, data: Vec<u8>) -> Result<ImageId> {
        let image: ImageData = images::load_image(data)?;
        let obj_id = self.alloc_obj_id();
        let smask_id = image.smask.as_ref().map(|_| self.alloc_obj_id());
        for (id, obj) in image.to_objects(obj_id, smask_id, self.compress)? {
            self.writer.write_object(id, &obj)?;
        }
        self.images.push(LoadedImage {
            obj_id,
            width: image.width,
            height: image.height,
        });
        Ok(ImageId(self.images.len() - 1))
    }

    /// Pixel size of a loaded image.
    pub fn image_size(&self, id: ImageId) -> Option<(u32, u32)> {
        self.images.get(id.0).map(|img| (img.width, img.height))
    }

    /// Begin a new page with the given dimensions in points.
    /// If a page is currently open, it is closed first.
    pub fn begin_page(&mut self, width: f64, height: f64) -> Result<&mut Self> {
        if self.current_page.is_some() {
            self.end_page()?;
        }
        self.current_page = Some(PageBuilder {
            width,
            height,
            content_ops: Vec::new(),
        });
        Ok(self)
    }

    /// Pages closed so far plus the open one, if any.
    pub fn page_count(&self) -> usize {
        self.page_obj_ids.len() + usize::from(self.current_page.is_some())
    }

    /// Size of the open page.
    pub fn page_size(&self) -> Option<(f64, f64)> {
        self.current_page.as_ref().map(|p| (p.width, p.height))
    }

    fn page_mut(&mut self, op: &'static str) -> Result<&mut PageBuilder> {
        self.current_page.as_mut().ok_or(PdfError::NoOpenPage(op))
    }

    fn push_ops(&mut self, op: &'static str, ops: &str) -> Result<&mut Self> {
        self.page_mut(op)?.content_ops.extend_from_slice(ops.as_bytes());
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Graphics state and paths
    // ------------------------------------------------------------------

    pub fn save_state(&mut self) -> Result<&mut Self> {
        self.push_ops("save_state", "q\n")
    }

    pub fn restore_state(&mut self) -> Result<&mut Self> {
        self.push_ops("restore_state", "Q\n")
    }

    pub fn set_fill_color(&mut self, color: Color) -> Result<&mut Self> {
        let ops = format!(
            "{} {} {} rg\n",
            format_coord(color.r),
            format_coord(color.g),
            format_coord(color.b)
        );
        self.push_ops("set_fill_color", &ops)
    }

    pub fn set_stroke_color(&mut self, color: Color) -> Result<&mut Self> {
        let ops = format!(
            "{} {} {} RG\n",
            format_coord(color.r),
            format_coord(color.g),
            format_coord(color.b)
        );
        self.push_ops("set_stroke_color", &ops)
    }

    pub fn set_line_width(&mut self, width: f64) -> Result<&mut Self> {
        self.push_ops("set_line_width", &format!("{} w\n", format_coord(width)))
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        let ops = format!("{} {} m\n", format_coord(x), format_coord(y));
        self.push_ops("move_to", &ops)
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        let ops = format!("{} {} l\n", format_coord(x), format_coord(y));
        self.push_ops("line_to", &ops)
    }

    /// Append a rectangle path; `(x, y)` is the bottom-left corner.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<&mut Self> {
        let ops = format!(
            "{} {} {} {} re\n",
            format_coord(x),
            format_coord(y),
            format_coord(width),
            format_coord(height)
        );
        self.push_ops("rect", &ops)
    }

    pub fn stroke(&mut self) -> Result<&mut Self> {
        self.push_ops("stroke", "S\n")
    }

    pub fn fill(&mut self) -> Result<&mut Self> {
        self.push_ops("fill", "f\n")
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Width of `text` in points when set in `style`.
    pub fn measure(&self, text: &str, style: &TextStyle, direction: TextDirection) -> f64 {
        measure_text(text, style, direction, &self.tt_fonts)
    }

    pub fn line_height(&self, style: &TextStyle) -> f64 {
        line_height_for(style, &self.tt_fonts)
    }

    /// Break `text` into lines that fit `width`.
    pub fn wrap(
        &self,
        text: &str,
        width: f64,
        style: &TextStyle,
        direction: TextDirection,
    ) -> Vec<String> {
        wrap_text(text, width, style, direction, &self.tt_fonts)
    }

    /// Place a single line with its origin at `(x, y)`.
    pub fn place_text_styled(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        color: Color,
        direction: TextDirection,
    ) -> Result<&mut Self> {
        let page = self
            .current_page
            .as_mut()
            .ok_or(PdfError::NoOpenPage("place_text_styled"))?;
        emit_line(
            &mut page.content_ops,
            text,
            x,
            y,
            style,
            color,
            direction,
            &mut self.tt_fonts,
        );
        Ok(self)
    }

    /// Place a single line inside `[x, x + width]`, aligned by `align`.
    #[allow(clippy::too_many_arguments)]
    pub fn place_text_aligned(
        &mut self,
        text: &str,
        x: f64,
        width: f64,
        baseline: f64,
        align: TextAlign,
        style: &TextStyle,
        color: Color,
        direction: TextDirection,
    ) -> Result<&mut Self> {
        let line_width = self.measure(text, style, direction);
        let line_x = align.line_x(x, width, line_width);
        self.place_text_styled(text, line_x, baseline, style, color, direction)
    }

    // ------------------------------------------------------------------
    // Tables and images
    // ------------------------------------------------------------------

    /// Place one table row at the cursor. Returns `BoxFull` when the
    /// row does not fit below the rows already on this page, and
    /// `BoxEmpty` when it would not fit even on an empty page.
    pub fn fit_row(
        &mut self,
        table: &Table,
        row: &Row,
        cursor: &mut TableCursor,
    ) -> Result<FitResult> {
        let page = self
            .current_page
            .as_mut()
            .ok_or(PdfError::NoOpenPage("fit_row"))?;
        let (ops, result) = table.generate_row_ops(row, cursor, &mut self.tt_fonts);
        page.content_ops.extend_from_slice(&ops);
        Ok(result)
    }

    /// Draw a loaded image at `placement`.
    pub fn place_image(&mut self, id: ImageId, placement: &ImagePlacement) -> Result<&mut Self> {
        if id.0 >= self.images.len() {
            return Err(PdfError::Image(format!("unknown image id {}", id.0)));
        }
        let ops = format!(
            "q\n{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
            format_coord(placement.width),
            format_coord(placement.height),
            format_coord(placement.x),
            format_coord(placement.y),
            id.0 + 1,
        );
        self.push_ops("place_image", &ops)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    fn resources(&self) -> PdfObject {
        let mut fonts: Vec<(String, PdfObject)> = vec![
            (
                BuiltinFont::Helvetica.pdf_name().to_string(),
                PdfObject::Reference(FONT_HELV_OBJ),
            ),
            (
                BuiltinFont::HelveticaBold.pdf_name().to_string(),
                PdfObject::Reference(FONT_HELV_BOLD_OBJ),
            ),
        ];
        for (font, id) in self.tt_fonts.iter().zip(&self.tt_font_obj_ids) {
            fonts.push((font.pdf_name.clone(), PdfObject::Reference(*id)));
        }

        let mut entries = vec![("Font".to_string(), PdfObject::Dictionary(fonts))];
        if !self.images.is_empty() {
            let xobjects = self
                .images
                .iter()
                .enumerate()
                .map(|(i, img)| (format!("Im{}", i + 1), PdfObject::Reference(img.obj_id)))
                .collect();
            entries.push(("XObject".to_string(), PdfObject::Dictionary(xobjects)));
        }
        PdfObject::Dictionary(entries)
    }

    /// End the current page and write its objects.
    pub fn end_page(&mut self) -> Result<()> {
        let page = self
            .current_page
            .take()
            .ok_or(PdfError::NoOpenPage("end_page"))?;

        let content_id = self.alloc_obj_id();
        let page_id = self.alloc_obj_id();

        let content_stream = if self.compress {
            PdfObject::stream(
                vec![("Filter", PdfObject::name("FlateDecode"))],
                deflate(&page.content_ops)?,
            )
        } else {
            PdfObject::stream(vec![], page.content_ops)
        };
        self.writer.write_object(content_id, &content_stream)?;

        let page_dict = PdfObject::dict(vec![
            ("Type", PdfObject::name("Page")),
            ("Parent", PdfObject::Reference(PAGES_OBJ)),
            ("MediaBox", PdfObject::rect(0.0, 0.0, page.width, page.height)),
            ("Contents", PdfObject::Reference(content_id)),
            ("Resources", self.resources()),
        ]);
        self.writer.write_object(page_id, &page_dict)?;

        self.page_obj_ids.push(page_id);
        Ok(())
    }

    /// Finish the document: embedded fonts, info dictionary, page
    /// tree, catalog, xref table and trailer. Returns the writer.
    pub fn end_document(mut self) -> Result<W> {
        if self.current_page.is_some() {
            self.end_page()?;
        }

        let mut next = self.next_obj_num;
        let mut font_objects = Vec::new();
        for (font, &type0_id) in self.tt_fonts.iter().zip(&self.tt_font_obj_ids) {
            let objects = font.to_objects(
                type0_id,
                || {
                    let id = ObjId(next, 0);
                    next += 1;
                    id
                },
                self.compress,
            )?;
            font_objects.extend(objects);
        }
        self.next_obj_num = next;
        for (id, obj) in &font_objects {
            self.writer.write_object(*id, obj)?;
        }

        let info_id = if self.info.is_empty() {
            None
        } else {
            let id = self.alloc_obj_id();
            let entries: Vec<(&str, PdfObject)> = self
                .info
                .iter()
                .map(|(k, v)| (k.as_str(), PdfObject::literal_string(v)))
                .collect();
            self.writer.write_object(id, &PdfObject::dict(entries))?;
            Some(id)
        };

        let kids = self
            .page_obj_ids
            .iter()
            .map(|id| PdfObject::Reference(*id))
            .collect();
        let pages = PdfObject::dict(vec![
            ("Type", PdfObject::name("Pages")),
            ("Kids", PdfObject::Array(kids)),
            ("Count", PdfObject::Integer(self.page_obj_ids.len() as i64)),
        ]);
        self.writer.write_object(PAGES_OBJ, &pages)?;

        let catalog = PdfObject::dict(vec![
            ("Type", PdfObject::name("Catalog")),
            ("Pages", PdfObject::Reference(PAGES_OBJ)),
        ]);
        self.writer.write_object(CATALOG_OBJ, &catalog)?;

        self.writer.finish(CATALOG_OBJ, info_id)?;
        tracing::debug!(pages = self.page_obj_ids.len(), "pdf document finished");
        Ok(self.writer.into_inner())
    }
}

/// Format a coordinate value for PDF content streams.
pub(crate) fn format_coord(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}

/// Zlib-compress a stream body for `/FlateDecode`.
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
