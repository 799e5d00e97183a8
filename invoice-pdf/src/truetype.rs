use std::collections::{BTreeMap, BTreeSet};

use crate::error::PdfError;
use crate::objects::{ObjId, PdfObject};
use crate::text::TextDirection;

/// One glyph produced by shaping, in visual (left-to-right) order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    pub gid: u16,
    /// Horizontal advance in 1/1000 em.
    pub advance: f64,
    /// Source text of the cluster this glyph starts, empty for
    /// follow-on glyphs of the same cluster.
    pub text: String,
}

/// An embedded TrueType font. Text is shaped through its OpenType
/// tables and written as glyph ids with `Identity-H` encoding.
pub struct TrueTypeFont {
    postscript_name: String,
    font_data: Vec<u8>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    bbox: [i16; 4],
    cap_height: i16,
    italic_angle: f64,
    flags: u32,
    stem_v: i16,
    /// Advance width per glyph id, in font units.
    glyph_widths: Vec<u16>,
    used_glyphs: BTreeSet<u16>,
    /// Glyph id -> text it stands for, fed by cmap and by shaping.
    glyph_text: BTreeMap<u16, String>,
    pub(crate) pdf_name: String,
}

impl TrueTypeFont {
    /// Parse raw `.ttf` bytes. `pdf_name` is the content-stream
    /// resource name (e.g. "F3").
    pub fn from_bytes(data: Vec<u8>, pdf_name: String) -> Result<Self, PdfError> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| PdfError::Font(format!("failed to parse TrueType data: {}", e)))?;
        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            return Err(PdfError::Font("font tables are not usable for shaping".to_string()));
        }

        let units_per_em = face.units_per_em();
        let ascent = face.ascender();
        let descent = face.descender();
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(ascent);
        let italic_angle = f64::from(face.italic_angle());
        let flags = descriptor_flags(&face);
        let stem_v = estimate_stem_v(&face);
        let postscript_name = postscript_name(&face);

        let subtables = face
            .tables()
            .cmap
            .ok_or_else(|| PdfError::Font("font has no cmap table".to_string()))?;
        let mut glyph_text = BTreeMap::new();
        for subtable in subtables.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|cp| {
                if let Some(gid) = subtable.glyph_index(cp) {
                    if let Some(ch) = char::from_u32(cp) {
                        glyph_text.entry(gid.0).or_insert_with(|| ch.to_string());
                    }
                }
            });
        }

        let glyph_widths = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0))
            .collect();

        tracing::debug!(font = %postscript_name, glyphs = face.number_of_glyphs(), "loaded TrueType font");

        Ok(TrueTypeFont {
            postscript_name,
            units_per_em,
            ascent,
            descent,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            cap_height,
            italic_angle,
            flags,
            stem_v,
            glyph_widths,
            used_glyphs: BTreeSet::new(),
            glyph_text,
            pdf_name,
            font_data: data,
        })
    }

    fn to_thousandths(&self, units: f64) -> f64 {
        units * 1000.0 / f64::from(self.units_per_em)
    }

    fn glyph_width(&self, gid: u16) -> f64 {
        let raw = self.glyph_widths.get(usize::from(gid)).copied().unwrap_or(0);
        self.to_thousandths(f64::from(raw))
    }

    /// Shape one directional run. Glyphs come back in visual order,
    /// so a right-to-left run reads right-to-left on the page without
    /// the caller touching character order.
    pub fn shape(&self, text: &str, direction: TextDirection) -> Vec<ShapedGlyph> {
        // from_bytes already proved the face parses.
        let Some(face) = rustybuzz::Face::from_slice(&self.font_data, 0) else {
            return Vec::new();
        };
        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.set_direction(match direction {
            TextDirection::Ltr => rustybuzz::Direction::LeftToRight,
            TextDirection::Rtl => rustybuzz::Direction::RightToLeft,
        });
        buffer.guess_segment_properties();
        let output = rustybuzz::shape(&face, &[], buffer);

        let mut boundaries: Vec<usize> = output
            .glyph_infos()
            .iter()
            .map(|info| info.cluster as usize)
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut seen = BTreeSet::new();
        output
            .glyph_infos()
            .iter()
            .zip(output.glyph_positions())
            .map(|(info, pos)| {
                let start = info.cluster as usize;
                let cluster_text = if seen.insert(start) {
                    let end = boundaries
                        .iter()
                        .copied()
                        .find(|&b| b > start)
                        .unwrap_or(text.len());
                    text.get(start..end).unwrap_or_default().to_string()
                } else {
                    String::new()
                };
                ShapedGlyph {
                    gid: info.glyph_id as u16,
                    advance: self.to_thousandths(f64::from(pos.x_advance)),
                    text: cluster_text,
                }
            })
            .collect()
    }

    /// Width of a shaped run in points.
    pub fn run_width(glyphs: &[ShapedGlyph], font_size: f64) -> f64 {
        glyphs.iter().map(|g| g.advance).sum::<f64>() * font_size / 1000.0
    }

    /// Line advance from the hhea ascent/descent.
    pub fn line_height(&self, font_size: f64) -> f64 {
        let span = f64::from(i32::from(self.ascent) - i32::from(self.descent));
        span / f64::from(self.units_per_em) * font_size
    }

    /// Encode shaped glyphs as the operand of a `TJ` operator. Where the
    /// shaper's advance differs from the glyph's `/W` width a kerning
    /// number is inserted so the pen lands where the shaper put it.
    pub(crate) fn encode_tj(&mut self, glyphs: &[ShapedGlyph]) -> String {
        let mut out = String::from("[");
        let mut open_hex = false;
        for glyph in glyphs {
            self.used_glyphs.insert(glyph.gid);
            if !glyph.text.is_empty() {
                self.glyph_text
                    .entry(glyph.gid)
                    .or_insert_with(|| glyph.text.clone());
            }
            if !open_hex {
                out.push('<');
                open_hex = true;
            }
            out.push_str(&format!("{:04X}", glyph.gid));

            let adjust = (self.glyph_width(glyph.gid) - glyph.advance).round();
            if adjust != 0.0 {
                out.push('>');
                open_hex = false;
                out.push_str(&format!(" {} ", adjust as i64));
            }
        }
        if open_hex {
            out.push('>');
        }
        out.push(']');
        out
    }

    /// Build the Type0 font tree. `ids` supplies object numbers for the
    /// descendant font, descriptor, font file and ToUnicode stream.
    pub(crate) fn to_objects(
        &self,
        type0_id: ObjId,
        mut next_id: impl FnMut() -> ObjId,
        compress: bool,
    ) -> Result<Vec<(ObjId, PdfObject)>, PdfError> {
        let cid_id = next_id();
        let descriptor_id = next_id();
        let file_id = next_id();
        let tounicode_id = next_id();

        let type0 = PdfObject::dict(vec![
            ("Type", PdfObject::name("Font")),
            ("Subtype", PdfObject::name("Type0")),
            ("BaseFont", PdfObject::name(&self.postscript_name)),
            ("Encoding", PdfObject::name("Identity-H")),
            ("DescendantFonts", PdfObject::array(vec![PdfObject::Reference(cid_id)])),
            ("ToUnicode", PdfObject::Reference(tounicode_id)),
        ]);

        let cid_font = PdfObject::dict(vec![
            ("Type", PdfObject::name("Font")),
            ("Subtype", PdfObject::name("CIDFontType2")),
            ("BaseFont", PdfObject::name(&self.postscript_name)),
            (
                "CIDSystemInfo",
                PdfObject::dict(vec![
                    ("Registry", PdfObject::literal_string("Adobe")),
                    ("Ordering", PdfObject::literal_string("Identity")),
                    ("Supplement", PdfObject::Integer(0)),
                ]),
            ),
            ("FontDescriptor", PdfObject::Reference(descriptor_id)),
            ("DW", PdfObject::Integer(self.glyph_width(0).round() as i64)),
            ("W", PdfObject::array(self.w_array())),
            ("CIDToGIDMap", PdfObject::name("Identity")),
        ]);

        let scale = |v: i16| PdfObject::Integer(self.to_thousandths(f64::from(v)).round() as i64);
        let descriptor = PdfObject::dict(vec![
            ("Type", PdfObject::name("FontDescriptor")),
            ("FontName", PdfObject::name(&self.postscript_name)),
            ("Flags", PdfObject::Integer(i64::from(self.flags))),
            (
                "FontBBox",
                PdfObject::array(self.bbox.iter().map(|&v| scale(v)).collect()),
            ),
            ("ItalicAngle", PdfObject::Real(self.italic_angle)),
            ("Ascent", scale(self.ascent)),
            ("Descent", scale(self.descent)),
            ("CapHeight", scale(self.cap_height)),
            ("StemV", PdfObject::Integer(i64::from(self.stem_v))),
            ("FontFile2", PdfObject::Reference(file_id)),
        ]);

        let mut file_dict = vec![(
            "Length1",
            PdfObject::Integer(self.font_data.len() as i64),
        )];
        let file_data = if compress {
            file_dict.push(("Filter", PdfObject::name("FlateDecode")));
            crate::document::deflate(&self.font_data)?
        } else {
            self.font_data.clone()
        };

        Ok(vec![
            (type0_id, type0),
            (cid_id, cid_font),
            (descriptor_id, descriptor),
            (file_id, PdfObject::stream(file_dict, file_data)),
            (tounicode_id, PdfObject::stream(vec![], self.tounicode_cmap())),
        ])
    }

    /// `/W` entries for used glyphs, grouping consecutive ids:
    /// `[cid [w1 w2 ...] cid [w ...] ...]`.
    fn w_array(&self) -> Vec<PdfObject> {
        let mut result = Vec::new();
        let mut run_start: Option<u16> = None;
        let mut widths = Vec::new();
        let mut prev: Option<u16> = None;

        for &gid in &self.used_glyphs {
            let contiguous = prev.and_then(|p| p.checked_add(1)) == Some(gid);
            if !contiguous {
                if let Some(start) = run_start.take() {
                    result.push(PdfObject::Integer(i64::from(start)));
                    result.push(PdfObject::Array(std::mem::take(&mut widths)));
                }
                run_start = Some(gid);
            }
            widths.push(PdfObject::Integer(self.glyph_width(gid).round() as i64));
            prev = Some(gid);
        }
        if let Some(start) = run_start {
            result.push(PdfObject::Integer(i64::from(start)));
            result.push(PdfObject::Array(widths));
        }
        result
    }

    /// ToUnicode CMap so text extraction and search work, including
    /// for contextual glyph forms that have no cmap entry.
    fn tounicode_cmap(&self) -> Vec<u8> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );

        let mappings: Vec<(u16, &String)> = self
            .used_glyphs
            .iter()
            .filter_map(|gid| self.glyph_text.get(gid).map(|t| (*gid, t)))
            .collect();

        // At most 100 entries per bfchar block.
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, text) in chunk {
                let utf16: String = text
                    .encode_utf16()
                    .map(|unit| format!("{:04X}", unit))
                    .collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\nend\n",
        );
        cmap.into_bytes()
    }
}

/// PostScript name from the name table, reduced to characters that are
/// legal in a PDF name.
fn postscript_name(face: &ttf_parser::Face) -> String {
    let find = |id| {
        face.names()
            .into_iter()
            .find(|name| name.name_id == id && name.is_unicode())
            .and_then(|name| name.to_string())
    };
    let raw = find(ttf_parser::name_id::POST_SCRIPT_NAME)
        .or_else(|| find(ttf_parser::name_id::FAMILY))
        .unwrap_or_else(|| "EmbeddedFont".to_string());
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

fn descriptor_flags(face: &ttf_parser::Face) -> u32 {
    let mut flags = 32; // Nonsymbolic
    if face.is_monospaced() {
        flags |= 1;
    }
    if face.is_italic() {
        flags |= 64;
    }
    flags
}

/// StemV is not stored in TrueType; approximate it from the weight class.
fn estimate_stem_v(face: &ttf_parser::Face) -> i16 {
    let w = f64::from(face.weight().to_number()) / 1000.0;
    (10.0 + 220.0 * w * w) as i16
}
