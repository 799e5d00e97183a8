use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::objects::{ObjId, PdfObject};

/// Serializes PDF objects to any `Write` target, remembering the byte
/// offset of every indirect object for the cross-reference table.
pub struct PdfWriter<W: Write> {
    inner: W,
    offset: usize,
    offsets: BTreeMap<u32, usize>,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(inner: W) -> Self {
        PdfWriter {
            inner,
            offset: 0,
            offsets: BTreeMap::new(),
        }
    }

    fn put(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)?;
        self.offset += data.len();
        Ok(())
    }

    fn put_str(&mut self, s: &str) -> io::Result<()> {
        self.put(s.as_bytes())
    }

    /// PDF 1.7 header followed by the binary marker comment.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.put_str("%PDF-1.7\n")?;
        self.put(b"%\xe2\xe3\xcf\xd3\n")
    }

    /// Write `obj` as indirect object `id`.
    pub fn write_object(&mut self, id: ObjId, obj: &PdfObject) -> io::Result<()> {
        self.offsets.insert(id.0, self.offset);
        self.put_str(&format!("{} {} obj\n", id.0, id.1))?;
        self.write_value(obj)?;
        self.put_str("\nendobj\n")
    }

    fn write_entries(&mut self, entries: &[(String, PdfObject)]) -> io::Result<()> {
        for (key, value) in entries {
            self.put_str(" /")?;
            self.put_str(key)?;
            self.put_str(" ")?;
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_value(&mut self, obj: &PdfObject) -> io::Result<()> {
        match obj {
            PdfObject::Integer(n) => self.put_str(&n.to_string()),
            PdfObject::Real(f) => self.put_str(&format_real(*f)),
            PdfObject::Name(name) => {
                self.put_str("/")?;
                self.put_str(name)
            }
            PdfObject::LiteralString(s) => {
                self.put_str("(")?;
                self.put_str(&escape_pdf_string(s))?;
                self.put_str(")")
            }
            PdfObject::Array(items) => {
                self.put_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.put_str(" ")?;
                    }
                    self.write_value(item)?;
                }
                self.put_str("]")
            }
            PdfObject::Dictionary(entries) => {
                self.put_str("<<")?;
                self.write_entries(entries)?;
                self.put_str(" >>")
            }
            PdfObject::Stream { dict, data } => {
                self.put_str("<<")?;
                self.write_entries(dict)?;
                self.put_str(&format!(" /Length {} >>\nstream\n", data.len()))?;
                self.put(data)?;
                self.put_str("\nendstream")
            }
            PdfObject::Reference(id) => self.put_str(&format!("{} {} R", id.0, id.1)),
        }
    }

    /// Write the xref table, trailer, `startxref` and `%%EOF`.
    /// Object numbers that were never written become free entries.
    pub fn finish(&mut self, root: ObjId, info: Option<ObjId>) -> io::Result<()> {
        let xref_offset = self.offset;
        let size = self.offsets.keys().next_back().map_or(1, |&max| max + 1);

        self.put_str(&format!("xref\n0 {}\n", size))?;
        // Every entry is exactly 20 bytes, hence the \r\n terminators.
        self.put(b"0000000000 65535 f\r\n")?;
        for num in 1..size {
            let entry = match self.offsets.get(&num) {
                Some(&off) => format!("{:010} 00000 n\r\n", off),
                None => "0000000000 00000 f\r\n".to_string(),
            };
            self.put_str(&entry)?;
        }

        self.put_str(&format!("trailer\n<< /Size {} /Root {} {} R", size, root.0, root.1))?;
        if let Some(info) = info {
            self.put_str(&format!(" /Info {} {} R", info.0, info.1))?;
        }
        self.put_str(" >>\n")?;
        self.put_str(&format!("startxref\n{}\n%%EOF\n", xref_offset))?;
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Escape `\`, `(`, `)` and line breaks inside a PDF literal string.
pub fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Byte form of [`escape_pdf_string`] for text already in a font encoding.
pub fn escape_pdf_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    for &b in bytes {
        match b {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out
}

/// Object-level reals always carry a decimal point; no exponent form.
fn format_real(f: f64) -> String {
    if f == f.floor() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        let s = format!("{:.6}", f);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
