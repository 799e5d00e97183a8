use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A rendered PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    bytes: Vec<u8>,
}

impl Document {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Document { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:application/pdf;base64,...`, ready for a preview frame or
    /// a download link.
    pub fn to_data_uri(&self) -> String {
        format!("data:application/pdf;base64,{}", self.to_base64())
    }

    /// Download name for the invoice `id`.
    pub fn file_name(id: &str) -> String {
        format!("invoice-{}.pdf", id)
    }

    /// Number of page objects in the file.
    pub fn page_count(&self) -> usize {
        let needle = b"/Type /Page /";
        self.bytes
            .windows(needle.len())
            .filter(|w| *w == needle)
            .count()
    }
}
