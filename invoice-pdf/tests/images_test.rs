use invoice_pdf::{fit_placement, ImageId, ImagePlacement, PdfDocument, PdfError, Rect};

/// Check whether a byte pattern exists in the buffer.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn encode_png(width: u32, height: u32, color: png::ColorType, pixels: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(pixels).unwrap();
    }
    buf
}

fn rgb_png() -> Vec<u8> {
    encode_png(2, 2, png::ColorType::Rgb, &[255, 0, 0, 0, 255, 0, 0, 0, 255, 9, 9, 9])
}

fn rgba_png() -> Vec<u8> {
    encode_png(1, 2, png::ColorType::Rgba, &[255, 0, 0, 128, 0, 255, 0, 255])
}

/// Just enough JPEG for the SOF0 header: 32x16, three components.
fn tiny_jpeg() -> Vec<u8> {
    vec![
        0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x20, 0x03, 0x01, 0x22, 0x00,
        0xFF, 0xD9,
    ]
}

// -------------------------------------------------------
// Loading
// -------------------------------------------------------

#[test]
fn load_png_from_bytes() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    let id = doc.load_image_bytes(rgb_png()).unwrap();
    assert_eq!(doc.image_size(id), Some((2, 2)));
}

#[test]
fn load_jpeg_reads_sof_dimensions() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    let id = doc.load_image_bytes(tiny_jpeg()).unwrap();
    assert_eq!(doc.image_size(id), Some((32, 16)));
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"/Filter /DCTDecode"));
    assert!(contains(&bytes, b"/ColorSpace /DeviceRGB"));
}

#[test]
fn invalid_data_returns_error() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    let err = doc.load_image_bytes(vec![0x00, 0x01, 0x02, 0x03]).err().unwrap();
    assert!(matches!(err, PdfError::Image(_)));
}

// -------------------------------------------------------
// Output
// -------------------------------------------------------

#[test]
fn alpha_channel_becomes_smask() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.load_image_bytes(rgba_png()).unwrap();
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"/SMask 6 0 R"));
    assert!(contains(&bytes, b"/ColorSpace /DeviceGray"));
}

#[test]
fn placed_image_is_referenced_from_page() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    let id = doc.load_image_bytes(rgb_png()).unwrap();
    doc.begin_page(595.0, 842.0).unwrap();
    let placement = ImagePlacement { x: 40.0, y: 760.0, width: 80.0, height: 40.0 };
    doc.place_image(id, &placement).unwrap();
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"q\n80 0 0 40 40 760 cm\n/Im1 Do\nQ\n"));
    assert!(contains(&bytes, b"/XObject << /Im1 5 0 R >>"));
}

#[test]
fn unknown_image_id_is_rejected() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(595.0, 842.0).unwrap();
    let placement = ImagePlacement { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
    assert!(doc.place_image(ImageId(3), &placement).is_err());
}

#[test]
fn compressed_png_samples_use_flate() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.set_compression(true);
    doc.load_image_bytes(rgb_png()).unwrap();
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"/Filter /FlateDecode"));
}

#[test]
fn fit_placement_fits_tall_image_by_height() {
    let rect = Rect { x: 0.0, y: 100.0, width: 100.0, height: 50.0 };
    let p = fit_placement(10, 20, &rect, false);
    assert_eq!((p.width, p.height), (25.0, 50.0));
    assert_eq!(p.y, 50.0);
}
