use crate::error::PdfError;
use crate::objects::{ObjId, PdfObject};
use crate::text::Rect;

/// Handle to an image loaded into a `PdfDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// Decoded image ready to embed.
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub color_space: ColorSpace,
    /// 8-bit samples for PNG, the untouched file for JPEG.
    pub data: Vec<u8>,
    /// Alpha channel as an 8-bit gray plane.
    pub smask: Option<Vec<u8>>,
}

/// Where an image lands on the page, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub fn detect_format(data: &[u8]) -> Result<ImageFormat, PdfError> {
    match data {
        [0xFF, 0xD8, ..] => Ok(ImageFormat::Jpeg),
        [0x89, b'P', b'N', b'G', ..] => Ok(ImageFormat::Png),
        _ => Err(PdfError::Image(
            "unsupported image format (expected JPEG or PNG)".to_string(),
        )),
    }
}

pub fn load_image(data: Vec<u8>) -> Result<ImageData, PdfError> {
    match detect_format(&data)? {
        ImageFormat::Jpeg => parse_jpeg(data),
        ImageFormat::Png => parse_png(&data),
    }
}

/// JPEG is embedded as-is with DCTDecode; only the SOF header is read.
fn parse_jpeg(data: Vec<u8>) -> Result<ImageData, PdfError> {
    let (width, height, components) = jpeg_dimensions(&data)?;
    let color_space = match components {
        1 => ColorSpace::DeviceGray,
        3 => ColorSpace::DeviceRGB,
        n => {
            return Err(PdfError::Image(format!(
                "unsupported JPEG component count {}",
                n
            )))
        }
    };
    Ok(ImageData {
        width,
        height,
        format: ImageFormat::Jpeg,
        color_space,
        data,
        smask: None,
    })
}

/// Walk JPEG segments until a SOF0..SOF3 marker.
fn jpeg_dimensions(data: &[u8]) -> Result<(u32, u32, u8), PdfError> {
    let mut i = 2;
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        match marker {
            0xC0..=0xC3 => {
                if i + 9 >= data.len() {
                    break;
                }
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]);
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]);
                return Ok((u32::from(width), u32::from(height), data[i + 9]));
            }
            0xFF | 0x00 => i += 1,
            0xD0..=0xD9 => i += 2,
            _ => {
                let len = u16::from_be_bytes([data[i + 2], data[i + 3]]);
                i += 2 + usize::from(len);
            }
        }
    }
    Err(PdfError::Image("no SOF marker in JPEG data".to_string()))
}

/// Decode PNG to 8-bit gray or RGB samples, splitting out alpha.
fn parse_png(data: &[u8]) -> Result<ImageData, PdfError> {
    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| PdfError::Image(format!("PNG decode error: {}", e)))?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| PdfError::Image(format!("PNG frame error: {}", e)))?;
    buf.truncate(info.buffer_size());

    let (color_space, channels, has_alpha) = match info.color_type {
        png::ColorType::Grayscale => (ColorSpace::DeviceGray, 1, false),
        png::ColorType::GrayscaleAlpha => (ColorSpace::DeviceGray, 2, true),
        png::ColorType::Rgb => (ColorSpace::DeviceRGB, 3, false),
        png::ColorType::Rgba => (ColorSpace::DeviceRGB, 4, true),
        other => {
            return Err(PdfError::Image(format!(
                "unsupported PNG color type {:?}",
                other
            )))
        }
    };

    let (data, smask) = if has_alpha {
        let color_channels = channels - 1;
        let mut color = Vec::with_capacity(buf.len() / channels * color_channels);
        let mut alpha = Vec::with_capacity(buf.len() / channels);
        for px in buf.chunks_exact(channels) {
            color.extend_from_slice(&px[..color_channels]);
            alpha.push(px[color_channels]);
        }
        (color, Some(alpha))
    } else {
        (buf, None)
    };

    Ok(ImageData {
        width: info.width,
        height: info.height,
        format: ImageFormat::Png,
        color_space,
        data,
        smask,
    })
}

impl ImageData {
    /// Image XObject (and its SMask, if any). Raw samples are
    /// Flate-compressed when `compress` is set.
    pub(crate) fn to_objects(
        &self,
        image_id: ObjId,
        smask_id: Option<ObjId>,
        compress: bool,
    ) -> Result<Vec<(ObjId, PdfObject)>, PdfError> {
        let mut objects = Vec::new();

        let mut dict = vec![
            ("Type", PdfObject::name("XObject")),
            ("Subtype", PdfObject::name("Image")),
            ("Width", PdfObject::Integer(i64::from(self.width))),
            ("Height", PdfObject::Integer(i64::from(self.height))),
            ("ColorSpace", PdfObject::name(self.color_space.pdf_name())),
            ("BitsPerComponent", PdfObject::Integer(8)),
        ];
        let data = match self.format {
            ImageFormat::Jpeg => {
                dict.push(("Filter", PdfObject::name("DCTDecode")));
                self.data.clone()
            }
            ImageFormat::Png => samples(&self.data, compress, &mut dict)?,
        };

        if let (Some(alpha), Some(id)) = (&self.smask, smask_id) {
            dict.push(("SMask", PdfObject::Reference(id)));
            let mut mask_dict = vec![
                ("Type", PdfObject::name("XObject")),
                ("Subtype", PdfObject::name("Image")),
                ("Width", PdfObject::Integer(i64::from(self.width))),
                ("Height", PdfObject::Integer(i64::from(self.height))),
                ("ColorSpace", PdfObject::name("DeviceGray")),
                ("BitsPerComponent", PdfObject::Integer(8)),
            ];
            let mask = samples(alpha, compress, &mut mask_dict)?;
            objects.push((id, PdfObject::stream(mask_dict, mask)));
        }

        objects.insert(0, (image_id, PdfObject::stream(dict, data)));
        Ok(objects)
    }
}

fn samples(
    raw: &[u8],
    compress: bool,
    dict: &mut Vec<(&str, PdfObject)>,
) -> Result<Vec<u8>, PdfError> {
    if compress {
        dict.push(("Filter", PdfObject::name("FlateDecode")));
        crate::document::deflate(raw)
    } else {
        Ok(raw.to_vec())
    }
}

/// Scale `img_w x img_h` to fit inside `rect` keeping the aspect
/// ratio, anchored to the top edge and aligned horizontally by
/// `align_right`.
pub fn fit_placement(img_w: u32, img_h: u32, rect: &Rect, align_right: bool) -> ImagePlacement {
    let (iw, ih) = (f64::from(img_w), f64::from(img_h));
    let scale = (rect.width / iw).min(rect.height / ih);
    let (width, height) = (iw * scale, ih * scale);
    let x = if align_right {
        rect.right() - width
    } else {
        rect.x
    };
    ImagePlacement {
        x,
        y: rect.y - height,
        width,
        height,
    }
}
