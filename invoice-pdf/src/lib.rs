pub mod document;
pub mod error;
pub mod fonts;
pub mod graphics;
pub mod images;
pub mod objects;
pub mod tables;
pub mod text;
pub mod truetype;
pub mod writer;

pub use document::{PdfDocument, A4_HEIGHT, A4_WIDTH};
pub use error::PdfError;
pub use fonts::{BuiltinFont, FontRef, TrueTypeFontId};
pub use graphics::Color;
pub use images::{fit_placement, ImageId, ImagePlacement};
pub use tables::{Cell, CellStyle, Row, Table, TableCursor};
pub use text::{visual_runs, DirectionalRun, FitResult, Rect, TextAlign, TextDirection, TextStyle};
