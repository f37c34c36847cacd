//! contour - A PDF content stream interpreter.
//!
//! Turns content stream tokens plus parsed resource tables into drawable
//! elements (paths, text runs, images), each carrying a snapshot of the
//! graphics state. Soft mask groups and clip paths are rasterized into
//! alpha grids, and soft-masked fills become raster images.

pub mod error;
pub mod interp;
pub mod model;
pub mod parser;
pub mod raster;
pub mod utils;

pub use error::{PdfError, Result};
pub use interp::{Interpreter, InterpreterOptions, interpret, interpret_content};
pub use model::{GraphicsState, ParsedElement, Resources};
pub use parser::{ContentLexer, Token, tokenize};
pub use raster::{DecodedImage, Jpeg2000Decoder};
