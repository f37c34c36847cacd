//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', "
//!
//! Text object:
//! - BT/ET: Begin/end text object
//!
//! Text state:
//! - Tc: Character spacing
//! - Tw: Word spacing
//! - Tz: Horizontal scaling
//! - TL: Leading
//! - Tf: Font and size
//! - Tr: Rendering mode
//! - Ts: Rise (baseline offset)
//!
//! Text positioning:
//! - Td/TD: Move to next line (TD also sets leading)
//! - Tm: Set text matrix directly
//! - T*: Move to next line using current leading
//!
//! Text showing:
//! - Tj: Show string
//! - TJ: Show with individual glyph positioning
//! - ': Move to next line and show
//! - ": Set spacing, move to next line, and show

use tracing::debug;

use crate::interp::interpreter::{Interpreter, TextSeq, TextSeqItem};
use crate::model::{FontMetrics, ParsedElement, TextElement, TextRun};
use crate::utils::{Matrix, apply_matrix_pt, mult_matrix, translate_matrix};

/// Splits shown bytes into character codes.
///
/// Two-byte fonts read big-endian pairs; a trailing odd byte is its own code.
pub fn char_codes(bytes: &[u8], font: &FontMetrics) -> Vec<u32> {
    if font.is_multibyte() {
        bytes
            .chunks(2)
            .map(|pair| match *pair {
                [hi, lo] => (u32::from(hi) << 8) | u32::from(lo),
                [b] => u32::from(b),
                _ => 0,
            })
            .collect()
    } else {
        bytes.iter().map(|&b| u32::from(b)).collect()
    }
}

/// Adds a horizontal displacement to the `e` component of a text matrix.
fn advance_matrix(m: Matrix, dx: f64) -> Matrix {
    let (a, b, c, d, e, f) = m;
    (a, b, c, d, e + dx, f)
}

fn decode_text(codes: &[u32]) -> String {
    codes
        .iter()
        .map(|&c| char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[allow(non_snake_case)]
impl<'a> Interpreter<'a> {
    // ========================================================================
    // Text Object Operators
    // ========================================================================

    /// BT - Begin text object.
    ///
    /// Initializes the text matrix (Tm) and text line matrix (Tlm) to identity.
    pub fn do_BT(&mut self) {
        self.textobj.begin();
    }

    /// ET - End text object.
    ///
    /// Emits one Text element holding every run shown since BT.
    pub fn do_ET(&mut self) {
        self.textobj.in_text_object = false;
        let runs = std::mem::take(&mut self.textobj.runs);
        if runs.is_empty() {
            return;
        }
        let state = self.gstack.snapshot();
        self.emit(ParsedElement::Text(TextElement { runs, state }));
    }

    // ========================================================================
    // Text State Operators
    // ========================================================================

    /// Tc - Set character spacing.
    pub fn do_Tc(&mut self, charspace: f64) {
        self.gstack.current_mut().text.char_spacing = charspace;
    }

    /// Tw - Set word spacing.
    pub fn do_Tw(&mut self, wordspace: f64) {
        self.gstack.current_mut().text.word_spacing = wordspace;
    }

    /// Tz - Set horizontal scaling.
    ///
    /// Scaling is a percentage (100 = normal width).
    pub fn do_Tz(&mut self, scaling: f64) {
        self.gstack.current_mut().text.horizontal_scaling = scaling;
    }

    /// TL - Set text leading.
    pub fn do_TL(&mut self, leading: f64) {
        self.gstack.current_mut().text.leading = leading;
    }

    /// Tf - Set text font and size.
    ///
    /// Unknown fonts fall back to default metrics with single-byte codes.
    pub fn do_Tf(&mut self, fontid: &str, fontsize: f64) {
        let resources: &'a _ = self.resources;
        let (font, found) = resources.resolve_font(fontid);
        if !found {
            debug!(font = fontid, "font not found, using default metrics");
        }
        self.textobj.font = font;
        self.textobj.font_name = fontid.to_string();
        self.textobj.font_size = fontsize;
    }

    /// Tr - Set text rendering mode.
    ///
    /// Rendering modes: 0=fill, 1=stroke, 2=fill+stroke, 3=invisible,
    /// 4-7 add clipping to modes 0-3.
    pub fn do_Tr(&mut self, render: i64) {
        self.gstack.current_mut().text.render_mode = render;
    }

    /// Ts - Set text rise (superscript/subscript offset).
    pub fn do_Ts(&mut self, rise: f64) {
        self.gstack.current_mut().text.rise = rise;
    }

    // ========================================================================
    // Text Positioning Operators
    // ========================================================================

    /// Td - Move to start of next line, offset from the current line start.
    pub fn do_Td(&mut self, tx: f64, ty: f64) {
        let line = translate_matrix(self.textobj.line_matrix, (tx, ty));
        self.textobj.line_matrix = line;
        self.textobj.matrix = line;
    }

    /// TD - Move to start of next line and set leading to `-ty`.
    pub fn do_TD(&mut self, tx: f64, ty: f64) {
        self.do_TL(-ty);
        self.do_Td(tx, ty);
    }

    /// Tm - Set text matrix and text line matrix.
    pub fn do_Tm(&mut self, matrix: Matrix) {
        self.textobj.matrix = matrix;
        self.textobj.line_matrix = matrix;
    }

    /// T* - Move to start of next text line.
    ///
    /// Equivalent to: 0 -leading Td
    pub fn do_T_star(&mut self) {
        let leading = self.gstack.current().text.leading;
        self.do_Td(0.0, -leading);
    }

    // ========================================================================
    // Text Showing Operators
    // ========================================================================

    /// TJ - Show text, allowing individual glyph positioning.
    ///
    /// Each string becomes one run; numbers shift `Tm.e` back by thousandths
    /// of the font size without emitting anything.
    pub fn do_TJ(&mut self, seq: TextSeq) {
        for item in seq {
            match item {
                TextSeqItem::Bytes(bytes) => self.show_string(bytes),
                TextSeqItem::Number(adj) => {
                    let params = &self.gstack.current().text;
                    let tx = -adj / 1000.0
                        * self.textobj.font_size
                        * (params.horizontal_scaling / 100.0);
                    self.textobj.matrix = advance_matrix(self.textobj.matrix, tx);
                }
            }
        }
    }

    /// Tj - Show text string.
    pub fn do_Tj(&mut self, s: Vec<u8>) {
        self.show_string(s);
    }

    /// ' (quote) - Move to next line and show text.
    ///
    /// Equivalent to: T* (string) Tj
    pub fn do_quote(&mut self, s: Vec<u8>) {
        self.do_T_star();
        self.do_Tj(s);
    }

    /// " (doublequote) - Set word and character spacing, move to next line, and show text.
    ///
    /// Equivalent to: aw Tw ac Tc (string) '
    pub fn do_doublequote(&mut self, aw: f64, ac: f64, s: Vec<u8>) {
        self.do_Tw(aw);
        self.do_Tc(ac);
        self.do_quote(s);
    }

    /// Shows one string segment as a single run and advances the text matrix.
    fn show_string(&mut self, bytes: Vec<u8>) {
        let font = self.textobj.font;
        let font_size = self.textobj.font_size;
        let state = self.gstack.current();
        let params = &state.text;
        let ctm = state.ctm;
        let scale = params.horizontal_scaling / 100.0;

        let codes = char_codes(&bytes, font);
        let advance: f64 = codes
            .iter()
            .map(|&code| {
                let w0 = font.width(code);
                let is_space = code == 32 || (font.is_multibyte() && code == 1);
                let word = if is_space { params.word_spacing } else { 0.0 };
                (w0 / 1000.0 * font_size + params.char_spacing + word) * scale
            })
            .sum();

        let tm = self.textobj.matrix;
        let end_tm = advance_matrix(tm, advance);
        let to_page = |m: Matrix, p| apply_matrix_pt(ctm, apply_matrix_pt(m, p));
        let rise = params.rise;
        let start = to_page(tm, (0.0, rise));
        let end = to_page(end_tm, (0.0, rise));

        let (_, _, c, d, _, _) = mult_matrix(tm, ctm);
        let effective_font_size = font_size * c.hypot(d);

        let descent = rise + font.descent / 1000.0 * font_size;
        let ascent = rise + font.ascent / 1000.0 * font_size;
        let outline = [
            to_page(tm, (0.0, descent)),
            to_page(end_tm, (0.0, descent)),
            to_page(end_tm, (0.0, ascent)),
            to_page(tm, (0.0, ascent)),
        ];

        let run = TextRun {
            text: decode_text(&codes),
            bytes,
            start,
            end,
            font_name: self.textobj.font_name.clone(),
            base_font: font.base_font.clone(),
            font_size,
            effective_font_size,
            char_spacing: params.char_spacing,
            word_spacing: params.word_spacing,
            horizontal_scaling: params.horizontal_scaling,
            rise,
            outline,
        };
        self.textobj.runs.push(run);
        self.textobj.matrix = end_tm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_codes_two_byte() {
        let font = FontMetrics {
            code_bytes: 2,
            ..FontMetrics::default()
        };
        assert_eq!(char_codes(&[0x00, 0x41, 0x01, 0x02, 0x07], &font), vec![0x41, 0x102, 7]);
    }

    #[test]
    fn test_char_codes_single_byte() {
        let font = FontMetrics::default();
        assert_eq!(char_codes(b"AB", &font), vec![65, 66]);
    }
}
