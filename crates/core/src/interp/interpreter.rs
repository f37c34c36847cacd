//! Content stream interpreter.
//!
//! Folds a token sequence over the operand stack, the pending path, the text
//! positioner and the element list. Each operator token is resolved through
//! the registry and handled by a `do_*` method in `interp::ops`; its operands
//! are consumed whether or not the handler could use them.

use tracing::{trace, warn};

use super::operands::{self, Operand};
use super::options::InterpreterOptions;
use super::registry::{self, Operator};
use super::stack::GraphicsStateStack;
use crate::error::Result;
use crate::model::{
    DEFAULT_FONT_METRICS, FontMetrics, GraphicsState, PaintOp, ParsedElement, PathSegment,
    Resources, TextRun,
};
use crate::parser::{Token, tokenize};
use crate::raster::masked_fill;
use crate::utils::{MATRIX_IDENTITY, Matrix, RECT_UNBOUNDED};

/// One entry of a `TJ` array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextSeqItem {
    Bytes(Vec<u8>),
    /// Adjustment in thousandths of text space, subtracted from the advance
    Number(f64),
}

pub type TextSeq = Vec<TextSeqItem>;

/// Text object state between `BT` and `ET`.
///
/// The font selection lives here rather than in the graphics state, so it
/// survives `Q`.
#[derive(Debug, Clone)]
pub struct TextObject<'a> {
    pub in_text_object: bool,
    /// Text matrix (Tm)
    pub matrix: Matrix,
    /// Text line matrix (Tlm)
    pub line_matrix: Matrix,
    pub font_name: String,
    pub font: &'a FontMetrics,
    pub font_size: f64,
    /// Runs shown since `BT`
    pub runs: Vec<TextRun>,
}

impl Default for TextObject<'_> {
    fn default() -> Self {
        Self {
            in_text_object: false,
            matrix: MATRIX_IDENTITY,
            line_matrix: MATRIX_IDENTITY,
            font_name: String::new(),
            font: &*DEFAULT_FONT_METRICS,
            font_size: 0.0,
            runs: Vec::new(),
        }
    }
}

impl TextObject<'_> {
    /// Resets the matrices and the run accumulator for a new text object.
    pub fn begin(&mut self) {
        self.in_text_object = true;
        self.matrix = MATRIX_IDENTITY;
        self.line_matrix = MATRIX_IDENTITY;
        self.runs.clear();
    }
}

/// Content stream interpreter for one run.
///
/// Method names like `do_Q`, `do_S`, `do_B` use uppercase to match the
/// operator names (q/Q, s/S, b/B, etc.).
pub struct Interpreter<'a> {
    /// Resources in force; swapped while a form XObject runs
    pub(crate) resources: &'a Resources,
    pub(crate) options: &'a InterpreterOptions,
    pub(crate) gstack: GraphicsStateStack,
    pub(crate) operands: Vec<Operand>,
    /// Arrays under construction, innermost last
    array_stack: Vec<Vec<Operand>>,
    /// Pending path
    pub(crate) curpath: Vec<PathSegment>,
    pub(crate) textobj: TextObject<'a>,
    pub(crate) elements: Vec<ParsedElement>,
    /// Soft mask nesting level of this run (0 at top level)
    pub(crate) mask_depth: usize,
    /// Names of form XObjects being drawn, outermost first
    pub(crate) form_stack: Vec<String>,
    /// CTM of the base state; pattern space is relative to it
    pub(crate) base_ctm: Matrix,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter for a top-level content stream.
    pub fn new(resources: &'a Resources, options: &'a InterpreterOptions) -> Self {
        let mut base = GraphicsState::with_ctm(options.initial_ctm);
        base.clip_bbox = options.page_bbox.unwrap_or(RECT_UNBOUNDED);
        Self::with_base_state(resources, options, base, 0)
    }

    /// Create an interpreter for soft mask group content.
    ///
    /// The group runs in its own space: identity CTM, no clip.
    pub fn nested(
        resources: &'a Resources,
        options: &'a InterpreterOptions,
        mask_depth: usize,
    ) -> Self {
        Self::with_base_state(resources, options, GraphicsState::default(), mask_depth)
    }

    fn with_base_state(
        resources: &'a Resources,
        options: &'a InterpreterOptions,
        base: GraphicsState,
        mask_depth: usize,
    ) -> Self {
        let base_ctm = base.ctm;
        Self {
            resources,
            options,
            gstack: GraphicsStateStack::new(base),
            operands: Vec::new(),
            array_stack: Vec::new(),
            curpath: Vec::new(),
            textobj: TextObject::default(),
            elements: Vec::new(),
            mask_depth,
            form_stack: Vec::new(),
            base_ctm,
        }
    }

    /// Current graphics state (read-only).
    pub const fn graphics_state(&self) -> &GraphicsState {
        self.gstack.current()
    }

    pub const fn gstack(&self) -> &GraphicsStateStack {
        &self.gstack
    }

    /// Current text object state (read-only).
    pub const fn text_object(&self) -> &TextObject<'a> {
        &self.textobj
    }

    /// Get current path (read-only).
    pub fn current_path(&self) -> &[PathSegment] {
        &self.curpath
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Elements emitted so far.
    pub fn elements(&self) -> &[ParsedElement] {
        &self.elements
    }

    /// Consumes the interpreter, returning the emitted elements.
    ///
    /// Runs of a text object left open at end of stream are still emitted.
    pub fn finish(mut self) -> Vec<ParsedElement> {
        if self.textobj.in_text_object {
            self.do_ET();
        }
        self.elements
    }

    /// Interprets a token sequence.
    ///
    /// Only fatal errors (see [`crate::PdfError::is_fatal`]) are returned;
    /// everything else is absorbed where it occurs.
    pub fn execute<I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = Token>,
    {
        for token in tokens {
            match token {
                Token::Number(n) => self.push_operand(Operand::Number(n)),
                Token::String(s) => self.push_operand(Operand::String(s)),
                Token::Name(n) => self.push_operand(Operand::Name(n)),
                Token::ArrayStart => self.array_stack.push(Vec::new()),
                Token::ArrayEnd => {
                    if let Some(items) = self.array_stack.pop() {
                        self.push_operand(Operand::Array(items));
                    }
                }
                Token::Operator(name) => {
                    // An unterminated array cannot span an operator.
                    self.array_stack.clear();
                    let mut args = std::mem::take(&mut self.operands);
                    match registry::lookup(&name) {
                        Some(op) => {
                            if let Err(err) = self.dispatch_operator(op, &mut args) {
                                if err.is_fatal() {
                                    return Err(err);
                                }
                                warn!(operator = %name, %err, "operator failed");
                            }
                        }
                        None => trace!(operator = %name, "ignoring unknown operator"),
                    }
                    args.clear();
                    self.operands = args;
                }
            }
        }
        Ok(())
    }

    /// Tokenizes and interprets raw content bytes.
    pub fn execute_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.execute(tokenize(data))
    }

    fn push_operand(&mut self, value: Operand) {
        match self.array_stack.last_mut() {
            Some(array) => array.push(value),
            None => self.operands.push(value),
        }
    }

    /// Appends an element to the output.
    ///
    /// Painted paths and text whose state carries a soft mask are rasterized
    /// through the mask instead of being emitted as vectors.
    pub(crate) fn emit(&mut self, element: ParsedElement) {
        let masked = match &element {
            ParsedElement::Path(path) => {
                path.state.soft_mask.is_some() && path.paint != PaintOp::None
            }
            ParsedElement::Text(text) => text.state.soft_mask.is_some(),
            _ => false,
        };
        if masked && let Some(raster) = masked_fill::rasterize_masked(&element) {
            self.elements.push(ParsedElement::RasterImage(raster));
            return;
        }
        self.elements.push(element);
    }

    /// Dispatch an operator to the appropriate do_* method.
    fn dispatch_operator(&mut self, op: Operator, args: &mut Vec<Operand>) -> Result<()> {
        match op {
            // Graphics state operators
            Operator::Save => self.do_q(),
            Operator::Restore => self.do_Q(),
            Operator::Concat => {
                if let Some(m) = operands::pop_matrix(args) {
                    self.do_cm(m);
                }
            }
            Operator::LineWidth => {
                if let Some(w) = operands::pop_number(args) {
                    self.do_w(w);
                }
            }
            Operator::LineCap => {
                if let Some(n) = operands::pop_int(args) {
                    self.do_J(n);
                }
            }
            Operator::LineJoin => {
                if let Some(n) = operands::pop_int(args) {
                    self.do_j(n);
                }
            }
            Operator::MiterLimit => {
                if let Some(m) = operands::pop_number(args) {
                    self.do_M(m);
                }
            }
            Operator::Dash => {
                // dash pattern: [array] phase
                if let Some(phase) = operands::pop_number(args)
                    && let Some(array) = operands::pop_number_array(args)
                {
                    self.do_d(array, phase);
                }
            }
            Operator::RenderingIntent => {
                if let Some(intent) = operands::pop_name(args) {
                    self.do_ri(&intent);
                }
            }
            Operator::Flatness => {
                if let Some(f) = operands::pop_number(args) {
                    self.do_i(f);
                }
            }
            Operator::ExtGState => {
                if let Some(name) = operands::pop_name(args) {
                    self.do_gs(&name)?;
                }
            }

            // Path construction operators
            Operator::MoveTo => {
                if let Some((x, y)) = operands::pop_point(args) {
                    self.do_m(x, y);
                }
            }
            Operator::LineTo => {
                if let Some((x, y)) = operands::pop_point(args) {
                    self.do_l(x, y);
                }
            }
            Operator::CurveTo => {
                if let Some([x1, y1, x2, y2, x3, y3]) = operands::pop_numbers::<6>(args) {
                    self.do_c(x1, y1, x2, y2, x3, y3);
                }
            }
            Operator::CurveToV => {
                if let Some([x2, y2, x3, y3]) = operands::pop_numbers::<4>(args) {
                    self.do_v(x2, y2, x3, y3);
                }
            }
            Operator::CurveToY => {
                if let Some([x1, y1, x3, y3]) = operands::pop_numbers::<4>(args) {
                    self.do_y(x1, y1, x3, y3);
                }
            }
            Operator::ClosePath => self.do_h(),
            Operator::Rect => {
                if let Some([x, y, w, h]) = operands::pop_numbers::<4>(args) {
                    self.do_re(x, y, w, h);
                }
            }

            // Path painting operators
            Operator::Stroke => self.do_S(),
            Operator::CloseStroke => self.do_s(),
            Operator::Fill => self.do_f(),
            Operator::FillObsolete => self.do_F(),
            Operator::FillEvenOdd => self.do_f_star(),
            Operator::FillStroke => self.do_B(),
            Operator::FillStrokeEvenOdd => self.do_B_star(),
            Operator::CloseFillStroke => self.do_b(),
            Operator::CloseFillStrokeEvenOdd => self.do_b_star(),
            Operator::EndPath => self.do_n(),
            Operator::Clip => self.do_W(),
            Operator::ClipEvenOdd => self.do_W_star(),

            // Text operators
            Operator::BeginText => self.do_BT(),
            Operator::EndText => self.do_ET(),
            Operator::CharSpacing => {
                if let Some(v) = operands::pop_number(args) {
                    self.do_Tc(v);
                }
            }
            Operator::WordSpacing => {
                if let Some(v) = operands::pop_number(args) {
                    self.do_Tw(v);
                }
            }
            Operator::HorizontalScaling => {
                if let Some(v) = operands::pop_number(args) {
                    self.do_Tz(v);
                }
            }
            Operator::Leading => {
                if let Some(v) = operands::pop_number(args) {
                    self.do_TL(v);
                }
            }
            Operator::Font => {
                if let Some(size) = operands::pop_number(args)
                    && let Some(name) = operands::pop_name(args)
                {
                    self.do_Tf(&name, size);
                }
            }
            Operator::RenderMode => {
                if let Some(mode) = operands::pop_int(args) {
                    self.do_Tr(mode);
                }
            }
            Operator::Rise => {
                if let Some(v) = operands::pop_number(args) {
                    self.do_Ts(v);
                }
            }
            Operator::MoveText => {
                if let Some((tx, ty)) = operands::pop_point(args) {
                    self.do_Td(tx, ty);
                }
            }
            Operator::MoveTextSetLeading => {
                if let Some((tx, ty)) = operands::pop_point(args) {
                    self.do_TD(tx, ty);
                }
            }
            Operator::TextMatrix => {
                if let Some(m) = operands::pop_matrix(args) {
                    self.do_Tm(m);
                }
            }
            Operator::NextLine => self.do_T_star(),
            Operator::ShowText => {
                if let Some(s) = operands::pop_string(args) {
                    self.do_Tj(s);
                }
            }
            Operator::ShowTextArray => {
                if let Some(seq) = pop_text_seq(args) {
                    self.do_TJ(seq);
                }
            }
            Operator::NextLineShowText => {
                if let Some(s) = operands::pop_string(args) {
                    self.do_quote(s);
                }
            }
            Operator::NextLineShowTextSpaced => {
                if let Some(s) = operands::pop_string(args)
                    && let Some((aw, ac)) = operands::pop_point(args)
                {
                    self.do_doublequote(aw, ac, s);
                }
            }

            // Colour operators
            Operator::StrokeGray => {
                if let Some(g) = operands::pop_number(args) {
                    self.do_G(g);
                }
            }
            Operator::FillGray => {
                if let Some(g) = operands::pop_number(args) {
                    self.do_g(g);
                }
            }
            Operator::StrokeRgb => {
                if let Some([r, g, b]) = operands::pop_numbers::<3>(args) {
                    self.do_RG(r, g, b);
                }
            }
            Operator::FillRgb => {
                if let Some([r, g, b]) = operands::pop_numbers::<3>(args) {
                    self.do_rg(r, g, b);
                }
            }
            Operator::StrokeCmyk => {
                if let Some([c, m, y, k]) = operands::pop_numbers::<4>(args) {
                    self.do_K(c, m, y, k);
                }
            }
            Operator::FillCmyk => {
                if let Some([c, m, y, k]) = operands::pop_numbers::<4>(args) {
                    self.do_k(c, m, y, k);
                }
            }
            Operator::StrokeColorSpace => {
                if let Some(name) = operands::pop_name(args) {
                    self.do_CS(&name);
                }
            }
            Operator::FillColorSpace => {
                if let Some(name) = operands::pop_name(args) {
                    self.do_cs(&name);
                }
            }
            Operator::StrokeColor | Operator::StrokeColorN => self.do_SCN(args),
            Operator::FillColor | Operator::FillColorN => self.do_scn(args),

            Operator::PaintShading => {
                if let Some(name) = operands::pop_name(args) {
                    self.do_sh(&name);
                }
            }
            Operator::PaintXObject => {
                if let Some(name) = operands::pop_name(args) {
                    self.do_Do(&name)?;
                }
            }
        }
        Ok(())
    }
}

fn pop_text_seq(args: &mut Vec<Operand>) -> Option<TextSeq> {
    operands::pop_array(args).map(|items| {
        items
            .into_iter()
            .filter_map(|item| match item {
                Operand::Number(n) => Some(TextSeqItem::Number(n)),
                Operand::String(s) => Some(TextSeqItem::Bytes(s)),
                _ => None,
            })
            .collect()
    })
}

/// Interprets a token sequence against `resources`, returning the emitted
/// elements.
pub fn interpret<I>(
    tokens: I,
    resources: &Resources,
    options: &InterpreterOptions,
) -> Result<Vec<ParsedElement>>
where
    I: IntoIterator<Item = Token>,
{
    let mut interp = Interpreter::new(resources, options);
    interp.execute(tokens)?;
    Ok(interp.finish())
}

/// Tokenizes and interprets a raw content stream.
pub fn interpret_content(
    data: &[u8],
    resources: &Resources,
    options: &InterpreterOptions,
) -> Result<Vec<ParsedElement>> {
    interpret(tokenize(data), resources, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands_cleared_after_operator() {
        let res = Resources::default();
        let opts = InterpreterOptions::default();
        let mut interp = Interpreter::new(&res, &opts);
        interp.execute(tokenize(b"1 2 3 4 5 BDC 7")).unwrap();
        assert_eq!(interp.operands(), &[Operand::Number(7.0)]);
    }

    #[test]
    fn test_nested_array_operand() {
        let res = Resources::default();
        let opts = InterpreterOptions::default();
        let mut interp = Interpreter::new(&res, &opts);
        interp.execute(tokenize(b"[1 [2] (x)]")).unwrap();
        assert_eq!(
            interp.operands(),
            &[Operand::Array(vec![
                Operand::Number(1.0),
                Operand::Array(vec![Operand::Number(2.0)]),
                Operand::String(b"x".to_vec()),
            ])]
        );
    }

    #[test]
    fn test_short_operand_stack_is_noop() {
        let res = Resources::default();
        let opts = InterpreterOptions::default();
        let elements = interpret_content(b"10 re f 5 m S", &res, &opts).unwrap();
        assert!(elements.is_empty());
    }
}
