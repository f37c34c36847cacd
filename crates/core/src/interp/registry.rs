//! Operator registry.
//!
//! Operator names are resolved once, at dispatch time, into the closed
//! [`Operator`] enum. The name table is built on first use and shared
//! read-only by every interpreter in the process.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

/// Operator families, used for logging and for tests over whole groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    PathConstruction,
    PathPainting,
    Text,
    Color,
    GraphicsState,
    Shading,
    XObject,
}

/// Every operator the interpreter handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Graphics state
    Save,
    Restore,
    Concat,
    LineWidth,
    LineCap,
    LineJoin,
    MiterLimit,
    Dash,
    RenderingIntent,
    Flatness,
    ExtGState,
    // Path construction
    MoveTo,
    LineTo,
    CurveTo,
    CurveToV,
    CurveToY,
    ClosePath,
    Rect,
    // Path painting and clipping
    Stroke,
    CloseStroke,
    Fill,
    FillObsolete,
    FillEvenOdd,
    FillStroke,
    FillStrokeEvenOdd,
    CloseFillStroke,
    CloseFillStrokeEvenOdd,
    EndPath,
    Clip,
    ClipEvenOdd,
    // Text
    BeginText,
    EndText,
    CharSpacing,
    WordSpacing,
    HorizontalScaling,
    Leading,
    Font,
    RenderMode,
    Rise,
    MoveText,
    MoveTextSetLeading,
    TextMatrix,
    NextLine,
    ShowText,
    ShowTextArray,
    NextLineShowText,
    NextLineShowTextSpaced,
    // Colour
    StrokeGray,
    FillGray,
    StrokeRgb,
    FillRgb,
    StrokeCmyk,
    FillCmyk,
    StrokeColorSpace,
    FillColorSpace,
    StrokeColor,
    StrokeColorN,
    FillColor,
    FillColorN,
    // Shading
    PaintShading,
    // XObject
    PaintXObject,
}

static OPERATORS: LazyLock<FxHashMap<&'static str, Operator>> = LazyLock::new(|| {
    use Operator::*;
    [
        ("q", Save),
        ("Q", Restore),
        ("cm", Concat),
        ("w", LineWidth),
        ("J", LineCap),
        ("j", LineJoin),
        ("M", MiterLimit),
        ("d", Dash),
        ("ri", RenderingIntent),
        ("i", Flatness),
        ("gs", ExtGState),
        ("m", MoveTo),
        ("l", LineTo),
        ("c", CurveTo),
        ("v", CurveToV),
        ("y", CurveToY),
        ("h", ClosePath),
        ("re", Rect),
        ("S", Stroke),
        ("s", CloseStroke),
        ("f", Fill),
        ("F", FillObsolete),
        ("f*", FillEvenOdd),
        ("B", FillStroke),
        ("B*", FillStrokeEvenOdd),
        ("b", CloseFillStroke),
        ("b*", CloseFillStrokeEvenOdd),
        ("n", EndPath),
        ("W", Clip),
        ("W*", ClipEvenOdd),
        ("BT", BeginText),
        ("ET", EndText),
        ("Tc", CharSpacing),
        ("Tw", WordSpacing),
        ("Tz", HorizontalScaling),
        ("TL", Leading),
        ("Tf", Font),
        ("Tr", RenderMode),
        ("Ts", Rise),
        ("Td", MoveText),
        ("TD", MoveTextSetLeading),
        ("Tm", TextMatrix),
        ("T*", NextLine),
        ("Tj", ShowText),
        ("TJ", ShowTextArray),
        ("'", NextLineShowText),
        ("\"", NextLineShowTextSpaced),
        ("G", StrokeGray),
        ("g", FillGray),
        ("RG", StrokeRgb),
        ("rg", FillRgb),
        ("K", StrokeCmyk),
        ("k", FillCmyk),
        ("CS", StrokeColorSpace),
        ("cs", FillColorSpace),
        ("SC", StrokeColor),
        ("SCN", StrokeColorN),
        ("sc", FillColor),
        ("scn", FillColorN),
        ("sh", PaintShading),
        ("Do", PaintXObject),
    ]
    .into_iter()
    .collect()
});

/// Resolves an operator name. Unknown names return `None`.
pub fn lookup(name: &str) -> Option<Operator> {
    OPERATORS.get(name).copied()
}

/// Number of registered operator names.
pub fn registered_count() -> usize {
    OPERATORS.len()
}

impl Operator {
    pub const fn category(self) -> OperatorCategory {
        use Operator::*;
        match self {
            Save | Restore | Concat | LineWidth | LineCap | LineJoin | MiterLimit | Dash
            | RenderingIntent | Flatness | ExtGState => OperatorCategory::GraphicsState,
            MoveTo | LineTo | CurveTo | CurveToV | CurveToY | ClosePath | Rect => {
                OperatorCategory::PathConstruction
            }
            Stroke | CloseStroke | Fill | FillObsolete | FillEvenOdd | FillStroke
            | FillStrokeEvenOdd | CloseFillStroke | CloseFillStrokeEvenOdd | EndPath | Clip
            | ClipEvenOdd => OperatorCategory::PathPainting,
            BeginText | EndText | CharSpacing | WordSpacing | HorizontalScaling | Leading | Font
            | RenderMode | Rise | MoveText | MoveTextSetLeading | TextMatrix | NextLine
            | ShowText | ShowTextArray | NextLineShowText | NextLineShowTextSpaced => {
                OperatorCategory::Text
            }
            StrokeGray | FillGray | StrokeRgb | FillRgb | StrokeCmyk | FillCmyk
            | StrokeColorSpace | FillColorSpace | StrokeColor | StrokeColorN | FillColor
            | FillColorN => OperatorCategory::Color,
            PaintShading => OperatorCategory::Shading,
            PaintXObject => OperatorCategory::XObject,
        }
    }
}
