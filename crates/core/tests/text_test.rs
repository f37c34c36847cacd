//! Tests for the text positioner: text object lifecycle, matrices and runs.

use std::collections::HashMap;

use contour_core::interp::{Interpreter, InterpreterOptions};
use contour_core::model::{FontMetrics, ParsedElement, Resources, TextRun};
use contour_core::parser::tokenize;
use contour_core::utils::MATRIX_IDENTITY;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn resources() -> Resources {
    let mut res = Resources::default();
    res.fonts.insert(
        "F1".into(),
        FontMetrics {
            base_font: "Helvetica".into(),
            widths: HashMap::from([(u32::from(b'A'), 600.0), (u32::from(b'B'), 600.0)]),
            default_width: 500.0,
            ..FontMetrics::default()
        },
    );
    res.fonts.insert(
        "CID".into(),
        FontMetrics {
            base_font: "Identity".into(),
            widths: HashMap::new(),
            default_width: 1000.0,
            code_bytes: 2,
            ..FontMetrics::default()
        },
    );
    res
}

fn runs(content: &[u8]) -> Vec<TextRun> {
    let res = resources();
    let opts = InterpreterOptions::default();
    let mut interp = Interpreter::new(&res, &opts);
    interp.execute(tokenize(content)).unwrap();
    interp
        .finish()
        .into_iter()
        .filter_map(|el| match el {
            ParsedElement::Text(text) => Some(text.runs),
            _ => None,
        })
        .flatten()
        .collect()
}

// ============================================================================
// Scenario and core properties
// ============================================================================

#[test]
fn test_show_ab_scenario() {
    let res = resources();
    let opts = InterpreterOptions::default();
    let mut interp = Interpreter::new(&res, &opts);
    interp
        .execute(tokenize(b"BT /F1 12 Tf (AB) Tj ET"))
        .unwrap();
    let elements = interp.finish();
    assert_eq!(elements.len(), 1);
    let text = elements[0].as_text().unwrap();
    assert_eq!(text.runs.len(), 1);
    let run = &text.runs[0];
    assert_eq!(run.text, "AB");
    assert_eq!(run.font_size, 12.0);
    assert_eq!(run.font_name, "F1");
    assert_eq!(run.base_font, "Helvetica");
    assert!(approx(run.end.0 - run.start.0, 2.0 * 0.6 * 12.0));
    assert_eq!(run.end.1, run.start.1);
}

#[test]
fn test_uniform_width_advances_text_matrix() {
    let res = resources();
    let opts = InterpreterOptions::default();
    for n in [1usize, 5, 17] {
        let mut interp = Interpreter::new(&res, &opts);
        let mut content = b"BT /F1 10 Tf (".to_vec();
        content.extend(std::iter::repeat_n(b'A', n));
        content.extend_from_slice(b") Tj");
        interp.execute(tokenize(&content)).unwrap();
        let e = interp.text_object().matrix.4;
        assert!(approx(e, n as f64 * 600.0 / 1000.0 * 10.0), "n = {n}, e = {e}");
    }
}

#[test]
fn test_text_object_lifecycle() {
    let res = resources();
    let opts = InterpreterOptions::default();
    let mut interp = Interpreter::new(&res, &opts);
    interp.execute(tokenize(b"BT 10 20 Td")).unwrap();
    assert!(interp.text_object().in_text_object);
    assert_eq!(interp.text_object().matrix, (1.0, 0.0, 0.0, 1.0, 10.0, 20.0));
    interp.execute(tokenize(b"ET BT")).unwrap();
    assert_eq!(interp.text_object().matrix, MATRIX_IDENTITY);
    assert_eq!(interp.text_object().line_matrix, MATRIX_IDENTITY);
    // ET without runs emits nothing.
    assert!(interp.elements().is_empty());
}

#[test]
fn test_open_text_object_is_flushed_by_finish() {
    assert_eq!(runs(b"BT /F1 10 Tf (A) Tj").len(), 1);
}

// ============================================================================
// Positioning
// ============================================================================

#[test]
fn test_td_moves_from_line_start() {
    let r = runs(b"BT /F1 10 Tf 100 700 Td (AB) Tj 0 -14 Td (A) Tj ET");
    assert_eq!(r[0].start, (100.0, 700.0));
    // Second line starts under the first, not after the shown text.
    assert_eq!(r[1].start, (100.0, 686.0));
}

#[test]
fn test_td_upper_sets_leading() {
    let res = resources();
    let opts = InterpreterOptions::default();
    let mut interp = Interpreter::new(&res, &opts);
    interp
        .execute(tokenize(b"BT 0 100 Td 5 -12 TD T*"))
        .unwrap();
    assert_eq!(interp.graphics_state().text.leading, 12.0);
    assert_eq!(interp.text_object().line_matrix, (1.0, 0.0, 0.0, 1.0, 5.0, 76.0));
}

#[test]
fn test_tm_replaces_both_matrices() {
    let r = runs(b"BT /F1 10 Tf 5 5 Td 2 0 0 2 50 60 Tm (A) Tj ET");
    assert_eq!(r[0].start, (50.0, 60.0));
    assert!(approx(r[0].end.0, 56.0));
    assert!(approx(r[0].effective_font_size, 20.0));
    // The outline spans start to end, scaled vertically by Tm.
    assert!(approx(r[0].outline[1].0, 56.0));
    assert!(approx(r[0].outline[2].1, 60.0 + 16.0));
}

#[test]
fn test_scaled_tm_advances_e_directly() {
    let res = resources();
    let opts = InterpreterOptions::default();

    // Width 500 from the default: 500 / 1000 * 10 = 5, independent of Tm.a.
    let mut interp = Interpreter::new(&res, &opts);
    interp
        .execute(tokenize(b"BT /F1 10 Tf 2 0 0 2 0 0 Tm (C) Tj"))
        .unwrap();
    assert_eq!(interp.text_object().matrix, (2.0, 0.0, 0.0, 2.0, 5.0, 0.0));

    let mut interp = Interpreter::new(&res, &opts);
    interp
        .execute(tokenize(b"BT /F1 10 Tf 2 0 0 2 0 0 Tm [-1000] TJ"))
        .unwrap();
    assert_eq!(interp.text_object().matrix, (2.0, 0.0, 0.0, 2.0, 10.0, 0.0));
}

#[test]
fn test_rotated_tm_keeps_baseline_offset() {
    let res = resources();
    let opts = InterpreterOptions::default();
    let mut interp = Interpreter::new(&res, &opts);
    interp
        .execute(tokenize(b"BT /F1 10 Tf 0 1 -1 0 100 100 Tm (A) Tj"))
        .unwrap();
    // Only e moves; f is untouched by the advance.
    let (_, _, _, _, e, f) = interp.text_object().matrix;
    assert!(approx(e, 106.0));
    assert!(approx(f, 100.0));
}

#[test]
fn test_quote_operators_move_to_next_line() {
    let r = runs(b"BT /F1 10 Tf 14 TL 0 100 Td (A) ' 3 1 (B) \" ET");
    assert_eq!(r[0].start, (0.0, 86.0));
    assert_eq!(r[1].start, (0.0, 72.0));
    assert_eq!(r[1].word_spacing, 3.0);
    assert_eq!(r[1].char_spacing, 1.0);
    // (6 + 1) for the glyph plus char spacing.
    assert!(approx(r[1].end.0, 7.0));
}

#[test]
fn test_ctm_applies_to_positions() {
    let r = runs(b"2 0 0 2 10 10 cm BT /F1 10 Tf 5 5 Td (A) Tj ET");
    assert_eq!(r[0].start, (20.0, 20.0));
    assert!(approx(r[0].end.0, 20.0 + 12.0));
    assert!(approx(r[0].effective_font_size, 20.0));
}

#[test]
fn test_rise_offsets_baseline() {
    let r = runs(b"BT /F1 10 Tf 3 Ts (A) Tj ET");
    assert_eq!(r[0].start, (0.0, 3.0));
    assert_eq!(r[0].rise, 3.0);
}

// ============================================================================
// Spacing
// ============================================================================

#[test]
fn test_spacing_and_scaling() {
    let r = runs(b"BT /F1 10 Tf 1 Tc 2 Tw 50 Tz (A B) Tj ET");
    // A: 6 + 1, space: 5 + 1 + 2, B: 6 + 1, all at 50%.
    assert!(approx(r[0].end.0, (7.0 + 8.0 + 7.0) * 0.5));
    assert_eq!(r[0].horizontal_scaling, 50.0);
}

#[test]
fn test_tj_adjustments_move_without_runs() {
    let r = runs(b"BT /F1 10 Tf [(A) -1000 (B) 500] TJ (A) Tj ET");
    assert_eq!(r.len(), 3);
    assert!(approx(r[0].end.0, 6.0));
    // -1000 moves right by one em of 10.
    assert!(approx(r[1].start.0, 16.0));
    assert!(approx(r[1].end.0, 22.0));
    // 500 moves back by half an em.
    assert!(approx(r[2].start.0, 17.0));
}

#[test]
fn test_cid_font_reads_two_byte_codes() {
    let r = runs(b"BT /CID 10 Tf 2 Tw <00010020 0041> Tj ET");
    // Three glyphs of one em each; codes 1 and 32 both take word spacing.
    assert!(approx(r[0].end.0, 30.0 + 4.0));
}

// ============================================================================
// Fonts and outline
// ============================================================================

#[test]
fn test_subset_prefix_resolves() {
    let res = resources();
    let opts = InterpreterOptions::default();
    let mut interp = Interpreter::new(&res, &opts);
    interp.execute(tokenize(b"BT /ABCDEF+F1 10 Tf (A) Tj ET")).unwrap();
    let elements = interp.finish();
    let run = &elements[0].as_text().unwrap().runs[0];
    assert_eq!(run.base_font, "Helvetica");
    assert_eq!(run.font_name, "ABCDEF+F1");
}

#[test]
fn test_unknown_font_uses_default_metrics() {
    let r = runs(b"BT /Nope 10 Tf (AB) Tj ET");
    assert!(approx(r[0].end.0, 10.0));
    assert_eq!(r[0].base_font, "");
}

#[test]
fn test_font_survives_restore() {
    let r = runs(b"BT q /F1 10 Tf Q (A) Tj ET");
    assert!(approx(r[0].end.0, 6.0));
}

#[test]
fn test_outline_spans_descent_to_ascent() {
    let r = runs(b"BT /F1 10 Tf 0 100 Td (A) Tj ET");
    let expected = [(0.0, 98.0), (6.0, 98.0), (6.0, 108.0), (0.0, 108.0)];
    for (got, want) in r[0].outline.iter().zip(expected) {
        assert!(approx(got.0, want.0) && approx(got.1, want.1), "{got:?} != {want:?}");
    }
}
