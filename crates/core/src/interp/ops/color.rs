//! Color operators.
//!
//! Handles: G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn
//!
//! - G/g: DeviceGray (stroke/non-stroke)
//! - RG/rg: DeviceRGB (stroke/non-stroke)
//! - K/k: DeviceCMYK (stroke/non-stroke)
//! - CS/cs: Select a color space, resetting the color to its initial value
//! - SC/SCN/sc/scn: Set color in current color space

use tracing::debug;

use crate::interp::interpreter::Interpreter;
use crate::interp::operands::{self, Operand};
use crate::model::{Color, ColorSpace};

/// Which of the two colours an operator targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Stroke,
    Fill,
}

#[allow(non_snake_case)]
impl Interpreter<'_> {
    fn set_color(&mut self, target: Target, color: Color) {
        let state = self.gstack.current_mut();
        match target {
            Target::Stroke => {
                state.stroke_color = color;
                state.stroke_pattern = None;
            }
            Target::Fill => {
                state.fill_color = color;
                state.fill_pattern = None;
            }
        }
    }

    /// Sets the gray level for stroking operations.
    ///
    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: f64) {
        self.set_color(Target::Stroke, Color::gray(gray));
    }

    /// Sets the gray level for non-stroking operations.
    ///
    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: f64) {
        self.set_color(Target::Fill, Color::gray(gray));
    }

    /// Sets the RGB color for stroking operations.
    ///
    /// PDF operator: `RG`
    pub fn do_RG(&mut self, r: f64, g: f64, b: f64) {
        self.set_color(Target::Stroke, Color::rgb(r, g, b));
    }

    /// Sets the RGB color for non-stroking operations.
    ///
    /// PDF operator: `rg`
    pub fn do_rg(&mut self, r: f64, g: f64, b: f64) {
        self.set_color(Target::Fill, Color::rgb(r, g, b));
    }

    /// Sets the CMYK color for stroking operations.
    ///
    /// PDF operator: `K`
    pub fn do_K(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_color(Target::Stroke, Color::cmyk(c, m, y, k));
    }

    /// Sets the CMYK color for non-stroking operations.
    ///
    /// PDF operator: `k`
    pub fn do_k(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_color(Target::Fill, Color::cmyk(c, m, y, k));
    }

    /// Resolves a color space operand: device families first, then the
    /// ColorSpace resources. Unknown names fall back to DeviceGray.
    fn resolve_color_space(&self, name: &str) -> ColorSpace {
        if let Some(cs) = ColorSpace::from_device_name(name) {
            return cs;
        }
        match self.resources.color_space(name) {
            Some(cs) => cs.clone(),
            None => {
                debug!(name, "unknown color space, using DeviceGray");
                ColorSpace::DeviceGray
            }
        }
    }

    /// Sets the stroking color space.
    ///
    /// PDF operator: `CS`
    pub fn do_CS(&mut self, name: &str) {
        let cs = self.resolve_color_space(name);
        self.set_color(Target::Stroke, Color::initial(cs));
    }

    /// Sets the non-stroking color space.
    ///
    /// PDF operator: `cs`
    pub fn do_cs(&mut self, name: &str) {
        let cs = self.resolve_color_space(name);
        self.set_color(Target::Fill, Color::initial(cs));
    }

    /// Sets the color for stroking operations in the current color space.
    ///
    /// PDF operator: `SC` / `SCN`
    pub fn do_SCN(&mut self, args: &mut Vec<Operand>) {
        self.set_color_components(Target::Stroke, args);
    }

    /// Sets the color for non-stroking operations in the current color space.
    ///
    /// PDF operator: `sc` / `scn`
    pub fn do_scn(&mut self, args: &mut Vec<Operand>) {
        self.set_color_components(Target::Fill, args);
    }

    /// In Pattern space the operands are optional underlying components
    /// followed by a pattern name. Elsewhere they are plain components; a
    /// count that does not fit the current space selects the device space
    /// with that many components.
    fn set_color_components(&mut self, target: Target, args: &mut Vec<Operand>) {
        let state = self.gstack.current_mut();
        let (color, pattern) = match target {
            Target::Stroke => (&mut state.stroke_color, &mut state.stroke_pattern),
            Target::Fill => (&mut state.fill_color, &mut state.fill_pattern),
        };

        if color.space.is_pattern() {
            let Some(name) = operands::pop_name(args) else {
                return;
            };
            color.components = operands::drain_numbers(args);
            *pattern = Some(name);
            return;
        }

        let values = operands::drain_numbers(args);
        if values.is_empty() {
            return;
        }
        if values.len() != color.space.ncomponents() {
            color.space = match values.len() {
                1 => ColorSpace::DeviceGray,
                3 => ColorSpace::DeviceRGB,
                4 => ColorSpace::DeviceCMYK,
                _ => return,
            };
        }
        color.components = values;
    }
}
