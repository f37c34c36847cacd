//! XObject operators.
//!
//! Handles: Do
//!
//! - Image XObjects are emitted as `Image` elements; the CTM maps the unit
//!   square onto the image.
//! - Form XObjects are interpreted in place, with their own resources when
//!   they carry any.

use tracing::debug;

use crate::error::Result;
use crate::interp::interpreter::Interpreter;
use crate::model::{FormXObject, ImageElement, ParsedElement, XObject};
use crate::parser::tokenize;
use crate::utils::{apply_matrix_rect, intersect_rect, mult_matrix};

#[allow(non_snake_case)]
impl<'a> Interpreter<'a> {
    /// Do - Invoke named XObject (images or form XObjects).
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, xobjid: &str) -> Result<()> {
        let resources: &'a _ = self.resources;
        match resources.xobject(xobjid) {
            Some(XObject::Image(_)) => {
                let state = self.gstack.snapshot();
                self.emit(ParsedElement::Image(ImageElement {
                    name: xobjid.trim_start_matches('/').to_string(),
                    state,
                }));
                Ok(())
            }
            Some(XObject::Form(form)) => self.render_form(xobjid, form),
            None => {
                debug!(name = xobjid, "XObject not found");
                Ok(())
            }
        }
    }

    /// Interprets a form XObject inside a saved state.
    fn render_form(&mut self, xobjid: &str, form: &'a FormXObject) -> Result<()> {
        if self.form_stack.iter().any(|name| name == xobjid) {
            debug!(name = xobjid, "skipping recursive form XObject");
            return Ok(());
        }
        if self.form_stack.len() >= self.options.max_form_depth {
            debug!(name = xobjid, "form XObject nesting limit reached");
            return Ok(());
        }

        let depth = self.gstack.depth();
        let saved_path = std::mem::take(&mut self.curpath);
        let saved_text = std::mem::take(&mut self.textobj);
        let saved_resources = self.resources;

        self.gstack.push();
        let state = self.gstack.current_mut();
        state.ctm = mult_matrix(form.matrix, state.ctm);
        let bbox = apply_matrix_rect(state.ctm, form.bbox);
        state.clip_bbox = intersect_rect(state.clip_bbox, bbox);
        if let Some(own) = &form.resources {
            self.resources = own;
        }
        self.form_stack.push(xobjid.to_string());

        let result = self.execute(tokenize(&form.content));
        if self.textobj.in_text_object {
            self.do_ET();
        }

        self.form_stack.pop();
        self.resources = saved_resources;
        while self.gstack.depth() > depth {
            self.gstack.pop();
        }
        self.textobj = saved_text;
        self.curpath = saved_path;
        result
    }
}
