//! DOM-backed display surface.

use qshield_core::{DisplaySurface, Element, SurfaceError};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

/// Writes projections straight into the page, addressing containers by id.
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Surface over `window.document`, if there is one.
    pub fn from_window() -> Option<Self> {
        web_sys::window()
            .and_then(|w| w.document())
            .map(Self::new)
    }

    fn element(&self, id: &str) -> Result<web_sys::Element, SurfaceError> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| SurfaceError::Missing(id.to_string()))
    }
}

impl DisplaySurface for DomSurface {
    fn contains(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn set_text(&mut self, id: &str, text: &str) -> Result<(), SurfaceError> {
        self.element(id)?.set_text_content(Some(text));
        Ok(())
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> Result<(), SurfaceError> {
        let el = self.element(id)?;
        match el.dyn_ref::<HtmlElement>() {
            Some(html) => {
                if let Err(e) = html.style().set_property(property, value) {
                    log::debug!("style {property} on '{id}' rejected: {e:?}");
                }
            }
            None => log::debug!("'{id}' is not styleable"),
        }
        Ok(())
    }

    fn clear_children(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.element(id)?.set_inner_html("");
        Ok(())
    }

    fn append_child(&mut self, id: &str, child: Element) -> Result<(), SurfaceError> {
        let parent = self.element(id)?;
        let node = match self.document.create_element(&child.tag) {
            Ok(node) => node,
            Err(e) => {
                log::debug!("cannot create <{}>: {e:?}", child.tag);
                return Ok(());
            }
        };
        node.set_class_name(&child.class);
        node.set_text_content(Some(&child.text));
        if let Err(e) = parent.append_child(&node) {
            log::debug!("append into '{id}' failed: {e:?}");
        }
        Ok(())
    }
}
