//! Display-surface collaborator.
//!
//! The engine never touches a DOM directly. It writes text, style properties
//! and child rows into named containers through [`DisplaySurface`]; a missing
//! container is reported as [`SurfaceError::Missing`] and the caller skips
//! that one projection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::SurfaceError;

/// A child row appended into a list container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    pub class: String,
    pub text: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: String::new(),
            text: String::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Named, addressable display containers.
pub trait DisplaySurface {
    fn contains(&self, id: &str) -> bool;
    fn set_text(&mut self, id: &str, text: &str) -> Result<(), SurfaceError>;
    fn set_style(&mut self, id: &str, property: &str, value: &str) -> Result<(), SurfaceError>;
    fn clear_children(&mut self, id: &str) -> Result<(), SurfaceError>;
    fn append_child(&mut self, id: &str, child: Element) -> Result<(), SurfaceError>;
}

/// Contents of one in-memory container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Node {
    pub text: String,
    pub style: BTreeMap<String, String>,
    pub children: Vec<Element>,
}

/// In-memory surface: an ordered map of containers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemorySurface {
    nodes: BTreeMap<String, Node>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        let mut surface = Self::new();
        for id in ids {
            surface.add_container(id);
        }
        surface
    }

    pub fn add_container(&mut self, id: impl Into<String>) {
        self.nodes.entry(id.into()).or_default();
    }

    pub fn remove_container(&mut self, id: &str) -> Option<Node> {
        self.nodes.remove(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).map(|n| n.text.as_str())
    }

    pub fn style(&self, id: &str, property: &str) -> Option<&str> {
        self.nodes.get(id)?.style.get(property).map(String::as_str)
    }

    pub fn children(&self, id: &str) -> &[Element] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, SurfaceError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| SurfaceError::Missing(id.to_string()))
    }
}

impl DisplaySurface for MemorySurface {
    fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn set_text(&mut self, id: &str, text: &str) -> Result<(), SurfaceError> {
        let node = self.node_mut(id)?;
        if node.text != text {
            node.text = text.to_string();
        }
        Ok(())
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> Result<(), SurfaceError> {
        self.node_mut(id)?
            .style
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn clear_children(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.node_mut(id)?.children.clear();
        Ok(())
    }

    fn append_child(&mut self, id: &str, child: Element) -> Result<(), SurfaceError> {
        self.node_mut(id)?.children.push(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_land_in_named_containers() {
        let mut surface = MemorySurface::with_containers(["cpu-usage", "threat-feed"]);
        surface.set_text("cpu-usage", "67%").unwrap();
        surface.set_style("cpu-usage", "width", "67%").unwrap();
        surface
            .append_child("threat-feed", Element::new("div").class("row").text("a"))
            .unwrap();
        assert_eq!(surface.text("cpu-usage"), Some("67%"));
        assert_eq!(surface.style("cpu-usage", "width"), Some("67%"));
        assert_eq!(surface.children("threat-feed").len(), 1);

        surface.clear_children("threat-feed").unwrap();
        assert!(surface.children("threat-feed").is_empty());
    }

    #[test]
    fn missing_container_is_reported_not_created() {
        let mut surface = MemorySurface::new();
        let err = surface.set_text("nope", "x").unwrap_err();
        assert_eq!(err, SurfaceError::Missing("nope".into()));
        assert!(!surface.contains("nope"));
        assert!(surface.children("nope").is_empty());
    }
}
