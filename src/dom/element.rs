use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{DomNode, NodeHandle};

/// In-memory element with reference identity.
///
/// Cloning an `Element` clones the handle, not the node. Use
/// [`Element::deep_clone`] for an independent copy.
#[derive(Clone)]
pub struct Element {
    inner: Arc<RwLock<ElementData>>,
}

/// Weak handle to an [`Element`].
#[derive(Clone)]
pub struct ElementHandle {
    inner: Weak<RwLock<ElementData>>,
}

struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
    /// Inert fragment of a `<template>`; not part of `children`.
    content: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ElementData {
                tag: tag.into(),
                attributes: Vec::new(),
                text: String::new(),
                children: Vec::new(),
                content: Vec::new(),
            })),
        }
    }

    /// A `<template>` element whose content is `content`.
    pub fn template<I>(content: I) -> Self
    where
        I: IntoIterator<Item = Element>,
    {
        let template = Element::new("template");
        template.inner.write().content.extend(content);
        template
    }

    pub fn with_attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        self.set_attribute(&name, &value);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.set_text_content(&text.into());
        self
    }

    pub fn with_child(self, child: Element) -> Self {
        self.append_child(child);
        self
    }

    pub fn with_children<I>(self, children: I) -> Self
    where
        I: IntoIterator<Item = Element>,
    {
        self.inner.write().children.extend(children);
        self
    }

    /// Adds `child` to the inert template content.
    pub fn with_content(self, child: Element) -> Self {
        self.inner.write().content.push(child);
        self
    }

    /// Independent copy of this node, its subtree and its template content.
    pub fn deep_clone(&self) -> Element {
        let data = self.inner.read();
        Element {
            inner: Arc::new(RwLock::new(ElementData {
                tag: data.tag.clone(),
                attributes: data.attributes.clone(),
                text: data.text.clone(),
                children: data.children.iter().map(Element::deep_clone).collect(),
                content: data.content.iter().map(Element::deep_clone).collect(),
            })),
        }
    }

    /// First descendant whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<Element> {
        self.query_first(|node| node.attribute("id").as_deref() == Some(id))
    }

    pub fn child_count(&self) -> usize {
        self.inner.read().children.len()
    }

    /// Serialises the subtree, template content included.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let data = self.inner.read();
        out.push('<');
        out.push_str(&data.tag);
        for (name, value) in &data.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            push_escaped(out, value);
            out.push('"');
        }
        out.push('>');
        push_escaped(out, &data.text);
        for child in data.content.iter().chain(data.children.iter()) {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&data.tag);
        out.push('>');
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.same_node(other)
    }
}

impl Eq for Element {}

impl NodeHandle for ElementHandle {
    type Node = Element;

    fn upgrade(&self) -> Option<Element> {
        self.inner.upgrade().map(|inner| Element { inner })
    }
}

impl DomNode for Element {
    type Handle = ElementHandle;

    fn downgrade(&self) -> ElementHandle {
        ElementHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn same_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn tag_name(&self) -> String {
        self.inner.read().tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.inner
            .read()
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn attribute_names(&self) -> Vec<String> {
        self.inner
            .read()
            .attributes
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let mut data = self.inner.write();
        match data.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&self, name: &str) {
        self.inner.write().attributes.retain(|(n, _)| n != name);
    }

    fn text_content(&self) -> String {
        let data = self.inner.read();
        let mut text = data.text.clone();
        for child in &data.children {
            text.push_str(&child.text_content());
        }
        text
    }

    fn set_text_content(&self, text: &str) {
        let mut data = self.inner.write();
        data.children.clear();
        data.text = text.to_string();
    }

    fn children(&self) -> Vec<Element> {
        self.inner.read().children.clone()
    }

    fn append_child(&self, child: Element) {
        self.inner.write().children.push(child);
    }

    fn remove_child(&self, child: &Element) -> bool {
        let mut data = self.inner.write();
        match data.children.iter().position(|c| c.same_node(child)) {
            Some(index) => {
                data.children.remove(index);
                true
            }
            None => false,
        }
    }

    fn clone_template_content(&self) -> Vec<Element> {
        self.inner
            .read()
            .content
            .iter()
            .map(Element::deep_clone)
            .collect()
    }
}
