//! Directive renderer.
//!
//! A render pass rewrites a target's subtree in place so it shows the
//! current state:
//!
//! 1. the target's own `x-text`, then every descendant `x-text` bound to
//!    a top-level state key;
//! 2. every descendant `x-for`, which clears the element's rendered
//!    children and clones its template once per item of the source array.
//!
//! Nothing is cached between passes. Bindings are rediscovered by
//! scanning the tree every time.

mod binding;

use serde_json::{Map, Value};

pub use binding::ForBinding;

use crate::config::DirectiveConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dom::DomNode;
use crate::expr;
use crate::state::{display_value, is_truthy, resolve_path, AtomState};

/// Marker attribute cleared on every repetition pass.
pub const PROCESSED_MARKER: &str = "data-x-for-processed";

pub struct Renderer<'a> {
    directives: &'a DirectiveConfig,
    diagnostics: &'a Diagnostics,
}

impl<'a> Renderer<'a> {
    pub fn new(directives: &'a DirectiveConfig, diagnostics: &'a Diagnostics) -> Self {
        Self {
            directives,
            diagnostics,
        }
    }

    /// Runs one full render pass over `target`.
    pub fn render<N: DomNode>(&self, target: &N, state: &AtomState) {
        let text_attr = self.directives.text.as_str();
        let repeat_attr = self.directives.repeat.as_str();

        self.bind_state_text(target, state);
        for node in target.query_all(|n| n.has_attribute(text_attr)) {
            self.bind_state_text(&node, state);
        }

        // Collected up front: clones appended below are not revisited.
        let repeats = target.query_all(|n| n.has_attribute(repeat_attr));
        for node in repeats {
            if let Some(expression) = node.attribute(repeat_attr) {
                if !expression.is_empty() {
                    self.render_repeat(&node, &expression, state);
                }
            }
        }
    }

    /// Sets the text of a node bound to a top-level key present in state.
    fn bind_state_text<N: DomNode>(&self, node: &N, state: &AtomState) {
        let Some(key) = node.attribute(&self.directives.text) else {
            return;
        };
        if let Some(value) = state.get(&key) {
            node.set_text_content(&display_value(value));
        }
    }

    /// Expands one `x-for` element.
    pub fn render_repeat<N: DomNode>(&self, element: &N, expression: &str, state: &AtomState) {
        let Some(binding) = ForBinding::parse(expression) else {
            self.diagnostics.emit(Diagnostic::InvalidForSyntax {
                expression: expression.to_string(),
            });
            return;
        };

        let Some(Value::Array(items)) = state.get(&binding.source) else {
            self.diagnostics.emit(Diagnostic::NotASequence {
                key: binding.source.clone(),
            });
            return;
        };

        let template_tag = self.directives.template_tag.as_str();
        let Some(template) = element.query_first(|n| n.tag_name().eq_ignore_ascii_case(template_tag))
        else {
            self.diagnostics.emit(Diagnostic::MissingTemplate {
                expression: expression.to_string(),
            });
            return;
        };

        for child in element.children() {
            if !child.same_node(&template) {
                element.remove_child(&child);
            }
        }
        element.remove_attribute(PROCESSED_MARKER);

        for (index, item) in items.iter().enumerate() {
            let fragment = template.clone_template_content();
            for node in &fragment {
                self.bind_item(node, &binding, item, index);
            }
            for node in fragment {
                element.append_child(node);
            }
        }

        tracing::trace!(
            source = %binding.source,
            items = items.len(),
            "Rendered x-for"
        );
    }

    /// Applies item-scoped bindings to a cloned node and its subtree.
    fn bind_item<N: DomNode>(&self, node: &N, binding: &ForBinding, item: &Value, index: usize) {
        let item_prefix = format!("{}.", binding.item);

        if let Some(text) = node.attribute(&self.directives.text) {
            if !text.is_empty() {
                let rendered = self.item_text(&text, &item_prefix, binding, item, index);
                node.set_text_content(&rendered);
            }
        }

        for name in node.attribute_names() {
            if !name.starts_with(&self.directives.data_prefix) {
                continue;
            }
            let Some(value) = node.attribute(&name) else {
                continue;
            };
            if let Some(path) = value.strip_prefix(&item_prefix) {
                node.set_attribute(&name, &item_property(item, path));
            }
        }

        for child in node.children() {
            self.bind_item(&child, binding, item, index);
        }
    }

    fn item_text(
        &self,
        text: &str,
        item_prefix: &str,
        binding: &ForBinding,
        item: &Value,
        index: usize,
    ) -> String {
        if let Some(path) = text.strip_prefix(item_prefix) {
            return item_property(item, path);
        }
        if text == binding.item {
            return display_value(item);
        }
        if binding.index.as_deref() == Some(text) {
            return index.to_string();
        }

        let mut context = Map::new();
        context.insert(binding.item.clone(), item.clone());
        context.insert(
            binding
                .index_name(&self.directives.default_index_name)
                .to_string(),
            Value::from(index),
        );

        match expr::try_evaluate(text, &context) {
            Ok(value) => value.to_display_string(),
            Err(err) => {
                self.diagnostics.emit(Diagnostic::ExpressionFallback {
                    expression: text.to_string(),
                    error: err.to_string(),
                });
                text.to_string()
            }
        }
    }
}

/// String form of `item.path`; missing or falsy values render empty.
fn item_property(item: &Value, path: &str) -> String {
    let (parent, last) = match path.rsplit_once('.') {
        Some((parent, last)) => (resolve_path(item, parent), last),
        None => (Some(item), path),
    };
    let value = match parent {
        Some(Value::String(s)) if last == "length" => Value::from(s.encode_utf16().count()),
        Some(Value::Array(items)) if last == "length" => Value::from(items.len()),
        Some(parent) => match resolve_path(parent, last) {
            Some(value) => value.clone(),
            None => return String::new(),
        },
        None => return String::new(),
    };
    if is_truthy(&value) {
        display_value(&value)
    } else {
        String::new()
    }
}
