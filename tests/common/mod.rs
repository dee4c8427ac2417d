//! Shared fixtures for integration tests.

#![allow(dead_code, unused_imports)]

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use xatom::{into_partial, Atom, AtomConfig, AtomState, Diagnostics, DomNode, Element, MemorySink};

/// Builds a state map from a JSON object literal.
pub fn state(value: Value) -> AtomState {
    into_partial(value)
}

/// Container whose diagnostics are captured instead of logged.
pub fn recording_atom(initial: Value) -> (Atom, Arc<MemorySink>) {
    recording_atom_with(initial, AtomConfig::default())
}

pub fn recording_atom_with(initial: Value, config: AtomConfig) -> (Atom, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let atom = Atom::with_diagnostics(
        state(initial),
        config,
        Diagnostics::silent().with_sink(sink.clone()),
    );
    (atom, sink)
}

/// `<ul x-for="{expression}"><template>{item}</template></ul>`
pub fn repeat_list(expression: &str, item: Element) -> Element {
    Element::new("ul")
        .with_attr("x-for", expression)
        .with_child(Element::template([item]))
}

/// Children of a repetition element other than its template.
pub fn clones(list: &Element) -> Vec<Element> {
    list.children()
        .into_iter()
        .filter(|child| child.tag_name() != "template")
        .collect()
}

pub fn clone_texts(list: &Element) -> Vec<String> {
    clones(list).iter().map(|c| c.text_content()).collect()
}

pub fn template_count(list: &Element) -> usize {
    list.children()
        .iter()
        .filter(|child| child.tag_name() == "template")
        .count()
}

/// Write a config file into a fresh temp dir.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
