//! Read-only projection of canonical state.
//!
//! A view pins the `Arc` of the state it was taken from, so it keeps
//! showing that point in time even after the container moves on. Nested
//! objects and sequences are projected too; there is no path from a view
//! back to a mutable value.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::atom::AtomError;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::state::AtomState;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Read-only view of a state object (the root or a nested object).
#[derive(Clone)]
pub struct ReadOnlyState {
    root: Arc<AtomState>,
    path: Vec<Segment>,
    diagnostics: Diagnostics,
}

/// Read-only view of a sequence inside state.
#[derive(Clone)]
pub struct ReadOnlyList {
    root: Arc<AtomState>,
    path: Vec<Segment>,
    diagnostics: Diagnostics,
}

/// A value read through a view.
#[derive(Clone)]
pub enum ReadOnlyValue {
    Object(ReadOnlyState),
    List(ReadOnlyList),
    Scalar(Value),
}

fn lookup<'a>(root: &'a AtomState, path: &[Segment]) -> &'a Value {
    let Some((first, rest)) = path.split_first() else {
        return &NULL;
    };
    let Segment::Key(first) = first else {
        return &NULL;
    };
    let mut current = match root.get(first) {
        Some(value) => value,
        None => return &NULL,
    };
    for segment in rest {
        current = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key).unwrap_or(&NULL),
            (Segment::Index(index), Value::Array(items)) => items.get(*index).unwrap_or(&NULL),
            _ => &NULL,
        };
    }
    current
}

fn dotted(path: &[Segment], last: &str) -> String {
    path.iter()
        .map(|segment| match segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        })
        .chain(std::iter::once(last.to_string()))
        .collect::<Vec<_>>()
        .join(".")
}

fn project(
    root: &Arc<AtomState>,
    path: Vec<Segment>,
    diagnostics: &Diagnostics,
    value: &Value,
) -> ReadOnlyValue {
    match value {
        Value::Object(_) => ReadOnlyValue::Object(ReadOnlyState {
            root: Arc::clone(root),
            path,
            diagnostics: diagnostics.clone(),
        }),
        Value::Array(_) => ReadOnlyValue::List(ReadOnlyList {
            root: Arc::clone(root),
            path,
            diagnostics: diagnostics.clone(),
        }),
        scalar => ReadOnlyValue::Scalar(scalar.clone()),
    }
}

impl ReadOnlyState {
    pub(crate) fn new(root: Arc<AtomState>, diagnostics: Diagnostics) -> Self {
        Self {
            root,
            path: Vec::new(),
            diagnostics,
        }
    }

    fn object(&self) -> Option<&AtomState> {
        if self.path.is_empty() {
            return Some(&self.root);
        }
        match lookup(&self.root, &self.path) {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Reads a property; objects and sequences come back as views.
    pub fn get(&self, key: &str) -> Option<ReadOnlyValue> {
        let value = self.object()?.get(key)?;
        let mut path = self.path.clone();
        path.push(Segment::Key(key.to_string()));
        Some(project(&self.root, path, &self.diagnostics, value))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.object().is_some_and(|map| map.contains_key(key))
    }

    pub fn keys(&self) -> Vec<String> {
        self.object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.object().map_or(0, |map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuses the write and reports it. The view and the container are unchanged.
    pub fn set(&self, key: &str, _value: Value) -> Result<(), AtomError> {
        let key = dotted(&self.path, key);
        self.diagnostics
            .emit(Diagnostic::ReadOnlyWrite { key: key.clone() });
        Err(AtomError::ReadOnly { key })
    }

    /// Refuses the deletion and reports it.
    pub fn remove(&self, key: &str) -> Result<(), AtomError> {
        let key = dotted(&self.path, key);
        self.diagnostics
            .emit(Diagnostic::ReadOnlyDelete { key: key.clone() });
        Err(AtomError::ReadOnly { key })
    }

    /// Owned deep copy of the viewed object.
    pub fn to_value(&self) -> AtomState {
        self.object().cloned().unwrap_or_default()
    }
}

impl ReadOnlyList {
    fn items(&self) -> &[Value] {
        match lookup(&self.root, &self.path) {
            Value::Array(items) => items,
            _ => &[],
        }
    }

    pub fn get(&self, index: usize) -> Option<ReadOnlyValue> {
        let value = self.items().get(index)?;
        let mut path = self.path.clone();
        path.push(Segment::Index(index));
        Some(project(&self.root, path, &self.diagnostics, value))
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ReadOnlyValue> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Refuses the write and reports it.
    pub fn set(&self, index: usize, _value: Value) -> Result<(), AtomError> {
        let key = dotted(&self.path, &index.to_string());
        self.diagnostics
            .emit(Diagnostic::ReadOnlyWrite { key: key.clone() });
        Err(AtomError::ReadOnly { key })
    }

    /// Refuses the append and reports it.
    pub fn push(&self, _value: Value) -> Result<(), AtomError> {
        let key = dotted(&self.path, &self.len().to_string());
        self.diagnostics
            .emit(Diagnostic::ReadOnlyWrite { key: key.clone() });
        Err(AtomError::ReadOnly { key })
    }

    /// Owned deep copy of the viewed sequence.
    pub fn to_vec(&self) -> Vec<Value> {
        self.items().to_vec()
    }
}

impl ReadOnlyValue {
    pub fn as_object(&self) -> Option<&ReadOnlyState> {
        match self {
            ReadOnlyValue::Object(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ReadOnlyList> {
        match self {
            ReadOnlyValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ReadOnlyValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Owned deep copy.
    pub fn to_value(&self) -> Value {
        match self {
            ReadOnlyValue::Object(state) => Value::Object(state.to_value()),
            ReadOnlyValue::List(list) => Value::Array(list.to_vec()),
            ReadOnlyValue::Scalar(value) => value.clone(),
        }
    }
}

impl fmt::Debug for ReadOnlyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyState").field(&self.to_value()).finish()
    }
}

impl fmt::Debug for ReadOnlyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyList").field(&self.to_vec()).finish()
    }
}

impl fmt::Debug for ReadOnlyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadOnlyValue::Object(state) => fmt::Debug::fmt(state, f),
            ReadOnlyValue::List(list) => fmt::Debug::fmt(list, f),
            ReadOnlyValue::Scalar(value) => fmt::Debug::fmt(value, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::state::into_partial;
    use serde_json::json;

    fn view(sink: Arc<MemorySink>) -> ReadOnlyState {
        let state = into_partial(json!({
            "count": 3,
            "profile": {"name": "Ada", "langs": ["en", "no"]},
            "users": [{"name": "John"}]
        }));
        ReadOnlyState::new(Arc::new(state), Diagnostics::silent().with_sink(sink))
    }

    #[test]
    fn test_reads_project_nested_values() {
        let state = view(Arc::new(MemorySink::new()));

        assert_eq!(state.get("count").unwrap().as_scalar(), Some(&json!(3)));
        let profile = state.get("profile").unwrap();
        let profile = profile.as_object().unwrap();
        assert_eq!(profile.get("name").unwrap().to_value(), json!("Ada"));

        let langs = profile.get("langs").unwrap();
        let langs = langs.as_list().unwrap();
        assert_eq!(langs.len(), 2);
        assert_eq!(langs.get(1).unwrap().to_value(), json!("no"));
        assert!(state.get("missing").is_none());
    }

    #[test]
    fn test_writes_are_refused_with_diagnostics() {
        let sink = Arc::new(MemorySink::new());
        let state = view(sink.clone());

        let err = state.set("count", json!(10)).unwrap_err();
        assert!(matches!(err, AtomError::ReadOnly { ref key } if key == "count"));
        assert_eq!(state.get("count").unwrap().to_value(), json!(3));

        let profile = state.get("profile").unwrap();
        let err = profile.as_object().unwrap().remove("name").unwrap_err();
        assert_eq!(err.to_string(), "State is read-only: cannot modify 'profile.name'");

        assert_eq!(sink.kinds(), vec!["read_only_write", "read_only_delete"]);
    }

    #[test]
    fn test_sequences_are_protected_too() {
        let sink = Arc::new(MemorySink::new());
        let state = view(sink.clone());

        let users = state.get("users").unwrap();
        let users = users.as_list().unwrap();
        assert!(users.push(json!({"name": "Eve"})).is_err());
        assert!(users.set(0, json!(null)).is_err());
        assert_eq!(users.len(), 1);

        let first = users.get(0).unwrap();
        assert!(first.as_object().unwrap().set("name", json!("X")).is_err());
        assert_eq!(
            sink.entries(),
            vec![
                Diagnostic::ReadOnlyWrite { key: "users.1".to_string() },
                Diagnostic::ReadOnlyWrite { key: "users.0".to_string() },
                Diagnostic::ReadOnlyWrite { key: "users.0.name".to_string() },
            ]
        );
    }
}
