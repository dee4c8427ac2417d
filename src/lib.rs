//! Reactive state container that keeps markup trees in sync with state
//! through `x-text` and `x-for` directives.
//!
//! ```
//! use serde_json::json;
//! use xatom::{into_partial, Atom, DomNode, Element};
//!
//! let counter = Element::new("span").with_attr("x-text", "count");
//! let atom = Atom::new(into_partial(json!({ "count": 0 })));
//! atom.attach(&counter);
//! assert_eq!(counter.text_content(), "0");
//!
//! atom.set_state(into_partial(json!({ "count": 5 })));
//! assert_eq!(counter.text_content(), "5");
//! ```

pub mod atom;
pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod expr;
pub mod logging;
pub mod render;
pub mod state;

pub use atom::{Atom, AtomError, Subscriber, SubscriberId, Subscription};
pub use config::{AtomConfig, ConfigError};
pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, MemorySink, TracingSink};
pub use dom::{DomNode, Element, NodeHandle};
pub use render::ForBinding;
pub use state::{into_partial, AtomState, ReadOnlyList, ReadOnlyState, ReadOnlyValue};
