//! Tree contract required from render targets.
//!
//! The renderer never owns the tree it writes to. It only needs the
//! handful of capabilities in [`DomNode`]: attribute and text access,
//! child enumeration and mutation, template cloning and node identity.
//! [`Element`] is the in-memory implementation used by the crate's
//! tests and by embedders without a tree of their own.

mod element;

pub use element::{Element, ElementHandle};

/// Weak reference to a node, held by the container's attachment list.
pub trait NodeHandle: Clone + Send + Sync {
    type Node;

    /// Returns the node if it is still alive.
    fn upgrade(&self) -> Option<Self::Node>;
}

/// A node in an external tree that can be kept in sync with state.
///
/// Handles are cheap to clone and share the underlying node; every
/// mutation through one clone is visible through all of them.
pub trait DomNode: Clone + Sized + 'static {
    type Handle: NodeHandle<Node = Self>;

    fn downgrade(&self) -> Self::Handle;

    /// Reference equality.
    fn same_node(&self, other: &Self) -> bool;

    fn tag_name(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Attribute names in document order.
    fn attribute_names(&self) -> Vec<String>;

    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);

    fn text_content(&self) -> String;

    /// Replaces all children with the given text.
    fn set_text_content(&self, text: &str);

    fn children(&self) -> Vec<Self>;

    fn append_child(&self, child: Self);

    /// Returns false if `child` is not a direct child.
    fn remove_child(&self, child: &Self) -> bool;

    /// Deep copies of this node's template content.
    fn clone_template_content(&self) -> Vec<Self>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Every descendant in document order, excluding `self` and template content.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Descendants matching `predicate`, in document order.
    fn query_all<F>(&self, predicate: F) -> Vec<Self>
    where
        F: Fn(&Self) -> bool,
    {
        self.descendants()
            .into_iter()
            .filter(|node| predicate(node))
            .collect()
    }

    /// First descendant matching `predicate`.
    fn query_first<F>(&self, predicate: F) -> Option<Self>
    where
        F: Fn(&Self) -> bool,
    {
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if predicate(&node) {
                return Some(node);
            }
            stack.extend(node.children().into_iter().rev());
        }
        None
    }
}
