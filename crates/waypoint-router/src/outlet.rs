//! The subtree views are attached to.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::view::{same_view, view_addr, ViewHandle};

/// A tree of views rooted at the router outlet.
///
/// `parent == None` addresses the outlet itself.
pub trait Outlet: Send + Sync {
    /// Children of `parent`, in order.
    fn children(&self, parent: Option<&ViewHandle>) -> Vec<ViewHandle>;

    /// Appends `child` to `parent`, moving it if it is attached elsewhere.
    fn append_child(&self, parent: Option<&ViewHandle>, child: &ViewHandle);

    /// Detaches `child` and its subtree.
    fn remove_child(&self, child: &ViewHandle);

    /// Returns whether `child` is a direct child of `parent`.
    fn is_child_of(&self, parent: Option<&ViewHandle>, child: &ViewHandle) -> bool {
        self.children(parent)
            .iter()
            .any(|candidate| same_view(candidate, child))
    }

    /// Detaches every child of `parent`.
    fn clear_children(&self, parent: Option<&ViewHandle>) {
        for child in self.children(parent) {
            self.remove_child(&child);
        }
    }
}

struct Node {
    view: ViewHandle,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Default)]
struct Tree {
    nodes: HashMap<usize, Node>,
    roots: Vec<usize>,
}

impl Tree {
    fn child_list(&mut self, parent: Option<usize>) -> Option<&mut Vec<usize>> {
        match parent {
            None => Some(&mut self.roots),
            Some(id) => self.nodes.get_mut(&id).map(|node| &mut node.children),
        }
    }

    fn unlink(&mut self, id: usize) {
        let parent = self.nodes.get(&id).and_then(|node| node.parent);
        if let Some(list) = self.child_list(parent) {
            list.retain(|&child| child != id);
        }
    }

    fn forget(&mut self, id: usize) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.forget(child);
            }
        }
    }
}

/// An in-memory [`Outlet`].
///
/// Detached nodes are forgotten together with their subtree.
#[derive(Default)]
pub struct MemoryOutlet {
    tree: Mutex<Tree>,
}

impl MemoryOutlet {
    /// Creates an empty outlet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag names of the attached views, depth first, indented by depth.
    pub fn render_tree(&self) -> String {
        fn walk(tree: &Tree, ids: &[usize], depth: usize, out: &mut String) {
            for id in ids {
                if let Some(node) = tree.nodes.get(id) {
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(node.view.tag_name());
                    out.push('\n');
                    walk(tree, &node.children, depth + 1, out);
                }
            }
        }

        let tree = self.tree.lock();
        let mut out = String::new();
        walk(&tree, &tree.roots, 0, &mut out);
        out
    }

    /// Number of attached views.
    pub fn len(&self) -> usize {
        self.tree.lock().nodes.len()
    }

    /// Returns whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.tree.lock().nodes.is_empty()
    }
}

impl Outlet for MemoryOutlet {
    fn children(&self, parent: Option<&ViewHandle>) -> Vec<ViewHandle> {
        let tree = self.tree.lock();
        let ids = match parent {
            None => &tree.roots,
            Some(parent) => match tree.nodes.get(&view_addr(parent)) {
                Some(node) => &node.children,
                None => return Vec::new(),
            },
        };
        ids.iter()
            .filter_map(|id| tree.nodes.get(id).map(|node| node.view.clone()))
            .collect()
    }

    fn append_child(&self, parent: Option<&ViewHandle>, child: &ViewHandle) {
        let mut tree = self.tree.lock();
        let id = view_addr(child);
        let parent_id = parent.map(view_addr);
        if parent_id.is_some_and(|p| !tree.nodes.contains_key(&p)) {
            return;
        }

        if tree.nodes.contains_key(&id) {
            tree.unlink(id);
        } else {
            tree.nodes.insert(
                id,
                Node {
                    view: child.clone(),
                    parent: None,
                    children: Vec::new(),
                },
            );
        }
        if let Some(node) = tree.nodes.get_mut(&id) {
            node.parent = parent_id;
        }
        if let Some(list) = tree.child_list(parent_id) {
            list.push(id);
        }
    }

    fn remove_child(&self, child: &ViewHandle) {
        let mut tree = self.tree.lock();
        let id = view_addr(child);
        tree.unlink(id);
        tree.forget(id);
    }
}

impl fmt::Debug for MemoryOutlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryOutlet")
            .field("tree", &self.render_tree())
            .finish()
    }
}
