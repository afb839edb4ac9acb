//! Expand/collapse and selection state for the BOM tree table.

use partdb_sync::{BomTree, TreeItem};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct TreeState {
    tree: BomTree,
    expanded: BTreeSet<usize>,
    selected: BTreeSet<TreeItem>,
    cursor: usize,
}

impl TreeState {
    pub fn new(tree: BomTree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    pub fn tree(&self) -> &BomTree {
        &self.tree
    }

    /// Replace the tree, keeping expansion and cursor where they still fit.
    /// The selection is cleared.
    pub fn set_tree(&mut self, tree: BomTree) {
        let groups = tree.len();
        self.tree = tree;
        self.expanded.retain(|&g| g < groups);
        self.selected.clear();
        self.cursor = self.cursor.min(self.rows().len().saturating_sub(1));
    }

    /// Visible rows, top to bottom.
    pub fn rows(&self) -> Vec<TreeItem> {
        let mut rows = Vec::new();
        for (g, group) in self.tree.groups.iter().enumerate() {
            rows.push(TreeItem::Group(g));
            if self.expanded.contains(&g) {
                rows.extend((0..group.children.len()).map(|c| TreeItem::Child(g, c)));
            }
        }
        rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<TreeItem> {
        self.rows().get(self.cursor).copied()
    }

    pub fn is_expanded(&self, group: usize) -> bool {
        self.expanded.contains(&group)
    }

    pub fn is_selected(&self, item: TreeItem) -> bool {
        self.selected.contains(&item)
    }

    pub fn selection(&self) -> Vec<TreeItem> {
        self.selected.iter().copied().collect()
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let last = self.rows().len().saturating_sub(1);
        self.cursor = (self.cursor + 1).min(last);
    }

    pub fn expand(&mut self) {
        if let Some(TreeItem::Group(g)) = self.current() {
            self.expanded.insert(g);
        }
    }

    /// Collapse the current group, or the parent of the current child.
    pub fn collapse(&mut self) {
        let group = match self.current() {
            Some(TreeItem::Group(g)) | Some(TreeItem::Child(g, _)) => g,
            None => return,
        };
        self.expanded.remove(&group);
        if let Some(row) = self.rows().iter().position(|r| *r == TreeItem::Group(group)) {
            self.cursor = row;
        }
    }

    pub fn toggle_expanded(&mut self) {
        match self.current() {
            Some(TreeItem::Group(g)) if self.expanded.contains(&g) => self.collapse(),
            Some(TreeItem::Group(_)) => self.expand(),
            _ => {}
        }
    }

    pub fn toggle_selected(&mut self) {
        if let Some(item) = self.current() {
            if !self.selected.remove(&item) {
                self.selected.insert(item);
            }
        }
    }
}
