// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only access to a layer tree.

use psdwerk_core::LayerId;

use crate::layer::{LayerDocument, LayerNode};

/// Minimal capability set the compositor and the tool surface need from a
/// layer tree. `None` as a parent addresses the document root.
///
/// Implementations must be free of side effects so that concurrent readers are
/// safe while no load is in progress.
pub trait LayerTree {
    /// Number of direct children of `parent`.
    fn row_count(&self, parent: Option<&LayerNode>) -> usize;

    /// The `row`-th child of `parent` (row 0 is the topmost layer).
    fn child<'a>(&'a self, parent: Option<&'a LayerNode>, row: usize) -> Option<&'a LayerNode>;

    /// Depth-first search for the layer with `id`.
    fn find_by_id(&self, id: LayerId) -> Option<&LayerNode> {
        find_in(self, None, id)
    }

    /// Total number of layers in the tree, folders included.
    fn count_all(&self) -> usize {
        count_in(self, None)
    }
}

fn find_in<'a, T: LayerTree + ?Sized>(
    tree: &'a T,
    parent: Option<&'a LayerNode>,
    id: LayerId,
) -> Option<&'a LayerNode> {
    for row in 0..tree.row_count(parent) {
        let Some(node) = tree.child(parent, row) else {
            continue;
        };
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in(tree, Some(node), id) {
            return Some(found);
        }
    }
    None
}

fn count_in<'a, T: LayerTree + ?Sized>(tree: &'a T, parent: Option<&'a LayerNode>) -> usize {
    (0..tree.row_count(parent))
        .filter_map(|row| tree.child(parent, row))
        .map(|node| 1 + count_in(tree, Some(node)))
        .sum()
}

impl LayerTree for LayerDocument {
    fn row_count(&self, parent: Option<&LayerNode>) -> usize {
        match parent {
            Some(node) => node.children.len(),
            None => self.layers.len(),
        }
    }

    fn child<'a>(&'a self, parent: Option<&'a LayerNode>, row: usize) -> Option<&'a LayerNode> {
        match parent {
            Some(node) => node.children.get(row),
            None => self.layers.get(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn leaf(id: u32) -> LayerNode {
        LayerNode::image_layer(
            LayerId(id),
            format!("leaf {id}"),
            0,
            0,
            DynamicImage::ImageRgba8(RgbaImage::new(1, 1)),
        )
    }

    fn sample() -> LayerDocument {
        LayerDocument::new(
            "sample.psd",
            10,
            10,
            vec![
                LayerNode::folder(
                    LayerId(1),
                    "group",
                    vec![leaf(2), LayerNode::folder(LayerId(3), "nested", vec![leaf(4)])],
                ),
                leaf(5),
            ],
        )
    }

    #[test]
    fn row_count_and_child() {
        let doc = sample();
        assert_eq!(doc.row_count(None), 2);
        let group = doc.child(None, 0).unwrap();
        assert_eq!(group.id, LayerId(1));
        assert_eq!(doc.row_count(Some(group)), 2);
        assert_eq!(doc.child(Some(group), 1).unwrap().id, LayerId(3));
        assert!(doc.child(Some(group), 2).is_none());
    }

    #[test]
    fn find_by_id_searches_depth_first() {
        let doc = sample();
        for id in 1..=5 {
            let node = doc.find_by_id(LayerId(id)).expect("layer present");
            assert_eq!(node.id, LayerId(id));
        }
        assert!(doc.find_by_id(LayerId(99)).is_none());
    }

    #[test]
    fn count_all_includes_folders() {
        assert_eq!(sample().count_all(), 5);
        assert_eq!(LayerDocument::default().count_all(), 0);
    }

    #[test]
    fn documents_are_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<LayerDocument>();

        let doc = sample();
        std::thread::scope(|s| {
            let a = s.spawn(|| doc.count_all());
            let b = s.spawn(|| doc.find_by_id(LayerId(4)).map(|n| n.id));
            assert_eq!(a.join().unwrap(), 5);
            assert_eq!(b.join().unwrap(), Some(LayerId(4)));
        });
    }
}
