// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `cut` (§4.5): remove an edge and split its component in two.
//!
//! Unlike `link`, which always has to contract a *new* internal vertex,
//! removing an edge is naturally a single recursive "delete this leaf,
//! collapse its parent, repeat" walk from the BASE node up to the root —
//! the degree-based three-case table in the original algorithm falls out of
//! which slot (proper child vs. foster) the removed edge occupied at each
//! step, rather than needing to be dispatched on up front.

use crate::error::TopTreeError;
use crate::ids::{ClusterRef, VertexId};
use crate::listener::Listener;
use crate::node::{NodeKind, Up};
use crate::TopForest;

impl<L, V, C> TopForest<L, V, C>
where
    L: Listener<V, C>,
    C: Default,
{
    /// Remove the edge between `u` and `v` (§6 `cut`). Fails with
    /// `NoSuchEdge` if they are not directly joined by one.
    pub fn cut(&mut self, u: VertexId, v: VertexId) -> Result<(), TopTreeError> {
        self.undo_residual();
        let start = match self.vertex(u).and_then(|r| r.cluster) {
            Some(c) => c,
            None => {
                log::debug!("cut({u}, {v}) fails: no such edge");
                return Err(TopTreeError::NoSuchEdge(u, v));
            }
        };
        let root = self.find_root(start);
        let edge = match self.find_base_edge(root, u, v) {
            Some(e) => e,
            None => {
                log::debug!("cut({u}, {v}) fails: no such edge");
                return Err(TopTreeError::NoSuchEdge(u, v));
            }
        };

        let orig_root = root;
        let new_root = self.remove_edge(edge);

        self.vertex_mut(u).unwrap().degree -= 1;
        self.vertex_mut(v).unwrap().degree -= 1;
        self.num_edges -= 1;

        let orig_roots = [orig_root];
        let new_roots: Vec<_> = new_root.into_iter().collect();
        self.finish_rebuild(&orig_roots, &new_roots);
        log::debug!("cut({u}, {v}) -> {new_root:?}");
        Ok(())
    }

    /// Whether `u` and `v` are joined by a direct edge (§4.4 "hint" overloads'
    /// `INVALID_HINT` precondition check). `O(size)`, not `O(log n)` — see
    /// `DESIGN.md`'s note on `find_base_edge`.
    pub(crate) fn has_edge(&mut self, u: VertexId, v: VertexId) -> bool {
        let start = match self.vertex(u).and_then(|r| r.cluster) {
            Some(c) => c,
            None => return false,
        };
        let root = self.find_root(start);
        self.find_base_edge(root, u, v).is_some()
    }

    /// Depth-first search for the BASE node whose boundary is exactly
    /// `{u, v}`, pushing reverse bits down as it descends so boundary
    /// fields read correctly.
    pub(crate) fn find_base_edge(&mut self, start: ClusterRef, u: VertexId, v: VertexId) -> Option<ClusterRef> {
        self.normalize(start);
        let (kind, left, right, bu, bv, fosters) = {
            let n = self.node(start);
            (
                n.kind,
                n.left,
                n.right,
                n.bu(),
                n.bv(),
                n.extras.as_ref().map(|e| (e.left_foster, e.right_foster)),
            )
        };
        if kind == NodeKind::Base {
            let matches = (bu == Some(u) && bv == v) || (bu == Some(v) && bv == u);
            return if matches { Some(start) } else { None };
        }
        if let Some(l) = left {
            if let Some(found) = self.find_base_edge(l, u, v) {
                return Some(found);
            }
        }
        if let Some(r) = right {
            if let Some(found) = self.find_base_edge(r, u, v) {
                return Some(found);
            }
        }
        if let Some((lf, rf)) = fosters {
            if let Some(lf) = lf {
                if let Some(found) = self.find_base_edge(lf, u, v) {
                    return Some(found);
                }
            }
            if let Some(rf) = rf {
                if let Some(found) = self.find_base_edge(rf, u, v) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Delete the BASE leaf `edge` and collapse every ancestor it implied,
    /// climbing to the root. Returns the surviving cluster, or `None` if
    /// `edge` was the entire component (both endpoints become isolated).
    fn remove_edge(&mut self, edge: ClusterRef) -> Option<ClusterRef> {
        let mut child = edge;
        let mut first = true;
        loop {
            let up = self.node(child).up;
            let (parent, grand_up) = match up {
                Up::Root => {
                    return if first {
                        self.discard(child);
                        None
                    } else {
                        Some(child)
                    };
                }
                Up::Parent(p) | Up::Link(p) => (p, self.node(p).up),
            };
            let parent2 = self.prepare_for_rewrite(parent);
            let kind = self.node(parent2).kind;
            let new_child = match kind {
                NodeKind::Compress => {
                    let (l, r, v, lf, rf) = {
                        let n = self.node(parent2);
                        let extras = n.extras.as_ref().unwrap();
                        (
                            n.left.unwrap(),
                            n.right.unwrap(),
                            extras.compressed_vertex.unwrap(),
                            extras.left_foster,
                            extras.right_foster,
                        )
                    };
                    if lf == Some(child) {
                        self.node_mut(parent2).extras.as_mut().unwrap().left_foster = None;
                        self.discard(child);
                        self.recompute_vertices(parent2);
                        return Some(parent2);
                    }
                    if rf == Some(child) {
                        self.node_mut(parent2).extras.as_mut().unwrap().right_foster = None;
                        self.discard(child);
                        self.recompute_vertices(parent2);
                        return Some(parent2);
                    }
                    let mut replacement = if l == child { r } else { l };
                    if let Some(lf) = lf {
                        replacement = self.recompose_rake(replacement, lf, v);
                    }
                    if let Some(rf) = rf {
                        replacement = self.recompose_rake(replacement, rf, v);
                    }
                    self.discard(parent2);
                    replacement
                }
                NodeKind::Rake => {
                    let (l, r) = {
                        let n = self.node(parent2);
                        (n.left.unwrap(), n.right.unwrap())
                    };
                    let other = if l == child { r } else { l };
                    self.discard(parent2);
                    other
                }
                NodeKind::Base | NodeKind::HardRake => {
                    unreachable!("a BASE/HARD_RAKE cannot be an ancestor of a removed edge")
                }
            };
            self.repoint_grandparent(parent, new_child, grand_up);
            child = new_child;
            first = false;
        }
    }

    /// Make whatever referenced `old` (by its pre-clone identity) reference
    /// `new_ref` instead, and give `new_ref` that same upward link.
    fn repoint_grandparent(&mut self, old: ClusterRef, new_ref: ClusterRef, grand_up: Up) {
        match grand_up {
            Up::Root => {
                self.node_mut(new_ref).up = Up::Root;
            }
            Up::Parent(g) => {
                let g2 = self.prepare_for_rewrite(g);
                if self.node(g2).left == Some(old) {
                    self.node_mut(g2).left = Some(new_ref);
                } else {
                    debug_assert_eq!(self.node(g2).right, Some(old));
                    self.node_mut(g2).right = Some(new_ref);
                }
                self.node_mut(new_ref).up = Up::Parent(g2);
                self.recompute_vertices(g2);
            }
            Up::Link(owner) => {
                let owner2 = self.prepare_for_rewrite(owner);
                let extras = self.node_mut(owner2).extras.as_mut();
                match extras {
                    Some(extras) => {
                        if extras.left_foster == Some(old) {
                            extras.left_foster = Some(new_ref);
                        } else {
                            debug_assert_eq!(extras.right_foster, Some(old));
                            extras.right_foster = Some(new_ref);
                        }
                    }
                    None => {
                        // `owner2` is a RAKE: its two children are also tagged
                        // `Up::Link` by this implementation's simplified
                        // rake-nesting convention (see `DESIGN.md`).
                        if self.node(owner2).left == Some(old) {
                            self.node_mut(owner2).left = Some(new_ref);
                        } else {
                            debug_assert_eq!(self.node(owner2).right, Some(old));
                            self.node_mut(owner2).right = Some(new_ref);
                        }
                    }
                }
                self.node_mut(new_ref).up = Up::Link(owner2);
            }
        }
    }
}
