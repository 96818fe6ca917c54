// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `link` (§4.4): the six-case degree dispatch table for adding an edge.

use crate::error::TopTreeError;
use crate::ids::{ClusterRef, VertexId};
use crate::listener::Listener;
use crate::node::ClusterNode;
use crate::TopForest;

impl<L, V, C> TopForest<L, V, C>
where
    L: Listener<V, C>,
    C: Default,
{
    /// Join `u` and `v` with a new edge (§6 `link`). Fails with
    /// `SelfLoop` if `u == v`, or `AlreadyConnected` if they already share a
    /// component.
    pub fn link(&mut self, u: VertexId, v: VertexId) -> Result<(), TopTreeError> {
        self.undo_residual();
        if u == v {
            log::debug!("link({u}, {v}) fails: self loop");
            return Err(TopTreeError::SelfLoop(u));
        }
        let du = self.degree(u);
        let dv = self.degree(v);
        // Normalize so the lower-degree vertex is `lo`; the six cases are
        // symmetric in (u, v), so nothing downstream needs to know which
        // side was originally which.
        let (lo, hi, lo_deg, hi_deg) = if du <= dv { (u, v, du, dv) } else { (v, u, dv, du) };

        let orig_lo = self.vertex(lo).and_then(|r| r.cluster).map(|c| self.find_root(c));
        let orig_hi = self.vertex(hi).and_then(|r| r.cluster).map(|c| self.find_root(c));

        let new_root = match (lo_deg, hi_deg) {
            (0, 0) => self.link_both_isolated(lo, hi),
            (0, 1) => self.link_isolated_to_endpoint(lo, hi),
            (0, _) => self.link_isolated_to_internal(lo, hi),
            (1, 1) => {
                if orig_lo.is_some() && orig_lo == orig_hi {
                    log::debug!("link({u}, {v}) fails: already connected");
                    return Err(TopTreeError::AlreadyConnected(u, v));
                }
                self.link_endpoint_to_endpoint(lo, hi)
            }
            (1, _) => {
                if orig_lo.is_some() && orig_lo == orig_hi {
                    log::debug!("link({u}, {v}) fails: already connected");
                    return Err(TopTreeError::AlreadyConnected(u, v));
                }
                self.link_endpoint_to_internal(lo, hi)
            }
            (_, _) => {
                if orig_lo == orig_hi {
                    log::debug!("link({u}, {v}) fails: already connected");
                    return Err(TopTreeError::AlreadyConnected(u, v));
                }
                self.link_internal_to_internal(lo, hi)
            }
        };

        self.vertex_mut(lo).unwrap().degree += 1;
        self.vertex_mut(hi).unwrap().degree += 1;
        self.num_edges += 1;

        let mut orig_roots = Vec::new();
        orig_roots.extend(orig_lo);
        if orig_hi != orig_lo {
            orig_roots.extend(orig_hi);
        }
        self.finish_rebuild(&orig_roots, &[new_root]);
        log::debug!("link({u}, {v}) -> {new_root:?}");
        Ok(())
    }

    /// Case (0, 0): both isolated. A single BASE edge is the whole component.
    fn link_both_isolated(&mut self, w: VertexId, x: VertexId) -> ClusterRef {
        self.alloc_node(ClusterNode::new_base(0, w, x))
    }

    /// Case (0, 1): `w` isolated, `x` a path endpoint. `w` becomes the new
    /// far end, `x` becomes the internal compressed vertex.
    fn link_isolated_to_endpoint(&mut self, w: VertexId, x: VertexId) -> ClusterRef {
        let top_x = self.soft_expose(x).expect("endpoint must be non-isolated");
        let base = self.alloc_node(ClusterNode::new_base(0, w, x));
        self.recompose_compress(base, top_x, x)
    }

    /// Case (0, `>=2`): `w` isolated, `y` already internal to its own tree.
    /// `w` joins as a brand-new foster hanging off `y`.
    fn link_isolated_to_internal(&mut self, w: VertexId, y: VertexId) -> ClusterRef {
        let top_y = self.soft_expose(y).expect("internal vertex must be non-isolated");
        let base = self.alloc_node(ClusterNode::new_base(0, w, y));
        self.attach_new_foster(top_y, base, y)
    }

    /// Case (1, 1): both path endpoints. The new edge sits between two
    /// fresh compresses, one contracting each endpoint.
    fn link_endpoint_to_endpoint(&mut self, x: VertexId, y: VertexId) -> ClusterRef {
        let top_x = self.soft_expose(x).expect("endpoint must be non-isolated");
        let top_y = self.soft_expose(y).expect("endpoint must be non-isolated");
        let base = self.alloc_node(ClusterNode::new_base(0, x, y));
        let inner = self.recompose_compress(base, top_y, y);
        self.recompose_compress(top_x, inner, x)
    }

    /// Case (1, `>=2`): `x` a path endpoint, `y` already internal. `x`
    /// becomes internal too (contracting its own tree with the new edge),
    /// and the combined piece joins `y`'s fosters.
    fn link_endpoint_to_internal(&mut self, x: VertexId, y: VertexId) -> ClusterRef {
        let top_x = self.soft_expose(x).expect("endpoint must be non-isolated");
        let top_y = self.soft_expose(y).expect("internal vertex must be non-isolated");
        let base = self.alloc_node(ClusterNode::new_base(0, x, y));
        let inner = self.recompose_compress(top_x, base, x);
        self.attach_new_foster(top_y, inner, y)
    }

    /// Case (`>=2`, `>=2`): both already internal to their own trees. One
    /// side is unzipped into a literal boundary so a new compress can
    /// contract the new edge's endpoint there; the resulting piece then
    /// joins the other side's fosters.
    fn link_internal_to_internal(&mut self, z: VertexId, y: VertexId) -> ClusterRef {
        let top_z = self.soft_expose(z).expect("internal vertex must be non-isolated");
        let top_y = self.soft_expose(y).expect("internal vertex must be non-isolated");
        let top_z = self.unzip_to_boundary(top_z, z);
        let base = self.alloc_node(ClusterNode::new_base(0, z, y));
        let inner = self.recompose_compress(top_z, base, z);
        self.attach_new_foster(top_y, inner, y)
    }

    /// `link(u, v, b)` (§4.4, §6): like [`Self::link`], but additionally
    /// requires `b` to already be adjacent to `v` — fails with
    /// `InvalidHint` otherwise. The underlying cluster decomposition carries
    /// no cyclic vertex order (§3 lists no such field on `VertexRecord` or
    /// `ClusterNode`), so `b` cannot actually steer *where* around `v` the
    /// new edge lands the way the original's cyclic-order hint does; this
    /// is the adjacency precondition alone, applied before delegating to
    /// the plain two-vertex `link`.
    pub fn link_near(&mut self, u: VertexId, v: VertexId, b: VertexId) -> Result<(), TopTreeError> {
        self.undo_residual();
        if !self.has_edge(b, v) {
            log::debug!("link({u}, {v}, {b}) fails: invalid hint");
            return Err(TopTreeError::InvalidHint { hint: b, anchor: v });
        }
        self.link(u, v)
    }

    /// `link(u, a, v, b)` (§4.4, §6): the symmetric two-hint form of
    /// [`Self::link_near`], requiring `a` adjacent to `u` and `b` adjacent
    /// to `v`.
    pub fn link_near_pair(
        &mut self,
        u: VertexId,
        a: VertexId,
        v: VertexId,
        b: VertexId,
    ) -> Result<(), TopTreeError> {
        self.undo_residual();
        if !self.has_edge(a, u) {
            log::debug!("link({u}, {a}, {v}, {b}) fails: invalid hint");
            return Err(TopTreeError::InvalidHint { hint: a, anchor: u });
        }
        if !self.has_edge(b, v) {
            log::debug!("link({u}, {a}, {v}, {b}) fails: invalid hint");
            return Err(TopTreeError::InvalidHint { hint: b, anchor: v });
        }
        self.link(u, v)
    }

    /// Fold `extra` (sharing boundary `v`) onto `top`'s existing fosters at
    /// its compressed vertex `v`, preferring the left slot if both are free,
    /// otherwise extending whichever already holds something.
    fn attach_new_foster(&mut self, top: ClusterRef, extra: ClusterRef, v: VertexId) -> ClusterRef {
        let top2 = self.prepare_for_rewrite(top);
        let existing_left = self.node(top2).extras.as_ref().and_then(|e| e.left_foster);
        let merged = self.attach_foster(extra, existing_left, v);
        self.node_mut(merged).up = crate::node::Up::Link(top2);
        self.node_mut(top2).extras.as_mut().unwrap().left_foster = Some(merged);
        top2
    }
}
