// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hard-expose and the vertex-facing `expose` entry points (§4.6, §4.7).
//!
//! Soft-expose (§4.3) is enough whenever a caller is happy to find a
//! degree-`>= 2` vertex surfacing as its own top cluster's *compressed*
//! vertex rather than as a literal boundary — which is exactly what the
//! `link`/`cut` degree tables expect. `expose` promises more: the exposed
//! vertex (or vertices) must be literal outer boundaries of the returned
//! cluster. Closing that gap needs one more rewrite, [`TopForest::unzip_to_boundary`],
//! which folds a compressed vertex's "other side" (its non-kept proper
//! child, plus any existing fosters) into a single point cluster and pairs
//! it with the kept side via a transient HARD_RAKE — the one node kind built
//! exactly for "a path piece plus a point piece, exposed together as a
//! cluster with two real boundaries" (§3 "HARD_RAKE").

use crate::ids::{ClusterRef, VertexId};
use crate::listener::{Connection, Listener};
use crate::node::{ClusterNode, NodeKind, Up};
use crate::TopForest;

/// Outcome of exposing a single vertex (§4.7 `expose(v)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposeOneResult {
    /// `v` is isolated (degree 0); there is no cluster to report.
    Single,
    /// `v` is now the right boundary of the returned top cluster.
    Path(ClusterRef),
}

/// Outcome of exposing two vertices together (§4.7 `expose(u, v)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposeTwoResult {
    /// `u` and `v` do not share a component.
    Disconnected,
    /// Both lie on one root path; `u` is the left boundary and `v` the
    /// right boundary of the returned cluster.
    Path(ClusterRef),
}

impl<L, V, C> TopForest<L, V, C>
where
    L: Listener<V, C>,
    C: Default,
{
    /// Unzip `top` (as returned by [`TopForest::soft_expose`]) so that `v`
    /// is a literal boundary, reversing in place if `v` is already the
    /// *left* boundary. A no-op if `v` is already `bv`.
    pub(crate) fn unzip_to_boundary(&mut self, top: ClusterRef, v: VertexId) -> ClusterRef {
        if self.node(top).bv() == v {
            return top;
        }
        if self.node(top).bu() == Some(v) {
            self.node_mut(top).reverse();
            self.normalize(top);
            return top;
        }
        let (l, r, left_foster, right_foster) = {
            let n = self.node(top);
            let extras = n
                .extras
                .as_ref()
                .expect("unzip target must be a compressed vertex");
            debug_assert_eq!(extras.compressed_vertex, Some(v));
            (
                n.left.unwrap(),
                n.right.unwrap(),
                extras.left_foster,
                extras.right_foster,
            )
        };
        self.node_mut(r).reverse();
        self.normalize(r);
        let mut folded = r;
        if let Some(lf) = left_foster {
            folded = self.recompose_rake(folded, lf, v);
        }
        if let Some(rf) = right_foster {
            folded = self.recompose_rake(folded, rf, v);
        }
        let bu = self.node(l).bu().expect("path piece missing bu");
        let node = ClusterNode::new_hard_rake(0, l, folded, bu, v);
        let hr = self.alloc_node(node);
        self.node_mut(l).up = Up::Parent(hr);
        self.node_mut(folded).up = Up::Parent(hr);
        self.discard(top);
        log::trace!("unzip_to_boundary({top:?}, {v}) -> {hr:?}");
        hr
    }

    /// Mirror of [`Self::unzip_to_boundary`]: unzips so `v` becomes `bu`
    /// instead of `bv`, folding the *left* child (already sharing `v` as its
    /// own `bv`) together with the fosters, and keeping the right child as
    /// the surviving path side.
    fn unzip_to_left_boundary(&mut self, top: ClusterRef, v: VertexId) -> ClusterRef {
        if self.node(top).bu() == Some(v) {
            return top;
        }
        if self.node(top).bv() == v {
            self.node_mut(top).reverse();
            self.normalize(top);
            return top;
        }
        let (l, r, left_foster, right_foster) = {
            let n = self.node(top);
            let extras = n
                .extras
                .as_ref()
                .expect("unzip target must be a compressed vertex");
            debug_assert_eq!(extras.compressed_vertex, Some(v));
            (
                n.left.unwrap(),
                n.right.unwrap(),
                extras.left_foster,
                extras.right_foster,
            )
        };
        let mut folded = l;
        if let Some(lf) = left_foster {
            folded = self.recompose_rake(folded, lf, v);
        }
        if let Some(rf) = right_foster {
            folded = self.recompose_rake(folded, rf, v);
        }
        let bv = self.node(r).bv();
        let node = ClusterNode::new_hard_rake(0, folded, r, v, bv);
        let hr = self.alloc_node(node);
        self.node_mut(folded).up = Up::Parent(hr);
        self.node_mut(r).up = Up::Parent(hr);
        self.discard(top);
        log::trace!("unzip_to_left_boundary({top:?}, {v}) -> {hr:?}");
        hr
    }

    /// Bring `v` to the top of its component with `v` itself as the right
    /// boundary, unzipping if necessary. Returns `None` if `v` is isolated.
    pub(crate) fn hard_expose_one(&mut self, v: VertexId) -> Option<ClusterRef> {
        let top = self.soft_expose(v)?;
        Some(self.unzip_to_boundary(top, v))
    }

    /// Bring `u` and `v` onto one cluster with `u` as the left boundary and
    /// `v` as the right boundary (§4.6). `None` if they are not connected;
    /// panics (via `soft_expose_two`'s own precondition) if called with an
    /// isolated vertex — callers check degree first.
    pub(crate) fn hard_expose_two(&mut self, u: VertexId, v: VertexId) -> Option<ClusterRef> {
        match self.soft_expose_two(u, v) {
            super::splay::TwoExpose::Same(top) => {
                let top = self.unzip_to_boundary(top, v);
                let top = self.force_left_boundary(top, u);
                Some(top)
            }
            super::splay::TwoExpose::Different(..) => None,
        }
    }

    /// Reorient `top` (already having `v` as `bv`) so that `u` becomes its
    /// left boundary too. `u`, if not already `top.bu()`, may sit anywhere
    /// in `top`'s left subtree — along the main proper-child spine, or
    /// hanging off some ancestor's compressed vertex through a foster.
    /// [`Self::dig_to_left_boundary`] finds it and rebuilds each level
    /// consumed along the way.
    fn force_left_boundary(&mut self, top: ClusterRef, u: VertexId) -> ClusterRef {
        if self.node(top).bu() == Some(u) {
            return top;
        }
        let (l, r, bv) = {
            let n = self.node(top);
            (n.left.unwrap(), n.right.unwrap(), n.bv())
        };
        let l2 = self.dig_to_left_boundary(l, u);
        debug_assert_eq!(self.node(l2).bu(), Some(u));
        let node = ClusterNode::new_hard_rake(0, l2, r, u, bv);
        let hr = self.alloc_node(node);
        self.node_mut(l2).up = Up::Parent(hr);
        self.node_mut(r).up = Up::Parent(hr);
        self.discard(top);
        hr
    }

    /// Entry point for [`Self::force_left_boundary`]'s search: `u` is
    /// somewhere in `node`'s subtree (never at its own `bv`, which always
    /// stays pinned to the original second-vertex boundary throughout this
    /// search — see [`Self::dig_to_boundary`]'s doc comment).
    fn dig_to_left_boundary(&mut self, node: ClusterRef, u: VertexId) -> ClusterRef {
        self.dig_to_boundary(node, u, None)
    }

    /// Turn `node` into a cluster with `u` as its own `bu`, keeping `node`'s
    /// original `bv`. `u` may be reached via the proper left spine, a
    /// foster hanging off some interior compressed vertex, or further along
    /// the proper right spine — a vertex exposed together with another can
    /// land anywhere in the tree relative to it, not just along whichever
    /// side happens to be the main proper-child chain.
    ///
    /// `pending`, if present, is a point cluster already anchored at
    /// `node`'s own `bu` — everything an ancestor call abandoned in favor of
    /// continuing the search past `node`'s entry point. It rides along
    /// until `u` surfaces, at which point it becomes `u`'s own point
    /// attachment, exactly like the proper-left-child content this call
    /// itself abandons if the search continues rightward or through a
    /// foster.
    ///
    /// `node`'s own `bv` never changes across the whole search (an ancestor
    /// would have already resolved `u` at its own compressed vertex check
    /// before ever recursing this deep otherwise), so a BASE leaf reached
    /// here is guaranteed to have `u` as its `bu`.
    fn dig_to_boundary(&mut self, node: ClusterRef, u: VertexId, pending: Option<ClusterRef>) -> ClusterRef {
        if self.node(node).bu() == Some(u) {
            return self.attach_pending(node, pending, u);
        }
        let (l, r, v, lf, rf) = {
            let n = self.node(node);
            let extras = n
                .extras
                .as_ref()
                .expect("expected a compressed vertex while descending toward the boundary");
            (
                n.left.unwrap(),
                n.right.unwrap(),
                extras.compressed_vertex.expect("compress missing vertex"),
                extras.left_foster,
                extras.right_foster,
            )
        };
        if v == u {
            let mut folded = l;
            if let Some(lf) = lf {
                folded = self.recompose_rake(folded, lf, u);
            }
            if let Some(rf) = rf {
                folded = self.recompose_rake(folded, rf, u);
            }
            if let Some(p) = pending {
                folded = self.recompose_rake(folded, p, u);
            }
            let bv = self.node(r).bv();
            let hr_node = ClusterNode::new_hard_rake(0, folded, r, u, bv);
            let hr = self.alloc_node(hr_node);
            self.node_mut(folded).up = Up::Parent(hr);
            self.node_mut(r).up = Up::Parent(hr);
            self.discard(node);
            return hr;
        }
        if self.contains_vertex(l, u) {
            let l2 = self.dig_to_boundary(l, u, pending);
            let fresh = self.recompose_compress_with_fosters(l2, r, v, lf, rf);
            self.discard(node);
            return fresh;
        }
        // `l` (plus any still-outstanding `pending`) is fully abandoned in
        // favor of continuing toward `u` elsewhere; fold it into one point
        // group anchored at `v` so it keeps riding along as `v`'s own
        // attachment until `u` surfaces.
        let abandoned = self.attach_pending_as_point(l, pending, v);
        if let Some(lf) = lf {
            if self.contains_vertex(lf, u) {
                return self.dig_via_foster(node, abandoned, lf, rf, r, u, v);
            }
        }
        if let Some(rf) = rf {
            if self.contains_vertex(rf, u) {
                return self.dig_via_foster(node, abandoned, rf, lf, r, u, v);
            }
        }
        let mut next_pending = abandoned;
        if let Some(lf) = lf {
            next_pending = self.recompose_rake(next_pending, lf, v);
        }
        if let Some(rf) = rf {
            next_pending = self.recompose_rake(next_pending, rf, v);
        }
        debug_assert!(
            self.contains_vertex(r, u),
            "u must be somewhere in this subtree if it was not in l, left_foster, or right_foster"
        );
        let result = self.dig_to_boundary(r, u, Some(next_pending));
        self.discard(node);
        result
    }

    /// `u` was found inside `target_foster`, a (possibly nested) rake chain
    /// of point attachments hanging off `node`'s own compressed vertex `v`.
    /// Pulls the one leaf containing `u` out of that chain, folds whatever
    /// is left of the chain plus `other_foster` and `abandoned` into one
    /// point group at `v`, digs `u` out of the leaf, and rebuilds a COMPRESS
    /// contracting `v` with the dug-out leaf as the new left proper child,
    /// `r` as the right proper child, and the combined point group as `v`'s
    /// own foster.
    fn dig_via_foster(
        &mut self,
        node: ClusterRef,
        abandoned: ClusterRef,
        target_foster: ClusterRef,
        other_foster: Option<ClusterRef>,
        r: ClusterRef,
        u: VertexId,
        v: VertexId,
    ) -> ClusterRef {
        let (leaf, remainder) = self
            .extract_from_rake_chain(target_foster, u, v)
            .expect("u was found inside this foster a moment ago");
        let mut extra = abandoned;
        if let Some(rem) = remainder {
            extra = self.recompose_rake(extra, rem, v);
        }
        if let Some(other) = other_foster {
            extra = self.recompose_rake(extra, other, v);
        }
        let leaf2 = self.dig_to_boundary(leaf, u, None);
        debug_assert_eq!(self.node(leaf2).bv(), v);
        let fresh = self.recompose_compress_with_fosters(leaf2, r, v, Some(extra), None);
        self.discard(node);
        fresh
    }

    /// Whether `u` is reachable anywhere within `cluster`'s subtree.
    fn contains_vertex(&mut self, cluster: ClusterRef, u: VertexId) -> bool {
        self.normalize(cluster);
        let (kind, left, right, bu, bv, fosters) = {
            let n = self.node(cluster);
            (
                n.kind,
                n.left,
                n.right,
                n.bu(),
                n.bv(),
                n.extras.as_ref().map(|e| (e.left_foster, e.right_foster)),
            )
        };
        if bu == Some(u) || bv == u {
            return true;
        }
        if kind == NodeKind::Base {
            return false;
        }
        if let Some(l) = left {
            if self.contains_vertex(l, u) {
                return true;
            }
        }
        if let Some(r) = right {
            if self.contains_vertex(r, u) {
                return true;
            }
        }
        if let Some((lf, rf)) = fosters {
            if let Some(lf) = lf {
                if self.contains_vertex(lf, u) {
                    return true;
                }
            }
            if let Some(rf) = rf {
                if self.contains_vertex(rf, u) {
                    return true;
                }
            }
        }
        false
    }

    /// Pull the one leaf of a (possibly nested) RAKE chain anchored at `v`
    /// that contains `u` out to the side, returning `(leaf, remainder)`
    /// where `remainder` is whatever else was in the chain, re-folded into
    /// one piece still anchored at `v` (`None` if `leaf` was the chain's
    /// only member).
    fn extract_from_rake_chain(
        &mut self,
        r: ClusterRef,
        u: VertexId,
        v: VertexId,
    ) -> Option<(ClusterRef, Option<ClusterRef>)> {
        if self.node(r).kind != NodeKind::Rake {
            return if self.contains_vertex(r, u) {
                Some((r, None))
            } else {
                None
            };
        }
        let (l, rr) = {
            let n = self.node(r);
            (n.left.unwrap(), n.right.unwrap())
        };
        if self.contains_vertex(l, u) {
            let (leaf, rem) = self.extract_from_rake_chain(l, u, v)?;
            let remainder = match rem {
                Some(rem) => self.recompose_rake(rem, rr, v),
                None => rr,
            };
            self.discard(r);
            return Some((leaf, Some(remainder)));
        }
        if self.contains_vertex(rr, u) {
            let (leaf, rem) = self.extract_from_rake_chain(rr, u, v)?;
            let remainder = match rem {
                Some(rem) => self.recompose_rake(l, rem, v),
                None => l,
            };
            self.discard(r);
            return Some((leaf, Some(remainder)));
        }
        None
    }

    /// `node` already has `u` as its own `bu`; fold any still-outstanding
    /// `pending` attachment onto it as a HARD_RAKE point side.
    fn attach_pending(&mut self, node: ClusterRef, pending: Option<ClusterRef>, u: VertexId) -> ClusterRef {
        match pending {
            None => node,
            Some(p) => {
                let bv = self.node(node).bv();
                let hr = self.alloc_node(ClusterNode::new_hard_rake(0, p, node, u, bv));
                self.node_mut(p).up = Up::Parent(hr);
                self.node_mut(node).up = Up::Parent(hr);
                hr
            }
        }
    }

    /// Fold `side` (a path piece sharing `anchor` as its own `bv`) together
    /// with `pending` (already anchored at `side`'s own `bu`, if present)
    /// into one piece, as `side` is abandoned in favor of continuing the
    /// search past `anchor`.
    fn attach_pending_as_point(
        &mut self,
        side: ClusterRef,
        pending: Option<ClusterRef>,
        anchor: VertexId,
    ) -> ClusterRef {
        match pending {
            None => side,
            Some(p) => {
                let bu = self.node(side).bu().expect("path piece missing bu");
                let hr = self.alloc_node(ClusterNode::new_hard_rake(0, p, side, bu, anchor));
                self.node_mut(p).up = Up::Parent(hr);
                self.node_mut(side).up = Up::Parent(hr);
                hr
            }
        }
    }

    /// Like [`Self::recompose_compress`], but also installs `left_foster`/
    /// `right_foster` on the freshly built COMPRESS.
    fn recompose_compress_with_fosters(
        &mut self,
        left: ClusterRef,
        right: ClusterRef,
        v: VertexId,
        left_foster: Option<ClusterRef>,
        right_foster: Option<ClusterRef>,
    ) -> ClusterRef {
        let r = self.recompose_compress(left, right, v);
        {
            let extras = self.node_mut(r).extras.as_mut().expect("compress missing extras");
            extras.left_foster = left_foster;
            extras.right_foster = right_foster;
        }
        if let Some(lf) = left_foster {
            self.node_mut(lf).up = Up::Link(r);
        }
        if let Some(rf) = right_foster {
            self.node_mut(rf).up = Up::Link(r);
        }
        r
    }

    /// Build the "nonstandard" one-vertex-expose shape (§4.7): `v` has
    /// degree `>= 2`, so it can never become a literal outer boundary of an
    /// ordinary two-boundary path cluster without hiding one of its
    /// neighbors behind it. Instead the returned root's *single* boundary
    /// (both `bu` and `bv`) is `v` itself, and its two children are each
    /// `v`'s neighbor-subtrees on that side, folded with their fosters
    /// exactly like [`Self::unzip_to_boundary`] folds the "other side" into
    /// one piece. Records the connection the two children should be
    /// reported under in [`TopForest::one_vertex_expose`], since neither a
    /// plain RAKE's `PointAndPoint` nor a HARD_RAKE's usual path-aware
    /// matching describes this shape (§4.8 `connection_of`).
    pub(crate) fn build_one_vertex_root(&mut self, v: VertexId) -> ClusterRef {
        let top = self.soft_expose(v).expect("v has a cluster, so it is not isolated");
        let (l, r, lf, rf) = {
            let n = self.node(top);
            let extras = n
                .extras
                .as_ref()
                .expect("one-vertex-expose requires v as a compressed vertex (deg(v) >= 2)");
            debug_assert_eq!(extras.compressed_vertex, Some(v));
            (n.left.unwrap(), n.right.unwrap(), extras.left_foster, extras.right_foster)
        };
        self.node_mut(r).reverse();
        self.normalize(r);
        let left_side = self.fold_side(l, lf, v);
        let right_side = self.fold_side(r, rf, v);
        self.discard(top);
        let node = ClusterNode::new_hard_rake(0, left_side, right_side, v, v);
        let root = self.alloc_node(node);
        self.node_mut(left_side).up = Up::Parent(root);
        self.node_mut(right_side).up = Up::Parent(root);
        let connection = match (lf.is_some(), rf.is_some()) {
            (true, false) => Connection::LPointOverRPoint,
            (false, true) => Connection::RPointOverLPoint,
            _ => Connection::LPointAndRPoint,
        };
        self.one_vertex_expose = Some((root, connection));
        log::trace!("build_one_vertex_root({v}) -> {root:?} ({connection:?})");
        root
    }

    /// Public `expose(v)` (§4.7): runs the callback passes immediately
    /// around the single-vertex hard-expose. A vertex of degree `>= 2`
    /// surfaces as the one-vertex-expose shape rather than an ordinary
    /// two-boundary path, since it cannot become a literal boundary any
    /// other way without discarding one of its neighbors.
    pub fn expose(&mut self, v: VertexId) -> ExposeOneResult {
        self.undo_residual();
        let orig = self.vertex(v).and_then(|r| r.cluster).map(|c| self.find_root(c));
        if self.degree(v) >= 2 {
            let root = self.build_one_vertex_root(v);
            let orig_roots: Vec<_> = orig.into_iter().collect();
            self.finish_rebuild(&orig_roots, &[root]);
            self.set_exposed(Some(root));
            log::debug!("expose({v}) -> {root:?} (one-vertex)");
            return ExposeOneResult::Path(root);
        }
        match self.hard_expose_one(v) {
            None => ExposeOneResult::Single,
            Some(top) => {
                let orig_roots: Vec<_> = orig.into_iter().collect();
                self.finish_rebuild(&orig_roots, &[top]);
                self.set_exposed(Some(top));
                log::debug!("expose({v}) -> {top:?}");
                ExposeOneResult::Path(top)
            }
        }
    }

    /// Public `expose(u, v)` (§4.7, two-vertex form).
    pub fn expose_pair(&mut self, u: VertexId, v: VertexId) -> ExposeTwoResult {
        self.undo_residual();
        let orig = self.vertex(v).and_then(|r| r.cluster).map(|c| self.find_root(c));
        match self.hard_expose_two(u, v) {
            None => ExposeTwoResult::Disconnected,
            Some(top) => {
                let orig_roots: Vec<_> = orig.into_iter().collect();
                self.finish_rebuild(&orig_roots, &[top]);
                self.set_exposed(Some(top));
                log::debug!("expose({u}, {v}) -> {top:?}");
                ExposeTwoResult::Path(top)
            }
        }
    }

    /// No-op placeholder: this implementation performs hard-expose unzips
    /// eagerly and does not keep residual transient state around between
    /// calls, so there is nothing to undo. Kept so `TopForest::undo_residual`
    /// has a stable name to call regardless of that implementation choice.
    pub(crate) fn undo_hard_expose(&mut self) {}

    /// Clear the one-vertex-expose marker [`Self::build_one_vertex_root`]
    /// leaves behind. Unlike `undo_hard_expose`, there is real state to
    /// clear here: see `DESIGN.md`'s Open Question on this marker's lifetime
    /// for the one case it does not cover.
    pub(crate) fn undo_one_vertex_expose(&mut self) {
        self.one_vertex_expose = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::ClusterInfo;
    use crate::listener::{ClusterKind, SelectChild};
    use crate::node::ClusterNode;

    struct NullListener;

    impl Listener<u32, ()> for NullListener {
        fn create(&mut self, _c: &mut ClusterInfo<()>, _kind: ClusterKind) {}
        fn destroy(&mut self, _c: &ClusterInfo<()>, _kind: ClusterKind) {}
        fn join(&mut self, _parent: &mut ClusterInfo<()>, _a: &ClusterInfo<()>, _b: &ClusterInfo<()>, _connection: Connection) {}
        fn split(&mut self, _a: &mut ClusterInfo<()>, _b: &mut ClusterInfo<()>, _parent: &ClusterInfo<()>, _connection: Connection) {}
        fn select_question(&mut self, _a: &ClusterInfo<()>, _b: &ClusterInfo<()>, _connection: Connection) -> SelectChild {
            SelectChild::Left
        }
    }

    #[test]
    fn contains_vertex_finds_nested_foster() {
        let mut forest = TopForest::new(NullListener);
        let u = forest.create_vertex(0);
        let v = forest.create_vertex(1);
        let w = forest.create_vertex(2);

        let base = forest.alloc_node(ClusterNode::new_base(0, u, v));
        let foster = forest.alloc_node(ClusterNode::new_base(0, v, w));

        assert!(forest.contains_vertex(base, u));
        assert!(forest.contains_vertex(base, v));
        assert!(!forest.contains_vertex(base, w));
        assert!(forest.contains_vertex(foster, w));
    }

    #[test]
    fn expose_one_vertex_builds_nonstandard_shape() {
        let mut forest = TopForest::new(NullListener);
        let center = forest.create_vertex(0);
        let a = forest.create_vertex(1);
        let b = forest.create_vertex(2);
        forest.link(center, a).unwrap();
        forest.link(center, b).unwrap();

        let result = forest.expose(center);
        let root = match result {
            ExposeOneResult::Path(root) => root,
            ExposeOneResult::Single => panic!("center has degree 2, must not be isolated"),
        };
        assert_eq!(forest.node(root).bu(), Some(center));
        assert_eq!(forest.node(root).bv(), center);
        match forest.one_vertex_expose {
            Some((marked, _)) => assert_eq!(marked, root),
            None => panic!("expose on a degree >= 2 vertex must set the one-vertex-expose marker"),
        }
    }
}
