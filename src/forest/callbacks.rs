// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clone-on-write node duplication and the dirty/new callback passes (§4.8).
//!
//! Every restructuring primitive (rotate, splice, link, cut, hard-expose)
//! works by building a *new* spine of clusters next to the surviving old
//! one, then running two tree walks once the new shape is final:
//! `clean_dirty_nodes` tears down the displaced old spine (`destroy`/`split`)
//! and `fixate_new_nodes` populates the new one (`create`/`join`), bottom-up.
//! Both walks stop as soon as they hit a CLEAN node — a clean node was
//! either untouched (old walk) or already fixed up by an earlier sub-step
//! (new walk), so descending further would double-fire callbacks.

use super::{three_mut_slots, two_mut_slots};
use crate::listener::{ClusterKind, Connection, Listener};
use crate::node::{ClusterNode, CompressExtras, NodeKind, NodeState};
use crate::{ClusterRef, TopForest};

fn one_mut_slot<C>(nodes: &mut [Option<ClusterNode<C>>], r: ClusterRef) -> &mut ClusterNode<C> {
    nodes[r.idx()].as_mut().expect("dangling ClusterRef")
}

impl<L, V, C> TopForest<L, V, C>
where
    L: Listener<V, C>,
    C: Default,
{
    /// Duplicate `r` into a fresh NEW node with identical shape, marking the
    /// original DIRTY (or leaving it OBSOLETE). Returns the new ref, already
    /// wired so its children's `up` points at it. Caller is responsible for
    /// repointing whatever referenced `r` (parent's child slot, a vertex's
    /// `.cluster`, or a foster slot) to the new ref.
    ///
    /// BASE clusters are never cloned: a base's content is a fixed edge,
    /// invariant under restructuring (§4.3 "each step duplicates any
    /// CLEAN/OBSOLETE ancestor" — base clusters are leaves, never ancestors).
    pub(crate) fn prepare_for_rewrite(&mut self, r: ClusterRef) -> ClusterRef {
        let (kind, state) = {
            let n = self.node(r);
            (n.kind, n.state)
        };
        if kind == NodeKind::Base {
            return r;
        }
        match state {
            NodeState::Clean | NodeState::Obsolete => self.clone_new(r),
            _ => r,
        }
    }

    fn clone_new(&mut self, r: ClusterRef) -> ClusterRef {
        let was_obsolete = self.node(r).is_obsolete();
        let clone = {
            let n = self.node(r);
            crate::node::ClusterNode {
                generation: 0,
                kind: n.kind,
                reversed: n.reversed,
                state: NodeState::New,
                normalize_flag: n.normalize_flag,
                boundary: n.boundary,
                left: n.left,
                right: n.right,
                up: n.up,
                info: crate::info::ClusterInfo::new(),
                extras: n.extras.as_ref().map(|e| crate::node::CompressExtras {
                    left_foster: e.left_foster,
                    right_foster: e.right_foster,
                    compressed_vertex: e.compressed_vertex,
                    left_composed: crate::info::ClusterInfo::new(),
                    right_composed: crate::info::ClusterInfo::new(),
                }),
            }
        };
        let new_ref = self.alloc_node(clone);
        if !was_obsolete {
            self.node_mut(r).state = NodeState::Dirty;
        }
        if let Some(left) = self.node(new_ref).left {
            self.node_mut(left).up = crate::node::Up::Parent(new_ref);
        }
        if let Some(right) = self.node(new_ref).right {
            self.node_mut(right).up = crate::node::Up::Parent(new_ref);
        }
        if let Some(extras) = self.node(new_ref).extras.as_ref().map(|e| (e.left_foster, e.right_foster)) {
            if let Some(lf) = extras.0 {
                self.node_mut(lf).up = crate::node::Up::Link(new_ref);
            }
            if let Some(rf) = extras.1 {
                self.node_mut(rf).up = crate::node::Up::Link(new_ref);
            }
        }
        log::trace!("clone_new {r:?} -> {new_ref:?}");
        new_ref
    }

    /// Mark `r` OBSOLETE (scheduled for destruction once `clean_dirty_nodes`
    /// reaches it) if it is currently CLEAN; a node already DIRTY/OBSOLETE
    /// is left alone, since it is already accounted for.
    pub(crate) fn mark_obsolete(&mut self, r: ClusterRef) {
        let n = self.node_mut(r);
        if n.state == NodeState::Clean {
            n.state = NodeState::Obsolete;
        }
    }

    /// Throw away a node made irrelevant by further restructuring within the
    /// same operation, without double-managing the eventual callback passes.
    /// A NEW node never had `create`/`join` fired for it, so it is simply
    /// freed; anything CLEAN/DIRTY/OBSOLETE is handed to the pending
    /// `clean_dirty_nodes` walk instead. Children must already have been
    /// repointed away by the caller.
    pub(crate) fn discard(&mut self, r: ClusterRef) {
        if self.node(r).is_new() {
            self.free_node(r);
        } else {
            self.mark_obsolete(r);
        }
    }

    /// Tear down the displaced old subgraph rooted at `r` (§4.8). `r` must
    /// be DIRTY or OBSOLETE; stops recursing at the first CLEAN child.
    pub(crate) fn clean_dirty_nodes(&mut self, r: ClusterRef) {
        let (kind, left, right, extras_fosters) = {
            let n = self.node(r);
            debug_assert!(n.is_dirty() || n.is_obsolete());
            (
                n.kind,
                n.left,
                n.right,
                n.extras.as_ref().map(|e| (e.left_foster, e.right_foster)),
            )
        };
        match kind {
            NodeKind::Base => {
                let info = &self.node(r).info;
                info.allow();
                self.listener().destroy(info, ClusterKind::Path);
                info.deny();
            }
            NodeKind::Rake | NodeKind::HardRake => {
                let (l, rr) = (left.unwrap(), right.unwrap());
                self.fire_split(r, l, rr, self.connection_of(r, l, rr));
                self.recurse_clean(l);
                self.recurse_clean(rr);
            }
            NodeKind::Compress => {
                let (l, rr) = (left.unwrap(), right.unwrap());
                let (lf, rf) = extras_fosters.unwrap_or((None, None));
                self.fire_split_compress(r, l, rr, lf, rf);
                self.recurse_clean(l);
                self.recurse_clean(rr);
                if let Some(lf) = lf {
                    self.recurse_clean(lf);
                }
                if let Some(rf) = rf {
                    self.recurse_clean(rf);
                }
            }
        }
        self.free_node(r);
    }

    fn recurse_clean(&mut self, r: ClusterRef) {
        let touched = {
            let n = self.node(r);
            n.is_dirty() || n.is_obsolete()
        };
        if touched {
            self.clean_dirty_nodes(r);
        }
    }

    fn fire_split(&mut self, parent: ClusterRef, a: ClusterRef, b: ClusterRef, connection: Connection) {
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        pn.info.allow();
        an.info.allow();
        bn.info.allow();
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        self.listener
            .split(&mut an.info, &mut bn.info, &pn.info, connection);
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        pn.info.deny();
        an.info.deny();
        bn.info.deny();
    }

    fn fire_join(&mut self, parent: ClusterRef, a: ClusterRef, b: ClusterRef, connection: Connection) {
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        pn.info.allow();
        an.info.allow();
        bn.info.allow();
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        self.listener
            .join(&mut pn.info, &an.info, &bn.info, connection);
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        pn.info.deny();
        an.info.deny();
        bn.info.deny();
    }

    fn composed_ref(node: &ClusterNode<C>, left: bool) -> &crate::info::ClusterInfo<C> {
        let extras = node.extras.as_ref().expect("compress node missing extras");
        if left {
            &extras.left_composed
        } else {
            &extras.right_composed
        }
    }

    fn composed_mut(node: &mut ClusterNode<C>, left: bool) -> &mut crate::info::ClusterInfo<C> {
        let extras = node.extras.as_mut().expect("compress node missing extras");
        if left {
            &mut extras.left_composed
        } else {
            &mut extras.right_composed
        }
    }

    /// Join a proper child with its same-side foster into `parent`'s
    /// intermediate composed-info slot (§4.8 "composed into proper+foster").
    fn fire_join_composed(&mut self, parent: ClusterRef, left: bool, a: ClusterRef, b: ClusterRef, connection: Connection) {
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        Self::composed_ref(pn, left).allow();
        an.info.allow();
        bn.info.allow();
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        self.listener
            .join(Self::composed_mut(pn, left), &an.info, &bn.info, connection);
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        Self::composed_ref(pn, left).deny();
        an.info.deny();
        bn.info.deny();
    }

    /// Split `parent`'s intermediate composed-info slot back into a proper
    /// child and its same-side foster (§4.8 "composed into proper+foster").
    fn fire_split_composed(&mut self, parent: ClusterRef, left: bool, a: ClusterRef, b: ClusterRef, connection: Connection) {
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        Self::composed_ref(pn, left).allow();
        an.info.allow();
        bn.info.allow();
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        self.listener
            .split(&mut an.info, &mut bn.info, Self::composed_ref(pn, left), connection);
        let (pn, an, bn) = three_mut_slots(&mut self.nodes, parent, a, b);
        Self::composed_ref(pn, left).deny();
        an.info.deny();
        bn.info.deny();
    }

    /// Final COMPRESS join when only the left side went through a composed
    /// stage: `r.info <- join(r.left_composed, rr.info)`.
    fn fire_join_left_composed(&mut self, r: ClusterRef, rr: ClusterRef) {
        let (rn, bn) = two_mut_slots(&mut self.nodes, r, rr);
        rn.info.allow();
        Self::composed_ref(rn, true).allow();
        bn.info.allow();
        let (rn, bn) = two_mut_slots(&mut self.nodes, r, rr);
        self.listener
            .join(&mut rn.info, Self::composed_ref(rn, true), &bn.info, Connection::PathAndPath);
        let (rn, bn) = two_mut_slots(&mut self.nodes, r, rr);
        rn.info.deny();
        Self::composed_ref(rn, true).deny();
        bn.info.deny();
    }

    /// Final COMPRESS join when only the right side went through a composed
    /// stage: `r.info <- join(l.info, r.right_composed)`.
    fn fire_join_right_composed(&mut self, r: ClusterRef, l: ClusterRef) {
        let (rn, an) = two_mut_slots(&mut self.nodes, r, l);
        rn.info.allow();
        an.info.allow();
        Self::composed_ref(rn, false).allow();
        let (rn, an) = two_mut_slots(&mut self.nodes, r, l);
        self.listener
            .join(&mut rn.info, &an.info, Self::composed_ref(rn, false), Connection::PathAndPath);
        let (rn, an) = two_mut_slots(&mut self.nodes, r, l);
        rn.info.deny();
        an.info.deny();
        Self::composed_ref(rn, false).deny();
    }

    /// Final COMPRESS join when both sides went through a composed stage:
    /// `r.info <- join(r.left_composed, r.right_composed)`. Both operands
    /// live inside `r` itself, so no second node needs to be touched.
    fn fire_join_both_composed(&mut self, r: ClusterRef) {
        let n = one_mut_slot(&mut self.nodes, r);
        n.info.allow();
        Self::composed_ref(n, true).allow();
        Self::composed_ref(n, false).allow();
        let n = one_mut_slot(&mut self.nodes, r);
        let extras = n.extras.as_ref().expect("compress node missing extras");
        let (left_composed, right_composed) = (&extras.left_composed, &extras.right_composed);
        self.listener
            .join(&mut n.info, left_composed, right_composed, Connection::PathAndPath);
        let n = one_mut_slot(&mut self.nodes, r);
        n.info.deny();
        Self::composed_ref(n, true).deny();
        Self::composed_ref(n, false).deny();
    }

    /// Reverse of [`Self::fire_join_left_composed`].
    fn fire_split_left_composed(&mut self, r: ClusterRef, rr: ClusterRef) {
        let (rn, bn) = two_mut_slots(&mut self.nodes, r, rr);
        rn.info.allow();
        Self::composed_ref(rn, true).allow();
        bn.info.allow();
        let (rn, bn) = two_mut_slots(&mut self.nodes, r, rr);
        let extras = rn.extras.as_mut().expect("compress node missing extras");
        self.listener
            .split(&mut extras.left_composed, &mut bn.info, &rn.info, Connection::PathAndPath);
        let (rn, bn) = two_mut_slots(&mut self.nodes, r, rr);
        rn.info.deny();
        Self::composed_ref(rn, true).deny();
        bn.info.deny();
    }

    /// Reverse of [`Self::fire_join_right_composed`].
    fn fire_split_right_composed(&mut self, r: ClusterRef, l: ClusterRef) {
        let (rn, an) = two_mut_slots(&mut self.nodes, r, l);
        rn.info.allow();
        an.info.allow();
        Self::composed_ref(rn, false).allow();
        let (rn, an) = two_mut_slots(&mut self.nodes, r, l);
        let extras = rn.extras.as_mut().expect("compress node missing extras");
        self.listener
            .split(&mut an.info, &mut extras.right_composed, &rn.info, Connection::PathAndPath);
        let (rn, an) = two_mut_slots(&mut self.nodes, r, l);
        rn.info.deny();
        an.info.deny();
        Self::composed_ref(rn, false).deny();
    }

    /// Reverse of [`Self::fire_join_both_composed`].
    fn fire_split_both_composed(&mut self, r: ClusterRef) {
        let n = one_mut_slot(&mut self.nodes, r);
        n.info.allow();
        Self::composed_ref(n, true).allow();
        Self::composed_ref(n, false).allow();
        let n = one_mut_slot(&mut self.nodes, r);
        let extras = n.extras.as_mut().expect("compress node missing extras");
        let CompressExtras {
            left_composed,
            right_composed,
            ..
        } = extras;
        self.listener
            .split(left_composed, right_composed, &n.info, Connection::PathAndPath);
        let n = one_mut_slot(&mut self.nodes, r);
        n.info.deny();
        Self::composed_ref(n, true).deny();
        Self::composed_ref(n, false).deny();
    }

    /// The full COMPRESS join, folding each present foster into its
    /// same-side proper child through the composed-info slot before the
    /// final path-and-path join (§4.8 "COMPRESS... three splits/joins in a
    /// fixed order covering the intermediate composed-info slots").
    fn fire_join_compress(
        &mut self,
        r: ClusterRef,
        l: ClusterRef,
        rr: ClusterRef,
        lf: Option<ClusterRef>,
        rf: Option<ClusterRef>,
    ) {
        if let Some(lf) = lf {
            self.fire_join_composed(r, true, l, lf, Connection::PathAndPoint);
        }
        if let Some(rf) = rf {
            self.fire_join_composed(r, false, rf, rr, Connection::PointAndPath);
        }
        match (lf, rf) {
            (None, None) => self.fire_join(r, l, rr, Connection::PathAndPath),
            (Some(_), None) => self.fire_join_left_composed(r, rr),
            (None, Some(_)) => self.fire_join_right_composed(r, l),
            (Some(_), Some(_)) => self.fire_join_both_composed(r),
        }
    }

    /// The full COMPRESS split, mirroring [`Self::fire_join_compress`] in
    /// reverse order: the final path join is undone first, then each
    /// composed stage is distributed back into its proper child and foster.
    fn fire_split_compress(
        &mut self,
        r: ClusterRef,
        l: ClusterRef,
        rr: ClusterRef,
        lf: Option<ClusterRef>,
        rf: Option<ClusterRef>,
    ) {
        match (lf, rf) {
            (None, None) => self.fire_split(r, l, rr, Connection::PathAndPath),
            (Some(_), None) => self.fire_split_left_composed(r, rr),
            (None, Some(_)) => self.fire_split_right_composed(r, l),
            (Some(_), Some(_)) => self.fire_split_both_composed(r),
        }
        if let Some(lf) = lf {
            self.fire_split_composed(r, true, l, lf, Connection::PathAndPoint);
        }
        if let Some(rf) = rf {
            self.fire_split_composed(r, false, rf, rr, Connection::PointAndPath);
        }
    }

    /// Populate the surviving new subgraph rooted at `r` (§4.8), bottom-up.
    /// `r` must be NEW; stops recursing at the first CLEAN child (already
    /// fixed up, reused as-is).
    pub(crate) fn fixate_new_nodes(&mut self, r: ClusterRef) {
        let (kind, left, right, extras_fosters) = {
            let n = self.node(r);
            debug_assert!(n.is_new());
            (
                n.kind,
                n.left,
                n.right,
                n.extras.as_ref().map(|e| (e.left_foster, e.right_foster)),
            )
        };
        match kind {
            NodeKind::Base => {
                let info = &self.node(r).info;
                info.allow();
                self.listener().create(info, ClusterKind::Path);
                info.deny();
            }
            NodeKind::Rake | NodeKind::HardRake => {
                let (l, rr) = (left.unwrap(), right.unwrap());
                self.recurse_fixate(l);
                self.recurse_fixate(rr);
                self.fire_join(r, l, rr, self.connection_of(r, l, rr));
            }
            NodeKind::Compress => {
                let (l, rr) = (left.unwrap(), right.unwrap());
                let (lf, rf) = extras_fosters.unwrap_or((None, None));
                self.recurse_fixate(l);
                self.recurse_fixate(rr);
                if let Some(lf) = lf {
                    self.recurse_fixate(lf);
                }
                if let Some(rf) = rf {
                    self.recurse_fixate(rf);
                }
                self.recompute_vertices(r);
                self.fire_join_compress(r, l, rr, lf, rf);
            }
        }
        self.node_mut(r).state = NodeState::Clean;
        self.bind_vertices(r);
    }

    /// Fixate `r` if it is still NEW, leaving an already-CLEAN node alone.
    /// Exposed beyond this module so `select` can force real cluster data
    /// onto a cluster before asking `selectQuestion` about it (§4.9), rather
    /// than waiting for the end-of-operation `fixate_new_nodes` walk.
    pub(crate) fn recurse_fixate(&mut self, r: ClusterRef) {
        let is_new = self.node(r).is_new();
        if is_new {
            self.fixate_new_nodes(r);
        }
    }

    /// Finish a public mutating operation by running exactly one
    /// `clean_dirty_nodes` pass over whatever survives of the component's
    /// pre-operation top cluster(s) and exactly one `fixate_new_nodes` pass
    /// over the resulting new top(s) (§4.8: "exactly one ... pass per
    /// public operation"). `orig_roots` are captured *before* any
    /// restructuring began; each is skipped if it turned out untouched
    /// (still CLEAN) or already freed by the restructuring itself.
    /// `new_roots` are skipped if they turned out to need no rebuild either
    /// (still CLEAN, e.g. an idempotent `expose` of an already-exposed
    /// vertex).
    pub(crate) fn finish_rebuild(&mut self, orig_roots: &[ClusterRef], new_roots: &[ClusterRef]) {
        for &orig in orig_roots {
            if self.is_node_alive(orig) {
                let touched = {
                    let n = self.node(orig);
                    n.is_dirty() || n.is_obsolete()
                };
                if touched {
                    self.clean_dirty_nodes(orig);
                }
            }
        }
        for &new_root in new_roots {
            if self.node(new_root).is_new() {
                self.fixate_new_nodes(new_root);
            }
        }
    }

    /// The `Connection` describing how `a`/`b` relate under `parent`
    /// (§4.8 "connection kind", §6 "Connection kinds"). `parent` matching
    /// the current one-vertex-expose marker overrides the ordinary
    /// kind-based lookup below: that root's two children are always
    /// reported as one of the `*Point*` one-vertex-expose kinds, regardless
    /// of what `NodeKind` they actually settled into underneath.
    pub(crate) fn connection_of(&self, parent: ClusterRef, a: ClusterRef, b: ClusterRef) -> Connection {
        if let Some((marked, connection)) = self.one_vertex_expose {
            if marked == parent {
                return connection;
            }
        }
        let pk = self.node(parent).kind;
        let ak = self.node(a).listener_kind();
        let bk = self.node(b).listener_kind();
        use crate::listener::ClusterKind::{Path, Point};
        match (pk, ak, bk) {
            (NodeKind::Rake, _, _) => Connection::PointAndPoint,
            (_, Path, Path) => Connection::PathAndPath,
            (_, Path, Point) => Connection::PathAndPoint,
            (_, Point, Path) => Connection::PointAndPath,
            (_, Point, Point) => Connection::PointAndPoint,
        }
    }
}
