// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Self-adjusting restructuring primitives (§4.1 "normalize", §4.2
//! "Orientation contract", §4.3 "softExpose").
//!
//! Per the Open Question resolved in `SPEC_FULL.md` §4.10, the ten
//! geometric splice sub-cases of the original algorithm are collapsed into
//! four parametric rewrite primitives: [`TopForest::recompose_compress`],
//! [`TopForest::recompose_rake`], [`TopForest::attach_foster`], and
//! [`TopForest::splice`]. Each enforces the orientation contract directly
//! rather than special-casing every geometric configuration; correctness is
//! checked against the invariants of spec §8, not against a specific
//! rotation sequence.

use crate::ids::{ClusterRef, VertexId};
use crate::listener::Listener;
use crate::node::Up;
use crate::TopForest;

/// Outcome of exposing two vertices at once (§4.3 `softExpose(u, v)`).
pub(crate) enum TwoExpose {
    /// Both vertices lie on the same root path; carries that path's top cluster.
    Same(ClusterRef),
    /// The vertices live in different components; carries each one's own top
    /// cluster (always `Some` since both `u` and `v` have degree >= 1 at
    /// every call site that reaches this branch).
    Different(ClusterRef, ClusterRef),
}

impl<L, V, C> TopForest<L, V, C>
where
    L: Listener<V, C>,
    C: Default,
{
    /// Walk up from `r` via `parent`/`link` to the component's top cluster.
    pub(crate) fn find_root(&self, r: ClusterRef) -> ClusterRef {
        let mut cur = r;
        loop {
            match self.node(cur).up {
                Up::Root => return cur,
                Up::Parent(p) | Up::Link(p) => cur = p,
            }
        }
    }

    /// Push `r`'s reverse bit into its children (§3 "Reverse bit", §4.1
    /// "normalize"). A no-op if `r` is not currently reversed.
    pub(crate) fn normalize(&mut self, r: ClusterRef) {
        if !self.node(r).reversed {
            return;
        }
        self.node_mut(r).apply_local_reverse();
        let (left, right) = {
            let n = self.node(r);
            (n.left, n.right)
        };
        if let Some(l) = left {
            self.node_mut(l).reverse();
        }
        if let Some(rr) = right {
            self.node_mut(rr).reverse();
        }
        log::trace!("normalize {r:?}");
    }

    /// Walk from `start` up to the component root, marking the path, then
    /// push every reverse bit down top-first so every node on the path is
    /// un-reversed before any local restructuring touches it (§4.3
    /// "Rectify").
    pub(crate) fn rectify(&mut self, start: ClusterRef) {
        let mut chain = vec![start];
        let mut cur = start;
        loop {
            match self.node(cur).up {
                Up::Root => break,
                Up::Parent(p) | Up::Link(p) => {
                    chain.push(p);
                    cur = p;
                }
            }
        }
        for r in chain.into_iter().rev() {
            self.normalize(r);
        }
    }

    /// Flip `r`'s reverse bit and immediately push it down, so `r`'s
    /// boundaries are correct before the caller inspects them.
    fn reverse_now(&mut self, r: ClusterRef) {
        self.node_mut(r).reverse();
        self.normalize(r);
    }

    fn ensure_right_boundary(&mut self, r: ClusterRef, v: VertexId) {
        if self.node(r).bv() != v {
            self.reverse_now(r);
        }
        debug_assert_eq!(self.node(r).bv(), v);
    }

    fn ensure_left_boundary(&mut self, r: ClusterRef, v: VertexId) {
        if self.node(r).bu() != Some(v) {
            self.reverse_now(r);
        }
        debug_assert_eq!(self.node(r).bu(), Some(v));
    }

    /// Orient two path pieces so they may be composed into a COMPRESS
    /// contracting `v` (§4.2: "force `L.bv = R.bu = v`").
    fn orient_for_compress(&mut self, left: ClusterRef, right: ClusterRef, v: VertexId) {
        self.ensure_right_boundary(left, v);
        self.ensure_left_boundary(right, v);
    }

    /// Orient two subtrees so they may be composed into a RAKE sharing `v`
    /// (§4.2: "force `L.bv = R.bv = v`").
    fn orient_for_rake(&mut self, left: ClusterRef, right: ClusterRef, v: VertexId) {
        self.ensure_right_boundary(left, v);
        self.ensure_right_boundary(right, v);
    }

    /// Compose a new COMPRESS contracting `v` from two path pieces,
    /// orienting them first. The new node is `NEW`, with its own outer
    /// boundaries taken from the (now-correct) children.
    pub(crate) fn recompose_compress(
        &mut self,
        left: ClusterRef,
        right: ClusterRef,
        v: VertexId,
    ) -> ClusterRef {
        self.orient_for_compress(left, right, v);
        let bu = self.node(left).bu().expect("path piece missing bu");
        let bv = self.node(right).bv();
        let node = crate::node::ClusterNode::new_compress(0, left, right, v, bu, bv);
        let r = self.alloc_node(node);
        self.node_mut(left).up = Up::Parent(r);
        self.node_mut(right).up = Up::Parent(r);
        log::trace!("recompose_compress({left:?}, {right:?}, {v}) -> {r:?}");
        r
    }

    /// Compose a new RAKE sharing boundary `v` from two point (or path,
    /// treated as point) subtrees.
    pub(crate) fn recompose_rake(
        &mut self,
        left: ClusterRef,
        right: ClusterRef,
        v: VertexId,
    ) -> ClusterRef {
        self.orient_for_rake(left, right, v);
        let node = crate::node::ClusterNode::new_rake(0, left, right, v);
        let r = self.alloc_node(node);
        self.node_mut(left).up = Up::Parent(r);
        self.node_mut(right).up = Up::Parent(r);
        log::trace!("recompose_rake({left:?}, {right:?}, {v}) -> {r:?}");
        r
    }

    /// Fold `extra` onto the existing foster `base` (or just reorient `base`
    /// alone if there is no `extra`), both sharing boundary `v`. Does not
    /// set the resulting `up`; the caller installs it into a foster slot.
    pub(crate) fn attach_foster(
        &mut self,
        base: ClusterRef,
        extra: Option<ClusterRef>,
        v: VertexId,
    ) -> ClusterRef {
        match extra {
            None => {
                self.ensure_right_boundary(base, v);
                base
            }
            Some(extra) => self.recompose_rake(base, extra, v),
        }
    }

    /// Rotate `v` past its proper parent (§4.1 "splay"). `v.up` must be
    /// `Up::Parent`. Clones the parent into a fresh `NEW` node (the old one
    /// becomes `DIRTY`/stays `OBSOLETE`) since its child set changes; `v`
    /// itself keeps its identity since only its position changes.
    fn rotate(&mut self, v: ClusterRef) {
        let p = match self.node(v).up {
            Up::Parent(p) => p,
            other => panic!("rotate requires a proper parent, found {other:?}"),
        };
        debug_assert!(!self.node(p).reversed);
        debug_assert!(!self.node(v).reversed);
        let p2 = self.prepare_for_rewrite(p);
        let v_is_left = self.node(p2).left == Some(v);
        debug_assert!(v_is_left || self.node(p2).right == Some(v));

        let moved = if v_is_left {
            self.node(v).right
        } else {
            self.node(v).left
        };
        if v_is_left {
            self.node_mut(p2).left = moved;
        } else {
            self.node_mut(p2).right = moved;
        }
        if let Some(m) = moved {
            self.node_mut(m).up = Up::Parent(p2);
        }

        let grandparent_up = self.node(p).up;
        match grandparent_up {
            Up::Root => self.node_mut(v).up = Up::Root,
            Up::Link(owner) => self.node_mut(v).up = Up::Link(owner),
            Up::Parent(g) => {
                let g2 = self.prepare_for_rewrite(g);
                if self.node(g2).left == Some(p) {
                    self.node_mut(g2).left = Some(v);
                } else {
                    debug_assert_eq!(self.node(g2).right, Some(p));
                    self.node_mut(g2).right = Some(v);
                }
                self.node_mut(v).up = Up::Parent(g2);
                self.recompute_vertices(g2);
            }
        }

        if v_is_left {
            self.node_mut(v).right = Some(p2);
        } else {
            self.node_mut(v).left = Some(p2);
        }
        self.node_mut(p2).up = Up::Parent(v);
        self.recompute_vertices(p2);
        log::trace!("rotate {v:?} past {p:?} (-> {p2:?})");
    }

    /// Splay `start` to the root of its local proper-child family (either a
    /// compress-tree or a rake-tree; rotation is agnostic to which). Stops
    /// as soon as `start` has no proper parent, i.e. it is a top cluster or
    /// sits at a `link` boundary awaiting [`Self::splice`].
    ///
    /// Groups rotations into zig/zig-zig/zig-zag steps rather than rotating
    /// `start` past its immediate parent one level at a time: a grandparent
    /// on the same side as `start`'s own parent rotates the parent up first
    /// (zig-zig), an opposite-side grandparent rotates `start` up twice in a
    /// row (zig-zag), and a parent with no grandparent (or one reached
    /// through a `link` boundary) is a plain single zig. This pairing is what
    /// gives splaying its amortized `O(log n)` bound; repeatedly rotating
    /// `start` past only its immediate parent does not.
    fn splay_to_top(&mut self, start: ClusterRef) {
        loop {
            let parent = match self.node(start).up {
                Up::Parent(p) => p,
                _ => return,
            };
            match self.node(parent).up {
                Up::Parent(grandparent) => {
                    let start_is_left = self.node(parent).left == Some(start);
                    let parent_is_left = self.node(grandparent).left == Some(parent);
                    if start_is_left == parent_is_left {
                        self.rotate(parent);
                        self.rotate(start);
                    } else {
                        self.rotate(start);
                        self.rotate(start);
                    }
                }
                _ => self.rotate(start),
            }
        }
    }

    /// Promote `leaf` (currently a foster of `owner`, already splayed to the
    /// root of its own rake-tree) to `owner`'s proper child, demoting
    /// `owner`'s old proper child on that side into the foster position
    /// (folded onto any existing opposite-side foster leftover via
    /// [`Self::attach_foster`]). A right-foster must be reversed when
    /// promoted, since fosters always carry `bv = compressedVertex` while a
    /// right proper child must carry `bu = compressedVertex` (§4.2).
    fn splice(&mut self, leaf: ClusterRef, owner: ClusterRef) -> ClusterRef {
        let owner2 = self.prepare_for_rewrite(owner);
        let (is_left, old_proper, other_foster, v) = {
            let n = self.node(owner2);
            let extras = n.extras.as_ref().expect("splice target must be COMPRESS");
            let is_left = extras.left_foster == Some(leaf);
            debug_assert!(is_left || extras.right_foster == Some(leaf));
            let old_proper = if is_left { n.left } else { n.right }.expect("compress missing proper child");
            let other = if is_left {
                extras.right_foster
            } else {
                extras.left_foster
            };
            (is_left, old_proper, other, extras.compressed_vertex.expect("compress missing vertex"))
        };

        if !is_left {
            self.node_mut(leaf).reverse();
            self.normalize(leaf);
        }

        let new_foster = self.attach_foster(old_proper, other_foster, v);
        self.node_mut(new_foster).up = Up::Link(owner2);
        self.node_mut(leaf).up = Up::Parent(owner2);
        {
            let n = self.node_mut(owner2);
            let extras = n.extras.as_mut().unwrap();
            if is_left {
                n.left = Some(leaf);
                extras.left_foster = Some(new_foster);
            } else {
                n.right = Some(leaf);
                extras.right_foster = Some(new_foster);
            }
        }
        self.recompute_vertices(owner2);
        log::trace!("splice {leaf:?} into {owner:?} (-> {owner2:?})");
        owner2
    }

    /// Bring `v` to the root of its component, per §4.3. Returns the
    /// component's new top cluster, or `None` if `v` is isolated.
    ///
    /// When `v` has degree <= 1 it is topologically free to become an outer
    /// boundary, and this finalizes it as specifically the *right* boundary
    /// (§4.3 "Orientation finalize"). When `v` has degree >= 2 it is
    /// necessarily interior to any path that also covers its other
    /// neighbors, so it surfaces instead as the returned cluster's
    /// compressed vertex, with its fosters directly reachable — exactly the
    /// shape `link`/`cut`'s degree-based case tables (§4.4/§4.5) expect when
    /// they dispatch on an already-nonzero degree. Producing `v` as a
    /// literal boundary regardless of degree is `expose`'s job (§4.7), via
    /// the extra HARD_RAKE unzip `hardExpose` performs on top of this.
    pub(crate) fn soft_expose(&mut self, v: VertexId) -> Option<ClusterRef> {
        let mut cur = self.vertex(v)?.cluster?;
        self.rectify(cur);
        loop {
            self.splay_to_top(cur);
            match self.node(cur).up {
                Up::Root => break,
                Up::Link(owner) => cur = self.splice(cur, owner),
                Up::Parent(_) => unreachable!("splay_to_top leaves no proper parent"),
            }
        }
        if self.node(cur).bv() == v {
            // already the right boundary
        } else if self.node(cur).bu() == Some(v) {
            self.reverse_now(cur);
        } else {
            debug_assert_eq!(
                self.node(cur)
                    .extras
                    .as_ref()
                    .and_then(|e| e.compressed_vertex),
                Some(v),
                "soft_expose: v must end up as a boundary or as the compressed vertex of its own top cluster"
            );
        }
        self.bind_vertices(cur);
        log::trace!("soft_expose({v}) -> {cur:?}");
        Some(cur)
    }

    /// Bring both `u` and `v` onto a single root path if they share a
    /// component (§4.3 `softExpose(u,v)`). Neither is required to become a
    /// boundary of the resulting cluster; see §4.6 `hardExpose` for that.
    pub(crate) fn soft_expose_two(&mut self, u: VertexId, v: VertexId) -> TwoExpose {
        let top_v = self.soft_expose(v).expect("v must be non-isolated");
        let u_root = self
            .vertex(u)
            .and_then(|r| r.cluster)
            .map(|c| self.find_root(c));
        if u_root == Some(top_v) {
            let top = self.soft_expose(u).expect("u must be non-isolated");
            TwoExpose::Same(top)
        } else {
            let top_u = self.soft_expose(u).expect("u must be non-isolated");
            TwoExpose::Different(top_u, top_v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::ClusterInfo;
    use crate::listener::{ClusterKind, Connection, SelectChild};
    use crate::node::ClusterNode;
    use crate::TopForest;

    #[derive(Default)]
    struct NoData;

    struct NullListener;

    impl Listener<u32, NoData> for NullListener {
        fn create(&mut self, _c: &mut ClusterInfo<NoData>, _kind: ClusterKind) {}
        fn destroy(&mut self, _c: &ClusterInfo<NoData>, _kind: ClusterKind) {}
        fn join(&mut self, _parent: &mut ClusterInfo<NoData>, _a: &ClusterInfo<NoData>, _b: &ClusterInfo<NoData>, _connection: Connection) {}
        fn split(&mut self, _a: &mut ClusterInfo<NoData>, _b: &mut ClusterInfo<NoData>, _parent: &ClusterInfo<NoData>, _connection: Connection) {}
        fn select_question(&mut self, _a: &ClusterInfo<NoData>, _b: &ClusterInfo<NoData>, _connection: Connection) -> SelectChild {
            SelectChild::Left
        }
    }

    #[test]
    fn splay_to_top_performs_zig_zig() {
        let mut forest = TopForest::new(NullListener);
        let a = forest.create_vertex(0);
        let b = forest.create_vertex(1);
        let c = forest.create_vertex(2);
        let d = forest.create_vertex(3);

        // Hand-built left-leaning chain base(a,b) - base(b,c) - base(c,d):
        // `cd` sits as the right child two levels down on the right spine,
        // the shape that forces a genuine zig-zig when splayed.
        let ab = forest.alloc_node(ClusterNode::new_base(0, a, b));
        let bc = forest.alloc_node(ClusterNode::new_base(0, b, c));
        let cd = forest.alloc_node(ClusterNode::new_base(0, c, d));
        let inner = forest.recompose_compress(bc, cd, c);
        let outer = forest.recompose_compress(ab, inner, b);
        assert_eq!(forest.node(outer).right, Some(inner));
        assert_eq!(forest.node(inner).right, Some(cd));

        forest.splay_to_top(cd);
        assert!(matches!(forest.node(cd).up, Up::Root));
        assert_eq!(forest.node(cd).bu(), Some(c));
        assert_eq!(forest.node(cd).bv(), d);
    }

    #[test]
    fn splay_to_top_performs_zig_zag() {
        let mut forest = TopForest::new(NullListener);
        let p = forest.create_vertex(0);
        let q = forest.create_vertex(1);
        let r = forest.create_vertex(2);
        let s = forest.create_vertex(3);

        // base(p,q) - base(q,r) - base(r,s), contracted so `qr` ends up as
        // the left child of a node that is itself the right child of the
        // root: opposite-direction from its parent, the zig-zag shape.
        let pq = forest.alloc_node(ClusterNode::new_base(0, p, q));
        let qr = forest.alloc_node(ClusterNode::new_base(0, q, r));
        let rs = forest.alloc_node(ClusterNode::new_base(0, r, s));
        let inner = forest.recompose_compress(qr, rs, r);
        let outer = forest.recompose_compress(pq, inner, q);
        assert_eq!(forest.node(inner).left, Some(qr));
        assert_eq!(forest.node(outer).right, Some(inner));

        forest.splay_to_top(qr);
        assert!(matches!(forest.node(qr).up, Up::Root));
        assert_eq!(forest.node(qr).bu(), Some(q));
        assert_eq!(forest.node(qr).bv(), r);
    }
}
