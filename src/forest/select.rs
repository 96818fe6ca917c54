// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `select` (§4.9): non-local search over the exposed top cluster.
//!
//! The original design enumerates twenty-four structural sub-cases keyed on
//! the chosen child's kind/side/foster-presence. Per the engineering note in
//! `SPEC_FULL.md` §4.10, this implementation reaches the same externally
//! observable behavior — one `selectQuestion` per level, descent stopping at
//! a clean BASE — through one recursive rewrite: fold each side's foster (if
//! any) into it, ask, recurse into the chosen side alone, then fold the
//! other side back onto whatever the recursion settles on. The fold/unfold
//! step is the same `recompose_rake` primitive `link`/`hard_expose` already
//! use, so nothing here needs its own bespoke restructuring vocabulary.

use super::two_mut_slots;
use crate::ids::{ClusterRef, VertexId};
use crate::listener::{Connection, ClusterKind, Listener, SelectChild};
use crate::node::{NodeKind, NodeState};
use crate::TopForest;

impl<L, V, C> TopForest<L, V, C>
where
    L: Listener<V, C>,
    C: Default,
{
    /// `select(v)` (§6, §4.9): non-local search starting from `v`'s own
    /// component. `None` if `v` is isolated.
    pub fn select(&mut self, v: VertexId) -> Option<(VertexId, VertexId)> {
        self.undo_residual();
        let orig = self.vertex(v).and_then(|r| r.cluster).map(|c| self.find_root(c))?;
        let top = self.hard_expose_one(v).expect("v has a cluster, so it is not isolated");
        let (new_top, bu, bv) = self.select_step(top, false);
        self.finish_rebuild(&[orig], &[new_top]);
        log::debug!("select({v}) -> ({bu}, {bv})");
        Some((bu, bv))
    }

    /// `select(u, v)` (§6, §4.9): non-local search restricted to the `u`-`v`
    /// path. `None` if they are not connected.
    pub fn select_pair(&mut self, u: VertexId, v: VertexId) -> Option<(VertexId, VertexId)> {
        self.undo_residual();
        let orig = self.vertex(v).and_then(|r| r.cluster).map(|c| self.find_root(c))?;
        let top = self.hard_expose_two(u, v)?;
        let (new_top, bu, bv) = self.select_step(top, true);
        self.finish_rebuild(&[orig], &[new_top]);
        log::debug!("select({u}, {v}) -> ({bu}, {bv})");
        Some((bu, bv))
    }

    /// Resolve `cur` down to a BASE answer, returning the node that should
    /// replace `cur` in whatever held it (itself, if nothing below it
    /// needed restructuring) alongside the answer's boundary pair.
    /// `path_restricted` is `true` for `select_pair`'s `u`-`v`-path search
    /// (§4.9): when exactly one side is a path cluster, the engine must
    /// follow it without consulting the listener at all, since the other
    /// side is necessarily an off-path branch that cannot contain `u`/`v`.
    fn select_step(&mut self, cur: ClusterRef, path_restricted: bool) -> (ClusterRef, VertexId, VertexId) {
        match self.node(cur).kind {
            NodeKind::Base => {
                let n = self.node(cur);
                (cur, n.bu().expect("base missing bu"), n.bv())
            }
            NodeKind::Rake | NodeKind::HardRake => {
                let (l, r, kind) = {
                    let n = self.node(cur);
                    (n.left.unwrap(), n.right.unwrap(), n.kind)
                };
                let conn = if kind == NodeKind::Rake {
                    Connection::PointAndPoint
                } else {
                    self.pair_connection(l, r)
                };
                let choice = self.choose(l, r, conn, path_restricted);
                let anchor = self.shared_vertex_of_pair(l, r);
                // `cur` must be split apart here, before recursing into
                // `chosen`: `chosen` is one of `l`/`r`, and the recursive
                // `select_step` call below may itself free `chosen` (if it
                // is CLEAN, the same way `cur` is here). Discarding `cur`
                // only after that call would read a dangling child.
                self.discard_select(cur);
                let (chosen, other) = match choice {
                    SelectChild::Left => (l, r),
                    SelectChild::Right => (r, l),
                };
                let (new_chosen, bu, bv) = self.select_step(chosen, path_restricted);
                let merged = self.recompose_rake(new_chosen, other, anchor);
                (merged, bu, bv)
            }
            NodeKind::Compress => {
                let (l, r, v, lf, rf) = {
                    let n = self.node(cur);
                    let extras = n.extras.as_ref().expect("compress missing extras");
                    (
                        n.left.unwrap(),
                        n.right.unwrap(),
                        extras.compressed_vertex.expect("compress missing vertex"),
                        extras.left_foster,
                        extras.right_foster,
                    )
                };
                let left_group = self.fold_side(l, lf, v);
                let right_group = self.fold_side(r, rf, v);
                let conn = self.group_connection(left_group, right_group);
                let choice = self.choose(left_group, right_group, conn, path_restricted);
                // Same reordering as the RAKE/HARD_RAKE arm above: split
                // `cur` into `l`/`r`/`lf`/`rf` now, while they're still all
                // alive, before recursing into whichever of `left_group`/
                // `right_group` was chosen (which may free its own proper
                // children on the way back up).
                self.discard_select(cur);
                let (chosen, other) = match choice {
                    SelectChild::Left => (left_group, right_group),
                    SelectChild::Right => (right_group, left_group),
                };
                let (new_chosen, bu, bv) = self.select_step(chosen, path_restricted);
                let merged = self.recompose_rake(new_chosen, other, v);
                (merged, bu, bv)
            }
        }
    }

    /// Pick a side without consulting the listener whenever `path_restricted`
    /// and the connection marks exactly one side as the path side (§4.9);
    /// otherwise defer to [`Self::ask`] as usual.
    fn choose(&mut self, a: ClusterRef, b: ClusterRef, connection: Connection, path_restricted: bool) -> SelectChild {
        if path_restricted {
            match connection {
                Connection::PathAndPoint => return SelectChild::Left,
                Connection::PointAndPath => return SelectChild::Right,
                _ => {}
            }
        }
        self.ask(a, b, connection)
    }

    /// Discard a cluster `select_step` is done with. Unlike the general
    /// [`TopForest::discard`] (which assumes a CLEAN node it hands off is
    /// already reachable from the operation's `orig` root), a `cur` reaching
    /// this point was either never touched (still NEW: the very first
    /// `select_step` call, or a side `ask` never looked at) or was fixated
    /// in place by [`Self::ask`] moments ago specifically so it had real
    /// data to answer with, and is about to be replaced by a differently
    /// shaped `merged` node that nothing else will ever walk to. A NEW one
    /// is simply freed; a CLEAN one must have its `join` undone via a `split`
    /// right here, since no later pass will ever visit it.
    fn discard_select(&mut self, r: ClusterRef) {
        if self.node(r).is_new() {
            self.free_node(r);
        } else {
            debug_assert!(self.node(r).is_clean(), "select only discards NEW or freshly-fixated clusters");
            self.node_mut(r).state = NodeState::Obsolete;
            self.clean_dirty_nodes(r);
        }
    }

    /// Fold `foster` (if present) onto `side` at their shared vertex `v`;
    /// otherwise `side` is already the whole group.
    pub(crate) fn fold_side(&mut self, side: ClusterRef, foster: Option<ClusterRef>, v: VertexId) -> ClusterRef {
        match foster {
            Some(f) => self.recompose_rake(side, f, v),
            None => side,
        }
    }

    /// The `Connection` the listener sees between a COMPRESS's two
    /// (possibly foster-folded) groups.
    fn group_connection(&self, a: ClusterRef, b: ClusterRef) -> Connection {
        match (self.node(a).listener_kind(), self.node(b).listener_kind()) {
            (ClusterKind::Path, ClusterKind::Path) => Connection::PathAndPath,
            (ClusterKind::Path, ClusterKind::Point) => Connection::PathAndPoint,
            (ClusterKind::Point, ClusterKind::Path) => Connection::PointAndPath,
            (ClusterKind::Point, ClusterKind::Point) => Connection::PointAndPoint,
        }
    }

    /// The `Connection` for a HARD_RAKE's two children, which (unlike a
    /// plain RAKE) may be one path side and one point side.
    fn pair_connection(&self, a: ClusterRef, b: ClusterRef) -> Connection {
        self.group_connection(a, b)
    }

    /// The vertex `l` and `r` have in common (§4.2 orientation contract
    /// guarantees exactly one, for any pair of siblings this engine builds).
    /// Falls back to `r`'s own right boundary for the rarer two-distinct-
    /// boundary HARD_RAKE shape built by `force_left_boundary`, where `l`
    /// and `r` share no vertex at all — there the caller only needs *some*
    /// valid anchor to hand back to its own parent, not a shared one.
    fn shared_vertex_of_pair(&self, l: ClusterRef, r: ClusterRef) -> VertexId {
        let ln = self.node(l);
        let rn = self.node(r);
        let lb = [ln.bu(), Some(ln.bv())];
        let rb = [rn.bu(), Some(rn.bv())];
        for a in lb.into_iter().flatten() {
            for b in rb.into_iter().flatten() {
                if a == b {
                    return a;
                }
            }
        }
        rn.bv()
    }

    /// Ask the listener's `selectQuestion` about two real clusters,
    /// bracketing the call in the local-access window like any other
    /// callback invocation (§4.8 "Local access"). `a`/`b` are fixated first
    /// if still NEW, so `selectQuestion` always sees real `join`ed data
    /// rather than an empty default (§4.9) — the exposed tree handed to
    /// `select_step` has no other chance to pick up real cluster data before
    /// the end of the operation otherwise.
    fn ask(&mut self, a: ClusterRef, b: ClusterRef, connection: Connection) -> SelectChild {
        self.recurse_fixate(a);
        self.recurse_fixate(b);
        let (an, bn) = two_mut_slots(&mut self.nodes, a, b);
        an.info.allow();
        bn.info.allow();
        let (an, bn) = two_mut_slots(&mut self.nodes, a, b);
        let choice = self.listener.select_question(&an.info, &bn.info, connection);
        let (an, bn) = two_mut_slots(&mut self.nodes, a, b);
        an.info.deny();
        bn.info.deny();
        log::trace!("select_question({a:?}, {b:?}, {connection:?}) -> {choice:?}");
        choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::ClusterInfo;
    use crate::node::ClusterNode;
    use crate::TopForest;
    use std::cell::Cell;

    /// Counts how many times `select_question` was actually consulted, to
    /// check `choose`'s path-restricted short-circuit directly rather than
    /// only through its externally observable effect.
    struct RecordingListener {
        asked: Cell<u32>,
    }

    impl Listener<u32, ()> for RecordingListener {
        fn create(&mut self, _c: &mut ClusterInfo<()>, _kind: ClusterKind) {}
        fn destroy(&mut self, _c: &ClusterInfo<()>, _kind: ClusterKind) {}
        fn join(&mut self, _parent: &mut ClusterInfo<()>, _a: &ClusterInfo<()>, _b: &ClusterInfo<()>, _connection: Connection) {}
        fn split(&mut self, _a: &mut ClusterInfo<()>, _b: &mut ClusterInfo<()>, _parent: &ClusterInfo<()>, _connection: Connection) {}
        fn select_question(&mut self, _a: &ClusterInfo<()>, _b: &ClusterInfo<()>, _connection: Connection) -> SelectChild {
            self.asked.set(self.asked.get() + 1);
            SelectChild::Right
        }
    }

    #[test]
    fn choose_skips_listener_for_mixed_connection() {
        let mut forest = TopForest::new(RecordingListener { asked: Cell::new(0) });
        let u = forest.create_vertex(0);
        let v = forest.create_vertex(1);
        let x = forest.alloc_node(ClusterNode::new_base(0, u, v));
        let y = forest.alloc_node(ClusterNode::new_base(0, u, v));

        assert_eq!(forest.choose(x, y, Connection::PathAndPoint, true), SelectChild::Left);
        assert_eq!(forest.choose(x, y, Connection::PointAndPath, true), SelectChild::Right);
        assert_eq!(forest.listener().asked.get(), 0, "path-restricted mixed connections must not consult select_question");

        assert_eq!(forest.choose(x, y, Connection::PathAndPath, true), SelectChild::Right);
        assert_eq!(forest.listener().asked.get(), 1, "non-mixed connections still ask normally even when path-restricted");
    }

    #[test]
    fn select_pair_ignores_listener_on_branching_topology() {
        let mut forest = TopForest::new(RecordingListener { asked: Cell::new(0) });
        let center = forest.create_vertex(0);
        let a = forest.create_vertex(1);
        let b = forest.create_vertex(2);
        let d = forest.create_vertex(3);
        forest.link(center, a).unwrap();
        forest.link(center, b).unwrap();
        forest.link(center, d).unwrap();

        // The listener always answers `Right`; if `select_pair` ever asked
        // it while descending a mixed path/point connection, an adversarial
        // answer like this could divert the search onto the `d` branch.
        let (x, y) = forest.select_pair(a, b).expect("a and b are connected through center");
        let on_path = |p: VertexId| p == a || p == b || p == center;
        assert!(on_path(x) && on_path(y), "select_pair wandered off the a-b path");
        assert!(x != d && y != d);
    }
}
