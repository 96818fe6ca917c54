// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`TopForest`]: the public facade (§2 "TopForest engine", §6).
//!
//! Owns the vertex arena, the cluster-node arena, the edge count, and the
//! operation-scoped transient state (`hard_expose`, `one_vertex_expose`)
//! described in §9 "Mutable engine state" — here modeled as `Option` fields
//! on the forest rather than long-lived globals, exactly as the design
//! notes recommend, so a left-over hard-expose from a previous call is
//! impossible to miss: every public entry point starts by undoing it.

mod callbacks;
mod cut;
mod hard_expose;
mod link;
mod select;
mod splay;

use crate::error::TopTreeError;
use crate::ids::{ClusterRef, VertexId};
use crate::listener::{Connection, Listener};
use crate::node::{ClusterNode, NodeKind, NodeState, Up};
use crate::vertex::VertexRecord;

pub use hard_expose::{ExposeOneResult, ExposeTwoResult};

/// Transient descriptor recorded while a hard-expose is in effect (§4.6).
pub(crate) struct HardExposeState {
    pub(crate) transient_root: ClusterRef,
    pub(crate) original_root: ClusterRef,
    pub(crate) reversed_after: bool,
    pub(crate) left_tail: u8,
    pub(crate) right_tail: u8,
    pub(crate) left_count: u8,
    pub(crate) right_count: u8,
}

/// The dynamic-forest / top-tree engine.
///
/// `L` is the client's [`Listener`] implementation, `V` the per-vertex
/// payload type, `C` the per-cluster associative value type.
pub struct TopForest<L, V, C> {
    vertices: Vec<Option<VertexRecord<V>>>,
    vertex_free: Vec<usize>,
    nodes: Vec<Option<ClusterNode<C>>>,
    node_free: Vec<usize>,
    num_edges: usize,
    listener: L,
    pub(crate) hard_expose: Option<HardExposeState>,
    /// Set while the current top cluster is the "nonstandard" one-vertex
    /// shape [`TopForest::build_one_vertex_root`] builds: the root
    /// [`ClusterRef`] together with the [`Connection`] its two point
    /// children should be reported under, so [`Self::connection_of`] can
    /// override the ordinary kind-based lookup for that one node.
    pub(crate) one_vertex_expose: Option<(ClusterRef, Connection)>,
    last_exposed: Option<ClusterRef>,
}

impl<L, V, C> TopForest<L, V, C>
where
    L: Listener<V, C>,
    C: Default,
{
    /// Create an empty forest driven by the given listener.
    pub fn new(listener: L) -> Self {
        Self {
            vertices: Vec::new(),
            vertex_free: Vec::new(),
            nodes: Vec::new(),
            node_free: Vec::new(),
            num_edges: 0,
            listener,
            hard_expose: None,
            one_vertex_expose: None,
            last_exposed: None,
        }
    }

    /// Create a new, isolated vertex (§6 `createVertex`).
    pub fn create_vertex(&mut self, payload: V) -> VertexId {
        self.listener.vertex_created(&payload);
        let (idx, generation) = if let Some(idx) = self.vertex_free.pop() {
            let generation = self.vertices[idx]
                .as_ref()
                .map(|v| v.generation)
                .unwrap_or(0)
                .wrapping_add(1)
                .max(1);
            self.vertices[idx] = Some(VertexRecord::new(generation, payload));
            (idx as u32, generation)
        } else {
            let generation = 1u32;
            self.vertices.push(Some(VertexRecord::new(generation, payload)));
            ((self.vertices.len() - 1) as u32, generation)
        };
        let id = VertexId::new(idx, generation);
        log::debug!("create_vertex -> {id}");
        id
    }

    /// Number of live vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_some()).count()
    }

    /// Number of edges currently linked (§3 "Degree and edge count").
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Number of connected components (§3 "components = vertices - edges").
    pub fn num_components(&self) -> usize {
        self.num_vertices() - self.num_edges
    }

    /// Degree of a live vertex, or 0 for a stale/isolated handle.
    pub fn degree(&self, v: VertexId) -> u32 {
        self.vertex(v).map(|r| r.degree).unwrap_or(0)
    }

    /// Read a vertex's client payload.
    pub fn vertex_payload(&self, v: VertexId) -> Option<&V> {
        self.vertex(v).map(|r| &r.payload)
    }

    /// Mutably access a vertex's client payload.
    pub fn vertex_payload_mut(&mut self, v: VertexId) -> Option<&mut V> {
        self.vertex_mut(v).map(|r| &mut r.payload)
    }

    /// The top cluster currently covering `v`, or `None` if `v` is isolated
    /// (§6 `topCluster`). Running any other public operation afterwards
    /// may change which cluster this is; see §6 "Cluster data access".
    pub fn top_cluster(&mut self, v: VertexId) -> Option<ClusterRef> {
        self.undo_residual();
        let mut cur = self.vertex(v)?.cluster?;
        loop {
            match self.node(cur).up {
                Up::Root => {
                    self.set_exposed(Some(cur));
                    return Some(cur);
                }
                Up::Parent(p) | Up::Link(p) => cur = p,
            }
        }
    }

    /// Read the associative data of a cluster returned by [`Self::top_cluster`]/
    /// [`Self::expose`]/[`Self::expose_pair`] (§6 "Cluster data access"). Only
    /// the cluster most recently handed back by one of those three — or one
    /// currently mid-callback — accepts [`crate::info::ClusterInfo::get`]/
    /// `get_mut`; every other cluster answers [`TopTreeError::AccessDenied`].
    pub fn cluster_info(&self, r: ClusterRef) -> &crate::info::ClusterInfo<C> {
        &self.node(r).info
    }

    /// Move the "locally accessible outside a callback" window to `r`,
    /// denying whatever held it before (§5 "only one cluster at a time").
    pub(crate) fn set_exposed(&mut self, r: Option<ClusterRef>) {
        if let Some(old) = self.last_exposed {
            if self.is_node_alive(old) {
                self.node(old).info.deny();
            }
        }
        if let Some(new) = r {
            self.node(new).info.allow();
        }
        self.last_exposed = r;
    }

    // -- arena plumbing -----------------------------------------------------

    pub(crate) fn vertex(&self, v: VertexId) -> Option<&VertexRecord<V>> {
        self.vertices
            .get(v.idx())
            .and_then(|s| s.as_ref())
            .filter(|r| r.generation == v.generation())
    }

    pub(crate) fn vertex_mut(&mut self, v: VertexId) -> Option<&mut VertexRecord<V>> {
        self.vertices
            .get_mut(v.idx())
            .and_then(|s| s.as_mut())
            .filter(|r| r.generation == v.generation())
    }

    pub(crate) fn is_node_alive(&self, r: ClusterRef) -> bool {
        self.nodes
            .get(r.idx())
            .and_then(|s| s.as_ref())
            .map(|n| n.generation == r.generation())
            .unwrap_or(false)
    }

    pub(crate) fn node(&self, r: ClusterRef) -> &ClusterNode<C> {
        self.nodes[r.idx()]
            .as_ref()
            .filter(|n| n.generation == r.generation())
            .expect("dangling ClusterRef")
    }

    pub(crate) fn node_mut(&mut self, r: ClusterRef) -> &mut ClusterNode<C> {
        let gen = r.generation();
        self.nodes[r.idx()]
            .as_mut()
            .filter(|n| n.generation == gen)
            .expect("dangling ClusterRef")
    }

    /// Borrow two distinct nodes mutably at once. Panics if `a == b`.
    pub(crate) fn two_mut(
        &mut self,
        a: ClusterRef,
        b: ClusterRef,
    ) -> (&mut ClusterNode<C>, &mut ClusterNode<C>) {
        two_mut_slots(&mut self.nodes, a, b)
    }

    /// Borrow three distinct nodes mutably at once. Panics on any collision.
    /// A free function (not a method) so call sites can invoke it as
    /// `three_mut_slots(&mut self.nodes, ...)`, letting the borrow checker
    /// see it touches only the `nodes` field — leaving `self.listener`
    /// available to borrow in the same expression (§4.8 callback firing).
    pub(crate) fn three_mut(
        &mut self,
        a: ClusterRef,
        b: ClusterRef,
        c: ClusterRef,
    ) -> (&mut ClusterNode<C>, &mut ClusterNode<C>, &mut ClusterNode<C>) {
        three_mut_slots(&mut self.nodes, a, b, c)
    }

    pub(crate) fn alloc_node(&mut self, node: ClusterNode<C>) -> ClusterRef {
        if let Some(idx) = self.node_free.pop() {
            let generation = self.nodes[idx]
                .as_ref()
                .map(|n| n.generation)
                .unwrap_or(0)
                .wrapping_add(1)
                .max(1);
            let mut node = node;
            node.generation = generation;
            self.nodes[idx] = Some(node);
            ClusterRef::new(idx as u32, generation)
        } else {
            let mut node = node;
            node.generation = 1;
            self.nodes.push(Some(node));
            ClusterRef::new((self.nodes.len() - 1) as u32, 1)
        }
    }

    pub(crate) fn free_node(&mut self, r: ClusterRef) {
        debug_assert!(self.is_node_alive(r));
        self.nodes[r.idx()] = None;
        self.node_free.push(r.idx());
    }

    pub(crate) fn listener(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Recompute a COMPRESS node's own outer boundary and compressed vertex
    /// from its current children (§4.1 "recomputeVertices"). Also rebinds
    /// the compressed vertex's back-pointer to `r`: unlike the two outer
    /// boundaries (bound by [`Self::bind_vertices`]), the compressed vertex
    /// is internal to `r` specifically, so `r` is by construction the
    /// topmost cluster whose `compressedVertex` equals it (§3 "Vertex
    /// back-pointer") and stays so until `r` itself is rebuilt.
    pub(crate) fn recompute_vertices(&mut self, r: ClusterRef) {
        let (left, right, kind) = {
            let n = self.node(r);
            (n.left, n.right, n.kind)
        };
        if kind != NodeKind::Compress {
            return;
        }
        let left = left.expect("compress missing left child");
        let right = right.expect("compress missing right child");
        let (bu, compressed, bv) = {
            let l = self.node(left);
            let r2 = self.node(right);
            (l.bu().unwrap_or_else(|| l.bv()), l.bv(), r2.bv())
        };
        debug_assert_eq!(compressed, self.node(right).bu().unwrap_or(compressed));
        let n = self.node_mut(r);
        n.boundary = [Some(bu), Some(bv)];
        if let Some(extras) = &mut n.extras {
            extras.compressed_vertex = Some(compressed);
        }
        if let Some(rec) = self.vertex_mut(compressed) {
            rec.cluster = Some(r);
        }
    }

    /// Install `r` into its two outer boundary vertices' back-pointers
    /// (§4.1 "bindVertices"). Call in post-order (children before parents)
    /// so that, for shared outer endpoints, the topmost ancestor's call is
    /// the one that sticks (§3 "topmost non-rake cluster"). The compressed
    /// vertex of a COMPRESS is bound separately by
    /// [`Self::recompute_vertices`], since it is intrinsic to that node
    /// rather than inherited from an ancestor.
    pub(crate) fn bind_vertices(&mut self, r: ClusterRef) {
        let n = self.node(r);
        if n.kind == NodeKind::Rake {
            return;
        }
        let bu = n.bu();
        let bv = n.bv();
        if let Some(bu) = bu {
            if let Some(rec) = self.vertex_mut(bu) {
                rec.cluster = Some(r);
            }
        }
        if let Some(rec) = self.vertex_mut(bv) {
            rec.cluster = Some(r);
        }
    }

    /// §4.6/§4.7: every public operation begins by undoing any residual
    /// hard-expose or one-vertex-expose left over from the previous call.
    pub(crate) fn undo_residual(&mut self) {
        if self.hard_expose.is_some() {
            self.undo_hard_expose();
        }
        if self.one_vertex_expose.is_some() {
            self.undo_one_vertex_expose();
        }
    }
}

pub(crate) fn two_mut_slots<C>(
    nodes: &mut [Option<ClusterNode<C>>],
    a: ClusterRef,
    b: ClusterRef,
) -> (&mut ClusterNode<C>, &mut ClusterNode<C>) {
    assert_ne!(a.idx(), b.idx(), "two_mut requires distinct slots");
    let (lo, hi) = if a.idx() < b.idx() { (a, b) } else { (b, a) };
    let (left, right) = nodes.split_at_mut(hi.idx());
    let lo_ref = left[lo.idx()].as_mut().expect("dangling ClusterRef");
    let hi_ref = right[0].as_mut().expect("dangling ClusterRef");
    if a.idx() < b.idx() {
        (lo_ref, hi_ref)
    } else {
        (hi_ref, lo_ref)
    }
}

pub(crate) fn three_mut_slots<C>(
    nodes: &mut [Option<ClusterNode<C>>],
    a: ClusterRef,
    b: ClusterRef,
    c: ClusterRef,
) -> (&mut ClusterNode<C>, &mut ClusterNode<C>, &mut ClusterNode<C>) {
    assert!(
        a.idx() != b.idx() && b.idx() != c.idx() && a.idx() != c.idx(),
        "three_mut requires distinct slots"
    );
    let mut order = [(a, 0usize), (b, 1), (c, 2)];
    order.sort_by_key(|(r, _)| r.idx());
    let [(lo, lo_pos), (mid, mid_pos), (hi, hi_pos)] = order;
    let (first, rest) = nodes.split_at_mut(mid.idx());
    let (second, third) = rest.split_at_mut(hi.idx() - mid.idx());
    let slots = [
        first[lo.idx()].as_mut().expect("dangling ClusterRef"),
        second[0].as_mut().expect("dangling ClusterRef"),
        third[0].as_mut().expect("dangling ClusterRef"),
    ];
    let mut out: [Option<&mut ClusterNode<C>>; 3] = [None, None, None];
    let mut slots = slots.into_iter();
    out[lo_pos] = Some(slots.next().unwrap());
    out[mid_pos] = Some(slots.next().unwrap());
    out[hi_pos] = Some(slots.next().unwrap());
    let [x, y, z] = out;
    (x.unwrap(), y.unwrap(), z.unwrap())
}
