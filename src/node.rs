// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`ClusterNode`]: the unit of hierarchical decomposition (§3, §4.1).

use crate::ids::{ClusterRef, VertexId};
use crate::info::ClusterInfo;

/// The tag discriminating the four cluster shapes (§2 "ClusterNode", §9
/// "Deep inheritance"). Rather than modeling `CompressClusterNode` as a
/// subtype the way the original Java does, this is a tagged variant: a
/// `kind` discriminator plus an optional [`CompressExtras`] payload that is
/// present iff `kind == Compress`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A single edge; leaf of the hierarchy.
    Base,
    /// Contracts one internal vertex of degree >= 2 on the path.
    Compress,
    /// Joins two subtrees sharing a single boundary vertex.
    Rake,
    /// Transient path cluster with two explicit boundaries, used only
    /// during hard-expose and `select`.
    HardRake,
}

/// Lifecycle state of a cluster node (§3 "State").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Steady state: callbacks have fired, data is consistent.
    Clean,
    /// Freshly created, awaiting `create`/`join`.
    New,
    /// Content may have changed; still needs `split`/`destroy`.
    Dirty,
    /// Scheduled for deletion once `split`/`destroy` have fired.
    Obsolete,
    /// Transient, used only during a `select` descent.
    SelectAuxiliary,
    /// Transient, used only during a `select` descent.
    SelectModified,
}

/// Whether the reverse bit has been pushed down (§3 "Reverse bit").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NormalizeFlag {
    /// No pending rectification work below this node.
    None,
    /// This node was touched by an ongoing `rectify` walk and still needs `normalize`.
    Mark,
}

/// The single upward back-reference a cluster node may hold (§3
/// "exactly one of two possible upward references"). Both variants are
/// non-owning: ownership flows the other way, from parent/link-holder down
/// to child (§3 "Ownership").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Up {
    /// This is a top cluster: no parent, no link.
    Root,
    /// Proper child of a COMPRESS/RAKE/HARD_RAKE.
    Parent(ClusterRef),
    /// Foster child of a COMPRESS, or a non-rake child hanging off a RAKE.
    Link(ClusterRef),
}

impl Up {
    pub(crate) fn is_root(self) -> bool {
        matches!(self, Up::Root)
    }

    pub(crate) fn as_ref(self) -> Option<ClusterRef> {
        match self {
            Up::Root => None,
            Up::Parent(r) | Up::Link(r) => Some(r),
        }
    }
}

/// Extra fields owned only by `Compress` nodes (§3 "A COMPRESS node additionally owns...").
#[derive(Debug)]
pub struct CompressExtras<C> {
    /// Off-path subtree raked onto the compressed vertex from the left child's side.
    pub left_foster: Option<ClusterRef>,
    /// Off-path subtree raked onto the compressed vertex from the right child's side.
    pub right_foster: Option<ClusterRef>,
    /// The vertex this compress contracts.
    pub compressed_vertex: Option<VertexId>,
    /// Intermediate join/split stage exposing `left` composed with `left_foster`.
    pub left_composed: ClusterInfo<C>,
    /// Intermediate join/split stage exposing `right` composed with `right_foster`.
    pub right_composed: ClusterInfo<C>,
}

impl<C: Default> CompressExtras<C> {
    fn new() -> Self {
        Self {
            left_foster: None,
            right_foster: None,
            compressed_vertex: None,
            left_composed: ClusterInfo::new(),
            right_composed: ClusterInfo::new(),
        }
    }
}

/// A node in the hierarchical cluster decomposition (§3 "A ClusterNode owns").
#[derive(Debug)]
pub struct ClusterNode<C> {
    pub(crate) generation: u32,
    pub(crate) kind: NodeKind,
    pub(crate) reversed: bool,
    pub(crate) state: NodeState,
    pub(crate) normalize_flag: NormalizeFlag,
    /// `[bu, bv]`. Unused (both `None`) is never valid for Base/Compress/HardRake;
    /// for Rake only `boundary[1]` (the shared boundary `bv`) is meaningful.
    pub(crate) boundary: [Option<VertexId>; 2],
    pub(crate) left: Option<ClusterRef>,
    pub(crate) right: Option<ClusterRef>,
    pub(crate) up: Up,
    pub(crate) info: ClusterInfo<C>,
    pub(crate) extras: Option<CompressExtras<C>>,
}

impl<C: Default> ClusterNode<C> {
    pub(crate) fn new_base(generation: u32, bu: VertexId, bv: VertexId) -> Self {
        Self {
            generation,
            kind: NodeKind::Base,
            reversed: false,
            state: NodeState::New,
            normalize_flag: NormalizeFlag::None,
            boundary: [Some(bu), Some(bv)],
            left: None,
            right: None,
            up: Up::Root,
            info: ClusterInfo::new(),
            extras: None,
        }
    }

    pub(crate) fn new_compress(
        generation: u32,
        left: ClusterRef,
        right: ClusterRef,
        compressed_vertex: VertexId,
        bu: VertexId,
        bv: VertexId,
    ) -> Self {
        let mut extras = CompressExtras::new();
        extras.compressed_vertex = Some(compressed_vertex);
        Self {
            generation,
            kind: NodeKind::Compress,
            reversed: false,
            state: NodeState::New,
            normalize_flag: NormalizeFlag::None,
            boundary: [Some(bu), Some(bv)],
            left: Some(left),
            right: Some(right),
            up: Up::Root,
            info: ClusterInfo::new(),
            extras: Some(extras),
        }
    }

    pub(crate) fn new_rake(generation: u32, left: ClusterRef, right: ClusterRef, bv: VertexId) -> Self {
        Self {
            generation,
            kind: NodeKind::Rake,
            reversed: false,
            state: NodeState::New,
            normalize_flag: NormalizeFlag::None,
            boundary: [None, Some(bv)],
            left: Some(left),
            right: Some(right),
            up: Up::Root,
            info: ClusterInfo::new(),
            extras: None,
        }
    }

    pub(crate) fn new_hard_rake(
        generation: u32,
        left: ClusterRef,
        right: ClusterRef,
        bu: VertexId,
        bv: VertexId,
    ) -> Self {
        Self {
            generation,
            kind: NodeKind::HardRake,
            reversed: false,
            state: NodeState::New,
            normalize_flag: NormalizeFlag::None,
            boundary: [Some(bu), Some(bv)],
            left: Some(left),
            right: Some(right),
            up: Up::Root,
            info: ClusterInfo::new(),
            extras: None,
        }
    }
}

impl<C> ClusterNode<C> {
    pub(crate) fn is_top(&self) -> bool {
        self.up.is_root()
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.state == NodeState::Dirty
    }

    pub(crate) fn is_new(&self) -> bool {
        self.state == NodeState::New
    }

    pub(crate) fn is_obsolete(&self) -> bool {
        self.state == NodeState::Obsolete
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.state == NodeState::Clean
    }

    /// The path/point kind exposed to the listener (§6 "Cluster kinds").
    pub(crate) fn listener_kind(&self) -> crate::listener::ClusterKind {
        match self.kind {
            NodeKind::Base | NodeKind::Compress | NodeKind::HardRake => {
                crate::listener::ClusterKind::Path
            }
            NodeKind::Rake => crate::listener::ClusterKind::Point,
        }
    }

    /// Right boundary; always meaningful.
    pub(crate) fn bv(&self) -> VertexId {
        self.boundary[1].expect("cluster node missing bv")
    }

    /// Left boundary; `None` for pure RAKE nodes (§3 "Boundaries").
    pub(crate) fn bu(&self) -> Option<VertexId> {
        self.boundary[0]
    }

    /// Flip the reverse bit (§4.1 "reverse").
    pub(crate) fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Push the reverse bit down into this node's own boundary/foster
    /// bookkeeping (§3 "Reverse bit", §4.1 "normalize"). Does not recurse
    /// into children; the caller (forest-level `normalize`) propagates the
    /// flip onto `left`/`right` (and, for HARD_RAKE, only proper children).
    pub(crate) fn apply_local_reverse(&mut self) {
        if !self.reversed {
            return;
        }
        self.reversed = false;
        std::mem::swap(&mut self.left, &mut self.right);
        if self.kind != NodeKind::Rake {
            self.boundary.swap(0, 1);
        }
        if let Some(extras) = &mut self.extras {
            std::mem::swap(&mut extras.left_foster, &mut extras.right_foster);
            std::mem::swap(&mut extras.left_composed, &mut extras.right_composed);
        }
    }
}
