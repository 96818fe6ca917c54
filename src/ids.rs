// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational identifiers for vertices and cluster nodes.
//!
//! Both arenas in this crate (the vertex table and the cluster-node table)
//! reuse freed slots and bump a per-slot generation counter on reuse, the
//! same scheme `understory_box_tree::NodeId` uses: a handle is only "live"
//! if its stored generation matches the slot's current generation. This
//! turns use-after-free into a cheap, safe `None`/`is_alive() == false`
//! instead of an out-of-bounds access or a dangling reference.

use core::fmt;

/// Identifier for a vertex created by [`crate::TopForest::create_vertex`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexId(pub(crate) u32, pub(crate) u32);

impl VertexId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({}#{})", self.0, self.1)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifier for a [`crate::node::ClusterNode`] slot in the engine's arena.
///
/// Doubles as the public `ClusterHandle` of §6: the engine is the only
/// source of values of this type, and a stale one (pointing at a slot that
/// has since been recycled) is detected by generation mismatch rather than
/// by Rust's ownership system. Used internally to thread `parent`/`link`
/// back-edges between nodes without taking ownership (§3 "Ownership").
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClusterRef(pub(crate) u32, pub(crate) u32);

impl ClusterRef {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterRef({}#{})", self.0, self.1)
    }
}

/// Public alias for [`ClusterRef`] as returned from [`crate::TopForest::top_cluster`].
pub type ClusterHandle = ClusterRef;
