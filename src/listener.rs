// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The client listener contract (§2 "Listener contract", §4.8, §4.9).
//!
//! The engine never interprets the client's associative cluster data; it
//! only calls back into a `Listener` at the moments described in §4.8 to
//! let the client keep that data consistent as the tree restructures.

use crate::info::ClusterInfo;

/// Whether a cluster represents a path between two boundary vertices or a
/// single point (§6 "Cluster kinds").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClusterKind {
    /// A path cluster: a compress or base cluster, with two distinct boundary vertices.
    Path,
    /// A point cluster: a rake (or hard-rake, when acting as one) cluster sharing a single boundary.
    Point,
}

/// How two child clusters relate to the cluster being built from them
/// (§4.8 "connection", §6 "Connection kinds").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Connection {
    /// Both children, and the new cluster, are path clusters (a compress's final join/split).
    PathAndPath,
    /// The left child is a path cluster, the right is a point cluster.
    PathAndPoint,
    /// The left child is a point cluster, the right is a path cluster.
    PointAndPath,
    /// Both children are point clusters (a rake or hard-rake join/split).
    PointAndPoint,
    /// One-vertex-expose: the left point cluster sits over the right point cluster.
    LPointOverRPoint,
    /// One-vertex-expose: the right point cluster sits over the left point cluster.
    RPointOverLPoint,
    /// One-vertex-expose: left and right point clusters are siblings under the exposed vertex.
    LPointAndRPoint,
}

/// What a listener's [`Listener::select_question`] may answer: which child to descend into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectChild {
    /// Descend into the left (or first) child.
    Left,
    /// Descend into the right (or second) child.
    Right,
}

/// Client callbacks invoked while the engine restructures the forest.
///
/// `V` is the opaque per-vertex payload type, `C` is the per-cluster
/// associative value type owned by each [`ClusterInfo`].
///
/// Every method here runs with the cluster(s) it is passed marked
/// `localAccessAllowed` for the duration of the call (§4.8 "Local access");
/// reads/writes through [`ClusterInfo::get`]/[`ClusterInfo::get_mut`]
/// outside of a callback fail with [`crate::TopTreeError::AccessDenied`].
pub trait Listener<V, C> {
    /// A brand-new cluster `c` of the given kind has just been composed from
    /// scratch (only for base clusters created by `link`; composed clusters
    /// get `join` instead). Populate `c`'s data.
    fn create(&mut self, c: &mut ClusterInfo<C>, kind: ClusterKind);

    /// Cluster `c` of the given kind is about to be destroyed (its data will
    /// not be read again).
    fn destroy(&mut self, c: &ClusterInfo<C>, kind: ClusterKind);

    /// Children `a` and `b` have just been composed into `parent` with the
    /// given `connection`. Populate `parent`'s data from `a` and `b`.
    fn join(
        &mut self,
        parent: &mut ClusterInfo<C>,
        a: &ClusterInfo<C>,
        b: &ClusterInfo<C>,
        connection: Connection,
    );

    /// `parent` is about to be decomposed back into `a` and `b` with the
    /// given `connection`. Distribute `parent`'s data into `a` and `b` as
    /// needed before `parent` is discarded.
    fn split(
        &mut self,
        a: &mut ClusterInfo<C>,
        b: &mut ClusterInfo<C>,
        parent: &ClusterInfo<C>,
        connection: Connection,
    );

    /// Non-local search (§4.9): given the two children of the current
    /// cluster under examination, choose which one the search continues
    /// into.
    fn select_question(
        &mut self,
        a: &ClusterInfo<C>,
        b: &ClusterInfo<C>,
        connection: Connection,
    ) -> SelectChild;

    /// Called once when a vertex is created, to seed its payload's initial
    /// presentation to the listener. The default implementation does
    /// nothing; most listeners only care about cluster data.
    #[allow(unused_variables)]
    fn vertex_created(&mut self, v: &V) {}
}
