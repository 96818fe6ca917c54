// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Domain errors surfaced by [`crate::TopForest`].
//!
//! These are the only failure modes a caller can hit through the public
//! API (§7 "Error taxonomy"). Internal invariant violations are not
//! represented here — they are programmer errors and fail fast via
//! `debug_assert!`/`panic!`, per the Open Question resolution in
//! `SPEC_FULL.md` §9.

use crate::ids::VertexId;
use thiserror::Error;

/// Failure modes for [`crate::TopForest`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopTreeError {
    /// `link(v, v, ..)`: a vertex cannot be linked to itself.
    #[error("cannot link vertex {0} to itself")]
    SelfLoop(VertexId),

    /// The requested link would close a cycle; `u` and `v` are already connected.
    #[error("{0} and {1} are already connected")]
    AlreadyConnected(VertexId, VertexId),

    /// `cut(u, v)` was requested but no edge exists between `u` and `v`.
    #[error("no edge between {0} and {1}")]
    NoSuchEdge(VertexId, VertexId),

    /// A link hint vertex is not adjacent to its anchor.
    #[error("hint vertex {hint} is not adjacent to anchor {anchor}")]
    InvalidHint {
        /// The vertex whose adjacency to `anchor` was assumed.
        hint: VertexId,
        /// The vertex the hint was supposed to be adjacent to.
        anchor: VertexId,
    },

    /// A [`crate::ClusterInfo`] was read or written outside the window in
    /// which the engine marks it `localAccessAllowed` (mid-callback, or as
    /// the most recently exposed top cluster).
    #[error("cluster data accessed outside the allowed window")]
    AccessDenied,
}
