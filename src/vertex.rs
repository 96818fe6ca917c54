// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`VertexRecord`]: the identity of one tree vertex (§3).

use crate::ids::ClusterRef;

/// A tree vertex: client payload, degree, and a non-owning handle into the
/// topmost non-rake cluster currently covering it (§3 "VertexRecord owns").
#[derive(Debug)]
pub struct VertexRecord<V> {
    pub(crate) generation: u32,
    pub(crate) payload: V,
    pub(crate) degree: u32,
    /// Updated on every `bind_vertices`/`recompute_vertices` call (§4.1).
    pub(crate) cluster: Option<ClusterRef>,
}

impl<V> VertexRecord<V> {
    pub(crate) fn new(generation: u32, payload: V) -> Self {
        Self {
            generation,
            payload,
            degree: 0,
            cluster: None,
        }
    }
}
