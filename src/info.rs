// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`ClusterInfo`]: the client-owned associative value attached to every cluster.

use core::cell::Cell;

use crate::error::TopTreeError;

/// Wrapper owning a client-supplied associative value for one cluster.
///
/// Gates reads/writes behind a `localAccessAllowed` flag (§4.8 "Local
/// access") that the engine sets only for the duration of a listener
/// callback invocation, or while the cluster is the most recently exposed
/// top cluster (§6 "Cluster data access"). Outside that window, `get`/
/// `get_mut` return [`TopTreeError::AccessDenied`] — this is also how the
/// engine defensively detects re-entrant calls from inside a callback
/// (§5 "Re-entry during a client callback is forbidden").
#[derive(Debug)]
pub struct ClusterInfo<C> {
    value: C,
    access_allowed: Cell<bool>,
}

impl<C: Default> ClusterInfo<C> {
    pub(crate) fn new() -> Self {
        Self {
            value: C::default(),
            access_allowed: Cell::new(false),
        }
    }
}

impl<C> ClusterInfo<C> {
    /// Read the client value. Fails unless this cluster is currently
    /// mid-callback or is the top cluster of the most recent `expose`.
    pub fn get(&self) -> Result<&C, TopTreeError> {
        if self.access_allowed.get() {
            Ok(&self.value)
        } else {
            Err(TopTreeError::AccessDenied)
        }
    }

    /// Mutably access the client value, under the same access rule as [`Self::get`].
    pub fn get_mut(&mut self) -> Result<&mut C, TopTreeError> {
        if self.access_allowed.get() {
            Ok(&mut self.value)
        } else {
            Err(TopTreeError::AccessDenied)
        }
    }

    pub(crate) fn allow(&self) {
        self.access_allowed.set(true);
    }

    pub(crate) fn deny(&self) {
        self.access_allowed.set(false);
    }
}
