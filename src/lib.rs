// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A self-adjusting top tree over Sleator-Tarjan ST-trees.
//!
//! A [`TopForest`] maintains a forest of unrooted, undirected trees under
//! [`TopForest::link`] and [`TopForest::cut`], exposing at every point a
//! hierarchical cluster decomposition whose associative per-cluster data is
//! entirely client-maintained through the [`Listener`] callback trait. The
//! underlying splay restructuring gives `link`/`cut`/`expose`/`select` their
//! `O(log n)` amortized bound, matching the Sleator-Tarjan analysis; the one
//! exception is `cut`'s direct edge-existence lookup (`find_base_edge`),
//! which walks the full cluster in `O(size)` (see `DESIGN.md`). The forest
//! itself never looks at the cluster data it carries, only at cluster
//! *shape* (§2 "Separation of concerns").
//!
//! ```
//! use toptree::{ClusterInfo, ClusterKind, Connection, Listener, SelectChild, TopForest};
//!
//! #[derive(Default)]
//! struct Size(u32);
//!
//! struct SizeListener;
//!
//! impl Listener<(), Size> for SizeListener {
//!     fn create(&mut self, c: &mut ClusterInfo<Size>, kind: ClusterKind) {
//!         if kind == ClusterKind::Path {
//!             c.get_mut().unwrap().0 = 1;
//!         }
//!     }
//!
//!     fn destroy(&mut self, _c: &ClusterInfo<Size>, _kind: ClusterKind) {}
//!
//!     fn join(
//!         &mut self,
//!         parent: &mut ClusterInfo<Size>,
//!         a: &ClusterInfo<Size>,
//!         b: &ClusterInfo<Size>,
//!         _connection: Connection,
//!     ) {
//!         parent.get_mut().unwrap().0 = a.get().unwrap().0 + b.get().unwrap().0;
//!     }
//!
//!     fn split(
//!         &mut self,
//!         _a: &mut ClusterInfo<Size>,
//!         _b: &mut ClusterInfo<Size>,
//!         _parent: &ClusterInfo<Size>,
//!         _connection: Connection,
//!     ) {
//!     }
//!
//!     fn select_question(
//!         &mut self,
//!         _a: &ClusterInfo<Size>,
//!         _b: &ClusterInfo<Size>,
//!         _connection: Connection,
//!     ) -> SelectChild {
//!         SelectChild::Left
//!     }
//! }
//!
//! let mut forest = TopForest::new(SizeListener);
//! let a = forest.create_vertex(());
//! let b = forest.create_vertex(());
//! forest.link(a, b).unwrap();
//! assert_eq!(forest.num_edges(), 1);
//! ```

mod error;
mod forest;
mod ids;
mod info;
mod listener;
mod node;
mod vertex;

pub use error::TopTreeError;
pub use forest::{ExposeOneResult, ExposeTwoResult, TopForest};
pub use ids::{ClusterHandle, ClusterRef, VertexId};
pub use info::ClusterInfo;
pub use listener::{ClusterKind, Connection, Listener, SelectChild};
