// Copyright 2026 the Toptree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests checking `TopForest`'s connectivity bookkeeping against a
//! plain union-find + edge-set oracle, grounded on the pack's own use of
//! `proptest` for randomized sequences of stateful operations.

use std::collections::HashSet;

use proptest::prelude::*;

use toptree::{ClusterInfo, ClusterKind, Connection, Listener, SelectChild, TopForest};

const N: usize = 8;

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

#[derive(Debug, Clone, Copy)]
enum Op {
    Link(usize, usize),
    Cut(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..N, 0..N).prop_map(|(a, b)| Op::Link(a, b)),
        (0..N, 0..N).prop_map(|(a, b)| Op::Cut(a, b)),
    ]
}

fn find(parent: &mut [usize], x: usize) -> usize {
    if parent[x] != x {
        parent[x] = find(parent, parent[x]);
    }
    parent[x]
}

/// Rebuilds the oracle's union-find from the live edge set. A `cut` can
/// split a tree at any edge along its path, not just at the union's own
/// root, so path-compressing the previous `parent` array in place cannot
/// reflect a cut correctly; starting over from `edges` each time is the
/// simplest oracle that stays right.
fn rebuild(edges: &HashSet<(usize, usize)>) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..N).collect();
    for &(x, y) in edges {
        let rx = find(&mut parent, x);
        let ry = find(&mut parent, y);
        if rx != ry {
            parent[rx] = ry;
        }
    }
    parent
}

proptest! {
    #[test]
    fn matches_union_find_oracle(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let mut forest = TopForest::new(NullListener);
        let ids: Vec<_> = (0..N as u32).map(|i| forest.create_vertex(i)).collect();
        let mut edges: HashSet<(usize, usize)> = HashSet::new();
        let mut parent = rebuild(&edges);

        for op in ops {
            match op {
                Op::Link(a, b) => {
                    let key = (a.min(b), a.max(b));
                    let result = forest.link(ids[a], ids[b]);
                    if a == b {
                        prop_assert!(result.is_err());
                        continue;
                    }
                    let connected = find(&mut parent, a) == find(&mut parent, b);
                    if connected {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        edges.insert(key);
                        parent = rebuild(&edges);
                    }
                }
                Op::Cut(a, b) => {
                    let key = (a.min(b), a.max(b));
                    let result = forest.cut(ids[a], ids[b]);
                    if edges.contains(&key) {
                        prop_assert!(result.is_ok());
                        edges.remove(&key);
                        parent = rebuild(&edges);
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
            }

            prop_assert_eq!(forest.num_edges(), edges.len());
            let num_components = (0..N).map(|i| find(&mut parent, i)).collect::<HashSet<_>>().len();
            prop_assert_eq!(forest.num_components(), num_components);

            for i in 0..N {
                for j in (i + 1)..N {
                    let same = find(&mut parent, i) == find(&mut parent, j);
                    let top_i = forest.top_cluster(ids[i]);
                    let top_j = forest.top_cluster(ids[j]);
                    let connected = top_i.is_some() && top_i == top_j;
                    prop_assert_eq!(same, connected, "connectivity mismatch between vertex {} and {}", i, j);
                }
            }

            for i in 0..N {
                let expected_degree = edges.iter().filter(|&&(x, y)| x == i || y == i).count() as u32;
                prop_assert_eq!(forest.degree(ids[i]), expected_degree);
            }
        }
    }
}
