// eonsim: Discrete-event simulator for elastic optical networks with p-cycle protection
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Path computation on the physical topology.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::{algo::astar, graphmap::UnGraphMap, visit::EdgeRef};

use crate::{
    topology::PhysicalTopology,
    types::{LinkId, NodeId},
};

/// Weighted view of the physical topology.
pub type WeightedGraph = UnGraphMap<NodeId, f64>;

/// Shortest path between `src` and `dst`, and its cost.
pub fn shortest_path(graph: &WeightedGraph, src: NodeId, dst: NodeId) -> Option<(f64, Vec<NodeId>)> {
    if !graph.contains_node(src) || !graph.contains_node(dst) {
        return None;
    }
    astar(graph, src, |n| n == dst, |e| *e.weight(), |_| 0.0)
}

/// Cost of a path. Hops that are not in the graph are ignored.
pub fn path_cost(graph: &WeightedGraph, path: &[NodeId]) -> f64 {
    path.windows(2)
        .filter_map(|w| graph.edge_weight(w[0], w[1]))
        .sum()
}

/// Two edge-disjoint paths: first the shortest path, and then the shortest path on the graph where
/// all links of the first path are removed. Returns `None` if either path does not exist.
pub fn edge_disjoint_pair(
    pt: &PhysicalTopology,
    src: NodeId,
    dst: NodeId,
) -> Option<(Vec<NodeId>, Vec<NodeId>)> {
    let mut graph = pt.weighted_view();
    let (_, first) = shortest_path(&graph, src, dst)?;
    for hop in first.windows(2) {
        graph.remove_edge(hop[0], hop[1]);
    }
    let (_, second) = shortest_path(&graph, src, dst)?;
    Some((first, second))
}

/// Path with the fewest hops from `src` to `dst`, only using links for which `usable` returns
/// true. Neighbors are explored in ascending order of their id, so the result is deterministic.
pub fn bfs_path<F>(pt: &PhysicalTopology, src: NodeId, dst: NodeId, usable: F) -> Option<Vec<NodeId>>
where
    F: Fn(LinkId) -> bool,
{
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut visited: HashSet<NodeId> = HashSet::from([src]);
    let mut queue: VecDeque<NodeId> = VecDeque::from([src]);

    while let Some(node) = queue.pop_front() {
        if node == dst {
            let mut path = vec![dst];
            let mut cur = dst;
            while let Some(p) = prev.get(&cur) {
                path.push(*p);
                cur = *p;
            }
            path.reverse();
            return Some(path);
        }
        for (next, link) in pt.adjacent(node) {
            if visited.contains(&next) || !usable(link) {
                continue;
            }
            visited.insert(next);
            prev.insert(next, node);
            queue.push_back(next);
        }
    }
    None
}

/// Up to `k` loopless paths from `src` to `dst` with increasing cost (Yen's algorithm). Paths of
/// equal cost are ordered by their number of hops, and then by their node sequence.
pub fn k_shortest_paths(graph: &WeightedGraph, src: NodeId, dst: NodeId, k: usize) -> Vec<Vec<NodeId>> {
    let mut result: Vec<Vec<NodeId>> = Vec::new();
    if k == 0 {
        return result;
    }
    let Some((_, first)) = shortest_path(graph, src, dst) else {
        return result;
    };
    result.push(first);
    let mut candidates: Vec<(f64, Vec<NodeId>)> = Vec::new();

    while result.len() < k {
        let last = result[result.len() - 1].clone();
        for i in 0..last.len().saturating_sub(1) {
            let spur = last[i];
            let root = &last[..=i];

            let mut g = graph.clone();
            for p in &result {
                if p.len() > i + 1 && &p[..=i] == root {
                    g.remove_edge(p[i], p[i + 1]);
                }
            }
            for n in &root[..i] {
                g.remove_node(*n);
            }

            if let Some((_, spur_path)) = shortest_path(&g, spur, dst) {
                let mut path = root[..i].to_vec();
                path.extend(spur_path);
                if !result.contains(&path) && !candidates.iter().any(|(_, c)| *c == path) {
                    candidates.push((path_cost(graph, &path), path));
                }
            }
        }

        let best = candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.0.total_cmp(&b.0)
                    .then(a.1.len().cmp(&b.1.len()))
                    .then(a.1.cmp(&b.1))
            })
            .map(|(i, _)| i);
        match best {
            Some(i) => result.push(candidates.swap_remove(i).1),
            None => break,
        }
    }
    result
}
