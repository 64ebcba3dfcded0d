//! Single-pair Dijkstra over node positions.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::graph::{StationEdge, StationGraph};

/// Cheapest path from `origin` to `destination` as node positions.
///
/// `weight` gives the cost of taking `edge` into node `target` and must be
/// non-negative. Labels with equal cost pop in node-index order and a
/// predecessor is replaced only on strict improvement, so results are
/// deterministic. Returns `None` if the destination is unreachable.
pub(crate) fn shortest_path<W>(
    graph: &StationGraph,
    origin: usize,
    destination: usize,
    weight: W,
) -> Option<Vec<usize>>
where
    W: Fn(&StationEdge, usize) -> f64,
{
    if origin == destination {
        return Some(vec![origin]);
    }

    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    dist[origin] = 0.0;
    heap.push(Reverse((OrderedFloat(0.0), origin)));

    while let Some(Reverse((OrderedFloat(cost), node))) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;
        if node == destination {
            break;
        }

        for link in graph.outgoing(node) {
            if settled[link.target] {
                continue;
            }
            let candidate = cost + weight(graph.edge(link.edge), link.target);
            if candidate < dist[link.target] {
                dist[link.target] = candidate;
                prev[link.target] = Some(node);
                heap.push(Reverse((OrderedFloat(candidate), link.target)));
            }
        }
    }

    if !settled[destination] {
        return None;
    }

    let mut path = vec![destination];
    let mut current = destination;
    while let Some(p) = prev[current] {
        path.push(p);
        current = p;
    }
    path.reverse();
    Some(path)
}
