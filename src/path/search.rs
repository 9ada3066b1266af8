use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::roadmap::RoadmapGraph;

/// Priority queue entry; the heap pops the lowest cost first and breaks
/// ties by the lower vertex index.
#[derive(Clone, Copy, Debug)]
struct State {
    cost: f64,
    vertex: usize,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cheapest route found by [`shortest_route`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Route {
    /// Vertex where the route enters the graph.
    pub source: usize,
    /// Edges traversed, each with the vertex it leads to.
    pub steps: Vec<(usize, usize)>,
    /// Total cost including the entry and exit costs.
    pub cost: f64,
}

impl Route {
    pub(crate) fn last_vertex(&self) -> usize {
        self.steps.last().map_or(self.source, |&(_, v)| v)
    }
}

/// Multi-source Dijkstra search.
///
/// `sources` and `targets` pair vertices with the cost of entering or
/// leaving the graph there; `weight` gives the cost of each edge. Returns
/// the route minimising entry + path + exit cost, or `None` if no target is
/// reachable.
pub(crate) fn shortest_route(
    graph: &RoadmapGraph,
    weight: &[f64],
    sources: &[(usize, f64)],
    targets: &[(usize, f64)],
) -> Option<Route> {
    let n = graph.num_vertices();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<(usize, usize)>> = vec![None; n];
    let mut origin = vec![usize::MAX; n];
    let mut exit = vec![f64::INFINITY; n];
    for &(v, c) in targets {
        exit[v] = exit[v].min(c);
    }

    let mut heap = BinaryHeap::new();
    for &(v, c) in sources {
        if c < dist[v] {
            dist[v] = c;
            origin[v] = v;
            heap.push(State { cost: c, vertex: v });
        }
    }

    let mut best: Option<(f64, usize)> = None;
    while let Some(State { cost, vertex }) = heap.pop() {
        if cost > dist[vertex] {
            continue;
        }
        if best.is_some_and(|(b, _)| cost >= b) {
            break;
        }
        let total = cost + exit[vertex];
        if best.is_none_or(|(b, _)| total < b) && total.is_finite() {
            best = Some((total, vertex));
        }

        for &(next, edge) in graph.neighbours(vertex) {
            let next_cost = cost + weight[edge];
            if next_cost < dist[next] {
                dist[next] = next_cost;
                prev[next] = Some((vertex, edge));
                origin[next] = origin[vertex];
                heap.push(State {
                    cost: next_cost,
                    vertex: next,
                });
            }
        }
    }

    let (cost, end) = best?;
    let mut steps = Vec::new();
    let mut current = end;
    while let Some((p, edge)) = prev[current] {
        steps.push((edge, current));
        current = p;
    }
    steps.reverse();
    Some(Route {
        source: origin[end],
        steps,
        cost,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::roadmap::RoadmapEdge;

    fn graph(edges: &[(usize, usize)]) -> RoadmapGraph {
        let n = edges.iter().map(|&(a, b)| a.max(b)).max().unwrap_or(0) + 1;
        #[allow(clippy::cast_precision_loss)]
        let vertices: Vec<Point2> = (0..n).map(|i| Point2::new(i as f64, 0.0)).collect();
        let edges = edges
            .iter()
            .map(|&(from, to)| RoadmapEdge {
                from,
                to,
                points: vec![vertices[from], vertices[to]],
                length: 1.0,
                clearance: 1.0,
            })
            .collect();
        RoadmapGraph::new(vertices, edges)
    }

    #[test]
    fn picks_the_cheaper_branch() {
        // 0 -> 1 -> 3 costs 2, 0 -> 2 -> 3 costs 3.
        let g = graph(&[(0, 1), (1, 3), (0, 2), (2, 3)]);
        let route = shortest_route(&g, &[1.0, 1.0, 1.0, 2.0], &[(0, 0.0)], &[(3, 0.0)]).unwrap();
        assert_eq!(route.source, 0);
        assert_eq!(route.steps, vec![(0, 1), (1, 3)]);
        assert!((route.cost - 2.0).abs() < 1e-12);
    }

    #[test]
    fn entry_and_exit_costs_count() {
        let g = graph(&[(0, 1), (1, 2)]);
        let route = shortest_route(
            &g,
            &[1.0, 1.0],
            &[(0, 5.0), (1, 0.5)],
            &[(2, 0.25), (1, 10.0)],
        )
        .unwrap();
        assert_eq!(route.source, 1);
        assert_eq!(route.last_vertex(), 2);
        assert!((route.cost - 1.75).abs() < 1e-12);
    }

    #[test]
    fn equal_costs_resolve_deterministically() {
        let g = graph(&[(0, 1), (1, 3), (0, 2), (2, 3)]);
        let w = [1.0; 4];
        let a = shortest_route(&g, &w, &[(0, 0.0)], &[(3, 0.0)]).unwrap();
        let b = shortest_route(&g, &w, &[(0, 0.0)], &[(3, 0.0)]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.steps[0], (0, 1));
    }

    #[test]
    fn disconnected_target_is_unreachable() {
        let g = graph(&[(0, 1), (2, 3)]);
        assert!(shortest_route(&g, &[1.0, 1.0], &[(0, 0.0)], &[(3, 0.0)]).is_none());
    }
}
