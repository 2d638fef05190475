// SPDX-License-Identifier: MIT

//! Layered left-to-right auto layout
//!
//! Positions come from topology alone:
//!   1. Rank = longest-path distance from a source (Kahn order)
//!   2. Ordering within ranks by iterated barycenter sweeps
//!   3. Fixed-pitch coordinates, each rank centered on the tallest one

use std::collections::HashMap;

use super::graph::{GraphModel, NodeId, Point};
use crate::error::EditorError;

/// Node footprint and gaps used by the layout
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSpacing {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between ranks
    pub rank_sep: f64,
    /// Vertical gap between nodes in the same rank
    pub node_sep: f64,
    /// Offset of the first rank/row from the model origin
    pub margin: f64,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 120.0,
            rank_sep: 200.0,
            node_sep: 100.0,
            margin: 50.0,
        }
    }
}

const MAX_SWEEPS: usize = 8;

/// Index-based view of the graph for the layout phases
struct LayoutGraph {
    ids: Vec<NodeId>,
    adj: Vec<Vec<usize>>,
    rev: Vec<Vec<usize>>,
}

impl LayoutGraph {
    fn from_model(graph: &GraphModel) -> Self {
        let ids: Vec<NodeId> = graph.nodes().map(|n| n.id.clone()).collect();
        let index: HashMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mut adj = vec![Vec::new(); ids.len()];
        let mut rev = vec![Vec::new(); ids.len()];
        for conn in graph.connections() {
            if let (Some(&u), Some(&v)) =
                (index.get(conn.from.as_str()), index.get(conn.to.as_str()))
            {
                adj[u].push(v);
                rev[v].push(u);
            }
        }
        Self { ids, adj, rev }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Computes non-overlapping positions from graph topology
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    spacing: LayoutSpacing,
}

impl LayoutEngine {
    pub fn new(spacing: LayoutSpacing) -> Self {
        Self { spacing }
    }

    pub fn spacing(&self) -> &LayoutSpacing {
        &self.spacing
    }

    /// Position for every node, in creation order.
    ///
    /// An empty graph is an error so callers can tell the user.
    pub fn compute(&self, graph: &GraphModel) -> Result<Vec<(NodeId, Point)>, EditorError> {
        if graph.is_empty() {
            return Err(EditorError::EmptyCanvas);
        }
        let lg = LayoutGraph::from_model(graph);
        let ranks = assign_ranks(&lg);
        let mut order = build_rank_buckets(&ranks);
        minimize_crossings(&mut order, &lg);
        let points = self.assign_coordinates(&order, lg.len());
        Ok(lg.ids.into_iter().zip(points).collect())
    }

    /// Compute and write positions back into the graph
    pub fn apply(&self, graph: &mut GraphModel) -> Result<usize, EditorError> {
        let positions = self.compute(graph)?;
        let count = positions.len();
        for (id, point) in positions {
            graph.move_node(&id, point);
        }
        log::info!("Auto layout placed {} nodes", count);
        Ok(count)
    }

    fn assign_coordinates(&self, order: &[Vec<usize>], n: usize) -> Vec<Point> {
        let s = &self.spacing;
        let rank_step = s.node_width + s.rank_sep;
        let row_step = s.node_height + s.node_sep;
        let tallest = order.iter().map(Vec::len).max().unwrap_or(0) as f64;

        let mut points = vec![Point::default(); n];
        for (r, nodes) in order.iter().enumerate() {
            let shift = (tallest - nodes.len() as f64) * row_step / 2.0;
            for (row, &v) in nodes.iter().enumerate() {
                points[v] = Point::new(
                    s.margin + r as f64 * rank_step,
                    s.margin + shift + row as f64 * row_step,
                );
            }
        }
        points
    }
}

/// Longest-path layering. Nodes stuck on a cycle go one rank past the rest.
fn assign_ranks(graph: &LayoutGraph) -> Vec<usize> {
    let n = graph.len();
    let mut in_degree: Vec<usize> = graph.rev.iter().map(Vec::len).collect();
    let mut queue: Vec<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    let mut ranks = vec![0usize; n];
    let mut visited = vec![false; n];

    let mut head = 0;
    while head < queue.len() {
        let u = queue[head];
        head += 1;
        visited[u] = true;
        for &v in &graph.adj[u] {
            ranks[v] = ranks[v].max(ranks[u] + 1);
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                queue.push(v);
            }
        }
    }

    if queue.len() < n {
        let max_rank = (0..n)
            .filter(|&v| visited[v])
            .map(|v| ranks[v])
            .max()
            .map_or(0, |r| r + 1);
        for v in (0..n).filter(|&v| !visited[v]) {
            ranks[v] = max_rank;
        }
    }
    ranks
}

/// `buckets[r]` lists the nodes of rank `r` in creation order
fn build_rank_buckets(ranks: &[usize]) -> Vec<Vec<usize>> {
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    let mut buckets = vec![Vec::new(); max_rank + 1];
    for (v, &r) in ranks.iter().enumerate() {
        buckets[r].push(v);
    }
    buckets
}

fn barycenter(reference: &[usize], neighbors: &[usize]) -> f64 {
    let positions: Vec<f64> = neighbors
        .iter()
        .filter_map(|nb| reference.iter().position(|x| x == nb))
        .map(|p| p as f64)
        .collect();
    if positions.is_empty() {
        f64::MAX
    } else {
        positions.iter().sum::<f64>() / positions.len() as f64
    }
}

fn sort_rank(rank: &mut Vec<usize>, reference: &[usize], neighbors: &[Vec<usize>]) {
    let current = rank.clone();
    let mut scored: Vec<(usize, f64, usize)> = current
        .iter()
        .enumerate()
        .map(|(pos, &v)| (v, barycenter(reference, &neighbors[v]), pos))
        .collect();
    // Ties keep their current relative order
    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });
    *rank = scored.into_iter().map(|(v, _, _)| v).collect();
}

fn count_crossings(upper: &[usize], lower: &[usize], graph: &LayoutGraph) -> usize {
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for (i, &u) in upper.iter().enumerate() {
        for &v in &graph.adj[u] {
            if let Some(j) = lower.iter().position(|&x| x == v) {
                edges.push((i, j));
            }
        }
    }
    let mut crossings = 0;
    for (k, &(a1, b1)) in edges.iter().enumerate() {
        for &(a2, b2) in &edges[k + 1..] {
            if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

fn total_crossings(order: &[Vec<usize>], graph: &LayoutGraph) -> usize {
    order
        .windows(2)
        .map(|pair| count_crossings(&pair[0], &pair[1], graph))
        .sum()
}

/// Alternate forward/backward barycenter sweeps, keeping the best ordering
fn minimize_crossings(order: &mut Vec<Vec<usize>>, graph: &LayoutGraph) {
    if order.len() <= 1 {
        return;
    }
    let mut best = total_crossings(order, graph);
    let mut best_order = order.clone();

    for _ in 0..MAX_SWEEPS {
        if best == 0 {
            break;
        }
        for r in 1..order.len() {
            let (before, after) = order.split_at_mut(r);
            sort_rank(&mut after[0], &before[r - 1], &graph.rev);
        }
        for r in (0..order.len() - 1).rev() {
            let (before, after) = order.split_at_mut(r + 1);
            sort_rank(&mut before[r], &after[0], &graph.adj);
        }
        let crossings = total_crossings(order, graph);
        if crossings < best {
            best = crossings;
            best_order = order.clone();
        } else {
            break;
        }
    }
    *order = best_order;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::graph::NodeKind;

    fn positions(graph: &GraphModel) -> HashMap<NodeId, Point> {
        LayoutEngine::default()
            .compute(graph)
            .unwrap()
            .into_iter()
            .collect()
    }

    fn overlaps(a: Point, b: Point, s: &LayoutSpacing) -> bool {
        (a.x - b.x).abs() < s.node_width && (a.y - b.y).abs() < s.node_height
    }

    #[test]
    fn test_empty_graph_reports_error() {
        let result = LayoutEngine::default().compute(&GraphModel::new());
        assert!(matches!(result, Err(EditorError::EmptyCanvas)));
    }

    #[test]
    fn test_chain_laid_out_left_to_right() {
        let mut graph = GraphModel::new();
        let i = graph.add_node(NodeKind::Input, Point::new(900.0, 900.0), None);
        let a = graph.add_node(NodeKind::Agent, Point::new(0.0, 0.0), Some("a"));
        let o = graph.add_node(NodeKind::Output, Point::new(-50.0, 3.0), None);
        graph.add_connection(&i, &a);
        graph.add_connection(&a, &o);

        let pos = positions(&graph);
        assert_eq!(pos[&i], Point::new(50.0, 50.0));
        assert_eq!(pos[&a], Point::new(450.0, 50.0));
        assert_eq!(pos[&o], Point::new(850.0, 50.0));
    }

    #[test]
    fn test_rank_is_longest_path() {
        let mut graph = GraphModel::new();
        let i = graph.add_node(NodeKind::Input, Point::default(), None);
        let a = graph.add_node(NodeKind::Agent, Point::default(), Some("a"));
        let b = graph.add_node(NodeKind::Agent, Point::default(), Some("b"));
        let o = graph.add_node(NodeKind::Output, Point::default(), None);
        graph.add_connection(&i, &a);
        graph.add_connection(&a, &b);
        graph.add_connection(&b, &o);
        graph.add_connection(&i, &o);

        let pos = positions(&graph);
        assert!(pos[&o].x > pos[&b].x);
        assert_eq!(pos[&o].x, 50.0 + 3.0 * 400.0);
    }

    #[test]
    fn test_fan_out_does_not_overlap() {
        let mut graph = GraphModel::new();
        let i = graph.add_node(NodeKind::Input, Point::default(), None);
        let agents: Vec<NodeId> = (0..4)
            .map(|k| {
                let name = format!("a{}", k);
                graph.add_node(NodeKind::Agent, Point::default(), Some(&name))
            })
            .collect();
        let o = graph.add_node(NodeKind::Output, Point::default(), None);
        for a in &agents {
            graph.add_connection(&i, a);
            graph.add_connection(a, &o);
        }

        let spacing = LayoutSpacing::default();
        let pos = positions(&graph);
        let all: Vec<Point> = pos.values().copied().collect();
        for (k, p) in all.iter().enumerate() {
            for q in &all[k + 1..] {
                assert!(!overlaps(*p, *q, &spacing));
            }
        }
        // single-node ranks are centered on the four-node rank
        let mid = (pos[&agents[0]].y + pos[&agents[3]].y) / 2.0;
        assert_eq!(pos[&i].y, mid);
        assert_eq!(pos[&o].y, mid);
    }

    #[test]
    fn test_barycenter_untangles_crossing() {
        let mut graph = GraphModel::new();
        let a = graph.add_node(NodeKind::Input, Point::default(), None);
        let b = graph.add_node(NodeKind::Input, Point::default(), None);
        let c = graph.add_node(NodeKind::Output, Point::default(), None);
        let d = graph.add_node(NodeKind::Output, Point::default(), None);
        graph.add_connection(&a, &d);
        graph.add_connection(&b, &c);

        let pos = positions(&graph);
        let lg = LayoutGraph::from_model(&graph);
        assert_eq!(lg.len(), 4);
        // a is above b, so d must be above c
        assert!(pos[&a].y < pos[&b].y);
        assert!(pos[&d].y < pos[&c].y);
    }

    #[test]
    fn test_cycle_still_laid_out() {
        let mut graph = GraphModel::new();
        let i = graph.add_node(NodeKind::Input, Point::default(), None);
        let a = graph.add_node(NodeKind::Agent, Point::default(), Some("a"));
        let b = graph.add_node(NodeKind::Agent, Point::default(), Some("b"));
        graph.add_connection(&i, &a);
        graph.add_connection(&a, &b);
        graph.add_connection(&b, &a);

        let pos = positions(&graph);
        assert_eq!(pos.len(), 3);
        assert!(pos[&a].x > pos[&i].x);
        assert!(!overlaps(pos[&a], pos[&b], &LayoutSpacing::default()));
    }

    #[test]
    fn test_apply_moves_nodes() {
        let mut graph = GraphModel::new();
        let i = graph.add_node(NodeKind::Input, Point::new(-1.0, -1.0), None);
        assert_eq!(LayoutEngine::default().apply(&mut graph).unwrap(), 1);
        assert_eq!(graph.node(&i).unwrap().position, Point::new(50.0, 50.0));
    }
}
