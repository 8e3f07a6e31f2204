//! Polygonization of a line arrangement.
//!
//! Lines are noded against each other (crossings, T-junctions and collinear overlaps), merged
//! into a planar graph with vertices snapped to a grid, stripped of dangling edges and bridges,
//! and walked as half-edges. Every bounded face becomes a polygon; the outline of a component
//! nested inside another component's face becomes a hole of the smallest such face.

use geo::{Contains, Coord, LineString, Polygon};
use rstar::primitives::{GeomWithData, Line};
use rstar::{AABB, RTree, RTreeObject};
use rustc_hash::{FxHashMap, FxHashSet};

/// Relative tolerance below which two segment directions count as parallel.
const PARALLEL_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: Coord<f64>,
    b: Coord<f64>,
}

impl Segment {
    fn length(&self) -> f64 {
        let d = self.b - self.a;
        (d.x * d.x + d.y * d.y).sqrt()
    }

    /// Parameter of the projection of `p` onto this segment's line.
    fn param_of(&self, p: Coord<f64>) -> f64 {
        let r = self.b - self.a;
        let len2 = r.x * r.x + r.y * r.y;
        let q = p - self.a;
        (q.x * r.x + q.y * r.y) / len2
    }

    fn at(&self, t: f64) -> Coord<f64> {
        self.a + (self.b - self.a) * t
    }
}

fn cross(u: Coord<f64>, v: Coord<f64>) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Every bounded face of the arrangement formed by `lines`.
///
/// Vertices closer than `snap` are merged. Output order follows the input order of the lines.
pub fn polygonize(lines: &[LineString<f64>], snap: f64) -> Vec<Polygon<f64>> {
    let snap = if snap > 0.0 { snap } else { f64::EPSILON };
    let segments: Vec<Segment> = lines
        .iter()
        .flat_map(|line| line.0.windows(2).map(|w| Segment { a: w[0], b: w[1] }))
        .filter(|s| s.length() > 0.0)
        .collect();
    if segments.is_empty() {
        return Vec::new();
    }

    let cuts = node_segments(&segments, snap);

    let mut graph = PlanarGraph::new(snap);
    for (segment, mut points) in segments.iter().zip(cuts) {
        points.push((0.0, segment.a));
        points.push((1.0, segment.b));
        points.sort_by(|l, r| l.0.total_cmp(&r.0));
        let mut prev: Option<usize> = None;
        for (_, p) in points {
            let v = graph.vertex(p);
            if let Some(u) = prev {
                graph.add_edge(u, v);
            }
            prev = Some(v);
        }
    }
    graph.prune_dangles();
    graph.prune_bridges();
    graph.faces()
}

/// Points (with their parameter) where each segment must be split.
fn node_segments(segments: &[Segment], snap: f64) -> Vec<Vec<(f64, Coord<f64>)>> {
    let tree = RTree::bulk_load(
        segments
            .iter()
            .enumerate()
            .map(|(i, s)| GeomWithData::new(Line::new([s.a.x, s.a.y], [s.b.x, s.b.y]), i))
            .collect(),
    );

    let mut cuts: Vec<Vec<(f64, Coord<f64>)>> = vec![Vec::new(); segments.len()];
    for (i, seg) in segments.iter().enumerate() {
        let env = Line::new([seg.a.x, seg.a.y], [seg.b.x, seg.b.y]).envelope();
        let (lo, hi) = (env.lower(), env.upper());
        let query = AABB::from_corners([lo[0] - snap, lo[1] - snap], [hi[0] + snap, hi[1] + snap]);
        for candidate in tree.locate_in_envelope_intersecting(&query) {
            let j = candidate.data;
            if j <= i {
                continue;
            }
            let other = &segments[j];
            for (on_first, p) in intersections(seg, other, snap) {
                if on_first {
                    cuts[i].push((seg.param_of(p), p));
                } else {
                    cuts[j].push((other.param_of(p), p));
                }
            }
        }
    }
    cuts
}

/// Split points between two segments, tagged with whether they belong to `s1` (else `s2`).
///
/// A proper crossing yields the same point for both segments so both split at one vertex.
fn intersections(s1: &Segment, s2: &Segment, snap: f64) -> Vec<(bool, Coord<f64>)> {
    let r = s1.b - s1.a;
    let s = s2.b - s2.a;
    let (len1, len2) = (s1.length(), s2.length());
    let denom = cross(r, s);
    let qp = s2.a - s1.a;

    if denom.abs() <= PARALLEL_EPS * len1 * len2 {
        if (cross(r, qp) / len1).abs() > snap {
            return Vec::new();
        }
        // Collinear: every end point strictly inside the other segment splits it.
        let mut out = Vec::new();
        let (e1, e2) = (snap / len1, snap / len2);
        for p in [s2.a, s2.b] {
            let t = s1.param_of(p);
            if t > e1 && t < 1.0 - e1 {
                out.push((true, p));
            }
        }
        for p in [s1.a, s1.b] {
            let u = s2.param_of(p);
            if u > e2 && u < 1.0 - e2 {
                out.push((false, p));
            }
        }
        return out;
    }

    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    let (e1, e2) = (snap / len1, snap / len2);
    if t < -e1 || t > 1.0 + e1 || u < -e2 || u > 1.0 + e2 {
        return Vec::new();
    }
    let p = s1.at(t.clamp(0.0, 1.0));
    vec![(true, p), (false, p)]
}

struct PlanarGraph {
    snap: f64,
    vertices: Vec<Coord<f64>>,
    grid: FxHashMap<(i64, i64), Vec<usize>>,
    edges: Vec<(usize, usize)>,
    seen: FxHashSet<(usize, usize)>,
    alive: Vec<bool>,
}

impl PlanarGraph {
    fn new(snap: f64) -> Self {
        Self {
            snap,
            vertices: Vec::new(),
            grid: FxHashMap::default(),
            edges: Vec::new(),
            seen: FxHashSet::default(),
            alive: Vec::new(),
        }
    }

    fn cell(&self, p: Coord<f64>) -> (i64, i64) {
        (
            (p.x / self.snap).floor() as i64,
            (p.y / self.snap).floor() as i64,
        )
    }

    /// Index of the vertex within `snap` of `p`, creating one if none exists.
    fn vertex(&mut self, p: Coord<f64>) -> usize {
        let (cx, cy) = self.cell(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &v in bucket {
                    let d = self.vertices[v] - p;
                    if (d.x * d.x + d.y * d.y).sqrt() <= self.snap {
                        return v;
                    }
                }
            }
        }
        let v = self.vertices.len();
        self.vertices.push(p);
        self.grid.entry((cx, cy)).or_default().push(v);
        v
    }

    fn add_edge(&mut self, u: usize, v: usize) {
        if u == v {
            return;
        }
        let key = (u.min(v), u.max(v));
        if self.seen.insert(key) {
            self.edges.push(key);
            self.alive.push(true);
        }
    }

    /// Repeatedly removes edges ending in a degree-one vertex.
    fn prune_dangles(&mut self) {
        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); self.vertices.len()];
        for (k, &(u, v)) in self.edges.iter().enumerate() {
            incident[u].push(k);
            incident[v].push(k);
        }
        let mut degree: Vec<usize> = incident.iter().map(Vec::len).collect();
        let mut stack: Vec<usize> = (0..self.vertices.len())
            .filter(|&v| degree[v] == 1)
            .collect();
        while let Some(v) = stack.pop() {
            if degree[v] != 1 {
                continue;
            }
            let Some(&k) = incident[v].iter().find(|&&k| self.alive[k]) else {
                continue;
            };
            self.alive[k] = false;
            let (a, b) = self.edges[k];
            let w = if a == v { b } else { a };
            degree[v] -= 1;
            degree[w] -= 1;
            if degree[w] == 1 {
                stack.push(w);
            }
        }
    }

    /// Removes edges with the same face on both sides: bridges between cycles.
    fn prune_bridges(&mut self) {
        let live: Vec<usize> = (0..self.edges.len()).filter(|&k| self.alive[k]).collect();
        if live.is_empty() {
            return;
        }
        let walk = HalfEdges::new(&self.vertices, live.iter().map(|&k| self.edges[k]).collect());
        let face = walk.face_labels();
        for (i, &k) in live.iter().enumerate() {
            if face[2 * i] == face[2 * i + 1] {
                self.alive[k] = false;
            }
        }
    }

    fn faces(&self) -> Vec<Polygon<f64>> {
        let edges: Vec<(usize, usize)> = self
            .edges
            .iter()
            .zip(&self.alive)
            .filter(|(_, alive)| **alive)
            .map(|(e, _)| *e)
            .collect();
        if edges.is_empty() {
            return Vec::new();
        }

        let component = self.components(&edges);
        let walk = HalfEdges::new(&self.vertices, edges);
        let area_eps = self.snap * self.snap;

        let mut shells: Vec<(usize, f64, Polygon<f64>)> = Vec::new();
        let mut outlines: Vec<(usize, f64, LineString<f64>)> = Vec::new();
        for cycle in walk.cycles() {
            let mut ring: Vec<Coord<f64>> = cycle
                .iter()
                .map(|&h| self.vertices[walk.origin(h)])
                .collect();
            if ring.len() < 3 {
                continue;
            }
            let area = signed_area(&ring);
            let comp = component[walk.origin(cycle[0])];
            if area > area_eps {
                shells.push((comp, area, Polygon::new(LineString::new(ring), Vec::new())));
            } else if area < -area_eps {
                ring.reverse();
                outlines.push((comp, -area, LineString::new(ring)));
            }
        }

        let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); shells.len()];
        for (comp, area, outline) in outlines {
            let probe = geo::Point(outline.0[0]);
            let host = shells
                .iter()
                .enumerate()
                .filter(|(_, (c, a, shell))| *c != comp && *a > area && shell.contains(&probe))
                .min_by(|l, r| l.1.1.total_cmp(&r.1.1))
                .map(|(i, _)| i);
            if let Some(i) = host {
                holes[i].push(outline);
            }
        }

        shells
            .into_iter()
            .zip(holes)
            .map(|((_, _, shell), holes)| {
                let (exterior, _) = shell.into_inner();
                Polygon::new(exterior, holes)
            })
            .collect()
    }

    /// Connected component label per vertex.
    fn components(&self, edges: &[(usize, usize)]) -> Vec<usize> {
        let mut parent: Vec<usize> = (0..self.vertices.len()).collect();
        fn find(parent: &mut [usize], mut v: usize) -> usize {
            while parent[v] != v {
                parent[v] = parent[parent[v]];
                v = parent[v];
            }
            v
        }
        for &(u, v) in edges {
            let (ru, rv) = (find(&mut parent, u), find(&mut parent, v));
            if ru != rv {
                parent[ru] = rv;
            }
        }
        (0..self.vertices.len())
            .map(|v| find(&mut parent, v))
            .collect()
    }
}

/// Half-edge view of a set of undirected edges: half-edge 2k runs u -> v and 2k+1 runs v -> u
/// for edge k = (u, v).
struct HalfEdges {
    edges: Vec<(usize, usize)>,
    outgoing: Vec<Vec<usize>>,
    position: Vec<usize>,
}

impl HalfEdges {
    fn new(vertices: &[Coord<f64>], edges: Vec<(usize, usize)>) -> Self {
        let half_edges = edges.len() * 2;
        let mut walk = Self {
            edges,
            outgoing: vec![Vec::new(); vertices.len()],
            position: vec![0; half_edges],
        };
        for h in 0..half_edges {
            let o = walk.origin(h);
            walk.outgoing[o].push(h);
        }
        let angles: Vec<f64> = (0..half_edges)
            .map(|h| {
                let d = vertices[walk.target(h)] - vertices[walk.origin(h)];
                d.y.atan2(d.x)
            })
            .collect();
        for list in &mut walk.outgoing {
            list.sort_by(|&l, &r| angles[l].total_cmp(&angles[r]));
            for (i, &h) in list.iter().enumerate() {
                walk.position[h] = i;
            }
        }
        walk
    }

    fn len(&self) -> usize {
        self.edges.len() * 2
    }

    fn origin(&self, h: usize) -> usize {
        let (u, v) = self.edges[h / 2];
        if h % 2 == 0 { u } else { v }
    }

    fn target(&self, h: usize) -> usize {
        self.origin(h ^ 1)
    }

    /// The face to the left of h continues with the outgoing edge clockwise-adjacent to h's twin.
    fn next(&self, h: usize) -> usize {
        let twin = h ^ 1;
        let list = &self.outgoing[self.origin(twin)];
        list[(self.position[twin] + list.len() - 1) % list.len()]
    }

    /// Every face boundary as its sequence of half-edges.
    fn cycles(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.len()];
        let mut cycles = Vec::new();
        for start in 0..self.len() {
            if visited[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut h = start;
            while !visited[h] {
                visited[h] = true;
                cycle.push(h);
                h = self.next(h);
            }
            cycles.push(cycle);
        }
        cycles
    }

    /// Face number per half-edge.
    fn face_labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.len()];
        for (face, cycle) in self.cycles().into_iter().enumerate() {
            for h in cycle {
                labels[h] = face;
            }
        }
        labels
    }
}

fn signed_area(ring: &[Coord<f64>]) -> f64 {
    let n = ring.len();
    let mut twice = 0.0;
    for i in 0..n {
        let (p, q) = (ring[i], ring[(i + 1) % n]);
        twice += p.x * q.y - q.x * p.y;
    }
    twice / 2.0
}
