// frontend/src/skymap/quadtree.rs
//
// Point quadtree over screen space, rebuilt every redraw. Only supports the
// two operations label placement needs: add a point, find the nearest one.

pub type Point = (f64, f64);

const NODE_CAPACITY: usize = 4;
const MAX_DEPTH: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Extent {
    pub fn new(min: Point, max: Point) -> Self {
        Self {
            x0: min.0,
            y0: min.1,
            x1: max.0,
            y1: max.1,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.0 >= self.x0 && p.0 <= self.x1 && p.1 >= self.y0 && p.1 <= self.y1
    }

    /// Squared distance from `p` to the nearest point of the box (0 inside).
    fn dist2(&self, p: Point) -> f64 {
        let dx = (self.x0 - p.0).max(0.0).max(p.0 - self.x1);
        let dy = (self.y0 - p.1).max(0.0).max(p.1 - self.y1);
        dx * dx + dy * dy
    }

    fn mid(&self) -> Point {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    fn quadrant(&self, idx: usize) -> Extent {
        let (mx, my) = self.mid();
        let (x0, x1) = if idx & 1 == 0 { (self.x0, mx) } else { (mx, self.x1) };
        let (y0, y1) = if idx & 2 == 0 { (self.y0, my) } else { (my, self.y1) };
        Extent { x0, y0, x1, y1 }
    }

    fn child_index(&self, p: Point) -> usize {
        let (mx, my) = self.mid();
        let bit_x = usize::from(p.0 >= mx);
        let bit_y = usize::from(p.1 >= my);
        bit_x | (bit_y << 1)
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

struct QuadNode {
    extent: Extent,
    points: Vec<Point>,
    children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    fn new(extent: Extent) -> Self {
        QuadNode {
            extent,
            points: Vec::new(),
            children: [None, None, None, None],
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }

    fn insert(&mut self, p: Point, depth: u8) {
        if self.is_leaf() && (self.points.len() < NODE_CAPACITY || depth >= MAX_DEPTH) {
            self.points.push(p);
            return;
        }
        if self.is_leaf() {
            // split: push the stored points down one level
            for old in std::mem::take(&mut self.points) {
                self.child_for(old).insert(old, depth + 1);
            }
        }
        self.child_for(p).insert(p, depth + 1);
    }

    fn child_for(&mut self, p: Point) -> &mut QuadNode {
        let idx = self.extent.child_index(p);
        let extent = self.extent.quadrant(idx);
        self.children[idx].get_or_insert_with(|| Box::new(QuadNode::new(extent)))
    }

    fn nearest(&self, p: Point, best: &mut Option<(Point, f64)>) {
        if let Some((_, best_d2)) = best {
            if self.extent.dist2(p) > *best_d2 {
                return;
            }
        }
        for &q in &self.points {
            let d2 = (q.0 - p.0).powi(2) + (q.1 - p.1).powi(2);
            if best.is_none_or(|(_, b)| d2 < b) {
                *best = Some((q, d2));
            }
        }
        // the quadrant holding `p` first, it usually tightens the bound fastest
        let first = self.extent.child_index(p);
        for idx in std::iter::once(first).chain((0..4).filter(|&i| i != first)) {
            if let Some(child) = &self.children[idx] {
                child.nearest(p, best);
            }
        }
    }
}

pub struct QuadTree {
    root: QuadNode,
    // points added outside the extent; kept so `find` still sees them
    outside: Vec<Point>,
    len: usize,
}

impl QuadTree {
    pub fn new(extent: Extent) -> Self {
        QuadTree {
            root: QuadNode::new(extent),
            outside: Vec::new(),
            len: 0,
        }
    }

    /// Extent `[-1, -1]..[w + 1, h + 1]` around a viewport.
    pub fn for_viewport(width: f64, height: f64) -> Self {
        Self::new(Extent::new((-1.0, -1.0), (width + 1.0, height + 1.0)))
    }

    pub fn add(&mut self, p: Point) {
        if p.0.is_nan() || p.1.is_nan() {
            return;
        }
        if self.root.extent.contains(p) {
            self.root.insert(p, 0);
        } else {
            self.outside.push(p);
        }
        self.len += 1;
    }

    pub fn find(&self, p: Point) -> Option<Point> {
        let mut best: Option<(Point, f64)> = None;
        for &q in &self.outside {
            let d2 = (q.0 - p.0).powi(2) + (q.1 - p.1).powi(2);
            if best.is_none_or(|(_, b)| d2 < b) {
                best = Some((q, d2));
            }
        }
        self.root.nearest(p, &mut best);
        best.map(|(q, _)| q)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
