//! Per-pixel payoff samples and a min/max quadtree over their grid cells
//!
//! A cell is the square between four neighbouring samples, so a `w`x`h`
//! field has `(w - 1)`x`(h - 1)` cells. Each tree node records the range of
//! sample values under it; an isoline query only descends into nodes whose
//! range brackets the target, which keeps repeated hover queries close to
//! the length of the contour rather than the area of the surface.

/// Nodes covering at most this many cells per side are leaves
const LEAF_CELLS: u32 = 8;

#[derive(Debug, Clone)]
struct Node {
    /// Cell range, half-open
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    lower: f64,
    upper: f64,
    /// Arena indices of up to four children; empty for leaves
    children: Vec<usize>,
}

/// Min/max quadtree over the cells of a [`ScalarField`]
#[derive(Debug, Clone)]
pub struct CellTree {
    nodes: Vec<Node>,
}

impl CellTree {
    fn build(field: &ScalarField) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let cells_x = field.width.saturating_sub(1);
        let cells_y = field.height.saturating_sub(1);
        if cells_x > 0 && cells_y > 0 {
            tree.build_node(field, 0, 0, cells_x, cells_y);
        }
        tree
    }

    fn build_node(&mut self, field: &ScalarField, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            x0,
            y0,
            x1,
            y1,
            lower: f64::INFINITY,
            upper: f64::NEG_INFINITY,
            children: Vec::new(),
        });

        let (lower, upper, children) = if x1 - x0 <= LEAF_CELLS && y1 - y0 <= LEAF_CELLS {
            // Cells span samples x0..=x1, y0..=y1
            let mut lower = f64::INFINITY;
            let mut upper = f64::NEG_INFINITY;
            for row in y0..=y1 {
                for col in x0..=x1 {
                    let v = field.value(col, row);
                    lower = lower.min(v);
                    upper = upper.max(v);
                }
            }
            (lower, upper, Vec::new())
        } else {
            let mx = x0 + (x1 - x0).div_ceil(2);
            let my = y0 + (y1 - y0).div_ceil(2);
            let quads = [(x0, y0, mx, my), (mx, y0, x1, my), (x0, my, mx, y1), (mx, my, x1, y1)];
            let mut lower = f64::INFINITY;
            let mut upper = f64::NEG_INFINITY;
            let mut children = Vec::with_capacity(4);
            for (qx0, qy0, qx1, qy1) in quads {
                if qx0 >= qx1 || qy0 >= qy1 {
                    continue;
                }
                let child = self.build_node(field, qx0, qy0, qx1, qy1);
                lower = lower.min(self.nodes[child].lower);
                upper = upper.max(self.nodes[child].upper);
                children.push(child);
            }
            (lower, upper, children)
        };

        let node = &mut self.nodes[id];
        node.lower = lower;
        node.upper = upper;
        node.children = children;
        id
    }

    /// Visit every cell `(cx, cy)` whose corner range may bracket `target`
    pub fn for_each_candidate(&self, target: f64, mut visit: impl FnMut(u32, u32)) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if target < node.lower || target > node.upper {
                continue;
            }
            if node.children.is_empty() {
                for cy in node.y0..node.y1 {
                    for cx in node.x0..node.x1 {
                        visit(cx, cy);
                    }
                }
            } else {
                // Reverse so cells come out roughly top-left first
                stack.extend(node.children.iter().rev());
            }
        }
    }
}

/// Row-major payoff samples, one per pixel
#[derive(Debug, Clone)]
pub struct ScalarField {
    values: Vec<f64>,
    width: u32,
    height: u32,
    min: f64,
    max: f64,
    index: CellTree,
}

impl ScalarField {
    /// Wrap `values` (length `width * height`) and build the cell index
    pub fn new(width: u32, height: u32, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), width as usize * height as usize);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut field = Self {
            values,
            width,
            height,
            min,
            max,
            index: CellTree { nodes: Vec::new() },
        };
        field.index = CellTree::build(&field);
        field
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample at pixel (col, row); caller keeps indices in range
    #[inline]
    pub fn value(&self, col: u32, row: u32) -> f64 {
        self.values[row as usize * self.width as usize + col as usize]
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// True when `target` lies within the sampled range
    #[inline]
    pub fn brackets(&self, target: f64) -> bool {
        target >= self.min && target <= self.max
    }

    pub fn index(&self) -> &CellTree {
        &self.index
    }
}
