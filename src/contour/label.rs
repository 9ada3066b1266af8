use crate::grid::OccupancyGrid;

/// Label value of free cells.
pub(crate) const UNLABELLED: u32 = u32::MAX;

/// Connected components of occupied cells.
#[derive(Debug, Clone)]
pub(crate) struct Labels {
    pub width: usize,
    pub height: usize,
    /// One label per cell, row-major; [`UNLABELLED`] for free cells.
    pub labels: Vec<u32>,
    /// Cells of each component, in row-major order.
    pub components: Vec<Vec<(usize, usize)>>,
}

impl Labels {
    pub(crate) fn get(&self, x: isize, y: isize) -> u32 {
        match (usize::try_from(x), usize::try_from(y)) {
            (Ok(x), Ok(y)) if x < self.width && y < self.height => self.labels[y * self.width + x],
            _ => UNLABELLED,
        }
    }
}

/// Labels 4-connected components of occupied cells.
///
/// Components are numbered in the row-major order of their first cell, so
/// the numbering only depends on the grid contents.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn label_components(grid: &OccupancyGrid) -> Labels {
    let (width, height) = (grid.width(), grid.height());
    let mut labels = vec![UNLABELLED; width * height];
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if labels[y * width + x] != UNLABELLED || !grid.get(x, y).is_occupied() {
                continue;
            }
            let label = components.len() as u32;
            let mut cells = Vec::new();
            labels[y * width + x] = label;
            stack.push((x, y));
            while let Some((cx, cy)) = stack.pop() {
                cells.push((cx, cy));
                let mut visit = |nx: usize, ny: usize| {
                    let i = ny * width + nx;
                    if labels[i] == UNLABELLED && grid.get(nx, ny).is_occupied() {
                        labels[i] = label;
                        stack.push((nx, ny));
                    }
                };
                if cx > 0 {
                    visit(cx - 1, cy);
                }
                if cx + 1 < width {
                    visit(cx + 1, cy);
                }
                if cy > 0 {
                    visit(cx, cy - 1);
                }
                if cy + 1 < height {
                    visit(cx, cy + 1);
                }
            }
            cells.sort_unstable_by_key(|&(cx, cy)| (cy, cx));
            components.push(cells);
        }
    }

    Labels {
        width,
        height,
        labels,
        components,
    }
}
