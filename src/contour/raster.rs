use crate::math::Point2;

/// Cells whose centres lie inside `loops` (even-odd rule), in row-major order.
///
/// `loops` are given in cell coordinates. Each row is scanned along the
/// line through its cell centres; cells between pairs of boundary crossings
/// are filled.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn rasterize(loops: &[Vec<Point2>]) -> Vec<(usize, usize)> {
    let (min_y, max_y) = loops
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    if min_y > max_y {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut crossings = Vec::new();
    let first_row = min_y.floor().max(0.0) as usize;
    let end_row = max_y.ceil().max(0.0) as usize;
    for y in first_row..end_row {
        let cy = y as f64 + 0.5;
        crossings.clear();
        for lp in loops {
            let n = lp.len();
            for i in 0..n {
                let (a, b) = (&lp[i], &lp[(i + 1) % n]);
                if (a.y > cy) != (b.y > cy) {
                    crossings.push(a.x + (cy - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);
        for span in crossings.chunks_exact(2) {
            let first = ((span[0] - 0.5).floor() + 1.0).max(0.0) as usize;
            let last = (span[1] - 0.5).ceil() - 1.0;
            if last < 0.0 {
                continue;
            }
            for x in first..=last as usize {
                cells.push((x, y));
            }
        }
    }
    cells
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn rectangle_fills_its_cells() {
        let rect = vec![p(1.0, 2.0), p(4.0, 2.0), p(4.0, 4.0), p(1.0, 4.0)];
        let cells = rasterize(&[rect]);
        assert_eq!(
            cells,
            vec![(1, 2), (2, 2), (3, 2), (1, 3), (2, 3), (3, 3)]
        );
    }

    #[test]
    fn holes_are_left_empty() {
        let outer = vec![p(0.0, 0.0), p(3.0, 0.0), p(3.0, 3.0), p(0.0, 3.0)];
        let hole = vec![p(1.0, 1.0), p(1.0, 2.0), p(2.0, 2.0), p(2.0, 1.0)];
        let cells = rasterize(&[outer, hole]);
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&(1, 1)));
    }

    #[test]
    fn empty_input() {
        assert!(rasterize(&[]).is_empty());
    }
}
