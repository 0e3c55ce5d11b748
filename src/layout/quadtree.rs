use eframe::egui::{Vec2, vec2};

const CELL_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    pub(super) fn width(self) -> f32 {
        self.half_extent * 2.0
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let x = if quadrant & 1 == 0 { -quarter } else { quarter };
        let y = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(x, y),
            half_extent: quarter,
        }
    }
}

/// Barnes-Hut cell: member count and centroid of the bodies below it.
pub(super) struct Cell {
    pub(super) square: Square,
    pub(super) centroid: Vec2,
    pub(super) count: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<Box<Cell>>; 4],
}

impl Cell {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(points)?;
        Some(Self::subdivide(square, (0..points.len()).collect(), points, 0))
    }

    fn subdivide(square: Square, members: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let count = members.len() as f32;
        let centroid = if members.is_empty() {
            square.center
        } else {
            members.iter().fold(Vec2::ZERO, |sum, &index| sum + points[index]) / count
        };

        let mut cell = Self {
            square,
            centroid,
            count,
            members,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || cell.members.len() <= CELL_CAPACITY {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &cell.members {
            buckets[square.quadrant(points[index])].push(index);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            cell.children[quadrant] = Some(Box::new(Self::subdivide(
                square.child(quadrant),
                bucket,
                points,
                depth + 1,
            )));
        }
        cell.members.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &Cell> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_holds_small_sets() {
        let points = vec![vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(0.0, 10.0)];
        let cell = Cell::build(&points).unwrap();
        assert!(cell.is_leaf());
        assert_eq!(cell.members.len(), 3);
        assert_eq!(cell.count, 3.0);
        assert!((cell.centroid - vec2(10.0 / 3.0, 10.0 / 3.0)).length() < 1e-4);
    }

    #[test]
    fn large_sets_split_and_keep_totals() {
        let points = (0..64)
            .map(|index| vec2((index % 8) as f32 * 10.0, (index / 8) as f32 * 10.0))
            .collect::<Vec<_>>();
        let cell = Cell::build(&points).unwrap();
        assert!(!cell.is_leaf());
        let total: f32 = cell.children().map(|child| child.count).sum();
        assert_eq!(total, 64.0);
        assert!(points.iter().all(|point| cell.square.contains(*point)));
    }

    #[test]
    fn non_finite_points_yield_no_tree() {
        assert!(Cell::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(Cell::build(&[]).is_none());
    }
}
