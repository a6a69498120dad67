use std::{cmp::Ordering, f64::consts::PI};

use crate::types::{Contour, Point};

/// Opposite angle at or below which a convexity defect counts as a finger valley.
pub const VALLEY_MAX_ANGLE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("contour has {0} points, at least 3 are required")]
    TooFewPoints(usize),
    #[error("convex hull has {0} vertices, at least 3 are required")]
    DegenerateHull(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ShapeFeatures {
    pub area: f64,
    pub hull_area: f64,
    pub perimeter: f64,
    pub solidity: f64,
    pub circularity: f64,
}

impl ShapeFeatures {
    fn new(area: f64, hull_area: f64, perimeter: f64) -> Self {
        let solidity = if hull_area > 0.0 { area / hull_area } else { 0.0 };
        let circularity = if perimeter > 0.0 {
            4.0 * PI * area / (perimeter * perimeter)
        } else {
            0.0
        };
        Self {
            area,
            hull_area,
            perimeter,
            solidity,
            circularity,
        }
    }
}

/// A region where the contour dips inward from its hull. Indices point into the contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Defect {
    pub start: usize,
    pub end: usize,
    pub far: usize,
    pub depth: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandShape {
    pub features: ShapeFeatures,
    pub hull: Vec<usize>,
    pub defects: Vec<Defect>,
    /// One entry per finger valley: the end point of the defect triangle.
    pub fingertips: Vec<Point>,
}

impl HandShape {
    pub fn valleys(&self) -> usize {
        self.fingertips.len()
    }

    /// The extra finger accounts for the outermost one, which closes no trailing defect.
    pub fn extended_fingers(&self) -> usize {
        match self.valleys() {
            0 => 0,
            valleys => valleys + 1,
        }
    }
}

pub fn analyze(contour: &Contour) -> Result<HandShape, GeometryError> {
    let points = contour.points();
    if points.len() < 3 {
        return Err(GeometryError::TooFewPoints(points.len()));
    }

    let chain = convex_hull(points);
    if chain.len() < 3 {
        return Err(GeometryError::DegenerateHull(chain.len()));
    }

    let hull_points: Vec<Point> = chain.iter().map(|&i| points[i]).collect();
    let features = ShapeFeatures::new(
        polygon_area(points),
        polygon_area(&hull_points),
        arc_length(points),
    );

    let mut hull = chain;
    hull.sort_unstable();
    let defects = convexity_defects(points, &hull);

    let fingertips = defects
        .iter()
        .filter_map(|defect| {
            let start = points[defect.start];
            let end = points[defect.end];
            let far = points[defect.far];
            let angle = defect_angle(start, end, far)?;
            (angle <= VALLEY_MAX_ANGLE).then_some(end)
        })
        .collect();

    Ok(HandShape {
        features,
        hull,
        defects,
        fingertips,
    })
}

/// Hull vertex indices in counter-clockwise order, collinear and duplicate points dropped.
pub fn convex_hull(points: &[Point]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| match points[a].x.cmp(&points[b].x) {
        Ordering::Equal => points[a].y.cmp(&points[b].y),
        other => other,
    });

    if order.len() < 3 {
        order.dedup_by_key(|&mut i| points[i]);
        return order;
    }

    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2
            && cross(points[lower[lower.len() - 2]], points[lower[lower.len() - 1]], points[i]) <= 0
        {
            lower.pop();
        }
        lower.push(i);
    }

    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2
            && cross(points[upper[upper.len() - 2]], points[upper[upper.len() - 1]], points[i]) <= 0
        {
            upper.pop();
        }
        upper.push(i);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower.dedup_by_key(|&mut i| points[i]);
    lower
}

/// `hull` must hold contour indices in ascending order.
pub fn convexity_defects(points: &[Point], hull: &[usize]) -> Vec<Defect> {
    let n = points.len();
    let mut defects = Vec::new();

    for (pos, &start) in hull.iter().enumerate() {
        let end = hull[(pos + 1) % hull.len()];
        let stop = if end > start { end } else { end + n };
        let a = points[start];
        let b = points[end];
        let edge = a.distance(b);
        if edge == 0.0 {
            continue;
        }

        let mut deepest: Option<(usize, f64)> = None;
        for k in start + 1..stop {
            let idx = k % n;
            let depth = (cross(a, b, points[idx]) as f64).abs() / edge;
            if deepest.is_none_or(|(_, best)| depth > best) {
                deepest = Some((idx, depth));
            }
        }

        if let Some((far, depth)) = deepest.filter(|&(_, depth)| depth > 0.0) {
            defects.push(Defect {
                start,
                end,
                far,
                depth,
            });
        }
    }

    defects
}

/// Angle at `far` in degrees, or `None` when either adjacent side has zero length.
pub fn defect_angle(start: Point, end: Point, far: Point) -> Option<f64> {
    let a = start.distance(end);
    let b = start.distance(far);
    let c = end.distance(far);
    if b * c == 0.0 {
        return None;
    }
    let cos = ((b * b + c * c - a * a) / (2.0 * b * c)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i128 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| i128::from(p.x) * i128::from(q.y) - i128::from(q.x) * i128::from(p.y))
        .sum();
    (twice as f64).abs() / 2.0
}

pub fn arc_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.distance(*q))
        .sum()
}

/// Exact for any pair of `i32` coordinates.
fn cross(o: Point, a: Point, b: Point) -> i128 {
    let (ox, oy) = (i128::from(o.x), i128::from(o.y));
    (i128::from(a.x) - ox) * (i128::from(b.y) - oy) - (i128::from(a.y) - oy) * (i128::from(b.x) - ox)
}
