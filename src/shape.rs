//! Turns typeface-record command strings into closed polygon sets with
//! outer/hole assignment, ready for extrusion.

use crate::{
    error::FontResult,
    geometry::{PathCommand, Point},
    outline,
    typeface::TypefaceRecord,
};

#[derive(Debug, Clone)]
pub struct ShapeOptions {
    /// Sampling steps per Bézier curve
    pub curve_segments: usize,
    /// Invert the outer/hole classification
    pub reverse_winding: bool,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            curve_segments: 12,
            reverse_winding: false,
        }
    }
}

/// One closed outer ring and the holes assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub outline: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

#[derive(Debug, Clone)]
pub struct PlacedGlyph {
    pub character: char,
    /// Horizontal pen position this glyph was placed at
    pub offset: f64,
    pub shapes: Vec<Shape>,
}

/// Tessellate every character of `text`, advancing the pen by each glyph's
/// advance plus the kerning adjustment to the next character
pub fn build_text_shapes(
    record: &TypefaceRecord,
    text: &str,
    options: &ShapeOptions,
) -> FontResult<Vec<PlacedGlyph>> {
    let mut placed = Vec::new();
    let mut pen = 0.0f64;

    let characters: Vec<char> = text.chars().collect();
    for (i, &c) in characters.iter().enumerate() {
        let Some(glyph) = record.glyphs.get(&c.to_string()) else {
            continue;
        };

        let commands = outline::parse_commands(&glyph.o)?;
        let subpaths = sample_subpaths(&commands, options.curve_segments.max(1), pen);
        let shapes = assign_holes(subpaths, options.reverse_winding);

        placed.push(PlacedGlyph {
            character: c,
            offset: pen,
            shapes,
        });

        pen += f64::from(glyph.ha);
        if let Some(next) = characters.get(i + 1) {
            if let Some(adjustment) = record
                .kerning
                .get(&c.to_string())
                .and_then(|seconds| seconds.get(&next.to_string()))
            {
                pen += f64::from(*adjustment);
            }
        }
    }

    Ok(placed)
}

/// Flatten commands into closed point rings, sampling curves by repeated
/// linear interpolation
fn sample_subpaths(commands: &[PathCommand], segments: usize, dx: f64) -> Vec<Vec<Point>> {
    let shift = Point::new(dx, 0.0);
    let mut subpaths: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for &command in commands {
        match command {
            PathCommand::MoveTo(p) => {
                if current.len() >= 3 {
                    subpaths.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                current.push(p + shift);
            }
            PathCommand::LineTo(p) => current.push(p + shift),
            PathCommand::QuadTo(c, p) => {
                let start = *current.last().unwrap_or(&(c + shift));
                let (c, p) = (c + shift, p + shift);
                for step in 1..=segments {
                    let t = step as f64 / segments as f64;
                    let a = lerp(start, c, t);
                    let b = lerp(c, p, t);
                    current.push(lerp(a, b, t));
                }
            }
            PathCommand::CubicTo(c1, c2, p) => {
                let start = *current.last().unwrap_or(&(c1 + shift));
                let (c1, c2, p) = (c1 + shift, c2 + shift, p + shift);
                for step in 1..=segments {
                    let t = step as f64 / segments as f64;
                    let a = lerp(start, c1, t);
                    let b = lerp(c1, c2, t);
                    let c = lerp(c2, p, t);
                    let ab = lerp(a, b, t);
                    let bc = lerp(b, c, t);
                    current.push(lerp(ab, bc, t));
                }
            }
            PathCommand::Close => {}
        }
    }

    if current.len() >= 3 {
        subpaths.push(current);
    }

    subpaths
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    a + (b - a) * t
}

/// Shoelace sum; the sign carries the winding direction
fn signed_area(ring: &[Point]) -> f64 {
    let mut area = 0.0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        area += (ring[j].x - ring[i].x) * (ring[j].y + ring[i].y);
        j = i;
    }
    area / 2.0
}

/// Crossing-number point-in-polygon test
fn contains(ring: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Split rings into outers and holes by winding sign, then attach each
/// hole to the smallest outer containing its first sampled point
fn assign_holes(subpaths: Vec<Vec<Point>>, reverse_winding: bool) -> Vec<Shape> {
    if subpaths.is_empty() {
        return Vec::new();
    }

    let areas: Vec<f64> = subpaths.iter().map(|ring| signed_area(ring)).collect();

    // the ring with the largest magnitude fixes which sign means "outer"
    let dominant = areas
        .iter()
        .cloned()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    let outer_positive = (dominant >= 0.0) != reverse_winding;

    let mut shapes: Vec<Shape> = Vec::new();
    let mut holes: Vec<Vec<Point>> = Vec::new();

    for (ring, area) in subpaths.into_iter().zip(&areas) {
        if (*area >= 0.0) == outer_positive {
            shapes.push(Shape {
                outline: ring,
                holes: Vec::new(),
            });
        } else {
            holes.push(ring);
        }
    }

    for hole in holes {
        let probe = hole[0];
        let owner = shapes
            .iter_mut()
            .filter(|shape| contains(&shape.outline, probe))
            .min_by(|a, b| {
                signed_area(&a.outline)
                    .abs()
                    .total_cmp(&signed_area(&b.outline).abs())
            });

        match owner {
            Some(shape) => shape.holes.push(hole),
            None => log::debug!("dropping hole contour with no containing outline"),
        }
    }

    shapes
}
