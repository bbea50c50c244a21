//! Lowering from parsed outlines to the compact command-string form.
//!
//! The grammar is space-separated tokens: `m x y` starts a contour,
//! `l x y` is a line, `q cx cy x y` a quadratic, `b c1x c1y c2x c2y x y` a
//! cubic. Closing is implicit at the next `m` or the end of the string.

use std::fmt::Write;

use crate::{
    error::FontResult,
    font::table::glyf::GlyphPoint,
    geometry::{PathCommand, Point},
};

/// Lower one TrueType contour of points with on/off-curve flags into
/// commands.
///
/// The traversal starts at the first on-curve point when one exists, and at
/// the implied midpoint of the last and first points otherwise. Off-curve
/// runs insert implied on-curve midpoints, and the wrap-around position
/// closes the ring back to the start.
pub fn lower_quadratic_contour(points: &[GlyphPoint]) -> Vec<PathCommand> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let mut commands = Vec::new();

    let first_on_curve = points.iter().position(|p| p.on_curve);
    let (start, begin, count) = match first_on_curve {
        Some(f) => (points[f].position(), f + 1, n - 1),
        // no on-curve point anywhere: a virtual start point between the
        // last and first points
        None => (implied_midpoint(points[n - 1], points[0]), 0, n),
    };

    commands.push(PathCommand::MoveTo(start));
    if n == 1 {
        return commands;
    }

    let mut cursor = begin;
    let mut processed = 0;
    while processed < count {
        let current = points[cursor % n];

        if current.on_curve {
            commands.push(PathCommand::LineTo(current.position()));
            cursor += 1;
            processed += 1;
            continue;
        }

        let next = points[(cursor + 1) % n];
        if next.on_curve {
            commands.push(PathCommand::QuadTo(current.position(), next.position()));
            cursor += 2;
            processed += 2;
        } else {
            let mid = implied_midpoint(current, next);
            commands.push(PathCommand::QuadTo(current.position(), mid));
            cursor += 1;
            processed += 1;
        }
    }

    commands
}

fn implied_midpoint(a: GlyphPoint, b: GlyphPoint) -> Point {
    Point::new(
        ((a.x as f64 + b.x as f64) / 2.0).round(),
        ((a.y as f64 + b.y as f64) / 2.0).round(),
    )
}

/// Render commands as the compact string form. `Close` emits nothing;
/// closure is implicit in the grammar.
pub fn write_commands(commands: &[PathCommand]) -> String {
    let mut out = String::new();

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                push_token(&mut out, "m");
                push_point(&mut out, p);
            }
            PathCommand::LineTo(p) => {
                push_token(&mut out, "l");
                push_point(&mut out, p);
            }
            PathCommand::QuadTo(c, p) => {
                push_token(&mut out, "q");
                push_point(&mut out, c);
                push_point(&mut out, p);
            }
            PathCommand::CubicTo(c1, c2, p) => {
                push_token(&mut out, "b");
                push_point(&mut out, c1);
                push_point(&mut out, c2);
                push_point(&mut out, p);
            }
            PathCommand::Close => {}
        }
    }

    out
}

fn push_token(out: &mut String, token: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(token);
}

fn push_point(out: &mut String, p: Point) {
    push_number(out, p.x);
    push_number(out, p.y);
}

fn push_number(out: &mut String, v: f64) {
    out.push(' ');
    if v.fract() == 0.0 && v.abs() < 1e15 {
        write!(out, "{}", v as i64).unwrap();
    } else {
        write!(out, "{}", v).unwrap();
    }
}

/// Parse a command string back into path commands. The inverse of
/// [`write_commands`]; used by the shape builder.
pub fn parse_commands(s: &str) -> FontResult<Vec<PathCommand>> {
    let mut tokens = s.split_ascii_whitespace();
    let mut commands = Vec::new();

    fn number<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> FontResult<f64> {
        let token = tokens.next().ok_or(anyhow::anyhow!("missing operand"))?;
        Ok(token.parse::<f64>()?)
    }

    while let Some(op) = tokens.next() {
        match op {
            "m" => {
                let x = number(&mut tokens)?;
                let y = number(&mut tokens)?;
                commands.push(PathCommand::MoveTo(Point::new(x, y)));
            }
            "l" => {
                let x = number(&mut tokens)?;
                let y = number(&mut tokens)?;
                commands.push(PathCommand::LineTo(Point::new(x, y)));
            }
            "q" => {
                let cx = number(&mut tokens)?;
                let cy = number(&mut tokens)?;
                let x = number(&mut tokens)?;
                let y = number(&mut tokens)?;
                commands.push(PathCommand::QuadTo(Point::new(cx, cy), Point::new(x, y)));
            }
            "b" => {
                let c1x = number(&mut tokens)?;
                let c1y = number(&mut tokens)?;
                let c2x = number(&mut tokens)?;
                let c2y = number(&mut tokens)?;
                let x = number(&mut tokens)?;
                let y = number(&mut tokens)?;
                commands.push(PathCommand::CubicTo(
                    Point::new(c1x, c1y),
                    Point::new(c2x, c2y),
                    Point::new(x, y),
                ));
            }
            _ => anyhow::bail!("unknown outline command: {:?}", op),
        }
    }

    Ok(commands)
}
