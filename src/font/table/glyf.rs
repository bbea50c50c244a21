use std::collections::HashMap;

use crate::{
    error::{FontError, FontResult},
    font::table::loca::Loca,
    geometry::Point,
    parse_binary::{BinaryParser, ByteReader},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

impl GlyphPoint {
    pub fn position(&self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// A fully resolved TrueType outline: contours split on the endpoint array,
/// composites flattened
#[derive(Debug, Clone, Default)]
pub struct GlyphOutline {
    pub contours: Vec<Vec<GlyphPoint>>,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

struct SimpleGlyphFlag;

impl SimpleGlyphFlag {
    const ON_CURVE: u8 = 1 << 0;
    const X_SHORT_VECTOR: u8 = 1 << 1;
    const Y_SHORT_VECTOR: u8 = 1 << 2;
    const REPEAT: u8 = 1 << 3;
    const X_SAME_OR_POSITIVE: u8 = 1 << 4;
    const Y_SAME_OR_POSITIVE: u8 = 1 << 5;
}

struct ComponentFlag;

impl ComponentFlag {
    const ARG_1_AND_2_ARE_WORDS: u16 = 1 << 0;
    const ARGS_ARE_XY_VALUES: u16 = 1 << 1;
    const WE_HAVE_A_SCALE: u16 = 1 << 3;
    const MORE_COMPONENTS: u16 = 1 << 5;
    const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 1 << 6;
    const WE_HAVE_A_TWO_BY_TWO: u16 = 1 << 7;
}

/// Resolves glyph outlines from `glyf`, flattening composites.
///
/// Already-resolved components are memoized; accented fonts reference the
/// same base glyph from many composites.
pub struct GlyfReader<'a> {
    glyf: &'a [u8],
    loca: &'a Loca,
    cache: HashMap<u16, GlyphOutline>,
}

impl<'a> GlyfReader<'a> {
    pub fn new(glyf: &'a [u8], loca: &'a Loca) -> Self {
        Self {
            glyf,
            loca,
            cache: HashMap::new(),
        }
    }

    pub fn outline(&mut self, glyph_id: u16) -> FontResult<GlyphOutline> {
        let mut in_progress = Vec::new();
        self.resolve(glyph_id, &mut in_progress)
    }

    fn resolve(&mut self, glyph_id: u16, in_progress: &mut Vec<u16>) -> FontResult<GlyphOutline> {
        if let Some(outline) = self.cache.get(&glyph_id) {
            return Ok(outline.clone());
        }

        if in_progress.contains(&glyph_id) {
            anyhow::bail!(FontError::CompositeCycle(glyph_id));
        }

        let outline = match self.loca.glyph_range(glyph_id) {
            Some((start, end)) => {
                let glyph = self
                    .glyf
                    .get(start..end)
                    .ok_or(anyhow::anyhow!("glyph range past end of glyf table"))?;

                let mut reader = ByteReader::new(glyph);
                let number_of_contours = reader.parse_i16()?;
                let x_min = reader.parse_i16()?;
                let y_min = reader.parse_i16()?;
                let x_max = reader.parse_i16()?;
                let y_max = reader.parse_i16()?;

                let contours = if number_of_contours >= 0 {
                    Self::parse_simple(&mut reader, number_of_contours as u16)?
                } else {
                    in_progress.push(glyph_id);
                    let contours = self.parse_composite(&mut reader, in_progress);
                    in_progress.pop();
                    contours?
                };

                GlyphOutline {
                    contours,
                    x_min,
                    y_min,
                    x_max,
                    y_max,
                }
            }
            None => GlyphOutline::default(),
        };

        self.cache.insert(glyph_id, outline.clone());

        Ok(outline)
    }

    fn parse_simple(
        reader: &mut ByteReader,
        number_of_contours: u16,
    ) -> FontResult<Vec<Vec<GlyphPoint>>> {
        let mut end_points = Vec::with_capacity(usize::from(number_of_contours));
        for _ in 0..number_of_contours {
            end_points.push(reader.parse_u16()?);
        }

        let num_points = match end_points.last() {
            Some(&last) => usize::from(last) + 1,
            None => return Ok(Vec::new()),
        };

        // hinting is not executed
        let instruction_length = reader.parse_u16()?;
        reader.parse_bytes(usize::from(instruction_length))?;

        let mut flags = Vec::with_capacity(num_points);
        while flags.len() < num_points {
            let flag = reader.next()?;
            flags.push(flag);

            if flag & SimpleGlyphFlag::REPEAT != 0 {
                let count = reader.next()?;
                for _ in 0..count {
                    flags.push(flag);
                }
            }
        }
        anyhow::ensure!(flags.len() == num_points, "glyph flag run overshoots");

        let xs = Self::parse_coordinates(
            reader,
            &flags,
            SimpleGlyphFlag::X_SHORT_VECTOR,
            SimpleGlyphFlag::X_SAME_OR_POSITIVE,
        )?;
        let ys = Self::parse_coordinates(
            reader,
            &flags,
            SimpleGlyphFlag::Y_SHORT_VECTOR,
            SimpleGlyphFlag::Y_SAME_OR_POSITIVE,
        )?;

        let points: Vec<GlyphPoint> = flags
            .iter()
            .zip(xs)
            .zip(ys)
            .map(|((&flag, x), y)| GlyphPoint {
                x,
                y,
                on_curve: flag & SimpleGlyphFlag::ON_CURVE != 0,
            })
            .collect();

        // split into contours on the endpoint array
        let mut contours = Vec::with_capacity(end_points.len());
        let mut start = 0usize;
        for &end in &end_points {
            let end = usize::from(end) + 1;
            anyhow::ensure!(start < end && end <= points.len(), "contour endpoints not ascending");
            contours.push(points[start..end].to_vec());
            start = end;
        }

        Ok(contours)
    }

    /// Delta-decoded coordinates. "Short" is a one-byte magnitude whose sign
    /// is the companion bit; otherwise the companion bit means a zero delta,
    /// and a clear companion bit means a full 16-bit delta.
    fn parse_coordinates(
        reader: &mut ByteReader,
        flags: &[u8],
        short_bit: u8,
        same_or_positive_bit: u8,
    ) -> FontResult<Vec<i16>> {
        let mut coordinates = Vec::with_capacity(flags.len());
        let mut value = 0i16;

        for &flag in flags {
            let delta = if flag & short_bit != 0 {
                let magnitude = i16::from(reader.next()?);
                if flag & same_or_positive_bit != 0 {
                    magnitude
                } else {
                    -magnitude
                }
            } else if flag & same_or_positive_bit != 0 {
                0
            } else {
                reader.parse_i16()?
            };

            value = value.wrapping_add(delta);
            coordinates.push(value);
        }

        Ok(coordinates)
    }

    fn parse_composite(
        &mut self,
        reader: &mut ByteReader,
        in_progress: &mut Vec<u16>,
    ) -> FontResult<Vec<Vec<GlyphPoint>>> {
        let mut contours = Vec::new();

        loop {
            let flags = reader.parse_u16()?;
            let glyph_index = reader.parse_u16()?;

            let words = flags & ComponentFlag::ARG_1_AND_2_ARE_WORDS != 0;
            let xy_args = flags & ComponentFlag::ARGS_ARE_XY_VALUES != 0;

            let (arg1, arg2) = if words {
                (reader.parse_i16()?, reader.parse_i16()?)
            } else {
                (i16::from(reader.next()? as i8), i16::from(reader.next()? as i8))
            };

            let (tx, ty) = if xy_args {
                (f64::from(arg1), f64::from(arg2))
            } else {
                // point-index anchor matching; approximated as an identity
                // placement
                log::warn!(
                    "composite glyph {} uses anchor-match args; placing at origin",
                    glyph_index
                );
                (0.0, 0.0)
            };

            let (a, b, c, d) = if flags & ComponentFlag::WE_HAVE_A_SCALE != 0 {
                let scale = reader.parse_f2dot14()?;
                (scale, 0.0, 0.0, scale)
            } else if flags & ComponentFlag::WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                let x_scale = reader.parse_f2dot14()?;
                let y_scale = reader.parse_f2dot14()?;
                (x_scale, 0.0, 0.0, y_scale)
            } else if flags & ComponentFlag::WE_HAVE_A_TWO_BY_TWO != 0 {
                (
                    reader.parse_f2dot14()?,
                    reader.parse_f2dot14()?,
                    reader.parse_f2dot14()?,
                    reader.parse_f2dot14()?,
                )
            } else {
                (1.0, 0.0, 0.0, 1.0)
            };

            let component = self.resolve(glyph_index, in_progress)?;

            for contour in &component.contours {
                let transformed = contour
                    .iter()
                    .map(|p| {
                        let x = a * f64::from(p.x) + c * f64::from(p.y) + tx;
                        let y = b * f64::from(p.x) + d * f64::from(p.y) + ty;

                        GlyphPoint {
                            x: x.round() as i16,
                            y: y.round() as i16,
                            on_curve: p.on_curve,
                        }
                    })
                    .collect();

                contours.push(transformed);
            }

            if flags & ComponentFlag::MORE_COMPONENTS == 0 {
                break;
            }
        }

        Ok(contours)
    }
}
