use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

#[derive(Debug, Clone, Copy)]
pub struct HMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// Horizontal metrics, indexed by glyph id. The last advance width
/// replicates for glyphs past `numberOfHMetrics`.
#[derive(Debug)]
pub struct Hmtx {
    metrics: Vec<HMetric>,
}

impl Hmtx {
    pub fn parse(table: &[u8], number_of_h_metrics: u16, num_glyphs: u16) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);
        let mut metrics = Vec::with_capacity(usize::from(num_glyphs));

        for _ in 0..number_of_h_metrics {
            let advance_width = reader.parse_u16()?;
            let lsb = reader.parse_i16()?;

            metrics.push(HMetric { advance_width, lsb });
        }

        let last_advance = metrics.last().map(|m| m.advance_width).unwrap_or(0);

        // the tail of the table is bare left side bearings sharing the last
        // advance width
        for _ in number_of_h_metrics..num_glyphs {
            let lsb = reader.parse_i16().unwrap_or(0);

            metrics.push(HMetric {
                advance_width: last_advance,
                lsb,
            });
        }

        Ok(Self { metrics })
    }

    pub fn advance_width(&self, glyph_id: u16) -> u16 {
        self.metrics
            .get(usize::from(glyph_id))
            .or(self.metrics.last())
            .map(|m| m.advance_width)
            .unwrap_or(0)
    }
}
