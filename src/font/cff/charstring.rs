use std::collections::VecDeque;

use crate::{
    error::{FontError, FontResult},
    font::cff::index::CffIndex,
    geometry::{PathBuilder, PathCommand, Point},
};

/// Type 2 operand stack limit
const STACK_LIMIT: usize = 513;
/// Type 2 subroutine nesting limit
const CALL_LIMIT: usize = 10;

#[derive(Debug)]
pub struct Glyph {
    pub commands: Vec<PathCommand>,
    pub width: f64,
}

/// The Type 2 CharString virtual machine.
///
/// Subroutine calls share a single operand stack with their caller: numbers
/// pushed before `callsubr` are consumed by operators inside the
/// subroutine. Execution therefore runs over an explicit instruction
/// pointer and a call stack of `(data, ip)` frames rather than recursing.
pub struct CharStringInterpreter<'a> {
    global_subrs: &'a CffIndex<'a>,
    local_subrs: Option<&'a CffIndex<'a>>,
    num_regions: u16,
    default_width_x: f64,
    nominal_width_x: f64,

    stack: VecDeque<f64>,
    frames: Vec<(&'a [u8], usize)>,
    x: f64,
    y: f64,
    path: PathBuilder,
    n_stems: usize,
    width: Option<f64>,
    have_width: bool,
    transient: [f64; 32],
    noted_transient: bool,
}

impl<'a> CharStringInterpreter<'a> {
    pub fn new(
        global_subrs: &'a CffIndex<'a>,
        local_subrs: Option<&'a CffIndex<'a>>,
        default_width_x: f64,
        nominal_width_x: f64,
    ) -> Self {
        Self {
            global_subrs,
            local_subrs,
            num_regions: 0,
            default_width_x,
            nominal_width_x,
            stack: VecDeque::new(),
            frames: Vec::new(),
            x: 0.0,
            y: 0.0,
            path: PathBuilder::new(),
            n_stems: 0,
            width: None,
            have_width: false,
            transient: [0.0; 32],
            noted_transient: false,
        }
    }

    /// CharStrings in CFF2 carry no width prefix and may use `vsindex` and
    /// `blend`
    pub fn new_cff2(
        global_subrs: &'a CffIndex<'a>,
        local_subrs: Option<&'a CffIndex<'a>>,
        num_regions: u16,
    ) -> Self {
        let mut interpreter = Self::new(global_subrs, local_subrs, 0.0, 0.0);
        interpreter.num_regions = num_regions;
        interpreter.have_width = true;
        interpreter
    }

    pub fn evaluate(mut self, charstring: &'a [u8]) -> FontResult<Glyph> {
        let mut data = charstring;
        let mut ip = 0usize;

        'execute: loop {
            if ip >= data.len() {
                // running off the end of a subroutine is an implicit return
                match self.frames.pop() {
                    Some((caller, caller_ip)) => {
                        data = caller;
                        ip = caller_ip;
                        continue;
                    }
                    None => break,
                }
            }

            let b0 = data[ip];
            ip += 1;

            match b0 {
                // hstem, vstem, hstemhm, vstemhm
                1 | 3 | 18 | 23 => self.stems()?,
                // hintmask, cntrmask: implicit stems, then mask bytes from
                // the instruction stream
                19 | 20 => {
                    self.stems()?;
                    ip += self.n_stems.div_ceil(8);
                }
                // dy1 vmoveto
                4 => {
                    self.take_width(1);
                    let dy = self.pop_front();
                    self.move_pen(0.0, dy);
                    self.stack.clear();
                }
                // dx1 dy1 rmoveto
                21 => {
                    self.take_width(2);
                    let dx = self.pop_front();
                    let dy = self.pop_front();
                    self.move_pen(dx, dy);
                    self.stack.clear();
                }
                // dx1 hmoveto
                22 => {
                    self.take_width(1);
                    let dx = self.pop_front();
                    self.move_pen(dx, 0.0);
                    self.stack.clear();
                }
                // {dxa dya}+ rlineto
                5 => {
                    while self.stack.len() >= 2 {
                        let dx = self.pop_front();
                        let dy = self.pop_front();
                        self.line(dx, dy);
                    }
                    self.stack.clear();
                }
                // alternating horizontal/vertical lines
                6 => self.alternating_lines(true),
                7 => self.alternating_lines(false),
                // {dxa dya dxb dyb dxc dyc}+ rrcurveto
                8 => {
                    while self.stack.len() >= 6 {
                        self.curve_from_stack();
                    }
                    self.stack.clear();
                }
                // {curves}* + one line pair
                24 => {
                    while self.stack.len() > 2 {
                        self.curve_from_stack();
                    }
                    let dx = self.pop_front();
                    let dy = self.pop_front();
                    self.line(dx, dy);
                    self.stack.clear();
                }
                // {line pairs}* + one curve
                25 => {
                    while self.stack.len() > 6 {
                        let dx = self.pop_front();
                        let dy = self.pop_front();
                        self.line(dx, dy);
                    }
                    self.curve_from_stack();
                    self.stack.clear();
                }
                // dx1? {dya dxb dyb dyc}+ vvcurveto
                26 => {
                    let mut dx1 = if self.stack.len() % 4 != 0 {
                        self.pop_front()
                    } else {
                        0.0
                    };
                    while self.stack.len() >= 4 {
                        let dya = self.pop_front();
                        let dxb = self.pop_front();
                        let dyb = self.pop_front();
                        let dyc = self.pop_front();
                        self.curve(dx1, dya, dxb, dyb, 0.0, dyc);
                        dx1 = 0.0;
                    }
                    self.stack.clear();
                }
                // dy1? {dxa dxb dyb dxc}+ hhcurveto
                27 => {
                    let mut dy1 = if self.stack.len() % 4 != 0 {
                        self.pop_front()
                    } else {
                        0.0
                    };
                    while self.stack.len() >= 4 {
                        let dxa = self.pop_front();
                        let dxb = self.pop_front();
                        let dyb = self.pop_front();
                        let dxc = self.pop_front();
                        self.curve(dxa, dy1, dxb, dyb, dxc, 0.0);
                        dy1 = 0.0;
                    }
                    self.stack.clear();
                }
                // alternating curves with an optional trailing coordinate on
                // the last one
                30 => self.alternating_curves(false),
                31 => self.alternating_curves(true),
                // subr# callsubr
                10 => {
                    if let Some((subr, caller_ip)) = self.call_subr(self.local_subrs, ip)? {
                        self.frames.push((data, caller_ip));
                        data = subr;
                        ip = 0;
                    }
                }
                // globalsubr# callgsubr
                29 => {
                    if let Some((subr, caller_ip)) =
                        self.call_subr(Some(self.global_subrs), ip)?
                    {
                        self.frames.push((data, caller_ip));
                        data = subr;
                        ip = 0;
                    }
                }
                // return
                11 => match self.frames.pop() {
                    Some((caller, caller_ip)) => {
                        data = caller;
                        ip = caller_ip;
                    }
                    None => break,
                },
                // endchar
                14 => {
                    let expected = if self.stack.len() >= 4 { 4 } else { 0 };
                    if expected == 4 {
                        log::debug!("ignoring endchar accent composition arguments");
                    }
                    self.take_width(expected);
                    self.path.close();
                    break 'execute;
                }
                // vsindex: selects an ItemVariationData; only the default
                // instance is produced
                15 => {
                    let _ = self.pop_back();
                    self.stack.clear();
                }
                // blend: drop the n·num_regions delta operands, keep the n
                // base operands
                16 => {
                    let n = self.pop_back().max(0.0) as usize;
                    let deltas = n * usize::from(self.num_regions);
                    for _ in 0..deltas {
                        let _ = self.pop_back();
                    }
                }
                12 => {
                    let b1 = *data
                        .get(ip)
                        .ok_or(anyhow::anyhow!("truncated escape operator"))?;
                    ip += 1;
                    self.escape_op(b1);
                }
                // numbers
                28 => {
                    let bytes = charstring_bytes(data, &mut ip, 2)?;
                    self.push(f64::from(i16::from_be_bytes([bytes[0], bytes[1]])))?;
                }
                32..=246 => self.push(f64::from(i32::from(b0) - 139))?,
                247..=250 => {
                    let b1 = charstring_bytes(data, &mut ip, 1)?[0];
                    self.push(f64::from(
                        (i32::from(b0) - 247) * 256 + i32::from(b1) + 108,
                    ))?;
                }
                251..=254 => {
                    let b1 = charstring_bytes(data, &mut ip, 1)?[0];
                    self.push(f64::from(
                        -(i32::from(b0) - 251) * 256 - i32::from(b1) - 108,
                    ))?;
                }
                // 16.16 fixed point
                255 => {
                    let bytes = charstring_bytes(data, &mut ip, 4)?;
                    let fixed = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    self.push(f64::from(fixed) / 65536.0)?;
                }
                // reserved operator: drop its operands and continue
                _ => {
                    log::debug!("skipping reserved charstring operator {}", b0);
                    self.stack.clear();
                }
            }
        }

        Ok(Glyph {
            commands: self.path.finish(),
            width: self.width.unwrap_or(self.default_width_x),
        })
    }

    /// Arithmetic and storage operators behind the `12` escape
    fn escape_op(&mut self, b1: u8) {
        match b1 {
            // and
            3 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(bool_operand(a != 0.0 && b != 0.0));
            }
            // or
            4 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(bool_operand(a != 0.0 || b != 0.0));
            }
            // not
            5 => {
                let a = self.pop_back();
                let _ = self.push(bool_operand(a == 0.0));
            }
            // abs
            9 => {
                let a = self.pop_back();
                let _ = self.push(a.abs());
            }
            // add
            10 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(a + b);
            }
            // sub
            11 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(a - b);
            }
            // div
            12 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(if b == 0.0 { 0.0 } else { a / b });
            }
            // neg
            14 => {
                let a = self.pop_back();
                let _ = self.push(-a);
            }
            // eq
            15 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(bool_operand(a == b));
            }
            // drop
            18 => {
                let _ = self.pop_back();
            }
            // put
            20 => {
                self.note_transient();
                let i = self.pop_back();
                let value = self.pop_back();
                if let Some(slot) = self.transient.get_mut(i as usize) {
                    *slot = value;
                }
            }
            // get
            21 => {
                self.note_transient();
                let i = self.pop_back();
                let value = self.transient.get(i as usize).copied().unwrap_or(0.0);
                let _ = self.push(value);
            }
            // random: a deterministic constant keeps conversion reproducible
            23 => {
                let _ = self.push(1.0);
            }
            // mul
            24 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(a * b);
            }
            // sqrt
            26 => {
                let a = self.pop_back();
                let _ = self.push(a.abs().sqrt());
            }
            // dup
            27 => {
                let a = self.pop_back();
                let _ = self.push(a);
                let _ = self.push(a);
            }
            // exch
            28 => {
                let b = self.pop_back();
                let a = self.pop_back();
                let _ = self.push(b);
                let _ = self.push(a);
            }
            // index
            29 => {
                let n = self.pop_back().max(0.0) as usize;
                let value = if self.stack.len() > n {
                    self.stack[self.stack.len() - 1 - n]
                } else {
                    0.0
                };
                let _ = self.push(value);
            }
            // roll
            30 => {
                let j = self.pop_back() as i64;
                let n = self.pop_back().max(0.0) as usize;
                self.roll(n, j);
            }
            // flex family
            34 => self.hflex(),
            35 => self.flex(),
            36 => self.hflex1(),
            37 => self.flex1(),
            _ => {
                log::debug!("skipping reserved charstring operator 12 {}", b1);
                self.stack.clear();
            }
        }
    }

    fn push(&mut self, value: f64) -> FontResult<()> {
        if self.stack.len() >= STACK_LIMIT {
            anyhow::bail!(FontError::CharStringOverflow);
        }
        self.stack.push_back(value);

        Ok(())
    }

    /// Underflow is recovered by producing zero rather than failing the
    /// glyph
    fn pop_front(&mut self) -> f64 {
        self.stack.pop_front().unwrap_or(0.0)
    }

    fn pop_back(&mut self) -> f64 {
        self.stack.pop_back().unwrap_or(0.0)
    }

    /// Consume the optional width prefix: one extra bottom operand on the
    /// first stack-clearing operator
    fn take_width(&mut self, expected_args: usize) {
        if !self.have_width {
            if self.stack.len() > expected_args {
                let extra = self.pop_front();
                self.width = Some(self.nominal_width_x + extra);
            }
            self.have_width = true;
        }
    }

    fn stems(&mut self) -> FontResult<()> {
        let even = self.stack.len() & !1;
        self.take_width(even);
        self.n_stems += self.stack.len() / 2;
        anyhow::ensure!(self.n_stems <= STACK_LIMIT, "implausible stem count");
        self.stack.clear();

        Ok(())
    }

    fn move_pen(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.path.move_to(Point::new(self.x, self.y));
    }

    fn line(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.path.line_to(Point::new(self.x, self.y));
    }

    fn alternating_lines(&mut self, mut horizontal: bool) {
        while let Some(d) = self.stack.pop_front() {
            if horizontal {
                self.line(d, 0.0);
            } else {
                self.line(0.0, d);
            }
            horizontal = !horizontal;
        }
    }

    /// One cubic from six chained deltas
    fn curve(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx3: f64, dy3: f64) {
        let c1 = Point::new(self.x + dx1, self.y + dy1);
        let c2 = Point::new(c1.x + dx2, c1.y + dy2);
        self.x = c2.x + dx3;
        self.y = c2.y + dy3;
        self.path.cubic_to(c1, c2, Point::new(self.x, self.y));
    }

    fn curve_from_stack(&mut self) {
        let dx1 = self.pop_front();
        let dy1 = self.pop_front();
        let dx2 = self.pop_front();
        let dy2 = self.pop_front();
        let dx3 = self.pop_front();
        let dy3 = self.pop_front();
        self.curve(dx1, dy1, dx2, dy2, dx3, dy3);
    }

    /// vhcurveto/hvcurveto: the tangent axis flips every curve, and a
    /// single optional trailing value lands on the last curve's final
    /// coordinate
    fn alternating_curves(&mut self, mut horizontal: bool) {
        while self.stack.len() >= 4 {
            let trailing = self.stack.len() == 5;
            let d1 = self.pop_front();
            let d2 = self.pop_front();
            let d3 = self.pop_front();
            let d4 = self.pop_front();
            let d5 = if trailing { self.pop_front() } else { 0.0 };

            if horizontal {
                self.curve(d1, 0.0, d2, d3, d5, d4);
            } else {
                self.curve(0.0, d1, d2, d3, d4, d5);
            }

            horizontal = !horizontal;
        }
        self.stack.clear();
    }

    fn flex(&mut self) {
        self.curve_from_stack();
        self.curve_from_stack();
        let _flex_depth = self.pop_front();
        self.stack.clear();
    }

    /// Both curves stay on the starting y; only the joining controls leave
    /// it
    fn hflex(&mut self) {
        let dx1 = self.pop_front();
        let dx2 = self.pop_front();
        let dy2 = self.pop_front();
        let dx3 = self.pop_front();
        let dx4 = self.pop_front();
        let dx5 = self.pop_front();
        let dx6 = self.pop_front();

        self.curve(dx1, 0.0, dx2, dy2, dx3, 0.0);
        self.curve(dx4, 0.0, dx5, -dy2, dx6, 0.0);
        self.stack.clear();
    }

    /// Starts and ends on the same y
    fn hflex1(&mut self) {
        let dx1 = self.pop_front();
        let dy1 = self.pop_front();
        let dx2 = self.pop_front();
        let dy2 = self.pop_front();
        let dx3 = self.pop_front();
        let dx4 = self.pop_front();
        let dx5 = self.pop_front();
        let dy5 = self.pop_front();
        let dx6 = self.pop_front();

        self.curve(dx1, dy1, dx2, dy2, dx3, 0.0);
        self.curve(dx4, 0.0, dx5, dy5, dx6, -(dy1 + dy2 + dy5));
        self.stack.clear();
    }

    /// The final component runs along whichever axis dominates the
    /// accumulated deltas; the other axis returns to the starting value
    fn flex1(&mut self) {
        let start_x = self.x;
        let start_y = self.y;

        let dx1 = self.pop_front();
        let dy1 = self.pop_front();
        let dx2 = self.pop_front();
        let dy2 = self.pop_front();
        let dx3 = self.pop_front();
        let dy3 = self.pop_front();
        let dx4 = self.pop_front();
        let dy4 = self.pop_front();
        let dx5 = self.pop_front();
        let dy5 = self.pop_front();
        let d6 = self.pop_front();

        let dx = dx1 + dx2 + dx3 + dx4 + dx5;
        let dy = dy1 + dy2 + dy3 + dy4 + dy5;

        self.curve(dx1, dy1, dx2, dy2, dx3, dy3);

        let c1 = Point::new(self.x + dx4, self.y + dy4);
        let c2 = Point::new(c1.x + dx5, c1.y + dy5);
        let end = if dx.abs() > dy.abs() {
            Point::new(c2.x + d6, start_y)
        } else {
            Point::new(start_x, c2.y + d6)
        };

        self.x = end.x;
        self.y = end.y;
        self.path.cubic_to(c1, c2, end);
        self.stack.clear();
    }

    /// Pop a biased subroutine number and resolve the call target. Returns
    /// `None` when the subroutine doesn't exist; execution continues in the
    /// caller.
    fn call_subr(
        &mut self,
        subrs: Option<&'a CffIndex<'a>>,
        return_ip: usize,
    ) -> FontResult<Option<(&'a [u8], usize)>> {
        if self.frames.len() >= CALL_LIMIT {
            anyhow::bail!(FontError::CharStringOverflow);
        }

        let number = self.pop_back();
        let Some(subrs) = subrs else {
            log::debug!("charstring calls a subroutine but none are defined");
            return Ok(None);
        };

        let index = number as i64 + i64::from(subrs.bias());
        let Some(subr) = usize::try_from(index).ok().and_then(|i| subrs.get(i)) else {
            log::debug!("charstring calls undefined subroutine {}", number);
            return Ok(None);
        };

        Ok(Some((subr, return_ip)))
    }

    fn roll(&mut self, n: usize, j: i64) {
        let len = self.stack.len();
        if n == 0 || n > len {
            return;
        }

        let slice = self.stack.make_contiguous();
        let top = &mut slice[len - n..];
        let shift = j.rem_euclid(n as i64) as usize;
        top.rotate_right(shift);
    }

    fn note_transient(&mut self) {
        if !self.noted_transient {
            log::debug!("charstring uses the transient array (put/get)");
            self.noted_transient = true;
        }
    }
}

fn bool_operand(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn charstring_bytes<'b>(data: &'b [u8], ip: &mut usize, n: usize) -> FontResult<&'b [u8]> {
    let bytes = data
        .get(*ip..*ip + n)
        .ok_or(anyhow::anyhow!("truncated charstring operand"))?;
    *ip += n;

    Ok(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(charstring: &[u8]) -> Glyph {
        run_with_widths(charstring, 0.0, 0.0)
    }

    fn run_with_widths(charstring: &[u8], default_width_x: f64, nominal_width_x: f64) -> Glyph {
        let gsubrs = CffIndex::empty();
        let interpreter =
            CharStringInterpreter::new(&gsubrs, None, default_width_x, nominal_width_x);
        interpreter.evaluate(charstring).unwrap()
    }

    fn num(v: i32) -> Vec<u8> {
        // 3-byte integer encoding covers every test operand
        assert!((-32768..=32767).contains(&v));
        let mut bytes = vec![28];
        bytes.extend_from_slice(&(v as i16).to_be_bytes());
        bytes
    }

    fn charstring(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn width_prefix_defaults_without_extra_operand() {
        // hmoveto with exactly one operand: no width prefix
        let cs = charstring(&[&num(100), &[22], &[14]]);
        let glyph = run_with_widths(&cs, 500.0, 42.0);

        assert_eq!(glyph.width, 500.0);
        assert_eq!(
            glyph.commands,
            vec![PathCommand::MoveTo(Point::new(100.0, 0.0)), PathCommand::Close]
        );
    }

    #[test]
    fn width_prefix_consumes_extra_bottom_operand() {
        // 42 hmoveto-with-100: width = nominal + 42, pen moves to (100, 0)
        let cs = charstring(&[&num(42), &num(100), &[22], &[14]]);
        let glyph = run_with_widths(&cs, 500.0, 500.0);

        assert_eq!(glyph.width, 542.0);
        assert_eq!(
            glyph.commands,
            vec![PathCommand::MoveTo(Point::new(100.0, 0.0)), PathCommand::Close]
        );
    }

    #[test]
    fn width_prefix_is_consumed_at_most_once() {
        // width on hstem; the later rmoveto sees only its own operands
        let cs = charstring(&[
            &num(542),
            &num(0),
            &num(10),
            &[1], // hstem
            &num(5),
            &num(6),
            &[21], // rmoveto
            &[14],
        ]);
        let glyph = run_with_widths(&cs, 0.0, 0.0);

        assert_eq!(glyph.width, 542.0);
        assert_eq!(glyph.commands[0], PathCommand::MoveTo(Point::new(5.0, 6.0)));
    }

    #[test]
    fn rlineto_draws_relative_lines() {
        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(1000),
            &num(0),
            &num(0),
            &num(1000),
            &[5],
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(
            glyph.commands,
            vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(1000.0, 0.0)),
                PathCommand::LineTo(Point::new(1000.0, 1000.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn hlineto_alternates_axes() {
        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(10),
            &num(20),
            &num(30),
            &[6], // hlineto: h, v, h
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(
            glyph.commands,
            vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(10.0, 0.0)),
                PathCommand::LineTo(Point::new(10.0, 20.0)),
                PathCommand::LineTo(Point::new(40.0, 20.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn vhcurveto_with_trailing_coordinate() {
        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(10),
            &num(20),
            &num(30),
            &num(40),
            &num(5),
            &[30], // vhcurveto
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(
            glyph.commands,
            vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::CubicTo(
                    Point::new(0.0, 10.0),
                    Point::new(20.0, 40.0),
                    Point::new(60.0, 45.0),
                ),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn hvcurveto_eight_values_alternates_phase() {
        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(10),
            &num(10),
            &num(10),
            &num(10),
            &num(10),
            &num(10),
            &num(10),
            &num(10),
            &[31], // hvcurveto: horizontal curve then vertical curve
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(
            glyph.commands,
            vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::CubicTo(
                    Point::new(10.0, 0.0),
                    Point::new(20.0, 10.0),
                    Point::new(20.0, 20.0),
                ),
                PathCommand::CubicTo(
                    Point::new(20.0, 30.0),
                    Point::new(30.0, 40.0),
                    Point::new(40.0, 40.0),
                ),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn moveto_closes_the_open_contour() {
        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(10),
            &num(0),
            &[5],
            &num(50),
            &num(50),
            &[21], // second contour
            &num(0),
            &num(10),
            &[5],
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(
            glyph.commands,
            vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(10.0, 0.0)),
                PathCommand::Close,
                PathCommand::MoveTo(Point::new(60.0, 50.0)),
                PathCommand::LineTo(Point::new(60.0, 60.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn hintmask_skips_mask_bytes_sized_by_stem_count() {
        // nine stems across hstem + implicit vstem on the mask: two mask
        // bytes follow hintmask
        let mut stem_args = Vec::new();
        for i in 0..9 {
            stem_args.extend(num(i * 10));
            stem_args.extend(num(5));
        }
        let cs = charstring(&[
            &stem_args[..2 * 5 * 3], // five stems via hstemhm
            &[18],
            &stem_args[2 * 5 * 3..], // four more as implicit stems
            &[19, 0xFF, 0x80],       // hintmask + 2 mask bytes
            &num(3),
            &num(4),
            &[21],
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(glyph.commands[0], PathCommand::MoveTo(Point::new(3.0, 4.0)));
    }

    #[test]
    fn subroutine_shares_the_operand_stack() {
        // the glyph pushes operands, the subroutine draws with them
        let gsubrs = CffIndex::empty();

        // local subr 0 (bias 107): rlineto; return
        let subr_body: &[u8] = &[5, 11];
        let mut subr_index_bytes = vec![0x00, 0x01, 0x01, 0x01, 0x03];
        subr_index_bytes.extend_from_slice(subr_body);
        let mut cursor = 0;
        let local = crate::font::cff::index::parse_index(&subr_index_bytes, &mut cursor, false).unwrap();

        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(25),
            &num(35),
            &num(-107), // subr number 0 after bias
            &[10],      // callsubr
            &[14],
        ]);

        let interpreter = CharStringInterpreter::new(&gsubrs, Some(&local), 0.0, 0.0);
        let glyph = interpreter.evaluate(&cs).unwrap();

        assert_eq!(
            glyph.commands,
            vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(25.0, 35.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn call_depth_limit_is_enforced() {
        // global subr 0 calls itself forever
        let subr_body: &[u8] = &[28, 0xFF, 0x95, 29]; // -107 callgsubr
        let mut index_bytes = vec![0x00, 0x01, 0x01, 0x01, 0x05];
        index_bytes.extend_from_slice(subr_body);
        let mut cursor = 0;
        let gsubrs = crate::font::cff::index::parse_index(&index_bytes, &mut cursor, false).unwrap();

        let cs = charstring(&[&num(-107), &[29], &[14]]);
        let interpreter = CharStringInterpreter::new(&gsubrs, None, 0.0, 0.0);
        let err = interpreter.evaluate(&cs).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FontError>(),
            Some(FontError::CharStringOverflow)
        ));
    }

    #[test]
    fn blend_keeps_base_operands() {
        // 2 base operands, 3 regions: 6 deltas dropped, then rmoveto uses
        // the bases
        let gsubrs = CffIndex::empty();
        let mut parts: Vec<Vec<u8>> = vec![num(7), num(9)];
        for delta in 0..6 {
            parts.push(num(delta + 100));
        }
        parts.push(num(2)); // n
        parts.push(vec![16]); // blend
        parts.push(vec![21]); // rmoveto
        parts.push(vec![14]);
        let cs: Vec<u8> = parts.concat();

        let interpreter = CharStringInterpreter::new_cff2(&gsubrs, None, 3);
        let glyph = interpreter.evaluate(&cs).unwrap();

        assert_eq!(glyph.commands[0], PathCommand::MoveTo(Point::new(7.0, 9.0)));
    }

    #[test]
    fn arithmetic_operators() {
        // (3 + 4) * 2 = 14 used as a line coordinate
        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(3),
            &num(4),
            &[12, 10], // add
            &num(2),
            &[12, 24], // mul
            &num(0),
            &[12, 28], // exch: y then x on the bottom
            &[5],      // rlineto
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(glyph.commands[1], PathCommand::LineTo(Point::new(0.0, 14.0)));
    }

    #[test]
    fn transient_array_put_get() {
        let cs = charstring(&[
            &num(0),
            &num(0),
            &[21],
            &num(55), // value
            &num(3),  // slot
            &[12, 20], // put
            &num(3),
            &[12, 21], // get
            &num(0),
            &[12, 28], // exch
            &[5],
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(glyph.commands[1], PathCommand::LineTo(Point::new(0.0, 55.0)));
    }

    #[test]
    fn unknown_operator_clears_stack_and_continues() {
        let cs = charstring(&[
            &num(1),
            &num(2),
            &[2], // reserved
            &num(3),
            &num(4),
            &[21],
            &[14],
        ]);
        let glyph = run(&cs);

        assert_eq!(glyph.commands[0], PathCommand::MoveTo(Point::new(3.0, 4.0)));
    }

    #[test]
    fn stack_underflow_produces_zero() {
        let cs = charstring(&[&[21], &[14]]); // rmoveto with no operands
        let glyph = run(&cs);

        assert_eq!(glyph.commands, vec![
            PathCommand::MoveTo(Point::new(0.0, 0.0)),
            PathCommand::Close,
        ]);
    }
}
