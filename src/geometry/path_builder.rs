use super::{PathCommand, Point};

/// Accumulates absolute path commands for one glyph
#[derive(Debug)]
pub struct PathBuilder {
    commands: Vec<PathCommand>,
    open: bool,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            open: false,
        }
    }

    /// Starts a new contour, closing the previous one if it is still open
    pub fn move_to(&mut self, p: Point) {
        if self.open {
            self.commands.push(PathCommand::Close);
        }
        self.commands.push(PathCommand::MoveTo(p));
        self.open = true;
    }

    pub fn line_to(&mut self, p: Point) {
        self.commands.push(PathCommand::LineTo(p));
    }

    pub fn quad_to(&mut self, control: Point, p: Point) {
        self.commands.push(PathCommand::QuadTo(control, p));
    }

    pub fn cubic_to(&mut self, control1: Point, control2: Point, p: Point) {
        self.commands.push(PathCommand::CubicTo(control1, control2, p));
    }

    pub fn close(&mut self) {
        if self.open {
            self.commands.push(PathCommand::Close);
            self.open = false;
        }
    }

    pub fn finish(mut self) -> Vec<PathCommand> {
        self.close();
        self.commands
    }
}
