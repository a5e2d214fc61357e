//! Drawing surfaces
//!
//! The renderer only issues the primitive calls in [`Surface`], so the same
//! frame can go to a live view, an SVG file, or an in-memory display list.

use crate::error::SurfaceError;

use super::color::Color;

/// A point in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 2D paintable target with fixed pixel dimensions
pub trait Surface {
    /// Pixel dimensions (width, height)
    fn size(&self) -> (u32, u32);

    /// Reset the whole surface to `color`
    fn clear(&mut self, color: Color) -> Result<(), SurfaceError>;

    fn fill_rect(
        &mut self,
        origin: Point,
        width: f64,
        height: f64,
        color: Color,
    ) -> Result<(), SurfaceError>;

    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Color,
    ) -> Result<(), SurfaceError>;

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color)
        -> Result<(), SurfaceError>;

    fn fill_polygon(&mut self, points: &[Point], color: Color) -> Result<(), SurfaceError>;

    /// Draw `text` centred on `center`
    fn draw_text(
        &mut self,
        text: &str,
        center: Point,
        font_size: f64,
        color: Color,
    ) -> Result<(), SurfaceError>;
}

/// One recorded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillRect {
        origin: Point,
        width: f64,
        height: f64,
        color: Color,
    },
    StrokeLine {
        from: Point,
        to: Point,
        width: f64,
        color: Color,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: Color,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Color,
    },
    Text {
        text: String,
        center: Point,
        font_size: f64,
        color: Color,
    },
}

/// Detached surface that keeps the current frame as a display list
///
/// `clear` starts a new frame. The list can be inspected or replayed onto
/// any other surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Rebuild a frame from a previously taken display list
    pub fn from_commands(size: (u32, u32), commands: Vec<DrawCommand>) -> Self {
        Self {
            width: size.0,
            height: size.1,
            commands,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Draw the recorded frame onto `target`
    pub fn replay(&self, target: &mut dyn Surface) -> Result<(), SurfaceError> {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => target.clear(*color)?,
                DrawCommand::FillRect {
                    origin,
                    width,
                    height,
                    color,
                } => target.fill_rect(*origin, *width, *height, *color)?,
                DrawCommand::StrokeLine {
                    from,
                    to,
                    width,
                    color,
                } => target.stroke_line(*from, *to, *width, *color)?,
                DrawCommand::FillCircle {
                    center,
                    radius,
                    color,
                } => target.fill_circle(*center, *radius, *color)?,
                DrawCommand::FillPolygon { points, color } => target.fill_polygon(points, *color)?,
                DrawCommand::Text {
                    text,
                    center,
                    font_size,
                    color,
                } => target.draw_text(text, *center, *font_size, *color)?,
            }
        }
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) -> Result<(), SurfaceError> {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
        Ok(())
    }

    fn fill_rect(
        &mut self,
        origin: Point,
        width: f64,
        height: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::FillRect {
            origin,
            width,
            height,
            color,
        });
        Ok(())
    }

    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            width,
            color,
        });
        Ok(())
    }

    fn fill_circle(
        &mut self,
        center: Point,
        radius: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
        Ok(())
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            color,
        });
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        center: Point,
        font_size: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            center,
            font_size,
            color,
        });
        Ok(())
    }
}
