//! `Surface` implementation on top of plotters drawing backends
//!
//! Any plotters `DrawingBackend` (SVG file, SVG string, bitmap, ...) can host
//! a rendered lattice frame. Coordinates are rounded to whole pixels here.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::{
    Circle, DrawingArea, DrawingBackend, IntoDrawingArea, IntoFont, PathElement, Polygon,
    RGBAColor, RGBColor, Rectangle, Text,
};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::Color as PlotColor;
use plotters_svg::SVGBackend;

use crate::error::SurfaceError;

use super::color::Color;
use super::surface::{Point, RecordingSurface, Surface};

const FONT_FAMILY: &str = "sans-serif";

pub struct PlottersSurface<DB: DrawingBackend> {
    area: DrawingArea<DB, Shift>,
}

impl<DB: DrawingBackend> PlottersSurface<DB> {
    pub fn new(area: DrawingArea<DB, Shift>) -> Self {
        Self { area }
    }

    pub fn from_backend(backend: DB) -> Self {
        Self::new(backend.into_drawing_area())
    }

    /// Flush everything drawn so far to the backend
    pub fn present(&self) -> Result<(), SurfaceError> {
        self.area.present().map_err(backend_error)
    }

    pub fn into_area(self) -> DrawingArea<DB, Shift> {
        self.area
    }
}

fn backend_error(err: impl std::fmt::Display) -> SurfaceError {
    SurfaceError::Backend(err.to_string())
}

fn to_plot_color(color: Color) -> RGBAColor {
    RGBColor(color.r, color.g, color.b).mix(color.opacity())
}

fn to_coord(p: Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

impl<DB: DrawingBackend> Surface for PlottersSurface<DB> {
    fn size(&self) -> (u32, u32) {
        self.area.dim_in_pixel()
    }

    fn clear(&mut self, color: Color) -> Result<(), SurfaceError> {
        self.area
            .fill(&to_plot_color(color))
            .map_err(backend_error)
    }

    fn fill_rect(
        &mut self,
        origin: Point,
        width: f64,
        height: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        let corner = Point::new(origin.x + width, origin.y + height);
        self.area
            .draw(&Rectangle::new(
                [to_coord(origin), to_coord(corner)],
                to_plot_color(color).filled(),
            ))
            .map_err(backend_error)
    }

    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        let stroke = width.round().max(1.0) as u32;
        self.area
            .draw(&PathElement::new(
                vec![to_coord(from), to_coord(to)],
                to_plot_color(color).stroke_width(stroke),
            ))
            .map_err(backend_error)
    }

    fn fill_circle(
        &mut self,
        center: Point,
        radius: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.area
            .draw(&Circle::new(
                to_coord(center),
                radius.round() as i32,
                to_plot_color(color).filled(),
            ))
            .map_err(backend_error)
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) -> Result<(), SurfaceError> {
        let coords: Vec<(i32, i32)> = points.iter().copied().map(to_coord).collect();
        self.area
            .draw(&Polygon::new(coords, to_plot_color(color).filled()))
            .map_err(backend_error)
    }

    fn draw_text(
        &mut self,
        text: &str,
        center: Point,
        font_size: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        let style = (FONT_FAMILY, font_size)
            .into_font()
            .color(&to_plot_color(color))
            .pos(Pos::new(HPos::Center, VPos::Center));
        self.area
            .draw(&Text::new(text.to_string(), to_coord(center), style))
            .map_err(backend_error)
    }
}

/// Run `draw` against an in-memory SVG document and return its text
pub fn render_svg_string<T>(
    size: (u32, u32),
    draw: impl FnOnce(&mut dyn Surface) -> Result<T, SurfaceError>,
) -> Result<(String, T), SurfaceError> {
    let mut buffer = String::new();
    let value = {
        let mut surface = PlottersSurface::from_backend(SVGBackend::with_string(&mut buffer, size));
        let value = draw(&mut surface)?;
        surface.present()?;
        value
    };
    Ok((buffer, value))
}

/// Write a recorded frame to `path` as SVG
pub fn write_svg(path: &Path, frame: &RecordingSurface) -> Result<(), SurfaceError> {
    let mut target = PlottersSurface::from_backend(SVGBackend::new(path, frame.size()));
    frame.replay(&mut target)?;
    target.present()
}
