use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke, Text};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::state::data::{Coordinate, Region};
use crate::Message;

const LAND: Color = Color::from_rgb(0.93, 0.92, 0.87);
const GRID: Color = Color::from_rgb(0.75, 0.75, 0.72);
const PIN: Color = Color::from_rgb(0.86, 0.16, 0.16);

/// Schematic map of a region: a graticule with a pin.
///
/// The picker variant turns clicks into coordinates and the scroll wheel
/// into zoom; the detail variant only displays.
pub struct MapCanvas {
    pub region: Region,
    pub pin: Option<Coordinate>,
    pub interactive: bool,
}

/// Spacing between graticule lines for a given span (1, 2 or 5 x 10^n degrees)
pub fn grid_step(span_degrees: f64) -> f64 {
    let raw = (span_degrees / 5.0).max(1e-6);
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.5 {
        2.0
    } else if normalized < 7.5 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Multiples of `step` in `[min, max]`
pub fn grid_lines(min: f64, max: f64, step: f64) -> Vec<f64> {
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

impl Program<Message> for MapCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let (width, height) = (bounds.width, bounds.height);

        frame.fill_rectangle(Point::ORIGIN, Size::new(width, height), LAND);

        let half = self.region.span_degrees / 2.0;
        let center = self.region.center;
        let step = grid_step(self.region.span_degrees);
        let grid = || Stroke::default().with_color(GRID).with_width(1.0);

        for longitude in grid_lines(center.longitude - half, center.longitude + half, step) {
            let (x, _) = self
                .region
                .position_of(Coordinate::new(center.latitude, longitude), width, height);
            frame.stroke(&Path::line(Point::new(x, 0.0), Point::new(x, height)), grid());
        }
        for latitude in grid_lines(center.latitude - half, center.latitude + half, step) {
            let (_, y) = self
                .region
                .position_of(Coordinate::new(latitude, center.longitude), width, height);
            frame.stroke(&Path::line(Point::new(0.0, y), Point::new(width, y)), grid());
        }

        if let Some(pin) = self.pin {
            let (x, y) = self.region.position_of(pin, width, height);
            frame.fill(&Path::circle(Point::new(x, y), 8.0), PIN);
            frame.stroke(
                &Path::circle(Point::new(x, y), 8.0),
                Stroke::default().with_color(Color::WHITE).with_width(2.0),
            );
        }

        frame.fill_text(Text {
            content: format!("{}  (span {:.3}°)", center, self.region.span_degrees),
            position: Point::new(8.0, height - 20.0),
            color: Color::from_rgb(0.3, 0.3, 0.3),
            size: 12.0.into(),
            ..Text::default()
        });

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if !self.interactive {
            return (canvas::event::Status::Ignored, None);
        }

        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    let zoom_delta = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y * 0.1,
                        mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
                    };
                    return (canvas::event::Status::Captured, Some(Message::MapZoom(zoom_delta)));
                }
            }

            // Click selects a point
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    let coordinate = self.region.coordinate_at(
                        position.x,
                        position.y,
                        bounds.width,
                        bounds.height,
                    );
                    return (canvas::event::Status::Captured, Some(Message::MapTapped(coordinate)));
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_step_is_nice() {
        assert!((grid_step(0.1) - 0.02).abs() < 1e-12);
        assert!((grid_step(0.01) - 0.002).abs() < 1e-12);
        assert!((grid_step(180.0) - 50.0).abs() < 1e-9);
        assert!((grid_step(1.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_grid_lines_cover_range() {
        let lines = grid_lines(-0.05, 0.05, 0.02);
        assert_eq!(lines.len(), 5);
        assert!((lines[0] + 0.04).abs() < 1e-9);
        assert!((lines[4] - 0.04).abs() < 1e-9);
    }
}
