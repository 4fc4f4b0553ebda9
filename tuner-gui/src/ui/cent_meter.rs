//! # Cent Meter Widget
//!
//! A horizontal needle showing how far the current pitch is from the
//! nearest note, with color-coded accuracy zones.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

/// The meter spans -50 to +50 cents, half a semitone either way.
const METER_RANGE: f32 = 50.0;

/// Scale marks, in cents from center.
const TICKS: [f32; 8] = [-40.0, -30.0, -20.0, -10.0, 10.0, 20.0, 30.0, 40.0];

pub struct CentMeter {
    /// Current cent deviation (None if no note)
    cents: Option<f32>,
}

impl CentMeter {
    pub fn new(cents: Option<f32>) -> Self {
        Self { cents }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(80.0)),
        )
        .into()
    }
}

/// Horizontal position of a cent value on a meter `width` pixels wide.
fn cents_to_x(cents: f32, width: f32) -> f32 {
    let clamped = cents.clamp(-METER_RANGE, METER_RANGE);
    (clamped + METER_RANGE) / (2.0 * METER_RANGE) * width
}

impl<Message> canvas::Program<Message> for CentMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        for tick in TICKS {
            let x = cents_to_x(tick, bounds.width);
            let mark = Path::line(
                Point::new(x, bounds.height * 0.7),
                Point::new(x, bounds.height),
            );
            frame.stroke(
                &mark,
                Stroke::default()
                    .with_width(1.0)
                    .with_color(Color::from_rgb8(0x90, 0x90, 0x90)),
            );
        }

        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default()
                .with_width(2.0)
                .with_color(Color::WHITE),
        );

        if let Some(c) = self.cents {
            let needle_pos = cents_to_x(c, bounds.width);

            let color = if c.abs() < 5.0 {
                Color::from_rgb8(0x34, 0xDB, 0x98) // Green
            } else if c.abs() < 20.0 {
                Color::from_rgb8(0xFF, 0xC3, 0x00) // Yellow
            } else {
                Color::from_rgb8(0xFF, 0x33, 0x33) // Red
            };

            let needle =
                Path::rectangle(Point::new(needle_pos - 2.0, 0.0), Size::new(4.0, bounds.height));
            frame.fill(&needle, color);
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needle_position_is_clamped() {
        assert_eq!(cents_to_x(0.0, 200.0), 100.0);
        assert_eq!(cents_to_x(-50.0, 200.0), 0.0);
        assert_eq!(cents_to_x(25.0, 200.0), 150.0);
        assert_eq!(cents_to_x(80.0, 200.0), 200.0);
    }
}
