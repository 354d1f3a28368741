//! # Scale Ladder Widget
//!
//! Draws the eight rungs of the major scale from Do (bottom) to the octave
//! Do (top) and a marker at the singer's current position. Positions are
//! continuous, so the marker glides between rungs; while listening without a
//! pitch it rests half a step below the bottom rung.

use iced::alignment;
use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Pixels, Point, Rectangle, Renderer, Theme};
use solfege_core::scale::SOLFEGE_SYLLABLES;
use solfege_core::tuning;

/// Vertical span drawn, in ladder steps: from the rest position to half a
/// step above the top rung.
const LOWEST_SHOWN: f32 = -1.0;
const HIGHEST_SHOWN: f32 = 8.0;

/// Marker counts as "on" a rung within this distance.
const ON_TONE_TOLERANCE: f32 = 0.1;

/// Width reserved for the rung labels on the left.
const LABEL_WIDTH: f32 = 120.0;

pub struct ScaleLadder {
    /// Position to draw, `None` to hide the marker.
    position: Option<f32>,
    low_tones: [f32; 8],
    high_tones: [f32; 8],
}

impl ScaleLadder {
    pub fn new(position: Option<f32>, low_tones: [f32; 8], high_tones: [f32; 8]) -> Self {
        Self {
            position,
            low_tones,
            high_tones,
        }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }
}

/// Y coordinate of a ladder position within `height`.
fn y_for(position: f32, height: f32) -> f32 {
    let t = (position - LOWEST_SHOWN) / (HIGHEST_SHOWN - LOWEST_SHOWN);
    height - t * height
}

impl<Message> canvas::Program<Message> for ScaleLadder {
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

        if !bounds.width.is_finite() || !bounds.height.is_finite() {
            return vec![frame.into_geometry()];
        }

        // Rungs with their syllable and the note names in both registers
        for (index, syllable) in SOLFEGE_SYLLABLES.iter().enumerate() {
            let y = y_for(index as f32, bounds.height);
            let rung = Path::line(Point::new(LABEL_WIDTH, y), Point::new(bounds.width - 10.0, y));
            frame.stroke(
                &rung,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb8(0x90, 0x90, 0x90)),
            );

            let names = [self.low_tones[index], self.high_tones[index]]
                .map(|f| tuning::note_label(f).unwrap_or_default());
            frame.fill_text(canvas::Text {
                content: format!("{:<4}{} / {}", syllable, names[0], names[1]),
                position: Point::new(10.0, y),
                color: Color::WHITE,
                size: Pixels(14.0),
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
        }

        // Marker
        if let Some(position) = self.position {
            let y = y_for(position, bounds.height);
            let color = if position < 0.0 {
                Color::from_rgb8(0x80, 0x80, 0x80) // Gray, resting
            } else if (position - position.round()).abs() < ON_TONE_TOLERANCE {
                Color::from_rgb8(0x34, 0xDB, 0x98) // Green
            } else {
                Color::from_rgb8(0xFF, 0xC3, 0x00) // Yellow
            };
            let x = LABEL_WIDTH + (bounds.width - LABEL_WIDTH) / 2.0;
            let marker = Path::circle(Point::new(x, y), 10.0);
            frame.fill(&marker, color);
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rungs_run_bottom_to_top() {
        let height = 900.0;
        assert!(y_for(0.0, height) > y_for(7.0, height));
        assert!(y_for(-0.5, height) < height);
        assert!(y_for(7.0, height) > 0.0);
    }
}
