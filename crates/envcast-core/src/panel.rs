//! Local display port and its embedded-graphics implementation.
//!
//! The bridge draws short strings at fixed cursor positions and never
//! depends on the outcome; a failed draw must not stall the pipeline.

use core::fmt::Debug;

use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

/// Fixed cursor positions on the 320x240 panel.
pub mod layout {
    pub const TITLE: (i32, i32) = (10, 20);
    pub const TEMPERATURE_LABEL: (i32, i32) = (30, 50);
    pub const PRESSURE_LABEL: (i32, i32) = (30, 80);
    pub const TEMPERATURE_VALUE: (i32, i32) = (180, 50);
    pub const PRESSURE_VALUE: (i32, i32) = (180, 80);
    /// Degraded-mode warning line.
    pub const SENSOR_WARNING: (i32, i32) = (10, 200);
}

/// Text color selection for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelTone {
    /// White on black: captions and readings.
    Normal,
    /// Yellow on black: the sensor-init warning.
    Alert,
}

/// Port for the status display.
pub trait TextPanel {
    type Error: Debug;

    /// Blank the panel.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        tone: PanelTone,
        text: &str,
    ) -> Result<(), Self::Error>;
}

/// [`TextPanel`] over any RGB565 [`DrawTarget`]: the firmware's ILI9342C,
/// or `MockDisplay` in tests.
pub struct EgTextPanel<D> {
    target: D,
}

impl<D> EgTextPanel<D> {
    pub fn new(target: D) -> Self {
        Self { target }
    }
}

impl<D> TextPanel for EgTextPanel<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    type Error = D::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.target.clear(Rgb565::BLACK)
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        tone: PanelTone,
        text: &str,
    ) -> Result<(), Self::Error> {
        let color = match tone {
            PanelTone::Normal => Rgb565::WHITE,
            PanelTone::Alert => Rgb565::YELLOW,
        };
        // Background painted so a fresh value overwrites the previous one.
        let style = MonoTextStyleBuilder::new()
            .font(&FONT_10X20)
            .text_color(color)
            .background_color(Rgb565::BLACK)
            .build();
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.target)?;
        Ok(())
    }
}
