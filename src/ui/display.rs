//! SSD1306 OLED status panel.
//!
//! One frame per screen variant; the supervisor decides when to redraw.
//! Layouts follow a framed 122x60 panel with horizontal rule lines
//! separating title, status and hint rows.

use core::fmt::Write as _;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use crate::app::Screen;

/// Type alias for the concrete display driver.
///
/// Generic over the I2C implementation so callers pass in their HAL's
/// I2C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Display<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    let _ = display.init();
    display.clear_buffer();
    let _ = display.flush();
    display
}

fn text_style() -> embedded_graphics::mono_font::MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

fn stroke() -> PrimitiveStyle<BinaryColor> {
    PrimitiveStyle::with_stroke(BinaryColor::On, 1)
}

/// Outer frame shared by every screen.
fn draw_frame<I2C>(display: &mut Display<I2C>)
where
    I2C: embedded_hal::i2c::I2c,
{
    let _ = Rectangle::new(Point::new(3, 3), Size::new(122, 60))
        .into_styled(stroke())
        .draw(display);
}

fn hline<I2C>(display: &mut Display<I2C>, y: i32)
where
    I2C: embedded_hal::i2c::I2c,
{
    let _ = Line::new(Point::new(3, y), Point::new(123, y))
        .into_styled(stroke())
        .draw(display);
}

fn sd_state_line(mounted: bool) -> &'static str {
    if mounted {
        "SD: MOUNTED"
    } else {
        "SD: UNMOUNTED"
    }
}

/// Render one screen variant and push the frame out.
pub fn render<I2C>(display: &mut Display<I2C>, screen: &Screen)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();
    draw_frame(display);

    match screen {
        Screen::Capture { roll_deg, pitch_deg } => {
            hline(display, 25);
            hline(display, 37);
            let _ = Text::new("CAPTURING", Point::new(22, 12), text_style()).draw(display);
            let _ = Text::new("DATA", Point::new(33, 22), text_style()).draw(display);
            let _ = Text::new("IMU    MPU6050", Point::new(10, 34), text_style()).draw(display);
            let _ = Line::new(Point::new(63, 37), Point::new(63, 62))
                .into_styled(stroke())
                .draw(display);

            let mut roll: heapless::String<12> = heapless::String::new();
            let mut pitch: heapless::String<12> = heapless::String::new();
            let _ = write!(roll, "{:5.1}", roll_deg);
            let _ = write!(pitch, "{:5.1}", pitch_deg);
            let _ = Text::new("roll", Point::new(14, 47), text_style()).draw(display);
            let _ = Text::new(roll.as_str(), Point::new(14, 58), text_style()).draw(display);
            let _ = Text::new("pitch", Point::new(73, 47), text_style()).draw(display);
            let _ = Text::new(pitch.as_str(), Point::new(73, 58), text_style()).draw(display);
        }
        Screen::Status { mounted } => {
            hline(display, 30);
            hline(display, 47);
            let _ = Text::new("SYSTEM", Point::new(35, 14), text_style()).draw(display);
            let _ = Text::new("READY", Point::new(38, 26), text_style()).draw(display);
            let _ = Text::new(sd_state_line(*mounted), Point::new(8, 42), text_style()).draw(display);
            let _ = Text::new("g=HELP", Point::new(35, 58), text_style()).draw(display);
        }
        Screen::Listing => {
            hline(display, 18);
            hline(display, 30);
            let _ = Text::new("SD CARD", Point::new(30, 14), text_style()).draw(display);
            let _ = Text::new("DIRECTORY", Point::new(22, 26), text_style()).draw(display);
            let _ = Text::new("FILE LIST ON", Point::new(22, 40), text_style()).draw(display);
            let _ = Text::new("THE CONSOLE", Point::new(22, 52), text_style()).draw(display);
        }
        Screen::Reading => {
            hline(display, 18);
            hline(display, 30);
            let _ = Text::new("SD CARD", Point::new(30, 14), text_style()).draw(display);
            let _ = Text::new("READBACK", Point::new(26, 26), text_style()).draw(display);
            let _ = Text::new("CONTENTS ON", Point::new(22, 40), text_style()).draw(display);
            let _ = Text::new("THE CONSOLE", Point::new(22, 52), text_style()).draw(display);
        }
        Screen::Stopped { samples } => {
            hline(display, 30);
            hline(display, 47);
            let _ = Text::new("DATA SAVED", Point::new(22, 14), text_style()).draw(display);
            let _ = Text::new("TO SD CARD", Point::new(22, 26), text_style()).draw(display);
            let mut count: heapless::String<16> = heapless::String::new();
            let _ = write!(count, "SAMPLES: {}", samples);
            let _ = Text::new(count.as_str(), Point::new(8, 42), text_style()).draw(display);
            let _ = Text::new("FILE: mpu_data", Point::new(5, 58), text_style()).draw(display);
        }
        Screen::Error { mounted } => {
            hline(display, 30);
            hline(display, 47);
            let _ = Text::new("COMMAND ERROR", Point::new(10, 14), text_style()).draw(display);
            let _ = Text::new("CHECK INPUT", Point::new(22, 26), text_style()).draw(display);
            let _ = Text::new(sd_state_line(*mounted), Point::new(8, 42), text_style()).draw(display);
            let _ = Text::new("g=HELP", Point::new(35, 58), text_style()).draw(display);
        }
        Screen::Help => {
            hline(display, 18);
            let _ = Text::new("MOTIONLOG", Point::new(24, 14), text_style()).draw(display);
            let _ = Text::new("BTN A: MOUNT /", Point::new(6, 28), text_style()).draw(display);
            let _ = Text::new("       UNMOUNT", Point::new(6, 38), text_style()).draw(display);
            let _ = Text::new("BTN B: START /", Point::new(6, 48), text_style()).draw(display);
            let _ = Text::new("       STOP CAP", Point::new(6, 58), text_style()).draw(display);
        }
    }

    let _ = display.flush();
}
