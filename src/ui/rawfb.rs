//! Immediate-mode UI over a raw pixel surface
//!
//! Widget calls are recorded as draw commands. `render` replays them into a
//! staging surface carved from the scratch buffer and then copies the finished
//! frame onto the bound surface in one pass, so the display never shows a
//! half-drawn frame.

use embedded_graphics::mono_font::iso_8859_5::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use tracing::{debug, info, trace};

use super::font::LabelFont;
use super::surface::Surface;
use super::{InitFailure, TextAlign, UiBackend, UiInitError, WindowFlags};
use crate::rotate::Bitmap;

/// Gap between window edge and content, in pixels.
const PADDING: u32 = 4;
/// Gap between rows and between cells of a row.
const SPACING: u32 = 4;
const BORDER_WIDTH: u32 = 1;

pub(crate) const WINDOW_BG: Rgb888 = Rgb888::new(45, 45, 45);
pub(crate) const BORDER: Rgb888 = Rgb888::new(65, 65, 65);
pub(crate) const TEXT: Rgb888 = Rgb888::new(175, 175, 175);
pub(crate) const PROGRESS_BG: Rgb888 = Rgb888::new(38, 38, 38);
pub(crate) const PROGRESS_FILL: Rgb888 = Rgb888::new(120, 120, 120);
const PROGRESS_HANDLE: Rgb888 = Rgb888::new(150, 150, 150);

enum Command {
    Fill { area: Rectangle, color: Rgb888 },
    Border { area: Rectangle, color: Rgb888 },
    Image { area: Rectangle, bitmap: Bitmap },
    Text { area: Rectangle, text: String, align: TextAlign },
}

struct Row {
    top: i32,
    height: u32,
    columns: usize,
    used: usize,
    x: i32,
    /// Set for dynamic rows; static rows take widths from `row_push`.
    dynamic_width: Option<u32>,
    next_width: Option<u32>,
}

struct Window {
    content: Rectangle,
    row: Option<Row>,
}

/// Immediate-mode context bound to one surface.
pub struct RawFbUi<M> {
    surface: Surface<M>,
    staging: Surface<Vec<u8>>,
    commands: Vec<Command>,
    window: Option<Window>,
    font: Option<LabelFont>,
}

impl<M: AsRef<[u8]> + AsMut<[u8]>> RawFbUi<M> {
    /// Rasterise labels through `font` when it has every glyph they need.
    pub fn set_label_font(&mut self, font: LabelFont) {
        self.font = Some(font);
    }

    fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    fn start_row(&mut self, height: u32, columns: usize, dynamic: bool) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let top = match &window.row {
            Some(prev) => prev.top + (prev.height + SPACING) as i32,
            None => window.content.top_left.y,
        };
        let dynamic_width = dynamic.then(|| {
            let gaps = SPACING * columns.saturating_sub(1) as u32;
            window.content.size.width.saturating_sub(gaps) / columns.max(1) as u32
        });
        window.row = Some(Row {
            top,
            height,
            columns,
            used: 0,
            x: window.content.top_left.x,
            dynamic_width,
            next_width: None,
        });
    }

    /// Claim the next cell of the current row, clipped to the window content.
    fn next_cell(&mut self) -> Option<Rectangle> {
        let window = self.window.as_mut()?;
        let row = window.row.as_mut()?;
        if row.used >= row.columns {
            return None;
        }
        let width = row.dynamic_width.or(row.next_width.take()).unwrap_or(0);
        let cell = Rectangle::new(Point::new(row.x, row.top), Size::new(width, row.height));
        row.x += (width + SPACING) as i32;
        row.used += 1;

        let visible = cell.intersection(&window.content);
        (!visible.is_zero_sized()).then_some(visible)
    }

    fn replay(staging: &mut Surface<Vec<u8>>, font: Option<&LabelFont>, command: &Command) {
        match *command {
            Command::Fill { area, color } => {
                area.into_styled(PrimitiveStyle::with_fill(color)).draw(staging).ok();
            }
            Command::Border { area, color } => {
                let style = PrimitiveStyleBuilder::new()
                    .stroke_color(color)
                    .stroke_width(BORDER_WIDTH)
                    .stroke_alignment(StrokeAlignment::Inside)
                    .build();
                area.into_styled(style).draw(staging).ok();
            }
            Command::Image { area, ref bitmap } => {
                let origin = area.top_left;
                let pixels = (0..bitmap.height).flat_map(|y| {
                    (0..bitmap.width).map(move |x| {
                        let v = bitmap.get(x, y);
                        Pixel(origin + Point::new(x as i32, y as i32), Rgb888::new(v, v, v))
                    })
                });
                staging.clipped(&area).draw_iter(pixels).ok();
            }
            Command::Text { area, ref text, align } => {
                if let Some(pixels) = font.and_then(|f| f.rasterize(text, area, align, TEXT, WINDOW_BG)) {
                    staging.clipped(&area).draw_iter(pixels).ok();
                    return;
                }
                let character_style = MonoTextStyle::new(&FONT_6X10, TEXT);
                let center = area.center();
                let (alignment, x) = match align {
                    TextAlign::Left => (Alignment::Left, area.top_left.x),
                    TextAlign::Centered => (Alignment::Center, center.x),
                    TextAlign::Right => (Alignment::Right, area.top_left.x + area.size.width as i32 - 1),
                };
                let text_style = TextStyleBuilder::new().alignment(alignment).baseline(Baseline::Middle).build();
                Text::with_text_style(text, Point::new(x, center.y), character_style, text_style)
                    .draw(&mut staging.clipped(&area))
                    .ok();
            }
        }
    }
}

impl<M: AsRef<[u8]> + AsMut<[u8]>> UiBackend for RawFbUi<M> {
    type Memory = M;

    fn init(surface: Surface<M>, mut scratch: Vec<u8>) -> Result<Self, InitFailure<M>> {
        let geometry = surface.geometry().clone();
        let needed = geometry.frame_len();
        if scratch.capacity() < needed {
            let error = UiInitError::ScratchTooSmall { needed, capacity: scratch.capacity() };
            return Err(InitFailure { error, surface });
        }
        scratch.clear();
        scratch.resize(needed, 0);
        let staging = match Surface::new(scratch, geometry) {
            Ok(staging) => staging,
            Err(e) => return Err(InitFailure { error: e.into(), surface }),
        };

        info!("UI context bound to {}x{} surface", staging.geometry().width, staging.geometry().height);
        Ok(Self { surface, staging, commands: Vec::new(), window: None, font: None })
    }

    fn size(&self) -> Size {
        self.surface.size()
    }

    fn begin(&mut self, title: &str, bounds: Rectangle, flags: WindowFlags) -> bool {
        let area = bounds.intersection(&self.surface.bounding_box());
        if area.is_zero_sized() {
            debug!("Window '{}' is off-screen", title);
            self.window = None;
            return false;
        }

        self.push(Command::Fill { area, color: WINDOW_BG });
        if flags.contains(WindowFlags::BORDER) {
            self.push(Command::Border { area, color: BORDER });
        }

        let inset = PADDING + if flags.contains(WindowFlags::BORDER) { BORDER_WIDTH } else { 0 };
        let content = Rectangle::new(
            area.top_left + Point::new(inset as i32, inset as i32),
            Size::new(
                area.size.width.saturating_sub(2 * inset),
                area.size.height.saturating_sub(2 * inset),
            ),
        );
        self.window = Some(Window { content, row: None });
        true
    }

    fn end(&mut self) {
        self.window = None;
    }

    fn row_begin_static(&mut self, height: u32, columns: usize) {
        self.start_row(height, columns, false);
    }

    fn row_push(&mut self, width: u32) {
        if let Some(row) = self.window.as_mut().and_then(|w| w.row.as_mut()) {
            row.next_width = Some(width);
        }
    }

    fn row_end(&mut self) {
        if let Some(row) = self.window.as_mut().and_then(|w| w.row.as_mut()) {
            row.next_width = None;
            row.used = row.columns;
        }
    }

    fn row_dynamic(&mut self, height: u32, columns: usize) {
        self.start_row(height, columns, true);
    }

    fn image(&mut self, bitmap: &Bitmap) {
        if let Some(area) = self.next_cell() {
            self.push(Command::Image { area, bitmap: bitmap.clone() });
        }
    }

    fn label(&mut self, text: &str, align: TextAlign) {
        if let Some(area) = self.next_cell() {
            self.push(Command::Text { area, text: text.to_owned(), align });
        }
    }

    fn progress(&mut self, value: usize, max: usize, modifiable: bool) {
        let Some(area) = self.next_cell() else {
            return;
        };
        self.push(Command::Fill { area, color: PROGRESS_BG });

        let value = value.min(max);
        let filled = if max == 0 { 0 } else { (area.size.width as usize * value / max) as u32 };
        if filled > 0 {
            let bar = Rectangle::new(area.top_left, Size::new(filled, area.size.height));
            self.push(Command::Fill { area: bar, color: PROGRESS_FILL });
        }
        if modifiable {
            let x = area.top_left.x + filled.saturating_sub(1) as i32;
            let handle = Rectangle::new(Point::new(x, area.top_left.y), Size::new(2, area.size.height));
            self.push(Command::Fill { area: handle.intersection(&area), color: PROGRESS_HANDLE });
        }
    }

    fn render(&mut self, background: Rgb888) {
        trace!("Rendering {} draw commands", self.commands.len());
        self.staging.fill(background);
        for command in &self.commands {
            Self::replay(&mut self.staging, self.font.as_ref(), command);
        }
        self.commands.clear();
        self.surface.copy_from(&self.staging);
    }

    fn clear(&mut self, color: Rgb888) {
        debug!("Clearing screen to {:?}", color);
        self.surface.fill(color);
    }

    fn shutdown(self) -> Surface<M> {
        info!("UI context released");
        self.surface
    }
}
