//! Fakes shared by unit tests

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::platform::DisplayDevice;
use crate::rotate::Bitmap;
use crate::ui::surface::{Geometry, PixelFormat, Surface};
use crate::ui::{InitFailure, TextAlign, UiBackend, UiInitError, WindowFlags};

/// Ordered record of lifecycle calls, shared between fakes.
pub type Log = Rc<RefCell<Vec<&'static str>>>;

/// Heap memory standing in for a mapping; carries the log so the UI can reach it.
#[derive(Debug)]
pub struct FakeMemory {
    pub bytes: Vec<u8>,
    pub log: Log,
    /// Makes `RecordingUi::init` fail.
    pub reject_ui: bool,
}

impl AsRef<[u8]> for FakeMemory {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsMut<[u8]> for FakeMemory {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

pub fn geometry(width: u32, height: u32) -> Geometry {
    Geometry {
        id: "fake".to_string(),
        width,
        height,
        bits_per_pixel: 32,
        stride: width * 4,
        size: (width * height * 4) as usize,
        format: PixelFormat::ARGB8888,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Open,
    Geometry,
    Map,
    /// Mapping comes back shorter than a frame.
    Surface,
    UiInit,
}

/// Display device that records every call and can fail at one step.
pub struct FakeDevice {
    pub log: Log,
    pub fail_at: Option<Step>,
    pub geometry: Geometry,
}

impl FakeDevice {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone(), fail_at: None, geometry: geometry(64, 48) }
    }

    pub fn failing_at(log: &Log, step: Step) -> Self {
        Self { fail_at: Some(step), ..Self::new(log) }
    }

    fn step(&self, step: Step, name: &'static str) -> io::Result<()> {
        self.log.borrow_mut().push(name);
        if self.fail_at == Some(step) {
            return Err(io::Error::new(io::ErrorKind::Other, format!("{name} failed")));
        }
        Ok(())
    }
}

impl DisplayDevice for FakeDevice {
    type Memory = FakeMemory;

    fn open(&mut self, _path: &Path) -> io::Result<()> {
        self.step(Step::Open, "open")
    }

    fn geometry(&mut self) -> io::Result<Geometry> {
        self.step(Step::Geometry, "geometry")?;
        Ok(self.geometry.clone())
    }

    fn map(&mut self, geometry: &Geometry) -> io::Result<FakeMemory> {
        self.step(Step::Map, "map")?;
        let len = if self.fail_at == Some(Step::Surface) { geometry.size / 2 } else { geometry.size };
        Ok(FakeMemory {
            bytes: vec![0xAB; len],
            log: self.log.clone(),
            reject_ui: self.fail_at == Some(Step::UiInit),
        })
    }

    fn unmap(&mut self, _memory: FakeMemory) -> io::Result<()> {
        self.log.borrow_mut().push("unmap");
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().push("close");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Begin(Rectangle, WindowFlags),
    End,
    RowStatic(u32, usize),
    Push(u32),
    RowEnd,
    RowDynamic(u32, usize),
    Image(Bitmap),
    Label(String, TextAlign),
    Progress(usize, usize, bool),
    Render(Rgb888),
    Clear(Rgb888),
}

/// UI backend that only remembers what it was asked to draw.
pub struct RecordingUi {
    surface: Surface<FakeMemory>,
    log: Log,
    events: Vec<UiEvent>,
    hide_windows: bool,
    stop_on_render: Option<(usize, Arc<AtomicBool>)>,
}

impl RecordingUi {
    pub fn new(width: u32, height: u32) -> Self {
        let geo = geometry(width, height);
        let memory = FakeMemory { bytes: vec![0; geo.size], log: Log::default(), reject_ui: false };
        let surface = Surface::new(memory, geo).unwrap();
        Self::init(surface, Vec::new()).unwrap()
    }

    /// Make every later `begin` report an invisible window.
    pub fn hide_windows(&mut self) {
        self.hide_windows = true;
    }

    /// Raise `flag` from inside the `nth` call to `render` (1-based).
    pub fn stop_on_render(&mut self, nth: usize, flag: Arc<AtomicBool>) {
        self.stop_on_render = Some((nth, flag));
    }

    pub fn take_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn last_label(&self) -> Option<String> {
        self.events.iter().rev().find_map(|e| match e {
            UiEvent::Label(text, _) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn last_image(&self) -> Option<Bitmap> {
        self.events.iter().rev().find_map(|e| match e {
            UiEvent::Image(bitmap) => Some(bitmap.clone()),
            _ => None,
        })
    }

    pub fn renders(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, UiEvent::Render(_))).count()
    }
}

impl UiBackend for RecordingUi {
    type Memory = FakeMemory;

    fn init(surface: Surface<FakeMemory>, _scratch: Vec<u8>) -> Result<Self, InitFailure<FakeMemory>> {
        let geometry = surface.geometry().clone();
        let memory = surface.into_memory();
        let log = memory.log.clone();
        log.borrow_mut().push("ui-init");
        let reject = memory.reject_ui;
        let surface = Surface::new(memory, geometry).expect("surface was valid a moment ago");
        if reject {
            let error = UiInitError::ScratchTooSmall { needed: 1, capacity: 0 };
            return Err(InitFailure { error, surface });
        }
        Ok(Self { surface, log, events: Vec::new(), hide_windows: false, stop_on_render: None })
    }

    fn size(&self) -> Size {
        self.surface.size()
    }

    fn begin(&mut self, _title: &str, bounds: Rectangle, flags: WindowFlags) -> bool {
        self.events.push(UiEvent::Begin(bounds, flags));
        !self.hide_windows
    }

    fn end(&mut self) {
        self.events.push(UiEvent::End);
    }

    fn row_begin_static(&mut self, height: u32, columns: usize) {
        self.events.push(UiEvent::RowStatic(height, columns));
    }

    fn row_push(&mut self, width: u32) {
        self.events.push(UiEvent::Push(width));
    }

    fn row_end(&mut self) {
        self.events.push(UiEvent::RowEnd);
    }

    fn row_dynamic(&mut self, height: u32, columns: usize) {
        self.events.push(UiEvent::RowDynamic(height, columns));
    }

    fn image(&mut self, bitmap: &Bitmap) {
        self.events.push(UiEvent::Image(bitmap.clone()));
    }

    fn label(&mut self, text: &str, align: TextAlign) {
        self.events.push(UiEvent::Label(text.to_string(), align));
    }

    fn progress(&mut self, value: usize, max: usize, modifiable: bool) {
        self.events.push(UiEvent::Progress(value, max, modifiable));
    }

    fn render(&mut self, background: Rgb888) {
        if let Some((nth, flag)) = &self.stop_on_render {
            if self.renders() + 1 == *nth {
                flag.store(true, Ordering::SeqCst);
            }
        }
        self.events.push(UiEvent::Render(background));
    }

    fn clear(&mut self, color: Rgb888) {
        self.log.borrow_mut().push("clear");
        self.events.push(UiEvent::Clear(color));
        self.surface.fill(color);
    }

    fn shutdown(self) -> Surface<FakeMemory> {
        self.log.borrow_mut().push("ui-release");
        self.surface
    }
}
