//! Render loop and animation state

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::f32::consts::TAU;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{info, trace};

use crate::config::FrameConfig;
use crate::rotate::{rotate, Bitmap};
use crate::ui::{TextAlign, UiBackend, WindowFlags};

const WINDOW_TITLE: &str = "UBNT Demo";

/// Loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Terminal; the loop exits once the current frame is done.
    Stopping,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Running => write!(f, "Running"),
            LoopState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Icon angle and frame counter, advanced once per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationState {
    angle: f32,
    frame: u64,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current icon angle, always in [0, 2π).
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn advance_angle(&mut self, step: f32) {
        self.angle = (self.angle + step) % TAU;
    }

    /// Cyclic progress value in [0, max).
    pub fn progress(&self, max: usize) -> usize {
        (self.frame % max.max(1) as u64) as usize
    }

    /// Which of `count` labels to show when each stays up for `frames_per_label` frames.
    pub fn label_index(&self, frames_per_label: u64, count: usize) -> usize {
        ((self.frame / frames_per_label.max(1)) % count.max(1) as u64) as usize
    }

    fn next_frame(&mut self) {
        self.frame += 1;
    }
}

/// Waits out the gap between two frames.
pub trait Pacer {
    fn wait(&mut self, interval: Duration);
}

/// Sleeps the calling thread.
///
/// `thread::sleep` restarts on EINTR with the remaining time, so a signal
/// never shortens the wait.
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn wait(&mut self, interval: Duration) {
        thread::sleep(interval);
    }
}

/// Drives one immediate-mode UI frame per iteration.
pub struct FrameDriver {
    config: FrameConfig,
    icon: Bitmap,
    rotated: Bitmap,
    labels: &'static [&'static str],
    animation: AnimationState,
    state: LoopState,
}

impl FrameDriver {
    pub fn new(icon: Bitmap, labels: &'static [&'static str], config: FrameConfig) -> Self {
        info!("Creating frame driver ({}x{} icon, {} labels)", icon.width, icon.height, labels.len());
        let rotated = icon.blank_like();
        Self {
            config,
            icon,
            rotated,
            labels,
            animation: AnimationState::new(),
            state: LoopState::Running,
        }
    }

    #[allow(dead_code)]
    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Label for the current frame.
    pub fn label(&self) -> &'static str {
        if self.labels.is_empty() {
            return "";
        }
        self.labels[self.animation.label_index(self.config.frames_per_label, self.labels.len())]
    }

    /// Render frames until `stop` is raised; returns how many were drawn.
    ///
    /// The flag is checked only between frames, so a frame in progress always
    /// completes.
    pub fn run<U: UiBackend, P: Pacer>(&mut self, ui: &mut U, stop: &AtomicBool, pacer: &mut P) -> u64 {
        info!("Entering render loop...");
        while self.state == LoopState::Running {
            if stop.load(Ordering::SeqCst) {
                self.transition_to(LoopState::Stopping);
                break;
            }
            self.frame(ui);
            pacer.wait(self.config.frame_interval);
        }
        self.animation.frame()
    }

    /// Declare and render a single frame.
    pub fn frame<U: UiBackend>(&mut self, ui: &mut U) {
        let progress = self.animation.progress(self.config.progress_max);
        let flags = WindowFlags::BORDER | WindowFlags::NO_SCROLLBAR | WindowFlags::NO_INPUT;

        if ui.begin(WINDOW_TITLE, self.window_bounds(ui.size()), flags) {
            ui.row_begin_static(self.config.row_height, 2);
            ui.row_push(self.config.icon_slot);
            self.animation.advance_angle(self.config.angle_step);
            rotate(&mut self.rotated, &self.icon, self.animation.angle());
            ui.image(&self.rotated);
            ui.row_push(self.config.label_slot);
            ui.label(self.label(), TextAlign::Centered);
            ui.row_end();

            ui.row_dynamic(self.config.progress_height, 1);
            ui.progress(progress, self.config.progress_max, false);
        }
        ui.end();
        ui.render(self.config.background);

        trace!(
            "Frame {} angle={:.3} progress={}",
            self.animation.frame(),
            self.animation.angle(),
            progress
        );
        self.animation.next_frame();
    }

    /// The surface minus the margin on every edge.
    fn window_bounds(&self, surface: Size) -> Rectangle {
        let margin = self.config.margin;
        let inset = 2 * margin.max(0) as u32;
        Rectangle::new(
            Point::new(margin, margin),
            Size::new(surface.width.saturating_sub(inset), surface.height.saturating_sub(inset)),
        )
    }

    fn transition_to(&mut self, new_state: LoopState) {
        info!("State transition: {} -> {}", self.state, new_state);
        self.state = new_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::LABELS;
    use crate::testing::{RecordingUi, UiEvent};

    fn driver() -> FrameDriver {
        let icon = Bitmap::from_pixels(4, 4, (1..=16).collect());
        FrameDriver::new(icon, &LABELS, FrameConfig::default())
    }

    struct NoWait;

    impl Pacer for NoWait {
        fn wait(&mut self, _interval: Duration) {}
    }

    #[test]
    fn angle_steps_and_wraps_below_full_turn() {
        let mut state = AnimationState::new();
        let step = FrameConfig::default().angle_step;
        let mut wraps = 0;
        for _ in 0..500 {
            let before = state.angle();
            state.advance_angle(step);
            let after = state.angle();
            assert!((0.0..TAU).contains(&after));
            if after > before {
                assert!((after - before - step).abs() < 1e-4);
            } else {
                wraps += 1;
                assert!((after + TAU - before - step).abs() < 1e-4);
            }
        }
        assert!(wraps >= 20);
    }

    #[test]
    fn progress_cycles_every_hundred_frames() {
        let mut state = AnimationState::new();
        let mut seen = Vec::new();
        for _ in 0..250 {
            seen.push(state.progress(100));
            state.next_frame();
        }
        assert_eq!(seen[0], 0);
        assert_eq!(seen[99], 99);
        assert_eq!(seen[100], 0);
        assert_eq!(seen[249], 49);
    }

    #[test]
    fn labels_cycle_over_seven_hundred_frames() {
        let mut driver = driver();
        let mut ui = RecordingUi::new(320, 240);
        let mut shown = Vec::new();
        for _ in 0..=700 {
            driver.frame(&mut ui);
            shown.push(ui.last_label().unwrap());
        }
        for (frame, label) in shown.iter().enumerate() {
            assert_eq!(label, LABELS[(frame / 100) % 7], "frame {frame}");
        }
        for (i, expected) in LABELS.iter().enumerate() {
            assert_eq!(shown[i * 100], *expected);
        }
        assert_eq!(shown[700], shown[0]);
    }

    #[test]
    fn frame_declares_widgets_in_order() {
        let mut driver = driver();
        let mut ui = RecordingUi::new(320, 240);
        driver.frame(&mut ui);

        let config = FrameConfig::default();
        let flags = WindowFlags::BORDER | WindowFlags::NO_SCROLLBAR | WindowFlags::NO_INPUT;
        assert_eq!(
            ui.take_events(),
            vec![
                UiEvent::Begin(Rectangle::new(Point::new(5, 5), Size::new(310, 230)), flags),
                UiEvent::RowStatic(30, 2),
                UiEvent::Push(30),
                UiEvent::Image(driver.rotated.clone()),
                UiEvent::Push(110),
                UiEvent::Label("UBNT Demo".to_string(), TextAlign::Centered),
                UiEvent::RowEnd,
                UiEvent::RowDynamic(15, 1),
                UiEvent::Progress(0, 100, false),
                UiEvent::End,
                UiEvent::Render(config.background),
            ]
        );
        assert!((driver.animation().angle() - config.angle_step).abs() < 1e-6);
        assert_eq!(driver.animation().frame(), 1);
    }

    #[test]
    fn drawn_icon_is_rotated_for_the_new_angle() {
        let mut driver = driver();
        let mut ui = RecordingUi::new(320, 240);
        for _ in 0..5 {
            driver.frame(&mut ui);
        }
        let mut expected = driver.icon.blank_like();
        rotate(&mut expected, &driver.icon, driver.animation().angle());
        assert_eq!(ui.last_image(), Some(expected));
    }

    #[test]
    fn hidden_window_still_renders_but_keeps_angle() {
        let mut driver = driver();
        let mut ui = RecordingUi::new(320, 240);
        ui.hide_windows();
        driver.frame(&mut ui);
        assert_eq!(driver.animation().angle(), 0.0);
        assert_eq!(driver.animation().frame(), 1);
        assert_eq!(ui.take_events().last(), Some(&UiEvent::Render(FrameConfig::default().background)));
    }

    #[test]
    fn raised_flag_stops_before_first_frame() {
        let mut driver = driver();
        let mut ui = RecordingUi::new(64, 64);
        let stop = AtomicBool::new(true);
        assert_eq!(driver.run(&mut ui, &stop, &mut NoWait), 0);
        assert_eq!(driver.state(), LoopState::Stopping);
        assert!(ui.take_events().is_empty());
    }
}
