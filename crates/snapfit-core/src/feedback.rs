//! Visual feedback requests emitted by the docking engine
//!
//! The engine never touches materials or timers itself. It returns a
//! [`Feedback`] value and the rendering layer (or [`HighlightState`] for
//! headless use) carries it out.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Linear RGBA color, components in 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Plug seated in its socket
pub const SEATED_COLOR: Rgba = Rgba::new(0.0, 1.0, 0.0, 0.25);
/// Plug paired with a socket and sliding in (outline only)
pub const PAIRED_COLOR: Rgba = Rgba::new(0.0, 0.75, 0.0, 0.0);
/// Plug approached a socket in a way that can never fit
pub const ERROR_COLOR: Rgba = Rgba::new(0.75, 0.0, 0.0, 0.25);
/// Pointer hovering over a plug
pub const HOVER_COLOR: Rgba = Rgba::new(0.25, 0.85, 1.0, 0.0);

pub const SEATED_DURATION: Duration = Duration::from_millis(1000);
pub const ERROR_DURATION: Duration = Duration::from_millis(200);

/// A request to highlight a plug
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightRequest {
    pub color: Rgba,
    /// Fill opacity; 0.0 draws the outline only
    pub fill: f32,
    /// Clear the highlight automatically after this long
    pub duration: Option<Duration>,
}

impl HighlightRequest {
    /// Highlight whose fill follows the color's alpha
    pub fn new(color: Rgba, duration: Option<Duration>) -> Self {
        Self {
            color,
            fill: color.a,
            duration,
        }
    }

    pub fn seated() -> Self {
        Self::new(SEATED_COLOR, Some(SEATED_DURATION))
    }

    pub fn paired() -> Self {
        Self::new(PAIRED_COLOR, None)
    }

    pub fn error() -> Self {
        Self::new(ERROR_COLOR, Some(ERROR_DURATION))
    }

    pub fn hover() -> Self {
        Self::new(HOVER_COLOR, None)
    }
}

/// Side effect requested from the highlight sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Feedback {
    Highlight(HighlightRequest),
    ClearHighlight,
}

/// Receiver for feedback requests
pub trait FeedbackSink {
    fn feedback(&mut self, feedback: Feedback);
}

impl FeedbackSink for Vec<Feedback> {
    fn feedback(&mut self, feedback: Feedback) {
        self.push(feedback);
    }
}

/// Highlight state of a single plug with auto-clear.
///
/// Every request replaces the pending clear of an earlier one.
#[derive(Debug, Clone, Default)]
pub struct HighlightState {
    current: Option<HighlightRequest>,
    remaining: Option<Duration>,
}

impl HighlightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a feedback request
    pub fn apply(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Highlight(request) => {
                self.current = Some(request);
                self.remaining = request.duration;
            }
            Feedback::ClearHighlight => {
                self.current = None;
                self.remaining = None;
            }
        }
    }

    /// Advance time; returns true if the highlight was cleared by this tick
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };
        match remaining.checked_sub(delta) {
            Some(left) if !left.is_zero() => {
                self.remaining = Some(left);
                false
            }
            _ => {
                self.remaining = None;
                self.current.take().is_some()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&HighlightRequest> {
        self.current.as_ref()
    }
}

impl FeedbackSink for HighlightState {
    fn feedback(&mut self, feedback: Feedback) {
        self.apply(feedback);
    }
}
