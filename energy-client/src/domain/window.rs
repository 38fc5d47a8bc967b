use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// How far a query window reaches before and after its target timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Window {
    pub before_minutes: u32,
    pub after_minutes: u32,
}

impl Window {
    pub const fn new(before_minutes: u32, after_minutes: u32) -> Self {
        Self {
            before_minutes,
            after_minutes,
        }
    }

    /// `[target - before, target + after]`.
    pub fn around(&self, target: OffsetDateTime) -> (OffsetDateTime, OffsetDateTime) {
        (
            target - Duration::minutes(i64::from(self.before_minutes)),
            target + Duration::minutes(i64::from(self.after_minutes)),
        )
    }
}

impl From<(u32, u32)> for Window {
    fn from((before, after): (u32, u32)) -> Self {
        Self::new(before, after)
    }
}

impl From<Window> for (u32, u32) {
    fn from(w: Window) -> Self {
        (w.before_minutes, w.after_minutes)
    }
}

/// Query windows tried in order, narrowest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowProfile(Vec<Window>);

impl WindowProfile {
    pub fn new(windows: Vec<Window>) -> Self {
        Self(windows)
    }

    pub fn windows(&self) -> &[Window] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for WindowProfile {
    fn default() -> Self {
        Self(vec![Window::new(4, 4), Window::new(12, 6), Window::new(24, 6)])
    }
}
