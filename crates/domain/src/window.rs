use chrono::NaiveDateTime;

pub const DEFAULT_EDIT_MINUTES: u32 = 5;
pub const MAX_EDIT_MINUTES: u32 = 90;

/// How long after posting a comment stays editable by its author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditWindow {
    minutes: u32,
}

impl EditWindow {
    /// Values above [`MAX_EDIT_MINUTES`] are clamped.
    pub fn new(minutes: u32) -> Self {
        Self {
            minutes: minutes.min(MAX_EDIT_MINUTES),
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> i64 {
        i64::from(self.minutes) * 60
    }

    /// Only whole elapsed minutes count, so a comment posted 4m59s ago under a
    /// 5 minute window is still open.
    pub fn has_elapsed(&self, created_at: NaiveDateTime, now: NaiveDateTime) -> bool {
        let elapsed = (now - created_at).num_seconds();
        elapsed.div_euclid(60) - i64::from(self.minutes) >= 0
    }

    /// Seconds left; negative once the window is over.
    pub fn seconds_left(&self, created_at: NaiveDateTime, now: NaiveDateTime) -> i64 {
        self.seconds() - (now - created_at).num_seconds()
    }
}

impl Default for EditWindow {
    fn default() -> Self {
        Self::new(DEFAULT_EDIT_MINUTES)
    }
}
