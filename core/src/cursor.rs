use serde::{Deserialize, Serialize};

/// Position in the move log up to which the board is shown.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCursor {
    current: usize,
    count: usize,
}

impl ReplayCursor {
    /// Cursor showing every one of `count` moves.
    pub const fn at_end(count: usize) -> Self {
        Self {
            current: count,
            count,
        }
    }

    pub const fn current(&self) -> usize {
        self.current
    }

    pub const fn count(&self) -> usize {
        self.count
    }

    pub const fn is_first(&self) -> bool {
        self.current == 0
    }

    pub const fn is_last(&self) -> bool {
        self.current == self.count
    }

    pub const fn next(self) -> Self {
        if self.is_last() {
            self
        } else {
            Self {
                current: self.current + 1,
                ..self
            }
        }
    }

    pub const fn prev(self) -> Self {
        if self.is_first() {
            self
        } else {
            Self {
                current: self.current - 1,
                ..self
            }
        }
    }

    /// Mouse wheel navigation: scrolling down moves forward.
    pub fn scroll(self, delta_y: f64) -> Self {
        if delta_y > 0.0 {
            self.next()
        } else if delta_y < 0.0 {
            self.prev()
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_stays_within_log() {
        let cursor = ReplayCursor::at_end(2);
        assert!(cursor.is_last());
        assert_eq!(cursor.next(), cursor);

        let cursor = cursor.prev().prev();
        assert!(cursor.is_first());
        assert_eq!(cursor.current(), 0);
        assert_eq!(cursor.prev(), cursor);
        assert_eq!(cursor.next().current(), 1);
    }

    #[test]
    fn scroll_direction() {
        let cursor = ReplayCursor::at_end(3).prev();
        assert_eq!(cursor.scroll(120.0).current(), 3);
        assert_eq!(cursor.scroll(-120.0).current(), 1);
        assert_eq!(cursor.scroll(0.0), cursor);
    }
}
