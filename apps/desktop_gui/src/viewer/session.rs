//! Frame list and cursor of one open series.

use shared::domain::SessionId;

/// How the series reached the viewer. Decides the recovery action offered
/// when the frame list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerOrigin {
    Upload,
    Historial,
}

/// An open series: its frames in slice order and the current position.
/// The index is always valid while frames exist; every operation clamps.
#[derive(Debug, Clone)]
pub struct ViewerSession {
    session_id: SessionId,
    origin: ViewerOrigin,
    frames: Vec<String>,
    current: usize,
}

impl ViewerSession {
    pub fn new(session_id: SessionId, frames: Vec<String>, origin: ViewerOrigin) -> Self {
        Self {
            session_id,
            origin,
            frames,
            current: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn origin(&self) -> ViewerOrigin {
        self.origin
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Static path of the current frame.
    pub fn current_frame(&self) -> Option<&str> {
        self.frames.get(self.current).map(String::as_str)
    }

    pub fn frame_at(&self, index: usize) -> Option<&str> {
        self.frames.get(index).map(String::as_str)
    }

    /// File name of the current frame, the form the segmentation endpoint
    /// expects in `image_name`.
    pub fn current_image_name(&self) -> Option<&str> {
        self.current_frame()
            .map(|path| path.rsplit('/').next().unwrap_or(path))
    }

    /// Advances one frame. Stays put at the end.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.frames.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Goes back one frame. Stays put at the start.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps to `index`, clamped into the valid range.
    pub fn seek(&mut self, index: usize) {
        if self.frames.is_empty() {
            self.current = 0;
        } else {
            self.current = index.min(self.frames.len() - 1);
        }
    }

    /// Drops the current frame from the session, returning its path. The
    /// cursor keeps its position so the next frame slides into view, and
    /// clamps when the last frame was removed.
    pub fn remove_current(&mut self) -> Option<String> {
        if self.frames.is_empty() {
            return None;
        }
        let removed = self.frames.remove(self.current);
        if self.current >= self.frames.len() && self.current > 0 {
            self.current = self.frames.len() - 1;
        }
        Some(removed)
    }

    /// Position label, 1-based: "Imagen 3 / 14".
    pub fn counter_label(&self) -> String {
        if self.frames.is_empty() {
            "Imagen 0 / 0".to_string()
        } else {
            format!("Imagen {} / {}", self.current + 1, self.frames.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(frames: &[&str]) -> ViewerSession {
        ViewerSession::new(
            SessionId::from("s1"),
            frames.iter().map(|f| f.to_string()).collect(),
            ViewerOrigin::Upload,
        )
    }

    #[test]
    fn starts_at_first_frame() {
        let s = session(&["/static/series/s1/image_0.png", "/static/series/s1/image_1.png"]);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.counter_label(), "Imagen 1 / 2");
        assert_eq!(s.current_image_name(), Some("image_0.png"));
    }

    #[test]
    fn next_and_prev_clamp_at_the_ends() {
        let mut s = session(&["a", "b", "c"]);
        assert!(!s.prev());
        assert_eq!(s.current_index(), 0);

        assert!(s.next());
        assert!(s.next());
        assert_eq!(s.current_index(), 2);
        assert!(!s.next());
        assert_eq!(s.current_index(), 2);

        assert!(s.prev());
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn seek_clamps_to_last_frame() {
        let mut s = session(&["a", "b", "c"]);
        s.seek(99);
        assert_eq!(s.current_index(), 2);
        s.seek(1);
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn remove_current_keeps_position_in_the_middle() {
        let mut s = session(&["a", "b", "c"]);
        s.seek(1);
        assert_eq!(s.remove_current().as_deref(), Some("b"));
        // The former third frame slides into the cursor.
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.current_frame(), Some("c"));
        assert_eq!(s.counter_label(), "Imagen 2 / 2");
    }

    #[test]
    fn remove_current_at_the_end_clamps_back() {
        let mut s = session(&["a", "b", "c"]);
        s.seek(2);
        assert_eq!(s.remove_current().as_deref(), Some("c"));
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.current_frame(), Some("b"));
    }

    #[test]
    fn removing_the_only_frame_leaves_an_empty_session() {
        let mut s = session(&["a"]);
        assert_eq!(s.remove_current().as_deref(), Some("a"));
        assert!(s.is_empty());
        assert_eq!(s.current_frame(), None);
        assert_eq!(s.counter_label(), "Imagen 0 / 0");
        // Further removals and moves are no-ops.
        assert_eq!(s.remove_current(), None);
        assert!(!s.next());
        assert!(!s.prev());
        s.seek(5);
        assert_eq!(s.current_index(), 0);
    }
}
