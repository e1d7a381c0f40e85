// View state machine
// Drives which of the three screens is visible: drop zone, loading, ticket

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};

/// Which screen is currently on display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Waiting for a file to be dragged in
    DropZone,
    /// A file was dropped; the reveal delay is running
    Loading,
    /// The ticket is on screen (terminal state)
    TicketShown,
}

/// Input events the view reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// A drag carrying an acceptable payload entered the window
    DragEntered,
    /// The drag left without dropping
    DragLeft,
    /// A file reference was dropped; the file itself is never opened
    FileDropped(PathBuf),
    /// The reveal delay ran out
    DelayElapsed,
}

/// Event-driven dispatcher over the three screens.
///
/// The screens are mutually exclusive by construction: the only path is
/// DropZone -> Loading -> TicketShown, with no reverse transitions and no
/// cancellation once the delay is armed. Events that do not apply to the
/// current state are ignored.
pub struct ViewStateMachine {
    state: ViewState,
    delay: Duration,
    loading_since: Option<Instant>,
    deadline: Option<Instant>,
    drop_target_hot: bool,
    dropped_path: Option<PathBuf>,
}

impl ViewStateMachine {
    /// Create the machine in the DropZone state with the given reveal delay
    pub fn new(delay: Duration) -> Self {
        Self {
            state: ViewState::DropZone,
            delay,
            loading_since: None,
            deadline: None,
            drop_target_hot: false,
            dropped_path: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Whether the drop target should render highlighted
    pub fn drop_target_hot(&self) -> bool {
        self.drop_target_hot
    }

    /// The path that triggered the transition, once one was dropped
    #[allow(dead_code)]
    pub fn dropped_path(&self) -> Option<&Path> {
        self.dropped_path.as_deref()
    }

    /// Feed one event; returns true when the visible screen changed
    pub fn handle(&mut self, event: ViewEvent, now: Instant) -> bool {
        match (self.state, event) {
            (ViewState::DropZone, ViewEvent::DragEntered) => {
                self.drop_target_hot = true;
                false
            }
            (ViewState::DropZone, ViewEvent::DragLeft) => {
                self.drop_target_hot = false;
                false
            }
            (ViewState::DropZone, ViewEvent::FileDropped(path)) => {
                info!(
                    "File dropped: {}, revealing ticket in {:.0?}",
                    path.display(),
                    self.delay
                );
                self.dropped_path = Some(path);
                self.drop_target_hot = false;
                self.loading_since = Some(now);
                self.deadline = Some(now + self.delay);
                self.state = ViewState::Loading;
                true
            }
            (ViewState::Loading, ViewEvent::DelayElapsed) => {
                info!("Reveal delay elapsed, showing ticket");
                self.deadline = None;
                self.state = ViewState::TicketShown;
                true
            }
            (state, event) => {
                debug!("Ignoring {:?} in {:?}", event, state);
                false
            }
        }
    }

    /// Fire the delayed transition once its deadline has passed.
    ///
    /// Called from the frame clock; returns true when the screen changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => self.handle(ViewEvent::DelayElapsed, now),
            _ => false,
        }
    }

    /// Fraction of the reveal delay that has elapsed, clamped to 0..=1
    pub fn progress(&self, now: Instant) -> f32 {
        match (self.state, self.loading_since) {
            (ViewState::Loading, Some(since)) => {
                let elapsed = now.saturating_duration_since(since);
                (elapsed.as_secs_f32() / self.delay.as_secs_f32()).clamp(0.0, 1.0)
            }
            (ViewState::TicketShown, _) => 1.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(12);

    fn machine() -> ViewStateMachine {
        ViewStateMachine::new(DELAY)
    }

    fn drop_event() -> ViewEvent {
        ViewEvent::FileDropped(PathBuf::from("/tmp/ticket.pdf"))
    }

    #[test]
    fn drop_transitions_to_loading_immediately() {
        let mut m = machine();
        let now = Instant::now();
        assert!(m.handle(drop_event(), now));
        assert_eq!(m.state(), ViewState::Loading);
        assert_eq!(m.dropped_path(), Some(Path::new("/tmp/ticket.pdf")));
    }

    #[test]
    fn ticket_shows_exactly_after_the_delay() {
        let mut m = machine();
        let now = Instant::now();
        m.handle(drop_event(), now);

        assert!(!m.tick(now + DELAY - Duration::from_nanos(1)));
        assert_eq!(m.state(), ViewState::Loading);

        assert!(m.tick(now + DELAY));
        assert_eq!(m.state(), ViewState::TicketShown);
    }

    #[test]
    fn no_transition_without_a_drop() {
        let mut m = machine();
        let now = Instant::now();
        m.handle(ViewEvent::DragEntered, now);
        m.handle(ViewEvent::DragLeft, now);
        assert!(!m.tick(now + Duration::from_secs(3600)));
        assert_eq!(m.state(), ViewState::DropZone);
    }

    #[test]
    fn second_drop_is_ignored() {
        let mut m = machine();
        let now = Instant::now();
        m.handle(drop_event(), now);
        let first_deadline_hit = now + DELAY;

        // A drop mid-loading must not re-arm the delay
        assert!(!m.handle(
            ViewEvent::FileDropped(PathBuf::from("/tmp/other")),
            now + Duration::from_secs(5),
        ));
        assert_eq!(m.dropped_path(), Some(Path::new("/tmp/ticket.pdf")));
        assert!(m.tick(first_deadline_hit));
        assert_eq!(m.state(), ViewState::TicketShown);

        // And a drop on the terminal state does nothing at all
        assert!(!m.handle(drop_event(), first_deadline_hit));
        assert_eq!(m.state(), ViewState::TicketShown);
    }

    #[test]
    fn drag_hover_only_highlights_the_drop_zone() {
        let mut m = machine();
        let now = Instant::now();
        assert!(!m.drop_target_hot());
        m.handle(ViewEvent::DragEntered, now);
        assert!(m.drop_target_hot());
        m.handle(ViewEvent::DragLeft, now);
        assert!(!m.drop_target_hot());

        m.handle(drop_event(), now);
        m.handle(ViewEvent::DragEntered, now);
        assert!(!m.drop_target_hot());
    }

    #[test]
    fn progress_is_clamped_and_monotone() {
        let mut m = machine();
        let now = Instant::now();
        assert_eq!(m.progress(now), 0.0);

        m.handle(drop_event(), now);
        assert_eq!(m.progress(now), 0.0);

        let mut last = 0.0;
        for secs in 1..=12 {
            let p = m.progress(now + Duration::from_secs(secs));
            assert!(p >= last, "progress went backwards at {}s", secs);
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
        assert_eq!(m.progress(now + DELAY * 2), 1.0);

        m.tick(now + DELAY);
        assert_eq!(m.progress(now + DELAY * 3), 1.0);
    }
}
