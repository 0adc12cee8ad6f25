//! Messages for the burst screen
//!
//! Data describing what happened. Key presses and the timer both become a
//! [`Msg`], and [`super::update::update`] is the only place that acts on one.

/// All possible messages on the burst screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    /// Periodic timer tick
    Tick,
    /// Start the countdown
    Start,
    /// Finish early
    Stop,
    /// Record the burst and leave
    Done,
    /// Raise the runtime BPM by one
    BpmUp,
    /// Lower the runtime BPM by one
    BpmDown,
    /// Leave without logging
    Close,
}
