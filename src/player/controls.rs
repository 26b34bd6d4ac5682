use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::controller::ControllerEvent;

/// Visibility state of the on-screen controls
#[derive(Debug)]
enum ControlState {
    /// Controls are hidden; nothing is counting down
    Hidden,
    /// Controls are shown, optionally with an inactivity countdown running
    Visible { countdown: Option<Countdown> },
}

#[derive(Debug)]
struct Countdown {
    token: u64,
    cancel: CancellationToken,
}

impl Countdown {
    fn stop(self) {
        self.cancel.cancel();
    }
}

/// Single-shot, restartable inactivity timer for the player controls.
///
/// Expiry is not applied from the timer task: it posts
/// `ControllerEvent::ControlsExpired` back to the controller, which calls
/// [`ControlsVisibilityTimer::on_expired`] on its own task. Each countdown
/// carries a token so an expiry from a countdown that was restarted or
/// cancelled in the meantime is ignored.
#[derive(Debug)]
pub struct ControlsVisibilityTimer {
    timeout: Duration,
    state: ControlState,
    next_token: u64,
    events: mpsc::UnboundedSender<ControllerEvent>,
    shutdown: CancellationToken,
}

impl ControlsVisibilityTimer {
    pub(crate) fn new(
        timeout: Duration,
        events: mpsc::UnboundedSender<ControllerEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            timeout,
            state: ControlState::Visible { countdown: None },
            next_token: 0,
            events,
            shutdown,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.state, ControlState::Hidden)
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(
            self.state,
            ControlState::Visible {
                countdown: Some(_)
            }
        )
    }

    /// Shows the controls and (re)starts the inactivity countdown.
    pub fn show(&mut self) {
        self.stop_countdown();
        if self.shutdown.is_cancelled() {
            trace!("Controls timer invalidated, not restarting countdown");
            self.state = ControlState::Visible { countdown: None };
            return;
        }

        self.next_token += 1;
        let token = self.next_token;
        let cancel = self.shutdown.child_token();
        let task_cancel = cancel.clone();
        let events = self.events.clone();
        let deadline = Instant::now() + self.timeout;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_cancel.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    let _ = events.send(ControllerEvent::ControlsExpired { token });
                }
            }
        });

        self.state = ControlState::Visible {
            countdown: Some(Countdown { token, cancel }),
        };
    }

    /// Stops the countdown without changing visibility.
    pub fn cancel(&mut self) {
        self.stop_countdown();
    }

    /// Flips visibility. Showing restarts the countdown; hiding cancels it.
    /// Returns the new visibility.
    pub fn toggle(&mut self) -> bool {
        if self.is_visible() {
            self.stop_countdown();
            self.state = ControlState::Hidden;
            false
        } else {
            self.show();
            true
        }
    }

    /// Back to the initial state: visible, no countdown.
    pub fn reset(&mut self) {
        self.stop_countdown();
        self.state = ControlState::Visible { countdown: None };
    }

    /// Handles a countdown expiry. Returns whether the controls were hidden.
    pub fn on_expired(&mut self, token: u64) -> bool {
        match &self.state {
            ControlState::Visible {
                countdown: Some(countdown),
            } if countdown.token == token => {
                debug!("Controls hidden after {:?} of inactivity", self.timeout);
                self.state = ControlState::Hidden;
                true
            }
            _ => {
                trace!("Ignoring expiry of superseded countdown {}", token);
                false
            }
        }
    }

    /// Stops the countdown for good; later `show` calls no longer start one.
    pub fn invalidate(&mut self) {
        self.stop_countdown();
        self.shutdown.cancel();
    }

    fn stop_countdown(&mut self) {
        if let ControlState::Visible { countdown } = &mut self.state
            && let Some(countdown) = countdown.take()
        {
            countdown.stop();
        }
    }
}
