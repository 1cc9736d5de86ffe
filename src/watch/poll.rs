use log::info;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::alerts::{AlertEngine, Tick};
use crate::api::{Notifier, RateSource};
use crate::config::Config;

/// Why [`PollLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    ThresholdReached,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Running,
    Stopped(LoopExit),
}

/// Checks the rate immediately and then once per interval, one check at a
/// time, until the threshold is crossed or `cancel` fires.
pub struct PollLoop<S, N> {
    config: Config,
    source: S,
    notifier: N,
    state: PollState,
}

impl<S, N> PollLoop<S, N>
where
    S: RateSource,
    N: Notifier,
{
    pub fn new(config: Config, source: S, notifier: N) -> Self {
        Self {
            config,
            source,
            notifier,
            state: PollState::Running,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub async fn run(&mut self, cancel: CancellationToken) -> LoopExit {
        let Self {
            config,
            source,
            notifier,
            state,
        } = self;

        if let PollState::Stopped(exit) = *state {
            return exit;
        }

        let engine = AlertEngine::new(&*config);
        let mut interval = time::interval(config.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // Cancellation is only observed between ticks; a check in flight
            // runs to completion.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Shutdown requested, stopping rate checks");
                    *state = PollState::Stopped(LoopExit::Cancelled);
                    return LoopExit::Cancelled;
                }
                _ = interval.tick() => {}
            }

            if engine.check(&*source, &*notifier).await == Tick::Stop {
                *state = PollState::Stopped(LoopExit::ThresholdReached);
                return LoopExit::ThresholdReached;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::alerts::tests::{config, rates, FakeNotifier, FakeSource};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn polls_until_breach_then_stops() {
        let source = FakeSource::with_bodies(&[
            rates(1.10).as_str(),
            r#"{"result":"error","error-type":"invalid-key"}"#,
            rates(1.25).as_str(),
            rates(1.50).as_str(),
        ]);
        let mut poll = PollLoop::new(config(1.20), source, FakeNotifier::default());
        let started = time::Instant::now();

        let exit = poll.run(CancellationToken::new()).await;

        assert_eq!(exit, LoopExit::ThresholdReached);
        assert_eq!(poll.state(), PollState::Stopped(LoopExit::ThresholdReached));
        assert_eq!(poll.source.call_count(), 3);
        assert_eq!(poll.notifier.sent.borrow().len(), 1);
        // First check is immediate, then one per 15 minutes.
        assert_eq!(started.elapsed(), Duration::from_secs(30 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn breach_on_first_tick_stops_without_waiting() {
        let source = FakeSource::with_bodies(&[rates(1.25).as_str()]);
        let mut poll = PollLoop::new(config(1.20), source, FakeNotifier::default());
        assert_eq!(poll.state(), PollState::Running);
        let started = time::Instant::now();

        assert_eq!(poll.run(CancellationToken::new()).await, LoopExit::ThresholdReached);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_notification_does_not_resume_polling() {
        let source = FakeSource::with_bodies(&[rates(1.25).as_str(), rates(1.25).as_str()]);
        let notifier = FakeNotifier {
            fail_with: Some(500),
            ..Default::default()
        };
        let mut poll = PollLoop::new(config(1.20), source, notifier);

        assert_eq!(poll.run(CancellationToken::new()).await, LoopExit::ThresholdReached);
        assert_eq!(poll.source.call_count(), 1);

        // A stopped loop never ticks again.
        assert_eq!(poll.run(CancellationToken::new()).await, LoopExit::ThresholdReached);
        assert_eq!(poll.source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_between_ticks_exits_cleanly() {
        let source = FakeSource::with_bodies(&[rates(1.0).as_str(), rates(1.0).as_str()]);
        let mut poll = PollLoop::new(config(1.20), source, FakeNotifier::default());
        let cancel = CancellationToken::new();

        let trigger = async {
            time::sleep(Duration::from_secs(20 * 60)).await;
            cancel.cancel();
        };
        let (exit, ()) = tokio::join!(poll.run(cancel.clone()), trigger);

        assert_eq!(exit, LoopExit::Cancelled);
        assert_eq!(poll.state(), PollState::Stopped(LoopExit::Cancelled));
        assert_eq!(poll.source.call_count(), 2);
        assert!(poll.notifier.sent.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_makes_no_requests() {
        let mut poll = PollLoop::new(config(1.20), FakeSource::default(), FakeNotifier::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(poll.run(cancel).await, LoopExit::Cancelled);
        assert_eq!(poll.source.call_count(), 0);
    }
}
