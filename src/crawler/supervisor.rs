//! Restart supervisor
//!
//! Runs a whole harvest attempt, and on failure waits the restart interval and
//! runs a fresh attempt, until one succeeds or the attempt budget is spent.
//!
//! ```text
//! Running(k) --ok--> Terminated(Success)
//! Running(k) --err, k < max--> Sleeping(k) --> Running(k + 1)
//! Running(k) --err, k = max--> Terminated(Exhausted)
//! ```

use super::retry::Sleeper;
use crate::config::RestartConfig;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// How many whole-run attempts are made and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RestartPolicy {
    pub fn from_config(config: &RestartConfig) -> Self {
        Self {
            max_attempts: config.count,
            interval: config.interval(),
        }
    }
}

/// Final outcome of a supervised harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Success { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl Termination {
    pub fn succeeded(&self) -> bool {
        matches!(self, Termination::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match *self {
            Termination::Success { attempts } | Termination::Exhausted { attempts } => attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running { attempt: u32 },
    Sleeping { attempt: u32 },
    Terminated(Termination),
}

pub struct Supervisor {
    policy: RestartPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Supervisor {
    pub fn new(policy: RestartPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &RestartPolicy {
        &self.policy
    }

    /// Drives `run` until it succeeds or the policy gives up
    ///
    /// `run` receives the 1-based attempt number and must build all of its
    /// state from scratch; nothing is carried between attempts. A panic inside
    /// `run` counts as a failed attempt.
    pub fn supervise<F, E>(&self, mut run: F) -> Termination
    where
        F: FnMut(u32) -> Result<(), E>,
        E: fmt::Display,
    {
        let mut state = SupervisorState::Running { attempt: 1 };
        loop {
            state = match state {
                SupervisorState::Running { attempt } => self.run_attempt(&mut run, attempt),
                SupervisorState::Sleeping { attempt } => {
                    if !self.policy.interval.is_zero() {
                        self.sleeper.sleep(self.policy.interval);
                    }
                    tracing::info!("Restart #{}", attempt);
                    SupervisorState::Running {
                        attempt: attempt + 1,
                    }
                }
                SupervisorState::Terminated(termination) => return termination,
            };
        }
    }

    fn run_attempt<F, E>(&self, run: &mut F, attempt: u32) -> SupervisorState
    where
        F: FnMut(u32) -> Result<(), E>,
        E: fmt::Display,
    {
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| run(attempt))) {
            Ok(Ok(())) => {
                tracing::info!("Harvest finished on attempt {}", attempt);
                return SupervisorState::Terminated(Termination::Success { attempts: attempt });
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        tracing::error!("Harvest attempt {} failed: {}", attempt, failure);
        if attempt < self.policy.max_attempts {
            tracing::error!(
                critical = true,
                "Harvest will be restarted in {} seconds",
                self.policy.interval.as_secs()
            );
            SupervisorState::Sleeping { attempt }
        } else {
            tracing::error!(
                critical = true,
                "Harvest reached max restarts ({}). Exiting",
                self.policy.max_attempts
            );
            SupervisorState::Terminated(Termination::Exhausted { attempts: attempt })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
