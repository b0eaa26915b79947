//! Daemon implementation: the periodic sample/decide/act loop

pub mod detach;

use crate::{
    config::PollingConfig,
    ec::{EcError, EmbeddedController},
    fan::{Decision, FanState},
    fan_control::FanController,
    port::PortIo,
    shutdown::{ShutdownReason, ShutdownSignal, SHUTDOWN_EXIT_CODE},
    status_log::{StatusLine, StatusLog},
};
use log::{debug, info, warn};
use std::io::Write;
use tokio::time::sleep;

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub temperature: u8,
    /// False when the EC read failed and the previous sample was reused
    pub fresh: bool,
    pub decision: Decision,
}

/// Main daemon structure
pub struct FanDaemon<P: PortIo> {
    config: PollingConfig,
    ec: EmbeddedController<P>,
    fan: FanController,
    status: StatusLog,
    shutdown: ShutdownSignal,
    last_temperature: u8,
    ticks: u64,
    state: SchedulerState,
}

impl<P: PortIo> FanDaemon<P> {
    /// Create a new daemon instance.
    ///
    /// The fan is stopped before this returns, whatever the hardware was
    /// doing before and whatever options were given.
    pub async fn new(
        config: PollingConfig,
        port: P,
        status: StatusLog,
        shutdown: ShutdownSignal,
    ) -> Self {
        let mut ec = EmbeddedController::new(port, config.ec_timing, shutdown.clone());
        let mut fan = FanController::new(config.speed);

        if let Err(e) = fan.stop(&mut ec).await {
            debug!("Initial fan stop incomplete: {}", e);
        }

        Self {
            config,
            ec,
            fan,
            status,
            shutdown,
            last_temperature: 0,
            ticks: 0,
            state: SchedulerState::Idle,
        }
    }

    pub fn fan_state(&self) -> FanState {
        self.fan.state()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn port(&self) -> &P {
        self.ec.port()
    }

    /// Sample, decide, act and log once.
    ///
    /// Returns `None` when shutdown was requested before or during the tick.
    pub async fn tick(&mut self) -> Option<TickReport> {
        if self.shutdown.is_triggered() {
            return None;
        }
        self.ticks += 1;

        let (temperature, fresh) = match self.ec.read_temperature().await {
            Ok(temperature) => {
                self.last_temperature = temperature;
                (temperature, true)
            }
            Err(EcError::Cancelled) => return None,
            Err(e @ EcError::Timeout { .. }) => {
                debug!("Tick {}: {}, reusing {}°C", self.ticks, e, self.last_temperature);
                (self.last_temperature, false)
            }
            Err(e) => {
                warn!("Tick {}: temperature read failed: {}", self.ticks, e);
                (self.last_temperature, false)
            }
        };

        let decision = self.config.policy.decide(self.fan.state(), temperature);
        match self.fan.apply(&mut self.ec, decision.action).await {
            Ok(()) => {}
            Err(EcError::Cancelled) => return None,
            Err(e @ EcError::Timeout { .. }) => debug!("Tick {}: fan write: {}", self.ticks, e),
            Err(e) => warn!("Tick {}: fan write failed: {}", self.ticks, e),
        }

        if self.config.logging {
            let line = StatusLine::now(self.fan.state(), temperature);
            if let Err(e) = self.status.record(&line) {
                warn!("Failed to write status line: {}", e);
            }
        }

        Some(TickReport {
            temperature,
            fresh,
            decision,
        })
    }

    /// Run ticks every `interval` until shutdown is requested.
    ///
    /// The wait is restarted after each tick finishes, so a slow tick delays
    /// the following ones instead of being caught up.
    pub async fn run(&mut self) -> ShutdownReason {
        self.state = SchedulerState::Running;
        info!(
            "Fan daemon running, interval {}s, thresholds {}°C/{}°C",
            self.config.interval.as_secs(),
            self.config.policy.start_temp(),
            self.config.policy.stop_temp()
        );

        let interval = self.config.interval;
        let reason = loop {
            if let Some(reason) = self.shutdown.reason() {
                break reason;
            }
            tokio::select! {
                reason = self.shutdown.triggered() => break reason,
                _ = sleep(interval) => {}
            }
            self.tick().await;
        };

        self.state = SchedulerState::Idle;
        info!("Fan daemon stopping after {} ticks", self.ticks);
        reason
    }

    /// Release the port and the status log. Safe to call more than once.
    pub fn release(&mut self) {
        self.ec.close();
        self.status.close();
    }

    /// Signal shutdown path: announce, release everything, report the exit status
    pub fn shut_down(mut self, reason: ShutdownReason) -> i32 {
        let console = self.config.console();
        if console {
            print!("{}", reason.notice());
            let _ = std::io::stdout().flush();
        }
        self.release();
        if console {
            println!("done");
        }
        SHUTDOWN_EXIT_CODE
    }
}
