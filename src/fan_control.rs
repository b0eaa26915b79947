use crate::ec::{EcError, EmbeddedController};
use crate::fan::{FanAction, FanState};
use crate::port::PortIo;
use log::{debug, info};

/// Fan register value that switches the fan off
pub const FAN_OFF_CODE: u8 = 0x1f;

/// Default fan register value used when starting the fan
pub const DEFAULT_FAN_SPEED: u8 = 1;

/// Fan controller driving the EC fan register
#[derive(Debug)]
pub struct FanController {
    state: FanState,
    speed: u8,
}

impl FanController {
    /// Create a controller that will start the fan at `speed`.
    ///
    /// The reported state is `Off` but nothing has been written yet; callers
    /// are expected to `stop()` before relying on it.
    pub fn new(speed: u8) -> Self {
        Self {
            state: FanState::Off,
            speed,
        }
    }

    pub fn state(&self) -> FanState {
        self.state
    }

    /// Start the fan at the configured speed.
    ///
    /// The state becomes `On` even if the EC write did not complete; the
    /// error is returned for logging only.
    pub async fn start<P: PortIo>(&mut self, ec: &mut EmbeddedController<P>) -> Result<(), EcError> {
        let result = ec.write_fan_register(self.speed).await;
        self.state = FanState::On;
        match &result {
            Ok(()) => info!("Fan started at speed {}", self.speed),
            Err(e) => debug!("Fan marked on, speed {} not confirmed: {}", self.speed, e),
        }
        result
    }

    /// Stop the fan. Every call issues the EC write.
    pub async fn stop<P: PortIo>(&mut self, ec: &mut EmbeddedController<P>) -> Result<(), EcError> {
        let result = ec.write_fan_register(FAN_OFF_CODE).await;
        self.state = FanState::Off;
        match &result {
            Ok(()) => info!("Fan stopped"),
            Err(e) => debug!("Fan marked off, stop not confirmed: {}", e),
        }
        result
    }

    /// Carry out a policy action
    pub async fn apply<P: PortIo>(
        &mut self,
        ec: &mut EmbeddedController<P>,
        action: FanAction,
    ) -> Result<(), EcError> {
        match action {
            FanAction::Start => self.start(ec).await,
            FanAction::Stop => self.stop(ec).await,
            FanAction::Hold => {
                debug!("Fan {} unchanged", self.state);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::EcTiming;
    use crate::shutdown::ShutdownSignal;
    use crate::test_utils::SimulatedEc;

    fn controller(port: SimulatedEc) -> EmbeddedController<SimulatedEc> {
        EmbeddedController::new(port, EcTiming::default(), ShutdownSignal::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_writes_configured_speed() {
        let mut ec = controller(SimulatedEc::new());
        let mut fan = FanController::new(5);

        fan.start(&mut ec).await.unwrap();

        assert_eq!(fan.state(), FanState::On);
        assert_eq!(ec.port().fan_writes(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_twice_writes_twice() {
        let mut ec = controller(SimulatedEc::new());
        let mut fan = FanController::new(DEFAULT_FAN_SPEED);

        fan.stop(&mut ec).await.unwrap();
        assert_eq!(fan.state(), FanState::Off);
        fan.stop(&mut ec).await.unwrap();
        assert_eq!(fan.state(), FanState::Off);

        assert_eq!(ec.port().fan_writes(), vec![FAN_OFF_CODE, FAN_OFF_CODE]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_changes_even_when_write_times_out() {
        let timing = EcTiming {
            max_polls: 3,
            ..EcTiming::default()
        };
        let mut ec =
            EmbeddedController::new(SimulatedEc::never_ready(), timing, ShutdownSignal::new());
        let mut fan = FanController::new(DEFAULT_FAN_SPEED);

        assert!(fan.start(&mut ec).await.is_err());
        assert_eq!(fan.state(), FanState::On);
        assert!(ec.port().writes.is_empty());

        assert!(matches!(
            fan.stop(&mut ec).await,
            Err(EcError::Timeout { .. })
        ));
        assert_eq!(fan.state(), FanState::Off);
        assert!(ec.port().fan_writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_touches_nothing() {
        let mut ec = controller(SimulatedEc::new());
        let mut fan = FanController::new(DEFAULT_FAN_SPEED);

        fan.apply(&mut ec, FanAction::Hold).await.unwrap();

        assert_eq!(fan.state(), FanState::Off);
        assert!(ec.port().writes.is_empty());
        assert_eq!(ec.port().status_reads, 0);
    }
}
