//! Protocol session: framed send and receive with acknowledgment, retry and
//! line recovery.
//!
//! A [`Session`] owns the [`LineController`], the line it provisioned, and the
//! spin delay every pulse is timed with. Each [`send`](Session::send) or
//! [`receive`](Session::receive) call runs to completion before returning:
//!
//! 1. the frame is exchanged once (a *trial*)
//! 2. a transient failure (timeout, missing acknowledgment, checksum or
//!    addressing mismatch) counts as a failed trial and the exchange repeats
//! 3. after [`Config::max_trials`] failed trials the line is
//!    [`reset`](Session::reset) and the trial counter starts over
//!
//! Transient failures are never returned to the caller. With the default
//! configuration a call blocks until the exchange succeeds or the line can no
//! longer be provisioned; set [`Config::max_reset_cycles`] to bound it.
//!
//! Only one session call may use the line at a time. Across threads, share
//! the session through [`crate::shared`].

use core::fmt::{self, Write as _};

use embedded_hal::digital::OutputPin;

use crate::command::BodyCommand;
use crate::config::Config;
use crate::consts::{ACK_PATTERN, BODY_DEVICE_ID, SUCCESS_HOLD_UNITS};
use crate::encoding::Text;
use crate::error::{CodecError, Error};
use crate::frame::{ReceivedFrame, encode_frame};
use crate::line::{DataLine, Direction, LineController, LineError, Pull};
use crate::timer::{Monotonic, SpinDelay};
use crate::transceiver::Transceiver;

/// Error type returned by a [`Session`] over controller `C`.
pub type SessionError<C> = Error<LineError<C>>;

/// Observable state of a [`Session`].
///
/// Cleared at the start of every send or receive call, except for the line
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SessionState {
    /// Failed trials since the last success or reset.
    pub trial_counter: u8,
    /// Whether the last call completed with an accepted frame.
    pub confirmed: bool,
    /// Last direction the line was switched to.
    pub direction: Direction,
    /// Reset cycles performed during the current call.
    pub resets: u32,
}

/// A SIMON protocol endpoint on one data line.
pub struct Session<C: LineController, M> {
    controller: C,
    line: Option<C::Line>,
    delay: SpinDelay<M>,
    config: Config,
    state: SessionState,
}

impl<C, M> fmt::Debug for Session<C, M>
where
    C: LineController + fmt::Debug,
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("controller", &self.controller)
            .field("provisioned", &self.line.is_some())
            .field("delay", &self.delay)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl<C, M> Session<C, M>
where
    C: LineController,
    M: Monotonic,
{
    /// Provisions the data line and returns a ready session.
    ///
    /// Provisioning asks the controller for an input with pull-up. If that
    /// fails, the line is provisioned as an output and toggled low then high
    /// (a quarter timeout each) to wake it, then switched to input. Either way
    /// the session waits one full timeout before returning so the remote
    /// device sees an idle line.
    ///
    /// # Errors
    /// [`Error::ResourceFailure`] if the line cannot be provisioned at all.
    pub fn new(controller: C, clock: M, config: Config) -> Result<Self, SessionError<C>> {
        let mut session = Self {
            controller,
            line: None,
            delay: SpinDelay::new(clock),
            config,
            state: SessionState::default(),
        };
        session.provision()?;
        info!("session ready as device {}", session.config.own_device_id);
        Ok(session)
    }

    /// Session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session currently holds a line.
    pub fn is_provisioned(&self) -> bool {
        self.line.is_some()
    }

    /// Releases the line and returns the controller and clock.
    pub fn release(mut self) -> (C, M) {
        if let Some(line) = self.line.take() {
            self.controller.release(line);
        }
        (self.controller, self.delay.into_inner())
    }

    /// Sends `command` to `device_id` and waits for its acknowledgment.
    ///
    /// Retries and resets until the receiver answers with the all-ones
    /// acknowledgment, then drives the line high for a short hold and hands
    /// it back as an input with pull-up.
    ///
    /// # Errors
    /// - [`Error::Decode`] with [`CodecError::Capacity`] if `command` does not fit one frame
    /// - [`Error::Line`] if the pin fails
    /// - [`Error::ResourceFailure`] if a reset cannot provision the line again
    /// - [`Error::CommunicationFailure`] once [`Config::max_reset_cycles`] is exhausted
    pub fn send(&mut self, device_id: u8, command: &str) -> Result<(), SessionError<C>> {
        let frame = encode_frame(device_id, command)?;
        info!("sending {} bits to device {}", frame.len(), device_id);
        self.exchange(|session| {
            session.state.direction = Direction::Output;
            let reply = {
                let mut transceiver = session.transceiver()?;
                transceiver.send_bits(&frame).map_err(Error::Line)?;
                transceiver.read_bits()?
            };
            session.state.direction = Direction::Input;
            if reply.is_empty() {
                return Err(Error::PulseTimeout);
            }
            if reply[..] != ACK_PATTERN[..] {
                debug!("negative acknowledgment of {} bits", reply.len());
                return Err(Error::AcknowledgmentFailure);
            }
            Ok(())
        })?;
        self.state.confirmed = true;
        self.transceiver()?
            .release_high(SUCCESS_HOLD_UNITS)
            .map_err(Error::Line)?;
        self.state.direction = Direction::Input;
        info!("device {} acknowledged", device_id);
        Ok(())
    }

    /// Sends a body-controller command to [`BODY_DEVICE_ID`].
    pub fn send_body(&mut self, command: &BodyCommand) -> Result<(), SessionError<C>> {
        let mut text = Text::new();
        write!(text, "{command}").map_err(|_| CodecError::Capacity)?;
        self.send(BODY_DEVICE_ID, &text)
    }

    /// Waits for a frame addressed to this device and returns its payload.
    ///
    /// No acknowledgment is sent back. Frames with a bad checksum or another
    /// device id count as failed trials.
    ///
    /// # Errors
    /// - [`Error::Decode`] if a frame passed validation but its payload is
    ///   not whole bytes of valid text
    /// - [`Error::Line`], [`Error::ResourceFailure`] and
    ///   [`Error::CommunicationFailure`] as for [`send`](Self::send)
    pub fn receive(&mut self) -> Result<Text, SessionError<C>> {
        let own_id = self.config.own_device_id;
        let text = self.exchange(|session| {
            let bits = session.transceiver()?.read_bits()?;
            session.state.direction = Direction::Input;
            if bits.is_empty() {
                return Err(Error::PulseTimeout);
            }
            let frame =
                ReceivedFrame::parse(&bits).map_err(|_| Error::FrameTooShort(bits.len()))?;
            debug!("received {} bits for device {}", bits.len(), frame.device_id);
            let expected = frame.expected_checksum();
            if expected != frame.checksum {
                return Err(Error::ChecksumMismatch {
                    expected,
                    received: frame.checksum,
                });
            }
            if frame.device_id != own_id {
                return Err(Error::DeviceIdMismatch {
                    expected: own_id,
                    received: frame.device_id,
                });
            }
            Ok(frame.text()?)
        })?;
        self.state.confirmed = true;
        info!("received {} byte command", text.len());
        Ok(text)
    }

    /// Releases the line, reinitializes the controller and provisions the
    /// line again.
    ///
    /// Resets the trial counter. Blocks for at least one full timeout.
    ///
    /// # Errors
    /// [`Error::ResourceFailure`] if the controller cannot be reinitialized or
    /// the line cannot be provisioned. The session then holds no line and
    /// every exchange fails with [`Error::NotProvisioned`] until a later
    /// reset succeeds.
    pub fn reset(&mut self) -> Result<(), SessionError<C>> {
        warn!("resetting line after {} failed trials", self.state.trial_counter);
        if let Some(line) = self.line.take() {
            self.controller.release(line);
        }
        self.controller.reinitialize().map_err(|e| {
            error!("controller reinitialization failed");
            Error::ResourceFailure(e)
        })?;
        self.provision()?;
        self.state.trial_counter = 0;
        self.state.resets += 1;
        Ok(())
    }

    fn provision(&mut self) -> Result<(), SessionError<C>> {
        let line = match self.controller.provision_input(Pull::Up) {
            Ok(line) => line,
            Err(_) => {
                warn!("input provisioning failed, waking the line");
                self.wake_line().map_err(|e| {
                    error!("line provisioning failed");
                    Error::ResourceFailure(e)
                })?
            }
        };
        self.line = Some(line);
        self.state.direction = Direction::Input;
        self.delay.spin(self.config.timing.timeout());
        Ok(())
    }

    /// Provisions the line as an output and toggles it awake. The line is
    /// handed back to the controller if the toggle fails.
    fn wake_line(&mut self) -> Result<C::Line, LineError<C>> {
        let mut line = self.controller.provision_output()?;
        match self.toggle_awake(&mut line) {
            Ok(()) => Ok(line),
            Err(e) => {
                self.controller.release(line);
                Err(e)
            }
        }
    }

    fn toggle_awake(&mut self, line: &mut C::Line) -> Result<(), LineError<C>> {
        let quarter = self.config.timing.timeout() / 4;
        line.set_low()?;
        self.delay.spin(quarter);
        line.set_high()?;
        self.delay.spin(quarter);
        line.set_direction(Direction::Input)?;
        line.set_pull(Pull::Up)
    }

    fn transceiver(&mut self) -> Result<Transceiver<'_, C::Line, M>, SessionError<C>> {
        let line = self.line.as_mut().ok_or(Error::NotProvisioned)?;
        Ok(Transceiver::new(line, &mut self.delay, self.config.timing))
    }

    /// Runs `attempt` until it succeeds, counting transient failures as
    /// trials and resetting the line every [`Config::max_trials`] trials.
    fn exchange<T>(
        &mut self,
        mut attempt: impl FnMut(&mut Self) -> Result<T, SessionError<C>>,
    ) -> Result<T, SessionError<C>> {
        self.state = SessionState {
            direction: self.state.direction,
            ..SessionState::default()
        };
        loop {
            match attempt(self) {
                Ok(value) => {
                    self.state.trial_counter = 0;
                    return Ok(value);
                }
                Err(err) if err.is_transient() => {
                    self.state.trial_counter += 1;
                    warn!("trial {} failed: {}", self.state.trial_counter, err.label());
                    if self.state.trial_counter < self.config.max_trials {
                        continue;
                    }
                    self.reset()?;
                    let resets = self.state.resets;
                    if self.config.max_reset_cycles.is_some_and(|max| resets >= max) {
                        error!("giving up after {} reset cycles", resets);
                        return Err(Error::CommunicationFailure { resets });
                    }
                }
                Err(err) => {
                    error!("exchange failed: {}", err.label());
                    return Err(err);
                }
            }
        }
    }
}
