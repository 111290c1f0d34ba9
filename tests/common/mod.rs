//! Simulated SIMON wire: a virtual clock, a data line and its controller
//! sharing one state, plus a scripted remote device that replays recorded
//! waveforms whenever the session listens.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use simon_line::checksum::checksum16;
use simon_line::encoding::{BitBuf, Text, int_to_bits};
use simon_line::line::{DataLine, Direction, LineController, Pull};
use simon_line::timer::{Monotonic, SpinDelay};
use simon_line::transceiver::Transceiver;
use simon_line::{Config, Error, Session, Timing};

/// Virtual time advanced by every clock read.
pub const STEP_NS: u64 = 50_000;

/// Level changes as `(offset_ns, level)`. The line is high before the first.
pub type Waveform = Vec<(u64, bool)>;

#[derive(Debug, Default)]
pub struct Wire {
    pub now: u64,
    pub direction: Direction,
    pub pull: Option<Pull>,
    /// One entry per switch to output, with absolute edge times.
    pub transmissions: Vec<Waveform>,
    /// Replies played back, one per listen.
    pub replies: VecDeque<Waveform>,
    /// Played back once `replies` is empty.
    pub fallback: Option<Waveform>,
    pub playing: Option<(u64, Waveform)>,
    pub reinits: u32,
    pub releases: u32,
    pub fail_input: u32,
    pub fail_output: bool,
    /// Makes every `set_low` fail.
    pub fail_drive: bool,
    pub fail_reinit: bool,
}

impl Wire {
    fn level(&mut self) -> bool {
        if self.direction == Direction::Output {
            return self
                .transmissions
                .last()
                .and_then(|t| t.last())
                .is_none_or(|&(_, level)| level);
        }
        if self.playing.is_none() {
            let next = self.replies.pop_front().or_else(|| self.fallback.clone());
            self.playing = next.map(|w| (self.now, w));
        }
        match &self.playing {
            Some((start, wave)) => {
                let offset = self.now - start;
                wave.iter()
                    .take_while(|&&(t, _)| t <= offset)
                    .last()
                    .is_none_or(|&(_, level)| level)
            }
            None => true,
        }
    }

    fn drive(&mut self, level: bool) {
        let now = self.now;
        if self.transmissions.is_empty() {
            self.transmissions.push(Vec::new());
        }
        if let Some(t) = self.transmissions.last_mut() {
            t.push((now, level));
        }
    }

    fn switch(&mut self, direction: Direction) {
        self.direction = direction;
        self.playing = None;
        if direction == Direction::Output {
            self.transmissions.push(Vec::new());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimWire(Arc<Mutex<Wire>>);

impl SimWire {
    pub fn lock(&self) -> MutexGuard<'_, Wire> {
        self.0.lock().unwrap()
    }

    pub fn controller(&self) -> SimController {
        SimController { wire: self.clone() }
    }

    pub fn clock(&self) -> SimClock {
        SimClock { wire: self.clone() }
    }

    /// Frame transmissions, each shifted to start at offset 0.
    pub fn frames(&self) -> Vec<Waveform> {
        self.lock()
            .transmissions
            .iter()
            .filter(|t| t.len() > 2)
            .map(|t| normalize(t))
            .collect()
    }

    /// Frame transmissions with absolute edge times.
    pub fn raw_frames(&self) -> Vec<Waveform> {
        self.lock()
            .transmissions
            .iter()
            .filter(|t| t.len() > 2)
            .cloned()
            .collect()
    }
}

fn normalize(wave: &[(u64, bool)]) -> Waveform {
    let origin = wave.first().map_or(0, |&(t, _)| t);
    wave.iter().map(|&(t, level)| (t - origin, level)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

impl digital::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug)]
pub struct SimClock {
    wire: SimWire,
}

impl Monotonic for SimClock {
    fn now_ns(&mut self) -> u64 {
        let mut wire = self.wire.lock();
        let t = wire.now;
        wire.now += STEP_NS;
        t
    }
}

#[derive(Debug)]
pub struct SimLine {
    wire: SimWire,
}

impl ErrorType for SimLine {
    type Error = SimError;
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, SimError> {
        Ok(self.wire.lock().level())
    }

    fn is_low(&mut self) -> Result<bool, SimError> {
        Ok(!self.wire.lock().level())
    }
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), SimError> {
        let mut wire = self.wire.lock();
        if wire.fail_drive {
            return Err(SimError);
        }
        wire.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), SimError> {
        self.wire.lock().drive(true);
        Ok(())
    }
}

impl DataLine for SimLine {
    fn set_direction(&mut self, direction: Direction) -> Result<(), SimError> {
        self.wire.lock().switch(direction);
        Ok(())
    }

    fn set_pull(&mut self, pull: Pull) -> Result<(), SimError> {
        self.wire.lock().pull = Some(pull);
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimController {
    wire: SimWire,
}

impl LineController for SimController {
    type Line = SimLine;

    fn provision_input(&mut self, pull: Pull) -> Result<SimLine, SimError> {
        let mut wire = self.wire.lock();
        if wire.fail_input > 0 {
            wire.fail_input -= 1;
            return Err(SimError);
        }
        wire.switch(Direction::Input);
        wire.pull = Some(pull);
        Ok(SimLine {
            wire: self.wire.clone(),
        })
    }

    fn provision_output(&mut self) -> Result<SimLine, SimError> {
        let mut wire = self.wire.lock();
        if wire.fail_output {
            return Err(SimError);
        }
        wire.switch(Direction::Output);
        Ok(SimLine {
            wire: self.wire.clone(),
        })
    }

    fn release(&mut self, _line: SimLine) {
        self.wire.lock().releases += 1;
    }

    fn reinitialize(&mut self) -> Result<(), SimError> {
        let mut wire = self.wire.lock();
        if wire.fail_reinit {
            return Err(SimError);
        }
        wire.reinits += 1;
        Ok(())
    }
}

/// The waveform a remote device produces when sending `bits`.
pub fn record_transmission(bits: &[bool]) -> Waveform {
    let wire = SimWire::default();
    let mut line = SimLine { wire: wire.clone() };
    let mut delay = SpinDelay::new(wire.clock());
    Transceiver::new(&mut line, &mut delay, Timing::default())
        .send_bits(bits)
        .unwrap();
    wire.frames().remove(0)
}

pub fn ack() -> Waveform {
    record_transmission(&[true; 8])
}

pub fn nack() -> Waveform {
    record_transmission(&[false; 8])
}

/// Frame bits around a raw payload, with a checksum computed over it.
pub fn raw_frame(device_id: u8, payload: &[bool]) -> BitBuf {
    let (sum1, sum2) = checksum16(payload);
    let mut bits = int_to_bits(device_id).to_vec();
    bits.extend_from_slice(payload);
    bits.extend_from_slice(&int_to_bits(sum1));
    bits.extend_from_slice(&int_to_bits(sum2));
    bits
}

pub fn session(wire: &SimWire, config: Config) -> Session<SimController, SimClock> {
    Session::new(wire.controller(), wire.clock(), config).unwrap()
}

/// Reads one transmission of `wave` straight off a provisioned line.
pub fn read_waveform(wave: Waveform) -> Result<BitBuf, Error<SimError>> {
    let wire = SimWire::default();
    wire.lock().replies.push_back(wave);
    let mut line = wire.controller().provision_input(Pull::Up).unwrap();
    let mut delay = SpinDelay::new(wire.clock());
    Transceiver::new(&mut line, &mut delay, Timing::default()).read_bits()
}

/// Receives `wave` on a fresh session with device id `own_id`.
pub fn receive_waveform(wave: Waveform, own_id: u8) -> Result<Text, Error<SimError>> {
    let wire = SimWire::default();
    wire.lock().replies.push_back(wave);
    let config = Config::default()
        .with_device_id(own_id)
        .with_max_trials(1)
        .with_max_reset_cycles(Some(1));
    session(&wire, config).receive()
}
