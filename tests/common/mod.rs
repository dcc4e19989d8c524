//! Simulated device and power instrument shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dut_bench::errors::{PowerError, PowerResult, TransportError, TransportResult};
use dut_bench::transport::DEFAULT_END_MARKER;
use dut_bench::{PowerInstrument, Transport};

/// Ordered log of everything the device and the instrument saw.
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.borrow().clone()
}

/// Encodes scores the way [`MockDevice`] expects them in a payload.
pub fn payload(scores: &[f32]) -> Vec<u8> {
    scores
        .iter()
        .map(|score| score.to_string())
        .collect::<Vec<_>>()
        .join(",")
        .into_bytes()
}

/// In-memory device. It reassembles uploaded chunks and answers `infer`
/// with the uploaded payload text as its results line, so a wrong upload
/// shows up as wrong results.
pub struct MockDevice {
    pub name: Option<String>,
    pub model: Option<String>,
    pub profile: Option<String>,
    pub commands: Vec<String>,
    events: EventLog,
    buffer: Vec<u8>,
    announced: usize,
    fail_on: Option<(String, usize)>,
}

impl MockDevice {
    pub fn new(name: &str, model: &str, profile: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            model: Some(model.to_string()),
            profile: Some(profile.to_string()),
            commands: Vec::new(),
            events: event_log(),
            buffer: Vec::new(),
            announced: 0,
            fail_on: None,
        }
    }

    /// A device that answers the identification commands with nothing useful.
    pub fn anonymous() -> Self {
        Self {
            name: None,
            model: None,
            profile: None,
            ..Self::new("", "", "")
        }
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    /// Drops the connection on the `occurrence`-th command starting with `prefix`.
    pub fn failing_on(mut self, prefix: &str, occurrence: usize) -> Self {
        self.fail_on = Some((prefix.to_string(), occurrence));
        self
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn announced(&self) -> usize {
        self.announced
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands
            .iter()
            .filter(|command| command.starts_with(prefix))
            .count()
    }

    fn respond(&mut self, command: &str) -> Vec<String> {
        match command {
            "name" => match &self.name {
                Some(name) => vec![format!("m-name-dut-[{}]", name)],
                None => vec!["m-name-dut-unknown".to_string()],
            },
            "profile" => {
                let mut lines = vec!["m-firmware-1.0".to_string()];
                if let Some(profile) = &self.profile {
                    lines.push(format!("m-profile-[{}]", profile));
                }
                if let Some(model) = &self.model {
                    lines.push(format!("m-model-[{}]", model));
                }
                lines
            }
            "timestamp" => vec!["m-lap-us-42".to_string()],
            "help" => vec!["name".to_string(), "profile".to_string()],
            "db print" => vec![hex::encode(&self.buffer)],
            _ => self.respond_with_argument(command),
        }
    }

    fn respond_with_argument(&mut self, command: &str) -> Vec<String> {
        if let Some(size) = command.strip_prefix("db load ") {
            self.buffer.clear();
            self.announced = size.parse().unwrap_or(0);
            vec![format!("m-load-{}", self.announced)]
        } else if let Some(chunk) = command.strip_prefix("db ") {
            match hex::decode(chunk) {
                Ok(bytes) => {
                    self.buffer.extend_from_slice(&bytes);
                    vec![format!("m-buffer-{}", self.buffer.len())]
                }
                Err(_) => vec!["e-[Invalid hex]".to_string()],
            }
        } else if let Some(arguments) = command.strip_prefix("infer ") {
            let count: u64 = arguments
                .split_whitespace()
                .next()
                .and_then(|count| count.parse().ok())
                .unwrap_or(1);
            vec![
                "m-warmup-start".to_string(),
                "m-lap-us-1000".to_string(),
                format!("m-lap-us-{}", 1000 + count * 1000),
                format!("m-results-[{}]", String::from_utf8_lossy(&self.buffer)),
            ]
        } else {
            vec!["e-[Unknown command]".to_string()]
        }
    }
}

impl Transport for MockDevice {
    fn send_command(&mut self, command: &str) -> TransportResult<Vec<String>> {
        self.commands.push(command.to_string());
        self.events.borrow_mut().push(format!("cmd:{}", command));

        if let Some((prefix, occurrence)) = &self.fail_on {
            if command.starts_with(prefix.as_str()) && self.count(prefix) == *occurrence {
                return Err(TransportError::ConnectionClosed {
                    command: command.to_string(),
                    end_marker: DEFAULT_END_MARKER.to_string(),
                });
            }
        }

        Ok(self.respond(command))
    }
}

/// Replays canned replies in order, whatever the command.
pub struct ScriptedTransport {
    pub commands: Vec<String>,
    replies: VecDeque<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: &[&[&str]]) -> Self {
        Self {
            commands: Vec::new(),
            replies: replies
                .iter()
                .map(|reply| reply.iter().map(|line| line.to_string()).collect())
                .collect(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send_command(&mut self, command: &str) -> TransportResult<Vec<String>> {
        self.commands.push(command.to_string());
        self.replies
            .pop_front()
            .ok_or_else(|| TransportError::ConnectionClosed {
                command: command.to_string(),
                end_marker: DEFAULT_END_MARKER.to_string(),
            })
    }
}

/// Power instrument that only records what it was asked to do.
pub struct MockPower {
    events: EventLog,
    fail_stop: bool,
}

impl MockPower {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            fail_stop: false,
        }
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

impl PowerInstrument for MockPower {
    fn start(&mut self) -> PowerResult<String> {
        self.events.borrow_mut().push("power:start".to_string());
        Ok("started".to_string())
    }

    fn stop(&mut self) -> PowerResult<String> {
        self.events.borrow_mut().push("power:stop".to_string());
        if self.fail_stop {
            return Err(PowerError::InstrumentFailure {
                message: "stop failed".to_string(),
            });
        }
        Ok("stopped".to_string())
    }

    fn configure_voltage(&mut self, millivolts: u32) -> PowerResult<()> {
        if millivolts > 5000 {
            return Err(PowerError::UnsupportedVoltage { millivolts });
        }
        self.events
            .borrow_mut()
            .push(format!("power:voltage:{}", millivolts));
        Ok(())
    }
}
