//! Driver for the device under test.
//!
//! The driver turns the protocol's small command vocabulary into request and
//! response exchanges over a [`Transport`], keeps the [`DeviceIdentity`] cache
//! and brackets inference with the optional [`PowerInstrument`].

use log::{debug, info, warn};

use crate::errors::DutResult;
use crate::power::PowerInstrument;
use crate::protocol::{
    DeviceIdentity, HELP_COMMAND, InferenceRequest, InferenceResult, NAME_COMMAND,
    PRINT_BUFFER_COMMAND, PROFILE_COMMAND, TIMESTAMP_COMMAND, begin_load_command, chunk_command,
};
use crate::transport::Transport;

/// Payload bytes per `db` command when a power instrument shares the channel.
pub const POWERED_CHUNK_BYTES: usize = 26;

/// Payload bytes per `db` command when the device is connected directly.
pub const DIRECT_CHUNK_BYTES: usize = 31;

/// A device under test reached through a transport owned by the caller.
///
/// Every operation takes `&mut self`: the protocol is half duplex and a
/// command is only sent once the previous response has been read in full.
pub struct DeviceUnderTest<T> {
    transport: T,
    power: Option<Box<dyn PowerInstrument>>,
    identity: DeviceIdentity,
    max_chunk_bytes: usize,
}

impl<T: Transport> DeviceUnderTest<T> {
    /// Creates a driver. The chunk size is fixed here from the presence of a power instrument.
    pub fn new(transport: T, power: Option<Box<dyn PowerInstrument>>) -> Self {
        let max_chunk_bytes = match power {
            Some(_) => POWERED_CHUNK_BYTES,
            None => DIRECT_CHUNK_BYTES,
        };

        Self {
            transport,
            power,
            identity: DeviceIdentity::default(),
            max_chunk_bytes,
        }
    }

    pub fn max_chunk_bytes(&self) -> usize {
        self.max_chunk_bytes
    }

    pub fn has_power_instrument(&self) -> bool {
        self.power.is_some()
    }

    /// Identity fields learned so far, without talking to the device.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Sets the supply voltage through the power instrument.
    ///
    /// Returns `false` when no instrument is attached.
    pub fn configure_voltage(&mut self, millivolts: u32) -> DutResult<bool> {
        match self.power.as_mut() {
            Some(power) => {
                power.configure_voltage(millivolts)?;
                info!("Configured DUT voltage to {} mV", millivolts);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Runs the identification handshake for every field not cached yet.
    ///
    /// Missing fields are logged and left unset.
    pub fn identify(&mut self) -> DutResult<&DeviceIdentity> {
        if self.identity.name.is_none() {
            self.query_name()?;
        }
        if self.identity.model.is_none() || self.identity.profile.is_none() {
            self.query_profile()?;
        }
        Ok(&self.identity)
    }

    pub fn name(&mut self) -> DutResult<Option<&str>> {
        if self.identity.name.is_none() {
            self.query_name()?;
        }
        Ok(self.identity.name.as_deref())
    }

    pub fn model(&mut self) -> DutResult<Option<&str>> {
        if self.identity.model.is_none() {
            self.query_profile()?;
        }
        Ok(self.identity.model.as_deref())
    }

    pub fn profile(&mut self) -> DutResult<Option<&str>> {
        if self.identity.profile.is_none() {
            self.query_profile()?;
        }
        Ok(self.identity.profile.as_deref())
    }

    fn query_name(&mut self) -> DutResult<()> {
        let lines = self.transport.send_command(NAME_COMMAND)?;
        if self.identity.absorb_name(&lines) == 0 {
            warn!("Failed to get name from the DUT");
        } else if let Some(name) = &self.identity.name {
            info!("Name found: {}", name);
        }
        Ok(())
    }

    fn query_profile(&mut self) -> DutResult<()> {
        let lines = self.transport.send_command(PROFILE_COMMAND)?;
        self.identity.absorb_profile(&lines);

        match &self.identity.model {
            Some(model) => info!("Model found: {}", model),
            None => warn!("Failed to get model from the DUT"),
        }
        match &self.identity.profile {
            Some(profile) => info!("Profile found: {}", profile),
            None => warn!("Failed to get profile from the DUT"),
        }
        Ok(())
    }

    /// Uploads a payload in chunks of at most `max_chunk_bytes` bytes.
    ///
    /// Returns the response to the last chunk, or to `db load` for an empty
    /// payload. Intermediate responses are not inspected.
    pub fn load_payload(&mut self, data: &[u8]) -> DutResult<Vec<String>> {
        let mut last_response = self.transport.send_command(&begin_load_command(data.len()))?;

        let mut chunks = 0usize;
        for chunk in data.chunks(self.max_chunk_bytes) {
            last_response = self.transport.send_command(&chunk_command(chunk))?;
            chunks += 1;
        }

        debug!("Loaded {} bytes in {} chunks", data.len(), chunks);
        Ok(last_response)
    }

    /// Triggers inference and parses the device's results.
    ///
    /// With a power instrument attached the measurement window opens right
    /// before the command is sent and closes right after the response arrives.
    pub fn run_inference(&mut self, request: InferenceRequest) -> DutResult<InferenceResult> {
        let command = request.command();

        if let Some(power) = self.power.as_mut() {
            info!("Power start: {}", power.start()?);
        }

        let response = self.transport.send_command(&command);

        if let Some(power) = self.power.as_mut() {
            match power.stop() {
                Ok(status) => info!("Power stop: {}", status),
                Err(e) if response.is_err() => {
                    warn!("Power stop failed after a transport error: {}", e)
                }
                Err(e) => return Err(e.into()),
            }
        }

        InferenceResult::parse(&command, response?)
    }

    pub fn timestamp(&mut self) -> DutResult<Vec<String>> {
        Ok(self.transport.send_command(TIMESTAMP_COMMAND)?)
    }

    pub fn help(&mut self) -> DutResult<Vec<String>> {
        Ok(self.transport.send_command(HELP_COMMAND)?)
    }

    /// Asks the device to print the payload buffer it currently holds.
    pub fn print_buffer(&mut self) -> DutResult<Vec<String>> {
        Ok(self.transport.send_command(PRINT_BUFFER_COMMAND)?)
    }
}
