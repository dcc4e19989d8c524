//! Power instrument capability.
//!
//! An instrument brackets a timed operation with `start`/`stop`. Driving the
//! actual supply hardware lives outside this crate; implementations only have
//! to honour the strict start/stop pairing.

use crate::errors::PowerResult;

/// Optional power measurement hardware sharing the channel with the device.
pub trait PowerInstrument {
    /// Opens a measurement window and returns the instrument's status text.
    fn start(&mut self) -> PowerResult<String>;

    /// Closes the measurement window opened by [`PowerInstrument::start`].
    fn stop(&mut self) -> PowerResult<String>;

    /// Sets the supply voltage for the device, in millivolts.
    fn configure_voltage(&mut self, millivolts: u32) -> PowerResult<()>;
}

impl<P: PowerInstrument + ?Sized> PowerInstrument for Box<P> {
    fn start(&mut self) -> PowerResult<String> {
        (**self).start()
    }

    fn stop(&mut self) -> PowerResult<String> {
        (**self).stop()
    }

    fn configure_voltage(&mut self, millivolts: u32) -> PowerResult<()> {
        (**self).configure_voltage(millivolts)
    }
}
