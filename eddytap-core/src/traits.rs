//! Collaborator traits at the engine's boundaries
//!
//! The engine never talks to hardware or to the host directly. The bus
//! transport and the trigger synchronization object are external
//! collaborators; these traits pin down exactly what the engine needs
//! from them and nothing more. Firmware glue implements them over the
//! real I2C driver and trsync objects, tests implement them over plain
//! structs.

use crate::errors::SensorResult;

/// Register transport to the sensor chip
///
/// Both reads run in the cooperative worker context, never in interrupt
/// context. A transport failure is fatal to the channel; implementations
/// map their own retry/shutdown policy onto [`SensorError::Bus`]
/// (`crate::errors::SensorError::Bus`).
pub trait SensorBus {
    /// Read the 16-bit status register
    fn read_status(&mut self) -> SensorResult<u16>;

    /// Read the 32-bit channel-0 data word
    fn read_data(&mut self) -> SensorResult<u32>;
}

/// External trigger-notification channel
///
/// Multi-consumer synchronization is the implementor's concern; the
/// engine only ever reports one reason code per armed session, and the
/// session is already `Inactive` by the time this is called.
pub trait TriggerChannel {
    /// Deliver a trigger or abort with the given reason code
    fn trigger(&mut self, reason: u8);
}

impl<T: TriggerChannel + ?Sized> TriggerChannel for &mut T {
    fn trigger(&mut self, reason: u8) {
        (**self).trigger(reason);
    }
}
