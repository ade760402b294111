//! Fault bitflags for the control unit.
//!
//! One `ControlFaults` word is produced per tick. Flags marked CRITICAL
//! latch a torque halt (zero torque, actuators disabled) for the rest of
//! the process lifetime.

use bitflags::bitflags;

bitflags! {
    /// Per-tick fault flags.
    ///
    /// CRITICAL flags (→ halt): SENSOR_LOST, ACTUATOR_LOST, OVERRUN_PERSISTENT.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlFaults: u16 {
        /// Sensor read failed or returned non-finite values; last value held.
        const SENSOR_FAULT        = 0x0001;
        /// Policy overran its deadline or failed; last target held.
        const INFERENCE_TIMEOUT   = 0x0002;
        /// Actuator rejected the torque command; tick marked failed.
        const ACTUATOR_FAULT      = 0x0004;
        /// Tick body exceeded the loop period.
        const TICK_OVERRUN        = 0x0008;
        /// Inference misses exceeded the threshold; Standing forced.
        const INFERENCE_ESCALATED = 0x0010;
        /// Sensor faults exceeded the threshold. **CRITICAL → halt**.
        const SENSOR_LOST         = 0x0100;
        /// Actuator faults exceeded the threshold. **CRITICAL → halt**.
        const ACTUATOR_LOST       = 0x0200;
        /// Overruns exceeded the threshold. **CRITICAL → halt**.
        const OVERRUN_PERSISTENT  = 0x0400;
    }
}

impl ControlFaults {
    /// Mask of all CRITICAL flags that halt torque output.
    pub const CRITICAL_MASK: Self = Self::from_bits_truncate(
        Self::SENSOR_LOST.bits() | Self::ACTUATOR_LOST.bits() | Self::OVERRUN_PERSISTENT.bits(),
    );

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

impl Default for ControlFaults {
    fn default() -> Self {
        Self::empty()
    }
}
