//! FSM fault bitflags.
//!
//! Latched by the FSM driver and observable by an external supervisor.
//! Flags in `CRITICAL_MASK` indicate a contract violation or an E-stop.

use bitflags::bitflags;

bitflags! {
    /// Faults raised while running the control FSM.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FsmFault: u16 {
        /// Requested control mode is not supported by the active state.
        const BAD_MODE_REQUEST        = 0x0001;
        /// A pending transition has no finalization case. **CRITICAL**.
        const TRANSITION_UNRESOLVED   = 0x0002;
        /// Body orientation outside the safe envelope. **CRITICAL → E-stop**.
        const ORIENTATION_UNSAFE      = 0x0004;
        /// A desired foot position was clamped into the workspace.
        const P_DES_CLAMPED           = 0x0008;
        /// A feed-forward force was clamped.
        const FORCE_FF_CLAMPED        = 0x0010;
        /// Entry foot positions were not sensed; setpoints or the fallback stance were used.
        const FALLBACK_FOOT_POSITIONS = 0x0020;
        /// State entered without sensed or fallback foot positions; legs limp.
        const SENSING_UNAVAILABLE     = 0x0040;
    }
}

impl FsmFault {
    /// Mask of all CRITICAL flags.
    pub const CRITICAL_MASK: Self = Self::from_bits_truncate(
        Self::TRANSITION_UNRESOLVED.bits() | Self::ORIENTATION_UNSAFE.bits(),
    );

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

impl Default for FsmFault {
    fn default() -> Self {
        Self::empty()
    }
}
