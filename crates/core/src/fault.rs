// cdc-bench - USB CDC bandwidth/latency test firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! System-fault classification and recovery. Runs at trap priority with
//! further interrupts suppressed, so every path here is allocation-free and
//! bounded.

/// Cause of a system-fault trap, as classified by the platform at trap time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultSource {
    /// Spurious trap; the status registers carry no cause.
    None,
    /// Generic non-maskable interrupt with no further classification.
    NonMaskable,
    /// The clock reference failed or glitched.
    OscillatorFault,
    /// A protected-memory access was rejected.
    AccessViolation,
    /// A memory or peripheral-bus transaction failed.
    BusError,
}

impl FaultSource {
    /// Decodes the system-event vector word delivered by vectored trap
    /// units: even offsets, one per cause, lowest first.
    ///
    /// The hardware generates only the five encodings below; anything else
    /// is a contract violation, not a runtime error to report.
    pub fn from_vector(vector: u16) -> Self {
        match vector {
            0x00 => FaultSource::None,
            0x02 => FaultSource::NonMaskable,
            0x04 => FaultSource::OscillatorFault,
            0x06 => FaultSource::AccessViolation,
            0x08 => FaultSource::BusError,
            _ => unreachable!("system-event vector outside hardware range"),
        }
    }
}

/// Register-level recovery services consumed by [`dispatch`].
///
/// Precondition (documented, not checked): every method is a plain register
/// store the hardware applies atomically with respect to normal-priority
/// code. In particular `disable_usb` is the only interrupt-context writer
/// of the USB enablement state, and the bring-up sequencer never touches
/// that state again after boot, so no lock is needed around it.
pub trait SystemControl {
    /// Clears the oscillator-fault status flag and the corresponding
    /// system flag register bit.
    fn clear_oscillator_fault(&mut self);

    /// Clears the bus-error status register.
    fn clear_bus_error(&mut self);

    /// Forces the USB engine into its disabled state. Nothing in this core
    /// re-enables it; recovery is an out-of-band reconfiguration path.
    fn disable_usb(&mut self);
}

/// Applies the recovery action for one fault trap.
///
/// Exactly one arm runs per invocation and no state is carried across
/// invocations. The no-op arms are deliberate: the original firmware
/// ignores those causes, and this port preserves that behavior rather than
/// inventing recovery logic for them.
pub fn dispatch<S: SystemControl>(source: FaultSource, sys: &mut S) {
    match source {
        FaultSource::None => {}
        FaultSource::NonMaskable => {}
        FaultSource::OscillatorFault => {
            sys.clear_oscillator_fault();
        }
        FaultSource::AccessViolation => {}
        FaultSource::BusError => {
            sys.clear_bus_error();
            sys.disable_usb();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct Calls {
        osc_clears: u32,
        bus_clears: u32,
        usb_disables: u32,
    }

    impl SystemControl for Calls {
        fn clear_oscillator_fault(&mut self) {
            self.osc_clears += 1;
        }
        fn clear_bus_error(&mut self) {
            self.bus_clears += 1;
        }
        fn disable_usb(&mut self) {
            self.usb_disables += 1;
        }
    }

    #[test]
    fn ignored_causes_touch_nothing() {
        for source in [
            FaultSource::None,
            FaultSource::NonMaskable,
            FaultSource::AccessViolation,
        ] {
            let mut sys = Calls::default();
            dispatch(source, &mut sys);
            assert_eq!(sys, Calls::default(), "{source:?} must be a no-op");
        }
    }

    #[test]
    fn oscillator_fault_clears_flags_only() {
        let mut sys = Calls::default();
        dispatch(FaultSource::OscillatorFault, &mut sys);
        assert_eq!(sys.osc_clears, 1);
        assert_eq!(sys.bus_clears, 0);
        assert_eq!(sys.usb_disables, 0);
    }

    #[test]
    fn bus_error_clears_status_then_kills_usb() {
        let mut sys = Calls::default();
        dispatch(FaultSource::BusError, &mut sys);
        assert_eq!(sys.bus_clears, 1);
        assert_eq!(sys.usb_disables, 1);
        assert_eq!(sys.osc_clears, 0);
    }

    #[test]
    fn vector_decoding_covers_the_event_range() {
        assert_eq!(FaultSource::from_vector(0x00), FaultSource::None);
        assert_eq!(FaultSource::from_vector(0x02), FaultSource::NonMaskable);
        assert_eq!(FaultSource::from_vector(0x04), FaultSource::OscillatorFault);
        assert_eq!(FaultSource::from_vector(0x06), FaultSource::AccessViolation);
        assert_eq!(FaultSource::from_vector(0x08), FaultSource::BusError);
    }

    #[test]
    #[should_panic(expected = "outside hardware range")]
    fn vector_decoding_rejects_out_of_range_words() {
        let _ = FaultSource::from_vector(0x0A);
    }
}
