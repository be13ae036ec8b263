// cdc-bench - USB CDC bandwidth/latency test firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! One-shot device bring-up. The sequence here is a hardware protocol, not a
//! convenience ordering: every stage must complete before the next starts,
//! and no stage may run twice.

/// Platform services consumed by [`bring_up`].
///
/// The firmware binary implements this against the real registers; host
/// tests implement it with a recording mock. Implementations are trusted to
/// either succeed or hang the part — no stage reports failure, because a
/// failed bring-up is a hardware condition outside this core's authority.
pub trait Board {
    /// Device-level initialization: clocks, pins, watchdog policy.
    fn init_device(&mut self);

    /// Attaches the USB descriptors and arms the controller. After this
    /// returns the USB engine is enabled and its interrupt sources are live
    /// the moment interrupts are unmasked.
    fn configure_usb(&mut self);

    /// Calibrated synchronous busy-wait. Must not yield to anything; fault
    /// traps may still preempt it.
    fn delay_cycles(&mut self, cycles: u32);

    /// Starts the periodic timer that drives the heartbeat tick.
    fn arm_heartbeat_timer(&mut self);

    /// Global interrupt unmask. Called exactly once per power cycle and
    /// never undone; everything after it is interrupt-driven.
    fn enable_interrupts(&mut self);
}

/// Settle time between USB configuration and any further peripheral
/// activity, in core clock cycles at the default clock.
///
/// The transceiver and its 48 MHz reference need this long to stabilize
/// after configuration. No call site reads a result from the wait, but
/// removing it breaks enumeration on real hardware.
pub const SETTLE_DELAY_CYCLES: u32 = 3_000_000;

/// Runs the five bring-up stages, strictly in order, exactly once.
///
/// Order matters end to end: USB must be configured before interrupts are
/// unmasked so no USB interrupt can fire against a half-configured
/// controller, and the heartbeat timer is armed after the settle delay so
/// its first tick cannot race configuration. The caller enters the idle
/// loop after this returns; from that point the interrupt subsystem does
/// all further work.
pub fn bring_up<B: Board>(board: &mut B) {
    board.init_device();
    board.configure_usb();
    // Transceiver settle time. Do not remove.
    board.delay_cycles(SETTLE_DELAY_CYCLES);
    board.arm_heartbeat_timer();
    board.enable_interrupts();
}
