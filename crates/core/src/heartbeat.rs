// cdc-bench - USB CDC bandwidth/latency test firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// One observable indicator line, typically the board LED.
pub trait Indicator {
    /// Inverts the line. Single register operation on real hardware.
    fn toggle(&mut self);
}

/// Periodic heartbeat tick, invoked from the timer interrupt.
///
/// Toggles the indicator exactly once per call and nothing else. Runs in
/// interrupt context, so it must stay loop-free and bounded.
pub fn heartbeat<I: Indicator>(led: &mut I) {
    led.toggle();
}
