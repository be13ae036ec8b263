#![cfg_attr(not(test), no_std)]
// cdc-bench - USB CDC bandwidth/latency test firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Portable core of the CDC bench firmware: the one-shot bring-up sequencer,
//! the system-fault dispatcher and the heartbeat hook, kept behind hardware
//! traits so the same logic runs on the target and under host tests.
//!
//! Execution model: a single hardware thread with two priority tiers. Normal
//! priority runs the bring-up sequence and then an empty idle loop; interrupt
//! priority runs the heartbeat tick and the fault traps, preempting at any
//! instruction boundary. Nothing here is reentrant and nothing needs to be:
//! the platform does not re-enter a trap while it is already executing.

pub mod fault;
pub mod heartbeat;
pub mod startup;

pub use fault::{dispatch, FaultSource, SystemControl};
pub use heartbeat::{heartbeat, Indicator};
pub use startup::{bring_up, Board, SETTLE_DELAY_CYCLES};
