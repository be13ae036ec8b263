#![no_std]
// cdc-bench - USB CDC bandwidth/latency test firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_main]
#![allow(clippy::empty_loop)]

//! Blue Pill (STM32F103C8) port of the CDC bandwidth/latency test firmware.
//! All policy lives in `cdcbench-core`; this binary only binds the core's
//! hardware traits to the real registers and routes the exception vectors
//! into the fault dispatcher.

use cortex_m_rt::{entry, exception};
use panic_halt as _;

use cdcbench_core::fault::{self, FaultSource, SystemControl};
use cdcbench_core::heartbeat::{self, Indicator};
use cdcbench_core::startup::{self, Board};

// RCC (reset and clock control)
const RCC_BASE: u32 = 0x4002_1000;
const RCC_CR: *mut u32 = RCC_BASE as *mut u32;
const RCC_CFGR: *mut u32 = (RCC_BASE + 0x04) as *mut u32;
const RCC_CIR: *mut u32 = (RCC_BASE + 0x08) as *mut u32;
const RCC_APB2ENR: *mut u32 = (RCC_BASE + 0x18) as *mut u32;
const RCC_APB1ENR: *mut u32 = (RCC_BASE + 0x1C) as *mut u32;

const RCC_CR_HSEON: u32 = 1 << 16;
const RCC_CR_HSERDY: u32 = 1 << 17;
const RCC_CR_CSSON: u32 = 1 << 19;
const RCC_CR_PLLON: u32 = 1 << 24;
const RCC_CR_PLLRDY: u32 = 1 << 25;

const RCC_CFGR_SW_PLL: u32 = 0b10;
const RCC_CFGR_SWS_PLL: u32 = 0b10 << 2;
const RCC_CFGR_PPRE1_DIV2: u32 = 0b100 << 8;
const RCC_CFGR_PLLSRC_HSE: u32 = 1 << 16;
const RCC_CFGR_PLLMUL9: u32 = 0b0111 << 18;

const RCC_CIR_CSSF: u32 = 1 << 7;
const RCC_CIR_CSSC: u32 = 1 << 23;

const RCC_APB2ENR_IOPCEN: u32 = 1 << 4;
const RCC_APB1ENR_USBEN: u32 = 1 << 23;

// Flash access control
const FLASH_ACR: *mut u32 = 0x4002_2000 as *mut u32;
const FLASH_ACR_PRFTBE: u32 = 1 << 4;
const FLASH_ACR_LATENCY_2: u32 = 0b010;

// GPIOC (LED on PC13, active low on the Blue Pill)
const GPIOC_BASE: u32 = 0x4001_1000;
const GPIOC_CRH: *mut u32 = (GPIOC_BASE + 0x04) as *mut u32;
const GPIOC_ODR: *mut u32 = (GPIOC_BASE + 0x0C) as *mut u32;
const GPIOC_BSRR: *mut u32 = (GPIOC_BASE + 0x10) as *mut u32;
const GPIOC_BRR: *mut u32 = (GPIOC_BASE + 0x14) as *mut u32;
const GPIO_PIN13: u32 = 1 << 13;

// USB full-speed device
const USB_BASE: u32 = 0x4000_5C00;
const USB_CNTR: *mut u32 = (USB_BASE + 0x40) as *mut u32;
const USB_ISTR: *mut u32 = (USB_BASE + 0x44) as *mut u32;
const USB_DADDR: *mut u32 = (USB_BASE + 0x4C) as *mut u32;
const USB_BTABLE: *mut u32 = (USB_BASE + 0x50) as *mut u32;

const USB_CNTR_FRES: u32 = 1 << 0;
const USB_CNTR_PDWN: u32 = 1 << 1;
const USB_CNTR_RESETM: u32 = 1 << 10;
const USB_CNTR_CTRM: u32 = 1 << 15;
const USB_DADDR_EF: u32 = 1 << 7;

// System control block
const SCB_SHCSR: *mut u32 = 0xE000_ED24 as *mut u32;
const SCB_CFSR: *mut u32 = 0xE000_ED28 as *mut u32;
const SCB_SHCSR_MEMFAULTENA: u32 = 1 << 16;
const SCB_SHCSR_BUSFAULTENA: u32 = 1 << 17;
// Bus-fault status byte of CFSR, write-one-to-clear.
const SCB_CFSR_BFSR_MASK: u32 = 0x0000_FF00;

// SysTick
const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
const SYST_RVR: *mut u32 = 0xE000_E014 as *mut u32;
const SYST_CVR: *mut u32 = 0xE000_E018 as *mut u32;
const SYST_CSR_ENABLE: u32 = 1 << 0;
const SYST_CSR_TICKINT: u32 = 1 << 1;
const SYST_CSR_CLKSOURCE: u32 = 1 << 2;

/// Heartbeat period in core cycles: 100 ms at 72 MHz. Fits the 24-bit
/// SysTick reload.
const HEARTBEAT_PERIOD_CYCLES: u32 = 7_200_000;

#[inline]
fn reg_set(reg: *mut u32, bits: u32) {
    unsafe {
        let v = core::ptr::read_volatile(reg);
        core::ptr::write_volatile(reg, v | bits);
    }
}

#[inline]
fn reg_write(reg: *mut u32, value: u32) {
    unsafe { core::ptr::write_volatile(reg, value) }
}

#[inline]
fn reg_read(reg: *mut u32) -> u32 {
    unsafe { core::ptr::read_volatile(reg) }
}

/// The one board this binary runs on. Zero-sized: every method is a direct
/// register access, so the trap handlers can conjure one without shared
/// state.
struct BluePill;

impl Board for BluePill {
    fn init_device(&mut self) {
        // HSE on with the clock security system armed; a CSS trip lands in
        // the NMI handler as an oscillator fault.
        reg_set(RCC_CR, RCC_CR_HSEON | RCC_CR_CSSON);
        while reg_read(RCC_CR) & RCC_CR_HSERDY == 0 {}

        // Two wait states before running at 72 MHz.
        reg_write(FLASH_ACR, FLASH_ACR_PRFTBE | FLASH_ACR_LATENCY_2);

        // 8 MHz HSE x9 = 72 MHz sysclk, APB1 at 36 MHz. USBPRE stays zero:
        // PLL/1.5 gives the 48 MHz USB clock.
        reg_write(
            RCC_CFGR,
            RCC_CFGR_PPRE1_DIV2 | RCC_CFGR_PLLSRC_HSE | RCC_CFGR_PLLMUL9,
        );
        reg_set(RCC_CR, RCC_CR_PLLON);
        while reg_read(RCC_CR) & RCC_CR_PLLRDY == 0 {}

        reg_set(RCC_CFGR, RCC_CFGR_SW_PLL);
        while reg_read(RCC_CFGR) & (0b11 << 2) != RCC_CFGR_SWS_PLL {}

        // PC13 as 2 MHz push-pull output.
        reg_set(RCC_APB2ENR, RCC_APB2ENR_IOPCEN);
        let crh = reg_read(GPIOC_CRH);
        reg_write(GPIOC_CRH, (crh & !(0xF << 20)) | (0x2 << 20));

        // Route bus and memory faults to their own handlers instead of
        // escalating to HardFault.
        reg_set(SCB_SHCSR, SCB_SHCSR_BUSFAULTENA | SCB_SHCSR_MEMFAULTENA);

        // Watchdog policy: IWDG stays at its reset default (off).
    }

    fn configure_usb(&mut self) {
        reg_set(RCC_APB1ENR, RCC_APB1ENR_USBEN);

        // Exit transceiver power-down while holding the controller in
        // reset, then release reset with the interrupt sources unmasked.
        // Descriptor handling itself lives in the CDC stack serviced from
        // the USB interrupt; this only arms the engine.
        reg_write(USB_CNTR, USB_CNTR_FRES);
        reg_write(USB_CNTR, USB_CNTR_CTRM | USB_CNTR_RESETM);
        reg_write(USB_ISTR, 0);
        reg_write(USB_BTABLE, 0);
        reg_write(USB_DADDR, USB_DADDR_EF);
    }

    fn delay_cycles(&mut self, cycles: u32) {
        cortex_m::asm::delay(cycles);
    }

    fn arm_heartbeat_timer(&mut self) {
        reg_write(SYST_RVR, HEARTBEAT_PERIOD_CYCLES - 1);
        reg_write(SYST_CVR, 0);
        reg_write(SYST_CSR, SYST_CSR_CLKSOURCE | SYST_CSR_TICKINT | SYST_CSR_ENABLE);
    }

    fn enable_interrupts(&mut self) {
        unsafe { cortex_m::interrupt::enable() }
    }
}

impl SystemControl for BluePill {
    fn clear_oscillator_fault(&mut self) {
        // CSSC clears both the CSS status flag and its interrupt flag.
        reg_write(RCC_CIR, RCC_CIR_CSSC);
    }

    fn clear_bus_error(&mut self) {
        // BFSR is write-one-to-clear.
        reg_write(SCB_CFSR, SCB_CFSR_BFSR_MASK);
    }

    fn disable_usb(&mut self) {
        // Force-reset plus transceiver power-down: electrically and
        // logically off until an out-of-band reconfiguration.
        reg_write(USB_CNTR, USB_CNTR_FRES | USB_CNTR_PDWN);
    }
}

impl Indicator for BluePill {
    fn toggle(&mut self) {
        // Single BSRR/BRR store either way, safe from interrupt context.
        if reg_read(GPIOC_ODR) & GPIO_PIN13 != 0 {
            reg_write(GPIOC_BRR, GPIO_PIN13);
        } else {
            reg_write(GPIOC_BSRR, GPIO_PIN13);
        }
    }
}

#[entry]
fn main() -> ! {
    // The runtime enters with PRIMASK clear; keep everything masked until
    // the bring-up protocol reaches its final stage.
    cortex_m::interrupt::disable();

    let mut board = BluePill;
    startup::bring_up(&mut board);

    // Interrupt-driven from here on.
    loop {}
}

#[exception]
fn SysTick() {
    heartbeat::heartbeat(&mut BluePill);
}

#[exception]
fn NonMaskableInt() {
    // The only classified NMI source on this part is the clock security
    // system; anything else stays a generic non-maskable event.
    let source = if reg_read(RCC_CIR) & RCC_CIR_CSSF != 0 {
        FaultSource::OscillatorFault
    } else {
        FaultSource::NonMaskable
    };
    fault::dispatch(source, &mut BluePill);
}

#[exception]
fn BusFault() {
    fault::dispatch(FaultSource::BusError, &mut BluePill);
}

#[exception]
fn MemoryManagement() {
    fault::dispatch(FaultSource::AccessViolation, &mut BluePill);
}
