//! Compile-only verification that the full display stack wires together.
//!
//! Run via: `cargo check-all` (xtask compiles this for thumbv6m-none-eabi)

#![cfg(not(feature = "host"))]
#![no_std]
#![no_main]
#![allow(dead_code, reason = "Compile-time verification only")]

use defmt_rtt as _;
use embassy_executor::Spawner;
use panic_probe as _;
use vfd_kit::{DisplayConfig, Hardware, Result, TransitionKind, Vfd, VfdStatic};

/// Verify that the hardware bundle feeds a display without type friction.
async fn build_display(spawner: Spawner) -> Result<Vfd<'static>> {
    static VFD: VfdStatic = Vfd::new_static();
    let hardware = Hardware::default();
    let vfd = Vfd::new(
        &VFD,
        hardware.bus,
        hardware.adc,
        hardware.light_sensor,
        &DisplayConfig::default(),
        spawner,
    )?;
    vfd.write_str(0, "burn in");
    vfd.request_transition(TransitionKind::Up);
    Ok(vfd)
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    // This main function exists only to satisfy the compiler.
    // The actual verification happens at compile time via the function above.
}

#[cfg(not(any(target_arch = "arm", target_arch = "riscv32", target_arch = "riscv64")))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo<'_>) -> ! {
    loop {}
}
