//! Demo firmware for an IV-18 style tube: a free-running clock face that
//! exercises staged writes, transitions, and settings persistence.
#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::flash::{Blocking, Flash};
use embassy_time::{Duration, Timer};
use panic_probe as _;
use vfd_kit::{
    ConfigStore, DisplayConfig, Hardware, INTERNAL_FLASH_SIZE, Never, Pad, Result, TransitionKind,
    Vfd, VfdStatic,
};

#[embassy_executor::main]
pub async fn main(spawner: Spawner) -> ! {
    let err = run(spawner).await.unwrap_err();
    core::panic!("{err}");
}

async fn run(spawner: Spawner) -> Result<Never> {
    let hardware = Hardware::default();

    let flash = Flash::<_, Blocking, INTERNAL_FLASH_SIZE>::new_blocking(hardware.flash);
    let mut store = ConfigStore::new(flash);
    let config = match store.load()? {
        Some(config) => config,
        None => {
            let config = DisplayConfig::default();
            store.save(&config)?;
            config
        }
    };

    static VFD: VfdStatic = Vfd::new_static();
    let vfd = Vfd::new(
        &VFD,
        hardware.bus,
        hardware.adc,
        hardware.light_sensor,
        &config,
        spawner,
    )?;

    vfd.write_str(0, "hello");
    vfd.request_transition(TransitionKind::Left);
    Timer::after(Duration::from_secs(3)).await;

    // Free-running demo clock from noon; a real build would feed wall time.
    let mut hours: u8 = 12;
    let mut minutes: u8 = 0;
    let mut seconds: u8 = 0;
    info!("vfd_pico1: starting demo clock");
    loop {
        vfd.write_two_digit(0, i16::from(hours), Pad::Space);
        vfd.write_char(2, ':');
        vfd.write_two_digit(3, i16::from(minutes), Pad::Zero);
        vfd.write_char(5, ':');
        vfd.write_two_digit(6, i16::from(seconds), Pad::Zero);
        let kind = if minutes == 0 && seconds == 0 {
            TransitionKind::Left
        } else if seconds == 0 {
            TransitionKind::Up
        } else {
            TransitionKind::Instant
        };
        vfd.request_transition(kind);

        Timer::after(Duration::from_secs(1)).await;
        seconds = seconds.wrapping_add(1);
        if seconds == 60 {
            seconds = 0;
            minutes = minutes.wrapping_add(1);
        }
        if minutes == 60 {
            minutes = 0;
            hours = hours.wrapping_add(1);
            if hours == 24 {
                hours = 0;
            }
            vfd.apply_auto_off(hours);
        }
    }
}
