use embassy_rp::{
    Peri,
    adc::{self, Adc},
    gpio::{self, Level, Pull},
    peripherals::FLASH,
    pwm::{Config as PwmConfig, Pwm},
};

use crate::wire::DriverBus;

/// PWM wrap value for the blanking line. With the stock 125 MHz system
/// clock the carrier runs near 490 kHz, far above anything the eye or the
/// tube responds to.
const DUTY_TOP: u16 = 255;

/// Shift-register lines plus the PWM-driven blanking line.
///
/// The blank pin is active high. The PWM slice drives it inverted, so
/// `compare_a` counts lit time directly: 0 is dark, 255 is fully lit.
pub struct ShiftBus<'d> {
    data: gpio::Output<'d>,
    clock: gpio::Output<'d>,
    strobe: gpio::Output<'d>,
    blanked: bool,
    duty_compare: u16,
    pwm: Pwm<'d>,
    pwm_config: PwmConfig,
}

impl<'d> ShiftBus<'d> {
    #[must_use]
    pub fn new(
        data: gpio::Output<'d>,
        clock: gpio::Output<'d>,
        strobe: gpio::Output<'d>,
        mut pwm: Pwm<'d>,
    ) -> Self {
        let mut pwm_config = PwmConfig::default();
        pwm_config.top = DUTY_TOP;
        pwm_config.phase_correct = false;
        pwm_config.invert_a = true;
        // Dark until the first mux pass sets a real duty.
        pwm_config.compare_a = 0;
        pwm_config.enable = true;
        pwm.set_config(&pwm_config);
        Self {
            data,
            clock,
            strobe,
            blanked: true,
            duty_compare: 0,
            pwm,
            pwm_config,
        }
    }
}

impl DriverBus for ShiftBus<'_> {
    fn set_blank(&mut self, blanked: bool) {
        self.blanked = blanked;
        self.pwm_config.compare_a = if blanked { 0 } else { self.duty_compare };
        self.pwm.set_config(&self.pwm_config);
    }

    fn shift_bit(&mut self, high: bool) {
        self.data.set_level(Level::from(high));
        self.clock.set_high();
        self.clock.set_low();
    }

    fn strobe(&mut self) {
        self.strobe.set_high();
        self.strobe.set_low();
    }

    fn set_duty(&mut self, duty: u8) {
        self.duty_compare = u16::from(duty);
        if !self.blanked {
            self.pwm_config.compare_a = self.duty_compare;
            self.pwm.set_config(&self.pwm_config);
        }
    }
}

pub struct Hardware {
    pub bus: ShiftBus<'static>,
    pub adc: Adc<'static, adc::Blocking>,
    pub light_sensor: adc::Channel<'static>,
    pub flash: Peri<'static, FLASH>,
}

impl Default for Hardware {
    fn default() -> Self {
        let peripherals: embassy_rp::Peripherals =
            embassy_rp::init(embassy_rp::config::Config::default());

        let bus = ShiftBus::new(
            gpio::Output::new(peripherals.PIN_2, Level::Low),
            gpio::Output::new(peripherals.PIN_3, Level::Low),
            gpio::Output::new(peripherals.PIN_4, Level::Low),
            Pwm::new_output_a(
                peripherals.PWM_SLICE0,
                peripherals.PIN_0,
                PwmConfig::default(),
            ),
        );

        let adc = Adc::new_blocking(peripherals.ADC, adc::Config::default());
        let light_sensor = adc::Channel::new_pin(peripherals.PIN_26, Pull::None);

        Self {
            bus,
            adc,
            light_sensor,
            flash: peripherals.FLASH,
        }
    }
}
