use config_file::LightConfig;
use errors::DeviceError;
use presentation::LedColor;
use std::thread;
use std::time::Duration;

#[cfg(feature = "hardware")]
use rppal::gpio::{Gpio, OutputPin};

const FADE_STEPS: u32 = 10;

#[cfg(feature = "hardware")]
const PWM_FREQUENCY: f64 = 200.0;

pub trait SignalLight {
    fn describe(&self) -> String;
    fn pulse(&mut self, color: LedColor, repeats: u32, duration: Duration) -> Result<(), DeviceError>;
    fn turn_off(&mut self) -> Result<(), DeviceError>;
}

/// Brightness levels for a single pulse: ramp up to full, then back down to off.
fn fade_levels() -> Vec<f64> {
    let up = (1..=FADE_STEPS).map(|step| step as f64 / FADE_STEPS as f64);
    let down = (0..FADE_STEPS).rev().map(|step| step as f64 / FADE_STEPS as f64);
    up.chain(down).collect()
}

/// Walks the fade schedule `repeats` times over `duration` each, calling
/// `set_brightness` at every step.
fn run_fade<F>(repeats: u32, duration: Duration, mut set_brightness: F) -> Result<(), DeviceError>
where
    F: FnMut(f64) -> Result<(), DeviceError>,
{
    let levels = fade_levels();
    let step = duration / levels.len() as u32;
    for _ in 0..repeats {
        for level in &levels {
            set_brightness(*level)?;
            thread::sleep(step);
        }
    }
    Ok(())
}

/// Stand-in used when no LED is attached. Keeps the same pacing as a real
/// pulse so the panel loop behaves identically.
pub struct LogLight {
    pulses: u64,
}

impl LogLight {
    pub fn new() -> LogLight {
        LogLight { pulses: 0 }
    }
}

impl SignalLight for LogLight {
    fn describe(&self) -> String {
        "log only (no LED attached)".to_string()
    }

    fn pulse(&mut self, color: LedColor, repeats: u32, duration: Duration) -> Result<(), DeviceError> {
        self.pulses += 1;
        debug!(
            "--Light--: Pulse #{}: {:?} {:?} x{} over {}ms.",
            self.pulses,
            color,
            color.rgb(),
            repeats,
            duration.as_millis()
        );
        run_fade(repeats, duration, |_| Ok(()))
    }

    fn turn_off(&mut self) -> Result<(), DeviceError> {
        debug!("--Light--: Turned off after {} pulses.", self.pulses);
        Ok(())
    }
}

/// Common-cathode RGB LED on three Raspberry Pi GPIO pins, dimmed with
/// software PWM.
#[cfg(feature = "hardware")]
pub struct RgbLedLight {
    pins: (u8, u8, u8),
    red: OutputPin,
    green: OutputPin,
    blue: OutputPin,
}

#[cfg(feature = "hardware")]
impl RgbLedLight {
    pub fn new(config: &LightConfig) -> Result<RgbLedLight, DeviceError> {
        let gpio = Gpio::new().map_err(|e| DeviceError::Unavailable {
            message: e.to_string(),
        })?;
        let output = |pin: u8| {
            gpio.get(pin)
                .map(|pin| pin.into_output_low())
                .map_err(|e| DeviceError::Unavailable {
                    message: format!("GPIO {}: {}", pin, e),
                })
        };

        Ok(RgbLedLight {
            pins: (config.red_pin, config.green_pin, config.blue_pin),
            red: output(config.red_pin)?,
            green: output(config.green_pin)?,
            blue: output(config.blue_pin)?,
        })
    }

    fn drive(pin: &mut OutputPin, duty_cycle: f64) -> Result<(), DeviceError> {
        let result = if duty_cycle <= 0.0 {
            pin.clear_pwm().map(|_| pin.set_low())
        } else {
            pin.set_pwm_frequency(PWM_FREQUENCY, duty_cycle.min(1.0))
        };
        result.map_err(|e| DeviceError::Io {
            message: e.to_string(),
        })
    }

    fn set_color(&mut self, rgb: (u8, u8, u8), brightness: f64) -> Result<(), DeviceError> {
        let (r, g, b) = rgb;
        RgbLedLight::drive(&mut self.red, r as f64 / 255.0 * brightness)?;
        RgbLedLight::drive(&mut self.green, g as f64 / 255.0 * brightness)?;
        RgbLedLight::drive(&mut self.blue, b as f64 / 255.0 * brightness)
    }
}

#[cfg(feature = "hardware")]
impl SignalLight for RgbLedLight {
    fn describe(&self) -> String {
        format!(
            "RGB LED on GPIO {}/{}/{}",
            self.pins.0, self.pins.1, self.pins.2
        )
    }

    fn pulse(&mut self, color: LedColor, repeats: u32, duration: Duration) -> Result<(), DeviceError> {
        let rgb = color.rgb();
        let result = run_fade(repeats, duration, |level| self.set_color(rgb, level));
        if result.is_err() {
            // Don't leave the LED stuck part way through a fade.
            let _ = self.set_color(rgb, 0.0);
        }
        result
    }

    fn turn_off(&mut self) -> Result<(), DeviceError> {
        info!("--Light--: Turning off {}.", self.describe());
        self.set_color((0, 0, 0), 0.0)
    }
}

/// Finds the light to signal on, falling back to logging when no LED can be
/// opened.
#[cfg(feature = "hardware")]
pub fn find_first(config: &LightConfig) -> Box<dyn SignalLight> {
    match RgbLedLight::new(config) {
        Ok(light) => Box::new(light),
        Err(e) => {
            warn!("--Light--: No RGB LED available, pulses will only be logged. Details: {}", e);
            Box::new(LogLight::new())
        }
    }
}

#[cfg(not(feature = "hardware"))]
pub fn find_first(config: &LightConfig) -> Box<dyn SignalLight> {
    info!(
        "--Light--: Built without GPIO support, ignoring pins {}/{}/{}.",
        config.red_pin, config.green_pin, config.blue_pin
    );
    Box::new(LogLight::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn fade_rises_to_full_then_falls_to_off() {
        let levels = fade_levels();
        assert_eq!(levels.len(), 2 * FADE_STEPS as usize);
        assert_eq!(levels[FADE_STEPS as usize - 1], 1.0);
        assert_eq!(*levels.last().unwrap(), 0.0);
        assert!(levels[..FADE_STEPS as usize].windows(2).all(|w| w[0] < w[1]));
        assert!(levels[FADE_STEPS as usize..].windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn fade_runs_once_per_repeat() {
        let mut steps = 0;
        run_fade(3, Duration::from_millis(0), |_| {
            steps += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(steps, 3 * 2 * FADE_STEPS);
    }

    #[test]
    fn fade_stops_at_first_failure() {
        let mut steps = 0;
        let result = run_fade(1, Duration::from_millis(0), |level| {
            steps += 1;
            if level >= 0.5 {
                Err(DeviceError::Io {
                    message: "pin busy".to_string(),
                })
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(steps, 5);
    }

    #[test]
    fn log_light_keeps_real_pacing() {
        let mut light = LogLight::new();
        let started = Instant::now();
        light
            .pulse(LedColor::Purple, 1, Duration::from_millis(100))
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(80));
        assert!(light.turn_off().is_ok());
    }

    #[test]
    fn fallback_light_without_gpio() {
        let config = LightConfig::default();
        let light = find_first(&config);
        if !cfg!(feature = "hardware") {
            assert_eq!(light.describe(), "log only (no LED attached)");
        }
    }
}
