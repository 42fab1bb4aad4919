//! Maps a status record onto the two outputs: the pulse sequence for the
//! signal light and the text panel for the terminal. Everything here except
//! [`blink_out`] is a pure function of the record.

use light::SignalLight;
use remote_status::{OpType, StatusRecord, SystemStatus};
use station::StationProfile;
use std::fmt::Write;
use std::thread;
use std::time::Duration;

pub const STATUS_PULSE: Duration = Duration::from_millis(1000);
pub const DETAIL_PULSE: Duration = Duration::from_millis(250);
pub const PULSE_GAP: Duration = Duration::from_millis(250);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LedColor {
    Red,
    Orange,
    Green,
    Blue,
    Purple,
}

impl LedColor {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match *self {
            LedColor::Red => (255, 0, 0),
            LedColor::Orange => (255, 165, 0),
            LedColor::Green => (0, 128, 0),
            LedColor::Blue => (0, 0, 255),
            LedColor::Purple => (128, 0, 128),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SignalEvent {
    pub color: LedColor,
    pub duration: Duration,
}

impl SignalEvent {
    fn new(color: LedColor, duration: Duration) -> SignalEvent {
        SignalEvent {
            color: color,
            duration: duration,
        }
    }
}

/// One long pulse for the overall status, one short pulse per busy recorder
/// in recorder order (idle recorders are skipped), and a trailing purple pulse
/// when the aux feed is running.
pub fn signal_events(record: &StatusRecord) -> Vec<SignalEvent> {
    let mut events = Vec::with_capacity(record.op_types.len() + 2);

    let status_color = match record.system_status {
        SystemStatus::Error => LedColor::Red,
        SystemStatus::Warning => LedColor::Orange,
        SystemStatus::Normal => LedColor::Green,
    };
    events.push(SignalEvent::new(status_color, STATUS_PULSE));

    for op_type in &record.op_types {
        match *op_type {
            OpType::Idle => continue,
            OpType::Spectrometer => events.push(SignalEvent::new(LedColor::Blue, DETAIL_PULSE)),
            OpType::Recording => events.push(SignalEvent::new(LedColor::Green, DETAIL_PULSE)),
        }
    }

    if record.aux_feed_active {
        events.push(SignalEvent::new(LedColor::Purple, DETAIL_PULSE));
    }

    events
}

fn system_status_text(status: SystemStatus) -> &'static str {
    match status {
        SystemStatus::Error => "One or more subsystems in error                       ",
        SystemStatus::Warning => "No errors conditions but not all subsystems are normal",
        SystemStatus::Normal => "All subsystems are normal                             ",
    }
}

fn op_type_text(op_type: OpType) -> &'static str {
    match op_type {
        OpType::Idle => "Idle        ",
        OpType::Spectrometer => "Spectrometer",
        OpType::Recording => "Recording   ",
    }
}

/// Fixed-width status panel, one line per recorder.
pub fn display_text(station: &StationProfile, record: &StatusRecord) -> String {
    let mut text = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(text, "Overall Status of {}:", station.station_id.to_uppercase());
    let _ = writeln!(text, "{}", system_status_text(record.system_status));
    let _ = writeln!(text);
    let _ = writeln!(text, "Operation Types:");
    for (i, op_type) in record.op_types.iter().enumerate() {
        let _ = writeln!(text, "  DR{}: {}", i + 1, op_type_text(*op_type));
    }
    let _ = writeln!(text);
    let _ = writeln!(text, "{}:", station.aux_feed_label);
    let _ = writeln!(
        text,
        "  {}",
        if record.aux_feed_active {
            "Running    "
        } else {
            "Not running"
        }
    );
    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "Updated: {} UTC",
        record.timestamp.format("%Y/%m/%d %H:%M:%S")
    );

    text
}

/// Drives `light` through `events`, pausing `gap` after each pulse. A failed
/// pulse is logged and skipped. Returns how many pulses failed.
pub fn blink_out<L: SignalLight + ?Sized>(light: &mut L, events: &[SignalEvent], gap: Duration) -> usize {
    let mut failures = 0;
    for event in events {
        match light.pulse(event.color, 1, event.duration) {
            Ok(()) => thread::sleep(gap),
            Err(e) => {
                warn!("--Light--: Skipping {:?} pulse. Details: {}", event.color, e);
                failures += 1;
            }
        }
    }
    failures
}
