/*
 *  tests/engine_integration.rs
 *
 *  Integration tests for the engine: PIR edges and topics through to the panel
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use ledmux::config::{default_zones, Config};
use ledmux::display::{
    DisplayCapabilities, DisplayDriver, DisplayError, DisplayKind, DisplayMode, FrameBuffer, LedColor,
};
use ledmux::engine::WallClock;
use ledmux::gpio::{Pull, SimulatedInput};
use ledmux::motion::MotionSource;
use ledmux::zones::Tier;
use ledmux::{Engine, EngineConfig};

const FRONT: &str = "diy/perimeter/front/motion";
const PIR_PIN: u8 = 17;

#[derive(Default)]
struct Panel {
    frames: Vec<FrameBuffer>,
    staged: Option<FrameBuffer>,
    numerals: Vec<String>,
}

/// Matrix panel that keeps every flushed frame
struct RecordingPanel {
    caps: DisplayCapabilities,
    panel: Arc<Mutex<Panel>>,
    numerals: String,
}

impl RecordingPanel {
    fn new() -> (Self, Arc<Mutex<Panel>>) {
        let panel = Arc::new(Mutex::new(Panel::default()));
        let caps = DisplayCapabilities {
            width: 8,
            height: 8,
            kind: DisplayKind::Virtual,
            supports_brightness: true,
            supports_blink: false,
        };
        (Self { caps, panel: Arc::clone(&panel), numerals: String::new() }, panel)
    }
}

impl DisplayDriver for RecordingPanel {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.caps
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn set_brightness(&mut self, _level: u8) -> Result<(), DisplayError> {
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.numerals.clear();
        self.panel.lock().unwrap().staged = None;
        Ok(())
    }

    fn write_display(&mut self) -> Result<(), DisplayError> {
        let mut panel = self.panel.lock().unwrap();
        if let Some(frame) = panel.staged.take() {
            panel.frames.push(frame);
        }
        panel.numerals.push(self.numerals.clone());
        Ok(())
    }

    fn set_image(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        self.panel.lock().unwrap().staged = Some(frame.clone());
        Ok(())
    }

    fn print_numeral_string(&mut self, s: &str) -> Result<(), DisplayError> {
        self.numerals = s.to_string();
        Ok(())
    }

    fn set_colon(&mut self, _on: bool) -> Result<(), DisplayError> {
        Ok(())
    }

    fn set_decimal(&mut self, _index: u8, _on: bool) -> Result<(), DisplayError> {
        Ok(())
    }
}

fn at_hour(hour: u32) -> WallClock {
    Arc::new(move || -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap().and_hms_opt(hour, 15, 0).unwrap()
    })
}

fn config() -> EngineConfig {
    let mut cfg = Config::default();
    cfg.tick_period_ms = Some(10);
    cfg.decay_period_ms = Some(3_600_000);
    cfg.daynight_period_ms = Some(10);
    EngineConfig::from_config(&cfg, "192.168.4.2".parse().unwrap())
}

#[tokio::test]
async fn pir_edge_lights_front_zone_red() {
    let (panel, recorded) = RecordingPanel::new();
    let mut engine = Engine::start_with_clock(Box::new(panel), config(), at_hour(11)).unwrap();

    let input = SimulatedInput::new();
    let pir = input.handle();
    let mut source = MotionSource::new(input, PIR_PIN, Pull::Down).unwrap();
    source.enable().unwrap();
    engine.attach_motion(source.queue(), FRONT);

    pir.fire(PIR_PIN, true);
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert!(engine.lights_on());
    assert_eq!(engine.zones().lock().unwrap().tier_of(FRONT), Tier::Fresh);

    let last = recorded.lock().unwrap().frames.last().cloned().unwrap();
    assert_eq!(last.get(0, 3), Some(LedColor::Red));
    assert_eq!(last.get(0, 4), Some(LedColor::Red));
    // dining starts at its initial countdown of 10: stale green
    assert_eq!(last.get(3, 0), Some(LedColor::Green));

    engine.shutdown().await;
}

#[tokio::test]
async fn unknown_topic_changes_nothing() {
    let (panel, _recorded) = RecordingPanel::new();
    let engine = Engine::start_with_clock(Box::new(panel), config(), at_hour(22)).unwrap();

    let before: Vec<u16> = {
        let zones = engine.zones();
        let table = zones.lock().unwrap();
        table.zones().map(|z| z.countdown()).collect()
    };
    assert!(!engine.motion_detected("diy/attic/motion"));
    let after: Vec<u16> = {
        let zones = engine.zones();
        let table = zones.lock().unwrap();
        table.zones().map(|z| z.countdown()).collect()
    };
    assert_eq!(before, after);
    assert_eq!(before.len(), default_zones().len());

    engine.shutdown().await;
}

#[tokio::test]
async fn night_shows_identity_when_selected() {
    let (panel, recorded) = RecordingPanel::new();
    let engine = Engine::start_with_clock(Box::new(panel), config(), at_hour(23)).unwrap();

    // let the first day/night evaluation dim the panel before choosing a mode
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!engine.lights_on());
    engine.set_mode(DisplayMode::Identity).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    engine.shutdown().await;

    let panel = recorded.lock().unwrap();
    let shown: Vec<&str> = panel.numerals.iter().map(String::as_str).collect();
    assert!(shown.windows(4).any(|w| w == ["192", "168", "4", "2"]));
    assert_eq!(shown.last(), Some(&""));
}
