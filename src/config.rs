use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use log::warn;
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::components::{HourFormat, MAXIMUM_COUNT};
use crate::display::{DisplayKind, DisplayMode, MAX_BRIGHTNESS};
use crate::gpio::Pull;
use crate::zones::{Footprint, ZoneSpec, DEFAULT_MAX_COUNTDOWN};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

pub const DEFAULT_DAY_HOUR: u8 = 6;
pub const DEFAULT_NIGHT_HOUR: u8 = 21;
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_DAYNIGHT_MS: u64 = 60_000;
pub const DEFAULT_BRIGHT: u8 = 12;
pub const DEFAULT_DIM: u8 = 0;
const DEFAULT_INITIAL_COUNTDOWN: u16 = 10;

/// Top-level app configuration.
///
/// Every field is optional so a YAML file only has to name what it changes;
/// the accessors below supply the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// General options
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// day/night band, hours after day_hour and before night_hour are day
    pub day_hour: Option<u8>,
    pub night_hour: Option<u8>,
    /// loop cadences
    pub tick_period_ms: Option<u64>,
    pub decay_period_ms: Option<u64>,
    pub daynight_period_ms: Option<u64>,
    /// brightness used by the day/night controller
    pub bright_level: Option<u8>,
    pub dim_level: Option<u8>,
    pub day_mode: Option<DisplayMode>,
    pub night_mode: Option<DisplayMode>,
    pub initial_mode: Option<DisplayMode>,
    /// clock options
    pub hour_format: Option<HourFormat>,
    pub alarm: Option<bool>,
    pub countdown_max: Option<u32>,
    /// address for the identity mode, host address when absent
    pub identity: Option<String>,
    /// PIR input
    pub motion: Option<MotionConfig>,
    /// zone registry, replaced wholesale when given
    pub zones: Option<Vec<ZoneSpec>>,
    /// display-specific geometry & behavior
    pub display: Option<DisplayConfig>,
}

/// PIR wiring: rising edges on `pin` refresh `zone`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotionConfig {
    pub pin: u8,
    #[serde(default)]
    pub pull: Pull,
    pub zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub brightness: Option<u8>,     // 0-15
    pub driver: Option<DriverKind>, // <- strongly-typed driver selection
    pub bus: Option<BusConfig>,     // <- i2c wiring
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    I2c {
        bus: String,        // e.g. "/dev/i2c-1"
        address: u8,        // e.g. 0x70 (I2C addresses are 7-bit, stored in u8)
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Console,
    Ht16k33Matrix,
    Ht16k33Segment,
}

/// The house layout: topic id and (row, column) origin of each area
const HOUSE_ZONES: [(&str, Footprint); 8] = [
    ("diy/perimeter/front/motion", Footprint::new(0, 3, 1, 2)),
    ("diy/main/hallway/motion", Footprint::new(2, 3, 1, 2)),
    ("diy/main/dining/motion", Footprint::new(3, 0, 2, 2)),
    ("diy/main/garage/motion", Footprint::new(0, 6, 2, 2)),
    ("diy/main/living/motion", Footprint::new(3, 6, 2, 2)),
    ("diy/upper/guest/motion", Footprint::new(6, 0, 2, 2)),
    ("diy/upper/study/motion", Footprint::new(6, 6, 2, 2)),
    ("diy/upper/stairs/motion", Footprint::new(5, 3, 1, 2)),
];

pub fn default_zones() -> Vec<ZoneSpec> {
    HOUSE_ZONES
        .iter()
        .map(|(id, footprint)| {
            ZoneSpec::new(*id, *footprint, DEFAULT_MAX_COUNTDOWN).with_initial(DEFAULT_INITIAL_COUNTDOWN)
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            day_hour: Some(DEFAULT_DAY_HOUR),
            night_hour: Some(DEFAULT_NIGHT_HOUR),
            tick_period_ms: Some(DEFAULT_TICK_MS),
            decay_period_ms: Some(DEFAULT_TICK_MS),
            daynight_period_ms: Some(DEFAULT_DAYNIGHT_MS),
            bright_level: Some(DEFAULT_BRIGHT),
            dim_level: Some(DEFAULT_DIM),
            day_mode: Some(DisplayMode::Occupancy),
            night_mode: Some(DisplayMode::Clock),
            initial_mode: Some(DisplayMode::Clock),
            hour_format: Some(HourFormat::Twelve),
            alarm: Some(false),
            countdown_max: Some(MAXIMUM_COUNT),
            identity: None,
            motion: None,
            zones: Some(default_zones()),
            display: Some(DisplayConfig {
                width: Some(8),
                height: Some(8),
                brightness: Some(DEFAULT_BRIGHT),
                driver: Some(DriverKind::Console),
                bus: None,
            }),
        }
    }
}

fn clamp_level(what: &str, level: u8) -> u8 {
    if level > MAX_BRIGHTNESS {
        warn!("{} {} above {}, clamped", what, level, MAX_BRIGHTNESS);
        MAX_BRIGHTNESS
    } else {
        level
    }
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn day_hour(&self) -> u8 {
        self.day_hour.unwrap_or(DEFAULT_DAY_HOUR)
    }

    pub fn night_hour(&self) -> u8 {
        self.night_hour.unwrap_or(DEFAULT_NIGHT_HOUR)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.unwrap_or(DEFAULT_TICK_MS))
    }

    pub fn decay_period(&self) -> Duration {
        Duration::from_millis(self.decay_period_ms.unwrap_or(DEFAULT_TICK_MS))
    }

    pub fn daynight_period(&self) -> Duration {
        Duration::from_millis(self.daynight_period_ms.unwrap_or(DEFAULT_DAYNIGHT_MS))
    }

    pub fn bright_level(&self) -> u8 {
        clamp_level("bright_level", self.bright_level.unwrap_or(DEFAULT_BRIGHT))
    }

    pub fn dim_level(&self) -> u8 {
        clamp_level("dim_level", self.dim_level.unwrap_or(DEFAULT_DIM))
    }

    /// Modes are fitted to the configured panel, see [`DisplayMode::fit_to`]
    pub fn day_mode(&self) -> DisplayMode {
        self.fit_mode("day_mode", self.day_mode.unwrap_or(DisplayMode::Occupancy))
    }

    pub fn night_mode(&self) -> DisplayMode {
        self.fit_mode("night_mode", self.night_mode.unwrap_or(DisplayMode::Clock))
    }

    pub fn initial_mode(&self) -> DisplayMode {
        self.fit_mode("initial_mode", self.initial_mode.unwrap_or_default())
    }

    fn fit_mode(&self, what: &str, mode: DisplayMode) -> DisplayMode {
        let kind = self.display_config().driver().display_kind();
        let fitted = mode.fit_to(kind);
        if fitted != mode {
            warn!("{} {:?} cannot be drawn on a {:?} panel, using {:?}", what, mode, kind, fitted);
        }
        fitted
    }

    pub fn hour_format(&self) -> HourFormat {
        self.hour_format.unwrap_or_default()
    }

    pub fn alarm(&self) -> bool {
        self.alarm.unwrap_or(false)
    }

    pub fn countdown_max(&self) -> u32 {
        let max = self.countdown_max.unwrap_or(MAXIMUM_COUNT);
        if max > MAXIMUM_COUNT {
            warn!("countdown_max {} above {}, clamped", max, MAXIMUM_COUNT);
            MAXIMUM_COUNT
        } else {
            max
        }
    }

    /// Parsed identity override, None when absent
    pub fn identity(&self) -> Result<Option<IpAddr>, ConfigError> {
        self.identity
            .as_deref()
            .map(|s| s.parse().map_err(|_| ConfigError::Validation(format!("identity '{}' is not an IP address", s))))
            .transpose()
    }

    pub fn zones(&self) -> Vec<ZoneSpec> {
        self.zones.clone().unwrap_or_else(default_zones)
    }

    pub fn display_config(&self) -> DisplayConfig {
        self.display.clone().unwrap_or_default()
    }

    pub fn display_brightness(&self) -> u8 {
        let level = self.display.as_ref().and_then(|d| d.brightness).unwrap_or(DEFAULT_BRIGHT);
        clamp_level("display brightness", level)
    }
}

impl DriverKind {
    pub fn display_kind(self) -> DisplayKind {
        match self {
            DriverKind::Console => DisplayKind::Virtual,
            DriverKind::Ht16k33Matrix => DisplayKind::Matrix,
            DriverKind::Ht16k33Segment => DisplayKind::SevenSegment,
        }
    }
}

impl DisplayConfig {
    pub fn driver(&self) -> DriverKind {
        self.driver.unwrap_or(DriverKind::Console)
    }

    /// Panel size; the HT16K33 backpacks have fixed geometry
    pub fn geometry(&self) -> (u32, u32) {
        match self.driver() {
            DriverKind::Ht16k33Matrix => (8, 8),
            DriverKind::Ht16k33Segment => (4, 1),
            DriverKind::Console => (self.width.unwrap_or(8), self.height.unwrap_or(8)),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "ledmux", about = "LED panel occupancy and clock multiplexer", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// debug logging
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub day_hour: Option<u8>,
    #[arg(long)]
    pub night_hour: Option<u8>,
    #[arg(long)]
    pub tick_period_ms: Option<u64>,
    /// clock | identity | countdown | occupancy
    #[arg(long, value_parser = parse_mode)]
    pub initial_mode: Option<DisplayMode>,
    /// 24 hour clock
    #[arg(long, action = ArgAction::SetTrue)]
    pub twenty_four: bool,
    #[arg(long, action = ArgAction::Set)]
    pub alarm: Option<bool>,
    /// address shown in identity mode
    #[arg(long)]
    pub identity: Option<String>,
    #[arg(long)]
    pub display_brightness: Option<u8>,
    /// read motion topics, one per line, from stdin
    #[arg(long, action = ArgAction::SetTrue)]
    pub topics_stdin: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

fn parse_mode(s: &str) -> Result<DisplayMode, String> {
    serde_yaml::from_str(s).map_err(|_| format!("unknown mode '{s}'"))
}

/// Public entry point: parse CLI, read YAML, merge, validate.
///
/// The parsed CLI is handed back for the runtime-only flags.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = resolve(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok((cfg, cli))
}

/// Defaults, then YAML, then CLI, then validation
pub fn resolve(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Fit modes to the panel, then validate
    fit_modes(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/ledmux/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/ledmux/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/ledmux.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["ledmux.yaml", "config.yaml", "config/ledmux.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

/// Missing fields stay None so `merge` leaves the defaults alone
pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
pub fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()          { dst.log_level = src.log_level; }
    if src.day_hour.is_some()           { dst.day_hour = src.day_hour; }
    if src.night_hour.is_some()         { dst.night_hour = src.night_hour; }
    if src.tick_period_ms.is_some()     { dst.tick_period_ms = src.tick_period_ms; }
    if src.decay_period_ms.is_some()    { dst.decay_period_ms = src.decay_period_ms; }
    if src.daynight_period_ms.is_some() { dst.daynight_period_ms = src.daynight_period_ms; }
    if src.bright_level.is_some()       { dst.bright_level = src.bright_level; }
    if src.dim_level.is_some()          { dst.dim_level = src.dim_level; }
    if src.day_mode.is_some()           { dst.day_mode = src.day_mode; }
    if src.night_mode.is_some()         { dst.night_mode = src.night_mode; }
    if src.initial_mode.is_some()       { dst.initial_mode = src.initial_mode; }
    if src.hour_format.is_some()        { dst.hour_format = src.hour_format; }
    if src.alarm.is_some()              { dst.alarm = src.alarm; }
    if src.countdown_max.is_some()      { dst.countdown_max = src.countdown_max; }
    if src.identity.is_some()           { dst.identity = src.identity; }
    if src.motion.is_some()             { dst.motion = src.motion; }
    if src.zones.is_some()              { dst.zones = src.zones; }
    // display
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()       { dst.width = src.width; }
    if src.height.is_some()      { dst.height = src.height; }
    if src.brightness.is_some()  { dst.brightness = src.brightness; }
    if src.driver.is_some()      { dst.driver = src.driver; }
    if src.bus.is_some()         { dst.bus = src.bus; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                     { cfg.log_level = Some("debug".into()); }
    if cli.day_hour.is_some()        { cfg.day_hour = cli.day_hour; }
    if cli.night_hour.is_some()      { cfg.night_hour = cli.night_hour; }
    if cli.tick_period_ms.is_some()  { cfg.tick_period_ms = cli.tick_period_ms; }
    if cli.initial_mode.is_some()    { cfg.initial_mode = cli.initial_mode; }
    if cli.twenty_four               { cfg.hour_format = Some(HourFormat::TwentyFour); }
    if cli.alarm.is_some()           { cfg.alarm = cli.alarm; }
    if cli.identity.is_some()        { cfg.identity = cli.identity.clone(); }

    if cli.display_brightness.is_some() {
        cfg.display.get_or_insert_with(DisplayConfig::default).brightness = cli.display_brightness;
    }
}

/// Replace modes the selected driver cannot draw
pub fn fit_modes(cfg: &mut Config) {
    cfg.day_mode = Some(cfg.day_mode());
    cfg.night_mode = Some(cfg.night_mode());
    cfg.initial_mode = Some(cfg.initial_mode());
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let (day, night) = (cfg.day_hour(), cfg.night_hour());
    if night > 23 {
        return Err(ConfigError::Validation(format!("night_hour {night} must be 0..=23")));
    }
    if day >= night {
        return Err(ConfigError::Validation(format!("day_hour {day} must be before night_hour {night}")));
    }

    for (name, period) in [
        ("tick_period_ms", cfg.tick_period_ms),
        ("decay_period_ms", cfg.decay_period_ms),
        ("daynight_period_ms", cfg.daynight_period_ms),
    ] {
        if period == Some(0) {
            return Err(ConfigError::Validation(format!("{name} must be > 0")));
        }
    }

    cfg.identity()?;

    let display = cfg.display_config();
    let (w, h) = display.geometry();
    if w == 0 || h == 0 {
        return Err(ConfigError::Validation("display width/height must be > 0".into()));
    }
    if display.driver() != DriverKind::Console && display.bus.is_none() {
        return Err(ConfigError::Validation(format!("display driver {:?} needs a bus", display.driver())));
    }

    let zones = cfg.zones();
    let mut seen = HashSet::new();
    for zone in &zones {
        if zone.id.is_empty() {
            return Err(ConfigError::Validation("zone id must not be empty".into()));
        }
        if !seen.insert(zone.id.as_str()) {
            return Err(ConfigError::Validation(format!("duplicate zone id '{}'", zone.id)));
        }
        if zone.footprint.is_empty() {
            return Err(ConfigError::Validation(format!("zone '{}' has an empty footprint", zone.id)));
        }
        // occupancy only draws on pixel panels, segment geometry is not checked
        if display.driver() != DriverKind::Ht16k33Segment && !zone.footprint.fits(w, h) {
            return Err(ConfigError::Validation(format!(
                "zone '{}' footprint {:?} outside {}x{} display",
                zone.id, zone.footprint, w, h
            )));
        }
        if zone.max_countdown == 0 {
            return Err(ConfigError::Validation(format!("zone '{}' max_countdown must be > 0", zone.id)));
        }
        if zone.initial_countdown > zone.max_countdown {
            return Err(ConfigError::Validation(format!(
                "zone '{}' initial_countdown {} above max_countdown {}",
                zone.id, zone.initial_countdown, zone.max_countdown
            )));
        }
    }

    if let Some(motion) = cfg.motion.as_ref() {
        if !seen.contains(motion.zone.as_str()) {
            warn!("motion zone '{}' is not a configured zone", motion.zone);
        }
    }
    Ok(())
}
