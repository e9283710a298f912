/*
 *  zones.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-zone occupancy countdowns and their recency tiers
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Countdowns strictly above this are Fresh
pub const FRESH_ABOVE: u16 = 50;

/// Countdowns strictly above this (and not Fresh) are Recent
pub const RECENT_ABOVE: u16 = 30;

/// Value a zone is reset to on motion unless configured otherwise
pub const DEFAULT_MAX_COUNTDOWN: u16 = 60;

/// Decay table shared between the topic feed, the decay tick and the renderer
pub type SharedZones = Arc<Mutex<ZoneDecayTable>>;

/// Fixed rectangle of cells a zone occupies on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn rect(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x as i32, self.y as i32),
            Size::new(self.width, self.height),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the footprint lies entirely inside a `width` x `height` panel
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x + self.width <= width && self.y + self.height <= height
    }
}

fn default_max_countdown() -> u16 {
    DEFAULT_MAX_COUNTDOWN
}

/// Static description of a zone, as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Topic-like key, e.g. "diy/main/hallway/motion"
    pub id: String,
    pub footprint: Footprint,
    #[serde(default = "default_max_countdown")]
    pub max_countdown: u16,
    #[serde(default)]
    pub initial_countdown: u16,
}

impl ZoneSpec {
    pub fn new(id: impl Into<String>, footprint: Footprint, max_countdown: u16) -> Self {
        Self { id: id.into(), footprint, max_countdown, initial_countdown: 0 }
    }

    pub fn with_initial(mut self, initial_countdown: u16) -> Self {
        self.initial_countdown = initial_countdown;
        self
    }
}

/// Recency bucket derived from a countdown
///
/// Ordered by recency: `Inactive < Stale < Recent < Fresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Inactive,
    Stale,
    Recent,
    Fresh,
}

impl Tier {
    pub fn from_countdown(countdown: u16) -> Self {
        if countdown > FRESH_ABOVE {
            Tier::Fresh
        } else if countdown > RECENT_ABOVE {
            Tier::Recent
        } else if countdown > 0 {
            Tier::Stale
        } else {
            Tier::Inactive
        }
    }
}

/// One tracked area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    id: String,
    footprint: Footprint,
    countdown: u16,
    max_countdown: u16,
    initial_countdown: u16,
}

impl Zone {
    fn from_spec(spec: ZoneSpec) -> Self {
        let max_countdown = spec.max_countdown.max(1);
        if max_countdown != spec.max_countdown {
            warn!("Zone {} max_countdown 0 raised to 1", spec.id);
        }
        let initial_countdown = spec.initial_countdown.min(max_countdown);
        Self {
            id: spec.id,
            footprint: spec.footprint,
            countdown: initial_countdown,
            max_countdown,
            initial_countdown,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn countdown(&self) -> u16 {
        self.countdown
    }

    pub fn max_countdown(&self) -> u16 {
        self.max_countdown
    }

    pub fn tier(&self) -> Tier {
        Tier::from_countdown(self.countdown)
    }
}

/// Fixed registry of zones keyed by id
///
/// Zones fade Fresh -> Recent -> Stale -> Inactive one tick at a time. The
/// tick cadence must be fine enough that a countdown never crosses two tier
/// boundaries between renders; nothing here enforces that.
#[derive(Debug, Clone, Default)]
pub struct ZoneDecayTable {
    zones: Vec<Zone>,
    index: HashMap<String, usize>,
}

impl ZoneDecayTable {
    /// Build the registry; a later duplicate id replaces the earlier entry
    pub fn new(specs: impl IntoIterator<Item = ZoneSpec>) -> Self {
        let mut zones: Vec<Zone> = Vec::new();
        let mut index = HashMap::new();
        for spec in specs {
            let zone = Zone::from_spec(spec);
            match index.get(&zone.id) {
                Some(&slot) => {
                    warn!("Duplicate zone id {}, keeping the last definition", zone.id);
                    zones[slot] = zone;
                }
                None => {
                    index.insert(zone.id.clone(), zones.len());
                    zones.push(zone);
                }
            }
        }
        Self { zones, index }
    }

    pub fn shared(self) -> SharedZones {
        Arc::new(Mutex::new(self))
    }

    /// Advance every countdown by one step, stopping at zero
    pub fn tick(&mut self) {
        for zone in &mut self.zones {
            zone.countdown = zone.countdown.saturating_sub(1);
        }
    }

    /// Reset the zone's countdown to its maximum; unknown ids are ignored
    ///
    /// Returns whether a zone matched.
    pub fn refresh(&mut self, id: &str) -> bool {
        match self.index.get(id) {
            Some(&slot) => {
                let zone = &mut self.zones[slot];
                zone.countdown = zone.max_countdown;
                debug!("Motion in {} (countdown {})", zone.id, zone.countdown);
                true
            }
            None => {
                debug!("Ignoring motion for unknown zone {}", id);
                false
            }
        }
    }

    /// Tier of `id`; unknown ids read as Inactive
    pub fn tier_of(&self, id: &str) -> Tier {
        self.get(id).map_or(Tier::Inactive, Zone::tier)
    }

    pub fn countdown(&self, id: &str) -> Option<u16> {
        self.get(id).map(Zone::countdown)
    }

    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.index.get(id).map(|&slot| &self.zones[slot])
    }

    /// Zones in registration order
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Number of zones showing any recent motion
    pub fn active_count(&self) -> usize {
        self.zones.iter().filter(|z| z.tier() != Tier::Inactive).count()
    }

    /// Put every zone back to its initial countdown
    pub fn reset(&mut self) {
        for zone in &mut self.zones {
            zone.countdown = zone.initial_countdown;
        }
    }
}
