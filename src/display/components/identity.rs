/*
 *  display/components/identity.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Identity mode - host address, one segment per tick
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

use std::fmt::Write;
use std::net::IpAddr;

use arrayvec::ArrayString;

use crate::display::error::DisplayError;
use crate::display::traits::DisplayDriver;

/// One address segment, at most four numerals
pub type Segment = ArrayString<4>;

const SEGMENTS: usize = 4;

#[derive(Debug, Clone)]
pub struct IdentityMode {
    segments: [Segment; SEGMENTS],
    next: usize,
}

impl IdentityMode {
    pub fn new(segments: [Segment; SEGMENTS]) -> Self {
        Self { segments, next: 0 }
    }

    /// IPv4 gives its four octets in decimal, IPv6 its last four hextets in hex
    pub fn from_ip(addr: IpAddr) -> Self {
        let mut segments = [Segment::new(); SEGMENTS];
        match addr {
            IpAddr::V4(v4) => {
                for (seg, octet) in segments.iter_mut().zip(v4.octets()) {
                    // u8 is at most three digits, cannot overflow
                    let _ = write!(seg, "{}", octet);
                }
            }
            IpAddr::V6(v6) => {
                for (seg, hextet) in segments.iter_mut().zip(&v6.segments()[4..]) {
                    let _ = write!(seg, "{:x}", hextet);
                }
            }
        }
        Self::new(segments)
    }

    pub fn segments(&self) -> &[Segment; SEGMENTS] {
        &self.segments
    }

    /// Segment the next tick will show
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn render(&mut self, display: &mut dyn DisplayDriver) -> Result<(), DisplayError> {
        let segment = self.segments[self.next];
        self.next = (self.next + 1) % SEGMENTS;

        display.clear()?;
        display.print_numeral_string(&segment)?;
        display.write_display()
    }
}

impl Default for IdentityMode {
    fn default() -> Self {
        Self::from_ip(IpAddr::from([127, 0, 0, 1]))
    }
}
