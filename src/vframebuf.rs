/*
 *  vframebuf.rs
 *
 *  LedMux - ambient state, one panel at a time
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized framebuffer for embedded-graphics
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone, PartialEq)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access
    pub fn as_slice(&self) -> &[C] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    pub fn get(&self, x: u32, y: u32) -> Option<C> {
        self.idx(Point::new(x as i32, y as i32)).map(|i| self.buf[i])
    }

    /// Set one pixel; out-of-bounds writes are dropped
    pub fn set(&mut self, x: u32, y: u32, color: C) {
        if let Some(i) = self.idx(Point::new(x as i32, y as i32)) {
            self.buf[i] = color;
        }
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // colors arrive row-major over the whole area, clip per pixel
        let mut it = colors.into_iter();
        for p in area.points() {
            match it.next() {
                Some(c) => {
                    if let Some(i) = self.idx(p) {
                        self.buf[i] = c;
                    }
                }
                None => return Ok(()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::color::LedColor;
    use embedded_graphics::primitives::PrimitiveStyle;

    #[test]
    fn test_filled_rectangle_is_clipped() {
        let mut fb = VarFrameBuf::new(4, 4, LedColor::Off);
        Rectangle::new(Point::new(3, 3), Size::new(2, 2))
            .into_styled(PrimitiveStyle::with_fill(LedColor::Red))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(fb.get(3, 3), Some(LedColor::Red));
        assert_eq!(fb.as_slice().iter().filter(|&&c| c == LedColor::Red).count(), 1);
    }

    #[test]
    fn test_get_set_bounds() {
        let mut fb = VarFrameBuf::new(2, 2, LedColor::Off);
        fb.set(1, 1, LedColor::Green);
        fb.set(5, 5, LedColor::Green);
        assert_eq!(fb.get(1, 1), Some(LedColor::Green));
        assert_eq!(fb.get(2, 0), None);

        fb.clear_color(LedColor::Off);
        assert!(fb.as_slice().iter().all(|&c| c == LedColor::Off));
    }
}
