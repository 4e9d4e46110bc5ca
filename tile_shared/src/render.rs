//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend. A
//! [`Surface`] is the 2D canvas a frame is composed onto; backends implement
//! it, and the headless implementations here serve tests and tooling.

use crate::resources::ImageRegion;

/// A 2D drawing surface measured in pixels.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    /// Draws `region` scaled into the destination rectangle.
    fn draw_image(
        &mut self,
        region: &ImageRegion,
        dx: i32,
        dy: i32,
        dw: u32,
        dh: u32,
    ) -> anyhow::Result<()>;
    /// Draws text horizontally centered on `x` with its baseline at `y`.
    fn fill_text(&mut self, text: &str, x: i32, y: i32) -> anyhow::Result<()>;
}

/// A recorded draw operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Clear,
    Image {
        image: String,
        sx: u32,
        sy: u32,
        dx: i32,
        dy: i32,
        dw: u32,
        dh: u32,
    },
    Text {
        text: String,
        x: i32,
        y: i32,
    },
}

/// Records draw calls instead of rasterizing.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    /// Image draws in order, by image name.
    pub fn images(&self) -> impl Iterator<Item = (&str, i32, i32)> {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Image { image, dx, dy, .. } => Some((image.as_str(), *dx, *dy)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear);
    }

    fn draw_image(
        &mut self,
        region: &ImageRegion,
        dx: i32,
        dy: i32,
        dw: u32,
        dh: u32,
    ) -> anyhow::Result<()> {
        if region.sx + region.sw > region.image.width || region.sy + region.sh > region.image.height
        {
            anyhow::bail!("source region outside image {}", region.image.name);
        }
        self.calls.push(DrawCall::Image {
            image: region.image.name.clone(),
            sx: region.sx,
            sy: region.sy,
            dx,
            dy,
            dw,
            dh,
        });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: i32, y: i32) -> anyhow::Result<()> {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
        });
        Ok(())
    }
}

/// A no-op surface useful for headless runs.
#[derive(Debug, Clone, Copy)]
pub struct NullSurface {
    pub width: u32,
    pub height: u32,
}

impl Surface for NullSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {}

    fn draw_image(&mut self, _: &ImageRegion, _: i32, _: i32, _: u32, _: u32) -> anyhow::Result<()> {
        Ok(())
    }

    fn fill_text(&mut self, _: &str, _: i32, _: i32) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resources::Image;

    #[test]
    fn recording_surface_rejects_out_of_bounds_region() {
        let image = Arc::new(Image::blank("tiles", 32, 32));
        let mut surface = RecordingSurface::new(100, 100);
        assert!(surface
            .draw_image(&ImageRegion::new(image.clone(), 16, 0, 16, 16), 0, 0, 16, 16)
            .is_ok());
        assert!(surface
            .draw_image(&ImageRegion::new(image, 24, 0, 16, 16), 0, 0, 16, 16)
            .is_err());
        assert_eq!(surface.images().count(), 1);
    }

    #[test]
    fn clear_resets_recording() {
        let mut surface = RecordingSurface::new(10, 10);
        surface.fill_text("hi", 1, 2).unwrap();
        surface.clear();
        assert_eq!(surface.calls, vec![DrawCall::Clear]);
    }
}
