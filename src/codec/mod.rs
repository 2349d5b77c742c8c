/// Image codec capability
///
/// The session never touches pixel formats directly; it only needs to
/// decode, measure, crop and encode. `raster` is the production
/// implementation on top of the `image` crate, tests plug in fakes.

pub mod raster;

use std::path::Path;

use crate::error::Result;
use crate::state::data::SourceRect;

pub use raster::{RasterCodec, RasterImage};

pub trait ImageCodec {
    /// Decoded pixel buffer
    type Image;

    /// Decode the file at `path`
    fn decode(&self, path: &Path) -> Result<Self::Image>;

    /// Native (width, height) in pixels
    fn dimensions(&self, image: &Self::Image) -> (u32, u32);

    /// Stretch to exactly `width` x `height` (no aspect preservation)
    fn resize(&self, image: &Self::Image, width: u32, height: u32) -> Self::Image;

    /// Copy out the pixels inside `rect`
    fn crop(&self, image: &Self::Image, rect: SourceRect) -> Self::Image;

    /// Write `image` to `path` in the format it was decoded from
    fn encode(&self, image: &Self::Image, path: &Path) -> Result<()>;
}
