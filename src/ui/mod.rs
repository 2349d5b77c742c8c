/// UI shell: the selection canvas, folder dialogs and preview handles

pub mod canvas;
pub mod picker;

use iced::widget::image::Handle;

use crate::codec::{ImageCodec, RasterCodec, RasterImage};

pub use canvas::SelectionCanvas;
pub use picker::{FolderPicker, NativeFolderPicker};

/// Stretch `image` to the display box and wrap it for rendering
pub fn preview_handle(codec: &RasterCodec, image: &RasterImage, width: u32, height: u32) -> Handle {
    let preview = codec.resize(image, width, height);
    let (w, h, pixels) = preview.to_rgba_pixels();
    Handle::from_rgba(w, h, pixels)
}
