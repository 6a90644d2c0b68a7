//! Device seam used by render graphs to create and retire transient resources.

use crate::texture::{Extent2D, ImageView, TextureDesc};
use zenith_core::collections::hashmap::HashMap;
use zenith_core::log;

/// The subset of a GPU device a render graph talks to.
///
/// Concrete backends own memory allocation; the graph only asks for textures sized
/// against the current swapchain and hands them back when a frame retires.
pub trait RenderDevice {
    fn swapchain_extent(&self) -> Extent2D;

    fn create_texture(&mut self, desc: &TextureDesc) -> anyhow::Result<ImageView>;

    fn release_texture(&mut self, view: ImageView);
}

/// A device without a GPU behind it.
///
/// Hands out monotonically increasing handles and keeps track of live textures, which makes
/// it suitable for tools and tests that only need the graph's decisions.
pub struct HeadlessDevice {
    extent: Extent2D,
    next_handle: u64,
    live_textures: HashMap<u64, TextureDesc>,
}

impl HeadlessDevice {
    pub fn new(extent: Extent2D) -> Self {
        Self {
            extent,
            next_handle: 1,
            live_textures: HashMap::default(),
        }
    }

    pub fn resize(&mut self, extent: Extent2D) {
        log::debug!("Headless swapchain resized to {}x{}", extent.width, extent.height);
        self.extent = extent;
    }

    #[inline]
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    pub fn texture_desc(&self, view: &ImageView) -> Option<&TextureDesc> {
        self.live_textures.get(&view.handle)
    }
}

impl RenderDevice for HeadlessDevice {
    #[inline]
    fn swapchain_extent(&self) -> Extent2D {
        self.extent
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> anyhow::Result<ImageView> {
        if desc.extent.width == 0 || desc.extent.height == 0 || desc.extent.depth == 0 {
            anyhow::bail!("Texture [{}] has an empty extent {:?}", desc.name, desc.extent);
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        self.live_textures.insert(handle, desc.clone());

        Ok(ImageView::new(handle, desc.format, desc.extent))
    }

    fn release_texture(&mut self, view: ImageView) {
        if self.live_textures.remove(&view.handle).is_none() {
            log::warn!("Try to release unknown texture handle {}!", view.handle);
        }
    }
}
