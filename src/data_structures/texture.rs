//! Textures: decoded images uploaded as 2D GPU textures, plus the depth
//! buffer the host renders into.

use std::path::Path;

use image::{ImageFormat, load_from_memory_with_format};

use crate::{
    error::Error,
    gpu::{GpuBackend, GpuResource, TextureId},
    render::{Command, Frame},
};

/// Standard depth buffer texture format (32-bit float).
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// RGBA8 pixels in bottom-up row order, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Decode raw image file contents.
    ///
    /// The image is flipped vertically so that the first row in `rgba` is the
    /// bottom of the picture, matching texture coordinates with v = 0 at the
    /// bottom edge.
    ///
    /// * `label` names the source in error messages
    /// * `format` is an optional file extension hint (e.g. "png"). If None, auto-detect.
    pub fn from_bytes(bytes: &[u8], label: &str, format: Option<&str>) -> Result<Self, Error> {
        let decode_error = |reason: String| Error::Decode {
            path: label.to_string(),
            reason,
        };
        let img = match format {
            None => image::load_from_memory(bytes),
            Some(fmt) => {
                let fmt = ImageFormat::from_extension(fmt)
                    .ok_or_else(|| decode_error(format!("unknown image format `{}`", fmt)))?;
                load_from_memory_with_format(bytes, fmt)
            }
        }
        .map_err(|e| decode_error(e.to_string()))?;

        let rgba = img.flipv().to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    /// Read the whole file and decode it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| Error::Decode {
            path: label.clone(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes, &label, None)
    }
}

/// Single-owner handle to a 2D RGBA texture.
#[derive(Debug)]
pub struct Texture {
    id: Option<TextureId>,
    width: u32,
    height: u32,
}

impl Texture {
    /// Decode the file at `path` and upload it.
    ///
    /// Nothing is allocated on the GPU if the file cannot be read or decoded.
    pub fn load(gpu: &mut dyn GpuBackend, path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let image = Self::decode(path)?;
        Ok(Self::upload(gpu, &image, &path.display().to_string()))
    }

    pub fn decode(path: impl AsRef<Path>) -> Result<DecodedImage, Error> {
        DecodedImage::open(path)
    }

    /// Decode in-memory image file contents and upload them.
    pub fn from_bytes(
        gpu: &mut dyn GpuBackend,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
    ) -> Result<Self, Error> {
        let image = DecodedImage::from_bytes(bytes, label, format)?;
        Ok(Self::upload(gpu, &image, label))
    }

    /// Upload as mip level 0. No mipmaps are generated.
    pub fn upload(gpu: &mut dyn GpuBackend, image: &DecodedImage, label: &str) -> Self {
        let id = gpu.create_texture(label, image.width, image.height, &image.rgba);
        log::debug!("uploaded texture {} ({}x{})", label, image.width, image.height);
        Self {
            id: Some(id),
            width: image.width,
            height: image.height,
        }
    }

    pub fn id(&self) -> Option<TextureId> {
        self.id
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Record a bind of this texture. Does nothing once released.
    pub fn use_texture(&self, frame: &mut Frame) {
        if let Some(id) = self.id {
            frame.push(Command::BindTexture(id));
        }
    }

    pub fn dispose(&mut self, gpu: &mut dyn GpuBackend) {
        self.release(gpu);
    }
}

impl GpuResource for Texture {
    fn release(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(id) = self.id.take() {
            gpu.delete_texture(id);
        }
    }

    fn is_released(&self) -> bool {
        self.id.is_none()
    }
}

/// Depth attachment recreated whenever the surface is resized.
#[derive(Debug)]
pub struct DepthTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTexture {
    /// `size` is [width, height] in pixels; zero sizes are clamped to 1.
    pub fn new(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}
