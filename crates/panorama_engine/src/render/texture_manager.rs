//! Texture cache
//!
//! Textures are looked up by name relative to the asset base path and cached,
//! so asking twice for the same name yields the same [`TextureId`]. A name that
//! ends in a path separator, or names a directory, loads a cubemap from six
//! face images inside it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use slotmap::{new_key_type, SlotMap};

use crate::assets::{AssetError, AssetSource, ImageData};
use crate::render::device::{GpuTextureHandle, GraphicsDevice, RenderError, RenderResult, TextureTarget, TextureUpload};

new_key_type! {
    /// Stable handle to a cached texture; survives [`TextureManager::reload`]
    pub struct TextureId;
}

/// Face file sets tried in order; the first set whose first face exists wins.
/// Faces are in +X, -X, +Y, -Y, +Z, -Z order.
const CUBEMAP_FACE_SETS: [[&str; 6]; 4] = [
    ["right.png", "left.png", "top.png", "bottom.png", "front.png", "back.png"],
    ["right.jpg", "left.jpg", "top.jpg", "bottom.jpg", "front.jpg", "back.jpg"],
    [
        "panorama_0.png",
        "panorama_1.png",
        "panorama_2.png",
        "panorama_3.png",
        "panorama_4.png",
        "panorama_5.png",
    ],
    [
        "panorama_0.jpg",
        "panorama_1.jpg",
        "panorama_2.jpg",
        "panorama_3.jpg",
        "panorama_4.jpg",
        "panorama_5.jpg",
    ],
];

/// A cached texture
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    path: PathBuf,
    target: TextureTarget,
    handle: GpuTextureHandle,
    size: (u32, u32),
}

impl Texture {
    /// Name it was requested under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved file or directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 2D texture or cubemap
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Current device texture (changes on reload)
    pub fn handle(&self) -> GpuTextureHandle {
        self.handle
    }

    /// Width and height of the first face
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// Name-keyed texture cache
#[derive(Debug)]
pub struct TextureManager {
    base_path: PathBuf,
    textures: SlotMap<TextureId, Texture>,
    by_name: HashMap<String, TextureId>,
}

impl TextureManager {
    /// Create an empty cache resolving names against `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            textures: SlotMap::with_key(),
            by_name: HashMap::new(),
        }
    }

    /// Get a texture, loading it on first use
    pub fn get(&mut self, device: &mut dyn GraphicsDevice, assets: &dyn AssetSource, name: &str) -> RenderResult<TextureId> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }

        let path = self.base_path.join(name);
        let target = if is_cubemap_name(name) || assets.is_dir(&path) {
            TextureTarget::CubeMap
        } else {
            TextureTarget::Texture2D
        };

        let (handle, size) = upload(device, assets, &path, target)?;
        let id = self.textures.insert(Texture {
            name: name.to_string(),
            path,
            target,
            handle,
            size,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Look up a cached texture
    pub fn texture(&self, id: TextureId) -> RenderResult<&Texture> {
        self.textures.get(id).ok_or_else(|| RenderError::InvalidHandle {
            kind: "texture",
            id: format!("{id:?}"),
        })
    }

    /// Re-decode every texture and swap the device objects in place
    ///
    /// Ids stay valid. A texture that fails to reload keeps its previous
    /// device object; the first failure is returned after all were tried.
    pub fn reload(&mut self, device: &mut dyn GraphicsDevice, assets: &dyn AssetSource) -> RenderResult<()> {
        log::info!("Reloading {} textures", self.textures.len());
        let mut first_error = None;

        for texture in self.textures.values_mut() {
            match upload(device, assets, &texture.path, texture.target) {
                Ok((handle, size)) => {
                    device.delete_texture(texture.handle);
                    texture.handle = handle;
                    texture.size = size;
                }
                Err(e) => {
                    log::error!("Failed to reload texture {}: {}", texture.name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Delete every device texture and forget the cache
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        for texture in self.textures.values() {
            device.delete_texture(texture.handle);
        }
        self.textures.clear();
        self.by_name.clear();
    }

    /// Number of cached textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn is_cubemap_name(name: &str) -> bool {
    name.ends_with('/') || name.ends_with(std::path::MAIN_SEPARATOR)
}

fn upload(
    device: &mut dyn GraphicsDevice,
    assets: &dyn AssetSource,
    path: &Path,
    target: TextureTarget,
) -> RenderResult<(GpuTextureHandle, (u32, u32))> {
    match target {
        TextureTarget::Texture2D => {
            log::info!("Loading texture {}", path.display());
            let image = assets.load_image(path)?;
            let format = image.pixel_format(path)?;
            let handle = device.create_texture(target, &[TextureUpload { image: &image, format }])?;
            log::info!("Loaded texture {}", path.display());
            Ok((handle, (image.width, image.height)))
        }
        TextureTarget::CubeMap => {
            log::info!("Loading cubemap {}", path.display());
            let faces = load_cubemap_faces(assets, path)?;
            let uploads = faces
                .iter()
                .map(|(face_path, image)| {
                    image
                        .pixel_format(face_path)
                        .map(|format| TextureUpload { image, format })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let handle = device.create_texture(target, &uploads)?;
            let size = faces.first().map_or((0, 0), |(_, image)| (image.width, image.height));
            log::info!("Loaded cubemap {}", path.display());
            Ok((handle, size))
        }
    }
}

/// Find the first complete-looking face set in `dir` and decode it
fn load_cubemap_faces(assets: &dyn AssetSource, dir: &Path) -> Result<Vec<(PathBuf, ImageData)>, AssetError> {
    let set = CUBEMAP_FACE_SETS
        .iter()
        .find(|set| assets.exists(&dir.join(set[0])))
        .ok_or_else(|| AssetError::NotFound(format!("no cubemap faces in {}", dir.display())))?;

    set.iter()
        .map(|face| {
            let face_path = dir.join(face);
            let image = assets.load_image(&face_path)?;
            Ok((face_path, image))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetSource;
    use crate::render::recording::{DrawCommand, RecordingDevice};

    fn face(channels: u8) -> ImageData {
        let mut image = ImageData::solid_color(2, 2, [1, 2, 3, 255]);
        if channels == 3 {
            image.data = image.data.chunks(4).flat_map(|p| p[..3].to_vec()).collect();
        }
        image.channels = channels;
        image
    }

    fn insert_faces(assets: &MemoryAssetSource, dir: &str, names: &[&str; 6]) {
        for name in names {
            assets.insert_image(format!("{dir}/{name}"), face(3));
        }
    }

    #[test]
    fn test_same_name_returns_same_id() {
        let mut device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        assets.insert_image("wall.png", face(4));

        let mut textures = TextureManager::new("");
        let a = textures.get(&mut device, &assets, "wall.png").unwrap();
        let b = textures.get(&mut device, &assets, "wall.png").unwrap();
        assert_eq!(a, b);
        assert_eq!(device.live_textures(), 1);
    }

    #[test]
    fn test_cubemap_prefers_named_png_faces() {
        let mut device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        insert_faces(&assets, "sky", &CUBEMAP_FACE_SETS[2]);
        insert_faces(&assets, "sky", &CUBEMAP_FACE_SETS[0]);

        let mut textures = TextureManager::new("");
        let id = textures.get(&mut device, &assets, "sky/").unwrap();
        assert_eq!(textures.texture(id).unwrap().target(), TextureTarget::CubeMap);
        assert!(device.commands().iter().any(|c| matches!(
            c,
            DrawCommand::CreateTexture { target: TextureTarget::CubeMap, faces: 6, .. }
        )));
    }

    #[test]
    fn test_cubemap_falls_back_to_panorama_jpg() {
        let mut device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        insert_faces(&assets, "pano", &CUBEMAP_FACE_SETS[3]);

        let mut textures = TextureManager::new("");
        // Directory detection without a trailing separator
        let id = textures.get(&mut device, &assets, "pano").unwrap();
        assert_eq!(textures.texture(id).unwrap().target(), TextureTarget::CubeMap);
    }

    #[test]
    fn test_cubemap_without_faces_is_not_found() {
        let mut device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        assets.insert_text("empty/readme.txt", "nothing here");

        let mut textures = TextureManager::new("");
        let err = textures.get(&mut device, &assets, "empty/").unwrap_err();
        assert!(matches!(err, RenderError::Asset(AssetError::NotFound(_))));
        assert!(textures.is_empty());
    }

    #[test]
    fn test_greyscale_face_is_unsupported() {
        let mut device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        insert_faces(&assets, "sky", &CUBEMAP_FACE_SETS[0]);
        assets.insert_image("sky/top.png", face(1));

        let mut textures = TextureManager::new("");
        let err = textures.get(&mut device, &assets, "sky/").unwrap_err();
        assert!(matches!(err, RenderError::Asset(AssetError::UnsupportedFormat { .. })));
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_reload_keeps_id_and_swaps_handle() {
        let mut device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        assets.insert_image("wall.png", face(4));

        let mut textures = TextureManager::new("");
        let id = textures.get(&mut device, &assets, "wall.png").unwrap();
        let before = textures.texture(id).unwrap().handle();

        textures.reload(&mut device, &assets).unwrap();
        let after = textures.texture(id).unwrap().handle();
        assert_ne!(before, after);
        assert_eq!(device.live_textures(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_texture() {
        let mut device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        assets.insert_image("wall.png", face(4));

        let mut textures = TextureManager::new("");
        let id = textures.get(&mut device, &assets, "wall.png").unwrap();
        let before = textures.texture(id).unwrap().handle();

        assets.remove("wall.png");
        assert!(textures.reload(&mut device, &assets).is_err());
        assert_eq!(textures.texture(id).unwrap().handle(), before);
    }
}
