//! Lazy texture loading keyed by asset file name.

use std::collections::HashMap;
use std::path::Path;

use macroquad::texture::Texture2D;
use tracing::warn;

/// Loads each referenced image at most once; misses are remembered so a
/// missing file warns a single time instead of every frame.
#[derive(Default)]
pub struct TextureCache {
    entries: HashMap<String, Option<Texture2D>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, assets_dir: &Path, name: &str) -> Option<&Texture2D> {
        if !self.entries.contains_key(name) {
            let loaded = Self::load(assets_dir, name);
            self.entries.insert(name.to_string(), loaded);
        }
        self.entries.get(name).and_then(|t| t.as_ref())
    }

    fn load(assets_dir: &Path, name: &str) -> Option<Texture2D> {
        let path = assets_dir.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => Some(Texture2D::from_file_with_format(&bytes, None)),
            Err(e) => {
                warn!("failed to load image {}: {}", path.display(), e);
                None
            }
        }
    }
}
