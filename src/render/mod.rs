//! Draw-side helpers: texture cache, content draw calls, overlay compositing.
//!
//! Display binding is outside the orchestration core: overlay and content
//! state is kept per configured display, and this module composites the
//! primary display into the window. Nothing here is touched by tests.

mod textures;

pub use textures::TextureCache;

use macroquad::prelude::{BLACK, Color, WHITE, draw_rectangle, draw_text, draw_texture_ex};

use crate::config::{ExhibitSettings, ImageSetting, TextSetting};
use crate::fade::FadeCoordinator;

/// Everything a stage may use while drawing one frame.
pub struct StageView<'a> {
    pub settings: &'a ExhibitSettings,
    pub cache: &'a mut TextureCache,
    pub fade: &'a FadeCoordinator,
}

impl StageView<'_> {
    /// Draw an image at its configured placement with an extra alpha.
    pub fn draw_image_alpha(&mut self, image: &ImageSetting, alpha: f32) {
        if image.source_image.is_empty() || alpha <= 0.0 {
            return;
        }
        let tint = Color::new(
            image.color[0],
            image.color[1],
            image.color[2],
            image.color[3] * alpha.clamp(0.0, 1.0),
        );
        match self.cache.get(&self.settings.assets_dir, &image.source_image) {
            Some(texture) => {
                let params = macroquad::prelude::DrawTextureParams {
                    dest_size: Some(macroquad::prelude::vec2(image.width, image.height)),
                    ..Default::default()
                };
                draw_texture_ex(texture, image.position.x, image.position.y, tint, params);
            }
            None => {
                // Missing asset: keep the layout visible for the operator.
                draw_rectangle(
                    image.position.x,
                    image.position.y,
                    image.width.max(4.0),
                    image.height.max(4.0),
                    Color::new(0.2, 0.2, 0.2, tint.a),
                );
            }
        }
    }

    pub fn draw_image(&mut self, image: &ImageSetting) {
        self.draw_image_alpha(image, 1.0);
    }

    pub fn draw_text_alpha(&self, text: &TextSetting, alpha: f32) {
        if text.text.is_empty() || alpha <= 0.0 {
            return;
        }
        let color = Color::new(
            text.color[0],
            text.color[1],
            text.color[2],
            text.color[3] * alpha.clamp(0.0, 1.0),
        );
        draw_text(
            &text.text,
            text.position.x,
            text.position.y,
            text.font_size,
            color,
        );
    }

    pub fn draw_text_setting(&self, text: &TextSetting) {
        self.draw_text_alpha(text, 1.0);
    }

    pub fn draw_plain_text(&self, text: &str, x: f32, y: f32, size: f32, alpha: f32) {
        draw_text(text, x, y, size, Color::new(1.0, 1.0, 1.0, alpha));
    }
}

/// Composite the primary display's fade overlay over the whole window.
pub fn draw_primary_overlay(fade: &FadeCoordinator) {
    let alpha = fade.alpha(0);
    if alpha <= 0.0 {
        return;
    }
    let w = macroquad::prelude::screen_width();
    let h = macroquad::prelude::screen_height();
    draw_rectangle(0.0, 0.0, w, h, Color::new(0.0, 0.0, 0.0, alpha));
}

/// Clear the frame to the exhibit's background.
pub fn clear_frame() {
    macroquad::prelude::clear_background(BLACK);
}

/// Small operator hint in the corner (connection state etc.).
pub fn draw_status_line(text: &str) {
    draw_text(text, 10.0, macroquad::prelude::screen_height() - 12.0, 16.0, WHITE);
}
