use std::path::{Path, PathBuf};

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::error::{LyrividError, LyrividResult};
use crate::style::config::FontFamily;

/// RGBA8 brush color carried through Parley layouts.
///
/// The rasterizer sets paints per pass (stroke offsets, sweep gradient), so
/// the brush itself stays at its default; the type parameter is what Parley
/// needs to build a layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Assets loaded once per session: the artwork (background and album art
/// share one source image), the configured font, and the audio reference
/// handed through to the encoder.
#[derive(Clone, Debug)]
pub struct SongAssets {
    /// Decoded artwork in premultiplied RGBA8.
    pub artwork: PreparedImage,
    /// Raw bytes of the configured font family's file.
    pub font_bytes: Vec<u8>,
    /// Audio file path; existence verified at load time.
    pub audio_path: PathBuf,
}

impl SongAssets {
    /// Load and verify all session assets.
    ///
    /// Any failure here is an [`LyrividError::AssetLoad`] and aborts an
    /// export before frame generation starts.
    pub fn load(
        assets_root: &Path,
        audio_path: &Path,
        image_path: &Path,
        family: FontFamily,
    ) -> LyrividResult<Self> {
        let image_bytes = std::fs::read(image_path).map_err(|e| {
            LyrividError::asset_load(format!("read image '{}': {e}", image_path.display()))
        })?;
        let artwork = decode_image(&image_bytes)?;

        let font_path = assets_root.join(family.file_name());
        let font_bytes = std::fs::read(&font_path).map_err(|e| {
            LyrividError::asset_load(format!("read font '{}': {e}", font_path.display()))
        })?;

        let audio_meta = std::fs::metadata(audio_path).map_err(|e| {
            LyrividError::asset_load(format!("read audio '{}': {e}", audio_path.display()))
        })?;
        if !audio_meta.is_file() {
            return Err(LyrividError::asset_load(format!(
                "audio '{}' is not a file",
                audio_path.display()
            )));
        }

        Ok(Self {
            artwork,
            font_bytes,
            audio_path: audio_path.to_path_buf(),
        })
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape and lay out a single line of text.
    pub fn layout_line(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        weight: u16,
    ) -> LyrividResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LyrividError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            LyrividError::asset_load("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| LyrividError::asset_load("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(weight)),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(
            TextBrushRgba8::default(),
        ));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_assets_is_asset_load_error() {
        let dir = std::env::temp_dir();
        let err = SongAssets::load(
            &dir,
            Path::new("/nonexistent/audio.mp3"),
            Path::new("/nonexistent/image.jpg"),
            FontFamily::SansSerif,
        )
        .unwrap_err();
        assert!(matches!(err, LyrividError::AssetLoad(_)));
    }

    #[test]
    fn layout_rejects_non_positive_size() {
        let mut engine = TextLayoutEngine::new();
        assert!(engine.layout_line("x", &[], 0.0, 400).is_err());
    }
}
