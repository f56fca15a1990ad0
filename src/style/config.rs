use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{LyrividError, LyrividResult};
use crate::style::theme::ColorTheme;

/// Named font family options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    /// Modern sans-serif.
    SansSerif,
    /// Classic serif.
    Serif,
    /// Handwritten script.
    Cursive,
    /// Typewriter monospace.
    Monospace,
    /// Japanese gothic (Noto Sans JP).
    NotoSansJp,
    /// Korean gothic (Noto Sans KR).
    NotoSansKr,
}

impl FontFamily {
    /// Font file for this family, relative to the assets root.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::SansSerif => "fonts/sans-serif.ttf",
            Self::Serif => "fonts/serif.ttf",
            Self::Cursive => "fonts/cursive.ttf",
            Self::Monospace => "fonts/monospace.ttf",
            Self::NotoSansJp => "fonts/noto-sans-jp.ttf",
            Self::NotoSansKr => "fonts/noto-sans-kr.ttf",
        }
    }
}

/// Closed set of supported font weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FontWeight {
    /// Light.
    #[serde(rename = "300")]
    W300,
    /// Normal.
    #[serde(rename = "400")]
    W400,
    /// Medium.
    #[serde(rename = "500")]
    W500,
    /// Semi-bold.
    #[serde(rename = "600")]
    W600,
    /// Bold.
    #[serde(rename = "700")]
    W700,
    /// Extra-bold.
    #[serde(rename = "800")]
    W800,
    /// Black.
    #[serde(rename = "900")]
    W900,
}

impl FontWeight {
    /// Numeric CSS-style weight value.
    pub fn value(self) -> u16 {
        match self {
            Self::W300 => 300,
            Self::W400 => 400,
            Self::W500 => 500,
            Self::W600 => 600,
            Self::W700 => 700,
            Self::W800 => 800,
            Self::W900 => 900,
        }
    }
}

/// Named output resolution presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// 1280×720.
    Hd720,
    /// 1920×1080.
    FullHd1080,
}

impl Resolution {
    /// Pixel dimensions of this preset.
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Hd720 => Canvas {
                width: 1280,
                height: 720,
            },
            Self::FullHd1080 => Canvas {
                width: 1920,
                height: 1080,
            },
        }
    }
}

/// Horizontal placement of the album art.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtPosition {
    /// Left edge of the frame.
    Left,
    /// Right edge of the frame.
    Right,
}

/// Album-art inclusion settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlbumArt {
    /// Art edge length as a percentage of the frame height.
    pub size_pct: f32,
    /// Which side the art sits on (vertically centered either way).
    pub position: ArtPosition,
}

impl Default for AlbumArt {
    fn default() -> Self {
        Self {
            size_pct: 38.0,
            position: ArtPosition::Right,
        }
    }
}

/// Immutable style snapshot consumed by [`VisualState::compute`].
///
/// Owned by the surrounding UI; the core only reads it. Two snapshots with
/// equal field values produce equal render output. A style change in the UI
/// constructs a new snapshot rather than mutating this one.
///
/// [`VisualState::compute`]: crate::state::visual::VisualState::compute
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderConfig {
    /// Lyric/overlay font family.
    pub font_family: FontFamily,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Base font size of the current line, in pixels.
    pub font_size: f32,
    /// Text outline color.
    pub stroke_color: Rgba8,
    /// Text outline width in pixels; `0` disables the outline.
    pub stroke_width: f32,
    /// Color theme.
    pub theme: ColorTheme,
    /// Output resolution preset.
    pub resolution: Resolution,
    /// Album art placement; `None` omits the art.
    pub album_art: Option<AlbumArt>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: FontFamily::SansSerif,
            font_weight: FontWeight::W700,
            font_size: 48.0,
            stroke_color: Rgba8::rgb(0, 0, 0),
            stroke_width: 0.0,
            theme: ColorTheme::Light,
            resolution: Resolution::Hd720,
            album_art: Some(AlbumArt::default()),
        }
    }
}

impl RenderConfig {
    /// Validate the snapshot at construction time.
    ///
    /// Option sets are closed enums, so only the numeric fields need
    /// checking; use sites may then rely on the snapshot unconditionally.
    pub fn validate(&self) -> LyrividResult<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(LyrividError::validation(
                "font_size must be finite and > 0",
            ));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(LyrividError::validation(
                "stroke_width must be finite and >= 0",
            ));
        }
        if let Some(art) = &self.album_art {
            if !art.size_pct.is_finite() || art.size_pct <= 0.0 || art.size_pct > 100.0 {
                return Err(LyrividError::validation(
                    "album art size_pct must be in (0, 100]",
                ));
            }
        }
        Ok(())
    }
}

/// Title/artist strings for the overlay and the output filename.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackMeta {
    /// Song title.
    pub title: String,
    /// Artist name.
    pub artist: String,
}

impl TrackMeta {
    /// Construct track metadata.
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    /// Default export filename: `"{title} - {artist} (Lyrics).mp4"`.
    pub fn output_file_name(&self) -> String {
        format!("{} - {} (Lyrics).mp4", self.title, self.artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        RenderConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_numeric_fields() {
        let mut cfg = RenderConfig::default();
        cfg.font_size = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RenderConfig::default();
        cfg.stroke_width = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RenderConfig::default();
        cfg.album_art = Some(AlbumArt {
            size_pct: 0.0,
            position: ArtPosition::Left,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn font_weight_serializes_as_numeric_string() {
        assert_eq!(serde_json::to_string(&FontWeight::W700).unwrap(), "\"700\"");
        let w: FontWeight = serde_json::from_str("\"300\"").unwrap();
        assert_eq!(w.value(), 300);
    }

    #[test]
    fn resolution_presets_have_expected_dims() {
        assert_eq!(Resolution::Hd720.canvas().width, 1280);
        assert_eq!(Resolution::FullHd1080.canvas().height, 1080);
    }

    #[test]
    fn output_file_name_pattern() {
        let meta = TrackMeta::new("Song", "Artist");
        assert_eq!(meta.output_file_name(), "Song - Artist (Lyrics).mp4");
    }
}
