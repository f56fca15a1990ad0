use crate::foundation::core::Rgba8;

/// Named color theme for lyric and overlay text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorTheme {
    /// White text over the dimmed background.
    Light,
    /// Charcoal text for bright artwork.
    Dark,
    /// Amber highlight over white.
    Colorized,
    /// Warm orange tiers.
    Sunset,
    /// Sky blue tiers.
    Ocean,
    /// Saturated pink highlight.
    Neon,
    /// Soft pink tiers.
    Sakura,
}

/// The five roles a theme assigns colors to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemePalette {
    /// Current-line (swept) color.
    pub active: Rgba8,
    /// Upcoming-lines color; also the unswept remainder of the current line.
    pub inactive1: Rgba8,
    /// Passed-lines color.
    pub inactive2: Rgba8,
    /// Title overlay color.
    pub info: Rgba8,
    /// Artist overlay color.
    pub sub_info: Rgba8,
}

impl ColorTheme {
    /// Resolve the palette for this theme.
    pub fn palette(self) -> ThemePalette {
        match self {
            Self::Light => ThemePalette {
                active: Rgba8::rgb(0xFF, 0xFF, 0xFF),
                inactive1: Rgba8::rgb(0xE5, 0xE7, 0xEB),
                inactive2: Rgba8::rgb(0xD1, 0xD5, 0xDB),
                info: Rgba8::rgb(0xFF, 0xFF, 0xFF),
                sub_info: Rgba8::rgb(0xE5, 0xE7, 0xEB),
            },
            Self::Dark => ThemePalette {
                active: Rgba8::rgb(0x1F, 0x29, 0x37),
                inactive1: Rgba8::rgb(0x4B, 0x55, 0x63),
                inactive2: Rgba8::rgb(0x6B, 0x72, 0x80),
                info: Rgba8::rgb(0x1F, 0x29, 0x37),
                sub_info: Rgba8::rgb(0x4B, 0x55, 0x63),
            },
            Self::Colorized => ThemePalette {
                active: Rgba8::rgb(0xFB, 0xBF, 0x24),
                inactive1: Rgba8::rgb(0xFF, 0xFF, 0xFF),
                inactive2: Rgba8::rgb(0xE5, 0xE7, 0xEB),
                info: Rgba8::rgb(0xFB, 0xBF, 0x24),
                sub_info: Rgba8::rgb(0xFF, 0xFF, 0xFF),
            },
            Self::Sunset => ThemePalette {
                active: Rgba8::rgb(0xFD, 0xBA, 0x74),
                inactive1: Rgba8::rgb(0xFE, 0xD7, 0xAA),
                inactive2: Rgba8::rgb(0xFF, 0xED, 0xD5),
                info: Rgba8::rgb(0xFD, 0xBA, 0x74),
                sub_info: Rgba8::rgb(0xFE, 0xD7, 0xAA),
            },
            Self::Ocean => ThemePalette {
                active: Rgba8::rgb(0x7D, 0xD3, 0xFC),
                inactive1: Rgba8::rgb(0xBA, 0xE6, 0xFD),
                inactive2: Rgba8::rgb(0xE0, 0xF2, 0xFE),
                info: Rgba8::rgb(0x7D, 0xD3, 0xFC),
                sub_info: Rgba8::rgb(0xBA, 0xE6, 0xFD),
            },
            Self::Neon => ThemePalette {
                active: Rgba8::rgb(0xEC, 0x48, 0x99),
                inactive1: Rgba8::rgb(0xF9, 0xA8, 0xD4),
                inactive2: Rgba8::rgb(0xFB, 0xCF, 0xE8),
                info: Rgba8::rgb(0xEC, 0x48, 0x99),
                sub_info: Rgba8::rgb(0xF9, 0xA8, 0xD4),
            },
            Self::Sakura => ThemePalette {
                active: Rgba8::rgb(0xF9, 0xA8, 0xD4),
                inactive1: Rgba8::rgb(0xFB, 0xCF, 0xE8),
                inactive2: Rgba8::rgb(0xFC, 0xE7, 0xF3),
                info: Rgba8::rgb(0xF9, 0xA8, 0xD4),
                sub_info: Rgba8::rgb(0xFB, 0xCF, 0xE8),
            },
        }
    }
}
