//! Asset preparation: image decoding, background blur, font loading.

/// Background blur and dim passes.
pub mod blur;
/// Image decoding into premultiplied RGBA8.
pub mod decode;
/// Session asset bundle and text layout engine.
pub mod store;
