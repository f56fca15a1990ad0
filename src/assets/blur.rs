use crate::foundation::error::{LyrividError, LyrividResult};

/// Separable gaussian blur over premultiplied RGBA8 pixels.
///
/// Used once per session to soften the background image; `radius == 0`
/// returns the input unchanged.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> LyrividResult<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| LyrividError::validation("blur buffer size overflow"))?;
    if src.len() != expected {
        return Err(LyrividError::validation(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel(radius, sigma)?;
    let mut tmp = vec![0u8; expected];
    let mut out = vec![0u8; expected];
    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Darken premultiplied RGBA8 pixels toward black by `amount` in `[0, 1]`.
///
/// Equivalent to compositing `rgba(0,0,0,amount)` over the buffer; alpha is
/// left untouched.
pub fn dim_rgba8_premul_in_place(buf: &mut [u8], amount: f32) {
    let keep = (1.0 - amount.clamp(0.0, 1.0)).max(0.0);
    for px in buf.chunks_exact_mut(4) {
        px[0] = (f32::from(px[0]) * keep).round() as u8;
        px[1] = (f32::from(px[1]) * keep).round() as u8;
        px[2] = (f32::from(px[2]) * keep).round() as u8;
    }
}

fn gaussian_kernel(radius: u32, sigma: f32) -> LyrividResult<Vec<f32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(LyrividError::validation("blur sigma must be > 0"));
    }
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let mut weights = Vec::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights.push(w);
        sum += w;
    }
    Ok(weights.into_iter().map(|w| (w / sum) as f32).collect())
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[f32]) {
    let radius = (kernel.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        let row = (y * w * 4) as usize;
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                // Clamp at the edges so borders keep full weight.
                let sx = (x + k as i32 - radius).clamp(0, w - 1);
                let s = row + (sx * 4) as usize;
                for c in 0..4 {
                    acc[c] += f32::from(src[s + c]) * weight;
                }
            }
            let d = row + (x * 4) as usize;
            for c in 0..4 {
                dst[d + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[f32]) {
    let radius = (kernel.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y + k as i32 - radius).clamp(0, h - 1);
                let s = ((sy * w + x) * 4) as usize;
                for c in 0..4 {
                    acc[c] += f32::from(src[s + c]) * weight;
                }
            }
            let d = ((y * w + x) * 4) as usize;
            for c in 0..4 {
                dst[d + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_radius_is_identity() {
        let src = vec![10u8, 20, 30, 255, 40, 50, 60, 255];
        let out = blur_rgba8_premul(&src, 2, 1, 0, 1.0).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn uniform_image_is_unchanged_by_blur() {
        let src = vec![100u8; 4 * 4 * 4];
        let out = blur_rgba8_premul(&src, 4, 4, 2, 1.5).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn blur_spreads_an_impulse() {
        let mut src = vec![0u8; 5 * 1 * 4];
        src[2 * 4] = 255; // single bright red pixel in the middle
        src[2 * 4 + 3] = 255;
        let out = blur_rgba8_premul(&src, 5, 1, 2, 1.0).unwrap();
        assert!(out[2 * 4] < 255, "center should lose energy");
        assert!(out[1 * 4] > 0, "neighbors should gain energy");
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(blur_rgba8_premul(&[0u8; 3], 2, 2, 1, 1.0).is_err());
    }

    #[test]
    fn dim_scales_color_channels_only() {
        let mut buf = vec![100u8, 200, 50, 255];
        dim_rgba8_premul_in_place(&mut buf, 0.3);
        assert_eq!(buf, vec![70, 140, 35, 255]);
    }
}
