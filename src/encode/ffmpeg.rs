use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::encode::{EncodeJob, VideoEncoder};
use crate::export::cancel::CancelFlag;
use crate::foundation::error::{LyrividError, LyrividResult};

/// Options for [`FfmpegEncoder`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// AAC audio bitrate passed as `-b:a`.
    pub audio_bitrate: String,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            overwrite: true,
            audio_bitrate: "192k".to_owned(),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Encoder that spawns the system `ffmpeg` and streams raw frames to stdin.
///
/// Output is h264 + yuv420p with AAC audio, hard-trimmed to the job's exact
/// duration. Cancellation kills the child process and surfaces as
/// [`LyrividError::Cancelled`]; any other ffmpeg failure is
/// [`LyrividError::Encoder`] with the drained stderr text.
#[derive(Debug, Default)]
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,
}

impl FfmpegEncoder {
    /// Create an encoder with the given options.
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self { opts }
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(
        &mut self,
        job: EncodeJob<'_>,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(f64),
    ) -> LyrividResult<()> {
        let Some(first) = job.frames.first() else {
            return Err(LyrividError::validation("encode job has no frames"));
        };
        let (width, height) = (first.width, first.height);
        if width == 0 || height == 0 {
            return Err(LyrividError::validation("frame width/height must be non-zero"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(LyrividError::validation(
                "frame width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if !(job.trim_secs.is_finite() && job.trim_secs > 0.0) {
            return Err(LyrividError::validation("trim_secs must be finite and > 0"));
        }

        ensure_parent_dir(job.out_path)?;
        if !self.opts.overwrite && job.out_path.exists() {
            return Err(LyrividError::validation(format!(
                "output file '{}' already exists",
                job.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(LyrividError::encoder(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        // Input 0: raw RGBA8 frames on stdin. ffmpeg does not understand
        // premultiplied alpha, so frames are flattened before writing.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &format!("{}/{}", job.fps.num, job.fps.den),
            "-i",
            "pipe:0",
            "-i",
        ])
        .arg(job.audio_path)
        .args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-b:a",
            &self.opts.audio_bitrate,
            // The frame count is a ceiling over the audio length; trim the
            // container back to the exact clip duration.
            "-t",
            &format!("{}", job.trim_secs),
            "-movflags",
            "+faststart",
        ])
        .arg(job.out_path);

        tracing::debug!(out = %job.out_path.display(), frames = job.frames.len(), "spawning ffmpeg");
        let mut child = cmd.spawn().map_err(|e| {
            LyrividError::encoder(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| LyrividError::encoder("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| LyrividError::encoder("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let mut scratch = vec![0u8; (width as usize) * (height as usize) * 4];
        let total = job.frames.len();
        for (i, frame) in job.frames.iter().enumerate() {
            if cancel.is_cancelled() {
                drop(stdin);
                abandon_child(child, stderr_drain);
                return Err(LyrividError::Cancelled);
            }
            if frame.width != width || frame.height != height {
                drop(stdin);
                abandon_child(child, stderr_drain);
                return Err(LyrividError::validation(format!(
                    "frame {i} size mismatch: got {}x{}, expected {width}x{height}",
                    frame.width, frame.height
                )));
            }

            if frame.premultiplied {
                flatten_premul_over_bg(&mut scratch, &frame.data, self.opts.bg_rgba)?;
            } else {
                scratch.copy_from_slice(&frame.data);
            }

            use std::io::Write as _;
            if let Err(e) = stdin.write_all(&scratch) {
                drop(stdin);
                abandon_child(child, stderr_drain);
                return Err(LyrividError::encoder(format!(
                    "failed to write frame to ffmpeg stdin: {e}"
                )));
            }
            on_progress((i + 1) as f64 / total as f64);
        }

        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| LyrividError::encoder(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| LyrividError::encoder("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| LyrividError::encoder(format!("ffmpeg stderr read failed: {e}")))?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(LyrividError::encoder(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        tracing::info!(out = %job.out_path.display(), "ffmpeg finished");
        Ok(())
    }
}

/// Kill and reap a child whose output is no longer wanted.
fn abandon_child(
    mut child: Child,
    stderr_drain: std::thread::JoinHandle<std::io::Result<Vec<u8>>>,
) {
    let _ = child.kill();
    let _ = child.wait();
    let _ = stderr_drain.join();
}

/// Flatten premultiplied RGBA8 over the configured background color.
fn flatten_premul_over_bg(dst: &mut [u8], src_premul: &[u8], bg_rgba: [u8; 4]) -> LyrividResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(LyrividError::validation(
            "flatten_premul_over_bg expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }

        let inv = 255u16 - a;
        let r = s[0] as u16 + mul_div255(bg_r, inv);
        let g = s[1] as u16 + mul_div255(bg_g, inv);
        let b = s[2] as u16 + mul_div255(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    ((x * y) + 127) / 255
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> LyrividResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_alpha_0_returns_bg() {
        let src = vec![0u8, 0, 0, 0];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255]);
    }

    #[test]
    fn flatten_alpha_255_is_identity() {
        let src = vec![1u8, 2, 3, 255];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn flatten_rejects_mismatched_buffers() {
        let src = vec![0u8; 8];
        let mut dst = vec![0u8; 4];
        assert!(flatten_premul_over_bg(&mut dst, &src, [0, 0, 0, 255]).is_err());
    }
}
