use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use lyrivid::{
    AlbumArt, ArtPosition, CancelFlag, ColorTheme, ExportJob, ExportPipeline, FfmpegEncoder,
    FfmpegEncoderOpts, FontFamily, FontWeight, Fps, FrameRasterizer, LyricLine, LyricTimeline,
    RenderConfig, Renderer as _, Resolution, Rgba8, TrackMeta, VisualState,
};

#[derive(Parser, Debug)]
#[command(name = "lyrivid", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the visual state at one instant as a PNG.
    Frame(FrameArgs),
    /// Export the full lyric video as an MP4 (requires `ffmpeg` on PATH).
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Timed lyrics JSON: an array of {"text", "start", "end"}.
    #[arg(long)]
    lyrics: PathBuf,

    /// Background/album artwork image.
    #[arg(long)]
    image: PathBuf,

    /// Song title for the overlay.
    #[arg(long)]
    title: String,

    /// Artist name for the overlay.
    #[arg(long)]
    artist: String,

    /// Directory holding bundled assets (fonts/).
    #[arg(long, default_value = ".")]
    assets_root: PathBuf,

    /// Color theme.
    #[arg(long, value_enum, default_value_t = ThemeChoice::Light)]
    theme: ThemeChoice,

    /// Output resolution.
    #[arg(long, value_enum, default_value_t = ResolutionChoice::Hd720)]
    resolution: ResolutionChoice,

    /// Font family.
    #[arg(long, value_enum, default_value_t = FontChoice::SansSerif)]
    font: FontChoice,

    /// Base font size in pixels.
    #[arg(long, default_value_t = 48.0)]
    font_size: f32,

    /// Font weight.
    #[arg(long, value_enum, default_value_t = WeightChoice::W700)]
    weight: WeightChoice,

    /// Text outline width in pixels (0 disables).
    #[arg(long, default_value_t = 0.0)]
    stroke_width: f32,

    /// Text outline color as #RRGGBB.
    #[arg(long, default_value = "#000000")]
    stroke_color: String,

    /// Omit the album art.
    #[arg(long)]
    no_album_art: bool,

    /// Album art size as a percentage of the frame height.
    #[arg(long, default_value_t = 38.0)]
    art_size: f32,

    /// Album art side.
    #[arg(long, value_enum, default_value_t = ArtSideChoice::Right)]
    art_position: ArtSideChoice,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Sampled time in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Audio track to mux and to trim the output against.
    #[arg(long)]
    audio: PathBuf,

    /// Exact audio duration in seconds.
    #[arg(long)]
    duration: f64,

    /// Output frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Output MP4 path; defaults to "{title} - {artist} (Lyrics).mp4".
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeChoice {
    Light,
    Dark,
    Colorized,
    Sunset,
    Ocean,
    Neon,
    Sakura,
}

impl From<ThemeChoice> for ColorTheme {
    fn from(c: ThemeChoice) -> Self {
        match c {
            ThemeChoice::Light => Self::Light,
            ThemeChoice::Dark => Self::Dark,
            ThemeChoice::Colorized => Self::Colorized,
            ThemeChoice::Sunset => Self::Sunset,
            ThemeChoice::Ocean => Self::Ocean,
            ThemeChoice::Neon => Self::Neon,
            ThemeChoice::Sakura => Self::Sakura,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResolutionChoice {
    #[value(name = "720p")]
    Hd720,
    #[value(name = "1080p")]
    FullHd1080,
}

impl From<ResolutionChoice> for Resolution {
    fn from(c: ResolutionChoice) -> Self {
        match c {
            ResolutionChoice::Hd720 => Self::Hd720,
            ResolutionChoice::FullHd1080 => Self::FullHd1080,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FontChoice {
    SansSerif,
    Serif,
    Cursive,
    Monospace,
    NotoSansJp,
    NotoSansKr,
}

impl From<FontChoice> for FontFamily {
    fn from(c: FontChoice) -> Self {
        match c {
            FontChoice::SansSerif => Self::SansSerif,
            FontChoice::Serif => Self::Serif,
            FontChoice::Cursive => Self::Cursive,
            FontChoice::Monospace => Self::Monospace,
            FontChoice::NotoSansJp => Self::NotoSansJp,
            FontChoice::NotoSansKr => Self::NotoSansKr,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WeightChoice {
    #[value(name = "300")]
    W300,
    #[value(name = "400")]
    W400,
    #[value(name = "500")]
    W500,
    #[value(name = "600")]
    W600,
    #[value(name = "700")]
    W700,
    #[value(name = "800")]
    W800,
    #[value(name = "900")]
    W900,
}

impl From<WeightChoice> for FontWeight {
    fn from(c: WeightChoice) -> Self {
        match c {
            WeightChoice::W300 => Self::W300,
            WeightChoice::W400 => Self::W400,
            WeightChoice::W500 => Self::W500,
            WeightChoice::W600 => Self::W600,
            WeightChoice::W700 => Self::W700,
            WeightChoice::W800 => Self::W800,
            WeightChoice::W900 => Self::W900,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ArtSideChoice {
    Left,
    Right,
}

impl From<ArtSideChoice> for ArtPosition {
    fn from(c: ArtSideChoice) -> Self {
        match c {
            ArtSideChoice::Left => Self::Left,
            ArtSideChoice::Right => Self::Right,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn read_lyrics(path: &Path) -> anyhow::Result<Vec<LyricLine>> {
    let f = File::open(path).with_context(|| format!("open lyrics '{}'", path.display()))?;
    let lines: Vec<LyricLine> =
        serde_json::from_reader(BufReader::new(f)).context("parse lyrics JSON")?;
    Ok(lines)
}

fn build_config(common: &CommonArgs) -> anyhow::Result<RenderConfig> {
    let cfg = RenderConfig {
        font_family: common.font.into(),
        font_weight: common.weight.into(),
        font_size: common.font_size,
        stroke_color: Rgba8::from_hex(&common.stroke_color)?,
        stroke_width: common.stroke_width,
        theme: common.theme.into(),
        resolution: common.resolution.into(),
        album_art: (!common.no_album_art).then_some(AlbumArt {
            size_pct: common.art_size,
            position: common.art_position.into(),
        }),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.common)?;
    let timeline = LyricTimeline::new(read_lyrics(&args.common.lyrics)?);
    let meta = TrackMeta::new(&args.common.title, &args.common.artist);

    let image_bytes = std::fs::read(&args.common.image)
        .with_context(|| format!("read image '{}'", args.common.image.display()))?;
    let artwork = lyrivid::assets::decode::decode_image(&image_bytes)?;
    let font_path = args.common.assets_root.join(cfg.font_family.file_name());
    let font_bytes = std::fs::read(&font_path)
        .with_context(|| format!("read font '{}'", font_path.display()))?;
    let mut raster = FrameRasterizer::new(&cfg, &artwork, &font_bytes)?;

    let state = VisualState::compute(args.at, &timeline, &cfg, &meta);
    let frame = raster.render(&state)?;

    let mut rgba = frame.data;
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut rgba);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .context("frame buffer size mismatch")?;
    img.save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.common)?;
    let timeline = LyricTimeline::new(read_lyrics(&args.common.lyrics)?);
    let meta = TrackMeta::new(&args.common.title, &args.common.artist);
    let out_path = args
        .out
        .unwrap_or_else(|| PathBuf::from(meta.output_file_name()));

    let pipeline = ExportPipeline::new(timeline, cfg, meta)?;
    let job = ExportJob {
        assets_root: args.common.assets_root.clone(),
        audio_path: args.audio.clone(),
        image_path: args.common.image.clone(),
        out_path: out_path.clone(),
        total_duration: args.duration,
        fps: Fps::whole(args.fps)?,
    };

    let cancel = CancelFlag::new();
    let mut encoder = FfmpegEncoder::new(FfmpegEncoderOpts::default());
    let mut last_printed = -1.0;
    pipeline.export(&job, &mut encoder, &cancel, &mut |update| {
        if update.percent - last_printed >= 1.0 || update.percent == 0.0 {
            last_printed = update.percent;
            match &update.detail {
                Some(detail) => println!("{:5.1}% {:?} ({detail})", update.percent, update.phase),
                None => println!("{:5.1}% {:?}", update.percent, update.phase),
            }
        }
    })?;

    println!("wrote {}", out_path.display());
    Ok(())
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
