use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pdfshape::{
    BitmapLike, Canvas, CpuBackend, CpuBackendOpts, Fps, PdfRasterizer, PdfShapeOpts,
    PdfShapeParams, PdfShapeSource, ThumbnailLoader, TimelinePos, center_on, list_sibling_pdfs,
    render_artifact_to_frame,
};

#[derive(Parser, Debug)]
#[command(name = "pdfshape", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a PDF layer at one frame as a PNG.
    Frame(FrameArgs),
    /// Render a file-picker preview of a PDF's first page as a PNG.
    Thumbnail(ThumbnailArgs),
    /// List the PDFs next to a file.
    List(ListArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Layer parameters JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index inside the item (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Item duration in frames.
    #[arg(long, default_value_t = 1)]
    duration: u64,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ThumbnailArgs {
    /// PDF to preview.
    #[arg(long)]
    file: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Any file in the directory to list.
    #[arg(long)]
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Thumbnail(args) => cmd_thumbnail(args),
        Command::List(args) => cmd_list(args),
    }
}

#[cfg(feature = "mupdf")]
fn rasterizer() -> anyhow::Result<Arc<dyn PdfRasterizer>> {
    Ok(Arc::new(pdfshape::MupdfRasterizer))
}

#[cfg(not(feature = "mupdf"))]
fn rasterizer() -> anyhow::Result<Arc<dyn PdfRasterizer>> {
    anyhow::bail!("pdfshape was built without a rasterizer; rebuild with `--features mupdf`")
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut params = PdfShapeParams::from_path(&args.in_path)?;
    if let Some(base) = args.in_path.parent() {
        let file = Path::new(&params.file_path);
        if !params.file_path.is_empty() && file.is_relative() {
            params.file_path = base.join(file).to_string_lossy().into_owned();
        }
    }

    let mut backend = CpuBackend::new(CpuBackendOpts::default());
    let mut source = PdfShapeSource::new(
        &mut backend,
        params,
        rasterizer()?,
        PdfShapeOpts::default(),
    )?;
    let pos = TimelinePos::new(args.frame, args.duration, Fps::new(args.fps, 1)?);
    let outcome = source.update(&mut backend, pos)?;
    eprintln!("update: {outcome:?}");

    let canvas = Canvas {
        width: args.width,
        height: args.height,
    };
    let frame = render_artifact_to_frame(source.output(), canvas, center_on(canvas))?;
    write_png(&args.out, frame.width, frame.height, &frame.into_straight_rgba())?;
    source.dispose();
    Ok(())
}

fn cmd_thumbnail(args: ThumbnailArgs) -> anyhow::Result<()> {
    let mut backend = CpuBackend::new(CpuBackendOpts::default());
    let mut loader = ThumbnailLoader::spawn(rasterizer()?)?;
    loader.request(&args.file);
    let thumb = loader
        .wait(&mut backend)?
        .context("thumbnail worker stopped")?;
    let bitmap = thumb
        .bitmap
        .with_context(|| format!("could not render '{}'", args.file.display()))?;

    let (w, h) = bitmap.size();
    let frame = pdfshape::FrameRGBA {
        width: w,
        height: h,
        data: bitmap.rgba8_premul().to_vec(),
    };
    write_png(&args.out, w, h, &frame.into_straight_rgba())
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    for entry in list_sibling_pdfs(&args.file) {
        println!("{}", entry.file_name);
    }
    Ok(())
}

fn write_png(out: &Path, width: u32, height: u32, rgba: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        out,
        rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}
