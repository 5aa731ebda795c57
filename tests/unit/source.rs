use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use super::*;
use crate::animation::anim::Anim;
use crate::backend::cpu::{CpuBackend, CpuBackendOpts};
use crate::foundation::core::{Affine, Fps};
use crate::foundation::error::PdfShapeError;
use crate::params::RenderMode;
use crate::raster::{ChannelOrder, PdfDocument, PixelBuffer, RasterError};
use crate::resources::ResourceKind;

#[derive(Default)]
struct Counting {
    pages: AtomicU32,
    renders: AtomicUsize,
}

struct Shared(Arc<Counting>);

struct CountingDoc {
    pages: u32,
    counter: Arc<Counting>,
}

impl PdfRasterizer for Shared {
    fn open(&self, _path: &Path) -> Result<Box<dyn PdfDocument>, RasterError> {
        Ok(Box::new(CountingDoc {
            pages: self.0.pages.load(Ordering::SeqCst),
            counter: Arc::clone(&self.0),
        }))
    }
}

impl PdfDocument for CountingDoc {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn render_page(&self, _page: u32, spec: ResolutionSpec) -> Result<PixelBuffer, RasterError> {
        self.counter.renders.fetch_add(1, Ordering::SeqCst);
        let (w, h) = spec.pixel_size(8.0, 4.0);
        Ok(PixelBuffer {
            width: w,
            height: h,
            order: ChannelOrder::Rgba,
            data: vec![200; (w * h * 4) as usize],
        })
    }
}

fn temp_pdf(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pdfshape_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("doc.pdf");
    std::fs::write(&path, b"%PDF-1.4\n").unwrap();
    path
}

fn setup(
    name: &str,
    pages: u32,
    mode: RenderMode,
    backend: &mut CpuBackend,
) -> (PdfShapeSource<CpuBackend>, Arc<Counting>, std::path::PathBuf) {
    let path = temp_pdf(name);
    let counter = Arc::new(Counting::default());
    counter.pages.store(pages, Ordering::SeqCst);
    let mut params = PdfShapeParams::for_file(path.to_string_lossy());
    params.mode = mode;
    let src = PdfShapeSource::new(
        backend,
        params,
        Arc::new(Shared(Arc::clone(&counter))),
        PdfShapeOpts::default(),
    )
    .unwrap();
    (src, counter, path)
}

fn pos(frame: u64) -> TimelinePos {
    TimelinePos::new(frame, 100, Fps::new(30, 1).unwrap())
}

fn cleanup(path: &Path) {
    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[test]
fn fresh_source_exposes_empty_artifact() {
    let mut backend = CpuBackend::default();
    let (src, counter, path) = setup("fresh", 1, RenderMode::Raster, &mut backend);
    assert!(src.output().is_empty());
    assert_eq!(src.state(), &SourceState::Empty { failed: None });
    assert_eq!(counter.renders.load(Ordering::SeqCst), 0);
    cleanup(&path);
}

#[test]
fn failed_rasterization_is_not_retried_until_request_changes() {
    let mut backend = CpuBackend::default();
    let (mut src, counter, path) = setup("failed_memo", 1, RenderMode::Raster, &mut backend);
    src.params_mut().page = Anim::constant(2.0);

    let first = src.update(&mut backend, pos(0)).unwrap();
    let second = src.update(&mut backend, pos(1)).unwrap();
    assert_eq!(first, UpdateOutcome::Empty(EmptyReason::Rasterization));
    assert_eq!(second, UpdateOutcome::Empty(EmptyReason::Rasterization));
    assert_eq!(src.stats().rasterizations, 1);
    assert!(matches!(
        src.state(),
        SourceState::Empty { failed: Some(_) }
    ));

    src.params_mut().page = Anim::constant(1.0);
    assert_eq!(src.update(&mut backend, pos(2)).unwrap(), UpdateOutcome::Rendered);
    assert_eq!(counter.renders.load(Ordering::SeqCst), 1);
    cleanup(&path);
}

#[test]
fn vector_mode_zoom_change_rerasterizes() {
    let mut backend = CpuBackend::default();
    let (mut src, counter, path) = setup("vector_zoom", 1, RenderMode::Vector, &mut backend);

    assert_eq!(src.update(&mut backend, pos(0)).unwrap(), UpdateOutcome::Rendered);
    assert_eq!(src.output().bitmap_size(), Some((8, 4)));

    src.params_mut().base.zoom = Anim::constant(200.0);
    assert_eq!(src.update(&mut backend, pos(1)).unwrap(), UpdateOutcome::Rendered);
    assert_eq!(src.output().bitmap_size(), Some((16, 8)));
    assert_eq!(src.output().transform(), Affine::IDENTITY);
    assert_eq!(counter.renders.load(Ordering::SeqCst), 2);
    cleanup(&path);
}

#[test]
fn raster_mode_zoom_change_only_moves_transform() {
    let mut backend = CpuBackend::default();
    let (mut src, counter, path) = setup("raster_zoom", 1, RenderMode::Raster, &mut backend);
    src.update(&mut backend, pos(0)).unwrap();
    let generation = src.output().generation();

    src.params_mut().base.zoom = Anim::constant(50.0);
    assert_eq!(
        src.update(&mut backend, pos(1)).unwrap(),
        UpdateOutcome::TransformOnly
    );
    assert_eq!(src.output().generation(), generation);
    assert_eq!(src.output().transform(), Affine::scale(0.5));
    assert_eq!(counter.renders.load(Ordering::SeqCst), 1);
    cleanup(&path);
}

#[test]
fn single_bitmap_budget_allows_page_change() {
    let mut backend = CpuBackend::new(CpuBackendOpts {
        max_bitmap_dim: 64,
        max_live_bitmaps: Some(1),
    });
    let (mut src, counter, path) = setup("budget_one", 2, RenderMode::Raster, &mut backend);
    assert_eq!(src.update(&mut backend, pos(0)).unwrap(), UpdateOutcome::Rendered);

    src.params_mut().page = Anim::constant(2.0);
    for f in 1..=5 {
        let expected = if f == 1 {
            UpdateOutcome::Rendered
        } else {
            UpdateOutcome::NoOp
        };
        assert_eq!(src.update(&mut backend, pos(f)).unwrap(), expected);
    }
    assert!(src.state().is_ready());
    assert_eq!(src.output().bitmap_size(), Some((16, 8)));
    assert_eq!(counter.renders.load(Ordering::SeqCst), 2);
    assert_eq!(backend.tracker().stats().live(ResourceKind::Bitmap), 1);
    cleanup(&path);
}

#[test]
fn exhausted_request_is_not_rasterized_every_frame() {
    let mut backend = CpuBackend::new(CpuBackendOpts {
        max_bitmap_dim: 64,
        max_live_bitmaps: None,
    });
    let (mut src, counter, path) = setup("exhausted", 1, RenderMode::Raster, &mut backend);
    assert_eq!(src.update(&mut backend, pos(0)).unwrap(), UpdateOutcome::Rendered);

    // 8pt * 10 = 80px, above the 64px bitmap limit
    src.params_mut().raster_dpi = Anim::constant(720.0);
    let err = src.update(&mut backend, pos(1)).unwrap_err();
    assert!(matches!(err, PdfShapeError::ResourceExhausted(_)));
    assert!(src.output().is_empty());
    assert_eq!(src.state(), &SourceState::Empty { failed: None });
    assert_eq!(backend.tracker().stats().live(ResourceKind::Intermediate), 0);
    assert_eq!(backend.tracker().stats().live(ResourceKind::Bitmap), 0);

    for f in 2..=5 {
        assert_eq!(
            src.update(&mut backend, pos(f)).unwrap(),
            UpdateOutcome::Empty(EmptyReason::ResourceExhausted)
        );
    }
    assert_eq!(counter.renders.load(Ordering::SeqCst), 2);

    src.params_mut().raster_dpi = Anim::constant(144.0);
    assert_eq!(src.update(&mut backend, pos(6)).unwrap(), UpdateOutcome::Rendered);
    assert_eq!(counter.renders.load(Ordering::SeqCst), 3);
    cleanup(&path);
}

#[test]
fn exhausted_request_retries_once_bitmaps_are_freed() {
    let mut backend = CpuBackend::new(CpuBackendOpts {
        max_bitmap_dim: 64,
        max_live_bitmaps: Some(1),
    });
    let (mut first, _first_counter, first_path) =
        setup("shared_a", 1, RenderMode::Raster, &mut backend);
    let (mut second, second_counter, second_path) =
        setup("shared_b", 1, RenderMode::Raster, &mut backend);

    assert_eq!(first.update(&mut backend, pos(0)).unwrap(), UpdateOutcome::Rendered);
    let err = second.update(&mut backend, pos(0)).unwrap_err();
    assert!(matches!(err, PdfShapeError::ResourceExhausted(_)));
    assert_eq!(
        second.update(&mut backend, pos(1)).unwrap(),
        UpdateOutcome::Empty(EmptyReason::ResourceExhausted)
    );
    assert_eq!(second_counter.renders.load(Ordering::SeqCst), 1);

    first.dispose();
    assert_eq!(second.update(&mut backend, pos(2)).unwrap(), UpdateOutcome::Rendered);
    assert_eq!(second_counter.renders.load(Ordering::SeqCst), 2);
    cleanup(&first_path);
    cleanup(&second_path);
}

#[test]
fn empty_artifact_is_rebuilt_only_when_leaving_ready() {
    let mut backend = CpuBackend::default();
    let (mut src, _counter, path) = setup("empty_rebuild", 1, RenderMode::Raster, &mut backend);
    let created = |b: &CpuBackend| b.tracker().stats().created(ResourceKind::CommandList);

    src.params_mut().file_path.clear();
    src.update(&mut backend, pos(0)).unwrap();
    src.update(&mut backend, pos(1)).unwrap();
    assert_eq!(created(&backend), 1);
    assert_eq!(src.stats().empty_transitions, 0);

    src.params_mut().file_path = path.to_string_lossy().into_owned();
    src.update(&mut backend, pos(2)).unwrap();
    assert_eq!(created(&backend), 2);

    src.params_mut().file_path.clear();
    assert_eq!(
        src.update(&mut backend, pos(3)).unwrap(),
        UpdateOutcome::Empty(EmptyReason::Input(InputIssue::NoFile))
    );
    assert_eq!(created(&backend), 3);
    assert_eq!(src.stats().empty_transitions, 1);
    assert!(src.output().is_empty());
    cleanup(&path);
}

#[test]
fn rewritten_file_is_rasterized_again() {
    let mut backend = CpuBackend::default();
    let (mut src, counter, path) = setup("rewritten", 1, RenderMode::Raster, &mut backend);
    src.update(&mut backend, pos(0)).unwrap();

    std::fs::write(&path, b"%PDF-1.4\n% a longer revision\n").unwrap();
    assert_eq!(src.update(&mut backend, pos(1)).unwrap(), UpdateOutcome::Rendered);
    assert_eq!(counter.renders.load(Ordering::SeqCst), 2);
    cleanup(&path);
}

#[test]
fn invalid_params_are_rejected_at_construction() {
    let mut backend = CpuBackend::default();
    let mut params = PdfShapeParams::for_file("doc.pdf");
    params.page = Anim::Keyframes(crate::animation::anim::Keyframes {
        keys: Vec::new(),
        mode: Default::default(),
        default: None,
    });
    let counter = Arc::new(Counting::default());
    let res = PdfShapeSource::new(
        &mut backend,
        params,
        Arc::new(Shared(counter)),
        PdfShapeOpts::default(),
    );
    assert!(res.is_err());
}
