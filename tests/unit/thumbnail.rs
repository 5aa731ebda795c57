use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::backend::BitmapLike;
use crate::backend::cpu::CpuBackend;
use crate::raster::{ChannelOrder, PdfDocument, PixelBuffer, RasterError};
use crate::resources::ResourceKind;

/// Renders a 100x200pt page; files whose name contains "bad" fail to open.
#[derive(Default)]
struct Preview {
    opened: AtomicUsize,
}

struct PreviewDoc;

impl PdfRasterizer for Preview {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, RasterError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if path.to_string_lossy().contains("bad") {
            return Err(RasterError::Open("not a pdf".to_string()));
        }
        Ok(Box::new(PreviewDoc))
    }
}

impl PdfDocument for PreviewDoc {
    fn page_count(&self) -> u32 {
        1
    }

    fn render_page(&self, page: u32, spec: ResolutionSpec) -> Result<PixelBuffer, RasterError> {
        assert_eq!(page, THUMBNAIL_PAGE);
        let (w, h) = spec.pixel_size(100.0, 200.0);
        Ok(PixelBuffer {
            width: w,
            height: h,
            order: ChannelOrder::Bgra,
            data: vec![128; (w * h * 4) as usize],
        })
    }
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "pdfshape_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn wait_delivers_scaled_first_page_bitmap() {
    let mut backend = CpuBackend::default();
    let mut loader = ThumbnailLoader::spawn(Arc::new(Preview::default())).unwrap();
    let ticket = loader.request("a.pdf");
    assert!(loader.is_pending());

    let thumb = loader.wait(&mut backend).unwrap().unwrap();
    assert_eq!(thumb.ticket, ticket);
    assert_eq!(thumb.path, PathBuf::from("a.pdf"));
    let bitmap = thumb.bitmap.expect("preview bitmap");
    assert_eq!(bitmap.size(), (15, 30));
    assert!(!loader.is_pending());
    assert_eq!(backend.tracker().stats().live(ResourceKind::Intermediate), 0);
}

#[test]
fn unreadable_document_yields_no_bitmap() {
    let mut backend = CpuBackend::default();
    let mut loader = ThumbnailLoader::spawn(Arc::new(Preview::default())).unwrap();
    loader.request("bad.pdf");
    let thumb = loader.wait(&mut backend).unwrap().unwrap();
    assert!(thumb.bitmap.is_none());
}

#[test]
fn superseded_requests_are_never_delivered() {
    let mut backend = CpuBackend::default();
    let preview = Arc::new(Preview::default());
    let rasterizer: Arc<dyn PdfRasterizer> = Arc::clone(&preview) as _;
    let mut loader = ThumbnailLoader::spawn(rasterizer).unwrap();
    let first = loader.request("one.pdf");
    let second = loader.request("two.pdf");
    assert!(second > first);

    let thumb = loader.wait(&mut backend).unwrap().unwrap();
    assert_eq!(thumb.ticket, second);
    assert_eq!(thumb.path, PathBuf::from("two.pdf"));
    assert!(loader.wait(&mut backend).unwrap().is_none());
    assert!(preview.opened.load(Ordering::SeqCst) <= 2);
}

#[test]
fn try_finish_without_request_is_none() {
    let mut backend = CpuBackend::default();
    let mut loader = ThumbnailLoader::spawn(Arc::new(Preview::default())).unwrap();
    assert!(loader.try_finish(&mut backend).unwrap().is_none());
}

#[test]
fn try_finish_eventually_delivers() {
    let mut backend = CpuBackend::default();
    let mut loader = ThumbnailLoader::spawn(Arc::new(Preview::default())).unwrap();
    loader.request("poll.pdf");
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    let thumb = loop {
        if let Some(thumb) = loader.try_finish(&mut backend).unwrap() {
            break thumb;
        }
        assert!(std::time::Instant::now() < deadline, "thumbnail never arrived");
        std::thread::sleep(std::time::Duration::from_millis(5));
    };
    assert!(thumb.bitmap.is_some());
}

#[test]
fn sibling_pdfs_are_sorted_ignoring_case() {
    let dir = temp_dir("siblings");
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["b.pdf", "A.PDF", "c.txt", "a2.pdf"] {
        std::fs::write(dir.join(name), b"x").unwrap();
    }
    std::fs::create_dir_all(dir.join("folder.pdf")).unwrap();

    let names: Vec<String> = list_sibling_pdfs(&dir.join("b.pdf"))
        .into_iter()
        .map(|e| e.file_name)
        .collect();
    assert_eq!(names, vec!["A.PDF", "a2.pdf", "b.pdf"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_file_has_no_siblings() {
    let dir = temp_dir("no_siblings");
    assert!(list_sibling_pdfs(&dir.join("missing.pdf")).is_empty());
}
