//! Background page previews for the file picker.
//!
//! Opening and rasterizing a document is slow, so previews are rendered on a worker thread. The
//! worker only produces pixels; turning them into a device bitmap happens on the caller's thread
//! in [`ThumbnailLoader::try_finish`] or [`ThumbnailLoader::wait`], the single join point. A newer
//! request supersedes older ones and their results are dropped unseen.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use flume::{Receiver, Sender};

use crate::backend::GraphicsBackend;
use crate::foundation::error::{PdfShapeError, PdfShapeResult};
use crate::raster::{PdfRasterizer, RasterOutcome, ResolutionSpec, rasterize_page, upload_page};
use crate::resources::Tracked;

/// Points-to-pixels scale used for previews.
pub const THUMBNAIL_SCALE: f64 = 0.15;
/// Pages are 1-based; previews always show the first one.
pub const THUMBNAIL_PAGE: u32 = 1;
const THUMBNAIL_MAX_DIM: u32 = 2048;

/// Identifies one preview request. Later tickets compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThumbnailTicket(u64);

/// A finished preview.
#[derive(Debug)]
pub struct Thumbnail<Bm> {
    /// Ticket of the request this answers.
    pub ticket: ThumbnailTicket,
    /// Document the preview was rendered from.
    pub path: PathBuf,
    /// Preview bitmap; `None` when the document could not be rendered.
    pub bitmap: Option<Tracked<Bm>>,
}

struct Job {
    ticket: u64,
    path: PathBuf,
}

struct Reply {
    ticket: u64,
    path: PathBuf,
    outcome: RasterOutcome,
}

/// Renders previews on a dedicated worker thread.
pub struct ThumbnailLoader {
    jobs: Option<Sender<Job>>,
    replies: Receiver<Reply>,
    worker: Option<JoinHandle<()>>,
    latest: u64,
    pending: bool,
}

impl ThumbnailLoader {
    /// Start the worker thread.
    pub fn spawn(rasterizer: Arc<dyn PdfRasterizer>) -> PdfShapeResult<Self> {
        let (job_tx, job_rx) = flume::unbounded::<Job>();
        let (reply_tx, reply_rx) = flume::unbounded::<Reply>();
        let worker = std::thread::Builder::new()
            .name("pdf-thumbnail".to_string())
            .spawn(move || run_worker(rasterizer.as_ref(), &job_rx, &reply_tx))
            .map_err(|e| PdfShapeError::Other(anyhow::anyhow!("spawn thumbnail worker: {e}")))?;

        Ok(Self {
            jobs: Some(job_tx),
            replies: reply_rx,
            worker: Some(worker),
            latest: 0,
            pending: false,
        })
    }

    /// Queue a preview of `path`, superseding any request still in flight.
    pub fn request(&mut self, path: impl Into<PathBuf>) -> ThumbnailTicket {
        self.latest += 1;
        let job = Job {
            ticket: self.latest,
            path: path.into(),
        };
        match self.jobs.as_ref().map(|tx| tx.send(job)) {
            Some(Ok(())) => self.pending = true,
            _ => {
                tracing::warn!("thumbnail worker is gone; request dropped");
                self.pending = false;
            }
        }
        ThumbnailTicket(self.latest)
    }

    /// Whether the latest request has not been delivered yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Deliver the latest preview if the worker has finished it. Never blocks.
    pub fn try_finish<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
    ) -> PdfShapeResult<Option<Thumbnail<B::Bitmap>>> {
        while self.pending {
            let Ok(reply) = self.replies.try_recv() else {
                return Ok(None);
            };
            if let Some(thumb) = self.accept(backend, reply)? {
                return Ok(Some(thumb));
            }
        }
        Ok(None)
    }

    /// Block until the latest preview is ready and deliver it.
    ///
    /// Returns `None` when nothing is pending or the worker has stopped.
    pub fn wait<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
    ) -> PdfShapeResult<Option<Thumbnail<B::Bitmap>>> {
        while self.pending {
            let Ok(reply) = self.replies.recv() else {
                tracing::warn!("thumbnail worker stopped before answering");
                self.pending = false;
                return Ok(None);
            };
            if let Some(thumb) = self.accept(backend, reply)? {
                return Ok(Some(thumb));
            }
        }
        Ok(None)
    }

    fn accept<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        reply: Reply,
    ) -> PdfShapeResult<Option<Thumbnail<B::Bitmap>>> {
        if reply.ticket != self.latest {
            tracing::trace!(ticket = reply.ticket, latest = self.latest, "stale thumbnail");
            return Ok(None);
        }
        self.pending = false;
        let bitmap = match reply.outcome {
            RasterOutcome::Content(buffer) => Some(upload_page(backend, buffer)?),
            RasterOutcome::NoContent(_) => None,
        };
        Ok(Some(Thumbnail {
            ticket: ThumbnailTicket(reply.ticket),
            path: reply.path,
            bitmap,
        }))
    }
}

impl Drop for ThumbnailLoader {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("thumbnail worker panicked");
        }
    }
}

fn run_worker(rasterizer: &dyn PdfRasterizer, jobs: &Receiver<Job>, replies: &Sender<Reply>) {
    while let Ok(mut job) = jobs.recv() {
        // Only the newest queued request can still be delivered.
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }
        let spec = ResolutionSpec {
            scale: THUMBNAIL_SCALE,
            max_dim: THUMBNAIL_MAX_DIM,
        };
        let outcome = rasterize_page(rasterizer, &job.path, THUMBNAIL_PAGE, spec);
        let reply = Reply {
            ticket: job.ticket,
            path: job.path,
            outcome,
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
}

/// A PDF offered by the file picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfFileEntry {
    /// Full path.
    pub path: PathBuf,
    /// File name shown in the list.
    pub file_name: String,
}

/// The `*.pdf` files in the directory of `current`, ordered by name ignoring case.
///
/// A missing file or directory yields an empty list.
pub fn list_sibling_pdfs(current: &Path) -> Vec<PdfFileEntry> {
    if !current.is_file() {
        return Vec::new();
    }
    let dir = match current.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut out: Vec<PdfFileEntry> = read
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .filter_map(|path| {
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            Some(PdfFileEntry { path, file_name })
        })
        .collect();
    out.sort_by_cached_key(|e| (e.file_name.to_lowercase(), e.file_name.clone()));
    out
}

#[cfg(test)]
#[path = "../tests/unit/thumbnail.rs"]
mod tests;
