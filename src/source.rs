//! Per-layer controller: decides each frame whether the cached page bitmap can be reused.
//!
//! One [`PdfShapeSource`] drives one timeline item. Every call to [`PdfShapeSource::update`]
//! samples the layer parameters, fingerprints the result and then does the least work that keeps
//! [`PdfShapeSource::output`] correct:
//!
//! - unchanged fingerprint: nothing,
//! - zoom-only change in raster mode: a new transform on the same bitmap,
//! - anything baked into pixels: one rasterization and a rebuilt artifact.
//!
//! Rasterization and input problems never escape; they turn the layer transparent. Only
//! [`PdfShapeError::ResourceExhausted`](crate::PdfShapeError::ResourceExhausted) is returned. The
//! shown page is released before a new bitmap is uploaded, so an exhausted update leaves the
//! empty artifact behind, and the same request is not rasterized again until the backend has
//! fewer live bitmaps or the request changes.

use std::path::Path;
use std::sync::Arc;

use crate::artifact::{CachedArtifact, build_artifact, empty_artifact};
use crate::backend::GraphicsBackend;
use crate::cache::fingerprint::{
    InputIssue, RenderFingerprint, UpdateKind, classify, validate_input,
};
use crate::foundation::core::TimelinePos;
use crate::foundation::error::{PdfShapeError, PdfShapeResult};
use crate::params::{PdfShapeOpts, PdfShapeParams};
use crate::raster::{PdfRasterizer, RasterOutcome, ResolutionSpec, rasterize_page, upload_page};
use crate::resources::ResourceKind;
use crate::sample::{RenderRequest, sample_request};

/// Stable states of a source between update calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceState {
    /// The output is the empty artifact.
    Empty {
        /// Fingerprint whose rasterization failed, kept so the same request is not retried.
        failed: Option<RenderFingerprint>,
    },
    /// The output shows the page described by `fingerprint`.
    Ready {
        /// What the current bitmap and transform were built from.
        fingerprint: RenderFingerprint,
    },
}

impl SourceState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    fn ready_fingerprint(&self) -> Option<&RenderFingerprint> {
        match self {
            Self::Ready { fingerprint } => Some(fingerprint),
            Self::Empty { .. } => None,
        }
    }
}

/// Why an update left the layer empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    /// File or page cannot be used.
    Input(InputIssue),
    /// The rasterizer produced no content.
    Rasterization,
    /// The backend refused the bitmap for this request earlier.
    ResourceExhausted,
}

/// What one update call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The previous artifact was reused untouched.
    NoOp,
    /// Only the artifact transform changed.
    TransformOnly,
    /// The page was rasterized and a new artifact installed.
    Rendered,
    /// The output is the empty artifact.
    Empty(EmptyReason),
}

/// Work counters, mainly for tests and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Rasterizer invocations.
    pub rasterizations: u64,
    /// Transform-only updates.
    pub transform_updates: u64,
    /// Updates that did no work.
    pub noops: u64,
    /// Times a shown page was replaced by the empty artifact.
    pub empty_transitions: u64,
}

/// Render cache and rasterization controller for one PDF page layer.
pub struct PdfShapeSource<B: GraphicsBackend> {
    params: PdfShapeParams,
    opts: PdfShapeOpts,
    rasterizer: Arc<dyn PdfRasterizer>,
    state: SourceState,
    artifact: CachedArtifact<B>,
    next_generation: u64,
    exhausted: Option<Exhausted>,
    stats: SourceStats,
}

/// A request the backend could not hold, with the live bitmap count at that moment.
struct Exhausted {
    fingerprint: RenderFingerprint,
    live_bitmaps: u64,
}

impl<B: GraphicsBackend> PdfShapeSource<B> {
    /// Create a source showing the empty artifact.
    pub fn new(
        backend: &mut B,
        params: PdfShapeParams,
        rasterizer: Arc<dyn PdfRasterizer>,
        opts: PdfShapeOpts,
    ) -> PdfShapeResult<Self> {
        params.validate()?;
        let artifact = empty_artifact(backend, 0)?;
        Ok(Self {
            params,
            opts,
            rasterizer,
            state: SourceState::Empty { failed: None },
            artifact,
            next_generation: 1,
            exhausted: None,
            stats: SourceStats::default(),
        })
    }

    /// Sample the layer at `pos` and bring the output up to date.
    #[tracing::instrument(skip(self, backend), fields(frame = pos.frame.0))]
    pub fn update(&mut self, backend: &mut B, pos: TimelinePos) -> PdfShapeResult<UpdateOutcome> {
        let request = sample_request(&self.params, pos);
        self.update_with_request(backend, request)
    }

    /// Bring the output up to date for an already sampled request.
    pub fn update_with_request(
        &mut self,
        backend: &mut B,
        request: RenderRequest,
    ) -> PdfShapeResult<UpdateOutcome> {
        let request = request.normalized();
        let stamp = match validate_input(&request) {
            Ok(stamp) => stamp,
            Err(issue) => {
                tracing::debug!(?issue, path = %request.file_path, "pdf layer input unusable");
                self.enter_empty(backend, None)?;
                return Ok(UpdateOutcome::Empty(EmptyReason::Input(issue)));
            }
        };
        let next = RenderFingerprint::new(&request, stamp);

        if let Some(exhausted) = &self.exhausted
            && exhausted.fingerprint == next
            && live_bitmaps(backend) >= exhausted.live_bitmaps
        {
            self.stats.noops += 1;
            return Ok(UpdateOutcome::Empty(EmptyReason::ResourceExhausted));
        }
        self.exhausted = None;

        if let SourceState::Empty {
            failed: Some(failed),
        } = &self.state
            && *failed == next
        {
            self.stats.noops += 1;
            return Ok(UpdateOutcome::Empty(EmptyReason::Rasterization));
        }

        let kind = classify(self.state.ready_fingerprint(), &next);
        tracing::debug!(?kind, page = next.page(), "classified pdf layer update");
        match kind {
            UpdateKind::NoOp => {
                self.stats.noops += 1;
                Ok(UpdateOutcome::NoOp)
            }
            UpdateKind::TransformOnly => {
                self.artifact.set_transform(request.display_transform());
                self.state = SourceState::Ready { fingerprint: next };
                self.stats.transform_updates += 1;
                Ok(UpdateOutcome::TransformOnly)
            }
            UpdateKind::FullRender => self.render(backend, &request, next),
        }
    }

    fn render(
        &mut self,
        backend: &mut B,
        request: &RenderRequest,
        next: RenderFingerprint,
    ) -> PdfShapeResult<UpdateOutcome> {
        let spec = ResolutionSpec {
            scale: request.raster_scale(),
            max_dim: self.opts.max_raster_dim,
        };
        self.stats.rasterizations += 1;
        let outcome = rasterize_page(
            self.rasterizer.as_ref(),
            Path::new(&request.file_path),
            request.page,
            spec,
        );
        let buffer = match outcome {
            RasterOutcome::Content(buffer) => buffer,
            RasterOutcome::NoContent(_) => {
                self.enter_empty(backend, Some(next))?;
                return Ok(UpdateOutcome::Empty(EmptyReason::Rasterization));
            }
        };

        self.release_page(backend)?;
        let built = upload_page(backend, buffer).and_then(|bitmap| {
            build_artifact(
                backend,
                Some(bitmap),
                request.display_transform(),
                self.next_generation,
            )
        });
        let artifact = match built {
            Ok(artifact) => artifact,
            Err(err) => {
                if let PdfShapeError::ResourceExhausted(_) = &err {
                    tracing::warn!(error = %err, page = next.page(), "pdf layer bitmap refused");
                    self.exhausted = Some(Exhausted {
                        fingerprint: next,
                        live_bitmaps: live_bitmaps(backend),
                    });
                }
                return Err(err);
            }
        };
        self.install(artifact);
        self.state = SourceState::Ready { fingerprint: next };
        Ok(UpdateOutcome::Rendered)
    }

    /// Swap a shown page for the empty artifact so its bitmap is free before the next upload.
    fn release_page(&mut self, backend: &mut B) -> PdfShapeResult<()> {
        if self.artifact.is_empty() {
            return Ok(());
        }
        let empty = empty_artifact(backend, self.next_generation)?;
        self.install(empty);
        self.state = SourceState::Empty { failed: None };
        Ok(())
    }

    fn enter_empty(
        &mut self,
        backend: &mut B,
        failed: Option<RenderFingerprint>,
    ) -> PdfShapeResult<()> {
        if self.state.is_ready() {
            let empty = empty_artifact(backend, self.next_generation)?;
            self.install(empty);
            self.stats.empty_transitions += 1;
        }
        self.state = SourceState::Empty { failed };
        Ok(())
    }

    fn install(&mut self, artifact: CachedArtifact<B>) {
        let old = std::mem::replace(&mut self.artifact, artifact);
        drop(old);
        self.next_generation += 1;
    }

    /// The artifact the compositor should draw.
    pub fn output(&self) -> &CachedArtifact<B> {
        &self.artifact
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    pub fn params(&self) -> &PdfShapeParams {
        &self.params
    }

    /// Mutable parameters. Changes take effect on the next update.
    pub fn params_mut(&mut self) -> &mut PdfShapeParams {
        &mut self.params
    }

    /// Tear the source down, releasing every resource it owns.
    pub fn dispose(self) {
        tracing::debug!(stats = ?self.stats, "disposing pdf layer");
        drop(self);
    }
}

fn live_bitmaps<B: GraphicsBackend>(backend: &B) -> u64 {
    backend.tracker().stats().live(ResourceKind::Bitmap)
}

#[cfg(test)]
#[path = "../tests/unit/source.rs"]
mod tests;
