use std::path::{Path, PathBuf};

use crate::{
    config::SegmentationConfig,
    error::CloakError,
    output::{FrameDisplay, FrameSink},
    pipeline::{
        FrameSource, FrameStream, Segmenter, capture_background, composite, mirror_horizontal,
    },
    types::Background,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    CapturingBackground,
    Streaming,
    Terminated,
}

impl SessionState {
    fn advance(&mut self, next: SessionState) {
        log::debug!("session {self:?} -> {next:?}");
        *self = next;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    StopRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub reason: StopReason,
}

/// One run of the effect: owns the source, both sinks and the background.
///
/// [`CloakSession::run`] consumes the session. The recorder is finished on
/// every exit from it, and the source and display are released when it
/// returns.
pub struct CloakSession<S, R, D> {
    source: S,
    recorder: R,
    display: D,
    segmenter: Segmenter,
    background_frames: usize,
    max_read_retries: u32,
    background_snapshot: Option<PathBuf>,
    background: Option<Background>,
    state: SessionState,
}

impl<S, R, D> CloakSession<S, R, D>
where
    S: FrameSource,
    R: FrameSink,
    D: FrameDisplay,
{
    pub fn new(
        source: S,
        recorder: R,
        display: D,
        settings: &SegmentationConfig,
        max_read_retries: u32,
    ) -> Self {
        Self {
            source,
            recorder,
            display,
            segmenter: Segmenter::new(settings.color_ranges.clone(), settings.kernel_size),
            background_frames: settings.background_frames,
            max_read_retries,
            background_snapshot: None,
            background: None,
            state: SessionState::Initializing,
        }
    }

    /// Writes the background plate to `path` as soon as it is captured.
    pub fn with_background_snapshot(mut self, path: Option<PathBuf>) -> Self {
        self.background_snapshot = path;
        self
    }

    pub fn run(mut self) -> Result<SessionSummary, CloakError> {
        let result = self.stream();
        self.state.advance(SessionState::Terminated);

        let finished = self.recorder.finish();
        match (result, finished) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Err(err), finished) => {
                if let Err(close_err) = finished {
                    log::error!("also failed to close the recording: {close_err}");
                }
                Err(err)
            }
            (Ok(_), Err(err)) => Err(err),
        }
    }

    fn stream(&mut self) -> Result<SessionSummary, CloakError> {
        self.state.advance(SessionState::CapturingBackground);
        // One stream for the whole run: once it ends, nothing reads the
        // source again.
        let mut frames = FrameStream::new(&mut self.source, self.max_read_retries);
        let background = capture_background(&mut frames, self.background_frames)?;
        if let Some(path) = &self.background_snapshot {
            save_snapshot(path, &background);
        }
        let background = self.background.insert(background);

        self.state.advance(SessionState::Streaming);
        let mut count = 0u64;
        for frame in frames.map(mirror_horizontal) {
            let mask = self.segmenter.segment(&frame);
            let output = composite(&frame, background, &mask)?;
            self.recorder.write_frame(&output)?;
            self.display.present(&output)?;
            count += 1;
            log::trace!("frame {count}: {} cloaked pixels", mask.count());

            if self.display.stop_requested() {
                log::info!("stop requested after {count} frames");
                return Ok(SessionSummary {
                    frames: count,
                    reason: StopReason::StopRequested,
                });
            }
        }

        log::info!("source exhausted after {count} frames");
        Ok(SessionSummary {
            frames: count,
            reason: StopReason::SourceExhausted,
        })
    }
}

fn save_snapshot(path: &Path, background: &Background) {
    let Some(image) = background.frame().to_image() else {
        log::warn!("background buffer does not match its dimensions, not saving");
        return;
    };
    match image.save(path) {
        Ok(()) => log::info!("saved background to {}", path.display()),
        Err(err) => log::warn!("failed to save background to {}: {err}", path.display()),
    }
}
