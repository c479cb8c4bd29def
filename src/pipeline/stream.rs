use super::FrameSource;
use crate::types::Frame;

/// Lazy view over a [`FrameSource`] as an iterator of raw frames.
///
/// The sequence ends for good once the source is closed, reports exhaustion,
/// or fails more than `max_retries` reads in a row.
pub struct FrameStream<'a, S: FrameSource> {
    source: &'a mut S,
    max_retries: u32,
    finished: bool,
}

impl<'a, S: FrameSource> FrameStream<'a, S> {
    pub fn new(source: &'a mut S, max_retries: u32) -> Self {
        Self {
            source,
            max_retries,
            finished: false,
        }
    }
}

impl<S: FrameSource> Iterator for FrameStream<'_, S> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.finished {
            return None;
        }

        let mut failures = 0u32;
        loop {
            if !self.source.is_open() {
                log::info!("video source closed");
                self.finished = true;
                return None;
            }

            match self.source.read_frame() {
                Ok(Some(frame)) => return Some(frame),
                Ok(None) => {
                    log::info!("video source exhausted");
                    self.finished = true;
                    return None;
                }
                Err(err) => {
                    failures += 1;
                    if failures > self.max_retries {
                        log::warn!(
                            "frame read failed {failures} time(s) in a row, ending stream: {err:?}"
                        );
                        self.finished = true;
                        return None;
                    }
                    log::warn!(
                        "frame read failed (attempt {failures}/{}): {err:?}",
                        self.max_retries
                    );
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use anyhow::anyhow;

    use super::FrameSource;
    use crate::types::Frame;

    pub enum Read {
        Frame(Frame),
        Fail,
    }

    /// Scripted source: replays `reads` then reports exhaustion.
    pub struct ScriptedSource {
        pub reads: VecDeque<Read>,
        pub open: bool,
        pub calls: usize,
    }

    impl ScriptedSource {
        pub fn new(reads: impl IntoIterator<Item = Read>) -> Self {
            Self {
                reads: reads.into_iter().collect(),
                open: true,
                calls: 0,
            }
        }

        pub fn frames(frames: impl IntoIterator<Item = Frame>) -> Self {
            Self::new(frames.into_iter().map(Read::Frame))
        }
    }

    impl FrameSource for ScriptedSource {
        fn is_open(&self) -> bool {
            self.open
        }

        fn read_frame(&mut self) -> anyhow::Result<Option<Frame>> {
            self.calls += 1;
            match self.reads.pop_front() {
                Some(Read::Frame(frame)) => Ok(Some(frame)),
                Some(Read::Fail) => Err(anyhow!("transient read failure")),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Read, ScriptedSource};
    use super::*;

    fn solid(value: u8) -> Frame {
        Frame::filled(2, 2, [value, value, value])
    }

    #[test]
    fn yields_frames_until_exhausted() {
        let mut source = ScriptedSource::frames([solid(1), solid(2)]);
        let frames: Vec<_> = FrameStream::new(&mut source, 0).collect();
        assert_eq!(frames, vec![solid(1), solid(2)]);
    }

    #[test]
    fn stays_finished_after_exhaustion() {
        let mut source = ScriptedSource::frames([solid(1)]);
        let mut stream = FrameStream::new(&mut source, 0);
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        drop(stream);
        assert_eq!(source.calls, 2);
    }

    #[test]
    fn retries_transient_failures_up_to_the_limit() {
        let mut source = ScriptedSource::new([
            Read::Fail,
            Read::Fail,
            Read::Frame(solid(7)),
            Read::Fail,
            Read::Fail,
            Read::Fail,
            Read::Frame(solid(8)),
        ]);
        let frames: Vec<_> = FrameStream::new(&mut source, 2).collect();
        assert_eq!(frames, vec![solid(7)]);
    }

    #[test]
    fn zero_retries_ends_on_first_failure() {
        let mut source = ScriptedSource::new([Read::Fail, Read::Frame(solid(1))]);
        assert_eq!(FrameStream::new(&mut source, 0).count(), 0);
    }

    #[test]
    fn closed_source_yields_nothing() {
        let mut source = ScriptedSource::frames([solid(1)]);
        source.open = false;
        assert_eq!(FrameStream::new(&mut source, 3).count(), 0);
        assert_eq!(source.calls, 0);
    }
}
