pub mod recorder;
pub mod window;

use crate::{error::CloakError, types::Frame};

pub use recorder::VideoRecorder;
pub use window::WindowDisplay;

/// Persistent destination for composited frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), CloakError>;

    /// Flushes and closes the destination. Calling it twice is a no-op.
    fn finish(&mut self) -> Result<(), CloakError>;
}

/// Interactive preview that also carries the user's stop signal.
pub trait FrameDisplay {
    fn present(&mut self, frame: &Frame) -> Result<(), CloakError>;

    fn stop_requested(&self) -> bool;
}

impl<R: FrameSink + ?Sized> FrameSink for &mut R {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), CloakError> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<(), CloakError> {
        (**self).finish()
    }
}

impl<D: FrameDisplay + ?Sized> FrameDisplay for &mut D {
    fn present(&mut self, frame: &Frame) -> Result<(), CloakError> {
        (**self).present(frame)
    }

    fn stop_requested(&self) -> bool {
        (**self).stop_requested()
    }
}
