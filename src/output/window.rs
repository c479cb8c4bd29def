use minifb::{Key, Window, WindowOptions};
use rayon::prelude::*;

use super::FrameDisplay;
use crate::{
    error::CloakError,
    types::{CHANNELS, Frame},
};

/// Packs RGB bytes into the 0RGB words minifb draws from.
fn pack_rgb(rgb: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.par_extend(
        rgb.par_chunks_exact(CHANNELS)
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | (p[2] as u32)),
    );
}

/// Preview window. Escape or closing the window asks the session to stop.
pub struct WindowDisplay {
    window: Window,
    buffer: Vec<u32>,
}

impl WindowDisplay {
    pub fn open(title: &str, width: u32, height: u32, frame_rate: f64) -> Result<Self, CloakError> {
        let mut window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|err| CloakError::SinkUnavailable(format!("failed to open window: {err}")))?;

        window.set_target_fps(frame_rate.round().max(1.0) as usize);

        Ok(Self {
            window,
            buffer: Vec::with_capacity(width as usize * height as usize),
        })
    }
}

impl FrameDisplay for WindowDisplay {
    fn present(&mut self, frame: &Frame) -> Result<(), CloakError> {
        pack_rgb(&frame.rgb, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, frame.width as usize, frame.height as usize)
            .map_err(|err| CloakError::SinkUnavailable(format!("window update failed: {err}")))
    }

    fn stop_requested(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Escape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_channels_into_words() {
        let mut out = vec![7; 10];
        pack_rgb(&[0x12, 0x34, 0x56, 255, 0, 1], &mut out);
        assert_eq!(out, vec![0x0012_3456, 0x00ff_0001]);
    }
}
