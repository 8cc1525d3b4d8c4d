use crate::error::{Result, StreamError};
use crate::frame::RawFrame;
use crate::source::VideoSource;

/// Deterministic bounded source for tests and demos.
///
/// Emits `frames` gradient images (dark rows at the top, bright at the
/// bottom, red channel shifting per frame) at the source's native size, then
/// reports end of stream. Opened through `synthetic:<n>` URIs; an optional
/// `<n>x<w>x<h>` form overrides the native size.
pub struct SyntheticSource {
    remaining: u64,
    width: u32,
    height: u32,
    counter: u64,
}

impl SyntheticSource {
    pub fn new(frames: u64, width: u32, height: u32) -> Self {
        Self {
            remaining: frames,
            width,
            height,
            counter: 0,
        }
    }

    /// Parse the part after `synthetic:`, e.g. `10` or `10x64x48`.
    pub fn parse(spec: &str, default_size: (u32, u32)) -> Result<Self> {
        let mut fields = spec.split('x');
        let frames = fields
            .next()
            .unwrap_or("")
            .parse::<u64>()
            .map_err(|_| StreamError::Config(format!("bad synthetic source spec: {}", spec)))?;
        let (width, height) = match (fields.next(), fields.next()) {
            (Some(w), Some(h)) => (
                w.parse()
                    .map_err(|_| StreamError::Config(format!("bad synthetic source spec: {}", spec)))?,
                h.parse()
                    .map_err(|_| StreamError::Config(format!("bad synthetic source spec: {}", spec)))?,
            ),
            _ => default_size,
        };
        Ok(Self::new(frames, width, height))
    }
}

impl VideoSource for SyntheticSource {
    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        let shade = (self.counter % 256) as u8;
        for y in 0..self.height {
            let level = (y * 255 / self.height.max(1)) as u8;
            for _ in 0..self.width {
                data.extend_from_slice(&[shade, level, level]);
            }
        }
        self.counter += 1;

        Ok(Some(RawFrame {
            data,
            width: self.width,
            height: self.height,
        }))
    }
}
