use crate::error::Result;
use crate::frame::RawFrame;

mod ffmpeg;
mod synthetic;

pub use ffmpeg::FfmpegSource;
pub use synthetic::SyntheticSource;

/// An open decoding session against a camera stream or a video file.
///
/// Strictly produce-one-consume-one: callers pull a frame, hand it off, then
/// pull the next. `Ok(None)` means the source ended (file EOF, device
/// stopped); an `Err` is a decode failure. Either way the handle is done and
/// should be dropped.
pub trait VideoSource: Send {
    fn read_frame(&mut self) -> Result<Option<RawFrame>>;
}

/// Factory for video sources, injected into the HTTP layer so tests can
/// substitute synthetic sources for real decoders.
pub trait SourceOpener: Send + Sync {
    fn open(&self, uri: &str) -> Result<Box<dyn VideoSource>>;
}

/// Production opener: `synthetic:<n>` URIs get a bounded test pattern,
/// everything else goes through ffmpeg.
pub struct DefaultOpener {
    target: (u32, u32),
}

impl DefaultOpener {
    pub fn new(target: (u32, u32)) -> Self {
        Self { target }
    }
}

impl SourceOpener for DefaultOpener {
    fn open(&self, uri: &str) -> Result<Box<dyn VideoSource>> {
        if let Some(spec) = uri.strip_prefix("synthetic:") {
            return Ok(Box::new(SyntheticSource::parse(spec, self.target)?));
        }
        Ok(Box::new(FfmpegSource::open(uri, self.target)?))
    }
}
