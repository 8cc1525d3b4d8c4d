use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Result, StreamError};
use crate::frame::RawFrame;
use crate::source::VideoSource;

/// Video source backed by an ffmpeg child process.
///
/// ffmpeg handles demux/decode and scales to the target resolution; we read
/// raw RGB24 frames off its stdout. One process per open handle, killed on
/// drop so a disconnecting client releases the device promptly.
pub struct FfmpegSource {
    child: Child,
    stdout: ChildStdout,
    frame_len: usize,
    width: u32,
    height: u32,
    uri: String,
}

impl FfmpegSource {
    pub fn open(uri: &str, target: (u32, u32)) -> Result<Self> {
        // Local paths can be checked before paying for a process spawn.
        if !uri.contains("://") && !Path::new(uri).exists() {
            return Err(StreamError::SourceUnavailable {
                uri: uri.to_string(),
            });
        }

        let (width, height) = target;
        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(uri)
            .arg("-vf")
            .arg(format!("scale={}:{}", width, height))
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-f")
            .arg("rawvideo")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                warn!("failed to spawn ffmpeg for {}: {}", uri, err);
                StreamError::SourceUnavailable {
                    uri: uri.to_string(),
                }
            })?;

        let stdout = child.stdout.take().ok_or_else(|| StreamError::SourceUnavailable {
            uri: uri.to_string(),
        })?;

        debug!("opened ffmpeg source for {}", uri);
        Ok(Self {
            child,
            stdout,
            frame_len: (width as usize) * (height as usize) * 3,
            width,
            height,
            uri: uri.to_string(),
        })
    }
}

impl VideoSource for FfmpegSource {
    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        let mut data = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut data) {
            Ok(()) => Ok(Some(RawFrame {
                data,
                width: self.width,
                height: self.height,
            })),
            // EOF mid-frame or at a frame boundary both end the stream; a
            // partial frame is never surfaced.
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("ffmpeg source {} reached end of stream", self.uri);
                Ok(None)
            }
            Err(err) => Err(StreamError::FrameRead(format!(
                "reading from ffmpeg for {}: {}",
                self.uri, err
            ))),
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        debug!("released ffmpeg source for {}", self.uri);
    }
}
