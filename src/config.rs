use clap::Parser;
use std::path::PathBuf;

/// Server configuration, parsed from the command line.
#[derive(Parser, Debug, Clone)]
#[command(name = "camstream", about = "MJPEG streaming server for cameras and video files")]
pub struct Config {
    /// Address to bind the HTTP listener to
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to bind the HTTP listener to
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Live video source: a camera stream URL, a device/file path, or
    /// `synthetic:<n>` for a bounded test pattern
    #[arg(long)]
    pub source: String,

    /// Directory scanned for .mp4 files served under /videos
    #[arg(long, default_value = "./videos")]
    pub videos_dir: PathBuf,

    /// Output frame width
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Output frame height
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    /// Flip live frames vertically
    #[arg(long, default_value_t = false)]
    pub flip: bool,
}

impl Config {
    pub fn target_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn video_path(&self, name: &str) -> PathBuf {
        self.videos_dir.join(name)
    }
}
