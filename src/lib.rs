//! HTTP server that exposes a camera or video file as an MJPEG multipart stream.

pub mod config;
pub mod error;
pub mod frame;
pub mod http_server;
pub mod mjpeg;
pub mod source;
