use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use hyper::Body;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tracing::{debug, error, info, warn};
use warp::http::{header, Response, StatusCode, Uri};
use warp::Filter;

use crate::config::Config;
use crate::error::{Result, StreamError};
use crate::frame;
use crate::mjpeg;
use crate::source::{SourceOpener, VideoSource};

/// Frames buffered between the decode loop and the client socket. Small on
/// purpose: a slow client blocks the sender, which throttles decoding.
const STREAM_CHANNEL_CAPACITY: usize = 2;

pub struct HttpServer {
    config: Config,
    opener: Arc<dyn SourceOpener>,
}

impl HttpServer {
    pub fn new(config: Config, opener: Arc<dyn SourceOpener>) -> Self {
        Self { config, opener }
    }

    /// Bind the listener and serve until the process is killed. Bind
    /// failures are returned to the caller and are process-fatal.
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind, self.config.port)
            .parse()
            .map_err(|err| {
                StreamError::Config(format!(
                    "invalid bind address {}:{}: {}",
                    self.config.bind, self.config.port, err
                ))
            })?;
        let listener = TcpListener::bind(addr).await?;
        info!("HTTP server listening on {}", addr);

        let routes = routes(self.config.clone(), self.opener.clone());
        warp::serve(routes)
            .run_incoming(TcpListenerStream::new(listener))
            .await;

        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    config: Config,
    opener: Arc<dyn SourceOpener>,
}

#[derive(Debug, Deserialize)]
struct VideoQuery {
    video: Option<String>,
}

/// Build the route tree. Split out from [`HttpServer`] so tests can drive it
/// through `warp::test` without binding a socket.
pub fn routes(
    config: Config,
    opener: Arc<dyn SourceOpener>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let state = AppState { config, opener };
    let with_state = {
        let state = state.clone();
        warp::any().map(move || state.clone())
    };

    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::redirect(Uri::from_static("/videos")));

    let live = warp::path("live")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state.clone())
        .and_then(live_handler);

    let videos = warp::path("videos")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<VideoQuery>())
        .and(with_state)
        .and_then(videos_handler);

    index.or(live).or(videos)
}

async fn live_handler(state: AppState) -> std::result::Result<Response<Body>, warp::Rejection> {
    let uri = state.config.source.clone();
    info!("live stream requested for {}", uri);
    Ok(stream_response(&state, &uri, state.config.flip))
}

async fn videos_handler(
    query: VideoQuery,
    state: AppState,
) -> std::result::Result<Response<Body>, warp::Rejection> {
    let Some(name) = query.video else {
        return Ok(listing_response(&state).await);
    };

    if let Err(err) = validate_video_name(&name) {
        warn!("rejected video request: {}", err);
        return Ok(text_response(StatusCode::BAD_REQUEST, err.to_string()));
    }

    let path = state.config.video_path(&name);
    info!("file stream requested for {}", path.display());
    // Recorded files are served as captured; only the live camera is flipped.
    Ok(stream_response(&state, &path.to_string_lossy(), false))
}

/// Open the source and turn it into an unbounded multipart response.
///
/// The 200 and the multipart headers go out before the first frame exists;
/// open failures are the only thing reported as a status code. After that
/// the stream just ends when the source does or the client goes away.
fn stream_response(state: &AppState, uri: &str, flip: bool) -> Response<Body> {
    let source = match state.opener.open(uri) {
        Ok(source) => source,
        Err(err) => {
            warn!("cannot open video source {}: {}", uri, err);
            return text_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("video source unavailable: {}", uri),
            );
        }
    };

    let rx = spawn_frame_pump(source, state.config.target_size(), flip, uri.to_string());
    let body = Body::wrap_stream(ReceiverStream::new(rx).map(Ok::<Bytes, Infallible>));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mjpeg::CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .expect("static response headers")
}

/// Decode loop, one per streaming request. Runs on the blocking pool; the
/// bounded channel is the only coupling to the connection.
fn spawn_frame_pump(
    mut source: Box<dyn VideoSource>,
    target: (u32, u32),
    flip: bool,
    uri: String,
) -> mpsc::Receiver<Bytes> {
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || {
        let mut sent = 0u64;
        loop {
            let raw = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("source {} ended after {} frames", uri, sent);
                    break;
                }
                Err(err) => {
                    warn!("stopping stream for {}: {}", uri, err);
                    break;
                }
            };

            let jpeg = match frame::encode_frame(raw, target, flip) {
                Ok(jpeg) => jpeg,
                Err(err) => {
                    error!("frame encode failed for {}: {}", uri, err);
                    break;
                }
            };

            if tx.blocking_send(mjpeg::encode_part(&jpeg)).is_err() {
                debug!("client disconnected from {} after {} frames", uri, sent);
                break;
            }
            sent += 1;
        }
        // Dropping the source here closes the decoder handle.
    });

    rx
}

async fn listing_response(state: &AppState) -> Response<Body> {
    match list_videos(state).await {
        Ok(names) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Body::from(render_listing(&names)))
            .expect("static response headers"),
        Err(err) => {
            error!(
                "failed to list {}: {}",
                state.config.videos_dir.display(),
                err
            );
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "cannot read videos directory".to_string(),
            )
        }
    }
}

async fn list_videos(state: &AppState) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(&state.config.videos_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".mp4") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn render_listing(names: &[String]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Videos</title></head>\n<body>\n<h1>Videos</h1>\n<ul>\n",
    );
    for name in names {
        html.push_str(&format!(
            "<li><a href=\"/videos?video={name}\">{name}</a></li>\n"
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

fn validate_video_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || !name.ends_with(".mp4")
    {
        return Err(StreamError::InvalidVideoName(name.to_string()));
    }
    Ok(())
}

fn text_response(status: StatusCode, message: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(message))
        .expect("static response headers")
}
