//! Serves a local file as an HTTP download, honouring a single `Range`
//! header.

use std::{io::SeekFrom, path::Path};

use axum::{
    body::Body,
    http::{
        header::{ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE},
        StatusCode,
    },
    response::Response,
};
use futures::TryStreamExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::http_objects::GatewayAPIError;

/// Inclusive byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range; send the whole file.
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

/// Resolve a `Range` header value against a file of `size` bytes.
///
/// Only the `bytes=<start>-[<end>]` form is understood. Anything else,
/// including a number that does not parse, falls back to the full file.
pub fn resolve_range(header: Option<&str>, size: u64) -> RangeRequest {
    let Some(spec) = header.and_then(|h| h.strip_prefix("bytes=")) else {
        return RangeRequest::Full;
    };
    let Some((start, end)) = spec.split_once('-') else {
        return RangeRequest::Full;
    };
    let Ok(start) = start.trim().parse::<u64>() else {
        return RangeRequest::Full;
    };
    let end = match end.trim() {
        "" => match size.checked_sub(1) {
            Some(last) => last,
            None => return RangeRequest::Unsatisfiable,
        },
        end => match end.parse::<u64>() {
            Ok(end) => end,
            Err(_) => return RangeRequest::Full,
        },
    };

    if start > end || end >= size {
        return RangeRequest::Unsatisfiable;
    }
    RangeRequest::Partial(ByteRange { start, end })
}

fn content_disposition(file_name: &str) -> String {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("attachment; filename=\"{}\"", escaped)
}

/// Stream the file at `path` to the client as an attachment named
/// `file_name`.
///
/// Responds 200 with the whole file, 206 with the requested slice, or 416
/// when the range lies outside the file.
pub async fn serve_file(
    path: &Path,
    file_name: &str,
    range_header: Option<&str>,
) -> Result<Response<Body>, GatewayAPIError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| GatewayAPIError::internal_error_str(&format!("Failed to read file: {}", e)))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| GatewayAPIError::internal_error_str(&format!("Failed to read file: {}", e)))?
        .len();

    let builder = Response::builder()
        .header(ACCEPT_RANGES, "bytes")
        .header(CONTENT_DISPOSITION, content_disposition(file_name))
        .header(CONTENT_TYPE, "application/octet-stream");

    let response = match resolve_range(range_header, size) {
        RangeRequest::Unsatisfiable => {
            return Err(GatewayAPIError::new(
                StatusCode::RANGE_NOT_SATISFIABLE,
                "Requested range not satisfiable",
            ));
        }
        RangeRequest::Full => {
            info!(file_name, size, "Serving full file");
            let stream = ReaderStream::new(file).inspect_err(|e| {
                error!("Stream error occurred: {}", e);
            });
            builder
                .status(StatusCode::OK)
                .header(CONTENT_LENGTH, size)
                .body(Body::from_stream(stream))
        }
        RangeRequest::Partial(range) => {
            info!(file_name, start = range.start, end = range.end, size, "Serving partial content");
            file.seek(SeekFrom::Start(range.start))
                .await
                .map_err(|e| GatewayAPIError::internal_error_str(&e.to_string()))?;
            let stream = ReaderStream::new(file.take(range.length())).inspect_err(|e| {
                error!("Stream error occurred: {}", e);
            });
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(
                    CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start, range.end, size),
                )
                .header(CONTENT_LENGTH, range.length())
                .body(Body::from_stream(stream))
        }
    };

    response.map_err(|e| GatewayAPIError::internal_error_str(&e.to_string()))
}
