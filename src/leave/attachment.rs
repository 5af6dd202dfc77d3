//! Image attachments on leave requests.
//!
//! The attachment travels as a data URL inside the submission body, so
//! reading the body is the attachment read. That read is bounded by
//! [`read_attachment`]; a client that stops sending gets
//! [`AttachmentError::TimedOut`] and nothing is stored.

use std::future::Future;
use std::time::Duration;

use actix_web::error::PayloadError;
use actix_web::web::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use thiserror::Error;

const DATA_URL_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";
/// Room for the form fields next to the encoded image.
const FORM_OVERHEAD: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachment was not read within {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("request body could not be read: {0}")]
    Body(String),

    #[error("attachment must be a base64 image data URL")]
    NotAnImage,

    #[error("attachment is {size} bytes, the limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Supporting image stored alongside a leave request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    data_url: String,
}

impl Attachment {
    pub fn from_data_url(data_url: String, max_bytes: usize) -> Result<Self, AttachmentError> {
        let rest = data_url
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or(AttachmentError::NotAnImage)?;
        let (subtype, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or(AttachmentError::NotAnImage)?;

        let subtype_ok = !subtype.is_empty()
            && subtype
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"+.-".contains(&b));
        if !subtype_ok {
            return Err(AttachmentError::NotAnImage);
        }
        if !payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
        {
            return Err(AttachmentError::NotAnImage);
        }

        let size = payload.len() / 4 * 3;
        if size > max_bytes {
            return Err(AttachmentError::TooLarge {
                size,
                limit: max_bytes,
            });
        }

        Ok(Self { data_url })
    }

    pub fn into_data_url(self) -> String {
        self.data_url
    }
}

/// Largest submission body accepted for an image of `max_attachment_bytes`.
pub fn body_limit(max_attachment_bytes: usize) -> usize {
    max_attachment_bytes.div_ceil(3) * 4 + FORM_OVERHEAD
}

/// Collects a request body, refusing it once it grows past `limit`.
pub async fn read_body<S>(mut body: S, limit: usize) -> Result<Bytes, AttachmentError>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| AttachmentError::Body(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(AttachmentError::TooLarge {
                size: buf.len() + chunk.len(),
                limit,
            });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// Waits for an attachment read, giving up after `timeout`.
///
/// Submission continues only once this resolves; a read that never
/// finishes surfaces as [`AttachmentError::TimedOut`].
pub async fn read_attachment<T, F>(read: F, timeout: Duration) -> Result<T, AttachmentError>
where
    F: Future<Output = Result<T, AttachmentError>>,
{
    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result,
        Err(_) => Err(AttachmentError::TimedOut(timeout)),
    }
}
