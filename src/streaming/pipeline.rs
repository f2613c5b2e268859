//! Canonical stream pipeline
//!
//! Glues frames, payload parsing and the normalizer into one lazy `ChatStream`.
//! Nothing is read from the transport until the caller polls the stream.

use futures::{Stream, StreamExt};
use tokio::io::AsyncBufRead;

use crate::error::LlmError;
use crate::standards::ProviderFamily;
use crate::streaming::{
    ChatStream, FrameReader, NormalizerConfig, StreamNormalizer, frames_from_byte_stream,
};
use crate::utils::cancel::CancelHandle;

/// Normalize a stream of raw frame payloads.
///
/// - A payload that is not valid JSON is skipped with a warning.
/// - If every payload failed to parse, the stream ends with `LlmError::MalformedFramePayload`.
/// - A transport error (or cancellation) is yielded as-is and ends the stream without a flush.
/// - Otherwise the normalizer is flushed when the frames run out.
pub fn normalize_frames<S>(frames: S, normalizer: StreamNormalizer) -> ChatStream
where
    S: Stream<Item = Result<String, LlmError>> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut normalizer = normalizer;
        let mut frames = Box::pin(frames);
        let mut parsed = 0usize;
        let mut malformed = 0usize;
        let mut last_parse_error: Option<String> = None;

        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(error = %e, "frame stream failed");
                    yield Err(e);
                    return;
                }
            };

            let payload = match serde_json::from_str::<serde_json::Value>(&frame) {
                Ok(payload) => payload,
                Err(e) => {
                    malformed += 1;
                    tracing::warn!(error = %e, frame = %frame, "skipping malformed frame payload");
                    last_parse_error = Some(e.to_string());
                    continue;
                }
            };
            parsed += 1;

            for part in normalizer.normalize(&payload) {
                yield Ok(part);
            }
            if normalizer.is_terminated() {
                tracing::debug!(parsed, malformed, "canonical feed terminated");
                return;
            }
        }

        if parsed == 0 && malformed > 0 {
            yield Err(LlmError::MalformedFramePayload(format!(
                "all {malformed} frame payloads failed to parse: {}",
                last_parse_error.unwrap_or_default()
            )));
            return;
        }

        for part in normalizer.finish() {
            yield Ok(part);
        }
        tracing::debug!(parsed, malformed, "canonical feed ended");
    };
    Box::pin(stream)
}

/// Canonical feed over a buffered reader of SSE text.
pub fn stream_from_reader<R>(
    reader: R,
    family: ProviderFamily,
    config: NormalizerConfig,
    cancel: CancelHandle,
) -> ChatStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let frames =
        FrameReader::with_protocol(reader, family.frame_protocol()).into_stream(cancel);
    normalize_frames(frames, StreamNormalizer::with_config(family, config))
}

/// Canonical feed over a byte-chunk stream such as `reqwest::Response::bytes_stream()`.
pub fn stream_from_byte_stream<S, B, E>(
    byte_stream: S,
    family: ProviderFamily,
    config: NormalizerConfig,
    cancel: CancelHandle,
) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: bytes::Buf + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let frames = frames_from_byte_stream(byte_stream, family.frame_protocol(), cancel);
    normalize_frames(frames, StreamNormalizer::with_config(family, config))
}
