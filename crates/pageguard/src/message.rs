//! Extension message protocol and native-messaging framing.
//!
//! The content script sends `{"action": "analyze", "text": ...}` and
//! expects `{"isHarmful": bool}` back. Over a native-messaging channel
//! each JSON message is preceded by its length as a 32-bit unsigned
//! integer in native byte order.

use crate::analyzer::ContentAnalyzer;
use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Largest message accepted from the browser.
pub const MAX_INBOUND_BYTES: usize = 64 * 1024 * 1024;

/// Largest message the browser accepts from a host.
pub const MAX_OUTBOUND_BYTES: usize = 1024 * 1024;

/// A message from the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Request {
    Analyze { text: String },
    /// Any action this host does not understand.
    #[serde(other)]
    Unsupported,
}

/// Reply to an `analyze` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub is_harmful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<String>,
}

/// Answer a request. Unsupported actions get no reply.
pub fn handle(request: &Request, analyzer: &dyn ContentAnalyzer) -> Option<Response> {
    match request {
        Request::Analyze { text } => {
            let verdict = analyzer.analyze(text);
            Some(Response {
                is_harmful: verdict.is_harmful,
                score: Some(verdict.score),
                matched: verdict.matched,
            })
        }
        Request::Unsupported => {
            debug!("ignoring unsupported action");
            None
        }
    }
}

/// Read one framed message body.
///
/// Returns `None` only on EOF before the first byte of a length prefix. A
/// prefix or body cut short by EOF is an error.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    if reader.read(&mut len_buf[..1]).await? == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut len_buf[1..]).await?;
    let len = u32::from_ne_bytes(len_buf) as usize;
    if len > MAX_INBOUND_BYTES {
        return Err(GuardError::MessageTooLarge {
            size: len,
            limit: MAX_INBOUND_BYTES,
        });
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Write one framed message body and flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, body: &[u8]) -> Result<()> {
    if body.len() > MAX_OUTBOUND_BYTES {
        return Err(GuardError::MessageTooLarge {
            size: body.len(),
            limit: MAX_OUTBOUND_BYTES,
        });
    }
    writer.write_all(&(body.len() as u32).to_ne_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Serialize `value` as JSON and write it as one frame.
pub async fn write_message<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(value)?;
    write_frame(writer, &body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordFilter;

    #[test]
    fn test_request_decoding() {
        let req: Request = serde_json::from_str(r#"{"action":"analyze","text":"hi"}"#).unwrap();
        assert_eq!(
            req,
            Request::Analyze {
                text: "hi".into()
            }
        );

        let req: Request = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
        assert_eq!(req, Request::Unsupported);

        assert!(serde_json::from_str::<Request>(r#"{"action":"analyze"}"#).is_err());
    }

    #[test]
    fn test_response_shape() {
        let resp = Response {
            is_harmful: true,
            score: None,
            matched: Vec::new(),
        };
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json, serde_json::json!({ "isHarmful": true }));
    }

    #[test]
    fn test_handle_analyze() {
        let filter = KeywordFilter::default();
        let resp = handle(
            &Request::Analyze {
                text: "Plan an ATTACK".into(),
            },
            &filter,
        )
        .unwrap();
        assert!(resp.is_harmful);
        assert_eq!(resp.matched, vec!["attack"]);

        assert!(handle(&Request::Unsupported, &filter).is_none());
    }

    #[tokio::test]
    async fn test_frame_exchange() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_message(&mut client, &serde_json::json!({"action": "analyze", "text": "x"}))
            .await
            .unwrap();
        drop(client);

        let body = read_frame(&mut server).await.unwrap().unwrap();
        let req: Request = serde_json::from_slice(&body).unwrap();
        assert_eq!(req, Request::Analyze { text: "x".into() });
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_truncated_length_prefix_is_error() {
        let mut input: &[u8] = &[5, 0];
        let err = read_frame(&mut input).await.unwrap_err();
        assert!(matches!(err, GuardError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_truncated_body_is_error() {
        let mut framed = 10u32.to_ne_bytes().to_vec();
        framed.extend_from_slice(b"{\"a\"");
        let mut input: &[u8] = &framed;
        assert!(matches!(
            read_frame(&mut input).await,
            Err(GuardError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_stream_is_clean_eof() {
        let mut input: &[u8] = &[];
        assert!(read_frame(&mut input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(&((MAX_INBOUND_BYTES as u32) + 1).to_ne_bytes())
            .await
            .unwrap();
        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, GuardError::MessageTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_outbound_limit() {
        let (mut client, _server) = tokio::io::duplex(64);
        let big = vec![b'a'; MAX_OUTBOUND_BYTES + 1];
        assert!(write_frame(&mut client, &big).await.is_err());
    }
}
