//! Native-messaging host loop.
//!
//! Reads framed `analyze` requests, answers each with a framed verdict, and
//! stops at end of input. Only protocol frames are written to the output.

use pageguard::message::{self, read_frame, write_message, Request};
use pageguard::ContentAnalyzer;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Counters for one host session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub received: u64,
    pub answered: u64,
    pub harmful: u64,
    pub skipped: u64,
}

/// Serve requests from `reader` until EOF.
///
/// Malformed JSON and unsupported actions are logged and skipped. Framing
/// errors end the session, since the stream cannot be resynchronized.
pub async fn serve<R, W>(
    reader: &mut R,
    writer: &mut W,
    analyzer: &dyn ContentAnalyzer,
) -> pageguard::Result<HostStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = HostStats::default();

    while let Some(body) = read_frame(reader).await? {
        stats.received += 1;

        let request: Request = match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed message ({} bytes): {e}", body.len());
                stats.skipped += 1;
                continue;
            }
        };

        match message::handle(&request, analyzer) {
            Some(response) => {
                debug!(harmful = response.is_harmful, "answering analyze request");
                if response.is_harmful {
                    stats.harmful += 1;
                }
                write_message(writer, &response).await?;
                stats.answered += 1;
            }
            None => stats.skipped += 1,
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageguard::message::write_frame;
    use pageguard::{KeywordFilter, Response};

    #[tokio::test]
    async fn test_serve_answers_and_skips() {
        let (mut to_host, mut host_in) = tokio::io::duplex(4096);
        let (mut host_out, mut from_host) = tokio::io::duplex(4096);

        write_frame(&mut to_host, br#"{"action":"analyze","text":"I HATE it"}"#)
            .await
            .unwrap();
        write_frame(&mut to_host, b"not json").await.unwrap();
        write_frame(&mut to_host, br#"{"action":"ping"}"#).await.unwrap();
        write_frame(&mut to_host, br#"{"action":"analyze","text":"all good"}"#)
            .await
            .unwrap();
        drop(to_host);

        let filter = KeywordFilter::default();
        let stats = serve(&mut host_in, &mut host_out, &filter).await.unwrap();
        drop(host_out);

        assert_eq!(
            stats,
            HostStats {
                received: 4,
                answered: 2,
                harmful: 1,
                skipped: 2,
            }
        );

        let first = read_frame(&mut from_host).await.unwrap().unwrap();
        let first: Response = serde_json::from_slice(&first).unwrap();
        assert!(first.is_harmful);
        let second = read_frame(&mut from_host).await.unwrap().unwrap();
        let second: Response = serde_json::from_slice(&second).unwrap();
        assert!(!second.is_harmful);
        assert!(read_frame(&mut from_host).await.unwrap().is_none());
    }

    #[test]
    fn test_empty_input_ends_cleanly() {
        let stats = tokio_test::block_on(async {
            let mut input: &[u8] = &[];
            let mut output = Vec::new();
            serve(&mut input, &mut output, &KeywordFilter::default()).await
        })
        .unwrap();
        assert_eq!(stats, HostStats::default());
    }

    #[tokio::test]
    async fn test_cut_off_frame_ends_session_with_error() {
        let mut input: &[u8] = &[12, 0];
        let mut output = Vec::new();
        let result = serve(&mut input, &mut output, &KeywordFilter::default()).await;
        assert!(result.is_err());
        assert!(output.is_empty());
    }
}
