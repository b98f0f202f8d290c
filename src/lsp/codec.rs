//! LSP base protocol framing.
//!
//! Each message is a header block terminated by an empty line, followed by
//! `Content-Length` bytes of UTF-8 JSON:
//!
//! ```text
//! Content-Length: 52\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"shutdown"}
//! ```

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{HelperError, Result};

/// Frame a JSON message with its `Content-Length` header.
pub fn encode_message(message: &Value) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Write one framed message and flush.
pub async fn write_message<W>(writer: &mut W, message: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let framed = encode_message(message)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message. Returns `None` on EOF before any header.
///
/// Header names are case-insensitive and headers other than
/// `Content-Length` are ignored.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if saw_header {
                return Err(HelperError::Lsp(
                    "stream closed inside message headers".to_string(),
                ));
            }
            return Ok(None);
        }

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;

        let Some((name, value)) = header.split_once(':') else {
            return Err(HelperError::Lsp(format!("malformed header: {}", header)));
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let length = value.trim().parse::<usize>().map_err(|e| {
                HelperError::Lsp(format!("invalid Content-Length '{}': {}", value.trim(), e))
            })?;
            content_length = Some(length);
        }
    }

    let length = content_length
        .ok_or_else(|| HelperError::Lsp("message without Content-Length".to_string()))?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;

    #[test]
    fn test_encode_message() {
        let framed = encode_message(&json!({"jsonrpc": "2.0", "method": "exit"})).unwrap();
        let text = String::from_utf8(framed).unwrap();
        let (header, body) = text.split_once("\r\n\r\n").unwrap();
        assert_eq!(header, format!("Content-Length: {}", body.len()));
        assert!(body.contains("\"method\":\"exit\""));
    }

    #[tokio::test]
    async fn test_read_consecutive_messages() {
        let mut bytes = encode_message(&json!({"id": 1, "result": null})).unwrap();
        bytes.extend(encode_message(&json!({"method": "window/logMessage"})).unwrap());
        let mut reader = BufReader::new(bytes.as_slice());

        let first = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(first["id"], 1);
        let second = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(second["method"], "window/logMessage");
        assert!(read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_extra_headers_and_case() {
        let body = r#"{"id":7,"result":[]}"#;
        let raw = format!(
            "content-length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = BufReader::new(raw.as_bytes());
        let message = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(message["id"], 7);
    }

    #[tokio::test]
    async fn test_read_multibyte_body() {
        let message = json!({"id": 2, "result": {"name": "café"}});
        let bytes = encode_message(&message).unwrap();
        let mut reader = BufReader::new(bytes.as_slice());
        assert_eq!(read_message(&mut reader).await.unwrap().unwrap(), message);
    }

    #[tokio::test]
    async fn test_missing_content_length() {
        let raw = "Content-Type: text/plain\r\n\r\n{}";
        let mut reader = BufReader::new(raw.as_bytes());
        assert!(matches!(
            read_message(&mut reader).await,
            Err(HelperError::Lsp(_))
        ));
    }

    #[tokio::test]
    async fn test_eof_inside_headers() {
        let mut reader = BufReader::new("Content-Length: 10\r\n".as_bytes());
        assert!(read_message(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let mut reader = BufReader::new("Content-Length: 10\r\n\r\n{}".as_bytes());
        assert!(matches!(
            read_message(&mut reader).await,
            Err(HelperError::Io(_))
        ));
    }
}
