//! Response parsing for the node's RPC API.

use super::{
    AddedObject, ERROR_BODY_CAPACITY, Error, ErrorEnvelope, MAX_ERROR_TYPE_LEN, MAX_HASH_LEN,
    MAX_MESSAGE_LEN, MAX_NAME_LEN, truncated,
};
use crate::network::Read;
use crate::network::application::http::response::{Body, LINE_CAPACITY, LineReader, ResponseHead};
use core::fmt;
use heapless::{String, Vec};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// An unescaped JSON string, cut at `N` bytes.
#[derive(Debug)]
struct Bounded<const N: usize>(String<N>);

impl<'de, const N: usize> Deserialize<'de> for Bounded<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BoundedVisitor<const N: usize>;

        impl<const N: usize> Visitor<'_> for BoundedVisitor<N> {
            type Value = Bounded<N>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Bounded(truncated(value)))
            }
        }

        deserializer.deserialize_str(BoundedVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct AddLine {
    #[serde(rename = "Name", default)]
    name: Option<Bounded<MAX_NAME_LEN>>,
    #[serde(rename = "Hash", default)]
    hash: Option<Bounded<MAX_HASH_LEN>>,
    #[serde(rename = "Size", default)]
    size: Option<u32>,
}

/// Kubo reports `Size` as a decimal string.
#[derive(Debug, Deserialize)]
struct AddLineQuotedSize {
    #[serde(rename = "Name", default)]
    name: Option<Bounded<MAX_NAME_LEN>>,
    #[serde(rename = "Hash", default)]
    hash: Option<Bounded<MAX_HASH_LEN>>,
    #[serde(rename = "Size", default)]
    size: Option<Bounded<20>>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeLine {
    #[serde(rename = "Message", default)]
    message: Option<Bounded<MAX_MESSAGE_LEN>>,
    #[serde(rename = "Code", default)]
    code: Option<i32>,
    #[serde(rename = "Type", default)]
    error_type: Option<Bounded<MAX_ERROR_TYPE_LEN>>,
}

fn decode_add_line(text: &str) -> Option<AddLine> {
    let mut scratch = [0u8; LINE_CAPACITY];
    if let Ok((line, _)) = serde_json_core::from_str_escaped::<AddLine>(text, &mut scratch) {
        return Some(line);
    }
    let (line, _) =
        serde_json_core::from_str_escaped::<AddLineQuotedSize>(text, &mut scratch).ok()?;
    Some(AddLine {
        name: line.name,
        hash: line.hash,
        size: line.size.and_then(|size| size.0.trim().parse().ok()),
    })
}

/// Decode one line of an `add` response.
///
/// Returns `None` if the line is not a JSON object. Returns
/// `Some(Err(Error::InvalidResponse))` if it is one but lacks `Name`, `Hash`
/// or a numeric `Size`. JSON escapes in `Name` and `Hash` are decoded.
pub fn parse_add_line(line: &str) -> Option<Result<AddedObject, Error>> {
    let line = decode_add_line(line.trim())?;
    let object = match (line.name, line.hash, line.size) {
        (Some(name), Some(hash), Some(size)) => Ok(AddedObject {
            name: name.0,
            hash: hash.0,
            size,
        }),
        _ => Err(Error::InvalidResponse),
    };
    Some(object)
}

/// Decode a node error envelope such as
/// `{"Message":"invalid path","Code":0,"Type":"error"}`.
///
/// `Message` is required; a missing `Code` reads as 0 and a missing `Type`
/// as empty.
pub fn parse_error_envelope(text: &str) -> Option<ErrorEnvelope> {
    let mut scratch = [0u8; ERROR_BODY_CAPACITY];
    let (line, _) =
        serde_json_core::from_str_escaped::<EnvelopeLine>(text.trim(), &mut scratch).ok()?;
    Some(ErrorEnvelope {
        code: line.code.unwrap_or(0),
        error_type: line.error_type.map(|t| t.0).unwrap_or_default(),
        message: line.message?.0,
    })
}

fn node_error(text: &str) -> Error {
    let Some(envelope) = parse_error_envelope(text) else {
        return Error::InvalidResponse;
    };
    warn!(
        "node error {}: {}",
        envelope.code,
        envelope.message.as_str()
    );
    Error::Node(envelope)
}

fn rejected(head: &ResponseHead, text: &str) -> Error {
    if head.status.is_some() && !head.is_success() {
        return node_error(text);
    }
    Error::InvalidResponse
}

/// Read an `add` response.
///
/// The head is consumed first. Body lines that are empty or not JSON are
/// skipped; the first JSON object decides the outcome.
pub(crate) fn read_add_response<R: Read + ?Sized>(conn: &mut R) -> Result<AddedObject, Error> {
    let mut reader = LineReader::new(conn);
    let Some(head) = reader.read_head()? else {
        warn!("add response ended inside the head");
        return Err(Error::InvalidResponse);
    };
    debug!("add response status {}", head.status.unwrap_or(0));

    let mut line: Vec<u8, LINE_CAPACITY> = Vec::new();
    while let Some(len) = reader.read_line(&mut line)? {
        if len > line.len() {
            warn!("skipping add response line of {} bytes", len);
            continue;
        }
        let Ok(text) = core::str::from_utf8(&line) else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match parse_add_line(text) {
            Some(Ok(object)) => return Ok(object),
            Some(Err(_)) => return Err(rejected(&head, text)),
            None => trace!("skipping non-JSON line of {} bytes", text.len()),
        }
    }

    warn!("add response carried no JSON object");
    Err(Error::InvalidResponse)
}

/// Read the response to a bodyless command.
///
/// With `out` set, a `200` body is copied into it; without, the body is
/// ignored. Any other status, `2xx` included, is decoded as a node error
/// envelope.
pub(crate) fn read_command_response<R: Read + ?Sized>(
    conn: &mut R,
    out: Option<&mut [u8]>,
) -> Result<Body, Error> {
    let mut reader = LineReader::new(conn);
    let Some(head) = reader.read_head()? else {
        warn!("command response ended inside the head");
        return Err(Error::InvalidResponse);
    };
    let Some(status) = head.status else {
        warn!("command response without status line");
        return Err(Error::InvalidResponse);
    };
    debug!("command response status {}", status);

    if status == 200 {
        let Some(out) = out else {
            return Ok(Body {
                len: 0,
                truncated: false,
            });
        };
        if head.chunked {
            warn!("chunked response bodies are not supported");
            return Err(Error::InvalidResponse);
        }
        return Ok(reader.read_body(out, head.content_length)?);
    }

    if head.chunked {
        return Err(Error::InvalidResponse);
    }
    let mut scratch = [0u8; ERROR_BODY_CAPACITY];
    let body = reader.read_body(&mut scratch, head.content_length)?;
    if body.truncated {
        return Err(Error::InvalidResponse);
    }
    let text = core::str::from_utf8(&scratch[..body.len]).map_err(|_| Error::InvalidResponse)?;
    Err(node_error(text))
}
