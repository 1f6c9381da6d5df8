use std::fmt;

use nom::{
    bytes::streaming::{tag, take, take_till, take_till1, take_until, take_while1},
    character::streaming::line_ending,
    multi::many0,
    sequence::{separated_pair, terminated},
    Err, IResult,
};

use crate::errors::*;
use crate::protocol::{Command, Frame, FrameOrKeepAlive, Headers};

#[derive(Debug)]
struct ParseError<'a> {
    remaining: &'a [u8],
    kind: nom::error::ErrorKind,
}

struct RawFrame<'a> {
    command: &'a [u8],
    headers: Vec<(&'a [u8], &'a [u8])>,
    body: &'a [u8],
}

// See grammar described at https://stomp.github.io/stomp-specification-1.2.html#Augmented_BNF
//
// Returns the number of bytes consumed alongside the item, or `None` when the
// input holds no complete frame yet.
pub(crate) fn parse_frame(input: &[u8]) -> Result<Option<(usize, FrameOrKeepAlive)>> {
    match line_ending::<_, nom::error::Error<&[u8]>>(input) {
        Ok((rest, _)) => return Ok(Some((input.len() - rest.len(), FrameOrKeepAlive::KeepAlive))),
        Err(Err::Incomplete(_)) => return Ok(None),
        Err(_) => {}
    }

    match parse_inner(input) {
        Ok((remainder, raw)) => {
            let frame = raw.into_frame()?;
            Ok(Some((
                input.len() - remainder.len(),
                FrameOrKeepAlive::Frame(frame),
            )))
        }
        Err(Err::Incomplete(_)) => Ok(None),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => {
            Err(StompError::Parse(ParseError::from(e).to_string()))
        }
    }
}

fn parse_inner(input: &[u8]) -> IResult<&[u8], RawFrame<'_>> {
    let (input, command) = parse_command(input)?;
    let (input, headers) = many0(parse_header)(input)?;
    let (input, _) = line_ending(input)?;

    let content_length = headers
        .iter()
        .find(|(k, _)| *k == &b"content-length"[..])
        .and_then(|(_, v)| std::str::from_utf8(v).ok())
        .and_then(|v| v.trim().parse::<usize>().ok());
    let (input, body) = match content_length {
        Some(len) => take(len)(input)?,
        None => take_until("\0")(input)?,
    };

    let (input, _) = tag("\0")(input)?;

    Ok((
        input,
        RawFrame {
            command,
            headers,
            body,
        },
    ))
}

fn parse_command(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_while1(|c: u8| c.is_ascii_uppercase()), line_ending)(input)
}

fn parse_header(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
    terminated(
        separated_pair(
            take_till1(|c: u8| c == b':' || c == b'\r' || c == b'\n'),
            tag(":"),
            take_till(|c: u8| c == b'\r' || c == b'\n'),
        ),
        line_ending,
    )(input)
}

impl<'a> RawFrame<'a> {
    fn into_frame(self) -> Result<Frame> {
        let command = utf8(self.command)?.parse::<Command>()?;
        let escaped = command.escapes_headers();

        let mut headers = Headers::new();
        for (k, v) in self.headers {
            let (k, v) = (utf8(k)?, utf8(v)?);
            if escaped {
                headers.push(unescape(k)?, unescape(v)?);
            } else {
                headers.push(k, v);
            }
        }

        let body = if self.body.is_empty() {
            None
        } else {
            Some(self.body.to_vec())
        };

        Ok(Frame::from_parts(command, headers, body))
    }
}

fn utf8(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|e| StompError::Parse(e.to_string()))
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some('\\') => out.push('\\'),
            other => {
                return Err(StompError::Parse(format!(
                    "undefined escape sequence in {:?}: \\{}",
                    raw,
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}

impl<'a> From<nom::error::Error<&'a [u8]>> for ParseError<'a> {
    fn from(e: nom::error::Error<&'a [u8]>) -> Self {
        ParseError {
            remaining: e.input,
            kind: e.code,
        }
    }
}

impl<'a> fmt::Display for ParseError<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        const MAX_SNIPPET: usize = 80;
        if self.remaining.len() > MAX_SNIPPET {
            write!(
                fmt,
                "{:?}: {:?}…",
                self.kind,
                String::from_utf8_lossy(&self.remaining[..MAX_SNIPPET])
            )
        } else {
            write!(
                fmt,
                "{:?}: {:?}",
                self.kind,
                String::from_utf8_lossy(self.remaining)
            )
        }
    }
}
