use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use futures::sink::SinkExt;
use tokio::{
    io::AsyncReadExt,
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::timeout,
};
use tokio_util::codec::{Decoder, Encoder, FramedWrite};
use tracing::{debug, info, trace, warn};

use crate::errors::*;
use crate::parser::parse_frame;
use crate::protocol::{Frame, FrameOrKeepAlive};
use crate::unparser::encode_item;

/// Size of the single read done by [`Connection::receive_response`].
pub const READ_SIZE: usize = 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct StompCodec;

/// A connected byte stream to a broker.
///
/// Holding a `Connection` is the connected state; dropping it closes the
/// socket, so it is released on every path including errors. [`close`] does
/// an orderly shutdown first.
///
/// [`close`]: Connection::close
#[derive(Debug)]
pub struct Connection {
    peer: SocketAddr,
    reader: OwnedReadHalf,
    writer: FramedWrite<OwnedWriteHalf, StompCodec>,
}

impl Encoder<FrameOrKeepAlive> for StompCodec {
    type Error = StompError;
    fn encode(&mut self, item: FrameOrKeepAlive, buf: &mut BytesMut) -> Result<()> {
        encode_item(buf, &item)
    }
}

impl Decoder for StompCodec {
    type Item = FrameOrKeepAlive;
    type Error = StompError;
    fn decode(&mut self, input: &mut BytesMut) -> Result<Option<FrameOrKeepAlive>> {
        match parse_frame(input)? {
            Some((used, item)) => {
                input.advance(used);
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

/// Serialize a frame exactly as [`Connection::send_frame`] would put it on
/// the wire.
pub fn encode(frame: Frame) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    StompCodec.encode(FrameOrKeepAlive::Frame(frame), &mut buf)?;
    Ok(buf.freeze())
}

/// Split received bytes into as many complete frames and heart-beats as they
/// hold. Also returns how many trailing bytes were left undecoded.
pub fn decode_frames(bytes: &[u8]) -> Result<(Vec<FrameOrKeepAlive>, usize)> {
    let mut buf = BytesMut::from(bytes);
    let mut items = Vec::new();
    while let Some(item) = StompCodec.decode(&mut buf)? {
        items.push(item);
    }
    Ok((items, buf.len()))
}

pub async fn connect(host: &str, port: u16) -> Result<Connection> {
    let addr = format!("{}:{}", host, port);
    trace!("Connecting to {}", addr);
    let conn = TcpStream::connect((host, port))
        .await
        .map_err(|source| StompError::Connection {
            addr: addr.clone(),
            source,
        })?;
    let peer = conn.peer_addr()?;
    info!("Connected to {} ({})", addr, peer);

    let (reader, writer) = conn.into_split();
    Ok(Connection {
        peer,
        reader,
        writer: FramedWrite::new(writer, StompCodec),
    })
}

impl Connection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Write the whole frame, NUL terminator included, and flush it.
    pub async fn send_frame(&mut self, frame: Frame) -> Result<()> {
        debug!("Sending to server {}", frame);
        self.writer.send(FrameOrKeepAlive::Frame(frame)).await?;
        trace!("Send Done");
        Ok(())
    }

    /// Wait up to `wait` for data and return what one read yields.
    ///
    /// An elapsed deadline is not an error and gives back an empty buffer.
    /// This is a diagnostic read: it does not reassemble frames.
    pub async fn receive_response(&mut self, wait: Duration) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(READ_SIZE);
        match timeout(wait, self.reader.read_buf(&mut buf)).await {
            Ok(Ok(0)) => {
                warn!("Connection closed by {} while awaiting response", self.peer);
                Err(StompError::PeerClosed)
            }
            Ok(Ok(n)) => {
                trace!("Read {} bytes from {}", n, self.peer);
                Ok(buf.freeze())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                trace!("No response within {:?}", wait);
                Ok(Bytes::new())
            }
        }
    }

    /// Send DISCONNECT asking for `receipt`, then close.
    pub async fn disconnect(mut self, receipt: &str) -> Result<()> {
        self.send_frame(Frame::disconnect(receipt)).await?;
        self.close().await
    }

    pub async fn close(mut self) -> Result<()> {
        info!("Closing connection to {}", self.peer);
        // Shuts down the write half; the read half goes with `self`.
        if let Err(e) = SinkExt::<FrameOrKeepAlive>::close(&mut self.writer).await {
            warn!("Error closing connection to {}: {}", self.peer, e);
            return Err(e);
        }
        Ok(())
    }
}
