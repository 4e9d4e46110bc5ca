//! Networking primitives.
//!
//! The sync channel is a TCP stream of length-prefixed JSON frames, each
//! carrying one [`SyncMessage`]: a big-endian `u32` payload length followed by
//! the payload. Ordering and delivery guarantees are whatever the peer
//! provides; the client tolerates sparse and late updates.

use std::net::SocketAddr;

use anyhow::Context;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
};

use crate::sync::SyncMessage;

/// Frames larger than this are rejected before allocating.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Encodes one message as a length-prefixed frame.
pub fn encode_frame(msg: &SyncMessage) -> anyhow::Result<Bytes> {
    let payload = serde_json::to_vec(msg).context("serialize sync msg")?;
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);
    Ok(buf.freeze())
}

/// Encodes the JSON payload alone.
pub fn encode_to_bytes(msg: &SyncMessage) -> anyhow::Result<Bytes> {
    let payload = serde_json::to_vec(msg).context("serialize")?;
    Ok(Bytes::from(payload))
}

pub fn decode_from_bytes(b: &[u8]) -> anyhow::Result<SyncMessage> {
    serde_json::from_slice(b).context("deserialize")
}

/// Sync connection over TCP with length-prefixed frames.
#[derive(Debug)]
pub struct SyncConn {
    stream: TcpStream,
}

impl SyncConn {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        stream.set_nodelay(true).context("tcp nodelay")?;
        Ok(Self::new(stream))
    }

    pub async fn send(&mut self, msg: &SyncMessage) -> anyhow::Result<()> {
        let frame = encode_frame(msg)?;
        self.stream.write_all(&frame).await.context("tcp write")?;
        Ok(())
    }

    pub async fn recv(&mut self) -> anyhow::Result<SyncMessage> {
        read_frame(&mut self.stream).await
    }

    /// Splits into halves so reads can run on their own task.
    pub fn split(self) -> (SyncReader, SyncWriter) {
        let (read, write) = self.stream.into_split();
        (SyncReader { read }, SyncWriter { write })
    }

    pub fn peer_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }
}

/// Receiving half of a [`SyncConn`].
#[derive(Debug)]
pub struct SyncReader {
    read: OwnedReadHalf,
}

impl SyncReader {
    /// Not cancel-safe: a partially read frame is lost if the future is dropped.
    pub async fn recv(&mut self) -> anyhow::Result<SyncMessage> {
        read_frame(&mut self.read).await
    }
}

/// Sending half of a [`SyncConn`].
#[derive(Debug)]
pub struct SyncWriter {
    write: OwnedWriteHalf,
}

impl SyncWriter {
    pub async fn send(&mut self, msg: &SyncMessage) -> anyhow::Result<()> {
        let frame = encode_frame(msg)?;
        self.write.write_all(&frame).await.context("tcp write")?;
        Ok(())
    }
}

async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> anyhow::Result<SyncMessage> {
    let len = reader.read_u32().await.context("tcp read len")? as usize;
    if len > MAX_FRAME_LEN {
        anyhow::bail!("frame of {len} bytes exceeds {MAX_FRAME_LEN}");
    }
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .context("tcp read payload")?;
    decode_from_bytes(&payload)
}

/// TCP listener for sync peers.
pub struct SyncListener {
    listener: TcpListener,
}

impl SyncListener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(SyncConn, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        Ok((SyncConn::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}
