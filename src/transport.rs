//! Module that carries tokens between ring members over TCP, one line per token.

use crate::{channel::TokenChannel, log};
use color_print::cformat;
use futures::{SinkExt, StreamExt};
use std::{io, net::SocketAddr, time::Duration};
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinSet,
    time::sleep,
};
use tokio_util::{
    bytes::BytesMut,
    codec::{Decoder, Encoder, Framed, LinesCodec, LinesCodecError},
};

/// Time to wait before trying to reach the next member again.
pub const RECONNECT_INTERVAL: Duration = Duration::from_millis(500);

/// Longest line accepted from the previous member. Encoded tokens need at most 22 bytes.
pub const MAX_LINE_LENGTH: usize = 64;

/// Line codec that hands unreadable lines (bad UTF-8, too long) to the reader as items
/// instead of failing the stream, so the lines after them still arrive.
#[derive(Debug, Clone)]
pub struct TokenLinesCodec(LinesCodec);

impl TokenLinesCodec {
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
    }
}

impl Default for TokenLinesCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for TokenLinesCodec {
    type Item = Result<String, LinesCodecError>;
    type Error = LinesCodecError;

    // LinesCodec has already consumed (or started discarding) the offending line when it errors.
    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.0.decode(buf) {
            Ok(line) => Ok(line.map(Ok)),
            Err(e) => Ok(Some(Err(e))),
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.0.decode_eof(buf) {
            Ok(line) => Ok(line.map(Ok)),
            Err(e) => Ok(Some(Err(e))),
        }
    }
}

impl Encoder<String> for TokenLinesCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), Self::Error> {
        self.0.encode(line, buf)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("couldn't open a connection for the previous member on {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("couldn't read the local address: {0}")]
    LocalAddr(#[source] io::Error),
}

/// Struct that holds the listener the previous member connects to.
pub struct Transport {
    listener: TcpListener,
}

impl Transport {
    pub async fn bind(address: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| TransportError::Bind {
                address: address.to_string(),
                source,
            })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(TransportError::LocalAddr)
    }

    /// Function that starts accepting the previous member and sending to `next_address`.
    ///
    /// The returned channel owns both tasks and stops them when closed or dropped.
    pub fn link(self, next_address: String) -> TokenChannel {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel::<String>();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel::<String>();

        let accept_thread = tokio::spawn(Self::accept_previous(self.listener, inbox_tx));
        let send_thread = tokio::spawn(Self::send_to_next(next_address, outbox_rx));

        TokenChannel::new(outbox_tx, inbox_rx).with_tasks(vec![accept_thread, send_thread])
    }

    async fn accept_previous(listener: TcpListener, inbox: UnboundedSender<String>) {
        // readers live in the set, so aborting this task also closes their sockets
        let mut readers = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, address)) => {
                        log::debug(&cformat!("Accepted a <bold>connection</bold> from {address}."));
                        readers.spawn(Self::handle_previous(stream, inbox.clone()));
                    }
                    Err(e) => {
                        log::error(&format!("Failed to accept the previous member: {e}"));
                        sleep(RECONNECT_INTERVAL).await;
                    }
                },
                Some(_) = readers.join_next() => {}
            }
        }
    }

    async fn handle_previous(stream: TcpStream, inbox: UnboundedSender<String>) {
        let mut previous_lines = Framed::new(stream, TokenLinesCodec::new());

        while let Some(frame) = previous_lines.next().await {
            match frame {
                Ok(Ok(line)) => {
                    if inbox.send(line).is_err() {
                        return;
                    }
                }
                Ok(Err(e)) => {
                    log::error(&format!("Dropped an unreadable line from the previous member: {e}"));
                }
                Err(e) => {
                    log::error(&format!("Couldn't read from the previous member: {e}"));
                    return;
                }
            }
        }
    }

    async fn connect(next_address: &str) -> Framed<TcpStream, TokenLinesCodec> {
        loop {
            match TcpStream::connect(next_address).await {
                Ok(stream) => {
                    log::info(&cformat!("Connected to the next member at <bold>{next_address}</bold>."));
                    return Framed::new(stream, TokenLinesCodec::new());
                }
                Err(e) => {
                    log::debug(&format!("Couldn't connect to the next member: {e}"));
                    sleep(RECONNECT_INTERVAL).await;
                }
            }
        }
    }

    /// Function that drains the outbox into the next member, reconnecting and resending a
    /// line whose write fails.
    ///
    /// A write only fails once the local socket knows the peer is gone, so lines written
    /// into the kernel buffer just before the next member reset can still be lost. The ring
    /// recovers from that the same way it recovers from any lost token.
    async fn send_to_next(next_address: String, mut outbox: UnboundedReceiver<String>) {
        let mut next_lines = None;

        while let Some(line) = outbox.recv().await {
            loop {
                let mut lines = match next_lines.take() {
                    Some(lines) => lines,
                    None => Self::connect(&next_address).await,
                };

                match lines.send(line.clone()).await {
                    Ok(()) => {
                        next_lines = Some(lines);
                        break;
                    }
                    Err(e) => {
                        log::error(&format!("Couldn't send token to the next member: {e}"));
                        sleep(RECONNECT_INTERVAL).await;
                    }
                }
            }
        }
    }
}
