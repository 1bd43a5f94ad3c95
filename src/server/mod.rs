//! Viewer half of the socket: accepts one emitter at a time and feeds its
//! byte stream through the decoder into the timeline model.
//!
//! Everything here is non-blocking and driven by [`NetworkState::poll`]
//! once per frame. The protocol is one-way; nothing is ever written back.

mod decoder;

pub use decoder::StreamDecoder;

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};

use tracing::{debug, info};

use crate::debug_recorder::DebugRecorder;
use crate::model::Game;
use crate::telemetry;

const RECV_CHUNK: usize = 4096;

pub struct NetworkState {
    listener: TcpListener,
    client: Option<TcpStream>,
    decoder: StreamDecoder,
}

impl NetworkState {
    /// Binds the listener on all interfaces and switches it to non-blocking
    /// mode. Pass port 0 to bind an ephemeral port.
    pub fn start(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        info!(port = listener.local_addr()?.port(), "listening");
        Ok(Self {
            listener,
            client: None,
            decoder: StreamDecoder::new(),
        })
    }

    pub fn local_port(&self) -> io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    pub fn set_recorder(&mut self, recorder: DebugRecorder) {
        self.decoder.set_recorder(recorder);
    }

    /// One frame's worth of network work: at most one `accept` or `recv`,
    /// then as many complete frames as the buffer holds.
    pub fn poll(&mut self, game: &mut Game) {
        if self.client.is_some() {
            self.poll_client(game);
        } else {
            self.poll_accept(game);
        }
    }

    fn poll_client(&mut self, game: &mut Game) {
        let Some(client) = self.client.as_mut() else {
            return;
        };

        let mut chunk = [0u8; RECV_CHUNK];
        match client.read(&mut chunk) {
            Ok(0) => {
                info!("client disconnected");
                self.client = None;
            }
            Ok(received) => {
                telemetry::record_bytes("server.recv", received);
                if !self.decoder.ingest(game, &chunk[..received]) {
                    self.client = None;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => {
                // Transient errors on a non-blocking socket are skipped; a
                // dead peer shows up as `Ok(0)` soon enough.
                debug!(%err, "recv error ignored");
            }
        }
    }

    fn poll_accept(&mut self, game: &mut Game) {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                if let Err(err) = stream.set_nonblocking(true) {
                    debug!(%err, "failed to configure accepted socket");
                    return;
                }
                info!(%addr, "client connected");
                self.client = Some(stream);
                self.decoder.begin_connection(game);
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => {
                debug!(%err, "accept error ignored");
            }
        }
    }
}
