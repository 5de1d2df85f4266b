//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking library chosen for the
//! software. Equipment is driven with a request/reply pattern, each request and reply being a
//! single JSON encoded message.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A REQ socket exchanging JSON messages with an equipment server.
pub struct JsonReqSocket {
    socket: Socket,

    endpoint: String,
}

/// Options applied to a socket before it is connected.
///
/// Options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation. All times are in
/// milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SocketOptions {
    /// `ZMQ_REQ_CORRELATE`: Match replies with requests
    pub req_correlate: bool,

    /// `ZMQ_REQ_RELAXED`: relax strict alternation between request and reply
    pub req_relaxed: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not serialise the request: {0}")]
    SerialiseError(serde_json::Error),

    #[error("Could not send the request: {0}")]
    SendError(zmq::Error),

    #[error("No reply received within the receive timeout")]
    Timeout,

    #[error("Could not receive the reply: {0}")]
    RecvError(zmq::Error),

    #[error("The reply was not valid UTF-8")]
    NonUtf8Reply,

    #[error("Could not deserialise the reply: {0}")]
    DeserialiseError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JsonReqSocket {
    /// Create a new REQ socket connected to the given endpoint.
    ///
    /// zmq connects in the background, so a successful return does not mean the server is up.
    /// Issue a request to find that out.
    pub fn connect(
        ctx: &Context,
        socket_options: &SocketOptions,
        endpoint: &str,
    ) -> Result<Self, NetError> {
        let socket = ctx
            .socket(SocketType::REQ)
            .map_err(NetError::CreateSocketError)?;

        socket_options.set(&socket)?;

        socket
            .connect(endpoint)
            .map_err(|e| NetError::CouldNotConnect(endpoint.into(), e))?;

        Ok(Self {
            socket,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint this socket is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a request and block until the matching reply arrives or the receive timeout elapses.
    pub fn request<Q, P>(&self, request: &Q) -> Result<P, NetError>
    where
        Q: Serialize,
        P: DeserializeOwned,
    {
        let msg = serde_json::to_string(request).map_err(NetError::SerialiseError)?;

        self.socket.send(msg.as_str(), 0).map_err(NetError::SendError)?;

        let reply = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(NetError::NonUtf8Reply),
            Err(zmq::Error::EAGAIN) => return Err(NetError::Timeout),
            Err(e) => return Err(NetError::RecvError(e)),
        };

        serde_json::from_str(&reply).map_err(NetError::DeserialiseError)
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        if let Ok(SocketType::REQ) = socket.get_socket_type() {
            set_sockopts!(
                socket,
                (set_req_correlate, self.req_correlate),
                (set_req_relaxed, self.req_relaxed)
            );
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    /// Options suited to an equipment client: a lost reply must not wedge the REQ socket, so
    /// requests are correlated, strict alternation is relaxed, and receives time out.
    fn default() -> Self {
        Self {
            req_correlate: true,
            req_relaxed: true,
            linger: 0,
            reconnect_ivl: 100,
            connect_timeout: 1_000,
            recv_timeout: 2_000,
            send_timeout: 1_000,
        }
    }
}
