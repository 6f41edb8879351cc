//! One-shot membership probe.
//!
//! Each query opens a fresh connection, writes [`PROBE_LINE`], performs a
//! single bounded read and parses the answer. The stream is owned by the
//! query call, so it is closed on every return path.

use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use tracing::warn;

use super::MembershipView;
use crate::constants::PROBE_LINE;
use crate::Endpoint;
use crate::Error;
use crate::ProbeConfig;
use crate::ProbePhase;
use crate::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipClient {
    config: ProbeConfig,
}

impl MembershipClient {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Ask the node behind `endpoint` for its current member list.
    ///
    /// # Errors
    /// - `Error::Connection` when nothing accepts on the endpoint
    /// - `Error::Timeout` when connect, write or read exceeds its bound
    /// - `Error::Decode` when the answer is not UTF-8
    pub async fn query(
        &self,
        endpoint: &Endpoint,
    ) -> Result<MembershipView> {
        let addr = endpoint.to_string();
        let connect_timeout = self.config.connect_timeout();
        let read_timeout = self.config.read_timeout();

        let mut stream = timeout(
            connect_timeout,
            TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
        )
        .await
        .map_err(|_| Error::Timeout {
            endpoint: addr.clone(),
            phase: ProbePhase::Connect,
            duration: connect_timeout,
        })?
        .map_err(|source| Error::Connection {
            endpoint: addr.clone(),
            source,
        })?;

        timeout(read_timeout, stream.write_all(PROBE_LINE))
            .await
            .map_err(|_| Error::Timeout {
                endpoint: addr.clone(),
                phase: ProbePhase::Write,
                duration: read_timeout,
            })?
            .map_err(|source| Error::Connection {
                endpoint: addr.clone(),
                source,
            })?;

        let mut buf = vec![0u8; self.config.buffer_size];
        let n = timeout(read_timeout, stream.read(&mut buf))
            .await
            .map_err(|_| Error::Timeout {
                endpoint: addr.clone(),
                phase: ProbePhase::Read,
                duration: read_timeout,
            })?
            .map_err(|source| Error::Connection {
                endpoint: addr.clone(),
                source,
            })?;

        if n == buf.len() {
            warn!(%addr, bytes = n, "membership response filled the read buffer, trailing members may be cut off");
        }

        if let Err(e) = stream.shutdown().await {
            debug!(%addr, "shutdown after probe: {e}");
        }

        let text = std::str::from_utf8(&buf[..n]).map_err(|_| {
            warn!(%addr, bytes = n, "membership response is not UTF-8");
            Error::Decode { endpoint: addr.clone() }
        })?;

        let view = MembershipView::parse(text);
        debug!(%addr, members = view.members().len(), "membership probe answered");
        Ok(view)
    }
}
