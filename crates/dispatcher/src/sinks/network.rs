//! NetworkFeedbackReporter - UDP datagram per feedback record

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use contracts::{ContractError, FeedbackReporter};
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Configuration for NetworkFeedbackReporter
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let max_packet_size = match params.get("max_packet_size") {
            Some(s) => s
                .parse()
                .map_err(|e| format!("invalid max_packet_size '{}': {}", s, e))?,
            None => 65000,
        };

        Ok(Self {
            addr,
            max_packet_size,
        })
    }
}

/// Feedback reporter that sends each record as one datagram
pub struct NetworkFeedbackReporter {
    name: String,
    config: NetworkSinkConfig,
    socket: UdpSocket,
}

impl NetworkFeedbackReporter {
    #[instrument(name = "network_feedback_new", skip(name, config), fields(target = %config.addr))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let bind_addr: SocketAddr = if config.addr.is_ipv6() {
            "[::]:0".parse().map_err(std::io::Error::other)?
        } else {
            "0.0.0.0:0".parse().map_err(std::io::Error::other)?
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(config.addr).await?;

        debug!(sink = %name, target = %config.addr, "NetworkFeedbackReporter connected");

        Ok(Self {
            name,
            config,
            socket,
        })
    }

    /// Create from params (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_write(&name, e))?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }
}

#[async_trait]
impl FeedbackReporter for NetworkFeedbackReporter {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_feedback_send",
        skip(self, payload),
        fields(sink = %self.name, bytes = payload.len())
    )]
    async fn send_feedback(&self, payload: &[u8]) -> Result<(), ContractError> {
        if payload.len() > self.config.max_packet_size {
            warn!(
                sink = %self.name,
                size = payload.len(),
                max = self.config.max_packet_size,
                "Feedback record exceeds datagram limit"
            );
            return Err(ContractError::sink_write(
                &self.name,
                format!(
                    "record of {} bytes exceeds max_packet_size {}",
                    payload.len(),
                    self.config.max_packet_size
                ),
            ));
        }

        let sent = self
            .socket
            .send(payload)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, format!("udp send failed: {e}")))?;
        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_sink_config_parsing() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "127.0.0.1:9999".to_string());
        params.insert("max_packet_size".to_string(), "512".to_string());

        let config = NetworkSinkConfig::from_params(&params).unwrap();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.max_packet_size, 512);
    }

    #[test]
    fn test_network_sink_config_rejects_bad_addr() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "not-an-addr".to_string());
        assert!(NetworkSinkConfig::from_params(&params).is_err());
    }

    #[tokio::test]
    async fn test_datagram_reaches_receiver() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = NetworkSinkConfig {
            addr: receiver.local_addr().unwrap(),
            max_packet_size: 1024,
        };
        let sink = NetworkFeedbackReporter::new("udp", config).await.unwrap();

        sink.send_feedback(br#"{"token":"t"}"#).await.unwrap();

        let mut buf = [0u8; 1024];
        let n = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], br#"{"token":"t"}"#);
    }

    #[tokio::test]
    async fn test_oversized_record_is_an_error() {
        let config = NetworkSinkConfig {
            addr: "127.0.0.1:19998".parse().unwrap(),
            max_packet_size: 4,
        };
        let sink = NetworkFeedbackReporter::new("udp", config).await.unwrap();
        assert!(sink.send_feedback(b"too long").await.is_err());
    }
}
