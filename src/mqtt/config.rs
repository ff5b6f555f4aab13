use serde::{Deserialize, Serialize};

use super::error::ConnectionError;

pub const DEFAULT_BROKER_URL: &str = "mqtt://broker.hivemq.com";
pub const DEFAULT_TOPIC: &str = "/internet-controlled-car/car/control";
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Broker settings read from the `[mqtt]` section of the config file.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker endpoint, e.g. `mqtt://broker.hivemq.com` or `tcp://10.0.0.2:1883`
    pub broker_url: String,
    /// Topic the car subscribes to
    pub topic: String,
    /// Client identifier, `carrelay-<pid>` when unset
    pub client_id: Option<String>,
    pub keep_alive_secs: u64,
    /// Pause between event loop polls after a transport error
    pub reconnect_delay_ms: u64,
    /// Capacity of the request channel between client and event loop
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: DEFAULT_BROKER_URL.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            client_id: None,
            keep_alive_secs: 60,
            reconnect_delay_ms: 1000,
            request_capacity: 10,
        }
    }
}

impl MqttConfig {
    pub fn client_id(&self) -> String {
        match &self.client_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => format!("carrelay-{}", std::process::id()),
        }
    }
}

/// Host and port extracted from a broker URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl BrokerAddress {
    /// Parses `mqtt://host[:port]`, `tcp://host[:port]` or a bare `host[:port]`.
    /// IPv6 hosts are written in brackets, `mqtt://[::1]:1883`.
    ///
    /// TLS and websocket schemes are refused since the relay only opens plain
    /// TCP sessions.
    pub fn parse(url: &str) -> Result<Self, ConnectionError> {
        let invalid = |reason: &str| ConnectionError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim();
        let rest = match trimmed.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "mqtt" | "tcp" => rest,
                other => return Err(ConnectionError::UnsupportedScheme(other.to_string())),
            },
            None => trimmed,
        };

        // Path segments carry no meaning for MQTT, drop them
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.contains('@') {
            return Err(invalid("credentials in the URL are not supported"));
        }

        let parse_port = |port: &str| {
            port.parse::<u16>()
                .map_err(|_| invalid("port is not a number between 0 and 65535"))
        };

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unclosed '[' in IPv6 host"))?;
            let port = match after {
                "" => DEFAULT_MQTT_PORT,
                _ => match after.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => return Err(invalid("unexpected text after IPv6 host")),
                },
            };
            (host, port)
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, parse_port(port)?),
                None => (authority, DEFAULT_MQTT_PORT),
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if port == 0 {
            return Err(invalid("port must not be 0"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_without_port() {
        let addr = BrokerAddress::parse("mqtt://broker.hivemq.com").unwrap();
        assert_eq!(addr.host, "broker.hivemq.com");
        assert_eq!(addr.port, 1883);
    }

    #[test]
    fn parses_explicit_port_and_tcp_scheme() {
        let addr = BrokerAddress::parse("tcp://10.0.0.2:1884").unwrap();
        assert_eq!(
            addr,
            BrokerAddress {
                host: "10.0.0.2".to_string(),
                port: 1884
            }
        );
    }

    #[test]
    fn accepts_bare_host_and_trailing_slash() {
        assert_eq!(BrokerAddress::parse("localhost").unwrap().port, 1883);
        assert_eq!(
            BrokerAddress::parse("MQTT://localhost:2000/").unwrap().port,
            2000
        );
    }

    #[test]
    fn strips_brackets_from_ipv6_hosts() {
        assert_eq!(
            BrokerAddress::parse("mqtt://[::1]:1883").unwrap(),
            BrokerAddress {
                host: "::1".to_string(),
                port: 1883
            }
        );
        assert_eq!(
            BrokerAddress::parse("tcp://[fe80::1]").unwrap(),
            BrokerAddress {
                host: "fe80::1".to_string(),
                port: 1883
            }
        );
    }

    #[test]
    fn rejects_tls_and_websocket_schemes() {
        assert!(matches!(
            BrokerAddress::parse("mqtts://broker.hivemq.com"),
            Err(ConnectionError::UnsupportedScheme(s)) if s == "mqtts"
        ));
        assert!(matches!(
            BrokerAddress::parse("ws://broker.hivemq.com:8000"),
            Err(ConnectionError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for url in [
            "mqtt://",
            "mqtt://:1883",
            "mqtt://host:abc",
            "mqtt://host:0",
            "mqtt://u:p@host",
            "mqtt://[::1",
            "mqtt://[::1]1883",
            "mqtt://[]:1883",
        ] {
            assert!(
                matches!(BrokerAddress::parse(url), Err(ConnectionError::InvalidUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn client_id_falls_back_to_pid() {
        let mut config = MqttConfig::default();
        assert!(config.client_id().starts_with("carrelay-"));

        config.client_id = Some("car-backend".to_string());
        assert_eq!(config.client_id(), "car-backend");
    }
}
