use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Transport protocol half of an exposed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl FromStr for Protocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "sctp" => Ok(Protocol::Sctp),
            _ => Err(ValidationError::InvalidPort {
                value: format!("unknown protocol '{s}'"),
            }),
        }
    }
}

/// A container port in `<number>/<protocol>` form, e.g. `80/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Port {
    pub number: u16,
    pub protocol: Protocol,
}

impl Port {
    pub fn tcp(number: u16) -> Self {
        Self {
            number,
            protocol: Protocol::Tcp,
        }
    }

    pub fn udp(number: u16) -> Self {
        Self {
            number,
            protocol: Protocol::Udp,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol.as_str())
    }
}

impl FromStr for Port {
    type Err = ValidationError;

    /// Parses `80`, `80/tcp` or `53/udp`. A missing protocol means tcp.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, protocol) = match s.split_once('/') {
            Some((n, p)) => (n, p.parse()?),
            None => (s, Protocol::Tcp),
        };

        let number = number
            .parse::<u16>()
            .ok()
            .filter(|n| *n != 0)
            .ok_or_else(|| ValidationError::InvalidPort {
                value: s.to_string(),
            })?;

        Ok(Self { number, protocol })
    }
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ports() {
        assert_eq!("80".parse::<Port>().unwrap(), Port::tcp(80));
        assert_eq!("53/udp".parse::<Port>().unwrap(), Port::udp(53));
        assert_eq!("443/TCP".parse::<Port>().unwrap().to_string(), "443/tcp");
    }

    #[test]
    fn test_reject_bad_ports() {
        for bad in ["", "0", "http", "70000/tcp", "80/icmp", "8000-8010/tcp"] {
            assert!(bad.parse::<Port>().is_err(), "{bad} should be rejected");
        }
    }
}
