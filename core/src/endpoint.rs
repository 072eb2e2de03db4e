use std::fmt;

const PLAIN_SCHEME: &str = "ws";
const SECURE_SCHEME: &str = "wss";

/// Connection target split out of a `ws://` / `wss://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub secure: bool,
    pub host: String,
    pub port: u16,
    /// Path plus any query string; always starts with `/`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    MissingScheme(String),
    UnsupportedScheme(String),
    EmptyHost(String),
    InvalidPort(String),
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::MissingScheme(url) => write!(f, "missing scheme separator in {url}"),
            EndpointError::UnsupportedScheme(scheme) => {
                write!(f, "unsupported scheme {scheme:?}, expected ws or wss")
            }
            EndpointError::EmptyHost(url) => write!(f, "no host in {url}"),
            EndpointError::InvalidPort(port) => write!(f, "invalid port {port:?}"),
        }
    }
}

impl std::error::Error for EndpointError {}

impl Endpoint {
    /// Parse `scheme://host[:port][/path]`.
    ///
    /// Port defaults to 80 (`ws`) or 443 (`wss`); path defaults to `/`.
    pub fn parse(url: &str) -> Result<Self, EndpointError> {
        let url = url.trim();
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| EndpointError::MissingScheme(url.to_owned()))?;

        let secure = match scheme.to_ascii_lowercase().as_str() {
            PLAIN_SCHEME => false,
            SECURE_SCHEME => true,
            _ => return Err(EndpointError::UnsupportedScheme(scheme.to_owned())),
        };

        let (host_port, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, "/"),
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| EndpointError::InvalidPort(port.to_owned()))?;
                (host, port)
            }
            None => (host_port, default_port(secure)),
        };

        if host.is_empty() {
            return Err(EndpointError::EmptyHost(url.to_owned()));
        }

        Ok(Self {
            secure,
            host: host.to_owned(),
            port,
            path: path.to_owned(),
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure { SECURE_SCHEME } else { PLAIN_SCHEME }
    }

    /// Canonical URL with the port always spelled out.
    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme(), self.host, self.port, self.path)
    }
}

fn default_port(secure: bool) -> u16 {
    if secure { 443 } else { 80 }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_and_path() {
        let ep = Endpoint::parse("ws://192.168.1.10:8000/ws/12345").unwrap();
        assert!(!ep.secure);
        assert_eq!(ep.host, "192.168.1.10");
        assert_eq!(ep.port, 8000);
        assert_eq!(ep.path, "/ws/12345");
    }

    #[test]
    fn default_ports_follow_scheme() {
        assert_eq!(Endpoint::parse("ws://scores.local/ws/1").unwrap().port, 80);
        let secure = Endpoint::parse("wss://scores.example.com/ws/1").unwrap();
        assert!(secure.secure);
        assert_eq!(secure.port, 443);
    }

    #[test]
    fn missing_path_defaults_to_root() {
        let ep = Endpoint::parse("ws://localhost:8000").unwrap();
        assert_eq!(ep.path, "/");
        assert_eq!(ep.url(), "ws://localhost:8000/");
    }

    #[test]
    fn query_string_stays_with_the_path() {
        let ep = Endpoint::parse("wss://host/ws/9?v=2").unwrap();
        assert_eq!(ep.path, "/ws/9?v=2");
    }

    #[test]
    fn malformed_urls_fail_fast() {
        assert_eq!(
            Endpoint::parse("localhost:8000/ws"),
            Err(EndpointError::MissingScheme("localhost:8000/ws".into()))
        );
        assert_eq!(
            Endpoint::parse("http://localhost/ws"),
            Err(EndpointError::UnsupportedScheme("http".into()))
        );
        assert_eq!(
            Endpoint::parse("ws://:8000/ws"),
            Err(EndpointError::EmptyHost("ws://:8000/ws".into()))
        );
        assert_eq!(
            Endpoint::parse("ws://localhost:eighty/ws"),
            Err(EndpointError::InvalidPort("eighty".into()))
        );
        assert!(Endpoint::parse("ws://localhost:70000/").is_err());
    }

    #[test]
    fn url_round_trips_through_parse() {
        let ep = Endpoint::parse("WSS://scores.example.com:9443/ws/abc").unwrap();
        assert_eq!(ep.url(), "wss://scores.example.com:9443/ws/abc");
        assert_eq!(Endpoint::parse(&ep.url()).unwrap(), ep);
    }
}
