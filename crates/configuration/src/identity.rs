//! Structured identity derived from the connection URI.
//!
//! The URI has the strict positional shape `user/password@host:port/service/instance`. Every
//! delimiter must appear exactly where it is expected; anything else is an [`IdentityError`].

use std::fmt;

use crate::error::IdentityError;

/// The pieces of a connection URI. Every emitted metric is tagged with the non-empty ones.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    pub full: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub service: String,
    pub instance: String,
}

impl ConnectionIdentity {
    /// Split a connection URI into its identity components.
    pub fn parse(uri: &str) -> Result<Self, IdentityError> {
        let (credentials, address) = match split_exact::<2>(uri, '@') {
            Some([credentials, address]) => (credentials, address),
            None => {
                return Err(IdentityError::MissingAt {
                    uri: redact(uri),
                })
            }
        };

        let [user, password] =
            split_exact::<2>(credentials, '/').ok_or_else(|| IdentityError::MalformedCredentials {
                uri: redact(uri),
                segment: "<credentials>".to_string(),
            })?;

        let [host, target] =
            split_exact::<2>(address, ':').ok_or_else(|| IdentityError::MalformedAddress {
                uri: redact(uri),
                segment: address.to_string(),
            })?;

        let [port, service, instance] =
            split_exact::<3>(target, '/').ok_or_else(|| IdentityError::MalformedTarget {
                uri: redact(uri),
                segment: target.to_string(),
            })?;

        if host.is_empty() {
            return Err(IdentityError::EmptyHost { uri: redact(uri) });
        }

        Ok(ConnectionIdentity {
            full: uri.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port: port.to_string(),
            service: service.to_string(),
            instance: instance.to_string(),
        })
    }

    /// Replace the URI-derived instance with a fixed label.
    #[must_use]
    pub fn with_instance_label(mut self, label: Option<&str>) -> Self {
        if let Some(label) = label {
            self.instance = label.to_string();
        }
        self
    }
}

/// Never print the password.
impl fmt::Debug for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionIdentity")
            .field("full", &redact(&self.full))
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service", &self.service)
            .field("instance", &self.instance)
            .finish()
    }
}

/// Split on `delimiter`, succeeding only when there are exactly `N` parts.
fn split_exact<const N: usize>(input: &str, delimiter: char) -> Option<[&str; N]> {
    let mut parts = [""; N];
    let mut count = 0;
    for part in input.split(delimiter) {
        if count == N {
            return None;
        }
        parts[count] = part;
        count += 1;
    }
    (count == N).then_some(parts)
}

/// Mask everything between the first '/' and the '@' of a URI.
fn redact(uri: &str) -> String {
    match (uri.find('/'), uri.rfind('@')) {
        (Some(slash), Some(at)) if slash < at => format!("{}/***{}", &uri[..slash], &uri[at..]),
        _ => uri.to_string(),
    }
}
