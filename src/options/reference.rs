use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::ValidationError;

static PATH_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("path component pattern is valid")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w][\w.-]{0,127}$").expect("tag pattern is valid"));

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*(?::[0-9]+)?$")
        .expect("domain pattern is valid")
});

static DIGEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[.+_-][a-z0-9]+)*:[a-fA-F0-9]{32,}$").expect("digest pattern is valid")
});

/// An image reference: `repository[:tag][@digest]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    pub fn parse(reference: &str) -> Result<Self, ValidationError> {
        let fail = |reason: &str| ValidationError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => {
                if !DIGEST.is_match(digest) {
                    return Err(fail("invalid digest"));
                }
                (name, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // A colon after the last slash starts the tag; earlier colons belong
        // to a registry port.
        let last_slash = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                let tag = &name[split + 1..];
                if !TAG.is_match(tag) {
                    return Err(fail("invalid tag"));
                }
                (&name[..split], Some(tag.to_string()))
            }
            None => (name, None),
        };

        if repository.is_empty() {
            return Err(fail("repository name is empty"));
        }

        let mut components = repository.split('/').peekable();
        if let Some(first) = components.peek() {
            let is_domain = repository.contains('/')
                && (first.contains('.') || first.contains(':') || *first == "localhost");
            if is_domain {
                if !DOMAIN.is_match(first) {
                    return Err(fail(&format!("invalid registry domain '{first}'")));
                }
                components.next();
            }
        }
        for component in components {
            if !PATH_COMPONENT.is_match(component) {
                return Err(fail(&format!(
                    "repository component '{component}' must be lowercase alphanumerics and separators"
                )));
            }
        }

        Ok(Self {
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Registry host named by the reference, if any.
    pub fn domain(&self) -> Option<&str> {
        let (first, _) = self.repository.split_once('/')?;
        (first.contains('.') || first.contains(':') || first == "localhost").then_some(first)
    }

    /// Digest if pinned, otherwise tag. This is the `tag` query value the
    /// engine expects for pull and push.
    pub fn digest_or_tag(&self) -> Option<&str> {
        self.digest.as_deref().or(self.tag.as_deref())
    }
}

impl FromStr for ImageReference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repository)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}
