/// Media storage collaborator. The engine keeps opaque keys for audio and
/// image assets; turning a key into something a client can retrieve is the
/// storage layer's business.
pub trait MediaStorage: Send + Sync {
    fn resolve(&self, key: &str) -> String;
}

/// Hands the key back unchanged. Useful in tests and wherever the caller
/// resolves keys itself.
pub struct PassthroughMedia;

impl MediaStorage for PassthroughMedia {
    fn resolve(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Prefixes keys with a configured base URL.
pub struct BaseUrlMedia {
    base_url: String,
}

impl BaseUrlMedia {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl MediaStorage for BaseUrlMedia {
    fn resolve(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_resolution() {
        let media = BaseUrlMedia::new("https://assets.example.com/".into());
        assert_eq!(
            media.resolve("audio/section-1.mp3"),
            "https://assets.example.com/audio/section-1.mp3"
        );
    }
}
