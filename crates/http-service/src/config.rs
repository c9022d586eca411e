/// The address of the backend when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Builder for [`HttpServiceConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HttpServiceConfigBuilder {
    base_url: Option<String>,
}

impl HttpServiceConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpServiceConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        HttpServiceConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Configuration for the HTTP question-answering service.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpServiceConfig {
    pub(crate) base_url: String,
}

impl HttpServiceConfig {
    /// Returns the base URL, without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[inline]
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = HttpServiceConfigBuilder::new().build();
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
        assert_eq!(config.endpoint("/chat"), "http://127.0.0.1:8000/chat");
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = HttpServiceConfigBuilder::new()
            .with_base_url("https://qa.example.com/api/")
            .build();
        assert_eq!(
            config.endpoint("/suggested-questions"),
            "https://qa.example.com/api/suggested-questions"
        );
    }
}
