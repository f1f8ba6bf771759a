//! Registry configuration

/// Subscriber registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    /// Maximum number of subscribers (0 = unlimited)
    pub max_subscribers: usize,
}

impl RegistryConfig {
    /// Set the subscriber limit (0 = unlimited)
    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.max_subscribers = max;
        self
    }

    /// Whether `count` subscribers already fill the registry
    pub(crate) fn is_full(&self, count: usize) -> bool {
        self.max_subscribers > 0 && count >= self.max_subscribers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_subscribers, 0);
        assert!(!config.is_full(usize::MAX));
    }

    #[test]
    fn test_limit() {
        let config = RegistryConfig::default().max_subscribers(2);
        assert!(!config.is_full(1));
        assert!(config.is_full(2));
    }
}
