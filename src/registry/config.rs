//! Registry configuration

/// Source registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of the registration notification channel
    pub event_capacity: usize,

    /// Per-source frame channel capacity (frames a slow session may lag)
    pub frame_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            frame_capacity: 16,
        }
    }
}

impl RegistryConfig {
    /// Set notification channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Set per-source frame channel capacity
    pub fn frame_capacity(mut self, capacity: usize) -> Self {
        self.frame_capacity = capacity.max(1);
        self
    }
}
