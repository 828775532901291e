/// Header label of the column that supplies folder names by default.
pub const DEFAULT_COLUMN: &str = "Base Document Reference";

/// Upper bound on folder creations running at the same time by default.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Settings shared by the extractor and the materializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorConfig {
    /// Header label of the identifier column.
    pub column: String,
    /// Field delimiter of the source file.
    pub delimiter: u8,
    /// Maximum number of concurrent folder creations. Never below 1.
    pub max_in_flight: usize,
}

impl Default for CreatorConfig {
    fn default() -> Self {
        CreatorConfig {
            column: DEFAULT_COLUMN.to_string(),
            delimiter: b',',
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl CreatorConfig {
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the concurrency bound. Zero is clamped to one.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CreatorConfig::default();
        assert_eq!(config.column, "Base Document Reference");
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.max_in_flight, DEFAULT_MAX_IN_FLIGHT);
    }

    #[test]
    fn test_zero_max_in_flight_is_clamped() {
        let config = CreatorConfig::default().with_max_in_flight(0);
        assert_eq!(config.max_in_flight, 1);
    }
}
