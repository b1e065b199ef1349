//! Fetched document payload

/// Raw result of fetching one document: HTTP status plus the text body
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    status: u16,
    body: String,
}

impl FetchedDocument {
    /// Create a new fetched document
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Check if the response was successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(FetchedDocument::new(200, "ok").is_success());
        assert!(FetchedDocument::new(204, "").is_success());
        assert!(!FetchedDocument::new(304, "").is_success());
        assert!(!FetchedDocument::new(404, "nope").is_success());
        assert!(!FetchedDocument::new(500, "err").is_success());
    }
}
