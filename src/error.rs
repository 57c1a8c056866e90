//! Structured error types for the Folio layout engine.
//!
//! Only image loading failures are recoverable: the layout engine catches
//! them and draws a placeholder line instead. Everything else propagates out
//! of the render call.

use thiserror::Error;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// Render options JSON failed to parse.
    #[error("Failed to parse render options: {source}{}", hint_suffix(.hint))]
    Config {
        source: serde_json::Error,
        hint: String,
    },
    /// An image could not be read or decoded.
    #[error("Image error: {0}")]
    Image(String),
    /// An image URL could not be fetched.
    #[error("Failed to fetch image '{src}': {source}")]
    Fetch {
        src: String,
        source: reqwest::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The drawing surface was used incorrectly (bad page index, etc.).
    #[error("Render error: {0}")]
    Render(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the render options schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::Config { source: e, hint }
    }
}

impl FolioError {
    /// Whether the layout engine may degrade instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FolioError::Image(_) | FolioError::Fetch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_carries_hint() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{ \"a\": 1, }")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("Hint: Check for trailing commas"), "{}", msg);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn image_errors_are_recoverable() {
        assert!(FolioError::Image("bad".into()).is_recoverable());
        assert!(!FolioError::Render("bad page".into()).is_recoverable());
    }
}
