pub type VitrineResult<T> = Result<T, VitrineError>;

#[derive(thiserror::Error, Debug)]
pub enum VitrineError {
    #[error("validation error: {0}")]
    Validation(String),

    /// A precondition for starting (or continuing) a generation run was not
    /// met: backend unreachable, empty item selection, a run already in
    /// progress, or a cooperative cancel. No partial session is left behind.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A drawing surface or raster context could not be obtained. Fatal.
    #[error("surface error: {0}")]
    Surface(String),

    /// The capture/encode session could not start or produced no data. Fatal.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VitrineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            VitrineError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            VitrineError::precondition("x")
                .to_string()
                .contains("precondition failed:")
        );
        assert!(
            VitrineError::surface("x")
                .to_string()
                .contains("surface error:")
        );
        assert!(
            VitrineError::encoding("x")
                .to_string()
                .contains("encoding error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = VitrineError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
