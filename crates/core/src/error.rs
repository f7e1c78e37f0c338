/// Unified error type for the logging facility.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("enrichment failed in stage {stage}: {message}")]
    Enrich {
        stage: &'static str,
        message: String,
    },
}
