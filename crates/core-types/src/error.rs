use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Unknown statistic column '{0}'")]
    UnknownStat(String),

    #[error("Unsupported position '{0}' (expected RB or WR)")]
    UnknownPosition(String),
}
