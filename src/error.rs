use thiserror::Error;

/// Failure talking to the quota store.
///
/// Always distinct from a quota denial: a `StoreError` means the admission
/// check could not be completed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("quota store unavailable: {0}")]
    Unavailable(String),

    #[error("quota record still contended after {attempts} attempts")]
    Contention { attempts: u32 },

    #[error("quota record could not be encoded or decoded: {0}")]
    Serialization(String),

    #[error("quota store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Unavailable(format!("request timed out: {}", err))
        } else if err.is_decode() {
            StoreError::Serialization(err.to_string())
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

/// Failure of the text generation backend, only ever seen after admission.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend timed out")]
    Timeout,

    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation response could not be decoded: {0}")]
    Decode(String),

    #[error("generation backend returned no text")]
    EmptyText,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else if err.is_decode() {
            GenerationError::Decode(err.to_string())
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

/// Failure calling the chat platform's REST api.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("discord request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("discord returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// An interaction that cannot be turned into a story request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("interaction carries no command data")]
    MissingData,

    #[error("interaction has no invoking user")]
    MissingUser,

    #[error("missing required option `{0}`")]
    MissingOption(&'static str),

    #[error("option `{0}` has the wrong type")]
    InvalidOption(&'static str),
}

/// Interaction request that does not carry a valid platform signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("public key is not a valid ed25519 key")]
    InvalidKey,

    #[error("missing signature header `{0}`")]
    MissingHeader(&'static str),

    #[error("signature is not valid hex ed25519")]
    Malformed,

    #[error("signature does not match request")]
    Mismatch,
}
