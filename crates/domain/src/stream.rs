use serde::Serialize;

/// Events emitted while a batch submission is serviced.
///
/// A batch yields one `Item` per input text, in the original index
/// order, followed by a terminal `Complete`. A pre-flight failure
/// (engine loading or gone) yields a single `Error` and nothing else.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum BatchEvent {
    /// One input serviced. `translation` is `None` on failure, timeout,
    /// empty output, or scope cancellation.
    #[serde(rename = "result")]
    Item {
        index: usize,
        total: usize,
        text: String,
        translation: Option<String>,
    },

    /// Every input has been serviced.
    #[serde(rename = "complete")]
    Complete,

    /// The batch could not be serviced at all.
    #[serde(rename = "error")]
    Error { message: String },
}
