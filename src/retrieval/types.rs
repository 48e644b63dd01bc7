use serde::Deserialize;

/// One ranked snippet returned by the knowledge service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub similarity: f64,
    #[serde(default)]
    pub source_id: Option<String>,
}

/// Reply to one retrieval query. `success: false` with an empty chunk list is
/// how the service reports "nothing found" without erroring.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrievalReply {
    pub success: bool,
    #[serde(default)]
    pub chunks: Vec<RetrievedChunk>,
}

impl RetrievalReply {
    pub fn top_chunk(&self) -> Option<&RetrievedChunk> {
        self.chunks.first()
    }
}
