use serde_json::Value;

/// Decoded 200 payload from the restriction registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictionReport {
    pub has_restriction: bool,
    pub name: Option<String>,
    pub document_id: Option<String>,
    /// Payload as received, kept for the audit trail.
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BureauReply {
    Report(RestrictionReport),
    /// The registry holds no record for the document. Not a restriction.
    NotFound,
}
