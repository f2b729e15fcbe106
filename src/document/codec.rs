//! Persistence hook for styled text

use super::{StyleAttributes, StyledDocument, StyledRun};
use crate::error::CodecError;
use serde::{Deserialize, Serialize};

/// Converts between a persisted blob and a styled document
///
/// Hosts plug their own formats in here; the core only ships [`JsonCodec`].
pub trait RichTextCodec {
    fn decode(&self, blob: &[u8]) -> Result<StyledDocument, CodecError>;
    fn encode(&self, doc: &StyledDocument) -> Result<Vec<u8>, CodecError>;
}

/// Serialized form of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub text: String,
    pub runs: Vec<StyledRun>,
    #[serde(default)]
    pub defaults: StyleAttributes,
}

impl From<&StyledDocument> for DocumentSnapshot {
    fn from(doc: &StyledDocument) -> Self {
        Self {
            text: doc.text(),
            runs: doc.runs().to_vec(),
            defaults: doc.default_attributes().clone(),
        }
    }
}

impl TryFrom<DocumentSnapshot> for StyledDocument {
    type Error = CodecError;

    fn try_from(snapshot: DocumentSnapshot) -> Result<Self, Self::Error> {
        let doc = StyledDocument::from_runs(&snapshot.text, snapshot.runs)?;
        Ok(doc.with_defaults(snapshot.defaults))
    }
}

/// JSON snapshot codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RichTextCodec for JsonCodec {
    fn decode(&self, blob: &[u8]) -> Result<StyledDocument, CodecError> {
        let snapshot: DocumentSnapshot = serde_json::from_slice(blob)?;
        StyledDocument::try_from(snapshot)
    }

    fn encode(&self, doc: &StyledDocument) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&DocumentSnapshot::from(doc))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StyleChange;
    use crate::editing::EditOp;

    #[test]
    fn test_json_preserves_styles() {
        let mut doc = StyledDocument::from_plain_text("Title\nbody", StyleAttributes::default());
        doc.apply_edit(EditOp::format(
            0..5,
            StyleChange {
                bold: Some(true),
                size: Some(24.0),
                ..Default::default()
            },
        ))
        .unwrap();

        let blob = JsonCodec.encode(&doc).unwrap();
        let decoded = JsonCodec.decode(&blob).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_decode_rejects_bad_runs() {
        let blob = br#"{"text":"abc","runs":[]}"#;
        assert!(matches!(
            JsonCodec.decode(blob),
            Err(CodecError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_load_falls_back_to_plain_text() {
        let doc = StyledDocument::load(
            Some(&b"not json"[..]),
            Some("plain words"),
            &JsonCodec,
            StyleAttributes::default(),
        );
        assert_eq!(doc.text(), "plain words");

        let empty = StyledDocument::load(None, None, &JsonCodec, StyleAttributes::default());
        assert!(empty.is_empty());
    }
}
