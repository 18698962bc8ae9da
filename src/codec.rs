// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Encoding of the tree to the bytes of the backing file, and back.
//!
//! The [`Codec`] trait is the seam between the store and its on-disk format. The store only ever
//! hands the codec the root [`Map`] and only ever expects a root [`Map`] back; everything else
//! about the format is up to the implementor. [`JsonCodec`] is the default.
use crate::{adapt::adapt_map, error::CodecError, value::Map};

/// Turns a root mapping into bytes and back.
pub trait Codec {
    /// Encodes the full tree, stripped to its plain shape.
    fn encode(&self, root: &Map) -> Result<Vec<u8>, CodecError>;

    /// Decodes bytes previously produced by [`Codec::encode`].
    ///
    /// Must fail if the bytes do not describe a mapping at the top level.
    fn decode(&self, bytes: &[u8]) -> Result<Map, CodecError>;
}

/// Stores the tree as a single JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// A codec producing compact single-line JSON.
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// A codec producing indented, human-friendly JSON.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, root: &Map) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(root)?
        } else {
            serde_json::to_vec(root)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Map, CodecError> {
        match serde_json::from_slice::<serde_json::Value>(bytes)? {
            serde_json::Value::Object(entries) => Ok(adapt_map(entries)),
            other => Err(format!("expected a JSON object at the top level, found {other}").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;

    fn sample() -> Map {
        Map::from(
            json!({ "team": { "goaly": "neuer" }, "subs": ["mueller", "ribery"] })
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    #[test]
    fn compact_encoding() {
        let bytes = JsonCodec::compact().encode(&sample()).unwrap();
        assert_snapshot!(String::from_utf8(bytes).unwrap(), @r#"{"team":{"goaly":"neuer"},"subs":["mueller","ribery"]}"#);
    }

    #[test]
    fn pretty_encoding() {
        let bytes = JsonCodec::pretty().encode(&sample()).unwrap();
        assert_snapshot!(String::from_utf8(bytes).unwrap(), @r#"
        {
          "team": {
            "goaly": "neuer"
          },
          "subs": [
            "mueller",
            "ribery"
          ]
        }
        "#);
    }

    #[test]
    fn decode_round_trips() {
        let codec = JsonCodec::default();
        let bytes = codec.encode(&sample()).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn decode_rejects_non_objects() {
        let err = JsonCodec::default().decode(b"[1, 2]").unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(JsonCodec::default().decode(b"{\"team\": ").is_err());
    }
}
