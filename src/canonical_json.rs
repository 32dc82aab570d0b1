//! Canonical JSON: UTF-8, sorted keys at every level, no insignificant
//! whitespace, no trailing newline. This is the byte encoding that content
//! addressing for trees is built on; divergence here breaks cross-repo id
//! compatibility, so it's a single function everything else calls through.
//!
//! `serde_json::Map` is a `BTreeMap` under the hood as long as the
//! `preserve_order` feature stays off, so once a value lives in a
//! `serde_json::Value::Object` its keys come out sorted regardless of
//! insertion order. But a struct serialized straight to bytes never goes
//! through that map at all — `Serializer::serialize_struct` writes each
//! field as it's visited, in declaration order. So we always round-trip
//! through `serde_json::Value` first: that's what actually forces sorting
//! at every nesting level, including inside structs whose field order
//! doesn't happen to match key order.

use serde::Serialize;

pub fn to_canonical_bytes<T: Serialize>(value: &T) -> anyhow::Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&value)?)
}

pub fn to_canonical_string<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn sorted_no_whitespace() {
        let mut m = BTreeMap::new();
        m.insert("zebra", 1);
        m.insert("apple", 2);
        let s = to_canonical_string(&m).unwrap();
        assert_eq!(s, r#"{"apple":2,"zebra":1}"#);
    }

    #[test]
    fn struct_field_declaration_order_is_overridden_by_key_sort() {
        #[derive(Serialize)]
        struct OutOfOrder {
            #[serde(rename = "type")]
            kind: String,
            id: String,
        }
        let s = to_canonical_string(&OutOfOrder {
            kind: "blob".to_string(),
            id: "0ebdc".to_string(),
        })
        .unwrap();
        assert_eq!(s, r#"{"id":"0ebdc","type":"blob"}"#);
    }
}
