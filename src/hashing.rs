//! Content addressing: blob/tree ids are lowercase hex SHA-256, snapshot ids
//! are a short decimal form derived from the same hash.

use std::io;
use std::io::prelude::*;

use sha2::{Digest, Sha256};

/// `sha256(bytes)` as lowercase hex, the id of a blob or a canonical-JSON tree.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    data_encoding_hex(&digest)
}

fn data_encoding_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// `"s_" + dec(int(sha256(tree_id || parent).hex[:8], 16))`.
///
/// `parent` is the empty string when there is none — that's part of the
/// formula, not a stand-in for `Option::None`, so an empty repo's root
/// snapshot id differs from any snapshot whose literal parent field happens
/// to print as `""`.
pub fn compute_snapshot_id(tree_id: &str, parent: &str) -> String {
    let mut buf = Vec::with_capacity(tree_id.len() + parent.len());
    buf.extend_from_slice(tree_id.as_bytes());
    buf.extend_from_slice(parent.as_bytes());
    let digest = Sha256::digest(&buf);
    let hex = data_encoding_hex(&digest);
    let prefix = &hex[..8];
    let n = u32::from_str_radix(prefix, 16).expect("8 hex chars always parse as u32");
    format!("s_{n}")
}

pub struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    pub fn finalize(self) -> (String, R) {
        (data_encoding_hex(&self.hasher.finalize()), self.inner)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.inner.read(buf)?;
        self.hasher.update(&buf[..count]);
        Ok(count)
    }
}

pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    pub fn finalize(self) -> (String, W) {
        (data_encoding_hex(&self.hasher.finalize()), self.inner)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let count = self.inner.write(buf)?;
        self.hasher.update(&buf[..count]);
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blob_id_is_sha256_hex() {
        let id = hash_bytes(b"hi\n");
        assert!(id.starts_with("0ebdc"));
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn reader_and_writer_agree() -> io::Result<()> {
        let data = b"Developers, developers, developers, developers!";
        let mut r = HashingReader::new(&data[..]);
        io::copy(&mut r, &mut io::sink())?;
        let (from_reader, _) = r.finalize();

        let mut w = HashingWriter::new(io::sink());
        w.write_all(data)?;
        let (from_writer, _) = w.finalize();

        assert_eq!(from_reader, from_writer);
        assert_eq!(from_reader, hash_bytes(data));
        Ok(())
    }

    #[test]
    fn snapshot_id_matches_s1_formula() {
        let mut tree = crate::objects::Tree::new();
        tree.insert("hello.txt", hash_bytes(b"hello\n"));
        let canonical = crate::canonical_json::to_canonical_bytes(&tree).unwrap();
        assert_eq!(
            canonical,
            format!(
                r#"{{"entries":{{"hello.txt":{{"id":"{}","type":"blob"}}}}}}"#,
                hash_bytes(b"hello\n")
            )
            .into_bytes()
        );

        let tree_id = hash_bytes(&canonical);
        let id = compute_snapshot_id(&tree_id, "");
        assert!(id.starts_with("s_"));
        let n: u64 = id[2..].parse().expect("decimal suffix");
        assert!(n <= u32::MAX as u64);
    }

    #[test]
    fn snapshot_id_is_deterministic() {
        let a = compute_snapshot_id("abc", "");
        let b = compute_snapshot_id("abc", "");
        assert_eq!(a, b);
        let c = compute_snapshot_id("abc", "s_1");
        assert_ne!(a, c);
    }
}
