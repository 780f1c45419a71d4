//! Test helpers: in-memory ZIP fixtures and a mock resource client.

use async_trait::async_trait;
use bytes::Bytes;
use resource_preview::{FetchError, ResourceClient, ResourceMetadata};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use zip::write::FileOptions;
use zip::ZipWriter;

/// A fixture entry: a path ending in `/` is a directory, otherwise a file with contents.
pub enum Fixture<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Build an in-memory ZIP from fixtures, in the given order.
pub fn zip_bytes(entries: &[Fixture<'_>]) -> Bytes {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        match entry {
            Fixture::Dir(path) => writer
                .add_directory(*path, FileOptions::default())
                .expect("add directory"),
            Fixture::File(path, data) => {
                writer
                    .start_file(*path, FileOptions::default())
                    .expect("start file");
                writer.write_all(data).expect("write file");
            }
        }
    }
    let cursor = writer.finish().expect("finish zip");
    Bytes::from(cursor.into_inner())
}

/// The `a/`, `a/b.txt`, `a/c/d.png` layout used across tests.
pub fn nested_zip() -> Bytes {
    zip_bytes(&[
        Fixture::Dir("a/"),
        Fixture::File("a/b.txt", b"hello"),
        Fixture::File("a/c/d.png", &PNG_HEADER),
    ])
}

/// A stored, empty entry whose ZIP64 central directory record declares `declared` bytes.
///
/// Nothing is ever decompressed from it; only the header lies about the size.
pub fn zip64_declaring(name: &str, declared: u64) -> Bytes {
    let name = name.as_bytes();
    let name_len = name.len() as u16;
    let mut out: Vec<u8> = Vec::new();

    // local file header
    out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes()); // version needed
    out.extend_from_slice(&0u16.to_le_bytes()); // flags
    out.extend_from_slice(&0u16.to_le_bytes()); // stored
    out.extend_from_slice(&0u32.to_le_bytes()); // time + date
    out.extend_from_slice(&0u32.to_le_bytes()); // crc32
    out.extend_from_slice(&0u32.to_le_bytes()); // compressed size
    out.extend_from_slice(&u32::MAX.to_le_bytes()); // uncompressed size in zip64 extra
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // extra length
    out.extend_from_slice(name);

    let central_offset = out.len() as u32;

    // central directory header
    out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes()); // version made by
    out.extend_from_slice(&45u16.to_le_bytes()); // version needed
    out.extend_from_slice(&0u16.to_le_bytes()); // flags
    out.extend_from_slice(&0u16.to_le_bytes()); // stored
    out.extend_from_slice(&0u32.to_le_bytes()); // time + date
    out.extend_from_slice(&0u32.to_le_bytes()); // crc32
    out.extend_from_slice(&0u32.to_le_bytes()); // compressed size
    out.extend_from_slice(&u32::MAX.to_le_bytes()); // uncompressed size in zip64 extra
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(&12u16.to_le_bytes()); // extra length
    out.extend_from_slice(&0u16.to_le_bytes()); // comment length
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
    out.extend_from_slice(&0u32.to_le_bytes()); // external attributes
    out.extend_from_slice(&0u32.to_le_bytes()); // local header offset
    out.extend_from_slice(name);
    out.extend_from_slice(&0x0001u16.to_le_bytes()); // zip64 extended information
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&declared.to_le_bytes());

    let central_size = out.len() as u32 - central_offset;

    // end of central directory
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&central_size.to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    Bytes::from(out)
}

pub const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn metadata(id: u64, file_name: &str, resource_type: &str) -> ResourceMetadata {
    ResourceMetadata {
        id,
        title: file_name.to_string(),
        description: String::new(),
        resource_type: resource_type.to_string(),
        file_name: Some(file_name.to_string()),
        file_type: None,
        file_size: None,
    }
}

/// Serves resources from memory; unknown ids return `NotFound`.
#[derive(Default)]
pub struct MockClient {
    resources: HashMap<u64, Bytes>,
    downloads: AtomicUsize,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, id: u64, data: impl Into<Bytes>) -> Self {
        self.resources.insert(id, data.into());
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceClient for MockClient {
    async fn download_resource(&self, id: u64) -> Result<Bytes, FetchError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.resources
            .get(&id)
            .cloned()
            .ok_or(FetchError::NotFound(id))
    }

    fn client_type(&self) -> &str {
        "Mock"
    }
}
