//! Object container: header, then blocks of encoded records.
//!
//! ```text
//! header := "Obj" 0x01, meta map<bytes>, sync[16]
//! block  := count: long, size: long, records[size], sync[16]
//! ```
//!
//! The metadata carries the schema JSON (`avro.schema`) and the codec
//! (`avro.codec`, always `null` here). Records carry no field names.

use std::io::Write;

use crate::decode::{Reader, decode_record};
use crate::encode::{write_bytes, write_long};
use crate::error::DecodeError;
use crate::schema::{RecordSchema, rabin_fingerprint};
use crate::value::Record;

pub const MAGIC: [u8; 4] = [b'O', b'b', b'j', 1];
pub const SYNC_SIZE: usize = 16;
/// Block is flushed once its encoded records exceed this many bytes.
pub const SYNC_INTERVAL: usize = 64_000;

const SCHEMA_KEY: &str = "avro.schema";
const CODEC_KEY: &str = "avro.codec";
const NULL_CODEC: &str = "null";

/// Sync marker derived from the schema, so identical input gives identical output.
pub fn sync_marker_for(schema: &RecordSchema) -> [u8; SYNC_SIZE] {
    let a = schema.fingerprint();
    let b = rabin_fingerprint(&a.to_le_bytes());
    let mut sync = [0u8; SYNC_SIZE];
    sync[..8].copy_from_slice(&a.to_le_bytes());
    sync[8..].copy_from_slice(&b.to_le_bytes());
    sync
}

// ═══════════════════════════════════════════════════════════════
//  Writer
// ═══════════════════════════════════════════════════════════════

/// Appends encoded records to an output stream, block by block.
pub struct ContainerWriter<W: Write> {
    inner: W,
    sync: [u8; SYNC_SIZE],
    block: Vec<u8>,
    block_count: u64,
    blocks_written: u64,
    bytes_written: u64,
}

impl<W: Write> ContainerWriter<W> {
    /// Writes the header immediately.
    pub fn new(inner: W, schema: &RecordSchema) -> std::io::Result<Self> {
        Self::with_sync_marker(inner, schema, sync_marker_for(schema))
    }

    pub fn with_sync_marker(
        mut inner: W,
        schema: &RecordSchema,
        sync: [u8; SYNC_SIZE],
    ) -> std::io::Result<Self> {
        let mut header = Vec::with_capacity(256);
        header.extend_from_slice(&MAGIC);

        let schema_json = schema.to_json().to_string();
        write_long(2, &mut header);
        write_bytes(SCHEMA_KEY.as_bytes(), &mut header);
        write_bytes(schema_json.as_bytes(), &mut header);
        write_bytes(CODEC_KEY.as_bytes(), &mut header);
        write_bytes(NULL_CODEC.as_bytes(), &mut header);
        write_long(0, &mut header);
        header.extend_from_slice(&sync);

        inner.write_all(&header)?;

        Ok(Self {
            inner,
            sync,
            block: Vec::new(),
            block_count: 0,
            blocks_written: 0,
            bytes_written: header.len() as u64,
        })
    }

    /// Appends one already-encoded record.
    pub fn append(&mut self, record: &[u8]) -> std::io::Result<()> {
        self.block.extend_from_slice(record);
        self.block_count += 1;
        if self.block.len() >= SYNC_INTERVAL {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes the pending block, if any.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.block_count == 0 {
            return Ok(());
        }

        let mut prefix = Vec::with_capacity(20);
        write_long(self.block_count as i64, &mut prefix);
        write_long(self.block.len() as i64, &mut prefix);

        self.inner.write_all(&prefix)?;
        self.inner.write_all(&self.block)?;
        self.inner.write_all(&self.sync)?;

        tracing::debug!(
            records = self.block_count,
            bytes = self.block.len(),
            "flushed block"
        );

        self.bytes_written += (prefix.len() + self.block.len() + SYNC_SIZE) as u64;
        self.blocks_written += 1;
        self.block.clear();
        self.block_count = 0;
        Ok(())
    }

    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flushes the pending block and returns the underlying stream.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.flush()?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Reader
// ═══════════════════════════════════════════════════════════════

/// Parsed container header plus a cursor over its blocks.
pub struct ContainerReader<'a> {
    reader: Reader<'a>,
    sync: [u8; SYNC_SIZE],
    embedded_schema: Option<String>,
}

impl<'a> ContainerReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        if reader.read_exact(MAGIC.len()).map_err(|_| DecodeError::BadMagic)? != MAGIC {
            return Err(DecodeError::BadMagic);
        }

        let mut embedded_schema = None;
        let mut codec = None;
        loop {
            let offset = reader.position();
            let mut count = reader.read_long()?;
            if count == 0 {
                break;
            }
            if count < 0 {
                // Negative count: block byte size follows, unused here.
                count = count
                    .checked_neg()
                    .ok_or(DecodeError::NegativeLength { offset, value: count })?;
                reader.read_long()?;
            }
            for _ in 0..count {
                let key = reader.read_string()?;
                let offset = reader.position();
                let value = reader.read_bytes()?;
                let text = || {
                    std::str::from_utf8(value)
                        .map(str::to_string)
                        .map_err(|_| DecodeError::InvalidUtf8 { offset })
                };
                match key.as_str() {
                    SCHEMA_KEY => embedded_schema = Some(text()?),
                    CODEC_KEY => codec = Some(text()?),
                    _ => {}
                }
            }
        }

        if let Some(c) = codec.filter(|c| c != NULL_CODEC) {
            return Err(DecodeError::UnsupportedCodec(c));
        }

        let mut sync = [0u8; SYNC_SIZE];
        sync.copy_from_slice(reader.read_exact(SYNC_SIZE)?);

        Ok(Self { reader, sync, embedded_schema })
    }

    /// Schema JSON stored in the header, if any.
    pub fn embedded_schema(&self) -> Option<&str> {
        self.embedded_schema.as_deref()
    }

    pub fn sync_marker(&self) -> &[u8; SYNC_SIZE] {
        &self.sync
    }

    /// Decodes every block with `schema`, in file order.
    pub fn read_all(mut self, schema: &RecordSchema) -> Result<Vec<Record>, DecodeError> {
        let mut records = Vec::new();
        let mut block = 0u64;

        while !self.reader.is_empty() {
            block += 1;
            let count_offset = self.reader.position();
            let count = self.reader.read_long()?;
            if count < 0 {
                return Err(DecodeError::NegativeLength { offset: count_offset, value: count });
            }
            let offset = self.reader.position();
            let declared = self.reader.read_long()?;
            let size = usize::try_from(declared)
                .map_err(|_| DecodeError::NegativeLength { offset, value: declared })?;
            let data = self.reader.read_exact(size)?;

            let mut block_reader = Reader::new(data);
            for _ in 0..count {
                records.push(decode_record(schema, &mut block_reader)?);
            }
            if !block_reader.is_empty() {
                return Err(DecodeError::BlockSize {
                    block,
                    declared: size,
                    used: block_reader.position(),
                });
            }

            if self.reader.read_exact(SYNC_SIZE)? != self.sync {
                return Err(DecodeError::SyncMismatch { block });
            }
        }

        Ok(records)
    }
}
