use crate::error::DecodeError;
use crate::schema::{RecordSchema, SchemaType};
use crate::value::{Record, Value};

/// Longest varint an i64 can need.
const MAX_VARINT_LEN: usize = 10;

/// Cursor over an in-memory byte buffer.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_exact(1)?[0])
    }

    /// Reads one zig-zag varint.
    pub fn read_long(&mut self) -> Result<i64, DecodeError> {
        let start = self.pos;
        let mut v: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let b = self.read_byte()?;
            // The last group holds the single remaining bit of a u64.
            if i == MAX_VARINT_LEN - 1 && b > 1 {
                return Err(DecodeError::VarintOverflow { offset: start });
            }
            v |= u64::from(b & 0x7f) << (7 * i);
            if b & 0x80 == 0 {
                return Ok((v >> 1) as i64 ^ -((v & 1) as i64));
            }
        }
        Err(DecodeError::VarintOverflow { offset: start })
    }

    fn read_int(&mut self) -> Result<i32, DecodeError> {
        let offset = self.pos;
        let v = self.read_long()?;
        i32::try_from(v).map_err(|_| DecodeError::IntOverflow { offset, value: v })
    }

    fn read_len(&mut self) -> Result<usize, DecodeError> {
        let offset = self.pos;
        let v = self.read_long()?;
        usize::try_from(v).map_err(|_| DecodeError::NegativeLength { offset, value: v })
    }

    /// Length-prefixed byte run.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_len()?;
        self.read_exact(len)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.pos;
        let raw = self.read_bytes()?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }
}

/// Decodes one value of type `ty`, consuming exactly its encoding.
pub fn decode(ty: &SchemaType, reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let v = match ty {
        SchemaType::Null => Value::Null,
        SchemaType::Int => Value::Int(reader.read_int()?),
        SchemaType::Long => Value::Long(reader.read_long()?),
        SchemaType::Float => {
            let b = reader.read_exact(4)?;
            Value::Float(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        }
        SchemaType::Double => {
            let b = reader.read_exact(8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            Value::Double(f64::from_le_bytes(raw))
        }
        SchemaType::Boolean => {
            let offset = reader.position();
            match reader.read_byte()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                byte => return Err(DecodeError::InvalidBoolean { offset, byte }),
            }
        }
        SchemaType::String => Value::String(reader.read_string()?),
        SchemaType::Bytes => Value::Bytes(reader.read_bytes()?.to_vec()),
        SchemaType::Array(item) => {
            let mut items = Vec::new();
            loop {
                let mut count = reader.read_long()?;
                if count == 0 {
                    break;
                }
                if count < 0 {
                    // Negative count: block byte size follows, unused here.
                    count = count.checked_neg().ok_or(DecodeError::NegativeLength {
                        offset: reader.position(),
                        value: count,
                    })?;
                    reader.read_len()?;
                }
                // Items are non-null primitives, at least one byte each.
                items.reserve((count as usize).min(reader.remaining()));
                for _ in 0..count {
                    items.push(decode(item, reader)?);
                }
            }
            Value::Array(items)
        }
        SchemaType::Union(branches) => {
            let offset = reader.position();
            let idx = reader.read_long()?;
            let branch = usize::try_from(idx)
                .ok()
                .and_then(|i| branches.get(i))
                .ok_or(DecodeError::BranchOutOfRange {
                    offset,
                    index: idx,
                    branches: branches.len(),
                })?;
            Value::Union(idx as u32, Box::new(decode(branch, reader)?))
        }
    };
    Ok(v)
}

/// Decodes one record laid out in schema field order.
pub fn decode_record(schema: &RecordSchema, reader: &mut Reader<'_>) -> Result<Record, DecodeError> {
    let mut fields = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let v = decode(&field.ty, reader).map_err(|e| DecodeError::Field {
            field: field.name.clone(),
            source: Box::new(e),
        })?;
        fields.push((field.name.clone(), v));
    }
    Ok(Record::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, write_long};

    fn roundtrip(value: &Value, ty: &SchemaType) -> Value {
        let mut buf = Vec::new();
        encode(value, ty, &mut buf).unwrap();
        let mut reader = Reader::new(&buf);
        let out = decode(ty, &mut reader).unwrap();
        assert!(reader.is_empty(), "decoder left {} bytes", reader.remaining());
        out
    }

    #[test]
    fn test_read_long_boundaries() {
        for n in [0, 1, -1, 63, -64, 64, 300, i32::MAX as i64, i32::MIN as i64, i64::MAX, i64::MIN] {
            let mut buf = Vec::new();
            write_long(n, &mut buf);
            assert_eq!(Reader::new(&buf).read_long().unwrap(), n);
        }
    }

    #[test]
    fn test_varint_too_long() {
        let buf = [0x80u8; 11];
        assert_eq!(
            Reader::new(&buf).read_long(),
            Err(DecodeError::VarintOverflow { offset: 0 })
        );

        // Ten bytes, but the last one carries bits past 64.
        let mut buf = [0xffu8; 10];
        buf[9] = 0x02;
        assert_eq!(
            Reader::new(&buf).read_long(),
            Err(DecodeError::VarintOverflow { offset: 0 })
        );
        buf[9] = 0x01;
        assert_eq!(Reader::new(&buf).read_long().unwrap(), i64::MIN);
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            Reader::new(&[0x80]).read_long(),
            Err(DecodeError::UnexpectedEof { .. })
        ));
        // String claims 3 bytes, only 1 present.
        let mut r = Reader::new(&[0x06, b'a']);
        assert_eq!(
            decode(&SchemaType::String, &mut r),
            Err(DecodeError::UnexpectedEof { offset: 1, needed: 2 })
        );
        assert!(decode(&SchemaType::Double, &mut Reader::new(&[0; 7])).is_err());
    }

    #[test]
    fn test_union_branch_out_of_range() {
        let ty = SchemaType::Union(vec![SchemaType::String, SchemaType::Null]);
        // Index 2, zig-zag encoded.
        assert_eq!(
            decode(&ty, &mut Reader::new(&[0x04])),
            Err(DecodeError::BranchOutOfRange { offset: 0, index: 2, branches: 2 })
        );
        // Negative index.
        assert!(matches!(
            decode(&ty, &mut Reader::new(&[0x01])),
            Err(DecodeError::BranchOutOfRange { index: -1, .. })
        ));
    }

    #[test]
    fn test_invalid_boolean_and_utf8() {
        assert_eq!(
            decode(&SchemaType::Boolean, &mut Reader::new(&[0x02])),
            Err(DecodeError::InvalidBoolean { offset: 0, byte: 2 })
        );
        assert_eq!(
            decode(&SchemaType::String, &mut Reader::new(&[0x02, 0xff])),
            Err(DecodeError::InvalidUtf8 { offset: 0 })
        );
    }

    #[test]
    fn test_int_overflow() {
        let mut buf = Vec::new();
        write_long(i64::from(i32::MAX) + 1, &mut buf);
        assert!(matches!(
            decode(&SchemaType::Int, &mut Reader::new(&buf)),
            Err(DecodeError::IntOverflow { .. })
        ));
    }

    #[test]
    fn test_negative_length() {
        assert!(matches!(
            decode(&SchemaType::Bytes, &mut Reader::new(&[0x01])),
            Err(DecodeError::NegativeLength { value: -1, .. })
        ));
    }

    #[test]
    fn test_array_negative_block_count() {
        // Block of -2 items with byte size 4, then the terminator.
        let buf = [0x03, 0x08, 0x02, b'a', 0x02, b'b', 0x00];
        let ty = SchemaType::Array(Box::new(SchemaType::String));
        let mut r = Reader::new(&buf);
        assert_eq!(
            decode(&ty, &mut r).unwrap(),
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())])
        );
        assert!(r.is_empty());
    }

    #[test]
    fn test_roundtrip_values() {
        let nullable_array = SchemaType::Union(vec![
            SchemaType::Array(Box::new(SchemaType::Long)),
            SchemaType::Null,
        ]);
        let cases = vec![
            (Value::Int(-7), SchemaType::Int),
            (Value::Long(1 << 40), SchemaType::Long),
            (Value::Float(3.25), SchemaType::Float),
            (Value::Double(f64::MIN_POSITIVE), SchemaType::Double),
            (Value::Boolean(true), SchemaType::Boolean),
            (Value::String("héllo".into()), SchemaType::String),
            (Value::Bytes(vec![0, 255, 7]), SchemaType::Bytes),
            (
                Value::Union(0, Box::new(Value::Array(vec![Value::Long(1), Value::Long(-1)]))),
                nullable_array.clone(),
            ),
            (Value::Union(1, Box::new(Value::Null)), nullable_array),
        ];
        for (value, ty) in cases {
            assert_eq!(roundtrip(&value, &ty), value, "type {ty}");
        }
    }
}
