use crate::error::EncodeError;
use crate::schema::{RecordSchema, SchemaType};
use crate::value::Value;

// ═══════════════════════════════════════════════════════════════
//  Primitives
// ═══════════════════════════════════════════════════════════════

/// Zig-zag + base-128 varint, low 7-bit group first.
pub fn write_long(n: i64, out: &mut Vec<u8>) {
    let mut v = ((n << 1) ^ (n >> 63)) as u64;
    while v >= 0x80 {
        out.push((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

pub fn write_bytes(data: &[u8], out: &mut Vec<u8>) {
    write_long(data.len() as i64, out);
    out.extend_from_slice(data);
}

// ═══════════════════════════════════════════════════════════════
//  Values
// ═══════════════════════════════════════════════════════════════

/// Appends the binary encoding of `value` under `ty` to `out`.
pub fn encode(value: &Value, ty: &SchemaType, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (ty, value) {
        (SchemaType::Null, Value::Null) => {}
        (SchemaType::Int, Value::Int(n)) => write_long(i64::from(*n), out),
        (SchemaType::Long, Value::Long(n)) => write_long(*n, out),
        (SchemaType::Float, Value::Float(f)) => out.extend_from_slice(&f.to_le_bytes()),
        (SchemaType::Double, Value::Double(d)) => out.extend_from_slice(&d.to_le_bytes()),
        (SchemaType::Boolean, Value::Boolean(b)) => out.push(u8::from(*b)),
        (SchemaType::String, Value::String(s)) => write_bytes(s.as_bytes(), out),
        (SchemaType::Bytes, Value::Bytes(b)) => write_bytes(b, out),
        (SchemaType::Array(item), Value::Array(items)) => {
            if !items.is_empty() {
                write_long(items.len() as i64, out);
                for v in items {
                    encode(v, item, out)?;
                }
            }
            out.push(0);
        }
        (SchemaType::Union(branches), Value::Union(idx, inner)) => {
            let branch = branches.get(*idx as usize).ok_or(EncodeError::BranchOutOfRange {
                index: *idx,
                branches: branches.len(),
            })?;
            write_long(i64::from(*idx), out);
            encode(inner, branch, out)?;
        }
        (ty, value) => {
            return Err(EncodeError::TypeMismatch {
                expected: ty.to_string(),
                found: value.kind_name(),
            });
        }
    }
    Ok(())
}

/// Encodes one record: every field value in schema order, no names.
pub fn encode_record(
    values: &[Value],
    schema: &RecordSchema,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    if values.len() != schema.fields.len() {
        return Err(EncodeError::TypeMismatch {
            expected: format!("{} fields", schema.fields.len()),
            found: "wrong field count",
        });
    }
    for (value, field) in values.iter().zip(&schema.fields) {
        encode(value, &field.ty, out).map_err(|e| EncodeError::Field {
            field: field.name.clone(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_bytes(n: i64) -> Vec<u8> {
        let mut out = Vec::new();
        write_long(n, &mut out);
        out
    }

    fn encoded(value: &Value, ty: &SchemaType) -> Vec<u8> {
        let mut out = Vec::new();
        encode(value, ty, &mut out).unwrap();
        out
    }

    #[test]
    fn test_zigzag_varint() {
        assert_eq!(long_bytes(0), [0x00]);
        assert_eq!(long_bytes(-1), [0x01]);
        assert_eq!(long_bytes(1), [0x02]);
        assert_eq!(long_bytes(-2), [0x03]);
        assert_eq!(long_bytes(63), [0x7e]);
        assert_eq!(long_bytes(-64), [0x7f]);
        assert_eq!(long_bytes(64), [0x80, 0x01]);
        assert_eq!(long_bytes(300), [0xd8, 0x04]);
        assert_eq!(long_bytes(i64::MAX).len(), 10);
        assert_eq!(long_bytes(i64::MIN), [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
    }

    #[test]
    fn test_primitives() {
        assert_eq!(encoded(&Value::Int(1), &SchemaType::Int), [0x02]);
        assert_eq!(encoded(&Value::Boolean(true), &SchemaType::Boolean), [0x01]);
        assert_eq!(encoded(&Value::Boolean(false), &SchemaType::Boolean), [0x00]);
        assert_eq!(encoded(&Value::Float(1.0), &SchemaType::Float), 1.0f32.to_le_bytes());
        assert_eq!(encoded(&Value::Double(-0.5), &SchemaType::Double), (-0.5f64).to_le_bytes());
        assert_eq!(
            encoded(&Value::String("foo".into()), &SchemaType::String),
            [0x06, b'f', b'o', b'o']
        );
        assert_eq!(encoded(&Value::Bytes(vec![]), &SchemaType::Bytes), [0x00]);
    }

    #[test]
    fn test_array_single_block_plus_terminator() {
        let ty = SchemaType::Array(Box::new(SchemaType::String));
        let v = Value::Array(vec![Value::String("a".into()), Value::String("b".into())]);
        assert_eq!(encoded(&v, &ty), [0x04, 0x02, b'a', 0x02, b'b', 0x00]);
        assert_eq!(encoded(&Value::Array(vec![]), &ty), [0x00]);
    }

    #[test]
    fn test_union_index_then_payload() {
        let ty = SchemaType::Union(vec![SchemaType::String, SchemaType::Null]);
        assert_eq!(encoded(&Value::Union(1, Box::new(Value::Null)), &ty), [0x02]);
        assert_eq!(
            encoded(&Value::Union(0, Box::new(Value::String("x".into()))), &ty),
            [0x00, 0x02, b'x']
        );
    }

    #[test]
    fn test_mismatches() {
        let mut out = Vec::new();
        assert!(matches!(
            encode(&Value::String("1".into()), &SchemaType::Int, &mut out),
            Err(EncodeError::TypeMismatch { found: "string", .. })
        ));

        let ty = SchemaType::Union(vec![SchemaType::Int, SchemaType::Null]);
        assert_eq!(
            encode(&Value::Union(2, Box::new(Value::Null)), &ty, &mut out),
            Err(EncodeError::BranchOutOfRange { index: 2, branches: 2 })
        );
        // Union value under its branch index but with the wrong payload.
        assert!(encode(&Value::Union(0, Box::new(Value::Null)), &ty, &mut out).is_err());
    }
}
