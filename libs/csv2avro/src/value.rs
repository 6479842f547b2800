use crate::schema::SchemaType;

/// Typed value, one case per `SchemaType` case.
///
/// `Union` carries the resolved branch index; the encoder writes it as-is and
/// the decoder reports the index it read.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Union(u32, Box<Value>),
}

impl Value {
    /// Short name of the case, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Union(..) => "union",
        }
    }

    /// Strips union wrappers: `Union(1, Null)` → `Null`.
    pub fn resolved(&self) -> &Value {
        match self {
            Value::Union(_, inner) => inner.resolved(),
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.resolved(), Value::Null)
    }

    /// Converts a JSON schema default into a value of type `ty`.
    ///
    /// Follows the JSON default encoding of the binary format: numbers for
    /// numeric types, strings of code points 0-255 for `bytes`, `null` for the
    /// null branch of a union and the first matching branch otherwise.
    pub fn from_json(json: &serde_json::Value, ty: &SchemaType) -> Result<Value, String> {
        use serde_json::Value as J;

        match (ty, json) {
            (SchemaType::Null, J::Null) => Ok(Value::Null),
            (SchemaType::Int, J::Number(n)) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Int)
                .ok_or_else(|| format!("{n} is not an int")),
            (SchemaType::Long, J::Number(n)) => n
                .as_i64()
                .map(Value::Long)
                .ok_or_else(|| format!("{n} is not a long")),
            (SchemaType::Float, J::Number(n)) => n
                .as_f64()
                .map(|v| Value::Float(v as f32))
                .ok_or_else(|| format!("{n} is not a float")),
            (SchemaType::Double, J::Number(n)) => n
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| format!("{n} is not a double")),
            (SchemaType::Boolean, J::Bool(b)) => Ok(Value::Boolean(*b)),
            (SchemaType::String, J::String(s)) => Ok(Value::String(s.clone())),
            (SchemaType::Bytes, J::String(s)) => s
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| format!("{c:?} is not a byte")))
                .collect::<Result<Vec<u8>, String>>()
                .map(Value::Bytes),
            (SchemaType::Array(item), J::Array(items)) => items
                .iter()
                .map(|v| Value::from_json(v, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (SchemaType::Union(branches), json) => {
                for (idx, branch) in branches.iter().enumerate() {
                    if let Ok(v) = Value::from_json(json, branch) {
                        return Ok(Value::Union(idx as u32, Box::new(v)));
                    }
                }
                Err(format!("{json} matches no branch of {ty}"))
            }
            (ty, json) => Err(format!("{json} is not a {ty}")),
        }
    }
}

/// One decoded record: field name → value, in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
