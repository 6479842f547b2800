use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value as Json, json};

use crate::error::SchemaError;
use crate::value::Value;

// ═══════════════════════════════════════════════════════════════
//  Schema Type
// ═══════════════════════════════════════════════════════════════

/// Field type tree.
///
/// `Null` is only legal as a union branch; array items are always
/// non-null primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Null,
    Int,
    Long,
    Float,
    Double,
    String,
    Boolean,
    Bytes,
    Array(Box<SchemaType>),
    Union(Vec<SchemaType>),
}

impl SchemaType {
    fn primitive(name: &str) -> Option<Self> {
        match name {
            "null" => Some(SchemaType::Null),
            "int" => Some(SchemaType::Int),
            "long" => Some(SchemaType::Long),
            "float" => Some(SchemaType::Float),
            "double" => Some(SchemaType::Double),
            "string" => Some(SchemaType::String),
            "boolean" => Some(SchemaType::Boolean),
            "bytes" => Some(SchemaType::Bytes),
            _ => None,
        }
    }

    /// Type name as it appears in schema JSON.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaType::Null => "null",
            SchemaType::Int => "int",
            SchemaType::Long => "long",
            SchemaType::Float => "float",
            SchemaType::Double => "double",
            SchemaType::String => "string",
            SchemaType::Boolean => "boolean",
            SchemaType::Bytes => "bytes",
            SchemaType::Array(_) => "array",
            SchemaType::Union(_) => "union",
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, SchemaType::Array(_) | SchemaType::Union(_))
    }

    /// Index of the `null` branch if this is a union containing one.
    pub fn null_index(&self) -> Option<usize> {
        match self {
            SchemaType::Union(branches) => branches.iter().position(|b| *b == SchemaType::Null),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.null_index().is_some()
    }

    fn from_json(json: &Json) -> Result<Self, SchemaError> {
        match json {
            Json::String(name) => {
                Self::primitive(name).ok_or_else(|| SchemaError::UnknownType(format!("{name:?}")))
            }
            Json::Array(branches) => Self::union_from_json(branches),
            Json::Object(obj) => {
                let name = obj.get("type").and_then(Json::as_str).ok_or_else(|| {
                    SchemaError::MissingKey { key: "type", context: json.to_string() }
                })?;
                match name {
                    "array" => {
                        let items = obj.get("items").ok_or_else(|| {
                            SchemaError::InvalidArray(format!("missing 'items' in {json}"))
                        })?;
                        let item = Self::from_json(items)?;
                        if !item.is_primitive() || item == SchemaType::Null {
                            return Err(SchemaError::InvalidArray(format!(
                                "items must be a non-null primitive, got {item}"
                            )));
                        }
                        Ok(SchemaType::Array(Box::new(item)))
                    }
                    other => Self::primitive(other)
                        .ok_or_else(|| SchemaError::UnknownType(format!("{other:?}"))),
                }
            }
            other => Err(SchemaError::UnknownType(other.to_string())),
        }
    }

    fn union_from_json(branches: &[Json]) -> Result<Self, SchemaError> {
        if branches.len() < 2 {
            return Err(SchemaError::InvalidUnion(format!(
                "needs at least two branches, got {}",
                branches.len()
            )));
        }

        let mut parsed = Vec::with_capacity(branches.len());
        let mut seen = HashSet::new();
        for branch in branches {
            let ty = Self::from_json(branch)?;
            if matches!(ty, SchemaType::Union(_)) {
                return Err(SchemaError::InvalidUnion("nested union".into()));
            }
            if !seen.insert(ty.name()) {
                return Err(SchemaError::InvalidUnion(format!("duplicate branch {}", ty.name())));
            }
            parsed.push(ty);
        }
        Ok(SchemaType::Union(parsed))
    }

    pub fn to_json(&self) -> Json {
        match self {
            SchemaType::Array(item) => json!({ "type": "array", "items": item.to_json() }),
            SchemaType::Union(branches) => {
                Json::Array(branches.iter().map(SchemaType::to_json).collect())
            }
            primitive => Json::String(primitive.name().to_string()),
        }
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            SchemaType::Array(item) => {
                out.push_str(r#"{"type":"array","items":"#);
                item.write_canonical(out);
                out.push('}');
            }
            SchemaType::Union(branches) => {
                out.push('[');
                for (i, b) in branches.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    b.write_canonical(out);
                }
                out.push(']');
            }
            primitive => {
                out.push('"');
                out.push_str(primitive.name());
                out.push('"');
            }
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Array(item) => write!(f, "array<{item}>"),
            SchemaType::Union(branches) => {
                f.write_str("union<")?;
                for (i, b) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{b}")?;
                }
                f.write_str(">")
            }
            primitive => f.write_str(primitive.name()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Field & RecordSchema
// ═══════════════════════════════════════════════════════════════

/// One named field of a record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub ty: SchemaType,
    /// Raw JSON default as written in the schema.
    pub default: Option<Json>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, ty: SchemaType) -> Self {
        Self { name: name.into(), ty, default: None }
    }

    pub fn with_default(mut self, default: Json) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.ty.is_nullable()
    }

    /// Explicit default converted to a typed value. Nullable fields without
    /// an explicit default have an implicit `null` that this does not report.
    pub fn default_value(&self) -> Result<Option<Value>, SchemaError> {
        self.default
            .as_ref()
            .map(|d| {
                Value::from_json(d, &self.ty).map_err(|reason| SchemaError::InvalidDefault {
                    field: self.name.clone(),
                    default: d.to_string(),
                    reason,
                })
            })
            .transpose()
    }

    fn from_json(json: &Json) -> Result<Self, SchemaError> {
        let obj = json.as_object().ok_or_else(|| SchemaError::MissingKey {
            key: "name",
            context: format!("field {json}"),
        })?;
        let name = obj
            .get("name")
            .and_then(Json::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SchemaError::MissingKey { key: "name", context: format!("field {json}") })?;
        let ty_json = obj.get("type").ok_or_else(|| SchemaError::MissingKey {
            key: "type",
            context: format!("field '{name}'"),
        })?;

        let ty = SchemaType::from_json(ty_json)?;
        if ty == SchemaType::Null {
            return Err(SchemaError::BareNull(name.to_string()));
        }

        let field = SchemaField {
            name: name.to_string(),
            ty,
            default: obj.get("default").cloned(),
        };
        field.default_value()?;
        Ok(field)
    }

    fn to_json(&self) -> Json {
        let mut obj = Map::new();
        obj.insert("name".into(), Json::String(self.name.clone()));
        obj.insert("type".into(), self.ty.to_json());
        if let Some(d) = &self.default {
            obj.insert("default".into(), d.clone());
        }
        Json::Object(obj)
    }
}

/// Record schema. Field order is the on-wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub fields: Vec<SchemaField>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self { name: name.into(), namespace: None, fields }
    }

    /// Parses a record schema from its JSON text.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let json: Json = serde_json::from_str(text).map_err(|e| SchemaError::Json(e.to_string()))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &Json) -> Result<Self, SchemaError> {
        let obj = json.as_object().ok_or_else(|| SchemaError::NotARecord(json.to_string()))?;

        match obj.get("type") {
            Some(Json::String(t)) if t == "record" => {}
            Some(other) => return Err(SchemaError::NotARecord(other.to_string())),
            None => {
                return Err(SchemaError::MissingKey { key: "type", context: "schema".into() });
            }
        }

        let name = obj
            .get("name")
            .and_then(Json::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SchemaError::MissingKey { key: "name", context: "schema".into() })?;
        let namespace = obj.get("namespace").and_then(Json::as_str).map(str::to_string);
        let fields_json = obj
            .get("fields")
            .and_then(Json::as_array)
            .ok_or_else(|| SchemaError::MissingKey { key: "fields", context: format!("record '{name}'") })?;

        let mut fields = Vec::with_capacity(fields_json.len());
        let mut seen = HashSet::new();
        for f in fields_json {
            let field = SchemaField::from_json(f)?;
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField(field.name));
            }
            fields.push(field);
        }

        Ok(Self { name: name.to_string(), namespace, fields })
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn to_json(&self) -> Json {
        let mut obj = Map::new();
        obj.insert("type".into(), Json::String("record".into()));
        obj.insert("name".into(), Json::String(self.name.clone()));
        if let Some(ns) = &self.namespace {
            obj.insert("namespace".into(), Json::String(ns.clone()));
        }
        obj.insert(
            "fields".into(),
            Json::Array(self.fields.iter().map(SchemaField::to_json).collect()),
        );
        Json::Object(obj)
    }

    /// Full name: `namespace.name` unless the name is already qualified.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() && !self.name.contains('.') => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Parsing Canonical Form: defaults and docs stripped, fixed key order.
    pub fn canonical_form(&self) -> String {
        let mut out = String::from(r#"{"name":"#);
        out.push_str(&Json::String(self.full_name()).to_string());
        out.push_str(r#","type":"record","fields":["#);
        for (i, f) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(r#"{"name":"#);
            out.push_str(&Json::String(f.name.clone()).to_string());
            out.push_str(r#","type":"#);
            f.ty.write_canonical(&mut out);
            out.push('}');
        }
        out.push_str("]}");
        out
    }

    /// CRC-64-AVRO fingerprint of the canonical form.
    pub fn fingerprint(&self) -> u64 {
        rabin_fingerprint(self.canonical_form().as_bytes())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Fingerprint
// ═══════════════════════════════════════════════════════════════

const FP_EMPTY: u64 = 0xc15d_213a_a4d7_a795;

const FP_TABLE: [u64; 256] = fp_table();

const fn fp_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut fp = i as u64;
        let mut bit = 0;
        while bit < 8 {
            fp = (fp >> 1) ^ (FP_EMPTY & (fp & 1).wrapping_neg());
            bit += 1;
        }
        table[i] = fp;
        i += 1;
    }
    table
}

pub(crate) fn rabin_fingerprint(data: &[u8]) -> u64 {
    data.iter().fold(FP_EMPTY, |fp, &b| {
        (fp >> 8) ^ FP_TABLE[((fp ^ u64::from(b)) & 0xff) as usize]
    })
}
