use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const SUBSTACK: &str = "SUBSTACK";
pub const SUBSTACK2: &str = "SUBSTACK2";

/// A Scratch project as read from `project.json`. Never mutated once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "isStage", default)]
    pub is_stage: bool,
    #[serde(default, deserialize_with = "deserialize_blocks")]
    pub blocks: IndexMap<String, Block>,
    #[serde(default)]
    pub broadcasts: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub opcode: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(rename = "topLevel", default)]
    pub top_level: bool,
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
    #[serde(default)]
    pub inputs: IndexMap<String, InputValue>,
    #[serde(default)]
    pub mutation: Option<Mutation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mutation {
    #[serde(default)]
    pub proccode: Option<String>,
    #[serde(default)]
    pub argumentids: Option<String>,
}

/// A field entry. Scratch stores these either as a bare string or as
/// `[display, id]`; only the broadcast fields care about the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct FieldValue {
    pub display: String,
    pub id: Option<String>,
}

/// An input slot, normalized once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum InputValue {
    Literal(String),
    NestedLiteral(Box<InputValue>),
    BlockRef(String),
    Broadcast { name: String, id: Option<String> },
}

/// The control constructs the diagram builder expands structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Forever,
    If,
    IfElse,
    Repeat,
    RepeatUntil,
}

impl ControlKind {
    pub fn of(opcode: &str) -> Option<Self> {
        match opcode {
            "control_forever" => Some(Self::Forever),
            "control_if" => Some(Self::If),
            "control_if_else" => Some(Self::IfElse),
            "control_repeat" => Some(Self::Repeat),
            "control_repeat_until" => Some(Self::RepeatUntil),
            _ => None,
        }
    }
}

impl Program {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Target {
    /// Script entry points in document order. A block flagged top-level that
    /// still carries a parent is not an entry point.
    pub fn entry_points(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|(_, block)| block.top_level && block.parent.is_none())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }
}

impl Block {
    pub fn control_kind(&self) -> Option<ControlKind> {
        ControlKind::of(&self.opcode)
    }

    pub fn is_event(&self) -> bool {
        self.opcode.starts_with("event_")
    }

    /// The block id a branch input points at, if any.
    pub fn branch(&self, input_name: &str) -> Option<&str> {
        match self.inputs.get(input_name)? {
            InputValue::BlockRef(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                let mut items = items.into_iter();
                let display = items.next().map(scalar_text).unwrap_or_default();
                let id = match items.next() {
                    Some(Value::String(id)) => Some(id),
                    _ => None,
                };
                Self { display, id }
            }
            other => Self {
                display: scalar_text(other),
                id: None,
            },
        }
    }
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(id) => InputValue::BlockRef(id),
            Value::Array(items) => {
                let kind = items.first().and_then(Value::as_i64).unwrap_or_default();
                if (1..=3).contains(&kind) {
                    match items.into_iter().nth(1) {
                        Some(Value::String(id)) => InputValue::BlockRef(id),
                        Some(Value::Array(primitive)) => {
                            InputValue::NestedLiteral(Box::new(primitive_value(primitive)))
                        }
                        Some(other) => InputValue::Literal(scalar_text(other)),
                        None => InputValue::Literal(String::new()),
                    }
                } else {
                    primitive_value(items)
                }
            }
            other => InputValue::Literal(scalar_text(other)),
        }
    }
}

// Primitive tuples are `[typecode, value, ...]`; code 11 is a broadcast
// carrying `[11, name, id]`.
fn primitive_value(items: Vec<Value>) -> InputValue {
    let code = items.first().and_then(Value::as_i64).unwrap_or_default();
    let mut rest = items.into_iter().skip(1);
    let payload = rest.next().map(scalar_text).unwrap_or_default();
    if code == 11 {
        let id = match rest.next() {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };
        return InputValue::Broadcast { name: payload, id };
    }
    InputValue::Literal(payload)
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// Floating top-level reporters are stored as arrays rather than objects; they
// never take part in control flow, so they are dropped here.
fn deserialize_blocks<'de, D>(deserializer: D) -> Result<IndexMap<String, Block>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
    let mut blocks = IndexMap::with_capacity(raw.len());
    for (id, value) in raw {
        if !value.is_object() {
            continue;
        }
        let block = Block::deserialize(value).map_err(<D::Error as serde::de::Error>::custom)?;
        blocks.insert(id, block);
    }
    Ok(blocks)
}
