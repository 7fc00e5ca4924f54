use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::project::{Block, FieldValue, InputValue, Target, SUBSTACK, SUBSTACK2};
use crate::translate::{strip_category, SyntheticLabel, Translator};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

static PROCEDURE_SLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[sbn]").expect("procedure slot pattern compiles"));

const OPERATOR_KEY_ORDER: &[&str] = &[
    "OPERAND1", "OPERAND2", "OPERAND3", "NUM1", "NUM2", "NUM3", "STRING1", "STRING2", "FROM",
    "TO", "A", "B",
];

const BROADCAST_FIELDS: &[&str] = &["BROADCAST_OPTION", "BROADCAST_INPUT"];

/// Value blocks nested deeper than this collapse into the runaway label.
pub const MAX_EXPRESSION_DEPTH: usize = 128;

/// Block ids already expanded while building one top-level label, and how
/// deep the current expansion is.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTrail {
    seen: HashSet<String>,
    depth: usize,
}

impl ReferenceTrail {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Turns input slots and value blocks of one target into short display text.
#[derive(Debug, Clone, Copy)]
pub struct ValueResolver<'a> {
    target: &'a Target,
    translator: Translator<'a>,
}

impl<'a> ValueResolver<'a> {
    pub fn new(target: &'a Target, translator: Translator<'a>) -> Self {
        Self { target, translator }
    }

    pub fn resolve_input(
        &self,
        input: &InputValue,
        trail: &mut ReferenceTrail,
        diagnostics: &mut Diagnostics,
    ) -> String {
        match input {
            InputValue::Literal(text) => text.clone(),
            InputValue::NestedLiteral(inner) => self.resolve_input(inner, trail, diagnostics),
            InputValue::Broadcast { name, id } => {
                self.broadcast_name(name, id.as_deref(), diagnostics)
            }
            InputValue::BlockRef(id) => match self.target.block(id) {
                Some(block) => self.reference_label(id, block, trail, diagnostics),
                None => {
                    diagnostics.push(Diagnostic::MissingBlock {
                        target: self.target.name.clone(),
                        block_id: id.clone(),
                    });
                    id.clone()
                }
            },
        }
    }

    /// Short label for a value block sitting in an input slot.
    pub fn reference_label(
        &self,
        block_id: &str,
        block: &Block,
        trail: &mut ReferenceTrail,
        diagnostics: &mut Diagnostics,
    ) -> String {
        if trail.depth >= MAX_EXPRESSION_DEPTH {
            diagnostics.push(Diagnostic::DepthLimit {
                target: self.target.name.clone(),
                block_id: block_id.to_string(),
            });
            return self.translator.synthetic(SyntheticLabel::Runaway).to_string();
        }
        if !trail.seen.insert(block_id.to_string()) {
            diagnostics.push(Diagnostic::CircularReference {
                target: self.target.name.clone(),
                block_id: block_id.to_string(),
            });
            return self
                .translator
                .synthetic(SyntheticLabel::CircularReference)
                .to_string();
        }

        trail.depth += 1;
        let label = self.expand_reference(block, trail, diagnostics);
        trail.depth -= 1;
        label
    }

    fn expand_reference(
        &self,
        block: &Block,
        trail: &mut ReferenceTrail,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let mut parts: Vec<String> = block
            .fields
            .iter()
            .map(|(name, field)| self.field_display(&block.opcode, name, field, diagnostics))
            .filter(|value| !value.is_empty())
            .collect();

        // Menu shadows: a lone field is the value.
        if block.inputs.is_empty() && block.fields.len() == 1 {
            if let Some(value) = parts.pop() {
                return value;
            }
        }

        if let Some(label) = self.procedure_label(block, trail, diagnostics) {
            return label;
        }

        let keys = if block.opcode.starts_with("operator") {
            operator_keys(block)
        } else {
            statement_keys(block)
        };
        for key in keys {
            if let Some(input) = block.inputs.get(key) {
                let value = self.resolve_input(input, trail, diagnostics);
                if !value.is_empty() {
                    parts.push(value);
                }
            }
        }

        self.translator
            .render(&block.opcode, &parts)
            .unwrap_or_else(|| {
                let action = strip_category(&block.opcode);
                if parts.is_empty() {
                    action.to_string()
                } else {
                    format!("{} {}", action, parts.join(" "))
                }
            })
    }

    /// Ordered parameters for a statement block: fields, then inputs. Branch
    /// inputs are not parameters. Each input starts a fresh reference trail.
    pub fn block_parameters(&self, block: &Block, diagnostics: &mut Diagnostics) -> Vec<String> {
        let mut params: Vec<String> = block
            .fields
            .iter()
            .map(|(name, field)| self.field_display(&block.opcode, name, field, diagnostics))
            .filter(|value| !value.is_empty())
            .collect();
        for key in statement_keys(block) {
            if key == SUBSTACK || key == SUBSTACK2 {
                continue;
            }
            if let Some(input) = block.inputs.get(key) {
                let mut trail = ReferenceTrail::new();
                params.push(self.resolve_input(input, &mut trail, diagnostics));
            }
        }
        params
    }

    /// Node label for a statement block: translated phrase with parameters,
    /// or `action: p1, p2` when the dictionary has no entry.
    pub fn statement_label(&self, block: &Block, diagnostics: &mut Diagnostics) -> String {
        let mut trail = ReferenceTrail::new();
        if let Some(label) = self.procedure_label(block, &mut trail, diagnostics) {
            return label;
        }
        let params = self.block_parameters(block, diagnostics);
        if let Some(label) = self.translator.render(&block.opcode, &params) {
            return label;
        }
        let action = strip_category(&block.opcode);
        if params.is_empty() {
            action.to_string()
        } else {
            format!("{}: {}", action, params.join(", "))
        }
    }

    /// Resolved `CONDITION` input, empty when the slot is unfilled.
    pub fn condition(&self, block: &Block, diagnostics: &mut Diagnostics) -> String {
        let mut trail = ReferenceTrail::new();
        block
            .inputs
            .get("CONDITION")
            .map(|input| self.resolve_input(input, &mut trail, diagnostics))
            .unwrap_or_default()
    }

    pub fn field_display(
        &self,
        opcode: &str,
        name: &str,
        field: &FieldValue,
        diagnostics: &mut Diagnostics,
    ) -> String {
        if BROADCAST_FIELDS.contains(&name) {
            return self.broadcast_name(&field.display, field.id.as_deref(), diagnostics);
        }
        self.translator
            .menu_value(opcode, &field.display)
            .map(str::to_string)
            .unwrap_or_else(|| field.display.clone())
    }

    /// Registered broadcast name, falling back to the name carried inline.
    fn broadcast_name(
        &self,
        display: &str,
        id: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let Some(id) = id else {
            return display.to_string();
        };
        match self.target.broadcasts.get(id) {
            Some(name) => name.clone(),
            None => {
                diagnostics.push(Diagnostic::MissingBroadcast {
                    target: self.target.name.clone(),
                    broadcast_id: id.to_string(),
                    fallback: display.to_string(),
                });
                display.to_string()
            }
        }
    }

    // `proccode` with its `%s`/`%b`/`%n` slots filled by the arguments in
    // `argumentids` order.
    fn procedure_label(
        &self,
        block: &Block,
        trail: &mut ReferenceTrail,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let mutation = block.mutation.as_ref()?;
        let proccode = mutation.proccode.as_deref()?;
        let argument_ids: Vec<String> = mutation
            .argumentids
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let mut args = argument_ids.iter().map(|id| {
            block
                .inputs
                .get(id)
                .map(|input| self.resolve_input(input, trail, diagnostics))
                .unwrap_or_default()
        });
        let label = PROCEDURE_SLOT
            .replace_all(proccode, |caps: &Captures<'_>| {
                args.next().unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        Some(label)
    }
}

fn operator_keys(block: &Block) -> Vec<&str> {
    let mut keys: Vec<&str> = OPERATOR_KEY_ORDER
        .iter()
        .copied()
        .filter(|key| block.inputs.contains_key(*key))
        .collect();
    let mut leftovers: Vec<&str> = block
        .inputs
        .keys()
        .map(String::as_str)
        .filter(|key| !OPERATOR_KEY_ORDER.contains(key))
        .collect();
    leftovers.sort_unstable();
    keys.extend(leftovers);
    keys
}

fn statement_keys(block: &Block) -> Vec<&str> {
    let preferred: &[&str] = match block.opcode.as_str() {
        "motion_gotoxy" => &["X", "Y"],
        "motion_glidesecstoxy" => &["SECS", "X", "Y"],
        _ => &[],
    };
    let mut keys: Vec<&str> = preferred
        .iter()
        .copied()
        .filter(|key| block.inputs.contains_key(*key))
        .collect();
    keys.extend(
        block
            .inputs
            .keys()
            .map(String::as_str)
            .filter(|key| !preferred.contains(key)),
    );
    keys
}
