use std::collections::HashMap;

/// Maps Scratch block ids (which may contain any character) to Mermaid-safe
/// node ids. One mapper lives for exactly one generation call.
#[derive(Debug, Default)]
pub struct IdMapper {
    ids: HashMap<String, String>,
}

impl IdMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercase hex MD5 digest of `source_id`, memoized.
    pub fn get_safe_id(&mut self, source_id: &str) -> String {
        if let Some(existing) = self.ids.get(source_id) {
            return existing.clone();
        }
        let safe_id = format!("{:x}", md5::compute(source_id.as_bytes()));
        self.ids.insert(source_id.to_string(), safe_id.clone());
        safe_id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
