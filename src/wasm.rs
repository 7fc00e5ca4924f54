use crate::translate::Locale;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn flowchart_from_project_json(json: &str, root_name: &str, english: bool) -> Result<String, JsValue> {
    crate::flowchart_from_json(json, root_name, locale(english))
        .map(|chart| chart.text)
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

#[wasm_bindgen]
pub fn flowchart_from_sb3(bytes: &[u8], root_name: &str, english: bool) -> Result<String, JsValue> {
    crate::flowchart_from_sb3_bytes(bytes, root_name, locale(english))
        .map(|chart| chart.text)
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

fn locale(english: bool) -> Locale {
    if english {
        Locale::En
    } else {
        Locale::ZhCn
    }
}
