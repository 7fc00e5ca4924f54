pub mod diagnostics;
pub mod flowchart;
pub mod ids;
pub mod mermaid;
pub mod project;
pub mod resolve;
pub mod sanitize;
pub mod sb3;
pub mod translate;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

use anyhow::{Context, Result};
use flowchart::{build_flowchart, Flowchart, FlowchartOptions};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use translate::{Dictionary, Locale, Translator};

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    let total_stages = 3 + usize::from(args.output.is_some());
    let progress = CliProgress::new("Flowchart", total_stages);
    let mut stage = 0usize;

    stage += 1;
    progress.emit(stage, "Resolving input path");
    let input = canonicalize_file(&args.input)?;

    stage += 1;
    progress.emit(stage, "Reading project");
    let program = sb3::load_project(&input)
        .with_context(|| format!("Failed to load project '{}'.", pretty_path(&input)))?;
    let dictionary = select_dictionary(args.translations.as_deref(), args.locale)?;

    stage += 1;
    progress.emit(stage, "Building flowchart");
    let root_name = args
        .name
        .clone()
        .unwrap_or_else(|| sb3::project_name(&input));
    let options = FlowchartOptions {
        root_name: &root_name,
        direction: args.direction,
        translator: Translator::new(&dictionary),
    };
    let Flowchart { text, diagnostics } = build_flowchart(&program, &options);

    if args.diagnostics {
        for diagnostic in &diagnostics {
            eprintln!("warning: {}", diagnostic);
        }
    }

    match &args.output {
        Some(output) => {
            stage += 1;
            progress.emit(stage, "Writing diagram");
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(output, text.as_bytes())
                .with_context(|| format!("Failed to write '{}'.", output.display()))?;
        }
        None => print!("{}", text),
    }

    Ok(())
}

/// Loads a `.sb3` (or bare `project.json`) and renders it with an embedded locale.
pub fn flowchart_from_path(path: &Path, locale: Locale) -> Result<Flowchart> {
    let input = canonicalize_file(path)?;
    let program = sb3::load_project(&input)?;
    let root_name = sb3::project_name(&input);
    let options = FlowchartOptions::new(&root_name, Translator::for_locale(locale));
    Ok(build_flowchart(&program, &options))
}

pub fn flowchart_from_sb3_bytes(bytes: &[u8], root_name: &str, locale: Locale) -> Result<Flowchart> {
    let program = sb3::load_sb3_bytes(bytes)?;
    let options = FlowchartOptions::new(root_name, Translator::for_locale(locale));
    Ok(build_flowchart(&program, &options))
}

pub fn flowchart_from_json(json: &str, root_name: &str, locale: Locale) -> Result<Flowchart> {
    let program = sb3::parse_project_json(json.as_bytes())?;
    let options = FlowchartOptions::new(root_name, Translator::for_locale(locale));
    Ok(build_flowchart(&program, &options))
}

/// External translations when given, otherwise the embedded locale (borrowed).
pub fn select_dictionary(translations: Option<&Path>, locale: Locale) -> Result<Cow<'static, Dictionary>> {
    match translations {
        Some(path) => Ok(Cow::Owned(load_dictionary(path)?)),
        None => Ok(Cow::Borrowed(Dictionary::embedded(locale))),
    }
}

pub fn load_dictionary(path: &Path) -> Result<Dictionary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read translations '{}'.", path.display()))?;
    Dictionary::from_json_str(&raw)
        .with_context(|| format!("Translations '{}' must be a JSON object of strings.", path.display()))
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!("Input file not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(not(target_arch = "wasm32"))]
fn pretty_path(path: &Path) -> String {
    let raw = path.display().to_string();
    if let Some(stripped) = raw.strip_prefix(r"\\?\") {
        stripped.to_string()
    } else {
        raw
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    (0..width)
        .map(|i| if i < filled { '=' } else { '-' })
        .fold(String::from("["), |mut s, c| {
            s.push(c);
            s
        })
        + "]"
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_rounds_to_width() {
        assert_eq!(render_progress_bar(1, 4, 8), "[==------]");
        assert_eq!(render_progress_bar(4, 4, 8), "[========]");
    }

    #[test]
    fn embedded_dictionary_is_borrowed() {
        let dictionary = select_dictionary(None, Locale::En).unwrap();
        assert!(matches!(dictionary, Cow::Borrowed(_)));
        assert!(std::ptr::eq(&*dictionary, Dictionary::embedded(Locale::En)));
    }

    #[test]
    fn external_translations_replace_embedded_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"LOOKS_SHOW": "appear"}"#).unwrap();
        let dictionary = select_dictionary(Some(&path), Locale::En).unwrap();
        assert!(matches!(dictionary, Cow::Owned(_)));
        assert_eq!(dictionary.get("LOOKS_SHOW"), Some("appear"));
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn json_entry_point_renders_root_node() {
        let chart = flowchart_from_json(r#"{"targets": []}"#, "Demo", Locale::En).unwrap();
        assert_eq!(chart.text, "flowchart TD\n    Start[Demo]\n");
        assert!(chart.diagnostics.is_empty());
    }
}
