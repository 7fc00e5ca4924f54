use crate::mermaid::Direction;
use crate::translate::Locale;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sb3-flowchart",
    about = "Render the scripts of a Scratch 3 project (.sb3 or project.json) as a Mermaid flowchart."
)]
pub struct Args {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT", help = "Write the diagram here instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Root node label. Defaults to the input file name without extension.")]
    pub name: Option<String>,

    #[arg(long, value_enum, default_value_t = Locale::ZhCn, help = "Embedded label dictionary.")]
    pub locale: Locale,

    #[arg(
        long,
        value_name = "FILE",
        help = "JSON object of opcode/label translations replacing the embedded dictionary."
    )]
    pub translations: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Direction::TopDown, help = "Diagram orientation.")]
    pub direction: Direction,

    #[arg(long, help = "Print absorbed graph anomalies (missing blocks, cycles, ...) to stderr.")]
    pub diagnostics: bool,
}
