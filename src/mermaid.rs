use crate::sanitize::sanitize_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Direction {
    #[default]
    #[value(name = "td")]
    TopDown,
    #[value(name = "lr")]
    LeftRight,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::TopDown => "TD",
            Direction::LeftRight => "LR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Rect,
    Round,
    Diamond,
    Stadium,
}

impl NodeShape {
    /// Decision diamonds for conditionals and operators, rounded otherwise.
    pub fn for_opcode(opcode: &str) -> Self {
        if opcode.contains("control_if") || opcode.contains("operator") {
            NodeShape::Diamond
        } else {
            NodeShape::Round
        }
    }

    fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            NodeShape::Rect => ("[", "]"),
            NodeShape::Round => ("(", ")"),
            NodeShape::Diamond => ("{", "}"),
            NodeShape::Stadium => ("([", "])"),
        }
    }
}

/// Line-oriented `flowchart` text buffer. Every label is sanitized here.
#[derive(Debug)]
pub struct FlowchartWriter {
    out: String,
}

impl FlowchartWriter {
    pub fn new(direction: Direction) -> Self {
        let mut out = String::new();
        out.push_str(&format!("flowchart {}\n", direction.keyword()));
        Self { out }
    }

    pub fn node(&mut self, id: &str, shape: NodeShape, label: &str) {
        self.out.push_str(&format!("    {}{}\n", id, shaped(shape, label)));
    }

    pub fn edge(&mut self, from: &str, to: &str) {
        self.out.push_str(&format!("    {} --> {}\n", from, to));
    }

    pub fn labeled_edge(&mut self, from: &str, to: &str, label: &str) {
        self.out.push_str(&format!(
            "    {} -->|{}| {}\n",
            from,
            sanitize_label(label),
            to
        ));
    }

    /// Edge whose target node is declared inline.
    pub fn edge_to_node(&mut self, from: &str, to: &str, shape: NodeShape, label: &str) {
        self.out.push_str(&format!(
            "    {} --> {}{}\n",
            from,
            to,
            shaped(shape, label)
        ));
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn shaped(shape: NodeShape, label: &str) -> String {
    let (open, close) = shape.delimiters();
    format!("{}{}{}", open, sanitize_label(label), close)
}
