//! Control-flow reconstruction: walks each script of each target and writes
//! one Mermaid node per block, expanding loops and conditionals and stitching
//! their branches back into the enclosing flow.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ids::IdMapper;
use crate::mermaid::{Direction, FlowchartWriter, NodeShape};
use crate::project::{Block, ControlKind, Program, Target, SUBSTACK, SUBSTACK2};
use crate::resolve::ValueResolver;
use crate::translate::{substitute, SyntheticLabel, Translator};
use std::collections::{HashMap, HashSet};

/// Chain steps followed before a branch is cut with a runaway sentinel.
pub const MAX_DEPTH: usize = 500;

pub const ROOT_NODE: &str = "Start";

/// Blocks already emitted along the current script (or loop-body copy).
type VisitedSet<'a> = HashSet<&'a str>;

#[derive(Debug, Clone, Copy)]
pub struct FlowchartOptions<'a> {
    pub root_name: &'a str,
    pub direction: Direction,
    pub translator: Translator<'a>,
}

impl<'a> FlowchartOptions<'a> {
    pub fn new(root_name: &'a str, translator: Translator<'a>) -> Self {
        Self {
            root_name,
            direction: Direction::default(),
            translator,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flowchart {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Diagram text only; anomalies are absorbed silently.
pub fn generate(program: &Program, options: &FlowchartOptions<'_>) -> String {
    build_flowchart(program, options).text
}

pub fn build_flowchart(program: &Program, options: &FlowchartOptions<'_>) -> Flowchart {
    let mut ids = IdMapper::new();
    let mut out = FlowchartWriter::new(options.direction);
    let mut diagnostics = Diagnostics::default();

    let root_name = if options.root_name.trim().is_empty() {
        options.translator.synthetic(SyntheticLabel::UntitledProject)
    } else {
        options.root_name
    };
    out.node(ROOT_NODE, NodeShape::Rect, root_name);

    let mut script_count = 0usize;
    for target in &program.targets {
        if target.blocks.is_empty() {
            continue;
        }
        let target_node = format!("T{}", ids.get_safe_id(&target.name));
        out.edge_to_node(ROOT_NODE, &target_node, NodeShape::Rect, &target.name);

        let entries = target.entry_points();
        for (index, entry) in entries.iter().copied().enumerate() {
            let prefix = if entries.len() > 1 {
                format!("{}_{}", target_node, index)
            } else {
                target_node.clone()
            };
            let mut script = ScriptWalker {
                target,
                resolver: ValueResolver::new(target, options.translator),
                translator: options.translator,
                ids: &mut ids,
                out: &mut out,
                diagnostics: &mut diagnostics,
                prefix,
                construct_ends: HashMap::new(),
            };
            let first = script.node_id(entry);
            script.out.edge(&target_node, &first);
            script.walk_shared(entry, 0, &mut VisitedSet::new(), None);
            script_count += 1;
        }
    }

    log::debug!(
        "flowchart built: {} targets, {} scripts, {} node ids, {} diagnostics",
        program.targets.len(),
        script_count,
        ids.len(),
        diagnostics.len()
    );

    Flowchart {
        text: out.finish(),
        diagnostics: diagnostics.into_vec(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchVisit {
    Shared,
    Forked,
}

/// State for one script: node ids are namespaced by `prefix`, and
/// `construct_ends` remembers the reconvergence node of every loop or
/// conditional expanded so far.
struct ScriptWalker<'a, 'w> {
    target: &'a Target,
    resolver: ValueResolver<'a>,
    translator: Translator<'a>,
    ids: &'w mut IdMapper,
    out: &'w mut FlowchartWriter,
    diagnostics: &'w mut Diagnostics,
    prefix: String,
    construct_ends: HashMap<&'a str, String>,
}

impl<'a, 'w> ScriptWalker<'a, 'w> {
    fn node_id(&mut self, block_id: &str) -> String {
        format!("{}_{}", self.prefix, self.ids.get_safe_id(block_id))
    }

    /// Follows a chain, threading the caller's visited set through it.
    fn walk_shared(
        &mut self,
        block_id: &'a str,
        depth: usize,
        visited: &mut VisitedSet<'a>,
        continuation: Option<&str>,
    ) {
        let target = self.target;
        if visited.contains(block_id) {
            return;
        }
        let Some(block) = target.block(block_id) else {
            return;
        };
        visited.insert(block_id);
        let node = self.node_id(block_id);

        if depth > MAX_DEPTH {
            self.emit_block(&node, block);
            self.diagnostics.push(Diagnostic::DepthLimit {
                target: target.name.clone(),
                block_id: block_id.to_string(),
            });
            let runaway = self.translator.synthetic(SyntheticLabel::Runaway);
            self.out
                .edge_to_node(&node, &format!("{}_loop", node), NodeShape::Rect, runaway);
            return;
        }

        match block.control_kind() {
            Some(ControlKind::Forever) => self.expand_forever(block_id, block, &node, depth, visited),
            Some(kind @ (ControlKind::If | ControlKind::IfElse)) => {
                self.expand_conditional(kind, block_id, block, &node, depth, visited, continuation)
            }
            Some(kind @ (ControlKind::Repeat | ControlKind::RepeatUntil)) => {
                self.expand_bounded_loop(kind, block_id, block, &node, depth, visited, continuation)
            }
            None => self.follow_plain(block, &node, depth, visited, continuation),
        }
    }

    /// Expands a loop body against a private copy of the visited set, so a
    /// body never suppresses blocks for the flow outside it.
    fn walk_forked(
        &mut self,
        block_id: &'a str,
        depth: usize,
        visited: &VisitedSet<'a>,
        continuation: Option<&str>,
    ) {
        let mut body_visited = visited.clone();
        self.walk_shared(block_id, depth, &mut body_visited, continuation);
    }

    fn follow_plain(
        &mut self,
        block: &'a Block,
        node: &str,
        depth: usize,
        visited: &mut VisitedSet<'a>,
        continuation: Option<&str>,
    ) {
        self.emit_block(node, block);
        if let Some(next) = self.link(block.next.as_deref()) {
            let next_node = self.node_id(next);
            self.out.edge(node, &next_node);
            self.walk_shared(next, depth + 1, visited, continuation);
        } else if block.is_event() {
            self.terminate(node);
        } else if let Some(rejoin) = continuation {
            self.out.edge(node, rejoin);
        }
    }

    fn expand_forever(
        &mut self,
        block_id: &'a str,
        block: &'a Block,
        node: &str,
        depth: usize,
        visited: &mut VisitedSet<'a>,
    ) {
        self.emit_block(node, block);
        let cont = format!("{}_continue", node);
        let label = self.translator.synthetic(SyntheticLabel::Continue);
        self.out.node(&cont, NodeShape::Stadium, label);
        self.construct_ends.insert(block_id, cont.clone());

        match self.link(block.branch(SUBSTACK)) {
            Some(body) => {
                let first = self.node_id(body);
                self.out.edge(node, &first);
                self.walk_forked(body, depth + 1, visited, Some(cont.as_str()));
            }
            None => self.out.edge(node, &cont),
        }
        self.out.edge(&cont, node);
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_conditional(
        &mut self,
        kind: ControlKind,
        block_id: &'a str,
        block: &'a Block,
        node: &str,
        depth: usize,
        visited: &mut VisitedSet<'a>,
        continuation: Option<&str>,
    ) {
        self.emit_block(node, block);
        let end = format!("{}_cond_end", node);
        let label = self.translator.synthetic(SyntheticLabel::ConditionEnd);
        self.out.node(&end, NodeShape::Stadium, label);
        self.construct_ends.insert(block_id, end.clone());

        let yes = self.translator.synthetic(SyntheticLabel::Yes);
        let no = self.translator.synthetic(SyntheticLabel::No);
        let otherwise = match kind {
            ControlKind::IfElse => block.branch(SUBSTACK2),
            _ => None,
        };
        self.expand_branch(node, block.branch(SUBSTACK), yes, &end, depth, visited, BranchVisit::Shared);
        self.expand_branch(node, otherwise, no, &end, depth, visited, BranchVisit::Shared);
        self.rejoin(block_id, block, &end, depth, visited, continuation);
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_bounded_loop(
        &mut self,
        kind: ControlKind,
        block_id: &'a str,
        block: &'a Block,
        node: &str,
        depth: usize,
        visited: &mut VisitedSet<'a>,
        continuation: Option<&str>,
    ) {
        self.emit_block(node, block);
        let end = format!("{}_loop_end", node);
        let label = self.translator.synthetic(SyntheticLabel::LoopEnd);
        self.out.node(&end, NodeShape::Stadium, label);
        self.construct_ends.insert(block_id, end.clone());

        // `repeat until` keeps looping while its condition is false.
        let (body_label, exit_label) = match kind {
            ControlKind::RepeatUntil => (SyntheticLabel::False, SyntheticLabel::True),
            _ => (SyntheticLabel::True, SyntheticLabel::False),
        };
        let body_label = self.translator.synthetic(body_label);
        let exit_label = self.translator.synthetic(exit_label);
        self.expand_branch(
            node,
            block.branch(SUBSTACK),
            body_label,
            &end,
            depth,
            visited,
            BranchVisit::Forked,
        );
        self.out.labeled_edge(node, &end, exit_label);
        self.rejoin(block_id, block, &end, depth, visited, continuation);
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_branch(
        &mut self,
        from: &str,
        start: Option<&'a str>,
        label: &str,
        end: &str,
        depth: usize,
        visited: &mut VisitedSet<'a>,
        visit: BranchVisit,
    ) {
        let Some(first) = self.link(start) else {
            self.out.labeled_edge(from, end, label);
            return;
        };
        let first_node = self.node_id(first);
        self.out.labeled_edge(from, &first_node, label);
        match visit {
            BranchVisit::Shared => self.walk_shared(first, depth + 1, visited, Some(end)),
            BranchVisit::Forked => self.walk_forked(first, depth + 1, visited, Some(end)),
        }
    }

    /// Connects a construct's end node onward: its own `next`, else the
    /// nearest enclosing construct, else the chain's continuation, else a
    /// fresh terminal.
    fn rejoin(
        &mut self,
        block_id: &'a str,
        block: &'a Block,
        end: &str,
        depth: usize,
        visited: &mut VisitedSet<'a>,
        continuation: Option<&str>,
    ) {
        if let Some(next) = self.link(block.next.as_deref()) {
            let next_node = self.node_id(next);
            self.out.edge(end, &next_node);
            self.walk_shared(next, depth + 1, visited, continuation);
            return;
        }
        let onward = self
            .enclosing_continuation(block_id)
            .or_else(|| continuation.map(str::to_string));
        match onward {
            Some(onward) => self.out.edge(end, &onward),
            None => self.terminate(end),
        }
    }

    /// Walks `parent` links upward. Ancestors reached through their `next` are
    /// predecessors in the same chain and are skipped; the first ancestor that
    /// owns the branch we came from supplies the target.
    fn enclosing_continuation(&mut self, start: &'a str) -> Option<String> {
        let target = self.target;
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(start);
        let mut child = start;
        let mut current = target.block(start).and_then(|b| b.parent.as_deref());

        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let Some(ancestor) = target.block(id) else {
                break;
            };
            let next = ancestor.next.as_deref();
            if next != Some(child) {
                if ancestor.control_kind().is_some() {
                    if let Some(end) = self.construct_ends.get(id) {
                        return Some(end.clone());
                    }
                }
                if let Some(next) =
                    next.filter(|next| *next != start && target.blocks.contains_key(*next))
                {
                    return Some(self.node_id(next));
                }
            }
            child = id;
            current = ancestor.parent.as_deref();
        }
        None
    }

    fn link(&mut self, id: Option<&'a str>) -> Option<&'a str> {
        let id = id?;
        if self.target.blocks.contains_key(id) {
            return Some(id);
        }
        self.diagnostics.push(Diagnostic::MissingBlock {
            target: self.target.name.clone(),
            block_id: id.to_string(),
        });
        None
    }

    fn emit_block(&mut self, node: &str, block: &Block) {
        let label = self.block_label(block);
        self.out
            .node(node, NodeShape::for_opcode(&block.opcode), &label);
    }

    fn block_label(&mut self, block: &Block) -> String {
        let template = match block.control_kind() {
            Some(ControlKind::If | ControlKind::IfElse) => self
                .translator
                .translate(&block.opcode)
                .unwrap_or_else(|| self.translator.synthetic(SyntheticLabel::IfFallback)),
            Some(ControlKind::RepeatUntil) => match self.translator.translate(&block.opcode) {
                Some(template) => template,
                None => return self.resolver.statement_label(block, self.diagnostics),
            },
            _ => return self.resolver.statement_label(block, self.diagnostics),
        };
        let condition = self.resolver.condition(block, self.diagnostics);
        if condition.is_empty() {
            // Unfilled slot: drop the placeholder and the gap it leaves.
            let rendered = substitute(template, &[String::new()]);
            return rendered.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        substitute(template, &[condition])
    }

    fn terminate(&mut self, from: &str) {
        let end = self.translator.synthetic(SyntheticLabel::End);
        self.out
            .edge_to_node(from, &format!("{}_end", from), NodeShape::Stadium, end);
    }
}
