//! Source parser
//!
//! Recognizes suite and case declarations in a TypeScript unit using the
//! tree-sitter TypeScript grammar.  Recognized declarations are stored in an
//! arena (`ParsedUnit::nodes`); everything else is kept as extraneous content
//! on the nearest enclosing declaration.
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::{debug, trace};
use tree_sitter::{Language, Node, Parser};

use super::exporter::RUNTIME_BINDING;
use super::metadata::{MetadataRecord, contains_block};
use crate::{MetadataError, ParseError, Position, dedent_lines, line_indentation, unescape_js_string};

/// Callees declaring suites
pub const SUITE_CALLEES: [&str; 5] = ["describe", "context", "suite", "fdescribe", "xdescribe"];

/// Callees declaring cases
pub const CASE_CALLEES: [&str; 5] = ["it", "test", "specify", "fit", "xit"];

const FUNCTION_KINDS: [&str; 4] = [
    "function_expression",
    "function",
    "arrow_function",
    "generator_function",
];

fn default_max_depth() -> usize {
    32
}

/// Parser settings
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ParserOptions {
    /// Deepest allowed declaration nesting
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Index of a node within `ParsedUnit::nodes`
pub type NodeIndex = usize;

/// Vocabulary a declaration was recognized from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Suite,
    Case,
}

/// Workbook entry a declaration reconstructs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Group,
    Request,
}

bitflags! {
    /// Additional facts about a recognized declaration
    #[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
    pub struct ParsedNodeFlags: u8 {
        /// Declared with `.only` or an `f` prefix
        const EXCLUSIVE     = 0b00000001;
        /// Declared with `.skip` or an `x` prefix
        const SKIPPED       = 0b00000010;
        /// Carries a configuration object argument
        const HAS_CONFIG    = 0b00000100;
        /// Body starts with a generated `runtime.execute` dispatch
        const HAS_DISPATCH  = 0b00001000;
        /// Callback body is an expression rather than a block
        const EXPRESSION_BODY = 0b00010000;
    }
}

/// Name given to a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredName {
    /// Evaluated string literal
    Literal(String),
    /// Computed name, kept as raw source text
    Unresolvable(String),
}

impl DeclaredName {
    /// Literal value, if resolvable
    pub fn literal(&self) -> Option<&str> {
        match self {
            DeclaredName::Literal(name) => Some(name),
            DeclaredName::Unresolvable(_) => None,
        }
    }

    /// Literal value or raw source text
    pub fn as_str(&self) -> &str {
        match self {
            DeclaredName::Literal(name) => name,
            DeclaredName::Unresolvable(raw) => raw,
        }
    }
}

/// Result of looking for a metadata block
#[derive(Debug)]
pub enum MetadataOutcome {
    Present(MetadataRecord),
    Missing,
    Invalid(MetadataError),
}

impl MetadataOutcome {
    fn from_comment(text: &str) -> MetadataOutcome {
        match MetadataRecord::decode(text) {
            Ok(record) => MetadataOutcome::Present(record),
            Err(MetadataError::Missing) => MetadataOutcome::Missing,
            Err(err) => MetadataOutcome::Invalid(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraneousKind {
    Code,
    Comment,
}

/// Source the parser does not recognize, retained verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraneousContent {
    pub kind: ExtraneousKind,
    pub text: String,
    pub position: Position,
}

/// A recognized suite or case declaration
#[derive(Debug)]
pub struct ParsedNode {
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    /// Nesting depth, top-level declarations are at depth 1
    pub depth: usize,
    pub kind: DeclarationKind,
    pub role: NodeRole,
    /// Callee as written, e.g. `describe.only`
    pub callee: String,
    pub name: DeclaredName,
    /// Literal properties of the configuration object argument
    pub config: Map<String, Value>,
    pub metadata: MetadataOutcome,
    /// Raw test script text (requests only)
    pub body: Option<String>,
    /// Argument text of the generated dispatch call (requests only)
    pub dispatch: Option<String>,
    pub extraneous: Vec<ExtraneousContent>,
    pub position: Position,
    pub flags: ParsedNodeFlags,
    metadata_offset: Option<usize>,
}

/// Parse result for one source unit
#[derive(Debug)]
pub struct ParsedUnit {
    pub file_name: String,
    pub nodes: Vec<ParsedNode>,
    /// Top-level declarations, in source order
    pub top_level: Vec<NodeIndex>,
    /// Module specifiers of top-level import statements, in source order
    pub imports: Vec<String>,
    /// First metadata block found among top-level comments
    pub metadata: MetadataOutcome,
    /// Unrecognized top-level content
    pub extraneous: Vec<ExtraneousContent>,
}

impl ParsedUnit {
    pub fn node(&self, index: NodeIndex) -> &ParsedNode {
        &self.nodes[index]
    }
}

/// Parses units into recognized declaration trees
#[derive(Clone)]
pub struct SourceParser {
    options: ParserOptions,
    language: Language,
}

struct PendingBody<'tree> {
    body: Node<'tree>,
    owner: Option<NodeIndex>,
    depth: usize,
}

impl SourceParser {
    pub fn new(options: ParserOptions) -> SourceParser {
        SourceParser {
            options,
            language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse one unit.  Any syntax error fails the whole unit.
    pub fn parse_unit(&self, file_name: &str, text: &str) -> Result<ParsedUnit, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|err| ParseError::Language(err.to_string()))?;
        let tree = parser.parse(text, None).ok_or_else(|| ParseError::Syntax {
            file_name: file_name.to_string(),
            position: Position { line: 1, column: 1 },
            description: "parser produced no syntax tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(syntax_error(file_name, root, text));
        }

        let mut unit = ParsedUnit {
            file_name: file_name.to_string(),
            nodes: vec![],
            top_level: vec![],
            imports: vec![],
            metadata: MetadataOutcome::Missing,
            extraneous: vec![],
        };
        let mut unit_metadata_found = false;

        // Bodies are processed from an explicit worklist; each body appends its
        // declarations to its owner in source order
        let mut pending = vec![PendingBody {
            body: root,
            owner: None,
            depth: 0,
        }];

        while let Some(PendingBody { body, owner, depth }) = pending.pop() {
            let owner_metadata = owner.and_then(|i| unit.nodes[i].metadata_offset);
            let mut cursor = body.walk();
            let statements = body.named_children(&mut cursor).collect::<Vec<Node>>();

            for statement in statements {
                match statement.kind() {
                    "comment" => {
                        if owner_metadata == Some(statement.start_byte()) {
                            continue;
                        }
                        let comment = node_text(statement, text);
                        if owner.is_none() && !unit_metadata_found && contains_block(comment) {
                            unit_metadata_found = true;
                            unit.metadata = MetadataOutcome::from_comment(comment);
                            continue;
                        }
                        push_extraneous(&mut unit, owner, statement, text, ExtraneousKind::Comment);
                    }
                    "import_statement" if owner.is_none() => {
                        if let Some(source) = statement.child_by_field_name("source")
                            && let DeclaredName::Literal(module) = evaluate_name(source, text)
                        {
                            unit.imports.push(module);
                        } else {
                            push_extraneous(&mut unit, owner, statement, text, ExtraneousKind::Code);
                        }
                    }
                    "empty_statement" => {}
                    "expression_statement" => {
                        match self.recognize(statement, text, owner, depth + 1, &mut unit)? {
                            Some((index, nested_body)) => {
                                match owner {
                                    Some(parent) => unit.nodes[parent].children.push(index),
                                    None => unit.top_level.push(index),
                                }
                                if let Some(nested_body) = nested_body {
                                    pending.push(PendingBody {
                                        body: nested_body,
                                        owner: Some(index),
                                        depth: depth + 1,
                                    });
                                }
                            }
                            None => push_extraneous(
                                &mut unit,
                                owner,
                                statement,
                                text,
                                ExtraneousKind::Code,
                            ),
                        }
                    }
                    _ => push_extraneous(&mut unit, owner, statement, text, ExtraneousKind::Code),
                }
            }
        }

        debug!(
            unit = file_name,
            declarations = unit.nodes.len(),
            "Parsed unit"
        );
        Ok(unit)
    }

    /// Recognize a declaration statement, adding it to the arena.  Returns the
    /// new node index and, for groups, the body still to be processed.
    fn recognize<'tree>(
        &self,
        statement: Node<'tree>,
        text: &str,
        owner: Option<NodeIndex>,
        depth: usize,
        unit: &mut ParsedUnit,
    ) -> Result<Option<(NodeIndex, Option<Node<'tree>>)>, ParseError> {
        let Some(mut expression) = first_named_child(statement) else {
            return Ok(None);
        };
        if expression.kind() == "await_expression" {
            match first_named_child(expression) {
                Some(inner) => expression = inner,
                None => return Ok(None),
            }
        }
        if expression.kind() != "call_expression" {
            return Ok(None);
        }

        let (Some(function), Some(arguments)) = (
            expression.child_by_field_name("function"),
            expression.child_by_field_name("arguments"),
        ) else {
            return Ok(None);
        };
        let callee = compact(node_text(function, text));
        let Some((kind, mut flags)) = classify_callee(&callee) else {
            return Ok(None);
        };

        let mut cursor = arguments.walk();
        let args = arguments
            .named_children(&mut cursor)
            .filter(|a| a.kind() != "comment")
            .collect::<Vec<Node>>();
        let (name_node, config_node, callback) = match args.as_slice() {
            [name, callback] => (*name, None, *callback),
            [name, config, callback] if config.kind() == "object" => (*name, Some(*config), *callback),
            _ => return Ok(None),
        };
        if !FUNCTION_KINDS.contains(&callback.kind()) {
            return Ok(None);
        }

        let position = position_of(statement);
        if depth > self.options.max_depth {
            return Err(ParseError::DepthExceeded {
                file_name: unit.file_name.clone(),
                position,
                max_depth: self.options.max_depth,
            });
        }

        let name = evaluate_name(name_node, text);
        let config = match config_node {
            Some(config) => {
                flags |= ParsedNodeFlags::HAS_CONFIG;
                evaluate_config(config, text)
            }
            None => Map::new(),
        };

        let body = callback
            .child_by_field_name("body")
            .filter(|b| b.kind() == "statement_block");
        if body.is_none() {
            flags |= ParsedNodeFlags::EXPRESSION_BODY;
        }

        let mut metadata_offset = None;
        let mut metadata = MetadataOutcome::Missing;
        if let Some(body) = body {
            let mut cursor = body.walk();
            if let Some(comment) = body
                .named_children(&mut cursor)
                .find(|c| c.kind() == "comment" && contains_block(node_text(*c, text)))
            {
                metadata_offset = Some(comment.start_byte());
                metadata = MetadataOutcome::from_comment(node_text(comment, text));
            }
        }

        let role = match &metadata {
            MetadataOutcome::Present(MetadataRecord::Group(_)) => NodeRole::Group,
            MetadataOutcome::Present(MetadataRecord::Request(_)) => NodeRole::Request,
            MetadataOutcome::Present(MetadataRecord::Workbook(_)) => {
                metadata = MetadataOutcome::Invalid(MetadataError::Malformed {
                    position: None,
                    description: "workbook metadata is not valid on a declaration".to_string(),
                });
                default_role(kind)
            }
            _ => default_role(kind),
        };

        let mut request_body = None;
        let mut dispatch = None;
        if role == NodeRole::Request {
            match body {
                Some(body) => {
                    let extracted = extract_request_body(body, text, metadata_offset);
                    request_body = extracted.script;
                    if extracted.dispatch.is_some() {
                        flags |= ParsedNodeFlags::HAS_DISPATCH;
                    }
                    dispatch = extracted.dispatch;
                }
                None => {
                    request_body = callback
                        .child_by_field_name("body")
                        .map(|b| node_text(b, text).to_string());
                }
            }
        }

        trace!(callee = callee.as_str(), name = name.as_str(), depth, "Recognized declaration");

        let index = unit.nodes.len();
        unit.nodes.push(ParsedNode {
            parent: owner,
            children: vec![],
            depth,
            kind,
            role,
            callee,
            name,
            config,
            metadata,
            body: request_body,
            dispatch,
            extraneous: vec![],
            position,
            flags,
            metadata_offset,
        });

        let nested = if role == NodeRole::Group { body } else { None };
        Ok(Some((index, nested)))
    }
}

fn default_role(kind: DeclarationKind) -> NodeRole {
    match kind {
        DeclarationKind::Suite => NodeRole::Group,
        DeclarationKind::Case => NodeRole::Request,
    }
}

/// Match a callee against the suite and case vocabularies
pub fn classify_callee(callee: &str) -> Option<(DeclarationKind, ParsedNodeFlags)> {
    let (base, modifier) = match callee.split_once('.') {
        Some((base, modifier)) => (base, Some(modifier)),
        None => (callee, None),
    };
    let mut flags = match modifier {
        None => ParsedNodeFlags::empty(),
        Some("only") => ParsedNodeFlags::EXCLUSIVE,
        Some("skip") => ParsedNodeFlags::SKIPPED,
        Some(_) => return None,
    };

    let kind = if SUITE_CALLEES.contains(&base) {
        DeclarationKind::Suite
    } else if CASE_CALLEES.contains(&base) {
        DeclarationKind::Case
    } else {
        return None;
    };

    match base {
        "xdescribe" | "xit" | "fdescribe" | "fit" if modifier.is_some() => return None,
        "xdescribe" | "xit" => flags |= ParsedNodeFlags::SKIPPED,
        "fdescribe" | "fit" => flags |= ParsedNodeFlags::EXCLUSIVE,
        _ => {}
    }
    Some((kind, flags))
}

struct ExtractedBody {
    script: Option<String>,
    dispatch: Option<String>,
}

/// Pull the test script out of a request body.  The metadata comment and
/// the first generated dispatch statement are cut out wherever they sit;
/// everything else in the body stays in order.
fn extract_request_body(body: Node, text: &str, metadata_offset: Option<usize>) -> ExtractedBody {
    let start = body.start_byte() + 1;
    let end = body.end_byte().saturating_sub(1).max(start);
    let mut anchor = None;
    let mut dispatch = None;
    let mut generated = Vec::new();

    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        anchor.get_or_insert(child.start_byte());
        if child.kind() == "comment" && Some(child.start_byte()) == metadata_offset {
            generated.push(line_span(text, child));
        } else if dispatch.is_none()
            && let Some(argument) = dispatch_argument(child, text)
        {
            dispatch = Some(argument.to_string());
            generated.push(line_span(text, child));
        }
    }

    let mut remaining = String::with_capacity(end - start);
    let mut copied = start;
    for (from, to) in generated {
        let from = from.clamp(copied, end);
        remaining.push_str(&text[copied..from]);
        copied = to.clamp(from, end);
    }
    remaining.push_str(&text[copied..end]);

    let framed = trim_framing(&remaining);
    let script = match anchor {
        Some(anchor) => dedent_lines(
            framed,
            line_indentation(text, anchor),
            &template_continuation_lines(framed),
        ),
        None => framed.to_string(),
    };

    ExtractedBody {
        script: if script.is_empty() { None } else { Some(script) },
        dispatch,
    }
}

/// Byte range of `node`, widened to its whole line (including the line
/// break) when nothing else shares that line
fn line_span(text: &str, node: Node) -> (usize, usize) {
    let (from, to) = (node.start_byte(), node.end_byte());
    let line_start = text[..from].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if !text[line_start..from].trim_matches([' ', '\t']).is_empty() {
        return (from, to);
    }
    let rest = &text[to..];
    let after_spaces = rest.trim_start_matches([' ', '\t', '\r']);
    if !after_spaces.starts_with('\n') {
        return (from, to);
    }
    (line_start, to + (rest.len() - after_spaces.len()) + 1)
}

/// Flag, by line index, the lines of `script` that begin inside a multi-line
/// template literal.  Their leading whitespace is part of the string, so it
/// must not be indented or dedented.  Scripts that do not parse get no flags.
pub fn template_continuation_lines(script: &str) -> Vec<bool> {
    let mut verbatim = vec![false; script.split('\n').count()];
    let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    let mut parser = Parser::new();
    if parser.set_language(&language).is_err() {
        return verbatim;
    }
    let Some(tree) = parser.parse(script, None) else {
        return verbatim;
    };
    if tree.root_node().has_error() {
        return verbatim;
    }

    let mut pending = vec![tree.root_node()];
    while let Some(node) = pending.pop() {
        if node.kind() == "template_string" {
            // nested templates fall inside this range already
            let mut line = script[..node.start_byte()].matches('\n').count();
            for byte in script[node.byte_range()].bytes() {
                if byte == b'\n' {
                    line += 1;
                    if let Some(flag) = verbatim.get_mut(line) {
                        *flag = true;
                    }
                }
            }
            continue;
        }
        let mut cursor = node.walk();
        pending.extend(node.children(&mut cursor));
    }
    verbatim
}

/// Remove the line break after the preceding statement and the indentation
/// before the closing brace
fn trim_framing(slice: &str) -> &str {
    if !slice.contains('\n') {
        return slice.trim();
    }
    let mut result = slice;
    let after_spaces = result.trim_start_matches([' ', '\t']);
    if let Some(rest) = after_spaces.strip_prefix("\r\n") {
        result = rest;
    } else if let Some(rest) = after_spaces.strip_prefix('\n') {
        result = rest;
    }
    let before_spaces = result.trim_end_matches([' ', '\t']);
    result = match before_spaces.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => before_spaces,
    };
    result
}

/// If `statement` is `const response = await runtime.execute(<arg>)`,
/// return the argument text
fn dispatch_argument<'a>(statement: Node, text: &'a str) -> Option<&'a str> {
    if !matches!(statement.kind(), "lexical_declaration" | "variable_declaration") {
        return None;
    }
    let declarator = first_named_child(statement).filter(|d| d.kind() == "variable_declarator")?;
    let value = declarator
        .child_by_field_name("value")
        .filter(|v| v.kind() == "await_expression")?;
    let call = first_named_child(value).filter(|c| c.kind() == "call_expression")?;
    let function = call.child_by_field_name("function")?;
    if compact(node_text(function, text)) != format!("{RUNTIME_BINDING}.execute") {
        return None;
    }
    let arguments = call.child_by_field_name("arguments")?;
    let argument = first_named_child(arguments)?;
    Some(node_text(argument, text))
}

/// Evaluate a declaration name; only literal strings are resolved
fn evaluate_name(node: Node, text: &str) -> DeclaredName {
    let raw = node_text(node, text);
    let mut current = node;
    while current.kind() == "parenthesized_expression" {
        match first_named_child(current) {
            Some(inner) => current = inner,
            None => return DeclaredName::Unresolvable(raw.to_string()),
        }
    }

    let literal = match current.kind() {
        "string" => {
            let quoted = node_text(current, text);
            quoted
                .get(1..quoted.len().saturating_sub(1))
                .and_then(unescape_js_string)
        }
        "template_string" => {
            let mut cursor = current.walk();
            let substituted = current
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            let quoted = node_text(current, text);
            if substituted {
                None
            } else {
                quoted
                    .get(1..quoted.len().saturating_sub(1))
                    .and_then(unescape_js_string)
            }
        }
        _ => None,
    };

    match literal {
        Some(name) => DeclaredName::Literal(name),
        None => DeclaredName::Unresolvable(raw.to_string()),
    }
}

/// Extract literal-valued properties of an object expression
fn evaluate_config(node: Node, text: &str) -> Map<String, Value> {
    let mut config = Map::new();
    let mut cursor = node.walk();
    for pair in node.named_children(&mut cursor).filter(|p| p.kind() == "pair") {
        let (Some(key), Some(value)) = (
            pair.child_by_field_name("key"),
            pair.child_by_field_name("value"),
        ) else {
            continue;
        };
        let key = match key.kind() {
            "string" => evaluate_name(key, text).literal().map(String::from),
            _ => Some(node_text(key, text).to_string()),
        };
        let value = match value.kind() {
            "number" => parse_number(node_text(value, text)),
            "string" | "template_string" => {
                evaluate_name(value, text).literal().map(|s| Value::String(s.to_string()))
            }
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            "null" => Some(Value::Null),
            _ => None,
        };
        if let (Some(key), Some(value)) = (key, value) {
            config.insert(key, value);
        }
    }
    config
}

fn parse_number(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "");
    if let Ok(integer) = cleaned.parse::<i64>() {
        return Some(Value::Number(integer.into()));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn push_extraneous(
    unit: &mut ParsedUnit,
    owner: Option<NodeIndex>,
    node: Node,
    text: &str,
    kind: ExtraneousKind,
) {
    let content = ExtraneousContent {
        kind,
        text: node_text(node, text).to_string(),
        position: position_of(node),
    };
    match owner {
        Some(index) => unit.nodes[index].extraneous.push(content),
        None => unit.extraneous.push(content),
    }
}

fn syntax_error(file_name: &str, root: Node, text: &str) -> ParseError {
    let mut pending = vec![root];
    let mut found = None;
    while let Some(node) = pending.pop() {
        if node.is_error() || node.is_missing() {
            found = Some(node);
            break;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children = node.children(&mut cursor).collect::<Vec<Node>>();
            pending.extend(children.into_iter().rev());
        }
    }

    let (position, description) = match found {
        Some(node) if node.is_missing() => (position_of(node), format!("missing {}", node.kind())),
        Some(node) => {
            let snippet = node_text(node, text).chars().take(32).collect::<String>();
            (position_of(node), format!("unexpected `{}`", snippet.trim()))
        }
        None => (position_of(root), "invalid syntax".to_string()),
    };
    ParseError::Syntax {
        file_name: file_name.to_string(),
        position,
        description,
    }
}

fn first_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).find(|c| c.kind() != "comment")
}

fn node_text<'a>(node: Node, text: &'a str) -> &'a str {
    &text[node.byte_range()]
}

fn position_of(node: Node) -> Position {
    let point = node.start_position();
    Position {
        line: point.row + 1,
        column: point.column + 1,
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
