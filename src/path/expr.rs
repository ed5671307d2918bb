use crate::path::errors::QueryError;
use crate::tree::TreeNode;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A compiled path expression.
///
/// # Syntax
///
/// ```text
/// expr      := path ('|' path)*
/// path      := ('/' | '//')? step (('/' | '//') step)*
/// step      := '.' | '..' | (axis '::')? test predicate*
/// test      := name | 'quoted name' | '*'
/// predicate := '[' n ']' | '[' '@name' '=' 'text' ']' | '[' '@value' '=' 'text' ']'
/// ```
///
/// A leading `/` starts at the root node, `//` searches every descendant.
/// Anonymous tokens are addressed by quoting their name, e.g. `//':'`.
///
/// ```text
/// //variable_declarator/type_annotation/*
/// //lexical_declaration//identifier[@value='x']
/// //':' | //':'/following-sibling::*
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    source: String,
    paths: Vec<LocationPath>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// Direction of navigation for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfNode,
    Parent,
    FollowingSibling,
    PrecedingSibling,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "self" => Some(Axis::SelfNode),
            "parent" => Some(Axis::Parent),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            _ => None,
        }
    }
}

/// Which nodes a step keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Anything, including the virtual document above the root (`node()`)
    AnyNode,
    /// Any tree node (`*`)
    Any,
    /// Tree nodes with this name
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 1-based position within the step's candidates for one context node
    Position(usize),
    NameEquals(String),
    ValueEquals(String),
}

impl PathExpression {
    /// Parse a path expression.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let tokens = tokenize(query)?;
        let mut parser = ExprParser {
            query,
            tokens,
            pos: 0,
        };
        let paths = parser.parse_union()?;
        Ok(Self {
            source: query.to_string(),
            paths,
        })
    }

    /// The text this expression was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every node name the expression tests for, in order of appearance.
    pub fn name_tests(&self) -> impl Iterator<Item = &str> {
        self.paths
            .iter()
            .flat_map(|p| p.steps.iter())
            .filter_map(|s| match &s.test {
                NodeTest::Name(name) => Some(name.as_str()),
                _ => None,
            })
    }

    /// Evaluate against `root`, returning distinct matches in document order.
    pub fn evaluate(&self, root: &Arc<TreeNode>) -> Vec<Arc<TreeNode>> {
        let arena = Arena::build(root);
        let mut selected = BTreeSet::new();

        for path in &self.paths {
            let start = if path.absolute { DOCUMENT } else { ROOT };
            if path.absolute && path.steps.is_empty() {
                selected.insert(ROOT);
                continue;
            }

            let mut context = BTreeSet::from([start]);
            for step in &path.steps {
                context = arena.apply_step(&context, step);
                if context.is_empty() {
                    break;
                }
            }
            selected.extend(context);
        }

        selected
            .into_iter()
            .filter_map(|idx| arena.entries[idx].node.clone())
            .collect()
    }
}

impl std::fmt::Display for PathExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

// Arena indices: 0 is the virtual document, 1 the root node. Entries are
// pushed in pre-order, so index order is document order and every subtree
// occupies a contiguous index range.
const DOCUMENT: usize = 0;
const ROOT: usize = 1;

struct Entry {
    node: Option<Arc<TreeNode>>,
    parent: Option<usize>,
    children: Vec<usize>,
    subtree_end: usize,
}

struct Arena {
    entries: Vec<Entry>,
}

impl Arena {
    fn build(root: &Arc<TreeNode>) -> Self {
        let mut entries = Vec::with_capacity(root.subtree_size() + 1);
        entries.push(Entry {
            node: None,
            parent: None,
            children: Vec::new(),
            subtree_end: 0,
        });

        let mut pending = vec![(Arc::clone(root), DOCUMENT)];
        while let Some((node, parent)) = pending.pop() {
            let idx = entries.len();
            entries.push(Entry {
                node: Some(Arc::clone(&node)),
                parent: Some(parent),
                children: Vec::with_capacity(node.children.len()),
                subtree_end: idx + 1,
            });
            entries[parent].children.push(idx);
            pending.extend(node.children.iter().rev().map(|child| (Arc::clone(child), idx)));
        }

        // A subtree ends where its last child's subtree ends.
        for idx in (0..entries.len()).rev() {
            if let Some(&last) = entries[idx].children.last() {
                entries[idx].subtree_end = entries[last].subtree_end;
            }
        }

        Arena { entries }
    }

    /// Candidates along `axis`, nearest first for reverse axes.
    fn axis(&self, ctx: usize, axis: Axis) -> Vec<usize> {
        let entry = &self.entries[ctx];
        match axis {
            Axis::Child => entry.children.clone(),
            Axis::Descendant => (ctx + 1..entry.subtree_end).collect(),
            Axis::DescendantOrSelf => (ctx..entry.subtree_end).collect(),
            Axis::SelfNode => vec![ctx],
            Axis::Parent => entry.parent.into_iter().collect(),
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                let Some(parent) = entry.parent else {
                    return Vec::new();
                };
                let siblings = &self.entries[parent].children;
                let at = siblings.iter().position(|&s| s == ctx).unwrap_or(0);
                if axis == Axis::FollowingSibling {
                    siblings[at + 1..].to_vec()
                } else {
                    siblings[..at].iter().rev().copied().collect()
                }
            }
        }
    }

    fn passes(&self, idx: usize, test: &NodeTest) -> bool {
        match (test, &self.entries[idx].node) {
            (NodeTest::AnyNode, _) => true,
            (NodeTest::Any, node) => node.is_some(),
            (NodeTest::Name(name), Some(node)) => node.name == *name,
            (NodeTest::Name(_), None) => false,
        }
    }

    fn apply_step(&self, context: &BTreeSet<usize>, step: &Step) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for &ctx in context {
            let mut candidates: Vec<usize> = self
                .axis(ctx, step.axis)
                .into_iter()
                .filter(|&idx| self.passes(idx, &step.test))
                .collect();

            for predicate in &step.predicates {
                candidates = match predicate {
                    Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
                    Predicate::NameEquals(name) => candidates
                        .into_iter()
                        .filter(|&idx| self.entries[idx].node.as_ref().is_some_and(|n| n.name == *name))
                        .collect(),
                    Predicate::ValueEquals(value) => candidates
                        .into_iter()
                        .filter(|&idx| {
                            self.entries[idx].node.as_ref().is_some_and(|n| n.value == *value)
                        })
                        .collect(),
                };
            }
            out.extend(candidates);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Slash,
    DoubleSlash,
    Pipe,
    LBracket,
    RBracket,
    At,
    Eq,
    DoubleColon,
    Star,
    Dot,
    DotDot,
    Name(String),
    Literal(String),
    Number(usize),
}

fn tokenize(query: &str) -> Result<Vec<(usize, Token)>, QueryError> {
    let chars: Vec<(usize, char)> = query.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let error = |position: usize, message: &str| QueryError::Syntax {
        query: query.to_string(),
        position,
        message: message.to_string(),
    };

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, width) = match c {
            '/' if next == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '|' => (Token::Pipe, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '@' => (Token::At, 1),
            '=' => (Token::Eq, 1),
            '*' => (Token::Star, 1),
            ':' if next == Some(':') => (Token::DoubleColon, 2),
            '.' if next == Some('.') => (Token::DotDot, 2),
            '.' => (Token::Dot, 1),
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&(_, q)| q == c)
                    .ok_or_else(|| error(pos, "unterminated string literal"))?;
                let text: String = chars[i + 1..i + 1 + close].iter().map(|&(_, ch)| ch).collect();
                (Token::Literal(text), close + 2)
            }
            d if d.is_ascii_digit() => {
                let len = chars[i..].iter().take_while(|(_, ch)| ch.is_ascii_digit()).count();
                let digits: String = chars[i..i + len].iter().map(|&(_, ch)| ch).collect();
                let n = digits
                    .parse()
                    .map_err(|_| error(pos, "position out of range"))?;
                (Token::Number(n), len)
            }
            n if n.is_alphabetic() || n == '_' => {
                let len = chars[i..]
                    .iter()
                    .take_while(|(_, ch)| ch.is_alphanumeric() || *ch == '_' || *ch == '-')
                    .count();
                let name: String = chars[i..i + len].iter().map(|&(_, ch)| ch).collect();
                (Token::Name(name), len)
            }
            _ => return Err(error(pos, &format!("unexpected character '{c}'"))),
        };

        tokens.push((pos, token));
        i += width;
    }

    Ok(tokens)
}

struct ExprParser<'q> {
    query: &'q str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        token
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        let position = self
            .tokens
            .get(self.pos)
            .map(|&(p, _)| p)
            .unwrap_or(self.query.len());
        QueryError::Syntax {
            query: self.query.to_string(),
            position,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), QueryError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn parse_union(&mut self) -> Result<Vec<LocationPath>, QueryError> {
        if self.tokens.is_empty() {
            return Err(self.error("empty path expression"));
        }

        let mut paths = vec![self.parse_path()?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            paths.push(self.parse_path()?);
        }

        if self.pos < self.tokens.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(paths)
    }

    fn parse_path(&mut self) -> Result<LocationPath, QueryError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if matches!(self.peek(), None | Some(Token::Pipe)) {
                    return Ok(LocationPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(descendant_or_self());
                true
            }
            _ => false,
        };

        steps.push(self.parse_step()?);
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(descendant_or_self());
                }
                _ => break,
            }
            steps.push(self.parse_step()?);
        }

        Ok(LocationPath { absolute, steps })
    }

    fn parse_step(&mut self) -> Result<Step, QueryError> {
        match self.peek() {
            Some(Token::Dot) => {
                self.pos += 1;
                return Ok(Step {
                    axis: Axis::SelfNode,
                    test: NodeTest::AnyNode,
                    predicates: Vec::new(),
                });
            }
            Some(Token::DotDot) => {
                self.pos += 1;
                return Ok(Step {
                    axis: Axis::Parent,
                    test: NodeTest::Any,
                    predicates: Vec::new(),
                });
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        if let (Some(Token::Name(name)), Some(Token::DoubleColon)) = (self.peek(), self.peek_at(1)) {
            axis = Axis::from_name(name).ok_or_else(|| self.error(format!("unknown axis '{name}'")))?;
            self.pos += 2;
        }

        let test = match self.next() {
            Some(Token::Star) => NodeTest::Any,
            Some(Token::Name(name)) | Some(Token::Literal(name)) => NodeTest::Name(name),
            _ => {
                self.pos -= 1;
                return Err(self.error("expected node name or '*'"));
            }
        };

        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            predicates.push(self.parse_predicate()?);
            self.expect(Token::RBracket, "']'")?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, QueryError> {
        match self.next() {
            Some(Token::Number(0)) => {
                self.pos -= 1;
                Err(self.error("positions start at 1"))
            }
            Some(Token::Number(n)) => Ok(Predicate::Position(n)),
            Some(Token::At) => {
                let attribute = match self.next() {
                    Some(Token::Name(attr)) => attr,
                    _ => {
                        self.pos -= 1;
                        return Err(self.error("expected attribute name"));
                    }
                };
                self.expect(Token::Eq, "'='")?;
                let value = match self.next() {
                    Some(Token::Literal(value)) => value,
                    _ => {
                        self.pos -= 1;
                        return Err(self.error("expected quoted value"));
                    }
                };
                match attribute.as_str() {
                    "name" => Ok(Predicate::NameEquals(value)),
                    "value" => Ok(Predicate::ValueEquals(value)),
                    other => Err(self.error(format!("unknown attribute '@{other}'"))),
                }
            }
            _ => {
                self.pos -= 1;
                Err(self.error("expected position or attribute test"))
            }
        }
    }
}

fn descendant_or_self() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::AnyNode,
        predicates: Vec::new(),
    }
}
