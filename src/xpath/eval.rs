//! Expression evaluation over a normalized [`Document`].
//!
//! Values follow XPath 1.0: node-sets, strings, numbers and booleans, with
//! the usual conversions between them. Node-sets are kept sorted in document
//! order, which for this arena is simply `NodeId` order.

use crate::dom::{Document, NodeId, NodeKind};

use super::parser::{ArithOp, Axis, CompareOp, Expr, Function, LocationPath, NodeTest, Step};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Nodes(Vec<NodeId>),
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Nodes(_) => "node-set",
            Value::Str(_) => "string",
            Value::Num(_) => "number",
            Value::Bool(_) => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Context {
    node: NodeId,
    position: usize,
    size: usize,
}

pub(crate) struct Evaluator<'d> {
    doc: &'d Document,
}

type EvalResult<T> = Result<T, String>;

impl<'d> Evaluator<'d> {
    pub(crate) fn new(doc: &'d Document) -> Self {
        Self { doc }
    }

    /// Evaluates `expr` with the document node as context.
    pub(crate) fn evaluate(&self, expr: &Expr) -> EvalResult<Value> {
        let ctx = Context {
            node: self.doc.root(),
            position: 1,
            size: 1,
        };
        self.eval(expr, ctx)
    }

    fn eval(&self, expr: &Expr, ctx: Context) -> EvalResult<Value> {
        match expr {
            Expr::Path(path) => self.location_path(path, ctx).map(Value::Nodes),
            Expr::Filter {
                base,
                predicates,
                steps,
            } => {
                let nodes = self.node_set(base, ctx, "a predicate or path step")?;
                let filtered = self.apply_predicates(nodes, predicates)?;
                self.apply_steps(filtered, steps).map(Value::Nodes)
            }
            Expr::Union(parts) => {
                let mut all = Vec::new();
                for part in parts {
                    all.extend(self.node_set(part, ctx, "'|'")?);
                }
                all.sort_unstable();
                all.dedup();
                Ok(Value::Nodes(all))
            }
            Expr::Or(lhs, rhs) => {
                Ok(Value::Bool(self.boolean(&self.eval(lhs, ctx)?) || self.boolean(&self.eval(rhs, ctx)?)))
            }
            Expr::And(lhs, rhs) => {
                Ok(Value::Bool(self.boolean(&self.eval(lhs, ctx)?) && self.boolean(&self.eval(rhs, ctx)?)))
            }
            Expr::Compare(op, lhs, rhs) => {
                let lhs = self.eval(lhs, ctx)?;
                let rhs = self.eval(rhs, ctx)?;
                Ok(Value::Bool(self.compare(*op, &lhs, &rhs)))
            }
            Expr::Arith(op, lhs, rhs) => {
                let lhs = self.number(&self.eval(lhs, ctx)?);
                let rhs = self.number(&self.eval(rhs, ctx)?);
                Ok(Value::Num(match op {
                    ArithOp::Add => lhs + rhs,
                    ArithOp::Sub => lhs - rhs,
                    ArithOp::Mul => lhs * rhs,
                    ArithOp::Div => lhs / rhs,
                    // Truncating remainder, sign of the dividend.
                    ArithOp::Mod => lhs % rhs,
                }))
            }
            Expr::Negate(operand) => Ok(Value::Num(-self.number(&self.eval(operand, ctx)?))),
            Expr::Literal(text) => Ok(Value::Str(text.clone())),
            Expr::Number(n) => Ok(Value::Num(*n)),
            Expr::Call(function, args) => self.call(*function, args, ctx),
        }
    }

    fn node_set(&self, expr: &Expr, ctx: Context, used_with: &str) -> EvalResult<Vec<NodeId>> {
        match self.eval(expr, ctx)? {
            Value::Nodes(nodes) => Ok(nodes),
            _ => Err(format!("{used_with} can only be applied to a node-set")),
        }
    }

    fn location_path(&self, path: &LocationPath, ctx: Context) -> EvalResult<Vec<NodeId>> {
        let start = if path.absolute { self.doc.root() } else { ctx.node };
        self.apply_steps(vec![start], &path.steps)
    }

    fn apply_steps(&self, start: Vec<NodeId>, steps: &[Step]) -> EvalResult<Vec<NodeId>> {
        let mut current = start;
        for step in steps {
            let mut next = Vec::new();
            for &node in &current {
                let candidates: Vec<NodeId> = self
                    .axis(step.axis, node)
                    .into_iter()
                    .filter(|&n| self.matches(step.axis, &step.test, n))
                    .collect();
                next.extend(self.apply_predicates(candidates, &step.predicates)?);
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }
        Ok(current)
    }

    /// Filters `nodes` (in axis order) through each predicate in turn.
    fn apply_predicates(&self, mut nodes: Vec<NodeId>, predicates: &[Expr]) -> EvalResult<Vec<NodeId>> {
        for predicate in predicates {
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (i, &node) in nodes.iter().enumerate() {
                let ctx = Context {
                    node,
                    position: i + 1,
                    size,
                };
                let keep = match self.eval(predicate, ctx)? {
                    Value::Num(n) => n == ctx.position as f64,
                    other => self.boolean(&other),
                };
                if keep {
                    kept.push(node);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }

    /// Nodes on `axis` from `node`, in axis order (reverse axes nearest first).
    fn axis(&self, axis: Axis, node: NodeId) -> Vec<NodeId> {
        let doc = self.doc;
        match axis {
            Axis::Child => doc.node(node).children().to_vec(),
            Axis::Descendant => doc.descendants(node).collect(),
            Axis::DescendantOrSelf => std::iter::once(node).chain(doc.descendants(node)).collect(),
            Axis::SelfAxis => vec![node],
            Axis::Parent => doc.node(node).parent().into_iter().collect(),
            Axis::Ancestor => doc.ancestors(node).collect(),
            Axis::AncestorOrSelf => std::iter::once(node).chain(doc.ancestors(node)).collect(),
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                if doc.node(node).kind() == NodeKind::Attribute {
                    return Vec::new();
                }
                let Some(parent) = doc.node(node).parent() else {
                    return Vec::new();
                };
                let siblings = doc.node(parent).children();
                let Some(at) = siblings.iter().position(|&s| s == node) else {
                    return Vec::new();
                };
                if axis == Axis::FollowingSibling {
                    siblings[at + 1..].to_vec()
                } else {
                    siblings[..at].iter().rev().copied().collect()
                }
            }
            Axis::Following => doc.following(node).collect(),
            Axis::Preceding => doc.preceding(node).collect(),
            Axis::Attribute => doc.node(node).attributes().to_vec(),
            // HTML trees carry no namespace nodes.
            Axis::Namespace => Vec::new(),
        }
    }

    fn matches(&self, axis: Axis, test: &NodeTest, node: NodeId) -> bool {
        let n = self.doc.node(node);
        let principal = if axis == Axis::Attribute {
            NodeKind::Attribute
        } else {
            NodeKind::Element
        };
        match test {
            NodeTest::Node => true,
            NodeTest::Any => n.kind() == principal,
            NodeTest::Name(name) => n.kind() == principal && n.name() == Some(name.as_str()),
            NodeTest::Text => n.kind() == NodeKind::Text,
            NodeTest::Comment => n.kind() == NodeKind::Comment,
            // The HTML parser turns processing instructions into comments.
            NodeTest::ProcessingInstruction(_) => false,
        }
    }

    fn call(&self, function: Function, args: &[Expr], ctx: Context) -> EvalResult<Value> {
        let arg = |i: usize| self.eval(&args[i], ctx);
        // Missing optional argument defaults to the context node.
        let arg_string = |i: usize| -> EvalResult<String> {
            match args.get(i) {
                Some(expr) => Ok(self.string(&self.eval(expr, ctx)?)),
                None => Ok(self.doc.string_value(ctx.node)),
            }
        };
        let arg_number = |i: usize| -> EvalResult<f64> { Ok(self.number(&arg(i)?)) };

        Ok(match function {
            Function::Last => Value::Num(ctx.size as f64),
            Function::Position => Value::Num(ctx.position as f64),
            Function::Count => Value::Num(self.node_set(&args[0], ctx, "count()")?.len() as f64),
            Function::Id => Value::Nodes(self.id(&arg(0)?)),
            Function::LocalName | Function::Name => {
                let target = match args.first() {
                    Some(expr) => self.node_set(expr, ctx, "name()")?.first().copied(),
                    None => Some(ctx.node),
                };
                let name = target
                    .and_then(|t| self.doc.node(t).name())
                    .unwrap_or_default()
                    .to_string();
                Value::Str(name)
            }
            Function::NamespaceUri => {
                if let Some(expr) = args.first() {
                    self.node_set(expr, ctx, "namespace-uri()")?;
                }
                Value::Str(String::new())
            }
            Function::String => Value::Str(arg_string(0)?),
            Function::Concat => {
                let mut out = String::new();
                for i in 0..args.len() {
                    out.push_str(&arg_string(i)?);
                }
                Value::Str(out)
            }
            Function::StartsWith => Value::Bool(arg_string(0)?.starts_with(arg_string(1)?.as_str())),
            Function::Contains => Value::Bool(arg_string(0)?.contains(arg_string(1)?.as_str())),
            Function::SubstringBefore => {
                let text = arg_string(0)?;
                let needle = arg_string(1)?;
                Value::Str(text.find(&needle).map(|at| text[..at].to_string()).unwrap_or_default())
            }
            Function::SubstringAfter => {
                let text = arg_string(0)?;
                let needle = arg_string(1)?;
                Value::Str(
                    text.find(&needle)
                        .map(|at| text[at + needle.len()..].to_string())
                        .unwrap_or_default(),
                )
            }
            Function::Substring => {
                let text = arg_string(0)?;
                let start = round(arg_number(1)?);
                let end = match args.get(2) {
                    Some(_) => start + round(arg_number(2)?),
                    None => f64::INFINITY,
                };
                Value::Str(substring(&text, start, end))
            }
            Function::StringLength => Value::Num(arg_string(0)?.chars().count() as f64),
            Function::NormalizeSpace => {
                Value::Str(arg_string(0)?.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            Function::Translate => Value::Str(translate(&arg_string(0)?, &arg_string(1)?, &arg_string(2)?)),
            Function::Boolean => Value::Bool(self.boolean(&arg(0)?)),
            Function::Not => Value::Bool(!self.boolean(&arg(0)?)),
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
            Function::Lang => Value::Bool(self.lang(ctx.node, &arg_string(0)?)),
            Function::Number => match args.first() {
                Some(_) => Value::Num(arg_number(0)?),
                None => Value::Num(parse_number(&self.doc.string_value(ctx.node))),
            },
            Function::Sum => Value::Num(
                self.node_set(&args[0], ctx, "sum()")?
                    .into_iter()
                    .map(|n| parse_number(&self.doc.string_value(n)))
                    .sum(),
            ),
            Function::Floor => Value::Num(arg_number(0)?.floor()),
            Function::Ceiling => Value::Num(arg_number(0)?.ceil()),
            Function::Round => Value::Num(round(arg_number(0)?)),
        })
    }

    /// Elements whose `id` attribute is one of the whitespace-separated
    /// tokens in `value` (every node's string value, for a node-set).
    fn id(&self, value: &Value) -> Vec<NodeId> {
        let wanted: Vec<String> = match value {
            Value::Nodes(nodes) => nodes
                .iter()
                .flat_map(|&n| {
                    self.doc
                        .string_value(n)
                        .split_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect(),
            other => self.string(other).split_whitespace().map(str::to_string).collect(),
        };
        self.doc
            .iter()
            .filter(|(_, n)| n.kind() == NodeKind::Attribute && n.name() == Some("id"))
            .filter(|(_, n)| n.value().is_some_and(|v| wanted.iter().any(|w| w == v)))
            .filter_map(|(_, n)| n.parent())
            .collect()
    }

    /// True when the nearest `lang` attribute on `node` or an ancestor is
    /// `wanted` or a sub-language of it, ignoring case.
    fn lang(&self, node: NodeId, wanted: &str) -> bool {
        let declared = std::iter::once(node)
            .chain(self.doc.ancestors(node))
            .find_map(|n| {
                self.doc
                    .node(n)
                    .attributes()
                    .iter()
                    .map(|&a| self.doc.node(a))
                    .find(|a| a.name() == Some("lang"))
                    .and_then(|a| a.value())
            });
        let Some(declared) = declared else {
            return false;
        };
        let declared = declared.to_ascii_lowercase();
        let wanted = wanted.to_ascii_lowercase();
        declared == wanted
            || declared
                .strip_prefix(wanted.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
    }

    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(nodes) => nodes
                .first()
                .map(|&n| self.doc.string_value(n))
                .unwrap_or_default(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Num(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            other => parse_number(&self.string(other)),
        }
    }

    fn compare(&self, op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::Nodes(a), Value::Nodes(b)) => a.iter().any(|&x| {
                let x = Value::Str(self.doc.string_value(x));
                b.iter()
                    .any(|&y| self.compare_atoms(op, &x, &Value::Str(self.doc.string_value(y))))
            }),
            (Value::Nodes(nodes), Value::Bool(_)) => self.compare_atoms(op, &Value::Bool(!nodes.is_empty()), rhs),
            (Value::Bool(_), Value::Nodes(nodes)) => self.compare_atoms(op, lhs, &Value::Bool(!nodes.is_empty())),
            (Value::Nodes(nodes), atom) => nodes
                .iter()
                .any(|&n| self.compare_atoms(op, &Value::Str(self.doc.string_value(n)), atom)),
            (atom, Value::Nodes(nodes)) => nodes
                .iter()
                .any(|&n| self.compare_atoms(op, atom, &Value::Str(self.doc.string_value(n)))),
            _ => self.compare_atoms(op, lhs, rhs),
        }
    }

    /// Compares two non-node-set values.
    fn compare_atoms(&self, op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
        match op {
            CompareOp::Eq | CompareOp::NotEq => {
                let equal = match (lhs, rhs) {
                    (Value::Bool(_), _) | (_, Value::Bool(_)) => self.boolean(lhs) == self.boolean(rhs),
                    (Value::Num(_), _) | (_, Value::Num(_)) => self.number(lhs) == self.number(rhs),
                    _ => self.string(lhs) == self.string(rhs),
                };
                equal == (op == CompareOp::Eq)
            }
            CompareOp::Lt => self.number(lhs) < self.number(rhs),
            CompareOp::Le => self.number(lhs) <= self.number(rhs),
            CompareOp::Gt => self.number(lhs) > self.number(rhs),
            CompareOp::Ge => self.number(lhs) >= self.number(rhs),
        }
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    // XPath numbers have no exponent, sign prefix '+', or "inf"/"nan" spellings.
    let valid = !trimmed.is_empty()
        && trimmed
            .strip_prefix('-')
            .unwrap_or(trimmed)
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.');
    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// XPath `round()`: halves round towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        (n + 0.5).floor()
    }
}

/// Characters at 1-based positions `p` with `start <= p < end`.
fn substring(text: &str, start: f64, end: f64) -> String {
    text.chars()
        .zip(1u32..)
        .filter(|&(_, p)| {
            let p = f64::from(p);
            p >= start && p < end
        })
        .map(|(c, _)| c)
        .collect()
}

/// Maps each character found in `from` to the one at the same position in
/// `to`, dropping it when `to` is shorter. Only the first occurrence in
/// `from` counts.
fn translate(text: &str, from: &str, to: &str) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    text.chars()
        .filter_map(|c| match from.iter().position(|&f| f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect()
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}
