//! FFmpeg audio filter-graph compilation.
//!
//! [`compile`] turns an ordered list of [`FilterSpec`] nodes into the string
//! passed to `-af`. Each node is classified into a [`FilterNode`] and
//! rendered by kind; most filters use the generic `name=k=v:k=v` form.
//!
//! ```text
//! highpass=f=80,lowpass=f=14000,loudnorm=I=-16:LRA=11:TP=-1.5
//! asplit=2[speech][music],[speech]highpass=f=100[sc],
//!   [music][sc]sidechaincompress=threshold=0.015[md]
//! ```
//!
//! Label connectivity is not checked here; a dangling label is reported by
//! FFmpeg when the graph is parsed.

use voxclean_models::{FilterArgs, FilterChainConfig, FilterSpec, FilterValue};

/// Reserved key holding a pre-formatted expression (e.g. a pan matrix).
pub const EXPRESSION_KEY: &str = "args";

/// Keys `loudnorm` accepts, in emission order.
pub const LOUDNORM_KEYS: [&str; 3] = ["I", "LRA", "TP"];

/// Default engine filter for ducking nodes.
pub const DEFAULT_SIDECHAIN_FILTER: &str = "sidechaincompress";

/// Branch count when an `asplit` declares neither `n` nor outputs.
const DEFAULT_SPLIT_BRANCHES: usize = 2;

/// Filter kinds with distinct rendering rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterNode<'a> {
    /// Labeled sequence of unlabeled filters
    SubChain(&'a FilterSpec),
    /// Stream split into N labeled branches
    Split(&'a FilterSpec),
    /// Two-input dynamics keyed by a sidechain stream
    Sidechain(&'a FilterSpec),
    /// N-input weighted mix
    Mix(&'a FilterSpec),
    Loudnorm(&'a FilterSpec),
    Volume(&'a FilterSpec),
    /// Filter taking one pre-formatted expression
    Expression(&'a FilterSpec),
    Generic(&'a FilterSpec),
}

impl<'a> FilterNode<'a> {
    /// Classify a spec. The first matching rule wins.
    ///
    /// A sole `args` expression outranks every kind except `loudnorm`,
    /// whose output is always limited to its known keys.
    pub fn classify(spec: &'a FilterSpec) -> Self {
        let name = spec.name.as_str();

        if !spec.filters.is_empty() {
            FilterNode::SubChain(spec)
        } else if name == "loudnorm" {
            FilterNode::Loudnorm(spec)
        } else if is_expression(spec) {
            FilterNode::Expression(spec)
        } else if name == "asplit" {
            FilterNode::Split(spec)
        } else if name == "amix" {
            FilterNode::Mix(spec)
        } else if is_sidechain(spec) {
            FilterNode::Sidechain(spec)
        } else if name == "volume" {
            FilterNode::Volume(spec)
        } else {
            FilterNode::Generic(spec)
        }
    }

    pub fn spec(&self) -> &'a FilterSpec {
        match *self {
            FilterNode::SubChain(s)
            | FilterNode::Split(s)
            | FilterNode::Sidechain(s)
            | FilterNode::Mix(s)
            | FilterNode::Loudnorm(s)
            | FilterNode::Volume(s)
            | FilterNode::Expression(s)
            | FilterNode::Generic(s) => s,
        }
    }

    /// Render the node with its labels, or `None` when it cannot be emitted.
    pub fn render(&self) -> Option<String> {
        let spec = self.spec();
        match self {
            FilterNode::SubChain(_) => {
                let body = spec
                    .filters
                    .iter()
                    .filter_map(|inner| FilterNode::classify(inner).body())
                    .collect::<Vec<_>>()
                    .join(",");
                (!body.is_empty()).then(|| labeled(&spec.input_labels, &body, &spec.output_labels))
            }
            FilterNode::Sidechain(_) => {
                // Main signal first, then the key signal
                let inputs = spec.input_labels.get(..2)?;
                Some(labeled(inputs, &self.body()?, &spec.output_labels))
            }
            FilterNode::Mix(_) if spec.input_labels.is_empty() => None,
            _ => {
                let body = self.body()?;
                Some(labeled(&spec.input_labels, &body, &spec.output_labels))
            }
        }
    }

    /// Render the filter body without stream labels.
    pub fn body(&self) -> Option<String> {
        let spec = self.spec();
        match self {
            FilterNode::SubChain(_) => None,
            FilterNode::Split(_) => {
                let branches = split_branches(spec);
                Some(format!("asplit={}", branches))
            }
            FilterNode::Sidechain(_) => {
                Some(with_params(sidechain_engine(spec), &format_args(&spec.args)))
            }
            FilterNode::Mix(_) => Some(with_params("amix", &format_args(&spec.args))),
            FilterNode::Loudnorm(_) => {
                let params = LOUDNORM_KEYS
                    .iter()
                    .filter_map(|key| spec.args.get(key).map(|v| format!("{}={}", key, v)))
                    .collect::<Vec<_>>()
                    .join(":");
                Some(with_params("loudnorm", &params))
            }
            FilterNode::Volume(_) => {
                let volume = spec
                    .args
                    .get("volume")
                    .cloned()
                    .unwrap_or(FilterValue::Float(1.0));
                Some(format!("volume={}", volume))
            }
            FilterNode::Expression(_) => {
                let expr = spec.args.get(EXPRESSION_KEY)?;
                let engine = if is_sidechain(spec) {
                    sidechain_engine(spec)
                } else {
                    spec.name.as_str()
                };
                Some(format!("{}={}", engine, expr))
            }
            FilterNode::Generic(_) => {
                if spec.name.is_empty() {
                    return None;
                }
                Some(with_params(&spec.name, &format_args(&spec.args)))
            }
        }
    }
}

fn is_expression(spec: &FilterSpec) -> bool {
    if spec.name.is_empty() || !spec.args.contains_key(EXPRESSION_KEY) {
        return false;
    }
    spec.name == "pan" || spec.args.len() == 1
}

/// Named as a ducking/sidechain node, or an engine override feeding two inputs.
fn is_sidechain(spec: &FilterSpec) -> bool {
    let name = spec.name.as_str();
    name == "ducking"
        || name.starts_with("sidechain")
        || (spec.filter.is_some() && spec.input_labels.len() >= 2)
}

fn sidechain_engine(spec: &FilterSpec) -> &str {
    match (&spec.filter, spec.name.as_str()) {
        (Some(filter), _) if !filter.is_empty() => filter.as_str(),
        (_, "ducking") | (_, "") => DEFAULT_SIDECHAIN_FILTER,
        (_, name) => name,
    }
}

fn split_branches(spec: &FilterSpec) -> String {
    match spec.args.get("n") {
        Some(n) => n.to_string(),
        None if !spec.output_labels.is_empty() => spec.output_labels.len().to_string(),
        None => DEFAULT_SPLIT_BRANCHES.to_string(),
    }
}

/// `k1=v1:k2=v2`, skipping the reserved expression key.
pub fn format_args(args: &FilterArgs) -> String {
    args.iter()
        .filter(|(key, _)| *key != EXPRESSION_KEY)
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(":")
}

fn with_params(name: &str, params: &str) -> String {
    if params.is_empty() {
        name.to_string()
    } else {
        format!("{}={}", name, params)
    }
}

fn labeled(inputs: &[String], body: &str, outputs: &[String]) -> String {
    let mut out = String::with_capacity(body.len() + 16);
    for label in inputs {
        out.push('[');
        out.push_str(label);
        out.push(']');
    }
    out.push_str(body);
    for label in outputs {
        out.push('[');
        out.push_str(label);
        out.push(']');
    }
    out
}

/// Compile a single node; `None` when the node renders nothing.
pub fn compile_node(spec: &FilterSpec) -> Option<String> {
    FilterNode::classify(spec).render()
}

/// Compile an ordered node list into an `-af` graph string.
///
/// An empty list compiles to an empty string.
pub fn compile(filters: &[FilterSpec]) -> String {
    filters
        .iter()
        .filter_map(compile_node)
        .collect::<Vec<_>>()
        .join(",")
}

/// Compile a chain configuration's filters.
pub fn compile_config(config: &FilterChainConfig) -> String {
    compile(&config.filters)
}
