//! Grammar specifications
//!
//! A [`GrammarSpec`] is the declarative input to the compiler: a set of named
//! [`RuleSpec`]s, each wrapping a tree of [`ComponentSpec`]s. Grammars can be
//! written with the builder functions in this module or loaded from JSON.
//!
//! # Builder
//!
//! ```rust
//! use parsling::grammar::*;
//!
//! let grammar = GrammarSpec::new("expression")
//!     .ignore("whitespace")
//!     .rule("whitespace", re(r"\s+"))
//!     .rule("number", re(r"\d+").named("value"))
//!     .rule(
//!         "expression",
//!         seq([
//!             rule_ref("number").named("left"),
//!             re(r"\+").named("operator"),
//!             rule_ref("number").named("right"),
//!         ]),
//!     );
//! assert_eq!(grammar.start_rule(), "expression");
//! ```
//!
//! # JSON
//!
//! The JSON shape mirrors the builder. Strings name rules, except strings of
//! the form `"/pattern/flags"` which are regex terminals. Arrays are
//! sequences. Objects carry one qualifier key (`allOf`, `oneOf`,
//! `oneOrMoreOf`, `zeroOrMoreOf`, `optionally`, `rule`, `what`) plus
//! arguments; an object with a single other key is a rule reference whose
//! value is the exact text the rule must match.
//!
//! ```rust
//! use parsling::GrammarSpec;
//!
//! let grammar = GrammarSpec::from_json(r#"{
//!     "start": "number",
//!     "rules": {
//!         "number": {"name": "value", "what": "/\\d+/"}
//!     }
//! }"#).unwrap();
//! assert_eq!(grammar.rule_names(), vec!["number"]);
//! ```

use super::callback::{
    Callback, CallbackContext, CallbackResult, ErrorHandler, ErrorHandlerFactory, State,
    StateFactory,
};
use super::error::GrammarError;
use super::value::Value;
use std::collections::BTreeMap;

/// Keys recognized as qualifiers in JSON component specs, in lookup order
pub const QUALIFIER_KEYS: [&str; 7] = [
    "allOf",
    "oneOf",
    "oneOrMoreOf",
    "zeroOrMoreOf",
    "optionally",
    "rule",
    "what",
];

/// Synthetic rule matching only at the beginning of input
pub const BEGINNING_OF_INPUT: &str = "<BOF>";

/// Synthetic rule matching only at the end of input
pub const END_OF_INPUT: &str = "<EOF>";

// ============================================================================
// Grammar
// ============================================================================

/// A complete grammar
#[derive(Debug, Clone)]
pub struct GrammarSpec {
    rules: Vec<(String, RuleSpec)>,
    start: String,
    ignore: Option<String>,
    bounds: Option<String>,
    state: Option<StateFactory>,
    error_handler: Option<ErrorHandlerFactory>,
}

impl GrammarSpec {
    /// Create an empty grammar starting at `start`
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            start: start.into(),
            ignore: None,
            bounds: None,
            state: None,
            error_handler: None,
        }
    }

    /// Add a rule, replacing any earlier rule with the same name
    pub fn rule(mut self, name: impl Into<String>, spec: impl Into<RuleSpec>) -> Self {
        let name = name.into();
        let spec = spec.into();
        match self.rules.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = spec,
            None => self.rules.push((name, spec)),
        }
        self
    }

    /// Name the rule whose matches are skipped before terminals
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignore = Some(name.into());
        self
    }

    /// Name under which bounds are captured when capture-all-bounds is on
    pub fn bounds(mut self, name: impl Into<String>) -> Self {
        self.bounds = Some(name.into());
        self
    }

    /// Set the factory for the grammar's state
    pub fn state<F>(mut self, f: F) -> Self
    where
        F: Fn() -> State + Send + Sync + 'static,
    {
        self.state = Some(StateFactory::new(f));
        self
    }

    /// Set the factory for the grammar's error handler
    pub fn error_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<State>) -> Box<dyn ErrorHandler> + Send + Sync + 'static,
    {
        self.error_handler = Some(ErrorHandlerFactory::new(f));
        self
    }

    /// The start rule name
    pub fn start_rule(&self) -> &str {
        &self.start
    }

    /// The ignore rule name
    pub fn ignore_rule(&self) -> Option<&str> {
        self.ignore.as_deref()
    }

    /// The grammar-wide bounds capture name
    pub fn bounds_name(&self) -> Option<&str> {
        self.bounds.as_deref()
    }

    /// Rule names in definition order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Look up a rule by name
    pub fn get_rule(&self, name: &str) -> Option<&RuleSpec> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub(crate) fn rules(&self) -> &[(String, RuleSpec)] {
        &self.rules
    }

    pub(crate) fn state_factory(&self) -> Option<&StateFactory> {
        self.state.as_ref()
    }

    pub(crate) fn error_handler_factory(&self) -> Option<&ErrorHandlerFactory> {
        self.error_handler.as_ref()
    }

    /// Load a grammar from a JSON document
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let doc: serde_json::Value =
            serde_json::from_str(json).map_err(|e| GrammarError::InvalidJson {
                reason: e.to_string(),
            })?;
        Self::from_json_value(&doc)
    }

    /// Load a grammar from a parsed JSON value
    pub fn from_json_value(doc: &serde_json::Value) -> Result<Self, GrammarError> {
        let obj = doc.as_object().ok_or_else(|| GrammarError::InvalidJson {
            reason: "grammar must be an object".to_string(),
        })?;
        let start = obj
            .get("start")
            .and_then(|s| s.as_str())
            .ok_or_else(|| GrammarError::InvalidJson {
                reason: "missing \"start\" rule name".to_string(),
            })?;

        let mut grammar = GrammarSpec::new(start);
        if let Some(ignore) = obj.get("ignore").and_then(|s| s.as_str()) {
            grammar = grammar.ignore(ignore);
        }
        if let Some(bounds) = obj.get("bounds").and_then(|s| s.as_str()) {
            grammar = grammar.bounds(bounds);
        }

        let rules = obj
            .get("rules")
            .and_then(|r| r.as_object())
            .ok_or_else(|| GrammarError::InvalidJson {
                reason: "missing \"rules\" object".to_string(),
            })?;
        for (name, spec) in rules {
            grammar = grammar.rule(name.as_str(), RuleSpec::from_json(spec)?);
        }
        Ok(grammar)
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Fallback applied when a named child did not contribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfNoMatch {
    /// The capture key to test
    pub component: String,
    /// The capture key whose value replaces the whole capture
    pub capture: String,
}

/// A named rule
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub(crate) component: ComponentSpec,
    pub(crate) capture_as: Option<String>,
    pub(crate) if_no_match: Option<IfNoMatch>,
    pub(crate) processor: Option<Callback>,
    pub(crate) options: BTreeMap<String, Value>,
}

impl RuleSpec {
    /// Create a rule from its root component
    pub fn new(component: impl Into<ComponentSpec>) -> Self {
        Self {
            component: component.into(),
            capture_as: None,
            if_no_match: None,
            processor: None,
            options: BTreeMap::new(),
        }
    }

    /// Stamp captures with `name` instead of the rule's own name
    pub fn capture_as(mut self, name: impl Into<String>) -> Self {
        self.capture_as = Some(name.into());
        self
    }

    /// When `component` is missing or empty, capture `capture` instead
    pub fn if_no_match(mut self, component: impl Into<String>, capture: impl Into<String>) -> Self {
        self.if_no_match = Some(IfNoMatch {
            component: component.into(),
            capture: capture.into(),
        });
        self
    }

    /// Post-process every match of this rule
    pub fn processor<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &mut CallbackContext<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        self.processor = Some(Callback::new(f));
        self
    }

    /// Merge a constant entry into every map capture of this rule
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// The root component
    pub fn component(&self) -> &ComponentSpec {
        &self.component
    }

    fn from_json(spec: &serde_json::Value) -> Result<Self, GrammarError> {
        let Some(obj) = spec.as_object() else {
            return Ok(RuleSpec::new(ComponentSpec::from_json(spec)?));
        };

        let mut body = obj.clone();
        let capture_as = body.remove("captureAs");
        let if_no_match = body.remove("ifNoMatch");
        let options = body.remove("options");
        let component = match body.remove("components") {
            Some(components) => ComponentSpec::from_json(&components)?,
            None => ComponentSpec::from_json(&serde_json::Value::Object(body))?,
        };

        let mut rule = RuleSpec::new(component);
        if let Some(name) = capture_as.as_ref().and_then(|v| v.as_str()) {
            rule = rule.capture_as(name);
        }
        if let Some(fallback) = if_no_match {
            let component = fallback.get("component").and_then(|v| v.as_str());
            let capture = fallback.get("capture").and_then(|v| v.as_str());
            match (component, capture) {
                (Some(component), Some(capture)) => rule = rule.if_no_match(component, capture),
                _ => {
                    return Err(GrammarError::InvalidJson {
                        reason: format!("invalid ifNoMatch directive {}", fallback),
                    })
                }
            }
        }
        if let Some(serde_json::Value::Object(options)) = options {
            for (key, value) in options {
                rule = rule.option(key, Value::from(value));
            }
        }
        Ok(rule)
    }
}

impl From<ComponentSpec> for RuleSpec {
    fn from(component: ComponentSpec) -> Self {
        RuleSpec::new(component)
    }
}

impl From<&str> for RuleSpec {
    fn from(rule: &str) -> Self {
        RuleSpec::new(ComponentSpec::RuleRef(rule.to_string()))
    }
}

// ============================================================================
// Components
// ============================================================================

/// A string replacement applied to terminal captures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceSpec {
    /// Regex to search for
    pub pattern: String,
    /// Replacement text, `$1` style group references allowed
    pub replacement: String,
    /// Replace every occurrence instead of the first one
    pub global: bool,
}

/// The qualifier of a component and its argument(s)
#[derive(Debug, Clone)]
pub enum QualifierSpec {
    /// Sequence
    AllOf(Vec<ComponentSpec>),
    /// Ordered alternation
    OneOf(Vec<ComponentSpec>),
    /// Repetition, at least once
    OneOrMoreOf(Box<ComponentSpec>),
    /// Repetition, possibly never
    ZeroOrMoreOf(Box<ComponentSpec>),
    /// Optional match
    Optionally(Box<ComponentSpec>),
    /// Rule delegation
    Rule(Box<ComponentSpec>),
    /// Terminal match or delegation
    What(Box<ComponentSpec>),
}

/// Arguments attached to a qualified component
#[derive(Debug, Clone)]
pub struct ComponentArgs {
    /// Capture key wrapping this component's capture
    pub name: Option<String>,
    /// When false, the capture is always wrapped into a map
    pub allow_merge: bool,
    /// Overrides whitespace skipping for this subtree
    pub ignore_whitespace: Option<bool>,
    /// `optionally` captures become arrays
    pub wrap_in_array: bool,
    /// Regex capture group used as the capture
    pub capture_index: usize,
    /// Replacements applied to string captures
    pub replace: Vec<ReplaceSpec>,
    /// Modifier callback
    pub modifier: Option<Callback>,
    /// Exact text a delegated rule must match
    pub text: Option<String>,
    /// Capture key for this component's bounds
    pub capture_bounds_as: Option<String>,
}

impl Default for ComponentArgs {
    fn default() -> Self {
        Self {
            name: None,
            allow_merge: true,
            ignore_whitespace: None,
            wrap_in_array: false,
            capture_index: 0,
            replace: Vec::new(),
            modifier: None,
            text: None,
            capture_bounds_as: None,
        }
    }
}

/// A qualifier plus its arguments
#[derive(Debug, Clone)]
pub struct QualifiedSpec {
    /// The qualifier
    pub qualifier: QualifierSpec,
    /// Its arguments
    pub args: ComponentArgs,
}

/// A node of a rule body
#[derive(Debug, Clone)]
pub enum ComponentSpec {
    /// Implicit sequence
    Sequence(Vec<ComponentSpec>),
    /// Reference to a rule by name
    RuleRef(String),
    /// Regex terminal, anchored at the current offset
    Pattern(String),
    /// Literal terminal
    Literal(String),
    /// Reference to a rule that must match exactly `text`
    TextRef {
        /// Rule name
        rule: String,
        /// Required text
        text: String,
    },
    /// Qualifier with arguments
    Qualified(Box<QualifiedSpec>),
}

impl ComponentSpec {
    fn qualified(qualifier: QualifierSpec) -> Self {
        ComponentSpec::Qualified(Box::new(QualifiedSpec {
            qualifier,
            args: ComponentArgs::default(),
        }))
    }

    /// Turn any component into a qualified one so arguments can be set.
    /// Unqualified components become the argument of a `what`.
    fn into_qualified(self) -> QualifiedSpec {
        match self {
            ComponentSpec::Qualified(q) => *q,
            other => QualifiedSpec {
                qualifier: QualifierSpec::What(Box::new(other)),
                args: ComponentArgs::default(),
            },
        }
    }

    fn with_args(self, f: impl FnOnce(&mut ComponentArgs)) -> Self {
        let mut q = self.into_qualified();
        f(&mut q.args);
        ComponentSpec::Qualified(Box::new(q))
    }

    /// Capture under `name`
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_args(|a| a.name = Some(name))
    }

    /// Always wrap the capture into a map, even when unnamed
    pub fn no_merge(self) -> Self {
        self.with_args(|a| a.allow_merge = false)
    }

    /// Enable or disable whitespace skipping for this subtree
    pub fn ignore_whitespace(self, enabled: bool) -> Self {
        self.with_args(|a| a.ignore_whitespace = Some(enabled))
    }

    /// Make `optionally` capture an array
    pub fn wrap_in_array(self) -> Self {
        self.with_args(|a| a.wrap_in_array = true)
    }

    /// Capture a regex group instead of the whole match
    pub fn capture_index(self, index: usize) -> Self {
        self.with_args(|a| a.capture_index = index)
    }

    /// Replace the first match of `pattern` in string captures
    pub fn replace(self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.push_replace(pattern.into(), replacement.into(), false)
    }

    /// Replace every match of `pattern` in string captures
    pub fn replace_all(self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.push_replace(pattern.into(), replacement.into(), true)
    }

    fn push_replace(self, pattern: String, replacement: String, global: bool) -> Self {
        self.with_args(|a| {
            a.replace.push(ReplaceSpec {
                pattern,
                replacement,
                global,
            })
        })
    }

    /// Transform this component's capture
    pub fn modifier<F>(self, f: F) -> Self
    where
        F: Fn(Value, &mut CallbackContext<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        let callback = Callback::new(f);
        self.with_args(|a| a.modifier = Some(callback))
    }

    /// Require the delegated rule to match exactly `text`
    pub fn text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.with_args(|a| a.text = Some(text))
    }

    /// Capture this component's bounds under `name`
    pub fn capture_bounds_as(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_args(|a| a.capture_bounds_as = Some(name))
    }

    /// Convert a JSON component spec
    pub fn from_json(spec: &serde_json::Value) -> Result<Self, GrammarError> {
        match spec {
            serde_json::Value::Array(items) => Ok(ComponentSpec::Sequence(
                items
                    .iter()
                    .map(ComponentSpec::from_json)
                    .collect::<Result<_, _>>()?,
            )),
            serde_json::Value::String(s) => Ok(match parse_regex_literal(s) {
                Some((pattern, _)) => ComponentSpec::Pattern(pattern),
                None => ComponentSpec::RuleRef(s.clone()),
            }),
            serde_json::Value::Object(obj) => {
                let Some(key) = QUALIFIER_KEYS.iter().find(|k| obj.contains_key(**k)) else {
                    return match obj.iter().next() {
                        Some((rule, serde_json::Value::String(text))) if obj.len() == 1 => {
                            Ok(ComponentSpec::TextRef {
                                rule: rule.clone(),
                                text: text.clone(),
                            })
                        }
                        _ if obj.len() == 1 => Err(GrammarError::InvalidComponent {
                            spec: spec.to_string(),
                        }),
                        _ => Err(GrammarError::MissingQualifier {
                            spec: spec.to_string(),
                        }),
                    };
                };
                let arg = &obj[*key];
                let qualifier = match *key {
                    "allOf" => QualifierSpec::AllOf(json_list(arg)?),
                    "oneOf" => QualifierSpec::OneOf(json_list(arg)?),
                    "oneOrMoreOf" => QualifierSpec::OneOrMoreOf(Box::new(Self::from_json(arg)?)),
                    "zeroOrMoreOf" => QualifierSpec::ZeroOrMoreOf(Box::new(Self::from_json(arg)?)),
                    "optionally" => QualifierSpec::Optionally(Box::new(Self::from_json(arg)?)),
                    "rule" => QualifierSpec::Rule(Box::new(Self::from_json(arg)?)),
                    _ => QualifierSpec::What(Box::new(Self::from_json(arg)?)),
                };
                Ok(ComponentSpec::Qualified(Box::new(QualifiedSpec {
                    qualifier,
                    args: json_args(obj)?,
                })))
            }
            _ => Err(GrammarError::InvalidComponent {
                spec: spec.to_string(),
            }),
        }
    }
}

impl From<&str> for ComponentSpec {
    fn from(rule: &str) -> Self {
        ComponentSpec::RuleRef(rule.to_string())
    }
}

impl From<Vec<ComponentSpec>> for ComponentSpec {
    fn from(items: Vec<ComponentSpec>) -> Self {
        ComponentSpec::Sequence(items)
    }
}

fn json_list(arg: &serde_json::Value) -> Result<Vec<ComponentSpec>, GrammarError> {
    match arg {
        serde_json::Value::Array(items) => items.iter().map(ComponentSpec::from_json).collect(),
        other => Ok(vec![ComponentSpec::from_json(other)?]),
    }
}

fn json_args(obj: &serde_json::Map<String, serde_json::Value>) -> Result<ComponentArgs, GrammarError> {
    let string = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let flag = |key: &str| obj.get(key).and_then(|v| v.as_bool());

    let mut args = ComponentArgs {
        name: string("name"),
        allow_merge: flag("allowMerge").unwrap_or(true),
        ignore_whitespace: flag("ignoreWhitespace"),
        wrap_in_array: flag("wrapInArray").unwrap_or(false),
        capture_index: obj
            .get("captureIndex")
            .and_then(|v| v.as_u64())
            .map_or(0, |i| i as usize),
        text: string("text"),
        capture_bounds_as: string("captureBoundsAs").or_else(|| string("captureOffsetAs")),
        ..ComponentArgs::default()
    };

    if let Some(replace) = obj.get("replace") {
        let pairs = replace.as_array().ok_or_else(|| GrammarError::InvalidJson {
            reason: format!("replace must be an array, got {}", replace),
        })?;
        for pair in pairs {
            let pattern = pair.get("pattern").and_then(|v| v.as_str());
            let replacement = pair.get("replacement").and_then(|v| v.as_str());
            let (Some(pattern), Some(replacement)) = (pattern, replacement) else {
                return Err(GrammarError::InvalidJson {
                    reason: format!("invalid replacement {}", pair),
                });
            };
            let (pattern, global) =
                parse_regex_literal(pattern).unwrap_or_else(|| (pattern.to_string(), false));
            args.replace.push(ReplaceSpec {
                pattern,
                replacement: replacement.to_string(),
                global,
            });
        }
    }
    Ok(args)
}

/// Parse a `/pattern/flags` regex literal.
///
/// Returns the pattern with `i`, `m`, `s` and `x` flags turned into an
/// inline flag group, and whether the `g` flag was present. Other flags
/// are accepted and ignored.
pub fn parse_regex_literal(literal: &str) -> Option<(String, bool)> {
    let body = literal.strip_prefix('/')?;
    let close = body.rfind('/')?;
    let (pattern, flags) = (&body[..close], &body[close + 1..]);
    if !flags.chars().all(|c| "gimsuyx".contains(c)) {
        return None;
    }

    let inline: String = flags.chars().filter(|c| "imsx".contains(*c)).collect();
    let pattern = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", inline, pattern)
    };
    Some((pattern, flags.contains('g')))
}

// ============================================================================
// Builder functions
// ============================================================================

/// Regex terminal
pub fn re(pattern: impl Into<String>) -> ComponentSpec {
    ComponentSpec::Pattern(pattern.into())
}

/// Literal terminal
pub fn lit(text: impl Into<String>) -> ComponentSpec {
    ComponentSpec::Literal(text.into())
}

/// Reference to a rule
pub fn rule_ref(name: impl Into<String>) -> ComponentSpec {
    ComponentSpec::RuleRef(name.into())
}

/// Reference to a rule that must match exactly `text`
pub fn text_ref(rule: impl Into<String>, text: impl Into<String>) -> ComponentSpec {
    ComponentSpec::TextRef {
        rule: rule.into(),
        text: text.into(),
    }
}

/// Implicit sequence
pub fn seq(items: impl IntoIterator<Item = ComponentSpec>) -> ComponentSpec {
    ComponentSpec::Sequence(items.into_iter().collect())
}

/// Sequence qualifier
pub fn all_of(items: impl IntoIterator<Item = ComponentSpec>) -> ComponentSpec {
    ComponentSpec::qualified(QualifierSpec::AllOf(items.into_iter().collect()))
}

/// Ordered alternation
pub fn one_of(items: impl IntoIterator<Item = ComponentSpec>) -> ComponentSpec {
    ComponentSpec::qualified(QualifierSpec::OneOf(items.into_iter().collect()))
}

/// One or more repetitions
pub fn one_or_more_of(item: impl Into<ComponentSpec>) -> ComponentSpec {
    ComponentSpec::qualified(QualifierSpec::OneOrMoreOf(Box::new(item.into())))
}

/// Zero or more repetitions
pub fn zero_or_more_of(item: impl Into<ComponentSpec>) -> ComponentSpec {
    ComponentSpec::qualified(QualifierSpec::ZeroOrMoreOf(Box::new(item.into())))
}

/// Optional match
pub fn optionally(item: impl Into<ComponentSpec>) -> ComponentSpec {
    ComponentSpec::qualified(QualifierSpec::Optionally(Box::new(item.into())))
}

/// Rule delegation
pub fn rule(item: impl Into<ComponentSpec>) -> ComponentSpec {
    ComponentSpec::qualified(QualifierSpec::Rule(Box::new(item.into())))
}

/// Terminal match or delegation
pub fn what(item: impl Into<ComponentSpec>) -> ComponentSpec {
    ComponentSpec::qualified(QualifierSpec::What(Box::new(item.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_replaces_duplicate_rules() {
        let grammar = GrammarSpec::new("a")
            .rule("a", re("x"))
            .rule("b", re("y"))
            .rule("a", re("z"));
        assert_eq!(grammar.rule_names(), vec!["a", "b"]);
        assert!(matches!(
            grammar.get_rule("a").map(RuleSpec::component),
            Some(ComponentSpec::Pattern(p)) if p == "z"
        ));
    }

    #[test]
    fn test_named_wraps_terminal_in_what() {
        let spec = re(r"\d+").named("value");
        let ComponentSpec::Qualified(q) = spec else {
            panic!("expected qualified component");
        };
        assert_eq!(q.args.name.as_deref(), Some("value"));
        assert!(matches!(q.qualifier, QualifierSpec::What(ref inner)
            if matches!(**inner, ComponentSpec::Pattern(_))));
    }

    #[test]
    fn test_args_accumulate_on_same_component() {
        let spec = optionally(re("a")).named("x").wrap_in_array().ignore_whitespace(false);
        let ComponentSpec::Qualified(q) = spec else {
            panic!("expected qualified component");
        };
        assert!(matches!(q.qualifier, QualifierSpec::Optionally(_)));
        assert_eq!(q.args.name.as_deref(), Some("x"));
        assert!(q.args.wrap_in_array);
        assert_eq!(q.args.ignore_whitespace, Some(false));
        assert!(q.args.allow_merge);
    }

    #[test]
    fn test_parse_regex_literal() {
        assert_eq!(parse_regex_literal("/\\d+/"), Some(("\\d+".to_string(), false)));
        assert_eq!(parse_regex_literal("/a/gi"), Some(("(?i)a".to_string(), true)));
        assert_eq!(parse_regex_literal("/a/b/"), Some(("a/b".to_string(), false)));
        assert_eq!(parse_regex_literal("name"), None);
        assert_eq!(parse_regex_literal("/unterminated"), None);
        assert_eq!(parse_regex_literal("/a/zz"), None);
    }

    #[test]
    fn test_component_from_json_shapes() {
        assert!(matches!(
            ComponentSpec::from_json(&json!("number")),
            Ok(ComponentSpec::RuleRef(n)) if n == "number"
        ));
        assert!(matches!(
            ComponentSpec::from_json(&json!("/\\d+/")),
            Ok(ComponentSpec::Pattern(p)) if p == "\\d+"
        ));
        assert!(matches!(
            ComponentSpec::from_json(&json!(["a", "b"])),
            Ok(ComponentSpec::Sequence(items)) if items.len() == 2
        ));
        assert!(matches!(
            ComponentSpec::from_json(&json!({"character": ";"})),
            Ok(ComponentSpec::TextRef { rule, text }) if rule == "character" && text == ";"
        ));
    }

    #[test]
    fn test_component_from_json_args() {
        let spec = ComponentSpec::from_json(&json!({
            "name": "value",
            "what": "/\"([^\"]*)\"/",
            "captureIndex": 1,
            "allowMerge": false,
            "replace": [{"pattern": "/^2$/", "replacement": "t"}]
        }))
        .expect("valid component");
        let ComponentSpec::Qualified(q) = spec else {
            panic!("expected qualified component");
        };
        assert_eq!(q.args.name.as_deref(), Some("value"));
        assert_eq!(q.args.capture_index, 1);
        assert!(!q.args.allow_merge);
        assert_eq!(
            q.args.replace,
            vec![ReplaceSpec {
                pattern: "^2$".to_string(),
                replacement: "t".to_string(),
                global: false,
            }]
        );
    }

    #[test]
    fn test_component_from_json_errors() {
        assert!(matches!(
            ComponentSpec::from_json(&json!({"a": "x", "b": "y"})),
            Err(GrammarError::MissingQualifier { .. })
        ));
        assert!(matches!(
            ComponentSpec::from_json(&json!(42)),
            Err(GrammarError::InvalidComponent { .. })
        ));
        assert!(matches!(
            ComponentSpec::from_json(&json!({"a": 1})),
            Err(GrammarError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_grammar_from_json() {
        let grammar = GrammarSpec::from_json(
            r#"{
                "ignore": "whitespace",
                "start": "value",
                "bounds": "span",
                "rules": {
                    "whitespace": "/\\s+/",
                    "value": {
                        "components": [{"name": "name", "what": "/\\w+/"}],
                        "captureAs": "thing",
                        "ifNoMatch": {"component": "value", "capture": "name"},
                        "options": {"fun": true}
                    }
                }
            }"#,
        )
        .expect("valid grammar");

        assert_eq!(grammar.start_rule(), "value");
        assert_eq!(grammar.ignore_rule(), Some("whitespace"));
        assert_eq!(grammar.bounds_name(), Some("span"));
        let rule = grammar.get_rule("value").expect("value rule");
        assert_eq!(rule.capture_as.as_deref(), Some("thing"));
        assert_eq!(
            rule.if_no_match,
            Some(IfNoMatch {
                component: "value".to_string(),
                capture: "name".to_string(),
            })
        );
        assert_eq!(rule.options.get("fun"), Some(&Value::bool(true)));
    }

    #[test]
    fn test_grammar_from_json_requires_start() {
        assert!(matches!(
            GrammarSpec::from_json(r#"{"rules": {}}"#),
            Err(GrammarError::InvalidJson { .. })
        ));
        assert!(matches!(
            GrammarSpec::from_json("not json"),
            Err(GrammarError::InvalidJson { .. })
        ));
    }
}
