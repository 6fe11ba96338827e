//! Grammar compilation
//!
//! Turns a [`GrammarSpec`] into a [`CompiledGrammar`]: two flat arenas of
//! rules and components that refer to each other by index, so recursive and
//! mutually recursive rules need no shared ownership.
//!
//! Compilation runs in two phases. First every rule gets an id, which makes
//! forward references and cycles resolvable. Then rule bodies are compiled
//! in id order and their components appended to the component arena.
//!
//! # Overrides
//!
//! Rules passed in [`ParserOptions::rules`] replace grammar rules of the
//! same name. Two name tables are kept: the *original* table (grammar rules
//! only) and the *effective* one (overrides win). An override referring to
//! its own name binds to the rule it replaced, which lets it extend rather
//! than recurse into itself:
//!
//! ```rust
//! use parsling::grammar::*;
//! use parsling::{Parser, ParserOptions, Value};
//!
//! let grammar = GrammarSpec::new("word").rule("word", re(r"\w+"));
//! let options = ParserOptions::new()
//!     .with_rule("word", seq([lit("<"), rule_ref("word"), lit(">")]));
//! let parser = Parser::with_options(&grammar, options).unwrap();
//! assert_eq!(parser.parse("<hi>").unwrap(), Value::string("<hi>"));
//! ```

use super::component::{Component, ComponentId, Replacement};
use super::error::GrammarError;
use super::grammar::{
    ComponentArgs, ComponentSpec, GrammarSpec, QualifierSpec, RuleSpec, BEGINNING_OF_INPUT,
    END_OF_INPUT,
};
use super::parser::ParserOptions;
use super::qualifier::{Qualifier, Sentinel, Target, Terminal};
use super::regex_cache;
use super::rule::{Rule, RuleId};
use hashbrown::HashMap;

/// Name used for bounds captures when the grammar does not set one
pub const DEFAULT_BOUNDS_NAME: &str = "bounds";

/// A grammar ready to be matched
#[derive(Debug)]
pub(crate) struct CompiledGrammar {
    rules: Vec<Rule>,
    components: Vec<Component>,
    names: HashMap<String, RuleId>,
    start: RuleId,
    ignore: Option<RuleId>,
}

impl CompiledGrammar {
    #[inline]
    pub(crate) fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    #[inline]
    pub(crate) fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    #[inline]
    pub(crate) fn ignore(&self) -> Option<RuleId> {
        self.ignore
    }

    pub(crate) fn start(&self) -> RuleId {
        self.start
    }

    /// Look up a rule through the effective name table
    pub(crate) fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.names.get(name).copied()
    }

    /// Names of every reachable rule, sorted
    pub(crate) fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Where a rule body's names resolve
struct Scope<'t> {
    rule: &'t str,
    refs: &'t HashMap<String, RuleId>,
    self_refs: &'t HashMap<String, RuleId>,
}

impl Scope<'_> {
    fn resolve(&self, name: &str) -> Result<RuleId, GrammarError> {
        let id = self
            .refs
            .get(name)
            .copied()
            .ok_or_else(|| GrammarError::UnknownRule {
                name: name.to_string(),
                referenced_by: Some(self.rule.to_string()),
            })?;
        if name == self.rule {
            if let Some(&own) = self.self_refs.get(name) {
                return Ok(own);
            }
        }
        Ok(id)
    }
}

/// Compile `spec`, applying the rule overrides and bounds setting from
/// `options`
pub(crate) fn compile(
    spec: &GrammarSpec,
    options: &ParserOptions,
) -> Result<CompiledGrammar, GrammarError> {
    // Phase 1: ids. The sentinels come first so every table can see them.
    let mut original: HashMap<String, RuleId> = HashMap::new();
    original.insert(BEGINNING_OF_INPUT.to_string(), RuleId(0));
    original.insert(END_OF_INPUT.to_string(), RuleId(1));

    let mut pending: Vec<(&str, &RuleSpec, Origin)> = Vec::new();
    for (name, rule) in spec.rules() {
        let origin = if options.overrides(name) {
            Origin::Overridden
        } else {
            Origin::Grammar
        };
        original.insert(name.clone(), RuleId(pending.len() + 2));
        pending.push((name.as_str(), rule, origin));
    }

    let mut effective = original.clone();
    for (name, rule) in &options.rules {
        effective.insert(name.clone(), RuleId(pending.len() + 2));
        pending.push((name.as_str(), rule, Origin::Override));
    }

    // Phase 2: bodies
    let mut compiler = Compiler {
        components: Vec::new(),
        bounds: options.capture_all_bounds.then(|| {
            spec.bounds_name()
                .unwrap_or(DEFAULT_BOUNDS_NAME)
                .to_string()
        }),
    };

    let mut rules = Vec::with_capacity(pending.len() + 2);
    for (name, sentinel) in [
        (BEGINNING_OF_INPUT, Sentinel::BeginningOfInput),
        (END_OF_INPUT, Sentinel::EndOfInput),
    ] {
        let component = compiler.push(Component::new(Qualifier::What(Terminal::Sentinel(sentinel))));
        rules.push(Rule::new(name, component));
    }

    for (name, rule_spec, origin) in pending {
        let scope = match origin {
            Origin::Grammar => Scope {
                rule: name,
                refs: &effective,
                self_refs: &effective,
            },
            Origin::Overridden => Scope {
                rule: name,
                refs: &original,
                self_refs: &effective,
            },
            Origin::Override => Scope {
                rule: name,
                refs: &effective,
                self_refs: &original,
            },
        };
        let component = compiler.component(&rule_spec.component, &scope)?;
        rules.push(
            Rule::new(name, component)
                .with_capture_name(rule_spec.capture_as.clone())
                .with_if_no_match(rule_spec.if_no_match.clone())
                .with_processor(rule_spec.processor.clone())
                .with_options(rule_spec.options.clone()),
        );
    }

    let lookup = |name: &str| {
        effective
            .get(name)
            .copied()
            .ok_or_else(|| GrammarError::UnknownRule {
                name: name.to_string(),
                referenced_by: None,
            })
    };
    let start = lookup(spec.start_rule())?;
    let ignore = spec.ignore_rule().map(lookup).transpose()?;

    log_debug!(
        "compiled grammar: {} rules ({} overrides), {} components",
        rules.len(),
        options.rules.len(),
        compiler.components.len()
    );

    Ok(CompiledGrammar {
        rules,
        components: compiler.components,
        names: effective,
        start,
        ignore,
    })
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    /// A grammar rule nothing replaces
    Grammar,
    /// A grammar rule replaced by an override
    Overridden,
    /// An override from the parser options
    Override,
}

struct Compiler {
    components: Vec<Component>,
    bounds: Option<String>,
}

impl Compiler {
    fn push(&mut self, mut component: Component) -> ComponentId {
        if component.bounds_name.is_none() {
            component.bounds_name = self.bounds.clone();
        }
        self.components.push(component);
        ComponentId(self.components.len() - 1)
    }

    fn component(&mut self, spec: &ComponentSpec, scope: &Scope<'_>) -> Result<ComponentId, GrammarError> {
        let component = match spec {
            ComponentSpec::Sequence(items) => {
                Component::new(Qualifier::AllOf(self.components_of(items, scope)?))
            }
            ComponentSpec::RuleRef(name) => {
                Component::new(Qualifier::Rule(Target::Rule(scope.resolve(name)?)))
            }
            ComponentSpec::Pattern(pattern) => Component::new(Qualifier::What(Terminal::Pattern(
                regex_cache::compile_anchored(pattern)?,
            ))),
            ComponentSpec::Literal(literal) => {
                Component::new(Qualifier::What(Terminal::Literal(literal.clone())))
            }
            ComponentSpec::TextRef { rule, text } => {
                let mut component =
                    Component::new(Qualifier::Rule(Target::Rule(scope.resolve(rule)?)));
                component.text = Some(text.clone());
                component
            }
            ComponentSpec::Qualified(qualified) => {
                let (qualifier, text) = self.qualifier(&qualified.qualifier, scope)?;
                let mut component = Component::new(qualifier);
                component.text = text;
                apply_args(&mut component, &qualified.args)?;
                component
            }
        };
        Ok(self.push(component))
    }

    fn components_of(
        &mut self,
        items: &[ComponentSpec],
        scope: &Scope<'_>,
    ) -> Result<Vec<ComponentId>, GrammarError> {
        items.iter().map(|item| self.component(item, scope)).collect()
    }

    /// Compile a qualifier. Also returns the text constraint carried by a
    /// `rule` whose argument is a text reference.
    fn qualifier(
        &mut self,
        spec: &QualifierSpec,
        scope: &Scope<'_>,
    ) -> Result<(Qualifier, Option<String>), GrammarError> {
        let qualifier = match spec {
            QualifierSpec::AllOf(items) => Qualifier::AllOf(self.components_of(items, scope)?),
            QualifierSpec::OneOf(items) => Qualifier::OneOf(self.components_of(items, scope)?),
            QualifierSpec::OneOrMoreOf(item) => Qualifier::OneOrMoreOf(self.component(item, scope)?),
            QualifierSpec::ZeroOrMoreOf(item) => {
                Qualifier::ZeroOrMoreOf(self.component(item, scope)?)
            }
            QualifierSpec::Optionally(item) => Qualifier::Optionally(self.component(item, scope)?),
            QualifierSpec::Rule(item) => match &**item {
                ComponentSpec::RuleRef(name) => Qualifier::Rule(Target::Rule(scope.resolve(name)?)),
                ComponentSpec::TextRef { rule, text } => {
                    let target = Target::Rule(scope.resolve(rule)?);
                    return Ok((Qualifier::Rule(target), Some(text.clone())));
                }
                other => Qualifier::Rule(Target::Component(self.component(other, scope)?)),
            },
            QualifierSpec::What(item) => Qualifier::What(match &**item {
                ComponentSpec::Pattern(pattern) => {
                    Terminal::Pattern(regex_cache::compile_anchored(pattern)?)
                }
                ComponentSpec::Literal(literal) => Terminal::Literal(literal.clone()),
                other => Terminal::Component(self.component(other, scope)?),
            }),
        };
        Ok((qualifier, None))
    }
}

fn apply_args(component: &mut Component, args: &ComponentArgs) -> Result<(), GrammarError> {
    component.name = args.name.clone();
    component.allow_merge = args.allow_merge;
    component.ignore_whitespace = args.ignore_whitespace;
    component.wrap_in_array = args.wrap_in_array;
    component.capture_index = args.capture_index;
    component.modifier = args.modifier.clone();
    if args.text.is_some() {
        component.text = args.text.clone();
    }
    if args.capture_bounds_as.is_some() {
        component.bounds_name = args.capture_bounds_as.clone();
        component.own_bounds = true;
    }
    component.replace = args
        .replace
        .iter()
        .map(|r| {
            Ok(Replacement {
                pattern: regex_cache::compile(&r.pattern)?,
                replacement: r.replacement.clone(),
                global: r.global,
            })
        })
        .collect::<Result<_, GrammarError>>()?;
    Ok(())
}
