//! XML element patterns: a node name, attributes (`name?` optional), and an
//! ordered list of children that are either element patterns with an
//! occurrence marker or a single text-content pattern.

use std::collections::BTreeMap;

use rand::Rng;

use super::{row_example, Pattern, ScalarPattern};
use crate::config::OptionalKeyGeneration;
use crate::dsl::{is_optional_key, without_optionality};
use crate::error::ContractError;
use crate::generation::{self, all_or_nothing_list_combinations, random_count, PatternStream};
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::{Value, XmlNode};

/// How many times an element may appear at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Occurrence {
    #[default]
    Once,
    Optional,
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPattern {
    pub name: String,
    pub attributes: BTreeMap<String, Pattern>,
    pub children: Vec<Pattern>,
    pub occurrence: Occurrence,
    pub nillable: bool,
    /// Named XML type supplying this node's attributes and children.
    pub type_ref: Option<String>,
}

impl XmlPattern {
    pub fn new(name: impl Into<String>) -> Self {
        XmlPattern {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            occurrence: Occurrence::Once,
            nillable: false,
            type_ref: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        self.attributes.insert(name.into(), pattern);
        self
    }

    pub fn with_child(mut self, child: Pattern) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_occurrence(mut self, occurrence: Occurrence) -> Self {
        self.occurrence = occurrence;
        self
    }

    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    pub fn with_type_ref(mut self, type_ref: impl Into<String>) -> Self {
        self.type_ref = Some(type_ref.into());
        self
    }

    pub fn type_name(&self) -> String {
        format!("<{}>", self.name)
    }

    /// Attributes and children from the referenced type, keeping this
    /// node's name, occurrence and nillability.
    fn effective(&self, resolver: &Resolver) -> Result<XmlPattern, ContractError> {
        let Some(type_ref) = &self.type_ref else {
            return Ok(self.clone());
        };
        match resolver.resolve_deferred(type_ref)? {
            Pattern::Xml(referenced) => {
                let base = referenced.effective(resolver)?;
                Ok(XmlPattern {
                    name: self.name.clone(),
                    attributes: base.attributes,
                    children: base.children,
                    occurrence: self.occurrence,
                    nillable: self.nillable || base.nillable,
                    type_ref: None,
                })
            }
            other => Err(ContractError::Document(format!(
                "xml type {} must be an xml node, found {}",
                type_ref,
                other.type_name()
            ))),
        }
    }

    /// The text-content pattern, when the children describe text.
    fn text_pattern(&self) -> Option<&Pattern> {
        match self.children.as_slice() {
            [only] if !matches!(only, Pattern::Xml(_) | Pattern::Anything) => Some(only),
            _ => None,
        }
    }

    // ── Matching ─────────────────────────────────

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        let Value::Xml(node) = value else {
            return MatchResult::mismatch(self.type_name(), value);
        };
        if node.name != self.name {
            return MatchResult::failure(format!(
                "Expected node named {}, actual was {}",
                self.name, node.name
            ));
        }
        let pattern = match self.effective(resolver) {
            Ok(pattern) => pattern,
            Err(e) => return MatchResult::failure(e.to_string()),
        };
        let attributes = pattern.match_attributes(node, resolver);
        if pattern.nillable && node.children.iter().all(is_blank) {
            return attributes;
        }
        MatchResult::from_results([attributes, pattern.match_children(node, resolver)])
    }

    fn match_attributes(&self, node: &XmlNode, resolver: &Resolver) -> MatchResult {
        let messages = resolver.mismatch_messages();
        let unexpected = node
            .attributes
            .keys()
            .filter(|name| !name.starts_with("xmlns"))
            .filter(|name| {
                !self.attributes.contains_key(name.as_str())
                    && !self.attributes.contains_key(&format!("{}?", name))
            })
            .map(|name| MatchResult::failure(messages.unexpected_key(name)).breadcrumb(format!("@{}", name)));
        let declared = self.attributes.iter().map(|(key, pattern)| {
            let name = without_optionality(key);
            let result = match node.attributes.get(name) {
                Some(text) => match pattern.parse(text, resolver) {
                    Ok(_) => MatchResult::Success,
                    Err(_) => MatchResult::mismatch(pattern.type_name(), format!("\"{}\"", text)),
                },
                None if is_optional_key(key) => MatchResult::Success,
                None => MatchResult::failure(messages.missing_key(name)),
            };
            result.breadcrumb(format!("@{}", name))
        });
        MatchResult::from_results(unexpected.chain(declared).collect::<Vec<_>>())
    }

    fn match_children(&self, node: &XmlNode, resolver: &Resolver) -> MatchResult {
        if let Some(text_pattern) = self.text_pattern() {
            let text = node.text();
            return match text_pattern.parse(text.trim(), resolver) {
                Ok(_) => MatchResult::Success,
                Err(_) => MatchResult::mismatch(text_pattern.type_name(), format!("\"{}\"", text)),
            };
        }
        let elements: Vec<&XmlNode> = node
            .children
            .iter()
            .filter_map(|c| match c {
                Value::Xml(child) => Some(child),
                _ => None,
            })
            .collect();
        let mut cursor = 0;
        let mut results = Vec::new();
        for child in &self.children {
            let expected = match child {
                Pattern::Anything => {
                    cursor = elements.len();
                    continue;
                }
                Pattern::Xml(x) => x,
                other => {
                    results.push(MatchResult::failure(format!(
                        "{} cannot appear among element children",
                        other.type_name()
                    )));
                    continue;
                }
            };
            let mut seen = 0;
            while let Some(actual) = elements.get(cursor).filter(|e| e.name == expected.name) {
                results.push(
                    expected
                        .matches(&Value::Xml((*actual).clone()), resolver)
                        .breadcrumb(expected.name.clone()),
                );
                cursor += 1;
                seen += 1;
                if expected.occurrence != Occurrence::Multiple {
                    break;
                }
            }
            if seen == 0 && expected.occurrence == Occurrence::Once {
                results.push(
                    MatchResult::failure(resolver.mismatch_messages().missing_key(&expected.name))
                        .breadcrumb(expected.name.clone()),
                );
            }
        }
        for extra in &elements[cursor.min(elements.len())..] {
            results.push(
                MatchResult::failure(resolver.mismatch_messages().unexpected_key(&extra.name))
                    .breadcrumb(extra.name.clone()),
            );
        }
        MatchResult::from_results(results)
    }

    // ── Generation ───────────────────────────────

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        let resolver = match &self.type_ref {
            Some(type_ref) => resolver.with_cycle_guard(type_ref)?,
            None => resolver.clone(),
        };
        let pattern = self.effective(&resolver)?;
        let mut node = XmlNode::new(pattern.name.clone());
        for (key, attribute) in &pattern.attributes {
            if is_optional_key(key) && !include_optional(&resolver) {
                continue;
            }
            let value = attribute.generate(&resolver)?;
            node.attributes
                .insert(without_optionality(key).to_string(), value.to_string_literal());
        }
        if let Some(text_pattern) = pattern.text_pattern() {
            let text = text_pattern.generate(&resolver)?.to_string_literal();
            return Ok(Value::Xml(node.with_text(text)));
        }
        for child in &pattern.children {
            let Pattern::Xml(element) = child else {
                continue;
            };
            let count = match element.occurrence {
                Occurrence::Once => 1,
                Occurrence::Optional => usize::from(include_optional(&resolver)),
                Occurrence::Multiple => random_count(1, 2),
            };
            for _ in 0..count {
                match element.generate(&resolver) {
                    Ok(value) => node.children.push(value),
                    Err(ContractError::RecursionDetected { .. })
                        if element.occurrence != Occurrence::Once =>
                    {
                        break
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(Value::Xml(node))
    }

    // ── Test generation ──────────────────────────

    /// Variants per child slot combined all-or-nothing; optional and
    /// repeated children may also be absent. Text content and attributes
    /// take row values named after the node or attribute.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        let guarded = match &self.type_ref {
            Some(type_ref) => match resolver.with_cycle_guard(type_ref) {
                Ok(guarded) => guarded,
                Err(ContractError::RecursionDetected { .. }) => {
                    return Ok(generation::single(Pattern::Xml(self.clone())))
                }
                Err(e) => return Err(e),
            },
            None => resolver.clone(),
        };
        let pattern = self.effective(&guarded)?;
        let cap = guarded.max_combinations();

        let mut attributes = BTreeMap::new();
        for (key, attribute) in &pattern.attributes {
            let name = without_optionality(key);
            let specialized = row_example(name, attribute, row, &guarded)?;
            match specialized {
                Some(exact) => attributes.insert(name.to_string(), exact),
                None => attributes.insert(key.clone(), attribute.clone()),
            };
        }

        let mut slots: Vec<Vec<Option<Pattern>>> = Vec::new();
        if let Some(text_pattern) = pattern.text_pattern() {
            let slot = match row_example(&pattern.name, text_pattern, row, &guarded)? {
                Some(exact) => vec![Some(exact)],
                None => text_pattern.new_based_on(row, &guarded)?.take(cap).map(Some).collect(),
            };
            slots.push(slot);
        } else {
            for child in &pattern.children {
                let mut slot: Vec<Option<Pattern>> = match child {
                    Pattern::Xml(element) => element
                        .new_based_on(row, &guarded)?
                        .take(cap)
                        .map(|variant| match (variant, element.occurrence) {
                            (Pattern::Xml(x), Occurrence::Optional) => {
                                Some(Pattern::Xml(x.with_occurrence(Occurrence::Once)))
                            }
                            (other, _) => Some(other),
                        })
                        .collect(),
                    other => vec![Some(other.clone())],
                };
                if matches!(child, Pattern::Xml(x) if x.occurrence != Occurrence::Once) {
                    slot.push(None);
                }
                slots.push(slot);
            }
        }

        let template = XmlPattern {
            attributes,
            children: Vec::new(),
            type_ref: None,
            ..pattern
        };
        let combinations = all_or_nothing_list_combinations(&slots);
        Ok(Box::new(combinations.into_iter().map(move |children| {
            Pattern::Xml(XmlPattern {
                children,
                ..template.clone()
            })
        })))
    }

    /// Omitted mandatory attributes and elements, corrupted text, and
    /// corrupted children, one change per variant.
    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        let guarded = match &self.type_ref {
            Some(type_ref) => match resolver.negative().with_cycle_guard(type_ref) {
                Ok(guarded) => guarded,
                Err(_) => return generation::empty(),
            },
            None => resolver.negative(),
        };
        let pattern = match self.effective(&guarded) {
            Ok(pattern) => XmlPattern {
                type_ref: None,
                ..pattern
            },
            Err(e) => {
                tracing::debug!(node = %self.name, error = %e, "no negatives for unresolved xml type");
                return generation::empty();
            }
        };
        let mut out = Vec::new();

        for key in pattern.attributes.keys().filter(|k| !is_optional_key(k)) {
            let mut omitted = pattern.clone();
            omitted.attributes.remove(key);
            out.push(Pattern::Xml(omitted));
        }

        if let Some(text_pattern) = pattern.text_pattern() {
            let accepts_any_text = matches!(text_pattern, Pattern::Scalar(s) if s.family() == "string");
            if !accepts_any_text {
                let not_text = format!("not {}", text_pattern.type_name());
                for negative in text_pattern.negative_based_on(row, &guarded) {
                    if negative.is_null() {
                        continue;
                    }
                    // Random strings can spell a number; a fixed word cannot.
                    let negative = match negative {
                        Pattern::Scalar(ScalarPattern::String(_)) => {
                            Pattern::exact(Value::string(not_text.clone()))
                        }
                        other => other,
                    };
                    let mut corrupted = pattern.clone();
                    corrupted.children = vec![negative];
                    out.push(Pattern::Xml(corrupted));
                }
            }
            return generation::from_vec(out);
        }

        for (i, child) in pattern.children.iter().enumerate() {
            let Pattern::Xml(element) = child else {
                continue;
            };
            if element.occurrence == Occurrence::Once {
                let mut omitted = pattern.clone();
                omitted.children.remove(i);
                out.push(Pattern::Xml(omitted));
            }
            for negative in element.negative_based_on(row, &guarded) {
                let mut corrupted = pattern.clone();
                corrupted.children[i] = negative;
                out.push(Pattern::Xml(corrupted));
            }
        }
        generation::from_vec(out)
    }

    // ── Compatibility ────────────────────────────

    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        let smaller = match other {
            Pattern::Xml(x) => x,
            Pattern::Exact(e) => return self.matches(&e.value, mine),
            other => {
                return MatchResult::failure(format!(
                    "Expected {}, got {}",
                    self.type_name(),
                    other.type_name()
                ))
            }
        };
        if self.name != smaller.name {
            return MatchResult::failure(format!(
                "Expected node named {}, the other side has {}",
                self.name, smaller.name
            ));
        }
        if smaller.occurrence > self.occurrence {
            return MatchResult::failure(format!(
                "Node {} occurs {:?} here but {:?} on the other side",
                self.name, self.occurrence, smaller.occurrence
            ));
        }

        let mut stack = type_stack.clone();
        if let (Some(a), Some(b)) = (&self.type_ref, &smaller.type_ref) {
            let pair = (a.clone(), b.clone());
            if stack.contains(&pair) {
                return MatchResult::Success;
            }
            stack.insert(pair);
        }
        let (bigger, smaller) = match (self.effective(mine), smaller.effective(theirs)) {
            (Ok(b), Ok(s)) => (b, s),
            (Err(e), _) | (_, Err(e)) => return MatchResult::failure(e.to_string()),
        };

        let attributes = bigger.attributes.iter().map(|(key, pattern)| {
            let name = without_optionality(key);
            let theirs_attribute = smaller
                .attributes
                .get_key_value(name)
                .or_else(|| smaller.attributes.get_key_value(&format!("{}?", name)));
            let result = match theirs_attribute {
                None if is_optional_key(key) => MatchResult::Success,
                None => MatchResult::failure(mine.mismatch_messages().missing_key(name)),
                Some((their_key, _)) if is_optional_key(their_key) && !is_optional_key(key) => {
                    MatchResult::failure(format!(
                        "Attribute {} is mandatory, but the other side makes it optional",
                        name
                    ))
                }
                Some((_, their_pattern)) => pattern.encompasses(their_pattern, mine, theirs, &stack),
            };
            result.breadcrumb(format!("@{}", name))
        });
        let attributes: Vec<MatchResult> = attributes.collect();

        let children = if bigger.children.len() != smaller.children.len() {
            MatchResult::failure(format!(
                "Expected {} children in {}, the other side has {}",
                bigger.children.len(),
                bigger.name,
                smaller.children.len()
            ))
        } else {
            MatchResult::from_results(bigger.children.iter().zip(&smaller.children).map(|(b, s)| {
                let crumb = match b {
                    Pattern::Xml(x) => x.name.clone(),
                    _ => "(text)".to_string(),
                };
                b.encompasses(s, mine, theirs, &stack).breadcrumb(crumb)
            }))
        };
        MatchResult::from_results(attributes.into_iter().chain(std::iter::once(children)))
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

fn include_optional(resolver: &Resolver) -> bool {
    match resolver.optional_keys() {
        OptionalKeyGeneration::All => true,
        OptionalKeyGeneration::None => false,
        OptionalKeyGeneration::Random => rand::thread_rng().gen_bool(0.5),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
