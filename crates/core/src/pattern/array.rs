//! JSON arrays: fixed-shape arrays (optionally ending in a rest marker),
//! homogeneous lists, and the rest marker itself.

use super::Pattern;
use crate::error::ContractError;
use crate::generation::{all_or_nothing_list_combinations, random_count, PatternStream};
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::Value;

fn index_crumb(i: usize) -> String {
    format!("[{}]", i)
}

/// Every element of `items` matches `element`.
fn match_all(element: &Pattern, items: &[Value], offset: usize, resolver: &Resolver) -> MatchResult {
    MatchResult::from_results(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| element.matches(item, resolver).breadcrumb(index_crumb(i + offset))),
    )
}

/// Repeated values of `element`; a recursive element yields an empty list.
fn generate_repeated(element: &Pattern, min: usize, resolver: &Resolver) -> Result<Vec<Value>, ContractError> {
    let count = random_count(min, min + 2);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        match element.generate(resolver) {
            Ok(value) => out.push(value),
            Err(ContractError::RecursionDetected { .. }) if out.len() >= min => break,
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// `element` (a repeating pattern) contains every element `other` allows.
fn repeated_encompasses(
    element: &Pattern,
    other: &Pattern,
    mine: &Resolver,
    theirs: &Resolver,
    type_stack: &TypeStack,
) -> MatchResult {
    match other {
        Pattern::List(l) => element.encompasses(&l.element, mine, theirs, type_stack),
        Pattern::Rest(r) => element.encompasses(&r.pattern, mine, theirs, type_stack),
        Pattern::Array(a) => MatchResult::from_results(a.elements.iter().enumerate().map(|(i, e)| {
            let inner = match e {
                Pattern::Rest(r) => r.pattern.as_ref(),
                other => other,
            };
            element
                .encompasses(inner, mine, theirs, type_stack)
                .breadcrumb(index_crumb(i))
        })),
        Pattern::Exact(e) => match &e.value {
            Value::Array(items) => match_all(element, items, 0, mine),
            value => MatchResult::mismatch("json array", value),
        },
        other => MatchResult::failure(format!("Expected json array, got {}", other.type_name())),
    }
}

// ──────────────────────────────────────────────
// Fixed-shape arrays
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayPattern {
    pub elements: Vec<Pattern>,
}

impl ArrayPattern {
    pub fn new(elements: Vec<Pattern>) -> Self {
        ArrayPattern { elements }
    }

    fn fixed(&self) -> &[Pattern] {
        match self.elements.last() {
            Some(Pattern::Rest(_)) => &self.elements[..self.elements.len() - 1],
            _ => &self.elements,
        }
    }

    fn min_tail(&self) -> usize {
        self.rest_marker().map(|r| r.min_items).unwrap_or(0)
    }

    fn rest(&self) -> Option<&Pattern> {
        self.rest_marker().map(|r| r.pattern.as_ref())
    }

    fn rest_marker(&self) -> Option<&RestPattern> {
        match self.elements.last() {
            Some(Pattern::Rest(r)) => Some(r),
            _ => None,
        }
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        let Value::Array(items) = value else {
            return MatchResult::mismatch("json array", value);
        };
        let fixed = self.fixed();
        match self.rest() {
            None if items.len() != fixed.len() => MatchResult::failure(format!(
                "Expected an array of length {}, actual length {}",
                fixed.len(),
                items.len()
            )),
            Some(_) if items.len() < fixed.len() + self.min_tail() => MatchResult::failure(format!(
                "Expected an array of at least {} elements, actual length {}",
                fixed.len() + self.min_tail(),
                items.len()
            )),
            rest => {
                let head = fixed.iter().zip(items).enumerate().map(|(i, (p, item))| {
                    p.matches(item, resolver).breadcrumb(index_crumb(i))
                });
                let tail = rest
                    .map(|r| match_all(r, &items[fixed.len()..], fixed.len(), resolver))
                    .unwrap_or(MatchResult::Success);
                MatchResult::from_results(head.chain(std::iter::once(tail)))
            }
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        let mut items = self
            .fixed()
            .iter()
            .map(|p| p.generate(resolver))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(rest) = self.rest_marker() {
            items.extend(generate_repeated(&rest.pattern, rest.min_items, resolver)?);
        }
        Ok(Value::Array(items))
    }

    /// Variants per element slot; the rest slot may also be absent, and
    /// slots are combined all-or-nothing in order.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        let cap = resolver.max_combinations();
        let mut slots: Vec<Vec<Option<Pattern>>> = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            let slot = match element {
                Pattern::Rest(r) => {
                    let mut slot: Vec<Option<Pattern>> = r
                        .pattern
                        .new_based_on(row, resolver)?
                        .take(cap)
                        .map(|p| Some(Pattern::rest(p)))
                        .collect();
                    slot.push(None);
                    slot
                }
                other => other.new_based_on(row, resolver)?.take(cap).map(Some).collect(),
            };
            slots.push(slot);
        }
        let combinations = all_or_nothing_list_combinations(&slots);
        Ok(Box::new(combinations.into_iter().map(Pattern::array)))
    }

    /// One element corrupted at a time, all others unchanged.
    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        let elements = self.elements.clone();
        let row = row.clone();
        let resolver = resolver.negative();
        Box::new((0..elements.len()).flat_map(move |i| {
            let base = elements.clone();
            elements[i].negative_based_on(&row, &resolver).map(move |negative| {
                let mut corrupted = base.clone();
                corrupted[i] = negative;
                Pattern::array(corrupted)
            })
        }))
    }

    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        let other_array = match other {
            Pattern::Array(a) => a,
            Pattern::Exact(e) => return self.matches(&e.value, mine),
            Pattern::List(_) | Pattern::Rest(_) => {
                return match (self.fixed().is_empty(), self.rest()) {
                    (true, Some(rest)) => repeated_encompasses(rest, other, mine, theirs, type_stack),
                    _ => MatchResult::failure(
                        "A finite array cannot encompass a list of any length",
                    ),
                }
            }
            other => {
                return MatchResult::failure(format!(
                    "Expected json array, got {}",
                    other.type_name()
                ))
            }
        };

        let (mine_fixed, theirs_fixed) = (self.fixed(), other_array.fixed());
        match (self.rest(), other_array.rest()) {
            (None, Some(_)) => MatchResult::failure(format!(
                "A finite array of length {} cannot encompass an array of unbounded length",
                mine_fixed.len()
            )),
            (None, None) if mine_fixed.len() != theirs_fixed.len() => MatchResult::failure(format!(
                "Expected an array of length {}, the other side has length {}",
                mine_fixed.len(),
                theirs_fixed.len()
            )),
            (Some(_), _) if theirs_fixed.len() < mine_fixed.len() => MatchResult::failure(format!(
                "Expected at least {} elements, the other side can have {}",
                mine_fixed.len(),
                theirs_fixed.len()
            )),
            (mine_rest, theirs_rest) => {
                let head = theirs_fixed.iter().enumerate().map(|(i, theirs_element)| {
                    let result = match mine_fixed.get(i).or(mine_rest) {
                        Some(bigger) => bigger.encompasses(theirs_element, mine, theirs, type_stack),
                        None => MatchResult::failure("Unexpected element"),
                    };
                    result.breadcrumb(index_crumb(i))
                });
                let tail = match (mine_rest, theirs_rest) {
                    (Some(m), Some(t)) => m
                        .encompasses(t, mine, theirs, type_stack)
                        .breadcrumb(index_crumb(theirs_fixed.len())),
                    _ => MatchResult::Success,
                };
                MatchResult::from_results(head.chain(std::iter::once(tail)))
            }
        }
    }
}

// ──────────────────────────────────────────────
// Lists
// ──────────────────────────────────────────────

/// Any number of values of one element pattern, written `(Type*)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPattern {
    pub element: Box<Pattern>,
    pub type_alias: Option<String>,
    /// Fewest elements accepted and generated; 1 for element-corrupted
    /// negatives so they never come out empty.
    pub min_items: usize,
}

impl ListPattern {
    pub fn new(element: Pattern) -> Self {
        ListPattern {
            element: Box::new(element),
            type_alias: None,
            min_items: 0,
        }
    }

    pub fn non_empty(element: Pattern) -> Self {
        ListPattern {
            min_items: 1,
            ..ListPattern::new(element)
        }
    }

    pub fn type_name(&self) -> String {
        match &self.type_alias {
            Some(alias) => alias.clone(),
            None => format!("list of {}", self.element.type_name()),
        }
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        match value {
            Value::Array(items) if items.len() < self.min_items => MatchResult::failure(format!(
                "Expected at least {} element(s), actual length {}",
                self.min_items,
                items.len()
            )),
            Value::Array(items) => match_all(&self.element, items, 0, resolver),
            other => MatchResult::mismatch(self.type_name(), other),
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        Ok(Value::Array(generate_repeated(&self.element, self.min_items, resolver)?))
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        let alias = self.type_alias.clone();
        let min_items = self.min_items;
        let variants = self.element.new_based_on(row, resolver)?;
        Ok(Box::new(variants.map(move |element| {
            Pattern::List(ListPattern {
                element: Box::new(element),
                type_alias: alias.clone(),
                min_items,
            })
        })))
    }

    /// Scalars in place of the list, then non-empty lists whose elements
    /// are of the wrong type.
    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        let corrupted = self
            .element
            .negative_based_on(row, &resolver.negative())
            .map(|element| Pattern::List(ListPattern::non_empty(element)));
        let not_a_list = vec![
            Pattern::null(),
            Pattern::number(),
            Pattern::boolean(),
            Pattern::string(),
        ];
        Box::new(not_a_list.into_iter().chain(corrupted))
    }

    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        repeated_encompasses(&self.element, other, mine, theirs, type_stack)
    }
}

// ──────────────────────────────────────────────
// Rest marker
// ──────────────────────────────────────────────

/// `(Type...)`: zero or more trailing values. On its own it behaves as a
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestPattern {
    pub pattern: Box<Pattern>,
    pub min_items: usize,
}

impl RestPattern {
    pub fn new(pattern: Pattern) -> Self {
        RestPattern {
            pattern: Box::new(pattern),
            min_items: 0,
        }
    }

    /// A tail of at least one value, used for corrupted tails.
    pub fn non_empty(pattern: Pattern) -> Self {
        RestPattern {
            pattern: Box::new(pattern),
            min_items: 1,
        }
    }

    pub fn type_name(&self) -> String {
        format!("{}...", self.pattern.type_name())
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        match value {
            Value::Array(items) if items.len() < self.min_items => MatchResult::failure(format!(
                "Expected at least {} element(s), actual length {}",
                self.min_items,
                items.len()
            )),
            Value::Array(items) => match_all(&self.pattern, items, 0, resolver),
            other => MatchResult::mismatch(self.type_name(), other),
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        Ok(Value::Array(generate_repeated(&self.pattern, self.min_items, resolver)?))
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        Ok(Box::new(self.pattern.new_based_on(row, resolver)?.map(Pattern::rest)))
    }

    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        Box::new(
            self.pattern
                .negative_based_on(row, &resolver.negative())
                .map(|p| Pattern::Rest(RestPattern::non_empty(p))),
        )
    }

    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        repeated_encompasses(&self.pattern, other, mine, theirs, type_stack)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
