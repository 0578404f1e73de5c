//! Method registry keyed by literal address or address pattern
//!
//! Literal addresses map straight to a [`MethodChain`]. Patterns live in an
//! index-addressed slot arena with a free-list, and the pattern string → slot
//! index map is the only authority on whether a pattern is registered.
//!
//! Resolving an incoming address against the patterns promotes the result into
//! the literal map, so the next message to the same address is a single lookup.
//! Promoted entries stay until they are removed explicitly, even if the pattern
//! that produced them is unregistered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::address::{self, AddressType};
use crate::message::OscMessage;
use crate::pattern::Matcher;
use crate::Result;

const DEFAULT_CAPACITY: usize = 16;
const DEFAULT_PATTERN_CAPACITY: usize = 8;

/// Callback invoked for each message dispatched to its address
#[derive(Clone)]
pub struct Method(Arc<dyn Fn(&OscMessage<'_>) + Send + Sync>);

impl Method {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&OscMessage<'_>) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn invoke(&self, message: &OscMessage<'_>) {
        (self.0)(message)
    }

    /// Identity comparison: two handles are equal when they share one closure
    pub fn ptr_eq(&self, other: &Method) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Method {}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Ordered set of methods registered for one address or pattern
#[derive(Debug, Clone, Default)]
pub struct MethodChain {
    methods: Vec<Method>,
}

impl MethodChain {
    pub fn new(method: Method) -> Self {
        Self {
            methods: vec![method],
        }
    }

    /// Append a method; the same handle may appear more than once
    pub fn push(&mut self, method: Method) {
        self.methods.push(method);
    }

    /// Remove the first occurrence of `method`
    pub fn remove(&mut self, method: &Method) -> bool {
        match self.methods.iter().position(|m| m == method) {
            Some(i) => {
                self.methods.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.methods.iter().any(|m| m == method)
    }


    pub fn invoke(&self, message: &OscMessage<'_>) {
        for method in &self.methods {
            method.invoke(message);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Method> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Extend<Method> for MethodChain {
    fn extend<I: IntoIterator<Item = Method>>(&mut self, iter: I) {
        self.methods.extend(iter);
    }
}

impl<'a> IntoIterator for &'a MethodChain {
    type Item = &'a Method;
    type IntoIter = std::slice::Iter<'a, Method>;

    fn into_iter(self) -> Self::IntoIter {
        self.methods.iter()
    }
}

#[derive(Debug)]
struct PatternSlot {
    matcher: Matcher,
    methods: MethodChain,
}

/// Literal and pattern method registry
#[derive(Debug)]
pub struct AddressSpace {
    address_to_methods: HashMap<String, MethodChain>,
    patterns: Vec<Option<PatternSlot>>,
    freed_pattern_indices: Vec<usize>,
    pattern_to_index: HashMap<String, usize>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            address_to_methods: HashMap::with_capacity(capacity),
            patterns: Vec::with_capacity(DEFAULT_PATTERN_CAPACITY),
            freed_pattern_indices: Vec::new(),
            pattern_to_index: HashMap::new(),
        }
    }

    /// Register a method for a literal address or a pattern.
    ///
    /// Returns `Ok(false)` for an empty or invalid address. The only error is a
    /// pattern that cannot be compiled.
    pub fn try_add_method(&mut self, address: &str, method: Method) -> Result<bool> {
        match address::classify(address) {
            AddressType::Address => {
                self.address_to_methods
                    .entry(address.to_string())
                    .or_default()
                    .push(method);
                Ok(true)
            }
            AddressType::Pattern => {
                if let Some(&index) = self.pattern_to_index.get(address) {
                    if let Some(slot) = self.patterns[index].as_mut() {
                        slot.methods.push(method);
                        return Ok(true);
                    }
                }

                let matcher = Matcher::compile(address)?;
                let slot = PatternSlot {
                    matcher,
                    methods: MethodChain::new(method),
                };

                let index = match self.freed_pattern_indices.pop() {
                    Some(index) => {
                        self.patterns[index] = Some(slot);
                        index
                    }
                    None => {
                        if self.patterns.len() == self.patterns.capacity() {
                            let grow_by = self.patterns.capacity().max(DEFAULT_PATTERN_CAPACITY);
                            self.patterns.reserve_exact(grow_by);
                        }
                        self.patterns.push(Some(slot));
                        self.patterns.len() - 1
                    }
                };

                debug!("registered pattern {} in slot {}", address, index);
                self.pattern_to_index.insert(address.to_string(), index);
                Ok(true)
            }
            AddressType::Invalid => Ok(false),
        }
    }

    /// Remove every method registered for a literal address
    pub fn remove_address_method(&mut self, address: &str) -> bool {
        match address::classify(address) {
            AddressType::Address => self.address_to_methods.remove(address).is_some(),
            _ => false,
        }
    }

    /// Remove one method from a literal address or a pattern.
    ///
    /// Other methods on the same pattern stay registered; the pattern's slot is
    /// released once its last method is gone.
    pub fn remove_method(&mut self, address: &str, method: &Method) -> bool {
        match address::classify(address) {
            AddressType::Address => {
                let Some(chain) = self.address_to_methods.get_mut(address) else {
                    return false;
                };
                let removed = chain.remove(method);
                if chain.is_empty() {
                    self.address_to_methods.remove(address);
                }
                removed
            }
            AddressType::Pattern => {
                let Some(&index) = self.pattern_to_index.get(address) else {
                    return false;
                };
                let Some(slot) = self.patterns[index].as_mut() else {
                    return false;
                };
                if !slot.methods.remove(method) {
                    return false;
                }
                if slot.methods.is_empty() {
                    self.patterns[index] = None;
                    self.freed_pattern_indices.push(index);
                    self.pattern_to_index.remove(address);
                    debug!("released pattern slot {} ({})", index, address);
                }
                true
            }
            AddressType::Invalid => false,
        }
    }

    /// Match a literal address against every registered pattern.
    ///
    /// `matched` is cleared and then receives the chain of every matching
    /// pattern, in slot order. A method registered more than once stays in the
    /// list once per registration. The whole list is appended to the literal
    /// entry for `address`, so each call promotes again.
    ///
    /// An address that is itself pattern-shaped (`/foo/*`) is matched as plain
    /// text and promoted under that string. Such an entry cannot be removed
    /// afterwards, since removal by pattern string targets the pattern slots.
    pub fn try_match_pattern_handler(&mut self, address: &str, matched: &mut Vec<Method>) -> bool {
        if !address::is_valid(address) {
            return false;
        }

        matched.clear();
        for slot in self.patterns.iter().flatten() {
            if slot.matcher.is_match(address) {
                matched.extend(slot.methods.iter().cloned());
            }
        }

        if matched.is_empty() {
            return false;
        }

        self.address_to_methods
            .entry(address.to_string())
            .or_default()
            .extend(matched.iter().cloned());
        true
    }

    /// Methods registered (or promoted) for a literal address
    pub fn methods(&self, address: &str) -> Option<&MethodChain> {
        self.address_to_methods.get(address)
    }

    /// Number of literal address entries
    pub fn handler_count(&self) -> usize {
        self.address_to_methods.len()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.address_to_methods.keys().map(String::as_str)
    }

    /// Number of registered patterns
    pub fn pattern_count(&self) -> usize {
        self.pattern_to_index.len()
    }

    /// Slot index a pattern occupies, if registered
    pub fn pattern_slot(&self, pattern: &str) -> Option<usize> {
        self.pattern_to_index.get(pattern).copied()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.pattern_to_index.keys().map(String::as_str)
    }
}
