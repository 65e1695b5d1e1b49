//! Parameter and scope binder.
//!
//! One binder lives for one compilation. It owns the placeholder store
//! (`c0, c1, …`), shared by every nested scope, and an arena of scope frames
//! holding table and alias bindings. Sub-query scopes point at their parent
//! by index and fall back to it on lookup.

use crate::ast::{ConstantArray, ConstantValue, Node, NodeId, Value, ValueKind};
use crate::error::{SqlError, SqlResult};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A value bound to a placeholder key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundParam {
    pub key: String,
    pub value: Value,
    pub kind: ValueKind,
}

/// How a qualified reference resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    /// Physical table referenced by name; the driver applies its prefix.
    Table(String),
    /// Alias (or derived table name) rendered as is.
    Alias(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Whole,
    Element(usize),
}

#[derive(Debug, Default)]
struct ParamStore {
    next_key: usize,
    params: Vec<BoundParam>,
    nodes: HashMap<(NodeId, Slot), String>,
}

#[derive(Debug, Default)]
struct TableBinding {
    aliases: BTreeSet<String>,
    bare: bool,
}

#[derive(Debug, Default)]
struct ScopeFrame {
    parent: Option<usize>,
    tables: HashMap<String, TableBinding>,
    /// alias -> canonical table name
    aliases: HashMap<String, String>,
    column_aliases: HashSet<String>,
}

#[derive(Debug)]
pub struct Binder {
    store: ParamStore,
    scopes: Vec<ScopeFrame>,
    current: usize,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    pub fn new() -> Self {
        Self {
            store: ParamStore::default(),
            scopes: vec![ScopeFrame::default()],
            current: 0,
        }
    }

    /// Bind `value` under a freshly minted key.
    pub fn assign(&mut self, value: Value, kind: ValueKind) -> String {
        let key = format!("c{}", self.store.next_key);
        self.store.next_key += 1;
        self.store.params.push(BoundParam {
            key: key.clone(),
            value,
            kind,
        });
        key
    }

    /// Key for a constant node, minting one the first time this binder sees it.
    ///
    /// `formatter` rewrites the value before it is stored (boolean
    /// normalization and similar backend coercions).
    pub fn bind(
        &mut self,
        constant: &ConstantValue,
        formatter: Option<&dyn Fn(&Value) -> Value>,
    ) -> String {
        let slot = (constant.id(), Slot::Whole);
        if let Some(key) = self.store.nodes.get(&slot) {
            return key.clone();
        }
        let value = match formatter {
            Some(f) => f(constant.value()),
            None => constant.value().clone(),
        };
        let kind = value.kind();
        let key = self.assign(value, kind);
        self.store.nodes.insert(slot, key.clone());
        key
    }

    /// Key for a whole constant list serialized into one value.
    pub fn bind_array(
        &mut self,
        array: &ConstantArray,
        formatter: &dyn Fn(&[Value]) -> Value,
    ) -> String {
        let slot = (array.id(), Slot::Whole);
        if let Some(key) = self.store.nodes.get(&slot) {
            return key.clone();
        }
        let value = formatter(array.items());
        let kind = value.kind();
        let key = self.assign(value, kind);
        self.store.nodes.insert(slot, key.clone());
        key
    }

    /// Key for one element of a constant list.
    pub fn bind_element(
        &mut self,
        array: &ConstantArray,
        index: usize,
        formatter: Option<&dyn Fn(&Value) -> Value>,
    ) -> SqlResult<String> {
        let slot = (array.id(), Slot::Element(index));
        if let Some(key) = self.store.nodes.get(&slot) {
            return Ok(key.clone());
        }
        let item = array.items().get(index).ok_or_else(|| {
            SqlError::InvalidValue(format!("array has no element {}", index))
        })?;
        let value = match formatter {
            Some(f) => f(item),
            None => item.clone(),
        };
        let kind = value.kind();
        let key = self.assign(value, kind);
        self.store.nodes.insert(slot, key.clone());
        Ok(key)
    }

    pub fn is_assigned(&self, key: &str) -> bool {
        self.store.params.iter().any(|p| p.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.store
            .params
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }

    /// Bound parameters in key order.
    pub fn params(&self) -> &[BoundParam] {
        &self.store.params
    }

    pub fn into_params(self) -> Vec<BoundParam> {
        self.store.params
    }

    /// Bind `name` into the active scope, optionally under `alias`.
    pub fn register_table(&mut self, name: &str, alias: Option<&str>) -> SqlResult<()> {
        match alias {
            Some(alias) => {
                self.check_alias_free(alias)?;
                let frame = &mut self.scopes[self.current];
                frame.aliases.insert(alias.to_string(), name.to_string());
                frame
                    .tables
                    .entry(name.to_string())
                    .or_default()
                    .aliases
                    .insert(alias.to_string());
            }
            None => {
                let binding = self.scopes[self.current]
                    .tables
                    .entry(name.to_string())
                    .or_default();
                if binding.bare {
                    return Err(SqlError::AmbiguousTable(name.to_string()));
                }
                binding.bare = true;
            }
        }
        Ok(())
    }

    /// Bind the alias of a derived table (sub-query row source).
    pub fn register_derived(&mut self, alias: &str) -> SqlResult<()> {
        self.check_alias_free(alias)?;
        self.scopes[self.current]
            .aliases
            .insert(alias.to_string(), alias.to_string());
        Ok(())
    }

    fn check_alias_free(&self, alias: &str) -> SqlResult<()> {
        let frame = &self.scopes[self.current];
        if frame.aliases.contains_key(alias) {
            return Err(SqlError::DuplicateAlias(alias.to_string()));
        }
        let mut parent = frame.parent;
        while let Some(idx) = parent {
            if self.scopes[idx].aliases.contains_key(alias) {
                return Err(SqlError::AliasShadowing(alias.to_string()));
            }
            parent = self.scopes[idx].parent;
        }
        Ok(())
    }

    /// Resolve a table name or alias against the active scope chain.
    pub fn resolve_table(&self, name: &str) -> SqlResult<TableRef> {
        let mut scope = Some(self.current);
        while let Some(idx) = scope {
            let frame = &self.scopes[idx];
            if frame.aliases.contains_key(name) {
                return Ok(TableRef::Alias(name.to_string()));
            }
            if let Some(binding) = frame.tables.get(name) {
                if binding.bare {
                    return Ok(TableRef::Table(name.to_string()));
                }
                let mut aliases = binding.aliases.iter();
                return match (aliases.next(), aliases.next()) {
                    (Some(only), None) => Ok(TableRef::Alias(only.clone())),
                    _ => Err(SqlError::AmbiguousTable(name.to_string())),
                };
            }
            scope = frame.parent;
        }
        Err(SqlError::UnresolvedTable(name.to_string()))
    }

    /// Default projection alias for `node`.
    ///
    /// Qualified fields yield `<owner>_<column>`, functions their lower-cased
    /// name; a numeric suffix disambiguates collisions in the active scope.
    /// Other nodes get no alias.
    pub fn generate_alias(&mut self, node: &Node) -> Option<String> {
        let base = match node {
            Node::FieldName(f) => {
                let owner = f.table.as_ref()?;
                format!("{}_{}", owner, f.column)
            }
            Node::Function(func) => func.name.to_lowercase(),
            _ => return None,
        };
        let frame = &mut self.scopes[self.current];
        let mut candidate = base.clone();
        let mut n = 0;
        while frame.column_aliases.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{}", base, n);
        }
        frame.column_aliases.insert(candidate.clone());
        Some(candidate)
    }

    /// Record an explicit projection alias so generated ones avoid it.
    pub fn reserve_alias(&mut self, alias: &str) {
        self.scopes[self.current]
            .column_aliases
            .insert(alias.to_string());
    }

    /// Run `f` in a child scope of the active one.
    pub fn sub_scope<T>(&mut self, f: impl FnOnce(&mut Binder) -> SqlResult<T>) -> SqlResult<T> {
        let parent = Some(self.current);
        self.enter(parent, f)
    }

    /// Run `f` in a scope beside the active one (same parent), as for the
    /// branches of a UNION.
    pub fn sibling_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Binder) -> SqlResult<T>,
    ) -> SqlResult<T> {
        let parent = self.scopes[self.current].parent;
        self.enter(parent, f)
    }

    fn enter<T>(
        &mut self,
        parent: Option<usize>,
        f: impl FnOnce(&mut Binder) -> SqlResult<T>,
    ) -> SqlResult<T> {
        self.scopes.push(ScopeFrame {
            parent,
            ..ScopeFrame::default()
        });
        let previous = self.current;
        self.current = self.scopes.len() - 1;
        let result = f(self);
        self.current = previous;
        result
    }

    /// Nesting depth of the active scope, 0 at the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut parent = self.scopes[self.current].parent;
        while let Some(idx) = parent {
            depth += 1;
            parent = self.scopes[idx].parent;
        }
        depth
    }
}
