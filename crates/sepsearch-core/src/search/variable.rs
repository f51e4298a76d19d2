//! Search variables and the dense index used internally by the controller.
//!
//! A [`Variable`] is an opaque, cheaply clonable name. Equality, hashing and
//! ordering all go through the name, so variables are safe map/set keys and
//! iterate deterministically.
//!
//! The controller never works on names directly: [`VariableIndex`] assigns
//! each variable a dense [`VarId`] in input order, and that order is the
//! fixed outer visiting order of every depth pass.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::search::errors::SearchError;

/// A named variable taking part in a search.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Arc<str>);

impl Variable {
    /// Creates a variable with the given name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Variable(Arc::from(name.as_ref()))
    }

    /// The variable's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({})", self.0)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Variable(Arc::from(name))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Variable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Variable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Variable::from(name))
    }
}

/// Convenience constructor for a list of variables.
pub fn variables<I, S>(names: I) -> Vec<Variable>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(Variable::new).collect()
}

/// Dense position of a variable within one search.
///
/// `VarId` implements Ord for stable, deterministic iteration in input order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct VarId(pub u32);

impl VarId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional mapping between variables and their dense ids.
#[derive(Debug, Clone, Default)]
pub struct VariableIndex {
    vars: Vec<Variable>,
    ids: FxHashMap<Variable, VarId>,
}

impl VariableIndex {
    /// Builds an index over `vars`, preserving their order.
    ///
    /// Fails on duplicate names.
    pub fn new(vars: &[Variable]) -> Result<Self, SearchError> {
        let mut ids = FxHashMap::default();
        ids.reserve(vars.len());
        for (i, v) in vars.iter().enumerate() {
            if ids.insert(v.clone(), VarId(i as u32)).is_some() {
                return Err(SearchError::DuplicateVariable(v.name().to_string()));
            }
        }
        Ok(Self {
            vars: vars.to_vec(),
            ids,
        })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Looks up the id of a variable.
    pub fn id(&self, var: &Variable) -> Option<VarId> {
        self.ids.get(var).copied()
    }

    /// Looks up the id of a variable, failing with `UnknownVariable`.
    pub fn require(&self, var: &Variable) -> Result<VarId, SearchError> {
        self.id(var)
            .ok_or_else(|| SearchError::UnknownVariable(var.name().to_string()))
    }

    /// The variable with the given id.
    ///
    /// Ids are only ever minted by this index, so lookups are in range.
    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.index()]
    }

    /// All variables in input order.
    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    /// All ids in input order.
    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.vars.len() as u32).map(VarId)
    }
}

impl PartialEq for VariableIndex {
    fn eq(&self, other: &Self) -> bool {
        self.vars == other.vars
    }
}
