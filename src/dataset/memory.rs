//! In-memory [`Dataset`] implementation.
//!
//! Used by the test suite and by callers that already hold the grid in
//! memory. Variables are built with [`MemVariable::new`] and decorated with
//! attributes through [`MemVariable::with_attr`].

use std::collections::HashMap;

use ahash::RandomState;

use super::{AttrValue, DataVariable, Dataset, Dim, NdArray};
use crate::envgrid_errors::EnvgridError;

/// A variable backed by an owned [`NdArray`].
#[derive(Debug, Clone)]
pub struct MemVariable {
    name: String,
    dims: Vec<String>,
    array: NdArray,
    attrs: HashMap<String, AttrValue, RandomState>,
}

impl MemVariable {
    /// Arguments
    /// ---------
    /// * `name`: variable name
    /// * `dims`: dimension names, outermost first, one per array axis
    /// * `array`: the sample payload
    pub fn new(name: impl Into<String>, dims: &[&str], array: NdArray) -> Self {
        MemVariable {
            name: name.into(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            array,
            attrs: HashMap::default(),
        }
    }

    /// Attach an attribute (builder style).
    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Attach a text attribute (builder style).
    pub fn with_text_attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_attr(name, AttrValue::Text(value.into()))
    }
}

impl DataVariable for MemVariable {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension_names(&self) -> Vec<String> {
        self.dims.clone()
    }

    fn shape(&self) -> Vec<usize> {
        self.array.shape().to_vec()
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.attrs.get(name).cloned()
    }

    fn read(&self) -> Result<NdArray, EnvgridError> {
        Ok(self.array.clone())
    }
}

/// An in-memory container of dimensions, variables and groups.
#[derive(Debug, Clone, Default)]
pub struct MemDataset {
    location: String,
    dims: Vec<Dim>,
    vars: Vec<MemVariable>,
    groups: HashMap<String, Vec<MemVariable>, RandomState>,
    attrs: HashMap<String, AttrValue, RandomState>,
}

impl MemDataset {
    pub fn new(location: impl Into<String>) -> Self {
        MemDataset {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn add_dimension(&mut self, name: impl Into<String>, len: usize) -> &mut Self {
        self.dims.push(Dim::new(name, len));
        self
    }

    pub fn add_variable(&mut self, var: MemVariable) -> &mut Self {
        self.vars.push(var);
        self
    }

    pub fn add_group_variable(&mut self, group: impl Into<String>, var: MemVariable) -> &mut Self {
        self.groups.entry(group.into()).or_default().push(var);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttrValue) -> &mut Self {
        self.attrs.insert(name.into(), value);
        self
    }
}

impl Dataset for MemDataset {
    type Var = MemVariable;

    fn location(&self) -> &str {
        &self.location
    }

    fn dimensions(&self) -> Vec<Dim> {
        self.dims.clone()
    }

    fn variables(&self) -> Vec<&MemVariable> {
        self.vars.iter().collect()
    }

    fn group_variables(&self, group: &str) -> Vec<&MemVariable> {
        self.groups
            .get(group)
            .map(|vs| vs.iter().collect())
            .unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.attrs.get(name).cloned()
    }
}
