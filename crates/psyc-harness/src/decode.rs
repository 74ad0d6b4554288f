//! Structured modifier values.

use psyc_proto::{Dict, List, Modifier, Operator, Update, VarType, VarTypes};

use crate::error::Result;

/// A modifier value, re-parsed according to its operator and variable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredValue<'a> {
    /// Plain value
    Scalar(&'a [u8]),
    /// Value of a `_list` variable
    List(List<'a>),
    /// Value of a `_dict` variable
    Dict(Dict<'a>),
    /// Value of an `@` modifier
    Update(Update<'a>),
}

/// Decode the value of `modifier`.
///
/// `@` modifiers always carry an update. Otherwise the variable name decides:
/// names inheriting from `_list` or `_dict` hold nested values, everything
/// else is a scalar.
///
/// # Errors
///
/// The nested parser's error, wrapped in [`crate::ReaderError`].
pub fn decode_value<'a>(modifier: &Modifier<'a>, vars: &dyn VarTypes) -> Result<StructuredValue<'a>> {
    if modifier.oper == Operator::Update {
        return Ok(StructuredValue::Update(Update::parse(modifier.value)?));
    }
    Ok(match vars.var_type(modifier.name) {
        VarType::List => StructuredValue::List(List::parse(modifier.value)?),
        VarType::Dict => StructuredValue::Dict(Dict::parse(modifier.value)?),
        _ => StructuredValue::Scalar(modifier.value),
    })
}
