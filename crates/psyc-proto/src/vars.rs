//! Variable name lookup.
//!
//! The parsers never consult names; applications inject a [`VarTypes`]
//! implementation to decide which modifiers are routing modifiers and which
//! values hold nested structures.

use serde::{Deserialize, Serialize};

use crate::keyword::inherits;

/// Value type of a variable, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarType {
    /// No known type
    #[default]
    Unknown,
    /// `_amount`
    Amount,
    /// `_color`
    Color,
    /// `_date`
    Date,
    /// `_degree`
    Degree,
    /// `_dict`
    Dict,
    /// `_entity`
    Entity,
    /// `_flag`
    Flag,
    /// `_language`
    Language,
    /// `_list`
    List,
    /// `_nick`
    Nick,
    /// `_page`
    Page,
    /// `_struct`
    Struct,
    /// `_time`
    Time,
    /// `_uniform`
    Uniform,
}

/// Read-only name lookup.
pub trait VarTypes {
    /// Type of the variable `name`.
    fn var_type(&self, name: &[u8]) -> VarType;

    /// Check if `name` belongs in the routing header
    fn is_routing(&self, name: &[u8]) -> bool;
}

/// Sorted by name.
const ROUTING_VARS: &[&[u8]] = &[
    b"_amount_fragments",
    b"_context",
    b"_counter",
    b"_fragment",
    b"_source",
    b"_source_relay",
    b"_source_relay_relay",
    b"_tag",
    b"_tag_relay",
    b"_target",
    b"_target_forward",
    b"_target_relay",
];

const TYPE_VARS: &[(&[u8], VarType)] = &[
    (b"_amount", VarType::Amount),
    (b"_color", VarType::Color),
    (b"_date", VarType::Date),
    (b"_degree", VarType::Degree),
    (b"_dict", VarType::Dict),
    (b"_entity", VarType::Entity),
    (b"_flag", VarType::Flag),
    (b"_language", VarType::Language),
    (b"_list", VarType::List),
    (b"_nick", VarType::Nick),
    (b"_page", VarType::Page),
    (b"_struct", VarType::Struct),
    (b"_time", VarType::Time),
    (b"_uniform", VarType::Uniform),
];

/// The built-in variable table.
///
/// Types resolve by inheritance: `_list_members` is a list, `_time_place`
/// a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownVars;

impl VarTypes for KnownVars {
    fn var_type(&self, name: &[u8]) -> VarType {
        TYPE_VARS
            .iter()
            .filter(|(prefix, _)| inherits(prefix, name))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(VarType::Unknown, |&(_, ty)| ty)
    }

    fn is_routing(&self, name: &[u8]) -> bool {
        ROUTING_VARS.binary_search_by(|known| (*known).cmp(name)).is_ok()
    }
}
