//! Keyword inheritance.
//!
//! Keywords form a hierarchy along `_`: `_notice_presence_here` is a
//! `_notice_presence`, which is a `_notice`.

/// Check if `lon` inherits from `sho`: it equals `sho` or extends it at a
/// `_` boundary.
///
/// ```
/// use psyc_proto::keyword::inherits;
///
/// assert!(inherits(b"_list", b"_list_members"));
/// assert!(!inherits(b"_list", b"_listing"));
/// ```
pub fn inherits(sho: &[u8], lon: &[u8]) -> bool {
    lon.strip_prefix(sho)
        .is_some_and(|rest| sho.is_empty() || matches!(rest.first(), None | Some(b'_')))
}

/// Check if every `_`-separated part of `sho` occurs in `lon`, in order.
///
/// ```
/// use psyc_proto::keyword::matches;
///
/// assert!(matches(b"_failure_delivery", b"_failure_unsuccessful_delivery_death"));
/// assert!(!matches(b"_delivery_failure", b"_failure_unsuccessful_delivery_death"));
/// ```
pub fn matches(sho: &[u8], lon: &[u8]) -> bool {
    let mut parts = lon.split(|&b| b == b'_').filter(|p| !p.is_empty());
    sho.split(|&b| b == b'_')
        .filter(|p| !p.is_empty())
        .all(|want| parts.any(|have| have == want))
}
