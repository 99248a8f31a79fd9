// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

//! The template tag codec.
//!
//! Every template tag is a URI of the form
//! `tag:enyaml.org,2022:<basetag>[~][:<subtag>]`. The optional `~` marks the
//! node as unrendered and the optional `:<subtag>` carries the YAML tag the
//! rendered result should take. [`split_tag`] and [`unsplit_tag`] are exact
//! inverses on any tag in the namespace.

/// The reserved URI prefix of the template tag namespace.
pub const TAG_PREFIX: &str = "tag:enyaml.org,2022:";

/// The default tag handle for yaml.org tags (`!!`).
pub const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Splits a template tag into `(basetag, subtag, skip_render)`.
///
/// Returns `None` when `tag` does not start with [`TAG_PREFIX`].
///
/// # Examples
///
/// ```
/// use enyaml::tag::split_tag;
///
/// let (basetag, subtag, skip_render) =
///     split_tag("tag:enyaml.org,2022:$~:int").unwrap();
/// assert_eq!(basetag, "$");
/// assert_eq!(subtag.as_deref(), Some("int"));
/// assert!(skip_render);
///
/// assert!(split_tag("tag:yaml.org,2002:str").is_none());
/// ```
pub fn split_tag(tag: &str) -> Option<(String, Option<String>, bool)> {
    let rest = tag.strip_prefix(TAG_PREFIX)?;
    let (basetag, subtag) = match rest.split_once(':') {
        Some((basetag, subtag)) => (basetag, Some(subtag.to_owned())),
        None => (rest, None),
    };
    let (basetag, skip_render) = match basetag.strip_suffix('~') {
        Some(basetag) => (basetag, true),
        None => (basetag, false),
    };
    Some((basetag.to_owned(), subtag, skip_render))
}

/// Joins `(basetag, subtag, skip_render)` back into a full template tag.
///
/// The exact inverse of [`split_tag`].
pub fn unsplit_tag(basetag: &str, subtag: Option<&str>, skip_render: bool) -> String {
    let mut tag = String::with_capacity(
        TAG_PREFIX.len() + basetag.len() + subtag.map_or(0, |s| s.len() + 1) + 1,
    );
    tag.push_str(TAG_PREFIX);
    tag.push_str(basetag);
    if skip_render {
        tag.push('~');
    }
    if let Some(subtag) = subtag {
        tag.push(':');
        tag.push_str(subtag);
    }
    tag
}

/// Expands a tag-handle shorthand inside a subtag.
///
/// `!!suffix` resolves against the yaml.org prefix and `!suffix` against the
/// template prefix; anything without a handle is kept verbatim. An unknown
/// named handle (`!h!suffix`) is reported back to the caller for a load
/// error.
pub(crate) fn resolve_subtag_handle(subtag: &str) -> Result<String, String> {
    let Some(rest) = subtag.strip_prefix('!') else {
        return Ok(subtag.to_owned());
    };
    if let Some(suffix) = rest.strip_prefix('!') {
        return Ok(format!("{}{}", YAML_TAG_PREFIX, suffix));
    }
    // A named handle is `!word!`; the primary handle is a bare `!`.
    if let Some(end) = rest.find('!') {
        let (name, _) = rest.split_at(end);
        if name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(format!("!{}!", name));
        }
    }
    Ok(format!("{}{}", TAG_PREFIX, rest))
}

/// Produces the shorthand form of a tag for emission.
///
/// Template-prefix tags collapse onto the `!` handle, yaml.org tags onto
/// `!!`; everything else is emitted as-is.
pub(crate) fn shorthand(tag: &str) -> String {
    if let Some(suffix) = tag.strip_prefix(TAG_PREFIX) {
        format!("!{}", suffix)
    } else if let Some(suffix) = tag.strip_prefix(YAML_TAG_PREFIX) {
        format!("!!{}", suffix)
    } else {
        tag.to_owned()
    }
}
