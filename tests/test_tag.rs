// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use enyaml::tag::{split_tag, unsplit_tag, TAG_PREFIX};

#[test]
fn test_split_round_trips_every_combination() {
    let basetags = ["$", "$f", "set", "if", "for", "tmpl"];
    let subtags = [None, Some("int"), Some("tag:yaml.org,2002:str")];
    for basetag in basetags {
        for subtag in subtags {
            for skip_render in [false, true] {
                let tag = unsplit_tag(basetag, subtag, skip_render);
                let (b, s, f) = split_tag(&tag).expect("the tag carries the prefix");
                assert_eq!(b, basetag);
                assert_eq!(s.as_deref(), subtag);
                assert_eq!(f, skip_render);
            }
        }
    }
}

#[test]
fn test_split_of_foreign_tags_is_none() {
    assert!(split_tag("tag:yaml.org,2002:str").is_none());
    assert!(split_tag("!local").is_none());
    assert!(split_tag("").is_none());
}

#[test]
fn test_split_examples() {
    let (basetag, subtag, skip_render) =
        split_tag("tag:enyaml.org,2022:$f").unwrap();
    assert_eq!(basetag, "$f");
    assert_eq!(subtag, None);
    assert!(!skip_render);

    let (basetag, subtag, skip_render) =
        split_tag("tag:enyaml.org,2022:for~:tag:yaml.org,2002:set").unwrap();
    assert_eq!(basetag, "for");
    assert_eq!(subtag.as_deref(), Some("tag:yaml.org,2002:set"));
    assert!(skip_render);
}

#[test]
fn test_unsplit_examples() {
    assert_eq!(unsplit_tag("set", None, false), format!("{}set", TAG_PREFIX));
    assert_eq!(
        unsplit_tag("$", Some("int"), true),
        format!("{}$~:int", TAG_PREFIX)
    );
}
