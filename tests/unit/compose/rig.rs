use super::*;
use crate::test_support::part;

fn sample_rig() -> Rig {
    Rig {
        id: 7,
        original: true,
        parts: vec![
            part(1, None, "Fleet", "Zephyr", None, None),
            part(10, Some("Zephyr"), "Background", "Sky", Some("blue"), None),
            part(20, Some("Zephyr"), "Cockpit", "Bubble", Some("red"), Some("Ace")),
        ],
        originality: 1.0,
        attributes: vec![RigAttribute {
            name: ATTR_ORIGINAL.to_string(),
            value: "Zephyr Ace".to_string(),
        }],
        images: vec![],
    }
}

#[test]
fn identical_pairs_are_fully_original() {
    let parts = vec![
        part(1, Some("Z"), "Cockpit", "A", Some("black"), Some("1")),
        part(2, Some("Z"), "Wings", "B", Some("black"), Some("1")),
    ];
    assert_eq!(originality(&parts), 1.0);
}

#[test]
fn split_pairs_are_half_original() {
    let parts = vec![
        part(1, Some("Z"), "Cockpit", "A", Some("black"), Some("1")),
        part(2, Some("Z"), "Wings", "B", Some("grey"), Some("2")),
    ];
    assert_eq!(originality(&parts), 0.5);
}

#[test]
fn fleet_and_background_do_not_count() {
    let parts = vec![
        part(1, None, "Fleet", "Zephyr", None, None),
        part(2, Some("Z"), "Background", "Sky", Some("blue"), None),
        part(3, Some("Z"), "Cockpit", "A", Some("black"), Some("1")),
        part(4, Some("Z"), "Wings", "B", Some("black"), Some("1")),
        part(5, Some("Z"), "Engine", "C", Some("grey"), Some("2")),
    ];
    assert!((originality(&parts) - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(originality(&parts[..2]), 0.0);
}

#[test]
fn images_attach_once() {
    let mut rig = sample_rig();
    rig.attach_images(vec![ImageRef {
        variant: ImageVariant::Full,
        locator: "7/full.png".to_string(),
    }])
    .unwrap();
    assert_eq!(rig.image(ImageVariant::Full), Some("7/full.png"));
    assert_eq!(rig.image(ImageVariant::Thumb), None);
    assert!(rig.attach_images(vec![]).is_err());
}

#[test]
fn metadata_lists_parts_attributes_and_originality() {
    let rig = sample_rig();
    let meta = rig.metadata();
    assert_eq!(meta.name, "Zephyr #7");
    let traits: Vec<(&str, &str)> = meta
        .attributes
        .iter()
        .map(|a| (a.trait_type.as_str(), a.value.as_str()))
        .collect();
    assert_eq!(
        traits,
        vec![
            ("Fleet", "Zephyr"),
            ("Background", "Sky"),
            ("Cockpit", "Bubble"),
            ("Original", "Zephyr Ace"),
            ("Originality", "100%"),
        ]
    );
    assert_eq!(rig.attribute(ATTR_ORIGINAL), Some("Zephyr Ace"));

    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["attributes"][0]["trait_type"], "Fleet");
}

#[test]
fn image_variant_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&ImageVariant::Alpha).unwrap(),
        "\"alpha\""
    );
    assert_eq!(ImageVariant::Thumb.as_str(), "thumb");
}
