use super::*;

#[test]
fn part_json_uses_type_key_and_optional_fields() {
    let part: Part = serde_json::from_str(
        r#"{"id":3,"fleet":"Zephyr","type":"Cockpit","name":"Bubble","color":"red"}"#,
    )
    .unwrap();
    assert_eq!(part.part_type, "Cockpit");
    assert_eq!(part.original, None);
    assert_eq!(part.original_str(), "");
    assert_eq!(part.color_str(), "red");
    assert!(!part.is_fleet());

    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(json["type"], "Cockpit");
}

#[test]
fn fleet_and_background_predicates() {
    let fleet: Part =
        serde_json::from_str(r#"{"id":1,"type":"Fleet","name":"Zephyr"}"#).unwrap();
    assert!(fleet.is_fleet());
    assert_eq!(fleet.fleet_str(), "");

    let bg: Part = serde_json::from_str(
        r#"{"id":2,"fleet":"Zephyr","type":"Background","name":"Sky","color":"blue"}"#,
    )
    .unwrap();
    assert!(bg.is_background());
}
