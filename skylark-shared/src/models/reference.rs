use serde::{Deserialize, Serialize};

/// Static airport record. `chapter_key` marks the chapter that owns the
/// airport and can book departures from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub name: String,
    pub code: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub chapter_key: Option<String>,
}

/// Static airline record; `prefix` starts every flight number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub name: String,
    pub prefix: String,
}

/// The single reference record listing valid seat classes and extras.
/// Both lists are ordered; the order drives pricing-ladder iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceInfo {
    pub seat_classes: Vec<String>,
    pub extras: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airport_wire_shape() {
        let airport = Airport {
            name: "Hartsfield-Jackson".to_string(),
            code: "ATL".to_string(),
            city: "Atlanta".to_string(),
            state: "GA".to_string(),
            country: "USA".to_string(),
            chapter_key: None,
        };

        let value = serde_json::to_value(&airport).unwrap();
        assert_eq!(value["code"], serde_json::json!("ATL"));
        assert_eq!(value["chapterKey"], serde_json::Value::Null);
    }

    #[test]
    fn test_reference_info_preserves_order() {
        let json = r#"{"seatClasses": ["economy", "business", "first"], "extras": ["wifi"]}"#;
        let info: ReferenceInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.seat_classes, vec!["economy", "business", "first"]);
        assert_eq!(info.extras, vec!["wifi"]);
    }
}
