//! Typed views over the JSON blobs produced by structured extraction.
//!
//! Model output drifts: numbers arrive as `"$44,000"`, lists arrive as a single
//! string, and providers add keys nobody asked for. Every known member is an
//! explicit `Option`, parsing is lenient per field, and unknown keys survive in
//! `extra` so a stored blob round-trips without loss.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpStructure {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::items")]
    pub items: Option<Vec<RfpItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::decimal")]
    pub budget: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub delivery_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string_list"
    )]
    pub terms: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RfpStructure {
    /// Looks up a string-valued key the model returned outside the known schema.
    pub fn extra_text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str).filter(|value| !value.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RfpItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<String>,
}

impl RfpItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), quantity: None, specs: None }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(name) if !name.trim().is_empty() => Some(Self::named(name.trim())),
            Value::Object(mut fields) => {
                let name = fields.remove("name").and_then(lenient::value_text)?;
                let quantity = fields.remove("quantity").and_then(|value| match value {
                    Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
                    Value::String(raw) => raw.trim().parse::<u32>().ok(),
                    _ => None,
                });
                let specs = fields.remove("specs").and_then(lenient::value_text);
                Some(Self { name, quantity, specs })
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::decimal")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub delivery_timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub warranty: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string_list"
    )]
    pub pros: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string_list"
    )]
    pub cons: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProposalAnalysis {
    /// An analysis with no members at all means extraction produced nothing usable.
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.delivery_timeline.is_none()
            && self.warranty.is_none()
            && self.pros.is_none()
            && self.cons.is_none()
            && self.extra.is_empty()
    }
}

/// Pulls the first monetary amount out of free text such as `"$44,000 total"`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let token = raw.split_whitespace().find(|token| token.chars().any(|c| c.is_ascii_digit()))?;
    let cleaned: String =
        token.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect();
    let cleaned = cleaned.trim_end_matches('.');
    cleaned.parse::<Decimal>().ok()
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{parse_amount, RfpItem};

    pub(super) fn value_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(value_text(Value::deserialize(deserializer)?))
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            Value::Array(values) => Some(values.into_iter().filter_map(value_text).collect()),
            other => value_text(other).map(|text| vec![text]),
        })
    }

    pub fn items<'de, D>(deserializer: D) -> Result<Option<Vec<RfpItem>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            Value::Array(values) => Some(values.into_iter().filter_map(RfpItem::from_value).collect()),
            other => RfpItem::from_value(other).map(|item| vec![item]),
        })
    }

    pub mod decimal {
        use rust_decimal::prelude::ToPrimitive;
        use rust_decimal::Decimal;
        use serde::{Deserialize, Deserializer, Serializer};
        use serde_json::Value;

        use super::parse_amount;

        pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let Some(amount) = value else {
                return serializer.serialize_none();
            };
            if amount.fract().is_zero() {
                if let Some(whole) = amount.to_i64() {
                    return serializer.serialize_i64(whole);
                }
            }
            match amount.to_f64() {
                Some(float) => serializer.serialize_f64(float),
                None => serializer.serialize_str(&amount.to_string()),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(match Value::deserialize(deserializer)? {
                Value::Number(number) => number
                    .to_string()
                    .parse::<Decimal>()
                    .ok()
                    .or_else(|| number.as_f64().and_then(|float| Decimal::try_from(float).ok())),
                Value::String(raw) => parse_amount(&raw),
                _ => None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{parse_amount, ProposalAnalysis, RfpItem, RfpStructure};

    #[test]
    fn rfp_structure_accepts_model_shaped_json() {
        let structure: RfpStructure = serde_json::from_value(json!({
            "title": "Laptop refresh",
            "items": [{"name": "Laptop", "quantity": 20, "specs": "16GB RAM"}],
            "budget": 50000,
            "deliveryDate": "2026-11-30",
            "terms": ["Net 30", "2yr warranty"],
        }))
        .expect("structure should parse");

        assert_eq!(structure.title.as_deref(), Some("Laptop refresh"));
        assert_eq!(
            structure.items,
            Some(vec![RfpItem {
                name: "Laptop".to_string(),
                quantity: Some(20),
                specs: Some("16GB RAM".to_string()),
            }])
        );
        assert_eq!(structure.budget, Some(Decimal::from(50_000)));
        assert_eq!(structure.delivery_date.as_deref(), Some("2026-11-30"));
        assert!(structure.extra.is_empty());
    }

    #[test]
    fn rfp_structure_tolerates_drift_and_keeps_unknown_keys() {
        let structure: RfpStructure = serde_json::from_value(json!({
            "title": "Chairs",
            "items": ["Office chair", 7, {"name": "Desk", "quantity": "4"}],
            "budget": "$12,500",
            "terms": "Net 45",
            "dueDate": "end of quarter",
        }))
        .expect("structure should parse");

        let items = structure.items.clone().expect("items");
        assert_eq!(items[0], RfpItem::named("Office chair"));
        assert_eq!(items.len(), 2, "non-string non-object entries are dropped");
        assert_eq!(items[1].quantity, Some(4));
        assert_eq!(structure.budget, Some(Decimal::from(12_500)));
        assert_eq!(structure.terms, Some(vec!["Net 45".to_string()]));
        assert_eq!(structure.extra_text("dueDate"), Some("end of quarter"));

        let round_trip = serde_json::to_value(&structure).expect("serialize");
        assert_eq!(round_trip["dueDate"], "end of quarter");
        assert_eq!(round_trip["budget"], 12_500);
    }

    #[test]
    fn proposal_analysis_parses_price_strings() {
        let analysis: ProposalAnalysis = serde_json::from_value(json!({
            "price": "$44,000 total",
            "deliveryTimeline": "14 days",
            "warranty": "2 years",
            "pros": ["Fast delivery"],
            "cons": null,
        }))
        .expect("analysis should parse");

        assert_eq!(analysis.price, Some(Decimal::from(44_000)));
        assert_eq!(analysis.delivery_timeline.as_deref(), Some("14 days"));
        assert_eq!(analysis.cons, None);
        assert!(!analysis.is_empty());
    }

    #[test]
    fn empty_object_is_an_empty_analysis() {
        let analysis: ProposalAnalysis = serde_json::from_value(json!({})).expect("parse");
        assert!(analysis.is_empty());
        assert_eq!(serde_json::to_value(&analysis).expect("serialize"), json!({}));
    }

    #[test]
    fn parse_amount_reads_first_numeric_token() {
        assert_eq!(parse_amount("USD 2,200.50 per unit"), Some(Decimal::new(220_050, 2)));
        assert_eq!(parse_amount("44000."), Some(Decimal::from(44_000)));
        assert_eq!(parse_amount("negotiable"), None);
    }
}
