use serde::{Deserialize, Deserializer, Serialize};
use surebet_instrument::{BookmakerId, EventId, MarketId, OutcomeName};

/// Event payload published by a bookmaker adapter, carrying every market it quotes.
///
/// ### Payload Example
/// ```json
/// {
///   "id": "soccer-rma-fcb-20250301",
///   "name": "Real Madrid vs Barcelona",
///   "sport": "soccer",
///   "status": "live",
///   "start_time": "2025-03-01T20:00:00",
///   "bookmaker": "pinnacle",
///   "markets": [
///     {
///       "type": "1X2",
///       "name": "Full Time Result",
///       "selections": [
///         {"name": "Real Madrid", "odds": 2.10},
///         {"name": "Draw", "odds": "3.40"},
///         {"name": "Barcelona", "odds": 4.20}
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct BookmakerEvent {
    /// Canonical event id, already normalised across bookmakers upstream.
    pub id: EventId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub status: Option<EventStatus>,
    /// Kick-off as published. Informational only.
    #[serde(default)]
    pub start_time: Option<String>,
    pub bookmaker: BookmakerId,
    #[serde(default)]
    pub markets: Vec<BookmakerMarket>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Live,
    Upcoming,
    #[serde(other)]
    Unknown,
}

/// One market of a [`BookmakerEvent`].
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct BookmakerMarket {
    /// Market type, used as the canonical market id (eg/ "1X2", "OU", "DC").
    #[serde(rename = "type")]
    pub kind: MarketId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub selections: Vec<BookmakerSelection>,
}

/// One priced outcome of a [`BookmakerMarket`].
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct BookmakerSelection {
    pub name: OutcomeName,
    /// Decimal odds (bookmakers send either a number or a numeric string).
    #[serde(deserialize_with = "de_string_or_f64")]
    pub odds: f64,
}

fn de_string_or_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct StringOrF64Visitor;

    impl de::Visitor<'_> for StringOrF64Visitor {
        type Value = f64;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a number or a string containing a number")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v as f64)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim().parse::<f64>().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(StringOrF64Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_bookmaker_event() {
        let input = r#"
        {
            "id": "soccer-rma-fcb",
            "name": "Real Madrid vs Barcelona",
            "sport": "soccer",
            "status": "live",
            "start_time": "2025-03-01T20:00:00",
            "bookmaker": "pinnacle",
            "markets": [
                {
                    "type": "1X2",
                    "name": "Full Time Result",
                    "selections": [
                        {"name": "Real Madrid", "odds": 2.10},
                        {"name": "Draw", "odds": "3.40"},
                        {"name": "Barcelona", "odds": 4}
                    ]
                }
            ]
        }
        "#;

        let event: BookmakerEvent = serde_json::from_str(input).unwrap();
        assert_eq!(event.id.as_str(), "soccer-rma-fcb");
        assert_eq!(event.bookmaker.as_str(), "pinnacle");
        assert_eq!(event.status, Some(EventStatus::Live));
        assert_eq!(event.markets.len(), 1);

        let market = &event.markets[0];
        assert_eq!(market.kind.as_str(), "1X2");
        assert_eq!(market.selections[0].odds, 2.10);
        assert_eq!(market.selections[1].odds, 3.40);
        assert_eq!(market.selections[2].odds, 4.0);
    }

    #[test]
    fn test_de_minimal_event_and_unknown_status() {
        let input = r#"{"id": "e1", "bookmaker": "bet365", "status": "suspended"}"#;
        let event: BookmakerEvent = serde_json::from_str(input).unwrap();
        assert_eq!(event.status, Some(EventStatus::Unknown));
        assert!(event.markets.is_empty());
    }

    #[test]
    fn test_de_odds_rejects_garbage_string() {
        let input = r#"{"name": "Draw", "odds": "evens"}"#;
        assert!(serde_json::from_str::<BookmakerSelection>(input).is_err());
    }
}
