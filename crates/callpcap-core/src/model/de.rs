use std::fmt::Display;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::{CaptureMessage, RtpFlow, SipMessage, StreamRecord};

const KIND_FIELDS: [&str; 2] = ["kind", "type"];

/// Integer that the backend may send either as a JSON number or as a decimal
/// string. `null` reads as 0, the "unset" value.
pub(super) fn flexible_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<u64> + Default,
    <T as FromStr>::Err: Display,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged, expecting = "an integer, a decimal string or null")]
    enum Raw {
        Int(u64),
        Text(String),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Null => Ok(T::default()),
        Raw::Int(value) => T::try_from(value)
            .map_err(|_| de::Error::custom(format!("integer {value} out of range"))),
        Raw::Text(text) => text.trim().parse::<T>().map_err(de::Error::custom),
    }
}

/// Decode the message list, keeping the shapes the encoder can frame.
///
/// Unknown kinds are dropped; a known kind with a broken body fails the
/// whole document.
pub(super) fn supported_messages<'de, D>(deserializer: D) -> Result<Vec<CaptureMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let mut messages = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        if let Some(message) = classify(index, value).map_err(de::Error::custom)? {
            messages.push(message);
        }
    }
    Ok(messages)
}

fn classify(index: usize, value: Value) -> Result<Option<CaptureMessage>, serde_json::Error> {
    if value.get("stream").is_some() && value.get("values").is_some() {
        return StreamRecord::deserialize(value).map(|record| Some(record.into()));
    }

    let kind = KIND_FIELDS
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_owned);
    match kind.as_deref() {
        Some("sip") => SipMessage::deserialize(value).map(|sip| Some(sip.into())),
        Some("rtp_flow") => RtpFlow::deserialize(value).map(|flow| Some(flow.into())),
        other => {
            debug!(
                index,
                kind = other.unwrap_or("<none>"),
                "dropping message without a capture framing"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::flexible_number;

    #[derive(Debug, Deserialize)]
    struct Port {
        #[serde(deserialize_with = "flexible_number")]
        value: u16,
    }

    #[test]
    fn number_and_string_forms() {
        let a: Port = serde_json::from_str(r#"{"value": 5060}"#).unwrap();
        let b: Port = serde_json::from_str(r#"{"value": " 5060 "}"#).unwrap();
        assert_eq!(a.value, b.value);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = serde_json::from_str::<Port>(r#"{"value": 70000}"#).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(serde_json::from_str::<Port>(r#"{"value": "-1"}"#).is_err());
    }

    #[test]
    fn null_reads_as_unset() {
        let port: Port = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(port.value, 0);
    }

    #[test]
    fn wrong_type_names_the_accepted_forms() {
        let err = serde_json::from_str::<Port>(r#"{"value": [5060]}"#).unwrap_err();
        assert!(
            err.to_string()
                .contains("an integer, a decimal string or null"),
            "{err}"
        );
    }
}
