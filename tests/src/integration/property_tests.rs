//! # Marshalling Properties
//!
//! - JSON-object payloads survive marshal → job → unmarshal byte for byte
//! - Non-reserved metadata survives the same trip
//! - Reserved-key setters never change a value that is already set
//! - The time-to-live parser is exact for decimals and zero otherwise

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{Map, Value};
    use shared_bus::{message_correlation_id, set_correlation_id, Message};
    use zeebe_bridge::{
        message_name, parse_time_to_live, set_message_name, set_time_to_live, time_to_live,
        DefaultMarshaller, Job, Marshaller, Unmarshaller, ZeebeMessage, MESSAGE_NAME_METADATA_KEY,
        TIME_TO_LIVE_METADATA_KEY,
    };

    /// The job an engine would activate after correlating `marshaled`.
    fn correlated_job(marshaled: &ZeebeMessage) -> Job {
        let mut headers = Map::new();
        headers.insert(
            MESSAGE_NAME_METADATA_KEY.to_string(),
            Value::String(marshaled.name.clone()),
        );
        headers.insert(
            TIME_TO_LIVE_METADATA_KEY.to_string(),
            Value::String(marshaled.time_to_live.to_string()),
        );
        Job {
            key: rand::random::<u32>().into(),
            job_type: "svc".to_string(),
            custom_headers: Value::Object(headers).to_string(),
            retries: 3,
            variables: marshaled.variables.clone(),
            ..Job::default()
        }
    }

    fn json_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::String),
            Just(Value::Null),
        ]
    }

    fn json_object() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-z]{1,8}", json_scalar(), 0..8)
            .prop_map(|entries| Value::Object(entries.into_iter().collect()))
    }

    // Reserved keys contain an underscore, so these never collide with them.
    fn user_metadata() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::btree_map("[a-z]{1,10}", "[ -~]{0,20}", 0..6)
            .prop_map(|entries| entries.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_payload_and_metadata_round_trip(
            payload in json_object(),
            metadata in user_metadata(),
            ttl in 0i64..10_000_000,
        ) {
            let bytes = serde_json::to_vec(&payload).expect("encode payload");
            let mut msg = Message::with_new_uuid(bytes.clone())
                .with_metadata(MESSAGE_NAME_METADATA_KEY, "prop");
            set_time_to_live(ttl, &mut msg);
            for (key, value) in &metadata {
                msg.metadata.set(key.clone(), value.clone());
            }

            let marshaled = DefaultMarshaller.marshal("t", &msg).expect("marshal");
            let restored = DefaultMarshaller
                .unmarshal(&correlated_job(&marshaled))
                .expect("unmarshal")
                .expect("message");

            prop_assert_eq!(&restored.payload, &bytes);
            prop_assert_eq!(message_name(&restored), "prop");
            prop_assert_eq!(time_to_live(&restored), ttl);
            for (key, value) in &metadata {
                prop_assert_eq!(restored.metadata.get(key), value.as_str());
            }
        }

        #[test]
        fn prop_setters_never_overwrite(
            first in "[a-z]{1,12}",
            second in "[a-z]{1,12}",
            ttl in 1i64..i64::MAX,
            other_ttl in any::<i64>(),
        ) {
            let mut msg = Message::with_new_uuid(Vec::new());

            set_message_name(&first, &mut msg);
            set_message_name(&second, &mut msg);
            prop_assert_eq!(message_name(&msg), first.as_str());

            set_correlation_id(&first, &mut msg);
            set_correlation_id(&second, &mut msg);
            prop_assert_eq!(message_correlation_id(&msg), first.as_str());

            set_time_to_live(ttl, &mut msg);
            set_time_to_live(other_ttl, &mut msg);
            prop_assert_eq!(time_to_live(&msg), ttl);
        }

        #[test]
        fn prop_ttl_parser_exact_for_decimals(ttl in any::<i64>()) {
            prop_assert_eq!(parse_time_to_live(&ttl.to_string()), ttl);
        }

        #[test]
        fn prop_ttl_parser_zero_for_non_numeric(text in "[a-zA-Z ]{0,12}") {
            prop_assert_eq!(parse_time_to_live(&text), 0);
        }
    }
}
