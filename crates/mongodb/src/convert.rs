//! [`SubscriberDocument`] to BSON conversion.

use crate::error::MongoTargetError;
use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document};
use chrono::NaiveTime;
use sync_core::{SourceValue, SubscriberDocument};

/// Convert a source value to BSON.
///
/// Decimals and UUIDs are stored as strings; dates become midnight UTC.
pub fn source_value_to_bson(value: &SourceValue) -> Result<Bson, bson::ser::Error> {
    let bson = match value {
        SourceValue::Null => Bson::Null,
        SourceValue::Bool(b) => Bson::Boolean(*b),
        SourceValue::Int32(i) => Bson::Int32(*i),
        SourceValue::Int64(i) => Bson::Int64(*i),
        SourceValue::Float64(f) => Bson::Double(*f),
        SourceValue::Decimal(s) | SourceValue::Text(s) => Bson::String(s.clone()),
        SourceValue::Timestamp(ts) => Bson::DateTime(bson::DateTime::from_chrono(*ts)),
        SourceValue::Date(date) => Bson::DateTime(bson::DateTime::from_chrono(
            date.and_time(NaiveTime::MIN).and_utc(),
        )),
        SourceValue::Uuid(u) => Bson::String(u.to_string()),
        SourceValue::Json(json) => bson::to_bson(json)?,
        SourceValue::Bytes(bytes) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: bytes.clone(),
        }),
    };
    Ok(bson)
}

/// Build the BSON document written for one subscriber.
///
/// Field order is `id, msisdn, name, gender, address, age`.
pub fn subscriber_to_document(document: &SubscriberDocument) -> Result<Document, MongoTargetError> {
    let mut doc = Document::new();
    doc.insert("id", document.id.as_str());

    for (field, value) in document.fields() {
        let bson = source_value_to_bson(value)
            .map_err(|source| MongoTargetError::Encode { field, source })?;
        doc.insert(field, bson);
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use sync_core::{transform_row, IdStrategy, SourceRow};

    #[test]
    fn test_subscriber_to_document() {
        let row = SourceRow::new(vec![
            "15551234567".into(),
            "Jane Doe".into(),
            "F".into(),
            "123 Main St".into(),
            29.into(),
        ]);
        let subscriber = transform_row(&row, IdStrategy::Short).unwrap();

        let doc = subscriber_to_document(&subscriber).unwrap();

        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "msisdn", "name", "gender", "address", "age"]);
        assert_eq!(doc.get_str("id").unwrap(), subscriber.id);
        assert_eq!(doc.get_str("msisdn").unwrap(), "15551234567");
        assert_eq!(doc.get_str("name").unwrap(), "Jane Doe");
        assert_eq!(doc.get_str("gender").unwrap(), "F");
        assert_eq!(doc.get_str("address").unwrap(), "123 Main St");
        assert_eq!(doc.get_i32("age").unwrap(), 29);
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(source_value_to_bson(&SourceValue::Null).unwrap(), Bson::Null);
        assert_eq!(
            source_value_to_bson(&SourceValue::Int64(15551234567)).unwrap(),
            Bson::Int64(15551234567)
        );
        assert_eq!(
            source_value_to_bson(&SourceValue::Decimal("29.50".into())).unwrap(),
            Bson::String("29.50".into())
        );

        let date = NaiveDate::from_ymd_opt(1995, 4, 12).unwrap();
        let expected = Utc.with_ymd_and_hms(1995, 4, 12, 0, 0, 0).unwrap();
        assert_eq!(
            source_value_to_bson(&SourceValue::Date(date)).unwrap(),
            Bson::DateTime(bson::DateTime::from_chrono(expected))
        );

        match source_value_to_bson(&SourceValue::Bytes(vec![1, 2, 3])).unwrap() {
            Bson::Binary(binary) => assert_eq!(binary.bytes, vec![1, 2, 3]),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"plan": "prepaid", "lines": [1, 2]});
        let bson = source_value_to_bson(&SourceValue::Json(json)).unwrap();

        let doc = bson.as_document().unwrap();
        assert_eq!(doc.get_str("plan").unwrap(), "prepaid");
        assert_eq!(doc.get_array("lines").unwrap().len(), 2);
    }
}
