//! Result normalizer
//!
//! Maps vendor detections ([`RawBarcode`]) into platform-neutral
//! [`ScanDetection`]s: format tags through fixed per-vendor tables, and
//! semantic payload types into a metadata bag whose keys are always present.
//! Stateless and infallible; a missing vendor field becomes a default value.

use serde_json::{json, Map, Value};

use crate::models::{
    BarcodeValue, ContactInfo, DriverLicense, FormatTag, RawBarcode, ScanDetection,
    SymbolDescriptor, VendorFormat,
};

/// ML Kit `Barcode.FORMAT_*` constants
const MLKIT_FORMATS: [(i32, FormatTag); 13] = [
    (1, FormatTag::Code128),
    (2, FormatTag::Code39),
    (4, FormatTag::Code93),
    (8, FormatTag::Codabar),
    (16, FormatTag::DataMatrix),
    (32, FormatTag::Ean13),
    (64, FormatTag::Ean8),
    (128, FormatTag::Itf),
    (256, FormatTag::QrCode),
    (512, FormatTag::UpcA),
    (1024, FormatTag::UpcE),
    (2048, FormatTag::Pdf417),
    (4096, FormatTag::Aztec),
];

/// Vision `VNBarcodeSymbology` raw values
///
/// Vision has no UPC-A symbology (UPC-A is read as EAN-13), so `UPC_A` has no
/// entry.
const VISION_SYMBOLOGIES: [(&str, FormatTag); 12] = [
    ("VNBarcodeSymbologyQR", FormatTag::QrCode),
    ("VNBarcodeSymbologyEAN8", FormatTag::Ean8),
    ("VNBarcodeSymbologyEAN13", FormatTag::Ean13),
    ("VNBarcodeSymbologyCode39", FormatTag::Code39),
    ("VNBarcodeSymbologyCode93", FormatTag::Code93),
    ("VNBarcodeSymbologyCode128", FormatTag::Code128),
    ("VNBarcodeSymbologyCodabar", FormatTag::Codabar),
    ("VNBarcodeSymbologyITF14", FormatTag::Itf),
    ("VNBarcodeSymbologyUPCE", FormatTag::UpcE),
    ("VNBarcodeSymbologyDataMatrix", FormatTag::DataMatrix),
    ("VNBarcodeSymbologyAztec", FormatTag::Aztec),
    ("VNBarcodeSymbologyPDF417", FormatTag::Pdf417),
];

/// Canonical tag for a vendor format value
pub fn format_tag(format: &VendorFormat) -> FormatTag {
    let found = match format {
        VendorFormat::MlKit(code) => MLKIT_FORMATS
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, tag)| *tag),
        VendorFormat::Vision(name) => VISION_SYMBOLOGIES
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tag)| *tag),
    };
    found.unwrap_or(FormatTag::Unknown)
}

/// ML Kit format constant for a canonical tag
pub fn mlkit_format(tag: FormatTag) -> Option<i32> {
    MLKIT_FORMATS
        .iter()
        .find(|(_, t)| *t == tag)
        .map(|(code, _)| *code)
}

/// Vision symbology raw value for a canonical tag
pub fn vision_symbology(tag: FormatTag) -> Option<&'static str> {
    VISION_SYMBOLOGIES
        .iter()
        .find(|(_, t)| *t == tag)
        .map(|(name, _)| *name)
}

/// Convert a vendor detection into a neutral detection
///
/// A missing raw value becomes an empty payload, which the session controller
/// discards. Corner points are kept only when all four are present.
pub fn normalize(raw: &RawBarcode) -> ScanDetection {
    let corner_points = match &raw.corner_points {
        Some(points) if points.len() == 4 => points.clone(),
        _ => Vec::new(),
    };

    ScanDetection {
        payload: raw.raw_value.clone().unwrap_or_default(),
        format: format_tag(&raw.format),
        corner_points,
        metadata: metadata(raw),
    }
}

/// Build the metadata bag for a detection
pub fn metadata(raw: &RawBarcode) -> Map<String, Value> {
    let mut metadata = Map::new();

    if let Some(rect) = &raw.bounding_box {
        metadata.insert(
            "boundingBox".to_string(),
            json!({
                "left": rect.left,
                "top": rect.top,
                "right": rect.right,
                "bottom": rect.bottom,
            }),
        );
    }

    if let Some(confidence) = raw.confidence {
        metadata.insert("confidence".to_string(), json!(confidence));
    }

    if let Some(value) = &raw.value {
        let (key, entry) = value_entry(value);
        metadata.insert(key.to_string(), entry);
    }

    if let Some(descriptor) = &raw.descriptor {
        let (key, entry) = descriptor_entry(descriptor);
        metadata.insert(key.to_string(), entry);
    }

    metadata
}

fn text(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

fn value_entry(value: &BarcodeValue) -> (&'static str, Value) {
    match value {
        BarcodeValue::Url { title, url } => (
            "url",
            json!({
                "title": text(title),
                "url": text(url),
            }),
        ),
        BarcodeValue::Email {
            address,
            subject,
            body,
        } => (
            "email",
            json!({
                "address": text(address),
                "subject": text(subject),
                "body": text(body),
            }),
        ),
        BarcodeValue::Phone { number, phone_type } => (
            "phone",
            json!({
                "number": text(number),
                "type": phone_type,
            }),
        ),
        BarcodeValue::Sms {
            phone_number,
            message,
        } => (
            "sms",
            json!({
                "phoneNumber": text(phone_number),
                "message": text(message),
            }),
        ),
        BarcodeValue::Wifi {
            ssid,
            password,
            encryption_type,
        } => (
            "wifi",
            json!({
                "ssid": text(ssid),
                "password": text(password),
                "encryptionType": encryption_type,
            }),
        ),
        BarcodeValue::Geo { lat, lng } => (
            "geoPoint",
            json!({
                "latitude": lat,
                "longitude": lng,
            }),
        ),
        BarcodeValue::ContactInfo(contact) => ("contactInfo", contact_entry(contact)),
        BarcodeValue::CalendarEvent {
            summary,
            description,
            location,
            organizer,
            status,
            start,
            end,
        } => (
            "calendarEvent",
            json!({
                "summary": text(summary),
                "description": text(description),
                "location": text(location),
                "organizer": text(organizer),
                "status": text(status),
                "start": text(start),
                "end": text(end),
            }),
        ),
        BarcodeValue::DriverLicense(license) => ("driverLicense", license_entry(license)),
    }
}

fn contact_entry(contact: &ContactInfo) -> Value {
    let name = contact.name.clone().unwrap_or_default();
    json!({
        "name": {
            "first": text(&name.first),
            "last": text(&name.last),
            "middle": text(&name.middle),
            "prefix": text(&name.prefix),
            "suffix": text(&name.suffix),
            "formattedName": text(&name.formatted_name),
        },
        "organization": text(&contact.organization),
        "title": text(&contact.title),
        "phones": contact.phones.iter().map(|p| json!({
            "number": text(&p.number),
            "type": p.phone_type,
        })).collect::<Vec<_>>(),
        "emails": contact.emails.iter().map(|e| json!({
            "address": text(&e.address),
            "type": e.email_type,
        })).collect::<Vec<_>>(),
        "urls": contact.urls,
        "addresses": contact.addresses.iter().map(|a| json!({
            "addressLines": a.address_lines,
            "type": a.address_type,
        })).collect::<Vec<_>>(),
    })
}

fn license_entry(license: &DriverLicense) -> Value {
    json!({
        "documentType": text(&license.document_type),
        "firstName": text(&license.first_name),
        "middleName": text(&license.middle_name),
        "lastName": text(&license.last_name),
        "gender": text(&license.gender),
        "addressStreet": text(&license.address_street),
        "addressCity": text(&license.address_city),
        "addressState": text(&license.address_state),
        "addressZip": text(&license.address_zip),
        "licenseNumber": text(&license.license_number),
        "issueDate": text(&license.issue_date),
        "expiryDate": text(&license.expiry_date),
        "birthDate": text(&license.birth_date),
        "issuingCountry": text(&license.issuing_country),
    })
}

fn descriptor_entry(descriptor: &SymbolDescriptor) -> (&'static str, Value) {
    match descriptor {
        SymbolDescriptor::QrCode {
            error_correction_level,
            symbol_version,
            mask_pattern,
        } => (
            "qrCode",
            json!({
                "errorCorrectionLevel": error_correction_level,
                "symbolVersion": symbol_version,
                "maskPattern": mask_pattern,
            }),
        ),
        SymbolDescriptor::Aztec {
            is_compact,
            layer_count,
            data_codeword_count,
        } => (
            "aztecCode",
            json!({
                "isCompact": is_compact,
                "layerCount": layer_count,
                "dataCodewordCount": data_codeword_count,
            }),
        ),
        SymbolDescriptor::Pdf417 {
            is_compact,
            row_count,
            column_count,
        } => (
            "pdf417",
            json!({
                "isCompact": is_compact,
                "rowCount": row_count,
                "columnCount": column_count,
            }),
        ),
        SymbolDescriptor::DataMatrix {
            row_count,
            column_count,
            ecc_version,
        } => (
            "dataMatrix",
            json!({
                "rowCount": row_count,
                "columnCount": column_count,
                "eccVersion": ecc_version,
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, ContactPhone, PersonName, ScanPoint};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(256, FormatTag::QrCode)]
    #[case(64, FormatTag::Ean8)]
    #[case(32, FormatTag::Ean13)]
    #[case(2, FormatTag::Code39)]
    #[case(4, FormatTag::Code93)]
    #[case(1, FormatTag::Code128)]
    #[case(8, FormatTag::Codabar)]
    #[case(128, FormatTag::Itf)]
    #[case(512, FormatTag::UpcA)]
    #[case(1024, FormatTag::UpcE)]
    #[case(16, FormatTag::DataMatrix)]
    #[case(4096, FormatTag::Aztec)]
    #[case(2048, FormatTag::Pdf417)]
    #[case(-1, FormatTag::Unknown)]
    #[case(0, FormatTag::Unknown)]
    fn test_mlkit_format_table(#[case] code: i32, #[case] expected: FormatTag) {
        assert_eq!(format_tag(&VendorFormat::MlKit(code)), expected);
        if expected != FormatTag::Unknown {
            assert_eq!(mlkit_format(expected), Some(code));
        }
    }

    #[rstest]
    #[case("VNBarcodeSymbologyQR", FormatTag::QrCode)]
    #[case("VNBarcodeSymbologyITF14", FormatTag::Itf)]
    #[case("VNBarcodeSymbologyUPCE", FormatTag::UpcE)]
    #[case("VNBarcodeSymbologyPDF417", FormatTag::Pdf417)]
    #[case("VNBarcodeSymbologyI2of5", FormatTag::Unknown)]
    fn test_vision_format_table(#[case] name: &str, #[case] expected: FormatTag) {
        assert_eq!(format_tag(&VendorFormat::Vision(name.to_string())), expected);
    }

    #[test]
    fn test_every_supported_tag_has_mlkit_code() {
        for tag in FormatTag::SUPPORTED {
            let code = mlkit_format(tag).unwrap();
            assert_eq!(format_tag(&VendorFormat::MlKit(code)), tag);
        }
        assert_eq!(mlkit_format(FormatTag::Unknown), None);
        assert_eq!(vision_symbology(FormatTag::UpcA), None);
    }

    #[test]
    fn test_normalize_basic_fields() {
        let raw = RawBarcode::new("https://example.com", VendorFormat::MlKit(256))
            .with_corners([(1.0, 2.0), (10.0, 2.0), (10.0, 12.0), (1.0, 12.0)]);

        let detection = normalize(&raw);
        assert_eq!(detection.payload, "https://example.com");
        assert_eq!(detection.format, FormatTag::QrCode);
        assert_eq!(detection.corner_points.len(), 4);
        assert_eq!(detection.corner_points[2], ScanPoint::new(10.0, 12.0));
        assert!(detection.metadata.is_empty());
    }

    #[test]
    fn test_missing_raw_value_is_empty_payload() {
        let mut raw = RawBarcode::new("", VendorFormat::MlKit(256));
        raw.raw_value = None;
        assert_eq!(normalize(&raw).payload, "");
    }

    #[test]
    fn test_partial_corners_dropped() {
        let mut raw = RawBarcode::new("x", VendorFormat::MlKit(1));
        raw.corner_points = Some(vec![ScanPoint::new(0.0, 0.0), ScanPoint::new(1.0, 1.0)]);
        assert!(normalize(&raw).corner_points.is_empty());
    }

    #[test]
    fn test_wifi_metadata_defaults_missing_fields() {
        let raw = RawBarcode::new("WIFI:S:home;;", VendorFormat::MlKit(256)).with_value(
            BarcodeValue::Wifi {
                ssid: Some("home".to_string()),
                password: None,
                encryption_type: 2,
            },
        );

        let metadata = metadata(&raw);
        assert_eq!(
            Value::Object(metadata),
            json!({
                "wifi": {
                    "ssid": "home",
                    "password": "",
                    "encryptionType": 2
                }
            })
        );
    }

    #[test]
    fn test_contact_metadata_keys_present() {
        let raw = RawBarcode::new("BEGIN:VCARD", VendorFormat::MlKit(256)).with_value(
            BarcodeValue::ContactInfo(ContactInfo {
                name: Some(PersonName {
                    first: Some("Ada".to_string()),
                    ..Default::default()
                }),
                phones: vec![ContactPhone {
                    number: None,
                    phone_type: 1,
                }],
                ..Default::default()
            }),
        );

        let metadata = metadata(&raw);
        let contact = &metadata["contactInfo"];
        assert_eq!(contact["name"]["first"], "Ada");
        assert_eq!(contact["name"]["formattedName"], "");
        assert_eq!(contact["organization"], "");
        assert_eq!(contact["phones"], json!([{ "number": "", "type": 1 }]));
        assert_eq!(contact["urls"], json!([]));
    }

    #[test]
    fn test_driver_license_has_all_keys() {
        let raw = RawBarcode::new("ANSI ", VendorFormat::MlKit(2048))
            .with_value(BarcodeValue::DriverLicense(DriverLicense::default()));
        let metadata = metadata(&raw);
        let license = metadata["driverLicense"].as_object().unwrap();
        assert_eq!(license.len(), 14);
        assert!(license.values().all(|v| v == ""));
    }

    #[test]
    fn test_geo_and_bounding_box() {
        let raw = RawBarcode::new("geo:1,2", VendorFormat::MlKit(256))
            .with_value(BarcodeValue::Geo { lat: 1.5, lng: -2.25 })
            .with_bounding_box(BoundingBox {
                left: 0.0,
                top: 1.0,
                right: 20.0,
                bottom: 21.0,
            });

        let metadata = metadata(&raw);
        assert_eq!(metadata["geoPoint"], json!({ "latitude": 1.5, "longitude": -2.25 }));
        assert_eq!(metadata["boundingBox"]["right"], json!(20.0));
    }

    #[test]
    fn test_vision_descriptor_and_confidence() {
        let raw = RawBarcode::new("hello", VendorFormat::Vision("VNBarcodeSymbologyQR".into()))
            .with_confidence(1.0)
            .with_descriptor(SymbolDescriptor::QrCode {
                error_correction_level: "M".to_string(),
                symbol_version: 2,
                mask_pattern: 5,
            });

        let metadata = metadata(&raw);
        assert_eq!(metadata["confidence"], json!(1.0));
        assert_eq!(
            metadata["qrCode"],
            json!({ "errorCorrectionLevel": "M", "symbolVersion": 2, "maskPattern": 5 })
        );
    }
}
