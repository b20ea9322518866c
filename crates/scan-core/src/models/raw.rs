//! Vendor-side detection model
//!
//! Platform adapters fill a [`RawBarcode`] from the native detection object
//! (ML Kit `Barcode`, Vision `VNBarcodeObservation`) and hand it to the core.
//! Optional vendor fields stay optional here; defaulting happens in the
//! normalizer.

use serde::{Deserialize, Serialize};

use super::ScanPoint;

/// Native format value in one of the two vendor enum spaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "vendor", content = "value", rename_all = "snake_case")]
pub enum VendorFormat {
    /// ML Kit `Barcode.FORMAT_*` constant
    MlKit(i32),
    /// Vision `VNBarcodeSymbology` raw value (e.g. "VNBarcodeSymbologyQR")
    Vision(String),
}

/// Axis-aligned box around a detection, in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// One decoded code as reported by a vendor decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBarcode {
    #[serde(default)]
    pub raw_value: Option<String>,
    pub format: VendorFormat,
    /// Corners in TL, TR, BR, BL order
    #[serde(default)]
    pub corner_points: Option<Vec<ScanPoint>>,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Vendor's semantic classification of the payload
    #[serde(default)]
    pub value: Option<BarcodeValue>,
    #[serde(default)]
    pub descriptor: Option<SymbolDescriptor>,
}

impl RawBarcode {
    pub fn new(raw_value: impl Into<String>, format: VendorFormat) -> Self {
        Self {
            raw_value: Some(raw_value.into()),
            format,
            corner_points: None,
            bounding_box: None,
            confidence: None,
            value: None,
            descriptor: None,
        }
    }

    pub fn with_corners(mut self, corners: [(f64, f64); 4]) -> Self {
        self.corner_points = Some(corners.iter().map(|&(x, y)| ScanPoint { x, y }).collect());
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_value(mut self, value: BarcodeValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_descriptor(mut self, descriptor: SymbolDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Structured payload content, one variant per vendor value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeValue {
    Url {
        title: Option<String>,
        url: Option<String>,
    },
    Email {
        address: Option<String>,
        subject: Option<String>,
        body: Option<String>,
    },
    Phone {
        number: Option<String>,
        #[serde(default)]
        phone_type: i32,
    },
    Sms {
        phone_number: Option<String>,
        message: Option<String>,
    },
    Wifi {
        ssid: Option<String>,
        password: Option<String>,
        #[serde(default)]
        encryption_type: i32,
    },
    Geo {
        lat: f64,
        lng: f64,
    },
    ContactInfo(ContactInfo),
    CalendarEvent {
        summary: Option<String>,
        description: Option<String>,
        location: Option<String>,
        organizer: Option<String>,
        status: Option<String>,
        start: Option<String>,
        end: Option<String>,
    },
    DriverLicense(DriverLicense),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonName {
    pub first: Option<String>,
    pub last: Option<String>,
    pub middle: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub formatted_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPhone {
    pub number: Option<String>,
    #[serde(default)]
    pub phone_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactEmail {
    pub address: Option<String>,
    #[serde(default)]
    pub email_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub address_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<PersonName>,
    pub organization: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub phones: Vec<ContactPhone>,
    #[serde(default)]
    pub emails: Vec<ContactEmail>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<PostalAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverLicense {
    pub document_type: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<String>,
    pub license_number: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub birth_date: Option<String>,
    pub issuing_country: Option<String>,
}

/// Symbol-level details Vision reports through `barcodeDescriptor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolDescriptor {
    QrCode {
        error_correction_level: String,
        symbol_version: i32,
        mask_pattern: i32,
    },
    Aztec {
        is_compact: bool,
        layer_count: i32,
        data_codeword_count: i32,
    },
    Pdf417 {
        is_compact: bool,
        row_count: i32,
        column_count: i32,
    },
    DataMatrix {
        row_count: i32,
        column_count: i32,
        ecc_version: i32,
    },
}
