//! Canonical barcode format tags and the allowed-formats filter

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownFormatTag;
use crate::normalizer;

/// Canonical symbology identifier shared by every platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatTag {
    #[serde(rename = "QR_CODE")]
    QrCode,
    #[serde(rename = "EAN_8")]
    Ean8,
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "CODE_39")]
    Code39,
    #[serde(rename = "CODE_93")]
    Code93,
    #[serde(rename = "CODE_128")]
    Code128,
    #[serde(rename = "CODABAR")]
    Codabar,
    #[serde(rename = "ITF")]
    Itf,
    #[serde(rename = "UPC_A")]
    UpcA,
    #[serde(rename = "UPC_E")]
    UpcE,
    #[serde(rename = "DATA_MATRIX")]
    DataMatrix,
    #[serde(rename = "AZTEC")]
    Aztec,
    #[serde(rename = "PDF_417")]
    Pdf417,
    /// Vendor format with no canonical counterpart
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl FormatTag {
    /// Every tag a scanner can report, in display order
    pub const SUPPORTED: [FormatTag; 13] = [
        FormatTag::QrCode,
        FormatTag::Ean8,
        FormatTag::Ean13,
        FormatTag::Code39,
        FormatTag::Code93,
        FormatTag::Code128,
        FormatTag::Codabar,
        FormatTag::Itf,
        FormatTag::UpcA,
        FormatTag::UpcE,
        FormatTag::DataMatrix,
        FormatTag::Aztec,
        FormatTag::Pdf417,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::QrCode => "QR_CODE",
            FormatTag::Ean8 => "EAN_8",
            FormatTag::Ean13 => "EAN_13",
            FormatTag::Code39 => "CODE_39",
            FormatTag::Code93 => "CODE_93",
            FormatTag::Code128 => "CODE_128",
            FormatTag::Codabar => "CODABAR",
            FormatTag::Itf => "ITF",
            FormatTag::UpcA => "UPC_A",
            FormatTag::UpcE => "UPC_E",
            FormatTag::DataMatrix => "DATA_MATRIX",
            FormatTag::Aztec => "AZTEC",
            FormatTag::Pdf417 => "PDF_417",
            FormatTag::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = UnknownFormatTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "UNKNOWN" {
            return Ok(FormatTag::Unknown);
        }
        FormatTag::SUPPORTED
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownFormatTag(s.to_string()))
    }
}

/// Allowed-formats filter for a scan
///
/// An empty name list means "accept all". A non-empty list restricts to the
/// recognised tags in it, so a list made only of unrecognised names accepts
/// nothing. That last case keeps the names it was built from, so it encodes
/// back to a list that reads as the same filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum FormatFilter {
    #[default]
    Any,
    /// Non-empty set of accepted tags
    Only(BTreeSet<FormatTag>),
    /// Names were listed but none is a known format
    Unmatched(Vec<String>),
}

impl FormatFilter {
    /// Restrict to the given tags; no tags means accept all
    pub fn only(tags: impl IntoIterator<Item = FormatTag>) -> Self {
        let tags: BTreeSet<_> = tags.into_iter().collect();
        if tags.is_empty() {
            Self::Any
        } else {
            Self::Only(tags)
        }
    }

    /// Build a filter from host-supplied format names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut listed = Vec::new();
        let mut tags = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            match name.parse::<FormatTag>() {
                Ok(tag) => {
                    tags.insert(tag);
                }
                Err(e) => tracing::debug!(%e, "Ignoring unrecognised format in filter"),
            }
            listed.push(name.to_string());
        }

        match (listed.is_empty(), tags.is_empty()) {
            (true, _) => Self::Any,
            (false, true) => Self::Unmatched(listed),
            (false, false) => Self::Only(tags),
        }
    }

    pub fn allows(&self, tag: FormatTag) -> bool {
        match self {
            FormatFilter::Any => true,
            FormatFilter::Only(tags) => tags.contains(&tag),
            FormatFilter::Unmatched(_) => false,
        }
    }

    /// Vision symbologies to configure a detection request with
    ///
    /// Empty means "leave the request's default symbologies"; detections are
    /// still checked against [`FormatFilter::allows`].
    pub fn vision_symbologies(&self) -> Vec<&'static str> {
        match self {
            FormatFilter::Any | FormatFilter::Unmatched(_) => vec![],
            FormatFilter::Only(tags) => tags
                .iter()
                .filter_map(|tag| normalizer::vision_symbology(*tag))
                .collect(),
        }
    }
}

impl From<Vec<String>> for FormatFilter {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<FormatFilter> for Vec<String> {
    fn from(filter: FormatFilter) -> Self {
        match filter {
            FormatFilter::Any => vec![],
            FormatFilter::Only(tags) => tags.iter().map(|t| t.as_str().to_string()).collect(),
            FormatFilter::Unmatched(names) => names,
        }
    }
}
