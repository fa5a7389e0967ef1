//! Catalogue enumerations shared by the submission form and published records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Research domain a publication is filed under.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Domain {
    #[default]
    #[serde(rename = "Sciences")]
    Sciences,
    #[serde(rename = "Droit")]
    Law,
    #[serde(rename = "Médecine")]
    Medicine,
    #[serde(rename = "Économie")]
    Economics,
    #[serde(rename = "Lettres")]
    Humanities,
    #[serde(rename = "Ingénierie")]
    Engineering,
    #[serde(rename = "Éducation")]
    Education,
    #[serde(rename = "Agronomie")]
    Agriculture,
    #[serde(rename = "Autre")]
    Other,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Sciences,
        Domain::Law,
        Domain::Medicine,
        Domain::Economics,
        Domain::Humanities,
        Domain::Engineering,
        Domain::Education,
        Domain::Agriculture,
        Domain::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Domain::Sciences => "Sciences",
            Domain::Law => "Droit",
            Domain::Medicine => "Médecine",
            Domain::Economics => "Économie",
            Domain::Humanities => "Lettres",
            Domain::Engineering => "Ingénierie",
            Domain::Education => "Éducation",
            Domain::Agriculture => "Agronomie",
            Domain::Other => "Autre",
        }
    }

    /// Resolves a catalogue label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let needle = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|domain| domain.label().to_lowercase() == needle)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of document being submitted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DocumentType {
    #[default]
    #[serde(rename = "Article")]
    Article,
    #[serde(rename = "Thèse")]
    Thesis,
    #[serde(rename = "Mémoire")]
    Dissertation,
    #[serde(rename = "TFC")]
    EndOfCycleWork,
    #[serde(rename = "Livre")]
    Book,
    #[serde(rename = "Rapport")]
    Report,
    #[serde(rename = "Autre")]
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 7] = [
        DocumentType::Article,
        DocumentType::Thesis,
        DocumentType::Dissertation,
        DocumentType::EndOfCycleWork,
        DocumentType::Book,
        DocumentType::Report,
        DocumentType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Article => "Article",
            DocumentType::Thesis => "Thèse",
            DocumentType::Dissertation => "Mémoire",
            DocumentType::EndOfCycleWork => "TFC",
            DocumentType::Book => "Livre",
            DocumentType::Report => "Rapport",
            DocumentType::Other => "Autre",
        }
    }

    /// Academic works carry supervisor/institution metadata.
    pub fn is_academic(self) -> bool {
        matches!(
            self,
            DocumentType::Thesis | DocumentType::Dissertation | DocumentType::EndOfCycleWork
        )
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let needle = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().to_lowercase() == needle)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mobile-money operator used to pay the submission fee.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MobileOperator {
    #[default]
    #[serde(rename = "mpesa")]
    Mpesa,
    #[serde(rename = "airtel")]
    AirtelMoney,
    #[serde(rename = "orange")]
    OrangeMoney,
    #[serde(rename = "afrimoney")]
    Afrimoney,
}

impl fmt::Display for MobileOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MobileOperator::Mpesa => "M-Pesa",
            MobileOperator::AirtelMoney => "Airtel Money",
            MobileOperator::OrangeMoney => "Orange Money",
            MobileOperator::Afrimoney => "Afrimoney",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Currency {
    #[serde(rename = "CDF")]
    Cdf,
    #[default]
    #[serde(rename = "USD")]
    Usd,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Cdf => f.write_str("CDF"),
            Currency::Usd => f.write_str("USD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn academic_set_is_thesis_dissertation_and_tfc() {
        let academic: Vec<_> = DocumentType::ALL
            .into_iter()
            .filter(|kind| kind.is_academic())
            .collect();
        assert_eq!(
            academic,
            vec![
                DocumentType::Thesis,
                DocumentType::Dissertation,
                DocumentType::EndOfCycleWork
            ]
        );
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(DocumentType::from_label(" thèse "), Some(DocumentType::Thesis));
        assert_eq!(Domain::from_label("DROIT"), Some(Domain::Law));
        assert_eq!(DocumentType::from_label("poster"), None);
    }

    #[test]
    fn document_type_serializes_as_catalogue_label() {
        let json = serde_json::to_string(&DocumentType::Thesis).unwrap();
        assert_eq!(json, "\"Thèse\"");
    }
}
