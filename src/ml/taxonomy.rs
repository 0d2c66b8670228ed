//! Class Taxonomy
//!
//! Fixed, ordered list of diagnostic classes. The order is the order of the
//! model's output layer and must never change independently of the artifact.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::constants::NUM_CLASSES;

/// Diagnostic class code, in output-layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassCode {
    Ecz,
    Mel,
    Atd,
    Bcc,
    Nv,
    Bkl,
    Plp,
    Skb,
    Trf,
    Wmv,
}

/// All class codes, indexed by model output position
pub const CLASS_CODES: [ClassCode; NUM_CLASSES] = [
    ClassCode::Ecz,
    ClassCode::Mel,
    ClassCode::Atd,
    ClassCode::Bcc,
    ClassCode::Nv,
    ClassCode::Bkl,
    ClassCode::Plp,
    ClassCode::Skb,
    ClassCode::Trf,
    ClassCode::Wmv,
];

/// Treatment suggestions split by patient age group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medicines {
    pub child: &'static str,
    pub adult: &'static str,
}

/// Static medical-reference record attached to a prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicalReference {
    pub causes: &'static str,
    pub medicines: Medicines,
    pub plan: &'static str,
}

/// Returned for codes outside the taxonomy
pub static FALLBACK_REFERENCE: MedicalReference = MedicalReference {
    causes: "Unknown",
    medicines: Medicines {
        child: "Consult doctor",
        adult: "Consult doctor",
    },
    plan: "Consult doctor",
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown class code: {0}")]
pub struct UnknownClassCode(pub String);

/// Ordered class codes
pub fn codes() -> &'static [ClassCode; NUM_CLASSES] {
    &CLASS_CODES
}

/// Reference record for a raw code string, falling back to a generic
/// "consult a professional" record when the code is not recognized
pub fn reference_info(code: &str) -> &'static MedicalReference {
    code.parse::<ClassCode>()
        .map(ClassCode::reference)
        .unwrap_or(&FALLBACK_REFERENCE)
}

impl ClassCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassCode::Ecz => "ECZ",
            ClassCode::Mel => "MEL",
            ClassCode::Atd => "ATD",
            ClassCode::Bcc => "BCC",
            ClassCode::Nv => "NV",
            ClassCode::Bkl => "BKL",
            ClassCode::Plp => "PLP",
            ClassCode::Skb => "SKB",
            ClassCode::Trf => "TRF",
            ClassCode::Wmv => "WMV",
        }
    }

    /// Position in the model's output vector
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ClassCode::Ecz => "Eczema",
            ClassCode::Mel => "Melanoma",
            ClassCode::Atd => "Atopic Dermatitis",
            ClassCode::Bcc => "Basal Cell Carcinoma (BCC)",
            ClassCode::Nv => "Melanocytic Nevi (NV)",
            ClassCode::Bkl => "Benign Keratosis-like Lesions (BKL)",
            ClassCode::Plp => "Psoriasis pictures Lichen Planus and related diseases",
            ClassCode::Skb => "Seborrheic Keratoses and other Benign Tumors",
            ClassCode::Trf => "Tinea Ringworm Candidiasis and other Fungal Infections",
            ClassCode::Wmv => "Warts Molluscum and other Viral Infections",
        }
    }

    pub fn reference(self) -> &'static MedicalReference {
        &REFERENCES[self.index()]
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassCode {
    type Err = UnknownClassCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CLASS_CODES
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownClassCode(s.to_string()))
    }
}

// Indexed by ClassCode::index()
static REFERENCES: [MedicalReference; NUM_CLASSES] = [
    // ECZ
    MedicalReference {
        causes: "Genetic factors, immune system overreaction, environmental triggers (soap, stress, weather).",
        medicines: Medicines {
            child: "Emollients (moisturizers), mild hydrocortisone cream (consult pediatrician).",
            adult: "Corticosteroid creams, antihistamines (Cetirizine), moisturizers.",
        },
        plan: "Keep skin hydrated. Avoid triggers. Use prescribed creams twice daily.",
    },
    // MEL
    MedicalReference {
        causes: "UV radiation (sun exposure), tanning beds, genetic susceptibility, fair skin.",
        medicines: Medicines {
            child: "URGENT: Surgical excision, immunotherapy (under strict specialist care).",
            adult: "Surgical removal, chemotherapy, radiation therapy, immunotherapy.",
        },
        plan: "Immediate consultation with an oncologist/dermatologist is required. Do not delay.",
    },
    // ATD
    MedicalReference {
        causes: "Genetics, dry skin, immune system dysfunction, bacteria/allergens.",
        medicines: Medicines {
            child: "Fragrance-free moisturizers, topical calcineurin inhibitors.",
            adult: "Topical steroids (Betamethasone), oral antihistamines, biologic drugs (Dupixent).",
        },
        plan: "Daily moisturizing. Bleach baths (diluted) to reduce bacteria. Avoid scratching.",
    },
    // BCC
    MedicalReference {
        causes: "Long-term sun exposure, fair skin, radiation therapy history.",
        medicines: Medicines {
            child: "Rare in children. Surgical removal is standard.",
            adult: "Mohs surgery, excisional surgery, topical chemotherapy (Fluorouracil).",
        },
        plan: "Surgical removal is the primary treatment. Regular skin checks.",
    },
    // NV
    MedicalReference {
        causes: "Clumping of melanocytes. mostly genetic and harmless (Moles).",
        medicines: Medicines {
            child: "No treatment needed unless changing shape/color.",
            adult: "No treatment needed. Removal for cosmetic reasons or if suspicious.",
        },
        plan: "Monitor for ABCDE changes (Asymmetry, Border, Color, Diameter, Evolving).",
    },
    // BKL
    MedicalReference {
        causes: "Aging, sun exposure (Seborrheic Keratosis, Solar Lentigo).",
        medicines: Medicines {
            child: "Observation. Cryotherapy if bothersome.",
            adult: "Cryotherapy (freezing), laser therapy, curettage.",
        },
        plan: "Usually benign. Removal is optional for cosmetic reasons.",
    },
    // PLP
    MedicalReference {
        causes: "Autoimmune reaction (Psoriasis), Hepatitis C link (Lichen Planus).",
        medicines: Medicines {
            child: "Topical steroids, coal tar, vitamin D analogues.",
            adult: "Systemic treatments (Methotrexate), phototherapy, biologics.",
        },
        plan: "Manage stress. Avoid skin injury. Topical treatments as prescribed.",
    },
    // SKB
    MedicalReference {
        causes: "Non-cancerous skin growth, aging, genetics.",
        medicines: Medicines {
            child: "Monitoring.",
            adult: "Cryosurgery, electrocautery (burning off).",
        },
        plan: "Benign. No medical treatment strictly necessary unless irritated.",
    },
    // TRF
    MedicalReference {
        causes: "Fungal infection (Dermatophytes), warm/moist environments.",
        medicines: Medicines {
            child: "Topical antifungals (Clotrimazole, Miconazole).",
            adult: "Topical antifungals (Terbinafine), oral antifungals (Fluconazole) for severe cases.",
        },
        plan: "Keep area dry. Wash clothes in hot water. Use antifungal powder.",
    },
    // WMV
    MedicalReference {
        causes: "Human Papillomavirus (HPV), Poxvirus (Molluscum).",
        medicines: Medicines {
            child: "Salicylic acid paints, cryotherapy (can be painful), observation (often clear up).",
            adult: "Cryotherapy, laser removal, prescription creams (Imiquimod).",
        },
        plan: "Highly contagious. Do not share towels. Treatment can take weeks.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_in_output_order() {
        let expected = ["ECZ", "MEL", "ATD", "BCC", "NV", "BKL", "PLP", "SKB", "TRF", "WMV"];
        let actual: Vec<&str> = codes().iter().map(|c| c.as_str()).collect();
        assert_eq!(actual, expected);

        for (i, code) in codes().iter().enumerate() {
            assert_eq!(code.index(), i);
            assert_eq!(CLASS_CODES[i], *code);
        }
    }

    #[test]
    fn test_every_class_has_reference_info() {
        for code in codes() {
            let info = reference_info(code.as_str());
            assert_ne!(info, &FALLBACK_REFERENCE, "{} fell back", code);
            assert!(!info.causes.is_empty());
            assert!(!info.medicines.child.is_empty());
            assert!(!info.medicines.adult.is_empty());
            assert!(!info.plan.is_empty());
            assert!(!code.display_name().is_empty());
        }
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let info = reference_info("XYZ");
        assert_eq!(info, &FALLBACK_REFERENCE);
        assert_eq!(info.medicines.adult, "Consult doctor");
    }

    #[test]
    fn test_parse_code() {
        assert_eq!("MEL".parse::<ClassCode>(), Ok(ClassCode::Mel));
        assert_eq!("nv".parse::<ClassCode>(), Ok(ClassCode::Nv));
        assert!("melanoma".parse::<ClassCode>().is_err());

        let err = "XYZ".parse::<ClassCode>().unwrap_err();
        assert_eq!(err, UnknownClassCode("XYZ".to_string()));
        assert_eq!(err.to_string(), "unknown class code: XYZ");
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&ClassCode::Bkl).unwrap();
        assert_eq!(json, "\"BKL\"");
    }
}
