//! Categorical encoding shared by training and inference.
//!
//! Every categorical field is a closed enum; parsing a label outside the
//! enumerated set is an `UnknownCategory` error, never a silent null.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::{HeartRiskError, Result};
use crate::records::{EncodedRecord, RawFeatureRecord};

macro_rules! categorical {
    ($name:ident, $field:literal, { $($variant:ident => ($label:literal, $code:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const FIELD: &'static str = $field;
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn code(self) -> i32 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Lookup for dataset cells, where labels compare ignoring ASCII case.
            pub fn from_cell(s: &str) -> Result<Self> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| HeartRiskError::UnknownCategory {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }

        impl FromStr for $name {
            type Err = HeartRiskError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(HeartRiskError::UnknownCategory {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

categorical!(Sex, "sex", {
    Male => ("Male", 1),
    Female => ("Female", 0),
});

categorical!(ChestPain, "cp", {
    TypicalAngina => ("typical angina", 0),
    AtypicalAngina => ("atypical angina", 1),
    NonAnginal => ("non-anginal", 2),
    Asymptomatic => ("asymptomatic", 3),
});

categorical!(RestEcg, "restecg", {
    Normal => ("normal", 0),
    LvHypertrophy => ("lv hypertrophy", 1),
    StTAbnormality => ("ST-T abnormality", 2),
});

categorical!(Slope, "slope", {
    Upsloping => ("upsloping", 0),
    Flat => ("flat", 1),
    Downsloping => ("downsloping", 2),
});

categorical!(Thal, "thal", {
    Normal => ("normal", 0),
    FixedDefect => ("fixed defect", 1),
    ReversableDefect => ("reversable defect", 2),
});

pub fn encode_bool(value: bool) -> i32 {
    i32::from(value)
}

/// Parses a boolean as it appears in the dataset file.
pub fn parse_bool(field: &'static str, value: &str) -> Result<bool> {
    match value.trim() {
        "TRUE" | "True" | "true" => Ok(true),
        "FALSE" | "False" | "false" => Ok(false),
        other => Err(HeartRiskError::UnknownCategory {
            field,
            value: other.to_string(),
        }),
    }
}

/// Encodes one dataset cell of a categorical column.
///
/// Empty or null cells are missing values and come back as `None`; they are
/// imputed later. Labels match the table ignoring case (the public file
/// writes `st-t abnormality`). Anything else is an error.
pub fn encode_cell(column: &str, value: Option<&str>) -> Result<Option<i32>> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v,
    };
    let code = match column {
        "sex" => Sex::from_cell(value)?.code(),
        "cp" => ChestPain::from_cell(value)?.code(),
        "fbs" => encode_bool(parse_bool("fbs", value)?),
        "restecg" => RestEcg::from_cell(value)?.code(),
        "exang" => encode_bool(parse_bool("exang", value)?),
        "slope" => Slope::from_cell(value)?.code(),
        "thal" => Thal::from_cell(value)?.code(),
        _ => {
            return Err(HeartRiskError::SchemaMismatch {
                expected: crate::records::CATEGORICAL_COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                found: vec![column.to_string()],
            })
        }
    };
    Ok(Some(code))
}

pub fn encode(record: &RawFeatureRecord) -> Result<EncodedRecord> {
    Ok(EncodedRecord {
        age: record.age,
        sex: record.sex.parse::<Sex>()?.code(),
        cp: record.cp.parse::<ChestPain>()?.code(),
        trestbps: record.trestbps,
        chol: record.chol,
        fbs: encode_bool(record.fbs),
        restecg: record.restecg.parse::<RestEcg>()?.code(),
        thalch: record.thalch,
        exang: encode_bool(record.exang),
        oldpeak: record.oldpeak,
        slope: record.slope.parse::<Slope>()?.code(),
        ca: record.ca,
        thal: record.thal.parse::<Thal>()?.code(),
    })
}

/// Labels offered by the form for each categorical field, in display order.
pub fn choices(field: &str) -> Vec<&'static str> {
    match field {
        "sex" => Sex::ALL.iter().map(|v| v.label()).collect(),
        "cp" => ChestPain::ALL.iter().map(|v| v.label()).collect(),
        "restecg" => RestEcg::ALL.iter().map(|v| v.label()).collect(),
        "slope" => Slope::ALL.iter().map(|v| v.label()).collect(),
        "thal" => Thal::ALL.iter().map(|v| v.label()).collect(),
        _ => Vec::new(),
    }
}

/// Canonical rendering of the whole encoding table. Persisted next to the
/// scaler so that a model is never served with a different table.
pub fn fingerprint() -> String {
    let mut out = String::new();
    let tables: [(&str, Vec<(&str, i32)>); 5] = [
        (Sex::FIELD, Sex::ALL.iter().map(|v| (v.label(), v.code())).collect()),
        (ChestPain::FIELD, ChestPain::ALL.iter().map(|v| (v.label(), v.code())).collect()),
        (RestEcg::FIELD, RestEcg::ALL.iter().map(|v| (v.label(), v.code())).collect()),
        (Slope::FIELD, Slope::ALL.iter().map(|v| (v.label(), v.code())).collect()),
        (Thal::FIELD, Thal::ALL.iter().map(|v| (v.label(), v.code())).collect()),
    ];
    for (field, entries) in tables.iter() {
        let _ = write!(out, "{field}:");
        for (label, code) in entries {
            let _ = write!(out, "{label}={code},");
        }
        out.push(';');
    }
    out.push_str("fbs:true=1,false=0,;exang:true=1,false=0,;");
    out
}
