use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ArchivoDicomId);
id_newtype!(Seg3dId);
id_newtype!(ModeloId);
id_newtype!(PacienteId);
id_newtype!(EstudioId);

/// Server-minted identifier of an uploaded DICOM series. Opaque to the
/// client: it is only ever echoed back in URLs and form fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        SessionId(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_string())
    }
}

/// Named threshold window for the 3-D segmentation endpoint. The server
/// resolves the preset to HU bounds; sending explicit `thr_min`/`thr_max`
/// bypasses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPreset {
    Hueso,
    TejidoBlando,
}

impl ThresholdPreset {
    pub const ALL: [ThresholdPreset; 2] = [ThresholdPreset::Hueso, ThresholdPreset::TejidoBlando];

    /// Value sent in the `preset` form field.
    pub fn form_value(&self) -> &'static str {
        match self {
            ThresholdPreset::Hueso => "hueso",
            ThresholdPreset::TejidoBlando => "tejido_blando",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThresholdPreset::Hueso => "Hueso",
            ThresholdPreset::TejidoBlando => "Tejido blando",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_round_trips_through_display() {
        let id = SessionId::from("serie-20240101-abc");
        assert_eq!(id.to_string(), "serie-20240101-abc");
        assert_eq!(id.as_str(), "serie-20240101-abc");
    }

    #[test]
    fn preset_form_values_are_stable() {
        assert_eq!(ThresholdPreset::Hueso.form_value(), "hueso");
        assert_eq!(ThresholdPreset::TejidoBlando.form_value(), "tejido_blando");
    }
}
