use serde::{Deserialize, Serialize};

/// The fixed service catalogue. Durations are part of the catalogue and are
/// copied onto the booking at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    LaserEpilation,
    SprayTan,
    Manicure,
    Pedicure,
    Makeup,
    Lashes,
}

/// Which admin group gets notified about a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    Nails,
    Beauty,
}

impl Service {
    pub const ALL: [Service; 6] = [
        Service::LaserEpilation,
        Service::SprayTan,
        Service::Manicure,
        Service::Pedicure,
        Service::Makeup,
        Service::Lashes,
    ];

    /// Stable key used in callback payloads and the database.
    pub fn key(&self) -> &'static str {
        match self {
            Service::LaserEpilation => "epilation",
            Service::SprayTan => "tanning",
            Service::Manicure => "manicure",
            Service::Pedicure => "pedicure",
            Service::Makeup => "makeup",
            Service::Lashes => "lashes",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "epilation" => Some(Service::LaserEpilation),
            "tanning" => Some(Service::SprayTan),
            "manicure" => Some(Service::Manicure),
            "pedicure" => Some(Service::Pedicure),
            "makeup" => Some(Service::Makeup),
            "lashes" => Some(Service::Lashes),
            _ => None,
        }
    }

    /// Label shown on menu buttons and in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Service::LaserEpilation => "🧖 Laser epilation",
            Service::SprayTan => "☀️ Spray tan",
            Service::Manicure => "💅 Manicure",
            Service::Pedicure => "👣 Pedicure",
            Service::Makeup => "💄 Makeup",
            Service::Lashes => "👁️ Lashes",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Service::ALL.iter().copied().find(|svc| svc.label() == s)
    }

    pub fn duration_minutes(&self) -> i32 {
        match self {
            Service::LaserEpilation | Service::SprayTan => 30,
            Service::Manicure | Service::Pedicure => 90,
            Service::Makeup | Service::Lashes => 60,
        }
    }

    pub fn category(&self) -> ServiceCategory {
        match self {
            Service::Manicure | Service::Pedicure => ServiceCategory::Nails,
            _ => ServiceCategory::Beauty,
        }
    }
}
