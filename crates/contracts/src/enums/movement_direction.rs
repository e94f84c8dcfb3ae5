use serde::{Deserialize, Serialize};

/// Направление движения RFID-метки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementDirection {
    Inbound,
    Outbound,
}

impl MovementDirection {
    /// Mode `1` is an inbound read; every other mode counts as outbound.
    pub fn from_mode(mode: i64) -> Self {
        if mode == 1 {
            MovementDirection::Inbound
        } else {
            MovementDirection::Outbound
        }
    }

    /// Label shown in the movements table
    pub fn display_name(&self) -> &'static str {
        match self {
            MovementDirection::Inbound => "Ingreso",
            MovementDirection::Outbound => "Salida",
        }
    }
}
