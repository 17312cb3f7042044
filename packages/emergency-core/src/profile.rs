//! Perfil do hospital: leitos, banco de sangue e contatos
//!
//! Espelha o documento de `/users/hospital/profile` e monta o corpo aceito
//! por `/users/hospital/update-profile`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Address, Location};
use crate::wire::{lenient, lenient_or_default};

/// Inventário de um tipo de leito
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedData {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub bed_type: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub available: u32,
}

impl BedData {
    pub fn occupied(&self) -> u32 {
        self.count.saturating_sub(self.available)
    }

    pub fn is_full(&self) -> bool {
        self.available == 0
    }
}

/// Estoque do banco de sangue por grupo sanguíneo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodData {
    #[serde(default)]
    pub opos: u32,
    #[serde(default)]
    pub oneg: u32,
    #[serde(default)]
    pub apos: u32,
    #[serde(default)]
    pub aneg: u32,
    #[serde(default)]
    pub bpos: u32,
    #[serde(default)]
    pub bneg: u32,
    #[serde(default)]
    pub abpos: u32,
    #[serde(default)]
    pub abneg: u32,
}

impl BloodData {
    /// Pares (rótulo, unidades) na ordem exibida
    pub fn groups(&self) -> [(&'static str, u32); 8] {
        [
            ("O+", self.opos),
            ("O-", self.oneg),
            ("A+", self.apos),
            ("A-", self.aneg),
            ("B+", self.bpos),
            ("B-", self.bneg),
            ("AB+", self.abpos),
            ("AB-", self.abneg),
        ]
    }

    pub fn total_units(&self) -> u32 {
        self.groups().iter().map(|(_, units)| units).sum()
    }

    pub fn has_stock(&self) -> bool {
        self.total_units() > 0
    }
}

/// Telefone de contato do hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// primary, secondary, emergency, reception, other
    #[serde(default)]
    pub label: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "licenseNumber", default, deserialize_with = "lenient_or_default")]
    pub license_number: String,
    /// PHC, CHC, CLINIC, MULTI_SPECIALITY...
    #[serde(rename = "type", default, deserialize_with = "lenient_or_default")]
    pub hospital_type: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub address: Address,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Location>,
    #[serde(rename = "bedData", default, deserialize_with = "lenient_or_default")]
    pub bed_data: Vec<BedData>,
    #[serde(rename = "bloodData", default, deserialize_with = "lenient_or_default")]
    pub blood_data: BloodData,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub is_blood_available: bool,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub is_ambulance_available: bool,
    #[serde(rename = "phoneNumbers", default, deserialize_with = "lenient_or_default")]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl HospitalProfile {
    pub fn total_beds(&self) -> u32 {
        self.bed_data.iter().map(|bed| bed.count).sum()
    }

    pub fn available_beds(&self) -> u32 {
        self.bed_data.iter().map(|bed| bed.available).sum()
    }

    pub fn total_blood_units(&self) -> u32 {
        self.blood_data.total_units()
    }

    /// Tipo para exibição (`MULTI_SPECIALITY` -> `MULTI SPECIALITY`)
    pub fn type_label(&self) -> String {
        self.hospital_type.replacen('_', " ", 1)
    }

    /// Corpo do PUT de atualização; a disponibilidade de sangue é derivada
    /// do estoque e não do indicador gravado.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            hospital_type: self.hospital_type.clone(),
            address: self.address.clone(),
            location: self.location.map(|l| Location::point(l.longitude(), l.latitude())),
            bed_data: self
                .bed_data
                .iter()
                .map(|bed| BedUpdate {
                    bed_type: bed.bed_type.clone(),
                    count: bed.count,
                    available: bed.available,
                })
                .collect(),
            is_blood_available: self.blood_data.has_stock(),
            blood_data: self.blood_data,
            phone_numbers: self
                .phone_numbers
                .iter()
                .map(|phone| PhoneUpdate {
                    number: phone.number.clone(),
                    phone_type: phone.label.clone(),
                })
                .collect(),
            is_ambulance_available: self.is_ambulance_available,
        }
    }
}

/// Corpo de `PUT /users/hospital/update-profile`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "type")]
    pub hospital_type: String,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(rename = "bedData")]
    pub bed_data: Vec<BedUpdate>,
    pub is_blood_available: bool,
    #[serde(rename = "bloodData")]
    pub blood_data: BloodData,
    #[serde(rename = "phoneNumbers")]
    pub phone_numbers: Vec<PhoneUpdate>,
    pub is_ambulance_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BedUpdate {
    #[serde(rename = "type")]
    pub bed_type: String,
    pub count: u32,
    pub available: u32,
}

/// O backend chama de `type` o que a tela chama de `label`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneUpdate {
    pub number: String,
    #[serde(rename = "type")]
    pub phone_type: String,
}
