//! Documentos de exemplo no formato do backend, para testes

use serde_json::{json, Value};

use crate::models::{RequestId, RequestRecord, RequestStatus};

/// Registro mínimo com os campos obrigatórios
pub fn record(id: &str, status: RequestStatus) -> RequestRecord {
    RequestRecord {
        id: RequestId::from(id),
        patient_name: format!("Paciente {}", id),
        patient_phone_number: "+5511999990000".to_string(),
        status,
        for_self: false,
        is_ambulance_required: false,
        description: None,
        location: None,
        photo_url: None,
        patient_profile: None,
        created_at: None,
        extra: Default::default(),
        source: None,
    }
}

pub fn record_json(id: &str, status: RequestStatus) -> Value {
    json!({
        "_id": id,
        "patientName": format!("Paciente {}", id),
        "patientPhoneNumber": "+5511999990000",
        "status": status.as_str(),
        "forSelf": false,
        "is_ambulance_required": false,
        "createdAt": "2025-06-07T20:15:30.123Z"
    })
}

pub fn pending_with_location() -> Value {
    json!({
        "location": {
            "type": "Point",
            "coordinates": [20.246131103392166, 85.8024761097669]
        },
        "_id": "684683acc7320d4eb838e4e2",
        "createdBy": { "_id": "680fcc0cad15e2b2bbc00553" },
        "forSelf": true,
        "patientName": "Shashank Shekhar Pandey",
        "patientPhoneNumber": "8888888888",
        "photo": "https://res.cloudinary.com/demo/image/upload/v1749453160/request.webp",
        "acceptedBy": [],
        "finalizedHospital": null,
        "status": "pending",
        "is_ambulance_required": true,
        "createdAt": "2025-06-09T06:48:12.320Z",
        "updatedAt": "2025-06-09T07:12:41.304Z",
        "__v": 0
    })
}

/// Registro antigo, sem localização nem foto
pub fn pending_without_location() -> Value {
    json!({
        "_id": "6844aea7660042c582c83f05",
        "patientName": "Jane Smith",
        "status": "pending",
        "createdAt": "2025-06-07T20:15:30.123Z",
        "forSelf": false,
        "patientPhoneNumber": "+1234567891"
    })
}

pub fn finalized_with_profile() -> Value {
    json!({
        "_id": "6844aea7660042c582c83f06",
        "patientName": "Mike Johnson",
        "patientPhoneNumber": "+1234567892",
        "status": "finalized",
        "forSelf": true,
        "is_ambulance_required": true,
        "description": "Acidente de carro com múltiplos feridos",
        "location": { "coordinates": [-74.0085, 40.715] },
        "photo": "https://cdn.example.com/acidente.webp",
        "patientProfile": {
            "medicalHistory": ["Asma", "Alergia a penicilina"],
            "emergencyContacts": [
                { "name": "Laura Johnson", "phoneNumber": "+1234500000", "relation": "esposa" }
            ],
            "address": {
                "locality": "Centro",
                "city": "Bhubaneswar",
                "state": "Odisha",
                "pincode": "751001"
            },
            "bloodGroup": "O+"
        },
        "createdAt": "2025-06-07T19:45:12.456Z",
        "acceptedBy": ["680fcc0cad15e2b2bbc00999"],
        "finalizedHospital": "680fcc0cad15e2b2bbc00999",
        "__v": 2
    })
}

pub fn hospital_profile() -> Value {
    json!({
        "_id": "680fcc0cad15e2b2bbc00999",
        "name": "Sunrise Medical Center",
        "licenseNumber": "OD-2231-77",
        "type": "MULTI_SPECIALITY",
        "address": {
            "locality": "Saheed Nagar",
            "city": "Bhubaneswar",
            "state": "Odisha",
            "pincode": 751007
        },
        "location": { "type": "Point", "coordinates": [85.8245, 20.2961] },
        "bedData": [
            { "_id": "b1", "type": "General", "count": 40, "available": 25 },
            { "_id": "b2", "type": "ICU", "count": 20, "available": 10 }
        ],
        "bloodData": {
            "_id": "bd1", "owner": "680fcc0cad15e2b2bbc00999",
            "opos": 5, "oneg": 2, "apos": 4, "aneg": 0, "bpos": 3, "bneg": 0, "abpos": 3,
            "createdAt": "2025-05-01T10:00:00.000Z"
        },
        "is_blood_available": true,
        "is_ambulance_available": true,
        "phoneNumbers": [
            { "_id": "p1", "label": "primary", "number": "0674-2300000" },
            { "_id": "p2", "label": "emergency", "number": "108" }
        ],
        "createdAt": "2025-05-01T10:00:00.000Z",
        "updatedAt": "2025-06-01T12:30:00.000Z"
    })
}
