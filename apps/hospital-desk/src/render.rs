//! Renderização em texto das telas do painel

use chrono::{DateTime, Utc};
use emergency_core::models::EmergencyContact;
use emergency_core::{HospitalProfile, PatientProfile, RequestAction, RequestCard, RequestStatus};

use crate::controller::ListSnapshot;

pub fn status_badge(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "PENDENTE",
        RequestStatus::Accepted => "ACEITA",
        RequestStatus::Finalized => "FINALIZADA",
        RequestStatus::Resolved => "RESOLVIDA",
        RequestStatus::Cancelled => "CANCELADA",
    }
}

pub fn action_label(action: RequestAction) -> &'static str {
    match action {
        RequestAction::Accept => "Aceitar",
        RequestAction::Navigate => "Navegar",
        RequestAction::Resolve => "Resolver",
    }
}

/// `Jun 7, 20:15`, ou um aviso quando a data não veio
pub fn format_created_at(created_at: Option<DateTime<Utc>>) -> String {
    created_at
        .map(|at| at.format("%b %-d, %H:%M").to_string())
        .unwrap_or_else(|| "data desconhecida".to_string())
}

/// Tela completa de uma listagem
pub fn render_list(snapshot: &ListSnapshot) -> String {
    let collection = &snapshot.collection;
    let mut lines = vec![collection.feed().title().to_string()];

    if snapshot.loading && !collection.is_loaded() {
        lines.push("Carregando...".to_string());
        return lines.join("\n");
    }
    if let Some(error) = &snapshot.error {
        lines.push(format!("! {}", error));
    }

    if collection.is_empty() {
        lines.push(collection.empty_message());
    } else {
        lines.push(collection.count_label());
        for card in &snapshot.cards {
            lines.push(String::new());
            lines.push(render_card(card));
        }
    }
    lines.join("\n")
}

pub fn render_card(card: &RequestCard) -> String {
    let record = card.record();
    let mut header = format!("[{}] {}", status_badge(record.status), record.patient_name);
    if record.for_self {
        header.push_str(" (próprio paciente)");
    }
    if record.is_ambulance_required {
        header.push_str(" [ambulância]");
    }

    let mut lines = vec![
        header,
        format!("  id: {}", record.id),
        format!("  Telefone: {}", record.patient_phone_number),
        format!("  Criada em: {}", format_created_at(record.created_at)),
    ];

    match record.location {
        Some(location) => lines.push(format!(
            "  Localização: {:.4}, {:.4}",
            location.latitude(),
            location.longitude()
        )),
        None => lines.push("  Localização: localização indisponível".to_string()),
    }
    if let Some(hint) = card.status_hint() {
        lines.push(format!("  {}", hint));
    }

    let actions: Vec<&str> = card
        .allowed_actions()
        .iter()
        .map(|action| action_label(*action))
        .collect();
    if !actions.is_empty() {
        let suffix = if card.action_in_flight { " (em andamento...)" } else { "" };
        lines.push(format!("  Ações: {}{}", actions.join(", "), suffix));
    }

    if card.expanded {
        if let Some(description) = &record.description {
            lines.push(format!("    Descrição: {}", description));
        }
        if let Some(location) = record.location {
            lines.push(format!("    Latitude: {:.6}", location.latitude()));
            lines.push(format!("    Longitude: {:.6}", location.longitude()));
        }
        if let Some(photo) = &record.photo_url {
            lines.push(format!("    Foto: {}", photo));
        }
        lines.push(format!(
            "    Ambulância necessária: {}",
            if record.is_ambulance_required { "sim" } else { "não" }
        ));
    }

    if card.patient_details_modal_open {
        if let Some(profile) = &record.patient_profile {
            lines.push(render_patient_details(profile));
        }
    }
    lines.join("\n")
}

pub fn render_patient_details(profile: &PatientProfile) -> String {
    let mut lines = vec!["    Ficha do paciente".to_string()];

    let history = profile.medical_history.as_deref().unwrap_or_default();
    if history.is_empty() {
        lines.push("      Histórico médico: nenhum registro".to_string());
    } else {
        lines.push(format!("      Histórico médico: {}", history.join(", ")));
    }

    for contact in profile.emergency_contacts.as_deref().unwrap_or_default() {
        lines.push(format!("      Contato: {}", describe_contact(contact)));
    }

    if let Some(address) = profile.address.as_ref().filter(|a| !a.is_empty()) {
        let parts: Vec<&str> = [&address.locality, &address.city, &address.state, &address.pincode]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.trim().is_empty())
            .collect();
        lines.push(format!("      Endereço: {}", parts.join(", ")));
    }
    lines.join("\n")
}

fn describe_contact(contact: &EmergencyContact) -> String {
    let name = contact.name.as_deref().unwrap_or("sem nome");
    let mut text = name.to_string();
    if let Some(relation) = &contact.relation {
        text.push_str(&format!(" ({})", relation));
    }
    if let Some(phone) = &contact.phone_number {
        text.push_str(&format!(" - {}", phone));
    }
    text
}

/// Resumo do perfil do hospital
pub fn render_profile(profile: &HospitalProfile) -> String {
    let mut lines = vec![
        format!("{} ({})", profile.name, profile.type_label()),
        format!("  Licença: {}", profile.license_number),
        format!(
            "  Leitos: {} disponíveis de {}",
            profile.available_beds(),
            profile.total_beds()
        ),
    ];
    for bed in &profile.bed_data {
        let full = if bed.is_full() { " (lotado)" } else { "" };
        lines.push(format!(
            "    {}: {}/{} ocupados{}",
            bed.bed_type,
            bed.occupied(),
            bed.count,
            full
        ));
    }

    lines.push(format!(
        "  Banco de sangue: {} unidade(s)",
        profile.total_blood_units()
    ));
    let groups: Vec<String> = profile
        .blood_data
        .groups()
        .iter()
        .map(|(group, units)| format!("{} {}", group, units))
        .collect();
    lines.push(format!("    {}", groups.join(" | ")));

    lines.push(format!(
        "  Ambulância: {}",
        if profile.is_ambulance_available { "disponível" } else { "indisponível" }
    ));
    for phone in &profile.phone_numbers {
        lines.push(format!("  Telefone ({}): {}", phone.label, phone.number));
    }
    lines.join("\n")
}
