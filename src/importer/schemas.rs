// ==========================================
// Agenda 导入 - 各实体的导入列定义
// ==========================================
// 职责: 客户 / 服务 / 预约的静态列定义（key, label, 必填, 类型, 同义词, 规则）
// 注意: label 同时作为模板表头, 必须能被自身的同义词完全匹配
// ==========================================

use crate::domain::import::ImportColumn;
use crate::domain::types::{AppointmentStatus, ColumnType, EntityType};
use crate::importer::field_rules as rules;

fn is_known_status(value: &str) -> bool {
    AppointmentStatus::parse_label(value).is_some()
}

// ==========================================
// 客户
// ==========================================
static CLIENT_COLUMNS: [ImportColumn; 9] = [
    ImportColumn {
        key: "first_name",
        label: "Prénom",
        required: true,
        column_type: ColumnType::Text,
        example: "Marie",
        keywords: &["prénom", "prenom", "first name", "firstname", "given name"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "last_name",
        label: "Nom du famille",
        required: true,
        column_type: ColumnType::Text,
        example: "Tremblay",
        keywords: &[
            "nom",
            "nom du famille",
            "nom de famille",
            "last name",
            "lastname",
            "surname",
            "family name",
        ],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "email",
        label: "Courriel",
        required: false,
        column_type: ColumnType::Email,
        example: "marie.tremblay@exemple.com",
        keywords: &["courriel", "email", "e-mail", "mail", "adresse courriel"],
        validation: rules::is_valid_email,
        transform: rules::normalize_email,
    },
    ImportColumn {
        key: "phone",
        label: "Téléphone",
        required: false,
        column_type: ColumnType::Phone,
        example: "514-555-0123",
        keywords: &["téléphone", "telephone", "tel", "phone", "cellulaire", "numéro de téléphone"],
        validation: rules::is_valid_phone,
        transform: rules::normalize_phone,
    },
    ImportColumn {
        key: "address",
        label: "Adresse",
        required: false,
        column_type: ColumnType::Text,
        example: "123 rue Principale",
        keywords: &["adresse", "address", "rue", "street"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "city",
        label: "Ville",
        required: false,
        column_type: ColumnType::Text,
        example: "Montréal",
        keywords: &["ville", "city", "municipalité"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "postal_code",
        label: "Code postal",
        required: false,
        column_type: ColumnType::PostalCode,
        example: "H2X 1Y2",
        keywords: &["code postal", "postal code", "postal", "zip"],
        validation: rules::is_valid_postal_code,
        transform: rules::normalize_postal_code,
    },
    ImportColumn {
        key: "notes",
        label: "Notes",
        required: false,
        column_type: ColumnType::Text,
        example: "Préfère les rendez-vous le matin",
        keywords: &["notes", "note", "commentaires", "remarques", "comments"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "loyalty_points",
        label: "Points fidélité",
        required: false,
        column_type: ColumnType::Number,
        example: "120",
        keywords: &["points fidélité", "points", "fidélité", "loyalty points", "loyalty"],
        validation: rules::is_numeric,
        transform: rules::normalize_points,
    },
];

// ==========================================
// 服务
// ==========================================
static SERVICE_COLUMNS: [ImportColumn; 6] = [
    ImportColumn {
        key: "name",
        label: "Nom du service",
        required: true,
        column_type: ColumnType::Text,
        example: "Coupe femme",
        keywords: &["nom du service", "service", "nom", "name", "service name", "prestation"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "description",
        label: "Description",
        required: false,
        column_type: ColumnType::Text,
        example: "Coupe, lavage et mise en plis",
        keywords: &["description", "détails", "details"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "duration",
        label: "Durée (minutes)",
        required: false,
        column_type: ColumnType::Number,
        example: "60",
        keywords: &["durée (minutes)", "durée", "duration", "minutes", "temps"],
        validation: rules::is_numeric,
        transform: rules::normalize_duration,
    },
    ImportColumn {
        key: "price",
        label: "Prix",
        required: false,
        column_type: ColumnType::Number,
        example: "45.00",
        keywords: &["prix", "price", "tarif", "coût", "montant"],
        validation: rules::is_numeric,
        transform: rules::normalize_price,
    },
    ImportColumn {
        key: "color",
        label: "Couleur",
        required: false,
        column_type: ColumnType::Color,
        example: "#3B82F6",
        keywords: &["couleur", "color", "colour"],
        validation: rules::is_valid_color,
        transform: rules::normalize_color,
    },
    ImportColumn {
        key: "category",
        label: "Catégorie",
        required: false,
        column_type: ColumnType::Text,
        example: "Coiffure",
        keywords: &["catégorie", "category", "type"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
];

// ==========================================
// 预约
// ==========================================
// service_name 非必填: 未匹配到服务时只产生警告
static APPOINTMENT_COLUMNS: [ImportColumn; 8] = [
    ImportColumn {
        key: "client_email",
        label: "Courriel du client",
        required: true,
        column_type: ColumnType::Email,
        example: "marie.tremblay@exemple.com",
        keywords: &["courriel du client", "courriel client", "courriel", "client email", "email"],
        validation: rules::is_valid_email,
        transform: rules::normalize_email,
    },
    ImportColumn {
        key: "service_name",
        label: "Service",
        required: false,
        column_type: ColumnType::Text,
        example: "Coupe femme",
        keywords: &["service", "nom du service", "prestation", "service name"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "date",
        label: "Date",
        required: true,
        column_type: ColumnType::Date,
        example: "2025-03-14",
        keywords: &["date", "jour", "date du rendez-vous", "day"],
        validation: rules::is_valid_date,
        transform: rules::normalize_date,
    },
    ImportColumn {
        key: "start_time",
        label: "Heure",
        required: true,
        column_type: ColumnType::Time,
        example: "14:30",
        keywords: &["heure", "heure de début", "début", "time", "start time"],
        validation: rules::is_valid_time,
        transform: rules::normalize_time,
    },
    ImportColumn {
        key: "duration",
        label: "Durée (minutes)",
        required: false,
        column_type: ColumnType::Number,
        example: "60",
        keywords: &["durée (minutes)", "durée", "duration", "minutes"],
        validation: rules::is_numeric,
        transform: rules::normalize_duration,
    },
    ImportColumn {
        key: "status",
        label: "Statut",
        required: false,
        column_type: ColumnType::Text,
        example: "confirmé",
        keywords: &["statut", "status", "état"],
        validation: is_known_status,
        transform: rules::clean_text,
    },
    ImportColumn {
        key: "price",
        label: "Prix",
        required: false,
        column_type: ColumnType::Number,
        example: "45.00",
        keywords: &["prix", "price", "montant"],
        validation: rules::is_numeric,
        transform: rules::normalize_price,
    },
    ImportColumn {
        key: "notes",
        label: "Notes",
        required: false,
        column_type: ColumnType::Text,
        example: "Première visite",
        keywords: &["notes", "note", "commentaires", "remarques"],
        validation: rules::always_valid,
        transform: rules::clean_text,
    },
];

pub fn client_columns() -> &'static [ImportColumn] {
    &CLIENT_COLUMNS
}

pub fn service_columns() -> &'static [ImportColumn] {
    &SERVICE_COLUMNS
}

pub fn appointment_columns() -> &'static [ImportColumn] {
    &APPOINTMENT_COLUMNS
}

/// 实体类型 → 列定义
pub fn columns_for(entity: EntityType) -> &'static [ImportColumn] {
    match entity {
        EntityType::Client => client_columns(),
        EntityType::Service => service_columns(),
        EntityType::Appointment => appointment_columns(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::column_mapper::{normalize_header, similarity};
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique_per_entity() {
        for entity in EntityType::ALL {
            let columns = columns_for(entity);
            let keys: HashSet<_> = columns.iter().map(|c| c.key).collect();
            assert_eq!(keys.len(), columns.len(), "{}", entity);
        }
    }

    #[test]
    fn test_label_matches_own_keywords_exactly() {
        for entity in EntityType::ALL {
            for column in columns_for(entity) {
                let label = normalize_header(column.label);
                let best = column
                    .keywords
                    .iter()
                    .map(|k| similarity(&label, &normalize_header(k)))
                    .fold(0.0_f64, f64::max);
                assert_eq!(best, 1.0, "{}.{}", entity, column.key);
            }
        }
    }

    #[test]
    fn test_examples_pass_validation() {
        for entity in EntityType::ALL {
            for column in columns_for(entity) {
                assert!(column.validate(column.example), "{}.{}", entity, column.key);
            }
        }
    }
}
