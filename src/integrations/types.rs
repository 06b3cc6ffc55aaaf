// ==========================================
// Agenda 导入 - 外部接口结果类型
// ==========================================
// 从各服务的 JSON 响应中提取本系统需要的字段
// ==========================================

use crate::integrations::error::{IntegrationError, IntegrationResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressValidation {
    pub is_valid: bool,
    pub formatted_address: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub distance_text: String,
    pub duration_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    /// RFC 3339
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickBooksCustomer {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsReceipt {
    pub sid: String,
    pub status: String,
    pub to: String,
}

// ==========================================
// 响应解析
// ==========================================

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn required_str(value: &Value, pointer: &str) -> IntegrationResult<String> {
    str_at(value, pointer)
        .map(str::to_string)
        .ok_or_else(|| IntegrationError::InvalidResponse(format!("champ manquant : {}", pointer)))
}

/// Google Maps 响应的 status 字段
fn google_status(value: &Value) -> &str {
    str_at(value, "/status").unwrap_or("UNKNOWN")
}

impl GeocodeResult {
    pub fn from_google(value: &Value) -> IntegrationResult<Self> {
        let status = google_status(value);
        if status != "OK" {
            return Err(IntegrationError::InvalidResponse(format!("géocodage : {}", status)));
        }
        let first = value
            .pointer("/results/0")
            .ok_or_else(|| IntegrationError::InvalidResponse("géocodage : aucun résultat".to_string()))?;
        let coordinate = |axis: &str| {
            first
                .pointer(&format!("/geometry/location/{}", axis))
                .and_then(Value::as_f64)
                .ok_or_else(|| IntegrationError::InvalidResponse(format!("coordonnée manquante : {}", axis)))
        };

        Ok(Self {
            latitude: coordinate("lat")?,
            longitude: coordinate("lng")?,
            formatted_address: required_str(first, "/formatted_address")?,
            place_id: str_at(first, "/place_id").map(str::to_string),
        })
    }
}

impl AddressValidation {
    /// ZERO_RESULTS 是合法的"地址无效"结果, 其它非 OK 状态视为错误
    pub fn from_google(value: &Value) -> IntegrationResult<Self> {
        match google_status(value) {
            "OK" => {}
            "ZERO_RESULTS" => {
                return Ok(Self {
                    is_valid: false,
                    formatted_address: None,
                    postal_code: None,
                })
            }
            other => return Err(IntegrationError::InvalidResponse(format!("validation d'adresse : {}", other))),
        }

        let first = value.pointer("/results/0");
        let postal_code = first
            .and_then(|r| r.get("address_components"))
            .and_then(Value::as_array)
            .and_then(|components| {
                components.iter().find(|c| {
                    c.get("types")
                        .and_then(Value::as_array)
                        .is_some_and(|types| types.iter().any(|t| t == "postal_code"))
                })
            })
            .and_then(|c| str_at(c, "/long_name"))
            .map(str::to_string);

        Ok(Self {
            is_valid: first.is_some(),
            formatted_address: first
                .and_then(|r| str_at(r, "/formatted_address"))
                .map(str::to_string),
            postal_code,
        })
    }
}

impl DistanceResult {
    pub fn from_google(value: &Value) -> IntegrationResult<Self> {
        let status = google_status(value);
        if status != "OK" {
            return Err(IntegrationError::InvalidResponse(format!("distance : {}", status)));
        }
        let element = value
            .pointer("/rows/0/elements/0")
            .ok_or_else(|| IntegrationError::InvalidResponse("distance : aucun trajet".to_string()))?;
        let element_status = str_at(element, "/status").unwrap_or("UNKNOWN");
        if element_status != "OK" {
            return Err(IntegrationError::InvalidResponse(format!("distance : {}", element_status)));
        }
        let number = |pointer: &str| {
            element
                .pointer(pointer)
                .and_then(Value::as_u64)
                .ok_or_else(|| IntegrationError::InvalidResponse(format!("champ manquant : {}", pointer)))
        };

        Ok(Self {
            distance_meters: number("/distance/value")?,
            duration_seconds: number("/duration/value")?,
            distance_text: required_str(element, "/distance/text")?,
            duration_text: required_str(element, "/duration/text")?,
        })
    }
}

impl CalendarEvent {
    pub fn from_google(value: &Value) -> IntegrationResult<Self> {
        // 全天事件只有 date, 没有 dateTime
        let time = |edge: &str| {
            str_at(value, &format!("/{}/dateTime", edge))
                .or_else(|| str_at(value, &format!("/{}/date", edge)))
                .map(str::to_string)
        };
        Ok(Self {
            id: required_str(value, "/id")?,
            summary: str_at(value, "/summary").unwrap_or_default().to_string(),
            description: str_at(value, "/description").map(str::to_string),
            start: time("start"),
            end: time("end"),
        })
    }

    pub fn list_from_google(value: &Value) -> IntegrationResult<Vec<Self>> {
        match value.get("items").and_then(Value::as_array) {
            Some(items) => items.iter().map(Self::from_google).collect(),
            None => Ok(Vec::new()),
        }
    }
}

impl NewCalendarEvent {
    pub fn to_google(&self) -> Value {
        let mut body = json!({
            "summary": self.summary,
            "start": { "dateTime": self.start },
            "end": { "dateTime": self.end },
        });
        if let Some(description) = &self.description {
            body["description"] = json!(description);
        }
        body
    }
}

impl QuickBooksCustomer {
    pub fn list_from_quickbooks(value: &Value) -> IntegrationResult<Vec<Self>> {
        let Some(customers) = value
            .pointer("/QueryResponse/Customer")
            .and_then(Value::as_array)
        else {
            return Ok(Vec::new());
        };

        customers
            .iter()
            .map(|c| {
                Ok(Self {
                    id: required_str(c, "/Id")?,
                    display_name: str_at(c, "/DisplayName").unwrap_or_default().to_string(),
                    email: str_at(c, "/PrimaryEmailAddr/Address").map(str::to_string),
                    phone: str_at(c, "/PrimaryPhone/FreeFormNumber").map(str::to_string),
                })
            })
            .collect()
    }
}

impl SmsReceipt {
    pub fn from_twilio(value: &Value) -> IntegrationResult<Self> {
        Ok(Self {
            sid: required_str(value, "/sid")?,
            status: str_at(value, "/status").unwrap_or("queued").to_string(),
            to: str_at(value, "/to").unwrap_or_default().to_string(),
        })
    }
}
