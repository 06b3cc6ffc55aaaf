// ==========================================
// Agenda 导入 - 字段校验与归一化规则
// ==========================================
// 职责: 每种列类型的 validation / transform 函数
// 覆盖: 邮箱 / 魁北克电话 / 加拿大邮编 / 数值区间 / 颜色 / 日期 / 时间
// ==========================================

use crate::domain::service::{DEFAULT_DURATION_MINUTES, DEFAULT_SERVICE_COLOR};
use crate::domain::types::FieldValue;
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

// ==========================================
// 数值区间
// ==========================================
pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 480;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

// 可选 +1 / 1 前缀, 区号可带括号, 分隔符 - . 空格
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+?1[\s.-]?)?\(?(\d{3})\)?[\s.-]?(\d{3})[\s.-]?(\d{4})$").expect("phone regex")
});

static POSTAL_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]\d[A-Za-z])[\s-]?(\d[A-Za-z]\d)$").expect("postal code regex")
});

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#[0-9A-F]{6}$").expect("color regex"));

static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(?:\d+(?:\.\d*)?|\.\d+)").expect("number regex"));

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%Y%m%d"];

// ==========================================
// 通用
// ==========================================

pub fn always_valid(_value: &str) -> bool {
    true
}

/// 文本: TRIM
pub fn clean_text(value: &str) -> FieldValue {
    FieldValue::Text(value.trim().to_string())
}

// ==========================================
// 邮箱
// ==========================================

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// 邮箱: TRIM + 小写
pub fn normalize_email(value: &str) -> FieldValue {
    FieldValue::Text(value.trim().to_lowercase())
}

// ==========================================
// 电话（魁北克 / 北美格式）
// ==========================================

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value.trim())
}

/// 电话: 统一为 NNN-NNN-NNNN
pub fn normalize_phone(value: &str) -> FieldValue {
    let trimmed = value.trim();
    match PHONE_RE.captures(trimmed) {
        Some(caps) => FieldValue::Text(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3])),
        None => FieldValue::Text(trimmed.to_string()),
    }
}

// ==========================================
// 邮编（加拿大）
// ==========================================

pub fn is_valid_postal_code(value: &str) -> bool {
    POSTAL_CODE_RE.is_match(value.trim())
}

/// 邮编: 大写 + 单个空格, 如 "H2X 1Y2"
pub fn normalize_postal_code(value: &str) -> FieldValue {
    let trimmed = value.trim();
    match POSTAL_CODE_RE.captures(trimmed) {
        Some(caps) => FieldValue::Text(format!(
            "{} {}",
            caps[1].to_uppercase(),
            caps[2].to_uppercase()
        )),
        None => FieldValue::Text(trimmed.to_uppercase()),
    }
}

// ==========================================
// 数值
// ==========================================

/// 解析单元格中的数值前缀
///
/// 去掉货币符号与空格, 接受逗号小数点（"45,50 $" → 45.5）,
/// 只取开头的数值部分（"90 min" → 90）
pub fn parse_number(value: &str) -> Option<f64> {
    let mut cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '€' | '£'))
        .collect();

    if cleaned.contains(',') {
        cleaned = if cleaned.contains('.') {
            cleaned.replace(',', "") // 千分位
        } else {
            cleaned.replace(',', ".")
        };
    }

    LEADING_NUMBER_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

pub fn is_numeric(value: &str) -> bool {
    parse_number(value).is_some()
}

/// 时长: 取整并限制在 15..=480 分钟, 解析失败回退 60
pub fn normalize_duration(value: &str) -> FieldValue {
    let minutes = parse_number(value)
        .map(|n| (n.round() as i64).clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES))
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    FieldValue::Integer(minutes)
}

/// 价格: >= 0, 保留两位小数, 解析失败回退 0
pub fn normalize_price(value: &str) -> FieldValue {
    let price = parse_number(value)
        .map(|n| (n.max(0.0) * 100.0).round() / 100.0)
        .unwrap_or(0.0);
    FieldValue::Number(price)
}

/// 积分: 非负整数, 解析失败回退 0
pub fn normalize_points(value: &str) -> FieldValue {
    let points = parse_number(value).map(|n| n.trunc().max(0.0) as i64).unwrap_or(0);
    FieldValue::Integer(points)
}

// ==========================================
// 颜色
// ==========================================

pub fn is_valid_color(value: &str) -> bool {
    COLOR_RE.is_match(value.trim())
}

/// 颜色: 大写 #RRGGBB, 非法回退品牌色
pub fn normalize_color(value: &str) -> FieldValue {
    let trimmed = value.trim();
    if is_valid_color(trimmed) {
        FieldValue::Text(trimmed.to_uppercase())
    } else {
        FieldValue::Text(DEFAULT_SERVICE_COLOR.to_string())
    }
}

// ==========================================
// 日期 / 时间
// ==========================================

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    // Excel 日期时间单元格 "2025-03-14 00:00" → 只取日期部分
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// 日期: 统一为 YYYY-MM-DD
pub fn normalize_date(value: &str) -> FieldValue {
    match parse_date(value) {
        Some(date) => FieldValue::Text(date.format("%Y-%m-%d").to_string()),
        None => FieldValue::Text(value.trim().to_string()),
    }
}

/// 解析时间: "14:30" / "14:30:00" / "14h30" / "9h" / "2:30 PM"
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut quebec = trimmed.to_lowercase().replace('h', ":");
    if quebec.ends_with(':') {
        quebec.push_str("00");
    }

    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&quebec, fmt).ok())
        .or_else(|| NaiveTime::parse_from_str(&trimmed.to_uppercase(), "%I:%M %p").ok())
}

pub fn is_valid_time(value: &str) -> bool {
    parse_time(value).is_some()
}

/// 时间: 统一为 HH:MM
pub fn normalize_time(value: &str) -> FieldValue {
    match parse_time(value) {
        Some(time) => FieldValue::Text(time.format("%H:%M").to_string()),
        None => FieldValue::Text(value.trim().to_string()),
    }
}
