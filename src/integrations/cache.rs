// ==========================================
// Agenda 导入 - 外部接口响应缓存
// ==========================================
// 键: 调用方拼接的精确字符串（如 "geocode:<address>"）
// 失效: now - timestamp >= ttl 时视为过期（读取时判断, 不自动清理）
// 清理: 按子串删除或整体清空
// ==========================================

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.timestamp) < self.ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub expired: usize,
}

#[derive(Debug, Default)]
pub struct ApiCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ApiCache {
    pub fn new() -> Self {
        Self::default()
    }

    // 写入期间不会 panic, 中毒的锁仍可安全使用
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 未过期的缓存值
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.data.clone())
    }

    pub fn insert(&self, key: impl Into<String>, data: Value, ttl: Duration) {
        self.lock().insert(
            key.into(),
            CacheEntry {
                data,
                timestamp: Instant::now(),
                ttl,
            },
        );
    }

    /// 删除键包含 pattern 的条目; None 时清空
    ///
    /// # 返回
    /// - 删除的条目数
    pub fn clear(&self, pattern: Option<&str>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        match pattern {
            Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
            None => entries.clear(),
        }
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.lock();
        let fresh = entries.values().filter(|e| e.is_fresh(now)).count();
        CacheStats {
            total: entries.len(),
            fresh,
            expired: entries.len() - fresh,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl() {
        let cache = ApiCache::new();
        cache.insert("geocode:a", json!({"lat": 1.0}), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("geocode:a"), Some(json!({"lat": 1.0})));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("geocode:a"), None);
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 1,
                fresh: 0,
                expired: 1
            }
        );
    }

    #[test]
    fn test_clear_by_pattern() {
        let cache = ApiCache::new();
        cache.insert("geocode:a", json!(1), Duration::from_secs(60));
        cache.insert("geocode:b", json!(2), Duration::from_secs(60));
        cache.insert("sms:c", json!(3), Duration::from_secs(60));

        assert_eq!(cache.clear(Some("geocode")), 2);
        assert_eq!(cache.keys(), vec!["sms:c".to_string()]);

        assert_eq!(cache.clear(None), 1);
        assert_eq!(cache.stats().total, 0);
    }
}
