// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{
    ElectricityBill, Investment, PropertyAddress, RecurringInvestment, RecurringTransaction,
    Transaction, UserPreferences,
};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Transactions,
    Investments,
    ElectricityBills,
    PropertyAddresses,
    UserPreferences,
    RecurringTransactions,
    RecurringInvestments,
}

/// Identifies one list read: which table, whose rows, and the serialized filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity: Entity,
    pub user_id: String,
    pub filter: String,
}

impl CacheKey {
    pub fn new(entity: Entity, user_id: &str, filter: impl Into<String>) -> Self {
        Self {
            entity,
            user_id: user_id.to_string(),
            filter: filter.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedRows {
    Transactions(Vec<Transaction>),
    Investments(Vec<Investment>),
    ElectricityBills(Vec<ElectricityBill>),
    PropertyAddresses(Vec<PropertyAddress>),
    Preferences(UserPreferences),
    RecurringTransactions(Vec<RecurringTransaction>),
    RecurringInvestments(Vec<RecurringInvestment>),
}

/// Values that can live in the cache.
pub trait Cacheable: Clone + Sized {
    fn wrap(self) -> CachedRows;
    fn peek(rows: &CachedRows) -> Option<&Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn wrap(self) -> CachedRows {
                CachedRows::$variant(self)
            }

            fn peek(rows: &CachedRows) -> Option<&Self> {
                match rows {
                    CachedRows::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Vec<Transaction>, Transactions);
cacheable!(Vec<Investment>, Investments);
cacheable!(Vec<ElectricityBill>, ElectricityBills);
cacheable!(Vec<PropertyAddress>, PropertyAddresses);
cacheable!(UserPreferences, Preferences);
cacheable!(Vec<RecurringTransaction>, RecurringTransactions);
cacheable!(Vec<RecurringInvestment>, RecurringInvestments);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<CacheKey, CachedRows>,
    stats: CacheStats,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Cacheable>(&mut self, key: &CacheKey) -> Option<T> {
        match self.entries.get(key).and_then(T::peek) {
            Some(v) => {
                self.stats.hits += 1;
                debug!(entity = ?key.entity, user = %key.user_id, "cache hit");
                Some(v.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn put<T: Cacheable>(&mut self, key: CacheKey, value: T) {
        self.entries.insert(key, value.wrap());
    }

    /// Drop every cached read of `entity` for `user_id`; returns how many went.
    pub fn invalidate(&mut self, entity: Entity, user_id: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|k, _| !(k.entity == entity && k.user_id == user_id));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(?entity, user = user_id, removed, "cache invalidated");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_is_scoped_to_entity_and_user() {
        let mut cache = QueryCache::new();
        cache.put(CacheKey::new(Entity::Transactions, "a", "{}"), Vec::<Transaction>::new());
        cache.put(CacheKey::new(Entity::Transactions, "a", "{\"limit\":1}"), Vec::<Transaction>::new());
        cache.put(CacheKey::new(Entity::Transactions, "b", "{}"), Vec::<Transaction>::new());
        cache.put(CacheKey::new(Entity::Investments, "a", "{}"), Vec::<Investment>::new());

        assert_eq!(cache.invalidate(Entity::Transactions, "a"), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache
            .get::<Vec<Transaction>>(&CacheKey::new(Entity::Transactions, "b", "{}"))
            .is_some());
    }

    #[test]
    fn mismatched_type_is_a_miss() {
        let mut cache = QueryCache::new();
        let key = CacheKey::new(Entity::Investments, "a", "{}");
        cache.put(key.clone(), Vec::<Investment>::new());
        assert!(cache.get::<Vec<Transaction>>(&key).is_none());
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1 });
    }
}
