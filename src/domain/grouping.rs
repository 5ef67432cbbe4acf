//! Stable partition of orders by instrument.

use crate::domain::order::Order;
use std::collections::HashMap;

/// Orders grouped by instrument.
///
/// Groups iterate in the order their instrument was first seen; orders keep
/// their relative input order inside each group.
#[derive(Debug, Clone, Default)]
pub struct InstrumentGroups {
    groups: Vec<(String, Vec<Order>)>,
    index: HashMap<String, usize>,
}

impl InstrumentGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, instrument: &str) -> Option<&[Order]> {
        self.index
            .get(instrument)
            .map(|&i| self.groups[i].1.as_slice())
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Order])> {
        self.groups
            .iter()
            .map(|(name, orders)| (name.as_str(), orders.as_slice()))
    }

    /// Total number of orders across all groups.
    pub fn order_count(&self) -> usize {
        self.groups.iter().map(|(_, orders)| orders.len()).sum()
    }

    fn push(&mut self, order: Order) {
        match self.index.get(&order.instrument).copied() {
            Some(i) => self.groups[i].1.push(order),
            None => {
                self.index.insert(order.instrument.clone(), self.groups.len());
                self.groups.push((order.instrument.clone(), vec![order]));
            }
        }
    }
}

pub fn group_by_instrument(orders: &[Order]) -> InstrumentGroups {
    let mut groups = InstrumentGroups::default();
    for order in orders {
        groups.push(order.clone());
    }
    groups
}
