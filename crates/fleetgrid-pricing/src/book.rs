//! PriceBook — an immutable snapshot of both price tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::source::SpotPricePoint;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBook {
    /// Instance type → hourly on-demand price.
    #[serde(default)]
    pub on_demand: HashMap<String, f64>,
    /// Instance type → zone → latest hourly spot price.
    #[serde(default)]
    pub spot: HashMap<String, HashMap<String, f64>>,
}

impl PriceBook {
    pub fn on_demand_price(&self, instance_type: &str) -> Option<f64> {
        self.on_demand.get(instance_type).copied()
    }

    pub fn spot_price(&self, instance_type: &str, zone: &str) -> Option<f64> {
        self.spot
            .get(instance_type)
            .and_then(|zones| zones.get(zone))
            .copied()
    }

    /// Build a spot table keeping only the newest point per (type, zone).
    pub fn spot_table(points: &[SpotPricePoint]) -> HashMap<String, HashMap<String, f64>> {
        let mut newest: HashMap<(&str, &str), &SpotPricePoint> = HashMap::new();
        for point in points {
            let key = (point.instance_type.as_str(), point.zone.as_str());
            let is_newer = newest
                .get(&key)
                .is_none_or(|existing| existing.timestamp < point.timestamp);
            if is_newer {
                newest.insert(key, point);
            }
        }

        let mut table: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for ((instance_type, zone), point) in newest {
            table
                .entry(instance_type.to_string())
                .or_default()
                .insert(zone.to_string(), point.price);
        }
        table
    }

    pub fn spot_len(&self) -> usize {
        self.spot.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(instance_type: &str, zone: &str, price: f64, timestamp: u64) -> SpotPricePoint {
        SpotPricePoint {
            instance_type: instance_type.to_string(),
            zone: zone.to_string(),
            price,
            timestamp,
        }
    }

    #[test]
    fn spot_table_keeps_newest_point() {
        let table = PriceBook::spot_table(&[
            point("m5.large", "us-west-2a", 0.040, 100),
            point("m5.large", "us-west-2a", 0.035, 200),
            point("m5.large", "us-west-2a", 0.050, 150),
            point("m5.large", "us-west-2b", 0.041, 100),
        ]);
        assert_eq!(table["m5.large"]["us-west-2a"], 0.035);
        assert_eq!(table["m5.large"]["us-west-2b"], 0.041);
    }

    #[test]
    fn lookups_miss_cleanly() {
        let mut book = PriceBook::default();
        book.on_demand.insert("m5.large".to_string(), 0.096);
        book.spot = PriceBook::spot_table(&[point("m5.large", "us-west-2a", 0.03, 1)]);

        assert_eq!(book.on_demand_price("m5.large"), Some(0.096));
        assert_eq!(book.on_demand_price("c5.large"), None);
        assert_eq!(book.spot_price("m5.large", "us-west-2a"), Some(0.03));
        assert_eq!(book.spot_price("m5.large", "us-west-2c"), None);
        assert_eq!(book.spot_len(), 1);
    }
}
