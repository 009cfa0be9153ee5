use super::cart::ProductId;

/// Server-owned availability for one product, as last read by the client.
///
/// Only used to pre-validate increments; the backend stays the authority and
/// may still reject a mutation if this snapshot is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockSnapshot {
    pub product_id: ProductId,
    pub available_quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    Available,
    AtMax,
    OutOfStock,
}

pub fn can_increment(current_qty_in_cart: u32, available_stock: u32) -> bool {
    current_qty_in_cart < available_stock
}

pub fn is_out_of_stock(available_stock: u32) -> bool {
    available_stock == 0
}

pub fn is_at_max(current_qty_in_cart: u32, available_stock: u32) -> bool {
    !is_out_of_stock(available_stock) && !can_increment(current_qty_in_cart, available_stock)
}

pub fn classify(current_qty_in_cart: u32, available_stock: u32) -> StockStatus {
    if is_out_of_stock(available_stock) {
        StockStatus::OutOfStock
    } else if can_increment(current_qty_in_cart, available_stock) {
        StockStatus::Available
    } else {
        StockStatus::AtMax
    }
}

impl StockSnapshot {
    pub fn status_for(&self, current_qty_in_cart: u32) -> StockStatus {
        classify(current_qty_in_cart, self.available_quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_allowed_below_available() {
        assert!(can_increment(0, 1));
        assert!(can_increment(4, 5));
    }

    #[test]
    fn increment_boundary() {
        let available = 7;
        assert!(can_increment(available - 1, available));
        assert!(!can_increment(available, available));
        assert!(!can_increment(available + 1, available));
    }

    #[test]
    fn zero_stock_is_out_of_stock_not_at_max() {
        assert!(is_out_of_stock(0));
        assert!(!is_at_max(0, 0));
        assert_eq!(classify(0, 0), StockStatus::OutOfStock);
    }

    #[test]
    fn at_max_is_negation_of_increment_when_in_stock() {
        for available in 1..5 {
            for current in 0..7 {
                assert_eq!(
                    is_at_max(current, available),
                    !can_increment(current, available)
                );
            }
        }
    }

    #[test]
    fn snapshot_classifies_current_quantity() {
        let snapshot = StockSnapshot {
            product_id: 7,
            available_quantity: 3,
        };
        assert_eq!(snapshot.status_for(1), StockStatus::Available);
        assert_eq!(snapshot.status_for(3), StockStatus::AtMax);
    }
}
