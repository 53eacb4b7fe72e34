use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orders::error::OrderError;

/// Kind of a total-bill discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percent,
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percent => "percent",
            DiscountKind::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A total-bill discount specification: a value interpreted against the cart
/// subtotal according to its kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountSpec {
    pub value: Decimal,
    pub kind: DiscountKind,
}

impl DiscountSpec {
    /// A no-op discount
    pub fn none() -> Self {
        Self {
            value: Decimal::ZERO,
            kind: DiscountKind::Fixed,
        }
    }

    /// Builds a spec from free-form client input (a text field on the POS
    /// screen). Non-numeric or negative input collapses to a zero discount
    /// rather than erroring.
    pub fn from_input(raw: &str, kind: DiscountKind) -> Self {
        let value = raw
            .trim()
            .parse::<Decimal>()
            .ok()
            .filter(|v| *v >= Decimal::ZERO)
            .unwrap_or(Decimal::ZERO);

        Self { value, kind }
    }
}

/// One candidate line of a cart: what the customer is buying, at what listed
/// price, and the minimum net price the shop will accept for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartLine {
    pub quantity: i32,
    pub sell_price: Decimal,
    pub floor_price: Decimal,
}

/// What to do when the requested discount exceeds the floor-price headroom
///
/// The POS live cart auto-corrects the input down to the maximum; the
/// post-sale order editor rejects outright. Both are deliberate, distinct
/// policies of the same calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    Reject,
    ClampToMax,
}

/// The result of quoting a cart: every derived amount the client preview and
/// the server-side authoritative recomputation must agree on
#[derive(Debug, Clone, Serialize)]
pub struct CartQuote {
    /// Sum of quantity x sell price over retained lines
    pub subtotal: Decimal,
    /// Headroom between subtotal and the aggregate floor; may be negative
    pub max_discount: Decimal,
    /// Effective discount, truncated down to a whole currency unit
    pub discount: Decimal,
    /// Subtotal minus discount, rounded up to a whole currency unit
    pub grand_total: Decimal,
    /// True when ClampToMax corrected an oversized discount
    pub clamped: bool,
    /// The spec actually applied (the corrected one when clamped)
    pub applied: DiscountSpec,
    /// Per-unit discount allocation, parallel to the input lines; zero for
    /// dropped (non-positive quantity) lines
    pub unit_discounts: Vec<Decimal>,
}

/// Pure cart arithmetic shared by the checkout preview and the order
/// reconciliation paths
///
/// Rounding directions are policy, not accident: the discount is floored and
/// the grand total is ceiled so the shop never under-collects, and the two
/// roundings cannot compound into a net loss.
pub struct CartCalculator;

impl CartCalculator {
    /// Tolerance when comparing a discount against the maximum, absorbing
    /// decimal noise from client-side arithmetic
    pub fn epsilon() -> Decimal {
        Decimal::new(1, 2) // 0.01
    }

    /// Quote a cart against a discount specification
    ///
    /// Lines with a non-positive quantity are dropped before any arithmetic.
    /// Under `OverflowPolicy::Reject` an oversized discount fails with the
    /// computed maximum; under `ClampToMax` the spec is corrected to a fixed
    /// discount of the maximum and the quote is flagged as clamped.
    pub fn quote(
        lines: &[CartLine],
        spec: &DiscountSpec,
        policy: OverflowPolicy,
    ) -> Result<CartQuote, OrderError> {
        let retained: Vec<&CartLine> = lines.iter().filter(|l| l.quantity > 0).collect();

        let subtotal: Decimal = retained
            .iter()
            .map(|l| Decimal::from(l.quantity) * l.sell_price)
            .sum();

        let floor_total: Decimal = retained
            .iter()
            .map(|l| Decimal::from(l.quantity) * l.floor_price)
            .sum();

        let max_discount = subtotal - floor_total;

        let raw_discount = match spec.kind {
            DiscountKind::Percent => subtotal * spec.value / Decimal::from(100),
            DiscountKind::Fixed => spec.value,
        };

        // Negative specs never reach here via from_input, but the calculator
        // guards anyway: a discount can only reduce the bill
        let mut discount = raw_discount.floor().max(Decimal::ZERO);
        let mut clamped = false;
        let mut applied = *spec;

        if discount > max_discount + Self::epsilon() {
            let allowed = max_discount.floor().max(Decimal::ZERO);
            match policy {
                OverflowPolicy::Reject => {
                    return Err(OrderError::DiscountExceedsMax { max: allowed });
                }
                OverflowPolicy::ClampToMax => {
                    discount = allowed;
                    clamped = true;
                    applied = DiscountSpec {
                        value: allowed,
                        kind: DiscountKind::Fixed,
                    };
                }
            }
        }

        let grand_total = (subtotal - discount).ceil();

        let unit_discounts = Self::allocate(lines, subtotal, discount);

        Ok(CartQuote {
            subtotal,
            max_discount,
            discount,
            grand_total,
            clamped,
            applied,
            unit_discounts,
        })
    }

    /// Distribute the effective discount across lines in proportion to each
    /// line's share of subtotal, then divide by quantity for a per-unit
    /// amount. Best-effort bookkeeping for the order items; the order total
    /// never depends on it.
    fn allocate(lines: &[CartLine], subtotal: Decimal, discount: Decimal) -> Vec<Decimal> {
        lines
            .iter()
            .map(|line| {
                if line.quantity <= 0 || subtotal.is_zero() {
                    return Decimal::ZERO;
                }
                let quantity = Decimal::from(line.quantity);
                let line_subtotal = quantity * line.sell_price;
                let line_discount = discount * line_subtotal / subtotal;
                line_discount / quantity
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i32, sell: Decimal, floor: Decimal) -> CartLine {
        CartLine {
            quantity,
            sell_price: sell,
            floor_price: floor,
        }
    }

    #[test]
    fn test_plain_cart_no_discount() {
        // [{qty: 2, sell: 50}, {qty: 1, sell: 30}] with no discount -> 130
        let lines = vec![
            line(2, dec!(50), dec!(40)),
            line(1, dec!(30), dec!(25)),
        ];

        let quote =
            CartCalculator::quote(&lines, &DiscountSpec::none(), OverflowPolicy::Reject).unwrap();

        assert_eq!(quote.subtotal, dec!(130));
        assert_eq!(quote.discount, Decimal::ZERO);
        assert_eq!(quote.grand_total, dec!(130));
        assert!(!quote.clamped);
    }

    #[test]
    fn test_fixed_discount_within_max() {
        // subtotal 1000, max 150, fixed 100 -> total 900
        let lines = vec![line(10, dec!(100), dec!(85))];
        let spec = DiscountSpec {
            value: dec!(100),
            kind: DiscountKind::Fixed,
        };

        let quote = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject).unwrap();

        assert_eq!(quote.subtotal, dec!(1000));
        assert_eq!(quote.max_discount, dec!(150));
        assert_eq!(quote.discount, dec!(100));
        assert_eq!(quote.grand_total, dec!(900));
    }

    #[test]
    fn test_percent_discount_exceeding_max_is_rejected_with_max() {
        // subtotal 1000, max 150, 20% -> raw 200 > 150 -> rejected carrying 150
        let lines = vec![line(10, dec!(100), dec!(85))];
        let spec = DiscountSpec {
            value: dec!(20),
            kind: DiscountKind::Percent,
        };

        let err = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject).unwrap_err();

        match err {
            OrderError::DiscountExceedsMax { max } => assert_eq!(max, dec!(150)),
            other => panic!("Expected DiscountExceedsMax, got {:?}", other),
        }
    }

    #[test]
    fn test_percent_discount_exceeding_max_is_clamped_in_live_cart() {
        let lines = vec![line(10, dec!(100), dec!(85))];
        let spec = DiscountSpec {
            value: dec!(20),
            kind: DiscountKind::Percent,
        };

        let quote = CartCalculator::quote(&lines, &spec, OverflowPolicy::ClampToMax).unwrap();

        assert!(quote.clamped);
        assert_eq!(quote.discount, dec!(150));
        assert_eq!(quote.applied.kind, DiscountKind::Fixed);
        assert_eq!(quote.applied.value, dec!(150));
        assert_eq!(quote.grand_total, dec!(850));
    }

    #[test]
    fn test_discount_is_floored_and_total_is_ceiled() {
        // 3 x 33.33 = 99.99 subtotal; 10% -> raw 9.999 -> floored to 9
        // total = ceil(99.99 - 9) = ceil(90.99) = 91
        let lines = vec![line(3, dec!(33.33), dec!(0))];
        let spec = DiscountSpec {
            value: dec!(10),
            kind: DiscountKind::Percent,
        };

        let quote = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject).unwrap();

        assert_eq!(quote.discount, dec!(9));
        assert_eq!(quote.grand_total, dec!(91));
    }

    #[test]
    fn test_negative_headroom_allows_no_discount() {
        // Floor above sell: max_discount negative, any discount rejected,
        // reported maximum clamped to zero
        let lines = vec![line(1, dec!(10), dec!(15))];
        let spec = DiscountSpec {
            value: dec!(1),
            kind: DiscountKind::Fixed,
        };

        let err = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject).unwrap_err();
        match err {
            OrderError::DiscountExceedsMax { max } => assert_eq!(max, Decimal::ZERO),
            other => panic!("Expected DiscountExceedsMax, got {:?}", other),
        }

        // A zero discount still quotes fine
        let quote =
            CartCalculator::quote(&lines, &DiscountSpec::none(), OverflowPolicy::Reject).unwrap();
        assert_eq!(quote.grand_total, dec!(10));
        assert!(quote.max_discount < Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_quantities_are_dropped() {
        let lines = vec![
            line(2, dec!(50), dec!(40)),
            line(0, dec!(99), dec!(0)),
            line(-3, dec!(99), dec!(0)),
        ];

        let quote =
            CartCalculator::quote(&lines, &DiscountSpec::none(), OverflowPolicy::Reject).unwrap();

        assert_eq!(quote.subtotal, dec!(100));
        assert_eq!(quote.unit_discounts.len(), 3);
        assert_eq!(quote.unit_discounts[1], Decimal::ZERO);
        assert_eq!(quote.unit_discounts[2], Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart_quotes_to_zero() {
        let quote =
            CartCalculator::quote(&[], &DiscountSpec::none(), OverflowPolicy::Reject).unwrap();

        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.grand_total, Decimal::ZERO);
        assert!(quote.unit_discounts.is_empty());
    }

    #[test]
    fn test_allocation_conserves_discount() {
        let lines = vec![
            line(2, dec!(50), dec!(10)),
            line(1, dec!(30), dec!(5)),
            line(4, dec!(12.50), dec!(2)),
        ];
        let spec = DiscountSpec {
            value: dec!(45),
            kind: DiscountKind::Fixed,
        };

        let quote = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject).unwrap();

        let redistributed: Decimal = lines
            .iter()
            .zip(quote.unit_discounts.iter())
            .map(|(l, per_unit)| Decimal::from(l.quantity) * *per_unit)
            .sum();

        let deviation = (redistributed - quote.discount).abs();
        assert!(
            deviation < dec!(0.0001),
            "allocation lost {} of the discount",
            deviation
        );
    }

    #[test]
    fn test_zero_subtotal_allocation_is_all_zero() {
        // Zero-priced lines: proportion must not divide by zero
        let lines = vec![line(2, dec!(0), dec!(0))];

        let quote =
            CartCalculator::quote(&lines, &DiscountSpec::none(), OverflowPolicy::Reject).unwrap();

        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.unit_discounts, vec![Decimal::ZERO]);
    }

    #[test]
    fn test_from_input_parses_valid_values() {
        let spec = DiscountSpec::from_input(" 12.5 ", DiscountKind::Percent);
        assert_eq!(spec.value, dec!(12.5));
        assert_eq!(spec.kind, DiscountKind::Percent);
    }

    #[test]
    fn test_from_input_collapses_garbage_to_zero() {
        for raw in ["abc", "", "  ", "-5", "1.2.3", "NaN"] {
            let spec = DiscountSpec::from_input(raw, DiscountKind::Fixed);
            assert_eq!(spec.value, Decimal::ZERO, "input {:?} should collapse", raw);
        }
    }

    #[test]
    fn test_discount_at_exact_max_is_accepted() {
        let lines = vec![line(10, dec!(100), dec!(85))];
        let spec = DiscountSpec {
            value: dec!(150),
            kind: DiscountKind::Fixed,
        };

        let quote = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject).unwrap();
        assert_eq!(quote.discount, dec!(150));
        assert_eq!(quote.grand_total, dec!(850));
    }

    #[test]
    fn test_epsilon_absorbs_float_noise() {
        // One cent over the max is tolerated, one unit over is not
        let lines = vec![line(10, dec!(100), dec!(85))];

        let just_over = DiscountSpec {
            value: dec!(150.01),
            kind: DiscountKind::Fixed,
        };
        // 150.01 floors to 150 which is within max anyway; craft a max with
        // fractional headroom instead
        let fractional = vec![line(1, dec!(100), dec!(49.50))]; // max 50.50
        let spec = DiscountSpec {
            value: dec!(50),
            kind: DiscountKind::Fixed,
        };
        assert!(CartCalculator::quote(&fractional, &spec, OverflowPolicy::Reject).is_ok());

        let over = DiscountSpec {
            value: dec!(52),
            kind: DiscountKind::Fixed,
        };
        assert!(CartCalculator::quote(&fractional, &over, OverflowPolicy::Reject).is_err());

        assert!(CartCalculator::quote(&lines, &just_over, OverflowPolicy::Reject).is_ok());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn cents(c: u32) -> Decimal {
        Decimal::from(c) / Decimal::from(100)
    }

    /// For every passing quote, the effective discount stays inside
    /// [0, max(0, max_discount) + epsilon] and never exceeds the subtotal's
    /// floor headroom
    #[test]
    fn prop_discount_bounded_by_headroom() {
        proptest!(|(
            quantities in prop::collection::vec(1i32..=50, 1..=8),
            sell_cents in prop::collection::vec(100u32..=50000u32, 1..=8),
            discount_value in 0u32..=200u32
        )| {
            let count = quantities.len().min(sell_cents.len());
            let lines: Vec<CartLine> = (0..count)
                .map(|i| CartLine {
                    quantity: quantities[i],
                    sell_price: cents(sell_cents[i]),
                    // Floor at 80% of sell leaves headroom on every line
                    floor_price: cents(sell_cents[i]) * Decimal::new(8, 1),
                })
                .collect();

            let spec = DiscountSpec {
                value: Decimal::from(discount_value),
                kind: DiscountKind::Percent,
            };

            if let Ok(quote) = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject) {
                prop_assert!(quote.discount >= Decimal::ZERO);
                prop_assert!(
                    quote.discount <= quote.max_discount.max(Decimal::ZERO) + CartCalculator::epsilon()
                );
            }
        });
    }

    /// grand_total = ceil(subtotal - discount) always holds, and the total
    /// never drops below the floor-respecting minimum
    #[test]
    fn prop_grand_total_identity() {
        proptest!(|(
            quantities in prop::collection::vec(1i32..=50, 1..=8),
            sell_cents in prop::collection::vec(100u32..=50000u32, 1..=8),
            discount_cents in 0u32..=100000u32
        )| {
            let count = quantities.len().min(sell_cents.len());
            let lines: Vec<CartLine> = (0..count)
                .map(|i| CartLine {
                    quantity: quantities[i],
                    sell_price: cents(sell_cents[i]),
                    floor_price: cents(sell_cents[i]) / Decimal::from(2),
                })
                .collect();

            let spec = DiscountSpec {
                value: cents(discount_cents),
                kind: DiscountKind::Fixed,
            };

            if let Ok(quote) = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject) {
                prop_assert_eq!(quote.grand_total, (quote.subtotal - quote.discount).ceil());
                let floor_minimum = (quote.subtotal - quote.max_discount).ceil();
                // Discount is floored and bounded by max + epsilon, so the
                // collected total can undershoot the minimum by at most the
                // epsilon's rounding, i.e. never by a whole unit
                prop_assert!(quote.grand_total >= floor_minimum - Decimal::ONE);
            }
        });
    }

    /// Clamp mode never rejects and always produces an in-bounds discount
    /// with the corrected spec forced to Fixed
    #[test]
    fn prop_clamp_mode_always_succeeds() {
        proptest!(|(
            quantity in 1i32..=50,
            sell_cents in 100u32..=50000u32,
            discount_value in 0u32..=500u32
        )| {
            let lines = vec![CartLine {
                quantity,
                sell_price: cents(sell_cents),
                floor_price: cents(sell_cents) * Decimal::new(9, 1),
            }];

            let spec = DiscountSpec {
                value: Decimal::from(discount_value),
                kind: DiscountKind::Percent,
            };

            let quote = CartCalculator::quote(&lines, &spec, OverflowPolicy::ClampToMax).unwrap();
            prop_assert!(quote.discount <= quote.max_discount.max(Decimal::ZERO) + CartCalculator::epsilon());
            if quote.clamped {
                prop_assert_eq!(quote.applied.kind, DiscountKind::Fixed);
                prop_assert_eq!(quote.applied.value, quote.discount);
            }
        });
    }

    /// The per-unit allocation redistributes to approximately the effective
    /// discount (exact up to Decimal division precision)
    #[test]
    fn prop_allocation_conservation() {
        proptest!(|(
            quantities in prop::collection::vec(1i32..=20, 1..=6),
            sell_cents in prop::collection::vec(100u32..=20000u32, 1..=6),
            discount_cents in 0u32..=50000u32
        )| {
            let count = quantities.len().min(sell_cents.len());
            let lines: Vec<CartLine> = (0..count)
                .map(|i| CartLine {
                    quantity: quantities[i],
                    sell_price: cents(sell_cents[i]),
                    floor_price: Decimal::ZERO,
                })
                .collect();

            let spec = DiscountSpec {
                value: cents(discount_cents),
                kind: DiscountKind::Fixed,
            };

            if let Ok(quote) = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject) {
                let redistributed: Decimal = lines
                    .iter()
                    .zip(quote.unit_discounts.iter())
                    .map(|(l, d)| Decimal::from(l.quantity) * *d)
                    .sum();

                let tolerance = Decimal::new(1, 2) * Decimal::from(count as i64);
                prop_assert!((redistributed - quote.discount).abs() <= tolerance);
            }
        });
    }
}
