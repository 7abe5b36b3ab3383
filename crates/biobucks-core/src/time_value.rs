use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::BioBucksError;
use crate::types::{Money, Rate};
use crate::BioBucksResult;

/// End-of-period discount factor `(1 + rate)^(-period)`.
///
/// Built by repeated multiplication of `1 / (1 + rate)`, so for positive
/// rates the factor decays toward zero instead of compounding past the
/// decimal range.
pub fn discount_factor(rate: Rate, period: u32) -> BioBucksResult<Rate> {
    if rate <= dec!(-1) {
        return Err(BioBucksError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let step = Decimal::ONE
        .checked_div(Decimal::ONE + rate)
        .ok_or_else(|| BioBucksError::overflow(format!("1 / (1 + {rate})")))?;

    let mut factor = Decimal::ONE;
    for _ in 0..period {
        factor = match factor.checked_mul(step) {
            Some(next) => next,
            // Below the smallest representable decimal
            None if step < Decimal::ONE => return Ok(Decimal::ZERO),
            None => {
                return Err(BioBucksError::overflow(format!(
                    "discount factor (1 + {rate})^-{period}"
                )))
            }
        };
        if factor.is_zero() {
            break;
        }
    }

    Ok(factor)
}

/// Net Present Value of a series of cash flows, the first at period 0
pub fn npv(rate: Rate, cash_flows: &[Money]) -> BioBucksResult<Money> {
    if rate <= dec!(-1) {
        return Err(BioBucksError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                BioBucksError::FinancialImpossibility(format!(
                    "NPV discount overflows at period {t}"
                ))
            })?;
        }
        if discount.is_zero() {
            return Err(BioBucksError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_factor_period_zero_is_one() {
        assert_eq!(discount_factor(dec!(0.10), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_discount_factor_ten_percent() {
        let df = discount_factor(dec!(0.10), 2).unwrap();
        assert!((df - Decimal::ONE / dec!(1.21)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_discount_factor_zero_rate() {
        for period in 0..20 {
            assert_eq!(discount_factor(Decimal::ZERO, period).unwrap(), Decimal::ONE);
        }
    }

    #[test]
    fn test_discount_factor_rejects_total_loss_rate() {
        assert!(discount_factor(dec!(-1), 3).is_err());
        assert!(discount_factor(dec!(-1.5), 3).is_err());
    }

    #[test]
    fn test_discount_factor_high_rate_decays_to_zero() {
        assert_eq!(discount_factor(Decimal::ONE, 3).unwrap(), dec!(0.125));

        let mut previous = Decimal::ONE;
        for period in 0..=200 {
            let df = discount_factor(Decimal::ONE, period).unwrap();
            assert!(df >= Decimal::ZERO && df <= previous, "period {period}");
            previous = df;
        }
        assert!(previous < dec!(0.0000000000000000001));
    }

    #[test]
    fn test_discount_factor_negative_rate_overflow_is_an_error() {
        // 1 / 0.05 = 20 per period grows past the decimal range
        let err = discount_factor(dec!(-0.95), 200).unwrap_err();
        assert!(matches!(err, BioBucksError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_npv_matches_manual_sum() {
        let flows = [dec!(-100), dec!(55), dec!(60.5)];
        let value = npv(dec!(0.10), &flows).unwrap();
        // -100 + 55/1.1 + 60.5/1.21 = -100 + 50 + 50
        assert!(value.abs() < dec!(0.0000001), "got {value}");
    }

    #[test]
    fn test_npv_empty_series() {
        assert_eq!(npv(dec!(0.08), &[]).unwrap(), Decimal::ZERO);
    }
}
