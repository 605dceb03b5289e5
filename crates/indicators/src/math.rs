//! Decimal helpers.

use rust_decimal::Decimal;

/// `numerator / denominator`, or `None` when the denominator is zero.
#[must_use]
pub fn checked_ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

/// Least-squares fit of `values` against `x = 0, 1, .., n-1`.
///
/// Returns `(slope, intercept)`; `None` for fewer than two points.
#[must_use]
pub fn linear_fit(values: impl IntoIterator<Item = Decimal>) -> Option<(Decimal, Decimal)> {
    let mut n = Decimal::ZERO;
    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_xx = Decimal::ZERO;

    for y in values {
        let x = n;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
        n += Decimal::ONE;
    }

    if n < Decimal::TWO {
        return None;
    }

    let slope = checked_ratio(n * sum_xy - sum_x * sum_y, n * sum_xx - sum_x * sum_x)?;
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

/// Value of the least-squares line at the newest point (`x = n - 1`).
#[must_use]
pub fn linreg_endpoint(values: &[Decimal]) -> Option<Decimal> {
    let (slope, intercept) = linear_fit(values.iter().copied())?;
    let last_x = Decimal::from(values.len() - 1);
    Some(intercept + slope * last_x)
}

/// Clamps into `[0, 1]`.
#[must_use]
pub fn unit(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_linear_fit_exact_line() {
        let (slope, intercept) = linear_fit([dec!(1), dec!(3), dec!(5), dec!(7)]).unwrap();
        assert_eq!(slope, dec!(2));
        assert_eq!(intercept, dec!(1));
    }

    #[test]
    fn test_linear_fit_needs_two_points() {
        assert_eq!(linear_fit([dec!(1)]), None);
        assert_eq!(linear_fit(Vec::<Decimal>::new()), None);
    }

    #[test]
    fn test_linreg_endpoint() {
        assert_eq!(linreg_endpoint(&[dec!(2), dec!(4), dec!(6)]), Some(dec!(6)));
        // noisy: y = [1, 3, 2] -> slope 0.5, intercept 1.5, endpoint 2.5
        assert_eq!(linreg_endpoint(&[dec!(1), dec!(3), dec!(2)]), Some(dec!(2.5)));
    }

    #[test]
    fn test_checked_ratio() {
        assert_eq!(checked_ratio(dec!(1), dec!(0)), None);
        assert_eq!(checked_ratio(dec!(1), dec!(4)), Some(dec!(0.25)));
    }

    #[test]
    fn test_unit_clamp() {
        assert_eq!(unit(dec!(1.5)), dec!(1));
        assert_eq!(unit(dec!(-0.5)), dec!(0));
        assert_eq!(unit(dec!(0.3)), dec!(0.3));
    }
}
