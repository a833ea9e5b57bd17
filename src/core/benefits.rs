use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

use super::money::{round_to, round2};

const COMMUTATION_DISCOUNT_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
pub const EARLY_RETIREMENT_PCT: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
pub const LATE_RETIREMENT_PCT: Decimal = Decimal::from_parts(2, 0, 0, false, 2);
const ANNUITY_FACTOR_DP: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BenefitError {
    #[error("{0} must be >= 1")]
    NotPositive(&'static str),
    #[error("{0} must be >= 0")]
    Negative(&'static str),
    #[error("{0} overflowed")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbAccrual {
    pub annual_accrual: Decimal,
    pub total_pension: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnuityQuote {
    pub periodic_payment: Decimal,
    pub annuity_factor: Decimal,
}

/// Defined-benefit accrual: a fixed share of final salary per year served.
pub fn db_accrual(
    final_salary: Decimal,
    accrual_rate: Decimal,
    years_of_service: i64,
) -> Result<DbAccrual, BenefitError> {
    if years_of_service < 0 {
        return Err(BenefitError::Negative("years_of_service"));
    }
    let annual_accrual = round2(
        final_salary
            .checked_mul(accrual_rate)
            .ok_or(BenefitError::Overflow("annual_accrual"))?,
    );
    let total_pension = round2(
        annual_accrual
            .checked_mul(Decimal::from(years_of_service))
            .ok_or(BenefitError::Overflow("total_pension"))?,
    );
    Ok(DbAccrual {
        annual_accrual,
        total_pension,
    })
}

/// Level payment that exhausts `lump_sum` over `payment_periods` payments at
/// `rate_of_return` per year, paid `frequency` times a year.
pub fn annuity_conversion(
    lump_sum: Decimal,
    rate_of_return: Decimal,
    payment_periods: u32,
    frequency: u32,
) -> Result<AnnuityQuote, BenefitError> {
    if payment_periods == 0 {
        return Err(BenefitError::NotPositive("payment_periods"));
    }
    if frequency == 0 {
        return Err(BenefitError::NotPositive("payment_frequency_per_year"));
    }

    let periods = Decimal::from(payment_periods);
    let r = rate_of_return / Decimal::from(frequency);
    if r.is_zero() {
        return Ok(AnnuityQuote {
            periodic_payment: round2(lump_sum / periods),
            annuity_factor: periods,
        });
    }

    let overflow = BenefitError::Overflow("annuity_factor");
    let compounded = Decimal::ONE
        .saturating_add(r)
        .checked_powi(i64::from(payment_periods))
        .ok_or(overflow.clone())?;
    let discount = Decimal::ONE
        .checked_div(compounded)
        .ok_or(overflow.clone())?;
    let factor = r
        .checked_div(Decimal::ONE - discount)
        .ok_or(overflow)?;
    let annuity_factor = round_to(factor, ANNUITY_FACTOR_DP);
    let periodic_payment = round2(
        lump_sum
            .checked_mul(annuity_factor)
            .ok_or(BenefitError::Overflow("periodic_payment"))?,
    );
    Ok(AnnuityQuote {
        periodic_payment,
        annuity_factor,
    })
}

/// Lump sum given up front in exchange for a share of the annuity.
pub fn commutation(annuity_payment: Decimal, commutation_pct: Decimal) -> Decimal {
    if commutation_pct <= Decimal::ZERO {
        return round2(Decimal::ZERO);
    }
    round2(
        annuity_payment
            .saturating_mul(commutation_pct)
            .checked_div(COMMUTATION_DISCOUNT_RATE)
            .unwrap_or(Decimal::MAX),
    )
}

pub fn apply_withdrawal(balance: Decimal, withdrawal: Decimal) -> Decimal {
    round2(balance.saturating_sub(withdrawal).max(Decimal::ZERO))
}

pub fn early_retirement_adjustment(
    annual_pension: Decimal,
    years_early: i64,
    pct_per_year: Decimal,
) -> Result<Decimal, BenefitError> {
    compound_adjustment(
        annual_pension,
        Decimal::ONE.saturating_sub(pct_per_year),
        years_early,
        "years_early",
    )
}

pub fn late_retirement_adjustment(
    annual_pension: Decimal,
    years_late: i64,
    pct_per_year: Decimal,
) -> Result<Decimal, BenefitError> {
    compound_adjustment(
        annual_pension,
        Decimal::ONE.saturating_add(pct_per_year),
        years_late,
        "years_late",
    )
}

fn compound_adjustment(
    base: Decimal,
    yearly_factor: Decimal,
    years: i64,
    label: &'static str,
) -> Result<Decimal, BenefitError> {
    if years < 0 {
        return Err(BenefitError::Negative(label));
    }
    let factor = yearly_factor
        .checked_powi(years)
        .ok_or(BenefitError::Overflow(label))?;
    let adjusted = base
        .checked_mul(factor)
        .ok_or(BenefitError::Overflow(label))?;
    Ok(round2(adjusted))
}
