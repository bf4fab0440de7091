use rust_decimal::Decimal;

/// Parse a matched amount such as `"3,49"` or `"12.99"`.
///
/// A comma is treated as the decimal separator. Returns `None` for text
/// that is not a plain decimal number.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    raw.trim().replace(',', ".").parse::<Decimal>().ok()
}

/// `true` when `price` is strictly positive and not above `ceiling`.
#[must_use]
pub fn is_plausible(price: Decimal, ceiling: Decimal) -> bool {
    price > Decimal::ZERO && price <= ceiling
}
