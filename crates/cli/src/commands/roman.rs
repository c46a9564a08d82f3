//! Roman numeral conversion commands.

use tracing::info;

/// Print the Roman numeral for `value`.
///
/// # Errors
///
/// Returns an error if `value` is outside 1..=3999.
pub fn to_roman(value: u32) -> Result<(), Box<dyn std::error::Error>> {
    let numeral = tech_store_core::to_roman(value)?;
    info!("{value} = {numeral}");
    Ok(())
}

/// Print the integer value of `numeral`.
///
/// # Errors
///
/// Returns an error if `numeral` is not a valid Roman numeral.
pub fn from_roman(numeral: &str) -> Result<(), Box<dyn std::error::Error>> {
    let value = tech_store_core::from_roman(numeral)?;
    info!("{} = {value}", numeral.trim().to_uppercase());
    Ok(())
}
