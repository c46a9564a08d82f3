//! Unit of measure service: validation and conversion.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use tech_store_core::UomName;

use crate::db::{RepositoryError, UomStore};
use crate::error::{RegistryError, ValidationError};
use crate::models::{NewUom, Uom};

/// Reject a fractional `quantity` for a whole-number unit.
///
/// # Errors
///
/// Returns [`ValidationError::FractionalQuantity`].
pub fn validate_quantity(uom: &Uom, quantity: Decimal) -> Result<(), ValidationError> {
    if uom.must_be_whole_number && !quantity.fract().is_zero() {
        return Err(ValidationError::FractionalQuantity {
            uom: uom.name.clone(),
            quantity,
        });
    }
    Ok(())
}

/// Unit of measure service over a record store.
pub struct UomService<S> {
    store: Arc<S>,
}

impl<S> Clone for UomService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> UomService<S>
where
    S: UomStore,
{
    /// Create a new unit of measure service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a unit.
    ///
    /// A unit with a base must name an existing standalone unit of the same
    /// type and carry a positive conversion factor.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first rule broken.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub fn create(&self, new: NewUom) -> Result<Uom, RegistryError> {
        if self.store.get_uom(&new.name)?.is_some() {
            return Err(ValidationError::DuplicateUom(new.name).into());
        }

        let conversion_factor = match &new.base_uom {
            Some(base_name) => {
                self.validate_base(&new, base_name)?;
                match new.conversion_factor {
                    Some(factor) if factor > Decimal::ZERO => Some(factor),
                    _ => return Err(ValidationError::NonPositiveFactor(new.name).into()),
                }
            }
            None => None,
        };

        let uom = Uom {
            name: new.name,
            symbol: new.symbol,
            uom_type: new.uom_type,
            must_be_whole_number: new.must_be_whole_number,
            enabled: new.enabled,
            is_default: new.is_default,
            base_uom: new.base_uom,
            conversion_factor,
            description: new.description,
        };

        let name = uom.name.clone();
        let stored = match self.store.insert_uom(uom) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict(_)) => {
                return Err(ValidationError::DuplicateUom(name).into());
            }
            Err(e) => return Err(e.into()),
        };
        info!(symbol = %stored.symbol, "Created unit of measure");
        Ok(stored)
    }

    fn validate_base(&self, new: &NewUom, base_name: &UomName) -> Result<(), RegistryError> {
        if *base_name == new.name {
            return Err(ValidationError::SelfReferencingBase(new.name.clone()).into());
        }
        let base = self.require(base_name)?;
        if base.base_uom.is_some() {
            return Err(ValidationError::NestedBaseUom(base.name).into());
        }
        if base.uom_type != new.uom_type {
            return Err(ValidationError::BaseUomTypeMismatch {
                base: base.name,
                base_type: base.uom_type,
                expected: new.uom_type,
            }
            .into());
        }
        Ok(())
    }

    /// Fetch a unit by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get(&self, name: &UomName) -> Result<Option<Uom>, RegistryError> {
        Ok(self.store.get_uom(name)?)
    }

    /// All units, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list(&self) -> Result<Vec<Uom>, RegistryError> {
        Ok(self.store.list_uoms()?)
    }

    /// Convert `quantity` of `from` into `to` through their shared base.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UomNotFound`],
    /// [`ValidationError::IncompatibleUoms`] when the units have no common
    /// base, or [`ValidationError::FractionalQuantity`] when either side is a
    /// whole-number unit and its quantity is fractional.
    pub fn convert(
        &self,
        quantity: Decimal,
        from: &UomName,
        to: &UomName,
    ) -> Result<Decimal, RegistryError> {
        let from_uom = self.require(from)?;
        let to_uom = self.require(to)?;

        if from_uom.uom_type != to_uom.uom_type || from_uom.base_name() != to_uom.base_name() {
            return Err(ValidationError::IncompatibleUoms {
                from: from.clone(),
                to: to.clone(),
            }
            .into());
        }
        validate_quantity(&from_uom, quantity)?;

        let converted = (quantity * from_uom.factor_to_base() / to_uom.factor_to_base()).normalize();
        validate_quantity(&to_uom, converted)?;
        Ok(converted)
    }

    fn require(&self, name: &UomName) -> Result<Uom, RegistryError> {
        self.store
            .get_uom(name)?
            .ok_or_else(|| ValidationError::UomNotFound(name.clone()).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::UomType;

    fn name(s: &str) -> UomName {
        UomName::parse(s).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn service() -> UomService<MemoryStore> {
        let service = UomService::new(Arc::new(MemoryStore::new()));
        service
            .create(NewUom::new(name("Each"), "Ea", UomType::Quantity).whole())
            .unwrap();
        service
            .create(
                NewUom::new(name("Dozen"), "Dz", UomType::Quantity)
                    .whole()
                    .based_on(name("Each"), dec("12")),
            )
            .unwrap();
        service
            .create(NewUom::new(name("Kilogram"), "Kg", UomType::Weight))
            .unwrap();
        service
            .create(
                NewUom::new(name("Gram"), "g", UomType::Weight)
                    .based_on(name("Kilogram"), dec("0.001")),
            )
            .unwrap();
        service
    }

    #[test]
    fn test_convert_through_base() {
        let service = service();
        assert_eq!(
            service.convert(dec("2"), &name("Dozen"), &name("Each")).unwrap(),
            dec("24")
        );
        assert_eq!(
            service.convert(dec("36"), &name("Each"), &name("Dozen")).unwrap(),
            dec("3")
        );
        assert_eq!(
            service.convert(dec("1500"), &name("Gram"), &name("Kilogram")).unwrap(),
            dec("1.5")
        );
    }

    #[test]
    fn test_convert_rejects_fractions_for_whole_units() {
        let service = service();
        let err = service
            .convert(dec("1.5"), &name("Each"), &name("Each"))
            .unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::FractionalQuantity { .. })
        ));

        // 5 Each is not a whole number of dozens.
        assert!(service.convert(dec("5"), &name("Each"), &name("Dozen")).is_err());
    }

    #[test]
    fn test_convert_incompatible_types() {
        let service = service();
        let err = service
            .convert(dec("1"), &name("Each"), &name("Kilogram"))
            .unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::IncompatibleUoms { .. })
        ));
    }

    #[test]
    fn test_base_rules() {
        let service = service();

        let err = service
            .create(NewUom::new(name("Loop"), "L", UomType::Other).based_on(name("Loop"), dec("1")))
            .unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::SelfReferencingBase(_))
        ));

        let err = service
            .create(
                NewUom::new(name("Gross"), "Gr", UomType::Quantity)
                    .based_on(name("Dozen"), dec("12")),
            )
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::NestedBaseUom(name("Dozen")))
        );

        let err = service
            .create(
                NewUom::new(name("Pound"), "lb", UomType::Weight)
                    .based_on(name("Each"), dec("1")),
            )
            .unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::BaseUomTypeMismatch { .. })
        ));

        let err = service
            .create(
                NewUom::new(name("Tonne"), "t", UomType::Weight)
                    .based_on(name("Kilogram"), dec("0")),
            )
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::NonPositiveFactor(name("Tonne")))
        );

        let err = service
            .create(NewUom::new(name("Each"), "Ea", UomType::Quantity))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::DuplicateUom(name("Each")))
        );
    }

    #[test]
    fn test_factor_without_base_is_dropped() {
        let service = service();
        let mut new = NewUom::new(name("Hour"), "Hr", UomType::Time);
        new.conversion_factor = Some(dec("60"));
        let uom = service.create(new).unwrap();
        assert_eq!(uom.conversion_factor, None);
    }
}
