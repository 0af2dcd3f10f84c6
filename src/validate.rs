//! Input validation (§4.15): the CORE accepts or rejects an instance before
//! any algorithm runs.

use crate::error::{VrpError, VrpResult};
use crate::types::Instance;

pub const MAX_LOCATIONS: usize = 100;
pub const MAX_VEHICLE_TYPES: usize = 20;

/// Reject an instance outright (`BadInput`, §7) rather than silently
/// truncating it.
pub fn validate_instance(instance: &Instance) -> VrpResult<()> {
    if instance.locations.is_empty() {
        return Err(VrpError::bad_input("locations list is empty"));
    }
    if instance.vehicles.is_empty() {
        return Err(VrpError::bad_input("vehicles list is empty"));
    }
    if instance.locations.len() > MAX_LOCATIONS {
        return Err(VrpError::bad_input(format!("{} locations exceeds the {MAX_LOCATIONS}-location limit", instance.locations.len())));
    }
    if instance.vehicles.len() > MAX_VEHICLE_TYPES {
        return Err(VrpError::bad_input(format!("{} vehicle types exceeds the {MAX_VEHICLE_TYPES}-type limit", instance.vehicles.len())));
    }

    let depot_count = instance.locations.iter().filter(|l| l.is_depot).count();
    if depot_count == 0 {
        return Err(VrpError::bad_input("no depot marked among locations"));
    }
    if depot_count > 1 {
        return Err(VrpError::bad_input(format!("{depot_count} locations marked as depot, exactly one is required")));
    }

    if let Some(location) = instance.locations.iter().find(|l| !l.coordinate().is_finite()) {
        return Err(VrpError::bad_input(format!("location '{}' has a non-finite coordinate", location.id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, VehicleType};

    fn valid_instance() -> Instance {
        Instance::new(
            vec![Location::depot("D", "Depot", 0.0, 0.0), Location::new("A", "A", 0.0, 1.0, 5)],
            vec![VehicleType::new("v", "Van", 10, 1)],
        )
    }

    #[test]
    fn accepts_a_well_formed_instance() {
        assert!(validate_instance(&valid_instance()).is_ok());
    }

    #[test]
    fn rejects_a_missing_depot() {
        let mut instance = valid_instance();
        instance.locations[0].is_depot = false;
        assert!(matches!(validate_instance(&instance), Err(VrpError::BadInput(_))));
    }

    #[test]
    fn rejects_an_oversized_instance() {
        // S5: 101 locations is BadInput before any algorithm runs.
        let mut locations = vec![Location::depot("D", "Depot", 0.0, 0.0)];
        for i in 0..100 {
            locations.push(Location::new(format!("L{i}"), format!("L{i}"), 0.0, i as f64, 1));
        }
        let instance = Instance::new(locations, vec![VehicleType::new("v", "Van", 10, 1)]);
        assert!(matches!(validate_instance(&instance), Err(VrpError::BadInput(_))));
    }

    #[test]
    fn rejects_a_non_finite_coordinate() {
        let mut instance = valid_instance();
        instance.locations[1].lat = f64::NAN;
        assert!(matches!(validate_instance(&instance), Err(VrpError::BadInput(_))));
    }

    #[test]
    fn rejects_an_empty_vehicle_list() {
        let mut instance = valid_instance();
        instance.vehicles.clear();
        assert!(matches!(validate_instance(&instance), Err(VrpError::BadInput(_))));
    }
}
