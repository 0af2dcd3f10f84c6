//! Vehicle-slot expansion shared by the constructors and the assigner.
//!
//! A [`VehicleType`] with `count = k` expands into `k` indistinguishable
//! slots (§3's "Slot"); several algorithms (Nearest Neighbor §4.6, Sweep
//! §4.7, the GA/ACO random-solution builders §4.10/§4.11, and the assigner
//! §4.13) all iterate over this same expansion, in the caller-supplied
//! vehicle order.

use crate::types::{VehicleSlotId, VehicleType};

/// One physical vehicle, ready to be packed by a constructor.
#[derive(Debug, Clone)]
pub struct Slot {
    pub id: VehicleSlotId,
    pub capacity: u32,
}

/// Expand every vehicle type into `count` slots, in type order then
/// slot-index order: the deterministic iteration order §5 requires.
pub fn expand_slots(vehicles: &[VehicleType]) -> Vec<Slot> {
    let mut slots = Vec::new();
    for vehicle in vehicles {
        for slot_index in 0..vehicle.count {
            slots.push(Slot {
                id: VehicleSlotId {
                    vehicle_type_id: vehicle.id.clone(),
                    slot_index,
                },
                capacity: vehicle.capacity,
            });
        }
    }
    slots
}
