//! SRS occasion registry
//! 
//! Fixed pool of SRS occasions in flight, keyed by (RNTI, frame, slot).
//! Records are allocated when the MAC schedules an SRS and returned to the
//! pool once their extraction has been consumed or they went stale.

use super::{SrsError, SrsPdu};
use crate::phy::frame_structure::FrameParms;
use crate::LayerError;
use common::types::Rnti;
use tracing::{debug, error, trace};

/// One SRS occasion slot of the pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SrsOccasion {
    active: bool,
    frame: u32,
    slot: u8,
    pdu: SrsPdu,
}

impl SrsOccasion {
    pub fn is_active(&self) -> bool {
        self.active
    }
    
    pub fn frame(&self) -> u32 {
        self.frame
    }
    
    pub fn slot(&self) -> u8 {
        self.slot
    }
    
    /// Configuration snapshot taken at registration
    pub fn pdu(&self) -> &SrsPdu {
        &self.pdu
    }
    
    fn matches(&self, rnti: Rnti, frame: u32, slot: u8) -> bool {
        self.active && self.pdu.rnti == rnti && self.frame == frame && self.slot == slot
    }
}

/// Pool of SRS occasions owned by one cell
#[derive(Debug, Clone)]
pub struct SrsRegistry {
    occasions: Vec<SrsOccasion>,
}

impl SrsRegistry {
    /// Create a pool of `capacity` inactive occasions
    pub fn new(capacity: usize) -> Result<Self, LayerError> {
        if capacity == 0 {
            return Err(LayerError::InvalidConfiguration(
                "SRS registry needs room for at least one occasion".to_string()
            ));
        }
        Ok(Self {
            occasions: vec![SrsOccasion::default(); capacity],
        })
    }
    
    /// Maximum number of concurrent occasions
    pub fn capacity(&self) -> usize {
        self.occasions.len()
    }
    
    /// Number of occasions currently in flight
    pub fn active_count(&self) -> usize {
        self.occasions.iter().filter(|occasion| occasion.active).count()
    }
    
    pub fn get(&self, index: usize) -> Option<&SrsOccasion> {
        self.occasions.get(index)
    }
    
    /// Index of the active occasion matching (rnti, frame, slot), otherwise of the
    /// first free occasion
    pub fn find_or_allocate(&self, rnti: Rnti, frame: u32, slot: u8) -> Result<usize, SrsError> {
        let mut free = None;
        
        for (index, occasion) in self.occasions.iter().enumerate() {
            if occasion.matches(rnti, frame, slot) {
                return Ok(index);
            }
            if !occasion.active && free.is_none() {
                free = Some(index);
            }
        }
        
        free.ok_or_else(|| {
            error!("SRS list is full, rnti {} frame {} slot {}", rnti, frame, slot);
            SrsError::RegistryFull {
                rnti,
                frame,
                slot,
                capacity: self.capacity(),
            }
        })
    }
    
    /// Register an occasion, keeping a copy of its PDU
    pub fn try_commit(&mut self, frame: u32, slot: u8, pdu: &SrsPdu) -> Result<usize, SrsError> {
        let index = self.find_or_allocate(pdu.rnti, frame, slot)?;
        
        let occasion = &mut self.occasions[index];
        occasion.frame = frame;
        occasion.slot = slot;
        occasion.active = true;
        occasion.pdu = *pdu;
        
        debug!("SRS occasion {} registered for rnti {} at {}.{}", index, pdu.rnti, frame, slot);
        Ok(index)
    }
    
    /// Register an occasion the scheduler guaranteed room for
    ///
    /// # Panics
    ///
    /// Panics when the pool is exhausted: the scheduler never plans more
    /// occasions than the pool holds, so running out means shared state is
    /// already inconsistent.
    pub fn commit(&mut self, frame: u32, slot: u8, pdu: &SrsPdu) -> usize {
        match self.try_commit(frame, slot, pdu) {
            Ok(index) => index,
            Err(e) => panic!("invalid id found for srs, rnti {}: {}", pdu.rnti, e),
        }
    }
    
    /// Return an occasion to the pool, reports whether it was active
    pub fn release(&mut self, index: usize) -> bool {
        match self.occasions.get_mut(index) {
            Some(occasion) if occasion.active => {
                occasion.active = false;
                trace!("SRS occasion {} released", index);
                true
            }
            _ => false,
        }
    }
    
    /// Release every occasion registered more than `max_age_slots` before (frame, slot)
    ///
    /// Occasions registered for a slot still ahead of (frame, slot) are kept.
    pub fn release_stale(
        &mut self,
        frame_parms: &FrameParms,
        frame: u32,
        slot: u8,
        max_age_slots: u64,
    ) -> usize {
        let mut released = 0;
        
        for (index, occasion) in self.occasions.iter_mut().enumerate() {
            if !occasion.active {
                continue;
            }
            let age = frame_parms.slot_distance((occasion.frame, occasion.slot), (frame, slot));
            if age > 0 && age as u64 > max_age_slots {
                debug!("SRS occasion {} for rnti {} went stale after {} slots",
                       index, occasion.pdu.rnti, age);
                occasion.active = false;
                released += 1;
            }
        }
        
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::SubcarrierSpacing;
    
    fn pdu(rnti: u16) -> SrsPdu {
        SrsPdu {
            rnti: Rnti::new(rnti),
            ..Default::default()
        }
    }
    
    fn frame_parms() -> FrameParms {
        FrameParms {
            scs: SubcarrierSpacing::Scs15,
            ofdm_symbol_size: 12,
            symbols_per_slot: 14,
            slots_per_frame: 10,
            nb_antennas_rx: 1,
            first_carrier_offset: 0,
            num_rbs: 1,
            slot_duration_us: 1000,
        }
    }
    
    #[test]
    fn test_empty_registry_rejected() {
        assert!(SrsRegistry::new(0).is_err());
    }
    
    #[test]
    fn test_capacity_bound() {
        let mut registry = SrsRegistry::new(4).unwrap();
        
        for (i, rnti) in (0x100..0x104).enumerate() {
            assert_eq!(registry.try_commit(10, 2, &pdu(rnti)), Ok(i));
        }
        assert_eq!(registry.active_count(), 4);
        
        let result = registry.try_commit(10, 2, &pdu(0x200));
        assert_eq!(result, Err(SrsError::RegistryFull {
            rnti: Rnti::new(0x200),
            frame: 10,
            slot: 2,
            capacity: 4,
        }));
        assert_eq!(registry.active_count(), 4);
    }
    
    #[test]
    fn test_same_ue_other_slot_is_distinct() {
        let mut registry = SrsRegistry::new(4).unwrap();
        let first = registry.commit(10, 2, &pdu(0x100));
        let other_slot = registry.commit(10, 3, &pdu(0x100));
        let other_frame = registry.commit(11, 2, &pdu(0x100));
        
        assert_eq!((first, other_slot, other_frame), (0, 1, 2));
    }
    
    #[test]
    fn test_idempotent_match() {
        let mut registry = SrsRegistry::new(2).unwrap();
        let first = registry.commit(7, 5, &pdu(0x4601));
        
        let updated = SrsPdu { comb_size: 1, ..pdu(0x4601) };
        let second = registry.commit(7, 5, &updated);
        
        assert_eq!(first, second);
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.get(first).unwrap().pdu().comb_size, 1);
    }
    
    #[test]
    fn test_match_found_after_free_slot() {
        let mut registry = SrsRegistry::new(3).unwrap();
        registry.commit(1, 0, &pdu(0x10));
        let index = registry.commit(1, 0, &pdu(0x20));
        assert!(registry.release(0));
        
        // The free record comes first but the active match wins
        assert_eq!(registry.find_or_allocate(Rnti::new(0x20), 1, 0), Ok(index));
        assert_eq!(registry.find_or_allocate(Rnti::new(0x30), 1, 0), Ok(0));
    }
    
    #[test]
    fn test_commit_copies_configuration() {
        let mut registry = SrsRegistry::new(1).unwrap();
        let index = {
            let transient = SrsPdu { bwp_start: 12, time_start_position: 3, ..pdu(0x42) };
            registry.commit(100, 9, &transient)
        };
        
        let occasion = registry.get(index).unwrap();
        assert!(occasion.is_active());
        assert_eq!(occasion.frame(), 100);
        assert_eq!(occasion.slot(), 9);
        assert_eq!(occasion.pdu().bwp_start, 12);
        assert_eq!(occasion.pdu().time_start_position, 3);
    }
    
    #[test]
    #[should_panic(expected = "invalid id found for srs")]
    fn test_commit_panics_when_exhausted() {
        let mut registry = SrsRegistry::new(1).unwrap();
        registry.commit(0, 0, &pdu(1));
        registry.commit(0, 0, &pdu(2));
    }
    
    #[test]
    fn test_release() {
        let mut registry = SrsRegistry::new(1).unwrap();
        let index = registry.commit(0, 0, &pdu(1));
        
        assert!(registry.release(index));
        assert!(!registry.release(index));
        assert!(!registry.release(5));
        assert_eq!(registry.try_commit(0, 1, &pdu(2)), Ok(index));
    }
    
    #[test]
    fn test_release_stale() {
        let parms = frame_parms();
        let mut registry = SrsRegistry::new(3).unwrap();
        registry.commit(1023, 8, &pdu(1));
        registry.commit(0, 2, &pdu(2));
        registry.commit(0, 5, &pdu(3));
        
        // 7 and 3 slots old at frame 0 slot 5
        assert_eq!(registry.release_stale(&parms, 0, 5, 4), 1);
        assert!(!registry.get(0).unwrap().is_active());
        assert_eq!(registry.active_count(), 2);
        
        assert_eq!(registry.release_stale(&parms, 0, 5, 0), 1);
        assert_eq!(registry.active_count(), 1);
        assert!(registry.get(2).unwrap().is_active());
    }
    
    #[test]
    fn test_release_stale_keeps_future_occasions() {
        let parms = frame_parms();
        let mut registry = SrsRegistry::new(2).unwrap();
        registry.commit(5, 4, &pdu(1));
        registry.commit(5, 9, &pdu(2));
        
        assert_eq!(registry.release_stale(&parms, 5, 2, 8), 0);
        assert_eq!(registry.active_count(), 2);
        
        // Once the PHY has moved past them they age normally
        assert_eq!(registry.release_stale(&parms, 6, 3, 8), 1);
        assert!(!registry.get(0).unwrap().is_active());
        assert!(registry.get(1).unwrap().is_active());
    }
    
    #[test]
    fn test_release_stale_keeps_future_occasions_across_sfn_wrap() {
        let parms = frame_parms();
        let mut registry = SrsRegistry::new(1).unwrap();
        registry.commit(0, 1, &pdu(1));
        
        assert_eq!(registry.release_stale(&parms, 1023, 9, 0), 0);
        assert_eq!(registry.release_stale(&parms, 0, 1, 0), 0);
        assert_eq!(registry.release_stale(&parms, 0, 2, 0), 1);
    }
}
